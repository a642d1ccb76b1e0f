use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::FinaleConfig;
use crate::errors::ServiceError;

/// Basic-auth credentials plus the account path segment of the API URL.
#[derive(Clone, Debug)]
pub struct FinaleCredentials {
    pub account_path: String,
    pub api_key: String,
    pub api_secret: String,
}

impl FinaleCredentials {
    /// Builds credentials from config, erroring when any piece is missing.
    pub fn from_config(cfg: &FinaleConfig) -> Result<Self, ServiceError> {
        match (&cfg.account_path, &cfg.api_key, &cfg.api_secret) {
            (Some(account_path), Some(api_key), Some(api_secret)) => Ok(Self {
                account_path: account_path.clone(),
                api_key: api_key.clone(),
                api_secret: api_secret.clone(),
            }),
            _ => Err(ServiceError::ServiceUnavailable(
                "Finale credentials are not configured".to_string(),
            )),
        }
    }
}

/// One normalized product row from Finale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinaleProductRow {
    pub sku: String,
    pub product_name: Option<String>,
    pub quantity_on_hand: Option<i32>,
    pub unit_cost: Option<Decimal>,
    pub reorder_point: Option<i32>,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub sales_velocity: Option<Decimal>,
}

/// One normalized vendor row from Finale's party endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinaleVendorRow {
    pub finale_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub struct FinaleClient {
    http: reqwest::Client,
    base_url: String,
    account_path: String,
    page_size: u32,
    filter_year: Option<i32>,
}

impl FinaleClient {
    pub fn new(cfg: &FinaleConfig, credentials: FinaleCredentials) -> Result<Self, ServiceError> {
        let token = BASE64.encode(format!(
            "{}:{}",
            credentials.api_key, credentials.api_secret
        ));
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Basic {}", token))
            .map_err(|e| ServiceError::InternalError(format!("Invalid auth header: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            account_path: credentials.account_path,
            page_size: cfg.page_size,
            filter_year: cfg.filter_year,
        })
    }

    fn api_url(&self, resource: &str) -> String {
        format!("{}/{}/api/{}", self.base_url, self.account_path, resource)
    }

    async fn get_json(&self, url: &str) -> Result<Value, ServiceError> {
        debug!(url, "Finale request");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalApiError(format!("Finale request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(ServiceError::ExternalApiError(format!(
                "Finale returned HTTP {}: {}",
                status.as_u16(),
                excerpt
            )));
        }

        response.json().await.map_err(|e| {
            ServiceError::ExternalApiError(format!("Finale returned malformed JSON: {}", e))
        })
    }

    /// Fetches all products, paging with the fixed page size until a short page.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<FinaleProductRow>, ServiceError> {
        let mut rows = Vec::new();
        let mut offset: u32 = 0;

        loop {
            let mut url = Url::parse(&self.api_url("product"))
                .map_err(|e| ServiceError::InternalError(format!("Bad Finale URL: {}", e)))?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("limit", &self.page_size.to_string());
                query.append_pair("offset", &offset.to_string());
                if let Some(year) = self.filter_year {
                    query.append_pair("year", &year.to_string());
                }
            }

            let payload = self.get_json(url.as_str()).await?;
            // Page fullness is judged on the raw productId column, not the
            // normalized rows: normalization drops rows with bad ids, and a
            // full page with one bad id must not end the paging loop.
            let raw_len = column(&payload, "productId").map_or(0, Vec::len);
            rows.extend(normalize_product_columns(&payload)?);

            if raw_len < self.page_size as usize {
                break;
            }
            offset += self.page_size;
        }

        debug!(count = rows.len(), "Fetched Finale products");
        Ok(rows)
    }

    /// Fetches all vendors from the party endpoint.
    #[instrument(skip(self))]
    pub async fn get_vendors(&self) -> Result<Vec<FinaleVendorRow>, ServiceError> {
        let mut url = Url::parse(&self.api_url("partyGroup"))
            .map_err(|e| ServiceError::InternalError(format!("Bad Finale URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string());

        let payload = self.get_json(url.as_str()).await?;
        normalize_vendor_columns(&payload)
    }

    /// Fetches rows from a pivot-table report URL. The report API returns an
    /// array of row objects rather than column arrays.
    #[instrument(skip(self))]
    pub async fn get_report_rows(
        &self,
        report_url: &str,
    ) -> Result<Vec<FinaleProductRow>, ServiceError> {
        let payload = self.get_json(report_url).await?;
        normalize_report_rows(&payload)
    }

    /// Pushes a purchase order to Finale. Returns Finale's order id when the
    /// response carries one.
    #[instrument(skip(self, body))]
    pub async fn push_purchase_order(&self, body: &Value) -> Result<Option<String>, ServiceError> {
        let url = self.api_url("order");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalApiError(format!("Finale push failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let excerpt: String = text.chars().take(200).collect();
            return Err(ServiceError::ExternalApiError(format!(
                "Finale order push returned HTTP {}: {}",
                status.as_u16(),
                excerpt
            )));
        }

        let payload: Value = response.json().await.unwrap_or(Value::Null);
        Ok(payload
            .get("orderId")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

fn column<'a>(payload: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    payload.get(key).and_then(Value::as_array)
}

fn cell_str(col: Option<&Vec<Value>>, i: usize) -> Option<String> {
    col.and_then(|c| c.get(i)).and_then(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

fn cell_i32(col: Option<&Vec<Value>>, i: usize) -> Option<i32> {
    col.and_then(|c| c.get(i)).and_then(|v| match v {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i32),
        Value::String(s) => s.parse::<f64>().ok().map(|f| f.round() as i32),
        _ => None,
    })
}

fn cell_decimal(col: Option<&Vec<Value>>, i: usize) -> Option<Decimal> {
    col.and_then(|c| c.get(i)).and_then(|v| match v {
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64_retain),
        Value::String(s) => s.parse::<Decimal>().ok(),
        _ => None,
    })
}

/// Zips Finale's column-oriented product payload into row structs. The row
/// count is the length of the `productId` column; shorter sibling columns
/// yield `None` cells.
pub fn normalize_product_columns(payload: &Value) -> Result<Vec<FinaleProductRow>, ServiceError> {
    let ids = column(payload, "productId").ok_or_else(|| {
        ServiceError::ExternalApiError(
            "Finale product payload is missing the productId column".to_string(),
        )
    })?;

    let names = column(payload, "internalName");
    let on_hand = column(payload, "quantityOnHand");
    let costs = column(payload, "averageCost");
    let reorder = column(payload, "reorderLevel");
    let suppliers = column(payload, "primarySupplierName");
    let locations = column(payload, "facilityName");
    let velocity = column(payload, "salesVelocity");

    let mut rows = Vec::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        let Some(sku) = id.as_str().filter(|s| !s.is_empty()) else {
            warn!(index = i, "Skipping Finale product row without a productId");
            continue;
        };
        rows.push(FinaleProductRow {
            sku: sku.to_string(),
            product_name: cell_str(names, i),
            quantity_on_hand: cell_i32(on_hand, i),
            unit_cost: cell_decimal(costs, i),
            reorder_point: cell_i32(reorder, i),
            supplier: cell_str(suppliers, i),
            location: cell_str(locations, i),
            sales_velocity: cell_decimal(velocity, i),
        });
    }
    Ok(rows)
}

/// Zips the party payload into vendor rows, keyed by the `partyId` column.
pub fn normalize_vendor_columns(payload: &Value) -> Result<Vec<FinaleVendorRow>, ServiceError> {
    let ids = column(payload, "partyId").ok_or_else(|| {
        ServiceError::ExternalApiError(
            "Finale party payload is missing the partyId column".to_string(),
        )
    })?;

    let names = column(payload, "groupName");
    let emails = column(payload, "emailAddress");
    let phones = column(payload, "phoneNumber");

    let mut rows = Vec::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        let finale_id = match id {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        let Some(name) = cell_str(names, i) else {
            continue;
        };
        rows.push(FinaleVendorRow {
            finale_id,
            name,
            email: cell_str(emails, i),
            phone: cell_str(phones, i),
        });
    }
    Ok(rows)
}

/// Normalizes pivot-table report rows (`[{...}, {...}]`, either bare or
/// under a `data` key) into product rows. Report column labels differ from
/// the bulk API's.
pub fn normalize_report_rows(payload: &Value) -> Result<Vec<FinaleProductRow>, ServiceError> {
    let rows = payload
        .as_array()
        .or_else(|| payload.get("data").and_then(Value::as_array))
        .ok_or_else(|| {
            ServiceError::ExternalApiError("Finale report payload is not a row array".to_string())
        })?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(obj) = row.as_object() else { continue };
        let sku = obj
            .get("Product ID")
            .or_else(|| obj.get("productId"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        let Some(sku) = sku else { continue };

        let get_str = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        let get_i32 = |key: &str| {
            obj.get(key).and_then(|v| match v {
                Value::Number(n) => n.as_f64().map(|f| f.round() as i32),
                Value::String(s) => s.parse::<f64>().ok().map(|f| f.round() as i32),
                _ => None,
            })
        };
        let get_dec = |key: &str| {
            obj.get(key).and_then(|v| match v {
                Value::Number(n) => n.as_f64().and_then(Decimal::from_f64_retain),
                Value::String(s) => s.parse::<Decimal>().ok(),
                _ => None,
            })
        };

        out.push(FinaleProductRow {
            sku: sku.to_string(),
            product_name: get_str("Description"),
            quantity_on_hand: get_i32("Units in stock"),
            unit_cost: get_dec("Average cost"),
            reorder_point: get_i32("Reorder level"),
            supplier: get_str("Supplier"),
            location: get_str("Location"),
            sales_velocity: get_dec("Sales velocity"),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zips_parallel_columns_by_index() {
        let payload = json!({
            "productId": ["SKU-1", "SKU-2"],
            "internalName": ["Widget", "Gadget"],
            "quantityOnHand": [10, 0],
            "averageCost": ["2.50", 4],
            "reorderLevel": [5, 3],
            "primarySupplierName": ["Acme", "Globex"],
            "facilityName": ["Main", "Annex"],
            "salesVelocity": [1.5, 0.0]
        });
        let rows = normalize_product_columns(&payload).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sku, "SKU-1");
        assert_eq!(rows[0].product_name.as_deref(), Some("Widget"));
        assert_eq!(rows[0].quantity_on_hand, Some(10));
        assert_eq!(rows[0].unit_cost, Some("2.50".parse().unwrap()));
        assert_eq!(rows[1].supplier.as_deref(), Some("Globex"));
    }

    #[test]
    fn short_columns_yield_none_cells() {
        let payload = json!({
            "productId": ["SKU-1", "SKU-2", "SKU-3"],
            "quantityOnHand": [7]
        });
        let rows = normalize_product_columns(&payload).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].quantity_on_hand, Some(7));
        assert_eq!(rows[1].quantity_on_hand, None);
        assert!(rows[2].product_name.is_none());
    }

    #[test]
    fn missing_key_column_is_an_upstream_error() {
        let payload = json!({ "internalName": ["Widget"] });
        let err = normalize_product_columns(&payload).unwrap_err();
        assert!(matches!(err, ServiceError::ExternalApiError(_)));
    }

    #[test]
    fn empty_product_ids_are_skipped() {
        let payload = json!({
            "productId": ["SKU-1", "", "SKU-3"],
            "quantityOnHand": [1, 2, 3]
        });
        let rows = normalize_product_columns(&payload).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].sku, "SKU-3");
        assert_eq!(rows[1].quantity_on_hand, Some(3));
    }

    #[test]
    fn vendor_columns_require_a_name() {
        let payload = json!({
            "partyId": [101, 102],
            "groupName": ["Acme Corp"],
            "emailAddress": ["orders@acme.example", "x@y.example"]
        });
        let rows = normalize_vendor_columns(&payload).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].finale_id, "101");
        assert_eq!(rows[0].name, "Acme Corp");
        assert_eq!(rows[0].email.as_deref(), Some("orders@acme.example"));
    }

    #[test]
    fn report_rows_accept_bare_arrays_and_data_wrappers() {
        let bare = json!([
            {"Product ID": "SKU-9", "Units in stock": "12", "Average cost": 1.25}
        ]);
        let rows = normalize_report_rows(&bare).unwrap();
        assert_eq!(rows[0].sku, "SKU-9");
        assert_eq!(rows[0].quantity_on_hand, Some(12));

        let wrapped = json!({"data": [{"Product ID": "SKU-10"}]});
        let rows = normalize_report_rows(&wrapped).unwrap();
        assert_eq!(rows[0].sku, "SKU-10");
    }
}
