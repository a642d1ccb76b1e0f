use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::{keys, CacheHandle, CacheStatus},
    entities::vendor::{self, Column, Entity as VendorEntity},
    errors::ServiceError,
    finale::FinaleVendorRow,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVendorInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVendorInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub active: Option<bool>,
}

/// Vendor CRUD plus the sync-side upsert keyed on the Finale party id.
#[derive(Clone)]
pub struct VendorService {
    db: Arc<DatabaseConnection>,
    cache: CacheHandle,
}

impl VendorService {
    pub fn new(db: Arc<DatabaseConnection>, cache: CacheHandle) -> Self {
        Self { db, cache }
    }

    /// Full vendor list, cache-backed.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        force_refresh: bool,
    ) -> Result<(Vec<vendor::Model>, CacheStatus), ServiceError> {
        if !force_refresh {
            if let Some(cached) = self
                .cache
                .get_json::<Vec<vendor::Model>>(keys::VENDORS_FULL)
                .await
            {
                return Ok((cached, CacheStatus::Hit));
            }
        }
        let rows = self.rebuild_snapshot().await?;
        Ok((rows, CacheStatus::Miss))
    }

    pub async fn rebuild_snapshot(&self) -> Result<Vec<vendor::Model>, ServiceError> {
        let rows = VendorEntity::find()
            .order_by_asc(Column::Name)
            .all(&*self.db)
            .await?;
        self.cache
            .set_json(
                keys::VENDORS_FULL,
                &rows,
                Duration::from_secs(self.cache.config.vendors_ttl_secs),
            )
            .await;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<vendor::Model, ServiceError> {
        VendorEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor {}", id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateVendorInput) -> Result<vendor::Model, ServiceError> {
        input.validate()?;

        let existing = VendorEntity::find()
            .filter(Column::Name.eq(input.name.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Vendor {} already exists",
                input.name
            )));
        }

        let now = Utc::now().naive_utc();
        let model = vendor::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            contact_name: Set(input.contact_name),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            notes: Set(input.notes),
            active: Set(true),
            finale_vendor_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;
        self.cache.delete(keys::VENDORS_FULL).await;
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateVendorInput,
    ) -> Result<vendor::Model, ServiceError> {
        input.validate()?;

        let model = self.get(id).await?;
        let mut active: vendor::ActiveModel = model.into();
        if let Some(v) = input.name {
            active.name = Set(v);
        }
        if let Some(v) = input.contact_name {
            active.contact_name = Set(Some(v));
        }
        if let Some(v) = input.email {
            active.email = Set(Some(v));
        }
        if let Some(v) = input.phone {
            active.phone = Set(Some(v));
        }
        if let Some(v) = input.address {
            active.address = Set(Some(v));
        }
        if let Some(v) = input.notes {
            active.notes = Set(Some(v));
        }
        if let Some(v) = input.active {
            active.active = Set(v);
        }
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active.update(&*self.db).await?;
        self.cache.delete(keys::VENDORS_FULL).await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let model = self.get(id).await?;
        VendorEntity::delete_by_id(model.id)
            .exec(&*self.db)
            .await?;
        self.cache.delete(keys::VENDORS_FULL).await;
        Ok(())
    }

    /// Upsert synced vendor rows. Matches on the Finale party id first, then
    /// on name, so a renamed party keeps its row.
    #[instrument(skip(self, rows))]
    pub async fn upsert_from_finale(&self, rows: &[FinaleVendorRow]) -> (usize, Vec<String>) {
        let mut updated = 0usize;
        let mut errors = Vec::new();
        for row in rows {
            match self.upsert_one(row).await {
                Ok(()) => updated += 1,
                Err(e) => {
                    warn!(finale_id = %row.finale_id, error = %e, "Vendor upsert failed");
                    errors.push(format!("Vendor {}: {}", row.finale_id, e));
                }
            }
        }
        (updated, errors)
    }

    async fn upsert_one(&self, row: &FinaleVendorRow) -> Result<(), ServiceError> {
        let now = Utc::now().naive_utc();
        let existing = VendorEntity::find()
            .filter(Column::FinaleVendorId.eq(row.finale_id.clone()))
            .one(&*self.db)
            .await?;
        let existing = match existing {
            Some(m) => Some(m),
            None => {
                VendorEntity::find()
                    .filter(Column::Name.eq(row.name.clone()))
                    .one(&*self.db)
                    .await?
            }
        };

        match existing {
            Some(model) => {
                let mut active: vendor::ActiveModel = model.into();
                active.name = Set(row.name.clone());
                active.email = Set(row.email.clone());
                active.phone = Set(row.phone.clone());
                active.finale_vendor_id = Set(Some(row.finale_id.clone()));
                active.updated_at = Set(now);
                active.update(&*self.db).await?;
            }
            None => {
                let model = vendor::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(row.name.clone()),
                    contact_name: Set(None),
                    email: Set(row.email.clone()),
                    phone: Set(row.phone.clone()),
                    address: Set(None),
                    notes: Set(None),
                    active: Set(true),
                    finale_vendor_id: Set(Some(row.finale_id.clone())),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&*self.db).await?;
            }
        }
        Ok(())
    }
}
