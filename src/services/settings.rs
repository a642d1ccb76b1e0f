use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde::Deserialize;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::AppConfig,
    entities::setting::{self, Entity as SettingsEntity, SETTINGS_ROW_ID},
    errors::ServiceError,
    finale::FinaleCredentials,
};

/// Partial update for the settings row. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingsInput {
    #[validate(length(min = 1, max = 255))]
    pub finale_account_path: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub finale_api_key: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub finale_api_secret: Option<String>,
    pub sync_enabled: Option<bool>,
    #[validate(range(min = 5, max = 1440))]
    pub sync_frequency_minutes: Option<i32>,
    #[validate(range(min = 5, max = 240))]
    pub stuck_sync_timeout_minutes: Option<i32>,
    pub low_stock_alerts: Option<bool>,
}

/// Owns the singleton settings row. Postgres is the only store; there is no
/// file fallback, so every instance of the app sees the same values.
#[derive(Clone)]
pub struct SettingsService {
    db: Arc<DatabaseConnection>,
    config: AppConfig,
}

impl SettingsService {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig) -> Self {
        Self { db, config }
    }

    /// Loads the settings row, inserting the defaults on first access.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<setting::Model, ServiceError> {
        if let Some(row) = SettingsEntity::find_by_id(SETTINGS_ROW_ID)
            .one(&*self.db)
            .await?
        {
            return Ok(row);
        }

        let now = Utc::now().naive_utc();
        let defaults = setting::ActiveModel {
            id: Set(SETTINGS_ROW_ID),
            finale_account_path: Set(None),
            finale_api_key: Set(None),
            finale_api_secret: Set(None),
            sync_enabled: Set(true),
            sync_frequency_minutes: Set(60),
            stuck_sync_timeout_minutes: Set(self.config.sync.stuck_timeout_minutes as i32),
            low_stock_alerts: Set(true),
            last_sync_time: Set(None),
            updated_at: Set(now),
        };
        Ok(defaults.insert(&*self.db).await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, input: UpdateSettingsInput) -> Result<setting::Model, ServiceError> {
        input.validate()?;

        let current = self.get().await?;
        let mut active: setting::ActiveModel = current.into();
        if let Some(v) = input.finale_account_path {
            active.finale_account_path = Set(Some(v));
        }
        if let Some(v) = input.finale_api_key {
            active.finale_api_key = Set(Some(v));
        }
        if let Some(v) = input.finale_api_secret {
            active.finale_api_secret = Set(Some(v));
        }
        if let Some(v) = input.sync_enabled {
            active.sync_enabled = Set(v);
        }
        if let Some(v) = input.sync_frequency_minutes {
            active.sync_frequency_minutes = Set(v);
        }
        if let Some(v) = input.stuck_sync_timeout_minutes {
            active.stuck_sync_timeout_minutes = Set(v);
        }
        if let Some(v) = input.low_stock_alerts {
            active.low_stock_alerts = Set(v);
        }
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(&*self.db).await?)
    }

    /// Resolves Finale credentials: the settings row wins, config fills in
    /// for bootstrap before the row has been populated.
    pub async fn finale_credentials(&self) -> Result<FinaleCredentials, ServiceError> {
        let row = SettingsEntity::find_by_id(SETTINGS_ROW_ID)
            .one(&*self.db)
            .await?;

        if let Some(row) = row {
            if let (Some(account_path), Some(api_key), Some(api_secret)) = (
                row.finale_account_path,
                row.finale_api_key,
                row.finale_api_secret,
            ) {
                return Ok(FinaleCredentials {
                    account_path,
                    api_key,
                    api_secret,
                });
            }
        }

        FinaleCredentials::from_config(&self.config.finale)
    }

    /// Records when the most recent sync finished. Best-effort.
    pub async fn touch_last_sync_time(&self) {
        match self.get().await {
            Ok(row) => {
                let mut active: setting::ActiveModel = row.into();
                active.last_sync_time = Set(Some(Utc::now().naive_utc()));
                active.updated_at = Set(Utc::now().naive_utc());
                if let Err(e) = active.update(&*self.db).await {
                    warn!(error = %e, "Failed to record last sync time");
                }
            }
            Err(e) => warn!(error = %e, "Failed to load settings row"),
        }
    }
}
