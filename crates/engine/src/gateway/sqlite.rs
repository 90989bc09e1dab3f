use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait, sea_query::OnConflict};

use super::{Gateway, kv_store};
use crate::GatewayError;

/// Gateway over the `kv_store` table.
///
/// The connection must already be migrated (see the `migration` crate).
#[derive(Clone, Debug)]
pub struct SqliteGateway {
    database: DatabaseConnection,
}

impl SqliteGateway {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

impl Gateway for SqliteGateway {
    async fn load(&self, key: &str) -> Result<Option<String>, GatewayError> {
        let row = kv_store::Entity::find_by_id(key.to_string())
            .one(&self.database)
            .await?;
        Ok(row.map(|model| model.value))
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), GatewayError> {
        let model = kv_store::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
            updated_at: ActiveValue::Set(Utc::now()),
        };

        kv_store::Entity::insert(model)
            .on_conflict(
                OnConflict::column(kv_store::Column::Key)
                    .update_columns([kv_store::Column::Value, kv_store::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.database)
            .await?;
        Ok(())
    }
}
