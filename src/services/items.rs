use crate::{
    db::DbPool,
    entities::item::{
        self, ActiveModel as ItemActiveModel, Entity as ItemEntity, Model as ItemModel,
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Payload for creating or fully overwriting a menu item. Fields absent from
/// the request fall back to their deserialization defaults, so callers must
/// resend the full record on update.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ItemPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(custom = "validate_non_negative_price")]
    pub price: Decimal,

    pub description: Option<String>,
}

fn validate_non_negative_price(price: &Decimal) -> Result<(), validator::ValidationError> {
    if price.is_sign_negative() {
        return Err(validator::ValidationError::new("price_must_be_non_negative"));
    }
    Ok(())
}

/// Service for managing menu items
#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
}

impl ItemService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists all non-deleted items
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<ItemModel>, ServiceError> {
        let db = &*self.db_pool;

        let items = ItemEntity::find()
            .filter(item::Column::DeletedAt.is_null())
            .order_by_asc(item::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch items from database");
                ServiceError::DatabaseError(e)
            })?;

        Ok(items)
    }

    /// Retrieves one item; absent and soft-deleted rows are both NotFound
    #[instrument(skip(self), fields(item_id = item_id))]
    pub async fn get_item(&self, item_id: i32) -> Result<ItemModel, ServiceError> {
        let db = &*self.db_pool;

        let item = ItemEntity::find_by_id(item_id)
            .filter(item::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, item_id = item_id, "Failed to fetch item from database");
                ServiceError::DatabaseError(e)
            })?;

        item.ok_or_else(|| {
            warn!(item_id = item_id, "Item not found");
            ServiceError::NotFound(format!("Item with ID {} not found", item_id))
        })
    }

    /// Creates a new item and returns the stored record with generated fields
    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_item(&self, payload: ItemPayload) -> Result<ItemModel, ServiceError> {
        payload.validate()?;

        let db = &*self.db_pool;

        let item_active_model = ItemActiveModel {
            name: Set(payload.name),
            category: Set(payload.category),
            price: Set(payload.price),
            description: Set(payload.description),
            ..Default::default()
        };

        let item = item_active_model.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to create item in database");
            ServiceError::DatabaseError(e)
        })?;

        info!(item_id = item.id, "Item created successfully");

        Ok(item)
    }

    /// Overwrites all mutable fields of an existing item
    #[instrument(skip(self, payload), fields(item_id = item_id))]
    pub async fn update_item(
        &self,
        item_id: i32,
        payload: ItemPayload,
    ) -> Result<ItemModel, ServiceError> {
        payload.validate()?;

        let existing = self.get_item(item_id).await?;

        let mut item_active_model: ItemActiveModel = existing.into();
        item_active_model.name = Set(payload.name);
        item_active_model.category = Set(payload.category);
        item_active_model.price = Set(payload.price);
        item_active_model.description = Set(payload.description);
        item_active_model.updated_at = Set(Some(Utc::now()));

        let db = &*self.db_pool;
        let item = item_active_model.update(db).await.map_err(|e| {
            error!(error = %e, item_id = item_id, "Failed to update item");
            ServiceError::DatabaseError(e)
        })?;

        info!(item_id = item.id, "Item updated successfully");

        Ok(item)
    }

    /// Soft-deletes an item so it disappears from reads but stays auditable
    #[instrument(skip(self), fields(item_id = item_id))]
    pub async fn delete_item(&self, item_id: i32) -> Result<(), ServiceError> {
        let existing = self.get_item(item_id).await?;

        let now = Utc::now();
        let mut item_active_model: ItemActiveModel = existing.into();
        item_active_model.deleted_at = Set(Some(now));
        item_active_model.updated_at = Set(Some(now));

        let db = &*self.db_pool;
        item_active_model.update(db).await.map_err(|e| {
            error!(error = %e, item_id = item_id, "Failed to delete item");
            ServiceError::DatabaseError(e)
        })?;

        info!(item_id = item_id, "Item deleted successfully");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload(name: &str, category: &str, price: Decimal) -> ItemPayload {
        ItemPayload {
            name: name.to_string(),
            category: category.to_string(),
            price,
            description: None,
        }
    }

    #[test]
    fn payload_accepts_zero_price() {
        assert!(payload("Margherita", "pizza", dec!(0)).validate().is_ok());
    }

    #[test]
    fn payload_rejects_empty_name() {
        assert!(payload("", "pizza", dec!(9.50)).validate().is_err());
    }

    #[test]
    fn payload_rejects_negative_price() {
        assert!(payload("Margherita", "pizza", dec!(-1.00)).validate().is_err());
    }
}
