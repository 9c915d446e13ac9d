use crate::{
    db::DbPool,
    entities::invoice::{
        self, ActiveModel as InvoiceActiveModel, Entity as InvoiceEntity, Model as InvoiceModel,
    },
    entities::invoice_item::{
        self, ActiveModel as InvoiceItemActiveModel, Entity as InvoiceItemEntity,
        Model as InvoiceItemModel,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// One embedded line of an invoice payload. `price` is the snapshot the
/// caller locked in at order time, not the item's current menu price.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct InvoiceItemPayload {
    pub item_id: i32,

    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,

    #[validate(custom = "validate_non_negative_price")]
    pub price: Decimal,
}

/// Payload for creating or fully overwriting an invoice together with its
/// line items. The invoice total is recomputed from the embedded lines; a
/// caller-supplied total is ignored. On update, `invoice_number` is also
/// ignored: the original number is preserved.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct InvoicePayload {
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,

    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,

    pub customer_phone: Option<String>,

    pub date: DateTime<Utc>,

    #[validate]
    pub items: Vec<InvoiceItemPayload>,
}

fn validate_non_negative_price(price: &Decimal) -> Result<(), validator::ValidationError> {
    if price.is_sign_negative() {
        return Err(validator::ValidationError::new("price_must_be_non_negative"));
    }
    Ok(())
}

/// An invoice with its line items eagerly loaded
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: i32,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub date: DateTime<Utc>,
    pub total: Decimal,
    pub items: Vec<InvoiceItemModel>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Sum of quantity x price over the submitted lines.
fn compute_total(items: &[InvoiceItemPayload]) -> Decimal {
    items
        .iter()
        .map(|line| Decimal::from(line.quantity) * line.price)
        .sum()
}

fn compose_response(invoice: InvoiceModel, items: Vec<InvoiceItemModel>) -> InvoiceResponse {
    InvoiceResponse {
        id: invoice.id,
        invoice_number: invoice.invoice_number,
        customer_name: invoice.customer_name,
        customer_phone: invoice.customer_phone,
        date: invoice.date,
        total: invoice.total,
        items,
        version: invoice.version,
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    }
}

/// Service for managing invoices and their exclusively-owned line items.
/// Every mutation runs as a single transaction: either the invoice and all of
/// its lines change together, or nothing does.
#[derive(Clone)]
pub struct InvoiceService {
    db_pool: Arc<DbPool>,
}

impl InvoiceService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists all invoices with their line items eagerly loaded
    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceResponse>, ServiceError> {
        let db = &*self.db_pool;

        let invoices = InvoiceEntity::find()
            .filter(invoice::Column::DeletedAt.is_null())
            .order_by_asc(invoice::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch invoices from database");
                ServiceError::DatabaseError(e)
            })?;

        if invoices.is_empty() {
            return Ok(Vec::new());
        }

        // One additional query for all line items, grouped in memory.
        let ids: Vec<i32> = invoices.iter().map(|inv| inv.id).collect();
        let lines = InvoiceItemEntity::find()
            .filter(invoice_item::Column::InvoiceId.is_in(ids))
            .filter(invoice_item::Column::DeletedAt.is_null())
            .order_by_asc(invoice_item::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch invoice line items from database");
                ServiceError::DatabaseError(e)
            })?;

        let mut grouped: HashMap<i32, Vec<InvoiceItemModel>> = HashMap::new();
        for line in lines {
            grouped.entry(line.invoice_id).or_default().push(line);
        }

        Ok(invoices
            .into_iter()
            .map(|inv| {
                let items = grouped.remove(&inv.id).unwrap_or_default();
                compose_response(inv, items)
            })
            .collect())
    }

    /// Retrieves one invoice with its line items
    #[instrument(skip(self), fields(invoice_id = invoice_id))]
    pub async fn get_invoice(&self, invoice_id: i32) -> Result<InvoiceResponse, ServiceError> {
        let db = &*self.db_pool;

        let invoice = InvoiceEntity::find_by_id(invoice_id)
            .filter(invoice::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, invoice_id = invoice_id, "Failed to fetch invoice from database");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(invoice_id = invoice_id, "Invoice not found");
                ServiceError::NotFound(format!("Invoice with ID {} not found", invoice_id))
            })?;

        let items = self.load_line_items(db, invoice.id).await?;

        Ok(compose_response(invoice, items))
    }

    /// Creates an invoice and its line items atomically. Any failure rolls
    /// the whole transaction back; no orphan lines are ever visible.
    #[instrument(skip(self, payload), fields(invoice_number = %payload.invoice_number))]
    pub async fn create_invoice(
        &self,
        payload: InvoicePayload,
    ) -> Result<InvoiceResponse, ServiceError> {
        payload.validate()?;

        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for invoice creation");
            ServiceError::DatabaseError(e)
        })?;

        let invoice_active_model = InvoiceActiveModel {
            invoice_number: Set(payload.invoice_number.clone()),
            customer_name: Set(payload.customer_name.clone()),
            customer_phone: Set(payload.customer_phone.clone()),
            date: Set(payload.date),
            total: Set(compute_total(&payload.items)),
            version: Set(1),
            ..Default::default()
        };

        let invoice = invoice_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to create invoice in database");
            ServiceError::DatabaseError(e)
        })?;

        let items = self
            .insert_line_items(&txn, invoice.id, &payload.items)
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, invoice_id = invoice.id, "Failed to commit invoice creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            invoice_id = invoice.id,
            line_items = items.len(),
            "Invoice created successfully"
        );

        Ok(compose_response(invoice, items))
    }

    /// Fully replaces an invoice's scalar fields and line items.
    ///
    /// The existence check runs inside the transaction with a row lock, so a
    /// concurrent delete cannot slip between check and write. The original
    /// invoice_number is preserved; `version` is bumped on every update.
    #[instrument(skip(self, payload), fields(invoice_id = invoice_id))]
    pub async fn update_invoice(
        &self,
        invoice_id: i32,
        payload: InvoicePayload,
    ) -> Result<InvoiceResponse, ServiceError> {
        payload.validate()?;

        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, invoice_id = invoice_id, "Failed to start transaction for invoice update");
            ServiceError::DatabaseError(e)
        })?;

        let invoice = self.lock_invoice(&txn, invoice_id).await?;
        let now = Utc::now();

        // Full-replace semantics: retire every existing line, then insert the
        // replacement set.
        self.retire_line_items(&txn, invoice.id, now).await?;

        let version = invoice.version + 1;
        let mut invoice_active_model: InvoiceActiveModel = invoice.into();
        // invoice_number is deliberately not overwritten
        invoice_active_model.customer_name = Set(payload.customer_name.clone());
        invoice_active_model.customer_phone = Set(payload.customer_phone.clone());
        invoice_active_model.date = Set(payload.date);
        invoice_active_model.total = Set(compute_total(&payload.items));
        invoice_active_model.version = Set(version);
        invoice_active_model.updated_at = Set(Some(now));

        let invoice = invoice_active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, invoice_id = invoice_id, "Failed to update invoice");
            ServiceError::DatabaseError(e)
        })?;

        let items = self
            .insert_line_items(&txn, invoice.id, &payload.items)
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, invoice_id = invoice_id, "Failed to commit invoice update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            invoice_id = invoice.id,
            line_items = items.len(),
            "Invoice updated successfully"
        );

        Ok(compose_response(invoice, items))
    }

    /// Soft-deletes an invoice and all of its line items atomically
    #[instrument(skip(self), fields(invoice_id = invoice_id))]
    pub async fn delete_invoice(&self, invoice_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, invoice_id = invoice_id, "Failed to start transaction for invoice deletion");
            ServiceError::DatabaseError(e)
        })?;

        let invoice = self.lock_invoice(&txn, invoice_id).await?;
        let now = Utc::now();

        self.retire_line_items(&txn, invoice.id, now).await?;

        let mut invoice_active_model: InvoiceActiveModel = invoice.into();
        invoice_active_model.deleted_at = Set(Some(now));
        invoice_active_model.updated_at = Set(Some(now));

        invoice_active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, invoice_id = invoice_id, "Failed to delete invoice");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, invoice_id = invoice_id, "Failed to commit invoice deletion transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(invoice_id = invoice_id, "Invoice deleted successfully");

        Ok(())
    }

    /// Row-locked fetch inside an open transaction; NotFound covers both
    /// absent and soft-deleted invoices. The lock is a no-op on SQLite.
    async fn lock_invoice<C>(&self, conn: &C, invoice_id: i32) -> Result<InvoiceModel, ServiceError>
    where
        C: ConnectionTrait,
    {
        let invoice = InvoiceEntity::find_by_id(invoice_id)
            .filter(invoice::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| {
                error!(error = %e, invoice_id = invoice_id, "Failed to fetch invoice for mutation");
                ServiceError::DatabaseError(e)
            })?;

        invoice.ok_or_else(|| {
            warn!(invoice_id = invoice_id, "Invoice not found");
            ServiceError::NotFound(format!("Invoice with ID {} not found", invoice_id))
        })
    }

    async fn load_line_items<C>(
        &self,
        conn: &C,
        invoice_id: i32,
    ) -> Result<Vec<InvoiceItemModel>, ServiceError>
    where
        C: ConnectionTrait,
    {
        InvoiceItemEntity::find()
            .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
            .filter(invoice_item::Column::DeletedAt.is_null())
            .order_by_asc(invoice_item::Column::Id)
            .all(conn)
            .await
            .map_err(|e| {
                error!(error = %e, invoice_id = invoice_id, "Failed to fetch invoice line items");
                ServiceError::DatabaseError(e)
            })
    }

    async fn insert_line_items<C>(
        &self,
        conn: &C,
        invoice_id: i32,
        lines: &[InvoiceItemPayload],
    ) -> Result<Vec<InvoiceItemModel>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let mut saved = Vec::with_capacity(lines.len());
        for line in lines {
            let line_active_model = InvoiceItemActiveModel {
                invoice_id: Set(invoice_id),
                item_id: Set(line.item_id),
                quantity: Set(line.quantity),
                price: Set(line.price),
                ..Default::default()
            };

            let model = line_active_model.insert(conn).await.map_err(|e| {
                error!(error = %e, invoice_id = invoice_id, item_id = line.item_id, "Failed to create invoice line item");
                ServiceError::DatabaseError(e)
            })?;
            saved.push(model);
        }

        Ok(saved)
    }

    async fn retire_line_items<C>(
        &self,
        conn: &C,
        invoice_id: i32,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        InvoiceItemEntity::update_many()
            .col_expr(invoice_item::Column::DeletedAt, Expr::value(now))
            .col_expr(invoice_item::Column::UpdatedAt, Expr::value(now))
            .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
            .filter(invoice_item::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| {
                error!(error = %e, invoice_id = invoice_id, "Failed to retire invoice line items");
                ServiceError::DatabaseError(e)
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(item_id: i32, quantity: i32, price: Decimal) -> InvoiceItemPayload {
        InvoiceItemPayload {
            item_id,
            quantity,
            price,
        }
    }

    #[test]
    fn total_is_sum_of_quantity_times_price() {
        let lines = vec![line(1, 2, dec!(9.50)), line(2, 1, dec!(4.25))];
        assert_eq!(compute_total(&lines), dec!(23.25));
    }

    #[test]
    fn total_of_empty_invoice_is_zero() {
        assert_eq!(compute_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn payload_rejects_zero_quantity() {
        let payload = InvoicePayload {
            invoice_number: "INV-001".into(),
            customer_name: "Ada".into(),
            customer_phone: None,
            date: Utc::now(),
            items: vec![line(1, 0, dec!(9.50))],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn payload_rejects_empty_customer_name() {
        let payload = InvoicePayload {
            invoice_number: "INV-001".into(),
            customer_name: "".into(),
            customer_phone: None,
            date: Utc::now(),
            items: vec![],
        };
        assert!(payload.validate().is_err());
    }
}
