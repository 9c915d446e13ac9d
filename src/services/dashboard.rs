use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::{
        invoice::{self, Entity as InvoiceEntity},
        invoice_item::{self, Entity as InvoiceItemEntity},
        item::{self, Entity as ItemEntity},
    },
    errors::ServiceError,
};

/// How many rows the top-items and recent-orders views return.
const TOP_ITEMS_LIMIT: usize = 5;
const RECENT_ORDERS_LIMIT: u64 = 5;

/// Summary metrics over all invoices and items. The recent window covers the
/// trailing 7 days by invoice date; the growth rate compares it against the
/// 7 days immediately before.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub average_order_value: Decimal,
    pub total_items: i64,
    pub recent_revenue: Decimal,
    pub recent_orders: i64,
    pub growth_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopSellingItem {
    pub item_name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub invoice_number: String,
    pub customer_name: String,
    pub item_count: i64,
    pub total: Decimal,
    pub date: DateTime<Utc>,
}

/// Percentage change of the recent window against the previous one, zero
/// when there is nothing to compare against.
fn growth_rate(recent_revenue: Decimal, previous_revenue: Decimal) -> Decimal {
    if previous_revenue > Decimal::ZERO {
        ((recent_revenue - previous_revenue) / previous_revenue) * Decimal::from(100)
    } else {
        Decimal::ZERO
    }
}

/// Groups line items by their referenced item, summing quantity and revenue.
/// Lines whose item no longer exists (or is soft-deleted) are skipped, which
/// mirrors the visible-rows join the listing endpoints use. Ordered by summed
/// quantity descending; ties break on item name ascending.
fn rank_top_items(
    lines: &[invoice_item::Model],
    item_names: &HashMap<i32, String>,
) -> Vec<TopSellingItem> {
    let mut by_item: HashMap<i32, (i64, Decimal)> = HashMap::new();
    for line in lines {
        if !item_names.contains_key(&line.item_id) {
            continue;
        }
        let entry = by_item.entry(line.item_id).or_insert((0, Decimal::ZERO));
        entry.0 += i64::from(line.quantity);
        entry.1 += Decimal::from(line.quantity) * line.price;
    }

    let mut ranked: Vec<TopSellingItem> = by_item
        .into_iter()
        .map(|(item_id, (quantity, revenue))| TopSellingItem {
            item_name: item_names[&item_id].clone(),
            quantity,
            revenue,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    ranked.truncate(TOP_ITEMS_LIMIT);
    ranked
}

/// Read-only aggregation over invoices and items. Every request recomputes
/// from the store; nothing is cached.
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Computes the summary metrics block
    #[instrument(skip(self))]
    pub async fn get_metrics(&self) -> Result<DashboardMetrics, ServiceError> {
        let db = &*self.db_pool;

        let invoices = InvoiceEntity::find()
            .filter(invoice::Column::DeletedAt.is_null())
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch invoices for dashboard metrics");
                ServiceError::DatabaseError(e)
            })?;

        let total_items = ItemEntity::find()
            .filter(item::Column::DeletedAt.is_null())
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count items for dashboard metrics");
                ServiceError::DatabaseError(e)
            })?;

        let total_revenue: Decimal = invoices.iter().map(|inv| inv.total).sum();
        let total_orders = invoices.len() as i64;
        let average_order_value = if total_orders > 0 {
            total_revenue / Decimal::from(total_orders)
        } else {
            Decimal::ZERO
        };

        let now = Utc::now();
        let week_start = now - Duration::days(7);
        let previous_week_start = week_start - Duration::days(7);

        let mut recent_revenue = Decimal::ZERO;
        let mut recent_orders = 0i64;
        let mut previous_week_revenue = Decimal::ZERO;
        for inv in &invoices {
            if inv.date >= week_start {
                recent_revenue += inv.total;
                recent_orders += 1;
            } else if inv.date >= previous_week_start {
                previous_week_revenue += inv.total;
            }
        }

        Ok(DashboardMetrics {
            total_revenue,
            total_orders,
            average_order_value,
            total_items: total_items as i64,
            recent_revenue,
            recent_orders,
            growth_rate: growth_rate(recent_revenue, previous_week_revenue),
        })
    }

    /// Top five items by units sold across all invoices
    #[instrument(skip(self))]
    pub async fn get_top_selling_items(&self) -> Result<Vec<TopSellingItem>, ServiceError> {
        let db = &*self.db_pool;

        let lines = InvoiceItemEntity::find()
            .filter(invoice_item::Column::DeletedAt.is_null())
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch line items for top sellers");
                ServiceError::DatabaseError(e)
            })?;

        let items = ItemEntity::find()
            .filter(item::Column::DeletedAt.is_null())
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch items for top sellers");
                ServiceError::DatabaseError(e)
            })?;

        let item_names: HashMap<i32, String> = items
            .into_iter()
            .map(|item| (item.id, item.name))
            .collect();

        Ok(rank_top_items(&lines, &item_names))
    }

    /// Latest five invoices by business date, with their line-item counts
    #[instrument(skip(self))]
    pub async fn get_recent_orders(&self) -> Result<Vec<RecentOrder>, ServiceError> {
        let db = &*self.db_pool;

        let invoices = InvoiceEntity::find()
            .filter(invoice::Column::DeletedAt.is_null())
            .order_by_desc(invoice::Column::Date)
            .limit(RECENT_ORDERS_LIMIT)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch invoices for recent orders");
                ServiceError::DatabaseError(e)
            })?;

        let mut orders = Vec::with_capacity(invoices.len());
        for inv in invoices {
            let item_count = InvoiceItemEntity::find()
                .filter(invoice_item::Column::InvoiceId.eq(inv.id))
                .filter(invoice_item::Column::DeletedAt.is_null())
                .count(db)
                .await
                .map_err(|e| {
                    error!(error = %e, invoice_id = inv.id, "Failed to count line items for recent orders");
                    ServiceError::DatabaseError(e)
                })?;

            orders.push(RecentOrder {
                invoice_number: inv.invoice_number,
                customer_name: inv.customer_name,
                item_count: item_count as i64,
                total: inv.total,
                date: inv.date,
            });
        }

        Ok(orders)
    }
}
