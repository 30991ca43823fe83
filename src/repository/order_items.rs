use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait};

use crate::{
    db::Db,
    entity::{
        order_items::{self, Column, Entity as OrderItems, Model as OrderItemModel},
        orders::Column as OrderCol,
        products::Entity as Products,
    },
    error::Result,
    models::{OrderItem, OrderStatus, Product},
};

use super::products::product_from_entity;

// Items are persisted and deleted exclusively through their owning order
// (repository::orders::insert/save); this module only reads.

pub async fn find_by_order(db: &Db, order_id: i64) -> Result<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(Column::OrderId.eq(order_id))
        .all(&db.orm)
        .await?;
    Ok(items.into_iter().map(order_item_from_entity).collect())
}

pub async fn find_by_product(db: &Db, product_id: i64) -> Result<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(Column::ProductId.eq(product_id))
        .all(&db.orm)
        .await?;
    Ok(items.into_iter().map(order_item_from_entity).collect())
}

pub async fn find_by_quantity_greater_than(db: &Db, quantity: i32) -> Result<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(Column::Quantity.gt(quantity))
        .all(&db.orm)
        .await?;
    Ok(items.into_iter().map(order_item_from_entity).collect())
}

/// Items belonging to the user's PAID orders.
pub async fn find_paid_by_user(db: &Db, user_id: i64) -> Result<Vec<OrderItem>> {
    let items = OrderItems::find()
        .join(JoinType::InnerJoin, order_items::Relation::Orders.def())
        .filter(OrderCol::UserId.eq(user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Paid.as_str()))
        .all(&db.orm)
        .await?;
    Ok(items.into_iter().map(order_item_from_entity).collect())
}

/// Total quantity of a product across all order items; `None` when the
/// product was never ordered.
pub async fn total_quantity_sold(db: &Db, product_id: i64) -> Result<Option<i64>> {
    let total = OrderItems::find()
        .select_only()
        .column_as(Column::Quantity.sum(), "total_quantity")
        .filter(Column::ProductId.eq(product_id))
        .into_tuple::<Option<i64>>()
        .one(&db.orm)
        .await?;
    Ok(total.flatten())
}

/// An order's items paired with their products, fetched in one query.
pub async fn find_with_product_by_order(
    db: &Db,
    order_id: i64,
) -> Result<Vec<(OrderItem, Product)>> {
    let rows = OrderItems::find()
        .filter(Column::OrderId.eq(order_id))
        .find_also_related(Products)
        .all(&db.orm)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| {
            product.map(|p| (order_item_from_entity(item), product_from_entity(p)))
        })
        .collect())
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    quantity: i32,
    subtotal: Option<Decimal>,
    order_id: i64,
    product_id: i64,
    created_at: chrono::DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: Some(row.id),
            quantity: row.quantity,
            subtotal: row.subtotal,
            order_id: Some(row.order_id),
            product_id: row.product_id,
            created_at: Some(row.created_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct TopSellingProduct {
    pub product_id: i64,
    pub name: String,
    pub total_quantity: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRevenue {
    pub product_id: i64,
    pub name: String,
    pub revenue: Decimal,
}

pub async fn find_by_order_native(db: &Db, order_id: i64) -> Result<Vec<OrderItem>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(
        "SELECT id, quantity, subtotal, order_id, product_id, created_at \
         FROM order_items WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
}

/// Best sellers by quantity over PAID orders.
pub async fn top_selling_products(db: &Db, limit: i64) -> Result<Vec<TopSellingProduct>> {
    let rows: Vec<TopSellingProduct> = sqlx::query_as(
        "SELECT p.id AS product_id, p.name, SUM(oi.quantity) AS total_quantity \
         FROM order_items oi \
         JOIN products p ON oi.product_id = p.id \
         JOIN orders o ON oi.order_id = o.id \
         WHERE o.status = 'PAID' \
         GROUP BY p.id, p.name \
         ORDER BY total_quantity DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

pub async fn revenue_by_product(db: &Db) -> Result<Vec<ProductRevenue>> {
    let rows: Vec<ProductRevenue> = sqlx::query_as(
        "SELECT p.id AS product_id, p.name, COALESCE(SUM(oi.subtotal), 0) AS revenue \
         FROM order_items oi \
         JOIN products p ON oi.product_id = p.id \
         JOIN orders o ON oi.order_id = o.id \
         WHERE o.status = 'PAID' \
         GROUP BY p.id, p.name \
         ORDER BY revenue DESC",
    )
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: Some(model.id),
        quantity: model.quantity,
        subtotal: model.subtotal,
        order_id: Some(model.order_id),
        product_id: model.product_id,
        created_at: Some(model.created_at.with_timezone(&Utc)),
    }
}
