use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};

use crate::{
    db::Db,
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column, Entity as Orders, Model as OrderModel},
    },
    error::{Error, Result},
    models::{Order, OrderStatus},
};

use super::order_items::order_item_from_entity;

/// Insert the order and, in the same transaction, every item it owns.
/// Returns the persisted aggregate with ids and timestamps filled in.
pub async fn insert(db: &Db, order: &Order) -> Result<Order> {
    let txn = db.orm.begin().await?;

    let model = OrderActive {
        id: NotSet,
        total: Set(order.total),
        status: Set(order.status.to_string()),
        user_id: Set(order.user_id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(order.items().len());
    for item in order.items() {
        let persisted = OrderItemActive {
            id: NotSet,
            quantity: Set(item.quantity),
            subtotal: Set(item.subtotal),
            order_id: Set(model.id),
            product_id: Set(item.product_id),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(persisted));
    }

    txn.commit().await?;

    let mut persisted = order_from_entity(model)?;
    persisted.attach_items(items);
    Ok(persisted)
}

/// Persist the aggregate: update the order row, insert items added since the
/// last load, update the ones still attached, and delete the ones detached
/// through the remove helpers (orphan removal). Falls back to [`insert`] for
/// an unsaved order.
pub async fn save(db: &Db, order: &Order) -> Result<Order> {
    let Some(order_id) = order.id else {
        return insert(db, order).await;
    };

    let txn = db.orm.begin().await?;

    let existing = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound)?;
    let mut active: OrderActive = existing.into();
    active.total = Set(order.total);
    active.status = Set(order.status.to_string());
    active.user_id = Set(order.user_id);
    let model = active.update(&txn).await?;

    let removed = order.removed_item_ids();
    if !removed.is_empty() {
        OrderItems::delete_many()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .filter(OrderItemCol::Id.is_in(removed.iter().copied()))
            .exec(&txn)
            .await?;
    }

    let mut items = Vec::with_capacity(order.items().len());
    for item in order.items() {
        let persisted = match item.id {
            None => {
                OrderItemActive {
                    id: NotSet,
                    quantity: Set(item.quantity),
                    subtotal: Set(item.subtotal),
                    order_id: Set(order_id),
                    product_id: Set(item.product_id),
                    created_at: NotSet,
                }
                .insert(&txn)
                .await?
            }
            Some(item_id) => {
                let row = OrderItems::find_by_id(item_id)
                    .one(&txn)
                    .await?
                    .ok_or(Error::NotFound)?;
                let mut active: OrderItemActive = row.into();
                active.quantity = Set(item.quantity);
                active.subtotal = Set(item.subtotal);
                active.update(&txn).await?
            }
        };
        items.push(order_item_from_entity(persisted));
    }

    txn.commit().await?;

    let mut persisted = order_from_entity(model)?;
    persisted.attach_items(items);
    Ok(persisted)
}

pub async fn find_by_id(db: &Db, id: i64) -> Result<Option<Order>> {
    let order = Orders::find_by_id(id).one(&db.orm).await?;
    order.map(order_from_entity).transpose()
}

pub async fn find_by_id_with_items(db: &Db, id: i64) -> Result<Option<Order>> {
    let Some(model) = Orders::find_by_id(id).one(&db.orm).await? else {
        return Ok(None);
    };
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(model.id))
        .all(&db.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();
    let mut order = order_from_entity(model)?;
    order.attach_items(items);
    Ok(Some(order))
}

/// The database cascades the delete to the order's items.
pub async fn delete(db: &Db, id: i64) -> Result<()> {
    Orders::delete_by_id(id).exec(&db.orm).await?;
    Ok(())
}

pub async fn find_by_user(db: &Db, user_id: i64) -> Result<Vec<Order>> {
    let orders = Orders::find()
        .filter(Column::UserId.eq(user_id))
        .all(&db.orm)
        .await?;
    orders.into_iter().map(order_from_entity).collect()
}

pub async fn find_by_status(db: &Db, status: OrderStatus) -> Result<Vec<Order>> {
    let orders = Orders::find()
        .filter(Column::Status.eq(status.as_str()))
        .all(&db.orm)
        .await?;
    orders.into_iter().map(order_from_entity).collect()
}

pub async fn find_by_user_and_status(
    db: &Db,
    user_id: i64,
    status: OrderStatus,
) -> Result<Vec<Order>> {
    let orders = Orders::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Status.eq(status.as_str()))
        .all(&db.orm)
        .await?;
    orders.into_iter().map(order_from_entity).collect()
}

pub async fn find_by_total_greater_than(db: &Db, total: Decimal) -> Result<Vec<Order>> {
    let orders = Orders::find()
        .filter(Column::Total.gt(total))
        .all(&db.orm)
        .await?;
    orders.into_iter().map(order_from_entity).collect()
}

pub async fn find_created_between(
    db: &Db,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Order>> {
    let orders = Orders::find()
        .filter(Column::CreatedAt.between(start, end))
        .all(&db.orm)
        .await?;
    orders.into_iter().map(order_from_entity).collect()
}

/// A user's orders with their items eagerly loaded.
pub async fn find_with_items_by_user(db: &Db, user_id: i64) -> Result<Vec<Order>> {
    let rows = Orders::find()
        .filter(Column::UserId.eq(user_id))
        .find_with_related(OrderItems)
        .all(&db.orm)
        .await?;
    rows.into_iter()
        .map(|(model, items)| {
            let mut order = order_from_entity(model)?;
            order.attach_items(items.into_iter().map(order_item_from_entity).collect());
            Ok(order)
        })
        .collect()
}

/// Sum of the user's PAID order totals; `None` when the user has none.
pub async fn total_sales_by_user(db: &Db, user_id: i64) -> Result<Option<Decimal>> {
    let total = Orders::find()
        .select_only()
        .column_as(Column::Total.sum(), "total_sales")
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Status.eq(OrderStatus::Paid.as_str()))
        .into_tuple::<Option<Decimal>>()
        .one(&db.orm)
        .await?;
    Ok(total.flatten())
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    total: Decimal,
    status: String,
    user_id: i64,
    created_at: DateTime<Utc>,
}

/// One row per status value present in the orders table.
#[derive(Debug, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Aggregate figures over PAID orders in a date range.
#[derive(Debug, sqlx::FromRow)]
pub struct SalesStatistics {
    pub order_count: i64,
    pub total_sales: Decimal,
    pub average_total: Decimal,
    pub min_total: Decimal,
    pub max_total: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
pub struct TopUserSales {
    pub user_id: i64,
    pub name: String,
    pub total_sales: Decimal,
}

pub async fn find_by_month_and_year(db: &Db, month: i32, year: i32) -> Result<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(
        "SELECT id, total, status, user_id, created_at FROM orders \
         WHERE EXTRACT(MONTH FROM created_at)::int = $1 \
           AND EXTRACT(YEAR FROM created_at)::int = $2",
    )
    .bind(month)
    .bind(year)
    .fetch_all(&db.pool)
    .await?;
    rows.into_iter().map(order_from_row).collect()
}

pub async fn count_by_status(db: &Db) -> Result<Vec<StatusCount>> {
    let rows: Vec<StatusCount> = sqlx::query_as(
        "SELECT status, COUNT(*) AS count FROM orders GROUP BY status ORDER BY status",
    )
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

pub async fn sales_statistics(
    db: &Db,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<SalesStatistics> {
    let stats: SalesStatistics = sqlx::query_as(
        "SELECT COUNT(*) AS order_count, \
                COALESCE(SUM(total), 0) AS total_sales, \
                COALESCE(AVG(total), 0) AS average_total, \
                COALESCE(MIN(total), 0) AS min_total, \
                COALESCE(MAX(total), 0) AS max_total \
         FROM orders \
         WHERE created_at BETWEEN $1 AND $2 AND status = 'PAID'",
    )
    .bind(start)
    .bind(end)
    .fetch_one(&db.pool)
    .await?;
    Ok(stats)
}

pub async fn top_users_by_sales(db: &Db, limit: i64) -> Result<Vec<TopUserSales>> {
    let rows: Vec<TopUserSales> = sqlx::query_as(
        "SELECT u.id AS user_id, u.name, SUM(o.total) AS total_sales \
         FROM orders o \
         JOIN users u ON o.user_id = u.id \
         WHERE o.status = 'PAID' \
         GROUP BY u.id, u.name \
         ORDER BY total_sales DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

fn order_from_row(row: OrderRow) -> Result<Order> {
    let mut order = Order::new(row.total, row.user_id);
    order.id = Some(row.id);
    order.status = row.status.parse()?;
    order.created_at = Some(row.created_at);
    Ok(order)
}

pub(crate) fn order_from_entity(model: OrderModel) -> Result<Order> {
    let mut order = Order::new(model.total, model.user_id);
    order.id = Some(model.id);
    order.status = model.status.parse()?;
    order.created_at = Some(model.created_at.with_timezone(&Utc));
    Ok(order)
}
