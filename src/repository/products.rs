use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    db::Db,
    entity::products::{ActiveModel as ProductActive, Column, Entity as Products, Model as ProductModel},
    error::{Error, Result},
    models::Product,
};

pub async fn insert(db: &Db, product: &Product) -> Result<Product> {
    let active = ProductActive {
        id: NotSet,
        name: Set(product.name.clone()),
        price: Set(product.price),
        stock: Set(product.stock),
        created_at: NotSet,
    };
    let model = active.insert(&db.orm).await?;
    Ok(product_from_entity(model))
}

pub async fn update(db: &Db, product: &Product) -> Result<Product> {
    let id = product.id.ok_or(Error::NotFound)?;
    let existing = Products::find_by_id(id)
        .one(&db.orm)
        .await?
        .ok_or(Error::NotFound)?;
    let mut active: ProductActive = existing.into();
    active.name = Set(product.name.clone());
    active.price = Set(product.price);
    active.stock = Set(product.stock);
    let model = active.update(&db.orm).await?;
    Ok(product_from_entity(model))
}

pub async fn find_by_id(db: &Db, id: i64) -> Result<Option<Product>> {
    let product = Products::find_by_id(id).one(&db.orm).await?;
    Ok(product.map(product_from_entity))
}

pub async fn find_all(db: &Db) -> Result<Vec<Product>> {
    let products = Products::find().all(&db.orm).await?;
    Ok(products.into_iter().map(product_from_entity).collect())
}

/// The database cascades the delete to order items and reviews that
/// reference the product.
pub async fn delete(db: &Db, id: i64) -> Result<()> {
    Products::delete_by_id(id).exec(&db.orm).await?;
    Ok(())
}

pub async fn find_by_name_containing(db: &Db, name: &str) -> Result<Vec<Product>> {
    let pattern = format!("%{name}%");
    let products = Products::find()
        .filter(Expr::col(Column::Name).ilike(pattern))
        .all(&db.orm)
        .await?;
    Ok(products.into_iter().map(product_from_entity).collect())
}

pub async fn find_by_stock_at_most(db: &Db, threshold: i32) -> Result<Vec<Product>> {
    let products = Products::find()
        .filter(Column::Stock.lte(threshold))
        .all(&db.orm)
        .await?;
    Ok(products.into_iter().map(product_from_entity).collect())
}

pub async fn find_by_price_between(db: &Db, min: Decimal, max: Decimal) -> Result<Vec<Product>> {
    let products = Products::find()
        .filter(Column::Price.between(min, max))
        .all(&db.orm)
        .await?;
    Ok(products.into_iter().map(product_from_entity).collect())
}

pub async fn find_available(db: &Db) -> Result<Vec<Product>> {
    let products = Products::find()
        .filter(Column::Stock.gt(0))
        .all(&db.orm)
        .await?;
    Ok(products.into_iter().map(product_from_entity).collect())
}

pub async fn find_more_expensive_than(db: &Db, price: Decimal) -> Result<Vec<Product>> {
    let products = Products::find()
        .filter(Column::Price.gt(price))
        .all(&db.orm)
        .await?;
    Ok(products.into_iter().map(product_from_entity).collect())
}

pub async fn find_all_by_price_desc(db: &Db) -> Result<Vec<Product>> {
    let products = Products::find()
        .order_by_desc(Column::Price)
        .all(&db.orm)
        .await?;
    Ok(products.into_iter().map(product_from_entity).collect())
}

pub async fn count_available(db: &Db) -> Result<u64> {
    let count = Products::find()
        .filter(Column::Stock.gt(0))
        .count(&db.orm)
        .await?;
    Ok(count)
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: Decimal,
    stock: i32,
    created_at: chrono::DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: Some(row.id),
            name: row.name,
            price: row.price,
            stock: row.stock,
            created_at: Some(row.created_at),
        }
    }
}

/// Aggregate figures over products in a price range.
#[derive(Debug, sqlx::FromRow)]
pub struct PriceStatistics {
    pub average: Option<Decimal>,
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
    pub product_count: i64,
}

pub async fn find_low_stock_native(db: &Db, threshold: i32) -> Result<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(
        "SELECT id, name, price, stock, created_at FROM products \
         WHERE stock <= $1 ORDER BY stock ASC",
    )
    .bind(threshold)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows.into_iter().map(Product::from).collect())
}

pub async fn total_inventory_value(db: &Db) -> Result<Decimal> {
    let value: Decimal =
        sqlx::query_scalar("SELECT COALESCE(SUM(price * stock), 0) FROM products")
            .fetch_one(&db.pool)
            .await?;
    Ok(value)
}

pub async fn price_statistics(db: &Db, min: Decimal, max: Decimal) -> Result<PriceStatistics> {
    let stats: PriceStatistics = sqlx::query_as(
        "SELECT AVG(price) AS average, MIN(price) AS minimum, MAX(price) AS maximum, \
                COUNT(*) AS product_count \
         FROM products WHERE price BETWEEN $1 AND $2",
    )
    .bind(min)
    .bind(max)
    .fetch_one(&db.pool)
    .await?;
    Ok(stats)
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: Some(model.id),
        name: model.name,
        price: model.price,
        stock: model.stock,
        created_at: Some(model.created_at.with_timezone(&Utc)),
    }
}
