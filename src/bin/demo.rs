use anyhow::Context;
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use order_system::{
    config::AppConfig,
    db::{Db, run_migrations},
    models::{Order, OrderItem, Product, User},
    repository::{order_items, orders, products, users},
};

// Walks one order through its life: create a user and a product, place an
// order with one item, then delete the user and watch the cascade.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,order_system=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let db = Db::connect(&config).await?;
    run_migrations(&db.orm).await?;

    // Allow re-runs: drop the demo user from any previous invocation.
    if let Some(previous) = users::find_by_email(&db, "ana@example.com").await? {
        if let Some(id) = previous.id {
            users::delete(&db, id).await?;
        }
    }

    let ana = users::insert(&db, &User::new("Ana", "ana@example.com")).await?;
    let ana_id = ana.id.context("user id not assigned")?;
    tracing::info!(user_id = ana_id, email = %ana.email, "user created");

    let mouse = products::insert(&db, &Product::new("Mouse", Decimal::new(5000, 2), 10)).await?;
    let mouse_id = mouse.id.context("product id not assigned")?;
    tracing::info!(product_id = mouse_id, price = %mouse.price, "product created");

    let mut order = Order::new(Decimal::new(5000, 2), ana_id);
    let mut item = OrderItem::new(1, mouse_id);
    item.subtotal = Some(Decimal::new(5000, 2));
    order.add_item(item);

    let order = orders::insert(&db, &order).await?;
    let order_id = order.id.context("order id not assigned")?;
    tracing::info!(
        order_id,
        status = %order.status,
        items = order.items().len(),
        "order placed"
    );
    println!("{}", serde_json::to_string_pretty(&order)?);

    let stored_items = order_items::find_by_order(&db, order_id).await?;
    tracing::info!(count = stored_items.len(), "items on record for the order");

    users::delete(&db, ana_id).await?;
    let remaining_orders = orders::find_by_user(&db, ana_id).await?;
    let remaining_items = order_items::find_by_order(&db, order_id).await?;
    tracing::info!(
        orders = remaining_orders.len(),
        items = remaining_items.len(),
        "rows left after deleting the user"
    );

    products::delete(&db, mouse_id).await?;
    Ok(())
}
