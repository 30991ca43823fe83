use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Statement};

use order_system::{
    config::AppConfig,
    db::{Db, run_migrations},
    models::{Order, OrderItem, Product, ProductReview, User},
    repository::{order_items, orders, product_reviews, products, users},
};

// Lifecycle flow: place an order through the parent-managed helpers, then
// exercise orphan removal and the delete cascades.
#[tokio::test]
async fn order_lifecycle_and_cascades() -> anyhow::Result<()> {
    let Some(db) = setup().await? else {
        return Ok(());
    };

    let ana = users::insert(&db, &User::new("Ana", "ana@x.com")).await?;
    let ana_id = ana.id.expect("id assigned on insert");
    assert!(ana.created_at.is_some(), "created_at is server-assigned");

    // The email column is unique; a second insert must fail.
    assert!(
        users::insert(&db, &User::new("Impostor", "ana@x.com"))
            .await
            .is_err()
    );

    let mouse = products::insert(&db, &Product::new("Mouse", Decimal::new(5000, 2), 10)).await?;
    let mouse_id = mouse.id.expect("id assigned on insert");

    let mut order = Order::new(Decimal::new(5000, 2), ana_id);
    let mut item = OrderItem::new(1, mouse_id);
    item.subtotal = Some(Decimal::new(5000, 2));
    order.add_item(item);

    let order = orders::insert(&db, &order).await?;
    let order_id = order.id.expect("id assigned on insert");
    assert_eq!(order.items().len(), 1);
    assert_eq!(
        order.items()[0].order_id,
        Some(order_id),
        "both sides of the relationship agree after persist"
    );

    let loaded = orders::find_by_id_with_items(&db, order_id)
        .await?
        .expect("order exists");
    assert_eq!(loaded.items().len(), 1);
    assert_eq!(loaded.items()[0].product_id, mouse_id);

    // Orphan removal: detach the item, save, and the row is gone.
    let mut editable = loaded;
    let item_id = editable.items()[0].id.expect("persisted item has an id");
    let detached = editable.remove_item_by_id(item_id).expect("item present");
    assert_eq!(detached.order_id, None, "back-reference cleared on remove");
    let saved = orders::save(&db, &editable).await?;
    assert!(saved.items().is_empty());
    assert!(order_items::find_by_order(&db, order_id).await?.is_empty());

    // Items added to an already-saved order are picked up by the next save.
    let mut editable = saved;
    let mut replacement = OrderItem::new(2, mouse_id);
    replacement.subtotal = Some(Decimal::new(10000, 2));
    editable.add_item(replacement);
    let saved = orders::save(&db, &editable).await?;
    assert_eq!(saved.items().len(), 1);
    assert_eq!(saved.items()[0].quantity, 2);

    // One review per (user, product) pair.
    product_reviews::insert(
        &db,
        &ProductReview::new(ana_id, mouse_id, 5, Some("great".into())),
    )
    .await?;
    assert!(
        product_reviews::insert(&db, &ProductReview::new(ana_id, mouse_id, 1, None))
            .await
            .is_err()
    );

    // Deleting a product takes its order items and reviews with it, but
    // leaves the order row behind.
    let keyboard =
        products::insert(&db, &Product::new("Keyboard", Decimal::new(18000, 2), 5)).await?;
    let keyboard_id = keyboard.id.expect("id assigned on insert");
    let mut editable = saved;
    let mut extra = OrderItem::new(1, keyboard_id);
    extra.subtotal = Some(Decimal::new(18000, 2));
    editable.add_item(extra);
    orders::save(&db, &editable).await?;
    product_reviews::insert(&db, &ProductReview::new(ana_id, keyboard_id, 4, None)).await?;

    products::delete(&db, keyboard_id).await?;
    assert!(order_items::find_by_product(&db, keyboard_id).await?.is_empty());
    assert!(product_reviews::find_by_product(&db, keyboard_id).await?.is_empty());
    assert!(orders::find_by_id(&db, order_id).await?.is_some());

    // Deleting the user cascades to orders, their items, and reviews.
    users::delete(&db, ana_id).await?;
    assert!(orders::find_by_user(&db, ana_id).await?.is_empty());
    assert!(order_items::find_by_order(&db, order_id).await?.is_empty());
    assert!(product_reviews::find_by_user(&db, ana_id).await?.is_empty());

    Ok(())
}

async fn setup() -> anyhow::Result<Option<Db>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests."
                );
                return Ok(None);
            }
        };

    let config = AppConfig {
        database_url,
        max_connections: 5,
    };
    let db = Db::connect(&config).await?;
    run_migrations(&db.orm).await?;

    // Clean tables between runs
    let backend = db.orm.get_database_backend();
    db.orm
        .execute(Statement::from_string(
            backend,
            "TRUNCATE TABLE order_items, orders, product_reviews, products, users RESTART IDENTITY CASCADE",
        ))
        .await?;

    Ok(Some(db))
}
