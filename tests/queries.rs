use chrono::{Datelike, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{Condition, ConnectionTrait, Statement};

use order_system::{
    config::AppConfig,
    db::{Db, run_migrations},
    entity::{OrderItems, Orders, ProductReviews, Products, Users},
    models::{Order, OrderItem, OrderStatus, Product, ProductReview, User},
    repository::{
        self, order_items, orders, product_reviews, products, spec, users,
    },
};

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

struct Fixture {
    ana: i64,
    bruno: i64,
    carla: i64,
    mouse: i64,
    keyboard: i64,
    hub: i64,
    paid_order: i64,
}

// One fixture, then every query style per entity: derived finders, builder
// queries, native SQL, and composed predicates.
#[tokio::test]
async fn query_styles_over_seeded_data() -> anyhow::Result<()> {
    let Some(db) = setup().await? else {
        return Ok(());
    };
    let fx = seed(&db).await?;
    let now = Utc::now();

    // --- derived finders ---

    assert!(users::find_by_email(&db, "ana@x.com").await?.is_some());
    assert!(users::exists_by_email(&db, "ana@x.com").await?);
    assert!(!users::exists_by_email(&db, "nobody@x.com").await?);

    let hits = users::find_by_name_containing(&db, "AN").await?;
    assert_eq!(hits.len(), 1, "ilike match is case-insensitive");
    assert_eq!(hits[0].name, "Ana");

    assert_eq!(products::find_by_stock_at_most(&db, 5).await?.len(), 2);
    assert_eq!(
        products::find_by_price_between(&db, money(4000), money(10000))
            .await?
            .len(),
        2,
        "mouse at 50.00 and hub at 95.50"
    );

    assert_eq!(orders::find_by_user(&db, fx.ana).await?.len(), 2);
    assert_eq!(
        orders::find_by_status(&db, OrderStatus::Paid).await?.len(),
        2
    );
    assert_eq!(
        orders::find_by_user_and_status(&db, fx.ana, OrderStatus::Paid)
            .await?
            .len(),
        1
    );
    assert_eq!(
        orders::find_by_total_greater_than(&db, money(12000))
            .await?
            .len(),
        2,
        "230.00 and 180.00"
    );

    assert_eq!(order_items::find_by_product(&db, fx.mouse).await?.len(), 3);
    assert_eq!(
        order_items::find_by_quantity_greater_than(&db, 1).await?.len(),
        1
    );

    assert!(product_reviews::exists_for(&db, fx.ana, fx.mouse).await?);
    assert_eq!(product_reviews::find_by_user(&db, fx.ana).await?.len(), 2);
    assert_eq!(
        product_reviews::find_by_product(&db, fx.keyboard).await?.len(),
        1
    );
    assert_eq!(
        product_reviews::find_by_rating_at_least(&db, 4).await?.len(),
        3
    );

    // --- builder queries ---

    assert_eq!(
        users::find_created_after(&db, now - Duration::days(1))
            .await?
            .len(),
        3
    );
    let with_orders = users::find_with_orders(&db).await?;
    assert_eq!(with_orders.len(), 3, "every fixture user has orders");
    let ana_orders = with_orders
        .iter()
        .find(|(u, _)| u.id == Some(fx.ana))
        .map(|(_, o)| o.len());
    assert_eq!(ana_orders, Some(2));

    assert_eq!(products::find_available(&db).await?.len(), 2);
    assert_eq!(products::count_available(&db).await?, 2);
    assert_eq!(
        products::find_more_expensive_than(&db, money(9000)).await?.len(),
        2
    );
    let by_price = products::find_all_by_price_desc(&db).await?;
    assert_eq!(by_price[0].name, "Keyboard");

    assert_eq!(
        orders::find_created_between(&db, now - Duration::days(1), now + Duration::days(1))
            .await?
            .len(),
        4
    );
    let ana_with_items = orders::find_with_items_by_user(&db, fx.ana).await?;
    assert_eq!(ana_with_items.len(), 2);
    let paid = ana_with_items
        .iter()
        .find(|o| o.status == OrderStatus::Paid)
        .expect("paid order present");
    assert_eq!(paid.items().len(), 2);

    assert_eq!(
        orders::total_sales_by_user(&db, fx.ana).await?,
        Some(money(23000))
    );
    assert_eq!(
        orders::total_sales_by_user(&db, fx.carla).await?,
        None,
        "cancelled orders do not count as sales"
    );

    assert_eq!(order_items::find_paid_by_user(&db, fx.ana).await?.len(), 2);
    assert!(order_items::find_paid_by_user(&db, fx.carla).await?.is_empty());
    assert_eq!(
        order_items::total_quantity_sold(&db, fx.mouse).await?,
        Some(4)
    );
    let pairs = order_items::find_with_product_by_order(&db, fx.paid_order).await?;
    assert_eq!(pairs.len(), 2);
    assert!(pairs.iter().any(|(_, p)| p.name == "Mouse"));

    assert_eq!(
        product_reviews::find_high_rated(&db, fx.mouse, 5).await?.len(),
        1
    );
    let avg = product_reviews::average_rating(&db, fx.mouse)
        .await?
        .expect("mouse has reviews");
    assert!(avg > Decimal::from(4) && avg < Decimal::from(5));
    assert_eq!(product_reviews::average_rating(&db, fx.hub).await?, None);
    let details = product_reviews::find_with_user_and_product(&db, fx.mouse).await?;
    assert_eq!(details.len(), 3);
    assert!(details.iter().any(|d| d.user_name == "Ana"));
    assert!(details.iter().all(|d| d.product_name == "Mouse"));

    // --- native SQL ---

    assert!(users::find_by_email_native(&db, "bruno@x.com").await?.is_some());
    assert_eq!(
        users::count_registered_in_month(&db, now.month() as i32, now.year()).await?,
        3
    );
    assert_eq!(users::search_by_name(&db, "ar").await?.len(), 1, "Carla");

    let low = products::find_low_stock_native(&db, 5).await?;
    assert_eq!(low.len(), 2);
    assert_eq!(low[0].name, "Hub", "ordered by stock ascending");
    assert_eq!(products::total_inventory_value(&db).await?, money(140000));
    let stats = products::price_statistics(&db, money(0), money(100000)).await?;
    assert_eq!(stats.product_count, 3);
    assert_eq!(stats.minimum, Some(money(5000)));
    assert_eq!(stats.maximum, Some(money(18000)));

    assert_eq!(
        orders::find_by_month_and_year(&db, now.month() as i32, now.year())
            .await?
            .len(),
        4
    );
    let counts = orders::count_by_status(&db).await?;
    let paid_count = counts
        .iter()
        .find(|c| c.status == "PAID")
        .map(|c| c.count);
    assert_eq!(paid_count, Some(2));
    let sales = orders::sales_statistics(&db, now - Duration::days(1), now + Duration::days(1))
        .await?;
    assert_eq!(sales.order_count, 2);
    assert_eq!(sales.total_sales, money(33000));
    assert_eq!(sales.min_total, money(10000));
    assert_eq!(sales.max_total, money(23000));
    let top_users = orders::top_users_by_sales(&db, 5).await?;
    assert_eq!(top_users[0].name, "Ana");
    assert_eq!(top_users[0].total_sales, money(23000));

    assert_eq!(
        order_items::find_by_order_native(&db, fx.paid_order).await?.len(),
        2
    );
    let top_sellers = order_items::top_selling_products(&db, 5).await?;
    assert_eq!(top_sellers[0].name, "Mouse");
    assert_eq!(top_sellers[0].total_quantity, 3, "paid orders only");
    let revenue = order_items::revenue_by_product(&db).await?;
    assert_eq!(revenue[0].name, "Keyboard");
    assert_eq!(revenue[0].revenue, money(18000));

    assert_eq!(
        product_reviews::find_by_product_native(&db, fx.mouse).await?.len(),
        3
    );
    let review_stats = product_reviews::review_statistics(&db, fx.mouse).await?;
    assert_eq!(review_stats.review_count, 3);
    assert_eq!(review_stats.min_rating, Some(4));
    assert_eq!(review_stats.max_rating, Some(5));
    let empty_stats = product_reviews::review_statistics(&db, fx.hub).await?;
    assert_eq!(empty_stats.review_count, 0);
    assert_eq!(empty_stats.average_rating, None);
    let top_rated = product_reviews::top_rated_products(&db, 5).await?;
    assert_eq!(top_rated.len(), 1, "only the mouse has three reviews");
    assert_eq!(top_rated[0].product_id, fx.mouse);

    // --- composed predicates ---

    let in_stock_with_o = repository::find_where::<Products>(
        &db,
        Condition::all()
            .add(spec::products::name_contains("o"))
            .add(spec::products::has_stock()),
    )
    .await?;
    assert_eq!(in_stock_with_o.len(), 2, "Mouse and Keyboard");

    let gone_or_pricey = repository::find_where::<Products>(
        &db,
        Condition::any()
            .add(spec::products::out_of_stock())
            .add(spec::products::price_greater_than(money(17000))),
    )
    .await?;
    assert_eq!(gone_or_pricey.len(), 2, "Hub and Keyboard");

    assert_eq!(
        repository::count_where::<Orders>(
            &db,
            Condition::all()
                .add(spec::orders::by_user(fx.ana))
                .add(spec::orders::by_status(OrderStatus::Paid)),
        )
        .await?,
        1
    );

    assert!(
        repository::exists_where::<ProductReviews>(
            &db,
            Condition::all()
                .add(spec::product_reviews::has_comment())
                .add(spec::product_reviews::rating_at_least(5)),
        )
        .await?
    );

    assert_eq!(
        repository::find_where::<OrderItems>(&db, spec::order_items::by_user(fx.bruno))
            .await?
            .len(),
        1
    );

    assert_eq!(
        repository::find_where::<Users>(&db, spec::users::created_between(None, None))
            .await?
            .len(),
        3,
        "empty bounds filter nothing"
    );
    assert_eq!(
        repository::count_where::<Users>(&db, spec::users::has_orders()).await?,
        3
    );

    Ok(())
}

async fn seed(db: &Db) -> anyhow::Result<Fixture> {
    let ana = users::insert(db, &User::new("Ana", "ana@x.com")).await?;
    let bruno = users::insert(db, &User::new("Bruno", "bruno@x.com")).await?;
    let carla = users::insert(db, &User::new("Carla", "carla@x.com")).await?;
    let (ana, bruno, carla) = (
        ana.id.expect("id"),
        bruno.id.expect("id"),
        carla.id.expect("id"),
    );

    let mouse = products::insert(db, &Product::new("Mouse", money(5000), 10)).await?;
    let keyboard = products::insert(db, &Product::new("Keyboard", money(18000), 5)).await?;
    let hub = products::insert(db, &Product::new("Hub", money(9550), 0)).await?;
    let (mouse, keyboard, hub) = (
        mouse.id.expect("id"),
        keyboard.id.expect("id"),
        hub.id.expect("id"),
    );

    // Ana: one paid order with two items, one fresh order.
    let mut order = Order::new(money(23000), ana);
    order.status = OrderStatus::Paid;
    let mut item = OrderItem::new(1, mouse);
    item.subtotal = Some(money(5000));
    order.add_item(item);
    let mut item = OrderItem::new(1, keyboard);
    item.subtotal = Some(money(18000));
    order.add_item(item);
    let paid_order = orders::insert(db, &order).await?.id.expect("id");

    let mut order = Order::new(money(5000), ana);
    let mut item = OrderItem::new(1, mouse);
    item.subtotal = Some(money(5000));
    order.add_item(item);
    orders::insert(db, &order).await?;

    // Bruno: a paid order for two mice.
    let mut order = Order::new(money(10000), bruno);
    order.status = OrderStatus::Paid;
    let mut item = OrderItem::new(2, mouse);
    item.subtotal = Some(money(10000));
    order.add_item(item);
    orders::insert(db, &order).await?;

    // Carla: a cancelled order.
    let mut order = Order::new(money(18000), carla);
    order.status = OrderStatus::Cancelled;
    let mut item = OrderItem::new(1, keyboard);
    item.subtotal = Some(money(18000));
    order.add_item(item);
    orders::insert(db, &order).await?;

    product_reviews::insert(
        db,
        &ProductReview::new(ana, mouse, 5, Some("Excellent tracking".into())),
    )
    .await?;
    product_reviews::insert(db, &ProductReview::new(bruno, mouse, 4, None)).await?;
    product_reviews::insert(
        db,
        &ProductReview::new(carla, mouse, 4, Some("Good value".into())),
    )
    .await?;
    product_reviews::insert(
        db,
        &ProductReview::new(ana, keyboard, 3, Some("Loud but sturdy".into())),
    )
    .await?;

    Ok(Fixture {
        ana,
        bruno,
        carla,
        mouse,
        keyboard,
        hub,
        paid_order,
    })
}

async fn setup() -> anyhow::Result<Option<Db>> {
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

    let backend = db.orm.get_database_backend();
    db.orm
        .execute(Statement::from_string(
            backend,
            "TRUNCATE TABLE order_items, orders, product_reviews, products, users RESTART IDENTITY CASCADE",
        ))
        .await?;

    Ok(Some(db))
}
