use rust_decimal::Decimal;
use shopsphere_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    domain::wishlist::DEFAULT_WISHLIST_NAME,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&create_orm_conn(&pool)).await?;

    let seller_id = ensure_user(&pool, "seller@example.com", "Grace", "Hopper", "seller").await?;
    sqlx::query(
        "INSERT INTO sellers (id, company_name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
    )
    .bind(seller_id)
    .bind("Ferris Goods")
    .execute(&pool)
    .await?;

    let customer_id =
        ensure_user(&pool, "customer@example.com", "Ada", "Lovelace", "customer").await?;
    ensure_customer(&pool, customer_id).await?;

    seed_listings(&pool, seller_id).await?;

    println!("Seed completed. Seller ID: {seller_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    name: &str,
    surname: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, surname, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(surname)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn ensure_customer(pool: &sqlx::PgPool, customer_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO customers (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(customer_id)
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO carts (id, customer_id) VALUES ($1, $2) ON CONFLICT (customer_id) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .execute(pool)
        .await?;
    sqlx::query(
        "INSERT INTO wishlists (id, customer_id, name) VALUES ($1, $2, $3) ON CONFLICT (customer_id, name) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(customer_id)
    .bind(DEFAULT_WISHLIST_NAME)
    .execute(pool)
    .await?;
    Ok(())
}

async fn seed_listings(pool: &sqlx::PgPool, seller_id: Uuid) -> anyhow::Result<()> {
    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", Decimal::new(5500, 2), 50, "new"),
        ("Ferris Mug", "Coffee tastes better with Ferris", Decimal::new(1200, 2), 100, "new"),
        ("Rust Sticker Pack", "Decorate your laptop", Decimal::new(500, 2), 200, "new"),
        ("E-book: Async Rust", "Learn async Rust patterns", Decimal::new(2500, 2), 75, "refurbished"),
    ];

    for (name, desc, price, quantity, product_state) in products {
        let (product_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .fetch_one(pool)
        .await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM listings WHERE product_id = $1 AND seller_id = $2")
                .bind(product_id)
                .bind(seller_id)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO listings (id, product_id, seller_id, quantity, price, product_state, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(seller_id)
        .bind(quantity)
        .bind(price)
        .bind(product_state)
        .bind(quantity != 0)
        .execute(pool)
        .await?;
    }

    println!("Seeded products and listings");
    Ok(())
}
