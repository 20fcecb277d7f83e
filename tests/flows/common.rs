use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use shopsphere_api::{
    config::{AppConfig, AppEnv},
    db::{create_pool, run_migrations},
    domain::user::UserRole,
    dto::{
        auth::RegisterRequest,
        cart::UpsertCartRequest,
        listings::CreateListingRequest,
        orders::CreateOrderRequest,
    },
    entity::{Listings, products::ActiveModel as ProductActive},
    middleware::auth::AuthUser,
    models::Listing,
    notify::{Notification, Notifier},
    services::{account_service, cart_service, listing_service},
    state::AppState,
};
use uuid::Uuid;

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Notifications go out on a spawned task, so poll briefly.
    pub async fn wait_for(&self, count: usize) -> Vec<Notification> {
        for _ in 0..50 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
}

/// Connects to the test database and clears every table. Returns `None` when no
/// database is configured so the suite can run without Postgres.
pub async fn setup() -> anyhow::Result<Option<TestApp>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run flow tests.");
            return Ok(None);
        }
    };

    let config = AppConfig {
        database_url: database_url.clone(),
        host: "127.0.0.1".into(),
        port: 0,
        app_env: AppEnv::Testing,
        jwt_secret: "test-secret".into(),
    };
    let pool = create_pool(&database_url).await?;
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::with_notifier(pool, config, notifier.clone());
    run_migrations(&state.orm).await?;

    let backend = state.orm.get_database_backend();
    state
        .orm
        .execute(Statement::from_string(
            backend,
            "TRUNCATE TABLE audit_logs, delete_requests, listing_reviews, wishlist_entries, wishlists, \
             order_entries, orders, cart_entries, carts, listings, products, \
             customer_addresses, customers, sellers, users CASCADE",
        ))
        .await?;

    Ok(Some(TestApp { state, notifier }))
}

pub async fn register(state: &AppState, email: &str, role: UserRole) -> anyhow::Result<AuthUser> {
    let company_name = match role {
        UserRole::Seller => Some(format!("{email} Ltd")),
        _ => None,
    };
    let account = account_service::register(
        state,
        RegisterRequest {
            email: email.to_string(),
            name: "Test".into(),
            surname: "User".into(),
            role: role.as_str().to_string(),
            company_name,
            phone_number: None,
        },
    )
    .await?
    .data
    .unwrap();

    Ok(AuthUser {
        user_id: account.id,
        role,
    })
}

pub async fn create_product(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(Some(format!("{name} for testing"))),
        image_src: Set(None),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

pub async fn create_listing(
    state: &AppState,
    seller: &AuthUser,
    product_name: &str,
    quantity: i32,
    price: Decimal,
) -> anyhow::Result<Listing> {
    let product_id = create_product(state, product_name).await?;
    let listing = listing_service::create_listing(
        state,
        seller,
        CreateListingRequest {
            product_id,
            quantity,
            price,
            product_state: "new".into(),
        },
    )
    .await?
    .data
    .unwrap();
    Ok(listing)
}

pub async fn put_in_cart(
    state: &AppState,
    customer: &AuthUser,
    listing_id: Uuid,
    amount: i32,
) -> anyhow::Result<()> {
    cart_service::upsert_entry(state, customer, UpsertCartRequest { listing_id, amount }).await?;
    Ok(())
}

/// `(quantity, purchase_count, available)` straight from storage.
pub async fn stock_of(state: &AppState, listing_id: Uuid) -> anyhow::Result<(i32, i32, bool)> {
    let listing = Listings::find_by_id(listing_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("listing {listing_id} vanished"))?;
    Ok((listing.quantity, listing.purchase_count, listing.available))
}

pub fn address() -> CreateOrderRequest {
    CreateOrderRequest {
        address_street: "1 Crab Lane".into(),
        address_city: "Rustville".into(),
        address_state: "RS".into(),
        address_country: "Oxidia".into(),
        address_postal_code: "10101".into(),
    }
}
