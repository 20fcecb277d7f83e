use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serial_test::serial;
use shopsphere_api::{
    domain::user::UserRole,
    dto::cart::{CartAction, RemoveCartEntriesRequest, UpsertCartRequest},
    entity::{AuditLogs, audit_logs::Column as AuditCol},
    error::AppError,
    services::cart_service,
};
use uuid::Uuid;

use crate::common::{create_listing, register, setup};

#[tokio::test]
#[serial]
async fn upsert_creates_updates_and_removes() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let socks = create_listing(state, &seller, "Socks", 6, dec!(2.99)).await?;

    let upsert = |amount| UpsertCartRequest {
        listing_id: socks.id,
        amount,
    };

    let created = cart_service::upsert_entry(state, &customer, upsert(2))
        .await?
        .data
        .unwrap();
    assert_eq!(created.action, CartAction::Created);

    let updated = cart_service::upsert_entry(state, &customer, upsert(5))
        .await?
        .data
        .unwrap();
    assert_eq!(updated.action, CartAction::Updated);
    assert_eq!(updated.entry_id, created.entry_id);

    let cart = cart_service::view_cart(state, &customer).await?.data.unwrap();
    assert_eq!(cart.entries.len(), 1);
    assert_eq!(cart.entries[0].amount, 5);
    assert_eq!(cart.entries[0].line_total, dec!(14.95));
    assert_eq!(cart.cart_total, dec!(14.95));
    assert_eq!(cart.entries[0].company_name, "seller@shop.test Ltd");

    match cart_service::upsert_entry(state, &customer, upsert(7)).await {
        Err(AppError::InsufficientStock { available, .. }) => assert_eq!(available, 6),
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    let removed = cart_service::upsert_entry(state, &customer, upsert(0))
        .await?
        .data
        .unwrap();
    assert_eq!(removed.action, CartAction::Removed);

    match cart_service::upsert_entry(state, &customer, upsert(0)).await {
        Err(AppError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }

    let cart = cart_service::view_cart(state, &customer).await?.data.unwrap();
    assert!(cart.is_empty);
    assert_eq!(cart.cart_total, dec!(0));
    Ok(())
}

#[tokio::test]
#[serial]
async fn unknown_listing_is_not_found() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    let result = cart_service::upsert_entry(
        state,
        &customer,
        UpsertCartRequest {
            listing_id: Uuid::new_v4(),
            amount: 1,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
#[serial]
async fn remove_counts_only_own_entries() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let other = register(state, "other@shop.test", UserRole::Customer).await?;

    let hat = create_listing(state, &seller, "Hat", 3, dec!(9)).await?;
    let scarf = create_listing(state, &seller, "Scarf", 3, dec!(11)).await?;

    let mine = cart_service::upsert_entry(
        state,
        &customer,
        UpsertCartRequest {
            listing_id: hat.id,
            amount: 1,
        },
    )
    .await?
    .data
    .unwrap();
    cart_service::upsert_entry(
        state,
        &customer,
        UpsertCartRequest {
            listing_id: scarf.id,
            amount: 1,
        },
    )
    .await?;
    let theirs = cart_service::upsert_entry(
        state,
        &other,
        UpsertCartRequest {
            listing_id: hat.id,
            amount: 2,
        },
    )
    .await?
    .data
    .unwrap();

    let counted = cart_service::remove_entries(
        state,
        &customer,
        RemoveCartEntriesRequest {
            entry_ids: vec![mine.entry_id, mine.entry_id, theirs.entry_id, Uuid::new_v4()],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(counted.requested, 3);
    assert_eq!(counted.removed, 1);

    let cart = cart_service::view_cart(state, &customer).await?.data.unwrap();
    assert_eq!(cart.entries.len(), 1);
    assert_eq!(cart.entries[0].listing_id, scarf.id);
    let their_cart = cart_service::view_cart(state, &other).await?.data.unwrap();
    assert_eq!(their_cart.entries.len(), 1);
    Ok(())
}

#[tokio::test]
#[serial]
async fn clearing_an_empty_cart_is_a_no_op() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let kite = create_listing(state, &seller, "Kite", 3, dec!(15)).await?;

    let cleared = cart_service::clear_cart(state, &customer).await?.data.unwrap();
    assert_eq!(cleared.removed, 0);

    cart_service::upsert_entry(
        state,
        &customer,
        UpsertCartRequest {
            listing_id: kite.id,
            amount: 2,
        },
    )
    .await?;
    let cleared = cart_service::clear_cart(state, &customer).await?.data.unwrap();
    assert_eq!(cleared.removed, 1);

    let audited = AuditLogs::find()
        .filter(AuditCol::Action.eq("cart_clear"))
        .count(&state.orm)
        .await?;
    assert_eq!(audited, 1);
    Ok(())
}

#[tokio::test]
#[serial]
async fn sellers_have_no_cart() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;

    match cart_service::view_cart(state, &seller).await {
        Err(AppError::Unauthorized) => {}
        other => panic!("expected unauthorized, got {other:?}"),
    }
    Ok(())
}
