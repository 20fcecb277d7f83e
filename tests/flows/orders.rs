use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serial_test::serial;
use shopsphere_api::{
    domain::{order_status::OrderStatus, user::UserRole},
    dto::orders::UpdateOrderStatusRequest,
    entity::{
        AuditLogs, CartEntries, Carts, CustomerAddresses, Orders, audit_logs::Column as AuditCol,
        carts::Column as CartCol, customer_addresses::Column as AddressCol,
    },
    error::AppError,
    notify::NotificationKind,
    routes::params::OrderListQuery,
    services::{cart_service, order_service},
};

use crate::common::{address, create_listing, put_in_cart, register, setup, stock_of};

#[tokio::test]
#[serial]
async fn checkout_reserves_stock_and_empties_cart() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    let mugs = create_listing(state, &seller, "Mug", 10, dec!(4.50)).await?;
    let pens = create_listing(state, &seller, "Pen", 5, dec!(1.25)).await?;
    put_in_cart(state, &customer, mugs.id, 3).await?;
    put_in_cart(state, &customer, pens.id, 2).await?;

    let created = order_service::create_order(state, &customer, address())
        .await?
        .data
        .unwrap();

    let details = order_service::get_order(state, &customer, created.id)
        .await?
        .data
        .unwrap();
    assert_eq!(details.order.status, OrderStatus::Pending);
    assert_eq!(details.order.price, dec!(16.00));
    assert_eq!(details.entries.len(), 2);
    let mug_line = details
        .entries
        .iter()
        .find(|l| l.listing_id == mugs.id)
        .unwrap();
    assert_eq!(mug_line.quantity, 3);
    assert_eq!(mug_line.unit_price, dec!(4.50));
    assert_eq!(mug_line.line_total, dec!(13.50));

    assert_eq!(stock_of(state, mugs.id).await?, (7, 3, true));
    assert_eq!(stock_of(state, pens.id).await?, (3, 2, true));

    let cart = cart_service::view_cart(state, &customer).await?.data.unwrap();
    assert!(cart.is_empty);

    let addresses = CustomerAddresses::find()
        .filter(AddressCol::CustomerId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(addresses, 1);

    let audited = AuditLogs::find()
        .filter(AuditCol::Action.eq("order_create"))
        .filter(AuditCol::UserId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(audited, 1);

    let sent = app.notifier.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, customer.user_id);
    assert_eq!(sent[0].kind, NotificationKind::OrderConfirmation);
    Ok(())
}

#[tokio::test]
#[serial]
async fn selling_out_marks_listing_unavailable() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    let lamp = create_listing(state, &seller, "Lamp", 5, dec!(20)).await?;
    put_in_cart(state, &customer, lamp.id, 5).await?;
    order_service::create_order(state, &customer, address()).await?;

    assert_eq!(stock_of(state, lamp.id).await?, (0, 5, false));
    Ok(())
}

#[tokio::test]
#[serial]
async fn cancelling_returns_stock() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    let chair = create_listing(state, &seller, "Chair", 10, dec!(35)).await?;
    put_in_cart(state, &customer, chair.id, 3).await?;
    let order = order_service::create_order(state, &customer, address())
        .await?
        .data
        .unwrap();
    assert_eq!(stock_of(state, chair.id).await?, (7, 3, true));

    let changed = order_service::cancel_order(state, &customer, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(changed.new_status, OrderStatus::Cancelled);
    assert_eq!(stock_of(state, chair.id).await?, (10, 0, true));

    match order_service::cancel_order(state, &customer, order.id).await {
        Err(AppError::InvalidTransition { from, to }) => {
            assert_eq!(from, OrderStatus::Cancelled);
            assert_eq!(to, OrderStatus::Cancelled);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
    assert_eq!(stock_of(state, chair.id).await?, (10, 0, true));

    let sent = app.notifier.wait_for(2).await;
    assert!(
        sent.iter()
            .any(|n| n.kind == NotificationKind::OrderCancellation && n.recipient == customer.user_id)
    );
    Ok(())
}

#[tokio::test]
#[serial]
async fn insufficient_stock_leaves_everything_untouched() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let other = register(state, "rival@shop.test", UserRole::Customer).await?;

    let plenty = create_listing(state, &seller, "Bolt", 100, dec!(0.10)).await?;
    let scarce = create_listing(state, &seller, "Gear", 4, dec!(12)).await?;
    put_in_cart(state, &customer, plenty.id, 10).await?;
    put_in_cart(state, &customer, scarce.id, 4).await?;

    // Someone else buys part of the scarce listing first.
    put_in_cart(state, &other, scarce.id, 2).await?;
    order_service::create_order(state, &other, address()).await?;

    match order_service::create_order(state, &customer, address()).await {
        Err(AppError::InsufficientStock {
            listing_id,
            requested,
            available,
        }) => {
            assert_eq!(listing_id, scarce.id);
            assert_eq!(requested, 4);
            assert_eq!(available, 2);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    assert_eq!(stock_of(state, plenty.id).await?, (100, 0, true));
    assert_eq!(stock_of(state, scarce.id).await?, (2, 2, true));
    let cart = cart_service::view_cart(state, &customer).await?.data.unwrap();
    assert_eq!(cart.entries.len(), 2);
    let orders = Orders::find().count(&state.orm).await?;
    assert_eq!(orders, 1);
    Ok(())
}

#[tokio::test]
#[serial]
async fn empty_cart_cannot_be_checked_out() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    match order_service::create_order(state, &customer, address()).await {
        Err(AppError::EmptyCart) => {}
        other => panic!("expected empty cart, got {other:?}"),
    }
    assert_eq!(Orders::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
#[serial]
async fn seller_moves_order_through_its_lifecycle() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let stranger = register(state, "stranger@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    let desk = create_listing(state, &seller, "Desk", 2, dec!(150)).await?;
    put_in_cart(state, &customer, desk.id, 1).await?;
    let order = order_service::create_order(state, &customer, address())
        .await?
        .data
        .unwrap();

    let status = |s: &str| UpdateOrderStatusRequest { status: s.into() };

    match order_service::update_status(state, &stranger, order.id, status("shipped")).await {
        Err(AppError::NotFound) => {}
        other => panic!("expected not found for foreign seller, got {other:?}"),
    }
    match order_service::get_seller_order(state, &stranger, order.id).await {
        Err(AppError::NotFound) => {}
        other => panic!("expected not found for foreign seller, got {other:?}"),
    }

    match order_service::update_status(state, &seller, order.id, status("delivered")).await {
        Err(AppError::InvalidTransition { from, to }) => {
            assert_eq!(from, OrderStatus::Pending);
            assert_eq!(to, OrderStatus::Delivered);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }

    order_service::update_status(state, &seller, order.id, status("shipped")).await?;

    match order_service::cancel_order(state, &customer, order.id).await {
        Err(AppError::InvalidTransition { from, .. }) => assert_eq!(from, OrderStatus::Shipped),
        other => panic!("expected invalid transition, got {other:?}"),
    }

    let delivered = order_service::update_status(state, &seller, order.id, status("delivered"))
        .await?
        .data
        .unwrap();
    assert_eq!(delivered.new_status, OrderStatus::Delivered);
    assert_eq!(stock_of(state, desk.id).await?, (1, 1, true));

    let details = order_service::get_seller_order(state, &seller, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(details.order.status, OrderStatus::Delivered);
    assert_eq!(details.customer.email, "buyer@shop.test");
    assert_eq!(details.entries.len(), 1);
    Ok(())
}

#[tokio::test]
#[serial]
async fn seller_sees_only_their_share_of_an_order() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let alice = register(state, "alice@shop.test", UserRole::Seller).await?;
    let bob = register(state, "bob@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    let tea = create_listing(state, &alice, "Tea", 10, dec!(3)).await?;
    let cup = create_listing(state, &bob, "Cup", 10, dec!(7)).await?;
    put_in_cart(state, &customer, tea.id, 2).await?;
    put_in_cart(state, &customer, cup.id, 1).await?;
    let order = order_service::create_order(state, &customer, address())
        .await?
        .data
        .unwrap();

    let listed = order_service::list_seller_orders(state, &alice, OrderListQuery::default())
        .await?;
    let items = listed.data.unwrap().items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].order_id, order.id);
    assert_eq!(items[0].total_amount, dec!(6));

    let details = order_service::get_seller_order(state, &bob, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(details.entries.len(), 1);
    assert_eq!(details.entries[0].listing_id, cup.id);

    let mine = order_service::list_orders(
        state,
        &customer,
        OrderListQuery {
            status: Some("pending".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(mine.meta.as_ref().and_then(|m| m.total), Some(1));
    assert_eq!(mine.data.unwrap().items[0].price, dec!(13));

    let none = order_service::list_orders(
        state,
        &customer,
        OrderListQuery {
            status: Some("shipped".into()),
            ..Default::default()
        },
    )
    .await?;
    assert!(none.data.unwrap().items.is_empty());

    assert_eq!(CartEntries::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
#[serial]
async fn customer_without_cart_gets_empty_cart() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    Carts::delete_many()
        .filter(CartCol::CustomerId.eq(customer.user_id))
        .exec(&state.orm)
        .await?;

    match order_service::create_order(state, &customer, address()).await {
        Err(AppError::EmptyCart) => {}
        other => panic!("expected empty cart, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
#[serial]
async fn seller_cancellation_releases_stock() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    let table = create_listing(state, &seller, "Table", 10, dec!(90)).await?;
    put_in_cart(state, &customer, table.id, 3).await?;
    let order = order_service::create_order(state, &customer, address())
        .await?
        .data
        .unwrap();
    assert_eq!(stock_of(state, table.id).await?, (7, 3, true));

    let changed = order_service::update_status(
        state,
        &seller,
        order.id,
        UpdateOrderStatusRequest {
            status: "cancelled".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(changed.new_status, OrderStatus::Cancelled);
    assert_eq!(stock_of(state, table.id).await?, (10, 0, true));

    let details = order_service::get_order(state, &customer, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(details.order.status, OrderStatus::Cancelled);

    let sent = app.notifier.wait_for(2).await;
    assert!(
        sent.iter()
            .any(|n| n.kind == NotificationKind::OrderCancellation && n.recipient == customer.user_id)
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn concurrent_checkouts_never_oversell() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let ann = register(state, "ann@shop.test", UserRole::Customer).await?;
    let ben = register(state, "ben@shop.test", UserRole::Customer).await?;

    let clock = create_listing(state, &seller, "Clock", 3, dec!(45)).await?;
    put_in_cart(state, &ann, clock.id, 2).await?;
    put_in_cart(state, &ben, clock.id, 2).await?;

    let (first, second) = tokio::join!(
        order_service::create_order(state, &ann, address()),
        order_service::create_order(state, &ben, address()),
    );

    let mut placed = 0;
    for result in [first, second] {
        match result {
            Ok(_) => placed += 1,
            Err(AppError::InsufficientStock {
                listing_id,
                requested,
                available,
            }) => {
                assert_eq!(listing_id, clock.id);
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(placed, 1);
    assert_eq!(stock_of(state, clock.id).await?, (1, 2, true));
    assert_eq!(Orders::find().count(&state.orm).await?, 1);
    Ok(())
}
