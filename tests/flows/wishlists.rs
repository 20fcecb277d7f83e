use rust_decimal_macros::dec;
use serial_test::serial;
use shopsphere_api::{
    domain::user::UserRole,
    dto::wishlists::{RemoveWishlistsRequest, UpsertWishlistRequest, WishlistEntryRequest},
    error::AppError,
    services::wishlist_service,
};

use crate::common::{create_listing, register, setup};

fn named(name: &str) -> UpsertWishlistRequest {
    UpsertWishlistRequest {
        wishlist_id: None,
        wishlist_name: name.into(),
    }
}

#[tokio::test]
#[serial]
async fn customers_start_with_favorites() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    let lists = wishlist_service::list_wishlists(state, &customer)
        .await?
        .data
        .unwrap()
        .items;
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "favorites");

    match wishlist_service::upsert_wishlist(state, &customer, named("favorites")).await {
        Err(AppError::DuplicateName(name)) => assert_eq!(name, "favorites"),
        other => panic!("expected duplicate name, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
#[serial]
async fn rename_keeps_names_unique() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let other = register(state, "other@shop.test", UserRole::Customer).await?;

    let gifts = wishlist_service::upsert_wishlist(state, &customer, named("  gifts "))
        .await?
        .data
        .unwrap();
    assert!(gifts.created);
    assert_eq!(gifts.wishlist.name, "gifts");

    // Same name under another customer is fine.
    wishlist_service::upsert_wishlist(state, &other, named("gifts")).await?;

    let same = wishlist_service::upsert_wishlist(
        state,
        &customer,
        UpsertWishlistRequest {
            wishlist_id: Some(gifts.wishlist.id),
            wishlist_name: "gifts".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!same.created);

    let clash = wishlist_service::upsert_wishlist(
        state,
        &customer,
        UpsertWishlistRequest {
            wishlist_id: Some(gifts.wishlist.id),
            wishlist_name: "favorites".into(),
        },
    )
    .await;
    assert!(matches!(clash, Err(AppError::DuplicateName(_))));

    let renamed = wishlist_service::upsert_wishlist(
        state,
        &customer,
        UpsertWishlistRequest {
            wishlist_id: Some(gifts.wishlist.id),
            wishlist_name: "birthday".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(renamed.wishlist.id, gifts.wishlist.id);
    assert_eq!(renamed.wishlist.name, "birthday");

    let foreign = wishlist_service::upsert_wishlist(
        state,
        &other,
        UpsertWishlistRequest {
            wishlist_id: Some(gifts.wishlist.id),
            wishlist_name: "mine now".into(),
        },
    )
    .await;
    assert!(matches!(foreign, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
#[serial]
async fn entries_are_added_once_and_removed_by_listing() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let drum = create_listing(state, &seller, "Drum", 0, dec!(80)).await?;

    let favorites = wishlist_service::list_wishlists(state, &customer)
        .await?
        .data
        .unwrap()
        .items
        .remove(0);

    let first = wishlist_service::add_entry(
        state,
        &customer,
        favorites.id,
        WishlistEntryRequest { listing_id: drum.id },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(first["added"], true);

    let again = wishlist_service::add_entry(
        state,
        &customer,
        favorites.id,
        WishlistEntryRequest { listing_id: drum.id },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(again["added"], false);
    assert_eq!(again["entry_id"], first["entry_id"]);

    let details = wishlist_service::get_wishlist(state, &customer, favorites.id)
        .await?
        .data
        .unwrap();
    assert_eq!(details.entries.len(), 1);
    assert!(!details.entries[0].available);
    assert_eq!(details.entries[0].product_name, "Drum");

    wishlist_service::remove_entry(state, &customer, favorites.id, drum.id).await?;
    match wishlist_service::remove_entry(state, &customer, favorites.id, drum.id).await {
        Err(AppError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }

    let details = wishlist_service::get_wishlist(state, &customer, favorites.id)
        .await?
        .data
        .unwrap();
    assert!(details.is_empty);
    Ok(())
}

#[tokio::test]
#[serial]
async fn bulk_delete_skips_foreign_wishlists() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let other = register(state, "other@shop.test", UserRole::Customer).await?;

    let mine = wishlist_service::upsert_wishlist(state, &customer, named("later"))
        .await?
        .data
        .unwrap();
    let theirs = wishlist_service::upsert_wishlist(state, &other, named("later"))
        .await?
        .data
        .unwrap();

    let counted = wishlist_service::remove_wishlists(
        state,
        &customer,
        RemoveWishlistsRequest {
            wishlist_ids: vec![mine.wishlist.id, theirs.wishlist.id],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(counted.requested, 2);
    assert_eq!(counted.removed, 1);

    let remaining = wishlist_service::list_wishlists(state, &other)
        .await?
        .data
        .unwrap()
        .items;
    assert_eq!(remaining.len(), 2);
    Ok(())
}
