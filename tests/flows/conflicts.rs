//! Two requests racing for the same unique value get the domain error, never a
//! storage failure.

use rust_decimal_macros::dec;
use serial_test::serial;
use shopsphere_api::{
    domain::{catalog::ReviewRating, user::UserRole},
    dto::{
        auth::RegisterRequest,
        reviews::CreateReviewRequest,
        wishlists::{UpsertWishlistRequest, WishlistEntryRequest},
    },
    error::AppError,
    services::{account_service, review_service, wishlist_service},
};

use crate::common::{create_listing, register, setup};

#[tokio::test]
#[serial]
async fn racing_wishlist_names_report_duplicate() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;

    for round in 0..10 {
        let request = || UpsertWishlistRequest {
            wishlist_id: None,
            wishlist_name: format!("gifts{round}"),
        };
        let (a, b) = tokio::join!(
            wishlist_service::upsert_wishlist(state, &customer, request()),
            wishlist_service::upsert_wishlist(state, &customer, request()),
        );

        let mut created = 0;
        for result in [a, b] {
            match result {
                Ok(_) => created += 1,
                Err(AppError::DuplicateName(name)) => assert_eq!(name, format!("gifts{round}")),
                Err(other) => panic!("round {round}: unexpected error {other:?}"),
            }
        }
        assert_eq!(created, 1, "round {round}");
    }
    Ok(())
}

#[tokio::test]
#[serial]
async fn racing_registrations_report_taken_email() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;

    let request = || RegisterRequest {
        email: "twin@shop.test".into(),
        name: "Twin".into(),
        surname: "Test".into(),
        role: "customer".into(),
        company_name: None,
        phone_number: None,
    };
    let (a, b) = tokio::join!(
        account_service::register(state, request()),
        account_service::register(state, request()),
    );

    let mut created = 0;
    for result in [a, b] {
        match result {
            Ok(_) => created += 1,
            Err(AppError::AlreadyExists(what)) => assert_eq!(what, "Email"),
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(created, 1);
    Ok(())
}

#[tokio::test]
#[serial]
async fn racing_reviews_keep_one() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let lamp = create_listing(state, &seller, "Lamp", 3, dec!(25)).await?;

    let review = || CreateReviewRequest {
        title: "Bright".into(),
        description: None,
        rating: ReviewRating::try_from(4).unwrap(),
    };
    let (a, b) = tokio::join!(
        review_service::create_review(state, &customer, lamp.id, review()),
        review_service::create_review(state, &customer, lamp.id, review()),
    );

    let mut created = 0;
    for result in [a, b] {
        match result {
            Ok(_) => created += 1,
            Err(AppError::AlreadyExists(what)) => assert_eq!(what, "Review"),
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(created, 1);
    Ok(())
}

#[tokio::test]
#[serial]
async fn racing_wishlist_adds_share_one_entry() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let vase = create_listing(state, &seller, "Vase", 2, dec!(18)).await?;
    let favorites = wishlist_service::list_wishlists(state, &customer)
        .await?
        .data
        .unwrap()
        .items
        .remove(0);

    let entry = || WishlistEntryRequest { listing_id: vase.id };
    let (a, b) = tokio::join!(
        wishlist_service::add_entry(state, &customer, favorites.id, entry()),
        wishlist_service::add_entry(state, &customer, favorites.id, entry()),
    );
    let a = a?.data.unwrap();
    let b = b?.data.unwrap();

    assert_eq!(a["entry_id"], b["entry_id"]);
    let added = [&a, &b].iter().filter(|r| r["added"] == true).count();
    assert_eq!(added, 1);

    let details = wishlist_service::get_wishlist(state, &customer, favorites.id)
        .await?
        .data
        .unwrap();
    assert_eq!(details.entries.len(), 1);
    Ok(())
}
