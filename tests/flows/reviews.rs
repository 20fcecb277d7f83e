use rust_decimal_macros::dec;
use serial_test::serial;
use shopsphere_api::{
    domain::{catalog::ReviewRating, user::UserRole},
    dto::reviews::{CreateReviewRequest, EditReviewRequest},
    error::AppError,
    routes::params::{ReviewOrder, ReviewQuery},
    services::{listing_service, review_service},
};

use crate::common::{create_listing, register, setup};

fn rating(value: i16) -> ReviewRating {
    ReviewRating::try_from(value).unwrap()
}

fn review(title: &str, stars: i16) -> CreateReviewRequest {
    CreateReviewRequest {
        title: title.into(),
        description: None,
        rating: rating(stars),
    }
}

#[tokio::test]
#[serial]
async fn one_review_per_customer_and_listing() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let customer = register(state, "buyer@shop.test", UserRole::Customer).await?;
    let book = create_listing(state, &seller, "Book", 4, dec!(19.90)).await?;

    review_service::create_review(state, &customer, book.id, review("Great", 5)).await?;
    match review_service::create_review(state, &customer, book.id, review("Again", 4)).await {
        Err(AppError::AlreadyExists(what)) => assert_eq!(what, "Review"),
        other => panic!("expected already exists, got {other:?}"),
    }

    match review_service::create_review(state, &seller, book.id, review("Mine", 5)).await {
        Err(AppError::Unauthorized) => {}
        other => panic!("expected unauthorized, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
#[serial]
async fn listing_page_aggregates_reviews_and_counts_views() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let ann = register(state, "ann@shop.test", UserRole::Customer).await?;
    let ben = register(state, "ben@shop.test", UserRole::Customer).await?;
    let game = create_listing(state, &seller, "Board game", 4, dec!(40)).await?;

    let first = listing_service::view_listing(state, game.id).await?.data.unwrap();
    assert_eq!(first.review_count, 0);
    assert_eq!(first.average_rating, 0.0);
    assert_eq!(first.listing.view_count, 1);

    review_service::create_review(state, &ann, game.id, review("Fun", 5)).await?;
    review_service::create_review(state, &ben, game.id, review("Meh", 2)).await?;

    let second = listing_service::view_listing(state, game.id).await?.data.unwrap();
    assert_eq!(second.review_count, 2);
    assert!((second.average_rating - 3.5).abs() < f64::EPSILON);
    assert_eq!(second.listing.view_count, 2);
    assert_eq!(second.product_name, "Board game");

    let lowest_first = review_service::list_listing_reviews(
        state,
        game.id,
        ReviewQuery {
            order_by: Some(ReviewOrder::Lowest),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap()
    .items;
    assert_eq!(lowest_first.len(), 2);
    assert_eq!(lowest_first[0].title, "Meh");
    Ok(())
}

#[tokio::test]
#[serial]
async fn edit_and_delete_are_owner_only() -> anyhow::Result<()> {
    let Some(app) = setup().await? else { return Ok(()) };
    let state = &app.state;
    let seller = register(state, "seller@shop.test", UserRole::Seller).await?;
    let ann = register(state, "ann@shop.test", UserRole::Customer).await?;
    let ben = register(state, "ben@shop.test", UserRole::Customer).await?;
    let bike = create_listing(state, &seller, "Bike", 1, dec!(300)).await?;

    let created = review_service::create_review(state, &ann, bike.id, review("Fast", 4))
        .await?
        .data
        .unwrap();

    let stolen = review_service::edit_review(
        state,
        &ben,
        created.id,
        EditReviewRequest {
            title: Some("Slow".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(stolen, Err(AppError::NotFound)));

    let edited = review_service::edit_review(
        state,
        &ann,
        created.id,
        EditReviewRequest {
            rating: Some(rating(3)),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(edited.title, "Fast");
    assert_eq!(edited.rating, rating(3));
    assert!(edited.modified_at >= created.modified_at);

    assert!(matches!(
        review_service::delete_review(state, &ben, created.id).await,
        Err(AppError::NotFound)
    ));
    review_service::delete_review(state, &ann, created.id).await?;

    let mine = review_service::list_own_reviews(state, &ann, ReviewQuery::default())
        .await?
        .data
        .unwrap();
    assert!(mine.items.is_empty());
    Ok(())
}
