//! Database-backed service tests
//!
//! These need a PostgreSQL database reachable through DATABASE_URL.
//! Run with: cargo test --test loan_lifecycle -- --ignored

use chrono::{Duration, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use meeple_server::{
    config::{AuthConfig, UsersConfig},
    error::AppError,
    models::{
        board_game::CreateBoardGame,
        category::CreateCategory,
        item::{CreateItem, ItemState},
        loan::{CreateLoan, LoanStatus},
        review::{CreateReview, UpdateReview},
        user::RegisterUser,
    },
    repository::Repository,
    services::Services,
};

struct TestContext {
    pool: PgPool,
    services: Services,
}

async fn setup() -> TestContext {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let services = Services::new(
        Repository::new(pool.clone()),
        AuthConfig::default(),
        UsersConfig::default(),
    );

    TestContext { pool, services }
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, rand::random::<u32>())
}

async fn borrower(ctx: &TestContext) -> i32 {
    let username = unique("player");
    ctx.services
        .users
        .register(RegisterUser {
            email: format!("{}@example.com", username),
            username,
            full_name: "Test Player".to_string(),
            password: "meeple-pass".to_string(),
        })
        .await
        .expect("Failed to register user")
        .id
}

/// Create a game with `copies` FOR_LOAN items, returning (id, name)
async fn game_with_copies(ctx: &TestContext, copies: usize) -> (i32, String) {
    let game = ctx
        .services
        .catalog
        .create_board_game(CreateBoardGame {
            name: unique("Catan"),
            description: "Trade and build".to_string(),
        })
        .await
        .expect("Failed to create board game");

    for n in 0..copies {
        ctx.services
            .items
            .add_item(
                game.id,
                CreateItem {
                    serial_number: format!("SN-{}", n),
                    state: None,
                },
            )
            .await
            .expect("Failed to add item");
    }

    (game.id, game.name)
}

fn loan_request(user_id: i32, names: &[&str]) -> CreateLoan {
    CreateLoan {
        user_id,
        due_date: Utc::now() + Duration::days(7),
        game_names: names.iter().map(|n| n.to_string()).collect(),
    }
}

#[tokio::test]
#[ignore]
async fn test_create_loan_borrows_distinct_copies() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (game_id, name) = game_with_copies(&ctx, 3).await;

    let loan_id = ctx
        .services
        .loans
        .create_loan(loan_request(user, &[&name, &name]))
        .await
        .unwrap();

    let loan = ctx.services.loans.get_loan(loan_id).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Pending);
    assert_eq!(loan.items.len(), 2);
    assert_ne!(loan.items[0].id, loan.items[1].id);
    assert!(loan.items.iter().all(|i| i.state == ItemState::Borrowed));

    let available = ctx.services.items.count_available(game_id).await.unwrap();
    assert_eq!(available, 1);

    let left = ctx.services.items.list_available_items(game_id).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].state, ItemState::ForLoan);
    assert!(loan.items.iter().all(|i| i.id != left[0].id));
}

#[tokio::test]
#[ignore]
async fn test_last_copy_goes_to_exactly_one_borrower() {
    let ctx = setup().await;
    let alice = borrower(&ctx).await;
    let bob = borrower(&ctx).await;
    let (_, name) = game_with_copies(&ctx, 1).await;

    let (first, second) = tokio::join!(
        ctx.services.loans.create_loan(loan_request(alice, &[&name])),
        ctx.services.loans.create_loan(loan_request(bob, &[&name])),
    );

    let outcomes = [first, second];
    let granted = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(granted, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::NotAvailableInStock(title)) if *title == name)));
}

#[tokio::test]
#[ignore]
async fn test_failed_loan_leaves_items_untouched() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (stocked_id, stocked) = game_with_copies(&ctx, 1).await;
    let (_, empty) = game_with_copies(&ctx, 0).await;

    let result = ctx
        .services
        .loans
        .create_loan(loan_request(user, &[&stocked, &empty]))
        .await;
    assert!(matches!(result, Err(AppError::NotAvailableInStock(title)) if title == empty));

    let available = ctx.services.items.count_available(stocked_id).await.unwrap();
    assert_eq!(available, 1);
    assert!(ctx.services.loans.get_user_loans(user).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_unknown_title_is_not_found() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;

    let result = ctx
        .services
        .loans
        .create_loan(loan_request(user, &[&unique("Nonexistent")]))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_on_time_return_raises_karma() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (game_id, name) = game_with_copies(&ctx, 1).await;

    let loan_id = ctx
        .services
        .loans
        .create_loan(loan_request(user, &[&name]))
        .await
        .unwrap();
    ctx.services.loans.approve_loan(loan_id).await.unwrap();
    let loan = ctx.services.loans.return_loan(loan_id).await.unwrap();

    assert_eq!(loan.status, LoanStatus::ReturnedInTime);
    assert!(loan.returned_at.is_some());
    assert_eq!(loan.user.karma, Some(55));
    assert_eq!(ctx.services.items.count_available(game_id).await.unwrap(), 1);
}

#[tokio::test]
#[ignore]
async fn test_late_return_lowers_karma() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (_, name) = game_with_copies(&ctx, 1).await;

    let loan_id = ctx
        .services
        .loans
        .create_loan(loan_request(user, &[&name]))
        .await
        .unwrap();
    ctx.services.loans.approve_loan(loan_id).await.unwrap();

    sqlx::query(
        "UPDATE loans SET borrowed_at = NOW() - INTERVAL '2 days', due_date = NOW() - INTERVAL '1 day' WHERE id = $1",
    )
    .bind(loan_id)
    .execute(&ctx.pool)
    .await
    .unwrap();

    let overdue = ctx.services.loans.get_loan(loan_id).await.unwrap();
    assert!(overdue.is_overdue);
    let item_id = overdue.items[0].id;

    let loans = &ctx.services.loans;
    let borrowed = loans.currently_borrowed_items().await.unwrap();
    assert!(borrowed.iter().any(|i| i.id == item_id));
    assert!(loans.count_borrowed_items().await.unwrap() >= 1);
    assert!(loans.count_active().await.unwrap() >= 1);
    assert!(loans.count_overdue().await.unwrap() >= 1);

    let loan = loans.return_loan(loan_id).await.unwrap();
    assert_eq!(loan.status, LoanStatus::ReturnedLate);
    assert_eq!(loan.user.karma, Some(40));
    assert!(!loan.is_overdue);

    let borrowed = loans.currently_borrowed_items().await.unwrap();
    assert!(borrowed.iter().all(|i| i.id != item_id));
}

#[tokio::test]
#[ignore]
async fn test_reject_releases_items() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (game_id, name) = game_with_copies(&ctx, 2).await;

    let loan_id = ctx
        .services
        .loans
        .create_loan(loan_request(user, &[&name, &name]))
        .await
        .unwrap();
    assert_eq!(ctx.services.items.count_available(game_id).await.unwrap(), 0);

    let loan = ctx.services.loans.reject_loan(loan_id).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Rejected);
    assert!(loan.items.iter().all(|i| i.state == ItemState::ForLoan));

    let again = ctx.services.loans.approve_loan(loan_id).await;
    assert!(matches!(again, Err(AppError::InvalidStatus(_))));
}

#[tokio::test]
#[ignore]
async fn test_status_override_keeps_items_in_step() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (game_id, name) = game_with_copies(&ctx, 1).await;

    let loan_id = ctx
        .services
        .loans
        .create_loan(loan_request(user, &[&name]))
        .await
        .unwrap();

    let loan = ctx
        .services
        .loans
        .change_status(loan_id, Some("REJECTED"))
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::Rejected);
    assert_eq!(ctx.services.items.count_available(game_id).await.unwrap(), 1);

    let loan = ctx
        .services
        .loans
        .change_status(loan_id, Some("approved"))
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::Approved);
    assert_eq!(ctx.services.items.count_available(game_id).await.unwrap(), 0);

    let unknown = ctx.services.loans.change_status(loan_id, Some("LOST")).await;
    assert!(matches!(unknown, Err(AppError::InvalidStatus(_))));
    let missing = ctx.services.loans.change_status(loan_id, None).await;
    assert!(matches!(missing, Err(AppError::InvalidStatus(_))));
}

#[tokio::test]
#[ignore]
async fn test_status_override_cannot_reclaim_a_taken_copy() {
    let ctx = setup().await;
    let alice = borrower(&ctx).await;
    let bob = borrower(&ctx).await;
    let (game_id, name) = game_with_copies(&ctx, 1).await;
    let loans = &ctx.services.loans;

    let first = loans.create_loan(loan_request(alice, &[&name])).await.unwrap();
    loans.change_status(first, Some("REJECTED")).await.unwrap();

    let second = loans.create_loan(loan_request(bob, &[&name])).await.unwrap();

    let reclaim = loans.change_status(first, Some("APPROVED")).await;
    assert!(matches!(reclaim, Err(AppError::NotAvailableInStock(_))));

    let loan = loans.get_loan(first).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Rejected);
    let loan = loans.get_loan(second).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Pending);
    assert!(loan.items.iter().all(|i| i.state == ItemState::Borrowed));
    assert_eq!(ctx.services.items.count_available(game_id).await.unwrap(), 0);
}

#[tokio::test]
#[ignore]
async fn test_status_override_tracks_returned_at_without_karma() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (game_id, name) = game_with_copies(&ctx, 1).await;
    let loans = &ctx.services.loans;

    let loan_id = loans.create_loan(loan_request(user, &[&name])).await.unwrap();

    let loan = loans.change_status(loan_id, Some("RETURNED_LATE")).await.unwrap();
    assert_eq!(loan.status, LoanStatus::ReturnedLate);
    assert!(loan.returned_at.is_some());
    assert_eq!(loan.user.karma, Some(50));
    assert_eq!(ctx.services.items.count_available(game_id).await.unwrap(), 1);

    let loan = loans.change_status(loan_id, Some("PENDING")).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Pending);
    assert!(loan.returned_at.is_none());
    assert_eq!(loan.user.karma, Some(50));
    assert!(loan.items.iter().all(|i| i.state == ItemState::Borrowed));
}

#[tokio::test]
#[ignore]
async fn test_borrowed_item_cannot_be_deleted() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (game_id, name) = game_with_copies(&ctx, 1).await;

    let loan_id = ctx
        .services
        .loans
        .create_loan(loan_request(user, &[&name]))
        .await
        .unwrap();
    let loan = ctx.services.loans.get_loan(loan_id).await.unwrap();

    let result = ctx.services.items.delete_item(loan.items[0].id).await;
    assert!(matches!(result, Err(AppError::ItemOnLoan(_))));

    let result = ctx.services.catalog.delete_board_game(game_id).await;
    assert!(matches!(result, Err(AppError::ItemOnLoan(_))));
}

#[tokio::test]
#[ignore]
async fn test_duplicate_serial_in_same_game() {
    let ctx = setup().await;
    let (game_id, _) = game_with_copies(&ctx, 1).await;
    let (other_id, _) = game_with_copies(&ctx, 0).await;

    let duplicate = ctx
        .services
        .items
        .add_item(
            game_id,
            CreateItem {
                serial_number: "SN-0".to_string(),
                state: None,
            },
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::AlreadyExists(_))));

    let elsewhere = ctx
        .services
        .items
        .add_item(
            other_id,
            CreateItem {
                serial_number: "SN-0".to_string(),
                state: Some("NOT_FOR_LOAN".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(elsewhere.state, ItemState::NotForLoan);
}

#[tokio::test]
#[ignore]
async fn test_review_round_trip() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (game_id, _) = game_with_copies(&ctx, 0).await;

    let created = ctx
        .services
        .reviews
        .create_review(
            user,
            CreateReview {
                board_game_id: game_id,
                content: Some("Great".to_string()),
                score: 5,
            },
        )
        .await
        .unwrap();

    let fetched = ctx.services.reviews.get_review(created.id).await.unwrap();
    assert_eq!(fetched.score, 5);
    assert_eq!(fetched.comment, "Great");
    assert_eq!(fetched, created);

    // Same values: nothing changes, not even the timestamp
    let unchanged = ctx
        .services
        .reviews
        .update_review(
            created.id,
            UpdateReview {
                content: Some("Great".to_string()),
                score: Some(5),
            },
        )
        .await
        .unwrap();
    assert_eq!(unchanged.created_at, created.created_at);

    let updated = ctx
        .services
        .reviews
        .update_review(
            created.id,
            UpdateReview {
                content: None,
                score: Some(3),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.score, 3);
    assert!(updated.created_at >= created.created_at);

    ctx.services.reviews.delete_review(created.id).await.unwrap();
    let gone = ctx.services.reviews.get_review(created.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_duplicate_category_and_membership() {
    let ctx = setup().await;
    let name = unique("Strategy");
    let (game_id, _) = game_with_copies(&ctx, 0).await;

    let category = ctx
        .services
        .catalog
        .create_category(CreateCategory { name: name.clone() })
        .await
        .unwrap();

    let duplicate = ctx
        .services
        .catalog
        .create_category(CreateCategory { name })
        .await;
    assert!(matches!(duplicate, Err(AppError::AlreadyExists(_))));

    let details = ctx
        .services
        .catalog
        .add_game_to_category(category.id, game_id)
        .await
        .unwrap();
    assert_eq!(details.board_games.len(), 1);

    let again = ctx.services.catalog.add_game_to_category(category.id, game_id).await;
    assert!(matches!(again, Err(AppError::AlreadyInCategory { .. })));

    let game = ctx.services.catalog.get_board_game(game_id).await.unwrap();
    assert!(game.categories.iter().any(|c| c.id == category.id));

    ctx.services
        .catalog
        .remove_game_from_category(category.id, game_id)
        .await
        .unwrap();
    let missing = ctx
        .services
        .catalog
        .remove_game_from_category(category.id, game_id)
        .await;
    assert!(matches!(missing, Err(AppError::NotInCategory { .. })));
}

#[tokio::test]
#[ignore]
async fn test_favorites() {
    let ctx = setup().await;
    let user = borrower(&ctx).await;
    let (game_id, _) = game_with_copies(&ctx, 0).await;

    let favorites = ctx.services.users.add_favorite(user, game_id).await.unwrap();
    assert_eq!(favorites.len(), 1);

    let again = ctx.services.users.add_favorite(user, game_id).await;
    assert!(matches!(again, Err(AppError::AlreadyInFavorites(id)) if id == game_id));

    ctx.services.users.remove_favorite(user, game_id).await.unwrap();
    let missing = ctx.services.users.remove_favorite(user, game_id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}
