//! API integration tests
//!
//! These run against a live server started in the development profile
//! (RUN_MODE unset or "development"), which creates the bootstrap admin.

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const ADMIN_PASSWORD: &str = "change-me-admin";

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, rand::random::<u32>())
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Helper to get an admin token
async fn get_admin_token(client: &Client) -> String {
    login(client, "admin", ADMIN_PASSWORD).await
}

/// Register a fresh borrower and return (id, token)
async fn register_borrower(client: &Client) -> (i64, String) {
    let username = unique("player");
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "full_name": "Test Player",
            "password": "meeple-pass"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["id"].as_i64().expect("No id in response");

    (id, login(client, &username, "meeple-pass").await)
}

/// Create a board game with `copies` FOR_LOAN items, returning (id, name)
async fn create_game_with_copies(client: &Client, token: &str, copies: usize) -> (i64, String) {
    let name = unique("Catan");
    let response = client
        .post(format!("{}/games", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "name": name, "description": "Trade and build" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["id"].as_i64().expect("No id in response");

    for n in 0..copies {
        let response = client
            .post(format!("{}/games/{}/items", BASE_URL, id))
            .bearer_auth(token)
            .json(&json!({ "serial_number": format!("SN-{}", n) }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
    }

    (id, name)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": ADMIN_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/games", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_registered_user_starts_with_initial_karma() {
    let client = Client::new();
    let (id, token) = register_borrower(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"], id);
    assert_eq!(body["role"], "registered");
    assert_eq!(body["karma"], 50);
}

#[tokio::test]
#[ignore]
async fn test_borrower_cannot_manage_catalog() {
    let client = Client::new();
    let (_, token) = register_borrower(&client).await;

    let response = client
        .post(format!("{}/games", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": unique("Azul"), "description": "Tiles" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_category() {
    let client = Client::new();
    let token = get_admin_token(&client).await;
    let name = unique("Strategy");

    let first = client
        .post(format!("{}/categories", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("{}/categories", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 409);

    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Duplicate");
}

#[tokio::test]
#[ignore]
async fn test_loan_workflow_over_http() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (user_id, token) = register_borrower(&client).await;
    let (game_id, name) = create_game_with_copies(&client, &admin, 1).await;

    let due = Utc::now() + Duration::days(7);
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "due_date": due, "game_names": [name] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(loan["status"], "PENDING");
    assert_eq!(loan["user"]["id"], user_id);
    assert_eq!(loan["items"][0]["state"], "BORROWED");
    let loan_id = loan["id"].as_i64().expect("No id in response");

    // The only copy is taken
    let game: Value = client
        .get(format!("{}/games/{}", BASE_URL, game_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(game["available_copies"], 0);

    // Borrowers cannot approve
    let response = client
        .post(format!("{}/loans/{}/approve", BASE_URL, loan_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .post(format!("{}/loans/{}/approve", BASE_URL, loan_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let loan: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(loan["status"], "RETURNED_IN_TIME");
    assert_eq!(loan["user"]["karma"], 55);
    assert_eq!(loan["items"][0]["state"], "FOR_LOAN");

    // A second return is not a valid transition
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_loan_with_past_due_date_is_rejected() {
    let client = Client::new();
    let (_, token) = register_borrower(&client).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "due_date": Utc::now() - Duration::days(1),
            "game_names": ["Catan"]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidDate");
}

#[tokio::test]
#[ignore]
async fn test_borrower_cannot_borrow_for_someone_else() {
    let client = Client::new();
    let (other_id, _) = register_borrower(&client).await;
    let (_, token) = register_borrower(&client).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "user_id": other_id,
            "due_date": Utc::now() + Duration::days(3),
            "game_names": ["Catan"]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_review_permissions() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (_, author) = register_borrower(&client).await;
    let (_, stranger) = register_borrower(&client).await;
    let (game_id, _) = create_game_with_copies(&client, &admin, 0).await;

    let response = client
        .post(format!("{}/reviews", BASE_URL))
        .bearer_auth(&author)
        .json(&json!({ "board_game_id": game_id, "content": "Great", "score": 5 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let review: Value = response.json().await.expect("Failed to parse response");
    let review_id = review["id"].as_i64().expect("No id in response");

    let response = client
        .delete(format!("{}/reviews/{}", BASE_URL, review_id))
        .bearer_auth(&stranger)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .delete(format!("{}/reviews/{}", BASE_URL, review_id))
        .bearer_auth(&author)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_review_score_out_of_range() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (game_id, _) = create_game_with_copies(&client, &admin, 0).await;

    let response = client
        .post(format!("{}/reviews", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "board_game_id": game_id, "content": "Meh", "score": 6 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidRatingScore");

    // Beyond the stored column width is still a score error, not a body error
    let response = client
        .post(format!("{}/reviews", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "board_game_id": game_id, "content": "Meh", "score": 70000 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidRatingScore");
}

#[tokio::test]
#[ignore]
async fn test_stats_counts_borrowed_copies() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (_, token) = register_borrower(&client).await;
    let (_, name) = create_game_with_copies(&client, &admin, 1).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "due_date": Utc::now() + Duration::days(7), "game_names": [name] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["active_loans"].as_i64().expect("No active_loans") >= 1);
    assert!(body["borrowed_items"].as_i64().expect("No borrowed_items") >= 1);
    assert!(body["overdue_loans"].as_i64().is_some());

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}
