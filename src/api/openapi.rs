//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, categories, games, health, items, loans, reviews, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Meeple API",
        version = "1.0.0",
        description = "Board game rental REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Users
        users::list_users,
        users::get_user,
        users::get_user_loans,
        users::get_user_reviews,
        users::list_favorites,
        users::add_favorite,
        users::remove_favorite,
        // Games
        games::list_games,
        games::get_game,
        games::create_game,
        games::update_game,
        games::delete_game,
        games::list_game_items,
        games::list_available_items,
        games::create_item,
        games::list_game_reviews,
        // Items
        items::list_borrowed_items,
        items::get_item,
        items::update_item_state,
        items::delete_item,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::delete_category,
        categories::add_game,
        categories::remove_game,
        // Loans
        loans::create_loan,
        loans::list_loans,
        loans::get_loan,
        loans::approve_loan,
        loans::reject_loan,
        loans::return_loan,
        loans::change_loan_status,
        // Reviews
        reviews::create_review,
        reviews::get_review,
        reviews::update_review,
        reviews::delete_review,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Users
            crate::models::user::UserDetails,
            crate::models::user::UserShort,
            crate::models::user::UserRole,
            crate::models::user::RegisterUser,
            users::AddFavoriteRequest,
            // Catalog
            crate::models::board_game::BoardGame,
            crate::models::board_game::BoardGameShort,
            crate::models::board_game::CreateBoardGame,
            crate::models::board_game::UpdateBoardGame,
            crate::models::category::Category,
            crate::models::category::CategoryDetails,
            crate::models::category::CreateCategory,
            // Items
            crate::models::item::BoardGameItem,
            crate::models::item::ItemState,
            crate::models::item::CreateItem,
            crate::models::item::UpdateItemState,
            // Loans
            loans::CreateLoanRequest,
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanStatus,
            crate::models::loan::ChangeLoanStatus,
            // Reviews
            crate::models::review::Review,
            crate::models::review::CreateReview,
            crate::models::review::UpdateReview,
            // Stats
            stats::StatsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and authentication"),
        (name = "users", description = "Users and favorites"),
        (name = "games", description = "Board game catalog"),
        (name = "items", description = "Physical copies"),
        (name = "categories", description = "Catalog categories"),
        (name = "loans", description = "Loan lifecycle"),
        (name = "reviews", description = "Board game reviews"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
