//! Business logic services

pub mod catalog;
pub mod items;
pub mod loans;
pub mod reviews;
pub mod users;

use crate::{
    config::{AuthConfig, UsersConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub items: items::ItemsService,
    pub loans: loans::LoansService,
    pub reviews: reviews::ReviewsService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, users_config: UsersConfig) -> Self {
        let users = users::UsersService::new(repository.clone(), auth_config, users_config);

        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            items: items::ItemsService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), users.clone()),
            reviews: reviews::ReviewsService::new(repository),
            users,
        }
    }
}
