//! Loan management service
//!
//! Every mutating operation runs in a single transaction: the loan row (and
//! the items it touches) are locked, the transition is applied, and either
//! everything commits or the dropped transaction rolls back.

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        item::{BoardGameItem, ItemState},
        loan::{CreateLoan, LoanDetails, LoanStatus},
    },
    repository::Repository,
};

use super::users::UsersService;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    users: UsersService,
}

impl LoansService {
    pub fn new(repository: Repository, users: UsersService) -> Self {
        Self { repository, users }
    }

    /// Create a pending loan, reserving one FOR_LOAN copy per requested title
    pub async fn create_loan(&self, request: CreateLoan) -> AppResult<i32> {
        let now = Utc::now();
        request.validate(now)?;

        let mut tx = self.repository.pool.begin().await?;

        let user = self.repository.users.get_by_id_in(&mut tx, request.user_id).await?;
        if !user.is_registered() {
            return Err(AppError::NotFound(format!(
                "Registered user with id {} not found",
                request.user_id
            )));
        }

        let mut item_ids = Vec::with_capacity(request.game_names.len());
        for (title, copies) in request.copies_per_title() {
            let board_game_id = self
                .repository
                .board_games
                .find_id_by_name(&mut tx, &title)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Board game '{}' not found", title)))?;

            let locked = self
                .repository
                .items
                .lock_available(&mut tx, board_game_id, copies)
                .await?;

            if (locked.len() as i64) < copies {
                tracing::info!(
                    "Loan for user {} refused: {} of {} '{}' available",
                    user.id, locked.len(), copies, title
                );
                return Err(AppError::NotAvailableInStock(title));
            }
            item_ids.extend(locked);
        }

        self.repository
            .items
            .set_states(&mut tx, &item_ids, ItemState::Borrowed)
            .await?;

        let loan_id = self
            .repository
            .loans
            .create(&mut tx, user.id, now, request.due_date, &item_ids)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Loan {} created for user {} with items {:?}, due {}",
            loan_id, user.id, item_ids, request.due_date
        );

        Ok(loan_id)
    }

    pub async fn get_loan(&self, id: i32) -> AppResult<LoanDetails> {
        self.repository.loans.get_details(id).await
    }

    pub async fn get_all_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_details(None, None).await
    }

    pub async fn get_pending_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_details(Some(LoanStatus::Pending), None).await
    }

    pub async fn get_approved_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_details(Some(LoanStatus::Approved), None).await
    }

    /// Get loans for a user
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.loans.list_details(None, Some(user_id)).await
    }

    /// Approve a pending loan
    pub async fn approve_loan(&self, id: i32) -> AppResult<LoanDetails> {
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock(&mut tx, id).await?;
        let status = loan.status.approve()?;
        self.repository.loans.update_status(&mut tx, id, status, None).await?;

        tx.commit().await?;
        tracing::info!("Loan {} approved", id);

        self.repository.loans.get_details(id).await
    }

    /// Reject a pending loan and put its items back on the shelf
    pub async fn reject_loan(&self, id: i32) -> AppResult<LoanDetails> {
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock(&mut tx, id).await?;
        let status = loan.status.reject()?;

        let item_ids = self.repository.loans.get_item_ids(&mut tx, id).await?;
        self.repository
            .items
            .set_states(&mut tx, &item_ids, ItemState::ForLoan)
            .await?;
        self.repository.loans.update_status(&mut tx, id, status, None).await?;

        tx.commit().await?;
        tracing::info!("Loan {} rejected, released items {:?}", id, item_ids);

        self.repository.loans.get_details(id).await
    }

    /// Return an approved loan: release its items and adjust the borrower's karma
    pub async fn return_loan(&self, id: i32) -> AppResult<LoanDetails> {
        let now = Utc::now();
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock(&mut tx, id).await?;
        let status = loan.status.return_at(loan.due_date, now)?;

        let item_ids = self.repository.loans.get_item_ids(&mut tx, id).await?;
        self.repository
            .items
            .set_states(&mut tx, &item_ids, ItemState::ForLoan)
            .await?;
        self.repository
            .loans
            .update_status(&mut tx, id, status, Some(now))
            .await?;

        let karma = self.users.adjust_karma(&mut tx, loan.user_id, status).await?;

        tx.commit().await?;
        tracing::info!(
            "Loan {} returned as {}, user {} karma now {}",
            id, status, loan.user_id, karma
        );

        self.repository.loans.get_details(id).await
    }

    /// Administrative status override.
    ///
    /// Items follow the loan: leaving an active status releases them, entering
    /// one re-borrows them (all must still be FOR_LOAN). Karma is not touched.
    pub async fn change_status(&self, id: i32, status: Option<&str>) -> AppResult<LoanDetails> {
        let target: LoanStatus = status
            .ok_or_else(|| AppError::InvalidStatus("Status is required".to_string()))?
            .parse()?;

        let now = Utc::now();
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock(&mut tx, id).await?;
        if loan.status == target {
            return self.repository.loans.get_details(id).await;
        }

        let item_ids = self.repository.loans.get_item_ids(&mut tx, id).await?;

        let returned_at = match (loan.status.is_active(), target.is_active()) {
            (true, false) => {
                self.repository
                    .items
                    .set_states(&mut tx, &item_ids, ItemState::ForLoan)
                    .await?;
                target.is_returned().then_some(now)
            }
            (false, true) => {
                let states = self.repository.items.lock_states(&mut tx, &item_ids).await?;
                if let Some((item_id, _)) = states.iter().find(|(_, s)| *s != ItemState::ForLoan) {
                    return Err(AppError::NotAvailableInStock(format!("item {}", item_id)));
                }
                self.repository
                    .items
                    .set_states(&mut tx, &item_ids, ItemState::Borrowed)
                    .await?;
                None
            }
            (true, true) => None,
            (false, false) => {
                if target.is_returned() {
                    loan.returned_at.or(Some(now))
                } else {
                    None
                }
            }
        };

        self.repository
            .loans
            .update_status(&mut tx, id, target, returned_at)
            .await?;

        tx.commit().await?;
        tracing::warn!("Loan {} status overridden: {} -> {}", id, loan.status, target);

        self.repository.loans.get_details(id).await
    }

    /// Items currently out on loan, across all games
    pub async fn currently_borrowed_items(&self) -> AppResult<Vec<BoardGameItem>> {
        self.repository.items.list_in_state(ItemState::Borrowed).await
    }

    /// Count items currently out on loan
    pub async fn count_borrowed_items(&self) -> AppResult<i64> {
        self.repository.items.count_in_state(ItemState::Borrowed).await
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        self.repository.loans.count_active().await
    }

    /// Count overdue loans
    pub async fn count_overdue(&self) -> AppResult<i64> {
        self.repository.loans.count_overdue().await
    }
}
