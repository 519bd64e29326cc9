//! Loan model, status state machine and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::item::BoardGameItem;
use super::user::UserShort;
use crate::error::{AppError, AppResult};

/// Loan lifecycle status
///
/// ```text
/// PENDING --approve--> APPROVED --return--> RETURNED_IN_TIME | RETURNED_LATE
/// PENDING --reject---> REJECTED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "loan_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    ReturnedInTime,
    ReturnedLate,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::ReturnedInTime => "RETURNED_IN_TIME",
            LoanStatus::ReturnedLate => "RETURNED_LATE",
        }
    }

    /// Items of an active loan are held BORROWED
    pub fn is_active(&self) -> bool {
        matches!(self, LoanStatus::Pending | LoanStatus::Approved)
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, LoanStatus::ReturnedInTime | LoanStatus::ReturnedLate)
    }

    pub fn approve(self) -> AppResult<Self> {
        match self {
            LoanStatus::Pending => Ok(LoanStatus::Approved),
            other => Err(invalid_transition(other, "approve")),
        }
    }

    pub fn reject(self) -> AppResult<Self> {
        match self {
            LoanStatus::Pending => Ok(LoanStatus::Rejected),
            other => Err(invalid_transition(other, "reject")),
        }
    }

    /// Status reached by returning an approved loan at `returned_at`
    pub fn return_at(self, due_date: DateTime<Utc>, returned_at: DateTime<Utc>) -> AppResult<Self> {
        match self {
            LoanStatus::Approved => Ok(Self::return_outcome(due_date, returned_at)),
            other => Err(invalid_transition(other, "return")),
        }
    }

    /// Late only when strictly after the due date
    pub fn return_outcome(due_date: DateTime<Utc>, returned_at: DateTime<Utc>) -> Self {
        if returned_at > due_date {
            LoanStatus::ReturnedLate
        } else {
            LoanStatus::ReturnedInTime
        }
    }
}

fn invalid_transition(from: LoanStatus, action: &str) -> AppError {
    AppError::InvalidStatus(format!("Cannot {} a loan in status {}", action, from))
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(LoanStatus::Pending),
            "APPROVED" => Ok(LoanStatus::Approved),
            "REJECTED" => Ok(LoanStatus::Rejected),
            "RETURNED_IN_TIME" => Ok(LoanStatus::ReturnedInTime),
            "RETURNED_LATE" => Ok(LoanStatus::ReturnedLate),
            _ => Err(AppError::InvalidStatus(format!("Unknown loan status: {}", s))),
        }
    }
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

/// Loan joined with its borrower, used to build `LoanDetails`
#[derive(Debug, Clone, FromRow)]
pub struct LoanWithUserRow {
    #[sqlx(flatten)]
    pub loan: Loan,
    pub username: String,
    pub full_name: String,
    pub karma: Option<i16>,
}

/// Item reference of a loan
#[derive(Debug, Clone, FromRow)]
pub struct LoanItemRow {
    pub loan_id: i32,
    #[sqlx(flatten)]
    pub item: BoardGameItem,
}

/// Loan with full details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub is_overdue: bool,
    pub user: UserShort,
    pub items: Vec<BoardGameItem>,
}

impl LoanDetails {
    pub fn new(row: LoanWithUserRow, items: Vec<BoardGameItem>, now: DateTime<Utc>) -> Self {
        let loan = row.loan;
        LoanDetails {
            id: loan.id,
            borrowed_at: loan.borrowed_at,
            due_date: loan.due_date,
            returned_at: loan.returned_at,
            status: loan.status,
            is_overdue: loan.status.is_active() && loan.due_date < now,
            user: UserShort {
                id: loan.user_id,
                username: row.username,
                full_name: row.full_name,
                karma: row.karma,
            },
            items,
        }
    }
}

/// Create loan command
#[derive(Debug, Clone)]
pub struct CreateLoan {
    pub user_id: i32,
    pub due_date: DateTime<Utc>,
    pub game_names: Vec<String>,
}

impl CreateLoan {
    /// Checks that need no database access, in the order callers expect them
    pub fn validate(&self, now: DateTime<Utc>) -> AppResult<()> {
        if self.due_date < now {
            return Err(AppError::InvalidDate(format!(
                "Due date {} is in the past",
                self.due_date
            )));
        }
        if self.game_names.is_empty() {
            return Err(AppError::InvalidParameters(
                "At least one board game must be requested".to_string(),
            ));
        }
        if self.game_names.iter().any(|name| name.trim().is_empty()) {
            return Err(AppError::InvalidParameters(
                "Board game names must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Requested titles with the number of copies wanted, in first-seen order
    pub fn copies_per_title(&self) -> Vec<(String, i64)> {
        let mut grouped: Vec<(String, i64)> = Vec::new();
        for name in &self.game_names {
            let name = name.trim();
            match grouped.iter_mut().find(|(title, _)| title == name) {
                Some((_, count)) => *count += 1,
                None => grouped.push((name.to_string(), 1)),
            }
        }
        grouped
    }
}

/// Loan list filter
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    /// "pending" or "approved"; all loans when omitted
    pub status: Option<String>,
}

/// Administrative status override request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeLoanStatus {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(names: &[&str], due_in: Duration) -> CreateLoan {
        CreateLoan {
            user_id: 1,
            due_date: Utc::now() + due_in,
            game_names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_pending_can_be_approved_or_rejected() {
        assert_eq!(LoanStatus::Pending.approve().unwrap(), LoanStatus::Approved);
        assert_eq!(LoanStatus::Pending.reject().unwrap(), LoanStatus::Rejected);
    }

    #[test]
    fn test_only_pending_can_be_approved() {
        for status in [
            LoanStatus::Approved,
            LoanStatus::Rejected,
            LoanStatus::ReturnedInTime,
            LoanStatus::ReturnedLate,
        ] {
            assert!(matches!(status.approve(), Err(AppError::InvalidStatus(_))));
            assert!(matches!(status.reject(), Err(AppError::InvalidStatus(_))));
        }
    }

    #[test]
    fn test_return_outcome_uses_strict_comparison() {
        let due = Utc::now();
        assert_eq!(LoanStatus::return_outcome(due, due), LoanStatus::ReturnedInTime);
        assert_eq!(
            LoanStatus::return_outcome(due, due - Duration::days(1)),
            LoanStatus::ReturnedInTime
        );
        assert_eq!(
            LoanStatus::return_outcome(due, due + Duration::seconds(1)),
            LoanStatus::ReturnedLate
        );
    }

    #[test]
    fn test_only_approved_can_be_returned() {
        let due = Utc::now();
        assert!(LoanStatus::Approved.return_at(due, due).is_ok());
        assert!(LoanStatus::Pending.return_at(due, due).is_err());
        assert!(LoanStatus::ReturnedLate.return_at(due, due).is_err());
    }

    #[test]
    fn test_active_and_returned_states() {
        assert!(LoanStatus::Pending.is_active());
        assert!(LoanStatus::Approved.is_active());
        assert!(!LoanStatus::Rejected.is_active());
        assert!(LoanStatus::ReturnedInTime.is_returned());
        assert!(!LoanStatus::Rejected.is_returned());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("returned_late".parse::<LoanStatus>().unwrap(), LoanStatus::ReturnedLate);
        assert!(matches!(
            "LOST".parse::<LoanStatus>(),
            Err(AppError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_validate_rejects_past_due_date() {
        let loan = request(&["Catan"], -Duration::hours(1));
        assert!(matches!(loan.validate(Utc::now()), Err(AppError::InvalidDate(_))));
    }

    #[test]
    fn test_validate_checks_date_before_names() {
        let loan = request(&[], -Duration::hours(1));
        assert!(matches!(loan.validate(Utc::now()), Err(AppError::InvalidDate(_))));
    }

    #[test]
    fn test_validate_rejects_empty_title_list() {
        let loan = request(&[], Duration::days(7));
        assert!(matches!(
            loan.validate(Utc::now()),
            Err(AppError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_copies_per_title_keeps_duplicates() {
        let loan = request(&["Catan", "Azul", "Catan", " Azul ", "Carcassonne"], Duration::days(7));
        assert_eq!(
            loan.copies_per_title(),
            vec![
                ("Catan".to_string(), 2),
                ("Azul".to_string(), 2),
                ("Carcassonne".to_string(), 1),
            ]
        );
    }
}
