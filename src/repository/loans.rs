//! Loans repository for database operations

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        item::BoardGameItem,
        loan::{Loan, LoanDetails, LoanItemRow, LoanStatus, LoanWithUserRow},
    },
};

const LOAN_SELECT: &str = r#"
    SELECT l.id, l.user_id, l.borrowed_at, l.due_date, l.returned_at, l.status,
           u.username, u.full_name, u.karma
    FROM loans l
    JOIN users u ON u.id = l.user_id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan with borrower and items
    pub async fn get_details(&self, id: i32) -> AppResult<LoanDetails> {
        let row = sqlx::query_as::<_, LoanWithUserRow>(&format!("{} WHERE l.id = $1", LOAN_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        let mut details = self.with_items(vec![row]).await?;
        details
            .pop()
            .ok_or_else(|| AppError::Internal(format!("Loan {} vanished while loading", id)))
    }

    /// List loans, optionally filtered by status and borrower
    pub async fn list_details(
        &self,
        status: Option<LoanStatus>,
        user_id: Option<i32>,
    ) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query_as::<_, LoanWithUserRow>(&format!(
            r#"{}
            WHERE ($1::loan_status IS NULL OR l.status = $1)
              AND ($2::int IS NULL OR l.user_id = $2)
            ORDER BY l.borrowed_at, l.id
            "#,
            LOAN_SELECT
        ))
        .bind(status)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_items(rows).await
    }

    async fn with_items(&self, rows: Vec<LoanWithUserRow>) -> AppResult<Vec<LoanDetails>> {
        let ids: Vec<i32> = rows.iter().map(|r| r.loan.id).collect();

        let item_rows = sqlx::query_as::<_, LoanItemRow>(
            r#"
            SELECT li.loan_id, i.id, i.board_game_id, g.name AS board_game_name,
                   i.serial_number, i.state
            FROM loan_items li
            JOIN board_game_items i ON i.id = li.item_id
            JOIN board_games g ON g.id = i.board_game_id
            WHERE li.loan_id = ANY($1)
            ORDER BY i.id
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<i32, Vec<BoardGameItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.loan_id).or_default().push(row.item);
        }

        let now = Utc::now();
        Ok(rows
            .into_iter()
            .map(|row| {
                let loan_items = items.remove(&row.loan.id).unwrap_or_default();
                LoanDetails::new(row, loan_items, now)
            })
            .collect())
    }

    // =========================================================================
    // Lifecycle (transactional)
    // =========================================================================

    /// Lock a loan row for a status transition
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, user_id, borrowed_at, due_date, returned_at, status
            FROM loans
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        borrowed_at: DateTime<Utc>,
        due_date: DateTime<Utc>,
        item_ids: &[i32],
    ) -> AppResult<i32> {
        let loan_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO loans (user_id, borrowed_at, due_date, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(borrowed_at)
        .bind(due_date)
        .bind(LoanStatus::Pending)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("INSERT INTO loan_items (loan_id, item_id) SELECT $1, UNNEST($2::int[])")
            .bind(loan_id)
            .bind(item_ids)
            .execute(&mut *conn)
            .await?;

        Ok(loan_id)
    }

    pub async fn get_item_ids(&self, conn: &mut PgConnection, loan_id: i32) -> AppResult<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT item_id FROM loan_items WHERE loan_id = $1 ORDER BY item_id",
        )
        .bind(loan_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(ids)
    }

    pub async fn update_status(
        &self,
        conn: &mut PgConnection,
        id: i32,
        status: LoanStatus,
        returned_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE loans SET status = $1, returned_at = $2 WHERE id = $3")
            .bind(status)
            .bind(returned_at)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Count loans in an active status
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE status IN ('PENDING', 'APPROVED')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count active loans past their due date
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE status IN ('PENDING', 'APPROVED') AND due_date < NOW()",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
