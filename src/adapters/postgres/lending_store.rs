use crate::domain::value_objects::{
    BookId, BookStatus, LoanId, MemberId, RequestId, StaffId, StrikeId,
};
use crate::domain::{LateReturnPenalty, Loan, Request, Strike};
use crate::ports::lending_store::{
    ApprovalOutcome, LendingStore as LendingStoreTrait, OpenLoanRow, Result, ReturnOutcome,
    StrikeRow,
};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Convert a loans row into a Loan.
fn map_loan_row(row: &PgRow) -> Result<Loan> {
    Ok(Loan {
        loan_id: LoanId::new(row.get::<String, _>("loan_id"))?,
        request_id: RequestId::new(row.get::<String, _>("request_id"))?,
        book_id: BookId::new(row.get::<String, _>("book_id"))?,
        borrower_id: MemberId::new(row.get::<String, _>("borrower_id"))?,
        borrowed_on: row.get("borrowed_on"),
        due_on: row.get("due_on"),
        returned_on: row.get("returned_on"),
        approved_by: StaffId::new(row.get::<String, _>("approved_by"))?,
    })
}

/// PostgreSQL implementation of the lending store.
///
/// Both commits run in a single transaction. Competing approvals for the
/// same book serialize on a `SELECT ... FOR UPDATE` of the book row, so
/// exactly one of them sees `Available` and wins.
pub struct LendingStore {
    pool: PgPool,
}

impl LendingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LendingStoreTrait for LendingStore {
    async fn reserve_loan_id(&self) -> Result<LoanId> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('loan_id_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(LoanId::from_seq(seq as u64))
    }

    async fn commit_approval(&self, request: &Request, loan: &Loan) -> Result<ApprovalOutcome> {
        let mut tx = self.pool.begin().await?;

        // Lock the book row; this is the serialization point for
        // competing approvals on the same book.
        let status_str: Option<String> = sqlx::query_scalar(
            r#"
            SELECT status FROM books
            WHERE book_id = $1
            FOR UPDATE
            "#,
        )
        .bind(request.book_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let status_str = status_str.ok_or_else(|| -> BoxError {
            format!("approval references unknown book {}", request.book_id).into()
        })?;
        let status = BookStatus::from_str(&status_str).map_err(|e| -> BoxError { e.into() })?;
        if status != BookStatus::Available {
            return Ok(ApprovalOutcome::BookUnavailable(status));
        }

        let updated = sqlx::query(
            r#"
            UPDATE requests
            SET status = $2
            WHERE request_id = $1 AND status = 'Pending'
            "#,
        )
        .bind(request.request_id.as_str())
        .bind(request.status.as_str())
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(ApprovalOutcome::RequestNotPending);
        }

        sqlx::query(
            r#"
            INSERT INTO loans (loan_id, request_id, book_id, borrower_id, borrowed_on, due_on, returned_on, approved_by)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, $7)
            "#,
        )
        .bind(loan.loan_id.as_str())
        .bind(loan.request_id.as_str())
        .bind(loan.book_id.as_str())
        .bind(loan.borrower_id.as_str())
        .bind(loan.borrowed_on)
        .bind(loan.due_on)
        .bind(loan.approved_by.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE books SET status = 'Lent' WHERE book_id = $1
            "#,
        )
        .bind(loan.book_id.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ApprovalOutcome::Committed)
    }

    async fn commit_return(
        &self,
        loan: &Loan,
        penalty: Option<&LateReturnPenalty>,
    ) -> Result<ReturnOutcome> {
        let mut tx = self.pool.begin().await?;

        // The IS NULL guard makes the return transition single-shot:
        // the loser of a racing return updates zero rows.
        let updated = sqlx::query(
            r#"
            UPDATE loans
            SET returned_on = $2
            WHERE loan_id = $1 AND returned_on IS NULL
            "#,
        )
        .bind(loan.loan_id.as_str())
        .bind(loan.returned_on)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(ReturnOutcome::LoanNotOpen);
        }

        if let Some(penalty) = penalty {
            let seq: i64 = sqlx::query_scalar("SELECT nextval('strike_id_seq')")
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO strikes (strike_id, member_id, loan_id, issued_on, reason)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(StrikeId::from_seq(seq as u64).as_str())
            .bind(penalty.member_id.as_str())
            .bind(penalty.loan_id.as_str())
            .bind(penalty.issued_on)
            .bind(penalty.reason.as_str())
            .execute(&mut *tx)
            .await?;

            // Keep the cached aggregate in step with the strike log
            // inside the same transaction.
            sqlx::query(
                r#"
                UPDATE members SET strike_count = strike_count + 1 WHERE member_id = $1
                "#,
            )
            .bind(penalty.member_id.as_str())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE books SET status = 'Available' WHERE book_id = $1
            "#,
        )
        .bind(loan.book_id.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ReturnOutcome::Committed)
    }

    async fn find_open_loan(&self, loan_id: &LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, request_id, book_id, borrower_id, borrowed_on, due_on, returned_on, approved_by
            FROM loans
            WHERE loan_id = $1 AND returned_on IS NULL
            "#,
        )
        .bind(loan_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_loan_row).transpose()
    }

    async fn find_loan_for_request(&self, request_id: &RequestId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, request_id, book_id, borrower_id, borrowed_on, due_on, returned_on, approved_by
            FROM loans
            WHERE request_id = $1
            "#,
        )
        .bind(request_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_loan_row).transpose()
    }

    async fn open_loans(&self) -> Result<Vec<OpenLoanRow>> {
        let rows = sqlx::query(
            r#"
            SELECT l.loan_id, l.request_id, l.book_id, l.borrower_id,
                   l.borrowed_on, l.due_on, l.returned_on, l.approved_by,
                   b.title AS book_title, m.name AS borrower_name
            FROM loans l
            JOIN books b ON b.book_id = l.book_id
            JOIN members m ON m.member_id = l.borrower_id
            WHERE l.returned_on IS NULL
            ORDER BY l.due_on ASC, l.loan_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(OpenLoanRow {
                    loan: map_loan_row(row)?,
                    book_title: row.get("book_title"),
                    borrower_name: row.get("borrower_name"),
                })
            })
            .collect()
    }

    async fn list_strikes(&self) -> Result<Vec<StrikeRow>> {
        let rows = sqlx::query(
            r#"
            SELECT s.strike_id, s.member_id, s.loan_id, s.issued_on, s.reason,
                   m.name AS member_name
            FROM strikes s
            JOIN members m ON m.member_id = s.member_id
            ORDER BY s.issued_on DESC, s.strike_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(StrikeRow {
                    strike: Strike {
                        strike_id: StrikeId::new(row.get::<String, _>("strike_id"))?,
                        member_id: MemberId::new(row.get::<String, _>("member_id"))?,
                        loan_id: LoanId::new(row.get::<String, _>("loan_id"))?,
                        issued_on: row.get("issued_on"),
                        reason: row.get("reason"),
                    },
                    member_name: row.get("member_name"),
                })
            })
            .collect()
    }
}
