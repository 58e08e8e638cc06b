use crate::domain::value_objects::{BookId, MemberId, RequestId, RequestStatus};
use crate::domain::Request;
use crate::ports::request_ledger::{
    DecisionOutcome, PendingBookSummary, RequestLedger as RequestLedgerTrait, Result,
};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Convert a requests row into a Request.
fn map_request_row(row: &PgRow) -> Result<Request> {
    let status_str: &str = row.get("status");
    let status = RequestStatus::from_str(status_str).map_err(|e| -> BoxError { e.into() })?;

    Ok(Request {
        request_id: RequestId::new(row.get::<String, _>("request_id"))?,
        requester_id: MemberId::new(row.get::<String, _>("requester_id"))?,
        owner_id: MemberId::new(row.get::<String, _>("owner_id"))?,
        book_id: BookId::new(row.get::<String, _>("book_id"))?,
        requested_on: row.get("requested_on"),
        status,
    })
}

/// PostgreSQL implementation of the request ledger.
///
/// Request ids come from a dedicated sequence, so allocation stays
/// monotonic under concurrent submitters without extra locking.
pub struct RequestLedger {
    pool: PgPool,
}

impl RequestLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestLedgerTrait for RequestLedger {
    async fn reserve_request_id(&self) -> Result<RequestId> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('request_id_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(RequestId::from_seq(seq as u64))
    }

    async fn append(&self, request: Request) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO requests (request_id, requester_id, owner_id, book_id, requested_on, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(request.request_id.as_str())
        .bind(request.requester_id.as_str())
        .bind(request.owner_id.as_str())
        .bind(request.book_id.as_str())
        .bind(request.requested_on)
        .bind(request.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, request_id: &RequestId) -> Result<Option<Request>> {
        let row = sqlx::query(
            r#"
            SELECT request_id, requester_id, owner_id, book_id, requested_on, status
            FROM requests
            WHERE request_id = $1
            "#,
        )
        .bind(request_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_request_row).transpose()
    }

    async fn pending_for_book(&self, book_id: &BookId) -> Result<Vec<Request>> {
        let rows = sqlx::query(
            r#"
            SELECT request_id, requester_id, owner_id, book_id, requested_on, status
            FROM requests
            WHERE book_id = $1 AND status = 'Pending'
            "#,
        )
        .bind(book_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_request_row).collect()
    }

    async fn find_by_requester(&self, member_id: &MemberId) -> Result<Vec<Request>> {
        let rows = sqlx::query(
            r#"
            SELECT request_id, requester_id, owner_id, book_id, requested_on, status
            FROM requests
            WHERE requester_id = $1
            "#,
        )
        .bind(member_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_request_row).collect()
    }

    async fn pending_summary(&self) -> Result<Vec<PendingBookSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT b.book_id, b.title, b.author, COUNT(*) AS pending_count
            FROM requests r
            JOIN books b ON b.book_id = r.book_id
            WHERE r.status = 'Pending'
            GROUP BY b.book_id, b.title, b.author
            ORDER BY b.book_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let pending_count: i64 = row.get("pending_count");
                Ok(PendingBookSummary {
                    book_id: BookId::new(row.get::<String, _>("book_id"))?,
                    title: row.get("title"),
                    author: row.get("author"),
                    pending_count: pending_count as u64,
                })
            })
            .collect()
    }

    async fn commit_denial(&self, request: &Request) -> Result<DecisionOutcome> {
        // Conditional update: a request that lost the race stays untouched.
        let result = sqlx::query(
            r#"
            UPDATE requests
            SET status = $2
            WHERE request_id = $1 AND status = 'Pending'
            "#,
        )
        .bind(request.request_id.as_str())
        .bind(request.status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(DecisionOutcome::RequestNotPending)
        } else {
            Ok(DecisionOutcome::Committed)
        }
    }
}
