use crate::domain::value_objects::{BookId, BookStatus, MemberId, StrikeCount};
use crate::ports::catalog::{BookRecord, CatalogStore as CatalogStoreTrait, MemberRecord, Result};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Convert a members row into a MemberRecord.
fn map_member_row(row: &PgRow) -> Result<MemberRecord> {
    let strike_count_i32: i32 = row.get("strike_count");
    let strike_count: u32 = strike_count_i32.try_into().map_err(|_| -> BoxError {
        format!("strike_count out of range: {}", strike_count_i32).into()
    })?;

    Ok(MemberRecord {
        member_id: MemberId::new(row.get::<String, _>("member_id"))?,
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        joined_on: row.get("joined_on"),
        strike_count: StrikeCount::from_value(strike_count),
    })
}

/// Convert a books row into a BookRecord.
fn map_book_row(row: &PgRow) -> Result<BookRecord> {
    let status_str: &str = row.get("status");
    let status = BookStatus::from_str(status_str).map_err(|e| -> BoxError { e.into() })?;

    Ok(BookRecord {
        book_id: BookId::new(row.get::<String, _>("book_id"))?,
        title: row.get("title"),
        author: row.get("author"),
        edition: row.get("edition"),
        condition: row.get("condition_note"),
        status,
    })
}

/// PostgreSQL implementation of the catalog store.
///
/// Members and books live in plain relational tables; the circulation
/// core only reads them and, for admin overrides, flips a book status.
pub struct CatalogStore {
    pool: PgPool,
}

impl CatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStoreTrait for CatalogStore {
    async fn get_member(&self, member_id: &MemberId) -> Result<Option<MemberRecord>> {
        let row = sqlx::query(
            r#"
            SELECT member_id, name, email, phone, joined_on, strike_count
            FROM members
            WHERE member_id = $1
            "#,
        )
        .bind(member_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_member_row).transpose()
    }

    async fn get_book(&self, book_id: &BookId) -> Result<Option<BookRecord>> {
        let row = sqlx::query(
            r#"
            SELECT book_id, title, author, edition, condition_note, status
            FROM books
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_book_row).transpose()
    }

    async fn set_book_status(&self, book_id: &BookId, status: BookStatus) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET status = $2
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.as_str())
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
