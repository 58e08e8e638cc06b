use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::application::circulation::{
    ActiveLoanEntry, CirculationError, DueStatus, RequestHistoryEntry, ReturnReceipt,
};
use crate::domain::commands::{ApproveRequest, SubmitRequest};
use crate::domain::value_objects::{BookId, MemberId, RequestId, StaffId};
use crate::domain::{Loan, RankedRequest};
use crate::ports::{PendingBookSummary, StrikeRow};

/// 貸出リクエスト作成のリクエストボディ（POST /requests）
#[derive(Debug, Deserialize)]
pub struct SubmitRequestBody {
    pub requester_id: String,
    pub owner_id: String,
    pub book_id: String,
}

impl SubmitRequestBody {
    /// バリデーション済みのコマンドに変換する
    pub fn to_command(&self, requested_on: NaiveDate) -> Result<SubmitRequest, CirculationError> {
        Ok(SubmitRequest {
            requester_id: MemberId::new(self.requester_id.clone())
                .map_err(|e| CirculationError::Validation(format!("requester_id: {}", e)))?,
            owner_id: MemberId::new(self.owner_id.clone())
                .map_err(|e| CirculationError::Validation(format!("owner_id: {}", e)))?,
            book_id: BookId::new(self.book_id.clone())
                .map_err(|e| CirculationError::Validation(format!("book_id: {}", e)))?,
            requested_on,
        })
    }
}

/// リクエスト承認のリクエストボディ（POST /requests/:id/approve）
#[derive(Debug, Deserialize)]
pub struct ApproveRequestBody {
    pub approved_by: String,
    /// 返却期限の上書き（YYYY-MM-DD、省略時は貸出日+14日）
    pub due_date: Option<String>,
}

impl ApproveRequestBody {
    /// バリデーション済みのコマンドに変換する
    ///
    /// 期限の上書きが指定された場合はここで日付としてパースする。
    /// 貸出日との前後関係はドメイン層が検証する。
    pub fn to_command(
        &self,
        request_id: RequestId,
        approved_on: NaiveDate,
    ) -> Result<ApproveRequest, CirculationError> {
        let due_override = self
            .due_date
            .as_deref()
            .map(parse_date)
            .transpose()
            .map_err(|e| CirculationError::Validation(format!("due_date: {}", e)))?;

        Ok(ApproveRequest {
            request_id,
            approved_on,
            due_override,
            approved_by: StaffId::new(self.approved_by.clone())
                .map_err(|e| CirculationError::Validation(format!("approved_by: {}", e)))?,
        })
    }
}

/// 書籍ステータス上書きのリクエストボディ（POST /books/:id/status）
#[derive(Debug, Deserialize)]
pub struct OverrideBookStatusBody {
    pub status: String,
}

/// リクエスト一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    /// 申請者の会員IDでフィルタリング（必須）
    pub member_id: Option<String>,
}

/// 日付クエリパラメータ（YYYY-MM-DD）のパース
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a valid date (expected YYYY-MM-DD)", value))
}

/// リクエストレスポンス（POST /requests と GET /requests）
#[derive(Debug, Serialize)]
pub struct RequestResponse {
    pub request_id: String,
    pub requester_id: String,
    pub owner_id: String,
    pub book_id: String,
    pub requested_on: NaiveDate,
    pub status: String,
}

/// リクエスト履歴レスポンス（GET /requests?member_id=...）
#[derive(Debug, Serialize)]
pub struct RequestHistoryResponse {
    pub request_id: String,
    pub book_id: String,
    pub book_title: String,
    pub requested_on: NaiveDate,
    pub status: String,
    pub detail: String,
}

impl From<RequestHistoryEntry> for RequestHistoryResponse {
    fn from(entry: RequestHistoryEntry) -> Self {
        Self {
            request_id: entry.request.request_id.to_string(),
            book_id: entry.request.book_id.to_string(),
            book_title: entry.book_title,
            requested_on: entry.request.requested_on,
            status: entry.request.status.to_string(),
            detail: entry.detail.describe(),
        }
    }
}

/// 承認待ちワークリストの1件（GET /requests/pending）
#[derive(Debug, Serialize)]
pub struct PendingBookResponse {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub pending_count: u64,
}

impl From<PendingBookSummary> for PendingBookResponse {
    fn from(summary: PendingBookSummary) -> Self {
        Self {
            book_id: summary.book_id.to_string(),
            title: summary.title,
            author: summary.author,
            pending_count: summary.pending_count,
        }
    }
}

/// 待ち行列の1件（GET /books/:id/queue）
#[derive(Debug, Serialize)]
pub struct RankedRequestResponse {
    pub priority: usize,
    pub request_id: String,
    pub requester_id: String,
    pub requester_name: String,
    pub strike_count: u32,
    pub requested_on: NaiveDate,
    pub joined_on: NaiveDate,
}

impl From<RankedRequest> for RankedRequestResponse {
    fn from(ranked: RankedRequest) -> Self {
        Self {
            priority: ranked.priority,
            request_id: ranked.request.request_id.to_string(),
            requester_id: ranked.requester.member_id.to_string(),
            requester_name: ranked.requester.name,
            strike_count: ranked.requester.strike_count.value(),
            requested_on: ranked.request.requested_on,
            joined_on: ranked.requester.joined_on,
        }
    }
}

/// 貸出作成レスポンス（POST /requests/:id/approve）
#[derive(Debug, Serialize)]
pub struct LoanCreatedResponse {
    pub loan_id: String,
    pub request_id: String,
    pub book_id: String,
    pub borrower_id: String,
    pub borrowed_on: NaiveDate,
    pub due_on: NaiveDate,
    pub approved_by: String,
}

impl From<Loan> for LoanCreatedResponse {
    fn from(loan: Loan) -> Self {
        Self {
            loan_id: loan.loan_id.to_string(),
            request_id: loan.request_id.to_string(),
            book_id: loan.book_id.to_string(),
            borrower_id: loan.borrower_id.to_string(),
            borrowed_on: loan.borrowed_on,
            due_on: loan.due_on,
            approved_by: loan.approved_by.to_string(),
        }
    }
}

/// 返却レスポンス（POST /loans/:id/return）
#[derive(Debug, Serialize)]
pub struct BookReturnedResponse {
    pub loan_id: String,
    pub book_id: String,
    pub returned_on: Option<NaiveDate>,
    pub strike_issued: bool,
}

impl From<ReturnReceipt> for BookReturnedResponse {
    fn from(receipt: ReturnReceipt) -> Self {
        Self {
            loan_id: receipt.loan.loan_id.to_string(),
            book_id: receipt.loan.book_id.to_string(),
            returned_on: receipt.loan.returned_on,
            strike_issued: receipt.strike_issued,
        }
    }
}

/// 貸出中一覧の1件（GET /loans/active）
#[derive(Debug, Serialize)]
pub struct ActiveLoanResponse {
    pub loan_id: String,
    pub book_id: String,
    pub book_title: String,
    pub borrower_id: String,
    pub borrower_name: String,
    pub borrowed_on: NaiveDate,
    pub due_on: NaiveDate,
    pub due_status: DueStatus,
}

impl From<ActiveLoanEntry> for ActiveLoanResponse {
    fn from(entry: ActiveLoanEntry) -> Self {
        Self {
            loan_id: entry.loan.loan_id.to_string(),
            book_id: entry.loan.book_id.to_string(),
            book_title: entry.book_title,
            borrower_id: entry.loan.borrower_id.to_string(),
            borrower_name: entry.borrower_name,
            borrowed_on: entry.loan.borrowed_on,
            due_on: entry.loan.due_on,
            due_status: entry.due_status,
        }
    }
}

/// ストライク履歴の1件（GET /strikes）
#[derive(Debug, Serialize)]
pub struct StrikeResponse {
    pub strike_id: String,
    pub member_id: String,
    pub member_name: String,
    pub loan_id: String,
    pub issued_on: NaiveDate,
    pub reason: String,
}

impl From<StrikeRow> for StrikeResponse {
    fn from(row: StrikeRow) -> Self {
        Self {
            strike_id: row.strike.strike_id.to_string(),
            member_id: row.strike.member_id.to_string(),
            member_name: row.member_name,
            loan_id: row.strike.loan_id.to_string(),
            issued_on: row.strike.issued_on,
            reason: row.strike.reason,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
