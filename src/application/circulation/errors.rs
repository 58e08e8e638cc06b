use thiserror::Error;

use crate::domain::value_objects::{BookId, BookStatus, LoanId, MemberId, RequestId, RequestStatus};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 貸出循環アプリケーション層のエラー
///
/// 呼び出し元（API層）への型付き失敗。失敗した操作は
/// すべてのエンティティを変更前のまま残す。リトライは行わない。
#[derive(Debug, Error)]
pub enum CirculationError {
    /// 入力が不正（空ID、不正な日付など） - ValidationError
    #[error("Invalid input: {0}")]
    Validation(String),

    /// 参照された会員が存在しない - ReferenceError
    #[error("Member {0} does not exist")]
    MemberNotFound(MemberId),

    /// 参照された書籍が存在しない - ReferenceError
    #[error("Book {0} does not exist")]
    BookNotFound(BookId),

    /// リクエストが見つからない - NotFoundError
    #[error("Request {0} not found")]
    RequestNotFound(RequestId),

    /// 未返却の貸出が見つからない - NotFoundError
    #[error("No open loan {0}")]
    LoanNotFound(LoanId),

    /// リクエストが既に終端状態 - InvalidStateError
    #[error("Request {request_id} is already {status}")]
    RequestAlreadyDecided {
        request_id: RequestId,
        status: RequestStatus,
    },

    /// 書籍がAvailableでない - ConflictError
    #[error("Book {book_id} is not available (status: {status})")]
    BookUnavailable {
        book_id: BookId,
        status: BookStatus,
    },

    /// カタログストアのエラー
    #[error("Catalog store error")]
    CatalogError(#[source] BoxError),

    /// リクエスト台帳のエラー
    #[error("Request ledger error")]
    LedgerError(#[source] BoxError),

    /// 貸出ストアのエラー
    #[error("Lending store error")]
    LendingError(#[source] BoxError),
}

/// アプリケーション層のResult型
pub type Result<T> = std::result::Result<T, CirculationError>;
