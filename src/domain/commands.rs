use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, MemberId, RequestId, StaffId};

/// コマンド：貸出リクエストを受け付ける
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub requester_id: MemberId,
    pub owner_id: MemberId,
    pub book_id: BookId,
    pub requested_on: NaiveDate,
}

/// コマンド：リクエストを承認して貸出を作成する
///
/// 期限の上書きは承認の単一パラメータ。承認後に別途期限を
/// 書き換える2段階更新は行わない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub request_id: RequestId,
    pub approved_on: NaiveDate,
    pub due_override: Option<NaiveDate>,
    /// 承認操作を行う職員（明示的なコンテキスト値）
    pub approved_by: StaffId,
}

/// コマンド：リクエストを却下する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyRequest {
    pub request_id: RequestId,
}

/// コマンド：返却を記録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReturn {
    pub loan_id: LoanId,
    pub returned_on: NaiveDate,
}
