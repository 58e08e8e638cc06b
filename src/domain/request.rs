use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookId, MemberId, RequestId, RequestStatus, RequestTransitionError};

/// BorrowRequest集約 - 1冊の書籍に対する1人の会員の貸出リクエスト
///
/// 状態機械：`Pending -> {Completed, Denied}`。終端状態からの遷移はない。
/// 書籍がAvailableでなくてもリクエストは作成できる（待ち行列に並ぶ）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub request_id: RequestId,
    /// 借りたい会員
    pub requester_id: MemberId,
    /// 書籍を管理する会員（所有者・保管者）
    pub owner_id: MemberId,
    pub book_id: BookId,
    pub requested_on: NaiveDate,
    pub status: RequestStatus,
}

/// 純粋関数：貸出リクエストを受け付ける
///
/// 参照整合性（会員・書籍の存在）の検査はアプリケーション層の責務。
/// ここでは常にPendingのリクエストを生成する。
pub fn submit_request(
    request_id: RequestId,
    requester_id: MemberId,
    owner_id: MemberId,
    book_id: BookId,
    requested_on: NaiveDate,
) -> Request {
    Request {
        request_id,
        requester_id,
        owner_id,
        book_id,
        requested_on,
        status: RequestStatus::Pending,
    }
}

/// 純粋関数：リクエストを承認済みにする
///
/// # エラー
/// Pending以外の場合は`RequestTransitionError::NotPending`
pub fn approve_request(request: &Request) -> Result<Request, RequestTransitionError> {
    if !request.status.is_pending() {
        return Err(RequestTransitionError::NotPending);
    }
    Ok(Request {
        status: RequestStatus::Completed,
        ..request.clone()
    })
}

/// 純粋関数：リクエストを却下する
///
/// 貸出は作成されず、書籍ステータスも変わらない。
///
/// # エラー
/// Pending以外の場合は`RequestTransitionError::NotPending`
pub fn deny_request(request: &Request) -> Result<Request, RequestTransitionError> {
    if !request.status.is_pending() {
        return Err(RequestTransitionError::NotPending);
    }
    Ok(Request {
        status: RequestStatus::Denied,
        ..request.clone()
    })
}
