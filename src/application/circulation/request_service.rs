use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BookId, BookStatus, LoanId, MemberId, RequestStatus};
use crate::domain::{self, commands::SubmitRequest, RankedRequest, Request, RequesterProfile};
use crate::ports::{CatalogStore, LendingStore, PendingBookSummary, RequestLedger};

use super::errors::{CirculationError, Result};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub catalog: Arc<dyn CatalogStore>,
    pub request_ledger: Arc<dyn RequestLedger>,
    pub lending_store: Arc<dyn LendingStore>,
}

/// リクエスト履歴の1件（申請者向け表示）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHistoryEntry {
    pub request: Request,
    pub book_title: String,
    pub detail: RequestDetail,
}

/// リクエストの派生ステータス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestDetail {
    /// 承認待ち
    Waiting,
    /// 承認済み（貸出への参照つき）
    Approved { loan_id: LoanId },
    /// 却下
    Denied,
}

impl RequestDetail {
    /// オペレーター・会員向けの表示文字列
    pub fn describe(&self) -> String {
        match self {
            RequestDetail::Waiting => "Waiting for approval".to_string(),
            RequestDetail::Approved { loan_id } => format!("Approved - Txn: {}", loan_id),
            RequestDetail::Denied => "Request denied".to_string(),
        }
    }
}

/// 貸出リクエストを受け付ける
///
/// ビジネスルール：
/// - 申請者・所有者の会員が存在すること
/// - 書籍が存在すること
/// - 書籍がAvailableでなくても受け付ける（待ち行列に並ぶ）
///
/// 成功すると新しいPendingリクエストが台帳に追記され、
/// Priority Rankerから即座に見える。
pub async fn submit_request(deps: &ServiceDependencies, cmd: SubmitRequest) -> Result<Request> {
    // 1. 参照整合性の確認
    let requester = deps
        .catalog
        .get_member(&cmd.requester_id)
        .await
        .map_err(CirculationError::CatalogError)?;
    if requester.is_none() {
        return Err(CirculationError::MemberNotFound(cmd.requester_id));
    }

    let owner = deps
        .catalog
        .get_member(&cmd.owner_id)
        .await
        .map_err(CirculationError::CatalogError)?;
    if owner.is_none() {
        return Err(CirculationError::MemberNotFound(cmd.owner_id));
    }

    let book = deps
        .catalog
        .get_book(&cmd.book_id)
        .await
        .map_err(CirculationError::CatalogError)?;
    if book.is_none() {
        return Err(CirculationError::BookNotFound(cmd.book_id));
    }

    // 2. IDを採番してPendingリクエストを追記
    let request_id = deps
        .request_ledger
        .reserve_request_id()
        .await
        .map_err(CirculationError::LedgerError)?;

    let request = domain::request::submit_request(
        request_id,
        cmd.requester_id,
        cmd.owner_id,
        cmd.book_id,
        cmd.requested_on,
    );

    deps.request_ledger
        .append(request.clone())
        .await
        .map_err(CirculationError::LedgerError)?;

    tracing::info!(
        request_id = %request.request_id,
        book_id = %request.book_id,
        requester_id = %request.requester_id,
        "borrow request submitted"
    );

    Ok(request)
}

/// 申請者のリクエスト履歴をリクエスト日の新しい順で返す
///
/// 各件には書籍タイトルと派生ステータス（承認待ち・承認済みと
/// 貸出参照・却下）を付与する。
pub async fn list_requests_for_member(
    deps: &ServiceDependencies,
    member_id: &MemberId,
) -> Result<Vec<RequestHistoryEntry>> {
    let mut requests = deps
        .request_ledger
        .find_by_requester(member_id)
        .await
        .map_err(CirculationError::LedgerError)?;

    // 新しい順。同日内はID降順で決定的にする。
    requests.sort_by(|a, b| {
        b.requested_on
            .cmp(&a.requested_on)
            .then_with(|| b.request_id.cmp(&a.request_id))
    });

    let mut entries = Vec::with_capacity(requests.len());
    for request in requests {
        let book = deps
            .catalog
            .get_book(&request.book_id)
            .await
            .map_err(CirculationError::CatalogError)?
            .ok_or_else(|| CirculationError::BookNotFound(request.book_id.clone()))?;

        let detail = match request.status {
            RequestStatus::Pending => RequestDetail::Waiting,
            RequestStatus::Denied => RequestDetail::Denied,
            RequestStatus::Completed => {
                let loan = deps
                    .lending_store
                    .find_loan_for_request(&request.request_id)
                    .await
                    .map_err(CirculationError::LendingError)?
                    .ok_or_else(|| {
                        CirculationError::LendingError(
                            format!(
                                "completed request {} has no loan record",
                                request.request_id
                            )
                            .into(),
                        )
                    })?;
                RequestDetail::Approved {
                    loan_id: loan.loan_id,
                }
            }
        };

        entries.push(RequestHistoryEntry {
            request,
            book_title: book.title,
            detail,
        });
    }

    Ok(entries)
}

/// 書籍ステータスを明示的に上書きする（管理者操作）
///
/// 整備中への切り替えなど、貸出ライフサイクル外の遷移に使う。
/// 承認・返却に伴う遷移はストアのコミットが行うため、ここは通らない。
pub async fn override_book_status(
    deps: &ServiceDependencies,
    book_id: &BookId,
    status: BookStatus,
) -> Result<()> {
    let updated = deps
        .catalog
        .set_book_status(book_id, status)
        .await
        .map_err(CirculationError::CatalogError)?;
    if !updated {
        return Err(CirculationError::BookNotFound(book_id.clone()));
    }

    tracing::info!(book_id = %book_id, status = %status, "book status overridden");
    Ok(())
}

/// Pendingリクエストが1件以上ある書籍のワークリストを返す
pub async fn pending_worklist(deps: &ServiceDependencies) -> Result<Vec<PendingBookSummary>> {
    deps.request_ledger
        .pending_summary()
        .await
        .map_err(CirculationError::LedgerError)
}

/// 1冊の書籍の待ち行列をポリシー順で返す
///
/// 順序：ストライク数昇順 → リクエスト日昇順 → 入会日昇順 →
/// リクエストID辞書順。呼び出しのたびに再計算され、キャッシュしない。
///
/// Pendingリクエストが無い書籍（存在しない書籍を含む）は空を返す。
/// 申請者の会員レコードが削除されている場合はReferenceErrorを報告する。
pub async fn rank_book_queue(
    deps: &ServiceDependencies,
    book_id: &BookId,
) -> Result<Vec<RankedRequest>> {
    let pending = deps
        .request_ledger
        .pending_for_book(book_id)
        .await
        .map_err(CirculationError::LedgerError)?;

    let mut entries = Vec::with_capacity(pending.len());
    for request in pending {
        let member = deps
            .catalog
            .get_member(&request.requester_id)
            .await
            .map_err(CirculationError::CatalogError)?
            .ok_or_else(|| CirculationError::MemberNotFound(request.requester_id.clone()))?;

        let profile = RequesterProfile {
            member_id: member.member_id,
            name: member.name,
            strike_count: member.strike_count,
            joined_on: member.joined_on,
        };
        entries.push((request, profile));
    }

    Ok(domain::ranking::rank_requests(entries))
}
