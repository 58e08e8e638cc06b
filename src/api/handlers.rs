use crate::application::circulation::{
    ServiceDependencies, approve_request as execute_approve_request,
    deny_request as execute_deny_request, list_active_loans, list_requests_for_member,
    list_strikes, override_book_status, pending_worklist, rank_book_queue,
    record_return as execute_record_return, submit_request as execute_submit_request,
};
use crate::domain::commands::{DenyRequest, RecordReturn};
use crate::domain::value_objects::{BookId, BookStatus, LoanId, MemberId, RequestId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{
        ActiveLoanResponse, ApproveRequestBody, BookReturnedResponse, ListRequestsQuery,
        LoanCreatedResponse, OverrideBookStatusBody, PendingBookResponse, RankedRequestResponse,
        RequestHistoryResponse, RequestResponse, StrikeResponse, SubmitRequestBody,
    },
};
use crate::application::circulation::CirculationError;

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

/// 暦日単位の「今日」。すべての日付判定はこの粒度で行う。
fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /requests - 貸出リクエストを作成
///
/// 強制されるビジネスルール:
/// - 申請者・所有者の会員が存在すること
/// - 書籍が存在すること
/// - 書籍が貸出中でも受け付ける（待ち行列に並ぶ）
pub async fn submit_request(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitRequestBody>,
) -> Result<(StatusCode, Json<RequestResponse>), ApiError> {
    let cmd = body.to_command(today())?;

    let request = execute_submit_request(&state.service_deps, cmd).await?;

    let response = RequestResponse {
        request_id: request.request_id.to_string(),
        requester_id: request.requester_id.to_string(),
        owner_id: request.owner_id.to_string(),
        book_id: request.book_id.to_string(),
        requested_on: request.requested_on,
        status: request.status.to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /requests/:id/approve - リクエストを承認して貸出を作成
///
/// 強制されるビジネスルール:
/// - リクエストが存在しPendingであること
/// - 書籍がAvailableであること
/// - 期限の上書き（due_date）は貸出日より後であること
///
/// 同じ書籍への競合する承認はちょうど1件だけ成功する。
pub async fn approve_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
    Json(body): Json<ApproveRequestBody>,
) -> Result<(StatusCode, Json<LoanCreatedResponse>), ApiError> {
    let request_id = RequestId::new(request_id)
        .map_err(|e| CirculationError::Validation(format!("request_id: {}", e)))?;

    let cmd = body.to_command(request_id, today())?;

    let loan = execute_approve_request(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(LoanCreatedResponse::from(loan))))
}

/// POST /requests/:id/deny - リクエストを却下
///
/// 貸出は作成されず、書籍ステータスは変わらない。
pub async fn deny_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let request_id = RequestId::new(request_id)
        .map_err(|e| CirculationError::Validation(format!("request_id: {}", e)))?;

    execute_deny_request(&state.service_deps, DenyRequest { request_id }).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /loans/:id/return - 返却を記録
///
/// 返却日は記録日（今日）。期限を過ぎた返却は借り手に
/// ストライクを1回発行する。
pub async fn record_return(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<String>,
) -> Result<(StatusCode, Json<BookReturnedResponse>), ApiError> {
    let loan_id = LoanId::new(loan_id)
        .map_err(|e| CirculationError::Validation(format!("loan_id: {}", e)))?;

    let cmd = RecordReturn {
        loan_id,
        returned_on: today(),
    };

    let receipt = execute_record_return(&state.service_deps, cmd).await?;

    Ok((StatusCode::OK, Json(BookReturnedResponse::from(receipt))))
}

/// POST /books/:id/status - 書籍ステータスを明示的に上書き
///
/// 整備中への切り替えなどの管理者操作。貸出ライフサイクルの
/// 遷移（Lent・Available）は承認・返却が行うため、通常は使わない。
pub async fn set_book_status(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
    Json(body): Json<OverrideBookStatusBody>,
) -> Result<StatusCode, ApiError> {
    let book_id = BookId::new(book_id)
        .map_err(|e| CirculationError::Validation(format!("book_id: {}", e)))?;
    let status = body
        .status
        .parse::<BookStatus>()
        .map_err(CirculationError::Validation)?;

    override_book_status(&state.service_deps, &book_id, status).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /requests?member_id=... - 申請者のリクエスト履歴
///
/// リクエスト日の新しい順。各件に書籍タイトルと派生ステータス
/// （承認待ち・承認済みと貸出参照・却下）を付与する。
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Vec<RequestHistoryResponse>>, ApiError> {
    // member_idを必須とする
    let member_id = query.member_id.ok_or_else(|| {
        CirculationError::Validation("member_id query parameter is required".to_string())
    })?;
    let member_id = MemberId::new(member_id)
        .map_err(|e| CirculationError::Validation(format!("member_id: {}", e)))?;

    let entries = list_requests_for_member(&state.service_deps, &member_id).await?;

    Ok(Json(
        entries.into_iter().map(RequestHistoryResponse::from).collect(),
    ))
}

/// GET /requests/pending - Pendingリクエストのある書籍のワークリスト
pub async fn list_pending_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PendingBookResponse>>, ApiError> {
    let summaries = pending_worklist(&state.service_deps).await?;

    Ok(Json(
        summaries.into_iter().map(PendingBookResponse::from).collect(),
    ))
}

/// GET /books/:id/queue - 書籍の待ち行列をポリシー順で取得
///
/// 順序：ストライク数昇順 → リクエスト日昇順 → 入会日昇順 →
/// リクエストID辞書順。Pendingリクエストが無い場合は空の配列。
pub async fn get_book_queue(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<RankedRequestResponse>>, ApiError> {
    let book_id = BookId::new(book_id)
        .map_err(|e| CirculationError::Validation(format!("book_id: {}", e)))?;

    let ranked = rank_book_queue(&state.service_deps, &book_id).await?;

    Ok(Json(
        ranked.into_iter().map(RankedRequestResponse::from).collect(),
    ))
}

/// GET /loans/active - 未返却の貸出一覧（期限状態の注釈つき）
pub async fn list_open_loans(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ActiveLoanResponse>>, ApiError> {
    let entries = list_active_loans(&state.service_deps, today()).await?;

    Ok(Json(
        entries.into_iter().map(ActiveLoanResponse::from).collect(),
    ))
}

/// GET /strikes - ストライク履歴（発行日の新しい順）
pub async fn list_strike_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StrikeResponse>>, ApiError> {
    let rows = list_strikes(&state.service_deps).await?;

    Ok(Json(rows.into_iter().map(StrikeResponse::from).collect()))
}
