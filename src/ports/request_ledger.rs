use crate::domain::value_objects::{BookId, MemberId, RequestId};
use crate::domain::Request;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Pendingリクエストを持つ書籍のサマリ（オペレーターのワークリスト用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBookSummary {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub pending_count: u64,
}

/// 終端遷移コミットの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// 遷移が記録された
    Committed,
    /// 別の呼び出しが先に終端状態へ遷移させていた
    RequestNotPending,
}

/// リクエスト台帳ポート
///
/// すべての貸出リクエストを状態つきで保持する待ち行列の実体。
/// 追記されたリクエストはPriority Rankerから即座に見える。
#[async_trait]
pub trait RequestLedger: Send + Sync {
    /// 新しいリクエストIDをシーケンスから採番する
    ///
    /// 採番は単調増加。競合する呼び出しでも重複しない。
    async fn reserve_request_id(&self) -> Result<RequestId>;

    /// Pendingリクエストを台帳に追記する
    async fn append(&self, request: Request) -> Result<()>;

    /// IDでリクエストを取得する
    async fn get(&self, request_id: &RequestId) -> Result<Option<Request>>;

    /// 1冊の書籍に対するPendingリクエストを取得する
    ///
    /// ランキングの入力。順序は保証しない（ランキングが並べ替える）。
    async fn pending_for_book(&self, book_id: &BookId) -> Result<Vec<Request>>;

    /// 申請者の全リクエストを取得する（履歴表示用）
    async fn find_by_requester(&self, member_id: &MemberId) -> Result<Vec<Request>>;

    /// Pendingリクエストが1件以上ある書籍のサマリを返す
    async fn pending_summary(&self) -> Result<Vec<PendingBookSummary>>;

    /// 却下遷移をコミットする
    ///
    /// Pendingのままの場合のみ書き込む条件付き更新。
    /// 既に終端状態なら`DecisionOutcome::RequestNotPending`。
    async fn commit_denial(&self, request: &Request) -> Result<DecisionOutcome>;
}
