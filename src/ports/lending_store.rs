use crate::domain::value_objects::{BookStatus, LoanId, RequestId};
use crate::domain::{LateReturnPenalty, Loan, Request, Strike};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 承認コミットの結果
///
/// 同じ書籍への競合する承認は、ストアの直列化により
/// ちょうど1件だけCommittedになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// リクエスト遷移・貸出作成・書籍Lent化がまとめて記録された
    Committed,
    /// コミット時点で書籍がAvailableでなかった
    BookUnavailable(BookStatus),
    /// 別の呼び出しが先にリクエストを終端状態へ遷移させていた
    RequestNotPending,
}

/// 返却コミットの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// 返却・ストライク・書籍Available化がまとめて記録された
    Committed,
    /// 未返却の貸出が見つからない（競合する返却に先を越された場合を含む）
    LoanNotOpen,
}

/// 貸出中一覧の1行（書籍・会員の表示名つき）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenLoanRow {
    pub loan: Loan,
    pub book_title: String,
    pub borrower_name: String,
}

/// ストライク履歴の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrikeRow {
    pub strike: Strike,
    pub member_name: String,
}

/// 貸出ストアポート
///
/// 承認と返却のクリティカルセクションを担う。各コミットは原子的：
/// 全ての書き込みが行われるか、何も行われないかのどちらか。
#[async_trait]
pub trait LendingStore: Send + Sync {
    /// 新しい貸出IDをシーケンスから採番する
    async fn reserve_loan_id(&self) -> Result<LoanId>;

    /// 承認をコミットする
    ///
    /// 単一トランザクションで：
    /// 1. 書籍行をロックしてAvailableであることを確認
    /// 2. リクエストをPending条件付きでCompletedに更新
    /// 3. 貸出を挿入
    /// 4. 書籍ステータスをLentに更新
    ///
    /// 同じ書籍を対象とする承認はここで直列化される。
    async fn commit_approval(&self, request: &Request, loan: &Loan) -> Result<ApprovalOutcome>;

    /// 返却をコミットする
    ///
    /// 単一トランザクションで：
    /// 1. 貸出の返却日をreturned_on IS NULL条件付きで設定
    /// 2. ストライクがあれば明細を追記し、会員のキャッシュ集計を+1
    /// 3. 書籍ステータスをAvailableに戻す
    ///
    /// 条件付き更新が空振りした場合は何も書かずに`LoanNotOpen`。
    async fn commit_return(
        &self,
        loan: &Loan,
        penalty: Option<&LateReturnPenalty>,
    ) -> Result<ReturnOutcome>;

    /// 未返却の貸出をIDで取得する
    async fn find_open_loan(&self, loan_id: &LoanId) -> Result<Option<Loan>>;

    /// リクエストに対応する貸出を取得する（1:1）
    ///
    /// リクエスト履歴の「承認済み - 貸出参照」表示に使用される。
    async fn find_loan_for_request(&self, request_id: &RequestId) -> Result<Option<Loan>>;

    /// 未返却の貸出を返却期限の昇順で返す
    async fn open_loans(&self) -> Result<Vec<OpenLoanRow>>;

    /// 全ストライクを発行日の降順で返す
    async fn list_strikes(&self) -> Result<Vec<StrikeRow>>;
}
