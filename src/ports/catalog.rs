use crate::domain::value_objects::{BookId, BookStatus, MemberId, StrikeCount};
use async_trait::async_trait;
use chrono::NaiveDate;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// カタログストアが保持する会員レコード
///
/// join_dateは作成後不変。strike_countはStrike明細数のキャッシュ集計で、
/// 返却コミット以外では変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub member_id: MemberId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub joined_on: NaiveDate,
    pub strike_count: StrikeCount,
}

/// カタログストアが保持する書籍レコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub edition: String,
    pub condition: String,
    pub status: BookStatus,
}

/// カタログストアポート
///
/// 貸出コンテキストとカタログ（会員・書籍）コンテキストの境界。
/// 核は存在確認とステータス参照のみに使い、CRUDの詳細は知らない。
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// 会員を取得する
    ///
    /// リクエスト作成前の参照整合性チェックと、ランキング時の
    /// ストライク数・入会日の取得に使用される。
    async fn get_member(&self, member_id: &MemberId) -> Result<Option<MemberRecord>>;

    /// 書籍を取得する
    async fn get_book(&self, book_id: &BookId) -> Result<Option<BookRecord>>;

    /// 書籍ステータスを明示的に上書きする（管理者操作）
    ///
    /// Lending Engineの遷移はストアのコミット内で行われるため、
    /// このメソッドは整備中への切り替えなどの上書きにのみ使う。
    /// 書籍が存在しない場合はfalseを返す。
    async fn set_book_status(&self, book_id: &BookId, status: BookStatus) -> Result<bool>;
}
