use serde::{Deserialize, Serialize};
use std::fmt;

/// ID生成エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// 空のIDは許可されない
    Empty,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::Empty => write!(f, "id must not be empty"),
        }
    }
}

impl std::error::Error for IdError {}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// 呼び出し元が与えたIDから生成する
            ///
            /// # エラー
            /// 空文字（空白のみを含む）の場合は`IdError::Empty`を返す
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(IdError::Empty);
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id! {
    /// 会員ID - 会員管理コンテキストへの参照（例: M001）
    MemberId
}

string_id! {
    /// 書籍ID - カタログ管理コンテキストへの参照（例: B001）
    BookId
}

string_id! {
    /// 職員ID - 承認操作を行った職員への参照（例: A001）
    ///
    /// セッショングローバルではなく、コマンドの明示的な値として毎回渡される。
    StaffId
}

string_id! {
    /// 貸出リクエストID（例: BR003）
    ///
    /// ストア側のシーケンスから単調増加で採番される。
    /// 3桁ゼロ埋めのため999までは辞書順が採番順と一致する。
    /// それ以降も辞書順は全順序のままであり、ランキングの
    /// 最終タイブレークに必要な決定性は保たれる。
    RequestId
}

string_id! {
    /// 貸出ID（例: T001）
    LoanId
}

string_id! {
    /// ストライクID（例: S001）
    StrikeId
}

impl RequestId {
    /// シーケンス番号からリクエストIDを生成する
    pub fn from_seq(seq: u64) -> Self {
        Self(format!("BR{:03}", seq))
    }
}

impl LoanId {
    /// シーケンス番号から貸出IDを生成する
    pub fn from_seq(seq: u64) -> Self {
        Self(format!("T{:03}", seq))
    }
}

impl StrikeId {
    /// シーケンス番号からストライクIDを生成する
    pub fn from_seq(seq: u64) -> Self {
        Self(format!("S{:03}", seq))
    }
}

/// ストライク数
///
/// 不変条件：会員のStrike明細数と常に一致するキャッシュ集計値。
/// 変更はStrike Issuer（返却コミット）経由のみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrikeCount(u32);

impl StrikeCount {
    /// 新規会員（0回）
    pub fn zero() -> Self {
        Self(0)
    }

    pub fn from_value(value: u32) -> Self {
        Self(value)
    }

    /// ストライクを1回分加算した値を返す
    pub fn incremented(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for StrikeCount {
    fn default() -> Self {
        Self::zero()
    }
}

/// 書籍ステータス
///
/// 遷移はLending Engine（承認・返却）または管理者の明示的な上書きに限る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookStatus {
    /// 貸出可能
    Available,
    /// 貸出中
    Lent,
    /// 予約済み
    Reserved,
    /// 整備中
    Maintenance,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Lent => "Lent",
            BookStatus::Reserved => "Reserved",
            BookStatus::Maintenance => "Maintenance",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(BookStatus::Available),
            "Lent" => Ok(BookStatus::Lent),
            "Reserved" => Ok(BookStatus::Reserved),
            "Maintenance" => Ok(BookStatus::Maintenance),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

/// リクエストステータス
///
/// Pendingのみが遷移可能。CompletedとDeniedは終端状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// 承認待ち
    Pending,
    /// 承認済み（貸出が作成された）
    Completed,
    /// 却下
    Denied,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Completed => "Completed",
            RequestStatus::Denied => "Denied",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Completed" => Ok(RequestStatus::Completed),
            "Denied" => Ok(RequestStatus::Denied),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}
