use chrono::NaiveDate;

/// リクエスト状態遷移のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTransitionError {
    /// Pending以外は承認・却下できない（終端状態）
    NotPending,
}

/// 貸出作成のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenLoanError {
    /// 指定された返却期限が貸出日より後でない
    DueDateNotAfterBorrowDate {
        borrowed_on: NaiveDate,
        due_on: NaiveDate,
    },
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseLoanError {
    /// 既に返却済み
    AlreadyReturned,
    /// 返却日が貸出日より前
    ReturnedBeforeBorrowDate {
        borrowed_on: NaiveDate,
        returned_on: NaiveDate,
    },
}
