use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{
    BookId, CloseLoanError, LoanId, MemberId, OpenLoanError, Request, RequestId, StaffId,
};

/// 貸出期間（日数）
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Loan集約 - 承認されたリクエストから作られる排他的な貸出記録
///
/// 不変条件：
/// - 1冊の書籍に対して未返却（returned_onがNone）の貸出は同時に1件まで
/// - returned_onは一度設定されたら変更不可
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    /// 元になったリクエスト（1:1）
    pub request_id: RequestId,
    pub book_id: BookId,
    pub borrower_id: MemberId,
    pub borrowed_on: NaiveDate,
    pub due_on: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    /// 承認した職員（監査情報）
    pub approved_by: StaffId,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.returned_on.is_none()
    }
}

/// 純粋関数：承認されたリクエストから貸出を作成する
///
/// ビジネスルール：
/// - 返却期限はデフォルトで貸出日 + 14日
/// - 期限の上書きが指定された場合は貸出日より後でなければならない
///
/// 副作用なし。書籍ステータスの遷移はストアのコミットで行う。
pub fn open_loan(
    loan_id: LoanId,
    request: &Request,
    borrowed_on: NaiveDate,
    due_override: Option<NaiveDate>,
    approved_by: StaffId,
) -> Result<Loan, OpenLoanError> {
    let due_on = match due_override {
        Some(due_on) => {
            if due_on <= borrowed_on {
                return Err(OpenLoanError::DueDateNotAfterBorrowDate {
                    borrowed_on,
                    due_on,
                });
            }
            due_on
        }
        None => borrowed_on + Duration::days(LOAN_PERIOD_DAYS),
    };

    Ok(Loan {
        loan_id,
        request_id: request.request_id.clone(),
        book_id: request.book_id.clone(),
        borrower_id: request.requester_id.clone(),
        borrowed_on,
        due_on,
        returned_on: None,
        approved_by,
    })
}

/// 純粋関数：貸出を返却済みにする
///
/// 延滞していても返却は受け付ける。ストライクの判定は
/// `strike::assess_late_return`が閉じた貸出に対して行う。
///
/// # エラー
/// - 既に返却済みの場合は`CloseLoanError::AlreadyReturned`
/// - 返却日が貸出日より前の場合は`CloseLoanError::ReturnedBeforeBorrowDate`
pub fn close_loan(loan: &Loan, returned_on: NaiveDate) -> Result<Loan, CloseLoanError> {
    if loan.returned_on.is_some() {
        return Err(CloseLoanError::AlreadyReturned);
    }
    if returned_on < loan.borrowed_on {
        return Err(CloseLoanError::ReturnedBeforeBorrowDate {
            borrowed_on: loan.borrowed_on,
            returned_on,
        });
    }
    Ok(Loan {
        returned_on: Some(returned_on),
        ..loan.clone()
    })
}

/// 純粋関数：延滞判定（暦日単位）
pub fn is_overdue(loan: &Loan, today: NaiveDate) -> bool {
    loan.is_open() && today > loan.due_on
}
