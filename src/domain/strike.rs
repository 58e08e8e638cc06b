use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Loan, LoanId, MemberId, StrikeId};

/// 延滞返却のストライク理由
pub const LATE_RETURN_REASON: &str = "late return";

/// 未採番のストライク
///
/// IDはストアが挿入時にシーケンスから採番する。
/// Strike明細は追記専用で、変更・削除されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateReturnPenalty {
    pub member_id: MemberId,
    pub loan_id: LoanId,
    pub issued_on: NaiveDate,
    pub reason: String,
}

/// 採番済みストライク（履歴表示用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    pub strike_id: StrikeId,
    pub member_id: MemberId,
    pub loan_id: LoanId,
    pub issued_on: NaiveDate,
    pub reason: String,
}

/// 純粋関数：返却済み貸出の延滞を判定する
///
/// ビジネスルール：
/// - 返却日が返却期限より厳密に後（暦日単位）ならストライク1件
/// - 期限当日・期限前の返却はストライクなし
/// - 未返却の貸出に対してはNone（判定は返却遷移のみを契機とする）
///
/// 貸出ごとの冪等性は、返却日が一度しか設定されない遷移
/// （`loan::close_loan`）を唯一の呼び出し点とすることで保証される。
pub fn assess_late_return(loan: &Loan) -> Option<LateReturnPenalty> {
    let returned_on = loan.returned_on?;
    if returned_on <= loan.due_on {
        return None;
    }
    Some(LateReturnPenalty {
        member_id: loan.borrower_id.clone(),
        loan_id: loan.loan_id.clone(),
        issued_on: returned_on,
        reason: LATE_RETURN_REASON.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookId, RequestId, StaffId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan_due(due_on: NaiveDate, returned_on: Option<NaiveDate>) -> Loan {
        Loan {
            loan_id: LoanId::from_seq(1),
            request_id: RequestId::from_seq(1),
            book_id: BookId::new("B001").unwrap(),
            borrower_id: MemberId::new("M001").unwrap(),
            borrowed_on: date(2025, 1, 1),
            due_on,
            returned_on,
            approved_by: StaffId::new("A001").unwrap(),
        }
    }

    #[test]
    fn test_one_day_late_issues_exactly_one_strike() {
        let loan = loan_due(date(2025, 1, 15), Some(date(2025, 1, 16)));
        let penalty = assess_late_return(&loan).unwrap();

        assert_eq!(penalty.member_id.as_str(), "M001");
        assert_eq!(penalty.loan_id.as_str(), "T001");
        assert_eq!(penalty.issued_on, date(2025, 1, 16));
        assert_eq!(penalty.reason, LATE_RETURN_REASON);
    }

    #[test]
    fn test_return_on_due_date_issues_no_strike() {
        let loan = loan_due(date(2025, 1, 15), Some(date(2025, 1, 15)));
        assert!(assess_late_return(&loan).is_none());
    }

    #[test]
    fn test_early_return_issues_no_strike() {
        let loan = loan_due(date(2025, 1, 15), Some(date(2025, 1, 10)));
        assert!(assess_late_return(&loan).is_none());
    }

    #[test]
    fn test_open_loan_is_never_assessed() {
        // 返却遷移だけが判定の契機
        let loan = loan_due(date(2025, 1, 15), None);
        assert!(assess_late_return(&loan).is_none());
    }
}
