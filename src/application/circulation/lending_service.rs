use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::commands::{ApproveRequest, DenyRequest, RecordReturn};
use crate::domain::value_objects::BookStatus;
use crate::domain::{self, CloseLoanError, Loan};
use crate::ports::{ApprovalOutcome, DecisionOutcome, OpenLoanRow, ReturnOutcome, StrikeRow};

use super::errors::{CirculationError, Result};
use super::request_service::ServiceDependencies;

/// 返却期限に対する貸出の状態（貸出中一覧の表示用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DueStatus {
    /// 期限超過
    Overdue { days_late: i64 },
    /// 期限まで2日以内
    DueSoon { days_left: i64 },
    /// 順調
    OnSchedule,
}

/// 貸出中一覧の1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLoanEntry {
    pub loan: Loan,
    pub book_title: String,
    pub borrower_name: String,
    pub due_status: DueStatus,
}

/// 返却処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnReceipt {
    pub loan: Loan,
    /// 延滞によりストライクが発行されたか
    pub strike_issued: bool,
}

/// 純粋関数：返却期限に対する状態を求める（暦日単位）
pub fn due_status(loan: &Loan, today: NaiveDate) -> DueStatus {
    if domain::loan::is_overdue(loan, today) {
        return DueStatus::Overdue {
            days_late: (today - loan.due_on).num_days(),
        };
    }
    let days_left = (loan.due_on - today).num_days();
    if days_left <= 2 {
        DueStatus::DueSoon { days_left }
    } else {
        DueStatus::OnSchedule
    }
}

/// リクエストを承認し、貸出を作成する
///
/// ビジネスルール：
/// - リクエストが存在しPendingであること
/// - 書籍がAvailableであること（Lent・Reserved・Maintenanceは競合）
/// - 期限の上書きは貸出日より後であること（デフォルトは+14日）
///
/// リクエスト遷移・貸出作成・書籍Lent化はストアが単一コミットで
/// 原子的に行う。同じ書籍への競合する承認はちょうど1件だけ成功する。
pub async fn approve_request(deps: &ServiceDependencies, cmd: ApproveRequest) -> Result<Loan> {
    // 1. リクエストの取得と状態確認
    let request = deps
        .request_ledger
        .get(&cmd.request_id)
        .await
        .map_err(CirculationError::LedgerError)?
        .ok_or_else(|| CirculationError::RequestNotFound(cmd.request_id.clone()))?;

    if !request.status.is_pending() {
        return Err(CirculationError::RequestAlreadyDecided {
            request_id: request.request_id,
            status: request.status,
        });
    }

    // 2. 書籍の事前確認（最終判定はコミット内のロック下で再実施される）
    let book = deps
        .catalog
        .get_book(&request.book_id)
        .await
        .map_err(CirculationError::CatalogError)?
        .ok_or_else(|| CirculationError::BookNotFound(request.book_id.clone()))?;

    if book.status != BookStatus::Available {
        return Err(CirculationError::BookUnavailable {
            book_id: request.book_id,
            status: book.status,
        });
    }

    // 3. ドメイン層の純粋関数で遷移と貸出を組み立てる
    let approved = domain::request::approve_request(&request).map_err(|_| {
        CirculationError::RequestAlreadyDecided {
            request_id: request.request_id.clone(),
            status: request.status,
        }
    })?;

    let loan_id = deps
        .lending_store
        .reserve_loan_id()
        .await
        .map_err(CirculationError::LendingError)?;

    let loan = domain::loan::open_loan(
        loan_id,
        &approved,
        cmd.approved_on,
        cmd.due_override,
        cmd.approved_by,
    )
    .map_err(|e| match e {
        domain::OpenLoanError::DueDateNotAfterBorrowDate { borrowed_on, due_on } => {
            CirculationError::Validation(format!(
                "due date {} must be after borrow date {}",
                due_on, borrowed_on
            ))
        }
    })?;

    // 4. 原子的にコミット
    match deps
        .lending_store
        .commit_approval(&approved, &loan)
        .await
        .map_err(CirculationError::LendingError)?
    {
        ApprovalOutcome::Committed => {
            tracing::info!(
                request_id = %loan.request_id,
                loan_id = %loan.loan_id,
                book_id = %loan.book_id,
                due_on = %loan.due_on,
                "borrow request approved"
            );
            Ok(loan)
        }
        ApprovalOutcome::BookUnavailable(status) => Err(CirculationError::BookUnavailable {
            book_id: approved.book_id,
            status,
        }),
        ApprovalOutcome::RequestNotPending => {
            Err(already_decided(deps, &approved.request_id).await)
        }
    }
}

/// リクエストを却下する
///
/// 貸出は作成されず、書籍ステータスは変わらない。
pub async fn deny_request(deps: &ServiceDependencies, cmd: DenyRequest) -> Result<()> {
    let request = deps
        .request_ledger
        .get(&cmd.request_id)
        .await
        .map_err(CirculationError::LedgerError)?
        .ok_or_else(|| CirculationError::RequestNotFound(cmd.request_id.clone()))?;

    if !request.status.is_pending() {
        return Err(CirculationError::RequestAlreadyDecided {
            request_id: request.request_id,
            status: request.status,
        });
    }

    let denied = domain::request::deny_request(&request).map_err(|_| {
        CirculationError::RequestAlreadyDecided {
            request_id: request.request_id.clone(),
            status: request.status,
        }
    })?;

    match deps
        .request_ledger
        .commit_denial(&denied)
        .await
        .map_err(CirculationError::LedgerError)?
    {
        DecisionOutcome::Committed => {
            tracing::info!(request_id = %denied.request_id, "borrow request denied");
            Ok(())
        }
        DecisionOutcome::RequestNotPending => {
            Err(already_decided(deps, &denied.request_id).await)
        }
    }
}

/// 返却を記録する
///
/// 返却の記録・ストライク判定の反映・書籍のAvailable化は
/// ストアが単一コミットで行う。書籍がAvailableに戻るのは
/// 返却が永続化された後に限る。
///
/// 同じ貸出への競合する返却は、先に記録した側だけが成功し、
/// 後続はNotFound（未返却の貸出が存在しないため）。
pub async fn record_return(deps: &ServiceDependencies, cmd: RecordReturn) -> Result<ReturnReceipt> {
    let loan = deps
        .lending_store
        .find_open_loan(&cmd.loan_id)
        .await
        .map_err(CirculationError::LendingError)?
        .ok_or_else(|| CirculationError::LoanNotFound(cmd.loan_id.clone()))?;

    let closed = domain::loan::close_loan(&loan, cmd.returned_on).map_err(|e| match e {
        CloseLoanError::AlreadyReturned => CirculationError::LoanNotFound(cmd.loan_id.clone()),
        CloseLoanError::ReturnedBeforeBorrowDate {
            borrowed_on,
            returned_on,
        } => CirculationError::Validation(format!(
            "return date {} must not be before borrow date {}",
            returned_on, borrowed_on
        )),
    })?;

    // 返却遷移だけを契機にストライクを判定する（貸出ごとに冪等）
    let penalty = domain::strike::assess_late_return(&closed);

    match deps
        .lending_store
        .commit_return(&closed, penalty.as_ref())
        .await
        .map_err(CirculationError::LendingError)?
    {
        ReturnOutcome::Committed => {
            tracing::info!(
                loan_id = %closed.loan_id,
                returned_on = %cmd.returned_on,
                strike_issued = penalty.is_some(),
                "loan returned"
            );
            Ok(ReturnReceipt {
                loan: closed,
                strike_issued: penalty.is_some(),
            })
        }
        ReturnOutcome::LoanNotOpen => Err(CirculationError::LoanNotFound(cmd.loan_id)),
    }
}

/// 未返却の貸出を返却期限の昇順で返す（期限状態の注釈つき）
pub async fn list_active_loans(
    deps: &ServiceDependencies,
    today: NaiveDate,
) -> Result<Vec<ActiveLoanEntry>> {
    let rows = deps
        .lending_store
        .open_loans()
        .await
        .map_err(CirculationError::LendingError)?;

    Ok(rows
        .into_iter()
        .map(|OpenLoanRow { loan, book_title, borrower_name }| {
            let due_status = due_status(&loan, today);
            ActiveLoanEntry {
                loan,
                book_title,
                borrower_name,
                due_status,
            }
        })
        .collect())
}

/// ストライク履歴を発行日の新しい順で返す
pub async fn list_strikes(deps: &ServiceDependencies) -> Result<Vec<StrikeRow>> {
    deps.lending_store
        .list_strikes()
        .await
        .map_err(CirculationError::LendingError)
}

/// 競合に負けた側へ返すInvalidStateErrorを現在の状態から組み立てる
async fn already_decided(
    deps: &ServiceDependencies,
    request_id: &crate::domain::RequestId,
) -> CirculationError {
    let status = match deps.request_ledger.get(request_id).await {
        Ok(Some(request)) => request.status,
        // 読み直せない場合は承認済みとして報告する
        _ => crate::domain::RequestStatus::Completed,
    };
    CirculationError::RequestAlreadyDecided {
        request_id: request_id.clone(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{BookId, LoanId, MemberId, RequestId, StaffId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan() -> Loan {
        Loan {
            loan_id: LoanId::from_seq(1),
            request_id: RequestId::from_seq(1),
            book_id: BookId::new("B001").unwrap(),
            borrower_id: MemberId::new("M001").unwrap(),
            borrowed_on: date(2025, 1, 1),
            due_on: date(2025, 1, 15),
            returned_on: None,
            approved_by: StaffId::new("A001").unwrap(),
        }
    }

    #[test]
    fn test_due_status_overdue_counts_days_late() {
        assert_eq!(
            due_status(&loan(), date(2025, 1, 18)),
            DueStatus::Overdue { days_late: 3 }
        );
    }

    #[test]
    fn test_due_status_due_soon_within_two_days() {
        assert_eq!(
            due_status(&loan(), date(2025, 1, 13)),
            DueStatus::DueSoon { days_left: 2 }
        );
        assert_eq!(
            due_status(&loan(), date(2025, 1, 15)),
            DueStatus::DueSoon { days_left: 0 }
        );
    }

    #[test]
    fn test_due_status_on_schedule() {
        assert_eq!(due_status(&loan(), date(2025, 1, 10)), DueStatus::OnSchedule);
    }
}
