use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::value_objects::{
    BookId, BookStatus, LoanId, MemberId, RequestId, StrikeId,
};
use crate::domain::{LateReturnPenalty, Loan, Request, Strike};
use crate::ports::catalog::{BookRecord, CatalogStore, MemberRecord};
use crate::ports::lending_store::{
    ApprovalOutcome, LendingStore, OpenLoanRow, ReturnOutcome, StrikeRow,
};
use crate::ports::request_ledger::{DecisionOutcome, PendingBookSummary, RequestLedger};

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type Result<T> = std::result::Result<T, BoxError>;

#[derive(Default)]
struct State {
    members: HashMap<MemberId, MemberRecord>,
    books: HashMap<BookId, BookRecord>,
    requests: HashMap<RequestId, Request>,
    loans: HashMap<LoanId, Loan>,
    strikes: Vec<Strike>,
    request_seq: u64,
    loan_seq: u64,
    strike_seq: u64,
}

/// In-memory implementation of all circulation ports.
///
/// A single mutex over the whole state makes every commit trivially
/// atomic, which is exactly the serialization discipline the postgres
/// adapter gets from row locks and transactions. Used by integration
/// tests and local experiments.
pub struct InMemoryLibrary {
    state: Mutex<State>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Seed a member record.
    pub fn add_member(&self, member: MemberRecord) {
        let mut state = self.state.lock().unwrap();
        state.members.insert(member.member_id.clone(), member);
    }

    /// Seed a book record.
    pub fn add_book(&self, book: BookRecord) {
        let mut state = self.state.lock().unwrap();
        state.books.insert(book.book_id.clone(), book);
    }

    /// Remove a member record, simulating an out-of-band deletion.
    pub fn remove_member(&self, member_id: &MemberId) {
        let mut state = self.state.lock().unwrap();
        state.members.remove(member_id);
    }

    /// Current strike count of a member, for test assertions.
    pub fn strike_count_of(&self, member_id: &MemberId) -> Option<u32> {
        let state = self.state.lock().unwrap();
        state
            .members
            .get(member_id)
            .map(|m| m.strike_count.value())
    }

    /// Current status of a book, for test assertions.
    pub fn book_status_of(&self, book_id: &BookId) -> Option<BookStatus> {
        let state = self.state.lock().unwrap();
        state.books.get(book_id).map(|b| b.status)
    }
}

impl Default for InMemoryLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for InMemoryLibrary {
    async fn get_member(&self, member_id: &MemberId) -> Result<Option<MemberRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.members.get(member_id).cloned())
    }

    async fn get_book(&self, book_id: &BookId) -> Result<Option<BookRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.books.get(book_id).cloned())
    }

    async fn set_book_status(&self, book_id: &BookId, status: BookStatus) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.books.get_mut(book_id) {
            Some(book) => {
                book.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RequestLedger for InMemoryLibrary {
    async fn reserve_request_id(&self) -> Result<RequestId> {
        let mut state = self.state.lock().unwrap();
        state.request_seq += 1;
        Ok(RequestId::from_seq(state.request_seq))
    }

    async fn append(&self, request: Request) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.requests.insert(request.request_id.clone(), request);
        Ok(())
    }

    async fn get(&self, request_id: &RequestId) -> Result<Option<Request>> {
        let state = self.state.lock().unwrap();
        Ok(state.requests.get(request_id).cloned())
    }

    async fn pending_for_book(&self, book_id: &BookId) -> Result<Vec<Request>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .requests
            .values()
            .filter(|r| r.status.is_pending() && &r.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn find_by_requester(&self, member_id: &MemberId) -> Result<Vec<Request>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .requests
            .values()
            .filter(|r| &r.requester_id == member_id)
            .cloned()
            .collect())
    }

    async fn pending_summary(&self) -> Result<Vec<PendingBookSummary>> {
        let state = self.state.lock().unwrap();
        let mut counts: HashMap<&BookId, u64> = HashMap::new();
        for request in state.requests.values() {
            if request.status.is_pending() {
                *counts.entry(&request.book_id).or_default() += 1;
            }
        }

        let mut summaries = Vec::with_capacity(counts.len());
        for (book_id, pending_count) in counts {
            let book = state
                .books
                .get(book_id)
                .ok_or_else(|| -> BoxError {
                    format!("pending request references unknown book {}", book_id).into()
                })?;
            summaries.push(PendingBookSummary {
                book_id: book.book_id.clone(),
                title: book.title.clone(),
                author: book.author.clone(),
                pending_count,
            });
        }
        summaries.sort_by(|a, b| a.book_id.cmp(&b.book_id));
        Ok(summaries)
    }

    async fn commit_denial(&self, request: &Request) -> Result<DecisionOutcome> {
        let mut state = self.state.lock().unwrap();
        match state.requests.get_mut(&request.request_id) {
            Some(stored) if stored.status.is_pending() => {
                *stored = request.clone();
                Ok(DecisionOutcome::Committed)
            }
            Some(_) => Ok(DecisionOutcome::RequestNotPending),
            None => Err(format!("request {} vanished from ledger", request.request_id).into()),
        }
    }
}

#[async_trait]
impl LendingStore for InMemoryLibrary {
    async fn reserve_loan_id(&self) -> Result<LoanId> {
        let mut state = self.state.lock().unwrap();
        state.loan_seq += 1;
        Ok(LoanId::from_seq(state.loan_seq))
    }

    async fn commit_approval(&self, request: &Request, loan: &Loan) -> Result<ApprovalOutcome> {
        let mut state = self.state.lock().unwrap();

        // Book check under the lock is the final word; the service's
        // pre-check only exists for a friendlier fast path.
        let book_status = match state.books.get(&request.book_id) {
            Some(book) => book.status,
            None => {
                return Err(
                    format!("approval references unknown book {}", request.book_id).into(),
                )
            }
        };
        if book_status != BookStatus::Available {
            return Ok(ApprovalOutcome::BookUnavailable(book_status));
        }

        match state.requests.get(&request.request_id) {
            Some(stored) if stored.status.is_pending() => {}
            Some(_) => return Ok(ApprovalOutcome::RequestNotPending),
            None => {
                return Err(format!("request {} vanished from ledger", request.request_id).into())
            }
        }

        // All checks passed: apply every write together.
        state
            .requests
            .insert(request.request_id.clone(), request.clone());
        state.loans.insert(loan.loan_id.clone(), loan.clone());
        if let Some(book) = state.books.get_mut(&request.book_id) {
            book.status = BookStatus::Lent;
        }
        Ok(ApprovalOutcome::Committed)
    }

    async fn commit_return(
        &self,
        loan: &Loan,
        penalty: Option<&LateReturnPenalty>,
    ) -> Result<ReturnOutcome> {
        let mut state = self.state.lock().unwrap();

        match state.loans.get(&loan.loan_id) {
            Some(stored) if stored.is_open() => {}
            _ => return Ok(ReturnOutcome::LoanNotOpen),
        }

        state.loans.insert(loan.loan_id.clone(), loan.clone());

        if let Some(penalty) = penalty {
            state.strike_seq += 1;
            let strike = Strike {
                strike_id: StrikeId::from_seq(state.strike_seq),
                member_id: penalty.member_id.clone(),
                loan_id: penalty.loan_id.clone(),
                issued_on: penalty.issued_on,
                reason: penalty.reason.clone(),
            };
            state.strikes.push(strike);
            match state.members.get_mut(&penalty.member_id) {
                Some(member) => member.strike_count = member.strike_count.incremented(),
                None => {
                    return Err(
                        format!("strike references unknown member {}", penalty.member_id).into(),
                    )
                }
            }
        }

        if let Some(book) = state.books.get_mut(&loan.book_id) {
            book.status = BookStatus::Available;
        }
        Ok(ReturnOutcome::Committed)
    }

    async fn find_open_loan(&self, loan_id: &LoanId) -> Result<Option<Loan>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .loans
            .get(loan_id)
            .filter(|loan| loan.is_open())
            .cloned())
    }

    async fn find_loan_for_request(&self, request_id: &RequestId) -> Result<Option<Loan>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .loans
            .values()
            .find(|loan| &loan.request_id == request_id)
            .cloned())
    }

    async fn open_loans(&self) -> Result<Vec<OpenLoanRow>> {
        let state = self.state.lock().unwrap();
        let mut rows = Vec::new();
        for loan in state.loans.values().filter(|loan| loan.is_open()) {
            let book_title = state
                .books
                .get(&loan.book_id)
                .map(|b| b.title.clone())
                .unwrap_or_default();
            let borrower_name = state
                .members
                .get(&loan.borrower_id)
                .map(|m| m.name.clone())
                .unwrap_or_default();
            rows.push(OpenLoanRow {
                loan: loan.clone(),
                book_title,
                borrower_name,
            });
        }
        rows.sort_by(|a, b| {
            a.loan
                .due_on
                .cmp(&b.loan.due_on)
                .then_with(|| a.loan.loan_id.cmp(&b.loan.loan_id))
        });
        Ok(rows)
    }

    async fn list_strikes(&self) -> Result<Vec<StrikeRow>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<StrikeRow> = state
            .strikes
            .iter()
            .map(|strike| StrikeRow {
                strike: strike.clone(),
                member_name: state
                    .members
                    .get(&strike.member_id)
                    .map(|m| m.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.strike
                .issued_on
                .cmp(&a.strike.issued_on)
                .then_with(|| b.strike.strike_id.cmp(&a.strike.strike_id))
        });
        Ok(rows)
    }
}
