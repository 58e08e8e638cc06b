pub mod catalog;
pub mod lending_store;
pub mod request_ledger;

pub use catalog::{BookRecord, CatalogStore, MemberRecord};
pub use lending_store::{ApprovalOutcome, LendingStore, OpenLoanRow, ReturnOutcome, StrikeRow};
pub use request_ledger::{DecisionOutcome, PendingBookSummary, RequestLedger};
