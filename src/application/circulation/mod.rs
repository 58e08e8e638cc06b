mod errors;
mod lending_service;
mod request_service;

pub use errors::{CirculationError, Result};
pub use lending_service::{
    approve_request, deny_request, due_status, list_active_loans, list_strikes, record_return,
    ActiveLoanEntry, DueStatus, ReturnReceipt,
};
pub use request_service::{
    list_requests_for_member, override_book_status, pending_worklist, rank_book_queue,
    submit_request, RequestDetail, RequestHistoryEntry, ServiceDependencies,
};
