pub mod catalog;
pub mod lending_store;
pub mod request_ledger;

pub use catalog::CatalogStore;
pub use lending_store::LendingStore;
pub use request_ledger::RequestLedger;
