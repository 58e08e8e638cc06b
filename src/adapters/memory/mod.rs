pub mod store;

pub use store::InMemoryLibrary;
