pub mod commands;
pub mod errors;
pub mod loan;
pub mod ranking;
pub mod request;
pub mod strike;
pub mod value_objects;

pub use errors::*;
pub use loan::Loan;
pub use ranking::{RankedRequest, RequesterProfile};
pub use request::Request;
pub use strike::{LateReturnPenalty, Strike};
pub use value_objects::*;
