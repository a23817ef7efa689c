//! Filtered live queries over a record log
//!
//! A query is a single predicate of the form `<path> <op> '<literal>'`
//! evaluated against each record's JSON view. `QuerySession` pairs a
//! parsed predicate with a tailing reader to produce an unbounded,
//! in-order sequence of matching records for one subscriber.

pub mod error;
pub mod predicate;
pub mod session;

pub use error::{QueryError, Result};
pub use predicate::{Operator, Predicate};
pub use session::QuerySession;
