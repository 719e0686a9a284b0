pub mod recommendation;
pub mod report;
pub mod transaction;

pub use recommendation::{Limits, Recommendation};
pub use transaction::{Category, Segment, TransactionRecord};
