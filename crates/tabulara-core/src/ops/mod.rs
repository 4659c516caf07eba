pub mod document_ops;
pub mod extraction_ops;
pub mod ledger;
pub mod preprocessing_ops;
pub mod session_ops;
pub mod store;
pub mod transaction;

pub use ledger::IdempotencyLedger;
pub use store::Store;
pub use transaction::Transaction;
