//! Batch policies over the repository

mod bulk;
mod executor;
mod uploads;

pub use bulk::{BulkOperations, BulkReport};
pub use executor::AutoHibernationExecutor;
pub use uploads::{UploadRepair, UploadRepairReport};
