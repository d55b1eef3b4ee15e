//! Service layer modules for external integrations.

pub mod storage;

pub use storage::StorageClient;
