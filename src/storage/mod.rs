pub mod csv_storage;
pub mod storage_manager;

pub use csv_storage::*;
pub use storage_manager::*;
