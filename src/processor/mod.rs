pub mod category_flattener;
pub mod category_joiner;
pub mod column_normalizer;
pub mod frame_access;
pub mod record_cleaner;

pub use category_flattener::*;
pub use category_joiner::*;
pub use column_normalizer::*;
pub use record_cleaner::*;
