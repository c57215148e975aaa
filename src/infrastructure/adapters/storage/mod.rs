//! Storage Adapter - 暂存实现

mod file_staging;

pub use file_staging::FileResourceStaging;
