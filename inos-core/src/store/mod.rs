//! Persistence of assessment results
//!
//! [`ResultStore`] serializes [`PassedAssessments`](crate::assessment::PassedAssessments)
//! into a string-keyed [`KeyValueStore`], which is either in memory or a
//! JSON file on disk.

pub mod file;
pub mod kv;
pub mod results;

pub use file::FileKeyValueStore;
pub use kv::{KeyValueStore, MemoryKeyValueStore};
pub use results::{PASSED_ASSESSMENTS_KEY, ResultRecord, ResultStore};
