//! Record types persisted by the store
//!
//! - `CdxRecord`: one Wayback Machine capture of a URL
//! - `CommitRecord`: one GitHub commit, flattened for storage

mod cdx;
mod commit;

pub use cdx::CdxRecord;
pub use commit::{Commit, CommitDetails, CommitRecord, GitHubUser, GitUser};
