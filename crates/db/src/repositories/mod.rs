//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod activity_repo;
pub mod content_change_repo;
pub mod content_plan_repo;
pub mod content_record_repo;

pub use activity_repo::ActivityRepo;
pub use content_change_repo::ContentChangeRepo;
pub use content_plan_repo::ContentPlanRepo;
pub use content_record_repo::ContentRecordRepo;
