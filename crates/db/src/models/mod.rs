//! Row types for the plan, change and activity tables.
//!
//! Each row converts into its `folio-core` domain type; a row whose text
//! columns no longer parse is reported as corrupt rather than dropped.

pub mod activity;
pub mod change;
pub mod plan;
