//! Domain core for the folio content hub.
//!
//! Holds the content-table registry, the plan/action/change model, and the
//! engines that execute and revert content plans. Storage is reached only
//! through the [`store`] traits, so this crate has no database dependency;
//! `folio-db` supplies the PostgreSQL implementations and [`memory`] supplies
//! in-process ones.

pub mod access;
pub mod action;
pub mod activity;
pub mod change;
pub mod diff;
pub mod engine;
pub mod error;
pub mod executor;
pub mod memory;
pub mod plan;
pub mod revert;
pub mod snapshot;
pub mod store;
pub mod tables;
pub mod types;
