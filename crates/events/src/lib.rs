//! Activity fan-out for the folio content hub.
//!
//! - [`ActivityBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; it is the [`ActivitySink`] handed to the
//!   engines.
//! - [`ActivityPersistence`]: background task that appends every event to
//!   the `admin_activity` table.
//!
//! [`ActivitySink`]: folio_core::activity::ActivitySink

pub mod bus;
pub mod persistence;

pub use bus::ActivityBus;
pub use persistence::ActivityPersistence;
