//! HTTP handlers, one module per resource.

pub mod content_hub;
