//! Flutter-facing bindings for Journey core.

pub mod api;
