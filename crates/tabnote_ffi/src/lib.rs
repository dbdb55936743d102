//! Flutter-facing bindings for `tabnote_core`.

pub mod api;
