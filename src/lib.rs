//! Logs completed markdown checklist items from a notes vault into a
//! running task log document.

pub mod app;
