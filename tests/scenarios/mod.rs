//! End-to-end scenarios, one module per component.

mod loader;
mod workspace;
