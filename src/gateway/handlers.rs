//! Gateway request handlers, one module per resource

mod health;
mod hospital;
mod patient;
mod transfer;

// Glob re-exports carry the `__path_*` items generated by `#[utoipa::path]`
pub use health::*;
pub use hospital::*;
pub use patient::*;
pub use transfer::*;
