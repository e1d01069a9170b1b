//! Target-specific runtime helpers shared by the SDK modules.

pub mod runtime;
