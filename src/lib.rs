#![doc = include_str!("RUSTDOC.md")]

pub mod functions;
pub mod logger;
pub mod platform;
