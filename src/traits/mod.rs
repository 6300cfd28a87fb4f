//! Capability traits consumed by the wrappers in this crate.

pub mod client;

pub use client::*;
