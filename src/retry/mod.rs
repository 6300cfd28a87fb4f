//! Retry module (ergonomic namespace)
//! - policy.rs: configuration, classification and the retry executor
//! - completer.rs: retrying wrappers over completers and clients

pub mod completer;
pub mod policy;

pub use completer::*;
pub use policy::*;
