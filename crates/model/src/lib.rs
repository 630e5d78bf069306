//! An abstraction layer for remote generation services.
//!
//! This crate establishes a unified protocol for the execution engine to
//! interact with the supported model services, so that the engine can
//! switch between them without modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.
//!
//! The request type mirrors what remote generation APIs expect: a model
//! name, optional generation settings, the conversation so far, and an
//! optional tool declaration list. Providers translate it into their own
//! wire format.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
