//! Core logic including the function-call loop, tool registry, request
//! building, output normalization and chat sessions.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod config;
pub mod conversation;
mod error;
mod model_client;
pub mod output;
pub mod request;
mod session;
pub mod tool;

pub use agent::{Agent, AgentBuilder, Completion};
pub use config::{Credential, FunctionCalling, GenerationConfig, OutputMode};
pub use error::{Error, Result};
pub use output::Output;
pub use session::Session;
