//! An out-of-the-box agent toolkit that wires the Gemini provider, a couple
//! of built-in tools and the core function-call loop together.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring tool-augmented generation into your own
//! host apps.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod settings;
pub mod tools;

pub use settings::EnvSettings;

/// Re-exports of [`agentils_core`] crate.
pub mod core {
    pub use agentils_core::*;
}

/// Re-exports of [`agentils_model`] crate.
pub mod model {
    pub use agentils_model::*;
}

/// Re-exports of [`agentils_gemini_model`] crate.
pub mod gemini {
    pub use agentils_gemini_model::*;
}
