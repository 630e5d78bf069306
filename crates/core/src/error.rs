use agentils_model::ErrorKind;
use thiserror::Error;

use crate::conversation::Conversation;
use crate::tool::SchemaError;

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that escape the function-call loop.
///
/// Failures of individual tools are not listed here. They are converted
/// into error payloads and sent back to the model instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings or credential are invalid or missing.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A tool cannot be described, or its arguments don't match its
    /// parameters.
    #[error("tool `{tool}`: {source}")]
    Schema {
        /// Name of the offending tool.
        tool: String,
        /// What went wrong.
        source: SchemaError,
    },

    /// The model requested a tool that is not registered.
    #[error("model requested an unknown tool `{name}`")]
    ToolNotFound {
        /// The requested name.
        name: String,
        /// The conversation up to the failure.
        transcript: Conversation,
    },

    /// The model asked for more tool calls than allowed.
    #[error(
        "function call budget exceeded: {count} call(s) made, \
         {requested} more requested, at most {max} allowed"
    )]
    MaxCallsExceeded {
        /// Number of calls executed before aborting.
        count: usize,
        /// Number of calls in the rejected round.
        requested: usize,
        /// The configured maximum.
        max: usize,
        /// The conversation up to the failure.
        transcript: Conversation,
    },

    /// The model provider failed.
    #[error("model unavailable ({kind}): {message}")]
    ModelUnavailable {
        /// The kind reported by the provider.
        kind: ErrorKind,
        /// The provider's error message.
        message: String,
    },

    /// The model output is not valid structured data.
    #[error("cannot parse model output: {reason}")]
    OutputParse {
        /// The text returned by the model, unchanged.
        raw: String,
        /// Why parsing failed.
        reason: String,
    },
}

impl Error {
    #[inline]
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the partial conversation carried by this error, if any.
    pub fn transcript(&self) -> Option<&Conversation> {
        match self {
            Error::ToolNotFound { transcript, .. }
            | Error::MaxCallsExceeded { transcript, .. } => Some(transcript),
            _ => None,
        }
    }
}
