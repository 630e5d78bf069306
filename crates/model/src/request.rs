use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::ToolCallRequest;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    /// Name of the model to use.
    pub model: String,
    /// The system instructions, if any.
    pub system_instruction: Option<String>,
    /// Sampling and output settings.
    pub generation: GenerationParams,
    /// The conversation so far, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tools that are available to the model.
    ///
    /// `None` and `Some(vec![])` are different things for some services:
    /// the former means the request declares no tools at all. Request
    /// builders should never produce an empty list.
    pub tools: Option<Vec<ModelTool>>,
}

/// Generation settings of a request.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Upper bound of generated tokens.
    pub max_output_tokens: Option<u32>,
    /// The format the model is asked to respond in.
    pub response_format: ResponseFormat,
}

/// The format of the model output.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Free-form text.
    #[default]
    Text,
    /// A JSON document.
    Json,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelMessage {
    /// A user input text.
    User(String),
    /// A message generated by the model.
    Assistant(AssistantMessage),
    /// Results of the tool calls requested by the previous assistant
    /// message, in the order the calls were issued.
    ToolResults(Vec<ToolCallResult>),
}

/// A message generated by the model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssistantMessage {
    /// The text part of the message.
    pub text: String,
    /// Tool calls requested in this message, in the order they were issued.
    pub tool_calls: Vec<ToolCallRequest>,
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// Name of the tool that was called.
    pub name: String,
    /// The result of the tool call.
    pub content: String,
    /// Whether `content` describes a failure.
    pub is_error: bool,
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// For most model providers, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}
