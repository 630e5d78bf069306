//! Assembles [`ModelRequest`]s from settings, history and tools.

use agentils_model::{
    GenerationParams, ModelMessage, ModelRequest, ModelTool, ResponseFormat,
};

use crate::config::{GenerationConfig, OutputMode};
use crate::error::Result;
use crate::tool::ToolDescriptor;

/// Builds requests for one [`GenerationConfig`] and tool set.
#[derive(Clone, Debug)]
pub struct RequestBuilder<'a> {
    config: &'a GenerationConfig,
    tools: Vec<ModelTool>,
}

impl<'a> RequestBuilder<'a> {
    /// Creates a builder without tools.
    #[inline]
    pub fn new(config: &'a GenerationConfig) -> Self {
        Self {
            config,
            tools: vec![],
        }
    }

    /// Declares the given tools in every built request.
    pub fn with_tools<'t, I>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = &'t ToolDescriptor>,
    {
        self.tools
            .extend(tools.into_iter().map(ToolDescriptor::to_model_tool));
        self
    }

    #[inline]
    pub(crate) fn with_model_tools(mut self, tools: Vec<ModelTool>) -> Self {
        self.tools = tools;
        self
    }

    /// Builds a request holding a single user prompt.
    #[inline]
    pub fn build(&self, prompt: &str) -> Result<ModelRequest> {
        self.build_with_history(vec![ModelMessage::User(prompt.to_owned())])
    }

    /// Builds a request carrying the given conversation.
    ///
    /// The `tools` field is `None` when no tool is declared, never an empty
    /// list.
    pub fn build_with_history(
        &self,
        messages: Vec<ModelMessage>,
    ) -> Result<ModelRequest> {
        self.config.validate()?;

        let tools = (!self.tools.is_empty()).then(|| self.tools.clone());
        // Most services refuse to combine function calling with a JSON
        // response type. The output is still parsed as JSON afterwards.
        let response_format = match self.config.output_mode {
            OutputMode::Json if tools.is_none() => ResponseFormat::Json,
            _ => ResponseFormat::Text,
        };

        Ok(ModelRequest {
            model: self.config.model.clone(),
            system_instruction: self.config.system_instruction.clone(),
            generation: GenerationParams {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                response_format,
            },
            messages,
            tools,
        })
    }
}
