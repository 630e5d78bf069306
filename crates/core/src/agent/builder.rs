use std::sync::Arc;

use agentils_model::ModelProvider;

use super::Agent;
use crate::config::{FunctionCalling, GenerationConfig};
use crate::error::Result;
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Tool, ToolObject, ToolRegistry, Toolset};

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    config: GenerationConfig,
    calling: FunctionCalling,
    tools: Vec<Arc<dyn ToolObject>>,
    registry: Option<Arc<ToolRegistry>>,
    on_transcript: Option<super::TranscriptFn>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            config: GenerationConfig::default(),
            calling: FunctionCalling::default(),
            tools: vec![],
            registry: None,
            on_transcript: None,
        }
    }

    /// Sets the generation settings.
    #[inline]
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(AnyTool(tool)));
        self
    }

    /// Uses `registry` to describe the tools, so that descriptors are
    /// shared with other agents.
    ///
    /// Without it, a private registry is created on build.
    #[inline]
    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets all function calling settings at once.
    #[inline]
    pub fn with_function_calling(mut self, calling: FunctionCalling) -> Self {
        self.calling = calling;
        self
    }

    /// Enables or disables automatic execution of tool calls.
    #[inline]
    pub fn automatic_function_calling(mut self, enabled: bool) -> Self {
        self.calling.automatic = enabled;
        self
    }

    /// Sets the maximum number of tool calls per invocation.
    #[inline]
    pub fn max_function_calls(mut self, max: usize) -> Self {
        self.calling.max_calls = max;
        self
    }

    /// Sets whether invalid tool arguments abort the invocation.
    #[inline]
    pub fn strict_arguments(mut self, strict: bool) -> Self {
        self.calling.strict_arguments = strict;
        self
    }

    /// Attaches a callback to receive the model text as it streams in.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Validates the settings, describes the tools and builds the agent.
    pub fn build(self) -> Result<Agent> {
        let AgentBuilder {
            model_client,
            config,
            calling,
            tools,
            registry,
            on_transcript,
        } = self;

        config.validate()?;
        let registry = registry.unwrap_or_default();
        let toolset = Toolset::build(&registry, tools)?;
        debug!(
            "built an agent for {} with {} tool(s)",
            config.model,
            toolset.len()
        );

        Ok(Agent {
            model_client,
            config,
            calling,
            toolset: Arc::new(toolset),
            on_transcript,
        })
    }
}
