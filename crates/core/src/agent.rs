mod builder;
mod call_loop;

use std::fmt::{self, Debug};
use std::sync::Arc;

use agentils_model::ToolCallRequest;
use tracing::Instrument;

use crate::config::{FunctionCalling, GenerationConfig};
use crate::conversation::{Conversation, Turn};
use crate::error::Result;
use crate::model_client::ModelClient;
use crate::output::{self, Output};
use crate::session::Session;
use crate::tool::Toolset;
pub use builder::AgentBuilder;
use call_loop::{CallLoop, LoopOutcome};

pub(crate) type TranscriptFn = Arc<dyn Fn(&str) + Send + Sync>;

/// An agent, which binds a model provider, generation settings and a tool
/// set together.
///
/// The agent itself holds no conversation state. Every [`Agent::execute`]
/// starts from scratch, while a [`Session`] created by
/// [`Agent::create_session`] keeps the history across messages.
#[derive(Clone)]
pub struct Agent {
    model_client: ModelClient,
    config: GenerationConfig,
    calling: FunctionCalling,
    toolset: Arc<Toolset>,
    on_transcript: Option<TranscriptFn>,
}

/// Everything produced by one invocation.
#[derive(Clone, Debug)]
pub struct Completion {
    /// The normalized output.
    ///
    /// While tool calls are pending this is always the raw model text as
    /// [`Output::Text`], even in JSON output mode.
    pub output: Output,
    /// The whole conversation, including the prompt.
    pub transcript: Conversation,
    /// Number of tool calls executed.
    pub calls_made: usize,
    /// Tool calls requested by the model but not executed, because
    /// automatic function calling is disabled.
    ///
    /// The model has not answered yet when this is non-empty, so `output`
    /// is left unparsed.
    pub pending_tool_calls: Vec<ToolCallRequest>,
}

impl Agent {
    /// Runs the prompt produced by `prompt_fn` and returns the output.
    #[inline]
    pub async fn execute<F, S>(&self, prompt_fn: F) -> Result<Output>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.run(prompt_fn).await.map(|completion| completion.output)
    }

    /// Like [`Agent::execute`], but also returns the transcript and call
    /// statistics.
    ///
    /// With automatic function calling disabled the model may stop at a
    /// tool call request. The output is then the model text as
    /// [`Output::Text`] whatever the output mode, and the requests are in
    /// [`Completion::pending_tool_calls`].
    pub async fn run<F, S>(&self, prompt_fn: F) -> Result<Completion>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        let mut conversation = Conversation::new();
        conversation.push(Turn::user(prompt_fn().into()));

        let outcome = self.complete(conversation).await?;
        let output = self.normalize(&outcome)?;
        Ok(Completion {
            output,
            transcript: outcome.conversation,
            calls_made: outcome.calls_made,
            pending_tool_calls: outcome.pending_tool_calls,
        })
    }

    /// Creates a chat session with empty history.
    #[inline]
    pub fn create_session(&self) -> Session {
        Session::new(self.clone())
    }

    /// Returns the generation settings.
    #[inline]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Returns the function calling settings.
    #[inline]
    pub fn function_calling(&self) -> FunctionCalling {
        self.calling
    }

    /// Runs the function-call loop over `conversation`, whose last turn is
    /// the new user input.
    pub(crate) async fn complete(
        &self,
        conversation: Conversation,
    ) -> Result<LoopOutcome> {
        CallLoop::new(self, conversation)
            .run()
            .instrument(debug_span!("function call loop"))
            .await
    }

    pub(crate) fn normalize(&self, outcome: &LoopOutcome) -> Result<Output> {
        // Pending calls mean the model hasn't given its answer yet.
        if !outcome.pending_tool_calls.is_empty() {
            return Ok(Output::Text(outcome.text.clone()));
        }
        output::normalize(&outcome.text, self.config.output_mode)
    }
}

impl Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("calling", &self.calling)
            .field("tools", &self.toolset.len())
            .finish_non_exhaustive()
    }
}
