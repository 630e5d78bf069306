use agentils_model::{
    AssistantMessage, ModelFinishReason, ToolCallRequest, ToolCallResult,
};

use super::Agent;
use crate::conversation::{Conversation, Turn};
use crate::error::{Error, Result};
use crate::model_client::ModelClientResponse;
use crate::request::RequestBuilder;
use crate::tool::Error as ToolError;

/// What a finished loop hands back to the agent or session.
#[derive(Debug)]
pub(crate) struct LoopOutcome {
    /// Text of the last model turn.
    pub text: String,
    pub conversation: Conversation,
    pub calls_made: usize,
    pub pending_tool_calls: Vec<ToolCallRequest>,
}

/// Counts the tool calls executed in one invocation.
#[derive(Clone, Copy, Debug)]
struct CallBudget {
    count: usize,
    max: usize,
}

impl CallBudget {
    /// Whether a whole round of `requested` calls still fits.
    #[inline]
    fn allows(&self, requested: usize) -> bool {
        self.count + requested <= self.max
    }

    #[inline]
    fn record(&mut self, executed: usize) {
        self.count += executed;
    }
}

enum State {
    AwaitingModel,
    ExecutingTools(Vec<ToolCallRequest>),
    Done(String),
    Aborted(Error),
}

/// The loop alternating between the model and the tools until the model
/// answers without requesting any call.
pub(crate) struct CallLoop<'a> {
    agent: &'a Agent,
    request_builder: RequestBuilder<'a>,
    conversation: Conversation,
    budget: CallBudget,
    pending_tool_calls: Vec<ToolCallRequest>,
}

impl<'a> CallLoop<'a> {
    pub fn new(agent: &'a Agent, conversation: Conversation) -> Self {
        let request_builder = RequestBuilder::new(&agent.config)
            .with_model_tools(agent.toolset.definitions());
        Self {
            agent,
            request_builder,
            conversation,
            budget: CallBudget {
                count: 0,
                max: agent.calling.max_calls,
            },
            pending_tool_calls: vec![],
        }
    }

    pub async fn run(mut self) -> Result<LoopOutcome> {
        let mut state = State::AwaitingModel;
        loop {
            state = match state {
                State::AwaitingModel => self.call_model().await,
                State::ExecutingTools(calls) => {
                    debug!("executing {} tool call(s)", calls.len());
                    self.execute_tools(calls).await
                }
                State::Done(text) => {
                    debug!(
                        "loop finished after {} tool call(s)",
                        self.budget.count
                    );
                    return Ok(LoopOutcome {
                        text,
                        conversation: self.conversation,
                        calls_made: self.budget.count,
                        pending_tool_calls: self.pending_tool_calls,
                    });
                }
                State::Aborted(err) => {
                    warn!("loop aborted: {err}");
                    return Err(err);
                }
            };
        }
    }

    async fn call_model(&mut self) -> State {
        let agent = self.agent;
        let req = match self
            .request_builder
            .build_with_history(self.conversation.messages())
        {
            Ok(req) => req,
            Err(err) => return State::Aborted(err),
        };

        let on_transcript = agent.on_transcript.clone();
        let resp = agent
            .model_client
            .send_request(req, move |delta| {
                if let Some(on_transcript) = &on_transcript {
                    on_transcript(delta);
                }
            })
            .await;
        let ModelClientResponse {
            text,
            tool_calls,
            finish_reason,
        } = match resp {
            Ok(resp) => resp,
            Err(err) => {
                return State::Aborted(Error::ModelUnavailable {
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        };
        if finish_reason == Some(ModelFinishReason::Length) {
            warn!("model output was cut off by the token limit");
        }

        self.conversation.push(Turn::model(AssistantMessage {
            text: text.clone(),
            tool_calls: tool_calls.clone(),
        }));

        if tool_calls.is_empty() {
            State::Done(text)
        } else if !agent.calling.automatic {
            debug!("leaving {} tool call(s) to the caller", tool_calls.len());
            self.pending_tool_calls = tool_calls;
            State::Done(text)
        } else {
            State::ExecutingTools(tool_calls)
        }
    }

    async fn execute_tools(&mut self, calls: Vec<ToolCallRequest>) -> State {
        let agent = self.agent;
        let requested = calls.len();
        if !self.budget.allows(requested) {
            return State::Aborted(Error::MaxCallsExceeded {
                count: self.budget.count,
                requested,
                max: self.budget.max,
                transcript: self.conversation.clone(),
            });
        }

        // Arguments are checked for the whole round before anything runs,
        // so a strict rejection leaves no side effects behind.
        let mut prepared = Vec::with_capacity(requested);
        for ToolCallRequest {
            id,
            name,
            arguments,
        } in calls
        {
            let tool = agent.toolset.get(&name).map(|(descriptor, tool)| {
                (tool, descriptor.parameters().coerce(arguments))
            });
            match tool {
                Some((_, Err(source))) if agent.calling.strict_arguments => {
                    return State::Aborted(Error::Schema { tool: name, source });
                }
                tool => prepared.push((id, name, tool)),
            }
        }

        let mut results = Vec::with_capacity(requested);
        for (id, name, tool) in prepared {
            let Some((tool, arguments)) = tool else {
                // Keep what already ran, so the transcript is truthful.
                self.budget.record(results.len());
                if !results.is_empty() {
                    self.conversation.push(Turn::results(results));
                }
                return State::Aborted(Error::ToolNotFound {
                    name,
                    transcript: self.conversation.clone(),
                });
            };

            let result = match arguments {
                Ok(arguments) => {
                    trace!("calling `{name}` with {arguments}");
                    tool.execute(arguments).await
                }
                Err(source) => Err(
                    ToolError::invalid_input().with_reason(source.to_string()),
                ),
            };

            let (content, is_error) = match result {
                Ok(content) => (content, false),
                Err(err) => {
                    debug!("tool `{name}` failed: {err}");
                    (err.to_string(), true)
                }
            };
            results.push(ToolCallResult {
                id,
                name,
                content,
                is_error,
            });
        }

        self.budget.record(requested);
        self.conversation.push(Turn::results(results));
        State::AwaitingModel
    }
}
