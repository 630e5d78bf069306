//! Conversation-related types.

use agentils_model::{
    AssistantMessage, ModelMessage, ToolCallRequest, ToolCallResult,
};

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Input from the user.
    User,
    /// Output of the model, possibly requesting tool calls.
    Model,
    /// Results of the tool calls requested by the previous model turn.
    ToolResult,
}

/// A turn in the conversation.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    role: Role,
    content: String,
    tool_call_ids: Vec<String>,
    msg: ModelMessage,
}

impl Turn {
    pub(crate) fn user(text: String) -> Self {
        Self {
            role: Role::User,
            content: text.clone(),
            tool_call_ids: vec![],
            msg: ModelMessage::User(text),
        }
    }

    pub(crate) fn model(msg: AssistantMessage) -> Self {
        Self {
            role: Role::Model,
            content: msg.text.clone(),
            tool_call_ids: msg
                .tool_calls
                .iter()
                .map(|call| call.id.clone())
                .collect(),
            msg: ModelMessage::Assistant(msg),
        }
    }

    pub(crate) fn results(results: Vec<ToolCallResult>) -> Self {
        let content = results
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            role: Role::ToolResult,
            content,
            tool_call_ids: results.iter().map(|r| r.id.clone()).collect(),
            msg: ModelMessage::ToolResults(results),
        }
    }

    /// Returns who produced this turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this turn.
    ///
    /// For tool result turns, this is the results joined by newlines. The
    /// text alone is not enough to reconstruct the message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the ids of the tool calls requested (model turns) or
    /// answered (tool result turns) in this turn.
    #[inline]
    pub fn tool_call_ids(&self) -> &[String] {
        &self.tool_call_ids
    }

    /// Returns the tool calls requested in this turn, in issue order.
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match &self.msg {
            ModelMessage::Assistant(msg) => &msg.tool_calls,
            _ => &[],
        }
    }

    /// Returns the tool results carried by this turn, in call order.
    pub fn tool_results(&self) -> &[ToolCallResult] {
        match &self.msg {
            ModelMessage::ToolResults(results) => results,
            _ => &[],
        }
    }

    /// Returns the underlying protocol message.
    #[inline]
    pub fn message(&self) -> &ModelMessage {
        &self.msg
    }
}

/// An ordered, append-only list of turns.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns all turns, oldest first.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if there are no turns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the protocol messages of all turns, oldest first.
    pub fn messages(&self) -> Vec<ModelMessage> {
        self.turns.iter().map(|turn| turn.msg.clone()).collect()
    }
}
