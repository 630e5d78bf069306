use crate::agent::Agent;
use crate::conversation::{Conversation, Turn};
use crate::error::Result;
use crate::output::Output;

/// A multi-turn chat with an [`Agent`].
///
/// The history only grows. A message is committed together with all the
/// turns it produced once the function-call loop has finished, so a failed
/// message leaves the history untouched. An output that fails to parse is
/// reported after the commit, because the model did answer.
#[derive(Debug)]
pub struct Session {
    agent: Agent,
    history: Conversation,
}

impl Session {
    /// Creates a session with empty history.
    #[inline]
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            history: Conversation::new(),
        }
    }

    /// Sends a message with the whole history as context.
    pub async fn send_message<S: Into<String>>(
        &mut self,
        text: S,
    ) -> Result<Output> {
        let mut conversation = self.history.clone();
        conversation.push(Turn::user(text.into()));

        let outcome = self.agent.complete(conversation).await?;
        let output = self.agent.normalize(&outcome);
        trace!(
            "session history grows from {} to {} turn(s)",
            self.history.len(),
            outcome.conversation.len()
        );
        self.history = outcome.conversation;
        output
    }

    /// Returns the committed history.
    #[inline]
    pub fn history(&self) -> &Conversation {
        &self.history
    }

    /// Returns the agent behind this session.
    #[inline]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}
