use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use agentils_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use pin_project_lite::pin_project;
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{GenerateContentResponse, SYNTHETIC_ID_PREFIX};

/// Finish reasons the service uses for content it refused to produce.
const MODERATED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

struct StreamState {
    sse: Sse,
    // Events decoded from the chunks read so far but not yet returned.
    pending: VecDeque<ModelResponseEvent>,
    tool_call_count: usize,
    completed: bool,
    exhausted: bool,
}

impl StreamState {
    fn consume(&mut self, data: &str) -> Result<(), Error> {
        let chunk: GenerateContentResponse = serde_json::from_str(data)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

        if let Some(reason) = chunk
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(Error::new(
                format!("prompt blocked: {reason}"),
                ErrorKind::Moderated,
            ));
        }

        let Some(candidate) = chunk.candidates.into_iter().next() else {
            return Ok(());
        };

        let parts = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default();
        for part in parts {
            if part.thought == Some(true) {
                continue;
            }
            if let Some(text) = part.text.filter(|text| !text.is_empty()) {
                self.pending.push_back(ModelResponseEvent::MessageDelta(text));
            }
            if let Some(call) = part.function_call {
                let id = call.id.unwrap_or_else(|| {
                    format!("{SYNTHETIC_ID_PREFIX}{}", self.tool_call_count)
                });
                let arguments = match call.args {
                    Value::Null => Value::Object(Default::default()),
                    args => args,
                };
                self.tool_call_count += 1;
                self.pending.push_back(ModelResponseEvent::ToolCall(
                    ToolCallRequest {
                        id,
                        name: call.name,
                        arguments,
                    },
                ));
            }
        }

        if let Some(reason) = candidate.finish_reason {
            let finish_reason = self.finish_reason(&reason)?;
            self.pending
                .push_back(ModelResponseEvent::Completed(finish_reason));
            self.completed = true;
        }
        Ok(())
    }

    fn finish_reason(
        &self,
        reason: &str,
    ) -> Result<ModelFinishReason, Error> {
        if MODERATED_FINISH_REASONS.contains(&reason) {
            return Err(Error::new(
                format!("response stopped: {reason}"),
                ErrorKind::Moderated,
            ));
        }
        match reason {
            "MAX_TOKENS" => Ok(ModelFinishReason::Length),
            "MALFORMED_FUNCTION_CALL" | "UNEXPECTED_TOOL_CALL" => {
                Err(Error::new(
                    format!("response stopped: {reason}"),
                    ErrorKind::Other,
                ))
            }
            _ if self.tool_call_count > 0 => Ok(ModelFinishReason::ToolCalls),
            _ => Ok(ModelFinishReason::Stop),
        }
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let state = StreamState {
            sse,
            pending: VecDeque::new(),
            tool_call_count: 0,
            completed: false,
            exhausted: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(state))),
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, state) = match ready!(next_event_fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => (event, state),
            Ok((None, _)) => {
                *this.next_event_fut = None;
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *this.next_event_fut = None;
                return Poll::Ready(Err(err));
            }
        };

        *this.next_event_fut = Some(Box::pin(next_event(state)));
        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut state: StreamState) -> NextEvent {
    loop {
        if let Some(event) = state.pending.pop_front() {
            return Ok((Some(event), state));
        }
        if state.exhausted {
            return Ok((None, state));
        }

        match state.sse.next_event().await {
            Ok(Some(data)) => {
                trace!("got sse event: {data}");
                state.consume(&data)?;
            }
            Ok(None) => {
                state.exhausted = true;
                if !state.completed {
                    // Some proxies cut the final chunk that carries the finish
                    // reason, complete the response on our own.
                    let reason = if state.tool_call_count > 0 {
                        ModelFinishReason::ToolCalls
                    } else {
                        ModelFinishReason::Stop
                    };
                    state
                        .pending
                        .push_back(ModelResponseEvent::Completed(reason));
                    state.completed = true;
                }
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        }
    }
}
