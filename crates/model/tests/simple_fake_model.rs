use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use agentils_model::{
    ErrorKind, GenerationParams, ModelFinishReason, ModelMessage,
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent, ModelTool, ToolCallRequest,
};
use serde_json::json;
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message word by word, or calls every declared
/// tool once if the request declares any.
#[derive(Debug)]
struct FakeModelResponse {
    fake_events: VecDeque<ModelResponseEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeModelResponse {
    fn echo(input: &str) -> Self {
        let words: Vec<_> = format!("You said {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        let last = words.len() - 1;
        let mut fake_events: VecDeque<_> = words
            .into_iter()
            .enumerate()
            .map(|(idx, mut word)| {
                if idx != last {
                    word.push(' ');
                }
                ModelResponseEvent::MessageDelta(word)
            })
            .collect();
        fake_events.push_back(ModelResponseEvent::Completed(
            ModelFinishReason::Stop,
        ));
        Self {
            fake_events,
            sleep: None,
        }
    }

    fn call_all(tools: &[ModelTool]) -> Self {
        let mut fake_events: VecDeque<_> = tools
            .iter()
            .enumerate()
            .map(|(idx, tool)| {
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: format!("call:{idx}"),
                    name: tool.name.clone(),
                    arguments: json!({}),
                })
            })
            .collect();
        fake_events.push_back(ModelResponseEvent::Completed(
            ModelFinishReason::ToolCalls,
        ));
        Self {
            fake_events,
            sleep: None,
        }
    }
}

impl ModelResponse for FakeModelResponse {
    type Error = FakeModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(Duration::from_millis(1))));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;
        Poll::Ready(Ok(this.fake_events.pop_front()))
    }
}

struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;
    type Response = FakeModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = 'blk: {
            if let Some(tools) = &req.tools {
                break 'blk Ok(FakeModelResponse::call_all(tools));
            }

            let content = req.messages.iter().rev().find_map(|msg| match msg {
                ModelMessage::User(text) => Some(text.as_str()),
                _ => None,
            });
            match content {
                Some(content) => Ok(FakeModelResponse::echo(content)),
                None => Err(FakeModelProviderError(ErrorKind::InvalidRequest)),
            }
        };
        ready(result)
    }
}

fn request(messages: Vec<ModelMessage>) -> ModelRequest {
    ModelRequest {
        model: "fake".to_owned(),
        system_instruction: None,
        generation: GenerationParams::default(),
        messages,
        tools: None,
    }
}

async fn collect(
    mut resp: FakeModelResponse,
) -> (String, Vec<ToolCallRequest>, Option<ModelFinishReason>) {
    let mut text = String::new();
    let mut tool_calls = vec![];
    let mut finish_reason = None;
    loop {
        let resp_fut = std::future::poll_fn(|cx| {
            Pin::new(&mut resp).poll_next_event(cx)
        });
        match resp_fut.await {
            Ok(Some(ModelResponseEvent::MessageDelta(delta))) => {
                text.push_str(&delta);
            }
            Ok(Some(ModelResponseEvent::ToolCall(req))) => tool_calls.push(req),
            Ok(Some(ModelResponseEvent::Completed(reason))) => {
                finish_reason = Some(reason);
            }
            Ok(None) => break,
            Err(err) => unreachable!("unexpected error: {err:?}"),
        }
    }
    (text, tool_calls, finish_reason)
}

#[tokio::test]
async fn test_completion() {
    let provider = FakeModelProvider;
    let req = request(vec![ModelMessage::User("Good morning".to_string())]);
    let resp = provider.send_request(&req).await.unwrap();

    let (text, tool_calls, finish_reason) = collect(resp).await;
    assert_eq!(text, "You said Good morning");
    assert!(tool_calls.is_empty());
    assert_eq!(finish_reason, Some(ModelFinishReason::Stop));
}

#[tokio::test]
async fn test_tool_calls_keep_order() {
    let provider = FakeModelProvider;
    let mut req = request(vec![ModelMessage::User("Go".to_string())]);
    req.tools = Some(
        ["a", "b", "c"]
            .into_iter()
            .map(|name| ModelTool {
                name: name.to_owned(),
                description: String::new(),
                parameters: json!({ "type": "object" }),
            })
            .collect(),
    );
    let resp = provider.send_request(&req).await.unwrap();

    let (_, tool_calls, finish_reason) = collect(resp).await;
    let names: Vec<_> = tool_calls.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
    assert_eq!(finish_reason, Some(ModelFinishReason::ToolCalls));
}

#[tokio::test]
async fn test_error() {
    let provider = FakeModelProvider;
    let result = provider.send_request(&request(vec![])).await;
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}
