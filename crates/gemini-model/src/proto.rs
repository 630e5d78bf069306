use agentils_model::{
    AssistantMessage, ModelMessage, ModelRequest, ModelTool, ResponseFormat,
    ToolCallResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Prefix of call ids made up locally when the service omits them. Such ids
/// are never sent back to the service.
pub const SYNTHETIC_ID_PREFIX: &str = "agentils-call-";

// ------------------------------
// Types shared in both directions
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters_json_schema: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    pub status: Option<String>,
}

// -----------
// Conversions
// -----------

pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    let tools = req
        .tools
        .as_ref()
        .filter(|tools| !tools.is_empty())
        .map(|tools| {
            vec![Tool {
                function_declarations: tools
                    .iter()
                    .map(create_declaration)
                    .collect(),
            }]
        });

    let params = &req.generation;
    let response_mime_type = match params.response_format {
        ResponseFormat::Text => None,
        ResponseFormat::Json => Some("application/json"),
    };
    let generation_config = (params.temperature.is_some()
        || params.max_output_tokens.is_some()
        || response_mime_type.is_some())
    .then_some(GenerationConfig {
        temperature: params.temperature,
        max_output_tokens: params.max_output_tokens,
        response_mime_type,
    });

    GenerateContentRequest {
        contents: req.messages.iter().map(create_content).collect(),
        system_instruction: req.system_instruction.as_ref().map(|text| {
            Content {
                role: None,
                parts: vec![Part::text(text.as_str())],
            }
        }),
        tools,
        generation_config,
    }
}

fn create_content(msg: &ModelMessage) -> Content {
    match msg {
        ModelMessage::User(text) => Content {
            role: Some("user".to_owned()),
            parts: vec![Part::text(text.as_str())],
        },
        ModelMessage::Assistant(msg) => Content {
            role: Some("model".to_owned()),
            parts: create_model_parts(msg),
        },
        ModelMessage::ToolResults(results) => Content {
            role: Some("user".to_owned()),
            parts: results.iter().map(create_function_response).collect(),
        },
    }
}

fn create_model_parts(msg: &AssistantMessage) -> Vec<Part> {
    let mut parts = Vec::with_capacity(msg.tool_calls.len() + 1);
    if !msg.text.is_empty() || msg.tool_calls.is_empty() {
        parts.push(Part::text(msg.text.as_str()));
    }
    parts.extend(msg.tool_calls.iter().map(|call| Part {
        function_call: Some(FunctionCall {
            id: service_id(&call.id),
            name: call.name.clone(),
            args: call.arguments.clone(),
        }),
        ..Default::default()
    }));
    parts
}

fn create_function_response(result: &ToolCallResult) -> Part {
    let response = if result.is_error {
        json!({ "error": result.content })
    } else {
        json!({ "result": result.content })
    };
    Part {
        function_response: Some(FunctionResponse {
            id: service_id(&result.id),
            name: result.name.clone(),
            response,
        }),
        ..Default::default()
    }
}

fn create_declaration(tool: &ModelTool) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters_json_schema: tool.parameters.clone(),
    }
}

#[inline]
fn service_id(id: &str) -> Option<String> {
    (!id.starts_with(SYNTHETIC_ID_PREFIX)).then(|| id.to_owned())
}
