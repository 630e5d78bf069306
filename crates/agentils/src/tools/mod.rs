//! A set of built-in tools that models can use.
//!
//! Both tools are confined to a root directory: paths supplied by the model
//! must be relative and may not climb out of it.

mod glob;
mod read_file;

use std::path::{Component, Path, PathBuf};

use agentils_core::tool::Error as ToolError;

pub use glob::GlobTool;
pub use read_file::ReadFileTool;

/// Joins `path` onto `root`, rejecting absolute paths and `..`.
fn confine(root: &Path, path: &str) -> Result<PathBuf, ToolError> {
    let relative = Path::new(path);
    let escapes = relative.components().any(|component| {
        !matches!(component, Component::Normal(_) | Component::CurDir)
    });
    if escapes {
        return Err(ToolError::invalid_input().with_reason(format!(
            "`{path}` must be a relative path inside the workspace"
        )));
    }
    Ok(root.join(relative))
}

#[cfg(test)]
mod tests {
    use agentils_core::AgentBuilder;
    use agentils_core::config::{GenerationConfig, OutputMode};
    use agentils_model::ModelMessage;
    use agentils_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };
    use serde_json::json;

    use super::*;

    #[test]
    fn test_confine() {
        let root = Path::new("/work");
        assert_eq!(
            confine(root, "src/lib.rs").unwrap(),
            Path::new("/work/src/lib.rs")
        );
        assert_eq!(confine(root, "./a").unwrap(), Path::new("/work/a"));
        assert!(confine(root, "/etc/passwd").is_err());
        assert!(confine(root, "../secret").is_err());
        assert!(confine(root, "src/../../secret").is_err());
    }

    #[tokio::test]
    async fn test_tools_behind_agent() {
        let provider = TestModelProvider::with_script([
            PresetResponse::with_events([
                PresetEvent::tool_call(
                    "c1",
                    "read_file",
                    json!({ "files": [{ "path": "Cargo.toml" }] }),
                ),
                PresetEvent::tool_call(
                    "c2",
                    "glob",
                    json!({ "pattern": "src/tools/*.rs" }),
                ),
            ]),
            PresetResponse::text("Looked around."),
        ]);
        let root = env!("CARGO_MANIFEST_DIR");
        let agent = AgentBuilder::with_model_provider(provider.clone())
            .with_config(GenerationConfig {
                output_mode: OutputMode::Text,
                ..Default::default()
            })
            .with_tool(ReadFileTool::new(root))
            .with_tool(GlobTool::new(root))
            .build()
            .unwrap();

        let completion = agent.run(|| "Explore").await.unwrap();
        assert_eq!(completion.calls_made, 2);

        let requests = provider.requests();
        let Some(ModelMessage::ToolResults(results)) =
            requests[1].messages.last()
        else {
            panic!("expected tool results");
        };
        assert!(!results[0].is_error, "{}", results[0].content);
        assert!(results[0].content.contains("1: [package]"));
        assert!(!results[1].is_error, "{}", results[1].content);
        assert!(results[1].content.contains("src/tools/mod.rs"));
    }
}
