use std::path::{Path, PathBuf};

use agentils_core::tool::{Error as ToolError, Tool, ToolResult};
use glob::Pattern;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::task::spawn_blocking;

use super::confine;

const MAX_ENTRIES: usize = 50;

/// Input of [`GlobTool`].
#[derive(Deserialize, JsonSchema)]
pub struct GlobToolParameters {
    #[schemars(description = "The glob pattern, must be relative to `path`.")]
    pattern: String,
    #[schemars(
        description = "Directory to search in, relative to the workspace. \
                       Default to the workspace itself."
    )]
    path: Option<String>,
}

/// A tool for finding files using glob patterns.
#[derive(Clone, Debug)]
pub struct GlobTool {
    root: PathBuf,
}

impl GlobTool {
    /// Creates a tool searching under `root`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        GlobTool { root: root.into() }
    }
}

impl Tool for GlobTool {
    type Input = GlobToolParameters;

    fn name(&self) -> &str {
        "glob"
    }

    fn description(&self) -> &str {
        r#"
Find files and directories in the workspace using glob patterns.
This tool supports standard glob syntax like *, ?, and ** for recursive
searches. Paths are returned relative to the workspace, at most 50 of them."#
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: GlobToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let root = self.root.clone();
        async move {
            confine(&root, &input.pattern)?;
            let dir = match &input.path {
                Some(path) => confine(&root, path)?,
                None => root.clone(),
            };

            let mut pattern = Pattern::escape(&dir.to_string_lossy());
            if !pattern.ends_with('/') {
                pattern.push('/');
            }
            pattern.push_str(&input.pattern);
            let paths = glob::glob(&pattern).map_err(|err| {
                ToolError::invalid_input().with_reason(err.to_string())
            })?;

            spawn_blocking(move || {
                let mut result = String::new();
                let mut paths = paths.flatten();
                for path in paths.by_ref().take(MAX_ENTRIES) {
                    result.push_str(&display_path(&root, &path));
                    result.push('\n');
                }
                if paths.next().is_some() {
                    result.push_str("... (more entries omitted)\n");
                }
                result
            })
            .await
            .map_err(|_| {
                ToolError::execution_error()
                    .with_reason("Failed to execute glob")
            })
        }
    }
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use agentils_core::tool::ErrorKind;

    use super::*;

    fn tool() -> GlobTool {
        GlobTool::new(env!("CARGO_MANIFEST_DIR"))
    }

    fn params(pattern: &str, path: Option<&str>) -> GlobToolParameters {
        GlobToolParameters {
            pattern: pattern.to_owned(),
            path: path.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn test_glob() {
        let output = tool().execute(params("*.toml", None)).await.unwrap();
        assert_eq!(output, "Cargo.toml\n");

        let output = tool()
            .execute(params("*.rs", Some("src/tools")))
            .await
            .unwrap();
        let entries: Vec<_> = output.lines().collect();
        assert!(entries.contains(&"src/tools/glob.rs"));
        assert!(entries.contains(&"src/tools/read_file.rs"));
    }

    #[tokio::test]
    async fn test_input_validation() {
        let err = tool()
            .execute(params("*.rs", Some("/some/absolute/path")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = tool().execute(params("/*", None)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = tool().execute(params("../*", None)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
