use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use agentils_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::task::spawn_blocking;

use super::confine;

const MAX_LINES: usize = 50;

/// A file to read.
#[derive(Deserialize, JsonSchema)]
pub struct ReadFileItem {
    #[schemars(description = "Path to the file, relative to the workspace.")]
    path: String,
    #[schemars(description = "1-based start line to read from, default to 1.")]
    start_line: Option<usize>,
}

/// Input of [`ReadFileTool`].
#[derive(Deserialize, JsonSchema)]
pub struct ReadFileParameters {
    #[schemars(description = "Files to read.")]
    files: Vec<ReadFileItem>,
}

/// A tool for reading file content with line numbers.
#[derive(Clone, Debug)]
pub struct ReadFileTool {
    root: PathBuf,
}

impl ReadFileTool {
    /// Creates a tool reading files under `root`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        ReadFileTool { root: root.into() }
    }
}

impl Tool for ReadFileTool {
    type Input = ReadFileParameters;

    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        r#"
Reads files from paths relative to the workspace and returns their contents
prefixed with line numbers. Each file includes a path and a 1-based start line,
and returns up to 50 lines."#
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: ReadFileParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let root = self.root.clone();
        async move {
            let mut result = String::new();
            for file in input.files {
                let full_path = confine(&root, &file.path)?;
                let start_line = file.start_line.unwrap_or(1);
                if start_line == 0 {
                    return Err(ToolError::invalid_input()
                        .with_reason("`start_line` must be 1-based"));
                }

                let section = spawn_blocking(move || {
                    let reader = File::open(&full_path).map_err(|err| {
                        ToolError::execution_error().with_reason(format!(
                            "cannot open `{}`: {err}",
                            file.path
                        ))
                    })?;
                    format_section(&file.path, reader, start_line)
                })
                .await
                .map_err(|_| {
                    ToolError::execution_error()
                        .with_reason("Failed to read file")
                })??;

                if !result.is_empty() {
                    result.push('\n');
                }
                result.push_str(&section);
            }
            Ok(result)
        }
    }
}

fn format_section<R: Read>(
    path: &str,
    reader: R,
    start_line: usize,
) -> Result<String, ToolError> {
    let lines = BufReader::new(reader)
        .lines()
        .skip(start_line - 1)
        .take(MAX_LINES)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            ToolError::execution_error().with_reason(err.to_string())
        })?;

    let mut result = format!("==> {path} <==\n");
    let last_line_no = start_line + lines.len().saturating_sub(1);
    let width = last_line_no.to_string().len();
    for (offset, line) in lines.iter().enumerate() {
        let line_no = start_line + offset;
        result.push_str(&format!("{line_no:>width$}: {line}\n"));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use agentils_core::tool::ErrorKind;

    use super::*;

    fn tool() -> ReadFileTool {
        ReadFileTool::new(env!("CARGO_MANIFEST_DIR"))
    }

    fn item(path: &str, start_line: Option<usize>) -> ReadFileParameters {
        ReadFileParameters {
            files: vec![ReadFileItem {
                path: path.to_owned(),
                start_line,
            }],
        }
    }

    #[test]
    fn test_format_section() {
        let input = b"first\nsecond\nthird\n";
        let output = format_section("a.txt", Cursor::new(input), 2).unwrap();
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("==> a.txt <=="));
        assert_eq!(lines.next(), Some("2: second"));
        assert_eq!(lines.next(), Some("3: third"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_format_section_respects_limit() {
        let input = "line\n".repeat(MAX_LINES + 10);
        let output = format_section("a.txt", Cursor::new(input), 1).unwrap();
        assert_eq!(output.lines().count(), MAX_LINES + 1);
        assert!(output.ends_with("50: line\n"));

        // Past the end, only the header is left.
        let output =
            format_section("a.txt", Cursor::new("x\n"), 5).unwrap();
        assert_eq!(output, "==> a.txt <==\n");
    }

    #[tokio::test]
    async fn test_read_file() {
        let output = tool().execute(item("Cargo.toml", None)).await.unwrap();
        assert!(output.starts_with("==> Cargo.toml <==\n"));
        assert!(output.contains("1: [package]"));
    }

    #[tokio::test]
    async fn test_input_validation() {
        let err = tool()
            .execute(item("/etc/hosts", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = tool()
            .execute(item("../Cargo.toml", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = tool()
            .execute(item("Cargo.toml", Some(0)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = tool()
            .execute(item("no/such/file", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
    }
}
