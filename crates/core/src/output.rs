//! Normalization of the final model text.

use std::fmt::{self, Display};

use serde_json::Value;

use crate::config::OutputMode;
use crate::error::{Error, Result};

/// The final output of an invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    /// The model text, unchanged.
    Text(String),
    /// Structured data parsed from the model text.
    Json(Value),
}

impl Output {
    /// Returns the text, if this is a text output.
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(text) => Some(text),
            Output::Json(_) => None,
        }
    }

    /// Returns the value, if this is a structured output.
    #[inline]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Output::Text(_) => None,
            Output::Json(value) => Some(value),
        }
    }
}

impl Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Text(text) => f.write_str(text),
            Output::Json(value) if f.alternate() => write!(f, "{value:#}"),
            Output::Json(value) => write!(f, "{value}"),
        }
    }
}

/// Converts the final model text according to `mode`.
///
/// In JSON mode the text is parsed directly first. If that fails, the
/// content of a code fence or the first balanced `{...}` / `[...]` span is
/// tried instead. The raw text is attached to the error when nothing
/// parses. No further model call is made either way.
pub fn normalize(text: &str, mode: OutputMode) -> Result<Output> {
    match mode {
        OutputMode::Text => Ok(Output::Text(text.to_owned())),
        OutputMode::Json => parse_json(text).map(Output::Json),
    }
}

fn parse_json(text: &str) -> Result<Value> {
    let err = match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let candidates = fenced_blocks(text).chain(balanced_spans(text));
    for candidate in candidates {
        if let Ok(value) = serde_json::from_str::<Value>(candidate.trim()) {
            trace!("extracted JSON from surrounding text");
            return Ok(value);
        }
    }

    Err(Error::OutputParse {
        raw: text.to_owned(),
        reason: err.to_string(),
    })
}

/// Yields the content of every ```` ``` ```` fence, skipping the language
/// tag.
fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let start = rest.find("```")? + 3;
        let after_open = &rest[start..];
        // The language tag runs until the end of the opening line.
        let body_start = after_open.find('\n').map_or(0, |idx| idx + 1);
        let body = &after_open[body_start..];
        let end = body.find("```")?;
        rest = &body[end + 3..];
        Some(&body[..end])
    })
}

/// Returns every balanced span starting at a `{` or `[`, outermost first.
///
/// One pass over the text with a stack of open brackets. A mismatched
/// closer discards every bracket still open, since none of them can be
/// balanced any more. Quotes only count inside a span.
fn balanced_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if !stack.is_empty() => in_string = true,
            '{' => stack.push(('}', idx)),
            '[' => stack.push((']', idx)),
            '}' | ']' => match stack.pop() {
                Some((close, start)) if close == c => {
                    spans.push((start, &text[start..=idx]));
                }
                Some(_) => stack.clear(),
                None => {}
            },
            _ => {}
        }
    }
    spans.sort_unstable_by_key(|&(start, _)| start);
    spans.into_iter().map(|(_, span)| span).collect()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;

    use super::*;

    fn json(text: &str) -> Result<Value> {
        normalize(text, OutputMode::Json).map(|output| match output {
            Output::Json(value) => value,
            Output::Text(_) => unreachable!(),
        })
    }

    #[test]
    fn test_text_mode() {
        let output = normalize("  not json  ", OutputMode::Text).unwrap();
        assert_eq!(output, Output::Text("  not json  ".to_owned()));
    }

    #[test]
    fn test_direct_parse() {
        assert_eq!(json(r#"{"a": 1}"#).unwrap(), json!({ "a": 1 }));
        assert_eq!(json(" [1, 2]\n").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_fenced() {
        let text = "```json\n{\"a\":1}\n```";
        assert_eq!(json(text).unwrap(), json!({ "a": 1 }));

        let text = "Here you go:\n```\n[\"x\"]\n```\nAnything else?";
        assert_eq!(json(text).unwrap(), json!(["x"]));
    }

    #[test]
    fn test_embedded_in_prose() {
        let text = r#"The answer is {"city": "Paris", "note": "a } b"}. Enjoy!"#;
        assert_eq!(
            json(text).unwrap(),
            json!({ "city": "Paris", "note": "a } b" })
        );

        // The first brace is not JSON, the second one is.
        let text = r#"Use {braces} like {"ok": true}"#;
        assert_eq!(json(text).unwrap(), json!({ "ok": true }));
    }

    #[test]
    fn test_nested_span_is_taken_whole() {
        let text = r#"Result: {"a": {"b": [1, 2]}} done"#;
        assert_eq!(json(text).unwrap(), json!({ "a": { "b": [1, 2] } }));

        // A stray closer does not hide a later object.
        let text = r#"oops [} then {"ok": 1}"#;
        assert_eq!(json(text).unwrap(), json!({ "ok": 1 }));
    }

    #[test]
    fn test_long_unbalanced_text() {
        let started = Instant::now();
        let text = "[".repeat(200_000);
        assert!(matches!(json(&text), Err(Error::OutputParse { .. })));

        let text = format!("{}{}", "{".repeat(200_000), r#"{"a": 1}"#);
        assert_eq!(json(&text).unwrap(), json!({ "a": 1 }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_failure_keeps_raw_text() {
        match json("not json") {
            Err(Error::OutputParse { raw, .. }) => assert_eq!(raw, "not json"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(json(""), Err(Error::OutputParse { .. })));
        assert!(matches!(json("{\"a\": "), Err(Error::OutputParse { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(Output::Text("hi".to_owned()).to_string(), "hi");
        assert_eq!(Output::Json(json!([1])).to_string(), "[1]");
    }
}
