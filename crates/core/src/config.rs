//! Generation settings, function calling settings and credentials.

use std::env;
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The model used when none is specified.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

/// How the final model text is returned to the caller.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// The text is returned unchanged.
    Text,
    /// The text is parsed as JSON.
    #[default]
    Json,
}

impl Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Text => f.write_str("text"),
            OutputMode::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputMode::Text),
            "json" => Ok(OutputMode::Json),
            other => Err(Error::config(format!(
                "unknown output mode `{other}`, expected `text` or `json`"
            ))),
        }
    }
}

/// Settings of one invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Name of the model.
    pub model: String,
    /// Sampling temperature, within `[0, 2]`.
    pub temperature: Option<f32>,
    /// Upper bound of generated tokens, must be positive.
    pub max_output_tokens: Option<u32>,
    /// The system instruction, if any.
    pub system_instruction: Option<String>,
    /// How the final text is returned.
    pub output_mode: OutputMode,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            temperature: None,
            max_output_tokens: None,
            system_instruction: None,
            output_mode: OutputMode::default(),
        }
    }
}

impl GenerationConfig {
    /// Creates a builder for the given model.
    #[inline]
    pub fn builder<S: Into<String>>(model: S) -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: GenerationConfig {
                model: model.into(),
                ..Default::default()
            },
        }
    }

    /// Checks that every setting is within its range.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::config("model name is empty"));
        }
        if let Some(temperature) = self.temperature {
            if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature)
            {
                return Err(Error::config(format!(
                    "temperature must be within [0, 2], got {temperature}"
                )));
            }
        }
        if self.max_output_tokens == Some(0) {
            return Err(Error::config("max_output_tokens must be positive"));
        }
        Ok(())
    }
}

/// [`GenerationConfig`] builder.
#[derive(Clone, Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Sets the upper bound of generated tokens.
    #[inline]
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.config.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Sets the system instruction.
    #[inline]
    pub fn with_system_instruction<S: Into<String>>(
        mut self,
        instruction: S,
    ) -> Self {
        self.config.system_instruction = Some(instruction.into());
        self
    }

    /// Sets the output mode.
    #[inline]
    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.config.output_mode = output_mode;
        self
    }

    /// Validates and builds the config.
    pub fn build(self) -> Result<GenerationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Settings of the function-call loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FunctionCalling {
    /// Whether tool calls requested by the model are executed. When
    /// disabled, the model is called exactly once and the requested calls
    /// are handed back to the caller.
    pub automatic: bool,
    /// Maximum number of tool calls in one invocation.
    pub max_calls: usize,
    /// Whether arguments that don't match the tool parameters abort the
    /// invocation. Otherwise the mismatch is reported back to the model.
    pub strict_arguments: bool,
}

impl Default for FunctionCalling {
    fn default() -> Self {
        Self {
            automatic: true,
            max_calls: 10,
            strict_arguments: true,
        }
    }
}

/// An API key for the remote generation service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Environment variables consulted by [`Credential::resolve`], in order.
    pub const ENV_VARS: &'static [&'static str] =
        &["GOOGLE_API_KEY", "GEMINI_API_KEY"];

    /// Creates a credential from an explicit value.
    pub fn new<S: Into<String>>(value: S) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(Error::config("API key is empty"));
        }
        Ok(Self(value))
    }

    /// Resolves the credential from an explicit value, falling back to
    /// the environment.
    #[inline]
    pub fn resolve(explicit: Option<String>) -> Result<Self> {
        Self::resolve_with(explicit, |name| env::var(name).ok())
    }

    /// Like [`Credential::resolve`], but reads variables with `lookup`.
    pub fn resolve_with<F>(explicit: Option<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = explicit
            .into_iter()
            .chain(Self::ENV_VARS.iter().filter_map(|&name| lookup(name)))
            .find(|value| !value.trim().is_empty());
        match value {
            Some(value) => Ok(Self(value)),
            None => Err(Error::config(format!(
                "API key required, pass one explicitly or set {}",
                Self::ENV_VARS.join(" or ")
            ))),
        }
    }

    /// Returns the secret value.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(GenerationConfig::default().validate().is_ok());

        let config = GenerationConfig::builder("gemini-2.0-flash-001")
            .with_temperature(0.0)
            .with_max_output_tokens(1)
            .build()
            .unwrap();
        assert_eq!(config.temperature, Some(0.0));

        for temperature in [-0.1, 2.01, f32::NAN, f32::INFINITY] {
            let result = GenerationConfig::builder("m")
                .with_temperature(temperature)
                .build();
            assert!(matches!(result, Err(Error::Config(_))), "{temperature}");
        }

        let result = GenerationConfig::builder("m")
            .with_max_output_tokens(0)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));

        let result = GenerationConfig::builder("  ").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_output_mode_from_str() {
        assert_eq!("JSON".parse::<OutputMode>().unwrap(), OutputMode::Json);
        assert_eq!(" text ".parse::<OutputMode>().unwrap(), OutputMode::Text);
        assert!("yaml".parse::<OutputMode>().is_err());
    }

    #[test]
    fn test_credential_resolution() {
        let env = |name: &str| match name {
            "GOOGLE_API_KEY" => Some(String::new()),
            "GEMINI_API_KEY" => Some("from-gemini".to_owned()),
            _ => None,
        };

        let credential =
            Credential::resolve_with(Some("explicit".to_owned()), env).unwrap();
        assert_eq!(credential.expose(), "explicit");

        // Empty values are skipped.
        let credential = Credential::resolve_with(None, env).unwrap();
        assert_eq!(credential.expose(), "from-gemini");

        let result = Credential::resolve_with(None, |_| None);
        assert!(matches!(result, Err(Error::Config(_))));

        assert!(Credential::new(" ").is_err());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("secret-key").unwrap();
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret-key"));
    }
}
