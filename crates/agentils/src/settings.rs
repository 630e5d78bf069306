use std::env;

use agentils_core::config::DEFAULT_MODEL;
use agentils_core::{
    AgentBuilder, Credential, Error, GenerationConfig, OutputMode, Result,
};
use agentils_gemini_model::{GeminiConfigBuilder, GeminiProvider};

const BASE_URL_VAR: &str = "AGENTILS_BASE_URL";
const MODEL_VAR: &str = "AGENTILS_MODEL";
const OUTPUT_VAR: &str = "AGENTILS_OUTPUT";
const MAX_CALLS_VAR: &str = "AGENTILS_MAX_CALLS";

/// Settings read from the environment.
///
/// | Variable | Meaning |
/// |---|---|
/// | `GOOGLE_API_KEY` / `GEMINI_API_KEY` | API key, required |
/// | `AGENTILS_BASE_URL` | custom endpoint |
/// | `AGENTILS_MODEL` | model name |
/// | `AGENTILS_OUTPUT` | `text` (default) or `json` |
/// | `AGENTILS_MAX_CALLS` | tool call budget per message |
///
/// Empty variables count as unset.
#[derive(Clone, Debug)]
pub struct EnvSettings {
    /// The API key.
    pub credential: Credential,
    /// Endpoint override.
    pub base_url: Option<String>,
    /// Model name.
    pub model: String,
    /// How the final answer is returned.
    pub output_mode: OutputMode,
    /// Tool call budget, the core default if unset.
    pub max_calls: Option<usize>,
}

impl EnvSettings {
    /// Reads the settings from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the settings with `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };

        let credential = Credential::resolve_with(None, &lookup)?;
        let output_mode = match var(OUTPUT_VAR) {
            Some(value) => value.trim().parse()?,
            None => OutputMode::Text,
        };
        let max_calls = var(MAX_CALLS_VAR)
            .map(|value| {
                value.trim().parse::<usize>().map_err(|_| {
                    Error::Config(format!(
                        "{MAX_CALLS_VAR} must be a non-negative integer, \
                         got `{value}`"
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            credential,
            base_url: var(BASE_URL_VAR),
            model: var(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            output_mode,
            max_calls,
        })
    }

    /// Returns the generation settings described by the environment.
    pub fn generation_config(&self) -> Result<GenerationConfig> {
        GenerationConfig::builder(self.model.clone())
            .with_output_mode(self.output_mode)
            .build()
    }

    /// Creates the Gemini provider.
    pub fn provider(&self) -> GeminiProvider {
        let mut builder =
            GeminiConfigBuilder::with_api_key(self.credential.expose());
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url.clone());
        }
        GeminiProvider::new(builder.build())
    }

    /// Returns an agent builder with the provider and settings applied.
    ///
    /// Tools and the system instruction are left to the caller.
    pub fn agent_builder(&self) -> Result<AgentBuilder> {
        debug!("using model {} ({} output)", self.model, self.output_mode);
        let mut builder = AgentBuilder::with_model_provider(self.provider())
            .with_config(self.generation_config()?);
        if let Some(max_calls) = self.max_calls {
            builder = builder.max_function_calls(max_calls);
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<EnvSettings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        EnvSettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(settings.credential.expose(), "k");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.output_mode, OutputMode::Text);
        assert_eq!(settings.max_calls, None);
        assert_eq!(settings.base_url, None);
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("GOOGLE_API_KEY", "g"),
            ("GEMINI_API_KEY", "k"),
            ("AGENTILS_MODEL", "gemini-2.5-pro"),
            ("AGENTILS_OUTPUT", "json"),
            ("AGENTILS_MAX_CALLS", " 3 "),
            ("AGENTILS_BASE_URL", "http://localhost:8080"),
        ])
        .unwrap();
        assert_eq!(settings.credential.expose(), "g");
        assert_eq!(settings.model, "gemini-2.5-pro");
        assert_eq!(settings.output_mode, OutputMode::Json);
        assert_eq!(settings.max_calls, Some(3));
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:8080"));

        let config = settings.generation_config().unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.output_mode, OutputMode::Json);
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(settings(&[]), Err(Error::Config(_))));
        assert!(matches!(
            settings(&[("GEMINI_API_KEY", "k"), ("AGENTILS_OUTPUT", "xml")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            settings(&[("GEMINI_API_KEY", "k"), ("AGENTILS_MAX_CALLS", "-1")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let settings = settings(&[("GEMINI_API_KEY", "secret")]).unwrap();
        assert!(!format!("{settings:?}").contains("secret"));
    }
}
