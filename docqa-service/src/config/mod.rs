use crate::services::providers::GenerationParams;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

/// Default cap on an uploaded document (20 MiB).
const DEFAULT_MAX_DOCUMENT_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_MAX_QUIZ_QUESTIONS: u32 = 20;
const DEFAULT_QUIZ_QUESTIONS: u32 = 3;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct DocQaConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub limits: LimitsConfig,
}

/// Which Gemini deployment serves completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeminiBackend {
    /// Google AI Studio, authenticated with an API key.
    AiStudio,
    /// Vertex AI, addressed by project and location, authenticated with a bearer token.
    Vertex,
}

impl FromStr for GeminiBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai-studio" | "aistudio" => Ok(GeminiBackend::AiStudio),
            "vertex" | "vertex-ai" => Ok(GeminiBackend::Vertex),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "GENAI_BACKEND must be 'ai-studio' or 'vertex', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    pub backend: GeminiBackend,
    /// Model for question answering and quiz generation (e.g., gemini-2.0-flash-001)
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    pub location: String,
    #[serde(default)]
    pub access_token: String,
    pub request_timeout_secs: u64,
    /// Sampling temperature; the model default applies when unset.
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<i32>,
}

impl GeminiSettings {
    /// Sampling parameters attached to every model call.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub max_document_bytes: usize,
    pub max_quiz_questions: u32,
    pub default_quiz_questions: u32,
}

impl DocQaConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: GeminiBackend = get_env("GENAI_BACKEND", Some("ai-studio"), is_prod)?.parse()?;
        let (api_key_default, vertex_default) = match backend {
            GeminiBackend::AiStudio => (None, Some("")),
            GeminiBackend::Vertex => (Some(""), None),
        };

        let config = DocQaConfig {
            common: common_config,
            gemini: GeminiSettings {
                backend,
                model: get_env("GENAI_TEXT_MODEL", Some("gemini-2.0-flash-001"), is_prod)?,
                api_key: get_backend_env("GOOGLE_API_KEY", api_key_default, is_prod)?,
                project_id: get_backend_env("GOOGLE_CLOUD_PROJECT", vertex_default, is_prod)?,
                location: get_env("GOOGLE_CLOUD_LOCATION", Some("us-central1"), is_prod)?,
                access_token: get_backend_env("GOOGLE_ACCESS_TOKEN", vertex_default, is_prod)?,
                request_timeout_secs: parse_env(
                    "GENAI_REQUEST_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                    is_prod,
                )?,
                temperature: parse_optional_env("GENAI_TEMPERATURE")?,
                max_output_tokens: parse_optional_env("GENAI_MAX_OUTPUT_TOKENS")?,
            },
            limits: LimitsConfig {
                max_document_bytes: parse_env(
                    "DOCQA_MAX_DOCUMENT_BYTES",
                    DEFAULT_MAX_DOCUMENT_BYTES,
                    is_prod,
                )?,
                max_quiz_questions: parse_env(
                    "DOCQA_MAX_QUIZ_QUESTIONS",
                    DEFAULT_MAX_QUIZ_QUESTIONS,
                    is_prod,
                )?,
                default_quiz_questions: parse_env(
                    "DOCQA_DEFAULT_QUIZ_QUESTIONS",
                    DEFAULT_QUIZ_QUESTIONS,
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot serve a single request.
    pub fn validate(&self) -> Result<(), AppError> {
        let gemini = &self.gemini;
        let missing = match gemini.backend {
            GeminiBackend::AiStudio => [("GOOGLE_API_KEY", &gemini.api_key)].to_vec(),
            GeminiBackend::Vertex => [
                ("GOOGLE_CLOUD_PROJECT", &gemini.project_id),
                ("GOOGLE_CLOUD_LOCATION", &gemini.location),
                ("GOOGLE_ACCESS_TOKEN", &gemini.access_token),
            ]
            .to_vec(),
        }
        .into_iter()
        .chain([("GENAI_TEXT_MODEL", &gemini.model)])
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect::<Vec<_>>();

        if !missing.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "{} must be set for the {:?} backend",
                missing.join(", "),
                gemini.backend
            )));
        }

        if gemini.request_timeout_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GENAI_REQUEST_TIMEOUT_SECS must be greater than zero"
            )));
        }

        if gemini.temperature.is_some_and(|t| !(0.0..=2.0).contains(&t)) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GENAI_TEMPERATURE must be between 0.0 and 2.0"
            )));
        }
        if gemini.max_output_tokens.is_some_and(|n| n <= 0) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GENAI_MAX_OUTPUT_TOKENS must be greater than zero"
            )));
        }

        let limits = &self.limits;
        if limits.max_document_bytes == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DOCQA_MAX_DOCUMENT_BYTES must be greater than zero"
            )));
        }
        if limits.default_quiz_questions == 0
            || limits.default_quiz_questions > limits.max_quiz_questions
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DOCQA_DEFAULT_QUIZ_QUESTIONS must be between 1 and DOCQA_MAX_QUIZ_QUESTIONS ({})",
                limits.max_quiz_questions
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Like `get_env`, but credentials for the backend that is not selected may
/// stay unset even in production.
fn get_backend_env(
    key: &str,
    default: Option<&str>,
    is_prod: bool,
) -> Result<String, AppError> {
    match default {
        Some(def) => Ok(env::var(key).unwrap_or_else(|_| def.to_string())),
        None => get_env(key, None, is_prod),
    }
}

fn parse_env<T>(key: &str, default: T, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr + ToString,
{
    let raw = get_env(key, Some(&default.to_string()), is_prod)?;
    raw.trim().parse().map_err(|_| {
        AppError::ConfigError(anyhow::anyhow!("{} must be a number, got '{}'", key, raw))
    })
}

/// Optional tuning knobs: unset or blank means `None`, in every environment.
fn parse_optional_env<T: FromStr>(key: &str) -> Result<Option<T>, AppError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} must be a number, got '{}'", key, raw))
        }),
        _ => Ok(None),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> DocQaConfig {
    DocQaConfig {
        common: core_config::Config {
            port: 0,
            ..core_config::Config::default()
        },
        gemini: GeminiSettings {
            backend: GeminiBackend::AiStudio,
            model: "gemini-2.0-flash-001".to_string(),
            api_key: "test-api-key".to_string(),
            project_id: String::new(),
            location: "us-central1".to_string(),
            access_token: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            temperature: None,
            max_output_tokens: None,
        },
        limits: LimitsConfig {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_quiz_questions: DEFAULT_MAX_QUIZ_QUESTIONS,
            default_quiz_questions: DEFAULT_QUIZ_QUESTIONS,
        },
    }
}
