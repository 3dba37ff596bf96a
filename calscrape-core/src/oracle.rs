// Requirement structuring through a chat-completions endpoint

use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = r#"You turn scraped university degree requirements into structured data.

The user message is JSON with program_url, specialization_name, faculty and
requirements_raw (paragraphs, list items and table rows copied from a calendar page).

Reply with JSON of exactly this shape:
{
  "requirements": [
    {
      "type": "course_list" | "course_choice" | "bucket" | "meta",
      "courses": ["SUBJ 101"],
      "options": [{ "courses": ["SUBJ 101"], "credits": 3 }],
      "bucket_label": "string or null",
      "min_credits": 0,
      "min_choose": 0,
      "label": "string or null",
      "notes": "string or null"
    }
  ]
}

course_list: every listed course is required.
course_choice: alternatives, e.g. "one of CPSC 110 or CPSC 121".
bucket: credits from a pool, e.g. "6 credits of Arts electives".
meta: totals and non-course conditions, e.g. "120 credits required".
Write campus-suffixed codes without the suffix (CPSC_V 110 becomes CPSC 110).
Use 0 for numbers that do not apply. Output JSON only, no markdown."#;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("API key variable {0} is not set")]
    MissingKey(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub enabled: bool,
    pub api_url: String,
    pub model: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 90,
        }
    }
}

/// What the oracle is told about one section.
#[derive(Debug, Clone, Serialize)]
pub struct OracleRequest<'a> {
    pub program_url: &'a str,
    pub specialization_name: &'a str,
    pub faculty: Option<&'a str>,
    pub requirements_raw: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    CourseList,
    CourseChoice,
    Bucket,
    Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOption {
    #[serde(default, deserialize_with = "null_as_default")]
    pub courses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub credits: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "type")]
    pub kind: RequirementKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub courses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<CourseOption>,
    #[serde(default)]
    pub bucket_label: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_credits: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_choose: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Models write `null` for fields that do not apply.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRequirements {
    pub requirements: Vec<Requirement>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct Oracle {
    client: Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl Oracle {
    pub fn new(api_url: &str, model: &str, api_key: &str, timeout_secs: u64) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build from config, reading the key from the configured variable.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| OracleError::MissingKey(config.api_key_env.clone()))?;
        Self::new(&config.api_url, &config.model, &api_key, config.timeout_secs)
    }

    pub async fn structure(&self, request: &OracleRequest<'_>) -> Result<Vec<Requirement>, OracleError> {
        debug!("Structuring {} lines for {}", request.requirements_raw.len(), request.specialization_name);

        let user_content =
            serde_json::to_string(request).map_err(|e| OracleError::Malformed(e.to_string()))?;
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_content },
            ],
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OracleError::Malformed("no message content".to_string()))?;

        let structured = parse_structured(&content)?;
        info!(
            "Oracle returned {} requirements for {}",
            structured.requirements.len(),
            request.specialization_name
        );
        Ok(structured.requirements)
    }
}

/// Parse model output, tolerating a surrounding markdown code fence.
pub fn parse_structured(content: &str) -> Result<StructuredRequirements, OracleError> {
    serde_json::from_str(strip_code_fence(content)).map_err(|e| OracleError::Malformed(e.to_string()))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
