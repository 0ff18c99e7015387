//! Spell-check assistant client.
//!
//! Stateless call-out to an external language-model service with a fixed
//! prompt and a JSON response contract. Suggestions are advisory only, so
//! every failure mode (unreachable service, non-2xx status, unparsable
//! response) degrades to an empty suggestion list instead of an error.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Instruction sent alongside the conclusion text
const PROMPT: &str = "Review the following equipment-inspection text for spelling and grammar. \
     Respond with JSON of the form {\"suggestions\": [{\"original\": string, \
     \"suggestion\": string, \"reason\": string}]} and nothing else.";

/// One correction proposal for a span of the checked text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Text as written
    pub original: String,
    /// Proposed replacement
    pub suggestion: String,
    /// Short explanation, when the service provides one
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpellcheckRequest<'a> {
    prompt: &'static str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct SpellcheckResponse {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

/// Client for the spell-check service
#[derive(Clone)]
pub struct SpellcheckClient {
    endpoint: String,
    client: reqwest::Client,
}

impl SpellcheckClient {
    /// Create a client for the given service endpoint
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::InvalidInput(
                "spellcheck endpoint must include http:// or https://".to_string(),
            ));
        }
        Ok(Self {
            endpoint,
            client: reqwest::Client::builder().build()?,
        })
    }

    /// Fetch correction suggestions for the given text.
    ///
    /// Empty input short-circuits; every failure returns an empty list.
    pub async fn suggestions(&self, text: &str) -> Vec<Suggestion> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        match self.request(text).await {
            Ok(suggestions) => suggestions,
            Err(error) => {
                tracing::warn!(%error, "Spell-check service unavailable, returning no suggestions");
                Vec::new()
            }
        }
    }

    async fn request(&self, text: &str) -> Result<Vec<Suggestion>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SpellcheckRequest {
                prompt: PROMPT,
                input: text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Collab(format!(
                "spellcheck HTTP {}",
                response.status().as_u16()
            )));
        }

        let payload = response.json::<SpellcheckResponse>().await?;
        Ok(payload.suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_must_be_http() {
        assert!(SpellcheckClient::new("llm.example.com").is_err());
        assert!(SpellcheckClient::new("https://llm.example.com/v1/check").is_ok());
    }

    #[tokio::test]
    async fn empty_input_yields_no_suggestions_without_a_request() {
        let client = SpellcheckClient::new("https://llm.invalid/v1/check").unwrap();
        assert!(client.suggestions("   ").await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_degrades_to_empty() {
        // .invalid never resolves, so the request itself fails.
        let client = SpellcheckClient::new("https://llm.invalid/v1/check").unwrap();
        assert!(client.suggestions("sometext").await.is_empty());
    }

    #[test]
    fn response_parses_with_missing_reason() {
        let payload: SpellcheckResponse = serde_json::from_str(
            r#"{"suggestions":[{"original":"recieve","suggestion":"receive"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.suggestions.len(), 1);
        assert!(payload.suggestions[0].reason.is_none());
    }
}
