use crate::oauth::{authorization_header, OauthCredentials};
use crate::poster::{PostError, PostSink};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

const TWEETS_ENDPOINT: &str = "https://api.twitter.com/2/tweets";
const SEND_TIMEOUT_SECS: u64 = 10;

/// Posting sink backed by the Twitter v2 create-tweet endpoint, signed with
/// OAuth 1.0a user context.
pub struct TwitterSink {
    client: Client,
    creds: OauthCredentials,
    endpoint: String,
}

#[derive(Serialize)]
struct TweetPayload<'a> {
    text: &'a str,
}

impl TwitterSink {
    /// All four credentials must be present; anything less disables posting
    /// (degraded mode) with a warning naming the gap.
    pub fn from_env() -> Option<Self> {
        let keys = [
            "TWITTER_CONSUMER_KEY",
            "TWITTER_CONSUMER_SECRET",
            "TWITTER_ACCESS_TOKEN",
            "TWITTER_ACCESS_TOKEN_SECRET",
        ];
        let values: Vec<Option<String>> = keys
            .iter()
            .map(|key| std::env::var(key).ok().and_then(normalize_env))
            .collect();

        if values.iter().all(Option::is_none) {
            return None;
        }
        if values.iter().any(Option::is_none) {
            let missing: Vec<&str> = keys
                .iter()
                .zip(&values)
                .filter(|(_, v)| v.is_none())
                .map(|(k, _)| *k)
                .collect();
            warn!(?missing, "twitter posting disabled: credentials incomplete");
            return None;
        }

        let mut values = values.into_iter().flatten();
        Some(Self::new(OauthCredentials {
            consumer_key: values.next().unwrap_or_default(),
            consumer_secret: values.next().unwrap_or_default(),
            access_token: values.next().unwrap_or_default(),
            access_secret: values.next().unwrap_or_default(),
        }))
    }

    pub fn new(creds: OauthCredentials) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|err| {
                warn!(?err, "twitter client build failed; using default client");
                Client::new()
            });
        Self {
            client,
            creds,
            endpoint: TWEETS_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl PostSink for TwitterSink {
    async fn post(&self, text: &str) -> Result<(), PostError> {
        let header = authorization_header(&self.creds, "POST", &self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, header)
            .json(&TweetPayload { text })
            .send()
            .await
            .map_err(|err| PostError::Transient(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 429 || status.is_server_error() {
            Err(PostError::Transient(format!("http {status}")))
        } else {
            Err(PostError::Permanent(format!("http {status}")))
        }
    }
}

fn normalize_env(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
