//! Get command implementation

use super::{Command, CommandContext};
use crate::connector::HttpConnector;
use crate::constants::{github, http};
use anyhow::Result;
use async_trait::async_trait;
use colored::*;
use ghconnect_http::{Response, ResponseSource};

/// Get command for issuing GET requests through the caching connector
pub struct GetCommand {
    /// API path (joined to `api_base`) or absolute URL
    pub target: String,
    pub token: Option<String>,
    /// Overrides `cache_max_age` from the config
    pub max_age: Option<i32>,
    pub no_cache: bool,
    pub repeat: u32,
    /// Print the body of the last response
    pub body: bool,
}

/// Pick the token to send: an explicit one wins, then `GITHUB_TOKEN`
pub fn resolve_token(explicit: Option<&str>) -> Option<String> {
    explicit
        .filter(|token| !token.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            std::env::var(github::TOKEN_ENV_VAR)
                .ok()
                .filter(|token| !token.trim().is_empty())
        })
}

#[async_trait]
impl Command for GetCommand {
    async fn execute(&self, context: &CommandContext) -> Result<()> {
        let mut config = context.config.clone();
        if let Some(max_age) = self.max_age {
            config.cache_max_age = max_age;
        }
        if self.no_cache {
            config.cache.enabled = false;
        }

        let connector = config.build_connector()?;
        let url = config.resolve_url(&self.target)?;
        let token = resolve_token(self.token.as_deref());

        println!(
            "{}",
            format!(
                "GET {} ({})",
                url,
                connector
                    .max_age_header_value()
                    .map(|value| format!("Cache-Control: {value}"))
                    .unwrap_or_else(|| "no forced Cache-Control".to_string())
            )
            .green()
        );

        let attempts = self.repeat.max(1);
        let mut last = None;
        for attempt in 1..=attempts {
            let mut connection = connector.connect(&url)?;
            connection.set_request_property("Accept", http::GITHUB_ACCEPT)?;
            if let Some(token) = &token {
                connection.set_request_property("Authorization", &format!("token {token}"))?;
            }

            let response = connection.into_response().await?;
            print_attempt(attempt, &response);
            last = Some(response);
        }

        if self.body
            && let Some(response) = &last
        {
            println!("{}", render_body(response));
        }

        if let Some(cache) = connector.client().cache() {
            println!(
                "{}",
                format!(
                    "cache: {} requests, {} network, {} hits",
                    cache.request_count(),
                    cache.network_count(),
                    cache.hit_count()
                )
                .cyan()
            );
        }

        Ok(())
    }
}

/// Pretty-print JSON bodies, pass anything else through as text
fn render_body(response: &Response) -> String {
    serde_json::from_slice::<serde_json::Value>(response.body())
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| response.text())
}

fn print_attempt(attempt: u32, response: &Response) {
    let status = response.status();
    let status_text = if status.is_success() {
        status.to_string().green()
    } else if status.is_redirection() {
        status.to_string().yellow()
    } else {
        status.to_string().red()
    };

    let source = match response.source() {
        ResponseSource::Network => response.source().as_str().normal(),
        ResponseSource::Cache | ResponseSource::ConditionalCache => {
            response.source().as_str().cyan()
        }
    };

    println!(
        "{} | {} | {} | etag {} | rate limit remaining {}",
        format!("#{attempt}").bold(),
        status_text,
        source,
        response.header("ETag").unwrap_or("-"),
        response
            .header(github::RATE_LIMIT_REMAINING_HEADER)
            .unwrap_or("-")
    );
}
