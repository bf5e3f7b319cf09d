//! Slack workspace adapter: session login, inventory scraping and emoji
//! mutations over the web customization page.

pub mod client;
#[cfg(test)]
mod mock_server;
pub mod page;
pub mod session;

use crate::config::Settings;
use anyhow::{Result, bail};
use reconcile::SubmitError;
use std::time::Duration;

pub use client::SlackClient;
pub use session::SlackLogin;

/// Path of the emoji customization page under the workspace URL
pub const EMOJI_PAGE: &str = "/customize/emoji";

/// Workspace base URL: `slack.url` when set, otherwise derived from `slack.team`
pub fn endpoint(settings: &Settings) -> Result<String> {
    if let Some(url) = settings.get("slack.url") {
        return Ok(url.trim_end_matches('/').to_string());
    }
    match settings.get("slack.team") {
        Some(team) if !team.trim().is_empty() => Ok(format!("https://{}.slack.com", team.trim())),
        _ => bail!(
            "Neither \"slack.url\" nor \"slack.team\" is set in profile \"{}\"",
            settings.profile()
        ),
    }
}

/// Blocking HTTP agent with a per-request timeout and its own cookie jar
pub fn http_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Classify a transport failure for the retry layer
pub fn classify(err: ureq::Error, context: &str) -> SubmitError {
    match err {
        ureq::Error::StatusCode(status) => SubmitError::from_status(status, context),
        ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound => SubmitError::retryable(format!("{context}: {err}")),
        other => SubmitError::terminal(format!("{context}: {other}")),
    }
}
