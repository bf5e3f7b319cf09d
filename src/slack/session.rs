//! Workspace sign-in
//!
//! A configured `slack.cookie` is used as-is. Otherwise the user is prompted
//! for credentials and the sign-in form is submitted through the agent, whose
//! cookie jar collects the session cookies (with a two-factor step when the
//! first submission sets no new cookie).

use super::page;
use anyhow::{Context, Result, bail};
use dialoguer::{Input, Password};
use log::{debug, info};
use reconcile::{Authenticator, Session};

/// Source of interactive answers during sign-in
pub trait Prompt {
    fn email(&self) -> Result<String>;
    fn password(&self, email: &str) -> Result<String>;
    fn two_factor_code(&self) -> Result<String>;
}

/// Prompts on the controlling terminal
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn email(&self) -> Result<String> {
        Ok(Input::<String>::new()
            .with_prompt("Email Address")
            .interact_text()?)
    }

    fn password(&self, email: &str) -> Result<String> {
        debug!("Requesting password for \"{email}\"");
        Ok(Password::new().with_prompt("Password").interact()?)
    }

    fn two_factor_code(&self) -> Result<String> {
        Ok(Input::<String>::new()
            .with_prompt("Two Factor Authentication Code")
            .interact_text()?)
    }
}

/// Produces the session shared by every request of a run
pub struct SlackLogin<P: Prompt = TerminalPrompt> {
    agent: ureq::Agent,
    endpoint: String,
    user_agent: Option<String>,
    cookie: Option<String>,
    prompt: P,
}

impl SlackLogin<TerminalPrompt> {
    pub fn new(
        agent: ureq::Agent,
        endpoint: impl Into<String>,
        user_agent: Option<String>,
        cookie: Option<String>,
    ) -> Self {
        Self::with_prompt(agent, endpoint, user_agent, cookie, TerminalPrompt)
    }
}

impl<P: Prompt> SlackLogin<P> {
    pub fn with_prompt(
        agent: ureq::Agent,
        endpoint: impl Into<String>,
        user_agent: Option<String>,
        cookie: Option<String>,
        prompt: P,
    ) -> Self {
        Self {
            agent,
            endpoint: endpoint.into(),
            user_agent,
            cookie: cookie.filter(|c| !c.trim().is_empty()),
            prompt,
        }
    }

    fn sign_in_url(&self) -> String {
        format!("{}/", self.endpoint)
    }

    fn get(&self, url: &str) -> Result<String> {
        let mut request = self.agent.get(url);
        if let Some(ua) = &self.user_agent {
            request = request.header("User-Agent", ua.as_str());
        }
        Ok(request.call()?.body_mut().read_to_string()?)
    }

    fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String> {
        let mut request = self.agent.post(url);
        if let Some(ua) = &self.user_agent {
            request = request.header("User-Agent", ua.as_str());
        }
        Ok(request
            .send_form(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))?
            .body_mut()
            .read_to_string()?)
    }

    fn jar_pairs(&self) -> Vec<(String, String)> {
        self.agent
            .cookie_jar_lock()
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect()
    }

    /// `name=value; ...` for every cookie the agent has collected
    fn collected_cookies(&self) -> Option<String> {
        cookie_header(&self.jar_pairs())
    }

    /// Whether the jar gained or changed a cookie since `before` was taken
    fn cookies_changed_since(&self, before: &[(String, String)]) -> bool {
        self.jar_pairs().iter().any(|pair| !before.contains(pair))
    }

    fn log_in(&self) -> Result<String> {
        let url = self.sign_in_url();
        info!("No session cookie configured, signing in to {url}");

        let email = self.prompt.email()?;
        let password = self.prompt.password(&email)?;

        let html = self
            .get(&url)
            .with_context(|| format!("Could not load sign-in page {url}"))?;
        let mut fields = page::form_fields(&html, "form#signin_form")
            .context("Sign-in page has no sign-in form")?;
        fields.push(("email".to_string(), email));
        fields.push(("password".to_string(), password));

        // Cookies set by the landing page alone do not mean we are signed in
        let before = self.jar_pairs();
        let response = self.post_form(&url, &fields).context("Sign-in failed")?;
        if let Some(cookies) = self
            .collected_cookies()
            .filter(|_| self.cookies_changed_since(&before))
        {
            return Ok(cookies);
        }

        debug!("No session cookie after sign-in, trying two-factor authentication");
        let mut fields =
            page::form_fields(&response, "form").context("Sign-in was rejected")?;
        fields.push(("2fa_code".to_string(), self.prompt.two_factor_code()?));
        let before = self.jar_pairs();
        self.post_form(&url, &fields)
            .context("Two-factor authentication failed")?;

        match self.collected_cookies() {
            Some(cookies) if self.cookies_changed_since(&before) => Ok(cookies),
            _ => bail!("Signing in to {} did not produce a session cookie", self.endpoint),
        }
    }
}

impl<P: Prompt> Authenticator for SlackLogin<P> {
    fn obtain_session(&self) -> Result<Session> {
        let cookie = match &self.cookie {
            Some(cookie) => {
                debug!("Using the configured session cookie");
                cookie.clone()
            }
            None => self.log_in()?,
        };

        let mut headers = Vec::new();
        if let Some(ua) = &self.user_agent {
            headers.push(("User-Agent".to_string(), ua.clone()));
        }
        headers.push(("Cookie".to_string(), cookie));

        Ok(Session {
            endpoint: self.endpoint.clone(),
            headers,
        })
    }
}

/// Join cookies into a `Cookie` header value; `None` when there are none
fn cookie_header(pairs: &[(String, String)]) -> Option<String> {
    if pairs.is_empty() {
        return None;
    }
    Some(
        pairs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
