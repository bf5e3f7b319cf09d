//! Emoji inventory and mutations against the customization page

use super::page::{self, RemovalForm};
use super::{EMOJI_PAGE, classify};
use anyhow::{Context, Result};
use log::debug;
use reconcile::{DesiredItem, ExistingItem, RemoteClient, Session, SnapshotProvider, SubmitError};
use std::path::PathBuf;
use ureq::unversioned::multipart::Form;

/// Authenticated client for one workspace
///
/// Shared by every worker; each call issues its own requests and keeps no
/// per-call state. Session cookies live in the agent's jar, so cookies the
/// workspace refreshes mid-run are picked up by later requests.
pub struct SlackClient {
    agent: ureq::Agent,
    session: Session,
    upload_folder: PathBuf,
}

impl SlackClient {
    /// Seeds `agent`'s cookie jar with the session's `Cookie` header
    pub fn new(
        agent: ureq::Agent,
        session: Session,
        upload_folder: impl Into<PathBuf>,
    ) -> Result<Self> {
        if let Some(header) = session.header("cookie") {
            let uri: ureq::http::Uri = session
                .endpoint
                .parse()
                .with_context(|| format!("Invalid workspace URL \"{}\"", session.endpoint))?;
            let mut jar = agent.cookie_jar_lock();
            for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                let cookie = ureq::Cookie::parse(format!("{pair}; Path=/"), &uri)
                    .with_context(|| format!("Invalid session cookie \"{pair}\""))?;
                jar.insert(cookie, &uri)
                    .with_context(|| format!("Could not store session cookie \"{pair}\""))?;
            }
        }

        Ok(Self {
            agent,
            session,
            upload_folder: upload_folder.into(),
        })
    }

    fn page_url(&self) -> String {
        format!("{}{EMOJI_PAGE}", self.session.endpoint)
    }

    /// Session headers other than `Cookie`, which the jar supplies
    fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.session
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("cookie"))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Fetch the customization page with the session applied
    fn get_page(&self) -> Result<String, ureq::Error> {
        let mut request = self.agent.get(&self.page_url());
        for (name, value) in self.headers() {
            request = request.header(name, value);
        }
        request.call()?.body_mut().read_to_string()
    }

    fn image_path(&self, source_ref: &str) -> PathBuf {
        self.upload_folder.join(source_ref)
    }
}

impl RemoteClient for SlackClient {
    type Handle = RemovalForm;

    fn add(&self, item: &DesiredItem) -> Result<String, SubmitError> {
        let html = self
            .get_page()
            .map_err(|e| classify(e, "loading the upload form"))?;
        let hidden = page::form_fields(&html, "form#addemoji")
            .map_err(|e| SubmitError::terminal(format!("upload form unavailable: {e}")))?;

        let path = self.image_path(&item.source_ref);
        debug!("Opening \"{}\" for uploading", path.display());
        let form = hidden
            .iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .text("name", &item.id)
            .text("mode", "data")
            .file("img", &path)
            .map_err(|e| {
                SubmitError::terminal(format!("could not read {}: {e}", path.display()))
            })?;

        let mut request = self.agent.post(&self.page_url());
        for (name, value) in self.headers() {
            request = request.header(name, value);
        }
        request.send(form).map_err(|e| classify(e, "upload"))?;

        Ok(item.id.clone())
    }

    fn remove(&self, handle: &RemovalForm) -> Result<(), SubmitError> {
        let mut request = self.agent.post(&self.page_url());
        for (name, value) in self.headers() {
            request = request.header(name, value);
        }
        request
            .send_form(handle.fields().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .map_err(|e| classify(e, "remove"))?;
        Ok(())
    }
}

impl SnapshotProvider for SlackClient {
    type Handle = RemovalForm;

    fn fetch(&self) -> Result<Vec<ExistingItem<RemovalForm>>> {
        let html = self
            .get_page()
            .with_context(|| format!("Could not load {}", self.page_url()))?;
        let items = page::parse_inventory(&html).context("Unexpected emoji page layout")?;
        debug!("Found {} existing emoji", items.len());
        Ok(items)
    }
}
