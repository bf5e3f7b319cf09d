//! HTML scraping for the emoji customization and sign-in pages

use reconcile::ExistingItem;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors reading a page that does not have the expected shape
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("invalid selector \"{0}\"")]
    Selector(String),

    #[error("no element matches \"{0}\"")]
    Missing(String),

    #[error("emoji row {row} is malformed: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("got the sign-in page instead; the session is not signed in")]
    SignedOut,

    #[error("not the emoji customization page (no upload form or emoji table)")]
    NotEmojiPage,
}

/// Hidden form fields that remove one emoji when posted back
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemovalForm(Vec<(String, String)>);

impl RemovalForm {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.0
    }
}

fn selector(css: &str) -> Result<Selector, PageError> {
    Selector::parse(css).map_err(|_| PageError::Selector(css.to_string()))
}

/// Name/value pairs of every hidden input under `form`
fn hidden_fields(form: ElementRef<'_>) -> Result<Vec<(String, String)>, PageError> {
    let inputs = selector(r#"input[type="hidden"]"#)?;
    Ok(form
        .select(&inputs)
        .filter_map(|input| {
            let el = input.value();
            let name = el.attr("name")?;
            Some((name.to_string(), el.attr("value").unwrap_or_default().to_string()))
        })
        .collect())
}

/// Hidden fields of the first form matching `form_css`
pub fn form_fields(html: &str, form_css: &str) -> Result<Vec<(String, String)>, PageError> {
    let document = Html::parse_document(html);
    let form_sel = selector(form_css)?;
    let form = document
        .select(&form_sel)
        .next()
        .ok_or_else(|| PageError::Missing(form_css.to_string()))?;
    hidden_fields(form)
}

/// Parse the custom emoji table into the current inventory.
///
/// A row that lacks its name cell or removal form fails the whole page, so a
/// partial inventory is never returned. A sign-in page, or any page with
/// neither the upload form nor the emoji table, is an error rather than an
/// empty inventory.
pub fn parse_inventory(html: &str) -> Result<Vec<ExistingItem<RemovalForm>>, PageError> {
    let document = Html::parse_document(html);
    if document.select(&selector("form#signin_form")?).next().is_some() {
        return Err(PageError::SignedOut);
    }
    let table = selector("table#custom_emoji")?;
    let add_form = selector("form#addemoji")?;
    if document.select(&table).next().is_none() && document.select(&add_form).next().is_none() {
        return Err(PageError::NotEmojiPage);
    }

    let rows = selector("table#custom_emoji tr.emoji_row")?;
    let cells = selector("td")?;
    let forms = selector("form")?;

    document
        .select(&rows)
        .enumerate()
        .map(|(index, row)| {
            let row_no = index + 1;
            let malformed = |reason: &str| PageError::MalformedRow {
                row: row_no,
                reason: reason.to_string(),
            };

            let tds: Vec<_> = row.select(&cells).collect();
            let name_cell = tds.get(1).ok_or_else(|| malformed("missing name cell"))?;
            let id = name_cell
                .text()
                .collect::<String>()
                .trim()
                .trim_matches(':')
                .to_string();
            if id.is_empty() {
                return Err(malformed("empty emoji name"));
            }

            let form = tds
                .get(3)
                .and_then(|cell| cell.select(&forms).next())
                .ok_or_else(|| malformed("missing removal form"))?;

            Ok(ExistingItem {
                id,
                removal_handle: RemovalForm::new(hidden_fields(form)?),
            })
        })
        .collect()
}
