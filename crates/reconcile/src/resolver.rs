//! Range expansion - turns numbered configuration entries into desired items
//!
//! Each position `k` of the range may carry two pipe-delimited lists:
//! `"<k>.id"` (identifiers) and `"<k>.filename"` (source references).
//! Gaps in the configuration narrow the result with a warning; only a
//! repeated identifier is fatal.

use crate::context::ConfigSource;
use crate::error::ConfigError;
use crate::types::DesiredItem;
use log::warn;
use std::collections::{BTreeSet, HashMap};

const LIST_SEPARATOR: char = '|';

/// Key holding the identifier list for a range position
pub fn id_key(position: i64) -> String {
    format!("{position}.id")
}

/// Key holding the source reference list for a range position
pub fn filename_key(position: i64) -> String {
    format!("{position}.filename")
}

/// Expand `[start, finish]` into the ordered desired items.
///
/// Identifiers and source references are paired positionally. When the two
/// lists differ in length only the shorter length's worth of pairs is
/// produced.
pub fn expand<C: ConfigSource + ?Sized>(
    start: i64,
    finish: i64,
    config: &C,
) -> Result<Vec<DesiredItem>, ConfigError> {
    let mut items = Vec::new();
    let mut first_seen: HashMap<String, i64> = HashMap::new();

    for position in start..=finish {
        let Some(ids) = read_list(config, &id_key(position)) else {
            continue;
        };
        let Some(sources) = read_list(config, &filename_key(position)) else {
            continue;
        };

        if ids.len() != sources.len() {
            warn!(
                "Position {} lists {} identifiers but {} filenames; only {} will be used",
                position,
                ids.len(),
                sources.len(),
                ids.len().min(sources.len())
            );
        }

        for (id, source_ref) in ids.into_iter().zip(sources) {
            if let Some(&first) = first_seen.get(&id) {
                return Err(ConfigError::DuplicateId {
                    id,
                    first,
                    second: position,
                });
            }
            first_seen.insert(id.clone(), position);
            items.push(DesiredItem {
                id,
                source_ref,
                position,
            });
        }
    }

    Ok(items)
}

/// Identifiers configured anywhere in `[start, finish]`.
///
/// This is the explicit removal set: only ids named in the range are ever
/// candidates for removal. Filenames are not needed, so a position with ids
/// but no filenames still contributes. Positions without a usable id list
/// are skipped with a warning.
pub fn removal_ids<C: ConfigSource + ?Sized>(start: i64, finish: i64, config: &C) -> BTreeSet<String> {
    (start..=finish)
        .filter_map(|position| read_list(config, &id_key(position)))
        .flatten()
        .collect()
}

/// Read and split a pipe-delimited list, warning when it is absent or malformed
fn read_list<C: ConfigSource + ?Sized>(config: &C, key: &str) -> Option<Vec<String>> {
    let Some(raw) = config.get(key) else {
        warn!("\"{key}\" was not found in settings");
        return None;
    };

    match split_list(raw) {
        Some(list) => Some(list),
        None => {
            warn!("\"{key}\" has an empty entry in \"{raw}\", skipping");
            None
        }
    }
}

/// Split on `|`, trimming each entry. Returns `None` if any entry is empty.
fn split_list(raw: &str) -> Option<Vec<String>> {
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .map(|entry| (!entry.is_empty()).then(|| entry.to_string()))
        .collect()
}
