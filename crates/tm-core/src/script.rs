//! Migration script identity and the `<sequenceId>_<name>.sql` naming convention.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Extension every migration script carries (matched case-insensitively)
pub const SCRIPT_EXTENSION: &str = ".sql";

/// Separator between the sequence id and the name
pub const ID_SEPARATOR: char = '_';

/// Separator between the provider root and the script file name
pub const ROOT_SEPARATOR: char = '/';

/// One migration script discovered by a provider.
///
/// Built transiently during discovery and never persisted. Scripts order by
/// `sequence_id`; the provider that listed the script is the one that loads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInfo {
    /// Ordering key, compared against the last applied history row
    pub sequence_id: i64,
    /// Human-readable label, copied into history
    pub name: String,
    /// Provider-specific handle used to fetch the content
    pub locator: String,
    /// Description of the provider that produced this script
    pub origin: String,
}

impl fmt::Display for ScriptInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.sequence_id, self.name)
    }
}

/// The `(sequence id, name)` pair extracted from a script key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub sequence_id: i64,
    pub name: String,
}

/// Parse `<root>/<sequenceId>_<name>.sql`.
///
/// Returns `Ok(None)` for keys outside `root`, keys in nested folders below
/// `root`, and keys without the `.sql` extension; providers routinely expose
/// unrelated entries. A `.sql` key directly under `root` that breaks the
/// convention is an error.
pub fn parse_script_key(key: &str, root: &str) -> CoreResult<Option<ParsedKey>> {
    let root = root.trim_end_matches(ROOT_SEPARATOR);
    let Some(file_name) = key
        .strip_prefix(root)
        .and_then(|rest| rest.strip_prefix(ROOT_SEPARATOR))
    else {
        return Ok(None);
    };
    if file_name.contains(ROOT_SEPARATOR) {
        return Ok(None);
    }

    let Some(stem) = strip_extension(file_name) else {
        return Ok(None);
    };

    let Some((id_part, name)) = stem.split_once(ID_SEPARATOR) else {
        return Err(CoreError::MalformedScriptKey {
            key: key.to_string(),
            reason: format!("missing '{ID_SEPARATOR}' between sequence id and name"),
        });
    };

    if id_part.is_empty() || !id_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidSequenceId {
            key: key.to_string(),
            value: id_part.to_string(),
        });
    }
    let sequence_id = id_part
        .parse::<i64>()
        .map_err(|_| CoreError::InvalidSequenceId {
            key: key.to_string(),
            value: id_part.to_string(),
        })?;

    if name.is_empty() {
        return Err(CoreError::MalformedScriptKey {
            key: key.to_string(),
            reason: "empty name after the sequence id".to_string(),
        });
    }

    Ok(Some(ParsedKey {
        sequence_id,
        name: name.to_string(),
    }))
}

fn strip_extension(file_name: &str) -> Option<&str> {
    let split = file_name.len().checked_sub(SCRIPT_EXTENSION.len())?;
    if !file_name.is_char_boundary(split) {
        return None;
    }
    let (stem, ext) = file_name.split_at(split);
    ext.eq_ignore_ascii_case(SCRIPT_EXTENSION).then_some(stem)
}

/// Parse every `(key, locator)` pair under `root` into scripts sorted by
/// sequence id.
///
/// Sorting is stable, so equal ids keep listing order; equal ids are then
/// rejected because "already applied" is decided on the id alone.
pub fn collect_scripts<I>(entries: I, root: &str, origin: &str) -> CoreResult<Vec<ScriptInfo>>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut scripts = Vec::new();
    for (key, locator) in entries {
        if let Some(parsed) = parse_script_key(&key, root)? {
            scripts.push(ScriptInfo {
                sequence_id: parsed.sequence_id,
                name: parsed.name,
                locator,
                origin: origin.to_string(),
            });
        }
    }
    scripts.sort_by_key(|s| s.sequence_id);
    ensure_unique_ids(&scripts)?;
    Ok(scripts)
}

/// Fail on the first pair of adjacent scripts sharing a sequence id.
///
/// `scripts` must already be sorted by sequence id.
pub fn ensure_unique_ids(scripts: &[ScriptInfo]) -> CoreResult<()> {
    for pair in scripts.windows(2) {
        if pair[0].sequence_id == pair[1].sequence_id {
            return Err(CoreError::DuplicateSequenceId {
                sequence_id: pair[0].sequence_id,
                first: format!("{} ({})", pair[0].locator, pair[0].origin),
                second: format!("{} ({})", pair[1].locator, pair[1].origin),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
