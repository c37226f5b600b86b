//! bitcoin.conf helpers.
//!
//! Overrides travel in two shapes: as a bitcoin.conf text a user uploads,
//! and as the flattened `key=value,key=value` string stored under the
//! `bitcoin_conf` GraphML key. This module converts between both and the
//! in-memory map.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Compiled patterns for bitcoin.conf lines
struct ConfPatterns {
    /// Match: "[section]"
    section: Regex,
    /// Match: "key = value"
    entry: Regex,
}

static PATTERNS: LazyLock<ConfPatterns> = LazyLock::new(|| ConfPatterns {
    section: Regex::new(r"^\s*\[([^\]]+)\]\s*$").expect("Invalid section regex"),
    entry: Regex::new(r"^\s*([A-Za-z0-9_.\-]+)\s*=\s*(.*?)\s*$").expect("Invalid entry regex"),
});

/// Parse bitcoin.conf text into an override map
///
/// Supports:
/// - `key=value` lines (whitespace around `=` is ignored)
/// - `#` comment lines and blank lines
/// - `[section]` headers; keys below a header are stored as `section.key`
///
/// # Examples
/// ```
/// use topograph::utils::bitcoin_conf::parse_conf;
///
/// let conf = parse_conf("txindex=1\n# comment\n[regtest]\nrpcport = 18443\n");
/// assert_eq!(conf.get("txindex").map(String::as_str), Some("1"));
/// assert_eq!(conf.get("regtest.rpcport").map(String::as_str), Some("18443"));
/// ```
pub fn parse_conf(content: &str) -> BTreeMap<String, String> {
    let mut config = BTreeMap::new();
    let mut section: Option<String> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(caps) = PATTERNS.section.captures(line) {
            section = Some(caps[1].trim().to_string());
            continue;
        }

        match PATTERNS.entry.captures(line) {
            Some(caps) => {
                let key = match &section {
                    Some(section) => format!("{}.{}", section, &caps[1]),
                    None => caps[1].to_string(),
                };
                config.insert(key, caps[2].to_string());
            }
            None => log::debug!("Ignoring bitcoin.conf line without key=value: '{}'", trimmed),
        }
    }

    config
}

/// Read and parse a bitcoin.conf file
pub fn parse_conf_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read bitcoin.conf '{}'", path.display()))?;
    let config = parse_conf(&content);
    log::info!("Parsed {} bitcoin.conf entries from {:?}", config.len(), path);
    Ok(config)
}

/// Flatten overrides into the comma-joined GraphML form
///
/// An empty map flattens to an empty string. Entries whose value contains a
/// comma cannot be recovered by [`unflatten`] and are logged.
pub fn flatten(overrides: &BTreeMap<String, String>) -> String {
    overrides
        .iter()
        .map(|(key, value)| {
            if value.contains(',') {
                log::warn!("bitcoin.conf value for '{}' contains a comma and will not round-trip", key);
            }
            format!("{}={}", key, value)
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Rebuild overrides from the comma-joined GraphML form
///
/// Empty segments and segments without `=` are skipped, so trailing commas
/// written by older exporters are harmless.
pub fn unflatten(flat: &str) -> BTreeMap<String, String> {
    flat.split(',')
        .filter_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                None
            } else {
                Some((key.to_string(), value.trim().to_string()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flatten_and_unflatten() {
        let mut overrides = BTreeMap::new();
        overrides.insert("txindex".to_string(), "1".to_string());
        overrides.insert("debug".to_string(), "net".to_string());

        let flat = flatten(&overrides);
        assert_eq!(flat, "debug=net,txindex=1");
        assert_eq!(unflatten(&flat), overrides);
    }

    #[test]
    fn test_empty_map_flattens_to_empty_string() {
        assert_eq!(flatten(&BTreeMap::new()), "");
        assert!(unflatten("").is_empty());
    }

    #[test]
    fn test_unflatten_tolerates_trailing_and_junk_segments() {
        let map = unflatten("uacomment=alice,,=orphan,novalue,dbcache=450,");
        assert_eq!(map.len(), 2);
        assert_eq!(map["uacomment"], "alice");
        assert_eq!(map["dbcache"], "450");
    }

    #[test]
    fn test_parse_conf_sections_and_comments() {
        let conf = parse_conf(
            "# global\nblocksonly=1\n\n[test]\naddnode = 10.0.0.2\nnot a setting\n[main]\nmaxconnections=8\n",
        );
        assert_eq!(conf.len(), 3);
        assert_eq!(conf["blocksonly"], "1");
        assert_eq!(conf["test.addnode"], "10.0.0.2");
        assert_eq!(conf["main.maxconnections"], "8");
    }

    #[test]
    fn test_parse_conf_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "txindex=1\nrpcauth=user:hash\n").unwrap();

        let conf = parse_conf_file(temp_file.path()).unwrap();
        assert_eq!(conf["rpcauth"], "user:hash");
        assert!(parse_conf_file(Path::new("/nonexistent/bitcoin.conf")).is_err());
    }
}
