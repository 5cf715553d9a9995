//! Local configuration loaded from properties files

use crate::{BridgeError, BridgeResult};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Default properties file loaded by the bootstraps
pub const DEFAULT_PROPERTIES_FILE: &str = "config.properties";

/// Configuration tree addressed by dotted keys
///
/// Keys such as `db.primary.host` form an implicit hierarchy; [`ConfigTree::extract`]
/// returns the sub-tree under a prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigTree {
    entries: BTreeMap<String, String>,
}

impl ConfigTree {
    /// Create an empty configuration tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a properties file, merging its entries over existing ones
    pub fn load_properties_file(&mut self, path: impl AsRef<Path>) -> BridgeResult<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| BridgeError::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_properties_str(&content);
        Ok(())
    }

    /// Parse properties text, merging its entries over existing ones
    ///
    /// Follows the `java.util.Properties` line format: `=`, `:` or
    /// whitespace separators, `#`/`!` comments, trailing-backslash
    /// continuations, and `\t`, `\n`, `\r`, `\f`, `\uXXXX` escapes. An
    /// escaped separator (`a\:b=c`) belongs to the key.
    pub fn load_properties_str(&mut self, content: &str) {
        let mut pending = String::new();

        for raw in content.lines() {
            let line = if pending.is_empty() {
                raw.trim()
            } else {
                raw.trim_start()
            };

            if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
            {
                continue;
            }

            if let Some(body) = continuation(line) {
                pending.push_str(body);
                continue;
            }

            pending.push_str(line);
            self.insert_line(&pending);
            pending.clear();
        }

        if !pending.is_empty() {
            self.insert_line(&pending);
        }
    }

    fn insert_line(&mut self, line: &str) {
        let (key, value) = split_key_value(line);
        let key = unescape(key);
        if key.is_empty() {
            return;
        }
        self.entries.insert(key, unescape(value));
    }

    /// Set a single value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get a raw string value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get a raw string value or a default
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Get a value parsed with [`FromStr`]
    ///
    /// Returns `None` if the key is missing or the value does not parse.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Get a value parsed as JSON
    ///
    /// Useful for list or object values such as `hosts=["a","b"]`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_str(v).ok())
    }

    /// Extract the sub-tree under `prefix`, with the prefix stripped from keys
    pub fn extract(&self, prefix: &str) -> ConfigTree {
        let prefix = format!("{}.", prefix.trim_end_matches('.'));
        let entries = self
            .entries
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(&prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), v.clone()))
            })
            .collect();
        ConfigTree { entries }
    }

    /// All keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the tree has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strip a trailing line-continuation backslash, if the line has an odd number of them
fn continuation(line: &str) -> Option<&str> {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    if trailing % 2 == 1 {
        Some(&line[..line.len() - 1])
    } else {
        None
    }
}

/// Split a logical line at the first unescaped `=`, `:` or whitespace
///
/// Whitespace around the separator is dropped, and a whitespace separator may
/// be followed by one `=` or `:`, so `key value`, `key = value` and
/// `key:value` all yield the same pair.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut split = None;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            split = Some(idx);
            break;
        }
    }

    let Some(idx) = split else {
        return (line, "");
    };
    let rest = line[idx..].trim_start();
    let value = match rest.strip_prefix(['=', ':']) {
        Some(value) => value.trim_start(),
        None => rest,
    };
    (&line[..idx], value)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => out.push(decoded),
                    // Malformed escapes are kept as written, minus the backslash
                    _ => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
