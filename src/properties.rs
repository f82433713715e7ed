//! `.properties`-style flat files: one `key=value` per line.
//!
//! Reading yields a flat source (built and promoted like any flat map).
//! Writing renders a flat map, e.g. the output of
//! [`to_flat_map`](crate::to_flat_map), so a tree can be saved and
//! loaded back.
//!
//! Syntax: blank lines and lines starting with `#` or `!` are skipped. The key
//! ends at the first unescaped `=` or `:`. Whitespace around the key and before
//! the value is ignored. Backslash escapes: `\\`, `\n`, `\r`, `\t`, and `\x`
//! for any other character `x`. A line ending in an unescaped `\` continues on
//! the next line, whose leading whitespace is dropped.

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::FlatfigError;
use crate::provider::Provider;
use crate::source::Source;

#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesProvider;

impl Provider for PropertiesProvider {
    fn parse(&self, content: &str, origin: &str) -> Result<Source, FlatfigError> {
        let map = parse(content, origin)?;
        debug!(origin, entries = map.len(), "loaded properties source");
        Ok(Source::flat(map).with_type("properties"))
    }
}

/// Parse properties text into a flat map. Later duplicates win.
pub fn parse(content: &str, origin: &str) -> Result<IndexMap<String, String>, FlatfigError> {
    let mut map = IndexMap::new();

    let mut lines = content.lines().enumerate();
    while let Some((i, line)) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (raw_key, raw_value) =
            split_entry(&logical).ok_or_else(|| FlatfigError::PropertiesSyntax {
                origin: origin.into(),
                line: i + 1,
                reason: "missing '=' or ':' separator".into(),
            })?;

        let key = unescape(raw_key.trim_end());
        if key.is_empty() {
            return Err(FlatfigError::PropertiesSyntax {
                origin: origin.into(),
                line: i + 1,
                reason: "empty key".into(),
            });
        }
        map.insert(key, unescape(raw_value.trim_start()));
    }

    Ok(map)
}

/// Render a flat map as properties text, one `key=value` line per entry.
pub fn render(map: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in map {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    out
}

/// Write a flat map to a properties file, creating parent directories.
pub fn write(path: &Path, map: &IndexMap<String, String>) -> Result<(), FlatfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FlatfigError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(path, render(map)).map_err(|e| FlatfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// An odd run of trailing backslashes ends in an unescaped one.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' | ':' => return Some((&line[..i], &line[i + 1..])),
            _ => {}
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' | ':' | '#' | '!' | ' ' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if i == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}
