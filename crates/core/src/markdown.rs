// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal YAML front-matter surgery for user-authored markdown.
//!
//! The executor's default model must not be overridable by user content,
//! so any `model:` key is removed from slash-command front matter before
//! staging. Block values (`model: |`) drop their indented continuation
//! lines too, to avoid leaving invalid YAML behind.

const FRONT_MATTER_DELIM: &str = "---";

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

fn is_model_key(line: &str) -> bool {
    let trimmed = line.trim_start();
    let Some(rest) = trimmed.get(..5).filter(|p| p.eq_ignore_ascii_case("model")).map(|_| &trimmed[5..])
    else {
        return false;
    };
    rest.trim_start().starts_with(':')
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Remove any `model` key from YAML front matter in a markdown document.
/// Documents without front matter pass through untouched.
pub fn strip_model_from_front_matter(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let text = strip_bom(markdown);
    let lines: Vec<&str> = text.lines().collect();
    if lines.first().map(|l| l.trim()) != Some(FRONT_MATTER_DELIM) {
        return markdown.to_string();
    }

    let Some(end_idx) = lines.iter().skip(1).position(|l| l.trim() == FRONT_MATTER_DELIM).map(|i| i + 1)
    else {
        return markdown.to_string();
    };

    let front = &lines[1..end_idx];
    let body = &lines[end_idx + 1..];

    let mut filtered: Vec<&str> = Vec::with_capacity(front.len());
    let mut i = 0;
    while i < front.len() {
        let line = front[i];
        if !is_model_key(line) {
            filtered.push(line);
            i += 1;
            continue;
        }

        // Drop the `model` key. Block values (`model:` / `model: |`) also
        // drop their indented continuation lines.
        let indent = indent_width(line);
        let remainder = line.split_once(':').map(|(_, r)| r.trim()).unwrap_or("");
        let is_block = remainder.is_empty() || remainder.starts_with('|') || remainder.starts_with('>');
        i += 1;
        if !is_block {
            continue;
        }
        while i < front.len() {
            let next = front[i];
            if next.trim().is_empty() {
                i += 1;
                continue;
            }
            if indent_width(next) <= indent {
                break;
            }
            i += 1;
        }
    }

    let mut rebuilt = Vec::with_capacity(filtered.len() + body.len() + 2);
    rebuilt.push(FRONT_MATTER_DELIM);
    rebuilt.extend_from_slice(&filtered);
    rebuilt.push(FRONT_MATTER_DELIM);
    rebuilt.extend_from_slice(body);
    let mut out = rebuilt.join("\n").trim_end().to_string();
    out.push('\n');
    out
}

/// Extract the `name:` field from YAML front matter.
///
/// Raw-mode sub-agents must carry a front-matter name that matches the
/// record name; this is the minimal parser that validation uses.
pub fn front_matter_name(markdown: &str) -> Option<String> {
    let text = strip_bom(markdown);
    let lines: Vec<&str> = text.lines().collect();
    if lines.first().map(|l| l.trim()) != Some(FRONT_MATTER_DELIM) {
        return None;
    }
    let end_idx = lines.iter().skip(1).position(|l| l.trim() == FRONT_MATTER_DELIM)? + 1;

    for line in &lines[1..end_idx] {
        let raw = line.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let Some(rest) = raw
            .get(..5)
            .filter(|p| p.eq_ignore_ascii_case("name:"))
            .map(|_| raw[5..].trim())
        else {
            continue;
        };
        let mut value = rest;
        if value.len() >= 2 {
            let quoted = (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''));
            if quoted {
                value = value[1..value.len() - 1].trim();
            }
        }
        return if value.is_empty() { None } else { Some(value.to_string()) };
    }
    None
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod tests;
