//! Parsing of RFC 5988 `Link` headers.
//!
//! A header value holds one or more comma-separated links of the form
//! `<target>; rel="relation"; other="param"`. Commas and semicolons inside
//! `<...>` or inside quoted parameter values do not act as separators.

use reqwest::header::{HeaderMap, LINK};

/// A single link with its parameters. Parameter names are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub target: String,
    pub params: Vec<(String, String)>,
}

impl Link {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Relation types of this link. `rel` may carry several, space-separated.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.param("rel").unwrap_or_default().split_whitespace()
    }

    /// Relation types compare case-insensitively.
    pub fn has_rel(&self, relation: &str) -> bool {
        self.relations().any(|rel| rel.eq_ignore_ascii_case(relation))
    }
}

/// Parse one `Link` header value. Entries without a `<target>` are skipped.
pub fn parse_link_header(value: &str) -> Vec<Link> {
    split_unquoted(value, ',')
        .into_iter()
        .filter_map(parse_link)
        .collect()
}

/// Every link across all `Link` header values. Values that are not valid
/// visible ASCII are ignored.
pub fn links_from_headers(headers: &HeaderMap) -> Vec<Link> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(parse_link_header)
        .collect()
}

fn parse_link(raw: &str) -> Option<Link> {
    let mut segments = split_unquoted(raw, ';').into_iter();
    let target = segments
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?
        .trim()
        .to_string();

    let params = segments
        .filter_map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                return None;
            }
            let (name, value) = match segment.split_once('=') {
                Some((name, value)) => (name.trim(), unquote(value.trim())),
                None => (segment, String::new()),
            };
            Some((name.to_ascii_lowercase(), value))
        })
        .collect();

    Some(Link { target, params })
}

fn split_unquoted(value: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_target = false;
    let mut in_quotes = false;
    let mut escaped = false;

    for (index, c) in value.char_indices() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quotes = false;
            }
            continue;
        }
        match c {
            '"' if !in_target => in_quotes = true,
            '<' => in_target = true,
            '>' => in_target = false,
            c if c == separator && !in_target => {
                parts.push(&value[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
