//! JSON extraction from free-form backend responses.
//!
//! Backends are asked for a JSON object but routinely wrap it in markdown
//! fences, prepend an explanation, or stop mid-object. This module locates the
//! outermost JSON value in such text without interpreting its shape.
//!
//! # Extraction Strategies
//!
//! 1. Unwrap a markdown code fence if one is present
//! 2. Longest balanced `{...}` or `[...]` span that parses, so a literal
//!    `{}` placeholder in leading prose does not shadow the payload
//! 3. Span from the first `{` to the last `}`
//!
//! # Example
//!
//! ```
//! use forkgen::utils::json_extraction::extract_outermost_json;
//!
//! let response = "Sure! ```json\n{\"results\": []}\n``` Enjoy.";
//! let json = extract_outermost_json(response).into_json();
//! assert_eq!(json.as_deref(), Some("{\"results\": []}"));
//! ```

use std::sync::OnceLock;

use regex::Regex;

/// Compiled once; `None` only if the pattern itself is invalid.
static CODE_BLOCK_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// Result of a JSON extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonExtractionResult {
    /// A span that parses as JSON.
    Success(String),
    /// JSON started but never closed.
    Truncated {
        partial_json: String,
        unclosed_braces: usize,
        unclosed_brackets: usize,
    },
    /// No JSON-like content at all.
    NotFound,
}

impl JsonExtractionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, JsonExtractionResult::Success(_))
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, JsonExtractionResult::Truncated { .. })
    }

    /// Consumes the result, keeping only a successfully extracted span.
    pub fn into_json(self) -> Option<String> {
        match self {
            JsonExtractionResult::Success(json) => Some(json),
            _ => None,
        }
    }
}

/// Depth bookkeeping for a scanned span.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonStructureAnalysis {
    pub unclosed_braces: usize,
    pub unclosed_brackets: usize,
    /// Whether the scan ended inside a string literal.
    pub in_string: bool,
    /// Byte offset of the first `{` or `[`.
    pub json_start: Option<usize>,
}

impl JsonStructureAnalysis {
    pub fn is_unbalanced(&self) -> bool {
        self.unclosed_braces > 0 || self.unclosed_brackets > 0 || self.in_string
    }
}

/// Scans `s` and tracks brace/bracket depth outside string literals.
pub fn analyze_json_structure(s: &str) -> JsonStructureAnalysis {
    let mut brace_depth: isize = 0;
    let mut bracket_depth: isize = 0;
    let mut in_string = false;
    let mut escape_next = false;
    let mut json_start: Option<usize> = None;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => {
                json_start.get_or_insert(i);
                if c == '{' {
                    brace_depth += 1;
                } else {
                    bracket_depth += 1;
                }
            }
            '}' if !in_string => brace_depth -= 1,
            ']' if !in_string => bracket_depth -= 1,
            _ => {}
        }
    }

    JsonStructureAnalysis {
        unclosed_braces: brace_depth.max(0) as usize,
        unclosed_brackets: bracket_depth.max(0) as usize,
        in_string,
        json_start,
    }
}

/// Finds the byte index of the delimiter closing the one `s` starts with.
///
/// Handles nesting, string literals and escape sequences. Returns `None` when
/// `s` does not start with `open` or the span never closes.
fn find_matching_delimiter(s: &str, open: char, close: char) -> Option<usize> {
    if !s.starts_with(open) {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Index of the `}` matching the `{` that `s` starts with.
pub fn find_matching_brace(s: &str) -> Option<usize> {
    find_matching_delimiter(s, '{', '}')
}

/// Index of the `]` matching the `[` that `s` starts with.
pub fn find_matching_bracket(s: &str) -> Option<usize> {
    find_matching_delimiter(s, '[', ']')
}

/// Returns the body of the first markdown code fence, if any.
pub fn extract_from_code_block(content: &str) -> Option<&str> {
    let re = CODE_BLOCK_RE
        .get_or_init(|| Regex::new(r"```(?:[A-Za-z]+)?\s*\n?([\s\S]*?)\n?```").ok())
        .as_ref()?;
    let caps = re.captures(content)?;
    Some(caps.get(1)?.as_str().trim())
}

fn parses(candidate: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(candidate).is_ok()
}

/// Longest balanced object or array span that parses.
///
/// Every `{` and `[` outside an already-accepted span is tried as a start,
/// so an empty `{}` in prose loses to the payload that follows it. Ties go
/// to the earlier span.
fn longest_balanced_span(content: &str) -> Option<&str> {
    let mut best: Option<&str> = None;
    let mut from = 0;

    while let Some(offset) = content[from..].find(['{', '[']) {
        let start = from + offset;
        let rest = &content[start..];
        let end = if rest.starts_with('{') {
            find_matching_brace(rest)
        } else {
            find_matching_bracket(rest)
        };

        match end.map(|end| &rest[..=end]).filter(|span| parses(span)) {
            Some(span) => {
                if best.map_or(true, |b| span.len() > b.len()) {
                    best = Some(span);
                }
                from = start + span.len();
            }
            None => from = start + 1,
        }
    }

    best
}

/// Span from the first `{` to the last `}`, if it parses.
fn widest_object_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    let candidate = &content[start..=end];
    parses(candidate).then_some(candidate)
}

fn extract_from_text(text: &str) -> Option<&str> {
    longest_balanced_span(text).or_else(|| widest_object_span(text))
}

/// Locates the outermost JSON object or array in a backend response.
///
/// Leading or trailing prose and markdown code fences are tolerated. The
/// returned span is guaranteed to parse as JSON.
///
/// # Arguments
///
/// * `content` - Raw response text
///
/// # Returns
///
/// `Success` with the extracted span, `Truncated` when JSON started but never
/// closed, or `NotFound` when the text contains no JSON delimiters.
pub fn extract_outermost_json(content: &str) -> JsonExtractionResult {
    let trimmed = content.trim();

    if let Some(block) = extract_from_code_block(trimmed) {
        if let Some(json) = extract_from_text(block) {
            return JsonExtractionResult::Success(json.to_string());
        }
    }

    if let Some(json) = extract_from_text(trimmed) {
        return JsonExtractionResult::Success(json.to_string());
    }

    let analysis = analyze_json_structure(trimmed);
    match analysis.json_start {
        Some(start) if analysis.is_unbalanced() => JsonExtractionResult::Truncated {
            partial_json: trimmed[start..].to_string(),
            unclosed_braces: analysis.unclosed_braces,
            unclosed_brackets: analysis.unclosed_brackets,
        },
        _ => JsonExtractionResult::NotFound,
    }
}
