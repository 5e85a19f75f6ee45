//! JSON coercion layer - forces free-form model text into a DecisionRecord.
//!
//! The formatting stage is instructed to return bare JSON, but models wrap
//! output in prose or code fences often enough that strict parsing alone is
//! not viable. Coercion attempts a strict parse first, then applies exactly
//! two recovery heuristics before giving up:
//!
//! 1. Strip a surrounding markdown code fence.
//! 2. Extract the first balanced JSON object substring.
//!
//! A record that parses but violates the non-empty invariants is rejected
//! outright; re-extracting the same object cannot make it valid.

use thiserror::Error;

use super::record::DecisionRecord;

/// Stage 3 output that could not be coerced into a DecisionRecord.
///
/// Carries the raw text for diagnostics. The orchestrator marks the run
/// failed rather than inventing placeholder field values.
#[derive(Debug, Clone, Error)]
#[error("coercion failed: {reason}")]
pub struct CoercionFailure {
    /// Why coercion gave up.
    pub reason: String,
    /// The raw model output, preserved for diagnostics.
    pub raw_text: String,
}

/// Coerces raw model output into a validated DecisionRecord.
pub fn coerce(raw: &str) -> Result<DecisionRecord, CoercionFailure> {
    let mut last_parse_error = None;

    let candidates = [
        Some(raw.trim().to_string()),
        strip_code_fence(raw),
        extract_balanced_object(raw),
    ];

    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str::<DecisionRecord>(&candidate) {
            Ok(record) => {
                return record
                    .validate()
                    .map(|()| record.clone())
                    .map_err(|e| CoercionFailure {
                        reason: format!("schema invariant violated: {}", e),
                        raw_text: raw.to_string(),
                    });
            }
            Err(e) => last_parse_error = Some(e),
        }
    }

    Err(CoercionFailure {
        reason: match last_parse_error {
            Some(e) => format!("no parseable JSON object found: {}", e),
            None => "output contained no JSON object".to_string(),
        },
        raw_text: raw.to_string(),
    })
}

/// Returns the content of the first markdown code fence, if any.
///
/// Handles both ```` ```json ```` and bare ```` ``` ```` fences.
fn strip_code_fence(raw: &str) -> Option<String> {
    let open = raw.find("```")?;
    let after_open = &raw[open + 3..];
    // Skip the language tag (e.g. "json") up to the end of the fence line
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim().to_string())
}

/// Extracts the first balanced `{...}` substring, respecting string literals.
fn extract_balanced_object(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(raw[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
