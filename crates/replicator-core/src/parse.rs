//! Decision document parsing.
//!
//! A text-producing decision provider answers with a JSON document, ideally
//! of this shape:
//!
//! ```json
//! {
//!   "strategy": "Stockpile metal before replicating",
//!   "priority": "resource_gathering",
//!   "actions": [
//!     { "kind": "harvest", "parameters": { "body_id": "...", "duration": 10 },
//!       "reasoning": "Terra is right here" }
//!   ]
//! }
//! ```
//!
//! This module turns that text into a validated [`Decision`]. Malformed
//! parameters, unknown kinds, out-of-range harvest durations and blank
//! names are rejected here, at the provider boundary, so nothing untyped
//! reaches the action executor. [`parse_decision_or_wait`] never fails: it
//! falls back to a single wait.

use replicator_types::{ActionKind, ActionProposal, BodyId, Position, Priority, ProbeAction};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::decision::Decision;

/// Why a decision document was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No parse strategy produced a decision document.
    #[error("not a decision document: {snippet}")]
    NotJson {
        /// The start of the offending text.
        snippet: String,
    },

    /// The document lists no actions.
    #[error("decision contains no actions")]
    NoActions,

    /// An action names a kind that does not exist.
    #[error("action {index}: unknown kind {kind:?}")]
    UnknownKind {
        /// Position of the action in the list.
        index: usize,
        /// The kind as written.
        kind: String,
    },

    /// The priority is not one of the four categories.
    #[error("unknown priority {priority:?}")]
    UnknownPriority {
        /// The priority as written.
        priority: String,
    },

    /// An action's parameters are missing or invalid.
    #[error("action {index} ({kind}): {message}")]
    InvalidParameters {
        /// Position of the action in the list.
        index: usize,
        /// The action kind.
        kind: &'static str,
        /// What is wrong.
        message: String,
    },
}

/// Longest snippet of raw text quoted in a [`ParseError::NotJson`].
const SNIPPET_CHARS: usize = 80;

/// The document as written, before validation.
#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    actions: Vec<RawAction>,
}

/// One action as written.
#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(alias = "action", alias = "action_type", alias = "type")]
    kind: String,
    #[serde(default)]
    parameters: serde_json::Value,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Parse a decision document.
///
/// Tries, in order: the text as-is, the body of a markdown code block, and
/// each of those with trailing commas removed. Harvest durations must lie
/// in `1..=max_harvest_duration`.
///
/// # Errors
///
/// Returns the first [`ParseError`] met once a document has been found, or
/// [`ParseError::NotJson`] if none of the strategies yields one.
pub fn parse_decision(raw: &str, max_harvest_duration: u32) -> Result<Decision, ParseError> {
    let document = extract_document(raw).ok_or_else(|| ParseError::NotJson {
        snippet: raw.trim().chars().take(SNIPPET_CHARS).collect(),
    })?;
    convert(document, max_harvest_duration)
}

/// Parse a decision document, falling back to a single wait.
pub fn parse_decision_or_wait(raw: &str, max_harvest_duration: u32) -> Decision {
    match parse_decision(raw, max_harvest_duration) {
        Ok(decision) => decision,
        Err(e) => {
            warn!(error = %e, "failed to parse decision, waiting instead");
            Decision::wait(format!("Unparseable decision: {e}"))
        }
    }
}

fn extract_document(raw: &str) -> Option<RawDecision> {
    let trimmed = raw.trim();
    let block = extract_json_from_codeblock(trimmed);

    let candidates = [Some(trimmed), block];
    candidates
        .iter()
        .flatten()
        .find_map(|text| serde_json::from_str(text).ok())
        .or_else(|| {
            candidates
                .iter()
                .flatten()
                .find_map(|text| serde_json::from_str(&strip_trailing_commas(text)).ok())
        })
}

fn convert(raw: RawDecision, max_harvest_duration: u32) -> Result<Decision, ParseError> {
    if raw.actions.is_empty() {
        return Err(ParseError::NoActions);
    }

    let priority = match raw.priority.as_deref().map(str::trim) {
        None | Some("") => Priority::Survival,
        Some(text) => parse_priority(text)?,
    };

    let actions = raw
        .actions
        .into_iter()
        .enumerate()
        .map(|(index, action)| {
            let kind = parse_kind(index, &action.kind)?;
            let parsed = build_action(index, kind, &action.parameters, max_harvest_duration)?;
            Ok(ActionProposal::new(parsed, action.reasoning.unwrap_or_default()))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(Decision {
        strategy: raw.strategy.unwrap_or_default(),
        priority,
        actions,
    })
}

fn parse_priority(text: &str) -> Result<Priority, ParseError> {
    match normalize(text).as_str() {
        "survival" => Ok(Priority::Survival),
        "expansion" => Ok(Priority::Expansion),
        "exploration" => Ok(Priority::Exploration),
        "resourcegathering" | "gathering" => Ok(Priority::ResourceGathering),
        _ => Err(ParseError::UnknownPriority {
            priority: text.to_owned(),
        }),
    }
}

fn parse_kind(index: usize, text: &str) -> Result<ActionKind, ParseError> {
    match normalize(text).as_str() {
        "travel" | "move" => Ok(ActionKind::Travel),
        "scan" => Ok(ActionKind::Scan),
        "harvest" | "mine" => Ok(ActionKind::Harvest),
        "manufacture" | "replicate" => Ok(ActionKind::Manufacture),
        "wait" | "idle" | "noaction" => Ok(ActionKind::Wait),
        "explore" => Ok(ActionKind::Explore),
        _ => Err(ParseError::UnknownKind {
            index,
            kind: text.to_owned(),
        }),
    }
}

/// Lowercase and drop separators, so `Resource_Gathering` matches
/// `resourcegathering`.
fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn build_action(
    index: usize,
    kind: ActionKind,
    params: &serde_json::Value,
    max_harvest_duration: u32,
) -> Result<ProbeAction, ParseError> {
    let invalid = |message: String| ParseError::InvalidParameters {
        index,
        kind: kind.as_str(),
        message,
    };

    match kind {
        ActionKind::Travel => {
            let target = params.get("target").unwrap_or(params);
            let position: Position = serde_json::from_value(target.clone())
                .map_err(|e| invalid(format!("invalid target: {e}")))?;
            if !position.is_finite() {
                return Err(invalid(String::from("target coordinates must be finite")));
            }
            Ok(ProbeAction::Travel { target: position })
        }
        ActionKind::Scan => {
            let body_id = parse_body_id(params).map_err(invalid)?;
            Ok(ProbeAction::Scan { body_id })
        }
        ActionKind::Harvest => {
            let body_id = parse_body_id(params).map_err(invalid)?;
            let duration = params
                .get("duration")
                .and_then(serde_json::Value::as_u64)
                .ok_or_else(|| invalid(String::from("duration must be a whole number")))?;
            let duration = u32::try_from(duration)
                .ok()
                .filter(|d| (1..=max_harvest_duration).contains(d))
                .ok_or_else(|| {
                    invalid(format!(
                        "duration {duration} outside 1..={max_harvest_duration}"
                    ))
                })?;
            Ok(ProbeAction::Harvest { body_id, duration })
        }
        ActionKind::Manufacture => {
            let name = params
                .get("name")
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| invalid(String::from("name must be a non-empty string")))?;
            Ok(ProbeAction::Manufacture {
                name: name.to_owned(),
            })
        }
        ActionKind::Wait => Ok(ProbeAction::Wait),
        ActionKind::Explore => Ok(ProbeAction::Explore),
    }
}

fn parse_body_id(params: &serde_json::Value) -> Result<BodyId, String> {
    let text = params
        .get("body_id")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| String::from("body_id must be a string"))?;
    Uuid::parse_str(text)
        .map(BodyId::from)
        .map_err(|e| format!("invalid body_id: {e}"))
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = text.get(fence.checked_add(3)?..)?;
    // Skip the info string (e.g. `json`) up to the end of the line.
    let body_start = after_fence.find('\n').and_then(|nl| nl.checked_add(1))?;
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ',' {
            let rest = chars.clone().find(|next| !next.is_whitespace());
            if matches!(rest, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}
