//! Name-based deliverability classification.
//!
//! Given a lowercased candidate label from the geocoder, decide whether
//! it names a serviced zone. Three rules, tried per label in the
//! directory's match order; the first label that satisfies any rule
//! wins:
//!
//!   1. the candidate equals the label,
//!   2. the candidate starts with the label followed by a space or a
//!      comma ("kololo hill, kampala" matches "kololo"),
//!   3. the candidate's first whitespace token equals the label.
//!
//! Rules 2 and 3 deliberately trade precision for recall: a suburb
//! named "Kololo Heights" outside the real Kololo would still match.
//! Matching is plain string comparison only; no edit distance, no
//! normalization beyond the caller's lowercasing.

use std::fmt;

use serde::Serialize;

use crate::zones::{DeliveryZone, ZoneDirectory};

// ─── Types ──────────────────────────────────────────────────────────────────

/// Which rule produced a match. Rendered in suggestion output and
/// carried on serialized match reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    Prefix,
    FirstToken,
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchRule::Exact => "exact",
            MatchRule::Prefix => "prefix",
            MatchRule::FirstToken => "first-token",
        };
        f.write_str(label)
    }
}

/// A successful classification.
#[derive(Debug, Clone, Copy)]
pub struct ZoneMatch<'a> {
    pub zone: &'a DeliveryZone,
    pub rule: MatchRule,
}

// ─── Matching ───────────────────────────────────────────────────────────────

/// Match `candidate` against every zone name and alias in directory
/// order. `candidate` must already be trimmed and lowercased; labels in
/// the directory are stored lowercase by construction.
pub fn match_zone<'a>(directory: &'a ZoneDirectory, candidate: &str) -> Option<ZoneMatch<'a>> {
    if candidate.is_empty() {
        return None;
    }
    for (label, idx) in directory.match_keys() {
        if let Some(rule) = matches_label(candidate, label) {
            return Some(ZoneMatch {
                zone: directory.zone(*idx),
                rule,
            });
        }
    }
    None
}

fn matches_label(candidate: &str, label: &str) -> Option<MatchRule> {
    if candidate == label {
        return Some(MatchRule::Exact);
    }
    if let Some(rest) = candidate.strip_prefix(label) {
        if rest.starts_with(' ') || rest.starts_with(',') {
            return Some(MatchRule::Prefix);
        }
    }
    if candidate.split_whitespace().next() == Some(label) {
        return Some(MatchRule::FirstToken);
    }
    None
}

// ─── Tests ──────────────────────────────────────────────────────────────────
