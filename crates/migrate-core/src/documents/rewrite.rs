//! Asset-id rewriting inside document JSON.
//!
//! All `prev_id` patterns are compiled into one leftmost-longest
//! Aho-Corasick automaton, so every substitution in a pass happens
//! simultaneously and non-overlapping; sequential per-mapping replaces
//! would let one mapping's output feed another's input.
//!
//! Two passes: a textual pass over the serialized document (catches ids
//! in any nested field without knowing the schema), then a structural
//! walk over string values of the re-parsed result.

use crate::assets::mapper::IdMapping;
use crate::error::Result;
use aho_corasick::{AhoCorasick, MatchKind};
use serde_json::Value;
use tracing::{debug, warn};

/// Result of rewriting one document.
#[derive(Debug)]
pub struct RewriteOutcome {
    pub document: Value,
    /// Total pattern occurrences replaced across both passes.
    pub replacements: usize,
}

/// Compiled rewriter for one mapping table.
pub struct AssetRewriter {
    automaton: Option<AhoCorasick>,
    destination_ids: Vec<String>,
}

impl AssetRewriter {
    /// Compile a rewriter from a mapping table.
    ///
    /// Mappings whose source id appears as a substring of any destination
    /// id are dropped: the second pass would otherwise re-match inside
    /// already substituted text. No-op mappings are dropped silently.
    pub fn new(mappings: &[IdMapping]) -> Result<Self> {
        let all_destinations: Vec<&str> = mappings.iter().map(|m| m.id.as_str()).collect();

        let mut patterns = Vec::new();
        let mut destination_ids = Vec::new();
        for mapping in mappings {
            if mapping.prev_id.is_empty() || mapping.prev_id == mapping.id {
                continue;
            }
            if all_destinations
                .iter()
                .any(|dest| dest.contains(mapping.prev_id.as_str()))
            {
                warn!(
                    prev_id = %mapping.prev_id,
                    "skipping mapping whose source id is a substring of a destination id"
                );
                continue;
            }
            patterns.push(mapping.prev_id.clone());
            destination_ids.push(mapping.id.clone());
        }

        let automaton = if patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&patterns)
                    .map_err(|e| crate::error::MigrateError::Other(format!(
                        "failed to compile id patterns: {e}"
                    )))?,
            )
        };

        Ok(Self {
            automaton,
            destination_ids,
        })
    }

    /// Number of active mappings after filtering.
    pub fn len(&self) -> usize {
        self.destination_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destination_ids.is_empty()
    }

    /// Rewrite every source asset id in a document.
    ///
    /// Errors only on serialization failure; a document containing no
    /// mapped ids passes through unchanged with a zero count.
    pub fn rewrite(&self, document: &Value) -> Result<RewriteOutcome> {
        let Some(automaton) = &self.automaton else {
            return Ok(RewriteOutcome {
                document: document.clone(),
                replacements: 0,
            });
        };

        // Textual pass over the serialized form.
        let serialized = serde_json::to_string(document)?;
        let mut replacements = automaton.find_iter(&serialized).count();
        let mut parsed: Value = if replacements > 0 {
            let replaced = automaton.replace_all(&serialized, &self.destination_ids);
            serde_json::from_str(&replaced)?
        } else {
            document.clone()
        };

        // Structural pass over string values.
        replacements += self.rewrite_value(&mut parsed);

        debug!(replacements, "rewrote asset ids in document");
        Ok(RewriteOutcome {
            document: parsed,
            replacements,
        })
    }

    /// Replace patterns in every string value, returning the match count.
    fn rewrite_value(&self, value: &mut Value) -> usize {
        let Some(automaton) = &self.automaton else {
            return 0;
        };
        match value {
            Value::String(s) => {
                let count = automaton.find_iter(s.as_str()).count();
                if count > 0 {
                    *s = automaton.replace_all(s, &self.destination_ids);
                }
                count
            }
            Value::Array(items) => items.iter_mut().map(|v| self.rewrite_value(v)).sum(),
            Value::Object(map) => map.values_mut().map(|v| self.rewrite_value(v)).sum(),
            _ => 0,
        }
    }
}
