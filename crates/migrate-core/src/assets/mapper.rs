//! Source-id to destination-id mapping.
//!
//! When the upload step ran in this session its responses pair ids
//! directly. When it did not (fresh process, re-run against an already
//! populated destination), the pairing is reconstructed by cross-matching
//! the two inventories on normalized base filename, with extension-aware
//! tie-breaking for the common convert-to-webp-on-upload case.

use crate::assets::filename::{normalize, split_extension};
use crate::assets::inventory::Asset;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// One source-id to destination-id association.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdMapping {
    /// Source repository asset id.
    #[serde(rename = "prevID")]
    pub prev_id: String,
    /// Destination repository asset id.
    pub id: String,
}

/// Diagnostics for one mapping build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingStats {
    pub total_source: usize,
    pub total_destination: usize,
    pub matched: usize,
    /// Matches where either bucket held more than one candidate. A signal
    /// for diagnostics, not an error.
    pub ambiguous: usize,
}

/// The mapping table plus its build diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingTable {
    pub mappings: Vec<IdMapping>,
    pub stats: MappingStats,
}

#[derive(Debug)]
struct BucketEntry<'a> {
    id: &'a str,
    ext: String,
    filename: &'a str,
}

/// Build a mapping table from two inventories.
///
/// Deterministic given stable inventory order: source assets are visited
/// in input order and each lands in exactly one bucket (keyed by its own
/// filename), so `prev_id` values cannot repeat. A source asset whose
/// normalized base name has no destination bucket produces no entry; its
/// id stays behind in documents as a dangling reference.
pub fn build_mapping(source: &[Asset], destination: &[Asset]) -> MappingTable {
    let mut dest_buckets: HashMap<String, Vec<BucketEntry<'_>>> = HashMap::new();
    for asset in destination {
        let parts = split_extension(&asset.filename);
        dest_buckets
            .entry(normalize(&parts.base))
            .or_default()
            .push(BucketEntry {
                id: &asset.id,
                ext: parts.ext,
                filename: &asset.filename,
            });
    }

    let mut source_bucket_sizes: HashMap<String, usize> = HashMap::new();
    for asset in source {
        let key = normalize(&split_extension(&asset.filename).base);
        *source_bucket_sizes.entry(key).or_insert(0) += 1;
    }

    let mut mappings = Vec::new();
    let mut matched = 0;
    let mut ambiguous = 0;

    for asset in source {
        let parts = split_extension(&asset.filename);
        let key = normalize(&parts.base);
        let Some(candidates) = dest_buckets.get(&key) else {
            debug!(filename = %asset.filename, id = %asset.id, "no destination bucket");
            continue;
        };
        if candidates.is_empty() {
            continue;
        }

        let chosen = choose_candidate(&parts.ext, candidates);

        mappings.push(IdMapping {
            prev_id: asset.id.clone(),
            id: chosen.id.to_string(),
        });
        matched += 1;

        let source_siblings = source_bucket_sizes.get(&key).copied().unwrap_or(1);
        if source_siblings > 1 || candidates.len() > 1 {
            ambiguous += 1;
            warn!(
                key = %key,
                sources = source_siblings,
                destinations = candidates.len(),
                "ambiguous filename match, using {} -> {}",
                asset.filename,
                chosen.filename
            );
        }
    }

    let stats = MappingStats {
        total_source: source.len(),
        total_destination: destination.len(),
        matched,
        ambiguous,
    };
    info!(
        total_source = stats.total_source,
        total_destination = stats.total_destination,
        matched = stats.matched,
        ambiguous = stats.ambiguous,
        "built asset id mapping by filename"
    );

    MappingTable { mappings, stats }
}

/// Tie-break policy: exact extension, then the webp conversion fallback
/// for raster sources, then the first candidate in inventory order.
fn choose_candidate<'a, 'b>(
    source_ext: &str,
    candidates: &'a [BucketEntry<'b>],
) -> &'a BucketEntry<'b> {
    if let Some(exact) = candidates.iter().find(|c| c.ext == source_ext) {
        return exact;
    }
    if matches!(source_ext, "jpg" | "jpeg" | "png") {
        if let Some(webp) = candidates.iter().find(|c| c.ext == "webp") {
            return webp;
        }
    }
    &candidates[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str, filename: &str) -> Asset {
        Asset {
            id: id.into(),
            filename: filename.into(),
            url: None,
        }
    }

    #[test]
    fn test_exact_extension_wins_over_webp() {
        let source = vec![asset("s1", "photo.jpg")];
        let destination = vec![asset("d1", "photo.jpg"), asset("d2", "photo.webp")];

        let table = build_mapping(&source, &destination);
        assert_eq!(
            table.mappings,
            vec![IdMapping {
                prev_id: "s1".into(),
                id: "d1".into()
            }]
        );
    }

    #[test]
    fn test_webp_conversion_fallback() {
        let source = vec![asset("s1", "photo.png")];
        let destination = vec![asset("d1", "photo.webp")];

        let table = build_mapping(&source, &destination);
        assert_eq!(table.mappings[0].id, "d1");
        assert_eq!(table.stats.matched, 1);
    }

    #[test]
    fn test_non_raster_falls_back_to_first_candidate() {
        let source = vec![asset("s1", "manual.pdf")];
        let destination = vec![asset("d1", "manual.txt"), asset("d2", "manual.doc")];

        let table = build_mapping(&source, &destination);
        assert_eq!(table.mappings[0].id, "d1");
        // Two destination candidates for one key.
        assert_eq!(table.stats.ambiguous, 1);
    }

    #[test]
    fn test_unmatched_source_produces_no_entry() {
        let source = vec![asset("s1", "only-here.png")];
        let destination = vec![asset("d1", "unrelated.png")];

        let table = build_mapping(&source, &destination);
        assert!(table.mappings.is_empty());
        assert_eq!(table.stats.total_source, 1);
        assert_eq!(table.stats.matched, 0);
    }

    #[test]
    fn test_normalized_base_names_match_across_drift() {
        let source = vec![asset("s1", "Café Terrace.PNG")];
        let destination = vec![asset("d1", "cafe-terrace.webp")];

        let table = build_mapping(&source, &destination);
        assert_eq!(table.mappings[0].prev_id, "s1");
        assert_eq!(table.mappings[0].id, "d1");
    }

    #[test]
    fn test_deterministic_across_runs() {
        let source = vec![
            asset("s1", "a.jpg"),
            asset("s2", "a.png"),
            asset("s3", "b.pdf"),
        ];
        let destination = vec![
            asset("d1", "a.webp"),
            asset("d2", "a.jpg"),
            asset("d3", "b.pdf"),
        ];

        let first = build_mapping(&source, &destination);
        let second = build_mapping(&source, &destination);
        assert_eq!(first.mappings, second.mappings);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_ambiguity_counted_per_source_entry() {
        // Two sources share the bucket; both map, both flagged.
        let source = vec![asset("s1", "logo.jpg"), asset("s2", "logo.png")];
        let destination = vec![asset("d1", "logo.webp")];

        let table = build_mapping(&source, &destination);
        assert_eq!(table.mappings.len(), 2);
        assert_eq!(table.stats.ambiguous, 2);
        // prev_id unique within the table.
        assert_ne!(table.mappings[0].prev_id, table.mappings[1].prev_id);
    }

    #[test]
    fn test_wire_shape_uses_prev_id_alias() {
        let mapping = IdMapping {
            prev_id: "s1".into(),
            id: "d1".into(),
        };
        let value = serde_json::to_value(&mapping).unwrap();
        assert_eq!(value, serde_json::json!({ "prevID": "s1", "id": "d1" }));
    }
}
