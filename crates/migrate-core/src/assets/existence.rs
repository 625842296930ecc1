//! Destination existence check.
//!
//! Answers "has every source asset already been uploaded?" so re-runs can
//! skip the upload step. Matching uses the same normalized filename key as
//! the ID mapper; destination ids differ from source ids by construction,
//! so identity can only travel through the filename.

use crate::assets::filename::remote_key;
use crate::assets::inventory::Asset;
use std::collections::HashSet;
use tracing::debug;

/// Whether every source asset has a destination counterpart.
///
/// False when the destination inventory is empty, which is also what the
/// caller sees when the destination could not be reached: an unknown
/// inventory is treated as an empty one, biasing toward re-doing work
/// over skipping it.
pub fn all_exist_at_destination(source: &[Asset], destination: &[Asset]) -> bool {
    if destination.is_empty() {
        return false;
    }

    let destination_keys: HashSet<String> = destination
        .iter()
        .map(|asset| remote_key(&asset.filename))
        .collect();

    source.iter().all(|asset| {
        if asset.filename.is_empty() {
            return false;
        }
        let present = destination_keys.contains(&remote_key(&asset.filename));
        if !present {
            debug!(
                filename = %asset.filename,
                id = %asset.id,
                "asset missing at destination"
            );
        }
        present
    })
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
    fn test_all_present_under_renamed_forms() {
        let source = vec![asset("s1", "Café.PNG"), asset("s2", "hero image.jpg")];
        // Destination re-minted ids and normalized names on upload.
        let destination = vec![asset("d1", "cafe.png"), asset("d2", "hero-image.webp")];
        assert!(all_exist_at_destination(&source, &destination));
    }

    #[test]
    fn test_missing_asset_fails_the_check() {
        let source = vec![asset("s1", "one.png"), asset("s2", "two.png")];
        let destination = vec![asset("d1", "one.png")];
        assert!(!all_exist_at_destination(&source, &destination));
    }

    #[test]
    fn test_empty_destination_is_never_satisfied() {
        let source = vec![asset("s1", "one.png")];
        assert!(!all_exist_at_destination(&source, &[]));
    }
}
