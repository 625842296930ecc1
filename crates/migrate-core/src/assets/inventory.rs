//! Asset inventory types.

use serde::{Deserialize, Serialize};

/// One asset as reported by a repository's asset API.
///
/// The id is opaque and repository-scoped: uploading the same content to
/// another repository mints a different id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub id: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Wire shape of one inventory page.
///
/// The fetch is capped at a flat limit and further pages are not
/// followed, so one page is the whole inventory as far as this system is
/// concerned.
#[derive(Debug, Deserialize)]
pub struct InventoryPage {
    #[serde(default)]
    pub total: u64,
    pub items: Vec<RawInventoryItem>,
}

/// One raw inventory entry before filtering.
///
/// Entries missing an id or filename are dropped rather than failing the
/// whole fetch.
#[derive(Debug, Deserialize)]
pub struct RawInventoryItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl InventoryPage {
    /// Keep only entries with both an id and a filename.
    pub fn into_assets(self) -> Vec<Asset> {
        self.items
            .into_iter()
            .filter_map(|item| match (item.id, item.filename) {
                (Some(id), Some(filename)) if !id.is_empty() && !filename.is_empty() => {
                    Some(Asset {
                        id,
                        filename,
                        url: item.url,
                    })
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_assets_filters_malformed_entries() {
        let page: InventoryPage = serde_json::from_value(serde_json::json!({
            "total": 4,
            "items": [
                { "id": "a1", "filename": "one.png", "url": "https://cdn/one.png" },
                { "id": "a2" },
                { "filename": "orphan.jpg" },
                { "id": "", "filename": "empty-id.jpg" },
            ]
        }))
        .unwrap();

        let assets = page.into_assets();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "a1");
        assert_eq!(assets[0].url.as_deref(), Some("https://cdn/one.png"));
    }

    #[test]
    fn test_page_without_items_fails_to_parse() {
        // The caller treats this parse failure as an empty inventory.
        let result: std::result::Result<InventoryPage, _> =
            serde_json::from_value(serde_json::json!({ "total": 2 }));
        assert!(result.is_err());
    }
}
