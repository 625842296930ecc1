//! Language reconciliation.
//!
//! Documents created under a language the destination has not configured
//! are rejected by the migration endpoint, so the gap is surfaced ahead
//! of time. Advisory only: nothing here blocks or mutates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One configured repository language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Derived comparison of configured versus used languages.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LanguageReport {
    pub source_languages: Vec<Language>,
    pub destination_languages: Vec<Language>,
    pub document_languages: Vec<String>,
    pub missing_languages: Vec<String>,
    pub instructions: Vec<String>,
}

/// Language codes referenced by documents, in first-seen order.
///
/// A document may carry its code top-level (`lang`), under the alternate
/// `language` field, or nested in `data.lang`.
pub fn detect_document_languages(documents: &[Value]) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    let mut push = |code: Option<&str>, languages: &mut Vec<String>| {
        if let Some(code) = code {
            if !code.is_empty() && !languages.iter().any(|l| l == code) {
                languages.push(code.to_string());
            }
        }
    };

    for doc in documents {
        push(doc.get("lang").and_then(Value::as_str), &mut languages);
        push(doc.get("language").and_then(Value::as_str), &mut languages);
        push(
            doc.get("data")
                .and_then(|data| data.get("lang"))
                .and_then(Value::as_str),
            &mut languages,
        );
    }
    languages
}

/// Compare document languages against the destination configuration.
pub fn reconcile(
    source_languages: Vec<Language>,
    destination_languages: Vec<Language>,
    documents: &[Value],
) -> LanguageReport {
    let document_languages = detect_document_languages(documents);
    let missing_languages: Vec<String> = document_languages
        .iter()
        .filter(|lang| !destination_languages.iter().any(|dest| &dest.id == *lang))
        .cloned()
        .collect();

    let instructions = if missing_languages.is_empty() {
        vec!["All required languages are already configured in the destination repository.".to_string()]
    } else {
        let mut lines = vec![
            "Add the following languages to the destination repository before migrating:"
                .to_string(),
        ];
        for lang in &missing_languages {
            let name = source_languages
                .iter()
                .find(|src| &src.id == lang)
                .map(|src| src.name.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or(lang);
            lines.push(format!("- {lang} ({name})"));
        }
        lines.push("Then save and retry the migration.".to_string());
        lines
    };

    LanguageReport {
        source_languages,
        destination_languages,
        document_languages,
        missing_languages,
        instructions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lang(id: &str, name: &str) -> Language {
        Language {
            id: id.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_detects_languages_in_all_locations() {
        let docs = vec![
            json!({ "lang": "en-us" }),
            json!({ "language": "fr-fr" }),
            json!({ "data": { "lang": "de-de" } }),
            json!({ "lang": "en-us" }),
        ];
        assert_eq!(
            detect_document_languages(&docs),
            vec!["en-us", "fr-fr", "de-de"]
        );
    }

    #[test]
    fn test_missing_language_detected() {
        let report = reconcile(
            vec![lang("en-us", "English"), lang("fr-fr", "French")],
            vec![lang("en-us", "English")],
            &[json!({ "lang": "en-us" }), json!({ "lang": "fr-fr" })],
        );
        assert_eq!(report.missing_languages, vec!["fr-fr"]);
        assert!(report
            .instructions
            .iter()
            .any(|line| line.contains("fr-fr (French)")));
    }

    #[test]
    fn test_no_gap_produces_all_clear() {
        let report = reconcile(
            vec![lang("en-us", "English")],
            vec![lang("en-us", "English")],
            &[json!({ "lang": "en-us" })],
        );
        assert!(report.missing_languages.is_empty());
        assert_eq!(report.instructions.len(), 1);
    }
}
