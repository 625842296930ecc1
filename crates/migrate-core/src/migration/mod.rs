//! Sequential document migration.
//!
//! Documents are rewritten, validated, and submitted one at a time with a
//! pause between items. A rate-limited submission gets a single delayed
//! retry; any other rejection is counted and the run continues.

use crate::assets::mapper::IdMapping;
use crate::documents::{self, AssetRewriter};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of submitting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted by the destination, with its new id when the response
    /// carried one.
    Accepted { id: Option<String> },
    /// Throttled; the caller may retry after backing off.
    RateLimited { retry_after_secs: Option<u64> },
    /// Rejected outright.
    Rejected { status: u16, body: String },
}

/// Destination for migrated documents.
///
/// The production implementation posts to the migration API; tests supply
/// in-memory sinks.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn submit(&self, document: &Value) -> Result<SubmitOutcome>;
}

/// Pacing for one migration run.
///
/// Delays are plain values so tests can run with [`MigrationSchedule::immediate`]
/// instead of real timers.
#[derive(Debug, Clone)]
pub struct MigrationSchedule {
    /// Pause between sequential asset uploads.
    pub upload_delay: Duration,
    /// Pause between sequential document submissions.
    pub document_delay: Duration,
    /// Backoff before retrying a rate-limited submission.
    pub rate_limit_backoff: Duration,
    /// Retries granted per document after a rate limit.
    pub rate_limit_retries: u32,
}

impl Default for MigrationSchedule {
    fn default() -> Self {
        Self {
            upload_delay: crate::config::NetworkConfig::UPLOAD_ITEM_DELAY,
            document_delay: crate::config::NetworkConfig::DOCUMENT_ITEM_DELAY,
            rate_limit_backoff: crate::config::NetworkConfig::RATE_LIMIT_BACKOFF,
            rate_limit_retries: 1,
        }
    }
}

impl MigrationSchedule {
    /// Zero-delay schedule for tests.
    pub fn immediate() -> Self {
        Self {
            upload_delay: Duration::ZERO,
            document_delay: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
            rate_limit_retries: 1,
        }
    }
}

/// Aggregate result of one migration run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MigrationRunResult {
    pub total_documents: usize,
    pub submitted: usize,
    pub failures: usize,
    /// Asset-id substitutions performed across all documents.
    pub replacements: usize,
}

/// Migrate a batch of documents through a sink.
///
/// Partial failure is the expected mode: each document that cannot be
/// validated or submitted is counted and logged, and the run proceeds to
/// the next one.
pub async fn migrate_documents(
    sink: &dyn DocumentSink,
    documents: &[Value],
    mappings: &[IdMapping],
    schedule: &MigrationSchedule,
) -> Result<MigrationRunResult> {
    let rewriter = AssetRewriter::new(mappings)?;
    let mut result = MigrationRunResult {
        total_documents: documents.len(),
        ..Default::default()
    };

    for (index, document) in documents.iter().enumerate() {
        let title = documents::display_title(document, index + 1);

        if !documents::has_required_fields(document) {
            warn!(index = index + 1, title, "document missing id or type, skipped");
            result.failures += 1;
            continue;
        }

        let outcome = match rewriter.rewrite(document) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(index = index + 1, title, error = %e, "document rewrite failed, skipped");
                result.failures += 1;
                continue;
            }
        };
        result.replacements += outcome.replacements;
        let mut payload = outcome.document;
        documents::stamp_title(&mut payload, &title);

        match submit_with_retry(sink, &payload, schedule).await {
            Ok(SubmitOutcome::Accepted { id }) => {
                info!(
                    index = index + 1,
                    title,
                    id = id.as_deref().unwrap_or("?"),
                    replacements = outcome.replacements,
                    "document migrated"
                );
                result.submitted += 1;
            }
            Ok(SubmitOutcome::RateLimited { .. }) => {
                warn!(index = index + 1, title, "document still rate limited, skipped");
                result.failures += 1;
            }
            Ok(SubmitOutcome::Rejected { status, body }) => {
                warn!(index = index + 1, title, status, body, "document rejected");
                result.failures += 1;
            }
            Err(e) => {
                warn!(index = index + 1, title, error = %e, "document submission failed");
                result.failures += 1;
            }
        }

        if index + 1 < documents.len() && !schedule.document_delay.is_zero() {
            tokio::time::sleep(schedule.document_delay).await;
        }
    }

    info!(
        total = result.total_documents,
        submitted = result.submitted,
        failures = result.failures,
        replacements = result.replacements,
        "migration run finished"
    );
    Ok(result)
}

async fn submit_with_retry(
    sink: &dyn DocumentSink,
    payload: &Value,
    schedule: &MigrationSchedule,
) -> Result<SubmitOutcome> {
    let mut outcome = sink.submit(payload).await?;
    let mut retries = schedule.rate_limit_retries;

    while retries > 0 {
        match &outcome {
            SubmitOutcome::RateLimited { retry_after_secs } => {
                let wait = retry_after_secs
                    .map(Duration::from_secs)
                    .unwrap_or(schedule.rate_limit_backoff)
                    .max(schedule.rate_limit_backoff);
                warn!(wait_secs = wait.as_secs(), "rate limited, retrying after backoff");
                if !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }
                outcome = sink.submit(payload).await?;
                retries -= 1;
            }
            _ => break,
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Sink that records payloads and serves scripted outcomes.
    struct ScriptedSink {
        outcomes: Mutex<Vec<SubmitOutcome>>,
        submitted: Mutex<Vec<Value>>,
        calls: AtomicUsize,
    }

    impl ScriptedSink {
        fn accepting() -> Self {
            Self::with_outcomes(Vec::new())
        }

        fn with_outcomes(outcomes: Vec<SubmitOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                submitted: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentSink for ScriptedSink {
        async fn submit(&self, document: &Value) -> Result<SubmitOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.submitted.lock().unwrap().push(document.clone());
            let mut outcomes = self.outcomes.lock().unwrap();
            Ok(if outcomes.is_empty() {
                SubmitOutcome::Accepted { id: None }
            } else {
                outcomes.remove(0)
            })
        }
    }

    fn doc(id: &str) -> Value {
        json!({ "id": id, "type": "page", "image": "src-1" })
    }

    #[tokio::test]
    async fn test_invalid_document_counted_not_fatal() {
        let sink = ScriptedSink::accepting();
        let documents = vec![
            doc("d1"),
            doc("d2"),
            json!({ "id": "d3" }),
            doc("d4"),
            doc("d5"),
        ];

        let result = migrate_documents(&sink, &documents, &[], &MigrationSchedule::immediate())
            .await
            .unwrap();

        assert_eq!(result.total_documents, 5);
        assert_eq!(result.submitted, 4);
        assert_eq!(result.failures, 1);
        assert_eq!(sink.submitted.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unrewritable_document_counted_not_fatal() {
        // A destination id with a quote corrupts the serialized form of
        // any document containing its source id; only that document may
        // fail.
        let sink = ScriptedSink::accepting();
        let clean = |id: &str| json!({ "id": id, "type": "page" });
        let documents = vec![
            clean("d1"),
            clean("d2"),
            json!({ "id": "d3", "type": "page", "image": "src-1" }),
            clean("d4"),
            clean("d5"),
        ];
        let mappings = vec![IdMapping {
            prev_id: "src-1".into(),
            id: "dst\"9".into(),
        }];

        let result = migrate_documents(
            &sink,
            &documents,
            &mappings,
            &MigrationSchedule::immediate(),
        )
        .await
        .unwrap();

        assert_eq!(result.total_documents, 5);
        assert_eq!(result.submitted, 4);
        assert_eq!(result.failures, 1);
        let submitted = sink.submitted.lock().unwrap();
        assert!(submitted.iter().all(|doc| doc["id"] != "d3"));
    }

    #[tokio::test]
    async fn test_rate_limit_retried_once_then_counted_success() {
        let sink = ScriptedSink::with_outcomes(vec![
            SubmitOutcome::RateLimited {
                retry_after_secs: None,
            },
            SubmitOutcome::Accepted {
                id: Some("new-id".into()),
            },
        ]);

        let result = migrate_documents(
            &sink,
            &[doc("d1")],
            &[],
            &MigrationSchedule::immediate(),
        )
        .await
        .unwrap();

        assert_eq!(result.submitted, 1);
        assert_eq!(result.failures, 0);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_counted_as_failure() {
        let sink = ScriptedSink::with_outcomes(vec![
            SubmitOutcome::RateLimited {
                retry_after_secs: None,
            },
            SubmitOutcome::RateLimited {
                retry_after_secs: None,
            },
        ]);

        let result = migrate_documents(
            &sink,
            &[doc("d1")],
            &[],
            &MigrationSchedule::immediate(),
        )
        .await
        .unwrap();

        assert_eq!(result.submitted, 0);
        assert_eq!(result.failures, 1);
        // One attempt plus one retry, no more.
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_payload_carries_rewritten_ids_and_title() {
        let sink = ScriptedSink::accepting();
        let documents = vec![json!({
            "id": "d1",
            "type": "page",
            "image": "src-1",
            "data": { "title": [ { "text": "Home" } ] }
        })];
        let mappings = vec![IdMapping {
            prev_id: "src-1".into(),
            id: "dst-9".into(),
        }];

        let result = migrate_documents(
            &sink,
            &documents,
            &mappings,
            &MigrationSchedule::immediate(),
        )
        .await
        .unwrap();

        assert_eq!(result.replacements, 1);
        let submitted = sink.submitted.lock().unwrap();
        assert_eq!(submitted[0]["image"], "dst-9");
        assert_eq!(submitted[0]["title"], "Home");
    }
}
