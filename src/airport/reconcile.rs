/// Subscription URL reconciliation.
///
/// Compares the live subscribe URL of an airport against every registry entry
/// tagged with that airport, rewrites the stale ones in place, and saves the
/// registry only when something changed. Running it twice with the same URL
/// finds nothing the second time, so there is no second write.
use super::errors::AirportError;
use super::registry::{RegistryDocument, RegistrySink};
use crate::types::RegistryStatus;

/// One registry entry whose URL was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlChange {
    /// Position of the entry in `subscribes`.
    pub index: usize,
    pub old: String,
    pub new: String,
}

/// Result of a successful reconciliation.
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// Changes in discovery (document) order.
    pub changes: Vec<UrlChange>,
    /// Never `Failed`; a failed write is reported as [`UnsavedChanges`].
    pub registry: RegistryStatus,
}

/// The registry was updated in memory but could not be written.
///
/// Carries the computed changes so they can still be reported alongside the error.
#[derive(Debug)]
pub struct UnsavedChanges {
    pub changes: Vec<UrlChange>,
    pub source: AirportError,
}

/// Point every entry tagged `airport` at `live_url`, returning what changed.
///
/// An empty `live_url` is a no-op. Entries with another tag or no tag are
/// never touched, nor are tagged entries without a string `url`. Entries are
/// never added or removed.
#[must_use]
pub fn apply_live_url(airport: &str, live_url: &str, doc: &mut RegistryDocument) -> Vec<UrlChange> {
    if live_url.is_empty() {
        return Vec::new();
    }

    let mut changes = Vec::new();
    for mut reg in doc.registrations_mut() {
        if reg.tag() != Some(airport) {
            continue;
        }
        let Some(old) = reg.url().map(str::to_owned) else {
            tracing::warn!(airport, index = reg.index(), "tagged registry entry has no string url; skipped");
            continue;
        };
        if old != live_url {
            changes.push(UrlChange {
                index: reg.index(),
                old,
                new: live_url.to_owned(),
            });
            reg.set_url(live_url);
        }
    }
    changes
}

/// Reconcile `doc` against `live_url` and persist through `sink` if anything changed.
///
/// With `dry_run` the document is still updated in memory but `sink` is never called.
///
/// # Errors
///
/// Returns [`UnsavedChanges`] when the write fails.
pub fn reconcile<S: RegistrySink>(
    airport: &str,
    live_url: &str,
    doc: &mut RegistryDocument,
    sink: &mut S,
    dry_run: bool,
) -> Result<ReconcileOutcome, UnsavedChanges> {
    let changes = apply_live_url(airport, live_url, doc);

    for change in &changes {
        tracing::info!(airport, index = change.index, old = %change.old, new = %change.new, "subscription url changed");
    }

    let registry = if changes.is_empty() {
        RegistryStatus::Unchanged
    } else if dry_run {
        RegistryStatus::DryRun
    } else {
        if let Err(source) = sink.save(doc) {
            return Err(UnsavedChanges { changes, source });
        }
        RegistryStatus::Saved
    };

    Ok(ReconcileOutcome { changes, registry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct CountingSink {
        saves: usize,
        fail: bool,
    }

    impl RegistrySink for CountingSink {
        fn save(&mut self, _doc: &RegistryDocument) -> Result<(), AirportError> {
            if self.fail {
                return Err(AirportError::Persistence {
                    path: "subscribes.json".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.saves += 1;
            Ok(())
        }
    }

    fn doc(subscribes: serde_json::Value) -> RegistryDocument {
        RegistryDocument::from_value(json!({
            "airports": {"X": {"host": "x.example", "authorization": "t"}},
            "subscribes": subscribes
        }))
        .unwrap()
    }

    fn urls(doc: &RegistryDocument) -> Vec<&str> {
        doc.as_value()["subscribes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["url"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_idempotent() {
        let mut d = doc(json!([{"tag": "X", "url": "old"}]));
        let mut sink = CountingSink::default();

        let first = reconcile("X", "new", &mut d, &mut sink, false).unwrap();
        assert_eq!(
            first.changes,
            vec![UrlChange {
                index: 0,
                old: "old".to_owned(),
                new: "new".to_owned()
            }]
        );
        assert_eq!(first.registry, RegistryStatus::Saved);
        assert_eq!(sink.saves, 1);
        assert_eq!(urls(&d), ["new"]);

        let second = reconcile("X", "new", &mut d, &mut sink, false).unwrap();
        assert!(second.changes.is_empty());
        assert_eq!(second.registry, RegistryStatus::Unchanged);
        assert_eq!(sink.saves, 1);
    }

    #[test]
    fn test_tag_isolation() {
        let mut d = doc(json!([
            {"tag": "Y", "url": "stale"},
            {"url": "stale"},
            {"tag": "X", "url": "stale"}
        ]));
        let mut sink = CountingSink::default();
        let outcome = reconcile("X", "fresh", &mut d, &mut sink, false).unwrap();
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].index, 2);
        assert_eq!(urls(&d), ["stale", "stale", "fresh"]);
    }

    #[test]
    fn test_skips_entries_without_url() {
        let mut d = doc(json!([
            {"tag": "X", "path": "./nodes.txt"},
            {"tag": "X", "url": 42},
            "comment",
            {"tag": "X", "url": "old"}
        ]));
        let mut sink = CountingSink::default();
        let outcome = reconcile("X", "new", &mut d, &mut sink, false).unwrap();
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].index, 3);
        assert_eq!(sink.saves, 1);
        let entries = d.as_value()["subscribes"].as_array().unwrap();
        assert_eq!(entries[0], json!({"tag": "X", "path": "./nodes.txt"}));
        assert_eq!(entries[1], json!({"tag": "X", "url": 42}));
        assert_eq!(entries[3]["url"], "new");
    }

    #[test]
    fn test_empty_live_url_short_circuits() {
        let mut d = doc(json!([{"tag": "X", "url": "old"}]));
        let mut sink = CountingSink::default();
        let outcome = reconcile("X", "", &mut d, &mut sink, false).unwrap();
        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.registry, RegistryStatus::Unchanged);
        assert_eq!(sink.saves, 0);
        assert_eq!(urls(&d), ["old"]);
    }

    #[test]
    fn test_shared_tag_updates_all_with_one_save() {
        let mut d = doc(json!([
            {"tag": "A", "url": "stale-1"},
            {"tag": "B", "url": "other"},
            {"tag": "A", "url": "stale-2"}
        ]));
        let mut sink = CountingSink::default();
        let outcome = reconcile("A", "live", &mut d, &mut sink, false).unwrap();
        let olds: Vec<&str> = outcome.changes.iter().map(|c| c.old.as_str()).collect();
        assert_eq!(olds, ["stale-1", "stale-2"]);
        assert_eq!(sink.saves, 1);
        assert_eq!(urls(&d), ["live", "other", "live"]);
    }

    #[test]
    fn test_dry_run_never_saves() {
        let mut d = doc(json!([{"tag": "X", "url": "old"}]));
        let mut sink = CountingSink::default();
        let outcome = reconcile("X", "new", &mut d, &mut sink, true).unwrap();
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.registry, RegistryStatus::DryRun);
        assert_eq!(sink.saves, 0);
    }

    #[test]
    fn test_save_failure_keeps_changes() {
        let mut d = doc(json!([{"tag": "X", "url": "old"}]));
        let mut sink = CountingSink {
            fail: true,
            ..CountingSink::default()
        };
        let err = reconcile("X", "new", &mut d, &mut sink, false).unwrap_err();
        assert_eq!(err.changes.len(), 1);
        assert!(matches!(err.source, AirportError::Persistence { .. }));
    }
}
