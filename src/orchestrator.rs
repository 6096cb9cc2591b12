use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::oracle::{normalize_suggestion, NamePartial, NameRequest, NamingOracle, OracleSession};
use crate::registry::{lock, RecordId, RecordStatus, SharedRegistry};

/// Reported when a record yields nothing usable at all.
pub const NO_NAME_GENERATED: &str = "Could not generate a name.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("a suggestion round is already in flight")]
    Busy,
}

/// Counts from one rename pass, for the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameOutcome {
    pub renamed: usize,
    pub failed: usize,
}

/// Drives the two workflow rounds against a shared [`FileRegistry`].
///
/// The suggestion round fans out one oracle request per record and applies
/// completions itself, one at a time, so each record is written by exactly
/// one task and the registry sees no concurrent writers. The rename round is
/// a sequential walk on the calling thread.
pub struct Orchestrator {
    oracle: Arc<dyn NamingOracle>,
    in_flight: AtomicBool,
}

impl Orchestrator {
    pub fn new(oracle: Arc<dyn NamingOracle>) -> Self {
        Self {
            oracle,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Runs one suggestion round over every record in the registry.
    ///
    /// Rejected with [`RoundError::Busy`] while another round is in flight;
    /// an empty registry is a no-op. `on_progress` fires once per completed
    /// record with `(done, total)`. Returns only after every per-record task
    /// has finished.
    pub async fn run_suggestion_round<F>(
        &self,
        registry: &SharedRegistry,
        mut on_progress: F,
    ) -> Result<(), RoundError>
    where
        F: FnMut(usize, usize) + Send,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("suggestion round rejected, one already in flight");
            return Err(RoundError::Busy);
        }

        let work: Vec<(RecordId, String, String)> = {
            let mut reg = lock(registry);
            let ids: Vec<RecordId> = reg.list_all().iter().map(|r| r.id).collect();
            for &id in &ids {
                // A new round supersedes any earlier result for the record.
                let _ = reg.update(id, |r| {
                    r.suggested_name = None;
                    r.status = RecordStatus::Pending;
                });
            }
            reg.list_all()
                .iter()
                .map(|r| (r.id, r.original_name.clone(), r.content.clone()))
                .collect()
        };

        if work.is_empty() {
            self.in_flight.store(false, Ordering::SeqCst);
            return Ok(());
        }

        let total = work.len();
        info!(records = total, "starting suggestion round");

        let mut tasks = JoinSet::new();
        for (id, original_name, content) in work {
            // One fresh session per request; the oracle contract forbids
            // sharing a session across concurrent generations.
            let session = self.oracle.new_session();
            tasks.spawn(async move {
                let outcome = suggest_one(session, original_name, content).await;
                (id, outcome)
            });
        }

        let mut done = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let (id, outcome) = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "suggestion task aborted");
                    done += 1;
                    on_progress(done, total);
                    continue;
                }
            };
            {
                let mut reg = lock(registry);
                let applied = match outcome {
                    Ok(name) => {
                        debug!(record = %id, suggestion = %name, "suggestion succeeded");
                        reg.update(id, |r| {
                            r.suggested_name = Some(name);
                            r.status = RecordStatus::Suggested;
                        })
                    }
                    Err(message) => {
                        debug!(record = %id, error = %message, "suggestion failed");
                        reg.update(id, |r| {
                            r.suggested_name = None;
                            r.status = RecordStatus::SuggestionFailed(message);
                        })
                    }
                };
                if let Err(e) = applied {
                    error!(error = %e, "completion for unknown record dropped");
                }
            }
            done += 1;
            on_progress(done, total);
        }

        info!(records = total, "suggestion round complete");
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Sequential best-effort rename pass over the registry, in registry
    /// order. Only records currently in `Suggested` are touched; one failure
    /// marks that record and the pass moves on.
    pub fn run_rename_round(&self, registry: &SharedRegistry, dir: &Path) -> RenameOutcome {
        let ids: Vec<RecordId> = lock(registry).list_all().iter().map(|r| r.id).collect();
        let mut outcome = RenameOutcome::default();

        for id in ids {
            let pair = {
                let reg = lock(registry);
                match reg.get(id) {
                    Ok(record) if record.rename_eligible() => record
                        .suggested_name
                        .clone()
                        .map(|to| (record.original_name.clone(), to)),
                    _ => None,
                }
            };
            let Some((from, to)) = pair else { continue };

            let source = dir.join(&from);
            let target = dir.join(&to);
            let result = if to != from && target.exists() {
                Err(format!("target already exists: {}", to))
            } else {
                std::fs::rename(&source, &target).map_err(|e| e.to_string())
            };

            let mut reg = lock(registry);
            match result {
                Ok(()) => {
                    info!(from = %from, to = %to, "renamed");
                    let _ = reg.update(id, |r| {
                        r.original_name = to.clone();
                        r.status = RecordStatus::Renamed;
                    });
                    outcome.renamed += 1;
                }
                Err(reason) => {
                    warn!(from = %from, to = %to, error = %reason, "rename failed");
                    let _ = reg.update(id, |r| {
                        r.status = RecordStatus::RenameFailed(reason.clone());
                    });
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}

/// Consumes one oracle session to completion and reduces its partial stream
/// to a single usable name or an error message. Never panics; every failure
/// is folded into the returned `Err`.
async fn suggest_one(
    session: Box<dyn OracleSession>,
    original_name: String,
    content: String,
) -> Result<String, String> {
    let request = NameRequest {
        original_name,
        content,
    };
    let mut stream = match session.generate(request).await {
        Ok(stream) => stream,
        Err(e) => return Err(e.to_string()),
    };

    // Keep only the last, most complete partial.
    let mut last: Option<NamePartial> = None;
    while let Some(item) = stream.next().await {
        match item {
            Ok(partial) => last = Some(partial),
            Err(e) => return Err(e.to_string()),
        }
    }

    let Some(raw) = last.and_then(|p| p.new_name) else {
        return Err(NO_NAME_GENERATED.to_string());
    };
    normalize_suggestion(&raw).ok_or_else(|| format!("unusable name suggested: {:?}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleError, PartialStream};
    use crate::registry::{shared, FileRegistry};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Semaphore;

    #[derive(Clone)]
    enum Script {
        Name(&'static str),
        DraftThenName(&'static str, &'static str),
        Fail(&'static str),
        EmptyStream,
    }

    struct StubOracle {
        scripts: HashMap<String, Script>,
        /// Sessions block here until the test releases them.
        gate: Option<Arc<Semaphore>>,
        /// Sessions add a permit here the moment they start.
        started: Arc<Semaphore>,
    }

    impl StubOracle {
        fn new(scripts: impl IntoIterator<Item = (&'static str, Script)>) -> Self {
            Self {
                scripts: scripts
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                gate: None,
                started: Arc::new(Semaphore::new(0)),
            }
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    impl NamingOracle for StubOracle {
        fn new_session(&self) -> Box<dyn OracleSession> {
            Box::new(StubSession {
                scripts: self.scripts.clone(),
                gate: self.gate.clone(),
                started: Arc::clone(&self.started),
            })
        }
    }

    struct StubSession {
        scripts: HashMap<String, Script>,
        gate: Option<Arc<Semaphore>>,
        started: Arc<Semaphore>,
    }

    #[async_trait]
    impl OracleSession for StubSession {
        async fn generate(
            self: Box<Self>,
            request: NameRequest,
        ) -> Result<PartialStream, OracleError> {
            self.started.add_permits(1);
            if let Some(gate) = &self.gate {
                let permit = gate.acquire().await.expect("gate closed");
                permit.forget();
            }
            let script = self
                .scripts
                .get(&request.original_name)
                .cloned()
                .unwrap_or(Script::EmptyStream);
            let items: Vec<Result<NamePartial, OracleError>> = match script {
                Script::Name(name) => vec![Ok(NamePartial {
                    new_name: Some(name.to_string()),
                })],
                Script::DraftThenName(draft, name) => vec![
                    Ok(NamePartial { new_name: None }),
                    Ok(NamePartial {
                        new_name: Some(draft.to_string()),
                    }),
                    Ok(NamePartial {
                        new_name: Some(name.to_string()),
                    }),
                ],
                Script::Fail(message) => vec![Err(OracleError::Request(message.to_string()))],
                Script::EmptyStream => vec![],
            };
            Ok(Box::pin(futures_util::stream::iter(items)))
        }
    }

    fn registry_with(names: &[&str]) -> SharedRegistry {
        let mut reg = FileRegistry::new();
        for name in names {
            reg.register(*name, format!("contents of {}", name));
        }
        shared(reg)
    }

    #[tokio::test]
    async fn round_applies_success_failure_and_empty_stream() {
        let oracle = Arc::new(StubOracle::new([
            ("a.txt", Script::Name("q3_budget_review.txt")),
            ("b.txt", Script::Fail("model unavailable")),
            ("c.txt", Script::EmptyStream),
        ]));
        let orchestrator = Orchestrator::new(oracle);
        let registry = registry_with(&["a.txt", "b.txt", "c.txt"]);

        orchestrator
            .run_suggestion_round(&registry, |_, _| {})
            .await
            .unwrap();

        let reg = lock(&registry);
        let records = reg.list_all();
        assert_eq!(records[0].status, RecordStatus::Suggested);
        assert_eq!(
            records[0].suggested_name.as_deref(),
            Some("q3_budget_review.txt")
        );
        assert!(matches!(
            &records[1].status,
            RecordStatus::SuggestionFailed(msg) if msg.contains("model unavailable")
        ));
        assert!(records[1].suggested_name.is_none());
        assert_eq!(
            records[2].status,
            RecordStatus::SuggestionFailed(NO_NAME_GENERATED.to_string())
        );
    }

    #[tokio::test]
    async fn no_record_remains_pending_after_round() {
        let oracle = Arc::new(StubOracle::new([
            ("a.txt", Script::Name("alpha.txt")),
            ("b.txt", Script::EmptyStream),
        ]));
        let orchestrator = Orchestrator::new(oracle);
        let registry = registry_with(&["a.txt", "b.txt"]);

        orchestrator
            .run_suggestion_round(&registry, |_, _| {})
            .await
            .unwrap();

        let reg = lock(&registry);
        assert!(reg
            .list_all()
            .iter()
            .all(|r| r.status != RecordStatus::Pending));
    }

    #[tokio::test]
    async fn only_last_partial_is_applied() {
        let oracle = Arc::new(StubOracle::new([(
            "a.txt",
            Script::DraftThenName("draft.txt", "final_report.txt"),
        )]));
        let orchestrator = Orchestrator::new(oracle);
        let registry = registry_with(&["a.txt"]);

        orchestrator
            .run_suggestion_round(&registry, |_, _| {})
            .await
            .unwrap();

        let reg = lock(&registry);
        assert_eq!(
            reg.list_all()[0].suggested_name.as_deref(),
            Some("final_report.txt")
        );
    }

    #[tokio::test]
    async fn empty_registry_is_a_noop() {
        let oracle = Arc::new(StubOracle::new([]));
        let orchestrator = Orchestrator::new(oracle);
        let registry = shared(FileRegistry::new());

        let mut calls = 0usize;
        orchestrator
            .run_suggestion_round(&registry, |_, _| calls += 1)
            .await
            .unwrap();
        assert_eq!(calls, 0);
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn concurrent_round_is_rejected_without_mutation() {
        let gate = Arc::new(Semaphore::new(0));
        let oracle = Arc::new(
            StubOracle::new([("a.txt", Script::Name("alpha.txt"))]).gated(Arc::clone(&gate)),
        );
        let started = Arc::clone(&oracle.started);
        let orchestrator = Arc::new(Orchestrator::new(oracle));
        let registry = registry_with(&["a.txt"]);

        let first = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            let registry = Arc::clone(&registry);
            async move { orchestrator.run_suggestion_round(&registry, |_, _| {}).await }
        });

        // Wait until the in-flight task has actually reached the oracle.
        started.acquire().await.unwrap().forget();
        assert!(orchestrator.is_busy());

        let snapshot: Vec<_> = lock(&registry).list_all().to_vec();
        let second = orchestrator.run_suggestion_round(&registry, |_, _| {}).await;
        assert_eq!(second, Err(RoundError::Busy));
        assert_eq!(lock(&registry).list_all(), snapshot.as_slice());

        gate.add_permits(1);
        first.await.unwrap().unwrap();
        assert!(!orchestrator.is_busy());
        assert_eq!(
            lock(&registry).list_all()[0].status,
            RecordStatus::Suggested
        );
    }

    #[tokio::test]
    async fn progress_fires_once_per_record() {
        let oracle = Arc::new(StubOracle::new([
            ("a.txt", Script::Name("alpha.txt")),
            ("b.txt", Script::Name("beta.txt")),
            ("c.txt", Script::Fail("boom")),
        ]));
        let orchestrator = Orchestrator::new(oracle);
        let registry = registry_with(&["a.txt", "b.txt", "c.txt"]);

        let mut seen = Vec::new();
        orchestrator
            .run_suggestion_round(&registry, |done, total| seen.push((done, total)))
            .await
            .unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn later_round_overwrites_earlier_results() {
        let registry = registry_with(&["a.txt"]);
        let first = Orchestrator::new(Arc::new(StubOracle::new([(
            "a.txt",
            Script::Fail("offline"),
        )])));
        first
            .run_suggestion_round(&registry, |_, _| {})
            .await
            .unwrap();
        assert!(matches!(
            lock(&registry).list_all()[0].status,
            RecordStatus::SuggestionFailed(_)
        ));

        let second = Orchestrator::new(Arc::new(StubOracle::new([(
            "a.txt",
            Script::Name("alpha.txt"),
        )])));
        second
            .run_suggestion_round(&registry, |_, _| {})
            .await
            .unwrap();
        let reg = lock(&registry);
        assert_eq!(reg.list_all()[0].status, RecordStatus::Suggested);
        assert_eq!(reg.list_all()[0].suggested_name.as_deref(), Some("alpha.txt"));
    }

    #[tokio::test]
    async fn unusable_name_is_a_failure() {
        let oracle = Arc::new(StubOracle::new([("a.txt", Script::Name("../up.txt"))]));
        let orchestrator = Orchestrator::new(oracle);
        let registry = registry_with(&["a.txt"]);

        orchestrator
            .run_suggestion_round(&registry, |_, _| {})
            .await
            .unwrap();
        let reg = lock(&registry);
        assert!(matches!(
            &reg.list_all()[0].status,
            RecordStatus::SuggestionFailed(msg) if msg.contains("unusable")
        ));
        assert!(reg.list_all()[0].suggested_name.is_none());
    }
}
