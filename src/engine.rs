//! The validation engine.
//!
//! A run walks a fixed state machine:
//!
//! ```text
//! LOADING -> REGISTERING -> VALIDATING -> GRAPH_CHECKING -> REPORTING -> DONE
//!     \____________\_____________\______________\__________-> ABORTED
//! ```
//!
//! Findings never stop a run. Only a duplicate registry identity, a broken
//! required source or the run timeout move the engine to `ABORTED`, which
//! skips every remaining stage. All state lives in the [`Engine`] value and
//! is rebuilt on every run.
//!
//! Sources are loaded by a bounded pool of worker threads. Their results are
//! funneled through one channel and ordered by source id before the registry
//! is populated, so duplicate detection always sees the same order.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::document::Document;
use crate::error::{EngineError, ParseError, TimeoutError};
use crate::finding::{Category, Finding, Location, Severity};
use crate::graph::DependencyGraph;
use crate::registry::RegistryStore;
use crate::report::{Counts, ValidationReport};
use crate::repository::SourceRepository;
use crate::rules::{evaluate, EvalContext, RuleSet};

pub const DOCUMENT_PARSE: &str = "document.parse";

/// Engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Loading,
    Registering,
    Validating,
    GraphChecking,
    Reporting,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loading => "LOADING",
            Stage::Registering => "REGISTERING",
            Stage::Validating => "VALIDATING",
            Stage::GraphChecking => "GRAPH_CHECKING",
            Stage::Reporting => "REPORTING",
            Stage::Done => "DONE",
            Stage::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Source id of the module registry
    pub modules_source: String,
    /// Source id of the URN registry
    pub urns_source: String,
    /// Overall budget for the run
    pub timeout: Duration,
    /// Loader worker pool size
    pub max_concurrent: usize,
    /// Warnings also fail the gate
    pub strict: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        crate::config::Config::default().engine_options()
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: ValidationReport,
    /// The registry, if the run got far enough to build it
    pub registry: Option<RegistryStore>,
    /// Every stage the engine entered, in order
    pub stages: Vec<Stage>,
}

impl RunOutcome {
    /// The registry for downstream consumers, available only after a passing run.
    pub fn registry_for_scaffolding(&self) -> Option<&RegistryStore> {
        if self.report.pass {
            self.registry.as_ref()
        } else {
            None
        }
    }
}

/// Why a single source could not be loaded.
#[derive(Debug)]
enum LoadFailure {
    Parse(ParseError),
    Unreadable(String),
}

struct Loaded {
    id: String,
    result: Result<Vec<Document>, LoadFailure>,
}

/// Output of the LOADING stage.
#[derive(Default)]
struct LoadedSources {
    documents: Vec<Document>,
    module_documents: Vec<Document>,
    urn_documents: Vec<Document>,
    /// Every source id the run listed, loaded or not
    source_ids: Vec<String>,
}

pub struct Engine {
    repository: Arc<dyn SourceRepository>,
    rules: RuleSet,
    options: EngineOptions,
    stages: Vec<Stage>,
    findings: Vec<Finding>,
    counts: Counts,
    deadline: Instant,
}

impl Engine {
    pub fn new(repository: Arc<dyn SourceRepository>, rules: RuleSet, options: EngineOptions) -> Self {
        Self {
            repository,
            rules,
            options,
            stages: Vec::new(),
            findings: Vec::new(),
            counts: Counts::default(),
            deadline: Instant::now(),
        }
    }

    /// Execute one full validation run.
    pub fn run(mut self) -> RunOutcome {
        self.deadline = Instant::now() + self.options.timeout;

        match self.execute() {
            Ok((report, registry)) => RunOutcome {
                report,
                registry: Some(registry),
                stages: self.stages,
            },
            Err((err, registry)) => {
                let stage = self.current_stage();
                tracing::warn!(stage = %stage, cause = %err, "run aborted");
                self.enter(Stage::Aborted);
                RunOutcome {
                    report: ValidationReport::aborted(
                        stage,
                        &err,
                        std::mem::take(&mut self.findings),
                        self.counts,
                    ),
                    registry,
                    stages: self.stages,
                }
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn execute(
        &mut self,
    ) -> Result<(ValidationReport, RegistryStore), (EngineError, Option<RegistryStore>)> {
        self.enter(Stage::Loading);
        let loaded = self.load().map_err(|err| (err, None))?;
        self.counts.sources = loaded.source_ids.len();
        self.counts.documents = loaded.documents.len();

        self.enter(Stage::Registering);
        self.check_deadline().map_err(|err| (err, None))?;
        let registry = RegistryStore::load(&loaded.module_documents, &loaded.urn_documents)
            .map_err(|err| (EngineError::from(err), None))?;
        self.counts.modules = registry.module_count();
        self.counts.urns = registry.urn_count();
        self.findings.extend(registry.findings().iter().cloned());
        self.findings
            .extend(registry.dangling().iter().map(|dangling| dangling.to_finding()));
        tracing::debug!(
            modules = self.counts.modules,
            urns = self.counts.urns,
            findings = self.findings.len(),
            "registry populated"
        );

        self.enter(Stage::Validating);
        if let Err(err) = self.validate(&loaded, &registry) {
            return Err((err, Some(registry)));
        }

        self.enter(Stage::GraphChecking);
        if let Err(err) = self.check_deadline() {
            return Err((err, Some(registry)));
        }
        let order = self.check_graph(&registry);

        self.enter(Stage::Reporting);
        if let Err(err) = self.check_deadline() {
            return Err((err, Some(registry)));
        }
        let report = ValidationReport::completed(
            std::mem::take(&mut self.findings),
            self.counts,
            order,
            self.options.strict,
        );

        self.enter(Stage::Done);
        tracing::info!(
            pass = report.pass,
            errors = report.summary.errors,
            warnings = report.summary.warnings,
            "run complete"
        );
        Ok((report, registry))
    }

    fn current_stage(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Loading)
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(stage = %stage, "entering stage");
        self.stages.push(stage);
    }

    fn check_deadline(&self) -> Result<(), EngineError> {
        if Instant::now() >= self.deadline {
            let stage = self.current_stage();
            tracing::warn!(stage = %stage, "timeout exceeded");
            return Err(TimeoutError {
                stage,
                limit: self.options.timeout,
            }
            .into());
        }
        Ok(())
    }

    fn is_required(&self, id: &str) -> bool {
        id == self.options.modules_source || id == self.options.urns_source
    }

    // =====================================================================
    // LOADING
    // =====================================================================

    fn load(&mut self) -> Result<LoadedSources, EngineError> {
        let mut ids = self
            .repository
            .list()
            .map_err(|err| EngineError::Unreadable {
                source_id: "<sources>".to_string(),
                message: format!("{:#}", err),
            })?;

        for required in [&self.options.modules_source, &self.options.urns_source] {
            if !self.repository.contains(required) {
                return Err(EngineError::MissingSource(required.clone()));
            }
            if !ids.contains(required) {
                ids.push(required.clone());
            }
        }
        ids.sort();
        ids.dedup();

        let mut results = self.load_parallel(&ids)?;
        results.sort_by(|a, b| a.id.cmp(&b.id));

        let mut loaded = LoadedSources {
            source_ids: ids,
            ..Default::default()
        };

        for Loaded { id, result } in results {
            let documents = match result {
                Ok(documents) => documents,
                Err(failure) => {
                    self.source_failed(&id, failure)?;
                    continue;
                }
            };

            tracing::debug!(source = %id, documents = documents.len(), "source loaded");
            if id == self.options.modules_source {
                loaded.module_documents = documents.clone();
            } else if id == self.options.urns_source {
                loaded.urn_documents = documents.clone();
            }
            loaded.documents.extend(documents);
        }

        Ok(loaded)
    }

    /// A failed required source aborts the run; any other becomes a finding.
    fn source_failed(&mut self, id: &str, failure: LoadFailure) -> Result<(), EngineError> {
        let required = self.is_required(id);
        match failure {
            LoadFailure::Parse(err) if required => Err(err.into()),
            LoadFailure::Unreadable(message) if required => Err(EngineError::Unreadable {
                source_id: id.to_string(),
                message,
            }),
            LoadFailure::Parse(err) => {
                tracing::warn!(source = %id, error = %err, "source skipped");
                let location = Location {
                    line: err.line,
                    ..Location::source(id)
                };
                self.findings.push(
                    Finding::new(
                        DOCUMENT_PARSE,
                        Category::Parse,
                        Severity::Error,
                        location,
                        err.message,
                    )
                    .with_hint("fix the YAML syntax; no document of this source was checked"),
                );
                Ok(())
            }
            LoadFailure::Unreadable(message) => {
                tracing::warn!(source = %id, error = %message, "source skipped");
                self.findings.push(Finding::new(
                    DOCUMENT_PARSE,
                    Category::Parse,
                    Severity::Error,
                    Location::source(id),
                    format!("source could not be read: {}", message),
                ));
                Ok(())
            }
        }
    }

    /// Load and parse every source on a bounded pool of worker threads.
    fn load_parallel(&self, ids: &[String]) -> Result<Vec<Loaded>, EngineError> {
        let total = ids.len();
        let workers = self.options.max_concurrent.clamp(1, total.max(1));
        let queue = Arc::new(Mutex::new(ids.iter().cloned().collect::<VecDeque<_>>()));
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel::<Loaded>();

        tracing::debug!(sources = total, workers, "loading sources");

        for worker in 0..workers {
            let spawned = thread::Builder::new()
                .name(format!("govgate-loader-{}", worker))
                .spawn({
                    let tx = tx.clone();
                    let queue = Arc::clone(&queue);
                    let cancelled = Arc::clone(&cancelled);
                    let repository = Arc::clone(&self.repository);

                    move || loader_thread(repository, queue, cancelled, tx)
                });
            if let Err(err) = spawned {
                cancelled.store(true, Ordering::SeqCst);
                return Err(EngineError::Unreadable {
                    source_id: "<sources>".to_string(),
                    message: format!("failed to start loader thread: {}", err),
                });
            }
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        while results.len() < total {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(loaded) => results.push(loaded),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    cancelled.store(true, Ordering::SeqCst);
                    tracing::warn!(
                        loaded = results.len(),
                        sources = total,
                        "timeout while loading, abandoning remaining sources"
                    );
                    return Err(TimeoutError {
                        stage: Stage::Loading,
                        limit: self.options.timeout,
                    }
                    .into());
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    // Every loader has exited; record the sources nobody answered for
                    let answered: BTreeSet<String> =
                        results.iter().map(|loaded| loaded.id.clone()).collect();
                    for id in ids.iter().filter(|id| !answered.contains(*id)) {
                        tracing::warn!(source = %id, "loader stopped before reading source");
                        results.push(Loaded {
                            id: id.clone(),
                            result: Err(LoadFailure::Unreadable(
                                "loader stopped before reading the source".to_string(),
                            )),
                        });
                    }
                    break;
                }
            }
        }

        Ok(results)
    }

    // =====================================================================
    // VALIDATING / GRAPH_CHECKING
    // =====================================================================

    fn validate(&mut self, loaded: &LoadedSources, registry: &RegistryStore) -> Result<(), EngineError> {
        let registry_sources = [
            self.options.modules_source.clone(),
            self.options.urns_source.clone(),
        ];
        let ctx = EvalContext {
            documents: &loaded.documents,
            registry,
            registry_sources: &registry_sources,
            sources: &loaded.source_ids,
            files: self.repository.as_ref(),
        };

        for rule in self.rules.iter() {
            self.check_deadline()?;
            self.findings.extend(evaluate(rule, &ctx));
        }
        Ok(())
    }

    /// Cycle findings, and the topological order when there are none.
    fn check_graph(&mut self, registry: &RegistryStore) -> Vec<String> {
        let graph = DependencyGraph::new(registry);
        match graph.topological_order() {
            Ok(order) => order.into_iter().map(str::to_string).collect(),
            Err(err) => {
                tracing::debug!(cycles = err.cycles.len(), "dependency graph has cycles");
                for cycle in &err.cycles {
                    let location = cycle
                        .path
                        .first()
                        .and_then(|name| registry.resolve(name))
                        .map(|module| module.origin.clone())
                        .unwrap_or_else(|| Location::source(self.options.modules_source.clone()));
                    self.findings.push(cycle.to_finding(location));
                }
                Vec::new()
            }
        }
    }
}

/// Worker loop: take sources off the shared queue until it is empty or the
/// run is cancelled. A source already being loaded is always finished.
fn loader_thread(
    repository: Arc<dyn SourceRepository>,
    queue: Arc<Mutex<VecDeque<String>>>,
    cancelled: Arc<AtomicBool>,
    tx: mpsc::Sender<Loaded>,
) {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        let next = match queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => break,
        };
        let Some(id) = next else { break };

        let result = match repository.read(&id) {
            Ok(source) => source.documents().collect_all().map_err(LoadFailure::Parse),
            Err(err) => Err(LoadFailure::Unreadable(format!("{:#}", err))),
        };

        if tx.send(Loaded { id, result }).is_err() {
            break;
        }
    }
}
