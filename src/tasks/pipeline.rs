use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as RunGuard;

use crate::{
    classifier::Classifier,
    config::PipelineConfig,
    db::CacheStore,
    dom::{Document, NodeId, SharedDocument},
    domain::{CacheSnapshot, ClassificationCache},
    infrastructure::notifier::BadgeNotifier,
    locator::ItemLocator,
    render::ItemRenderer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    LoadingCache,
    Scanning,
    PartitioningByCache,
    RemoteClassifying,
    Merging,
    Persisting,
    Reporting,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub scanned: usize,
    pub cache_hits: usize,
    pub classified: usize,
    pub hidden: usize,
    pub tagged: usize,
    /// Classified titles whose element was gone at merge time.
    pub missing: usize,
    pub total_hidden: usize,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            state: RunState::LoadingCache,
            scanned: 0,
            cache_hits: 0,
            classified: 0,
            hidden: 0,
            tagged: 0,
            missing: 0,
            total_hidden: 0,
            finished_at: Utc::now(),
        }
    }
}

/// Items hidden since the page was loaded, summed over runs. One tally per
/// pipeline, and one pipeline per loaded page.
#[derive(Debug, Default)]
pub struct HiddenTally(AtomicUsize);

impl HiddenTally {
    pub fn record(&self, hidden: usize) -> usize {
        self.0.fetch_add(hidden, Ordering::SeqCst) + hidden
    }

    pub fn current(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ClassificationPipeline {
    document: SharedDocument,
    locator: ItemLocator,
    renderer: Arc<dyn ItemRenderer>,
    store: Arc<dyn CacheStore>,
    classifier: Arc<dyn Classifier>,
    badge: BadgeNotifier,
    tally: Arc<HiddenTally>,
    cache_capacity: NonZeroUsize,
    active: RunGuard<()>,
    rerun_requested: AtomicBool,
    closed: AtomicBool,
}

impl ClassificationPipeline {
    pub fn new(
        document: SharedDocument,
        renderer: Arc<dyn ItemRenderer>,
        store: Arc<dyn CacheStore>,
        classifier: Arc<dyn Classifier>,
        badge: BadgeNotifier,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            document,
            locator: ItemLocator::default(),
            renderer,
            store,
            classifier,
            badge,
            tally: Arc::new(HiddenTally::default()),
            cache_capacity: config.cache_capacity,
            active: RunGuard::new(()),
            rerun_requested: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn tally(&self) -> Arc<HiddenTally> {
        self.tally.clone()
    }

    /// Runs the pipeline unless a run is already active, in which case one
    /// follow-up run is queued on the active one and `None` is returned.
    /// Returns `None` without running once the pipeline is closed.
    pub async fn trigger(&self) -> Option<RunReport> {
        let mut last = None;
        loop {
            let Ok(guard) = self.active.try_lock() else {
                self.rerun_requested.store(true, Ordering::SeqCst);
                tracing::debug!(target: "pipeline", "run in flight; rerun queued");
                return last;
            };
            if self.closed.load(Ordering::SeqCst) {
                tracing::debug!(target: "pipeline", "pipeline closed; trigger ignored");
                return last;
            }
            let report = self.run_once().await;
            drop(guard);
            last = Some(report);

            if !self.rerun_requested.swap(false, Ordering::SeqCst) {
                return last;
            }
            tracing::debug!(target: "pipeline", "starting queued rerun");
        }
    }

    /// Waits for the active run and a rerun queued on it, then refuses
    /// every later trigger.
    pub async fn close(&self) {
        let _guard = self.active.lock().await;
        if self.rerun_requested.swap(false, Ordering::SeqCst) {
            tracing::debug!(target: "pipeline", "running queued rerun before close");
            self.run_once().await;
        }
        self.closed.store(true, Ordering::SeqCst);
        tracing::debug!(target: "pipeline", "pipeline closed");
    }

    async fn run_once(&self) -> RunReport {
        let mut report = RunReport::new();

        let snapshot = match self.store.load().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    target: "pipeline",
                    error = %err,
                    "failed to load cache; continuing with an empty cache"
                );
                CacheSnapshot::new()
            }
        };
        let mut cache = ClassificationCache::from_snapshot(snapshot, self.cache_capacity);
        if cache.is_empty() {
            tracing::debug!(target: "pipeline", "cache is empty");
        } else {
            tracing::debug!(target: "pipeline", entries = cache.len(), "cache loaded");
        }

        let pending = self.apply_cached(&mut cache, &mut report);
        if pending.is_empty() {
            tracing::debug!(target: "pipeline", "no titles to classify");
            return self.finish(report, RunState::Done);
        }

        report.state = RunState::RemoteClassifying;
        tracing::debug!(target: "pipeline", total = pending.len(), "titles to classify");
        let verdicts = match self.classifier.classify(&pending).await {
            Ok(verdicts) => verdicts,
            Err(err) => {
                tracing::error!(
                    target: "pipeline",
                    error = %err,
                    batch = pending.len(),
                    "error classifying items"
                );
                return self.finish(report, RunState::Failed);
            }
        };

        report.state = RunState::Merging;
        self.merge(pending, verdicts, &mut cache, &mut report);

        report.state = RunState::Persisting;
        if let Err(err) = self.store.save(cache.to_snapshot()).await {
            tracing::warn!(target: "pipeline", error = %err, "failed to save cache");
        }

        self.finish(report, RunState::Done)
    }

    /// Scans the page, renders every item with a cached verdict and returns
    /// the remaining titles in scan order.
    fn apply_cached(&self, cache: &mut ClassificationCache, report: &mut RunReport) -> Vec<String> {
        report.state = RunState::Scanning;
        let mut doc = self.document.lock();
        let scan = self.locator.find_items(&doc);
        if scan.is_empty() {
            tracing::debug!(target: "pipeline", "no visible items on the page");
        }
        report.scanned = scan.len();

        report.state = RunState::PartitioningByCache;
        let mut pending = Vec::new();
        for item in scan.items() {
            match cache.get(&item.title) {
                Some(is_positive) => {
                    tracing::debug!(target: "pipeline", title = %item.title, is_positive, "cache hit");
                    report.cache_hits += 1;
                    self.render(&mut doc, item.element, is_positive, report);
                }
                None => pending.push(item.title),
            }
        }
        pending
    }

    fn merge(
        &self,
        pending: Vec<String>,
        verdicts: Vec<bool>,
        cache: &mut ClassificationCache,
        report: &mut RunReport,
    ) {
        let mut doc = self.document.lock();
        let current = self.locator.find_items(&doc);
        for (title, is_positive) in pending.into_iter().zip(verdicts) {
            match current.get(&title) {
                Some(element) => self.render(&mut doc, element, is_positive, report),
                None => {
                    report.missing += 1;
                    tracing::error!(target: "pipeline", title = %title, "item element not found for title");
                }
            }
            cache.insert(title, is_positive);
            report.classified += 1;
        }
    }

    fn render(&self, doc: &mut Document, element: NodeId, is_positive: bool, report: &mut RunReport) {
        if is_positive {
            if self.renderer.tag_positive(doc, element) {
                report.tagged += 1;
            }
        } else if self.renderer.hide(doc, element) {
            report.hidden += 1;
        }
    }

    fn finish(&self, mut report: RunReport, state: RunState) -> RunReport {
        report.state = RunState::Reporting;
        report.total_hidden = self.tally.record(report.hidden);
        self.badge.update_badge(report.total_hidden);

        report.state = state;
        report.finished_at = Utc::now();
        tracing::info!(
            target: "pipeline",
            state = ?report.state,
            scanned = report.scanned,
            cache_hits = report.cache_hits,
            classified = report.classified,
            hidden = report.hidden,
            tagged = report.tagged,
            missing = report.missing,
            total_hidden = report.total_hidden,
            "classification run finished"
        );
        report
    }
}
