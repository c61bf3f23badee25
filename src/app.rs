use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use reqwest::Client;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use tokio_cron_scheduler::JobScheduler;

use crate::{
    classifier::RemoteClassifier,
    config::{AppConfig, CacheBackend},
    db::{self, CacheStore, MemoryCacheStore, SqliteCacheStore},
    dom::{parse_html, MutationBatch, SharedDocument},
    infrastructure::{
        directories::ResolvedPaths,
        notifier::{BadgeDisplay, BadgeNotifier},
        shutdown::Shutdown,
    },
    locator::ITEM_TAG,
    page_source::{FeedRefresher, PageSource},
    render::renderer_for,
    tasks::{
        debounce::Debouncer,
        pipeline::ClassificationPipeline,
        scheduler::{configure_refresh_jobs, RefreshCallback},
        watcher::MutationWatcher,
    },
};

pub struct PositiveNewsApp {
    paths: ResolvedPaths,
    config: Arc<AppConfig>,
    document: SharedDocument,
    pipeline: Arc<ClassificationPipeline>,
    trigger: Arc<Debouncer<()>>,
    sqlite: Option<SqliteCacheStore>,
    scheduler: Option<JobScheduler>,
    watcher_handle: JoinHandle<()>,
    badge_handle: JoinHandle<()>,
    badge_text: watch::Receiver<String>,
    shutdown: Shutdown,
}

impl PositiveNewsApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let sqlite = match config.storage.backend {
            CacheBackend::Sqlite => {
                let pool = db::init_pool(&paths.db_path)
                    .await
                    .with_context(|| format!("failed to open {}", paths.db_path.display()))?;
                Some(SqliteCacheStore::new(pool))
            }
            CacheBackend::Memory => None,
        };
        let store: Arc<dyn CacheStore> = match &sqlite {
            Some(store) => Arc::new(store.clone()),
            None => Arc::new(MemoryCacheStore::new()),
        };

        let http_client = Client::builder()
            .user_agent(format!("positive-news-rust/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let classifier = Arc::new(RemoteClassifier::new(
            http_client.clone(),
            config.classifier.clone(),
        ));

        let source = PageSource::new(http_client.clone(), &config.source)?;
        let page_label = source.label();
        let html = source
            .fetch()
            .await
            .with_context(|| format!("failed to load feed page {page_label}"))?;

        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel::<MutationBatch>();
        let mut page = parse_html(&html);
        page.set_observer(mutation_tx);
        let document: SharedDocument = Arc::new(Mutex::new(page));

        let (badge, badge_rx) = BadgeNotifier::channel();
        let (display, badge_text) = BadgeDisplay::new(page_label.clone());
        let badge_handle = display.spawn(badge_rx);

        let pipeline = Arc::new(ClassificationPipeline::new(
            document.clone(),
            renderer_for(config.site),
            store,
            classifier,
            badge,
            &config.pipeline,
        ));

        let trigger = {
            let pipeline = pipeline.clone();
            Arc::new(Debouncer::new(config.pipeline.debounce, move |()| {
                let pipeline = pipeline.clone();
                async move {
                    pipeline.trigger().await;
                }
            }))
        };
        let watcher_handle = MutationWatcher::new(document.clone(), ITEM_TAG, trigger.clone())
            .spawn(mutation_rx, shutdown.subscribe());

        let scheduler = if config.source.refresh_crons.is_empty() {
            None
        } else {
            let refresher = Arc::new(FeedRefresher::new(
                PageSource::new(http_client, &config.source)?,
                document.clone(),
            ));
            Some(
                configure_refresh_jobs(&config.source.refresh_crons, build_refresh_callback(refresher))
                    .await?,
            )
        };

        tracing::info!(page = %page_label, site = ?config.site, "feed page loaded");

        Ok(Self {
            paths,
            config,
            document,
            pipeline,
            trigger,
            sqlite,
            scheduler,
            watcher_handle,
            badge_handle,
            badge_text,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let PositiveNewsApp {
            paths,
            config,
            document,
            pipeline,
            trigger,
            sqlite,
            scheduler,
            mut watcher_handle,
            mut badge_handle,
            badge_text,
            shutdown,
        } = self;

        tracing::info!("PositiveNews filter started");
        pipeline.trigger().await;

        match scheduler {
            Some(mut scheduler) => {
                tracing::info!(
                    crons = config.source.refresh_crons.len(),
                    "watching feed for new items"
                );
                shutdown.subscribe().notified().await;
                tracing::info!("shutdown signal received");
                shutdown.trigger();
                if let Err(err) = scheduler.shutdown().await {
                    tracing::error!(target: "scheduler", ?err, "scheduler shutdown failed");
                }
            }
            None => shutdown.trigger(),
        }

        let shutdown_timeout = Duration::from_secs(5);
        if timeout(shutdown_timeout, &mut watcher_handle).await.is_err() {
            tracing::warn!(target: "watcher", "watcher did not stop within {:?}", shutdown_timeout);
            watcher_handle.abort();
        }
        if trigger.cancel() {
            tracing::debug!(target: "pipeline", "classifying items added just before shutdown");
            if timeout(shutdown_timeout, pipeline.trigger()).await.is_err() {
                tracing::warn!(target: "pipeline", "final classification run timed out");
            }
        }
        if timeout(shutdown_timeout, pipeline.close()).await.is_err() {
            tracing::warn!(
                target: "pipeline",
                "classification run still in flight after {:?}; writing current state",
                shutdown_timeout
            );
        }

        let html = document
            .lock()
            .to_html()
            .context("failed to serialize the filtered page")?;
        let badge = badge_text.borrow().clone();
        tokio::fs::write(&paths.output_path, html)
            .await
            .with_context(|| format!("failed to write {}", paths.output_path.display()))?;
        tracing::info!(
            output = %paths.output_path.display(),
            hidden = pipeline.tally().current(),
            badge = %badge,
            "filtered page written"
        );

        if let Some(store) = sqlite {
            if timeout(shutdown_timeout, store.close()).await.is_err() {
                tracing::warn!(target: "storage", "cache store did not close within {:?}", shutdown_timeout);
            }
        }

        drop(trigger);
        drop(pipeline);
        if timeout(Duration::from_secs(1), &mut badge_handle).await.is_err() {
            badge_handle.abort();
        }

        tracing::info!("PositiveNews filter stopped");
        Ok(())
    }
}

fn build_refresh_callback(refresher: Arc<FeedRefresher>) -> RefreshCallback {
    Arc::new(move || -> BoxFuture<'static, ()> {
        let refresher = refresher.clone();
        Box::pin(async move {
            match refresher.refresh().await {
                Ok(added) if added > 0 => {
                    tracing::info!(target: "source", added, "new feed items appended");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(target: "source", error = %err, "feed refresh failed");
                }
            }
        })
    })
}
