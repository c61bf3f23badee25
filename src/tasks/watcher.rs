use std::sync::Arc;

use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};

use crate::{
    dom::{MutationBatch, SharedDocument},
    infrastructure::shutdown::ShutdownListener,
    tasks::debounce::Debouncer,
};

/// Re-triggers the pipeline when new items are added to the page.
pub struct MutationWatcher {
    document: SharedDocument,
    item_tag: String,
    trigger: Arc<Debouncer<()>>,
}

impl MutationWatcher {
    pub fn new(document: SharedDocument, item_tag: &str, trigger: Arc<Debouncer<()>>) -> Self {
        Self {
            document,
            item_tag: item_tag.to_string(),
            trigger,
        }
    }

    pub fn spawn(
        self,
        mut mutations: UnboundedReceiver<MutationBatch>,
        mut shutdown: ShutdownListener,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    batch = mutations.recv() => match batch {
                        Some(batch) => {
                            if self.adds_item(&batch) {
                                tracing::debug!(target: "watcher", "new items added; scheduling classification");
                                self.trigger.call(());
                            }
                        }
                        None => break,
                    },
                    _ = shutdown.notified() => break,
                }
            }
            tracing::debug!(target: "watcher", "mutation watcher stopped");
        })
    }

    fn adds_item(&self, batch: &MutationBatch) -> bool {
        let doc = self.document.lock();
        batch
            .iter()
            .flat_map(|record| record.added.iter())
            .any(|node| doc.is_or_contains(*node, &self.item_tag))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use parking_lot::Mutex;
    use tokio::{sync::mpsc, time::sleep};

    use super::*;
    use crate::{
        dom::{parse_html, MutationRecord},
        infrastructure::shutdown::Shutdown,
    };

    fn counting_trigger() -> (Arc<AtomicUsize>, Arc<Debouncer<()>>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let debouncer = Debouncer::new(Duration::from_millis(300), move |()| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (runs, Arc::new(debouncer))
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_notifications_trigger_once() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut doc = parse_html("<body><div id='feed'></div></body>");
        doc.set_observer(tx.clone());
        let document = Arc::new(Mutex::new(doc));
        let (runs, trigger) = counting_trigger();
        let shutdown = Shutdown::new();
        let handle = MutationWatcher::new(document.clone(), "article", trigger)
            .spawn(rx, shutdown.subscribe());

        let (feed, wrapper) = {
            let mut doc = document.lock();
            let feed = doc.select_first(doc.root(), "div").unwrap();
            let wrapper = doc.create_element("section");
            let article = doc.create_element("article");
            doc.append_child(wrapper, article);
            doc.append_child(feed, wrapper);
            (feed, wrapper)
        };
        for _ in 0..3 {
            tx.send(vec![MutationRecord {
                target: feed,
                added: vec![wrapper],
            }])
            .unwrap();
            sleep(Duration::from_millis(50)).await;
        }

        sleep(Duration::from_millis(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_additions_are_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut doc = parse_html("<body><article><time>1h</time></article></body>");
        doc.set_observer(tx);
        let document = Arc::new(Mutex::new(doc));
        let (runs, trigger) = counting_trigger();
        let shutdown = Shutdown::new();
        let handle = MutationWatcher::new(document.clone(), "article", trigger)
            .spawn(rx, shutdown.subscribe());

        {
            let mut doc = document.lock();
            let time = doc.select_first(doc.root(), "time").unwrap();
            let badge = doc.create_element("span");
            doc.insert_after(time, badge);
        }

        sleep(Duration::from_millis(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        shutdown.trigger();
        handle.await.unwrap();
    }
}
