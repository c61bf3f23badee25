use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use tokio_cron_scheduler::{Job, JobScheduler};

pub type RefreshCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

pub async fn configure_refresh_jobs(
    cron_specs: &[String],
    callback: RefreshCallback,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    for spec in cron_specs {
        let label = spec.clone();
        let cb = callback.clone();
        let job = Job::new_async(spec.as_str(), move |_id, _l| {
            let cb = cb.clone();
            let cron_label = label.clone();
            Box::pin(async move {
                tracing::debug!(target: "scheduler", cron = %cron_label, "feed refresh triggered");
                cb().await;
            })
        })?;
        scheduler.add(job).await?;
        tracing::info!(target: "scheduler", cron = %spec, "feed refresh job registered");
    }
    scheduler.start().await?;
    Ok(scheduler)
}
