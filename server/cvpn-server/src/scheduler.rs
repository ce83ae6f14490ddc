//! Daily CRL rotation job

use crate::server::CvpnServer;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Schedules a daily CRL rotation against the issuing PKI path, the
/// same operation the POST /crl/rotate endpoint triggers manually.
pub async fn start_daily_rotation(server: CvpnServer) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async("0 0 0 * * *", move |_id, _scheduler| {
        let server = server.clone();
        Box::pin(async move {
            match server
                .reconciler
                .rotate(
                    &server.issuing_pki_path,
                    &server.config.client_vpn_endpoint_id,
                )
                .await
            {
                Ok(_) => info!("Scheduled CRL rotation completed"),
                Err(e) => error!("Scheduled CRL rotation failed: {}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    Ok(scheduler)
}
