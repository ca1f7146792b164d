use crate::{database::MongoDB, services::admin_service};
use tokio::time::{interval, Duration};

/// Rejected coach accounts are kept this long before being purged.
const REJECTED_RETENTION_DAYS: i64 = 7;

/// Starts the daily cleanup job. Runs once at startup so a restart never
/// extends the retention window, then every 24 hours.
pub async fn start_cleanup_job(db: MongoDB) {
    log::info!(
        "📅 Starting cleanup job (daily, purges rejected coaches after {} days)",
        REJECTED_RETENTION_DAYS
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(86_400));

        loop {
            ticker.tick().await;

            log::debug!("🧹 Cleanup tick");
            match admin_service::purge_rejected(&db, REJECTED_RETENTION_DAYS).await {
                Ok(purged) => {
                    if purged > 0 {
                        log::info!("✅ Cleanup pass: {} rejected account(s) purged", purged);
                    }
                }
                Err(e) => {
                    log::error!("❌ Cleanup pass failed: {}", e);
                }
            }
        }
    });

    log::info!("✅ Cleanup job started successfully");
}
