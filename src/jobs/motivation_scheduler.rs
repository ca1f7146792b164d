use crate::{
    database::MongoDB,
    models::{MotivationalMessage, User},
    services::notification_service::{self, Recipient},
};
use chrono::{NaiveDate, Timelike, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use rand::seq::SliceRandom;
use std::env;
use tokio::time::{interval, Duration};

/// UTC hours at which the motivational push goes out, comma-separated.
fn delivery_hours() -> Vec<u32> {
    env::var("MOTIVATION_HOURS")
        .unwrap_or_else(|_| "9,19".to_string())
        .split(',')
        .filter_map(|h| h.trim().parse::<u32>().ok())
        .filter(|h| *h < 24)
        .collect()
}

/// True when `hour` is a delivery hour whose (day, hour) slot has not been
/// served yet. One round per slot, never two.
fn due_now(hours: &[u32], today: NaiveDate, hour: u32, last_sent: Option<(NaiveDate, u32)>) -> bool {
    hours.contains(&hour) && last_sent != Some((today, hour))
}

/// Starts the motivational push scheduler. Ticks every hour and sends one
/// randomly chosen message to every active user with a push token whenever
/// the current UTC hour is in the delivery window.
pub async fn start_motivation_scheduler(db: MongoDB) {
    let hours = delivery_hours();
    log::info!("📅 Starting motivation scheduler (delivery hours UTC: {:?})", hours);

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(3600));
        // The first interval tick resolves immediately; swallow it so a
        // restart inside the delivery window does not re-broadcast the round
        // that already went out.
        ticker.tick().await;

        let mut last_sent: Option<(NaiveDate, u32)> = None;

        loop {
            ticker.tick().await;

            let now = Utc::now();
            let (today, hour) = (now.date_naive(), now.hour());
            if due_now(&hours, today, hour, last_sent) {
                log::info!("⏰ Motivation tick ({:02}:00 UTC), sending push round...", hour);
                last_sent = Some((today, hour));
                match send_round(&db).await {
                    Ok((sent, failed)) => {
                        log::info!("📊 Motivation round done: {} sent, {} failed", sent, failed);
                    }
                    Err(e) => {
                        log::error!("❌ Motivation round failed: {}", e);
                    }
                }
            } else {
                log::debug!("⏰ Motivation tick ({:02}:00 UTC), outside delivery window", hour);
            }
        }
    });

    log::info!("✅ Motivation scheduler started successfully");
}

async fn send_round(db: &MongoDB) -> Result<(usize, usize), String> {
    let message = pick_message(db).await?;

    let mut cursor = db
        .collection::<User>("users")
        .find(doc! {
            "is_active": true,
            "expo_push_token": { "$ne": null },
        })
        .await
        .map_err(|e| format!("Failed to query users: {}", e))?;

    let mut sent = 0usize;
    let mut failed = 0usize;

    loop {
        let user = match cursor.try_next().await {
            Ok(Some(user)) => user,
            Ok(None) => break,
            Err(e) => {
                log::error!("  ❌ Error reading user cursor, aborting round: {}", e);
                failed += 1;
                break;
            }
        };

        let recipient = Recipient::User(user.user_id.clone());
        match notification_service::deliver(db, &recipient, "motivation", "BiteWise", &message).await
        {
            Ok(_) => sent += 1,
            Err(e) => {
                failed += 1;
                log::warn!("  ⚠️ Motivation push failed for {}: {}", user.user_id, e);
            }
        }

        // Small delay between users to avoid hammering Expo
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    Ok((sent, failed))
}

async fn pick_message(db: &MongoDB) -> Result<String, String> {
    let mut cursor = db
        .collection::<MotivationalMessage>("motivational_messages")
        .find(doc! {})
        .await
        .map_err(|e| format!("Failed to query motivational messages: {}", e))?;

    let mut messages = Vec::new();
    while let Some(message) = cursor
        .try_next()
        .await
        .map_err(|e| format!("Failed to read motivational message: {}", e))?
    {
        messages.push(message.text);
    }

    messages
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| "No motivational messages in database".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_due_only_inside_delivery_window() {
        let hours = vec![9, 19];
        assert!(due_now(&hours, day("2026-08-29"), 9, None));
        assert!(due_now(&hours, day("2026-08-29"), 19, None));
        assert!(!due_now(&hours, day("2026-08-29"), 12, None));
    }

    #[test]
    fn test_slot_never_served_twice() {
        let hours = vec![9, 19];
        let served = Some((day("2026-08-29"), 9u32));
        assert!(!due_now(&hours, day("2026-08-29"), 9, served));
        // The other window of the same day is still due
        assert!(due_now(&hours, day("2026-08-29"), 19, served));
        // Same hour next day is a fresh slot
        assert!(due_now(&hours, day("2026-08-30"), 9, served));
    }

    #[test]
    fn test_delivery_hours_defaults_and_filters() {
        // MOTIVATION_HOURS unset in tests: fall back to 9 and 19 UTC
        if std::env::var("MOTIVATION_HOURS").is_err() {
            assert_eq!(delivery_hours(), vec![9, 19]);
        }
    }
}
