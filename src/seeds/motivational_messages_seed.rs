use crate::database::MongoDB;
use crate::models::MotivationalMessage;
use mongodb::bson::doc;

/// Seeds the default motivational messages.
/// Only inserts when no defaults are in the collection yet.
pub async fn seed_default_messages(db: &MongoDB) {
    let collection = db.collection::<MotivationalMessage>("motivational_messages");

    let count = collection
        .count_documents(doc! { "is_default": true })
        .await
        .unwrap_or(0);

    if count > 0 {
        log::info!("📋 Motivational messages: {} defaults already in DB, skipping seed", count);
        return;
    }

    log::info!("📋 Motivational messages: seeding defaults into MongoDB...");

    let now = chrono::Utc::now().timestamp();
    let messages = build_default_messages(now);

    match collection.insert_many(&messages).await {
        Ok(result) => {
            log::info!("   ✅ Inserted {} default motivational messages", result.inserted_ids.len());
        }
        Err(e) => {
            log::error!("   ❌ Failed to seed motivational messages: {}", e);
        }
    }
}

fn build_default_messages(now: i64) -> Vec<MotivationalMessage> {
    [
        "Every meal you log is a step towards your goal. Keep going! 💪",
        "Consistency beats perfection. Log today's meals and keep your streak alive! 🔥",
        "Small choices add up. What's on your plate today? 🥗",
        "Your future self will thank you for the habits you build today. 🌱",
        "Don't break the chain! One more day of logging keeps your streak going. ⛓️",
        "Progress, not perfection. Track it, learn from it, improve it. 📈",
        "Hydrate, eat well, and log it. You've got this! 💧",
        "A 7-day streak is closer than you think. Log a meal today! 🏅",
        "Great bodies are built in the kitchen. Make today's meals count! 🍳",
        "You showed up yesterday. Show up today. That's how streaks are made. ✨",
    ]
    .iter()
    .map(|text| MotivationalMessage {
        id: None,
        text: text.to_string(),
        is_default: true,
        created_at: now,
    })
    .collect()
}
