use crate::{
    database::MongoDB,
    models::{Notification, Nutritionist, User},
    utils::error::AppError,
};
use futures::stream::StreamExt;
use mongodb::bson::doc;
use serde::Serialize;

const NOTIFICATIONS: &str = "notifications";
const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Debug, Clone)]
pub enum Recipient {
    User(String),
    Coach(String),
}

impl Recipient {
    fn id(&self) -> &str {
        match self {
            Recipient::User(id) | Recipient::Coach(id) => id,
        }
    }

    fn role(&self) -> &'static str {
        match self {
            Recipient::User(_) => "user",
            Recipient::Coach(_) => "nutritionist",
        }
    }
}

#[derive(Debug, Serialize)]
struct ExpoPushMessage<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    sound: &'a str,
}

/// Sends one push through the Expo endpoint. Returns Err on any transport or
/// non-2xx failure so callers can record the attempt outcome.
pub async fn send_expo_push(token: &str, title: &str, body: &str) -> Result<(), String> {
    let message = ExpoPushMessage { to: token, title, body, sound: "default" };

    let client = reqwest::Client::new();
    let response = client
        .post(EXPO_PUSH_URL)
        .header("Accept", "application/json")
        .timeout(std::time::Duration::from_secs(10))
        .json(&message)
        .send()
        .await
        .map_err(|e| format!("Expo push request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Expo push API error: {}", response.status()));
    }

    Ok(())
}

/// Fire-and-forget delivery: spawns a task that looks up the recipient's
/// token, attempts the push, and persists a history doc whether or not the
/// push went through. Push failures are logged and swallowed.
pub fn notify(db: MongoDB, recipient: Recipient, kind: &str, title: &str, body: &str) {
    let kind = kind.to_string();
    let title = title.to_string();
    let body = body.to_string();

    tokio::spawn(async move {
        if let Err(e) = deliver(&db, &recipient, &kind, &title, &body).await {
            log::warn!("⚠️  Notification to {} failed: {}", recipient.id(), e);
        }
    });
}

/// Same as `notify` but awaited; used by the motivation broadcast where the
/// scheduler paces deliveries itself.
pub async fn deliver(
    db: &MongoDB,
    recipient: &Recipient,
    kind: &str,
    title: &str,
    body: &str,
) -> Result<(), AppError> {
    let token = push_token_of(db, recipient).await?;

    let pushed = match token.as_deref() {
        Some(token) => match send_expo_push(token, title, body).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("⚠️  Push to {} failed: {}", recipient.id(), e);
                false
            }
        },
        None => {
            log::debug!("📭 No push token for {} — history only", recipient.id());
            false
        }
    };

    let record = Notification {
        id: None,
        notification_id: uuid::Uuid::new_v4().to_string(),
        recipient_id: recipient.id().to_string(),
        recipient_role: recipient.role().to_string(),
        kind: kind.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        pushed,
        read: false,
        created_at: chrono::Utc::now().timestamp(),
    };

    db.collection::<Notification>(NOTIFICATIONS)
        .insert_one(&record)
        .await
        .map_err(AppError::db)?;

    Ok(())
}

async fn push_token_of(db: &MongoDB, recipient: &Recipient) -> Result<Option<String>, AppError> {
    match recipient {
        Recipient::User(id) => {
            let user = db
                .collection::<User>("users")
                .find_one(doc! { "user_id": id })
                .await
                .map_err(AppError::db)?;
            Ok(user.and_then(|u| u.expo_push_token))
        }
        Recipient::Coach(id) => {
            let coach = db
                .collection::<Nutritionist>("nutritionists")
                .find_one(doc! { "nutritionist_id": id })
                .await
                .map_err(AppError::db)?;
            Ok(coach.and_then(|c| c.expo_push_token))
        }
    }
}

/// Registers the device token the client got from Expo.
pub async fn save_push_token(
    db: &MongoDB,
    account_id: &str,
    is_coach: bool,
    token: &str,
) -> Result<(), AppError> {
    if token.trim().is_empty() {
        return Err(AppError::Validation("Push token is required".into()));
    }

    let result = if is_coach {
        db.collection::<Nutritionist>("nutritionists")
            .update_one(
                doc! { "nutritionist_id": account_id },
                doc! { "$set": { "expo_push_token": token } },
            )
            .await
            .map_err(AppError::db)?
    } else {
        db.collection::<User>("users")
            .update_one(
                doc! { "user_id": account_id },
                doc! { "$set": { "expo_push_token": token } },
            )
            .await
            .map_err(AppError::db)?
    };

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Account not found".into()));
    }

    log::info!("📱 Push token saved for {}", account_id);
    Ok(())
}

pub async fn get_history(db: &MongoDB, recipient_id: &str) -> Result<Vec<Notification>, AppError> {
    let mut cursor = db
        .collection::<Notification>(NOTIFICATIONS)
        .find(doc! { "recipient_id": recipient_id })
        .sort(doc! { "created_at": -1 })
        .limit(50)
        .await
        .map_err(AppError::db)?;

    let mut history = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(notification) => history.push(notification),
            Err(e) => log::error!("❌ Failed to read notification: {}", e),
        }
    }
    Ok(history)
}
