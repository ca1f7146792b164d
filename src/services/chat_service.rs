use crate::{
    database::MongoDB,
    models::{Chat, ChatMessage},
    services::{auth_service, notification_service},
    utils::error::AppError,
};
use futures::stream::StreamExt;
use mongodb::bson::doc;

const CHATS: &str = "chats";
const MESSAGES: &str = "chat_messages";

/// Deterministic chat id: one chat per user↔coach pair, regardless of who
/// messages first or how many concurrent first messages race.
pub fn chat_id_for(user_id: &str, nutritionist_id: &str) -> String {
    format!("{}_{}", user_id, nutritionist_id)
}

/// Sends a message from either side of the pair. Upserts the chat doc (so
/// the first message creates it), updates the preview, bumps the recipient's
/// unread counter via $inc, and appends to the message log.
pub async fn send_message(
    db: &MongoDB,
    sender_id: &str,
    sender_is_coach: bool,
    other_id: &str,
    text: &str,
) -> Result<ChatMessage, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Message text is required".into()));
    }

    let (user_id, nutritionist_id) = if sender_is_coach {
        (other_id, sender_id)
    } else {
        (sender_id, other_id)
    };

    let user = auth_service::find_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let coach = auth_service::find_coach(db, nutritionist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coach not found".into()))?;

    let chat_id = chat_id_for(user_id, nutritionist_id);
    let now = chrono::Utc::now().timestamp();

    // The sender's own counter is untouched; only the other side accrues
    let unread_field = if sender_is_coach { "user_unread_count" } else { "coach_unread_count" };

    db.collection::<Chat>(CHATS)
        .update_one(
            doc! { "chat_id": &chat_id },
            doc! {
                "$setOnInsert": {
                    "user_id": user_id,
                    "nutritionist_id": nutritionist_id,
                    "user_name": &user.name,
                    "coach_name": &coach.name,
                    "created_at": now,
                },
                "$set": {
                    "last_message": text,
                    "last_message_at": now,
                    "updated_at": now,
                },
                "$inc": { unread_field: 1 },
            },
        )
        .upsert(true)
        .await
        .map_err(AppError::db)?;

    let message = ChatMessage {
        id: None,
        message_id: uuid::Uuid::new_v4().to_string(),
        chat_id: chat_id.clone(),
        sender_id: sender_id.to_string(),
        text: text.to_string(),
        created_at: now,
    };

    db.collection::<ChatMessage>(MESSAGES)
        .insert_one(&message)
        .await
        .map_err(AppError::db)?;

    log::info!("💬 Message in chat {} from {}", chat_id, sender_id);

    let (recipient, sender_name) = if sender_is_coach {
        (notification_service::Recipient::User(user_id.to_string()), coach.name.clone())
    } else {
        (notification_service::Recipient::Coach(nutritionist_id.to_string()), user.name.clone())
    };
    let preview: String = text.chars().take(80).collect();
    notification_service::notify(db.clone(), recipient, "new_message", &sender_name, &preview);

    Ok(message)
}

pub async fn get_chats(db: &MongoDB, account_id: &str, is_coach: bool) -> Result<Vec<Chat>, AppError> {
    let filter = if is_coach {
        doc! { "nutritionist_id": account_id }
    } else {
        doc! { "user_id": account_id }
    };

    let mut cursor = db
        .collection::<Chat>(CHATS)
        .find(filter)
        .await
        .map_err(AppError::db)?;

    let mut chats = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(chat) => chats.push(chat),
            Err(e) => log::error!("❌ Failed to read chat: {}", e),
        }
    }
    chats.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    Ok(chats)
}

/// Message history, oldest first. Only the two participants may read it.
pub async fn get_messages(
    db: &MongoDB,
    chat_id: &str,
    requester_id: &str,
) -> Result<Vec<ChatMessage>, AppError> {
    require_participant(db, chat_id, requester_id).await?;

    let mut cursor = db
        .collection::<ChatMessage>(MESSAGES)
        .find(doc! { "chat_id": chat_id })
        .sort(doc! { "created_at": 1 })
        .await
        .map_err(AppError::db)?;

    let mut messages = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(message) => messages.push(message),
            Err(e) => log::error!("❌ Failed to read message: {}", e),
        }
    }
    Ok(messages)
}

/// Resets the requester's own unread counter.
pub async fn mark_read(db: &MongoDB, chat_id: &str, requester_id: &str) -> Result<(), AppError> {
    let chat = require_participant(db, chat_id, requester_id).await?;

    let own_field = if chat.nutritionist_id == requester_id {
        "coach_unread_count"
    } else {
        "user_unread_count"
    };

    db.collection::<Chat>(CHATS)
        .update_one(doc! { "chat_id": chat_id }, doc! { "$set": { own_field: 0 } })
        .await
        .map_err(AppError::db)?;

    Ok(())
}

async fn require_participant(db: &MongoDB, chat_id: &str, requester_id: &str) -> Result<Chat, AppError> {
    let chat = db
        .collection::<Chat>(CHATS)
        .find_one(doc! { "chat_id": chat_id })
        .await
        .map_err(AppError::db)?
        .ok_or_else(|| AppError::NotFound("Chat not found".into()))?;

    if chat.user_id != requester_id && chat.nutritionist_id != requester_id {
        return Err(AppError::Forbidden("You are not a participant of this chat".into()));
    }
    Ok(chat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_id_is_deterministic() {
        assert_eq!(chat_id_for("u1", "c1"), "u1_c1");
        assert_eq!(chat_id_for("u1", "c1"), chat_id_for("u1", "c1"));
        assert_ne!(chat_id_for("u1", "c2"), chat_id_for("u1", "c1"));
    }
}
