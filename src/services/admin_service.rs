use crate::{
    database::MongoDB,
    models::{Feedback, Nutritionist, NutritionistPublicInfo, User},
    services::email_service,
    services::notification_service::{self, Recipient},
    utils::error::AppError,
};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;

const NUTRITIONISTS: &str = "nutritionists";
const USERS: &str = "users";
const FEEDBACK: &str = "feedback";

/// Coaches awaiting verification, oldest first.
pub async fn pending_coaches(db: &MongoDB) -> Result<Vec<NutritionistPublicInfo>, AppError> {
    let mut cursor = db
        .collection::<Nutritionist>(NUTRITIONISTS)
        .find(doc! { "verification_status": "pending" })
        .sort(doc! { "created_at": 1 })
        .await
        .map_err(AppError::db)?;

    let mut coaches = Vec::new();
    while let Some(coach) = cursor.try_next().await.map_err(AppError::db)? {
        coaches.push(NutritionistPublicInfo::from(coach));
    }
    Ok(coaches)
}

/// Approves a pending coach. The status filter makes the transition
/// first-writer-wins: a second approve (or an approve racing a reject)
/// matches nothing and reports the conflict instead of double-applying.
pub async fn approve_coach(db: &MongoDB, nutritionist_id: &str) -> Result<(), AppError> {
    let updated = db
        .collection::<Nutritionist>(NUTRITIONISTS)
        .find_one_and_update(
            doc! { "nutritionist_id": nutritionist_id, "verification_status": "pending" },
            doc! {
                "$set": {
                    "verification_status": "approved",
                    "is_verified": true,
                    "updated_at": mongodb::bson::DateTime::now(),
                },
                "$addToSet": { "roles": "nutritionist_verified" },
            },
        )
        .return_document(ReturnDocument::After)
        .await
        .map_err(AppError::db)?;

    let coach = match updated {
        Some(c) => c,
        None => return Err(resolve_missing_transition(db, nutritionist_id).await?),
    };

    log::info!("✅ Coach {} approved", nutritionist_id);

    notification_service::notify(
        db.clone(),
        Recipient::Coach(coach.nutritionist_id.clone()),
        "verification_approved",
        "You're verified!",
        "Your coach profile was approved. Clients can now find you.",
    );

    let email = coach.email.clone();
    let name = coach.name.clone();
    tokio::spawn(async move {
        email_service::send_email(
            &email,
            "Your BiteWise coach profile is approved",
            &format!("Hi {}, your coach profile has been verified. Welcome aboard!", name),
        )
        .await;
    });

    Ok(())
}

/// Rejects a pending coach. A soft delete: the document keeps its status
/// and `rejected_at` so the account stays auditable until the cleanup job
/// purges it.
pub async fn reject_coach(db: &MongoDB, nutritionist_id: &str) -> Result<(), AppError> {
    let now = chrono::Utc::now().timestamp();

    let updated = db
        .collection::<Nutritionist>(NUTRITIONISTS)
        .find_one_and_update(
            doc! { "nutritionist_id": nutritionist_id, "verification_status": "pending" },
            doc! {
                "$set": {
                    "verification_status": "rejected",
                    "is_verified": false,
                    "is_active": false,
                    "rejected_at": now,
                    "updated_at": mongodb::bson::DateTime::now(),
                },
            },
        )
        .return_document(ReturnDocument::After)
        .await
        .map_err(AppError::db)?;

    let coach = match updated {
        Some(c) => c,
        None => return Err(resolve_missing_transition(db, nutritionist_id).await?),
    };

    log::warn!("🚫 Coach {} rejected", nutritionist_id);

    let email = coach.email.clone();
    let name = coach.name.clone();
    tokio::spawn(async move {
        email_service::send_email(
            &email,
            "Your BiteWise coach application",
            &format!(
                "Hi {}, unfortunately we could not verify your coach profile at this time.",
                name
            ),
        )
        .await;
    });

    Ok(())
}

async fn resolve_missing_transition(
    db: &MongoDB,
    nutritionist_id: &str,
) -> Result<AppError, AppError> {
    let existing = db
        .collection::<Nutritionist>(NUTRITIONISTS)
        .find_one(doc! { "nutritionist_id": nutritionist_id })
        .await
        .map_err(AppError::db)?;
    Ok(match existing {
        Some(c) => AppError::Conflict(format!(
            "Coach verification already resolved (status: {})",
            c.verification_status
        )),
        None => AppError::NotFound("Coach not found".into()),
    })
}

/// Deletes rejected coach accounts older than the retention window.
/// Idempotent, safe to run on every cleanup tick.
pub async fn purge_rejected(db: &MongoDB, older_than_days: i64) -> Result<u64, AppError> {
    let cutoff = chrono::Utc::now().timestamp() - older_than_days * 86_400;
    let result = db
        .collection::<Nutritionist>(NUTRITIONISTS)
        .delete_many(doc! {
            "verification_status": "rejected",
            "rejected_at": { "$lt": cutoff },
        })
        .await
        .map_err(AppError::db)?;

    if result.deleted_count > 0 {
        log::info!("🧹 Purged {} rejected coach account(s)", result.deleted_count);
    }
    Ok(result.deleted_count)
}

/// Enables or disables an account. Checks users first, then coaches, so a
/// single admin endpoint covers both account types.
pub async fn set_account_active(
    db: &MongoDB,
    account_id: &str,
    active: bool,
) -> Result<(), AppError> {
    let update = doc! { "$set": {
        "is_active": active,
        "updated_at": mongodb::bson::DateTime::now(),
    }};

    let user_result = db
        .collection::<User>(USERS)
        .update_one(doc! { "user_id": account_id }, update.clone())
        .await
        .map_err(AppError::db)?;

    if user_result.matched_count > 0 {
        log::info!("🔑 User {} is_active set to {}", account_id, active);
        return Ok(());
    }

    let coach_result = db
        .collection::<Nutritionist>(NUTRITIONISTS)
        .update_one(doc! { "nutritionist_id": account_id }, update)
        .await
        .map_err(AppError::db)?;

    if coach_result.matched_count > 0 {
        log::info!("🔑 Coach {} is_active set to {}", account_id, active);
        return Ok(());
    }

    Err(AppError::NotFound("Account not found".into()))
}

pub async fn submit_feedback(
    db: &MongoDB,
    user_id: &str,
    subject: &str,
    message: &str,
) -> Result<Feedback, AppError> {
    let subject = subject.trim();
    let message = message.trim();
    if subject.is_empty() || message.is_empty() {
        return Err(AppError::Validation("Subject and message are required".into()));
    }
    if message.len() > 5000 {
        return Err(AppError::Validation("Message too long (max 5000 chars)".into()));
    }

    let feedback = Feedback {
        id: None,
        feedback_id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
        status: "open".to_string(),
        created_at: chrono::Utc::now().timestamp(),
        resolved_at: None,
    };

    db.collection::<Feedback>(FEEDBACK)
        .insert_one(&feedback)
        .await
        .map_err(AppError::db)?;

    log::info!("📝 Feedback {} submitted by {}", feedback.feedback_id, user_id);
    Ok(feedback)
}

/// All feedback, open entries first and newest within each status.
pub async fn list_feedback(db: &MongoDB) -> Result<Vec<Feedback>, AppError> {
    let mut cursor = db
        .collection::<Feedback>(FEEDBACK)
        .find(doc! {})
        .sort(doc! { "status": 1, "created_at": -1 })
        .await
        .map_err(AppError::db)?;

    let mut items = Vec::new();
    while let Some(item) = cursor.try_next().await.map_err(AppError::db)? {
        items.push(item);
    }
    Ok(items)
}

pub async fn resolve_feedback(db: &MongoDB, feedback_id: &str) -> Result<(), AppError> {
    let result = db
        .collection::<Feedback>(FEEDBACK)
        .update_one(
            doc! { "feedback_id": feedback_id, "status": "open" },
            doc! { "$set": {
                "status": "resolved",
                "resolved_at": chrono::Utc::now().timestamp(),
            }},
        )
        .await
        .map_err(AppError::db)?;

    if result.matched_count == 0 {
        let exists = db
            .collection::<Feedback>(FEEDBACK)
            .find_one(doc! { "feedback_id": feedback_id })
            .await
            .map_err(AppError::db)?;
        return Err(match exists {
            Some(_) => AppError::Conflict("Feedback already resolved".into()),
            None => AppError::NotFound("Feedback not found".into()),
        });
    }

    log::info!("✅ Feedback {} resolved", feedback_id);
    Ok(())
}
