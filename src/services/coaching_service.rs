use crate::{
    database::MongoDB,
    models::{BlockedCoach, CoachRating, CoachRequest, Nutritionist, RequestStatus, User},
    services::{auth_service, notification_service},
    utils::error::AppError,
};
use futures::stream::StreamExt;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;

const REQUESTS: &str = "coach_requests";
const RATINGS: &str = "coach_ratings";
const BLOCKED: &str = "blocked_coaches";

/// Admission decision for a new coaching request, pure so the whole table is
/// testable without a database. The ordering fixes which error wins when
/// several conditions apply at once.
pub fn send_request_guard(
    has_active_coach: bool,
    coach_blocked: bool,
    coach_accepting: bool,
    has_live_request: bool,
) -> Result<(), AppError> {
    if has_active_coach {
        return Err(AppError::Conflict(
            "You already have an active coach. End that relationship first.".into(),
        ));
    }
    if coach_blocked {
        return Err(AppError::Forbidden("You have blocked this coach".into()));
    }
    if !coach_accepting {
        return Err(AppError::Forbidden("Coach is not accepting requests".into()));
    }
    if has_live_request {
        return Err(AppError::Conflict("A request to this coach is already in progress".into()));
    }
    Ok(())
}

/// User sends a coaching request to a verified nutritionist.
///
/// Rejects when the user already has an active coach (409), when a live
/// request to the same coach exists (409), or when the user has previously
/// blocked this coach (403).
pub async fn send_request(
    db: &MongoDB,
    user_id: &str,
    nutritionist_id: &str,
) -> Result<CoachRequest, AppError> {
    let user = auth_service::find_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let blocked = db
        .collection::<BlockedCoach>(BLOCKED)
        .find_one(doc! { "user_id": user_id, "nutritionist_id": nutritionist_id })
        .await
        .map_err(AppError::db)?;

    let coach = auth_service::find_coach(db, nutritionist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coach not found".into()))?;

    let requests = db.collection::<CoachRequest>(REQUESTS);

    let live = requests
        .find_one(doc! {
            "user_id": user_id,
            "nutritionist_id": nutritionist_id,
            "status": { "$in": RequestStatus::NON_TERMINAL.to_vec() },
        })
        .await
        .map_err(AppError::db)?;

    send_request_guard(
        user.active_coach_id.is_some(),
        blocked.is_some(),
        coach.is_verified && coach.is_active,
        live.is_some(),
    )?;

    let request = CoachRequest::new(user_id, nutritionist_id);
    requests.insert_one(&request).await.map_err(AppError::db)?;

    log::info!("📨 Coach request {} created: {} -> {}", request.request_id, user_id, nutritionist_id);

    notification_service::notify(
        db.clone(),
        notification_service::Recipient::Coach(nutritionist_id.to_string()),
        "coach_request",
        "New coaching request",
        &format!("{} wants you as their coach", user.name),
    );

    Ok(request)
}

/// Coach accepts a pending request. A single filtered find_one_and_update
/// makes the status check and the transition one atomic compare-and-set.
pub async fn accept_request(
    db: &MongoDB,
    coach_id: &str,
    request_id: &str,
) -> Result<CoachRequest, AppError> {
    respond_to_request(db, coach_id, request_id, RequestStatus::Accepted).await
}

/// Coach declines a pending request (terminal).
pub async fn decline_request(
    db: &MongoDB,
    coach_id: &str,
    request_id: &str,
) -> Result<CoachRequest, AppError> {
    respond_to_request(db, coach_id, request_id, RequestStatus::Declined).await
}

async fn respond_to_request(
    db: &MongoDB,
    coach_id: &str,
    request_id: &str,
    new_status: RequestStatus,
) -> Result<CoachRequest, AppError> {
    let requests = db.collection::<CoachRequest>(REQUESTS);
    let now = chrono::Utc::now().timestamp();

    let updated = requests
        .find_one_and_update(
            doc! {
                "request_id": request_id,
                "nutritionist_id": coach_id,
                "status": RequestStatus::Pending.as_str(),
            },
            doc! { "$set": { "status": new_status.as_str(), "responded_at": now } },
        )
        .return_document(ReturnDocument::After)
        .await
        .map_err(AppError::db)?;

    let request = match updated {
        Some(request) => request,
        None => {
            // Disambiguate: missing, not ours, or already past pending
            let existing = requests
                .find_one(doc! { "request_id": request_id })
                .await
                .map_err(AppError::db)?
                .ok_or_else(|| AppError::NotFound("Request not found".into()))?;
            if existing.nutritionist_id != coach_id {
                return Err(AppError::Forbidden("This request belongs to another coach".into()));
            }
            return Err(AppError::Conflict(format!(
                "Request is no longer pending (status: {})",
                existing.status
            )));
        }
    };

    log::info!("✅ Request {} {}", request_id, new_status);

    let (kind, title, body) = match new_status {
        RequestStatus::Accepted => (
            "request_accepted",
            "Request accepted",
            "Your coaching request was accepted. Confirm your coach to get started!",
        ),
        _ => ("request_declined", "Request declined", "Your coaching request was declined."),
    };
    notification_service::notify(
        db.clone(),
        notification_service::Recipient::User(request.user_id.clone()),
        kind,
        title,
        body,
    );

    Ok(request)
}

/// User confirms an accepted coach as their active coach.
///
/// Sequence of compare-and-set steps: claim the user's `active_coach_id`
/// slot (filter on null), flip the accepted request to selected, then
/// $addToSet into the coach's client list. Claiming the slot first means a
/// select that loses the race fails before writing anything, so there is
/// nothing to roll back.
pub async fn select_coach(
    db: &MongoDB,
    user_id: &str,
    nutritionist_id: &str,
) -> Result<CoachRequest, AppError> {
    let requests = db.collection::<CoachRequest>(REQUESTS);
    let users = db.collection::<User>("users");
    let coaches = db.collection::<Nutritionist>("nutritionists");
    let now = chrono::Utc::now().timestamp();

    auth_service::find_coach(db, nutritionist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coach not found".into()))?;

    // Cheap precheck so "no accepted request" beats "slot taken" in error
    // reporting; the flip below re-verifies the status atomically.
    requests
        .find_one(doc! {
            "user_id": user_id,
            "nutritionist_id": nutritionist_id,
            "status": RequestStatus::Accepted.as_str(),
        })
        .await
        .map_err(AppError::db)?
        .ok_or_else(|| AppError::Conflict("No accepted request for this coach".into()))?;

    let claimed = users
        .update_one(
            doc! { "user_id": user_id, "active_coach_id": mongodb::bson::Bson::Null },
            doc! { "$set": { "active_coach_id": nutritionist_id } },
        )
        .await
        .map_err(AppError::db)?;

    if claimed.matched_count == 0 {
        return Err(AppError::Conflict("You already have an active coach".into()));
    }

    let selected = match requests
        .find_one_and_update(
            doc! {
                "user_id": user_id,
                "nutritionist_id": nutritionist_id,
                "status": RequestStatus::Accepted.as_str(),
            },
            doc! { "$set": { "status": RequestStatus::Selected.as_str(), "selected_at": now } },
        )
        .return_document(ReturnDocument::After)
        .await
        .map_err(AppError::db)?
    {
        Some(request) => request,
        None => {
            // Request changed under us (e.g. concurrently declined): release
            // the slot we just claimed before reporting the conflict
            let released = users
                .update_one(
                    doc! { "user_id": user_id, "active_coach_id": nutritionist_id },
                    doc! { "$set": { "active_coach_id": mongodb::bson::Bson::Null } },
                )
                .await;
            if let Err(e) = released {
                log::error!(
                    "❌ Failed to release coach slot {} for user {} after lost request flip: {}",
                    nutritionist_id, user_id, e
                );
            }
            return Err(AppError::Conflict("No accepted request for this coach".into()));
        }
    };

    coaches
        .update_one(
            doc! { "nutritionist_id": nutritionist_id },
            doc! { "$addToSet": { "client_ids": user_id } },
        )
        .await
        .map_err(AppError::db)?;

    log::info!("🤝 Coach selected: {} -> {}", user_id, nutritionist_id);

    notification_service::notify(
        db.clone(),
        notification_service::Recipient::Coach(nutritionist_id.to_string()),
        "client_selected",
        "New client",
        "A client confirmed you as their coach.",
    );

    Ok(selected)
}

/// User ends the active relationship.
pub async fn end_relationship(db: &MongoDB, user_id: &str) -> Result<CoachRequest, AppError> {
    let coach_id = active_coach_of(db, user_id).await?;
    let request = close_relationship(db, user_id, &coach_id, RequestStatus::EndedByUser).await?;
    notification_service::notify(
        db.clone(),
        notification_service::Recipient::Coach(coach_id),
        "relationship_ended",
        "Client left",
        "A client ended the coaching relationship.",
    );
    Ok(request)
}

/// Coach ends the relationship with one of their clients.
pub async fn coach_end_relationship(
    db: &MongoDB,
    coach_id: &str,
    user_id: &str,
) -> Result<CoachRequest, AppError> {
    let active = active_coach_of(db, user_id).await?;
    if active != coach_id {
        return Err(AppError::Forbidden("This user is not your client".into()));
    }
    let request = close_relationship(db, user_id, coach_id, RequestStatus::EndedByCoach).await?;
    notification_service::notify(
        db.clone(),
        notification_service::Recipient::User(user_id.to_string()),
        "relationship_ended",
        "Coaching ended",
        "Your coach ended the coaching relationship.",
    );
    Ok(request)
}

/// User blocks the active coach: ends the relationship and writes a
/// block-list marker that send_request checks from then on.
pub async fn block_coach(db: &MongoDB, user_id: &str) -> Result<CoachRequest, AppError> {
    let coach_id = active_coach_of(db, user_id).await?;
    let request = close_relationship(db, user_id, &coach_id, RequestStatus::BlockedByUser).await?;

    db.collection::<BlockedCoach>(BLOCKED)
        .update_one(
            doc! { "user_id": user_id, "nutritionist_id": &coach_id },
            doc! { "$set": { "blocked_at": chrono::Utc::now().timestamp() } },
        )
        .upsert(true)
        .await
        .map_err(AppError::db)?;

    log::info!("🚫 Coach {} blocked by user {}", coach_id, user_id);

    Ok(request)
}

async fn active_coach_of(db: &MongoDB, user_id: &str) -> Result<String, AppError> {
    let user = auth_service::find_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    user.active_coach_id
        .ok_or_else(|| AppError::Conflict("No active coach".into()))
}

async fn close_relationship(
    db: &MongoDB,
    user_id: &str,
    coach_id: &str,
    terminal: RequestStatus,
) -> Result<CoachRequest, AppError> {
    let requests = db.collection::<CoachRequest>(REQUESTS);
    let now = chrono::Utc::now().timestamp();

    let request = requests
        .find_one_and_update(
            doc! {
                "user_id": user_id,
                "nutritionist_id": coach_id,
                "status": RequestStatus::Selected.as_str(),
            },
            doc! { "$set": { "status": terminal.as_str(), "ended_at": now } },
        )
        .return_document(ReturnDocument::After)
        .await
        .map_err(AppError::db)?
        .ok_or_else(|| AppError::Conflict("No selected request for this coach".into()))?;

    db.collection::<User>("users")
        .update_one(
            doc! { "user_id": user_id, "active_coach_id": coach_id },
            doc! { "$set": { "active_coach_id": mongodb::bson::Bson::Null } },
        )
        .await
        .map_err(AppError::db)?;

    db.collection::<Nutritionist>("nutritionists")
        .update_one(
            doc! { "nutritionist_id": coach_id },
            doc! { "$pull": { "client_ids": user_id } },
        )
        .await
        .map_err(AppError::db)?;

    log::info!("💔 Relationship {} <-> {} closed ({})", user_id, coach_id, terminal);

    Ok(request)
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct RatingResult {
    pub average_rating: f64,
    pub rating_count: i64,
}

/// Rates a current or former coach. One rating doc per (coach, user) pair:
/// a second rating replaces the first and the aggregate is adjusted by the
/// delta, so the count never double-grows.
pub async fn rate_coach(
    db: &MongoDB,
    user_id: &str,
    nutritionist_id: &str,
    stars: i64,
    comment: Option<String>,
) -> Result<RatingResult, AppError> {
    if !(1..=5).contains(&stars) {
        return Err(AppError::Validation("stars must be between 1 and 5".into()));
    }

    let requests = db.collection::<CoachRequest>(REQUESTS);
    let rateable = requests
        .find_one(doc! {
            "user_id": user_id,
            "nutritionist_id": nutritionist_id,
            "status": { "$in": ["selected", "ended_by_user", "ended_by_coach", "rated"] },
        })
        .await
        .map_err(AppError::db)?;
    if rateable.is_none() {
        return Err(AppError::Forbidden("You can only rate a current or former coach".into()));
    }

    let now = chrono::Utc::now().timestamp();
    let ratings = db.collection::<CoachRating>(RATINGS);

    let previous = ratings
        .find_one_and_update(
            doc! { "nutritionist_id": nutritionist_id, "user_id": user_id },
            doc! { "$set": {
                "stars": stars,
                "comment": comment.as_deref().map(mongodb::bson::Bson::from).unwrap_or(mongodb::bson::Bson::Null),
                "updated_at": now,
            }},
        )
        .upsert(true)
        .return_document(ReturnDocument::Before)
        .await
        .map_err(AppError::db)?;

    let (sum_delta, count_delta) = match previous {
        Some(old) => (stars - old.stars, 0),
        None => (stars, 1),
    };

    let coaches = db.collection::<Nutritionist>("nutritionists");
    let coach = coaches
        .find_one_and_update(
            doc! { "nutritionist_id": nutritionist_id },
            doc! { "$inc": { "rating_sum": sum_delta, "rating_count": count_delta } },
        )
        .return_document(ReturnDocument::After)
        .await
        .map_err(AppError::db)?
        .ok_or_else(|| AppError::NotFound("Coach not found".into()))?;

    let average = round_average(coach.rating_sum, coach.rating_count);
    coaches
        .update_one(
            doc! { "nutritionist_id": nutritionist_id },
            doc! { "$set": { "average_rating": average } },
        )
        .await
        .map_err(AppError::db)?;

    // An ended relationship is marked rated; an active one stays selected
    let _ = requests
        .update_one(
            doc! {
                "user_id": user_id,
                "nutritionist_id": nutritionist_id,
                "status": { "$in": ["ended_by_user", "ended_by_coach"] },
            },
            doc! { "$set": { "status": RequestStatus::Rated.as_str(), "rated_at": now } },
        )
        .await;

    log::info!("⭐ Coach {} rated {} by {} (avg {:.1})", nutritionist_id, stars, user_id, average);

    Ok(RatingResult { average_rating: average, rating_count: coach.rating_count })
}

/// Aggregate average rounded to one decimal.
pub fn round_average(sum: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    ((sum as f64 / count as f64) * 10.0).round() / 10.0
}

pub async fn get_user_requests(db: &MongoDB, user_id: &str) -> Result<Vec<CoachRequest>, AppError> {
    collect_requests(db, doc! { "user_id": user_id }).await
}

pub async fn get_coach_requests(db: &MongoDB, coach_id: &str) -> Result<Vec<CoachRequest>, AppError> {
    collect_requests(
        db,
        doc! { "nutritionist_id": coach_id, "status": RequestStatus::Pending.as_str() },
    )
    .await
}

async fn collect_requests(
    db: &MongoDB,
    filter: mongodb::bson::Document,
) -> Result<Vec<CoachRequest>, AppError> {
    let mut cursor = db
        .collection::<CoachRequest>(REQUESTS)
        .find(filter)
        .await
        .map_err(AppError::db)?;

    let mut requests = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(request) => requests.push(request),
            Err(e) => log::error!("❌ Failed to read coach request: {}", e),
        }
    }
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(requests)
}

pub async fn get_coach_clients(db: &MongoDB, coach_id: &str) -> Result<Vec<User>, AppError> {
    let coach = auth_service::find_coach(db, coach_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coach not found".into()))?;

    if coach.client_ids.is_empty() {
        return Ok(vec![]);
    }

    let mut cursor = db
        .collection::<User>("users")
        .find(doc! { "user_id": { "$in": &coach.client_ids } })
        .await
        .map_err(AppError::db)?;

    let mut clients = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => clients.push(user),
            Err(e) => log::error!("❌ Failed to read client: {}", e),
        }
    }
    Ok(clients)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_average_one_decimal() {
        assert_eq!(round_average(13, 3), 4.3);
        assert_eq!(round_average(14, 3), 4.7);
        assert_eq!(round_average(25, 5), 5.0);
        assert_eq!(round_average(0, 0), 0.0);
    }

    #[test]
    fn test_rating_replacement_delta() {
        // Re-rating adjusts sum by the delta and leaves count untouched:
        // old rating 2 out of (sum 10, count 3), re-rated to 5 -> sum 13
        let old_stars = 2i64;
        let new_stars = 5i64;
        let sum = 10 + (new_stars - old_stars);
        assert_eq!(round_average(sum, 3), 4.3);
    }

    #[test]
    fn test_send_request_guard_table() {
        // All clear
        assert!(send_request_guard(false, false, true, false).is_ok());
        // Active coach wins with 409
        assert!(matches!(
            send_request_guard(true, false, true, false),
            Err(AppError::Conflict(_))
        ));
        // Blocked coach is 403
        assert!(matches!(
            send_request_guard(false, true, true, false),
            Err(AppError::Forbidden(_))
        ));
        // Unverified or deactivated coach is 403
        assert!(matches!(
            send_request_guard(false, false, false, false),
            Err(AppError::Forbidden(_))
        ));
        // A live (non-terminal) request to the same coach is 409
        assert!(matches!(
            send_request_guard(false, false, true, true),
            Err(AppError::Conflict(_))
        ));
        // Active coach outranks the duplicate check
        assert!(matches!(
            send_request_guard(true, false, true, true),
            Err(AppError::Conflict(msg)) if msg.contains("active coach")
        ));
    }

    async fn test_db() -> MongoDB {
        let uri = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/BiteWiseTest".to_string());
        MongoDB::new(&uri).await.expect("test database connection")
    }

    fn test_user(user_id: &str) -> User {
        User {
            id: None,
            user_id: user_id.to_string(),
            email: format!("{}@test.local", user_id),
            password: None,
            name: "Test User".to_string(),
            roles: vec!["user".to_string()],
            is_active: true,
            weight_kg: None,
            height_cm: None,
            age: None,
            gender: None,
            activity_level: None,
            goal: None,
            nutrition_plan: None,
            active_coach_id: None,
            current_streak: 0,
            longest_streak: 0,
            last_streak_day_logged: None,
            achieved_streak_7: false,
            first_meal_logged_at: None,
            expo_push_token: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn test_coach(nutritionist_id: &str) -> Nutritionist {
        Nutritionist {
            id: None,
            nutritionist_id: nutritionist_id.to_string(),
            email: format!("{}@test.local", nutritionist_id),
            password: None,
            name: "Test Coach".to_string(),
            roles: vec!["nutritionist".to_string()],
            is_active: true,
            specialization: None,
            bio: None,
            years_experience: None,
            is_verified: true,
            verification_status: "approved".to_string(),
            rejected_at: None,
            client_ids: vec![],
            rating_sum: 0,
            rating_count: 0,
            average_rating: 0.0,
            expo_push_token: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn accepted_request(user_id: &str, nutritionist_id: &str) -> CoachRequest {
        let mut request = CoachRequest::new(user_id, nutritionist_id);
        request.status = RequestStatus::Accepted;
        request.responded_at = Some(request.created_at);
        request
    }

    async fn cleanup(db: &MongoDB, user_id: &str, coach_ids: &[&str]) {
        let _ = db
            .collection::<User>("users")
            .delete_many(doc! { "user_id": user_id })
            .await;
        let _ = db
            .collection::<Nutritionist>("nutritionists")
            .delete_many(doc! { "nutritionist_id": { "$in": coach_ids.to_vec() } })
            .await;
        let _ = db
            .collection::<CoachRequest>(REQUESTS)
            .delete_many(doc! { "user_id": user_id })
            .await;
    }

    #[actix_rt::test]
    #[ignore] // needs a running MongoDB, point TEST_DATABASE_URL at it
    async fn test_second_live_request_is_conflict() {
        let db = test_db().await;
        let suffix = uuid::Uuid::new_v4().to_string();
        let user_id = format!("user-{}", suffix);
        let coach_id = format!("coach-{}", suffix);

        db.collection::<User>("users").insert_one(test_user(&user_id)).await.unwrap();
        db.collection::<Nutritionist>("nutritionists")
            .insert_one(test_coach(&coach_id))
            .await
            .unwrap();

        send_request(&db, &user_id, &coach_id).await.unwrap();
        let err = send_request(&db, &user_id, &coach_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Exactly one request document exists for the pair
        let count = db
            .collection::<CoachRequest>(REQUESTS)
            .count_documents(doc! { "user_id": &user_id, "nutritionist_id": &coach_id })
            .await
            .unwrap();
        assert_eq!(count, 1);

        cleanup(&db, &user_id, &[&coach_id]).await;
    }

    #[actix_rt::test]
    #[ignore] // needs a running MongoDB, point TEST_DATABASE_URL at it
    async fn test_select_second_coach_conflicts_and_keeps_first() {
        let db = test_db().await;
        let suffix = uuid::Uuid::new_v4().to_string();
        let user_id = format!("user-{}", suffix);
        let coach_a = format!("coach-a-{}", suffix);
        let coach_b = format!("coach-b-{}", suffix);

        db.collection::<User>("users").insert_one(test_user(&user_id)).await.unwrap();
        let coaches = db.collection::<Nutritionist>("nutritionists");
        coaches.insert_one(test_coach(&coach_a)).await.unwrap();
        coaches.insert_one(test_coach(&coach_b)).await.unwrap();

        let requests = db.collection::<CoachRequest>(REQUESTS);
        requests.insert_one(accepted_request(&user_id, &coach_a)).await.unwrap();
        requests.insert_one(accepted_request(&user_id, &coach_b)).await.unwrap();

        let first = select_coach(&db, &user_id, &coach_a).await.unwrap();
        assert_eq!(first.status, RequestStatus::Selected);

        let err = select_coach(&db, &user_id, &coach_b).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // The losing select changed nothing: slot still held by the first
        // coach, the second request still accepted and selectable later
        let user = auth_service::find_user(&db, &user_id).await.unwrap().unwrap();
        assert_eq!(user.active_coach_id.as_deref(), Some(coach_a.as_str()));

        let second = requests
            .find_one(doc! { "user_id": &user_id, "nutritionist_id": &coach_b })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.status, RequestStatus::Accepted);
        assert!(second.selected_at.is_none());

        let winner = coaches
            .find_one(doc! { "nutritionist_id": &coach_a })
            .await
            .unwrap()
            .unwrap();
        assert!(winner.client_ids.contains(&user_id));

        cleanup(&db, &user_id, &[&coach_a, &coach_b]).await;
    }
}
