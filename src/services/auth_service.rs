use crate::{
    database::MongoDB,
    models::{
        ActivityLevel, Gender, Goal, Nutritionist, NutritionPlan, User,
        default_verification_status,
    },
    services::plan_service,
    utils::error::AppError,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user_id or nutritionist_id
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub aud: String,           // audience
    pub iss: String,           // issuer
}

impl Claims {
    pub fn is_coach(&self) -> bool {
        self.roles.iter().any(|r| r == "nutritionist")
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// "personal" (default) or "nutritionist"
    pub account_type: Option<String>,

    // Personal accounts: body metrics for the signup nutrition plan
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,

    // Nutritionist accounts
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub years_experience: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: Option<String>,
    pub user: AccountInfo,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AccountInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub nutrition_plan: Option<NutritionPlan>,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bitewise-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bitewise-app".to_string())
}

// Generate JWT token (24h)
pub fn generate_jwt(
    sub: &str,
    email: &str,
    name: Option<String>,
    roles: &[String],
    is_active: bool,
) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: sub.to_string(),
        email: email.to_string(),
        name,
        roles: roles.to_vec(),
        is_active,
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Config(format!("Failed to generate token: {}", e)))
}

// Generate refresh token (30 days)
pub fn generate_refresh_token(sub: &str, roles: &[String]) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::days(30)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: sub.to_string(),
        email: String::new(),
        name: None,
        roles: roles.to_vec(),
        is_active: true,
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Config(format!("Failed to generate refresh token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

// Account registration (personal user or nutritionist)
pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<AuthResponse, AppError> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    if request.password.len() < 6 {
        return Err(AppError::Validation("Password must be at least 6 characters".into()));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }

    let account_type = request.account_type.as_deref().unwrap_or("personal");

    // One email across both account collections
    if find_user_by_email(db, &request.email).await?.is_some()
        || find_coach_by_email(db, &request.email).await?.is_some()
    {
        return Err(AppError::Conflict("An account with this email already exists".into()));
    }

    let hashed_password = hash(&request.password, DEFAULT_COST)
        .map_err(|e| AppError::Config(format!("Failed to hash password: {}", e)))?;

    match account_type {
        "personal" => register_personal(db, request, hashed_password).await,
        "nutritionist" => register_nutritionist(db, request, hashed_password).await,
        other => Err(AppError::Validation(format!(
            "Invalid account_type: {}. Supported: personal, nutritionist",
            other
        ))),
    }
}

async fn register_personal(
    db: &MongoDB,
    request: &RegisterRequest,
    hashed_password: String,
) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>("users");
    let new_user_id = ObjectId::new().to_hex();

    // Compute the macro plan at signup when the body metrics are complete
    let nutrition_plan = match (
        request.weight_kg,
        request.height_cm,
        request.age,
        request.gender,
        request.activity_level,
        request.goal,
    ) {
        (Some(weight), Some(height), Some(age), Some(gender), Some(activity), Some(goal)) => Some(
            plan_service::calculate_nutrition_plan(weight, height, age, gender, activity, goal)?,
        ),
        _ => None,
    };

    let new_user = User {
        id: None,
        user_id: new_user_id.clone(),
        email: request.email.clone(),
        password: Some(hashed_password),
        name: request.name.clone(),
        roles: vec!["user".to_string()],
        is_active: true,
        weight_kg: request.weight_kg,
        height_cm: request.height_cm,
        age: request.age,
        gender: request.gender,
        activity_level: request.activity_level,
        goal: request.goal,
        nutrition_plan: nutrition_plan.clone(),
        active_coach_id: None,
        current_streak: 0,
        longest_streak: 0,
        last_streak_day_logged: None,
        achieved_streak_7: false,
        first_meal_logged_at: None,
        expo_push_token: None,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    };

    collection.insert_one(&new_user).await.map_err(AppError::db)?;

    let token = generate_jwt(&new_user_id, &new_user.email, Some(new_user.name.clone()), &new_user.roles, true)?;
    let refresh_token = generate_refresh_token(&new_user_id, &new_user.roles)?;

    log::info!("✅ Personal account registered: {}", new_user.email);

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: AccountInfo {
            id: new_user_id,
            email: new_user.email,
            name: new_user.name,
            roles: new_user.roles,
            nutrition_plan,
        },
    })
}

async fn register_nutritionist(
    db: &MongoDB,
    request: &RegisterRequest,
    hashed_password: String,
) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<Nutritionist>("nutritionists");
    let new_coach_id = ObjectId::new().to_hex();

    let new_coach = Nutritionist {
        id: None,
        nutritionist_id: new_coach_id.clone(),
        email: request.email.clone(),
        password: Some(hashed_password),
        name: request.name.clone(),
        roles: vec!["nutritionist".to_string()],
        is_active: true,
        specialization: request.specialization.clone(),
        bio: request.bio.clone(),
        years_experience: request.years_experience,
        is_verified: false,
        verification_status: default_verification_status(),
        rejected_at: None,
        client_ids: vec![],
        rating_sum: 0,
        rating_count: 0,
        average_rating: 0.0,
        expo_push_token: None,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    };

    collection.insert_one(&new_coach).await.map_err(AppError::db)?;

    let token = generate_jwt(&new_coach_id, &new_coach.email, Some(new_coach.name.clone()), &new_coach.roles, true)?;
    let refresh_token = generate_refresh_token(&new_coach_id, &new_coach.roles)?;

    log::info!("✅ Nutritionist registered (pending verification): {}", new_coach.email);

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: AccountInfo {
            id: new_coach_id,
            email: new_coach.email,
            name: new_coach.name,
            roles: new_coach.roles,
            nutrition_plan: None,
        },
    })
}

// Login checks both account collections; disabled accounts are rejected.
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    if let Some(user) = find_user_by_email(db, &request.email).await? {
        let stored = user
            .password
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;
        check_password(&request.password, stored)?;
        if !user.is_active {
            return Err(AppError::Forbidden("Account is disabled".into()));
        }
        let token = generate_jwt(&user.user_id, &user.email, Some(user.name.clone()), &user.roles, true)?;
        let refresh_token = generate_refresh_token(&user.user_id, &user.roles)?;
        return Ok(AuthResponse {
            success: true,
            token,
            refresh_token: Some(refresh_token),
            user: AccountInfo {
                id: user.user_id,
                email: user.email,
                name: user.name,
                roles: user.roles,
                nutrition_plan: user.nutrition_plan,
            },
        });
    }

    if let Some(coach) = find_coach_by_email(db, &request.email).await? {
        let stored = coach
            .password
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;
        check_password(&request.password, stored)?;
        if !coach.is_active {
            return Err(AppError::Forbidden("Account is disabled".into()));
        }
        let token = generate_jwt(&coach.nutritionist_id, &coach.email, Some(coach.name.clone()), &coach.roles, true)?;
        let refresh_token = generate_refresh_token(&coach.nutritionist_id, &coach.roles)?;
        return Ok(AuthResponse {
            success: true,
            token,
            refresh_token: Some(refresh_token),
            user: AccountInfo {
                id: coach.nutritionist_id,
                email: coach.email,
                name: coach.name,
                roles: coach.roles,
                nutrition_plan: None,
            },
        });
    }

    Err(AppError::Unauthorized("Invalid credentials".into()))
}

fn check_password(candidate: &str, stored_hash: &str) -> Result<(), AppError> {
    let valid = verify(candidate, stored_hash)
        .map_err(|e| AppError::Config(format!("Password verification error: {}", e)))?;
    if valid {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid credentials".into()))
    }
}

// Refresh: re-validates the account before issuing new tokens
pub async fn refresh_token(db: &MongoDB, request: &RefreshTokenRequest) -> Result<AuthResponse, AppError> {
    let claims = verify_token(&request.refresh_token)?;

    if claims.roles.iter().any(|r| r == "nutritionist") {
        let coach = find_coach(db, &claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".into()))?;
        if !coach.is_active {
            return Err(AppError::Forbidden("Account is disabled".into()));
        }
        let token = generate_jwt(&coach.nutritionist_id, &coach.email, Some(coach.name.clone()), &coach.roles, true)?;
        let new_refresh = generate_refresh_token(&coach.nutritionist_id, &coach.roles)?;
        return Ok(AuthResponse {
            success: true,
            token,
            refresh_token: Some(new_refresh),
            user: AccountInfo {
                id: coach.nutritionist_id,
                email: coach.email,
                name: coach.name,
                roles: coach.roles,
                nutrition_plan: None,
            },
        });
    }

    let user = find_user(db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".into()))?;
    if !user.is_active {
        return Err(AppError::Forbidden("Account is disabled".into()));
    }
    let token = generate_jwt(&user.user_id, &user.email, Some(user.name.clone()), &user.roles, true)?;
    let new_refresh = generate_refresh_token(&user.user_id, &user.roles)?;
    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(new_refresh),
        user: AccountInfo {
            id: user.user_id,
            email: user.email,
            name: user.name,
            roles: user.roles,
            nutrition_plan: user.nutrition_plan,
        },
    })
}

// Shared lookups

pub async fn find_user(db: &MongoDB, user_id: &str) -> Result<Option<User>, AppError> {
    db.collection::<User>("users")
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(AppError::db)
}

pub async fn find_coach(db: &MongoDB, nutritionist_id: &str) -> Result<Option<Nutritionist>, AppError> {
    db.collection::<Nutritionist>("nutritionists")
        .find_one(doc! { "nutritionist_id": nutritionist_id })
        .await
        .map_err(AppError::db)
}

async fn find_user_by_email(db: &MongoDB, email: &str) -> Result<Option<User>, AppError> {
    db.collection::<User>("users")
        .find_one(doc! { "email": email })
        .await
        .map_err(AppError::db)
}

async fn find_coach_by_email(db: &MongoDB, email: &str) -> Result<Option<Nutritionist>, AppError> {
    db.collection::<Nutritionist>("nutritionists")
        .find_one(doc! { "email": email })
        .await
        .map_err(AppError::db)
}
