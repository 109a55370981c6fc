use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, AuthenticatedUser,
        LoginRequest, RegisterRequest,
    },
    error::AppError,
    models::{PublicUser, User},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

/// Register a new user
///
/// Creates an account, stores only the bcrypt hash of the password, and
/// returns a fresh token alongside the public user view.
#[post("/register")]
pub async fn register(
    pool: web::Data<SqlitePool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    // Username and email are each globally unique.
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE email = ? OR username = ?")
            .bind(&register_data.email)
            .bind(&register_data.username)
            .fetch_optional(&**pool)
            .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "User with this email or username already exists".into(),
        ));
    }

    let password_hash = hash_password(&register_data.password)?;
    let role = register_data.role.unwrap_or_default();
    let created_at = Utc::now();

    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, email, password, role, created_at)
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .bind(role)
    .bind(created_at)
    .fetch_one(&**pool)
    .await?;

    let token = generate_token(user_id, &register_data.username, role)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        success: true,
        message: "User registered successfully".into(),
        token,
        user: PublicUser {
            id: user_id,
            username: register_data.username.clone(),
            email: register_data.email.clone(),
            role,
            created_at,
        },
    }))
}

/// Login user
///
/// A missing account and a wrong password produce the same generic 401 so
/// the response does not reveal which factor failed.
#[post("/login")]
pub async fn login(
    pool: web::Data<SqlitePool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user: Option<User> = sqlx::query_as(
        "SELECT id, username, email, password, role, created_at FROM users WHERE email = ?",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    let user = match user {
        Some(user) => user,
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    if !verify_password(&login_data.password, &user.password)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = generate_token(user.id, &user.username, user.role)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        success: true,
        message: "Login successful".into(),
        token,
        user: PublicUser::from(user),
    }))
}

/// Current user profile
///
/// Resolves the caller's claims back to the stored user row; 404 if the
/// account was deleted after the token was issued.
#[get("/me")]
pub async fn me(
    pool: web::Data<SqlitePool>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user: Option<PublicUser> = sqlx::query_as(
        "SELECT id, username, email, role, created_at FROM users WHERE id = ?",
    )
    .bind(caller.id())
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "user": user
        }))),
        None => Err(AppError::NotFound("User not found".into())),
    }
}
