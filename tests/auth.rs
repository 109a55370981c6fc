use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use taskboard::auth::{AuthMiddleware, AuthResponse};
use taskboard::models::Role;
use taskboard::routes;
use taskboard::routes::health;

/// Builds a fresh in-memory database. One connection so every request in a
/// test sees the same database.
async fn test_pool() -> SqlitePool {
    std::env::set_var("JWT_SECRET", "integration-test-secret");

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    taskboard::db::run_migrations(&pool).await.unwrap();
    pool
}

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let pool = test_pool().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::JsonConfig::default().error_handler(taskboard::error::json_error_handler))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    // Register a new user
    let register_payload = json!({
        "username": "integration1",
        "email": "integration@example.com",
        "password": "Password123!"
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );

    let register_response: AuthResponse =
        serde_json::from_slice(&body_bytes).expect("Failed to parse register response JSON");
    assert!(register_response.success);
    assert!(!register_response.token.is_empty());
    assert_eq!(register_response.user.username, "integration1");
    assert_eq!(register_response.user.email, "integration@example.com");
    assert_eq!(register_response.user.role, Role::User);

    // Exact duplicate registration fails
    let req_conflict = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp_conflict = test::call_service(&app, req_conflict).await;
    assert_eq!(
        resp_conflict.status(),
        actix_web::http::StatusCode::BAD_REQUEST
    );

    // Duplicate username with a different email also fails
    let req_dup_username = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "integration1",
            "email": "other@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp_dup_username = test::call_service(&app, req_dup_username).await;
    assert_eq!(
        resp_dup_username.status(),
        actix_web::http::StatusCode::BAD_REQUEST
    );

    // Duplicate email with a different username also fails
    let req_dup_email = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "integration2",
            "email": "integration@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp_dup_email = test::call_service(&app, req_dup_email).await;
    assert_eq!(
        resp_dup_email.status(),
        actix_web::http::StatusCode::BAD_REQUEST
    );

    // Login with the registered credentials
    let req_login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({
            "email": "integration@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    let status_login = resp_login.status();
    let body_bytes_login = test::read_body(resp_login).await;
    assert_eq!(
        status_login,
        actix_web::http::StatusCode::OK,
        "Login failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes_login)
    );

    let login_response: AuthResponse =
        serde_json::from_slice(&body_bytes_login).expect("Failed to parse login response JSON");
    assert!(!login_response.token.is_empty());
    assert_eq!(login_response.user.id, register_response.user.id);
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let pool = test_pool().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::JsonConfig::default().error_handler(taskboard::error::json_error_handler))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let reg_req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "leaktest",
            "email": "leaktest@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let reg_resp = test::call_service(&app, reg_req).await;
    assert!(reg_resp.status().is_success());

    // Wrong password for an existing account
    let req_wrong_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({
            "email": "leaktest@example.com",
            "password": "WrongPassword!"
        }))
        .to_request();
    let resp_wrong_password = test::call_service(&app, req_wrong_password).await;
    assert_eq!(
        resp_wrong_password.status(),
        actix_web::http::StatusCode::UNAUTHORIZED
    );
    let body_wrong_password = test::read_body(resp_wrong_password).await;

    // Account that does not exist at all
    let req_missing_user = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({
            "email": "nobody@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp_missing_user = test::call_service(&app, req_missing_user).await;
    assert_eq!(
        resp_missing_user.status(),
        actix_web::http::StatusCode::UNAUTHORIZED
    );
    let body_missing_user = test::read_body(resp_missing_user).await;

    // Identical bodies: the response must not reveal which factor failed.
    assert_eq!(body_wrong_password, body_missing_user);
    let body: serde_json::Value = serde_json::from_slice(&body_missing_user).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid credentials");
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let pool = test_pool().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::JsonConfig::default().error_handler(taskboard::error::json_error_handler))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let test_cases = vec![
        (
            json!({ "email": "test@example.com", "password": "Password123!" }),
            "missing username",
        ),
        (
            json!({ "username": "testuser", "password": "Password123!" }),
            "missing email",
        ),
        (
            json!({ "username": "testuser", "email": "test@example.com" }),
            "missing password",
        ),
        (
            json!({ "username": "testuser", "email": "invalid-email", "password": "Password123!" }),
            "invalid email format",
        ),
        (
            json!({ "username": "ab", "email": "test@example.com", "password": "Password123!" }),
            "username too short",
        ),
        (
            json!({ "username": "a".repeat(31), "email": "test@example.com", "password": "Password123!" }),
            "username too long",
        ),
        (
            json!({ "username": "user name!", "email": "test@example.com", "password": "Password123!" }),
            "username with invalid chars",
        ),
        (
            json!({ "username": "under_score", "email": "test@example.com", "password": "Password123!" }),
            "username with underscore",
        ),
        (
            json!({ "username": "testuser", "email": "test@example.com", "password": "12345" }),
            "password too short",
        ),
        (
            json!({ "username": "testuser", "email": "test@example.com", "password": "Password123!", "role": "root" }),
            "unknown role",
        ),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            actix_web::http::StatusCode::BAD_REQUEST,
            "Test case failed: {}. Got {}. Body: {:?}",
            description,
            status,
            String::from_utf8_lossy(&body_bytes)
        );

        // Missing-field and bad-role cases fail at deserialization; they
        // must use the envelope like validation failures do.
        let body: serde_json::Value = serde_json::from_slice(&body_bytes)
            .unwrap_or_else(|_| panic!("non-envelope error body for case: {}", description));
        assert_eq!(body["success"], false, "case: {}", description);
        assert!(body["message"].is_string(), "case: {}", description);
    }
}

#[actix_rt::test]
async fn test_me_endpoint() {
    let pool = test_pool().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::JsonConfig::default().error_handler(taskboard::error::json_error_handler))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let reg_req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "profileuser",
            "email": "profile@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let reg_resp = test::call_service(&app, reg_req).await;
    let reg_body = test::read_body(reg_resp).await;
    let auth: AuthResponse = serde_json::from_slice(&reg_body).unwrap();

    // With a valid token
    let req_me = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", format!("Bearer {}", auth.token)))
        .to_request();
    let resp_me = test::call_service(&app, req_me).await;
    assert_eq!(resp_me.status(), actix_web::http::StatusCode::OK);
    let me_body: serde_json::Value =
        serde_json::from_slice(&test::read_body(resp_me).await).unwrap();
    assert_eq!(me_body["success"], true);
    assert_eq!(me_body["user"]["username"], "profileuser");
    assert_eq!(me_body["user"]["email"], "profile@example.com");
    assert_eq!(me_body["user"]["role"], "user");
    assert!(me_body["user"]["created_at"].is_string());
    assert!(me_body["user"].get("password").is_none());

    // Without a token
    let req_anonymous = test::TestRequest::get().uri("/api/auth/me").to_request();
    let resp_anonymous = test::call_service(&app, req_anonymous).await;
    assert_eq!(
        resp_anonymous.status(),
        actix_web::http::StatusCode::UNAUTHORIZED
    );

    // With a garbage token
    let req_garbage = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp_garbage = test::call_service(&app, req_garbage).await;
    assert_eq!(
        resp_garbage.status(),
        actix_web::http::StatusCode::UNAUTHORIZED
    );

    // A valid token whose user row was deleted afterwards resolves, but the
    // profile lookup reports the account gone.
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(auth.user.id)
        .execute(&pool)
        .await
        .unwrap();

    let req_deleted = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", format!("Bearer {}", auth.token)))
        .to_request();
    let resp_deleted = test::call_service(&app, req_deleted).await;
    assert_eq!(
        resp_deleted.status(),
        actix_web::http::StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_issued_token_round_trips_claims() {
    let pool = test_pool().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::JsonConfig::default().error_handler(taskboard::error::json_error_handler))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let reg_req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "claimsadmin",
            "email": "claims@example.com",
            "password": "Password123!",
            "role": "admin"
        }))
        .to_request();
    let reg_resp = test::call_service(&app, reg_req).await;
    assert_eq!(reg_resp.status(), actix_web::http::StatusCode::CREATED);
    let auth: AuthResponse = serde_json::from_slice(&test::read_body(reg_resp).await).unwrap();

    let claims = taskboard::auth::verify_token(&auth.token).expect("issued token must verify");
    assert_eq!(claims.sub, auth.user.id);
    assert_eq!(claims.username, "claimsadmin");
    assert_eq!(claims.role, Role::Admin);
    assert!(claims.exp > claims.iat);
}
