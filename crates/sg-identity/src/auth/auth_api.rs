//! Auth API Endpoints
//!
//! Cookie-session authentication endpoints.
//! - POST /login - Password-based login
//! - POST /google/login - Federated (Google) login
//! - POST /register - Account registration
//! - POST /role - Role selection after registration
//! - POST /logout - Session teardown
//! - GET /status - Session check

use axum::{
    extract::State,
    Json,
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use utoipa::ToSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::{UserRepository, SessionRepository};
use crate::{Session, User, UserRole};
use crate::PasswordService;
use crate::FederatedSyncService;
use crate::shared::error::IdentityError;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// User ID
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Assigned role (omitted until role selection)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Present (true) only while role selection is pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_role_assignment: Option<bool>,
}

/// Google login request
///
/// Carries an already-verified Google identity assertion; token
/// verification happens upstream.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    /// Google subject ID
    pub google_id: String,

    /// Email address
    pub email: String,

    /// Display name
    pub full_name: String,
}

/// Google login response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginResponse {
    /// User ID
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Assigned role (omitted until role selection)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Whether role selection is complete
    pub role_assigned: bool,
}

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,

    /// Display name
    pub full_name: String,
}

/// Registration response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// User ID
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Always true for a fresh account
    pub needs_role_assignment: bool,
}

/// Role assignment request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    /// User ID
    pub user_id: String,

    /// Role name ("student" or "professor")
    pub role: String,

    /// Student number; generated when absent and the role is student
    pub student_id: Option<String>,
}

/// Role assignment response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleResponse {
    /// User ID
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub full_name: String,
    /// The assigned role
    pub role: UserRole,
    /// Student number (students only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

/// Logout response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    /// Confirmation message
    pub message: String,
}

/// Authentication status response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Whether the browser session is authenticated
    pub authenticated: bool,
    /// User ID (authenticated only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Email address (authenticated only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name (authenticated only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Assigned role (authenticated with a role only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Whether role selection is complete (authenticated only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_assigned: Option<bool>,
}

impl StatusResponse {
    /// Status body for an unauthenticated session
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            user_id: None,
            email: None,
            full_name: None,
            role: None,
            role_assigned: None,
        }
    }
}

/// Auth service state
#[derive(Clone)]
pub struct AuthState {
    pub user_repo: Arc<UserRepository>,
    pub session_repo: Arc<SessionRepository>,
    pub password_service: Arc<PasswordService>,
    pub federated_sync: Arc<FederatedSyncService>,
    /// Session cookie name (default: "sg_session")
    pub session_cookie_name: String,
    /// Whether to set Secure flag on cookie
    pub session_cookie_secure: bool,
    /// SameSite policy for cookie
    pub session_cookie_same_site: String,
    /// Session expiry in seconds
    pub session_ttl_secs: i64,
}

impl AuthState {
    /// Create with default cookie settings
    pub fn new(
        user_repo: Arc<UserRepository>,
        session_repo: Arc<SessionRepository>,
        password_service: Arc<PasswordService>,
        federated_sync: Arc<FederatedSyncService>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            password_service,
            federated_sync,
            session_cookie_name: "sg_session".to_string(),
            session_cookie_secure: false,
            session_cookie_same_site: "Lax".to_string(),
            session_ttl_secs: 28800, // 8 hours
        }
    }

    /// Configure session cookie settings
    pub fn with_session_cookie_settings(
        mut self,
        name: &str,
        secure: bool,
        same_site: &str,
        ttl_secs: i64,
    ) -> Self {
        self.session_cookie_name = name.to_string();
        self.session_cookie_secure = secure;
        self.session_cookie_same_site = same_site.to_string();
        self.session_ttl_secs = ttl_secs;
        self
    }
}

/// Reject blank required fields
fn require_field(value: &str, name: &str) -> Result<(), IdentityError> {
    if value.trim().is_empty() {
        return Err(IdentityError::validation(format!(
            "Missing required field: {}",
            name
        )));
    }
    Ok(())
}

/// Parse a role name from the wire
fn parse_role(value: &str) -> Result<UserRole, IdentityError> {
    match value.to_lowercase().as_str() {
        "student" => Ok(UserRole::Student),
        "professor" => Ok(UserRole::Professor),
        _ => Err(IdentityError::validation(format!("Unknown role: {}", value))),
    }
}

/// Build the session cookie
fn session_cookie(state: &AuthState, value: String, max_age: time::Duration) -> Cookie<'static> {
    let same_site = match state.session_cookie_same_site.to_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    };

    Cookie::build((state.session_cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .secure(state.session_cookie_secure)
        .same_site(same_site)
        .max_age(max_age)
        .build()
}

/// Open a session for the user and set the cookie
async fn open_session(
    state: &AuthState,
    jar: CookieJar,
    user_id: &str,
) -> Result<CookieJar, IdentityError> {
    let (raw_token, session) =
        Session::generate(user_id, chrono::Duration::seconds(state.session_ttl_secs));
    state.session_repo.insert(&session).await?;

    Ok(jar.add(session_cookie(
        state,
        raw_token,
        time::Duration::seconds(state.session_ttl_secs),
    )))
}

/// Login with email and password
///
/// Authenticates a user with password credentials and opens a
/// cookie-backed session.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    operation_id = "postAuthLogin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing required field"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    require_field(&req.email, "email")?;
    require_field(&req.password, "password")?;

    // Find user by email
    let user = state
        .user_repo
        .find_by_email(&req.email)
        .await?
        .ok_or(IdentityError::InvalidCredentials)?;

    // Verify password using Argon2id. Accounts without a password
    // (federated-only) fail the same as a wrong password.
    let password_valid = user
        .password_hash
        .as_ref()
        .map(|hash| state.password_service.verify_password(&req.password, hash))
        .unwrap_or(false);

    if !password_valid {
        return Err(IdentityError::InvalidCredentials);
    }

    // A disabled account is indistinguishable from bad credentials
    if user.disabled {
        return Err(IdentityError::InvalidCredentials);
    }

    let jar = open_session(&state, jar, &user.id).await?;

    info!(user_id = %user.id, "Login successful");

    let response = LoginResponse {
        user_id: user.id.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role: user.role,
        needs_role_assignment: user.needs_role_assignment().then_some(true),
    };

    // Return both the cookie jar and JSON response
    Ok((jar, Json(response)))
}

/// Login with a Google identity
///
/// Accepts a verified Google identity assertion, reconciles it with the
/// user store (match by external id, link by email, or create a fresh
/// account) and opens a cookie-backed session.
#[utoipa::path(
    post,
    path = "/google/login",
    tag = "auth",
    operation_id = "postAuthGoogleLogin",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = GoogleLoginResponse),
        (status = 400, description = "Missing required field")
    )
)]
pub async fn google_login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    require_field(&req.google_id, "googleId")?;
    require_field(&req.email, "email")?;
    require_field(&req.full_name, "fullName")?;

    let user = state
        .federated_sync
        .sync_federated_user(&req.google_id, &req.email, &req.full_name)
        .await?;

    let jar = open_session(&state, jar, &user.id).await?;

    let response = GoogleLoginResponse {
        user_id: user.id.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role: user.role,
        role_assigned: user.role_assigned,
    };

    Ok((jar, Json(response)))
}

/// Register a new account
///
/// Creates a user with password credentials. Does not authenticate the
/// browser session; the client logs in separately.
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    operation_id = "postAuthRegister",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Missing required field"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    require_field(&req.email, "email")?;
    require_field(&req.password, "password")?;
    require_field(&req.full_name, "fullName")?;

    // Pre-check; the unique email index closes the remaining race
    if state.user_repo.email_taken(&req.email).await? {
        return Err(IdentityError::conflict("User", "email", &req.email));
    }

    let password_hash = state.password_service.hash_password(&req.password)?;
    let user = User::new_local(&req.email, &req.full_name, password_hash);
    state.user_repo.insert(&user).await?;

    info!(user_id = %user.id, "User registered");

    let response = RegisterResponse {
        user_id: user.id.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        needs_role_assignment: user.needs_role_assignment(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Assign a role to a user
///
/// Sets the user's role after registration. Students get a generated
/// student number unless one is supplied.
#[utoipa::path(
    post,
    path = "/role",
    tag = "auth",
    operation_id = "postAuthRole",
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned", body = AssignRoleResponse),
        (status = 400, description = "Missing field or unknown role"),
        (status = 404, description = "User not found")
    )
)]
pub async fn assign_role(
    State(state): State<AuthState>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<impl IntoResponse, IdentityError> {
    require_field(&req.user_id, "userId")?;
    require_field(&req.role, "role")?;
    let role = parse_role(&req.role)?;

    let mut user = state
        .user_repo
        .find_by_id(&req.user_id)
        .await?
        .ok_or_else(|| IdentityError::not_found("User", &req.user_id))?;

    user.assign_role(role, req.student_id.clone());
    state.user_repo.update(&user).await?;

    info!(user_id = %user.id, role = role.as_str(), "Role assigned");

    let response = AssignRoleResponse {
        user_id: user.id.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role,
        student_id: user.student_id.clone(),
    };

    Ok(Json(response))
}

/// Logout
///
/// Deletes the server-side session (if any) and clears the cookie.
/// Idempotent: safe to call without a session.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    operation_id = "postAuthLogout",
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse)
    )
)]
pub async fn logout(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, IdentityError> {
    // Remove the server-side session for the presented token
    let token_hash = jar
        .get(&state.session_cookie_name)
        .map(|cookie| Session::hash_token(cookie.value()));

    if let Some(token_hash) = token_hash {
        state.session_repo.delete_by_hash(&token_hash).await?;
    }

    // Clear the session cookie by setting it to expire immediately
    let jar = jar.add(session_cookie(&state, String::new(), time::Duration::ZERO));

    Ok((
        jar,
        Json(LogoutResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// Get authentication status
///
/// Read-only check of the current browser session. Always returns 200;
/// the `authenticated` flag tells the two states apart. A session whose
/// user no longer resolves is invalidated on the way out.
#[utoipa::path(
    get,
    path = "/status",
    tag = "auth",
    operation_id = "getAuthStatus",
    responses(
        (status = 200, description = "Authentication status", body = StatusResponse)
    )
)]
pub async fn status(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, IdentityError> {
    let raw_token = jar
        .get(&state.session_cookie_name)
        .map(|cookie| cookie.value().to_string());

    let raw_token = match raw_token {
        Some(token) => token,
        None => return Ok((jar, Json(StatusResponse::anonymous()))),
    };

    let token_hash = Session::hash_token(&raw_token);
    let session = match state.session_repo.find_valid_by_hash(&token_hash).await? {
        Some(session) => session,
        None => {
            // Unknown or expired token; drop the stale cookie
            let jar = jar.add(session_cookie(&state, String::new(), time::Duration::ZERO));
            return Ok((jar, Json(StatusResponse::anonymous())));
        }
    };

    let user = match state.user_repo.find_by_id(&session.user_id).await? {
        Some(user) => user,
        None => {
            // Session points at a user record that no longer resolves
            state.session_repo.delete_by_hash(&token_hash).await?;
            let jar = jar.add(session_cookie(&state, String::new(), time::Duration::ZERO));
            return Ok((jar, Json(StatusResponse::anonymous())));
        }
    };

    let response = StatusResponse {
        authenticated: true,
        user_id: Some(user.id.clone()),
        email: Some(user.email.clone()),
        full_name: Some(user.full_name.clone()),
        role: user.role,
        role_assigned: Some(user.role_assigned),
    };

    Ok((jar, Json(response)))
}

/// Create the auth router
pub fn auth_router(state: AuthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(google_login))
        .routes(routes!(register))
        .routes(routes!(assign_role))
        .routes(routes!(logout))
        .routes(routes!(status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_deserialization() {
        let json = r#"{"email":"test@example.com","password":"secret"}"#;
        let req: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.email, "test@example.com");
        assert_eq!(req.password, "secret");
    }

    #[test]
    fn test_login_response_pending_role() {
        let response = LoginResponse {
            user_id: "user-123".to_string(),
            email: "test@example.com".to_string(),
            full_name: "Test User".to_string(),
            role: None,
            needs_role_assignment: Some(true),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("userId"));
        assert!(json.contains("fullName"));
        assert!(json.contains("needsRoleAssignment"));
        assert!(!json.contains("\"role\""));
    }

    #[test]
    fn test_login_response_with_role() {
        let response = LoginResponse {
            user_id: "user-123".to_string(),
            email: "test@example.com".to_string(),
            full_name: "Test User".to_string(),
            role: Some(UserRole::Student),
            needs_role_assignment: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"role\":\"student\""));
        assert!(!json.contains("needsRoleAssignment"));
    }

    #[test]
    fn test_google_login_request_wire_names() {
        let json = r#"{"googleId":"g-123","email":"test@example.com","fullName":"Test User"}"#;
        let req: GoogleLoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.google_id, "g-123");
        assert_eq!(req.full_name, "Test User");
    }

    #[test]
    fn test_assign_role_request_optional_student_id() {
        let req: AssignRoleRequest = serde_json::from_str(
            r#"{"userId":"user-1","role":"student","studentId":"S123"}"#,
        )
        .unwrap();
        assert_eq!(req.student_id, Some("S123".to_string()));

        // studentId may be omitted entirely
        let req: AssignRoleRequest =
            serde_json::from_str(r#"{"userId":"user-1","role":"professor"}"#).unwrap();
        assert!(req.student_id.is_none());
    }

    #[test]
    fn test_status_anonymous_shape() {
        let json = serde_json::to_string(&StatusResponse::anonymous()).unwrap();
        assert_eq!(json, r#"{"authenticated":false}"#);
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("student").unwrap(), UserRole::Student);
        assert_eq!(parse_role("PROFESSOR").unwrap(), UserRole::Professor);
        assert!(parse_role("admin").is_err());
    }

    #[test]
    fn test_require_field() {
        assert!(require_field("value", "email").is_ok());
        assert!(require_field("", "email").is_err());
        assert!(require_field("   ", "email").is_err());
    }
}
