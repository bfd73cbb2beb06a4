use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pitchside_store::{Account, AccountRole};

use crate::error::AppError;
use crate::middleware::auth::Claims;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    email: String,
    phone: Option<String>,
    password: String,
    role: AccountRole,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    role: AccountRole,
    created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            phone: account.phone,
            role: account.role,
            created_at: account.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

/// POST /auth/register
/// Create an account. A second registration with a known email is a
/// conflict, never a silent login.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let account = state
        .accounts
        .register(req.name, req.email, req.phone, req.role, &req.password)?;
    Ok(Json(account.into()))
}

/// POST /auth/login
/// Issue a JWT for valid credentials
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let account = state.accounts.verify_login(&req.email, &req.password)?;

    let my_claims = Claims {
        sub: account.id.to_string(),
        email: account.email.clone(),
        role: role_name(account.role).to_string(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &my_claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse { token }))
}

/// GET /auth/me
/// Introspect the bearer token and return the account behind it
async fn me(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<AccountResponse>, AppError> {
    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let account_id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::Unauthorized("Malformed subject claim".to_string()))?;
    let account = state
        .accounts
        .get(&account_id)
        .ok_or_else(|| AppError::NotFound(format!("Account not found: {}", account_id)))?;

    Ok(Json(account.into()))
}

fn role_name(role: AccountRole) -> &'static str {
    match role {
        AccountRole::User => "USER",
        AccountRole::Owner => "OWNER",
    }
}
