//! Demo authentication: fixed accounts, one shared password, static tokens.
//!
//! Nothing here issues or verifies real credentials. The accounts exist so
//! the frontend can sign in against a development server.

use axum::Router;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum::routing::{get, post};
use clinic_api::{ApiError, ApiResponse};
use serde::{Deserialize, Serialize};

use crate::extract::AppJson;
use crate::resources::ApiResult;
use crate::state::AppState;

/// Password accepted for every demo account.
pub const DEMO_PASSWORD: &str = "password";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemoUser {
    pub id: u32,
    pub name: &'static str,
    pub email: &'static str,
    pub role: &'static str,
}

struct DemoAccount {
    user: DemoUser,
    token: &'static str,
}

static DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        user: DemoUser {
            id: 1,
            name: "Admin User",
            email: "admin@clinic.com",
            role: "admin",
        },
        token: "demo-token-admin",
    },
    DemoAccount {
        user: DemoUser {
            id: 2,
            name: "Dr. Maria Santos",
            email: "doctor@clinic.com",
            role: "doctor",
        },
        token: "demo-token-doctor",
    },
    DemoAccount {
        user: DemoUser {
            id: 3,
            name: "Nurse Ana Reyes",
            email: "nurse@clinic.com",
            role: "nurse",
        },
        token: "demo-token-nurse",
    },
];

/// Profiles of the demo accounts, in id order.
pub fn demo_users() -> impl Iterator<Item = DemoUser> {
    DEMO_ACCOUNTS.iter().map(|account| account.user)
}

fn account_by_email(email: &str) -> Option<&'static DemoAccount> {
    DEMO_ACCOUNTS.iter().find(|a| a.user.email == email)
}

fn account_by_token(token: &str) -> Option<&'static DemoAccount> {
    DEMO_ACCOUNTS.iter().find(|a| a.token == token)
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub user: DemoUser,
    pub token: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/profile", get(profile))
}

async fn login(AppJson(input): AppJson<LoginInput>) -> ApiResult<Session> {
    match account_by_email(&input.email) {
        Some(account) if input.password == DEMO_PASSWORD => {
            tracing::info!(email = %input.email, "demo login");
            Ok(ApiResponse::ok(Session {
                user: account.user,
                token: account.token,
            })
            .with_message("Login successful"))
        }
        _ => {
            tracing::debug!(email = %input.email, "rejected login");
            Err(ApiError::unauthorized("Invalid credentials"))
        }
    }
}

async fn register() -> Result<ApiResponse<()>, ApiError> {
    Err(ApiError::not_implemented("Registration is not implemented"))
}

async fn profile(headers: HeaderMap) -> ApiResult<DemoUser> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    account_by_token(token)
        .map(|account| ApiResponse::ok(account.user))
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_accounts_have_distinct_tokens() {
        let tokens: std::collections::HashSet<_> = DEMO_ACCOUNTS.iter().map(|a| a.token).collect();
        assert_eq!(tokens.len(), DEMO_ACCOUNTS.len());
        assert!(tokens.iter().all(|t| !t.is_empty()));
    }

    #[test]
    fn lookup_by_email_and_token() {
        let admin = account_by_email("admin@clinic.com").unwrap();
        assert_eq!(admin.user.role, "admin");
        assert_eq!(account_by_token(admin.token).unwrap().user, admin.user);
        assert!(account_by_email("ADMIN@clinic.com").is_none());
        assert!(account_by_token("nope").is_none());
    }
}
