//! services/api/src/web/identity.rs
//!
//! Request identity extraction. Authentication proper is handled upstream;
//! this middleware only parses the already-authenticated identity headers and
//! makes the (user, role) pair an explicit value handlers pass into the core.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// The role the caller is acting under for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRole {
    Student,
    Teacher,
    Admin,
}

/// The resolved identity of the current request.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: ApiRole,
}

impl Identity {
    /// Guards a role-scoped handler. Returns 403 for a mismatched role.
    pub fn require(&self, role: ApiRole) -> Result<(), (StatusCode, String)> {
        if self.role == role {
            Ok(())
        } else {
            Err((
                StatusCode::FORBIDDEN,
                "This page is not available for your current role".to_string(),
            ))
        }
    }
}

/// Middleware that parses the `x-user-id` and `x-role` headers and inserts
/// an `Identity` into request extensions for handlers to use.
///
/// Missing or malformed headers yield 401 Unauthorized.
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    // 1. Parse the user id
    let user_id = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse the active role
    let role = match req.headers().get("x-role").and_then(|v| v.to_str().ok()) {
        Some("student") => ApiRole::Student,
        Some("teacher") => ApiRole::Teacher,
        Some("admin") => ApiRole::Admin,
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    // 3. Insert the identity into request extensions
    req.extensions_mut().insert(Identity { user_id, role });

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
