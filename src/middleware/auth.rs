use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Roles allowed on the recruiter API.
pub const RECRUITER_ROLES: [&str; 2] = ["admin", "recruiter"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    /// Name recorded as `changed_by` / `created_by`.
    pub fn actor(&self) -> &str {
        &self.sub
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

pub fn encode_token(claims: &Claims, secret: &str) -> jsonwebtoken::errors::Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_token(token: &str, secret: &str) -> jsonwebtoken::errors::Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

pub fn has_role(claims: &Claims, allowed: &[&str]) -> bool {
    let role = claims.role.as_deref().unwrap_or_default();
    allowed.iter().any(|r| r.eq_ignore_ascii_case(role))
}

/// Bearer JWT with an `admin` or `recruiter` role. The decoded claims are
/// left in the request extensions for handlers.
pub async fn require_recruiter(mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return reject(StatusCode::UNAUTHORIZED, "missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return reject(StatusCode::UNAUTHORIZED, "bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return reject(StatusCode::UNAUTHORIZED, "unsupported_scheme");
    };

    let config = crate::config::get_config();
    match decode_token(token, &config.jwt_secret) {
        Ok(claims) => {
            if !has_role(&claims, &RECRUITER_ROLES) {
                tracing::warn!(sub = %claims.sub, role = ?claims.role, "recruiter API access denied");
                return reject(StatusCode::FORBIDDEN, "forbidden");
            }
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "bearer token rejected");
            reject(StatusCode::UNAUTHORIZED, "invalid_token")
        }
    }
}
