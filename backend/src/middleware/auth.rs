use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};

use crate::{
    config::LoginLinkPolicy,
    error::AppError,
    state::AppState,
    types::AccountId,
    utils::{
        cookies::{build_session_cookie, extract_cookie_value, SESSION_COOKIE_NAME},
        jwt::{SessionClaims, TokenKind},
    },
};

/// Account the current session belongs to, inserted for protected handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentAccount(pub AccountId);

/// Gate in front of protected routes: validates the session cookie and
/// reissues it when it is about to expire.
pub async fn session_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(request.headers())?
        .ok_or_else(|| AppError::Unauthorized("No Cookie".to_string()))?;

    let claims = state.tokens.verify(&token)?;
    if state.config.session.login_link_policy == LoginLinkPolicy::SingleUse
        && claims.kind == TokenKind::Login
    {
        return Err(AppError::Unauthorized("token invalid".to_string()));
    }
    let account_id: AccountId = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("token invalid".to_string()))?;

    let renewal_cookie = renew_if_expiring(&state, &claims, Utc::now())?;
    request.extensions_mut().insert(CurrentAccount(account_id));

    let mut response = next.run(request).await;
    if let Some(cookie) = renewal_cookie {
        // A handler that already set the session cookie (logout) wins.
        if !sets_session_cookie(response.headers()) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
    }
    Ok(response)
}

/// True when the token is still valid but within the renewal window.
pub fn needs_renewal(remaining: Duration, threshold: Duration) -> bool {
    remaining > Duration::zero() && remaining <= threshold
}

fn renew_if_expiring(
    state: &AppState,
    claims: &SessionClaims,
    now: DateTime<Utc>,
) -> Result<Option<HeaderValue>, AppError> {
    let session = &state.config.session;
    if !needs_renewal(claims.time_until_expiry(now), session.renewal_threshold) {
        return Ok(None);
    }

    let (token, renewed) = state
        .tokens
        .mint(&claims.sub, session.ttl, TokenKind::Session)
        .map_err(renewal_failed)?;
    let cookie = build_session_cookie(&token, renewed.expires_at(), now, session.cookie);
    let cookie = HeaderValue::from_str(&cookie).map_err(renewal_failed)?;

    tracing::debug!(account_id = %claims.sub, "Session token renewed");
    Ok(Some(cookie))
}

/// The presented session was valid, so a failed reissue is a server fault.
fn renewal_failed<E>(err: E) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AppError::InternalServerError(anyhow::Error::new(err).context("session renewal failed"))
}

/// `Ok(None)` when no usable session cookie was sent. A `Cookie` header that
/// is not visible ASCII cannot be read at all and is a bad request.
fn extract_session_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    for value in headers.get_all(header::COOKIE) {
        let raw = value
            .to_str()
            .map_err(|_| AppError::BadRequest("unreadable Cookie header".to_string()))?;
        if let Some(token) = extract_cookie_value(raw, SESSION_COOKIE_NAME) {
            if !token.is_empty() {
                return Ok(Some(token));
            }
        }
    }
    Ok(None)
}

fn sets_session_cookie(headers: &HeaderMap) -> bool {
    let prefix = format!("{}=", SESSION_COOKIE_NAME);
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}
