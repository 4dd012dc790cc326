use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    config::LoginLinkPolicy,
    error::AppError,
    models::{
        account::{Account, LoginRequest, RegisterRequest},
        StatusResponse,
    },
    state::AppState,
    utils::{
        cookies::{build_clear_cookie, build_session_cookie},
        jwt::{SessionClaims, TokenKind},
    },
};

/// `POST /register`: creates the account, then mails its first login link.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let account = state
        .storage
        .create_account(&payload.name, &payload.email)
        .await?;
    tracing::info!(account_id = %account.id, "Account registered");

    // The row stays even if delivery fails; the user can request a new link.
    send_login_link(&state, &account).await?;
    Ok(Json(account))
}

/// `POST /login`: mails a login link to an existing account.
pub async fn request_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    let Json(payload) = payload?;

    let account = state
        .storage
        .find_account_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("account {} not found", payload.email)))?;

    send_login_link(&state, &account).await?;
    Ok(Json(account))
}

/// `GET /login/{token}`: redeems a mailed link into a session cookie.
pub async fn verify_login(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(token) = path?;
    let claims = state.tokens.verify(&token)?;

    let (cookie_token, expires_at) = match state.config.session.login_link_policy {
        LoginLinkPolicy::Reusable => (token, claims.expires_at()),
        LoginLinkPolicy::SingleUse => redeem_single_use(&state, &claims).await?,
    };
    tracing::info!(account_id = %claims.sub, "Login link redeemed");

    let cookie = build_session_cookie(
        &cookie_token,
        expires_at,
        Utc::now(),
        state.config.session.cookie,
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(StatusResponse::new("ok")),
    ))
}

/// `GET /logout`: drops the client's copy of the session. Tokens are not
/// revocable, so a copied token stays valid until it expires.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            build_clear_cookie(state.config.session.cookie),
        )],
        Json(StatusResponse::new("Logout Success")),
    )
}

async fn send_login_link(state: &AppState, account: &Account) -> Result<(), AppError> {
    let (token, _) = state.tokens.mint(
        &account.id.to_string(),
        state.config.session.ttl,
        TokenKind::Login,
    )?;
    state
        .mailer
        .send_login_link(&account.email, &token)
        .await?;
    tracing::info!(account_id = %account.id, "Login link dispatched");
    Ok(())
}

async fn redeem_single_use(
    state: &AppState,
    claims: &SessionClaims,
) -> Result<(String, DateTime<Utc>), AppError> {
    if claims.kind != TokenKind::Login {
        return Err(AppError::Unauthorized("token invalid".to_string()));
    }
    let first_use = state
        .storage
        .consume_login_token(&claims.jti, claims.expires_at())
        .await?;
    if !first_use {
        tracing::warn!(account_id = %claims.sub, "Login link replayed");
        return Err(AppError::Unauthorized("token invalid".to_string()));
    }

    let (session_token, session_claims) =
        state
            .tokens
            .mint(&claims.sub, state.config.session.ttl, TokenKind::Session)?;
    Ok((session_token, session_claims.expires_at()))
}
