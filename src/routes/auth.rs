use crate::{
    app::AppState,
    config::Config,
    domain::{
        errors::ApiError,
        events::{AppEvent, NewReferralEvent},
        fields::{Email, ReferralCode, User},
    },
    ledger::{process_signup, NewSignup},
    store::{CredentialStore, PgStore},
    utils::jwt::{decode_auth_token, generate_auth_token},
};
use axum::{
    extract::State,
    headers::{authorization::Bearer, Authorization},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json, TypedHeader,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    email: Email,
    name: String,
    password: Secret<String>,
    referral_code: Option<ReferralCode>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Email,
    password: Secret<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    token: String,
    user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'static str>,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let store = state.get_store();
    tracing::info!("signing up user >>> {}", payload.email);

    let outcome = process_signup(
        &store,
        NewSignup {
            email: payload.email,
            name: payload.name,
            password: payload.password,
            referral_code: payload.referral_code,
        },
    )
    .await?;

    if let Some(referrer) = &outcome.referrer {
        let _ = state
            .get_sender()
            .send(AppEvent::NewReferral(NewReferralEvent {
                referrer: referrer.email.clone(),
                referred_user: outcome.user.email.clone(),
            }));
    }
    let _ = state
        .get_sender()
        .send(AppEvent::NewRegister(outcome.user.clone()));

    let token = generate_auth_token(&outcome.user.uid, &state.config.jwt)?;
    Ok(Json(SessionResponse {
        token,
        user: outcome.user,
        warning: outcome.warning.map(|w| w.message()),
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let store = state.get_store();
    tracing::info!("authenticating user >>> {}", payload.email);

    let user = store
        .authenticate(&payload.email, payload.password.expose_secret())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let _ = state.get_sender().send(AppEvent::NewLogin(user.clone()));
    let token = generate_auth_token(&user.uid, &state.config.jwt)?;
    Ok(Json(SessionResponse {
        token,
        user,
        warning: None,
    }))
}

/// Sessions are stateless tokens; there is nothing to revoke server-side.
/// The endpoint exists so clients have one place to land when discarding
/// their token.
pub async fn logout(
    axum::Extension(user): axum::Extension<User>,
) -> Json<Value> {
    tracing::info!("user logged out >>> {}", user.email);
    Json(json!({
        "message": "You've been successfully logged out",
    }))
}

pub async fn check_auth<B>(
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Response {
    let config = match request.extensions().get::<Config>() {
        Some(c) => c,
        None => return (StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    };

    let token = decode_auth_token(auth.token(), &config.jwt);

    let store = match request.extensions().get::<PgStore>() {
        Some(s) => s.clone(),
        None => return (StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    };

    if let Ok(claims) = token {
        if let Ok(uid) = claims.sub.parse::<Uuid>() {
            if let Ok(Some(user)) = store.find_user_by_uid(uid).await {
                request.extensions_mut().insert(user);
                let response = next.run(request).await;
                return response;
            }
        }
    }

    (StatusCode::UNAUTHORIZED).into_response()
}
