use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{generate_recovery_code, hash_password, verify_password},
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            CreateUserRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
            MessageResponse, PublicUser, ResetPasswordRequest, UpdateUserRequest,
        },
        repo::is_unique_violation,
        repo_types::User,
        validation::{is_valid_email, validate_name, validate_password_complexity},
    },
};

const RECOVERY_CODE_TTL_MINUTES: i64 = 15;

/// Structurally valid argon2id hash matching the default parameters; it
/// verifies nothing, it only keeps login timing flat when no user matches.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1\
                                   $AAAAAAAAAAAAAAAAAAAAAA\
                                   $AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
const FORGOT_PASSWORD_REPLY: &str =
    "if the email is registered, a recovery code has been sent";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register))
        .route("/users/login", post(login))
        .route("/users/forgot-password", post(forgot_password))
        .route("/users/reset-password", post(reset_password))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    auth.require_admin()?;
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let mut errors = Vec::new();
    if let Some(msg) = validate_name(&payload.name) {
        errors.push(msg);
    }
    if !is_valid_email(&payload.email) {
        errors.push("invalid email".to_string());
    }
    errors.extend(validate_password_complexity(&payload.password));
    if !errors.is_empty() {
        warn!(email = %payload.email, "registration rejected by validation");
        return Err(ApiError::Validation(errors));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    // The pre-check above races with concurrent registrations; the unique
    // index is authoritative.
    let user = match User::create(&state.db, &payload.name, &payload.email, &hash).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::Conflict("email already registered".into()));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password collapse into the same response so
    // callers cannot probe which accounts exist.
    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        // Burn a verification here too, keeping the timing of both failure
        // paths comparable.
        let _ = verify_password(&payload.password, DUMMY_PASSWORD_HASH);
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation(vec!["invalid email".to_string()]));
    }

    if let Some(user) = User::find_by_email(&state.db, &payload.email).await? {
        let code = generate_recovery_code();
        let expires_at = OffsetDateTime::now_utc()
            + TimeDuration::minutes(RECOVERY_CODE_TTL_MINUTES);
        User::set_recovery_code(&state.db, user.id, &code, expires_at).await?;

        // A transport failure must not change the response shape, or it
        // would reveal that the address exists.
        if let Err(e) = state
            .mailer
            .send_recovery_code(&user.email, &user.name, &code)
            .await
        {
            error!(error = %e, user_id = %user.id, "recovery code email failed");
        } else {
            info!(user_id = %user.id, "recovery code issued");
        }
    }

    Ok(Json(MessageResponse {
        message: FORGOT_PASSWORD_REPLY.to_string(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let mut errors = Vec::new();
    if !is_valid_email(&payload.email) {
        errors.push("invalid email".to_string());
    }
    if payload.recovery_code.chars().count() != 6 {
        errors.push("invalid recovery code".to_string());
    }
    errors.extend(validate_password_complexity(&payload.new_password));
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let hash = hash_password(&payload.new_password)?;
    let updated = User::reset_password_with_code(
        &state.db,
        &payload.email,
        &payload.recovery_code,
        &hash,
    )
    .await?;

    // Wrong email, wrong code, expired code, and reused code all land here.
    if !updated {
        warn!(email = %payload.email, "password reset rejected");
        return Err(ApiError::InvalidRecoveryCode);
    }

    info!(email = %payload.email, "password reset");
    Ok(Json(MessageResponse {
        message: "password changed successfully".to_string(),
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    auth.require_self_or_admin(id)?;
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    auth.require_self_or_admin(id)?;

    // Role assignment is never self-service.
    if payload.role.is_some() && !auth.is_admin() {
        return Err(ApiError::forbidden(
            "access denied: only administrators may change roles",
        ));
    }

    let mut errors = Vec::new();
    if let Some(name) = &payload.name {
        if let Some(msg) = validate_name(name) {
            errors.push(msg);
        }
    }
    if let Some(email) = &mut payload.email {
        *email = email.trim().to_lowercase();
        if !is_valid_email(email) {
            errors.push("invalid email".to_string());
        }
    }
    if let Some(password) = &payload.password {
        errors.extend(validate_password_complexity(password));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if let Some(email) = &payload.email {
        if User::email_taken_by_other(&state.db, email, id).await? {
            return Err(ApiError::Conflict(
                "email already registered to another user".into(),
            ));
        }
    }

    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = match User::update(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.email.as_deref(),
        password_hash.as_deref(),
        payload.role,
    )
    .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ApiError::NotFound("user")),
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "email already registered to another user".into(),
            ));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    info!(user_id = %user.id, actor = %auth.id, "user updated");
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    auth.require_admin()?;
    let user = User::delete(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    info!(user_id = %user.id, actor = %auth.id, "user deleted");
    Ok(Json(MessageResponse {
        message: format!("user {} deleted", user.name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    // The unknown-email login path leans on this hash being parseable; a
    // malformed constant would turn that branch into a 500.
    #[test]
    fn dummy_hash_parses_and_never_verifies() {
        let matched =
            verify_password("Abcd1234!", DUMMY_PASSWORD_HASH).expect("dummy hash must parse");
        assert!(!matched);
    }
}
