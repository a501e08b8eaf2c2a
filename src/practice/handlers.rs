use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use super::{forms::PracticeForm, goal::time_to_goal_years};
use crate::{
    auth::{extractors::AuthUser, extractors::LOGIN_REQUIRED, repo_types::User, session::Session},
    error::AppError,
    forms::{csrf_field, validate_with_csrf, FieldErrors},
    state::AppState,
    views::{self, Page},
};

pub const TOTAL_TOO_LARGE: &str = "That would push your total past what can be stored.";

pub fn practice_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard).post(log_hours))
}

#[instrument(skip(state, session))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    session: Session,
) -> Result<Response, AppError> {
    let Some(user) = User::find_by_id(&state.db, user_id).await? else {
        return Ok(forget_user(session, user_id));
    };
    Ok(dashboard_page(&state, session, &user, &FieldErrors::new(), None))
}

#[instrument(skip(state, session, form))]
pub async fn log_hours(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut session: Session,
    Form(form): Form<PracticeForm>,
) -> Result<Response, AppError> {
    let Some(mut user) = User::find_by_id(&state.db, user_id).await? else {
        return Ok(forget_user(session, user_id));
    };

    let practice = match validate_with_csrf(
        state.config.csrf_enabled,
        &session,
        &form.csrf_token,
        form.validate(),
    ) {
        Ok(p) => p,
        Err(errors) => return Ok(dashboard_page(&state, session, &user, &errors, None)),
    };

    let Some(total) = user.total_hours.checked_add(practice.hours) else {
        let mut errors = FieldErrors::new();
        errors.add("hours", TOTAL_TOO_LARGE);
        return Ok(dashboard_page(&state, session, &user, &errors, None));
    };
    user.total_hours = total;
    User::update(&state.db, &user).await?;

    info!(user_id, added = practice.hours, total = user.total_hours, "practice hours logged");
    session.flash(format!(
        "Your total hours have been updated: {} hours.",
        user.total_hours
    ));
    let years = time_to_goal_years(user.total_hours);
    Ok(dashboard_page(&state, session, &user, &FieldErrors::new(), years))
}

/// The session points at a user that no longer exists.
fn forget_user(mut session: Session, user_id: i64) -> Response {
    warn!(user_id, "session user not found");
    session.clear_current_user();
    session.flash(LOGIN_REQUIRED);
    (session, Redirect::to("/login")).into_response()
}

fn dashboard_page(
    state: &AppState,
    mut session: Session,
    user: &User,
    errors: &FieldErrors,
    time_to_goal_years: Option<f64>,
) -> Response {
    let flashes = session.take_flashes();
    let csrf = csrf_field(state.config.csrf_enabled, &mut session);
    let page = Page {
        flashes: &flashes,
        errors,
        csrf_token: csrf.as_deref(),
    };
    let html = views::dashboard_page(&page, user, time_to_goal_years);
    (session, Html(html)).into_response()
}
