use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        forms::{LoginForm, RegistrationForm},
        password::{hash_password, verify_password},
        repo_types::{StoreError, User},
        session::Session,
    },
    error::AppError,
    forms::{csrf_field, validate_with_csrf, FieldErrors},
    state::AppState,
    views::{self, Page, FORM_ERRORS},
};

pub const LOGIN_OK: &str = "Login successful!";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password. Please try again.";
pub const ACCOUNT_CREATED: &str = "Your account has been created!";
pub const EMAIL_TAKEN: &str = "Email is already registered.";
pub const USERNAME_TAKEN: &str = "Username is already taken.";
pub const DUPLICATE_ACCOUNT: &str = "An account with that username or email already exists.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_form).post(login))
        .route("/register", get(register_form).post(register))
}

pub async fn index() -> Redirect {
    Redirect::to("/login")
}

#[instrument(skip(state, session))]
pub async fn login_form(State(state): State<AppState>, session: Session) -> Response {
    login_page(&state, session, &FieldErrors::new(), "")
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let creds = match validate_with_csrf(
        state.config.csrf_enabled,
        &session,
        &form.csrf_token,
        form.validate(),
    ) {
        Ok(c) => c,
        Err(errors) => return Ok(login_page(&state, session, &errors, &form.email)),
    };

    let user = User::find_by_email(&state.db, &creds.email).await?;
    let user = match user {
        Some(u) if verify_password(&creds.password, &u.password_hash)? => u,
        Some(u) => {
            warn!(email = %creds.email, user_id = u.id, "login invalid password");
            session.flash(INVALID_CREDENTIALS);
            return Ok(login_page(&state, session, &FieldErrors::new(), &form.email));
        }
        None => {
            warn!(email = %creds.email, "login unknown email");
            session.flash(INVALID_CREDENTIALS);
            return Ok(login_page(&state, session, &FieldErrors::new(), &form.email));
        }
    };

    session.set_current_user(user.id);
    session.flash(LOGIN_OK);
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok((session, Redirect::to("/dashboard")).into_response())
}

#[instrument(skip(state, session))]
pub async fn register_form(State(state): State<AppState>, session: Session) -> Response {
    register_page(&state, session, &FieldErrors::new(), &RegistrationForm::default())
}

#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    let reg = match validate_with_csrf(
        state.config.csrf_enabled,
        &session,
        &form.csrf_token,
        form.validate(),
    ) {
        Ok(r) => r,
        Err(errors) => return Ok(register_page(&state, session, &errors, &form)),
    };

    let mut errors = FieldErrors::new();
    if User::find_by_username(&state.db, &reg.username).await?.is_some() {
        errors.add("username", USERNAME_TAKEN);
    }
    if User::find_by_email(&state.db, &reg.email).await?.is_some() {
        errors.add("email", EMAIL_TAKEN);
    }
    if !errors.is_empty() {
        warn!(username = %reg.username, email = %reg.email, "registration conflicts with existing user");
        return Ok(register_page(&state, session, &errors, &form));
    }

    let hash = hash_password(&reg.password)?;
    let user = match User::create(&state.db, &reg.username, &reg.email, &hash).await {
        Ok(u) => u,
        Err(StoreError::DuplicateUser) => {
            // Lost a race with a concurrent registration.
            warn!(username = %reg.username, email = %reg.email, "duplicate user on insert");
            errors.add(FORM_ERRORS, DUPLICATE_ACCOUNT);
            return Ok(register_page(&state, session, &errors, &form));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    session.flash_with("success", ACCOUNT_CREATED);
    Ok((session, Redirect::to("/login")).into_response())
}

fn login_page(state: &AppState, mut session: Session, errors: &FieldErrors, email: &str) -> Response {
    let flashes = session.take_flashes();
    let csrf = csrf_field(state.config.csrf_enabled, &mut session);
    let page = Page {
        flashes: &flashes,
        errors,
        csrf_token: csrf.as_deref(),
    };
    let html = views::login_page(&page, email);
    (session, Html(html)).into_response()
}

fn register_page(
    state: &AppState,
    mut session: Session,
    errors: &FieldErrors,
    form: &RegistrationForm,
) -> Response {
    let flashes = session.take_flashes();
    let csrf = csrf_field(state.config.csrf_enabled, &mut session);
    let page = Page {
        flashes: &flashes,
        errors,
        csrf_token: csrf.as_deref(),
    };
    let html = views::register_page(&page, &form.username, &form.email);
    (session, Html(html)).into_response()
}
