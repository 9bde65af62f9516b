use axum::{
    extract::{FromRef, Query, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, RegistrationForm},
        extractors::Identity,
        password::hash_password,
        redirect::{login_url_with, safe_next, NextQuery},
        session::SessionKeys,
    },
    error::{internal, RepoError},
    flash::Flashes,
    forms::{self, FormErrors},
    state::AppState,
    users::repo_types::NewUser,
    views,
};

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const REGISTERED: &str = "Congratulations, you are now a registered user!";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/register", get(register_page).post(register))
}

fn login_form_page(
    identity: &Identity,
    flashes: Flashes,
    form: &LoginForm,
    errors: &FormErrors,
    next: Option<&str>,
) -> Response {
    let content = views::login(&form.username, form.remember(), errors, next);
    views::render(StatusCode::OK, "Sign In", identity, flashes, &content)
}

fn register_form_page(
    identity: &Identity,
    flashes: Flashes,
    form: &RegistrationForm,
    errors: &FormErrors,
) -> Response {
    let content = views::register(&form.username, &form.email, errors);
    views::render(StatusCode::OK, "Register", identity, flashes, &content)
}

pub async fn login_page(
    identity: Identity,
    flashes: Flashes,
    Query(query): Query<NextQuery>,
) -> Response {
    if identity.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    login_form_page(
        &identity,
        flashes,
        &LoginForm::default(),
        &FormErrors::default(),
        query.next.as_deref(),
    )
}

#[instrument(skip_all, fields(username = %form.username.trim()))]
pub async fn login(
    State(state): State<AppState>,
    identity: Identity,
    flashes: Flashes,
    Query(query): Query<NextQuery>,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, (StatusCode, String)> {
    if identity.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let errors = form.validate();
    if !errors.accepted() {
        return Ok(login_form_page(
            &identity,
            flashes,
            &form,
            &errors,
            query.next.as_deref(),
        ));
    }

    let user = state
        .users
        .find_by_username(&form.username)
        .await
        .map_err(internal)?;

    // Unknown user and wrong password must look the same to the caller.
    let Some(user) = user else {
        warn!("login unknown username");
        return Ok(reject_login(flashes, query.next.as_deref()));
    };
    if !user.check_password(&form.password).map_err(internal)? {
        warn!(user_id = user.id, "login invalid password");
        return Ok(reject_login(flashes, query.next.as_deref()));
    }

    let keys = SessionKeys::from_ref(&state);
    let cookie = keys
        .login_cookie(user.id, form.remember())
        .map_err(internal)?;
    let target = safe_next(query.next.as_deref());

    info!(user_id = user.id, remember = form.remember(), "user logged in");
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(target)).into_response())
}

fn reject_login(flashes: Flashes, next: Option<&str>) -> Response {
    let cookie = flashes.push(INVALID_CREDENTIALS);
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Redirect::to(&login_url_with(next)),
    )
        .into_response()
}

#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, identity: Identity) -> Response {
    if let Some(user) = identity.user() {
        info!(user_id = user.id, "user logged out");
    }
    let keys = SessionKeys::from_ref(&state);
    (
        AppendHeaders([(SET_COOKIE, keys.logout_cookie())]),
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn register_page(identity: Identity, flashes: Flashes) -> Response {
    if identity.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    register_form_page(
        &identity,
        flashes,
        &RegistrationForm::default(),
        &FormErrors::default(),
    )
}

#[instrument(skip_all, fields(username = %form.username.trim()))]
pub async fn register(
    State(state): State<AppState>,
    identity: Identity,
    flashes: Flashes,
    Form(mut form): Form<RegistrationForm>,
) -> Result<Response, (StatusCode, String)> {
    if identity.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut errors = form
        .validate(state.users.as_ref())
        .await
        .map_err(internal)?;
    if !errors.accepted() {
        warn!("registration rejected");
        return Ok(register_form_page(&identity, flashes, &form, &errors));
    }

    let password_hash = hash_password(&form.password).map_err(internal)?;

    let created = state
        .users
        .create(NewUser {
            username: form.username.clone(),
            email: form.email.clone(),
            password_hash,
        })
        .await;

    match created {
        Ok(user) => {
            info!(user_id = user.id, "user registered");
            let cookie = flashes.push(REGISTERED);
            Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to("/")).into_response())
        }
        // Claimed by a concurrent registration after validation passed.
        Err(RepoError::Conflict(field)) => {
            warn!(%field, "registration lost uniqueness race");
            errors.insert(field.field_name(), forms::taken_message(field));
            Ok(register_form_page(&identity, flashes, &form, &errors))
        }
        Err(e) => Err(internal(e)),
    }
}
