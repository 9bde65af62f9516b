use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::{CurrentUser, Identity},
    error::{internal, RepoError},
    flash::Flashes,
    forms::{self, FormErrors},
    posts::handlers::placeholder_posts_for,
    state::AppState,
    users::{dto::EditProfileForm, repo_types::User},
    views,
};

pub const PROFILE_SAVED: &str = "Your changes have been saved.";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/:username", get(user_profile))
        .route("/edit_profile", get(edit_profile_page).post(edit_profile))
}

#[instrument(skip_all, fields(username = %username))]
pub async fn user_profile(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    flashes: Flashes,
    Path(username): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let user = state
        .users
        .find_by_username(&username)
        .await
        .map_err(internal)?;
    let identity = Identity::User(current);

    let Some(user) = user else {
        warn!("profile not found");
        let content = views::not_found();
        return Ok(views::render(
            StatusCode::NOT_FOUND,
            "Not Found",
            &identity,
            flashes,
            &content,
        ));
    };

    let is_self = identity.user().map(|me| me.id) == Some(user.id);
    let content = views::user_profile(&user, is_self, &placeholder_posts_for(&user));
    Ok(views::render(
        StatusCode::OK,
        &user.username,
        &identity,
        flashes,
        &content,
    ))
}

fn edit_form_page(user: User, flashes: Flashes, form: &EditProfileForm, errors: &FormErrors) -> Response {
    let content = views::edit_profile(&form.username, &form.about_me, errors);
    views::render(
        StatusCode::OK,
        "Edit Profile",
        &Identity::User(user),
        flashes,
        &content,
    )
}

pub async fn edit_profile_page(CurrentUser(user): CurrentUser, flashes: Flashes) -> Response {
    let form = EditProfileForm::from_user(&user);
    edit_form_page(user, flashes, &form, &FormErrors::default())
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn edit_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: Flashes,
    Form(mut form): Form<EditProfileForm>,
) -> Result<Response, (StatusCode, String)> {
    let mut errors = form
        .validate(state.users.as_ref(), user.id)
        .await
        .map_err(internal)?;
    if !errors.accepted() {
        warn!("profile edit rejected");
        return Ok(edit_form_page(user, flashes, &form, &errors));
    }

    match state.users.update_profile(user.id, form.to_update()).await {
        Ok(updated) => {
            info!(username = %updated.username, "profile updated");
            let cookie = flashes.push(PROFILE_SAVED);
            Ok((
                AppendHeaders([(SET_COOKIE, cookie)]),
                Redirect::to("/edit_profile"),
            )
                .into_response())
        }
        Err(RepoError::Conflict(field)) => {
            warn!(%field, "profile edit lost uniqueness race");
            errors.insert(field.field_name(), forms::taken_message(field));
            Ok(edit_form_page(user, flashes, &form, &errors))
        }
        Err(e) => Err(internal(e)),
    }
}
