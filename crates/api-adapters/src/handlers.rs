use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::Form;
use domains::{AppError, AuthedUser, Permission};
use serde::Deserialize;
use services::NewAccount;
use uuid::Uuid;

use crate::cookies;
use crate::error::WebError;
use crate::extract::{CurrentUser, IncomingFlashes, RequireUser};
use crate::flash::{self, Flash};
use crate::templates::{
    CommentView, EditPostTemplate, IndexTemplate, LoginTemplate, ModerateTemplate, Nav,
    NotFoundTemplate, Pager, PostTemplate, PostView, RegisterTemplate, UserTemplate,
};
use crate::ApiContext;

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

#[derive(Deserialize)]
pub struct BodyForm {
    body: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    email: String,
    username: String,
    password: String,
}

/// A missing or unparsable page number means the first page. `-1` passes
/// through so the post view can resolve it to the last comment page.
fn parse_page(page: &Option<String>) -> i64 {
    page.as_deref().and_then(|raw| raw.parse().ok()).unwrap_or(1)
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, WebError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(what, raw).into())
}

fn require(user: &AuthedUser, permission: Permission) -> Result<(), WebError> {
    if user.can(permission) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("insufficient permissions".to_string()).into())
    }
}

/// Renders a page, clearing the flash cookie when this request consumed one.
fn page_response(template: impl Template, consumed_flash: bool) -> Result<Response, WebError> {
    let html = Html(template.render()?);
    if consumed_flash {
        let clear = cookies::clear(cookies::FLASH_COOKIE);
        Ok((AppendHeaders(vec![(header::SET_COOKIE, clear)]), html).into_response())
    } else {
        Ok(html.into_response())
    }
}

fn flash_redirect(message: Flash, to: &str) -> Response {
    let cookie = flash::cookie(&[message]);
    (AppendHeaders(vec![(header::SET_COOKIE, cookie)]), Redirect::to(to)).into_response()
}

async fn render_feed(
    ctx: &ApiContext,
    viewer: Option<&AuthedUser>,
    flashes: Vec<Flash>,
    headers: &HeaderMap,
    page: i64,
    form_error: String,
    form_body: String,
) -> Result<Response, WebError> {
    let show_followed = viewer.is_some()
        && cookies::get(headers, cookies::SHOW_FOLLOWED_COOKIE).is_some_and(|v| !v.is_empty());
    let posts = ctx
        .posts
        .timeline(viewer.map(|user| user.user.id), show_followed, page)
        .await?;

    let consumed_flash = !flashes.is_empty();
    let template = IndexTemplate {
        nav: Nav::new(viewer),
        flashes,
        can_write: viewer.is_some_and(|user| user.can(Permission::Write)),
        form_error,
        form_body,
        show_tabs: viewer.is_some(),
        followed_tab: show_followed,
        posts: posts.items.iter().map(|entry| PostView::new(entry, viewer)).collect(),
        pager: Pager::new(&posts, "/"),
    };
    page_response(template, consumed_flash)
}

pub async fn feed(
    State(ctx): State<ApiContext>,
    CurrentUser(viewer): CurrentUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let page = parse_page(&query.page);
    render_feed(&ctx, viewer.as_ref(), flashes, &headers, page, String::new(), String::new())
        .await
}

/// Publishing falls through to the feed when the viewer cannot write, the
/// same way the form is absent for them.
pub async fn publish(
    State(ctx): State<ApiContext>,
    CurrentUser(viewer): CurrentUser,
    IncomingFlashes(flashes): IncomingFlashes,
    headers: HeaderMap,
    Form(form): Form<BodyForm>,
) -> Result<Response, WebError> {
    if let Some(user) = viewer.as_ref().filter(|user| user.can(Permission::Write)) {
        match ctx.posts.publish(user.user.id, &form.body).await {
            Ok(_) => return Ok(Redirect::to("/").into_response()),
            Err(AppError::ValidationError(message)) => {
                return render_feed(
                    &ctx,
                    viewer.as_ref(),
                    flashes,
                    &headers,
                    1,
                    message,
                    form.body,
                )
                .await;
            }
            Err(err) => return Err(err.into()),
        }
    }
    render_feed(&ctx, viewer.as_ref(), flashes, &headers, 1, String::new(), String::new()).await
}

pub async fn show_all(RequireUser(_user): RequireUser) -> Response {
    let cookie =
        cookies::build(cookies::SHOW_FOLLOWED_COOKIE, "", Some(cookies::THIRTY_DAYS), false);
    (AppendHeaders(vec![(header::SET_COOKIE, cookie)]), Redirect::to("/")).into_response()
}

pub async fn show_followed(RequireUser(_user): RequireUser) -> Response {
    let cookie =
        cookies::build(cookies::SHOW_FOLLOWED_COOKIE, "1", Some(cookies::THIRTY_DAYS), false);
    (AppendHeaders(vec![(header::SET_COOKIE, cookie)]), Redirect::to("/")).into_response()
}

async fn render_post(
    ctx: &ApiContext,
    viewer: Option<&AuthedUser>,
    flashes: Vec<Flash>,
    id_raw: &str,
    page: i64,
    form_error: String,
) -> Result<Response, WebError> {
    let post_id = parse_uuid(id_raw, "Post")?;
    let (post, comments) = ctx.posts.post_with_comments(post_id, page).await?;
    let viewer_moderates = viewer.is_some_and(|user| user.can(Permission::Moderate));

    let consumed_flash = !flashes.is_empty();
    let template = PostTemplate {
        nav: Nav::new(viewer),
        flashes,
        posts: vec![PostView::new(&post, viewer)],
        post_id: post.post.id.to_string(),
        can_comment: viewer.is_some_and(|user| user.can(Permission::Comment)),
        form_error,
        comments: comments
            .items
            .iter()
            .map(|entry| CommentView::on_post(entry, viewer_moderates))
            .collect(),
        pager: Pager::new(&comments, &format!("/post/{}", post.post.id)),
    };
    page_response(template, consumed_flash)
}

pub async fn post_detail(
    State(ctx): State<ApiContext>,
    CurrentUser(viewer): CurrentUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    let page = parse_page(&query.page);
    render_post(&ctx, viewer.as_ref(), flashes, &id, page, String::new()).await
}

pub async fn add_comment(
    State(ctx): State<ApiContext>,
    RequireUser(user): RequireUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Path(id): Path<String>,
    Form(form): Form<BodyForm>,
) -> Result<Response, WebError> {
    require(&user, Permission::Comment)?;
    let post_id = parse_uuid(&id, "Post")?;
    match ctx.posts.comment(user.user.id, post_id, &form.body).await {
        Ok(_) => Ok(flash_redirect(
            Flash::success("Your comment has been published."),
            &format!("/post/{post_id}?page=-1"),
        )),
        Err(AppError::ValidationError(message)) => {
            render_post(&ctx, Some(&user), flashes, &id, -1, message).await
        }
        Err(err) => Err(err.into()),
    }
}

fn ensure_can_edit(user: &AuthedUser, author_id: Uuid) -> Result<(), WebError> {
    if user.user.id != author_id && !user.can(Permission::Admin) {
        return Err(AppError::Unauthorized("insufficient permissions".to_string()).into());
    }
    Ok(())
}

pub async fn edit_form(
    State(ctx): State<ApiContext>,
    RequireUser(user): RequireUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let post_id = parse_uuid(&id, "Post")?;
    let post = ctx.posts.find(post_id).await?;
    ensure_can_edit(&user, post.post.author_id)?;

    let consumed_flash = !flashes.is_empty();
    let template = EditPostTemplate {
        nav: Nav::new(Some(&user)),
        flashes,
        post_id: post.post.id.to_string(),
        body: post.post.body.clone(),
        form_error: String::new(),
    };
    page_response(template, consumed_flash)
}

pub async fn edit_submit(
    State(ctx): State<ApiContext>,
    RequireUser(user): RequireUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Path(id): Path<String>,
    Form(form): Form<BodyForm>,
) -> Result<Response, WebError> {
    let post_id = parse_uuid(&id, "Post")?;
    let post = ctx.posts.find(post_id).await?;
    ensure_can_edit(&user, post.post.author_id)?;

    match ctx.posts.edit(post_id, &form.body).await {
        Ok(()) => Ok(flash_redirect(
            Flash::success("The post has been updated."),
            &format!("/post/{post_id}"),
        )),
        Err(AppError::ValidationError(message)) => {
            let consumed_flash = !flashes.is_empty();
            let template = EditPostTemplate {
                nav: Nav::new(Some(&user)),
                flashes,
                post_id: post.post.id.to_string(),
                body: form.body,
                form_error: message,
            };
            page_response(template, consumed_flash)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn moderate(
    State(ctx): State<ApiContext>,
    RequireUser(user): RequireUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    require(&user, Permission::Moderate)?;
    let comments = ctx.moderation.queue(parse_page(&query.page)).await?;

    let consumed_flash = !flashes.is_empty();
    let template = ModerateTemplate {
        nav: Nav::new(Some(&user)),
        flashes,
        comments: comments
            .items
            .iter()
            .map(|entry| CommentView::for_moderation(entry, comments.page))
            .collect(),
        pager: Pager::new(&comments, "/moderate"),
    };
    page_response(template, consumed_flash)
}

pub async fn moderate_enable(
    State(ctx): State<ApiContext>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    require(&user, Permission::Moderate)?;
    let comment_id = parse_uuid(&id, "Comment")?;
    ctx.moderation.set_disabled(comment_id, false).await?;
    Ok(Redirect::to(&format!("/moderate?page={}", parse_page(&query.page))).into_response())
}

pub async fn moderate_disable(
    State(ctx): State<ApiContext>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    require(&user, Permission::Moderate)?;
    let comment_id = parse_uuid(&id, "Comment")?;
    ctx.moderation.set_disabled(comment_id, true).await?;
    Ok(Redirect::to(&format!("/moderate?page={}", parse_page(&query.page))).into_response())
}

pub async fn register_form(
    CurrentUser(viewer): CurrentUser,
    IncomingFlashes(flashes): IncomingFlashes,
) -> Result<Response, WebError> {
    let consumed_flash = !flashes.is_empty();
    let template = RegisterTemplate {
        nav: Nav::new(viewer.as_ref()),
        flashes,
        email: String::new(),
        username: String::new(),
        error: String::new(),
    };
    page_response(template, consumed_flash)
}

pub async fn register_submit(
    State(ctx): State<ApiContext>,
    CurrentUser(viewer): CurrentUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Form(form): Form<RegisterForm>,
) -> Result<Response, WebError> {
    let account = NewAccount {
        email: form.email.clone(),
        username: form.username.clone(),
        password: form.password,
    };
    match ctx.accounts.register(account).await {
        Ok(_) => Ok(flash_redirect(
            Flash::success("Your account has been created. Please log in."),
            "/auth/login",
        )),
        Err(AppError::ValidationError(message)) | Err(AppError::Conflict(message)) => {
            let consumed_flash = !flashes.is_empty();
            let template = RegisterTemplate {
                nav: Nav::new(viewer.as_ref()),
                flashes,
                email: form.email,
                username: form.username,
                error: message,
            };
            page_response(template, consumed_flash)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn login_form(
    CurrentUser(viewer): CurrentUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Query(query): Query<NextQuery>,
) -> Result<Response, WebError> {
    let consumed_flash = !flashes.is_empty();
    let template = LoginTemplate {
        nav: Nav::new(viewer.as_ref()),
        flashes,
        email: String::new(),
        next: query.next.unwrap_or_default(),
    };
    page_response(template, consumed_flash)
}

pub async fn login_submit(
    State(ctx): State<ApiContext>,
    CurrentUser(viewer): CurrentUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    match ctx.accounts.authenticate(&form.email, &form.password).await? {
        Some(user) => {
            let session = ctx.sessions.issue(user.id)?;
            let cookie = cookies::build(
                cookies::SESSION_COOKIE,
                &session.token,
                Some(ctx.sessions.max_age()),
                true,
            );
            let target = query
                .next
                .filter(|next| next.starts_with('/'))
                .unwrap_or_else(|| "/".to_string());
            Ok((
                AppendHeaders(vec![(header::SET_COOKIE, cookie)]),
                Redirect::to(&target),
            )
                .into_response())
        }
        None => {
            let consumed_flash = !flashes.is_empty();
            let mut flashes = flashes;
            flashes.push(Flash::error("Invalid email or password."));
            let template = LoginTemplate {
                nav: Nav::new(viewer.as_ref()),
                flashes,
                email: form.email,
                next: query.next.unwrap_or_default(),
            };
            page_response(template, consumed_flash)
        }
    }
}

pub async fn logout(RequireUser(_user): RequireUser) -> Response {
    let cookie = flash::cookie(&[Flash::info("You have been logged out.")]);
    (
        AppendHeaders(vec![
            (header::SET_COOKIE, cookies::clear(cookies::SESSION_COOKIE)),
            (header::SET_COOKIE, cookie),
        ]),
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn profile(
    State(ctx): State<ApiContext>,
    CurrentUser(viewer): CurrentUser,
    IncomingFlashes(flashes): IncomingFlashes,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    let (user, counts) = ctx
        .accounts
        .profile(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User", &username))?;
    let posts = ctx.posts.author_posts(user.id, parse_page(&query.page)).await?;

    let is_self = viewer.as_ref().is_some_and(|v| v.user.id == user.id);
    let following_them = match viewer.as_ref() {
        Some(v) if !is_self => ctx.accounts.is_following(v.user.id, user.id).await?,
        _ => false,
    };

    let consumed_flash = !flashes.is_empty();
    let template = UserTemplate {
        nav: Nav::new(viewer.as_ref()),
        flashes,
        username: user.username.clone(),
        member_since: user.created_at.format("%B %Y").to_string(),
        followers: counts.followers,
        following: counts.following,
        can_follow: !is_self
            && viewer.as_ref().is_some_and(|v| v.can(Permission::Follow)),
        following_them,
        posts: posts.items.iter().map(|entry| PostView::new(entry, viewer.as_ref())).collect(),
        pager: Pager::new(&posts, &format!("/user/{}", user.username)),
    };
    page_response(template, consumed_flash)
}

pub async fn follow(
    State(ctx): State<ApiContext>,
    RequireUser(user): RequireUser,
    Path(username): Path<String>,
) -> Result<Response, WebError> {
    require(&user, Permission::Follow)?;
    match ctx.accounts.follow(user.user.id, &username).await {
        Ok((target, true)) => Ok(flash_redirect(
            Flash::success(format!("You are now following {}.", target.username)),
            &format!("/user/{}", target.username),
        )),
        Ok((target, false)) => Ok(flash_redirect(
            Flash::info("You are already following this user."),
            &format!("/user/{}", target.username),
        )),
        Err(AppError::NotFound(..)) => {
            Ok(flash_redirect(Flash::warning("Invalid user."), "/"))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn unfollow(
    State(ctx): State<ApiContext>,
    RequireUser(user): RequireUser,
    Path(username): Path<String>,
) -> Result<Response, WebError> {
    require(&user, Permission::Follow)?;
    match ctx.accounts.unfollow(user.user.id, &username).await {
        Ok((target, true)) => Ok(flash_redirect(
            Flash::success(format!("You are no longer following {}.", target.username)),
            &format!("/user/{}", target.username),
        )),
        Ok((target, false)) => Ok(flash_redirect(
            Flash::info("You are not following this user."),
            &format!("/user/{}", target.username),
        )),
        Err(AppError::NotFound(..)) => {
            Ok(flash_redirect(Flash::warning("Invalid user."), "/"))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn metrics_endpoint(State(ctx): State<ApiContext>) -> Result<Response, WebError> {
    let mut buffer = String::new();
    prometheus_client::encoding::text::encode(&mut buffer, &ctx.registry)
        .map_err(AppError::internal)?;
    Ok((
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        buffer,
    )
        .into_response())
}

pub async fn not_found(
    CurrentUser(viewer): CurrentUser,
    IncomingFlashes(flashes): IncomingFlashes,
) -> Result<Response, WebError> {
    let consumed_flash = !flashes.is_empty();
    let template = NotFoundTemplate::new(Nav::new(viewer.as_ref()), flashes);
    let html = Html(template.render()?);
    if consumed_flash {
        let clear = cookies::clear(cookies::FLASH_COOKIE);
        Ok((
            StatusCode::NOT_FOUND,
            AppendHeaders(vec![(header::SET_COOKIE, clear)]),
            html,
        )
            .into_response())
    } else {
        Ok((StatusCode::NOT_FOUND, html).into_response())
    }
}
