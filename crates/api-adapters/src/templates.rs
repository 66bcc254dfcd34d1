//! Template structs and the view models they render. Handlers flatten domain
//! types into these before rendering so the templates stay free of logic.

use askama::Template;
use chrono::{DateTime, Utc};
use domains::{AuthedUser, CommentEntry, FeedPost, Page, Permission};

use crate::flash::Flash;

fn short_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// What the navigation bar needs to know about the viewer.
pub struct Nav {
    pub signed_in: bool,
    pub username: String,
    pub can_moderate: bool,
}

impl Nav {
    pub fn new(viewer: Option<&AuthedUser>) -> Self {
        match viewer {
            Some(user) => Self {
                signed_in: true,
                username: user.user.username.clone(),
                can_moderate: user.can(Permission::Moderate),
            },
            None => Self {
                signed_in: false,
                username: String::new(),
                can_moderate: false,
            },
        }
    }
}

pub struct PostView {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created_at: String,
    pub comments: u64,
    pub can_edit: bool,
}

impl PostView {
    pub fn new(entry: &FeedPost, viewer: Option<&AuthedUser>) -> Self {
        let can_edit = viewer.map_or(false, |user| {
            user.user.id == entry.post.author_id || user.can(Permission::Admin)
        });
        Self {
            id: entry.post.id.to_string(),
            author: entry.author.username.clone(),
            body: entry.post.body.clone(),
            created_at: short_date(&entry.post.created_at),
            comments: entry.comments,
            can_edit,
        }
    }
}

pub struct CommentView {
    pub author: String,
    pub body: String,
    pub created_at: String,
    pub disabled: bool,
    pub show_body: bool,
    pub post_href: String,
    pub enable_href: String,
    pub disable_href: String,
}

impl CommentView {
    /// A comment under a post. Disabled bodies are hidden from everyone
    /// except moderators, who see them next to the placeholder.
    pub fn on_post(entry: &CommentEntry, viewer_moderates: bool) -> Self {
        Self {
            author: entry.author.username.clone(),
            body: entry.comment.body.clone(),
            created_at: short_date(&entry.comment.created_at),
            disabled: entry.comment.disabled,
            show_body: viewer_moderates || !entry.comment.disabled,
            post_href: String::new(),
            enable_href: String::new(),
            disable_href: String::new(),
        }
    }

    /// A row in the moderation queue, with toggle links that return to the
    /// same queue page.
    pub fn for_moderation(entry: &CommentEntry, page: i64) -> Self {
        let id = entry.comment.id;
        Self {
            author: entry.author.username.clone(),
            body: entry.comment.body.clone(),
            created_at: short_date(&entry.comment.created_at),
            disabled: entry.comment.disabled,
            show_body: true,
            post_href: format!("/post/{}", entry.comment.post_id),
            enable_href: format!("/moderate/enable/{id}?page={page}"),
            disable_href: format!("/moderate/disable/{id}?page={page}"),
        }
    }
}

pub struct PageLink {
    pub label: String,
    /// Empty when the entry is not clickable: the current page, a gap, or a
    /// prev/next arrow with nowhere to go.
    pub href: String,
    pub current: bool,
}

pub struct Pager {
    pub show: bool,
    pub links: Vec<PageLink>,
}

impl Pager {
    pub fn new<T>(page: &Page<T>, base: &str) -> Self {
        let href = |num: i64| format!("{base}?page={num}");
        let mut links = Vec::new();
        links.push(PageLink {
            label: "\u{ab}".to_string(),
            href: page.prev().map(href).unwrap_or_default(),
            current: false,
        });
        for item in page.iter_pages() {
            match item {
                Some(num) => links.push(PageLink {
                    label: num.to_string(),
                    href: if num == page.page { String::new() } else { href(num) },
                    current: num == page.page,
                }),
                None => links.push(PageLink {
                    label: "\u{2026}".to_string(),
                    href: String::new(),
                    current: false,
                }),
            }
        }
        links.push(PageLink {
            label: "\u{bb}".to_string(),
            href: page.next().map(href).unwrap_or_default(),
            current: false,
        });
        Self { show: page.pages() > 1, links }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
    pub can_write: bool,
    pub form_error: String,
    pub form_body: String,
    pub show_tabs: bool,
    pub followed_tab: bool,
    pub posts: Vec<PostView>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
    pub posts: Vec<PostView>,
    pub post_id: String,
    pub can_comment: bool,
    pub form_error: String,
    pub comments: Vec<CommentView>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "edit_post.html")]
pub struct EditPostTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
    pub post_id: String,
    pub body: String,
    pub form_error: String,
}

#[derive(Template)]
#[template(path = "moderate.html")]
pub struct ModerateTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
    pub comments: Vec<CommentView>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
    pub email: String,
    pub next: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
    pub email: String,
    pub username: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "user.html")]
pub struct UserTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
    pub username: String,
    pub member_since: String,
    pub followers: u64,
    pub following: u64,
    pub can_follow: bool,
    pub following_them: bool,
    pub posts: Vec<PostView>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "403.html")]
pub struct ForbiddenTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
}

#[derive(Template)]
#[template(path = "500.html")]
pub struct ServerErrorTemplate {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
}

impl ForbiddenTemplate {
    pub fn anonymous() -> Self {
        Self { nav: Nav::new(None), flashes: Vec::new() }
    }
}

impl NotFoundTemplate {
    pub fn new(nav: Nav, flashes: Vec<Flash>) -> Self {
        Self { nav, flashes }
    }

    pub fn anonymous() -> Self {
        Self::new(Nav::new(None), Vec::new())
    }
}

impl ServerErrorTemplate {
    pub fn anonymous() -> Self {
        Self { nav: Nav::new(None), flashes: Vec::new() }
    }
}
