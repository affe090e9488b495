//! # Request Handler
//!
//! Drives one discussion request end to end:
//!
//! 1. route the path and parse the query or form body into [`RequestArgs`]
//! 2. resolve the addressed group, forum, topic and reply, checking that they agree
//! 3. resolve the ordered [`Mode`] list and check every mode against the viewer
//! 4. prepare form state (quote, edit, display mode) and apply mutations
//! 5. answer mutations with a redirect (post/redirect/get), otherwise render the
//!    page named by the last mode
//!
//! Threads embedded in wiki pages are the exception to step 5: reply mutations
//! there fall through to the embedded thread instead of redirecting.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::acl::{Capabilities, Capability, Controls, Viewer, ANONYMOUS};
use crate::config::DiscussionConfig;
use crate::dispatch::{resolve_modes, route, Component, Mode, Targets};
use crate::error::{DiscussionError, Result};
use crate::logutil::escape_log;
use crate::model::{is_new_since, Forum, ForumGroup, MessageRecord, Topic, NO_GROUP};
use crate::render::admin::{admin_forum_list, admin_group_list, AdminForumListView, AdminGroupListView};
use crate::render::listing::{forum_list, topic_list, ForumListView, TopicListView};
use crate::render::nav::{breadcrumbs, render_nav};
use crate::render::pages::{
    forum_add, frame, message_list, topic_add, topic_move, wiki_message_list, MessageListView,
    TopicAddView,
};
use crate::render::thread::{render_discussion, ThreadContext};
use crate::request::{quote_body, DisplayMode, Pager, RequestArgs, Sort};
use crate::storage::{Board, ForumFields};
use crate::validation::{clean_author, clean_body, clean_line};

/// One incoming request as the host hands it over.
#[derive(Debug, Clone)]
pub struct Request {
    pub path: String,
    /// Query string or urlencoded form body.
    pub query: String,
    pub user: String,
    pub capabilities: Capabilities,
    /// Serve the path through another component, e.g. embed a thread as a wiki
    /// page would.
    pub component: Option<Component>,
    /// Last visit of the addressed topic; anything posted later is marked new.
    pub visited: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

impl Request {
    pub fn new(path: &str, query: &str, user: &str, capabilities: Capabilities) -> Self {
        Request {
            path: path.to_string(),
            query: query.to_string(),
            user: user.to_string(),
            capabilities,
            component: None,
            visited: None,
            now: Utc::now(),
        }
    }
}

/// Per-visitor state kept between requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub display: DisplayMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub mode: Mode,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Page(Page),
    Redirect(String),
}

/// Entities a request addresses, looked up once before any mode runs.
#[derive(Debug, Default)]
struct Resolved {
    group: Option<ForumGroup>,
    forum: Option<Forum>,
    topic: Option<Topic>,
    message: Option<MessageRecord>,
}

impl Resolved {
    fn forum(&self) -> Result<&Forum> {
        self.forum
            .as_ref()
            .ok_or_else(|| DiscussionError::InvalidRequest("no forum addressed".into()))
    }

    fn topic(&self) -> Result<&Topic> {
        self.topic
            .as_ref()
            .ok_or_else(|| DiscussionError::InvalidRequest("no topic addressed".into()))
    }

    fn message(&self) -> Result<&MessageRecord> {
        self.message
            .as_ref()
            .ok_or_else(|| DiscussionError::InvalidRequest("no reply addressed".into()))
    }

    /// Author of the post an edit mode works on.
    fn edited_author(&self, mode: Mode) -> Result<&str> {
        match mode {
            Mode::MessageEdit | Mode::MessagePostEdit => Ok(&self.message()?.author),
            _ => Ok(&self.topic()?.author),
        }
    }
}

/// Handle one request against `board`.
pub fn handle(
    board: &mut Board,
    config: &DiscussionConfig,
    session: &mut Session,
    request: &Request,
) -> Result<Response> {
    let path = canonical_path(config, &request.path);
    let route = route(&path)?;
    let component = request.component.unwrap_or(route.component);

    let mut args = RequestArgs::from_query(&request.query)?;
    route.apply_to(&mut args);
    if component == Component::Admin {
        args.topic = None;
        args.message = None;
    }
    if let Some(page) = route.wiki_page.as_deref() {
        args.topic = board.topic_by_subject(page).map(|t| t.id);
    }

    let resolved = resolve_entities(board, &mut args)?;
    let targets = Targets {
        group: args.group,
        forum: resolved.forum.is_some(),
        topic: resolved.topic.is_some(),
        message: resolved.message.is_some(),
    };
    let modes = resolve_modes(component, &targets, args.action, args.preview);
    debug!(
        "{} {:?} action={:?} preview={} -> [{}]",
        escape_log(&path),
        component,
        args.action,
        args.preview,
        modes.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ")
    );

    let viewer = Viewer::for_forum(&request.user, request.capabilities, resolved.forum.as_ref());
    let controls = viewer.controls();
    for &mode in &modes {
        authorize(mode, &viewer, &controls, &resolved)?;
    }

    let ctx = Context {
        config,
        request,
        component,
        controls,
        resolved,
    };
    let mut redirect = None;
    for &mode in modes.iter().filter(|m| !m.is_page()) {
        if let Some(href) = run_mode(mode, &ctx, board, session, &mut args)? {
            redirect = Some(href);
        }
    }

    if let Some(href) = redirect.filter(|_| component != Component::Wiki) {
        debug!("redirecting to {}", escape_log(&href));
        return Ok(Response::Redirect(href));
    }

    let page_mode = modes.last().copied().unwrap_or(Mode::ForumList);
    let page = render_page(page_mode, &ctx, board, session, &path, &args)?;
    Ok(Response::Page(page))
}

/// Map the configured URL roots onto the built-in route prefixes.
fn canonical_path(config: &DiscussionConfig, path: &str) -> String {
    fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
        let root = root.trim_end_matches('/');
        if root.is_empty() {
            return None;
        }
        let rest = path.strip_prefix(root)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    if let Some(rest) = strip_root(path, &config.admin_href) {
        format!("/admin/discussion{}", rest)
    } else if let Some(rest) = strip_root(path, &config.base_href) {
        format!("/discussion{}", rest)
    } else {
        path.to_string()
    }
}

/// Look up the addressed entities from the deepest one up and fill in the ids the
/// request left out. Ids naming entities that do not belong together are rejected.
fn resolve_entities(board: &Board, args: &mut RequestArgs) -> Result<Resolved> {
    let mut resolved = Resolved::default();

    if let Some(id) = args.message {
        let message = board
            .message(id)
            .cloned()
            .ok_or_else(|| DiscussionError::not_found("message", id))?;
        if let Some(topic) = args.topic.filter(|&t| t != message.topic) {
            return Err(DiscussionError::InvalidRequest(format!(
                "message {} is not part of topic {}",
                id, topic
            )));
        }
        args.topic = Some(message.topic);
        resolved.message = Some(message);
    }

    if let Some(id) = args.topic {
        let topic = board
            .topic(id)
            .cloned()
            .ok_or_else(|| DiscussionError::not_found("topic", id))?;
        if let Some(forum) = args.forum.filter(|&f| f != topic.forum) {
            return Err(DiscussionError::InvalidRequest(format!(
                "topic {} is not part of forum {}",
                id, forum
            )));
        }
        args.forum = Some(topic.forum);
        resolved.topic = Some(topic);
    }

    if let Some(id) = args.forum {
        let forum = board
            .forum(id)
            .cloned()
            .ok_or_else(|| DiscussionError::not_found("forum", id))?;
        resolved.forum = Some(forum);
    }

    if let Some(id) = args.group.filter(|&g| g != NO_GROUP) {
        let group = board
            .group(id)
            .cloned()
            .ok_or_else(|| DiscussionError::not_found("group", id))?;
        resolved.group = Some(group);
    }

    Ok(resolved)
}

/// Reject a mode the viewer may not run. The embedded wiki thread is always
/// rendered; it shows a notice itself when viewing is not allowed.
fn authorize(mode: Mode, viewer: &Viewer, controls: &Controls, resolved: &Resolved) -> Result<()> {
    if mode == Mode::WikiMessageList {
        return Ok(());
    }
    let capability = mode.required_capability();
    if !viewer.capabilities.has(capability) {
        return Err(DiscussionError::PermissionDenied(format!(
            "{} requires {}",
            mode, capability
        )));
    }
    if capability == Capability::Moderate && !viewer.is_moderator {
        return Err(DiscussionError::PermissionDenied(format!(
            "{} is limited to forum moderators",
            mode
        )));
    }
    if mode.requires_authorship() && !controls.may_edit(resolved.edited_author(mode)?) {
        return Err(DiscussionError::PermissionDenied(format!(
            "{} is limited to the author and forum moderators",
            mode
        )));
    }
    Ok(())
}

/// Everything a mode needs besides the board, the session and the form state.
struct Context<'a> {
    config: &'a DiscussionConfig,
    request: &'a Request,
    component: Component,
    controls: Controls,
    resolved: Resolved,
}

impl Context<'_> {
    fn forum_href(&self, forum: u64) -> String {
        format!("{}/{}", self.config.base_href, forum)
    }

    fn topic_href(&self) -> Result<String> {
        let topic = self.resolved.topic()?;
        Ok(format!("{}/{}/{}", self.config.base_href, topic.forum, topic.id))
    }

    fn admin_href(&self, page: &str) -> String {
        format!("{}/{}", self.config.admin_href, page)
    }

    fn body(&self, args: &RequestArgs) -> Result<String> {
        Ok(clean_body(
            args.body.as_deref().unwrap_or_default(),
            self.config.max_body_bytes,
        )?)
    }
}

/// Run a form-preparation or mutation mode. Mutations return where to redirect.
fn run_mode(
    mode: Mode,
    ctx: &Context,
    board: &mut Board,
    session: &mut Session,
    args: &mut RequestArgs,
) -> Result<Option<String>> {
    let resolved = &ctx.resolved;
    let redirect = match mode {
        Mode::TopicQuote => {
            args.body = Some(quote_body(&resolved.topic()?.body));
            None
        }
        Mode::MessageQuote => {
            args.body = Some(quote_body(&resolved.message()?.body));
            None
        }
        Mode::TopicEdit => {
            let topic = resolved.topic()?;
            args.subject.get_or_insert_with(|| topic.subject.clone());
            args.body.get_or_insert_with(|| topic.body.clone());
            None
        }
        Mode::MessageEdit => {
            let message = resolved.message()?;
            args.body.get_or_insert_with(|| message.body.clone());
            None
        }
        Mode::MessageSetDisplay => {
            if let Some(display) = args.display {
                session.display = display;
            }
            None
        }

        Mode::GroupPostAdd => {
            let name = clean_line("name", args.name.as_deref().unwrap_or_default(), true)?;
            let description = clean_line("description", args.description.as_deref().unwrap_or_default(), false)?;
            board.add_group(&name, &description);
            Some(ctx.admin_href("group"))
        }
        Mode::GroupPostEdit => {
            let group = resolved
                .group
                .as_ref()
                .ok_or_else(|| DiscussionError::InvalidRequest("no group addressed".into()))?;
            let name = clean_line("name", args.name.as_deref().unwrap_or_default(), true)?;
            let description = clean_line("description", args.description.as_deref().unwrap_or_default(), false)?;
            board.edit_group(group.id, &name, &description)?;
            Some(ctx.admin_href("group"))
        }
        Mode::GroupsDelete => {
            for &id in args.selection.iter().filter(|&&id| id != NO_GROUP) {
                board.delete_group(id)?;
            }
            Some(ctx.admin_href("group"))
        }
        Mode::ForumPostAdd => {
            let fields = forum_fields(args)?;
            board.add_forum(fields, &ctx.request.user, ctx.request.now);
            if ctx.component == Component::Admin {
                Some(ctx.admin_href("forum"))
            } else {
                Some(ctx.config.base_href.clone())
            }
        }
        Mode::ForumPostEdit => {
            board.edit_forum(resolved.forum()?.id, forum_fields(args)?)?;
            Some(ctx.admin_href("forum"))
        }
        Mode::ForumDelete => {
            board.delete_forum(resolved.forum()?.id)?;
            Some(ctx.config.base_href.clone())
        }
        Mode::ForumsDelete => {
            for &id in &args.selection {
                board.delete_forum(id)?;
            }
            Some(ctx.admin_href("forum"))
        }

        Mode::TopicPostAdd => {
            let forum = resolved.forum()?;
            let subject = clean_line("subject", args.subject.as_deref().unwrap_or_default(), true)?;
            let body = ctx.body(args)?;
            let author = post_author(&ctx.controls, args)?;
            let id = board.add_topic(forum.id, &subject, &author, &body, ctx.request.now)?;
            log_notification(board, id)?;
            Some(ctx.forum_href(forum.id))
        }
        Mode::TopicPostEdit => {
            let topic = resolved.topic()?;
            let subject = match args.subject.as_deref() {
                Some(subject) => clean_line("subject", subject, true)?,
                None => topic.subject.clone(),
            };
            let body = ctx.body(args)?;
            board.edit_topic(topic.id, &subject, &body)?;
            args.submit = true;
            Some(ctx.topic_href()?)
        }
        Mode::TopicPostMove => {
            let topic = resolved.topic()?;
            let new_forum = args
                .new_forum
                .ok_or_else(|| DiscussionError::InvalidRequest("new_forum is missing".into()))?;
            board.move_topic(topic.id, new_forum)?;
            Some(ctx.forum_href(new_forum))
        }
        Mode::TopicDelete => {
            let topic = resolved.topic()?;
            board.delete_topic(topic.id)?;
            Some(ctx.forum_href(topic.forum))
        }

        Mode::MessagePostAdd => {
            let topic = resolved.topic()?;
            let body = ctx.body(args)?;
            let author = post_author(&ctx.controls, args)?;
            let parent = resolved.message.as_ref().map(|m| m.id);
            let id = board.add_message(topic.id, parent, &author, &body, ctx.request.now)?;
            log_notification(board, topic.id)?;
            args.submit = true;
            Some(format!("{}#{}", ctx.topic_href()?, id))
        }
        Mode::MessagePostEdit => {
            let body = ctx.body(args)?;
            board.edit_message(resolved.message()?.id, &body)?;
            args.submit = true;
            Some(ctx.topic_href()?)
        }
        Mode::MessageDelete => {
            board.delete_message(resolved.message()?.id)?;
            args.message = None;
            Some(ctx.topic_href()?)
        }

        page => {
            return Err(DiscussionError::InvalidRequest(format!(
                "{} does not prepare or change anything",
                page
            )))
        }
    };

    if mode.is_mutation() {
        info!(
            "{} by {} applied",
            mode,
            escape_log(ctx.controls.authname())
        );
    }
    Ok(redirect)
}

/// Submitted forum form: name and subject required, moderators deduplicated in
/// the order given.
fn forum_fields(args: &RequestArgs) -> Result<ForumFields> {
    let mut moderators: Vec<String> = Vec::new();
    for name in &args.moderators {
        let name = clean_author(name)?;
        if !moderators.contains(&name) {
            moderators.push(name);
        }
    }
    Ok(ForumFields {
        name: clean_line("name", args.name.as_deref().unwrap_or_default(), true)?,
        subject: clean_line("subject", args.subject.as_deref().unwrap_or_default(), true)?,
        description: clean_line("description", args.description.as_deref().unwrap_or_default(), false)?,
        moderators,
        group: args.group.unwrap_or(NO_GROUP),
    })
}

fn log_notification(board: &Board, topic: u64) -> Result<()> {
    let recipients = board.recipients(topic)?;
    info!(
        "notify topic {}: to=[{}] cc=[{}]",
        topic,
        escape_log(&recipients.to.join(", ")),
        escape_log(&recipients.cc.join(", "))
    );
    Ok(())
}

/// Authenticated posters post under their own name; anonymous ones may pick one.
fn post_author(controls: &Controls, args: &RequestArgs) -> Result<String> {
    if !controls.is_anonymous() {
        return Ok(controls.authname().to_string());
    }
    let typed = args
        .author
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(ANONYMOUS);
    Ok(clean_author(typed)?)
}

/// Render the page named by `mode` from the board as it is after all mutations.
fn render_page(
    mode: Mode,
    ctx: &Context,
    board: &Board,
    session: &Session,
    path: &str,
    args: &RequestArgs,
) -> Result<Page> {
    let (config, request, controls) = (ctx.config, ctx.request, &ctx.controls);
    let base = config.base_href.as_str();
    let forum = args.forum.and_then(|id| board.forum(id));
    let topic = args.topic.and_then(|id| board.topic(id));
    let mut title = config.title.clone();

    let body = match mode {
        Mode::ForumList => forum_list(&ForumListView {
            href: base,
            groups: &board.groups_with_counts(Sort::default()),
            forums: &board.forum_summaries(Sort::from_args(args)),
            sort: Sort::from_args(args),
            controls,
            now: request.now,
        })?,
        Mode::AdminForumList => admin_forum_list(&AdminForumListView {
            href: &config.admin_href,
            forums: &board.forum_summaries(Sort::from_args(args)),
            groups: &board.groups_with_counts(Sort::default()),
            users: &board.known_users(),
            sort: Sort::from_args(args),
            editing: forum.filter(|_| !args.submit),
        })?,
        Mode::AdminGroupList => admin_group_list(&AdminGroupListView {
            href: &config.admin_href,
            groups: &board.groups_with_counts(Sort::from_args(args)),
            sort: Sort::from_args(args),
            editing: args
                .group
                .and_then(|id| board.group(id))
                .filter(|_| !args.submit),
        })?,
        Mode::ForumAdd => forum_add(
            base,
            &board.groups_with_counts(Sort::default()),
            &board.known_users(),
        )?,
        Mode::TopicList => {
            let forum = forum.ok_or_else(|| DiscussionError::InvalidRequest("no forum addressed".into()))?;
            title = forum.name.clone();
            let sort = Sort::from_args(args);
            let pager = Pager::new(args.start, config.topics_per_page, board.topic_count(forum.id));
            topic_list(&TopicListView {
                href: base,
                forum,
                topics: &board.topic_page(forum.id, sort, pager.start, pager.per_page),
                pager,
                sort,
                controls,
                now: request.now,
            })?
        }
        Mode::TopicAdd => {
            let forum = forum.ok_or_else(|| DiscussionError::InvalidRequest("no forum addressed".into()))?;
            topic_add(&TopicAddView {
                href: base,
                forum,
                args,
                controls,
                now: request.now,
            })?
        }
        Mode::TopicMove => {
            let topic = topic.ok_or_else(|| DiscussionError::InvalidRequest("no topic addressed".into()))?;
            topic_move(base, topic, board.forums())?
        }
        Mode::MessageList => {
            let (forum, topic) = forum.zip(topic).ok_or_else(|| {
                DiscussionError::InvalidRequest("no topic addressed".into())
            })?;
            title = topic.subject.clone();
            let thread = ThreadContext::new(
                format!("{}/{}/{}", base, forum.id, topic.id),
                args,
                controls.clone(),
                request.now,
            );
            let messages = board.messages(topic.id, session.display, request.visited);
            let discussion = render_discussion(topic, is_new_since(topic.time, request.visited), &messages, &thread)?;
            message_list(&MessageListView {
                href: base,
                forum,
                topic,
                discussion: &discussion,
                controls,
            })?
        }
        Mode::WikiMessageList => {
            let allowed = request.capabilities.view;
            let discussion = match topic.filter(|_| allowed) {
                Some(topic) => {
                    let thread = ThreadContext::new(
                        path.trim_end_matches('/').to_string(),
                        args,
                        controls.clone(),
                        request.now,
                    );
                    let messages = board.messages(topic.id, session.display, request.visited);
                    Some(render_discussion(topic, is_new_since(topic.time, request.visited), &messages, &thread)?)
                }
                None => None,
            };
            wiki_message_list(allowed, discussion.as_deref())?
        }
        other => {
            return Err(DiscussionError::InvalidRequest(format!(
                "{} does not render a page",
                other
            )))
        }
    };

    let nav = match mode {
        Mode::AdminForumList | Mode::AdminGroupList | Mode::WikiMessageList => String::new(),
        _ => render_nav(breadcrumbs(base, forum, topic, args.message.is_some()))?,
    };
    Ok(Page {
        title,
        mode,
        html: frame(mode, &nav, &body)?,
    })
}
