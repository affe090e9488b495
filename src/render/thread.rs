//! Message thread rendering.
//!
//! [`render_replies`] walks the reply tree recursively; [`render_discussion`] wraps
//! it with the topic root, the display-mode switcher and the topic-level reply form.
//! Which forms appear, and where, follows the request's action and target:
//!
//! - an `edit`/`post-edit` target shows the edit form in place of its stored body
//! - an `add`/`quote`/`post-add` target gets a nested reply list ending with the
//!   optional preview and the reply form
//! - once `submit` is set no form is shown

use askama::Template;
use chrono::{DateTime, Utc};

use super::{format_datetime, ControlLink};
use crate::acl::{Controls, ANONYMOUS};
use crate::error::Result;
use crate::model::{MessageNode, Topic};
use crate::request::{DisplayMode, RequestArgs, Target};

pub const DELETE_REPLY_CONFIRM: &str =
    "Do you really want to delete this reply and all its descendants?";

/// Everything a thread render needs besides the tree itself.
#[derive(Debug, Clone)]
pub struct ThreadContext<'a> {
    /// Topic URL that links and forms point at.
    pub href: String,
    pub args: &'a RequestArgs,
    pub controls: Controls,
    /// Timestamp shown on previews.
    pub now: DateTime<Utc>,
}

impl<'a> ThreadContext<'a> {
    pub fn new(href: String, args: &'a RequestArgs, controls: Controls, now: DateTime<Utc>) -> Self {
        ThreadContext { href, args, controls, now }
    }

    /// Author shown on previews and prefilled in the reply form.
    pub fn draft_author(&self) -> String {
        if self.controls.is_anonymous() {
            self.args
                .author
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string())
        } else {
            self.controls.authname().to_string()
        }
    }

    fn draft_body(&self) -> String {
        self.args.body.clone().unwrap_or_default()
    }

    fn action_href(&self, action: &str, target: Target, anchor: bool) -> String {
        let mut href = format!("{}?discussion_action={}", self.href, action);
        if let Target::Message(id) = target {
            href.push_str(&format!(";message={}", id));
        }
        if anchor {
            href.push_str("#reply");
        }
        href
    }

    /// Reply/Quote/Edit for everyone allowed to post, Delete for moderators.
    fn control_links(&self, target: Target, author: &str) -> Vec<ControlLink> {
        let mut links = Vec::new();
        if self.controls.may_reply() {
            links.push(ControlLink::new("Reply", self.action_href("add", target, true)));
            links.push(ControlLink::new("Quote", self.action_href("quote", target, true)));
            if self.controls.may_edit(author) {
                links.push(ControlLink::new("Edit", self.action_href("edit", target, true)));
            }
        }
        if self.controls.may_moderate() {
            if let Target::Message(_) = target {
                links.push(ControlLink::confirmed(
                    "Delete",
                    self.action_href("delete", target, false),
                    DELETE_REPLY_CONFIRM,
                ));
            }
        }
        links
    }

    fn edit_form(&self, target: Target) -> Result<String> {
        let (has_message, message_id) = match target {
            Target::Message(id) => (true, id),
            Target::Topic => (false, 0),
        };
        Ok(EditForm {
            href: &self.href,
            show_subject: !has_message,
            subject: self.args.subject.clone().unwrap_or_default(),
            body: self.draft_body(),
            has_message,
            message_id,
        }
        .render()?)
    }

    /// Preview (when requested) and reply form for `target`, or nothing when the
    /// reply form is not open there.
    fn reply_block(&self, target: Target) -> Result<String> {
        if !self.args.is_replying_to(target) {
            return Ok(String::new());
        }
        let mut out = String::new();
        if self.args.preview {
            out.push_str(&self.preview()?);
        }
        let (has_message, message_id) = match target {
            Target::Message(id) => (true, id),
            Target::Topic => (false, 0),
        };
        out.push_str(
            &ReplyForm {
                href: &self.href,
                anonymous: self.controls.is_anonymous(),
                author: self.draft_author(),
                body: self.draft_body(),
                has_message,
                message_id,
            }
            .render()?,
        );
        Ok(out)
    }

    fn preview(&self) -> Result<String> {
        Ok(Preview {
            body: self.draft_body(),
            author: self.draft_author(),
            time: format_datetime(self.now),
        }
        .render()?)
    }
}

#[derive(Template)]
#[template(path = "thread/edit_form.html")]
struct EditForm<'a> {
    href: &'a str,
    show_subject: bool,
    subject: String,
    body: String,
    has_message: bool,
    message_id: u64,
}

#[derive(Template)]
#[template(path = "thread/reply_form.html")]
struct ReplyForm<'a> {
    href: &'a str,
    anonymous: bool,
    author: String,
    body: String,
    has_message: bool,
    message_id: u64,
}

#[derive(Template)]
#[template(path = "thread/preview.html")]
struct Preview {
    body: String,
    author: String,
    time: String,
}

#[derive(Template)]
#[template(path = "thread/message.html")]
struct MessageRow<'a> {
    node: &'a MessageNode,
    time: String,
    links: Vec<ControlLink>,
    editing: bool,
    preview: bool,
    draft_body: String,
    edit_form: String,
    open_replies: bool,
    children: String,
    reply_block: String,
}

struct DisplayLink {
    href: String,
    label: &'static str,
}

#[derive(Template)]
#[template(path = "thread/set_display.html")]
struct SetDisplay {
    links: Vec<DisplayLink>,
}

#[derive(Template)]
#[template(path = "thread/topic.html")]
struct TopicView<'a> {
    topic: &'a Topic,
    is_new: bool,
    subject: String,
    time: String,
    links: Vec<ControlLink>,
    editing: bool,
    preview: bool,
    draft_body: String,
    edit_form: String,
    show_replies: bool,
    set_display: String,
    replies: String,
    reply_block: String,
}

/// Render a list of sibling replies and, recursively, everything below them.
pub fn render_replies(nodes: &[MessageNode], ctx: &ThreadContext) -> Result<String> {
    let mut out = String::new();
    for node in nodes {
        let target = Target::Message(node.id);
        let editing = ctx.args.is_editing(target);
        let replying = ctx.args.is_replying_to(target);
        let children = if node.replies.is_empty() {
            String::new()
        } else {
            render_replies(&node.replies, ctx)?
        };
        let row = MessageRow {
            node,
            time: format_datetime(node.time),
            links: ctx.control_links(target, &node.author),
            editing,
            preview: editing && ctx.args.preview,
            draft_body: ctx.draft_body(),
            edit_form: if editing { ctx.edit_form(target)? } else { String::new() },
            open_replies: !node.replies.is_empty() || replying,
            children,
            reply_block: ctx.reply_block(target)?,
        };
        out.push_str(&row.render()?);
    }
    Ok(out)
}

/// Display-mode switcher shown above and below the replies.
pub fn render_set_display(href: &str) -> Result<String> {
    let links = DisplayMode::ALL
        .iter()
        .map(|mode| DisplayLink {
            href: format!("{}?discussion_action=set-display;display={}", href, mode.as_str()),
            label: mode.label(),
        })
        .collect();
    Ok(SetDisplay { links }.render()?)
}

/// Topic root followed by its replies container.
///
/// The container is left out when there are no replies and the reply form is not
/// open on the topic.
pub fn render_discussion(
    topic: &Topic,
    is_new: bool,
    messages: &[MessageNode],
    ctx: &ThreadContext,
) -> Result<String> {
    let editing = ctx.args.is_editing(Target::Topic);
    let replying = ctx.args.reply_target() == Some(Target::Topic);
    let show_replies = !messages.is_empty() || replying;

    let view = TopicView {
        topic,
        is_new,
        subject: if editing {
            ctx.args.subject.clone().unwrap_or_else(|| topic.subject.clone())
        } else {
            topic.subject.clone()
        },
        time: format_datetime(topic.time),
        links: ctx.control_links(Target::Topic, &topic.author),
        editing,
        preview: editing && ctx.args.preview,
        draft_body: ctx.draft_body(),
        edit_form: if editing { ctx.edit_form(Target::Topic)? } else { String::new() },
        show_replies,
        set_display: if show_replies { render_set_display(&ctx.href)? } else { String::new() },
        replies: render_replies(messages, ctx)?,
        reply_block: ctx.reply_block(Target::Topic)?,
    };
    Ok(view.render()?)
}
