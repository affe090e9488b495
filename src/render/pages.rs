//! Whole discussion pages built from the fragments in the sibling modules.

use askama::Template;
use chrono::{DateTime, Utc};

use super::admin::{forum_form, ForumFormView};
use super::format_datetime;
use crate::acl::{Controls, ANONYMOUS};
use crate::dispatch::Mode;
use crate::error::Result;
use crate::model::{Forum, GroupSummary, Topic};
use crate::request::RequestArgs;

#[derive(Template)]
#[template(path = "pages/page.html")]
struct PageFrame<'a> {
    mode: &'a str,
    nav: &'a str,
    body: &'a str,
}

/// Wrap a page body with the breadcrumbs and the content container named after the
/// page mode.
pub fn frame(mode: Mode, nav: &str, body: &str) -> Result<String> {
    Ok(PageFrame {
        mode: mode.as_str(),
        nav,
        body,
    }
    .render()?)
}

pub struct MessageListView<'a> {
    /// Public discussion root.
    pub href: &'a str,
    pub forum: &'a Forum,
    pub topic: &'a Topic,
    /// Output of [`super::thread::render_discussion`].
    pub discussion: &'a str,
    pub controls: &'a Controls,
}

#[derive(Template)]
#[template(path = "pages/message_list.html")]
struct MessageList<'a> {
    forum_href: String,
    topic_href: String,
    forum: &'a Forum,
    topic: &'a Topic,
    discussion: &'a str,
    may_moderate: bool,
}

/// Topic page: heading, the thread, and the Delete/Move topic buttons for moderators.
pub fn message_list(view: &MessageListView) -> Result<String> {
    let forum_href = format!("{}/{}", view.href, view.forum.id);
    Ok(MessageList {
        topic_href: format!("{}/{}", forum_href, view.topic.id),
        forum_href,
        forum: view.forum,
        topic: view.topic,
        discussion: view.discussion,
        may_moderate: view.controls.may_moderate(),
    }
    .render()?)
}

#[derive(Template)]
#[template(path = "pages/wiki_message_list.html")]
struct WikiMessageList<'a> {
    allowed: bool,
    discussion: Option<&'a str>,
}

/// Thread embedded in a wiki page; `discussion` is `None` when the page has no topic.
pub fn wiki_message_list(allowed: bool, discussion: Option<&str>) -> Result<String> {
    Ok(WikiMessageList { allowed, discussion }.render()?)
}

pub struct TopicAddView<'a> {
    /// Public discussion root.
    pub href: &'a str,
    pub forum: &'a Forum,
    pub args: &'a RequestArgs,
    pub controls: &'a Controls,
    pub now: DateTime<Utc>,
}

#[derive(Template)]
#[template(path = "pages/topic_add.html")]
struct TopicAdd<'a> {
    forum_href: String,
    preview: bool,
    anonymous: bool,
    author: String,
    subject: &'a str,
    body: &'a str,
    time: String,
}

/// New topic form, preceded by the draft when previewing.
pub fn topic_add(view: &TopicAddView) -> Result<String> {
    let anonymous = view.controls.is_anonymous();
    let author = if anonymous {
        view.args
            .author
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_string())
    } else {
        view.controls.authname().to_string()
    };
    Ok(TopicAdd {
        forum_href: format!("{}/{}", view.href, view.forum.id),
        preview: view.args.preview,
        anonymous,
        author,
        subject: view.args.subject.as_deref().unwrap_or_default(),
        body: view.args.body.as_deref().unwrap_or_default(),
        time: format_datetime(view.now),
    }
    .render()?)
}

#[derive(Template)]
#[template(path = "pages/forum_add.html")]
struct ForumAdd {
    form: String,
}

/// Public "Add Forum" page.
pub fn forum_add(href: &str, groups: &[GroupSummary], users: &[String]) -> Result<String> {
    let form = forum_form(&ForumFormView {
        action: href,
        cancel: href,
        editing: None,
        groups,
        users,
    })?;
    Ok(ForumAdd { form }.render()?)
}

struct ForumOption<'a> {
    id: u64,
    name: &'a str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "pages/topic_move.html")]
struct TopicMove<'a> {
    topic_href: String,
    options: Vec<ForumOption<'a>>,
}

/// Forum picker for moving `topic`, its current forum preselected.
pub fn topic_move(href: &str, topic: &Topic, forums: &[Forum]) -> Result<String> {
    let options = forums
        .iter()
        .map(|f| ForumOption {
            id: f.id,
            name: &f.name,
            selected: f.id == topic.forum,
        })
        .collect();
    Ok(TopicMove {
        topic_href: format!("{}/{}/{}", href, topic.forum, topic.id),
        options,
    }
    .render()?)
}
