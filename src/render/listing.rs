//! Forum list and topic list views.

use askama::Template;
use chrono::{DateTime, Utc};

use super::{asc_flag, parity, pretty_timedelta, sortable_headers};
use crate::acl::Controls;
use crate::error::Result;
use crate::model::{Forum, ForumSummary, GroupSummary, TopicSummary};
use crate::request::{ForumSort, Pager, Sort, SortKey, TopicSort};

const FORUM_COLUMNS: [(ForumSort, &str); 6] = [
    (ForumSort::Id, "ID"),
    (ForumSort::Subject, "Forum"),
    (ForumSort::LastTopic, "Last Topic"),
    (ForumSort::LastReply, "Last Reply"),
    (ForumSort::Topics, "Topics"),
    (ForumSort::Replies, "Replies"),
];

const TOPIC_COLUMNS: [(TopicSort, &str); 5] = [
    (TopicSort::Id, "ID"),
    (TopicSort::Subject, "Subject"),
    (TopicSort::Author, "Author"),
    (TopicSort::LastReply, "Last Reply"),
    (TopicSort::Replies, "Replies"),
];

/// Age of the latest activity, or `empty` when there was none.
fn activity(time: Option<DateTime<Utc>>, now: DateTime<Utc>, empty: &str) -> String {
    time.map(|t| pretty_timedelta(t, now))
        .unwrap_or_else(|| empty.to_string())
}

pub struct ForumListView<'a> {
    /// Public discussion root, e.g. `/discussion`.
    pub href: &'a str,
    pub groups: &'a [GroupSummary],
    pub forums: &'a [ForumSummary],
    pub sort: Sort<ForumSort>,
    pub controls: &'a Controls,
    pub now: DateTime<Utc>,
}

struct ForumRow<'a> {
    parity: &'static str,
    href: String,
    summary: &'a ForumSummary,
    last_topic: String,
    last_reply: String,
}

struct GroupTable<'a> {
    show_header: bool,
    name: &'a str,
    description: &'a str,
    rows: Vec<ForumRow<'a>>,
}

#[derive(Template)]
#[template(path = "listing/forum_list.html")]
struct ForumList<'a> {
    href: &'a str,
    headers: Vec<String>,
    tables: Vec<GroupTable<'a>>,
    may_administer: bool,
}

/// Forums grouped under their group headers; groups without forums are skipped.
pub fn forum_list(view: &ForumListView) -> Result<String> {
    let headers = sortable_headers(&view.sort, &FORUM_COLUMNS, view.href)?;
    let tables = view
        .groups
        .iter()
        .filter(|g| g.forums > 0)
        .map(|g| GroupTable {
            show_header: g.group.id != crate::model::NO_GROUP,
            name: &g.group.name,
            description: &g.group.description,
            rows: view
                .forums
                .iter()
                .filter(|f| f.forum.group == g.group.id)
                .enumerate()
                .map(|(i, f)| ForumRow {
                    parity: parity(i),
                    href: format!("{}/{}", view.href, f.forum.id),
                    summary: f,
                    last_topic: activity(f.last_topic, view.now, "No topics"),
                    last_reply: activity(f.last_reply, view.now, "No replies"),
                })
                .collect(),
        })
        .collect();

    Ok(ForumList {
        href: view.href,
        headers,
        tables,
        may_administer: view.controls.may_administer(),
    }
    .render()?)
}

pub struct TopicListView<'a> {
    /// Public discussion root, e.g. `/discussion`.
    pub href: &'a str,
    pub forum: &'a Forum,
    pub topics: &'a [TopicSummary],
    pub pager: Pager,
    pub sort: Sort<TopicSort>,
    pub controls: &'a Controls,
    pub now: DateTime<Utc>,
}

struct TopicRow<'a> {
    parity: &'static str,
    href: String,
    summary: &'a TopicSummary,
    last_reply: String,
}

#[derive(Template)]
#[template(path = "listing/topic_list.html")]
struct TopicList<'a> {
    forum: &'a Forum,
    forum_href: String,
    total: usize,
    headers: Vec<String>,
    rows: Vec<TopicRow<'a>>,
    prev_href: String,
    next_href: String,
    may_reply: bool,
    may_administer: bool,
    href: &'a str,
}

/// One page of a forum's topics with previous/next links that keep the ordering.
pub fn topic_list(view: &TopicListView) -> Result<String> {
    let forum_href = format!("{}/{}", view.href, view.forum.id);
    let page_href = |start: usize| {
        format!(
            "{}?start={}&order={}&asc={}",
            forum_href,
            start,
            view.sort.key.key(),
            asc_flag(view.sort.ascending)
        )
    };

    let rows = view
        .topics
        .iter()
        .enumerate()
        .map(|(i, t)| TopicRow {
            parity: parity(i),
            href: format!("{}/{}", forum_href, t.topic.id),
            summary: t,
            last_reply: activity(t.topic.last_reply, view.now, "No replies"),
        })
        .collect();

    Ok(TopicList {
        forum: view.forum,
        headers: sortable_headers(&view.sort, &TOPIC_COLUMNS, &forum_href)?,
        total: view.pager.total,
        rows,
        prev_href: view.pager.prev_start().map(&page_href).unwrap_or_default(),
        next_href: view.pager.next_start().map(&page_href).unwrap_or_default(),
        may_reply: view.controls.may_reply(),
        may_administer: view.controls.may_administer(),
        href: view.href,
        forum_href,
    }
    .render()?)
}
