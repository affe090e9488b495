//! Board-wide read queries outside the forum pages: keyword search, the activity
//! timeline and the notification recipients of a thread.

use chrono::{DateTime, Utc};
use log::debug;

use super::Board;
use crate::acl::ANONYMOUS;
use crate::error::{DiscussionError, Result};

/// Longest title kept before it is cut at a word boundary.
const TITLE_CHARS: usize = 75;
/// Excerpt length after the first keyword hit.
const EXCERPT_CHARS: usize = 240;
/// Context kept in front of the first keyword hit.
const EXCERPT_LEAD: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Topic,
    Message,
}

/// One search result, pointing at a topic root or a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: HitKind,
    pub id: u64,
    pub forum: u64,
    pub topic: u64,
    /// `topic: <id>: <subject>` or `message: <id>: <topic subject>`.
    pub title: String,
    pub author: String,
    pub time: DateTime<Utc>,
    pub excerpt: String,
}

impl SearchHit {
    pub fn href(&self, base: &str) -> String {
        match self.kind {
            HitKind::Topic => format!("{}/{}/{}#-1", base, self.forum, self.topic),
            HitKind::Message => format!("{}/{}/{}/{}#{}", base, self.forum, self.topic, self.id, self.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ForumCreated,
    TopicPosted,
    MessagePosted,
}

/// Something that happened on the board at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEvent {
    pub kind: EventKind,
    pub time: DateTime<Utc>,
    pub author: String,
    pub title: String,
    pub summary: String,
    pub forum: u64,
    pub topic: Option<u64>,
    pub message: Option<u64>,
}

impl TimelineEvent {
    pub fn href(&self, base: &str) -> String {
        match (self.topic, self.message) {
            (Some(topic), Some(id)) => format!("{}/{}/{}/{}#{}", base, self.forum, topic, id, id),
            (Some(topic), None) => format!("{}/{}/{}", base, self.forum, topic),
            _ => format!("{}/{}", base, self.forum),
        }
    }
}

/// Who hears about a new post in a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    /// Topic author and everyone who replied, in posting order.
    pub to: Vec<String>,
    /// Forum moderators not already addressed directly.
    pub cc: Vec<String>,
}

impl Board {
    /// Topics whose subject or body, and replies whose body, contain `query`
    /// (case-insensitive). Topic hits come first, each group ordered by id.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let needle: Vec<char> = query.chars().collect();

        let mut topics: Vec<_> = self
            .topics
            .iter()
            .filter(|t| contains_ci(&t.subject, &needle) || contains_ci(&t.body, &needle))
            .collect();
        topics.sort_by_key(|t| t.id);

        let mut messages: Vec<_> = self
            .messages
            .iter()
            .filter(|m| contains_ci(&m.body, &needle))
            .collect();
        messages.sort_by_key(|m| m.id);

        let mut hits: Vec<SearchHit> = topics
            .into_iter()
            .map(|t| SearchHit {
                kind: HitKind::Topic,
                id: t.id,
                forum: t.forum,
                topic: t.id,
                title: format!("topic: {}: {}", t.id, shorten_line(&t.subject)),
                author: t.author.clone(),
                time: t.time,
                excerpt: excerpt(&t.body, &needle),
            })
            .collect();
        hits.extend(messages.into_iter().map(|m| {
            let subject = self.topic(m.topic).map(|t| t.subject.as_str()).unwrap_or_default();
            SearchHit {
                kind: HitKind::Message,
                id: m.id,
                forum: m.forum,
                topic: m.topic,
                title: format!("message: {}: {}", m.id, shorten_line(subject)),
                author: m.author.clone(),
                time: m.time,
                excerpt: excerpt(&m.body, &needle),
            }
        }));

        debug!("search '{}': {} hit(s)", crate::logutil::escape_log(query), hits.len());
        hits
    }

    /// Forums created, topics posted and replies posted between `start` and `stop`
    /// inclusive, newest first. Replies of vanished topics or forums are skipped.
    pub fn timeline(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Vec<TimelineEvent> {
        let within = |time: DateTime<Utc>| start <= time && time <= stop;
        let forum_name = |id: u64| self.forum(id).map(|f| f.name.as_str());

        let mut events: Vec<TimelineEvent> = self
            .forums
            .iter()
            .filter(|f| within(f.time))
            .map(|f| TimelineEvent {
                kind: EventKind::ForumCreated,
                time: f.time,
                author: f.author.clone(),
                title: format!("New forum {} created by {}", f.name, f.author),
                summary: format!("{} - {}", f.subject, f.description),
                forum: f.id,
                topic: None,
                message: None,
            })
            .collect();

        events.extend(self.topics.iter().filter(|t| within(t.time)).map(|t| TimelineEvent {
            kind: EventKind::TopicPosted,
            time: t.time,
            author: t.author.clone(),
            title: format!(
                "[{} Forum] {} ({})",
                forum_name(t.forum).unwrap_or_default(),
                t.subject,
                t.author
            ),
            summary: t.subject.clone(),
            forum: t.forum,
            topic: Some(t.id),
            message: None,
        }));

        events.extend(self.messages.iter().filter(|m| within(m.time)).filter_map(|m| {
            let name = forum_name(m.forum)?;
            let topic = self.topic(m.topic)?;
            Some(TimelineEvent {
                kind: EventKind::MessagePosted,
                time: m.time,
                author: m.author.clone(),
                title: format!("[{} Forum] Re: {} ({})", name, topic.subject, m.author),
                summary: topic.subject.clone(),
                forum: m.forum,
                topic: Some(m.topic),
                message: Some(m.id),
            })
        }));

        events.sort_by(|a, b| b.time.cmp(&a.time));
        debug!("timeline {} .. {}: {} event(s)", start, stop, events.len());
        events
    }

    /// Recipients of a notification about a new post in `topic`. Anonymous
    /// posters have no address and are left out.
    pub fn recipients(&self, topic: u64) -> Result<Recipients> {
        let topic = self
            .topic(topic)
            .ok_or_else(|| DiscussionError::not_found("topic", topic))?;

        let mut replies: Vec<_> = self.messages.iter().filter(|m| m.topic == topic.id).collect();
        replies.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));

        let mut out = Recipients::default();
        let authors = std::iter::once(topic.author.as_str()).chain(replies.iter().map(|m| m.author.as_str()));
        for author in authors {
            if author != ANONYMOUS && !author.is_empty() && !out.to.iter().any(|a| a == author) {
                out.to.push(author.to_string());
            }
        }
        if let Some(forum) = self.forum(topic.forum) {
            for moderator in &forum.moderators {
                if !out.to.contains(moderator) && !out.cc.contains(moderator) {
                    out.cc.push(moderator.clone());
                }
            }
        }
        Ok(out)
    }
}

fn find_ci(hay: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| {
        hay[i..i + needle.len()]
            .iter()
            .zip(needle)
            .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
    })
}

fn contains_ci(text: &str, needle: &[char]) -> bool {
    let hay: Vec<char> = text.chars().collect();
    find_ci(&hay, needle).is_some()
}

/// Cut a one-line title at the last word boundary before the limit.
pub fn shorten_line(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < TITLE_CHARS {
        return text.to_string();
    }
    let cut = chars[..TITLE_CHARS]
        .iter()
        .rposition(|&c| c == ' ' || c == '\n')
        .unwrap_or(TITLE_CHARS);
    format!("{} ...", chars[..cut].iter().collect::<String>())
}

/// Window of `text` around the first occurrence of `needle`.
fn excerpt(text: &str, needle: &[char]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let hit = find_ci(&chars, needle).unwrap_or(0);
    let begin = hit.saturating_sub(EXCERPT_LEAD);
    let end = (hit + EXCERPT_CHARS).min(chars.len());

    let mut out = String::new();
    if begin > 0 {
        out.push_str("... ");
    }
    out.extend(&chars[begin..end]);
    if end < chars.len() {
        out.push_str(" ...");
    }
    out
}
