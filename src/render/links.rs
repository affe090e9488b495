//! `forum:<id>`, `topic:<id>` and `message:<id>` links written in wiki text.

use std::str::FromStr;

use askama::Template;

use crate::error::{DiscussionError, Result};
use crate::storage::Board;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    Forum(u64),
    Topic(u64),
    Message(u64),
}

impl FromStr for LinkTarget {
    type Err = DiscussionError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || DiscussionError::InvalidRequest(format!("'{}' is not a discussion link", s));
        let (ns, id) = s.split_once(':').ok_or_else(bad)?;
        let id: u64 = id.trim().parse().map_err(|_| bad())?;
        match ns {
            "forum" => Ok(LinkTarget::Forum(id)),
            "topic" => Ok(LinkTarget::Topic(id)),
            "message" => Ok(LinkTarget::Message(id)),
            _ => Err(bad()),
        }
    }
}

#[derive(Template)]
#[template(path = "wiki_link.html")]
struct WikiLink<'a> {
    href: String,
    title: String,
    label: &'a str,
    missing: bool,
}

/// Render `target` as an anchor titled after what it points to. Targets that no
/// longer exist render with the `missing` class.
pub fn render_link(board: &Board, base: &str, target: LinkTarget, label: &str) -> Result<String> {
    let found = match target {
        LinkTarget::Forum(id) => board
            .forum(id)
            .map(|f| (format!("{}/{}", base, id), f.subject.clone())),
        LinkTarget::Topic(id) => board.topic(id).map(|t| {
            let forum = board.forum(t.forum).map(|f| f.subject.as_str()).unwrap_or_default();
            (
                format!("{}/{}/{}#-1", base, t.forum, id),
                format!("{}: {}", forum, t.subject),
            )
        }),
        LinkTarget::Message(id) => board.message(id).and_then(|m| {
            let forum = board.forum(m.forum)?;
            let topic = board.topic(m.topic)?;
            Some((
                format!("{}/{}/{}/{}#{}", base, m.forum, m.topic, id, id),
                format!("{}: {}", forum.subject, topic.subject),
            ))
        }),
    };

    let link = match found {
        Some((href, title)) => WikiLink { href, title, label, missing: false },
        None => {
            let id = match target {
                LinkTarget::Forum(id) | LinkTarget::Topic(id) | LinkTarget::Message(id) => id,
            };
            WikiLink {
                href: format!("{}/{}", base, id),
                title: label.to_string(),
                label,
                missing: true,
            }
        }
    };
    Ok(link.render()?)
}

/// Parse and render a link written as `topic:5`; the link text is `label` or
/// the target itself.
pub fn resolve_link(board: &Board, base: &str, target: &str, label: Option<&str>) -> Result<String> {
    let parsed: LinkTarget = target.parse()?;
    render_link(board, base, parsed, label.unwrap_or(target))
}
