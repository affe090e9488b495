//! # Discussion Data Model
//!
//! Entities handed to the views. The board store owns and mutates them; the
//! render layer only reads.
//!
//! - [`ForumGroup`] - named collection of forums (id 0 is the "no group" pseudo entry)
//! - [`Forum`] - discussion container with moderators and an optional group
//! - [`Topic`] - thread root within a forum
//! - [`MessageRecord`] - stored reply, flat, pointing at its parent
//! - [`MessageNode`] - reply assembled into the reply tree for rendering
//!
//! Aggregated list rows ([`ForumSummary`], [`GroupSummary`], [`TopicSummary`]) carry
//! the counters and last-activity times computed by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod tree;

pub use tree::{build_tree, flat_messages};

/// Group id reserved for forums without a group.
pub const NO_GROUP: u64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumGroup {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ForumGroup {
    /// The pseudo entry listed first wherever groups are offered.
    pub fn ungrouped() -> Self {
        ForumGroup {
            id: NO_GROUP,
            name: "None".to_string(),
            description: "No Group".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub moderators: Vec<String>,
    #[serde(default)]
    pub group: u64,
    #[serde(default)]
    pub author: String,
    pub time: DateTime<Utc>,
}

impl Forum {
    pub fn is_moderated_by(&self, username: &str) -> bool {
        self.moderators.iter().any(|m| m == username)
    }

    /// Moderators as stored in the single-line text widget.
    pub fn moderators_line(&self) -> String {
        self.moderators.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub forum: u64,
    pub subject: String,
    pub author: String,
    #[serde(default)]
    pub body: String,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reply: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: u64,
    pub forum: u64,
    pub topic: u64,
    /// `None` for a direct reply to the topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    pub author: String,
    pub body: String,
    pub time: DateTime<Utc>,
}

/// One reply in the rendered thread, children in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    pub id: u64,
    pub parent: Option<u64>,
    pub author: String,
    pub body: String,
    pub time: DateTime<Utc>,
    pub is_new: bool,
    pub replies: Vec<MessageNode>,
}

impl MessageNode {
    pub fn from_record(record: &MessageRecord, visited: Option<DateTime<Utc>>) -> Self {
        MessageNode {
            id: record.id,
            parent: record.parent,
            author: record.author.clone(),
            body: record.body.clone(),
            time: record.time,
            is_new: is_new_since(record.time, visited),
            replies: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn count(&self) -> usize {
        1 + self.replies.iter().map(MessageNode::count).sum::<usize>()
    }

    /// Ids of the subtree in pre-order.
    pub fn ids(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.count());
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<u64>) {
        out.push(self.id);
        for reply in &self.replies {
            reply.collect_ids(out);
        }
    }
}

/// Total node count of a reply forest.
pub fn count_nodes(nodes: &[MessageNode]) -> usize {
    nodes.iter().map(MessageNode::count).sum()
}

/// Unread marker: anything posted after the last visit (or everything on a first visit).
pub fn is_new_since(time: DateTime<Utc>, visited: Option<DateTime<Utc>>) -> bool {
    match visited {
        Some(v) => time > v,
        None => true,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub group: ForumGroup,
    pub forums: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumSummary {
    pub forum: Forum,
    pub topics: usize,
    pub replies: usize,
    pub last_topic: Option<DateTime<Utc>>,
    pub last_reply: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub topic: Topic,
    pub replies: usize,
}
