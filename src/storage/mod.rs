//! # Board Storage
//!
//! The whole discussion board (groups, forums, topics, replies and id counters)
//! lives in one JSON file that is loaded into a [`Board`], queried and mutated in
//! memory, and written back atomically.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use discussion::storage::Board;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let path = std::path::Path::new("./data/board.json");
//!     let mut board = Board::load(path).await?;
//!     let forum = board.add_forum(
//!         discussion::storage::ForumFields {
//!             name: "General".into(),
//!             subject: "General discussion".into(),
//!             ..Default::default()
//!         },
//!         "admin",
//!         chrono::Utc::now(),
//!     );
//!     board.add_topic(forum, "Hello", "alice", "First post", chrono::Utc::now())?;
//!     board.save(path).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Cascades
//!
//! - deleting a group moves its forums to the "no group" pseudo group
//! - deleting a forum deletes its topics and their replies
//! - deleting a topic deletes its replies
//! - deleting a reply deletes every reply below it
//! - moving a topic moves its replies along
//! - posting a reply updates the topic's last-reply time
//!
//! ## File Safety
//!
//! Saves take an exclusive `fs2` lock on the board file, write a sibling temp file
//! and rename it over the original.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::acl::ANONYMOUS;
use crate::error::{DiscussionError, Result};
use crate::model::{
    build_tree, flat_messages, Forum, ForumGroup, ForumSummary, GroupSummary, MessageNode,
    MessageRecord, Topic, TopicSummary, NO_GROUP,
};
use crate::request::{DisplayMode, ForumSort, GroupSort, Sort, SortKey, TopicSort};

mod activity;

pub use activity::{
    shorten_line, EventKind, HitKind, Recipients, SearchHit, TimelineEvent,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct IdCounters {
    #[serde(default)]
    group: u64,
    #[serde(default)]
    forum: u64,
    #[serde(default)]
    topic: u64,
    #[serde(default)]
    message: u64,
}

fn take(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Editable forum fields shared by the add and edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForumFields {
    pub name: String,
    pub subject: String,
    pub description: String,
    pub moderators: Vec<String>,
    pub group: u64,
}

/// In-memory discussion board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    groups: Vec<ForumGroup>,
    #[serde(default)]
    forums: Vec<Forum>,
    #[serde(default)]
    topics: Vec<Topic>,
    #[serde(default)]
    messages: Vec<MessageRecord>,
    #[serde(default)]
    next_ids: IdCounters,
}

impl Board {
    /// Load the board from `path`; a missing file yields an empty board.
    pub async fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path).await {
            Ok(data) => {
                // Guard against any accidental leading NULs
                let cleaned = data.trim_start_matches('\0');
                let mut board: Board = serde_json::from_str(cleaned)?;
                board.repair_counters();
                debug!(
                    "loaded board from {}: {} forums, {} topics, {} replies",
                    path.display(),
                    board.forums.len(),
                    board.topics.len(),
                    board.messages.len()
                );
                Ok(board)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no board at {}, starting empty", path.display());
                Ok(Board::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the board to `path` atomically.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        write_file_locked(path, &content)?;
        debug!("saved board to {}", path.display());
        Ok(())
    }

    /// Counters never hand out an id already present in a hand-edited file.
    fn repair_counters(&mut self) {
        let max_group = self.groups.iter().map(|g| g.id).max().unwrap_or(0);
        let max_forum = self.forums.iter().map(|f| f.id).max().unwrap_or(0);
        let max_topic = self.topics.iter().map(|t| t.id).max().unwrap_or(0);
        let max_message = self.messages.iter().map(|m| m.id).max().unwrap_or(0);
        self.next_ids.group = self.next_ids.group.max(max_group);
        self.next_ids.forum = self.next_ids.forum.max(max_forum);
        self.next_ids.topic = self.next_ids.topic.max(max_topic);
        self.next_ids.message = self.next_ids.message.max(max_message);
    }

    // ---- lookups ----

    pub fn group(&self, id: u64) -> Option<&ForumGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn forum(&self, id: u64) -> Option<&Forum> {
        self.forums.iter().find(|f| f.id == id)
    }

    pub fn topic(&self, id: u64) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn message(&self, id: u64) -> Option<&MessageRecord> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn topic_by_subject(&self, subject: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.subject == subject)
    }

    pub fn forums(&self) -> &[Forum] {
        &self.forums
    }

    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (self.groups.len(), self.forums.len(), self.topics.len(), self.messages.len())
    }

    /// Group a forum is listed under; a dangling group id counts as ungrouped.
    fn effective_group(&self, forum: &Forum) -> u64 {
        if forum.group != NO_GROUP && self.group(forum.group).is_some() {
            forum.group
        } else {
            NO_GROUP
        }
    }

    // ---- listings ----

    /// All groups with their forum counts, the "no group" pseudo entry first.
    pub fn groups_with_counts(&self, sort: Sort<GroupSort>) -> Vec<GroupSummary> {
        let count = |id: u64| {
            self.forums
                .iter()
                .filter(|f| self.effective_group(f) == id)
                .count()
        };
        let mut real: Vec<GroupSummary> = self
            .groups
            .iter()
            .map(|g| GroupSummary {
                group: g.clone(),
                forums: count(g.id),
            })
            .collect();
        real.sort_by(|a, b| {
            let ord = match sort.key {
                GroupSort::Id => a.group.id.cmp(&b.group.id),
                GroupSort::Name => a.group.name.cmp(&b.group.name),
                GroupSort::Description => a.group.description.cmp(&b.group.description),
                GroupSort::Forums => a.forums.cmp(&b.forums),
            };
            directed(ord.then(a.group.id.cmp(&b.group.id)), sort.ascending)
        });

        let mut out = Vec::with_capacity(real.len() + 1);
        out.push(GroupSummary {
            group: ForumGroup::ungrouped(),
            forums: count(NO_GROUP),
        });
        out.extend(real);
        out
    }

    /// Every forum with its topic/reply counters and last activity times.
    pub fn forum_summaries(&self, sort: Sort<ForumSort>) -> Vec<ForumSummary> {
        let mut rows: Vec<ForumSummary> = self
            .forums
            .iter()
            .map(|f| {
                let mut forum = f.clone();
                forum.group = self.effective_group(f);
                ForumSummary {
                    topics: self.topics.iter().filter(|t| t.forum == f.id).count(),
                    replies: self.messages.iter().filter(|m| m.forum == f.id).count(),
                    last_topic: self.topics.iter().filter(|t| t.forum == f.id).map(|t| t.time).max(),
                    last_reply: self.messages.iter().filter(|m| m.forum == f.id).map(|m| m.time).max(),
                    forum,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            let ord = match sort.key {
                ForumSort::Id => a.forum.id.cmp(&b.forum.id),
                ForumSort::Name => a.forum.name.cmp(&b.forum.name),
                ForumSort::Subject => a.forum.subject.cmp(&b.forum.subject),
                ForumSort::Description => a.forum.description.cmp(&b.forum.description),
                ForumSort::Moderators => a.forum.moderators.cmp(&b.forum.moderators),
                ForumSort::Group => a.forum.group.cmp(&b.forum.group),
                ForumSort::LastTopic => a.last_topic.cmp(&b.last_topic),
                ForumSort::LastReply => a.last_reply.cmp(&b.last_reply),
                ForumSort::Topics => a.topics.cmp(&b.topics),
                ForumSort::Replies => a.replies.cmp(&b.replies),
            };
            directed(ord.then(a.forum.id.cmp(&b.forum.id)), sort.ascending)
        });
        rows
    }

    pub fn topic_count(&self, forum: u64) -> usize {
        self.topics.iter().filter(|t| t.forum == forum).count()
    }

    /// One page of a forum's topics with reply counts.
    pub fn topic_page(
        &self,
        forum: u64,
        sort: Sort<TopicSort>,
        start: usize,
        per_page: usize,
    ) -> Vec<TopicSummary> {
        let mut rows: Vec<TopicSummary> = self
            .topics
            .iter()
            .filter(|t| t.forum == forum)
            .map(|t| TopicSummary {
                topic: t.clone(),
                replies: self.messages.iter().filter(|m| m.topic == t.id).count(),
            })
            .collect();

        rows.sort_by(|a, b| {
            let ord = match sort.key {
                TopicSort::Id => a.topic.id.cmp(&b.topic.id),
                TopicSort::Subject => a.topic.subject.cmp(&b.topic.subject),
                TopicSort::Author => a.topic.author.cmp(&b.topic.author),
                TopicSort::Time => a.topic.time.cmp(&b.topic.time),
                TopicSort::LastReply => a.topic.last_reply.cmp(&b.topic.last_reply),
                TopicSort::Replies => a.replies.cmp(&b.replies),
            };
            directed(ord.then(a.topic.id.cmp(&b.topic.id)), sort.ascending)
        });

        debug!(
            "topic page for forum {}: order={} asc={} start={} per_page={}",
            forum,
            sort.key.key(),
            sort.ascending,
            start,
            per_page
        );
        rows.into_iter().skip(start).take(per_page).collect()
    }

    /// Replies of a topic laid out for `display`.
    pub fn messages(
        &self,
        topic: u64,
        display: DisplayMode,
        visited: Option<DateTime<Utc>>,
    ) -> Vec<MessageNode> {
        let rows: Vec<MessageRecord> = self
            .messages
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect();
        match display {
            DisplayMode::Tree => build_tree(&rows, visited),
            DisplayMode::FlatAsc => flat_messages(&rows, true, visited),
            DisplayMode::FlatDesc => flat_messages(&rows, false, visited),
        }
    }

    /// Every named user seen on the board: authors and moderators.
    pub fn known_users(&self) -> Vec<String> {
        let mut users: BTreeSet<&str> = BTreeSet::new();
        users.extend(self.forums.iter().map(|f| f.author.as_str()));
        users.extend(self.forums.iter().flat_map(|f| f.moderators.iter().map(String::as_str)));
        users.extend(self.topics.iter().map(|t| t.author.as_str()));
        users.extend(self.messages.iter().map(|m| m.author.as_str()));
        users
            .into_iter()
            .filter(|u| !u.is_empty() && *u != ANONYMOUS)
            .map(str::to_string)
            .collect()
    }

    // ---- groups ----

    pub fn add_group(&mut self, name: &str, description: &str) -> u64 {
        let id = take(&mut self.next_ids.group);
        self.groups.push(ForumGroup {
            id,
            name: name.to_string(),
            description: description.to_string(),
        });
        info!("added forum group {} '{}'", id, crate::logutil::escape_log(name));
        id
    }

    pub fn edit_group(&mut self, id: u64, name: &str, description: &str) -> Result<()> {
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| DiscussionError::not_found("group", id))?;
        group.name = name.to_string();
        group.description = description.to_string();
        info!("edited forum group {}", id);
        Ok(())
    }

    /// Delete a group; its forums become ungrouped.
    pub fn delete_group(&mut self, id: u64) -> Result<()> {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != id);
        if self.groups.len() == before {
            return Err(DiscussionError::not_found("group", id));
        }
        let mut moved = 0;
        for forum in self.forums.iter_mut().filter(|f| f.group == id) {
            forum.group = NO_GROUP;
            moved += 1;
        }
        info!("deleted forum group {} ({} forum(s) ungrouped)", id, moved);
        Ok(())
    }

    // ---- forums ----

    pub fn add_forum(&mut self, fields: ForumFields, author: &str, time: DateTime<Utc>) -> u64 {
        let id = take(&mut self.next_ids.forum);
        info!("added forum {} '{}'", id, crate::logutil::escape_log(&fields.name));
        self.forums.push(Forum {
            id,
            name: fields.name,
            subject: fields.subject,
            description: fields.description,
            moderators: fields.moderators,
            group: fields.group,
            author: author.to_string(),
            time,
        });
        id
    }

    pub fn edit_forum(&mut self, id: u64, fields: ForumFields) -> Result<()> {
        let forum = self
            .forums
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| DiscussionError::not_found("forum", id))?;
        forum.name = fields.name;
        forum.subject = fields.subject;
        forum.description = fields.description;
        forum.moderators = fields.moderators;
        forum.group = fields.group;
        info!("edited forum {}", id);
        Ok(())
    }

    /// Delete a forum with all its topics and replies.
    pub fn delete_forum(&mut self, id: u64) -> Result<()> {
        let before = self.forums.len();
        self.forums.retain(|f| f.id != id);
        if self.forums.len() == before {
            return Err(DiscussionError::not_found("forum", id));
        }
        let topics_before = self.topics.len();
        let messages_before = self.messages.len();
        self.topics.retain(|t| t.forum != id);
        self.messages.retain(|m| m.forum != id);
        info!(
            "deleted forum {} with {} topic(s) and {} repl(ies)",
            id,
            topics_before - self.topics.len(),
            messages_before - self.messages.len()
        );
        Ok(())
    }

    // ---- topics ----

    pub fn add_topic(
        &mut self,
        forum: u64,
        subject: &str,
        author: &str,
        body: &str,
        time: DateTime<Utc>,
    ) -> Result<u64> {
        if self.forum(forum).is_none() {
            return Err(DiscussionError::not_found("forum", forum));
        }
        let id = take(&mut self.next_ids.topic);
        self.topics.push(Topic {
            id,
            forum,
            subject: subject.to_string(),
            author: author.to_string(),
            body: body.to_string(),
            time,
            last_reply: None,
        });
        info!(
            "added topic {} '{}' to forum {} by {}",
            id,
            crate::logutil::escape_log(subject),
            forum,
            crate::logutil::escape_log(author)
        );
        Ok(id)
    }

    pub fn edit_topic(&mut self, id: u64, subject: &str, body: &str) -> Result<()> {
        let topic = self
            .topics
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DiscussionError::not_found("topic", id))?;
        topic.subject = subject.to_string();
        topic.body = body.to_string();
        info!("edited topic {}", id);
        Ok(())
    }

    /// Delete a topic with all its replies.
    pub fn delete_topic(&mut self, id: u64) -> Result<()> {
        let before = self.topics.len();
        self.topics.retain(|t| t.id != id);
        if self.topics.len() == before {
            return Err(DiscussionError::not_found("topic", id));
        }
        let messages_before = self.messages.len();
        self.messages.retain(|m| m.topic != id);
        info!(
            "deleted topic {} with {} repl(ies)",
            id,
            messages_before - self.messages.len()
        );
        Ok(())
    }

    /// Move a topic and its replies to another forum.
    pub fn move_topic(&mut self, id: u64, new_forum: u64) -> Result<()> {
        if self.forum(new_forum).is_none() {
            return Err(DiscussionError::not_found("forum", new_forum));
        }
        let topic = self
            .topics
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DiscussionError::not_found("topic", id))?;
        let old_forum = topic.forum;
        topic.forum = new_forum;
        for message in self.messages.iter_mut().filter(|m| m.topic == id) {
            message.forum = new_forum;
        }
        info!("moved topic {} from forum {} to {}", id, old_forum, new_forum);
        Ok(())
    }

    // ---- replies ----

    /// Post a reply to a topic, or to one of its replies when `parent` is set.
    pub fn add_message(
        &mut self,
        topic: u64,
        parent: Option<u64>,
        author: &str,
        body: &str,
        time: DateTime<Utc>,
    ) -> Result<u64> {
        let forum = self
            .topic(topic)
            .map(|t| t.forum)
            .ok_or_else(|| DiscussionError::not_found("topic", topic))?;
        if let Some(parent) = parent {
            match self.message(parent) {
                Some(p) if p.topic == topic => {}
                Some(_) => {
                    return Err(DiscussionError::InvalidRequest(format!(
                        "message {} is not part of topic {}",
                        parent, topic
                    )))
                }
                None => return Err(DiscussionError::not_found("message", parent)),
            }
        }
        let id = take(&mut self.next_ids.message);
        self.messages.push(MessageRecord {
            id,
            forum,
            topic,
            parent,
            author: author.to_string(),
            body: body.to_string(),
            time,
        });
        if let Some(t) = self.topics.iter_mut().find(|t| t.id == topic) {
            t.last_reply = Some(time);
        }
        info!(
            "added reply {} to topic {} by {}",
            id,
            topic,
            crate::logutil::escape_log(author)
        );
        Ok(id)
    }

    pub fn edit_message(&mut self, id: u64, body: &str) -> Result<()> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DiscussionError::not_found("message", id))?;
        message.body = body.to_string();
        info!("edited reply {}", id);
        Ok(())
    }

    /// Delete a reply and every reply below it. Returns the number removed.
    pub fn delete_message(&mut self, id: u64) -> Result<usize> {
        if self.message(id).is_none() {
            return Err(DiscussionError::not_found("message", id));
        }
        let mut children: HashMap<u64, Vec<u64>> = HashMap::new();
        for m in &self.messages {
            if let Some(parent) = m.parent {
                children.entry(parent).or_default().push(m.id);
            }
        }

        let mut doomed: HashSet<u64> = HashSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !doomed.insert(next) {
                warn!("reply {} reached twice while deleting {}", next, id);
                continue;
            }
            if let Some(kids) = children.get(&next) {
                stack.extend(kids.iter().copied());
            }
        }

        self.messages.retain(|m| !doomed.contains(&m.id));
        info!("deleted reply {} and {} descendant(s)", id, doomed.len() - 1);
        Ok(doomed.len())
    }

    /// Small board written by `discussion init`.
    pub fn sample(now: DateTime<Utc>) -> Self {
        let mut board = Board::default();
        let minutes = chrono::Duration::minutes;

        let dev = board.add_group("Development", "Talk about building the project");
        board.add_forum(
            ForumFields {
                name: "General".into(),
                subject: "General discussion".into(),
                description: "Anything that does not fit elsewhere".into(),
                ..ForumFields::default()
            },
            "admin",
            now - minutes(600),
        );
        let support = board.add_forum(
            ForumFields {
                name: "Support".into(),
                subject: "Questions and answers".into(),
                description: "Ask for help with installation and usage".into(),
                moderators: vec!["carol".into()],
                group: dev,
            },
            "admin",
            now - minutes(590),
        );

        // The sample forum exists; these cannot fail.
        if let Ok(topic) = board.add_topic(
            support,
            "Installing on a fresh machine",
            "alice",
            "Which steps are needed after unpacking the release?",
            now - minutes(300),
        ) {
            if let Ok(first) = board.add_message(
                topic,
                None,
                "bob",
                "Run the init command first, it writes a default config.",
                now - minutes(240),
            ) {
                let _ = board.add_message(
                    topic,
                    Some(first),
                    "alice",
                    "> Run the init command first, it writes a default config.\nThanks, that worked.",
                    now - minutes(200),
                );
            }
        }
        board
    }
}

fn directed(ord: Ordering, ascending: bool) -> Ordering {
    if ascending {
        ord
    } else {
        ord.reverse()
    }
}

/// Write `content` to `path` under an exclusive lock via temp file and rename.
fn write_file_locked(path: &Path, content: &str) -> Result<()> {
    use std::fs::{self, File, OpenOptions};
    use std::io::Write;

    // fs2 locks are synchronous; the critical section is a single small write
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("board.json");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                tmp.write_all(content.as_bytes())?;
                tmp.flush()?;
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(e.into()),
        }
    };

    fs::rename(&tmp_path, path)?;
    // Persist the rename (best-effort)
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    drop(lock_file);
    Ok(())
}
