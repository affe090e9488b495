//! Request and UI-action state.
//!
//! Everything the views need to know about the current request: the
//! `discussion_action` discriminator, target ids, submitted form fields, the
//! `submit`/`preview` flags, listing sort and pagination parameters, and the thread
//! display mode. [`RequestArgs::from_query`] parses an urlencoded query string or
//! form body (`&` and `;` separated, repeated keys allowed).

use std::fmt;
use std::str::FromStr;

use crate::error::{DiscussionError, Result};

/// Value of the `discussion_action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiAction {
    Add,
    Edit,
    Quote,
    PostAdd,
    PostEdit,
    Move,
    PostMove,
    Delete,
    SetDisplay,
}

impl UiAction {
    pub fn as_str(self) -> &'static str {
        match self {
            UiAction::Add => "add",
            UiAction::Edit => "edit",
            UiAction::Quote => "quote",
            UiAction::PostAdd => "post-add",
            UiAction::PostEdit => "post-edit",
            UiAction::Move => "move",
            UiAction::PostMove => "post-move",
            UiAction::Delete => "delete",
            UiAction::SetDisplay => "set-display",
        }
    }

    /// Actions that open (or re-open) the reply form.
    pub fn is_reply(self) -> bool {
        matches!(self, UiAction::Add | UiAction::Quote | UiAction::PostAdd)
    }

    /// Actions that open (or re-open) the edit form.
    pub fn is_edit(self) -> bool {
        matches!(self, UiAction::Edit | UiAction::PostEdit)
    }
}

impl fmt::Display for UiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UiAction {
    type Err = DiscussionError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "add" => UiAction::Add,
            "edit" => UiAction::Edit,
            "quote" => UiAction::Quote,
            "post-add" => UiAction::PostAdd,
            "post-edit" => UiAction::PostEdit,
            "move" => UiAction::Move,
            "post-move" => UiAction::PostMove,
            "delete" => UiAction::Delete,
            "set-display" => UiAction::SetDisplay,
            other => {
                return Err(DiscussionError::InvalidRequest(format!(
                    "unknown discussion_action '{}'",
                    other
                )))
            }
        })
    }
}

/// How the replies of a topic are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Tree,
    FlatAsc,
    FlatDesc,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 3] = [DisplayMode::Tree, DisplayMode::FlatDesc, DisplayMode::FlatAsc];

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Tree => "tree",
            DisplayMode::FlatAsc => "flat-asc",
            DisplayMode::FlatDesc => "flat-desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Tree => "Tree View",
            DisplayMode::FlatDesc => "Flat View (newer first)",
            DisplayMode::FlatAsc => "Flat View (older first)",
        }
    }
}

impl FromStr for DisplayMode {
    type Err = DiscussionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tree" => Ok(DisplayMode::Tree),
            "flat-asc" => Ok(DisplayMode::FlatAsc),
            "flat-desc" => Ok(DisplayMode::FlatDesc),
            other => Err(DiscussionError::InvalidRequest(format!(
                "unknown display mode '{}'",
                other
            ))),
        }
    }
}

/// A column a listing can be ordered by. Each listing has its own fixed set.
pub trait SortKey: Copy + Eq + fmt::Debug + 'static {
    const DEFAULT: Self;
    const DEFAULT_ASCENDING: bool;

    fn all() -> &'static [Self];

    /// Value of the `order` query parameter.
    fn key(self) -> &'static str;

    fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForumSort {
    Id,
    Name,
    Subject,
    Description,
    Moderators,
    Group,
    LastTopic,
    LastReply,
    Topics,
    Replies,
}

impl SortKey for ForumSort {
    const DEFAULT: Self = ForumSort::Id;
    const DEFAULT_ASCENDING: bool = true;

    fn all() -> &'static [Self] {
        &[
            ForumSort::Id,
            ForumSort::Name,
            ForumSort::Subject,
            ForumSort::Description,
            ForumSort::Moderators,
            ForumSort::Group,
            ForumSort::LastTopic,
            ForumSort::LastReply,
            ForumSort::Topics,
            ForumSort::Replies,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            ForumSort::Id => "id",
            ForumSort::Name => "name",
            ForumSort::Subject => "subject",
            ForumSort::Description => "description",
            ForumSort::Moderators => "moderators",
            ForumSort::Group => "forum_group",
            ForumSort::LastTopic => "lasttopic",
            ForumSort::LastReply => "lastreply",
            ForumSort::Topics => "topics",
            ForumSort::Replies => "replies",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSort {
    Id,
    Subject,
    Author,
    Time,
    LastReply,
    Replies,
}

impl SortKey for TopicSort {
    const DEFAULT: Self = TopicSort::LastReply;
    const DEFAULT_ASCENDING: bool = false;

    fn all() -> &'static [Self] {
        &[
            TopicSort::Id,
            TopicSort::Subject,
            TopicSort::Author,
            TopicSort::Time,
            TopicSort::LastReply,
            TopicSort::Replies,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            TopicSort::Id => "id",
            TopicSort::Subject => "subject",
            TopicSort::Author => "author",
            TopicSort::Time => "time",
            TopicSort::LastReply => "lastreply",
            TopicSort::Replies => "replies",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSort {
    Id,
    Name,
    Description,
    Forums,
}

impl SortKey for GroupSort {
    const DEFAULT: Self = GroupSort::Id;
    const DEFAULT_ASCENDING: bool = true;

    fn all() -> &'static [Self] {
        &[GroupSort::Id, GroupSort::Name, GroupSort::Description, GroupSort::Forums]
    }

    fn key(self) -> &'static str {
        match self {
            GroupSort::Id => "id",
            GroupSort::Name => "name",
            GroupSort::Description => "description",
            GroupSort::Forums => "forums",
        }
    }
}

/// Current ordering of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    pub key: K,
    pub ascending: bool,
}

impl<K: SortKey> Sort<K> {
    pub fn new(key: K, ascending: bool) -> Self {
        Sort { key, ascending }
    }

    /// Unknown keys fall back to the listing default; a missing direction to the
    /// listing's default direction.
    pub fn from_args(args: &RequestArgs) -> Self {
        let key = args
            .order
            .as_deref()
            .and_then(K::from_key)
            .unwrap_or(K::DEFAULT);
        Sort {
            key,
            ascending: args.asc.unwrap_or(K::DEFAULT_ASCENDING),
        }
    }

    pub fn is_active(&self, column: K) -> bool {
        self.key == column
    }

    /// Direction a header link for `column` asks for: the opposite of the current one
    /// on the active column, ascending anywhere else.
    pub fn next_ascending(&self, column: K) -> bool {
        if self.is_active(column) {
            !self.ascending
        } else {
            true
        }
    }
}

impl<K: SortKey> Default for Sort<K> {
    fn default() -> Self {
        Sort {
            key: K::DEFAULT,
            ascending: K::DEFAULT_ASCENDING,
        }
    }
}

/// Offset pagination over a listing of `total` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub start: usize,
    pub per_page: usize,
    pub total: usize,
}

impl Pager {
    pub fn new(start: usize, per_page: usize, total: usize) -> Self {
        Pager {
            start,
            per_page: per_page.max(1),
            total,
        }
    }

    /// Offset of the last page that has rows (0 for an empty listing).
    pub fn last_start(&self) -> usize {
        self.total.saturating_sub(1) / self.per_page * self.per_page
    }

    /// Previous page; from past the end this is the last page with rows.
    pub fn prev_start(&self) -> Option<usize> {
        if self.start > 0 {
            Some(self.start.saturating_sub(self.per_page).min(self.last_start()))
        } else {
            None
        }
    }

    pub fn next_start(&self) -> Option<usize> {
        if self.start + self.per_page < self.total {
            Some(self.start + self.per_page)
        } else {
            None
        }
    }
}

/// What a reply or edit form is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Topic,
    Message(u64),
}

/// Parsed request fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestArgs {
    pub action: Option<UiAction>,
    pub group: Option<u64>,
    pub forum: Option<u64>,
    pub topic: Option<u64>,
    pub message: Option<u64>,
    pub submit: bool,
    pub preview: bool,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub moderators: Vec<String>,
    pub new_forum: Option<u64>,
    pub selection: Vec<u64>,
    pub order: Option<String>,
    pub asc: Option<bool>,
    pub start: usize,
    pub display: Option<DisplayMode>,
}

impl RequestArgs {
    /// Parse an urlencoded query string or form body.
    pub fn from_query(query: &str) -> Result<Self> {
        let mut args = RequestArgs::default();
        for pair in query.trim_start_matches('?').split(['&', ';']) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (decode(k)?, decode(v)?),
                None => (decode(pair)?, String::new()),
            };
            args.set(&key, value)?;
        }
        Ok(args)
    }

    /// Apply one form field. Repeated `moderators` and `selection` values accumulate.
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        match key {
            "discussion_action" => {
                self.action = if value.is_empty() { None } else { Some(value.parse()?) }
            }
            "group" => self.group = Some(parse_id(key, &value)?.unwrap_or(0)),
            "forum" => self.forum = parse_id(key, &value)?,
            "topic" => self.topic = parse_id(key, &value)?,
            "message" => self.message = parse_id(key, &value)?,
            "new_forum" => self.new_forum = parse_id(key, &value)?,
            "submit" => self.submit = true,
            "preview" => self.preview = true,
            "author" => self.author = Some(value),
            "subject" => self.subject = Some(value),
            "body" => self.body = Some(value),
            "name" => self.name = Some(value),
            "description" => self.description = Some(value),
            "moderators" => self
                .moderators
                .extend(value.split_whitespace().map(str::to_string)),
            "selection" => {
                if let Some(id) = parse_id(key, &value)? {
                    self.selection.push(id);
                }
            }
            "order" => self.order = if value.is_empty() { None } else { Some(value) },
            "asc" => {
                self.asc = match value.as_str() {
                    "" => None,
                    "0" | "false" => Some(false),
                    _ => Some(true),
                }
            }
            "start" => {
                let start: i64 = value.parse().map_err(|_| {
                    DiscussionError::InvalidRequest(format!("start '{}' is not a number", value))
                })?;
                self.start = start.max(0) as usize;
            }
            "display" => self.display = Some(value.parse()?),
            _ => {}
        }
        Ok(())
    }

    /// The post a form targets: the message named by `message`, else the topic.
    pub fn target(&self) -> Target {
        self.message.map(Target::Message).unwrap_or(Target::Topic)
    }

    /// Post whose edit form is open (edit action, nothing submitted yet).
    pub fn edit_target(&self) -> Option<Target> {
        match self.action {
            Some(a) if a.is_edit() && !self.submit => Some(self.target()),
            _ => None,
        }
    }

    /// Post whose reply form is open (add/quote action, nothing submitted yet).
    pub fn reply_target(&self) -> Option<Target> {
        match self.action {
            Some(a) if a.is_reply() && !self.submit => Some(self.target()),
            _ => None,
        }
    }

    pub fn is_editing(&self, target: Target) -> bool {
        self.edit_target() == Some(target)
    }

    pub fn is_replying_to(&self, target: Target) -> bool {
        self.reply_target() == Some(target)
    }
}

/// Prefix every line of `body` with `> ` for a quoted reply.
pub fn quote_body(body: &str) -> String {
    body.lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| DiscussionError::InvalidRequest(format!("bad encoding in '{}': {}", raw, e)))
}

fn parse_id(field: &str, value: &str) -> Result<Option<u64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| {
        DiscussionError::InvalidRequest(format!("{} '{}' is not a valid id", field, value))
    })
}
