//! Request routing and mode resolution.
//!
//! A request is processed as an ordered list of [`Mode`]s. Leading modes prepare
//! form state (`topic-quote`, `message-edit`, ...) or mutate the board
//! (`message-post-add`, `forums-delete`, ...); the last mode names the page that is
//! rendered. Which list a request gets depends on the component serving it (public
//! pages, admin pages, or a thread embedded in a wiki page), the deepest entity the
//! request targets, the `discussion_action` and the preview flag.

use std::fmt;
use std::str::FromStr;

use crate::acl::Capability;
use crate::error::{DiscussionError, Result};
use crate::model::NO_GROUP;
use crate::request::{RequestArgs, UiAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Component {
    #[default]
    Core,
    Admin,
    Wiki,
}

impl FromStr for Component {
    type Err = DiscussionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "core" => Ok(Component::Core),
            "admin" => Ok(Component::Admin),
            "wiki" => Ok(Component::Wiki),
            other => Err(DiscussionError::InvalidRequest(format!(
                "unknown component '{}'",
                other
            ))),
        }
    }
}

/// Ids taken from the request path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Route {
    pub component: Component,
    pub group: Option<u64>,
    pub forum: Option<u64>,
    pub topic: Option<u64>,
    pub message: Option<u64>,
    /// Wiki page whose name doubles as the subject of the embedded topic.
    pub wiki_page: Option<String>,
}

impl Route {
    /// Path ids override query ids; the admin forum page defaults to the "no group"
    /// target when the form did not send one.
    pub fn apply_to(&self, args: &mut RequestArgs) {
        if self.forum.is_some() {
            args.forum = self.forum;
        }
        if self.topic.is_some() {
            args.topic = self.topic;
        }
        if self.message.is_some() {
            args.message = self.message;
        }
        if self.group.is_some() && (args.group.is_none() || self.group != Some(NO_GROUP)) {
            args.group = self.group;
        }
    }
}

/// Map a request path onto a [`Route`].
///
/// Public pages live under `/discussion[/<forum>[/<topic>[/<message>]]]`, admin pages
/// under `/admin/discussion/group[/<id>]` and `/admin/discussion/forum[/<id>]`. A
/// `/wiki/<page>` path embeds the topic whose subject equals the page name.
pub fn route(path: &str) -> Result<Route> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let bad = || DiscussionError::InvalidRequest(format!("no discussion page at '{}'", path));

    match segments.as_slice() {
        ["discussion", rest @ ..] if rest.len() <= 3 => {
            let ids = rest
                .iter()
                .map(|s| s.parse::<u64>().map_err(|_| bad()))
                .collect::<Result<Vec<u64>>>()?;
            Ok(Route {
                component: Component::Core,
                forum: ids.first().copied(),
                topic: ids.get(1).copied(),
                message: ids.get(2).copied(),
                ..Route::default()
            })
        }
        ["admin", "discussion"] | ["admin", "discussion", "group"] => Ok(Route {
            component: Component::Admin,
            ..Route::default()
        }),
        ["admin", "discussion", "group", id] => Ok(Route {
            component: Component::Admin,
            group: Some(id.parse().map_err(|_| bad())?),
            ..Route::default()
        }),
        ["admin", "discussion", "forum"] => Ok(Route {
            component: Component::Admin,
            group: Some(NO_GROUP),
            ..Route::default()
        }),
        ["admin", "discussion", "forum", id] => Ok(Route {
            component: Component::Admin,
            group: Some(NO_GROUP),
            forum: Some(id.parse().map_err(|_| bad())?),
            ..Route::default()
        }),
        ["wiki", page @ ..] => Ok(Route {
            component: Component::Wiki,
            wiki_page: Some(if page.is_empty() { "WikiStart".to_string() } else { page.join("/") }),
            ..Route::default()
        }),
        _ => Err(bad()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    AdminGroupList,
    GroupPostAdd,
    GroupPostEdit,
    GroupsDelete,
    ForumList,
    AdminForumList,
    ForumAdd,
    ForumPostAdd,
    ForumPostEdit,
    ForumDelete,
    ForumsDelete,
    TopicList,
    TopicAdd,
    TopicQuote,
    TopicPostAdd,
    TopicEdit,
    TopicPostEdit,
    TopicMove,
    TopicPostMove,
    TopicDelete,
    MessageList,
    WikiMessageList,
    MessageQuote,
    MessagePostAdd,
    MessageEdit,
    MessagePostEdit,
    MessageDelete,
    MessageSetDisplay,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::AdminGroupList => "admin-group-list",
            Mode::GroupPostAdd => "group-post-add",
            Mode::GroupPostEdit => "group-post-edit",
            Mode::GroupsDelete => "groups-delete",
            Mode::ForumList => "forum-list",
            Mode::AdminForumList => "admin-forum-list",
            Mode::ForumAdd => "forum-add",
            Mode::ForumPostAdd => "forum-post-add",
            Mode::ForumPostEdit => "forum-post-edit",
            Mode::ForumDelete => "forum-delete",
            Mode::ForumsDelete => "forums-delete",
            Mode::TopicList => "topic-list",
            Mode::TopicAdd => "topic-add",
            Mode::TopicQuote => "topic-quote",
            Mode::TopicPostAdd => "topic-post-add",
            Mode::TopicEdit => "topic-edit",
            Mode::TopicPostEdit => "topic-post-edit",
            Mode::TopicMove => "topic-move",
            Mode::TopicPostMove => "topic-post-move",
            Mode::TopicDelete => "topic-delete",
            Mode::MessageList => "message-list",
            Mode::WikiMessageList => "wiki-message-list",
            Mode::MessageQuote => "message-quote",
            Mode::MessagePostAdd => "message-post-add",
            Mode::MessageEdit => "message-edit",
            Mode::MessagePostEdit => "message-post-edit",
            Mode::MessageDelete => "message-delete",
            Mode::MessageSetDisplay => "message-set-display",
        }
    }

    pub fn required_capability(self) -> Capability {
        match self {
            Mode::ForumList
            | Mode::TopicList
            | Mode::MessageList
            | Mode::WikiMessageList
            | Mode::MessageSetDisplay => Capability::View,
            Mode::TopicAdd
            | Mode::TopicQuote
            | Mode::TopicPostAdd
            | Mode::TopicEdit
            | Mode::TopicPostEdit
            | Mode::MessageQuote
            | Mode::MessagePostAdd
            | Mode::MessageEdit
            | Mode::MessagePostEdit => Capability::Append,
            Mode::TopicMove | Mode::TopicPostMove | Mode::TopicDelete | Mode::MessageDelete => {
                Capability::Moderate
            }
            Mode::AdminGroupList
            | Mode::GroupPostAdd
            | Mode::GroupPostEdit
            | Mode::GroupsDelete
            | Mode::AdminForumList
            | Mode::ForumAdd
            | Mode::ForumPostAdd
            | Mode::ForumPostEdit
            | Mode::ForumDelete
            | Mode::ForumsDelete => Capability::Admin,
        }
    }

    /// Edits are limited to the post's author and moderators.
    pub fn requires_authorship(self) -> bool {
        matches!(
            self,
            Mode::TopicEdit | Mode::TopicPostEdit | Mode::MessageEdit | Mode::MessagePostEdit
        )
    }

    /// Modes that change the board.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Mode::GroupPostAdd
                | Mode::GroupPostEdit
                | Mode::GroupsDelete
                | Mode::ForumPostAdd
                | Mode::ForumPostEdit
                | Mode::ForumDelete
                | Mode::ForumsDelete
                | Mode::TopicPostAdd
                | Mode::TopicPostEdit
                | Mode::TopicPostMove
                | Mode::TopicDelete
                | Mode::MessagePostAdd
                | Mode::MessagePostEdit
                | Mode::MessageDelete
        )
    }

    /// Modes that produce a page.
    pub fn is_page(self) -> bool {
        matches!(
            self,
            Mode::AdminGroupList
                | Mode::ForumList
                | Mode::AdminForumList
                | Mode::ForumAdd
                | Mode::TopicList
                | Mode::TopicAdd
                | Mode::TopicMove
                | Mode::MessageList
                | Mode::WikiMessageList
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which entities a request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Targets {
    /// `Some(0)` is the "no group" pseudo target of the admin forum page.
    pub group: Option<u64>,
    pub forum: bool,
    pub topic: bool,
    pub message: bool,
}

/// Resolve the ordered mode list for a request.
pub fn resolve_modes(
    component: Component,
    targets: &Targets,
    action: Option<UiAction>,
    preview: bool,
) -> Vec<Mode> {
    use Mode::*;
    use UiAction as A;

    if component != Component::Admin && (targets.message || targets.topic) {
        let list = if component == Component::Wiki { WikiMessageList } else { MessageList };
        let (quote, edit, post_edit) = if targets.message {
            (MessageQuote, MessageEdit, MessagePostEdit)
        } else {
            (TopicQuote, TopicEdit, TopicPostEdit)
        };
        let core_topic = component == Component::Core && !targets.message;
        return match action {
            Some(A::Add) => vec![list],
            Some(A::Quote) => vec![quote, list],
            Some(A::PostAdd) if preview => vec![list],
            Some(A::PostAdd) => vec![MessagePostAdd, list],
            Some(A::Edit) => vec![edit, list],
            Some(A::PostEdit) if preview => vec![list],
            Some(A::PostEdit) => vec![post_edit, list],
            Some(A::Delete) if targets.message => vec![MessageDelete, list],
            Some(A::Delete) if core_topic => vec![TopicDelete, TopicList],
            Some(A::Move) if core_topic => vec![TopicMove],
            Some(A::PostMove) if core_topic => vec![TopicPostMove, TopicList],
            Some(A::SetDisplay) => vec![MessageSetDisplay, list],
            _ => vec![list],
        };
    }

    if component == Component::Wiki {
        return vec![WikiMessageList];
    }

    if targets.forum {
        return match (component, action) {
            (Component::Admin, Some(A::PostEdit)) => vec![ForumPostEdit, AdminForumList],
            (Component::Admin, _) => vec![AdminForumList],
            (_, Some(A::Add)) => vec![TopicAdd],
            (_, Some(A::PostAdd)) if preview => vec![TopicAdd],
            (_, Some(A::PostAdd)) => vec![TopicPostAdd, TopicList],
            (_, Some(A::Delete)) => vec![ForumDelete, ForumList],
            _ => vec![TopicList],
        };
    }

    if let Some(group) = targets.group {
        return match (component, action) {
            (Component::Admin, Some(A::PostAdd)) => vec![ForumPostAdd, AdminForumList],
            (Component::Admin, Some(A::PostEdit)) => vec![GroupPostEdit, AdminGroupList],
            (Component::Admin, Some(A::Delete)) => vec![ForumsDelete, AdminForumList],
            (Component::Admin, _) if group != NO_GROUP => vec![AdminGroupList],
            (Component::Admin, _) => vec![AdminForumList],
            (_, Some(A::PostAdd)) => vec![ForumPostAdd, ForumList],
            _ => vec![ForumList],
        };
    }

    match (component, action) {
        (Component::Admin, Some(A::PostAdd)) => vec![GroupPostAdd, AdminGroupList],
        (Component::Admin, Some(A::Delete)) => vec![GroupsDelete, AdminGroupList],
        (Component::Admin, _) => vec![AdminGroupList],
        (_, Some(A::Add)) => vec![ForumAdd],
        (_, Some(A::PostAdd)) => vec![ForumPostAdd, ForumList],
        _ => vec![ForumList],
    }
}
