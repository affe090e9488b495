//! Capabilities and control-visibility predicates.
//!
//! The host grants each viewer a set of named capabilities. `moderator` status is
//! separate: a viewer listed among a forum's moderators (or holding `admin`) may edit
//! any message of that forum. The render layer evaluates these once per request into
//! a [`Controls`] value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiscussionError;
use crate::model::Forum;

/// Name of the unauthenticated user.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    View,
    Append,
    Moderate,
    Admin,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::View,
        Capability::Append,
        Capability::Moderate,
        Capability::Admin,
    ];

    /// Permission action name as registered with the host.
    pub fn action_name(self) -> &'static str {
        match self {
            Capability::View => "DISCUSSION_VIEW",
            Capability::Append => "DISCUSSION_APPEND",
            Capability::Moderate => "DISCUSSION_MODERATE",
            Capability::Admin => "DISCUSSION_ADMIN",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_name())
    }
}

impl FromStr for Capability {
    type Err = DiscussionError;

    /// Accepts short names (`append`) and action names (`DISCUSSION_APPEND`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let short = lower.strip_prefix("discussion_").unwrap_or(&lower);
        match short {
            "view" => Ok(Capability::View),
            "append" => Ok(Capability::Append),
            "moderate" => Ok(Capability::Moderate),
            "admin" => Ok(Capability::Admin),
            _ => Err(DiscussionError::InvalidRequest(format!(
                "unknown capability '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub append: bool,
    #[serde(default)]
    pub moderate: bool,
    #[serde(default)]
    pub admin: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Capabilities {
            view: true,
            append: true,
            moderate: true,
            admin: true,
        }
    }

    pub fn with(mut self, cap: Capability) -> Self {
        self.grant(cap);
        self
    }

    pub fn grant(&mut self, cap: Capability) {
        match cap {
            Capability::View => self.view = true,
            Capability::Append => self.append = true,
            Capability::Moderate => self.moderate = true,
            Capability::Admin => self.admin = true,
        }
    }

    pub fn has(&self, cap: Capability) -> bool {
        match cap {
            Capability::View => self.view,
            Capability::Append => self.append,
            Capability::Moderate => self.moderate,
            Capability::Admin => self.admin,
        }
    }

    /// Parse a comma or space separated list such as `view,append`.
    pub fn parse_list(list: &str) -> Result<Self, DiscussionError> {
        let mut caps = Capabilities::default();
        for item in list.split(|c: char| c == ',' || c.is_whitespace()) {
            if item.is_empty() {
                continue;
            }
            caps.grant(item.parse()?);
        }
        Ok(caps)
    }
}

/// The user a page is rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub authname: String,
    pub capabilities: Capabilities,
    pub is_moderator: bool,
}

impl Viewer {
    pub fn new(authname: &str, capabilities: Capabilities) -> Self {
        Viewer {
            authname: authname.to_string(),
            capabilities,
            is_moderator: capabilities.admin,
        }
    }

    /// Viewer of a page inside `forum`: forum moderators and admins are moderators.
    pub fn for_forum(authname: &str, capabilities: Capabilities, forum: Option<&Forum>) -> Self {
        let listed = forum.map(|f| f.is_moderated_by(authname)).unwrap_or(false);
        Viewer {
            authname: authname.to_string(),
            capabilities,
            is_moderator: listed || capabilities.admin,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.authname == ANONYMOUS
    }

    pub fn controls(&self) -> Controls {
        Controls {
            authname: self.authname.clone(),
            anonymous: self.is_anonymous(),
            append: self.capabilities.append,
            moderate: self.capabilities.moderate,
            admin: self.capabilities.admin,
            is_moderator: self.is_moderator,
        }
    }
}

/// Control visibility for one render, computed once from the [`Viewer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    authname: String,
    anonymous: bool,
    append: bool,
    moderate: bool,
    admin: bool,
    is_moderator: bool,
}

impl Controls {
    /// Reply and Quote links, New Topic button.
    pub fn may_reply(&self) -> bool {
        self.append
    }

    /// Edit link on a post written by `author`.
    pub fn may_edit(&self, author: &str) -> bool {
        self.append && (self.is_moderator || (!self.anonymous && author == self.authname))
    }

    /// Delete links (cascading) and the Delete/Move topic buttons.
    pub fn may_moderate(&self) -> bool {
        self.moderate
    }

    /// Forum administration buttons (New Forum, Delete Forum).
    pub fn may_administer(&self) -> bool {
        self.admin
    }

    pub fn authname(&self) -> &str {
        &self.authname
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}
