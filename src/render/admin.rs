//! Forum and forum-group administration views.
//!
//! Both pages show an add form (or an edit form when an entity is selected and
//! nothing was submitted yet) above a sortable table with `selection` checkboxes for
//! bulk removal. Group selection and moderator entry adapt to what exists: the group
//! `<select>` only appears once a real group exists beside the "None" pseudo group,
//! and moderators are picked from known users when there are any.

use askama::Template;

use super::{parity, sortable_headers};
use crate::error::Result;
use crate::model::{Forum, ForumGroup, ForumSummary, GroupSummary, NO_GROUP};
use crate::request::{ForumSort, GroupSort, Sort};

struct GroupOption<'a> {
    id: u64,
    name: &'a str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "admin/group_field.html")]
struct GroupField<'a> {
    show_select: bool,
    options: Vec<GroupOption<'a>>,
}

/// True when at least one real group exists beside the pseudo entry.
pub fn has_real_groups(groups: &[GroupSummary]) -> bool {
    groups.iter().any(|g| g.group.id != NO_GROUP)
}

/// Group `<select>` with `selected` preselected, or a hidden `group=0` field.
pub fn group_selector(groups: &[GroupSummary], selected: u64) -> Result<String> {
    Ok(GroupField {
        show_select: has_real_groups(groups),
        options: groups
            .iter()
            .map(|g| GroupOption {
                id: g.group.id,
                name: &g.group.name,
                selected: g.group.id == selected,
            })
            .collect(),
    }
    .render()?)
}

struct UserOption<'a> {
    name: &'a str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "admin/moderators_field.html")]
struct ModeratorsField<'a> {
    multi: bool,
    options: Vec<UserOption<'a>>,
    text: String,
}

/// Multi-select over `users` when any are known, else a space separated text input.
pub fn moderators_field(users: &[String], selected: &[String]) -> Result<String> {
    Ok(ModeratorsField {
        multi: !users.is_empty(),
        options: users
            .iter()
            .map(|u| UserOption {
                name: u,
                selected: selected.contains(u),
            })
            .collect(),
        text: selected.join(" "),
    }
    .render()?)
}

/// Add or edit form for a forum.
pub struct ForumFormView<'a> {
    /// Form target.
    pub action: &'a str,
    /// Where Cancel leads.
    pub cancel: &'a str,
    /// Forum being edited; `None` renders the add form.
    pub editing: Option<&'a Forum>,
    pub groups: &'a [GroupSummary],
    pub users: &'a [String],
}

#[derive(Template)]
#[template(path = "admin/forum_form.html")]
struct ForumForm<'a> {
    action: &'a str,
    cancel: &'a str,
    editing: bool,
    forum_id: u64,
    name: &'a str,
    subject: &'a str,
    description: &'a str,
    moderators_field: String,
    group_field: String,
}

pub fn forum_form(view: &ForumFormView) -> Result<String> {
    let no_moderators: &[String] = &[];
    let (moderators, group) = match view.editing {
        Some(f) => (f.moderators.as_slice(), f.group),
        None => (no_moderators, NO_GROUP),
    };
    Ok(ForumForm {
        action: view.action,
        cancel: view.cancel,
        editing: view.editing.is_some(),
        forum_id: view.editing.map(|f| f.id).unwrap_or_default(),
        name: view.editing.map(|f| f.name.as_str()).unwrap_or_default(),
        subject: view.editing.map(|f| f.subject.as_str()).unwrap_or_default(),
        description: view.editing.map(|f| f.description.as_str()).unwrap_or_default(),
        moderators_field: moderators_field(view.users, moderators)?,
        group_field: group_selector(view.groups, group)?,
    }
    .render()?)
}

const ADMIN_FORUM_COLUMNS: [(ForumSort, &str); 5] = [
    (ForumSort::Id, "ID"),
    (ForumSort::Name, "Name"),
    (ForumSort::Subject, "Subject"),
    (ForumSort::Description, "Description"),
    (ForumSort::Moderators, "Moderators"),
];

pub struct AdminForumListView<'a> {
    /// Admin root, e.g. `/admin/discussion`.
    pub href: &'a str,
    pub forums: &'a [ForumSummary],
    pub groups: &'a [GroupSummary],
    pub users: &'a [String],
    pub sort: Sort<ForumSort>,
    pub editing: Option<&'a Forum>,
}

struct AdminForumRow<'a> {
    parity: &'static str,
    href: String,
    forum: &'a Forum,
    moderators: String,
    group: &'a str,
}

#[derive(Template)]
#[template(path = "admin/forum_list.html")]
struct AdminForumList<'a> {
    form: String,
    action: String,
    show_group: bool,
    headers: Vec<String>,
    rows: Vec<AdminForumRow<'a>>,
}

pub fn admin_forum_list(view: &AdminForumListView) -> Result<String> {
    let action = format!("{}/forum", view.href);
    let show_group = has_real_groups(view.groups);

    let mut columns = ADMIN_FORUM_COLUMNS.to_vec();
    if show_group {
        columns.push((ForumSort::Group, "Group"));
    }

    let rows = view
        .forums
        .iter()
        .enumerate()
        .map(|(i, f)| AdminForumRow {
            parity: parity(i),
            href: format!("{}/{}", action, f.forum.id),
            forum: &f.forum,
            moderators: f.forum.moderators_line(),
            group: group_name(view.groups, f.forum.group),
        })
        .collect();

    Ok(AdminForumList {
        form: forum_form(&ForumFormView {
            action: &action,
            cancel: &action,
            editing: view.editing,
            groups: view.groups,
            users: view.users,
        })?,
        headers: sortable_headers(&view.sort, &columns, &action)?,
        show_group,
        rows,
        action,
    }
    .render()?)
}

fn group_name(groups: &[GroupSummary], id: u64) -> &str {
    groups
        .iter()
        .find(|g| g.group.id == id)
        .map(|g| g.group.name.as_str())
        .unwrap_or_default()
}

const GROUP_COLUMNS: [(GroupSort, &str); 4] = [
    (GroupSort::Id, "ID"),
    (GroupSort::Name, "Name"),
    (GroupSort::Description, "Description"),
    (GroupSort::Forums, "Forums"),
];

pub struct AdminGroupListView<'a> {
    /// Admin root, e.g. `/admin/discussion`.
    pub href: &'a str,
    /// Groups as listed, pseudo entry included.
    pub groups: &'a [GroupSummary],
    pub sort: Sort<GroupSort>,
    pub editing: Option<&'a ForumGroup>,
}

struct GroupRow<'a> {
    parity: &'static str,
    href: String,
    summary: &'a GroupSummary,
}

#[derive(Template)]
#[template(path = "admin/group_list.html")]
struct AdminGroupList<'a> {
    action: String,
    editing: bool,
    edit_id: u64,
    edit_name: &'a str,
    edit_description: &'a str,
    headers: Vec<String>,
    rows: Vec<GroupRow<'a>>,
}

pub fn admin_group_list(view: &AdminGroupListView) -> Result<String> {
    let action = format!("{}/group", view.href);
    let rows = view
        .groups
        .iter()
        .filter(|g| g.group.id != NO_GROUP)
        .enumerate()
        .map(|(i, g)| GroupRow {
            parity: parity(i),
            href: format!("{}/{}", action, g.group.id),
            summary: g,
        })
        .collect();

    let editing = view.editing.filter(|g| g.id != NO_GROUP);
    Ok(AdminGroupList {
        headers: sortable_headers(&view.sort, &GROUP_COLUMNS, &action)?,
        editing: editing.is_some(),
        edit_id: editing.map(|g| g.id).unwrap_or_default(),
        edit_name: editing.map(|g| g.name.as_str()).unwrap_or_default(),
        edit_description: editing.map(|g| g.description.as_str()).unwrap_or_default(),
        rows,
        action,
    }
    .render()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: u64, name: &str) -> GroupSummary {
        GroupSummary {
            group: ForumGroup {
                id,
                name: name.into(),
                description: String::new(),
            },
            forums: 0,
        }
    }

    #[test]
    fn pseudo_group_alone_gives_hidden_field() {
        let html = group_selector(&[summary(0, "None")], 0).unwrap();
        assert!(html.contains("type=\"hidden\" name=\"group\" value=\"0\""));
        assert!(!html.contains("<select"));
    }

    #[test]
    fn real_group_gives_select_with_selection() {
        let groups = [summary(0, "None"), summary(3, "Dev")];
        let html = group_selector(&groups, 3).unwrap();
        assert!(html.contains("<select id=\"group\" name=\"group\">"));
        assert!(html.contains("<option value=\"3\" selected=\"selected\">Dev</option>"));
        assert!(html.contains("<option value=\"0\">None</option>"));
    }

    #[test]
    fn moderators_widget_shape() {
        let html = moderators_field(&[], &["carol".to_string()]).unwrap();
        assert!(html.contains("<input type=\"text\" id=\"moderators\" name=\"moderators\" value=\"carol\""));
        let users = vec!["alice".to_string(), "carol".to_string()];
        let html = moderators_field(&users, &["carol".to_string()]).unwrap();
        assert!(html.contains("multiple=\"multiple\""));
        assert!(html.contains("<option value=\"carol\" selected=\"selected\">carol</option>"));
        assert!(html.contains("<option value=\"alice\">alice</option>"));
    }
}
