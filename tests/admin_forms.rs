mod common;

use common::{at, forum_fields};
use discussion::render::admin::{
    admin_forum_list, admin_group_list, forum_form, AdminForumListView, AdminGroupListView,
    ForumFormView,
};
use discussion::request::Sort;
use discussion::storage::Board;

fn board_with_groups(groups: usize) -> Board {
    let mut board = Board::default();
    let mut last = 0;
    for i in 0..groups {
        last = board.add_group(&format!("Group {}", i + 1), "");
    }
    board.add_forum(forum_fields("General", last, &["carol"]), "admin", at(0));
    board
}

fn forum_list_html(board: &Board) -> String {
    admin_forum_list(&AdminForumListView {
        href: "/admin/discussion",
        forums: &board.forum_summaries(Sort::default()),
        groups: &board.groups_with_counts(Sort::default()),
        users: &board.known_users(),
        sort: Sort::default(),
        editing: None,
    })
    .unwrap()
}

#[test]
fn no_real_groups_hides_selector_and_column() {
    let html = forum_list_html(&board_with_groups(0));
    assert!(html.contains("type=\"hidden\" name=\"group\" value=\"0\""));
    assert!(!html.contains("<select id=\"group\""));
    assert!(!html.contains("class=\"forum_group"));
}

#[test]
fn real_groups_show_selector_with_every_group() {
    let html = forum_list_html(&board_with_groups(2));
    assert!(html.contains("<select id=\"group\" name=\"group\">"));
    assert!(html.contains(">None</option>"));
    assert!(html.contains(">Group 1</option>"));
    assert!(html.contains(">Group 2</option>"));
    assert!(html.contains("class=\"forum_group"));
    assert!(html.contains("<td class=\"group\">"));
}

#[test]
fn edit_form_is_prefilled() {
    let board = board_with_groups(1);
    let groups = board.groups_with_counts(Sort::default());
    let users = board.known_users();
    let forum = board.forum(1).unwrap();
    let html = forum_form(&ForumFormView {
        action: "/admin/discussion/forum",
        cancel: "/admin/discussion/forum",
        editing: Some(forum),
        groups: &groups,
        users: &users,
    })
    .unwrap();
    assert!(html.contains("value=\"General\""));
    assert!(html.contains("value=\"post-edit\""));
    assert!(html.contains("<option value=\"1\" selected=\"selected\">Group 1</option>"));
    assert!(html.contains("<option value=\"carol\" selected=\"selected\">carol</option>"));
    assert!(html.contains("<option value=\"admin\">admin</option>"));
}

#[test]
fn empty_forum_listing_shows_help() {
    let board = Board::default();
    let html = forum_list_html(&board);
    assert!(html.contains("class=\"help\""));
    assert!(!html.contains("name=\"selection\""));
    assert!(html.contains("<input type=\"text\" id=\"moderators\""));
}

#[test]
fn group_listing_skips_pseudo_group() {
    let board = board_with_groups(2);
    let groups = board.groups_with_counts(Sort::default());
    let html = admin_group_list(&AdminGroupListView {
        href: "/admin/discussion",
        groups: &groups,
        sort: Sort::default(),
        editing: board.group(2),
    })
    .unwrap();
    assert_eq!(html.matches("name=\"selection\"").count(), 2);
    assert!(!html.contains("name=\"selection\" value=\"0\""));
    assert!(html.contains("value=\"Group 2\""));
    assert!(html.contains("value=\"post-edit\""));
}
