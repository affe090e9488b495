mod common;

use common::{at, caps, node, topic};
use discussion::acl::{Capabilities, Viewer};
use discussion::model::{count_nodes, MessageNode};
use discussion::render::thread::{render_discussion, render_replies, ThreadContext, DELETE_REPLY_CONFIRM};
use discussion::request::RequestArgs;

fn ctx<'a>(args: &'a RequestArgs, user: &str, caps: Capabilities) -> ThreadContext<'a> {
    ThreadContext::new("/discussion/2/5".into(), args, Viewer::new(user, caps).controls(), at(60))
}

/// Alice's reply 1 with bob's reply 2 under it.
fn alice_and_bob() -> Vec<MessageNode> {
    vec![node(1, "alice", vec![node(2, "bob", vec![])])]
}

/// Control link labels of each rendered message row, in document order.
fn row_controls(html: &str) -> Vec<Vec<String>> {
    html.split("<li class=\"message")
        .skip(1)
        .map(|row| {
            let controls = row
                .split("<div class=\"controls\">")
                .nth(1)
                .and_then(|rest| rest.split("</div>").next())
                .unwrap_or_default();
            controls
                .split("</a>")
                .filter_map(|piece| piece.rsplit('>').next())
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .collect()
        })
        .collect()
}

#[test]
fn reply_to_own_message_as_moderating_author() {
    let args = RequestArgs::from_query("discussion_action=add&message=1").unwrap();
    let html = render_replies(&alice_and_bob(), &ctx(&args, "alice", caps("view,append,moderate"))).unwrap();

    let rows = row_controls(&html);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["Reply", "Quote", "Edit", "Delete"]);
    assert_eq!(rows[1], vec!["Reply", "Quote", "Delete"]);

    let bob = html.find("Message #2").unwrap();
    let form = html.find("value=\"post-add\"").unwrap();
    assert!(bob < form, "reply form follows alice's children");
    assert!(html.contains("<input type=\"hidden\" name=\"message\" value=\"1\""));
    assert!(html.contains(DELETE_REPLY_CONFIRM));
}

#[test]
fn no_moderate_capability_means_no_delete() {
    let args = RequestArgs::default();
    let html = render_replies(&alice_and_bob(), &ctx(&args, "alice", caps("view,append"))).unwrap();
    assert!(!html.contains(">Delete</a>"));
    let rows = row_controls(&html);
    assert_eq!(rows[0], vec!["Reply", "Quote", "Edit"]);
    assert_eq!(rows[1], vec!["Reply", "Quote"]);
}

#[test]
fn view_only_viewer_gets_no_controls() {
    let args = RequestArgs::default();
    let html = render_replies(&alice_and_bob(), &ctx(&args, "alice", caps("view"))).unwrap();
    assert!(row_controls(&html).iter().all(Vec::is_empty));
}

#[test]
fn anonymous_viewer_never_edits_anonymous_posts() {
    let args = RequestArgs::default();
    let tree = vec![node(1, "anonymous", vec![])];
    let html = render_replies(&tree, &ctx(&args, "anonymous", caps("view,append"))).unwrap();
    assert_eq!(row_controls(&html)[0], vec!["Reply", "Quote"]);
}

#[test]
fn rendered_rows_match_tree_size_and_order() {
    let tree = vec![
        node(4, "a", vec![node(7, "b", vec![node(9, "c", vec![])]), node(5, "d", vec![])]),
        node(3, "e", vec![]),
    ];
    let args = RequestArgs::default();
    let html = render_replies(&tree, &ctx(&args, "x", caps("view"))).unwrap();
    assert_eq!(html.matches("<li class=\"message").count(), count_nodes(&tree));

    let order: Vec<usize> = ["Message #4", "Message #7", "Message #9", "Message #5", "Message #3"]
        .iter()
        .map(|label| html.find(label).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn edit_target_shows_form_instead_of_body() {
    let args = RequestArgs::from_query("discussion_action=edit&message=2&body=Changed").unwrap();
    let html = render_replies(&alice_and_bob(), &ctx(&args, "bob", caps("view,append"))).unwrap();
    assert!(!html.contains("Reply 2 by bob"));
    assert!(html.contains(">Changed</textarea>"));
    assert!(html.contains("value=\"post-edit\""));
    assert!(html.contains("Reply 1 by alice"));
}

#[test]
fn preview_shows_draft_before_reply_form() {
    let args = RequestArgs::from_query("discussion_action=post-add&message=2&body=Draft+text&preview=1").unwrap();
    let html = render_replies(&alice_and_bob(), &ctx(&args, "carol", caps("view,append"))).unwrap();
    let draft = html.find("Draft text").unwrap();
    let form = html.find("<textarea").unwrap();
    assert!(draft < form);
}

#[test]
fn topic_level_reply_form_closes_container() {
    let topic = topic(5, 2, "alice");
    let args = RequestArgs::from_query("discussion_action=quote").unwrap();
    let html = render_discussion(&topic, false, &alice_and_bob(), &ctx(&args, "bob", caps("view,append"))).unwrap();
    let last_message = html.find("Message #2").unwrap();
    let form = html.find("value=\"post-add\"").unwrap();
    assert!(last_message < form);
    assert!(!html.contains("<input type=\"hidden\" name=\"message\""));
    assert_eq!(html.matches("Tree View").count(), 2);
}

#[test]
fn topic_edit_prefers_submitted_subject() {
    let topic = topic(5, 2, "alice");
    let args = RequestArgs::from_query("discussion_action=edit&subject=New+subject").unwrap();
    let html = render_discussion(&topic, false, &[], &ctx(&args, "alice", caps("view,append"))).unwrap();
    assert!(html.contains("<div class=\"subject\">New subject</div>"));
    assert!(html.contains("name=\"subject\" value=\"New subject\""));
}
