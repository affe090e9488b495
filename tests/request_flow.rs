mod common;

use common::{at, caps, thread_board};
use discussion::config::DiscussionConfig;
use discussion::dispatch::{Component, Mode};
use discussion::error::DiscussionError;
use discussion::handler::{handle, Page, Request, Response, Session};
use discussion::storage::Board;

fn run(board: &mut Board, path: &str, query: &str, user: &str, list: &str) -> Result<Response, DiscussionError> {
    let request = Request {
        now: at(120),
        ..Request::new(path, query, user, caps(list))
    };
    handle(board, &DiscussionConfig::default(), &mut Session::default(), &request)
}

fn expect_page(response: Response) -> Page {
    match response {
        Response::Page(page) => page,
        Response::Redirect(href) => panic!("expected a page, got redirect to {}", href),
    }
}

fn expect_redirect(response: Response) -> String {
    match response {
        Response::Redirect(href) => href,
        Response::Page(page) => panic!("expected a redirect, got {} page", page.mode),
    }
}

#[test]
fn forum_index_lists_forums_without_breadcrumbs() {
    let mut board = thread_board();
    let page = expect_page(run(&mut board, "/discussion", "", "anonymous", "view").unwrap());
    assert_eq!(page.mode, Mode::ForumList);
    assert!(page.html.contains("Support subject"));
    assert!(page.html.contains("id=\"forum-list\""));
    assert!(!page.html.contains("ctxtnav"));
    assert!(!page.html.contains("New Forum"));
}

#[test]
fn topic_page_renders_thread_and_breadcrumbs() {
    let mut board = thread_board();
    let page = expect_page(run(&mut board, "/discussion/2/5", "", "bob", "view,append").unwrap());
    assert_eq!(page.mode, Mode::MessageList);
    assert_eq!(page.title, "Installing");
    assert!(page.html.contains("Forum Index"));
    assert!(page.html.contains("Message #1"));
    assert!(page.html.contains("Message #2"));
    assert!(!page.html.contains("Delete Topic"));
}

#[test]
fn posting_a_reply_redirects_to_its_anchor() {
    let mut board = thread_board();
    let href = expect_redirect(
        run(&mut board, "/discussion/2/5", "discussion_action=post-add&message=2&body=Thanks&submit=Reply", "alice", "view,append").unwrap(),
    );
    assert_eq!(href, "/discussion/2/5#3");
    let reply = board.message(3).unwrap();
    assert_eq!((reply.parent, reply.author.as_str()), (Some(2), "alice"));
    assert_eq!(board.topic(5).unwrap().last_reply, Some(at(120)));
}

#[test]
fn preview_does_not_post() {
    let mut board = thread_board();
    let page = expect_page(
        run(&mut board, "/discussion/2/5", "discussion_action=post-add&message=2&body=Draft&preview=Preview", "alice", "view,append").unwrap(),
    );
    assert_eq!(page.mode, Mode::MessageList);
    assert!(page.html.contains("Draft"));
    assert_eq!(board.counts().3, 2);
}

#[test]
fn anonymous_posts_under_typed_name() {
    let mut board = thread_board();
    run(&mut board, "/discussion/2/5", "discussion_action=post-add&author=guest&body=Hi&submit=1", "anonymous", "view,append").unwrap();
    assert_eq!(board.message(3).unwrap().author, "guest");

    let err = run(&mut board, "/discussion/2/5", "discussion_action=post-add&author=%3Cb%3E&body=Hi&submit=1", "anonymous", "view,append")
        .unwrap_err();
    assert!(matches!(err, DiscussionError::Form(_)));
}

#[test]
fn empty_body_is_rejected() {
    let mut board = thread_board();
    let err = run(&mut board, "/discussion/2/5", "discussion_action=post-add&body=+++&submit=1", "alice", "view,append").unwrap_err();
    assert!(matches!(err, DiscussionError::Form(_)));
    assert_eq!(board.counts().3, 2);
}

#[test]
fn missing_capability_names_the_mode() {
    let mut board = thread_board();
    let err = run(&mut board, "/discussion/2/5", "discussion_action=delete&message=2", "bob", "view,append").unwrap_err();
    match err {
        DiscussionError::PermissionDenied(msg) => assert!(msg.contains("message-delete")),
        other => panic!("unexpected error {}", other),
    }
    assert!(board.message(2).is_some());
}

#[test]
fn only_authors_and_moderators_edit() {
    let mut board = thread_board();
    let err = run(&mut board, "/discussion/2/5", "discussion_action=edit&message=1", "bob", "view,append").unwrap_err();
    assert!(matches!(err, DiscussionError::PermissionDenied(_)));

    // carol moderates forum 2
    let page = expect_page(run(&mut board, "/discussion/2/5", "discussion_action=edit&message=1", "carol", "view,append").unwrap());
    assert!(page.html.contains(">Tried the installer already.</textarea>"));

    let href = expect_redirect(
        run(&mut board, "/discussion/2/5", "discussion_action=post-edit&message=1&body=Fixed&submit=1", "alice", "view,append").unwrap(),
    );
    assert_eq!(href, "/discussion/2/5");
    assert_eq!(board.message(1).unwrap().body, "Fixed");
}

#[test]
fn quoting_the_topic_prefills_the_form() {
    let mut board = thread_board();
    let page = expect_page(run(&mut board, "/discussion/2/5", "discussion_action=quote", "bob", "view,append").unwrap());
    assert!(page.html.contains("&gt; How do I install it?</textarea>"));
}

#[test]
fn moderator_deletes_reply_subtree() {
    let mut board = thread_board();
    let href = expect_redirect(run(&mut board, "/discussion/2/5/1", "discussion_action=delete", "carol", "view,moderate").unwrap());
    assert_eq!(href, "/discussion/2/5");
    assert_eq!(board.counts().3, 0);
}

#[test]
fn topic_move_form_then_move() {
    let mut board = thread_board();
    let page = expect_page(run(&mut board, "/discussion/2/5", "discussion_action=move", "carol", "view,moderate").unwrap());
    assert_eq!(page.mode, Mode::TopicMove);
    assert!(page.html.contains("<option value=\"2\" selected=\"selected\">Support</option>"));

    let href = expect_redirect(run(&mut board, "/discussion/2/5", "discussion_action=post-move&new_forum=1", "carol", "view,moderate").unwrap());
    assert_eq!(href, "/discussion/1");
    assert_eq!(board.topic(5).unwrap().forum, 1);
}

#[test]
fn moderate_capability_is_limited_to_own_forums() {
    let mut board = thread_board();
    let err = run(&mut board, "/discussion/2/5", "discussion_action=delete", "dave", "view,moderate").unwrap_err();
    match err {
        DiscussionError::PermissionDenied(msg) => assert!(msg.contains("topic-delete")),
        other => panic!("unexpected error {}", other),
    }
    assert!(board.topic(5).is_some());

    // admins moderate every forum
    let href = expect_redirect(run(&mut board, "/discussion/2/5", "discussion_action=delete", "root", "view,moderate,admin").unwrap());
    assert_eq!(href, "/discussion/2");
    assert!(board.topic(5).is_none());
}

#[test]
fn new_topic_lands_in_forum() {
    let mut board = thread_board();
    let page = expect_page(run(&mut board, "/discussion/2", "discussion_action=add", "bob", "view,append").unwrap());
    assert_eq!(page.mode, Mode::TopicAdd);
    assert!(page.html.contains("value=\"bob\" readonly=\"readonly\""));

    let href = expect_redirect(
        run(&mut board, "/discussion/2", "discussion_action=post-add&subject=Second&body=More+questions&submit=1", "bob", "view,append").unwrap(),
    );
    assert_eq!(href, "/discussion/2");
    assert_eq!(board.topic(6).unwrap().subject, "Second");
}

#[test]
fn topic_list_pages_keep_ordering() {
    let mut board = thread_board();
    let config = DiscussionConfig {
        topics_per_page: 3,
        ..DiscussionConfig::default()
    };
    let request = Request {
        now: at(120),
        ..Request::new("/discussion/1", "order=id&asc=1", "bob", caps("view"))
    };
    let page = expect_page(handle(&mut board, &config, &mut Session::default(), &request).unwrap());
    assert_eq!(page.mode, Mode::TopicList);
    assert!(page.html.contains("There are 4 topics in this forum"));
    assert!(page.html.contains("start=3&amp;order=id&amp;asc=1"));
    assert!(!page.html.contains("previous page"));
}

#[test]
fn topic_list_past_the_end_links_back_to_last_page() {
    let mut board = thread_board();
    let config = DiscussionConfig {
        topics_per_page: 3,
        ..DiscussionConfig::default()
    };
    let request = Request {
        now: at(120),
        ..Request::new("/discussion/1", "start=100&order=id&asc=1", "bob", caps("view"))
    };
    let page = expect_page(handle(&mut board, &config, &mut Session::default(), &request).unwrap());
    assert!(page.html.contains("There are 4 topics in this forum"));
    assert!(!page.html.contains("There are no topics created"));
    assert!(page.html.contains("start=3&amp;order=id&amp;asc=1"));
    assert!(!page.html.contains("start=97"));
    assert!(!page.html.contains("next page"));
}

#[test]
fn admin_adds_group_and_forum() {
    let mut board = thread_board();
    let href = expect_redirect(run(&mut board, "/admin/discussion/group", "discussion_action=post-add&name=Dev&description=Builders", "root", "admin").unwrap());
    assert_eq!(href, "/admin/discussion/group");
    assert_eq!(board.group(1).unwrap().name, "Dev");

    let href = expect_redirect(
        run(&mut board, "/admin/discussion/forum", "discussion_action=post-add&name=Core&subject=Core+work&group=1&moderators=alice&moderators=carol", "root", "admin").unwrap(),
    );
    assert_eq!(href, "/admin/discussion/forum");
    let forum = board.forum(3).unwrap();
    assert_eq!(forum.group, 1);
    assert_eq!(forum.moderators, vec!["alice", "carol"]);

    let page = expect_page(run(&mut board, "/admin/discussion/forum/3", "", "root", "admin").unwrap());
    assert_eq!(page.mode, Mode::AdminForumList);
    assert!(page.html.contains("id=\"edit-forum-form\""));
}

#[test]
fn admin_bulk_delete_needs_admin() {
    let mut board = thread_board();
    let err = run(&mut board, "/admin/discussion/forum", "discussion_action=delete&selection=1&selection=2", "mod", "view,moderate").unwrap_err();
    assert!(matches!(err, DiscussionError::PermissionDenied(_)));

    run(&mut board, "/admin/discussion/forum", "discussion_action=delete&selection=1&selection=2", "root", "admin").unwrap();
    assert_eq!(board.counts(), (0, 0, 0, 0));
}

#[test]
fn unknown_entities_and_paths_are_errors() {
    let mut board = thread_board();
    assert!(matches!(
        run(&mut board, "/discussion/2/42", "", "bob", "view"),
        Err(DiscussionError::NotFound { entity: "topic", id: 42 })
    ));
    assert!(matches!(
        run(&mut board, "/discussion/2/5", "discussion_action=explode", "bob", "view"),
        Err(DiscussionError::InvalidRequest(_))
    ));
    assert!(run(&mut board, "/tickets/1", "", "bob", "view").is_err());
}

#[test]
fn wiki_thread_posts_without_redirect() {
    let mut board = thread_board();
    let page = expect_page(run(&mut board, "/wiki/Installing", "discussion_action=post-add&body=From+the+wiki&submit=1", "bob", "view,append").unwrap());
    assert_eq!(page.mode, Mode::WikiMessageList);
    assert!(page.html.contains("From the wiki"));
    assert_eq!(board.counts().3, 3);

    let page = expect_page(run(&mut board, "/wiki/NoSuchPage", "", "bob", "view").unwrap());
    assert!(page.html.contains("No discussion topic exists"));

    let page = expect_page(run(&mut board, "/wiki/Installing", "", "bob", "").unwrap());
    assert!(page.html.contains("You do not have permission"));
}

#[test]
fn wiki_topic_edit_closes_the_form() {
    let mut board = thread_board();
    let page = expect_page(run(&mut board, "/wiki/Installing", "discussion_action=post-edit&body=Edited+body", "alice", "view,append").unwrap());
    assert_eq!(page.mode, Mode::WikiMessageList);
    assert_eq!(board.topic(5).unwrap().body, "Edited body");
    assert!(page.html.contains("Edited body"));
    assert!(!page.html.contains("value=\"post-edit\""));
}

#[test]
fn component_override_embeds_thread() {
    let mut board = thread_board();
    let request = Request {
        component: Some(Component::Wiki),
        now: at(120),
        ..Request::new("/discussion/2/5", "discussion_action=delete", "mod", caps("view,moderate"))
    };
    let page = expect_page(handle(&mut board, &DiscussionConfig::default(), &mut Session::default(), &request).unwrap());
    assert_eq!(page.mode, Mode::WikiMessageList);
    assert!(board.topic(5).is_some());
}
