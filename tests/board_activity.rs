mod common;

use common::{at, thread_board};
use discussion::error::DiscussionError;
use discussion::render::links::{render_link, resolve_link, LinkTarget};
use discussion::storage::{EventKind, HitKind};

#[test]
fn search_finds_topics_before_replies() {
    let board = thread_board();
    let hits = board.search("install");
    let found: Vec<(HitKind, u64)> = hits.iter().map(|h| (h.kind, h.id)).collect();
    assert_eq!(found, vec![(HitKind::Topic, 5), (HitKind::Message, 1)]);

    assert_eq!(hits[0].title, "topic: 5: Installing");
    assert_eq!(hits[0].href("/discussion"), "/discussion/2/5#-1");
    assert_eq!(hits[1].title, "message: 1: Installing");
    assert_eq!(hits[1].href("/discussion"), "/discussion/2/5/1#1");
    assert_eq!(hits[1].author, "alice");
    assert_eq!(hits[1].excerpt, "Tried the installer already.");
}

#[test]
fn search_ignores_case_and_blank_queries() {
    let board = thread_board();
    let ids: Vec<u64> = board.search("INIT").iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![2]);
    assert_eq!(board.search("filler").len(), 4);
    assert!(board.search("   ").is_empty());
    assert!(board.search("nothing like this").is_empty());
}

#[test]
fn timeline_lists_window_newest_first() {
    let board = thread_board();
    let events = board.timeline(at(5), at(30));
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::MessagePosted, EventKind::MessagePosted, EventKind::TopicPosted]
    );
    assert_eq!(events[0].title, "[Support Forum] Re: Installing (bob)");
    assert_eq!(events[0].href("/discussion"), "/discussion/2/5/2#2");
    assert_eq!(events[2].title, "[Support Forum] Installing (alice)");
    assert_eq!(events[2].href("/discussion"), "/discussion/2/5");
}

#[test]
fn timeline_includes_forum_creation() {
    let board = thread_board();
    let events = board.timeline(at(0), at(30));
    assert_eq!(events.len(), 9);
    let oldest = events.last().unwrap();
    assert_eq!(oldest.kind, EventKind::ForumCreated);
    assert_eq!(oldest.title, "New forum General created by admin");
    assert_eq!(oldest.summary, "General subject - General description");
    assert_eq!(oldest.href("/discussion"), "/discussion/1");
    assert!(board.timeline(at(31), at(60)).is_empty());
}

#[test]
fn recipients_address_thread_and_copy_moderators() {
    let mut board = thread_board();
    let r = board.recipients(5).unwrap();
    assert_eq!(r.to, vec!["alice", "bob"]);
    assert_eq!(r.cc, vec!["carol"]);

    board.add_message(5, None, "anonymous", "Me too", at(40)).unwrap();
    board.add_message(5, None, "carol", "Fixed in the docs", at(50)).unwrap();
    let r = board.recipients(5).unwrap();
    assert_eq!(r.to, vec!["alice", "bob", "carol"]);
    assert!(r.cc.is_empty());

    assert!(matches!(
        board.recipients(42),
        Err(DiscussionError::NotFound { entity: "topic", id: 42 })
    ));
}

#[test]
fn wiki_links_are_titled_after_their_target() {
    let board = thread_board();
    let topic = resolve_link(&board, "/discussion", "topic:5", None).unwrap();
    assert!(topic.contains("title=\"Support subject: Installing\""));
    assert!(topic.contains("#-1"));
    assert!(topic.contains(">topic:5</a>"));
    assert!(!topic.contains("missing"));

    let forum = resolve_link(&board, "/discussion", "forum:2", Some("the support forum")).unwrap();
    assert!(forum.contains("title=\"Support subject\""));
    assert!(forum.contains(">the support forum</a>"));

    let message = render_link(&board, "/discussion", LinkTarget::Message(2), "reply").unwrap();
    assert!(message.contains("title=\"Support subject: Installing\""));
    assert!(message.contains("#2"));
}

#[test]
fn dangling_wiki_links_are_marked_missing() {
    let board = thread_board();
    let html = resolve_link(&board, "/discussion", "topic:42", None).unwrap();
    assert!(html.contains("class=\"missing\""));
    assert!(html.contains("title=\"topic:42\""));

    assert!(resolve_link(&board, "/discussion", "ticket:1", None).is_err());
    assert!(resolve_link(&board, "/discussion", "topic:x", None).is_err());
    assert_eq!("message:7".parse::<LinkTarget>().unwrap(), LinkTarget::Message(7));
}
