//! Test utilities & fixtures.
//! Builds small deterministic boards and reply trees shared by the integration tests.

#![allow(dead_code)] // each test binary uses a different subset

use std::path::PathBuf;

use chrono::{DateTime, Duration, TimeZone, Utc};
use discussion::acl::Capabilities;
use discussion::model::{MessageNode, Topic};
use discussion::storage::{Board, ForumFields};

/// Fixed clock all fixtures are built around.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub fn at(minutes: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(minutes)
}

pub fn caps(list: &str) -> Capabilities {
    Capabilities::parse_list(list).unwrap()
}

pub fn topic(id: u64, forum: u64, author: &str) -> Topic {
    Topic {
        id,
        forum,
        subject: format!("Topic {}", id),
        author: author.into(),
        body: format!("Body of topic {}", id),
        time: t0(),
        last_reply: None,
    }
}

pub fn node(id: u64, author: &str, replies: Vec<MessageNode>) -> MessageNode {
    MessageNode {
        id,
        parent: None,
        author: author.into(),
        body: format!("Reply {} by {}", id, author),
        time: at(id as i64),
        is_new: false,
        replies,
    }
}

pub fn forum_fields(name: &str, group: u64, moderators: &[&str]) -> ForumFields {
    ForumFields {
        name: name.into(),
        subject: format!("{} subject", name),
        description: format!("{} description", name),
        moderators: moderators.iter().map(|m| m.to_string()).collect(),
        group,
    }
}

/// Board with forum 2 holding topic 5 by alice, reply 1 by alice and reply 2 by bob
/// under it. Forum 1 holds filler topics 1 to 4; carol moderates forum 2.
pub fn thread_board() -> Board {
    let mut board = Board::default();
    let general = board.add_forum(forum_fields("General", 0, &[]), "admin", at(0));
    let support = board.add_forum(forum_fields("Support", 0, &["carol"]), "admin", at(1));
    for i in 1..=4 {
        board
            .add_topic(general, &format!("Filler {}", i), "dave", "filler", at(i))
            .unwrap();
    }
    let topic = board
        .add_topic(support, "Installing", "alice", "How do I install it?", at(10))
        .unwrap();
    assert_eq!((support, topic), (2, 5));
    let root = board
        .add_message(topic, None, "alice", "Tried the installer already.", at(20))
        .unwrap();
    board
        .add_message(topic, Some(root), "bob", "Run init first.", at(30))
        .unwrap();
    board
}

/// Temp dir plus a board file path inside a not yet existing subdirectory.
pub fn board_path() -> (tempfile::TempDir, PathBuf) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("data").join("board.json");
    (tmp, path)
}
