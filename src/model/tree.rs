//! Reply-tree assembly from the flat message rows of one topic.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::warn;

use super::{MessageNode, MessageRecord};

/// Assemble the reply tree of a topic.
///
/// Rows are taken in time order (ties by id). Rows without a parent become
/// top-level replies; the rest are appended to their parent's children in the same
/// order. A row whose parent is not part of the topic is promoted to the top level.
/// Rows caught in a parent cycle can never be reached from a top-level reply and are
/// left out.
pub fn build_tree(records: &[MessageRecord], visited: Option<DateTime<Utc>>) -> Vec<MessageNode> {
    let mut ordered: Vec<&MessageRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));

    let known: HashSet<u64> = ordered.iter().map(|r| r.id).collect();
    let mut children: HashMap<u64, Vec<&MessageRecord>> = HashMap::new();
    let mut roots = Vec::new();

    for record in &ordered {
        match record.parent {
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(record);
            }
            Some(parent) => {
                warn!(
                    "message {} replies to unknown message {}; showing it at top level",
                    record.id, parent
                );
                roots.push(*record);
            }
            None => roots.push(*record),
        }
    }

    let tree: Vec<MessageNode> = roots
        .into_iter()
        .map(|r| attach(r, &children, visited))
        .collect();

    let placed = super::count_nodes(&tree);
    if placed < ordered.len() {
        warn!(
            "dropped {} message(s) unreachable from the topic (reply cycle)",
            ordered.len() - placed
        );
    }
    tree
}

fn attach(
    record: &MessageRecord,
    children: &HashMap<u64, Vec<&MessageRecord>>,
    visited: Option<DateTime<Utc>>,
) -> MessageNode {
    let mut node = MessageNode::from_record(record, visited);
    if let Some(kids) = children.get(&record.id) {
        node.replies = kids.iter().map(|k| attach(k, children, visited)).collect();
    }
    node
}

/// Replies of a topic as a flat list ordered by time, oldest first when `ascending`.
pub fn flat_messages(
    records: &[MessageRecord],
    ascending: bool,
    visited: Option<DateTime<Utc>>,
) -> Vec<MessageNode> {
    let mut ordered: Vec<&MessageRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
    if !ascending {
        ordered.reverse();
    }
    ordered
        .into_iter()
        .map(|r| MessageNode::from_record(r, visited))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn rec(id: u64, parent: Option<u64>, minute: i64) -> MessageRecord {
        MessageRecord {
            id,
            forum: 2,
            topic: 5,
            parent,
            author: format!("user{id}"),
            body: format!("body {id}"),
            time: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minute),
        }
    }

    #[test]
    fn nests_replies_under_parents_in_time_order() {
        let rows = vec![rec(3, Some(1), 3), rec(1, None, 1), rec(2, Some(1), 2), rec(4, None, 4)];
        let tree = build_tree(&rows, None);
        assert_eq!(tree.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(tree[0].replies.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(super::super::count_nodes(&tree), 4);
    }

    #[test]
    fn orphan_is_promoted_to_top_level() {
        let rows = vec![rec(1, None, 1), rec(7, Some(99), 2)];
        let tree = build_tree(&rows, None);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].id, 7);
    }

    #[test]
    fn cycle_members_are_dropped() {
        let rows = vec![rec(1, None, 1), rec(2, Some(3), 2), rec(3, Some(2), 3)];
        let tree = build_tree(&rows, None);
        assert_eq!(super::super::count_nodes(&tree), 1);
    }

    #[test]
    fn visit_time_marks_only_later_messages() {
        let rows = vec![rec(1, None, 1), rec(2, Some(1), 10)];
        let visited = Some(rows[0].time + Duration::minutes(5));
        let tree = build_tree(&rows, visited);
        assert!(!tree[0].is_new);
        assert!(tree[0].replies[0].is_new);
    }

    #[test]
    fn flat_lists_follow_direction() {
        let rows = vec![rec(2, Some(1), 2), rec(1, None, 1), rec(3, Some(2), 3)];
        let asc: Vec<u64> = flat_messages(&rows, true, None).iter().map(|n| n.id).collect();
        let desc: Vec<u64> = flat_messages(&rows, false, None).iter().map(|n| n.id).collect();
        assert_eq!(asc, vec![1, 2, 3]);
        assert_eq!(desc, vec![3, 2, 1]);
        assert!(flat_messages(&rows, true, None).iter().all(|n| n.replies.is_empty()));
    }
}
