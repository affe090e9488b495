use askama::Template;
use discussion::render::{sortable_headers, SortableTh};
use discussion::request::{ForumSort, RequestArgs, Sort, TopicSort};

#[test]
fn active_ascending_column_links_descending() {
    let sort = Sort::new(ForumSort::Name, true);
    let th = SortableTh::new(&sort, ForumSort::Name, "Name", "/admin/discussion/forum");
    assert_eq!(th.href, "/admin/discussion/forum?order=name&asc=0");
    assert_eq!(th.state, "asc");
    assert_eq!(th.tooltip, "Sort by name (descending)");
}

#[test]
fn active_descending_column_links_ascending() {
    let sort = Sort::new(TopicSort::LastReply, false);
    let th = SortableTh::new(&sort, TopicSort::LastReply, "Last Reply", "/discussion/2");
    assert_eq!(th.href, "/discussion/2?order=lastreply&asc=1");
    assert_eq!(th.state, "desc");
    assert_eq!(th.tooltip, "Sort by lastreply (ascending)");
}

#[test]
fn inactive_column_links_ascending_without_state() {
    let sort = Sort::new(TopicSort::LastReply, false);
    let th = SortableTh::new(&sort, TopicSort::Author, "Author", "/discussion/2");
    assert_eq!(th.href, "/discussion/2?order=author&asc=1");
    assert_eq!(th.state, "");
    assert_eq!(th.tooltip, "Sort by author");

    let html = th.render().unwrap();
    assert!(html.contains("<th class=\"author\">"));
    assert!(html.contains("order=author&amp;asc=1"));
}

#[test]
fn headers_follow_request_ordering() {
    let args = RequestArgs::from_query("order=topics&asc=0").unwrap();
    let sort: Sort<ForumSort> = Sort::from_args(&args);
    let columns = [(ForumSort::Id, "ID"), (ForumSort::Topics, "Topics")];
    let cells = sortable_headers(&sort, &columns, "/discussion").unwrap();
    assert_eq!(cells.len(), 2);
    assert!(cells[0].contains("order=id&amp;asc=1"));
    assert!(cells[1].contains("class=\"topics desc\""));
    assert!(cells[1].contains("order=topics&amp;asc=1"));
}
