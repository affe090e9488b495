//! # HTML Rendering
//!
//! Every view is a pure function from board data, viewer [`Controls`] and request
//! state to an HTML fragment. Fragments are produced by askama templates under
//! `templates/`; recursion (reply trees) and nested fragments are composed in Rust
//! and spliced into the parent template unescaped. User content is always escaped.
//!
//! - [`thread`] - message tree, topic composite view and the reply/edit/preview forms
//! - [`listing`] - forum list and paginated topic list
//! - [`admin`] - forum and group administration forms and tables
//! - [`pages`] - full discussion pages (message list, add topic, add forum, move topic)
//! - [`nav`] - breadcrumb header
//! - [`links`] - `forum:`/`topic:`/`message:` links in wiki text
//!
//! [`Controls`]: crate::acl::Controls

use askama::Template;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::request::{Sort, SortKey};

pub mod admin;
pub mod links;
pub mod listing;
pub mod nav;
pub mod pages;
pub mod thread;

/// A link in a controls row or button bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlLink {
    pub label: &'static str,
    pub href: String,
    /// Confirmation prompt; empty for none.
    pub confirm: &'static str,
}

impl ControlLink {
    pub fn new(label: &'static str, href: String) -> Self {
        ControlLink { label, href, confirm: "" }
    }

    pub fn confirmed(label: &'static str, href: String, confirm: &'static str) -> Self {
        ControlLink { label, href, confirm }
    }
}

/// Sortable column header cell.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "sortable_th.html")]
pub struct SortableTh {
    /// Column key, also the CSS class of the cell.
    pub class: &'static str,
    /// `asc` or `desc` on the active column, empty elsewhere.
    pub state: &'static str,
    pub title: &'static str,
    pub tooltip: String,
    pub href: String,
}

impl SortableTh {
    /// Header for `column` of a listing at `base` currently ordered by `sort`.
    ///
    /// The link flips the direction on the active column and asks for ascending
    /// order anywhere else.
    pub fn new<K: SortKey>(sort: &Sort<K>, column: K, title: &'static str, base: &str) -> Self {
        let key = column.key();
        let next_ascending = sort.next_ascending(column);
        let (state, tooltip) = if sort.is_active(column) {
            let state = if sort.ascending { "asc" } else { "desc" };
            let what = if next_ascending { "ascending" } else { "descending" };
            (state, format!("Sort by {} ({})", key, what))
        } else {
            ("", format!("Sort by {}", key))
        };
        SortableTh {
            class: key,
            state,
            title,
            tooltip,
            href: format!("{}?order={}&asc={}", base, key, asc_flag(next_ascending)),
        }
    }
}

/// Render one header per `(column, title)` pair.
pub fn sortable_headers<K: SortKey>(
    sort: &Sort<K>,
    columns: &[(K, &'static str)],
    base: &str,
) -> Result<Vec<String>> {
    columns
        .iter()
        .map(|&(column, title)| Ok(SortableTh::new(sort, column, title, base).render()?))
        .collect()
}

/// `asc` query value.
pub fn asc_flag(ascending: bool) -> u8 {
    u8::from(ascending)
}

/// Row class of the `index`-th table row, counting from zero.
pub fn parity(index: usize) -> &'static str {
    if index % 2 == 1 {
        "even"
    } else {
        "odd"
    }
}

/// Absolute timestamp as shown in post footers.
pub fn format_datetime(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Coarse age of `then` as seen at `now`, e.g. `3 hours` or `2 weeks`.
///
/// Ages under 1.9 minutes are given in seconds; otherwise the largest unit that
/// fits at least 1.9 times is used and the count rounded.
pub fn pretty_timedelta(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const UNITS: [(i64, &str); 6] = [
        (3600 * 24 * 365, "year"),
        (3600 * 24 * 30, "month"),
        (3600 * 24 * 7, "week"),
        (3600 * 24, "day"),
        (3600, "hour"),
        (60, "minute"),
    ];

    let age = (now - then).num_seconds().abs();
    if (age as f64) < 60.0 * 1.9 {
        return format!("{} second{}", age, plural(age));
    }
    for (size, unit) in UNITS {
        let ratio = age as f64 / size as f64;
        if ratio >= 1.9 {
            let count = ratio.round() as i64;
            return format!("{} {}{}", count, unit, plural(count));
        }
    }
    String::new()
}

fn plural(count: i64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
