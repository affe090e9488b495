//! Breadcrumb header shown above discussion pages.

use askama::Template;

use crate::error::Result;
use crate::model::{Forum, Topic};

pub struct Crumb {
    pub label: String,
    pub href: String,
}

#[derive(Template)]
#[template(path = "nav.html")]
struct Nav {
    crumbs: Vec<Crumb>,
}

/// Links to the ancestors of the current page: Forum Index, then the forum when a
/// topic is shown, then the topic when a single reply is addressed. The index page
/// itself gets no breadcrumbs.
pub fn breadcrumbs(href: &str, forum: Option<&Forum>, topic: Option<&Topic>, message: bool) -> Vec<Crumb> {
    let mut crumbs = Vec::new();
    let Some(forum) = forum else {
        return crumbs;
    };
    crumbs.push(Crumb {
        label: "Forum Index".to_string(),
        href: href.to_string(),
    });
    if let Some(topic) = topic {
        crumbs.push(Crumb {
            label: forum.subject.clone(),
            href: format!("{}/{}", href, forum.id),
        });
        if message {
            crumbs.push(Crumb {
                label: topic.subject.clone(),
                href: format!("{}/{}/{}", href, forum.id, topic.id),
            });
        }
    }
    crumbs
}

pub fn render_nav(crumbs: Vec<Crumb>) -> Result<String> {
    if crumbs.is_empty() {
        return Ok(String::new());
    }
    Ok(Nav { crumbs }.render()?)
}
