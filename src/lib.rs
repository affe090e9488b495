//! # Discussion - Forum Views for a Project-Tracker Discussion Board
//!
//! Renders the HTML fragments of a discussion forum embedded in a host
//! application: forum lists, paginated topic lists, threaded replies and the
//! administration forms for forums and forum groups. A thin request layer resolves
//! what a request asks for, checks it against the viewer's capabilities, applies
//! mutations to a JSON-backed board and renders the resulting page.
//!
//! ## Features
//!
//! - **Threaded replies**: recursive tree rendering with inline reply, quote, edit
//!   and preview forms, plus flat newer-first and older-first layouts.
//! - **Sortable listings**: every column header re-issues the listing with flipped
//!   `order`/`asc` parameters; topic lists are paginated.
//! - **Capability-gated controls**: `view`, `append`, `moderate` and `admin`
//!   decide which links and buttons appear; forum moderators may edit any post.
//! - **Forum groups**: group selector and column appear once a real group exists.
//! - **Search and timeline**: keyword search with excerpts, board activity by
//!   time window, notification recipients per topic.
//! - **Wiki links**: `forum:`, `topic:` and `message:` targets render as titled
//!   anchors; dangling ones are marked missing.
//! - **Atomic board file**: locked temp-file-and-rename saves.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use discussion::acl::Capabilities;
//! use discussion::config::Config;
//! use discussion::handler::{handle, Request, Response, Session};
//! use discussion::storage::Board;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let path = std::path::Path::new(&config.storage.board_file);
//!     let mut board = Board::load(path).await?;
//!
//!     let request = Request::new("/discussion/2/1", "", "alice", Capabilities::parse_list("view,append")?);
//!     if let Response::Page(page) = handle(&mut board, &config.discussion, &mut Session::default(), &request)? {
//!         println!("{}", page.html);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`render`] - HTML views (thread, listings, admin forms, pages, breadcrumbs)
//! - [`handler`] - request handling: modes, permissions, form state, mutations
//! - [`dispatch`] - URL routing and request-mode resolution
//! - [`request`] - UI actions, sort keys, pagination and query parsing
//! - [`acl`] - capabilities and control-visibility predicates
//! - [`model`] - entities and reply-tree assembly
//! - [`storage`] - JSON-backed board with cascading mutations
//! - [`config`] - configuration management
//! - [`validation`] - submitted form field checks

pub mod acl;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod logutil;
pub mod model;
pub mod render;
pub mod request;
pub mod storage;
pub mod validation;
