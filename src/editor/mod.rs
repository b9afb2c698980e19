//! Documentation editor: a web front-end over a generated site.
//!
//! ## Overview
//!
//! A static site generator turns source documents in a version-controlled
//! content root into HTML. The editor shows the generated pages, finds the
//! source behind each page, and on save writes the source, regenerates the
//! site and commits the change.
//!
//! ## Module Map
//!
//! ```text
//! ┌─────────┐  HTTP  ┌────────────────────────────────────────────────────┐
//! │ Browser │ ─────> │  server.rs  (axum Router, cache + trace layers)    │
//! │         │ <───── │    └─ api.rs  (handlers, AppState)                  │
//! └─────────┘        │         │                 │                        │
//!                    │         │ locate_source() │ save() / update()      │
//!                    │         v                 v                        │
//!                    │  locate.rs           workflow.rs                    │
//!                    │  (SourceLocator)     (Workflow, RegenKind)          │
//!                    │                           │                        │
//!                    │                           │ CommandRunner::run()   │
//!                    │                           v                        │
//!                    │                      runner.rs  (ShellRunner)       │
//!                    └────────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module     | Responsibility                                          |
//! |------------|---------------------------------------------------------|
//! | `referer`  | Module name from a referring URL                        |
//! | `vcs`      | Command lines for Mercurial or Git                      |
//! | `session`  | Signed session cookie, last author, flash notices       |
//! | `pages`    | maud templates for viewer, editor and not-found pages   |
//! | `preview`  | Source → HTML conversion through an external converter  |
//!
//! ## Typical Request Flow (save an edit)
//!
//! 1. `POST /_editor/<page>` → `api::handle_editor_save()`
//! 2. `SourceLocator::locate_source()` maps the page to its source file.
//! 3. `Workflow::save()` validates the author, writes the file, checks the
//!    VCS reports it modified, pulls, applies the pull (conflicts are fatal),
//!    regenerates, commits and optionally pushes.
//! 4. Success redirects to the viewer with a notice; failure re-renders the
//!    form with the submitted text and the first line of the error.
//!
//! Concurrent saves against one working copy are not serialized here; the
//! VCS tool's own locking is all there is.

pub mod api;
pub mod locate;
pub mod pages;
pub mod preview;
pub mod referer;
pub mod runner;
pub mod server;
pub mod session;
pub mod vcs;
pub mod workflow;
