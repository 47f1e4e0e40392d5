//! Page objects for the Explora UI
//!
//! Modules of free functions over a [`Session`](crate::session::Session),
//! one per surface: account flows, the exploration editor, and the
//! learner-facing player. Selectors use the platform's `e2e-test-*`
//! class vocabulary.

pub mod accounts;
pub mod editor;
pub mod player;
