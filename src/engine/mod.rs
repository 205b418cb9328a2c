//! The template-merge engine: placeholder resolution, snippet extraction,
//! target location, marker management, smart merge, and action dispatch.
//!
//! Every function in here is a pure string-to-string transform; filesystem
//! concerns live in the materializer.

pub mod actions;
pub mod case;
pub mod locate;
pub mod marker;
pub mod merge;
pub mod placeholder;
pub mod snippet;
