//! Ghostwriter: persona-driven article generation.
//!
//! A request names a persona, a topic, keywords, a target length and a
//! model. The pipeline optionally searches the web, extracts (and
//! optionally summarizes) the hits into context documents, assembles a
//! prompt and sends it to the selected generation backend.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod logging;

pub mod persona;
pub mod prompt;
pub mod providers;

pub mod extract;
pub mod search;
pub mod summarize;

pub mod articles;
pub mod pipeline;
