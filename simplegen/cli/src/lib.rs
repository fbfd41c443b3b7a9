//! Bundled directives for the `simplegen` command line tool.
//!
//! The binary registers everything in [`directives::registry`]; the module is
//! public so other harnesses can reuse or extend the same set.

pub mod directives;
