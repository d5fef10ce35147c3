//! Domain types
//!
//! Core entities for job processing. The engine treats these as read-only
//! once claimed; only the terminal status/activity are decided locally.

pub mod job;
