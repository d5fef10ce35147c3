//! DTOs for coordinator communication

pub mod job;
pub mod output;
