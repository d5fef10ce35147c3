//! Quern Core
//!
//! Core types shared between the engine and the coordinator client.
//!
//! This crate contains:
//! - Domain types: the claimed Job and its input/output descriptors
//! - DTOs: request/response bodies exchanged with the coordinator

pub mod domain;
pub mod dto;
