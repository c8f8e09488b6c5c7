//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Value Objects: generation requests, story drafts, scene chunks,
//!   generated assets, retry policies
//! - Typed identifiers for sessions, experiences and assets

pub mod value_objects;
