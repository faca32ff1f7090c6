//! Persistence for drill content and progress records.
//!
//! The repository traits in [`repository`] are the only surface the
//! service layer sees; [`sqlite`] provides the durable backend and
//! [`repository::InMemoryRepository`] backs tests and offline runs.

#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;
