//! Section planning for the training platform's course catalog.
//!
//! Wraps the course and section services, checks a proposed section against
//! the course's remaining duration, and serves the "add section" form to the
//! admin UI.
pub mod catalog;
pub mod config;
pub mod section_form;
pub mod server;
pub mod types;
