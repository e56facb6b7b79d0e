//! Integration Pulse Library
//!
//! Fetches, caches and normalizes the workforce-risk data behind the
//! Integration Pulse dashboard, and derives its headline figures, departure
//! scenarios, regrettable loss ranking and action list.

pub mod actions;
pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod scenario;
pub mod snapshot;
pub mod summary;
pub mod talent;
