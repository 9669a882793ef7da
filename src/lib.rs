//! SOC Dashboard - A security feed dashboard
//!
//! This crate serves a single-page dashboard that shows the latest entries
//! from a security news feed and a government alert feed. Feeds are fetched
//! on demand for every `/api/updates` request; nothing is cached or stored.

pub mod config;
pub mod fetcher;
pub mod routes;
