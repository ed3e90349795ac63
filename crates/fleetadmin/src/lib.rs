//! fleetadmin: a keyboard-first fleet-management console for the terminal.
//!
//! The heavy lifting (filtering, sorting, pagination, optimistic CRUD with
//! rollback) lives in the `grid-engine` crate; this crate hosts it: entity
//! schemas, the record-store seam to the REST backend, configuration, and
//! the ratatui front end.

pub mod app;
pub mod config;
pub mod schema;
pub mod service;
pub mod ui;
pub mod util;
