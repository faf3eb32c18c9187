//! Incident Report Client
//!
//! Client library and terminal front end for an incident-tracking REST
//! service: debounced search, a de-duplicating read cache with
//! stale-while-revalidate, invalidating writes, and list/pagination state.

pub mod cli;
pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod list;
pub mod models;
pub mod service;
pub mod state;

pub use error::{AppError, Result};
