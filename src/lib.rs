//! Yelp Dataset Explorer Library
//!
//! This library provides the client side of the Yelp dataset explorer: a typed
//! gateway over the REST backend and a reusable paginated list controller that
//! every list view (businesses, reviews, users, tips, check-ins) is built on.
//!
//! # Modules
//!
//! - `config`: Configuration management and base URL resolution.
//! - `controller`: Paginated list state machine.
//! - `errors`: Gateway error taxonomy.
//! - `gateway_client`: REST backend client.
//! - `models`: Records and pagination types.
//! - `post_filter`: Client-side filters over loaded records.
//! - `query`: Per-view filters and their endpoints.
//! - `render`: Plain-text rendering for the command-line views.
//! - `retry`: Retry policy for transient failures.

pub mod config;
pub mod controller;
pub mod errors;
pub mod gateway_client;
pub mod models;
pub mod post_filter;
pub mod query;
pub mod render;
pub mod retry;
