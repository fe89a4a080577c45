//! services/api/src/lib.rs
//!
//! The library crate for the API service: configuration, errors, the
//! concrete port adapters, the PDF report renderer, and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod report;
pub mod web;
