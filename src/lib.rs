//! Cartolina: the share-card service of the Vetrina marketplace.
//!
//! Caches expensive-to-render social preview images behind a
//! fingerprint-checked metadata store and content-addressed blob storage,
//! and serves them as cheap HTTP redirects.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
