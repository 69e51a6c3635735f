//! Core types and utilities for the taskgate auth gateway.
//!
//! This crate provides the foundational types shared by the identity
//! provider abstraction and the HTTP server: the error `Result` alias and
//! the request-scoped bearer credential.

pub mod credential;
pub mod error;

pub use credential::BearerCredential;
pub use error::Result;
