//! Core domain logic for Infraroute
//!
//! This crate contains the domain values (source metadata, filters, query
//! plans), configuration types, and the error taxonomy shared by discovery,
//! the registry and the router.

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::{InfrarouteError, Result};
