//! `companies-core`: domain building blocks for the companies service.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod company;
pub mod error;
pub mod id;

pub use company::{Company, CompanyDraft};
pub use error::DomainError;
pub use id::CompanyId;
