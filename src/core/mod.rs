//! core
//!
//! Core domain types, configuration and repository-level plumbing.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RefName
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for git-rewrite storage
//! - [`lock`] - Exclusive repository lock
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod lock;
pub mod paths;
pub mod types;
