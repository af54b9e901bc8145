//! Core types for the Motus registry.
//!
//! This crate defines the entity records stored by the registry (departments,
//! agents, workflows), the inputs accepted by the registry's `add_*`
//! operations, the shared configuration struct, and small naming utilities
//! used by both the template renderer and the integration injector.

pub mod config;
pub mod entity;
pub mod naming;
pub mod report;

pub use report::ValidationReport;
