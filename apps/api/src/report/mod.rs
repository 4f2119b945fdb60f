//! The milestone report engine: label classification, compliance and overdue
//! evaluation, issue aggregation, history, and report assembly.
//!
//! Everything below `builder` is a pure fold over already-fetched data; all
//! tracker and LLM traffic goes through the collaborator traits the builder
//! is handed.

pub mod aggregate;
pub mod builder;
pub mod classify;
pub mod compliance;
pub mod handlers;
pub mod history;
pub mod overdue;
