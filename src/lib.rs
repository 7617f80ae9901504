//! Purpose: Shared library crate used by the `jsonstore` CLI and tests.
//! Exports: `api` (stable surface), `core` (values, encoding, faults, persistence), `notice`.
//! Role: Save values as JSON files, load them back, and explain why a value cannot be saved.
//! Invariants: Saved files are complete documents; readers never see partial atomic writes.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
mod json;
pub mod notice;
