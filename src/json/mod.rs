//! Purpose: Internal JSON parsing boundary shared by loading callsites.
//! Exports: `parse` module with decode and failure-classification helpers.
//! Role: Single seam for parser details so callsites avoid ad hoc decode logic.
//! Invariants: Document decoding goes through this module.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
