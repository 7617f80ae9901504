// Core modules implementing the value model, encoding, fault location, and persistence.
pub mod encode;
pub mod error;
pub mod fault;
pub mod persist;
pub mod value;
