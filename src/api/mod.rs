//! Purpose: Define the stable public Rust API boundary for jsonstore.
//! Exports: Value model, encoders, fault locator, save/load operations, and errors.
//! Role: Public, additive-only surface over the core modules.
//! Invariants: Callers can save, load, and diagnose values using only this module.

pub use crate::core::encode::{EncodeError, Encoder, JsonEncoder, MAX_DEPTH, extended_fallback};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::fault::{
    ROOT_PATH, SerializationFault, find_paths_unserializable_data,
    find_paths_unserializable_data_with,
};
pub use crate::core::persist::{SaveOptions, load_json, load_json_as, load_json_or, save_json};
pub use crate::core::value::{AsDict, Mapping, Object, StoredValue};
