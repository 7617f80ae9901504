// Save values to JSON files (atomic or in place, optionally owner-only) and load them back.
use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tempfile::Builder;
use tracing::{debug, error, warn};

use crate::core::encode::{EncodeError, Encoder, JsonEncoder};
use crate::core::error::{Error, ErrorKind};
use crate::core::fault::{SerializationFault, find_paths_unserializable_data_with};
use crate::core::value::StoredValue;
use crate::json::parse;

const PRIVATE_MODE: u32 = 0o600;
const SHARED_MODE: u32 = 0o644;

#[derive(Clone, Debug)]
pub struct SaveOptions<E = JsonEncoder> {
    private: bool,
    atomic: bool,
    encoder: E,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            private: false,
            atomic: true,
            encoder: JsonEncoder::default(),
        }
    }
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: Encoder> SaveOptions<E> {
    /// Owner-only permission bits on the written file.
    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    /// Write through a temp file and rename it over the destination.
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn encoder<F: Encoder>(self, encoder: F) -> SaveOptions<F> {
        SaveOptions {
            private: self.private,
            atomic: self.atomic,
            encoder,
        }
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    fn mode(&self) -> u32 {
        if self.private { PRIVATE_MODE } else { SHARED_MODE }
    }
}

pub fn save_json<E: Encoder>(
    path: impl AsRef<Path>,
    value: &StoredValue,
    options: &SaveOptions<E>,
) -> Result<(), Error> {
    let path = path.as_ref();
    let text = match options.encoder.encode(value) {
        Ok(text) => text,
        Err(err) => return Err(serialization_error(path, value, &options.encoder, err)),
    };

    if options.atomic {
        write_atomic(path, text.as_bytes(), options.mode())?;
    } else {
        write_in_place(path, text.as_bytes(), options.private)?;
    }
    debug!(
        path = %path.display(),
        bytes = text.len(),
        atomic = options.atomic,
        private = options.private,
        "saved json"
    );
    Ok(())
}

fn serialization_error<E: Encoder>(
    path: &Path,
    value: &StoredValue,
    encoder: &E,
    cause: EncodeError,
) -> Error {
    let mut faults =
        find_paths_unserializable_data_with(value, |candidate| encoder.encode(candidate));
    if faults.is_empty() {
        faults = SerializationFault::root(value.clone());
    }
    let message = format!(
        "Failed to serialize to JSON: {}. Bad data at {faults}",
        path.display()
    );
    error!(path = %path.display(), faults = %faults, "{message}");
    Error::new(ErrorKind::Serialization)
        .with_message(message)
        .with_path(path)
        .with_faults(faults)
        .with_source(cause)
}

fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let prefix = format!(".{file_name}.");
    let mut builder = Builder::new();
    builder.prefix(&prefix).suffix(".tmp");
    set_builder_mode(&mut builder, mode);
    let mut temp = builder
        .tempfile_in(dir)
        .map_err(|err| Error::from_io(err, path).with_message("failed to create temp file"))?;

    // The temp file is removed when `temp` drops on any early return.
    temp.write_all(contents)
        .and_then(|()| temp.flush())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|err| Error::from_io(err, path).with_message("failed to write temp file"))?;

    temp.persist(path).map_err(|err| {
        let temp_path = err.file.path().to_path_buf();
        if let Err(cleanup) = err.file.close() {
            warn!(
                temp = %temp_path.display(),
                path = %path.display(),
                error = %cleanup,
                "temp file cleanup failed"
            );
        }
        Error::from_io(err.error, path).with_message("failed to replace file")
    })?;

    sync_dir(dir);
    Ok(())
}

fn write_in_place(path: &Path, contents: &[u8], private: bool) -> Result<(), Error> {
    let mut file = open_for_write(path, private)
        .map_err(|err| Error::from_io(err, path).with_message("failed to open file"))?;
    if private {
        restrict_to_owner(&file).map_err(|err| {
            Error::from_io(err, path).with_message("failed to restrict permissions")
        })?;
    }
    // Truncate only once the permissions are settled.
    file.set_len(0)
        .and_then(|()| file.write_all(contents))
        .and_then(|()| file.flush())
        .map_err(|err| Error::from_io(err, path).with_message("failed to write file"))
}

#[cfg(unix)]
fn open_for_write(path: &Path, private: bool) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(if private { PRIVATE_MODE } else { SHARED_MODE })
        .open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _private: bool) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}

#[cfg(unix)]
fn set_builder_mode(builder: &mut Builder<'_, '_>, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    builder.permissions(Permissions::from_mode(mode));
}

#[cfg(not(unix))]
fn set_builder_mode(_builder: &mut Builder<'_, '_>, _mode: u32) {}

// Existing files keep their bits when opened, so force them on the handle.
#[cfg(unix)]
fn restrict_to_owner(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(Permissions::from_mode(PRIVATE_MODE))
}

#[cfg(not(unix))]
fn restrict_to_owner(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(err) = File::open(dir).and_then(|handle| handle.sync_all()) {
        debug!(dir = %dir.display(), error = %err, "directory sync skipped");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

pub fn load_json(path: impl AsRef<Path>) -> Result<Value, Error> {
    load_json_as(path)
}

/// Like `load_json`, but a missing file yields `default`.
pub fn load_json_or(path: impl AsRef<Path>, default: Value) -> Result<Value, Error> {
    match load_json(path) {
        Err(err) if err.is_not_found() => Ok(default),
        other => other,
    }
}

pub fn load_json_as<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, Error> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "json file not found");
            return Err(Error::from_io(err, path).with_message("file not found"));
        }
        Err(err) => {
            return Err(Error::from_io(err, path).with_message("failed to read file"));
        }
    };

    parse::from_slice(&bytes).map_err(|err| {
        error!(path = %path.display(), error = %err, "could not parse json content");
        Error::new(ErrorKind::Corrupt)
            .with_message("invalid JSON content")
            .with_hint(parse::hint_for_error(&err, "load"))
            .with_path(path)
            .with_source(err)
    })
}
