//! Local persistence of composed contracts.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::clock::Clock;
use crate::error::ContractError;
use crate::model::ContractKind;

/// `<kind>_contract_<unix millis>.pdf`, e.g. `loan_contract_1792195200000.pdf`.
pub fn contract_file_name(kind: ContractKind, clock: &dyn Clock) -> String {
    format!(
        "{}_contract_{}.pdf",
        kind.file_stem(),
        clock.now().timestamp_millis()
    )
}

/// Write `bytes` to `dir/file_name` and confirm the file exists afterwards.
pub fn save_contract(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ContractError> {
    let path = dir.join(file_name);
    let io_err = |source: std::io::Error| ContractError::Io {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(|source| ContractError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    fs::write(&path, bytes).map_err(io_err)?;

    // A write that reported success but left nothing behind is still a failure.
    let written = fs::metadata(&path).map_err(io_err)?;
    if !written.is_file() {
        return Err(io_err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file missing after write",
        )));
    }

    info!("Saved contract to {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Save to an explicit path, with the same directory creation and re-check
/// as `save_contract`.
pub fn save_contract_as(path: &Path, bytes: &[u8]) -> Result<PathBuf, ContractError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ContractError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
        })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    save_contract(dir, file_name, bytes)
}
