pub mod adapter;
pub mod codec;
pub mod error;
pub mod form;
pub mod model;
pub mod session;
pub mod settings;
pub mod value;

pub use codec::{label, normalize_key, parse_free_text_list, parse_key, FreeTextValues};
pub use error::CoreError;
pub use value::{NormalizedKey, TypedValue, ValueKind, WireValue};

use std::fs;
use std::path::{Path, PathBuf};

// --- Storage ---

/// Resolve the ruledesk data directory (~/.ruledesk/).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ruledesk")
}

/// Write a file via temp file + rename so readers never observe a partial write.
pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.tmp", name));
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("file.json");
        write_atomic(&path, "one").unwrap();
        write_atomic(&path, "two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert!(!dir.path().join("nested").join(".file.json.tmp").exists());
    }
}
