use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;

use crate::Result;
use crate::StorageError;

/// Opens `path` for appending, creating it and its parent directories.
pub fn open_file_for_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::PathError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| {
            StorageError::PathError {
                path: path.to_path_buf(),
                source: e,
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_open_file_for_append_creates_parents_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/nested/service.log");

        open_file_for_append(&path).unwrap().write_all(b"a").unwrap();
        open_file_for_append(&path).unwrap().write_all(b"b").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ab");
    }
}
