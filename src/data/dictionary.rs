use std::path::Path;

/// Read a user-editable dictionary file: one entry per line, surrounding
/// whitespace stripped, blank lines dropped.
///
/// Returns `None` when the file cannot be read. Callers decide what the
/// fallback is; a missing dictionary is never fatal.
pub fn read_entries(path: &Path) -> Option<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Err(e) => {
            log::warn!("Cannot read dictionary {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn strips_lines_and_skips_blanks() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "EX\r\n  X \n\n\t\nLocalX").unwrap();

        let entries = read_entries(file.path()).unwrap();
        assert_eq!(entries, vec!["EX", "X", "LocalX"]);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_entries(&dir.path().join("absent.txt")).is_none());
    }
}
