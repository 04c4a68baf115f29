//! The client only writes the log sections its own `log.config` enables.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::ConfigError;

/// Log sections the parsers read.
pub const REQUIRED_SECTIONS: &[&str] = &["Power", "Zone"];

const SECTION_SETTINGS: &str = "LogLevel=1\nFilePrinting=true\nConsolePrinting=false\nScreenPrinting=false\nVerbose=true\n";

/// Sections from [`REQUIRED_SECTIONS`] that `contents` does not declare.
pub fn missing_sections(contents: &str) -> Vec<&'static str> {
    REQUIRED_SECTIONS
        .iter()
        .copied()
        .filter(|name| {
            !contents
                .lines()
                .filter_map(|line| line.trim().strip_prefix('[')?.strip_suffix(']'))
                .any(|header| header.trim().eq_ignore_ascii_case(name))
        })
        .collect()
}

/// Append any missing sections to the client configuration, creating the
/// file if needed. Existing sections are left untouched. Returns the
/// sections that were added.
pub fn ensure_log_config(path: &Path) -> Result<Vec<&'static str>, ConfigError> {
    let io = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => return Err(io(err)),
    };

    let missing = missing_sections(&contents);
    if missing.is_empty() {
        tracing::debug!(path = %path.display(), "client log config already complete");
        return Ok(missing);
    }

    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    for name in &missing {
        contents.push_str(&format!("[{name}]\n{SECTION_SETTINGS}"));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(path, contents).map_err(io)?;
    tracing::info!(path = %path.display(), sections = ?missing, "enabled client logging");
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Blizzard").join("log.config");

        assert_eq!(ensure_log_config(&path).unwrap(), vec!["Power", "Zone"]);
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("[Power]\nLogLevel=1"));
        assert!(written.contains("[Zone]\n"));
        assert!(missing_sections(&written).is_empty());
    }

    #[test]
    fn keeps_existing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.config");
        fs::write(&path, "[Achievements]\nLogLevel=1\n[ power ]\nVerbose=false").unwrap();

        assert_eq!(ensure_log_config(&path).unwrap(), vec!["Zone"]);
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[Achievements]\nLogLevel=1\n[ power ]\nVerbose=false\n[Zone]\n"));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.config");
        ensure_log_config(&path).unwrap();
        let first = fs::read_to_string(&path).unwrap();

        assert!(ensure_log_config(&path).unwrap().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }
}
