use std::path::Path;

use crate::utils;

#[derive(Debug)]
pub enum ClassPathError {
    /// No classpath entry holds the class file.
    NotFound(String),
    /// Reading a candidate file failed. This aborts the whole lookup: a
    /// broken entry masks hits on later entries. Suspected source bug, kept
    /// as-is; see DESIGN.md.
    Io(String, std::io::Error),
}

/// Ordered classpath over existing directories. Configured once at startup;
/// the Java Class Library root always sits last.
pub struct ClassPath {
    entries: Vec<String>,
}

impl ClassPath {
    pub fn new(jcl_path: &str, user_class_path: &str) -> ClassPath {
        let mut entries = Vec::new();
        for raw in user_class_path.split(utils::get_class_path_separator()) {
            if let Some(entry) = Self::normalize_entry(raw) {
                entries.push(entry);
            }
        }
        if let Some(entry) = Self::normalize_entry(jcl_path) {
            entries.push(entry);
        }
        log::debug!("class path: {:?}", entries);
        return ClassPath { entries };
    }

    /// Keeps only entries that exist as directories, each normalized to end
    /// with the file separator so that file names concatenate directly.
    fn normalize_entry(raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }
        let mut entry = raw.to_string();
        let sep = utils::get_file_separator();
        if !entry.ends_with(sep) {
            entry.push(sep);
        }
        if !Path::new(&entry).is_dir() {
            log::debug!("dropping non-existent class path entry {}", entry);
            return None;
        }
        return Some(entry);
    }

    pub fn entries(&self) -> &[String] {
        return &self.entries;
    }

    /// Finds the class bytes for an internal name (`Ljava/lang/Object;`) by
    /// probing entries in order. Exactly one of the callbacks is invoked,
    /// exactly once: `on_bytes` with the first hit, or `on_failure` with
    /// either the first I/O error or a not-found.
    pub fn read_class<S, F>(&self, internal_name: &str, on_bytes: S, on_failure: F)
    where
        S: FnOnce(Vec<u8>),
        F: FnOnce(ClassPathError),
    {
        let binary_name = strip_internal_name(internal_name);
        for entry in &self.entries {
            let file_name = format!("{}{}.class", entry, binary_name);
            match std::fs::read(&file_name) {
                Ok(bytes) => {
                    log::trace!("read_class {} from {}", binary_name, file_name);
                    on_bytes(bytes);
                    return;
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    on_failure(ClassPathError::Io(file_name, err));
                    return;
                }
            }
        }
        on_failure(ClassPathError::NotFound(binary_name.to_string()));
    }
}

/// `Ljava/lang/Object;` -> `java/lang/Object`.
fn strip_internal_name(internal_name: &str) -> &str {
    if internal_name.starts_with('L') && internal_name.ends_with(';') {
        return &internal_name[1..internal_name.len() - 1];
    }
    return internal_name;
}
