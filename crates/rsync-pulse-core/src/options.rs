use crate::error::Error;

/// Separator appended to directory paths so rsync copies their contents
/// rather than the directory itself.
pub const PATH_SEPARATOR: char = '/';

/// User-chosen paths and flags for one run.
///
/// Both paths are validated and normalized on construction, and the value
/// cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    source_path: String,
    dest_path: String,
    dry_run: bool,
    delete: bool,
}

impl SyncOptions {
    pub fn new(
        source_path: impl Into<String>,
        dest_path: impl Into<String>,
        dry_run: bool,
        delete: bool,
    ) -> Result<Self, Error> {
        let source_path = source_path.into();
        let dest_path = dest_path.into();

        if source_path.trim().is_empty() || dest_path.trim().is_empty() {
            return Err(Error::Config(
                "Please select both source and destination folders".to_string(),
            ));
        }

        Ok(Self {
            source_path: normalize_dir(&source_path),
            dest_path: normalize_dir(&dest_path),
            dry_run,
            delete,
        })
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn dest_path(&self) -> &str {
        &self.dest_path
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn delete(&self) -> bool {
        self.delete
    }
}

/// Append a trailing separator unless one is already there.
pub fn normalize_dir(path: &str) -> String {
    if path.ends_with(PATH_SEPARATOR) || path.ends_with(std::path::MAIN_SEPARATOR) {
        path.to_string()
    } else {
        format!("{}{}", path, PATH_SEPARATOR)
    }
}
