use std::fmt;

/// rsync progress and summary lines that never describe a single file.
const IGNORED_MARKERS: [&str; 6] = [
    "building file list",
    "files to consider",
    "total size is",
    "incremental file list",
    "bytes/sec",
    "to-check=",
];

const SUMMARY_PREFIXES: [&str; 2] = ["sent ", "received "];

const ACTION_PREFIXES: [(&str, FileAction); 3] = [
    ("sending ", FileAction::Sending),
    ("deleting ", FileAction::Deleting),
    ("receiving ", FileAction::Receiving),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileAction {
    Sending,
    Receiving,
    Deleting,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::Sending => "sending",
            FileAction::Receiving => "receiving",
            FileAction::Deleting => "deleting",
        }
    }

    pub fn is_destructive(&self) -> bool {
        matches!(self, FileAction::Deleting)
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file action reported by rsync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    action: FileAction,
    path: String,
}

impl FileEvent {
    pub fn new(action: FileAction, path: impl Into<String>) -> Self {
        Self {
            action,
            path: path.into(),
        }
    }

    pub fn action(&self) -> FileAction {
        self.action
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.path)
    }
}

/// Map one raw output line to a file event, or `None` for lines that are
/// not about a file.
///
/// Checks run in a fixed order: known rsync status markers are excluded
/// first, then explicit action prefixes, and anything left is a bare path
/// that rsync is sending.
pub fn classify(raw_line: &str) -> Option<FileEvent> {
    let line = raw_line.strip_suffix('\n').unwrap_or(raw_line);

    if line.is_empty() || is_status_line(line) {
        return None;
    }

    let (action, path) = ACTION_PREFIXES
        .iter()
        .find_map(|(prefix, action)| line.strip_prefix(prefix).map(|rest| (*action, rest)))
        .unwrap_or((FileAction::Sending, line));

    let path = path.trim();
    if path.is_empty() {
        return None;
    }

    Some(FileEvent::new(action, path))
}

fn is_status_line(line: &str) -> bool {
    IGNORED_MARKERS.iter().any(|marker| line.contains(marker))
        || SUMMARY_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_actions() {
        assert_eq!(
            classify("sending foo/bar.txt\n"),
            Some(FileEvent::new(FileAction::Sending, "foo/bar.txt"))
        );
        assert_eq!(
            classify("deleting old/file\n"),
            Some(FileEvent::new(FileAction::Deleting, "old/file"))
        );
        assert_eq!(
            classify("receiving data.bin\n"),
            Some(FileEvent::new(FileAction::Receiving, "data.bin"))
        );
    }

    #[test]
    fn test_bare_path_defaults_to_sending() {
        assert_eq!(
            classify("bare-file.txt\n"),
            Some(FileEvent::new(FileAction::Sending, "bare-file.txt"))
        );
        assert_eq!(
            classify("photos/2024/IMG 0001.jpg"),
            Some(FileEvent::new(FileAction::Sending, "photos/2024/IMG 0001.jpg"))
        );
    }

    #[test]
    fn test_summary_and_progress_lines_are_ignored() {
        let lines = [
            "sent 1,234 bytes  received 56 bytes  789.01 bytes/sec\n",
            "total size is 10,240  speedup is 7.94\n",
            "sending incremental file list\n",
            "building file list ... done\n",
            "12 files to consider\n",
            "    1,024 100%    0.00kB/s    0:00:00 (xfr#1, to-check=3/5)\n",
            "sent 88 bytes\n",
            "received 12 bytes\n",
        ];
        for line in lines {
            assert_eq!(classify(line), None, "expected {:?} to be ignored", line);
        }
    }

    #[test]
    fn test_empty_lines_are_ignored() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("\n"), None);
        assert_eq!(classify("   \n"), None);
        assert_eq!(classify("\r\n"), None);
    }

    #[test]
    fn test_classification_is_case_sensitive() {
        assert_eq!(
            classify("Deleting report.pdf\n"),
            Some(FileEvent::new(FileAction::Sending, "Deleting report.pdf"))
        );
    }

    #[test]
    fn test_path_is_trimmed_but_inner_whitespace_kept() {
        assert_eq!(
            classify("deleting   my  notes.txt  \r\n"),
            Some(FileEvent::new(FileAction::Deleting, "my  notes.txt"))
        );
    }

    #[test]
    fn test_status_display() {
        let event = FileEvent::new(FileAction::Deleting, "old/file");
        assert_eq!(event.to_string(), "deleting: old/file");
        assert!(event.action().is_destructive());
        assert!(!FileAction::Receiving.is_destructive());
    }
}
