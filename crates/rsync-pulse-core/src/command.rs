use crate::options::{normalize_dir, SyncOptions};
use std::fmt;

pub const DEFAULT_PROGRAM: &str = "rsync";

const ARCHIVE_VERBOSE_FLAG: &str = "-av";
const DRY_RUN_FLAG: &str = "--dry-run";
const DELETE_FLAG: &str = "--delete";

/// Build the rsync argument vector for `options`.
///
/// The result is `-av [--dry-run] [--delete] <source> <dest>`. Each path is a
/// single argument, so spaces and shell metacharacters reach rsync untouched.
pub fn build(options: &SyncOptions) -> Vec<String> {
    let mut args = vec![ARCHIVE_VERBOSE_FLAG.to_string()];
    if options.dry_run() {
        args.push(DRY_RUN_FLAG.to_string());
    }
    if options.delete() {
        args.push(DELETE_FLAG.to_string());
    }
    args.push(normalize_dir(options.source_path()));
    args.push(normalize_dir(options.dest_path()));
    args
}

/// Program plus arguments for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SyncCommand {
    pub fn new(options: &SyncOptions) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: build(options),
        }
    }

    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(|s| s.as_str()))
            .collect()
    }
}

// Display only; the process is always spawned from the vector.
impl fmt::Display for SyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dry_run: bool, delete: bool) -> SyncOptions {
        SyncOptions::new("/home/user/docs", "/mnt/backup", dry_run, delete).unwrap()
    }

    #[test]
    fn test_build_base_flags_only() {
        assert_eq!(
            build(&options(false, false)),
            vec!["-av", "/home/user/docs/", "/mnt/backup/"]
        );
    }

    #[test]
    fn test_build_flag_order_is_fixed() {
        assert_eq!(
            build(&options(true, true)),
            vec!["-av", "--dry-run", "--delete", "/home/user/docs/", "/mnt/backup/"]
        );
        assert_eq!(
            build(&options(false, true)),
            vec!["-av", "--delete", "/home/user/docs/", "/mnt/backup/"]
        );
    }

    #[test]
    fn test_build_paths_end_with_exactly_one_separator() {
        for (source, dest) in [("/a", "/b"), ("/a/", "/b/"), ("dir with space", "x;rm -rf")] {
            let args = build(&SyncOptions::new(source, dest, false, false).unwrap());
            let paths = &args[args.len() - 2..];
            for path in paths {
                assert!(path.ends_with('/'));
                assert!(!path.ends_with("//"));
            }
        }
    }

    #[test]
    fn test_paths_stay_single_arguments() {
        let options = SyncOptions::new("my photos", "$(whoami)", false, false).unwrap();
        let command = SyncCommand::new(&options);
        assert_eq!(command.args.len(), 3);
        assert_eq!(command.args[1], "my photos/");
        assert_eq!(command.args[2], "$(whoami)/");
    }

    #[test]
    fn test_argv_starts_with_program() {
        let command = SyncCommand::new(&options(true, false)).with_program("/usr/local/bin/rsync");
        assert_eq!(
            command.argv(),
            vec!["/usr/local/bin/rsync", "-av", "--dry-run", "/home/user/docs/", "/mnt/backup/"]
        );
        assert_eq!(
            command.to_string(),
            "/usr/local/bin/rsync -av --dry-run /home/user/docs/ /mnt/backup/"
        );
    }
}
