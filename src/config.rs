use crate::Cli;
use crate::scanner::ScanOptions;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Interactive,
    /// List the inventory, delete nothing.
    DryRun,
    /// Purge every entry without asking.
    Unattended,
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub scan: ScanOptions,
    pub preselect: bool,
    pub mode: RunMode,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Self {
        let mode = if cli.dry_run {
            RunMode::DryRun
        } else if cli.yes {
            RunMode::Unattended
        } else {
            RunMode::Interactive
        };

        Self {
            root: expand_home(&cli.root),
            scan: ScanOptions {
                skip_empty_dirs: cli.skip_empty,
            },
            preselect: cli.select_all,
            mode,
            log_file: cli.log_file,
            log_level: cli.log_level,
        }
    }
}

/// Expands a leading `~` to the home directory. Anything else, including
/// `~user`, is returned untouched.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    let Some(home) = dirs::home_dir() else {
        return path.to_path_buf();
    };

    if rest.as_os_str().is_empty() {
        home
    } else {
        home.join(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Config {
        let cli = Cli::try_parse_from(std::iter::once("cachesweep").chain(args.iter().copied()))
            .unwrap();
        Config::from_cli(cli)
    }

    #[test]
    fn test_expand_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home(Path::new("~")), home);
        assert_eq!(expand_home(Path::new("~/.cache/pip")), home.join(".cache/pip"));
    }

    #[test]
    fn test_expand_home_leaves_other_paths() {
        assert_eq!(expand_home(Path::new("/var/cache")), PathBuf::from("/var/cache"));
        assert_eq!(expand_home(Path::new("cache-test")), PathBuf::from("cache-test"));
        assert_eq!(expand_home(Path::new("~other/x")), PathBuf::from("~other/x"));
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.mode, RunMode::Interactive);
        assert!(!config.preselect);
        assert!(!config.scan.skip_empty_dirs);
        assert!(config.root.ends_with(".cache"));
    }

    #[test]
    fn test_flags() {
        let config = parse(&["-e", "-a", "--yes", "/tmp/cache"]);
        assert_eq!(config.root, PathBuf::from("/tmp/cache"));
        assert!(config.scan.skip_empty_dirs);
        assert!(config.preselect);
        assert_eq!(config.mode, RunMode::Unattended);
    }

    #[test]
    fn test_dry_run_wins_over_yes() {
        let config = parse(&["--dry-run", "--yes"]);
        assert_eq!(config.mode, RunMode::DryRun);
    }
}
