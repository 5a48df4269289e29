use clap::Parser;
use fsdb_sync::config::DbOverrides;
use std::path::PathBuf;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "fsdb-sync")]
#[command(
    about = "Add or delete database records so they mirror the files under a directory tree",
    long_about = None
)]
pub struct Cli {
    /// Filesystem root to scan
    #[arg(short = 'r', long = "root")]
    pub root: PathBuf,

    /// Compute and report the required updates without changing the database
    #[arg(short = 'd', long = "dryrun")]
    pub dry_run: bool,

    #[arg(long = "db_host")]
    pub db_host: Option<String>,

    #[arg(long = "db_port")]
    pub db_port: Option<u16>,

    #[arg(long = "db_user")]
    pub db_user: Option<String>,

    #[arg(long = "db_password")]
    pub db_password: Option<String>,

    #[arg(long = "db_name")]
    pub db_name: Option<String>,

    /// Write the computed plan as CSV to this path
    #[arg(long = "plan_csv")]
    pub plan_csv: Option<PathBuf>,

    /// Only warnings or errors
    #[arg(short, long, overrides_with = "verbose")]
    pub quiet: bool,

    /// Be verbose
    #[arg(short, long, overrides_with = "quiet")]
    pub verbose: bool,
}

impl Cli {
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }

    pub fn db_overrides(&self) -> DbOverrides {
        DbOverrides {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            name: self.db_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::parse_from(["fsdb-sync", "-r", "/data", "-d", "-q"]);
        assert_eq!(cli.root, PathBuf::from("/data"));
        assert!(cli.dry_run);
        assert_eq!(cli.log_level(), Some("warn"));
    }

    #[test]
    fn test_later_verbosity_flag_wins() {
        let cli = Cli::parse_from(["fsdb-sync", "--root", "/data", "-q", "-v"]);
        assert_eq!(cli.log_level(), Some("debug"));
        let cli = Cli::parse_from(["fsdb-sync", "--root", "/data", "-v", "-q"]);
        assert_eq!(cli.log_level(), Some("warn"));
    }

    #[test]
    fn test_db_flags_become_overrides() {
        let cli = Cli::parse_from([
            "fsdb-sync",
            "--root",
            "/data",
            "--db_host",
            "db",
            "--db_user",
            "sync",
            "--db_password",
            "secret",
        ]);
        let overrides = cli.db_overrides();
        assert_eq!(overrides.host.as_deref(), Some("db"));
        assert_eq!(overrides.user.as_deref(), Some("sync"));
        assert_eq!(overrides.password.as_deref(), Some("secret"));
        assert!(overrides.port.is_none());
    }

    #[test]
    fn test_root_is_required() {
        assert!(Cli::try_parse_from(["fsdb-sync", "-d"]).is_err());
    }
}
