//! Command line definition and scope resolution.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use workshop_sync_core::workspace;

/// Environment variable holding the Steam password for `sync`.
pub const PASSWORD_ENV: &str = "WSYNC_STEAM_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "wsync", version)]
#[command(about = "Keep a Steam Workshop collection in sync through SteamCMD")]
pub struct Cli {
    /// Config file (default: wsync.toml)
    #[arg(short, long, global = true, env = "WSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl a Workshop listing and write its id lists
    Crawl {
        /// Listing URL (browse page, collection or user files)
        url: String,
    },

    /// Show what a sync would download, without downloading
    Plan {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download new, updated and broken items, then verify them
    Sync {
        #[command(flatten)]
        target: TargetArgs,

        /// Steam account (anonymous if omitted)
        #[arg(short, long)]
        username: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Scope folder (`<Game> - <appid>`) holding the id lists
    #[arg(long, conflicts_with = "ids")]
    pub scope: Option<PathBuf>,

    /// Id list file to use instead of a scope folder
    #[arg(long)]
    pub ids: Option<PathBuf>,

    /// App id (default: taken from the scope folder name)
    #[arg(long)]
    pub app_id: Option<String>,
}

/// What a plan or sync runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub catalog_path: PathBuf,
    pub app_id: String,
    pub failure_path: PathBuf,
}

impl TargetArgs {
    /// Resolve to a catalog file and app id.
    ///
    /// Without `--scope` or `--ids`, the only scope folder under
    /// `output_root` is used; zero or several folders is an error.
    pub fn resolve(&self, output_root: &Path) -> Result<Target> {
        if let Some(ids) = &self.ids {
            let folder = ids.parent().unwrap_or_else(|| Path::new("."));
            let scope = scope_near(folder);
            let app_id = self
                .app_id
                .clone()
                .or_else(|| scope.as_deref().and_then(workspace::scope_app_id))
                .with_context(|| {
                    format!("No app id for {}; pass --app-id", ids.display())
                })?;
            // Failures go to the scope root, same as in scope mode.
            let failure_path = match &scope {
                Some(scope) => workspace::failure_path(scope),
                None => folder.join(workshop_sync_core::fetch::FAILED_IDS_FILE),
            };
            return Ok(Target {
                catalog_path: ids.clone(),
                app_id,
                failure_path,
            });
        }

        let scope = match &self.scope {
            Some(scope) => scope.clone(),
            None => single_scope(output_root)?,
        };

        let catalog_path = workspace::catalog_path(&scope).with_context(|| {
            format!(
                "No ids.txt found in {} or its lists folder",
                scope.display()
            )
        })?;
        let app_id = self
            .app_id
            .clone()
            .or_else(|| workspace::scope_app_id(&scope))
            .with_context(|| {
                format!(
                    "Folder name {} has no app id; pass --app-id",
                    scope.display()
                )
            })?;

        Ok(Target {
            catalog_path,
            app_id,
            failure_path: workspace::failure_path(&scope),
        })
    }
}

/// Scope folder holding a list file: the folder itself, or its parent when
/// the file sits in `lists/`.
fn scope_near(folder: &Path) -> Option<PathBuf> {
    if workspace::scope_app_id(folder).is_some() {
        return Some(folder.to_path_buf());
    }
    folder
        .parent()
        .filter(|parent| workspace::scope_app_id(parent).is_some())
        .map(Path::to_path_buf)
}

fn single_scope(output_root: &Path) -> Result<PathBuf> {
    let mut found = workspace::find_scope_dirs(output_root);
    match found.len() {
        0 => bail!(
            "No scope folders under {}; run `wsync crawl` first or pass --scope/--ids",
            output_root.display()
        ),
        1 => Ok(found.remove(0)),
        _ => {
            let names: Vec<String> = found.iter().map(|p| p.display().to_string()).collect();
            bail!(
                "Several scope folders under {}, pick one with --scope:\n  {}",
                output_root.display(),
                names.join("\n  ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_scope(root: &Path, name: &str, legacy: bool) -> PathBuf {
        let scope = root.join(name);
        let ids = if legacy {
            scope.join("ids.txt")
        } else {
            scope.join("lists").join("ids.txt")
        };
        std::fs::create_dir_all(ids.parent().unwrap()).unwrap();
        std::fs::write(ids, "1234567\n").unwrap();
        scope
    }

    #[test]
    fn test_parse_sync_with_scope() {
        let cli = Cli::try_parse_from([
            "wsync", "sync", "--scope", "out/Game - 1", "--username", "alice", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Sync { target, username } => {
                assert_eq!(target.scope, Some(PathBuf::from("out/Game - 1")));
                assert_eq!(username.as_deref(), Some("alice"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_scope_and_ids_conflict() {
        let result = Cli::try_parse_from(["wsync", "plan", "--scope", "a", "--ids", "b"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_crawl() {
        let cli = Cli::try_parse_from([
            "wsync",
            "--config",
            "custom.toml",
            "crawl",
            "https://steamcommunity.com/workshop/browse/?appid=294100",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Command::Crawl { .. }));
    }

    #[test]
    fn test_resolve_single_scope() {
        let temp = TempDir::new().unwrap();
        let scope = make_scope(temp.path(), "RimWorld - 294100", false);

        let target = TargetArgs::default().resolve(temp.path()).unwrap();
        assert_eq!(target.app_id, "294100");
        assert_eq!(target.catalog_path, scope.join("lists").join("ids.txt"));
        assert_eq!(target.failure_path, scope.join("failed_ids.txt"));
    }

    #[test]
    fn test_resolve_several_scopes_is_error() {
        let temp = TempDir::new().unwrap();
        make_scope(temp.path(), "A - 1", false);
        make_scope(temp.path(), "B - 2", false);

        let err = TargetArgs::default().resolve(temp.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("A - 1"));
        assert!(message.contains("B - 2"));
    }

    #[test]
    fn test_resolve_no_scopes_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(TargetArgs::default().resolve(temp.path()).is_err());
    }

    #[test]
    fn test_resolve_explicit_legacy_scope() {
        let temp = TempDir::new().unwrap();
        let scope = make_scope(temp.path(), "Old Game - 70", true);
        make_scope(temp.path(), "Other - 2", false);

        let args = TargetArgs {
            scope: Some(scope.clone()),
            ..TargetArgs::default()
        };
        let target = args.resolve(temp.path()).unwrap();
        assert_eq!(target.catalog_path, scope.join("ids.txt"));
        assert_eq!(target.app_id, "70");
    }

    #[test]
    fn test_resolve_scope_without_app_id() {
        let temp = TempDir::new().unwrap();
        let scope = make_scope(temp.path(), "modlist", false);

        let args = TargetArgs {
            scope: Some(scope.clone()),
            ..TargetArgs::default()
        };
        assert!(args.resolve(temp.path()).is_err());

        let args = TargetArgs {
            scope: Some(scope),
            app_id: Some("42".to_string()),
            ..TargetArgs::default()
        };
        assert_eq!(args.resolve(temp.path()).unwrap().app_id, "42");
    }

    #[test]
    fn test_resolve_ids_file() {
        let temp = TempDir::new().unwrap();
        let scope = make_scope(temp.path(), "Game - 294100", false);
        let ids = scope.join("lists").join("ids.txt");

        let args = TargetArgs {
            ids: Some(ids.clone()),
            ..TargetArgs::default()
        };
        let target = args.resolve(temp.path()).unwrap();
        assert_eq!(target.app_id, "294100");
        assert_eq!(target.catalog_path, ids);
        assert_eq!(target.failure_path, scope.join("failed_ids.txt"));

        let loose = temp.path().join("mine.txt");
        std::fs::write(&loose, "1").unwrap();
        let args = TargetArgs {
            ids: Some(loose.clone()),
            ..TargetArgs::default()
        };
        assert!(args.resolve(temp.path()).is_err());

        let args = TargetArgs {
            ids: Some(loose),
            app_id: Some("42".to_string()),
            ..TargetArgs::default()
        };
        let target = args.resolve(temp.path()).unwrap();
        assert_eq!(target.failure_path, temp.path().join("failed_ids.txt"));
    }

    #[test]
    fn test_ids_and_scope_modes_share_failure_file() {
        let temp = TempDir::new().unwrap();
        let scope = make_scope(temp.path(), "Game - 294100", true);

        let by_ids = TargetArgs {
            ids: Some(scope.join("ids.txt")),
            ..TargetArgs::default()
        }
        .resolve(temp.path())
        .unwrap();
        let by_scope = TargetArgs {
            scope: Some(scope.clone()),
            ..TargetArgs::default()
        }
        .resolve(temp.path())
        .unwrap();

        assert_eq!(by_ids.failure_path, by_scope.failure_path);
        assert_eq!(by_ids.catalog_path, by_scope.catalog_path);
    }
}
