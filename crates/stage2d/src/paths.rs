//! Locating the workspace root that holds `assets/`.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const ROOT_ENV_VAR: &str = "STAGE2D_ROOT";

/// Where the root came from, logged at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSource {
    EnvVar,
    Executable,
    WorkingDirectory,
}

impl fmt::Display for RootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EnvVar => "env",
            Self::Executable => "executable",
            Self::WorkingDirectory => "working_directory",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    /// Sprites resolve under `<assets_dir>/sprites/`.
    pub assets_dir: PathBuf,
    pub source: RootSource,
}

impl AppPaths {
    fn at(root: PathBuf, source: RootSource) -> Self {
        let assets_dir = root.join("assets");
        Self {
            root,
            assets_dir,
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{var} is not valid unicode: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("STAGE2D_ROOT={} has no Cargo.toml next to crates/ or assets/", .path.display())]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "no stage2d root above {}; set STAGE2D_ROOT to the directory holding Cargo.toml and assets/",
        join_dirs(.searched)
    )]
    RootNotFound { searched: Vec<PathBuf> },
}

/// `STAGE2D_ROOT` wins; otherwise the nearest marked ancestor of the executable,
/// then of the working directory.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let root = normalize_path(Path::new(&value));
            if is_root_marker(&root) {
                Ok(AppPaths::at(root, RootSource::EnvVar))
            } else {
                Err(StartupError::InvalidEnvRoot { path: root })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe_dir = env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf));
            let cwd = env::current_dir().ok();
            discover(&[
                (exe_dir, RootSource::Executable),
                (cwd, RootSource::WorkingDirectory),
            ])
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn join_dirs(dirs: &[PathBuf]) -> String {
    let shown: Vec<String> = dirs.iter().map(|dir| dir.display().to_string()).collect();
    shown.join(" or ")
}

fn discover(starts: &[(Option<PathBuf>, RootSource)]) -> Result<AppPaths, StartupError> {
    let mut searched = Vec::new();
    for (start, source) in starts {
        let Some(start) = start else {
            continue;
        };
        if let Some(root) = find_root_above(start) {
            return Ok(AppPaths::at(root, *source));
        }
        searched.push(normalize_path(start));
    }
    Err(StartupError::RootNotFound { searched })
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| is_root_marker(dir))
        .map(normalize_path)
}

fn is_root_marker(dir: &Path) -> bool {
    dir.join("Cargo.toml").is_file() && (dir.join("assets").is_dir() || dir.join("crates").is_dir())
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
