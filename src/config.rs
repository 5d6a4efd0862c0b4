//! Command line parsing and validation of the output location.
use crate::{
    Error,
    Format,
    Result,
};
use clap::Parser;
use std::{
    env,
    path::{
        Component,
        Path,
        PathBuf,
    },
    str::FromStr,
};
use tracing::debug;

/// Where node_exporter's textfile collector usually looks.
pub const DEFAULT_DIRECTORY: &str = "/var/lib/node_exporter/textfile_collector";

/// Pipe a goss JSON report into a Prometheus `.prom` file.
///
/// Example:
/// ```text
/// goss validate --format json | promify --name goss.prom
/// ```
#[derive(Debug, Clone, Parser)]
#[command(name = "promify", version, about, long_about = None)]
pub struct Cli {
    /// Directory to store the .prom file in
    #[arg(short, long, env = "PROMIFY_PATH", default_value = DEFAULT_DIRECTORY)]
    pub path: String,

    /// Name of the .prom file, including the extension
    #[arg(short, long, env = "PROMIFY_NAME")]
    pub name: String,

    /// Format of the piped data
    #[arg(short, long, env = "PROMIFY_FORMAT", default_value = "goss")]
    pub format: String,

    /// Log what is being done to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated settings for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Existing, absolute directory
    pub directory: PathBuf,
    /// File name ending in `.prom`
    pub name: String,
    pub format: Format,
}

impl Config {
    pub fn output_path(&self) -> PathBuf {
        self.directory.join(&self.name)
    }

    /// The value of the `textfile` label on the summary lines.
    pub fn tag(&self) -> &str {
        &self.name
    }
}

impl Cli {
    /// Validate against the process' working directory and `$HOME`.
    pub fn into_config(self) -> Result<Config> {
        let cwd = env::current_dir().map_err(|err| {
            Error::Configuration(format!("path error: no working directory: {err}"))
        })?;
        let home = env::var_os("HOME").map(PathBuf::from);
        self.into_config_with(&cwd, home.as_deref())
    }

    pub fn into_config_with(self, cwd: &Path, home: Option<&Path>) -> Result<Config> {
        let format = Format::from_str(&self.format)
            .map_err(|_| Error::Configuration(format!("unsupported format: {}", self.format)))?;
        let name = tidy_file_name(&self.name)?;
        let directory = tidy_directory(&self.path, cwd, home)?;
        let config = Config {
            directory,
            name,
            format,
        };
        debug!(?config, "configuration");
        Ok(config)
    }
}

fn name_error(reason: &str) -> Error {
    Error::Configuration(format!("name error: {reason}"))
}

fn path_error(reason: &str) -> Error {
    Error::Configuration(format!("path error: {reason}"))
}

/// Check the output file name and strip surrounding whitespace.
pub fn tidy_file_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(name_error("argument is empty"));
    }
    if name.contains('/') {
        return Err(name_error("cannot contain '/'"));
    }
    if !name.ends_with(".prom") {
        return Err(name_error("'.prom' extension is required"));
    }
    Ok(name.to_owned())
}

/// Resolve the output directory to an existing absolute path.
///
/// `~` and `$HOME` expand to `home`, relative paths are taken relative to `cwd`, and `.`/`..`
/// components are collapsed without touching the file system.
pub fn tidy_directory(path: &str, cwd: &Path, home: Option<&Path>) -> Result<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return Err(path_error("argument is empty"));
    }
    if path.starts_with("...") {
        return Err(path_error("too many dots '...'"));
    }
    if path.contains("//") {
        return Err(path_error("too many slashes '//'"));
    }

    let home_relative = ["~", "$HOME"]
        .into_iter()
        .find_map(|prefix| path.strip_prefix(prefix))
        .filter(|rest| rest.is_empty() || rest.starts_with('/'));
    let expanded = match home_relative {
        Some(rest) => {
            let home = home.ok_or_else(|| path_error("cannot expand '~', HOME is not set"))?;
            home.join(rest.trim_start_matches('/'))
        }
        None => PathBuf::from(path),
    };
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };
    let directory = normalize(&absolute);

    if !directory.is_dir() {
        return Err(path_error("directory does not exist"));
    }
    Ok(directory)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
