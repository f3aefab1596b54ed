use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SESSION_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    pub session_id: String,
    pub request_path: PathBuf,
    pub session_capacity: usize,
    pub log_level: LevelFilter,
}

/// Optional `<root>/hoard.yaml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    session_capacity: Option<usize>,
    log_level: Option<String>,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 4 {
            return Err("usage: hoard <data-root> <session-id> <request.json>".to_string());
        }

        let root = Path::new(&args[1]).to_path_buf();
        let session_id = args[2].trim().to_string();
        if session_id.is_empty() {
            return Err("session id must not be empty".to_string());
        }
        let request_path = Path::new(&args[3]).to_path_buf();
        let file = load_file_config(&root.join("hoard.yaml"))?;

        let session_capacity = match env_value("HOARD_SESSION_CAPACITY") {
            Some(value) => parse_capacity(&value)?,
            None => file.session_capacity.unwrap_or(DEFAULT_SESSION_CAPACITY),
        };
        if session_capacity == 0 {
            return Err("session capacity must be at least 1".to_string());
        }
        let log_level = match env_value("HOARD_LOG_LEVEL").or(file.log_level) {
            Some(value) => crate::telemetry::logging::parse_level(&value)
                .ok_or_else(|| format!("invalid log level: {}", value))?,
            None => LevelFilter::Info,
        };

        Ok(Self {
            root,
            session_id,
            request_path,
            session_capacity,
            log_level,
        })
    }

    pub fn db_root(&self) -> PathBuf {
        self.root.join("db")
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_capacity(value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid session capacity {}: {}", value, err))
}

fn load_file_config(path: &Path) -> Result<FileConfig, String> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(err) => return Err(format!("config read failed for {}: {}", path.display(), err)),
    };
    serde_yaml::from_str(&data)
        .map_err(|err| format!("config parse failed for {}: {}", path.display(), err))
}
