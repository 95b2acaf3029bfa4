use std::fmt::{Display, Formatter};
use std::process::Command;

use crate::config::Config;
use crate::model::BackendResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// 1..=25
    pub count: u8,
    pub include_unsafe: bool,
    pub region: Option<String>,
    pub no_user_agent: bool,
}

impl SearchOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            count: cfg.results_to_fetch,
            include_unsafe: cfg.include_unsafe,
            region: cfg.region.clone(),
            no_user_agent: true,
        }
    }

    /// Flags understood by the ddgr command line.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--json".to_string()];
        if self.no_user_agent {
            args.push("--noua".to_string());
        }
        if self.include_unsafe {
            args.push("--unsafe".to_string());
        }
        args.push(format!("--num={}", self.count));
        if let Some(region) = &self.region {
            args.push(format!("--reg={region}"));
        }
        args
    }
}

#[derive(Debug)]
pub enum BackendError {
    Spawn(std::io::Error),
    Failed { status: String, stderr: String },
    Malformed(serde_json::Error),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(error) => write!(f, "failed to start search backend: {error}"),
            Self::Failed { status, stderr } => {
                write!(f, "search backend exited with {status}: {stderr}")
            }
            Self::Malformed(error) => write!(f, "malformed search backend output: {error}"),
        }
    }
}

impl std::error::Error for BackendError {}

pub trait SearchBackend {
    fn search(&self, query: &str, opts: &SearchOptions) -> Result<BackendResponse, BackendError>;
}

/// Runs a ddgr-compatible command line and parses its `--json` output.
pub struct CommandBackend {
    program: String,
    base_args: Vec<String>,
}

impl CommandBackend {
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, base_args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            base_args: base_args.to_vec(),
        })
    }

    fn command(&self, query: &str, opts: &SearchOptions) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.base_args).args(opts.to_args());
        // Arguments go straight to the process; no shell quoting involved.
        command.arg("--").arg(query);
        command
    }
}

impl SearchBackend for CommandBackend {
    fn search(&self, query: &str, opts: &SearchOptions) -> Result<BackendResponse, BackendError> {
        let output = self
            .command(query, opts)
            .output()
            .map_err(BackendError::Spawn)?;
        if !output.status.success() {
            return Err(BackendError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_response(&output.stdout)
    }
}

pub fn parse_response(raw: &[u8]) -> Result<BackendResponse, BackendError> {
    serde_json::from_slice::<BackendResponse>(raw).map_err(BackendError::Malformed)
}
