use std::io::Write;
use std::path::PathBuf;

use crate::config::{self, ConfigError};
use crate::contract::{Invocation, Mode, Outcome, SessionHandoff};
use crate::core_service::{CoreService, ServiceError};

const USAGE: &str = "usage: inline-results-core [run] [--mode <mode>] [--prefix <keyword>] \
[--config <file.toml>] -- <query>\n       inline-results-core toggle <url>\n       \
inline-results-core rebuild-keywords";

#[derive(Debug)]
pub enum RuntimeError {
    Config(ConfigError),
    Service(ServiceError),
    Output(std::io::Error),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Service(error) => write!(f, "service error: {error}"),
            Self::Output(error) => write!(f, "output error: {error}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ServiceError> for RuntimeError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run {
        argument: String,
        mode: Option<Mode>,
        prefix: Option<String>,
    },
    Toggle {
        url: String,
    },
    RebuildKeywords,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub command: Command,
    pub config_path: Option<PathBuf>,
}

pub fn parse_cli_args(args: &[String]) -> Result<CliOptions, String> {
    let mut config_path = None;
    let mut mode = None;
    let mut prefix = None;
    let mut positional: Vec<String> = Vec::new();
    let mut verbatim: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--" => {
                verbatim.extend(iter.by_ref().cloned());
                break;
            }
            "--config" => {
                let value = iter.next().ok_or("--config requires a path")?;
                config_path = Some(PathBuf::from(value));
            }
            "--mode" => {
                let value = iter.next().ok_or("--mode requires a value")?;
                mode = Some(Mode::parse(value).ok_or_else(|| format!("unknown mode '{value}'"))?);
            }
            "--prefix" => {
                let value = iter.next().ok_or("--prefix requires a value")?;
                prefix = Some(value.clone());
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => {
                return Err(format!("unknown flag '{flag}'\n{USAGE}"));
            }
            _ => positional.push(arg.clone()),
        }
    }

    // Subcommands are only recognized before `--`; the host passes the query after it.
    let (subcommand, rest) = match positional.split_first() {
        Some((first, rest)) if matches!(first.as_str(), "run" | "toggle" | "rebuild-keywords") => {
            (first.as_str(), rest)
        }
        _ => ("run", positional.as_slice()),
    };
    let words: Vec<String> = rest.iter().chain(verbatim.iter()).cloned().collect();

    let command = match subcommand {
        "toggle" => {
            let url = words.first().ok_or("toggle requires a url")?;
            Command::Toggle { url: url.clone() }
        }
        "rebuild-keywords" => Command::RebuildKeywords,
        _ => Command::Run {
            argument: words.join(" "),
            mode,
            prefix,
        },
    };

    Ok(CliOptions {
        command,
        config_path,
    })
}

/// Builds the invocation from CLI values, falling back to the variables the
/// host exports (`mode`, `oldQuery`, `oldResults`, `alfred_workflow_keyword`).
pub fn invocation_from_env(
    argument: &str,
    mode: Option<Mode>,
    prefix: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Invocation {
    let mode = mode
        .or_else(|| lookup("mode").and_then(|raw| Mode::parse(&raw)))
        .unwrap_or_default();
    let prefix = prefix
        .map(str::to_string)
        .or_else(|| lookup("alfred_workflow_keyword"))
        .unwrap_or_default();
    let handoff = SessionHandoff {
        old_query: lookup("oldQuery"),
        old_results: lookup("oldResults"),
    };
    Invocation::new(argument, mode, handoff).with_trigger_prefix(&prefix)
}

pub fn run_with_options(options: CliOptions) -> Result<(), RuntimeError> {
    let config = config::load(options.config_path.as_deref())?;
    if let Err(error) = crate::logging::init(&config.cache_dir) {
        eprintln!("[inline-results] file logging disabled: {error}");
    }
    let service = CoreService::new(config)?;

    match options.command {
        Command::Run {
            argument,
            mode,
            prefix,
        } => {
            let invocation = invocation_from_env(&argument, mode, prefix.as_deref(), |key| {
                std::env::var(key).ok()
            });
            let outcome = service.run(&invocation)?;
            emit(&outcome)
        }
        Command::Toggle { url } => {
            let selected = service.toggle_selection(&url)?;
            let state = if selected { "selected" } else { "deselected" };
            crate::logging::info(&format!("{state} {url}"));
            Ok(())
        }
        Command::RebuildKeywords => {
            let keywords = service.rebuild_keywords()?;
            println!("{}", keywords.words().join("\n"));
            Ok(())
        }
    }
}

/// Suppressed invocations print nothing at all.
fn emit(outcome: &Outcome) -> Result<(), RuntimeError> {
    let Some(output) = outcome.output() else {
        return Ok(());
    };
    let encoded = output
        .to_json()
        .map_err(|e| RuntimeError::Service(ServiceError::Encode(e)))?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(encoded.as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(RuntimeError::Output)
}
