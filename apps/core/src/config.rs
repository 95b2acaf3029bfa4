use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_RESULTS_TO_FETCH: u8 = 5;
pub const MAX_RESULTS_TO_FETCH: u8 = 25;
pub const DEFAULT_MINIMUM_QUERY_LENGTH: usize = 3;
pub const MAX_MINIMUM_QUERY_LENGTH: usize = 10;
pub const DEFAULT_MULTI_SELECT_ICON: &str = "🔳";
pub const DEFAULT_SEARCH_SITE: &str = "https://duckduckgo.com/?q=";
pub const DEFAULT_BACKEND_COMMAND: &str = "python3 ./dependencies/ddgr.py";
pub const DEFAULT_FALLBACK_ICON: &str = "icons/fallback_for_no_favicon.png";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Parse(error) => write!(f, "parse error: {error}"),
            Self::Invalid(error) => write!(f, "invalid config: {error}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub results_to_fetch: u8,
    pub minimum_query_length: usize,
    pub include_unsafe: bool,
    pub ignore_host_keywords: bool,
    pub multi_select_icon: String,
    /// `None` disables the region parameter.
    pub region: Option<String>,
    pub ignore_extra_words: Vec<String>,
    pub search_site: String,
    pub use_favicons: bool,
    pub cache_dir: PathBuf,
    pub preferences_dir: PathBuf,
    pub workflow_uid: String,
    pub backend_command: Vec<String>,
    pub fallback_icon: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            results_to_fetch: DEFAULT_RESULTS_TO_FETCH,
            minimum_query_length: DEFAULT_MINIMUM_QUERY_LENGTH,
            include_unsafe: false,
            ignore_host_keywords: false,
            multi_select_icon: DEFAULT_MULTI_SELECT_ICON.to_string(),
            region: None,
            ignore_extra_words: Vec::new(),
            search_site: DEFAULT_SEARCH_SITE.to_string(),
            use_favicons: false,
            cache_dir: std::env::temp_dir().join("inline-results"),
            preferences_dir: PathBuf::from("../.."),
            workflow_uid: String::new(),
            backend_command: split_command(DEFAULT_BACKEND_COMMAND),
            fallback_icon: DEFAULT_FALLBACK_ICON.to_string(),
        }
    }
}

/// Raw file representation; every key is optional and uses the kebab-case names.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct ConfigFile {
    results_to_fetch: Option<i64>,
    minimum_query_length: Option<i64>,
    include_unsafe: Option<bool>,
    ignore_alfred_keywords: Option<bool>,
    multi_select_icon: Option<String>,
    region: Option<String>,
    ignore_extra_words: Option<String>,
    search_site: Option<String>,
    use_favicons: Option<bool>,
    cache_dir: Option<PathBuf>,
    preferences_dir: Option<PathBuf>,
    workflow_uid: Option<String>,
    backend_command: Option<String>,
    fallback_icon: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from environment-style variables (`results_to_fetch`, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.apply_lookup(&lookup);
        config
    }

    fn apply_lookup(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup("results_to_fetch") {
            self.results_to_fetch = clamp_results_to_fetch(parse_int(&raw));
        }
        if let Some(raw) = lookup("minimum_query_length") {
            self.minimum_query_length = clamp_minimum_query_length(parse_int(&raw));
        }
        if let Some(raw) = lookup("include_unsafe") {
            self.include_unsafe = parse_flag(&raw);
        }
        if let Some(raw) = lookup("ignore_alfred_keywords") {
            self.ignore_host_keywords = parse_flag(&raw);
        }
        if let Some(raw) = lookup("multi_select_icon").filter(|v| !v.is_empty()) {
            self.multi_select_icon = raw;
        }
        if let Some(raw) = lookup("region") {
            self.region = parse_region(&raw);
        }
        if let Some(raw) = lookup("ignore_extra_words") {
            self.ignore_extra_words = parse_word_list(&raw);
        }
        if let Some(raw) = lookup("search_site").filter(|v| !v.is_empty()) {
            self.search_site = raw;
        }
        if let Some(raw) = lookup("use_favicons") {
            self.use_favicons = parse_flag(&raw);
        }
        if let Some(raw) = lookup("alfred_workflow_cache").filter(|v| !v.is_empty()) {
            self.cache_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("preferences_dir").filter(|v| !v.is_empty()) {
            self.preferences_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("alfred_workflow_uid") {
            self.workflow_uid = raw;
        }
        if let Some(raw) = lookup("backend_command").filter(|v| !v.trim().is_empty()) {
            self.backend_command = split_command(&raw);
        }
        if let Some(raw) = lookup("fallback_icon").filter(|v| !v.is_empty()) {
            self.fallback_icon = raw;
        }
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(value) = file.results_to_fetch {
            self.results_to_fetch = clamp_results_to_fetch(Some(value));
        }
        if let Some(value) = file.minimum_query_length {
            self.minimum_query_length = clamp_minimum_query_length(Some(value));
        }
        if let Some(value) = file.include_unsafe {
            self.include_unsafe = value;
        }
        if let Some(value) = file.ignore_alfred_keywords {
            self.ignore_host_keywords = value;
        }
        if let Some(value) = file.multi_select_icon {
            self.multi_select_icon = value;
        }
        if let Some(value) = file.region {
            self.region = parse_region(&value);
        }
        if let Some(value) = file.ignore_extra_words {
            self.ignore_extra_words = parse_word_list(&value);
        }
        if let Some(value) = file.search_site {
            self.search_site = value;
        }
        if let Some(value) = file.use_favicons {
            self.use_favicons = value;
        }
        if let Some(value) = file.cache_dir {
            self.cache_dir = value;
        }
        if let Some(value) = file.preferences_dir {
            self.preferences_dir = value;
        }
        if let Some(value) = file.workflow_uid {
            self.workflow_uid = value;
        }
        if let Some(value) = file.backend_command {
            self.backend_command = split_command(&value);
        }
        if let Some(value) = file.fallback_icon {
            self.fallback_icon = value;
        }
    }
}

/// Reads the optional TOML file, then overlays the process environment.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    if let Some(path) = path {
        config.apply_file(read_file(path)?);
    }
    config.apply_lookup(&|key: &str| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str::<ConfigFile>(&raw)
        .map_err(|e| ConfigError::Parse(format!("invalid toml in '{}': {e}", path.display())))
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !(1..=MAX_RESULTS_TO_FETCH).contains(&cfg.results_to_fetch) {
        return Err(ConfigError::Invalid("results_to_fetch out of range".into()));
    }

    if cfg.minimum_query_length > MAX_MINIMUM_QUERY_LENGTH {
        return Err(ConfigError::Invalid("minimum_query_length out of range".into()));
    }

    if cfg.cache_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("cache_dir is required".into()));
    }

    if cfg.backend_command.is_empty() {
        return Err(ConfigError::Invalid("backend_command is required".into()));
    }

    Ok(())
}

pub fn clamp_results_to_fetch(value: Option<i64>) -> u8 {
    value
        .map(|v| v.clamp(1, MAX_RESULTS_TO_FETCH as i64) as u8)
        .unwrap_or(DEFAULT_RESULTS_TO_FETCH)
}

pub fn clamp_minimum_query_length(value: Option<i64>) -> usize {
    value
        .map(|v| v.clamp(0, MAX_MINIMUM_QUERY_LENGTH as i64) as usize)
        .unwrap_or(DEFAULT_MINIMUM_QUERY_LENGTH)
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn parse_flag(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed == "1" || trimmed.eq_ignore_ascii_case("true")
}

fn parse_region(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "none" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Comma separated, optionally with a single space around each comma.
pub fn parse_word_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',')
        .map(|word| word.trim().to_string())
        .filter(|word| !word.is_empty())
        .collect()
}

fn split_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_flag, parse_region, parse_word_list};

    #[test]
    fn flags_accept_one_and_true() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn region_none_disables_parameter() {
        assert_eq!(parse_region("none"), None);
        assert_eq!(parse_region("de-de"), Some("de-de".to_string()));
    }

    #[test]
    fn word_list_tolerates_spaces_around_commas() {
        assert_eq!(parse_word_list("cd , ls,git"), vec!["cd", "ls", "git"]);
        assert!(parse_word_list("").is_empty());
    }
}
