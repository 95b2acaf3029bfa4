//! Where reserved trigger words come from.
//!
//! The host keeps its preferences in one directory: every installed package
//! lives under `workflows/<uid>/` and the web-search shortcuts under
//! `preferences/features/websearch/`. Manifests are JSON and parsed leniently
//! with `json5` because hand-edited files often carry comments.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Deserialize;
use walkdir::WalkDir;

pub const PACKAGES_DIR: &str = "workflows";
pub const WEBSEARCH_DIR: &str = "preferences/features/websearch";
pub const PACKAGE_MANIFEST: &str = "manifest.json";
pub const PACKAGE_PREFS: &str = "prefs.json";
pub const WEBSEARCH_PREFS: &str = "prefs.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SourceError {}

/// A keyword as declared by a package, before variable resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordDeclaration {
    pub raw: String,
    /// User-set values for configurable keywords, by variable name.
    pub overrides: HashMap<String, String>,
    /// Declared defaults for configurable keywords, by variable name.
    pub defaults: HashMap<String, String>,
}

impl KeywordDeclaration {
    pub fn plain(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            overrides: HashMap::new(),
            defaults: HashMap::new(),
        }
    }

    /// Candidate keywords this declaration contributes. `{var:NAME}` resolves
    /// through the user override, then the declared default; unresolvable
    /// declarations contribute nothing. `a||b` contributes both alternatives.
    pub fn resolve(&self) -> Vec<String> {
        if let Some(name) = variable_name(&self.raw) {
            return self
                .overrides
                .get(name)
                .or_else(|| self.defaults.get(name))
                .map(|value| vec![value.to_lowercase()])
                .unwrap_or_default();
        }
        if self.raw.contains("||") {
            return self.raw.split("||").map(str::to_string).collect();
        }
        vec![self.raw.clone()]
    }
}

fn variable_name(raw: &str) -> Option<&str> {
    let rest = raw.strip_prefix("{var:")?;
    let end = rest.find('}')?;
    Some(&rest[..end])
}

pub trait KeywordSources {
    /// Keyword declarations of every other installed package.
    fn package_keywords(&self) -> Result<Vec<KeywordDeclaration>, SourceError>;
    /// Keywords of enabled built-in web searches.
    fn builtin_searches(&self) -> Result<Vec<String>, SourceError>;
    /// Keywords of enabled user-defined web searches.
    fn user_searches(&self) -> Result<Vec<String>, SourceError>;
    /// Most recent modification among the watched configuration files.
    fn latest_modification(&self) -> Option<SystemTime>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackageManifest {
    keywords: Vec<String>,
    user_configuration: Vec<ConfigurationOption>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigurationOption {
    variable: String,
    default: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuiltinSearchPrefs {
    keyword: String,
    disabled: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebSearchPrefs {
    custom_sites: HashMap<String, CustomSite>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CustomSite {
    keyword: String,
    enabled: bool,
}

/// Reads keyword sources from the host's preferences directory.
pub struct PreferencesDirSources {
    root: PathBuf,
    own_uid: String,
}

impl PreferencesDirSources {
    pub fn new(root: impl Into<PathBuf>, own_uid: &str) -> Self {
        Self {
            root: root.into(),
            own_uid: own_uid.to_string(),
        }
    }

    fn packages_root(&self) -> PathBuf {
        self.root.join(PACKAGES_DIR)
    }

    fn websearch_root(&self) -> PathBuf {
        self.root.join(WEBSEARCH_DIR)
    }

    fn package_dirs(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.packages_root()) else {
            return Vec::new();
        };
        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            // Own keywords are pseudo-keywords ("a", "b", ...) and must not suppress.
            .filter(|path| {
                self.own_uid.is_empty()
                    || path.file_name().and_then(|n| n.to_str()) != Some(self.own_uid.as_str())
            })
            .collect();
        dirs.sort();
        dirs
    }

    fn watched_files(&self) -> Vec<PathBuf> {
        let package_files = WalkDir::new(self.packages_root())
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| has_extension(path, "json"));

        let websearch_files = WalkDir::new(self.websearch_root())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name() == WEBSEARCH_PREFS)
            .map(|entry| entry.into_path());

        package_files.chain(websearch_files).collect()
    }
}

impl KeywordSources for PreferencesDirSources {
    fn package_keywords(&self) -> Result<Vec<KeywordDeclaration>, SourceError> {
        let mut out = Vec::new();
        for dir in self.package_dirs() {
            let manifest_path = dir.join(PACKAGE_MANIFEST);
            if !manifest_path.is_file() {
                continue;
            }
            let manifest: PackageManifest = match read_json5(&manifest_path) {
                Ok(manifest) => manifest,
                Err(error) => {
                    crate::logging::warn(&error.to_string());
                    continue;
                }
            };
            if manifest.keywords.is_empty() {
                continue;
            }

            let overrides = read_overrides(&dir.join(PACKAGE_PREFS));
            let defaults: HashMap<String, String> = manifest
                .user_configuration
                .into_iter()
                .filter_map(|option| {
                    let value = option.default.as_ref().and_then(json_scalar)?;
                    Some((option.variable, value))
                })
                .collect();

            out.extend(manifest.keywords.into_iter().map(|raw| KeywordDeclaration {
                raw,
                overrides: overrides.clone(),
                defaults: defaults.clone(),
            }));
        }
        Ok(out)
    }

    fn builtin_searches(&self) -> Result<Vec<String>, SourceError> {
        let root = self.websearch_root();
        let Ok(entries) = std::fs::read_dir(&root) else {
            return Ok(Vec::new());
        };
        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut out = Vec::new();
        for dir in dirs {
            let path = dir.join(WEBSEARCH_PREFS);
            if !path.is_file() {
                continue;
            }
            match read_json5::<BuiltinSearchPrefs>(&path) {
                Ok(prefs) if !prefs.disabled && !prefs.keyword.is_empty() => {
                    out.push(prefs.keyword)
                }
                Ok(_) => {}
                Err(error) => crate::logging::warn(&error.to_string()),
            }
        }
        Ok(out)
    }

    fn user_searches(&self) -> Result<Vec<String>, SourceError> {
        let path = self.websearch_root().join(WEBSEARCH_PREFS);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        // A broken host file must not take the whole keyword set down with it.
        let prefs: WebSearchPrefs = match read_json5(&path) {
            Ok(prefs) => prefs,
            Err(error) => {
                crate::logging::warn(&error.to_string());
                return Ok(Vec::new());
            }
        };
        let mut sites: Vec<(String, CustomSite)> = prefs.custom_sites.into_iter().collect();
        sites.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(sites
            .into_iter()
            .filter(|(_, site)| site.enabled && !site.keyword.is_empty())
            .map(|(_, site)| site.keyword)
            .collect())
    }

    fn latest_modification(&self) -> Option<SystemTime> {
        self.watched_files()
            .iter()
            .filter_map(|path| std::fs::metadata(path).ok()?.modified().ok())
            .max()
    }
}

fn read_json5<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SourceError::new(format!("read failed for '{}': {e}", path.display())))?;
    json5::from_str::<T>(&raw)
        .map_err(|e| SourceError::new(format!("invalid json in '{}': {e}", path.display())))
}

fn read_overrides(path: &Path) -> HashMap<String, String> {
    if !path.is_file() {
        return HashMap::new();
    }
    match read_json5::<HashMap<String, serde_json::Value>>(path) {
        Ok(values) => values
            .into_iter()
            .filter_map(|(key, value)| json_scalar(&value).map(|v| (key, v)))
            .collect(),
        Err(error) => {
            crate::logging::warn(&error.to_string());
            HashMap::new()
        }
    }
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|v| v.to_str())
        .is_some_and(|v| v.eq_ignore_ascii_case(extension))
}

/// Fixed sources, for tests and for hosts that hand keywords over directly.
#[derive(Debug, Clone, Default)]
pub struct StaticSources {
    pub packages: Vec<KeywordDeclaration>,
    pub builtin: Vec<String>,
    pub user: Vec<String>,
    pub modified: Option<SystemTime>,
}

impl KeywordSources for StaticSources {
    fn package_keywords(&self) -> Result<Vec<KeywordDeclaration>, SourceError> {
        Ok(self.packages.clone())
    }

    fn builtin_searches(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.builtin.clone())
    }

    fn user_searches(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.user.clone())
    }

    fn latest_modification(&self) -> Option<SystemTime> {
        self.modified
    }
}

#[cfg(test)]
mod tests {
    use super::{variable_name, KeywordDeclaration};

    #[test]
    fn extracts_variable_name() {
        assert_eq!(variable_name("{var:search_keyword}"), Some("search_keyword"));
        assert_eq!(variable_name("gh"), None);
    }

    #[test]
    fn variable_keyword_prefers_override_then_default() {
        let mut declaration = KeywordDeclaration::plain("{var:kw}");
        declaration.defaults.insert("kw".into(), "Def".into());
        assert_eq!(declaration.resolve(), vec!["def"]);

        declaration.overrides.insert("kw".into(), "Mine".into());
        assert_eq!(declaration.resolve(), vec!["mine"]);
    }

    #[test]
    fn unresolvable_variable_keyword_is_skipped() {
        assert!(KeywordDeclaration::plain("{var:missing}").resolve().is_empty());
    }

    #[test]
    fn alternatives_expand() {
        assert_eq!(
            KeywordDeclaration::plain("gh||github").resolve(),
            vec!["gh", "github"]
        );
    }
}
