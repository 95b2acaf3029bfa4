use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use inline_results_core::cache_store::{CacheStore, MemoryStore};
use inline_results_core::keyword_cache::{KeywordCache, KEYWORD_CACHE_KEY};
use inline_results_core::keyword_sources::{
    KeywordDeclaration, KeywordSources, PreferencesDirSources, StaticSources,
};

fn unique_prefs_dir(name: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir()
        .join("inline-results")
        .join(format!("{name}-{unique}"))
}

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn seed_preferences(root: &Path) {
    write(
        &root.join("workflows/user.workflow.AAA/manifest.json"),
        r#"{
            // hand-edited
            "keywords": ["gh", "Translate||tr"],
        }"#,
    );
    write(
        &root.join("workflows/user.workflow.BBB/manifest.json"),
        r#"{
            "keywords": ["{var:trigger}", "{var:unset}"],
            "user_configuration": [{"variable": "trigger", "default": "Dict"}]
        }"#,
    );
    write(
        &root.join("workflows/user.workflow.BBB/prefs.json"),
        r#"{"trigger": "Define"}"#,
    );
    write(
        &root.join("workflows/user.workflow.SELF/manifest.json"),
        r#"{"keywords": ["a", "b"]}"#,
    );
    write(
        &root.join("preferences/features/websearch/youtube/prefs.json"),
        r#"{"keyword": "yt", "disabled": false}"#,
    );
    write(
        &root.join("preferences/features/websearch/maps/prefs.json"),
        r#"{"keyword": "maps", "disabled": true}"#,
    );
    write(
        &root.join("preferences/features/websearch/prefs.json"),
        r#"{"custom_sites": {
            "1F2E": {"keyword": "crates", "enabled": true},
            "9A0B": {"keyword": "docs", "enabled": false}
        }}"#,
    );
}

#[test]
fn reads_every_source_from_preferences_dir() {
    let root = unique_prefs_dir("sources");
    seed_preferences(&root);
    let sources = PreferencesDirSources::new(&root, "user.workflow.SELF");
    let store = MemoryStore::new();

    let set = KeywordCache::new(&store, &sources).rebuild().unwrap();

    assert_eq!(
        set.words(),
        ["gh", "translate", "tr", "define", "yt", "crates", "today"]
    );
    assert!(!set.contains("a"));
    assert!(!set.contains("maps"));
    assert!(!set.contains("docs"));
    assert!(sources.latest_modification().is_some());

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn corrupt_user_searches_file_is_skipped() {
    let root = unique_prefs_dir("corrupt-user");
    write(
        &root.join("preferences/features/websearch/youtube/prefs.json"),
        r#"{"keyword": "yt"}"#,
    );
    write(
        &root.join("preferences/features/websearch/google/prefs.json"),
        "{ keyword: ",
    );
    write(
        &root.join("preferences/features/websearch/prefs.json"),
        "{ custom_sites: ",
    );
    let sources = PreferencesDirSources::new(&root, "");
    let store = MemoryStore::new();
    let cache = KeywordCache::new(&store, &sources);

    let set = cache.load().unwrap();

    assert_eq!(set.words(), ["yt", "today"]);
    assert!(sources.user_searches().unwrap().is_empty());
    assert_eq!(
        store.read_string(KEYWORD_CACHE_KEY).unwrap().as_deref(),
        Some(r#"["yt","today"]"#)
    );

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn missing_preferences_dir_yields_only_own_keyword() {
    let root = unique_prefs_dir("missing");
    let sources = PreferencesDirSources::new(&root, "user.workflow.SELF");
    let store = MemoryStore::new();

    let set = KeywordCache::new(&store, &sources).load().unwrap();

    assert_eq!(set.words(), ["today"]);
    assert!(sources.latest_modification().is_none());
}

#[test]
fn fresh_cache_is_reused_without_consulting_sources() {
    let store = MemoryStore::new();
    store.insert_at(
        KEYWORD_CACHE_KEY,
        br#"["cached"]"#,
        SystemTime::now() + Duration::from_secs(3600),
    );
    let sources = StaticSources {
        builtin: vec!["yt".into()],
        modified: Some(SystemTime::now()),
        ..Default::default()
    };
    let cache = KeywordCache::new(&store, &sources);

    assert!(!cache.is_stale());
    assert_eq!(cache.load().unwrap().words(), ["cached"]);
}

#[test]
fn cache_older_than_configuration_is_rebuilt() {
    let store = MemoryStore::new();
    store.insert_at(KEYWORD_CACHE_KEY, br#"["cached"]"#, UNIX_EPOCH);
    let sources = StaticSources {
        builtin: vec!["yt".into()],
        modified: Some(SystemTime::now()),
        ..Default::default()
    };
    let cache = KeywordCache::new(&store, &sources);

    assert!(cache.is_stale());
    assert_eq!(cache.load().unwrap().words(), ["yt", "today"]);
    assert!(!cache.is_stale());

    let raw = store.read_string(KEYWORD_CACHE_KEY).unwrap().unwrap();
    assert_eq!(raw, r#"["yt","today"]"#);
}

#[test]
fn corrupt_cache_is_rebuilt() {
    let store = MemoryStore::new();
    store.insert_at(
        KEYWORD_CACHE_KEY,
        b"{not json",
        SystemTime::now() + Duration::from_secs(3600),
    );
    let sources = StaticSources {
        user: vec!["crates".into()],
        ..Default::default()
    };

    let set = KeywordCache::new(&store, &sources).load().unwrap();

    assert_eq!(set.words(), ["crates", "today"]);
}

#[test]
fn rebuilding_twice_is_idempotent() {
    let store = MemoryStore::new();
    let sources = StaticSources {
        packages: vec![
            KeywordDeclaration::plain("gh"),
            KeywordDeclaration::plain("GH pulls"),
        ],
        builtin: vec!["gh".into(), "2fa".into()],
        ..Default::default()
    };
    let cache = KeywordCache::new(&store, &sources);

    let first = cache.rebuild().unwrap();
    let first_raw = store.read(KEYWORD_CACHE_KEY).unwrap();
    let second = cache.rebuild().unwrap();

    assert_eq!(first, second);
    assert_eq!(first_raw, store.read(KEYWORD_CACHE_KEY).unwrap());
    assert_eq!(second.words(), ["gh", "today"]);
}
