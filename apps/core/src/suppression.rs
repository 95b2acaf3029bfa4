//! Ordered guard chain deciding whether a query is searched at all.
//!
//! Each stage is a pure predicate over the query. The first stage that
//! objects wins; later stages are not evaluated. The keyword stage is lazy
//! because loading the keyword set may rebuild the on-disk cache.

use crate::contract::SuppressionReason;
use crate::keyword_cache::{KeywordCacheError, KeywordSet};
use crate::model::first_word;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Suppress(SuppressionReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionRules {
    pub minimum_query_length: usize,
    pub ignore_words: Vec<String>,
    pub check_host_keywords: bool,
}

/// `scheme:` prefix, where the scheme is one or more ASCII word characters.
pub fn looks_like_uri(query: &str) -> bool {
    let scheme_len = query
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum::<usize>();
    scheme_len > 0 && query[scheme_len..].starts_with(':')
}

pub fn uri_stage(query: &str) -> Verdict {
    if looks_like_uri(query) {
        Verdict::Suppress(SuppressionReason::Uri)
    } else {
        Verdict::Pass
    }
}

pub fn length_stage(query: &str, minimum: usize) -> Verdict {
    if query.chars().count() < minimum {
        Verdict::Suppress(SuppressionReason::TooShort)
    } else {
        Verdict::Pass
    }
}

pub fn ignore_word_stage(query: &str, ignore_words: &[String]) -> Verdict {
    let word = first_word(query);
    if ignore_words.iter().any(|ignored| ignored == word) {
        Verdict::Suppress(SuppressionReason::IgnoredWord)
    } else {
        Verdict::Pass
    }
}

pub fn keyword_stage(query: &str, keywords: &KeywordSet) -> Verdict {
    let word = first_word(query);
    if keywords.contains(word) {
        Verdict::Suppress(SuppressionReason::HostKeyword(word.to_string()))
    } else {
        Verdict::Pass
    }
}

/// Runs the chain. `keywords` is only called when every cheaper stage passed
/// and host keyword checking is enabled.
pub fn evaluate<F>(
    query: &str,
    rules: &SuppressionRules,
    keywords: F,
) -> Result<Verdict, KeywordCacheError>
where
    F: FnOnce() -> Result<KeywordSet, KeywordCacheError>,
{
    let cheap_stages: [&dyn Fn(&str) -> Verdict; 3] = [
        &uri_stage,
        &|q: &str| length_stage(q, rules.minimum_query_length),
        &|q: &str| ignore_word_stage(q, &rules.ignore_words),
    ];
    for stage in cheap_stages {
        if let Verdict::Suppress(reason) = stage(query) {
            return Ok(Verdict::Suppress(reason));
        }
    }

    if rules.check_host_keywords {
        let set = keywords()?;
        return Ok(keyword_stage(query, &set));
    }
    Ok(Verdict::Pass)
}

#[cfg(test)]
mod tests {
    use super::{evaluate, looks_like_uri, SuppressionRules, Verdict};
    use crate::contract::SuppressionReason;
    use crate::keyword_cache::KeywordSet;

    fn rules() -> SuppressionRules {
        SuppressionRules {
            minimum_query_length: 3,
            ignore_words: vec!["cd".to_string()],
            check_host_keywords: true,
        }
    }

    #[test]
    fn detects_scheme_prefix() {
        assert!(looks_like_uri("https://example.com"));
        assert!(looks_like_uri("mailto:me"));
        assert!(!looks_like_uri(":foo"));
        assert!(!looks_like_uri("what is rust"));
    }

    #[test]
    fn non_ascii_prefix_is_not_a_scheme() {
        assert!(!looks_like_uri("café: menu"));
        assert!(!looks_like_uri("日本: x"));
        assert!(looks_like_uri("cafe_2: menu"));
    }

    #[test]
    fn first_failing_stage_wins_and_keywords_stay_unloaded() {
        let verdict = evaluate("ab", &rules(), || panic!("keywords must not load")).unwrap();
        assert_eq!(verdict, Verdict::Suppress(SuppressionReason::TooShort));
    }

    #[test]
    fn ignore_word_matches_first_token_only() {
        let verdict = evaluate("cd projects", &rules(), || Ok(KeywordSet::default())).unwrap();
        assert_eq!(verdict, Verdict::Suppress(SuppressionReason::IgnoredWord));

        let verdict = evaluate("how cd works", &rules(), || Ok(KeywordSet::default())).unwrap();
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn keyword_stage_reports_word() {
        let verdict = evaluate("gh issues", &rules(), || {
            Ok(KeywordSet::from_candidates(["gh"]))
        })
        .unwrap();
        assert_eq!(
            verdict,
            Verdict::Suppress(SuppressionReason::HostKeyword("gh".to_string()))
        );
    }
}
