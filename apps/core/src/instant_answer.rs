use crate::cache_store::{CacheStore, StoreError};

pub const PREVIEW_BUFFER_KEY: &str = "instantAnswerBuffer.html";
const SOURCE_MARKER: &str = "More at ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantAnswer {
    pub info: String,
    /// Empty when the answer carries no attribution.
    pub source: String,
}

impl InstantAnswer {
    /// Splits `<info> More at <source>` at the last marker preceded by
    /// whitespace. Anything else is all info, no source.
    pub fn parse(raw: &str) -> Self {
        let mut search_end = raw.len();
        while let Some(index) = raw[..search_end].rfind(SOURCE_MARKER) {
            let before = &raw[..index];
            if index > 0 && before.ends_with(char::is_whitespace) {
                let info = before.trim_end();
                return Self {
                    info: info.to_string(),
                    source: raw[index + SOURCE_MARKER.len()..].to_string(),
                };
            }
            search_end = index;
        }
        Self {
            info: raw.to_string(),
            source: String::new(),
        }
    }

    pub fn to_html(&self) -> String {
        let cite = if self.source.is_empty() {
            String::new()
        } else {
            format!("\n<cite>– {}</cite>", escape_html(&self.source))
        };
        format!(
            r#"<style>
:root {{ font-size: 2em }}
cite {{ margin-left: 70% }}
blockquote p {{
	padding: 1em;
	background: #eee;
	border-radius: 5px;
}}
</style>
<blockquote>
<p>{}</p>{cite}
</blockquote>
"#,
            escape_html(&self.info)
        )
    }
}

/// Writes the rendered preview; returns the path the host should link.
pub fn write_preview<S: CacheStore + ?Sized>(
    store: &S,
    answer: &InstantAnswer,
) -> Result<String, StoreError> {
    store.write(PREVIEW_BUFFER_KEY, answer.to_html().as_bytes())?;
    Ok(preview_path(store))
}

pub fn preview_path<S: CacheStore + ?Sized>(store: &S) -> String {
    store.locate(PREVIEW_BUFFER_KEY).to_string_lossy().into_owned()
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
