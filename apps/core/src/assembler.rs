use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::contract::{DisplayItem, ItemIcon, ItemMods, ModAction, ModVariables, Mode};
use crate::model::ResultItem;
use crate::selection::SelectionSet;

/// Characters `encodeURIComponent` leaves alone, minus `'`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'(')
    .remove(b')');

pub const SELECT_SUBTITLE: &str = "⌘: Select URL";
pub const DESELECT_SUBTITLE: &str = "⌘: Deselect URL";
pub const INSTANT_ANSWER_PREFIX: &str = "ℹ️ ";

pub fn search_url(search_site: &str, query: &str) -> String {
    format!(
        "{search_site}{}",
        utf8_percent_encode(query, QUERY_COMPONENT)
    )
}

/// Leading item: search for exactly what was typed.
pub fn query_item(query: &str, search_site: &str) -> DisplayItem {
    DisplayItem {
        title: format!("\"{query}\""),
        uid: query.to_string(),
        arg: search_url(search_site, query),
        ..Default::default()
    }
}

fn toggle_action(url: &str, selected: bool) -> ModAction {
    ModAction {
        // Always set: the primary arg is empty for selected items.
        arg: Some(url.to_string()),
        subtitle: Some(if selected { DESELECT_SUBTITLE } else { SELECT_SUBTITLE }.to_string()),
        variables: Some(ModVariables {
            mode: Mode::MultiSelect,
        }),
    }
}

fn marked_title(title: &str, selected: bool, marker: &str) -> String {
    if selected {
        format!("{marker} {title}")
    } else {
        title.to_string()
    }
}

pub struct Assembler<'a> {
    pub selection: &'a SelectionSet,
    pub marker: &'a str,
    pub fallback_icon: &'a str,
}

impl Assembler<'_> {
    /// `icon_path` is empty when no favicon is available.
    pub fn result_item(&self, item: &ResultItem, icon_path: &str) -> DisplayItem {
        let selected = self.selection.is_selected(&item.url);
        let icon_path = if icon_path.is_empty() {
            self.fallback_icon
        } else {
            icon_path
        };

        DisplayItem {
            title: marked_title(&item.title, selected, self.marker),
            subtitle: Some(item.domain().to_string()),
            uid: item.url.clone(),
            // Re-adding an already selected URL is redundant.
            arg: if selected { String::new() } else { item.url.clone() },
            icon: Some(ItemIcon {
                path: icon_path.to_string(),
            }),
            quicklookurl: None,
            mods: Some(ItemMods {
                shift: Some(ModAction {
                    subtitle: Some(item.abstract_text.clone()),
                    ..Default::default()
                }),
                alt: Some(ModAction {
                    subtitle: Some(format!("⌥: Copy  ➙  {}", item.url)),
                    ..Default::default()
                }),
                cmd: Some(toggle_action(&item.url, selected)),
            }),
        }
    }

    /// Decorates the leading item with the instant answer preview and, when
    /// its own search URL is selected, the selection marker and toggle.
    pub fn decorate_query_item(
        &self,
        mut item: DisplayItem,
        instant_answer: Option<&str>,
        preview_path: Option<&str>,
    ) -> DisplayItem {
        if let Some(answer) = instant_answer {
            item.subtitle = Some(format!("{INSTANT_ANSWER_PREFIX}{answer}"));
            item.quicklookurl = preview_path.map(str::to_string);
        }

        if self.selection.is_selected(&item.arg) {
            let url = std::mem::take(&mut item.arg);
            item.title = marked_title(&item.title, true, self.marker);
            item.mods = Some(ItemMods {
                cmd: Some(toggle_action(&url, true)),
                ..Default::default()
            });
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::search_url;

    #[test]
    fn encodes_like_encode_uri_component_plus_quote() {
        assert_eq!(
            search_url("https://duckduckgo.com/?q=", "rust's (book) & more!"),
            "https://duckduckgo.com/?q=rust%27s%20(book)%20%26%20more!"
        );
    }

    #[test]
    fn encodes_non_ascii_as_utf8() {
        assert_eq!(search_url("s?q=", "ä"), "s?q=%C3%A4");
    }
}
