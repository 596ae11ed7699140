//! Helpers exposed to templates: description formatting, snippets, class
//! abbreviations and depth-relative links.

use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::sync::LazyLock;

use crate::reflection::{split_qualified, NAMESPACE_SEPARATOR};

static SEE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@see (\S+)").unwrap());
static SNIPPET_CUT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(.{50,}?)\s.*").unwrap());
static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Render a description as HTML.
///
/// `@see <ref>` becomes `see <ref>`, the text is rendered as Markdown and a
/// single wrapping paragraph is removed so short descriptions can be inlined.
pub fn describe(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = SEE_TAG.replace_all(text, "see $1");

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut rendered = String::new();
    html::push_html(&mut rendered, Parser::new_ext(&text, options));

    let trimmed = rendered.trim();
    let inner = trimmed.strip_prefix("<p>").unwrap_or(trimmed);
    let inner = inner.strip_suffix("</p>").unwrap_or(inner);
    inner.trim().to_string()
}

/// First line of `text` cut at the first whitespace after 50 characters,
/// with markup and line breaks removed.
pub fn snippet(text: &str) -> String {
    let cut = match SNIPPET_CUT.captures(text) {
        Some(caps) => caps.get(1).map_or(text, |m| m.as_str()),
        None => text,
    };
    MARKUP
        .replace_all(cut, "")
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect()
}

/// `<abbr>` markup showing the short name of a class with the qualified name
/// as title. Global names are returned as is unless `absolute` is set.
pub fn abbr_class(name: &str, absolute: bool) -> String {
    let name = name.trim_start_matches(NAMESPACE_SEPARATOR);
    let (namespace, short) = split_qualified(name);
    if namespace.is_empty() && !absolute {
        return name.to_string();
    }
    format!("<abbr title=\"{}\">{}</abbr>", name, short)
}

/// Map a qualified name to a relative output path stem.
pub fn name_to_path(name: &str) -> String {
    name.trim_start_matches(NAMESPACE_SEPARATOR)
        .replace(NAMESPACE_SEPARATOR, "/")
}

/// Prefix leading from a page at `depth` back to the output root.
pub fn root_path(depth: usize) -> String {
    "../".repeat(depth)
}

/// Links relative to the page currently being rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkHelper {
    depth: usize,
}

impl LinkHelper {
    /// Helper for a page whose output path is `uri`; depth is the number of
    /// `/` in it.
    pub fn for_page(uri: &str) -> Self {
        LinkHelper {
            depth: uri.matches('/').count(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn root(&self) -> String {
        root_path(self.depth)
    }

    pub fn namespace_path(&self, namespace: &str) -> String {
        format!("{}{}.html", self.root(), name_to_path(namespace))
    }

    pub fn class_path(&self, class: &str) -> String {
        format!("{}{}.html", self.root(), name_to_path(class))
    }

    pub fn method_path(&self, class: &str, method: &str) -> String {
        format!("{}#method_{}", self.class_path(class), method)
    }

    pub fn property_path(&self, class: &str, property: &str) -> String {
        format!("{}#property_{}", self.class_path(class), property)
    }

    pub fn static_path(&self, file: &str) -> String {
        format!("{}{}", self.root(), file)
    }
}
