//! Markdown to standalone HTML preview, with class-based code highlighting.
//!
//! Rendering is total: every string produces a document. Constructs the
//! parser does not recognise come through as literal text, and so does raw
//! HTML in the source: the only markup in the preview is markup this module
//! generated itself.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag};
use regex::Regex;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::highlighting::ThemeSet;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use textura_config::{RenderSettings, DEFAULT_BODY_STYLE, DEFAULT_THEME};
use tracing::{debug, warn};

const CLASS_STYLE: ClassStyle = ClassStyle::Spaced;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub tables: bool,
    pub autolink: bool,
    pub fenced_code: bool,
    pub theme: String,
    pub body_style: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tables: true,
            autolink: true,
            fenced_code: true,
            theme: DEFAULT_THEME.to_owned(),
            body_style: DEFAULT_BODY_STYLE.to_owned(),
        }
    }
}

impl From<&RenderSettings> for RenderOptions {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            tables: settings.tables,
            autolink: settings.autolink,
            fenced_code: settings.fenced_code,
            theme: settings.theme.clone(),
            body_style: settings.body_style.clone(),
        }
    }
}

/// Render `markdown` with the default options.
pub fn render(markdown: &str) -> String {
    Renderer::default().render(markdown)
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(&self, markdown: &str) -> String {
        let fragment = self.render_fragment(markdown);
        let stylesheet = stylesheet(&self.options.theme);

        let mut document = String::with_capacity(fragment.len() + stylesheet.len() + 256);
        document.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
        document.push_str(&self.options.body_style);
        document.push('\n');
        document.push_str(stylesheet);
        document.push_str("</style>\n</head>\n<body>\n");
        document.push_str(&fragment);
        document.push_str("</body>\n</html>\n");

        debug!(input = markdown.len(), output = document.len(), "rendered preview");
        document
    }

    /// Body HTML only, without the surrounding document.
    pub fn render_fragment(&self, markdown: &str) -> String {
        let mut parser_options = Options::empty();
        if self.options.tables {
            parser_options.insert(Options::ENABLE_TABLES);
        }

        let parser = Parser::new_ext(markdown, parser_options);
        let events = EventRewriter::new(&self.options).rewrite(parser);

        let mut fragment = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut fragment, events.into_iter());
        fragment
    }
}

/// Turns fenced code into highlighted HTML, bare URLs into links and raw
/// HTML into escaped text.
struct EventRewriter<'a, 'o> {
    options: &'o RenderOptions,
    events: Vec<Event<'a>>,
    pending_text: String,
    code: Option<CodeCapture>,
    raw_code_depth: usize,
    link_depth: usize,
    html_anchor_depth: usize,
}

struct CodeCapture {
    lang: String,
    source: String,
}

impl<'a, 'o> EventRewriter<'a, 'o> {
    fn new(options: &'o RenderOptions) -> Self {
        Self {
            options,
            events: Vec::new(),
            pending_text: String::new(),
            code: None,
            raw_code_depth: 0,
            link_depth: 0,
            html_anchor_depth: 0,
        }
    }

    fn rewrite(mut self, parser: Parser<'a, 'a>) -> Vec<Event<'a>> {
        for event in parser {
            self.handle(event);
        }
        self.flush_text();
        self.events
    }

    fn handle(&mut self, event: Event<'a>) {
        if let Some(code) = self.code.as_mut() {
            match event {
                Event::Text(text) => code.source.push_str(&text),
                Event::End(Tag::CodeBlock(_)) => {
                    if let Some(code) = self.code.take() {
                        let highlighted = highlight_block(&code.lang, &code.source);
                        self.events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                _ => {}
            }
            return;
        }

        match event {
            Event::Text(text) => self.pending_text.push_str(&text),
            Event::Start(Tag::CodeBlock(kind)) if self.options.fenced_code => {
                self.flush_text();
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => fence_language(info),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code = Some(CodeCapture {
                    lang,
                    source: String::new(),
                });
            }
            Event::Start(tag @ Tag::CodeBlock(_)) => {
                self.flush_text();
                self.raw_code_depth += 1;
                self.events.push(Event::Start(tag));
            }
            Event::End(tag @ Tag::CodeBlock(_)) => {
                self.flush_text();
                self.raw_code_depth = self.raw_code_depth.saturating_sub(1);
                self.events.push(Event::End(tag));
            }
            Event::Start(tag @ (Tag::Link(..) | Tag::Image(..))) => {
                self.flush_text();
                self.link_depth += 1;
                self.events.push(Event::Start(tag));
            }
            Event::End(tag @ (Tag::Link(..) | Tag::Image(..))) => {
                self.flush_text();
                self.link_depth = self.link_depth.saturating_sub(1);
                self.events.push(Event::End(tag));
            }
            Event::Html(raw) => {
                self.flush_text();
                self.html_anchor_depth = anchor_depth_after(self.html_anchor_depth, &raw);
                self.events.push(Event::Text(raw));
            }
            other => {
                self.flush_text();
                self.events.push(other);
            }
        }
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending_text);
        let inside_anchor = self.link_depth > 0 || self.html_anchor_depth > 0;
        if self.options.autolink && !inside_anchor && self.raw_code_depth == 0 {
            push_autolinked(&mut self.events, text);
        } else {
            self.events.push(Event::Text(CowStr::from(text)));
        }
    }
}

fn fence_language(info: &str) -> String {
    info.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_owned()
}

/// Anchor nesting after a chunk of raw HTML that opens or closes `<a>` tags.
fn anchor_depth_after(depth: usize, raw: &str) -> usize {
    static OPEN: OnceLock<Regex> = OnceLock::new();
    static CLOSE: OnceLock<Regex> = OnceLock::new();
    let open = OPEN.get_or_init(|| Regex::new(r"(?i)<a(?:\s|>)").expect("anchor open pattern"));
    let close = CLOSE.get_or_init(|| Regex::new(r"(?i)</a\s*>").expect("anchor close pattern"));

    (depth + open.find_iter(raw).count()).saturating_sub(close.find_iter(raw).count())
}

fn bare_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:(?:https?|ftp)://|www\.)[^\s<>]+|\b[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}\b",
        )
        .expect("bare url pattern compiles")
    })
}

/// Drop trailing sentence punctuation; keep a `)` that closes a `(` in the URL.
fn trim_url_end(candidate: &str) -> &str {
    let mut url = candidate;
    while let Some(last) = url.chars().last() {
        let strip = match last {
            '.' | ',' | ':' | ';' | '!' | '?' | '"' | '\'' | ']' => true,
            ')' => url.matches(')').count() > url.matches('(').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}

fn link_target(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("www.") {
        format!("http://{url}")
    } else if lower.contains("://") {
        url.to_owned()
    } else {
        format!("mailto:{url}")
    }
}

fn push_autolinked(events: &mut Vec<Event<'_>>, text: String) {
    let mut cursor = 0;
    for found in bare_url_pattern().find_iter(&text) {
        let url = trim_url_end(found.as_str());
        if url.is_empty() {
            continue;
        }
        let start = found.start();
        let end = start + url.len();

        if start > cursor {
            events.push(Event::Text(CowStr::from(text[cursor..start].to_owned())));
        }

        let href = link_target(url);
        let tag = || Tag::Link(LinkType::Autolink, CowStr::from(href.clone()), CowStr::from(""));
        events.push(Event::Start(tag()));
        events.push(Event::Text(CowStr::from(url.to_owned())));
        events.push(Event::End(tag()));
        cursor = end;
    }

    if cursor < text.len() {
        events.push(Event::Text(CowStr::from(text[cursor..].to_owned())));
    }
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// Highlighter CSS for every bundled theme, built once per process.
fn theme_stylesheets() -> &'static BTreeMap<String, String> {
    static STYLESHEETS: OnceLock<BTreeMap<String, String>> = OnceLock::new();
    STYLESHEETS.get_or_init(|| {
        let themes = ThemeSet::load_defaults();
        themes
            .themes
            .iter()
            .filter_map(|(name, theme)| {
                css_for_theme_with_class_style(theme, CLASS_STYLE)
                    .map(|css| (name.clone(), css))
                    .map_err(|err| warn!(theme = %name, error = %err, "skipping theme stylesheet"))
                    .ok()
            })
            .collect()
    })
}

/// Names of the themes a [`RenderOptions::theme`] may refer to.
pub fn available_themes() -> impl Iterator<Item = &'static str> {
    theme_stylesheets().keys().map(String::as_str)
}

fn stylesheet(theme: &str) -> &'static str {
    let sheets = theme_stylesheets();
    if let Some(css) = sheets.get(theme) {
        return css;
    }
    warn!(theme, fallback = DEFAULT_THEME, "unknown highlight theme");
    sheets
        .get(DEFAULT_THEME)
        .map(String::as_str)
        .unwrap_or_default()
}

fn resolve_syntax<'s>(syntaxes: &'s SyntaxSet, lang: &str) -> &'s SyntaxReference {
    if lang.is_empty() {
        return syntaxes.find_syntax_plain_text();
    }
    syntaxes
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| syntaxes.find_syntax_plain_text())
}

fn highlight_block(lang: &str, source: &str) -> String {
    let syntaxes = syntax_set();
    let syntax = resolve_syntax(syntaxes, lang);
    let label = if lang.is_empty() { "text" } else { lang };

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, syntaxes, CLASS_STYLE);
    let mut body = None;
    for line in LinesWithEndings::from(source) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            debug!(lang, error = %err, "highlighting failed, emitting plain code");
            body = Some(escape_html(source));
            break;
        }
    }
    let body = body.unwrap_or_else(|| generator.finalize());

    format!(
        "<pre class=\"code\"><code class=\"language-{}\">{}</code></pre>\n",
        escape_html(label),
        body
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_renders_empty_body() {
        let html = render("");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<body>\n</body>"));
    }

    #[test]
    fn fence_language_takes_first_token() {
        assert_eq!(fence_language("ruby linenos"), "ruby");
        assert_eq!(fence_language("   "), "");
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let syntaxes = syntax_set();
        let syntax = resolve_syntax(syntaxes, "no-such-language");
        assert_eq!(syntax.name, syntaxes.find_syntax_plain_text().name);
    }

    #[test]
    fn unknown_theme_uses_default_stylesheet() {
        assert_eq!(stylesheet("Nope"), stylesheet(DEFAULT_THEME));
        assert!(!stylesheet(DEFAULT_THEME).is_empty());
        assert!(available_themes().any(|name| name == DEFAULT_THEME));
    }

    #[test]
    fn trailing_punctuation_is_not_part_of_link() {
        let renderer = Renderer::default();
        let fragment = renderer.render_fragment("See https://example.com/docs.");
        assert!(fragment.contains("<a href=\"https://example.com/docs\">https://example.com/docs</a>."));
    }

    #[test]
    fn balanced_parentheses_stay_in_the_url() {
        assert_eq!(
            trim_url_end("https://en.wikipedia.org/wiki/Rust_(programming_language)"),
            "https://en.wikipedia.org/wiki/Rust_(programming_language)"
        );
        assert_eq!(trim_url_end("https://x.test/a)."), "https://x.test/a");
        assert_eq!(trim_url_end("https://x.test/(a))"), "https://x.test/(a)");
    }

    #[test]
    fn link_targets_by_kind() {
        assert_eq!(link_target("www.x.test"), "http://www.x.test");
        assert_eq!(link_target("ftp://ftp.x.test/pub"), "ftp://ftp.x.test/pub");
        assert_eq!(link_target("me@example.com"), "mailto:me@example.com");
    }

    #[test]
    fn anchor_depth_follows_raw_tags() {
        assert_eq!(anchor_depth_after(0, "<a href=\"x\">"), 1);
        assert_eq!(anchor_depth_after(1, "</a>"), 0);
        assert_eq!(anchor_depth_after(0, "</A >"), 0);
        assert_eq!(anchor_depth_after(0, "<abbr>"), 0);
    }

    #[test]
    fn www_links_get_a_scheme() {
        let fragment = Renderer::default().render_fragment("visit www.rust-lang.org today");
        assert!(fragment.contains("href=\"http://www.rust-lang.org\""));
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
