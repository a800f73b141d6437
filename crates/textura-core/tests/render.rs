use textura_core::{render, RenderOptions, Renderer};
use textura_test_support::{test_config, SAMPLE_DOCUMENT};

#[test]
fn fenced_ruby_block_is_highlighted() {
    let html = render("```ruby\nputs 1\n```");

    assert!(html.contains("<pre class=\"code\"><code class=\"language-ruby\">"));
    assert!(html.contains("<span class=\""));
    assert!(html.contains("puts"));
    assert!(!html.contains("```"));
}

#[test]
fn output_is_a_complete_document_with_styles() {
    let html = render("hello");

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<style>"));
    assert!(html.contains("body { font-family: sans-serif; margin: 1em; line-height: 1.5; }"));
    assert!(html.contains(".code"));
    assert!(html.contains("<p>hello</p>"));
    assert!(html.trim_end().ends_with("</html>"));
}

#[test]
fn rendering_is_deterministic() {
    assert_eq!(render(SAMPLE_DOCUMENT), render(SAMPLE_DOCUMENT));
}

#[test]
fn tables_and_bare_urls_are_recognised() {
    let html = render(SAMPLE_DOCUMENT);

    assert!(html.contains("<table>"));
    assert!(html.contains("<a href=\"https://example.com\">https://example.com</a>"));
}

#[test]
fn urls_inside_code_and_links_are_left_alone() {
    let fragment = Renderer::default()
        .render_fragment("`https://in.code` and [label](https://x.test) and https://bare.test");

    assert!(fragment.contains("<code>https://in.code</code>"));
    assert!(fragment.contains("<a href=\"https://x.test\">label</a>"));
    assert!(fragment.contains("<a href=\"https://bare.test\">https://bare.test</a>"));
    assert_eq!(fragment.matches("<a ").count(), 2);
}

#[test]
fn raw_html_is_shown_as_text() {
    let fragment = Renderer::default()
        .render_fragment("hi <script>alert(1)</script>\n\n<img src=x onerror=alert(1)>");

    assert!(fragment.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(fragment.contains("&lt;img src=x onerror=alert(1)&gt;"));
    assert!(!fragment.contains("<script"));
    assert!(!fragment.contains("<img"));
}

#[test]
fn url_inside_raw_anchor_is_not_linked_again() {
    let fragment =
        Renderer::default().render_fragment("see <a href=\"https://x.test\">https://x.test</a> now");

    assert!(fragment.contains("&lt;a href=&quot;https://x.test&quot;&gt;https://x.test&lt;/a&gt;"));
    assert!(!fragment.contains("<a "));
}

#[test]
fn emails_and_ftp_urls_are_linked() {
    let fragment =
        Renderer::default().render_fragment("mail me@example.com or ftp://ftp.example.org/pub");

    assert!(fragment.contains("<a href=\"mailto:me@example.com\">me@example.com</a>"));
    assert!(fragment
        .contains("<a href=\"ftp://ftp.example.org/pub\">ftp://ftp.example.org/pub</a>"));
}

#[test]
fn parentheses_in_urls_follow_balance() {
    let fragment = Renderer::default().render_fragment(
        "https://en.wikipedia.org/wiki/Rust_(programming_language) and (see https://x.test/a)",
    );

    assert!(fragment.contains(
        "<a href=\"https://en.wikipedia.org/wiki/Rust_(programming_language)\">"
    ));
    assert!(fragment.contains("<a href=\"https://x.test/a\">https://x.test/a</a>)"));
}

#[test]
fn unknown_fence_language_renders_as_plain_text() {
    let html = render("```nosuchlang\n<tag> & stuff\n```\n");

    assert!(html.contains("language-nosuchlang"));
    assert!(html.contains("&lt;tag&gt; &amp; stuff"));
}

#[test]
fn malformed_markdown_degrades_to_text() {
    let html = render("**unclosed [link( <b");
    assert!(html.contains("**unclosed [link("));
}

#[test]
fn disabled_extensions_fall_back_to_plain_commonmark() {
    let mut options = RenderOptions::from(&test_config().render);
    options.tables = false;
    options.autolink = false;
    options.fenced_code = false;
    let renderer = Renderer::new(options);

    let fragment = renderer.render_fragment(SAMPLE_DOCUMENT);
    assert!(!fragment.contains("<table>"));
    assert!(!fragment.contains("<a href"));
    assert!(fragment.contains("<pre><code class=\"language-ruby\">puts 1\n</code></pre>"));
}

#[test]
fn configured_theme_changes_the_stylesheet() {
    let default_doc = render("x");
    let mut options = RenderOptions::default();
    options.theme = "Solarized (dark)".into();
    let themed = Renderer::new(options).render("x");

    assert_ne!(default_doc, themed);
}
