use pulldown_cmark::{Options, Parser as CmarkParser, html};

/// GitHub-flavored extensions enabled when rendering block contents.
fn gfm_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_GFM
}

/// Render Markdown to HTML. Raw HTML in the source is passed through as-is.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = CmarkParser::new_ext(markdown, gfm_options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
