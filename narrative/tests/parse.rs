use narrative::block::Block;
use narrative::config::NarrativeConfig;
use narrative::parser::{ParseErrorKind, Parser};
use narrative::{Narrative, parse_narrative_file};

const FRONT_MATTER: &str = "---
title: Genomic epidemiology of seasonal influenza
authors: Trevor Bedford
authorLinks: https://bedford.io
affiliations: Fred Hutch
date: 2018-07-10
abstract: A short tour.
dataset: https://nextstrain.org/flu/seasonal/h3n2/ha/2y?c=clade_membership
---
";

fn parse(source: &str) -> Narrative {
    Parser::new(source.to_string(), 0).parse().expect("parse failed")
}

fn blocks(body: &str) -> Vec<Block> {
    parse(&format!("{FRONT_MATTER}{body}")).blocks
}

fn error_kind(source: &str) -> ParseErrorKind {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect_err("expected a parse error")
        .kind
}

#[test]
fn title_page_block() {
    let blocks = blocks("");
    assert_eq!(blocks.len(), 1);
    let title = &blocks[0];
    assert!(title.html().contains("<h1>Genomic epidemiology of seasonal influenza</h1>"));
    assert!(title.html().contains(r#"<a href="https://bedford.io">Trevor Bedford</a>"#));
    assert!(title.html().contains("Fred Hutch"));
    assert!(title.html().contains("Created: 2018-07-10"));
    assert!(title.html().contains("<h4>A short tour.</h4>"));
    assert_eq!(title.dataset(), "flu/seasonal/h3n2/ha/2y");
    assert_eq!(title.query(), "c=clade_membership");
}

#[test]
fn one_section_after_front_matter() {
    let blocks = blocks("# [Intro](https://nextstrain.org/flu?c=region)\n\nRegions matter.\n");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].dataset(), "flu");
    assert_eq!(blocks[1].query(), "c=region");
    assert!(blocks[1].html().contains("<h1>Intro</h1>"));
    assert!(blocks[1].html().contains("<p>Regions matter.</p>"));
}

#[test]
fn sections_keep_reading_order() {
    let blocks = blocks(
        "# [One](https://nextstrain.org/a)\nfirst\n\n\
         # [Two](https://nextstrain.org/b?x=1)\nsecond\n\n\
         ## [Three](http://localhost:4000/c)\nthird\n",
    );
    let datasets: Vec<&str> = blocks.iter().map(|b| b.dataset()).collect();
    assert_eq!(datasets, vec!["flu/seasonal/h3n2/ha/2y", "a", "b", "c"]);
    assert!(blocks[3].html().contains("<h1>Three</h1>"));
}

#[test]
fn consecutive_headings_are_not_an_error() {
    let blocks = blocks("# [A](https://nextstrain.org/a)\n# [B](https://nextstrain.org/b)\n");
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[1].html(), "<h1>A</h1>\n");
    assert_eq!(blocks[2].html(), "<h1>B</h1>\n");
}

#[test]
fn headings_with_trailing_text_stay_in_the_section() {
    let blocks = blocks(
        "# [A](https://nextstrain.org/a)\ntext\n## [Docs](https://nextstrain.org/a) (2020)\nmore\n",
    );
    assert_eq!(blocks.len(), 2);
    assert!(blocks[1].html().contains("(2020)</h2>"));
    assert!(blocks[1].html().contains("<p>more</p>"));
}

#[test]
fn empty_host_list_does_not_accept_every_url() {
    let config = NarrativeConfig {
        hosts: Vec::new(),
        ..NarrativeConfig::default()
    };
    let source = "---\ntitle: T\ndataset: https://example.com/zika\n---\n".to_string();
    let err = Parser::with_config(source, 0, config).parse().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Config);
}

#[test]
fn main_display_markdown_is_split_out() {
    let blocks = blocks(
        "# [Table](https://nextstrain.org/ncov?d=map)\n\
         Look at the table.\n\
         ```auspiceMainDisplayMarkdown\n\
         | clade | count |\n\
         |-------|-------|\n\
         | 19A   | 10    |\n\
         ```\n\
         Afterwards.\n",
    );
    let block = &blocks[1];
    assert_eq!(
        block.main_display_markdown(),
        Some("| clade | count |\n|-------|-------|\n| 19A   | 10    |")
    );
    assert!(block.html().contains("Look at the table."));
    assert!(block.html().contains("Afterwards."));
    assert!(!block.html().contains("clade"));
    assert!(!block.html().contains("auspiceMainDisplayMarkdown"));
}

#[test]
fn sections_without_fence_have_no_main_display() {
    let blocks = blocks("# [A](https://nextstrain.org/a)\ntext\n");
    assert_eq!(blocks[1].main_display_markdown(), None);
}

#[test]
fn raw_html_passes_through() {
    let blocks = blocks("# [A](https://nextstrain.org/a)\n<div class=\"note\">hi</div>\n");
    assert!(blocks[1].html().contains("<div class=\"note\">hi</div>"));
}

#[test]
fn missing_title_or_dataset_fails() {
    assert_eq!(
        error_kind("---\ndataset: https://nextstrain.org/a\n---\n"),
        ParseErrorKind::FrontMatter
    );
    assert_eq!(error_kind("---\ntitle: T\n---\n"), ParseErrorKind::FrontMatter);
    assert_eq!(error_kind("no front matter at all"), ParseErrorKind::FrontMatter);
    assert_eq!(error_kind("---\ntitle: [unclosed\n---\n"), ParseErrorKind::FrontMatter);
}

#[test]
fn malformed_section_urls_fail() {
    for url in [
        "https://example.org/flu",
        "/flu?c=region",
        "https://nextstrain.org",
        "https://nextstrain.org/",
        "https://nextstrain.org/?c=region",
    ] {
        let source = format!("{FRONT_MATTER}# [Bad]({url})\n");
        assert_eq!(error_kind(&source), ParseErrorKind::InvalidDatasetUrl, "{url}");
    }
}

#[test]
fn an_invalid_section_aborts_the_whole_parse() {
    let source = format!(
        "{FRONT_MATTER}# [Good](https://nextstrain.org/a)\n\n# [Bad](https://example.org/b)\n"
    );
    assert!(Parser::new(source, 0).parse().is_err());
}

#[test]
fn author_arrays_degrade_to_a_warning() {
    let narrative = parse(
        "---\ntitle: T\nauthors:\n  - A\n  - B\ndataset: https://nextstrain.org/a\n---\n\
         # [S](https://nextstrain.org/s)\n",
    );
    assert_eq!(narrative.blocks.len(), 2);
    assert!(!narrative.blocks[0].html().contains("Author"));
    assert_eq!(narrative.warnings.len(), 1);
    assert_eq!(narrative.warnings[0].kind, ParseErrorKind::Unsupported);
}

#[test]
fn reparsing_is_deterministic() {
    let source = format!(
        "{FRONT_MATTER}# [A](https://nextstrain.org/a?x=1)\nalpha\n\
         ```auspiceMainDisplayMarkdown\nside\n```\n# [B](https://nextstrain.org/b)\n"
    );
    let first = parse_narrative_file(&source).unwrap();
    let second = parse_narrative_file(&source).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn blocks_serialize_as_wire_records() {
    let blocks = blocks("# [A](https://nextstrain.org/a?c=num_date)\ntext\n");
    let json = serde_json::to_value(&blocks).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["dataset"], "a");
    assert_eq!(records[1]["query"], "c=num_date");
    assert!(records[1]["__html"].as_str().unwrap().starts_with("<h1>A</h1>"));
}
