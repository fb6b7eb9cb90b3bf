//! YAML front matter: extraction from the raw file and the title-page block.

use std::ops::Range;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::warn;

use crate::block::{Block, BlockBuilder};
use crate::dataset_url::HostMatcher;
use crate::parser::error::{ParseError, ParseErrorKind};
use crate::parser::lines::lines;

const FORMAT_ERROR: &str = "Incorrectly formatted frontmatter in narrative file";

/// The raw file cut into its front matter and body.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSource<'a> {
    /// YAML text between the `---` delimiters, if the file has front matter.
    pub yaml: Option<&'a str>,
    /// Span of the whole front matter, delimiters included.
    pub front_matter_span: Range<usize>,
    pub body: &'a str,
    /// Byte offset of `body` in the source.
    pub body_offset: usize,
}

/// Cut `source` at its `---` delimited front matter.
///
/// Without an opening `---` line, or without a closing one, the whole file is body.
pub fn split_front_matter(source: &str) -> SplitSource<'_> {
    let bom = if source.starts_with('\u{feff}') { '\u{feff}'.len_utf8() } else { 0 };
    let content = &source[bom..];
    let no_front_matter = SplitSource {
        yaml: None,
        front_matter_span: bom..bom,
        body: content,
        body_offset: bom,
    };

    let mut all = lines(content);
    let Some(open) = all.next().filter(|l| l.text.trim_end() == "---") else {
        return no_front_matter;
    };
    let Some(close) = all.find(|l| l.text.starts_with("---")) else {
        return no_front_matter;
    };

    SplitSource {
        yaml: Some(&content[open.next..close.start]),
        front_matter_span: bom..bom + close.end,
        body: &content[close.next..],
        body_offset: bom + close.next,
    }
}

/// Recognized front matter keys. Values stay untyped so that unsupported
/// shapes (an author list, say) can be reported instead of failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrontMatter {
    pub title: Option<Value>,
    pub authors: Option<Value>,
    #[serde(rename = "authorLinks")]
    pub author_links: Option<Value>,
    pub affiliations: Option<Value>,
    pub date: Option<Value>,
    pub updated: Option<Value>,
    #[serde(rename = "abstract")]
    pub summary: Option<Value>,
    pub dataset: Option<Value>,
}

impl FrontMatter {
    /// Deserialize the YAML between the delimiters. Empty YAML is an empty record.
    pub fn from_yaml(yaml: &str, span: Range<usize>, file_id: usize) -> Result<Self, ParseError> {
        if yaml.trim().is_empty() {
            return Ok(FrontMatter::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| {
            ParseError::error(ParseErrorKind::FrontMatter, FORMAT_ERROR, span, file_id)
                .with_note(format!("YAML error: {}", e))
        })
    }
}

/// How a single front matter value can be used.
#[derive(Debug, Clone, PartialEq)]
enum Field {
    Absent,
    Text(String),
    Unsupported(&'static str),
}

fn classify(value: Option<&Value>) -> Field {
    match value {
        None | Some(Value::Null) => Field::Absent,
        Some(Value::String(s)) if s.is_empty() => Field::Absent,
        Some(Value::String(s)) => Field::Text(s.clone()),
        Some(Value::Number(n)) => Field::Text(n.to_string()),
        Some(Value::Bool(b)) => Field::Text(b.to_string()),
        Some(Value::Sequence(_)) => Field::Unsupported("array"),
        Some(Value::Mapping(_)) => Field::Unsupported("mapping"),
        Some(Value::Tagged(tagged)) => classify(Some(&tagged.value)),
    }
}

/// Collects warnings for the title page.
struct Warnings<'w> {
    out: &'w mut Vec<ParseError>,
    span: Range<usize>,
    file_id: usize,
}

impl Warnings<'_> {
    fn push(&mut self, message: String) {
        warn!("Narrative parsing -- {}", message);
        self.out.push(ParseError::warning(
            ParseErrorKind::Unsupported,
            message,
            self.span.clone(),
            self.file_id,
        ));
    }

    /// Text of an optional field; unsupported shapes are reported and dropped.
    fn optional(&mut self, key: &str, value: Option<&Value>) -> Option<String> {
        match classify(value) {
            Field::Text(s) => Some(s),
            Field::Absent => None,
            Field::Unsupported(shape) => {
                self.push(format!("front matter `{}` cannot be a {}, ignoring it", key, shape));
                None
            }
        }
    }
}

/// Assemble the title-page Markdown: title, author line, dates and abstract,
/// skipping whatever is absent.
fn title_page_markdown(title: &str, fm: &FrontMatter, warnings: &mut Warnings<'_>) -> String {
    let mut markdown = vec![format!("# {}", title)];

    match classify(fm.authors.as_ref()) {
        Field::Absent => {}
        Field::Unsupported("array") => warnings.push("can't do author arrays yet".to_string()),
        Field::Unsupported(shape) => {
            warnings.push(format!("front matter `authors` cannot be a {}, ignoring it", shape))
        }
        Field::Text(authors) => {
            let mut line = match warnings.optional("authorLinks", fm.author_links.as_ref()) {
                Some(link) => format!("### Author: [{}]({})", authors, link),
                None => format!("### Author: {}", authors),
            };
            match warnings.optional("affiliations", fm.affiliations.as_ref()) {
                Some(affiliations) => {
                    line.push_str(" <sup> 1 </sup>");
                    markdown.push(line);
                    markdown.push(format!("<sup> 1 </sup> {}", affiliations));
                }
                None => markdown.push(line),
            }
        }
    }

    if let Some(date) = warnings.optional("date", fm.date.as_ref()) {
        markdown.push(format!("### Created: {}", date));
    }
    if let Some(updated) = warnings.optional("updated", fm.updated.as_ref()) {
        markdown.push(format!("### Updated: {}", updated));
    }
    if let Some(summary) = warnings.optional("abstract", fm.summary.as_ref()) {
        markdown.push(format!("#### {}", summary));
    }

    markdown.join("\n")
}

/// Build the title-page block. `title` and `dataset` are required; problems
/// with optional fields are appended to `warnings`.
pub fn make_front_matter_block(
    fm: &FrontMatter,
    hosts: &HostMatcher,
    span: Range<usize>,
    file_id: usize,
    warnings: &mut Vec<ParseError>,
) -> Result<Block, ParseError> {
    let missing = |what: &str| {
        ParseError::error(ParseErrorKind::FrontMatter, FORMAT_ERROR, span.clone(), file_id)
            .with_note(format!("`{}` must be set to a non-empty string", what))
    };
    let Field::Text(title) = classify(fm.title.as_ref()) else {
        return Err(missing("title"));
    };
    let Field::Text(dataset) = classify(fm.dataset.as_ref()) else {
        return Err(missing("dataset"));
    };

    let mut sink = Warnings {
        out: warnings,
        span: span.clone(),
        file_id,
    };
    let markdown = title_page_markdown(&title, fm, &mut sink);

    let mut builder = BlockBuilder::new(span.clone(), file_id);
    builder
        .set_url(hosts, &dataset, span)?
        .set_contents(&markdown);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_HOSTS;

    fn hosts() -> HostMatcher {
        HostMatcher::new(DEFAULT_HOSTS).unwrap()
    }

    fn front_matter(yaml: &str) -> FrontMatter {
        FrontMatter::from_yaml(yaml, 0..yaml.len(), 0).unwrap()
    }

    fn markdown_for(yaml: &str) -> (String, Vec<ParseError>) {
        let fm = front_matter(yaml);
        let mut out = Vec::new();
        let mut sink = Warnings {
            out: &mut out,
            span: 0..0,
            file_id: 0,
        };
        let title = match classify(fm.title.as_ref()) {
            Field::Text(t) => t,
            _ => String::new(),
        };
        let md = title_page_markdown(&title, &fm, &mut sink);
        (md, out)
    }

    #[test]
    fn split_finds_front_matter_and_body() {
        let src = "---\ntitle: T\n---\n# [A](https://nextstrain.org/a)\n";
        let split = split_front_matter(src);
        assert_eq!(split.yaml, Some("title: T\n"));
        assert_eq!(split.front_matter_span, 0..16);
        assert_eq!(split.body, "# [A](https://nextstrain.org/a)\n");
        assert_eq!(split.body_offset, 17);
    }

    #[test]
    fn split_without_front_matter() {
        let split = split_front_matter("# Just markdown\n");
        assert_eq!(split.yaml, None);
        assert_eq!(split.body, "# Just markdown\n");
    }

    #[test]
    fn split_unclosed_front_matter_is_body() {
        let split = split_front_matter("---\ntitle: T\n");
        assert_eq!(split.yaml, None);
        assert_eq!(split.body_offset, 0);
    }

    #[test]
    fn split_skips_bom() {
        let split = split_front_matter("\u{feff}---\ntitle: T\n---\nbody");
        assert_eq!(split.yaml, Some("title: T\n"));
        assert_eq!(split.body, "body");
        assert_eq!(split.body_offset, 3 + 17);
    }

    #[test]
    fn full_title_page_in_fixed_order() {
        let (md, warnings) = markdown_for(
            "title: Zika\nauthors: Jane Doe\nauthorLinks: https://jane.example\n\
             affiliations: Fred Hutch\ndate: 2018-01-02\nupdated: 2019-03-04\n\
             abstract: How it spread.\ndataset: https://nextstrain.org/zika\n",
        );
        assert!(warnings.is_empty());
        assert_eq!(
            md,
            "# Zika\n\
             ### Author: [Jane Doe](https://jane.example) <sup> 1 </sup>\n\
             <sup> 1 </sup> Fred Hutch\n\
             ### Created: 2018-01-02\n\
             ### Updated: 2019-03-04\n\
             #### How it spread."
        );
    }

    #[test]
    fn absent_fields_are_omitted() {
        let (md, warnings) = markdown_for("title: Zika\nauthors: Jane\ndataset: x\n");
        assert!(warnings.is_empty());
        assert_eq!(md, "# Zika\n### Author: Jane");
    }

    #[test]
    fn author_array_warns_and_drops_author_line() {
        let (md, warnings) = markdown_for(
            "title: Zika\nauthors:\n  - A\n  - B\naffiliations: Somewhere\ndate: today\n",
        );
        assert_eq!(md, "# Zika\n### Created: today");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("can't do author arrays yet"));
        assert!(warnings[0].is_warning());
    }

    #[test]
    fn non_scalar_optional_field_warns() {
        let (md, warnings) = markdown_for("title: T\nabstract:\n  a: b\n");
        assert_eq!(md, "# T");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("`abstract`"));
    }

    #[test]
    fn numbers_are_rendered_as_text() {
        let (md, _) = markdown_for("title: T\ndate: 2019\n");
        assert_eq!(md, "# T\n### Created: 2019");
    }

    #[test]
    fn block_has_title_heading_and_dataset() {
        let fm = front_matter("title: Flu\ndataset: https://nextstrain.org/flu?c=region\n");
        let mut warnings = Vec::new();
        let block = make_front_matter_block(&fm, &hosts(), 0..10, 0, &mut warnings).unwrap();
        assert!(block.html().contains("<h1>Flu</h1>"), "{}", block.html());
        assert_eq!(block.dataset(), "flu");
        assert_eq!(block.query(), "c=region");
    }

    #[test]
    fn missing_title_or_dataset_is_a_format_error() {
        for yaml in [
            "dataset: https://nextstrain.org/flu\n",
            "title: Flu\n",
            "title: ''\ndataset: https://nextstrain.org/flu\n",
            "title: [a, b]\ndataset: https://nextstrain.org/flu\n",
            "",
        ] {
            let fm = front_matter(yaml);
            let err = make_front_matter_block(&fm, &hosts(), 0..1, 0, &mut Vec::new()).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::FrontMatter, "{yaml:?}");
            assert_eq!(err.message, FORMAT_ERROR);
        }
    }

    #[test]
    fn unparseable_yaml_is_a_format_error() {
        let err = FrontMatter::from_yaml("- just\n- a list\n", 0..5, 0).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::FrontMatter);
        assert!(!err.notes.is_empty());
    }

    #[test]
    fn dataset_without_known_host_is_an_error() {
        let fm = front_matter("title: Flu\ndataset: https://example.com/flu\n");
        let err = make_front_matter_block(&fm, &hosts(), 0..1, 0, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidDatasetUrl);
    }
}
