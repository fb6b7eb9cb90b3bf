use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::parser::error::{ParseError, ParseErrorKind};
use crate::parser::lines::{Fence, Line, lines};

/// `# [text](url)`: an ATX heading whose whole content is one link.
static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}#{1,6}[ \t]+\[(?P<text>[^\]]+)\]\((?P<url>[^)\s]*)\)[ \t]*$")
        .expect("section heading pattern is valid")
});

/// One body section: its heading link and the paragraph up to the next heading.
/// Spans and offsets are absolute positions in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Section<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub url_span: Range<usize>,
    pub paragraph: &'a str,
    pub paragraph_offset: usize,
    /// Heading line through the end of the paragraph.
    pub span: Range<usize>,
}

struct Heading<'a> {
    title: &'a str,
    url: &'a str,
    url_span: Range<usize>,
    line: Line<'a>,
}

enum ScanState<'a> {
    /// Before the first section heading. Anything seen here is dropped.
    SeekingHeading,
    /// Inside a section; the paragraph runs from the heading to the next one.
    ConsumingParagraph(Heading<'a>),
}

/// Split the body (the text after the front matter) into sections.
///
/// `offset` is the body's position in the source, used for spans.
pub(crate) fn segment(
    body: &str,
    offset: usize,
    file_id: usize,
) -> Result<Vec<Section<'_>>, ParseError> {
    let mut sections = Vec::new();
    let mut state = ScanState::SeekingHeading;
    let mut open_fence: Option<Fence<'_>> = None;

    for line in lines(body) {
        if let Some(fence) = &open_fence {
            if fence.is_closed_by(line.text) {
                open_fence = None;
            }
            continue;
        }
        if let Some(fence) = Fence::open(line.text) {
            open_fence = Some(fence);
            continue;
        }
        let Some(heading) = parse_heading(line, offset, file_id)? else {
            continue;
        };

        match std::mem::replace(&mut state, ScanState::ConsumingParagraph(heading)) {
            ScanState::SeekingHeading => {
                let preamble = &body[..line.start];
                if !preamble.trim().is_empty() {
                    debug!(bytes = preamble.len(), "ignoring text before the first section");
                }
            }
            ScanState::ConsumingParagraph(previous) => {
                sections.push(close_section(body, offset, previous, line.start));
            }
        }
    }

    match state {
        ScanState::SeekingHeading => {
            if !body.trim().is_empty() {
                debug!("narrative body has no section headings");
            }
        }
        ScanState::ConsumingParagraph(last) => {
            sections.push(close_section(body, offset, last, body.len()));
        }
    }

    Ok(sections)
}

/// Recognize a section heading line. A heading link with an empty URL is an
/// error; a heading with anything besides the link is paragraph text.
fn parse_heading<'a>(
    line: Line<'a>,
    offset: usize,
    file_id: usize,
) -> Result<Option<Heading<'a>>, ParseError> {
    let Some(caps) = SECTION_HEADING.captures(line.text) else {
        return Ok(None);
    };
    let (Some(title), Some(url)) = (caps.name("text"), caps.name("url")) else {
        return Ok(None);
    };
    let url_span = offset + line.start + url.start()..offset + line.start + url.end();
    let line_span = offset + line.start..offset + line.end;

    if url.as_str().is_empty() {
        return Err(ParseError::error(
            ParseErrorKind::MalformedHeading,
            format!("section `{}` has no dataset URL", title.as_str()),
            line_span,
            file_id,
        )
        .with_note("section headings must be a single link: # [title](url)"));
    }
    Ok(Some(Heading {
        title: title.as_str(),
        url: url.as_str(),
        url_span,
        line,
    }))
}

fn close_section<'a>(
    body: &'a str,
    offset: usize,
    heading: Heading<'a>,
    end: usize,
) -> Section<'a> {
    let raw = &body[heading.line.next.min(end)..end];
    let (skip, paragraph) = strip_blank_lines(raw);
    Section {
        title: heading.title,
        url: heading.url,
        url_span: heading.url_span,
        paragraph,
        paragraph_offset: offset + heading.line.next + skip,
        span: offset + heading.line.start..offset + end,
    }
}

/// Drop leading blank lines and trailing whitespace. Returns the number of
/// bytes skipped at the front.
fn strip_blank_lines(raw: &str) -> (usize, &str) {
    let text = raw.trim_end();
    let skip = lines(text)
        .find(|l| !l.text.trim().is_empty())
        .map(|l| l.start)
        .unwrap_or(text.len());
    (skip, &text[skip..])
}
