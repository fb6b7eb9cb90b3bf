//! Line and code-fence helpers shared by the body scanner and the
//! main display extraction.

/// A line of text without its terminator, with byte offsets into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Line<'a> {
    /// Offset of the first byte of the line.
    pub start: usize,
    /// Offset just past the line content (before `\r\n` / `\n`).
    pub end: usize,
    /// Offset of the next line.
    pub next: usize,
    pub text: &'a str,
}

pub(crate) fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let content = raw.strip_suffix('\n').unwrap_or(raw);
        let content = content.strip_suffix('\r').unwrap_or(content);
        Line {
            start,
            end: start + content.len(),
            next: offset,
            text: content,
        }
    })
}

/// An opening code fence: three or more backticks or tildes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fence<'a> {
    marker: char,
    len: usize,
    pub info: &'a str,
}

impl<'a> Fence<'a> {
    /// Recognize an opening fence line (up to three spaces of indentation).
    pub fn open(line: &'a str) -> Option<Self> {
        let body = strip_indent(line)?;
        let marker = body.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = body.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        let info = body[len..].trim();
        // Backtick fences cannot carry backticks in their info string.
        if marker == '`' && info.contains('`') {
            return None;
        }
        Some(Fence { marker, len, info })
    }

    /// Whether `line` closes this fence.
    pub fn is_closed_by(&self, line: &str) -> bool {
        let Some(body) = strip_indent(line) else {
            return false;
        };
        let run = body.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && body[run..].trim().is_empty()
    }
}

fn strip_indent(line: &str) -> Option<&str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    (indent <= 3).then(|| &line[indent..])
}
