use crate::parser::lines::{Fence, lines};

/// A section paragraph with its main display fence split out.
#[derive(Debug, Clone, PartialEq)]
pub struct MainDisplaySplit {
    /// Text above and below the fence, concatenated. The whole paragraph if
    /// nothing was extracted.
    pub contents: String,
    /// Inner text of the fence.
    pub markdown: Option<String>,
    pub problems: Vec<FenceProblem>,
}

/// Fences that were seen but not extracted. Offsets are relative to the paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum FenceProblem {
    /// A tagged fence that runs to the end of the section.
    Unclosed { start: usize, end: usize },
    /// A tagged fence after the one already extracted.
    Duplicate { start: usize, end: usize },
}

/// Split the first fence whose info string is `tag` out of `paragraph`.
///
/// Only the first tagged fence is extracted. Fences with other info strings
/// are skipped over, so a tagged fence quoted inside them is left alone.
pub fn extract_main_display(paragraph: &str, tag: &str) -> MainDisplaySplit {
    let mut markdown = None;
    let mut cut = None;
    let mut problems = Vec::new();

    let all: Vec<_> = lines(paragraph).collect();
    let mut i = 0;
    while i < all.len() {
        let open = all[i];
        let Some(fence) = Fence::open(open.text) else {
            i += 1;
            continue;
        };
        let close = all[i + 1..]
            .iter()
            .position(|l| fence.is_closed_by(l.text))
            .map(|p| i + 1 + p);
        let tagged = fence.info == tag;

        match close {
            Some(c) => {
                if tagged && markdown.is_none() {
                    let inner = &paragraph[open.next.min(all[c].start)..all[c].start];
                    let inner = inner.strip_suffix('\n').unwrap_or(inner);
                    let inner = inner.strip_suffix('\r').unwrap_or(inner);
                    if !inner.is_empty() {
                        markdown = Some(inner.to_string());
                        cut = Some((open.start, all[c].end));
                    }
                } else if tagged {
                    problems.push(FenceProblem::Duplicate {
                        start: open.start,
                        end: all[c].end,
                    });
                }
                i = c + 1;
            }
            None => {
                if tagged {
                    problems.push(FenceProblem::Unclosed {
                        start: open.start,
                        end: open.end,
                    });
                }
                // An unclosed fence swallows the rest of the section.
                break;
            }
        }
    }

    let contents = match cut {
        Some((start, end)) => format!("{}{}", &paragraph[..start], &paragraph[end..]),
        None => paragraph.to_string(),
    };

    MainDisplaySplit {
        contents,
        markdown,
        problems,
    }
}
