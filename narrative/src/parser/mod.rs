pub mod error;
pub(crate) mod lines;
mod segment;

pub use error::{ParseError, ParseErrorKind};

use std::ops::Range;

use tracing::{debug, warn};

use crate::Narrative;
use crate::block::main_display::{FenceProblem, extract_main_display};
use crate::block::{Block, BlockBuilder};
use crate::config::NarrativeConfig;
use crate::dataset_url::HostMatcher;
use crate::front_matter::{FrontMatter, make_front_matter_block, split_front_matter};
use segment::Section;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    config: NarrativeConfig,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Self::with_config(source, file_id, NarrativeConfig::default())
    }

    pub fn with_config(source: String, file_id: usize, config: NarrativeConfig) -> Self {
        Parser {
            source,
            file_id,
            config,
        }
    }

    /// Parse the narrative into its title-page block followed by one block per
    /// section. The first fatal error aborts the parse.
    pub fn parse(&self) -> Result<Narrative, ParseError> {
        let hosts = self
            .config
            .validate()
            .and_then(|()| HostMatcher::new(&self.config.hosts))
            .map_err(|e| {
                ParseError::error(ParseErrorKind::Config, e.to_string(), 0..0, self.file_id)
            })?;

        let split = split_front_matter(&self.source);
        let span = match split.yaml {
            Some(_) => split.front_matter_span.clone(),
            None => self.first_line_span(),
        };
        let front_matter = match split.yaml {
            Some(yaml) => FrontMatter::from_yaml(yaml, span.clone(), self.file_id)?,
            None => FrontMatter::default(),
        };

        let mut warnings = Vec::new();
        let mut blocks = vec![make_front_matter_block(
            &front_matter,
            &hosts,
            span,
            self.file_id,
            &mut warnings,
        )?];

        for section in segment::segment(split.body, split.body_offset, self.file_id)? {
            blocks.push(self.section_block(&hosts, section, &mut warnings)?);
        }
        debug!(blocks = blocks.len(), warnings = warnings.len(), "parsed narrative");

        Ok(Narrative {
            blocks,
            warnings,
            source_id: self.file_id,
        })
    }

    fn section_block(
        &self,
        hosts: &HostMatcher,
        section: Section<'_>,
        warnings: &mut Vec<ParseError>,
    ) -> Result<Block, ParseError> {
        let split = extract_main_display(section.paragraph, &self.config.main_display_tag);
        for problem in &split.problems {
            let warning = self.fence_warning(problem).shifted(section.paragraph_offset);
            warn!(section = section.title, "{}", warning.message);
            warnings.push(warning);
        }

        let contents = format!("# {}\n{}", section.title, split.contents);
        let mut builder = BlockBuilder::new(section.span.clone(), self.file_id);
        builder
            .set_url(hosts, section.url, section.url_span.clone())?
            .set_contents(&contents);
        if let Some(markdown) = split.markdown {
            builder.set_main_display_markdown(markdown);
        }
        builder.build()
    }

    fn fence_warning(&self, problem: &FenceProblem) -> ParseError {
        let tag = &self.config.main_display_tag;
        match problem {
            FenceProblem::Unclosed { start, end } => ParseError::warning(
                ParseErrorKind::UnclosedFence,
                format!("`{}` block is never closed", tag),
                *start..*end,
                self.file_id,
            ),
            FenceProblem::Duplicate { start, end } => ParseError::warning(
                ParseErrorKind::DuplicateMainDisplay,
                format!("only the first `{}` block of a section is used", tag),
                *start..*end,
                self.file_id,
            )
            .with_note("this block is rendered as ordinary content"),
        }
    }

    /// Label for front matter errors when the file has none.
    fn first_line_span(&self) -> Range<usize> {
        let end = self.source.find('\n').unwrap_or(self.source.len());
        0..end
    }
}
