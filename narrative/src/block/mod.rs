pub mod main_display;

use std::ops::Range;

use serde::Serialize;

use crate::dataset_url::HostMatcher;
use crate::html::markdown_to_html;
use crate::parser::error::{ParseError, ParseErrorKind};

/// One slide of a narrative: the title page or one body section.
///
/// Blocks are immutable. Build them with [`BlockBuilder`], which decomposes the
/// dataset URL and renders the Markdown as the values are set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "__html")]
    html: String,
    dataset: String,
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_display_markdown: Option<String>,
    /// Byte span in source for error reporting.
    #[serde(skip)]
    span: Range<usize>,
}

impl Block {
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn main_display_markdown(&self) -> Option<&str> {
        self.main_display_markdown.as_deref()
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

/// Accumulates the parts of a [`Block`].
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    html: Option<String>,
    dataset: Option<String>,
    query: String,
    main_display_markdown: Option<String>,
    span: Range<usize>,
    file_id: usize,
}

impl BlockBuilder {
    pub fn new(span: Range<usize>, file_id: usize) -> Self {
        BlockBuilder {
            html: None,
            dataset: None,
            query: String::new(),
            main_display_markdown: None,
            span,
            file_id,
        }
    }

    /// Decompose `url` into dataset and query. `url_span` labels the error.
    pub fn set_url(
        &mut self,
        hosts: &HostMatcher,
        url: &str,
        url_span: Range<usize>,
    ) -> Result<&mut Self, ParseError> {
        let parts = hosts.decompose(url).ok_or_else(|| {
            ParseError::error(
                ParseErrorKind::InvalidDatasetUrl,
                format!("cannot find a dataset in URL `{}`", url),
                url_span,
                self.file_id,
            )
            .with_note("expected a URL of the form https://nextstrain.org/<dataset>?<query>")
        })?;
        self.dataset = Some(parts.dataset);
        self.query = parts.query;
        Ok(self)
    }

    /// Render `markdown` to HTML and store it as the block contents.
    pub fn set_contents(&mut self, markdown: &str) -> &mut Self {
        self.html = Some(markdown_to_html(markdown));
        self
    }

    pub fn set_main_display_markdown(&mut self, markdown: impl Into<String>) -> &mut Self {
        self.main_display_markdown = Some(markdown.into());
        self
    }

    /// Finish the block. Both a URL and contents must have been set.
    pub fn build(self) -> Result<Block, ParseError> {
        let Some(dataset) = self.dataset else {
            return Err(ParseError::error(
                ParseErrorKind::InvalidDatasetUrl,
                "block has no dataset URL",
                self.span,
                self.file_id,
            ));
        };
        Ok(Block {
            html: self.html.unwrap_or_default(),
            dataset,
            query: self.query,
            main_display_markdown: self.main_display_markdown,
            span: self.span,
        })
    }
}
