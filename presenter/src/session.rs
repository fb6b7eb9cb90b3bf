use narrative::block::Block;
use tracing::debug;

use crate::action::{Action, Dispatch, QueryToDisplay};
use crate::error::PresenterError;
use crate::query::parse_query;
use crate::state::{NarrativeState, ProgressMarker};

/// A slideshow over parsed blocks.
///
/// Pages are numbered `0..=blocks.len()`: one per block, then the
/// end-of-narrative page. Moving to a block page dispatches the action that
/// puts the visualization into that block's state.
#[derive(Debug, Clone)]
pub struct NarrativeSession {
    blocks: Vec<Block>,
    current: usize,
    showing_end: bool,
}

impl NarrativeSession {
    pub fn new(blocks: Vec<Block>) -> Result<Self, PresenterError> {
        Self::starting_at(blocks, 0)
    }

    /// Open the narrative at block `index`, e.g. from a `?n=` query.
    pub fn starting_at(blocks: Vec<Block>, index: usize) -> Result<Self, PresenterError> {
        if blocks.is_empty() {
            return Err(PresenterError::Empty);
        }
        if index >= blocks.len() {
            return Err(PresenterError::PageOutOfRange {
                page: index,
                pages: blocks.len() + 1,
            });
        }
        Ok(NarrativeSession {
            blocks,
            current: index,
            showing_end: false,
        })
    }

    /// Number of pages, including the end-of-narrative page.
    pub fn pages(&self) -> usize {
        self.blocks.len() + 1
    }

    pub fn state(&self) -> NarrativeState<'_> {
        NarrativeState {
            loaded: true,
            blocks: &self.blocks,
            current_block_index: self.current,
            showing_end_of_narrative: self.showing_end,
        }
    }

    /// The block in focus. On the end page this is still the last block shown.
    pub fn current_block(&self) -> &Block {
        &self.blocks[self.current]
    }

    /// Dispatch the action for the page the session was opened at.
    pub fn start(&mut self, sink: &mut impl Dispatch) {
        self.show(self.current, sink);
    }

    pub fn go_to_page(&mut self, page: usize, sink: &mut impl Dispatch) -> Result<(), PresenterError> {
        if page >= self.pages() {
            return Err(PresenterError::PageOutOfRange {
                page,
                pages: self.pages(),
            });
        }
        self.show(page, sink);
        Ok(())
    }

    /// Move forward one page. Returns false when already on the end page.
    pub fn next_slide(&mut self, sink: &mut impl Dispatch) -> bool {
        if self.showing_end {
            return false;
        }
        self.show(self.current + 1, sink);
        true
    }

    /// Move back one page. From the end page this returns to the last block.
    /// Returns false on the first block.
    pub fn previous_slide(&mut self, sink: &mut impl Dispatch) -> bool {
        if self.showing_end {
            self.show(self.blocks.len() - 1, sink);
            return true;
        }
        if self.current == 0 {
            return false;
        }
        self.show(self.current - 1, sink);
        true
    }

    pub fn restart(&mut self, sink: &mut impl Dispatch) {
        self.show(0, sink);
    }

    /// Leave narrative mode and hand control back to the visualization.
    pub fn exit(&self, sink: &mut impl Dispatch) {
        sink.dispatch(Action::ToggleNarrative { display: false });
    }

    /// Point the URL at the focused block's dataset when the narrative closes.
    pub fn leave(&self, sink: &mut impl Dispatch) {
        let block = self.current_block();
        sink.dispatch(Action::ChangeUrlQueryButNotReduxState {
            pathname: block.dataset().to_string(),
            query: parse_query(block.query()),
        });
    }

    pub fn progress(&self) -> Vec<ProgressMarker> {
        (0..self.blocks.len())
            .map(|index| ProgressMarker {
                index,
                in_focus: !self.showing_end && index == self.current,
            })
            .collect()
    }

    fn show(&mut self, page: usize, sink: &mut impl Dispatch) {
        if page == self.blocks.len() {
            debug!("showing end of narrative");
            self.showing_end = true;
            return;
        }
        self.showing_end = false;
        self.current = page;

        let block = &self.blocks[page];
        let query = parse_query(block.query());
        let query_to_display = QueryToDisplay { n: page };
        debug!(page, dataset = block.dataset(), "changing narrative page");

        let action = if block.main_display_markdown().is_some() {
            Action::ShowMainDisplayMarkdown {
                query,
                query_to_display,
            }
        } else {
            Action::ChangePage {
                query,
                query_to_display,
                dont_change_dataset: true,
                push: true,
            }
        };
        sink.dispatch(action);
    }
}
