use serde::Serialize;

use crate::query::Query;

/// The slide shown in the URL, as `?n=<index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryToDisplay {
    pub n: usize,
}

/// State-changing messages a session sends to the host application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Action {
    /// Apply a block's query to the visualization and record the slide index.
    ChangePage {
        query: Query,
        query_to_display: QueryToDisplay,
        dont_change_dataset: bool,
        push: bool,
    },
    /// Replace the main panel with the block's main display markdown.
    ShowMainDisplayMarkdown {
        query: Query,
        query_to_display: QueryToDisplay,
    },
    ToggleNarrative {
        display: bool,
    },
    /// Update the browser URL to the block's dataset without touching state.
    ChangeUrlQueryButNotReduxState {
        pathname: String,
        query: Query,
    },
}

/// Receives actions from a session.
pub trait Dispatch {
    fn dispatch(&mut self, action: Action);
}

impl Dispatch for Vec<Action> {
    fn dispatch(&mut self, action: Action) {
        self.push(action);
    }
}

impl<F: FnMut(Action)> Dispatch for F {
    fn dispatch(&mut self, action: Action) {
        (*self)(action);
    }
}
