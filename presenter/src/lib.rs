pub mod action;
pub mod error;
pub mod query;
pub mod session;
pub mod state;

pub use action::{Action, Dispatch, QueryToDisplay};
pub use error::PresenterError;
pub use session::NarrativeSession;
pub use state::{NarrativeState, ProgressMarker};
