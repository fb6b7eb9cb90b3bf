use narrative::block::Block;
use serde::Serialize;

/// Read-only view of a narrative as the presentation layer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeState<'a> {
    pub loaded: bool,
    pub blocks: &'a [Block],
    pub current_block_index: usize,
    pub showing_end_of_narrative: bool,
}

impl NarrativeState<'_> {
    /// State before any narrative has been loaded.
    pub fn unloaded() -> NarrativeState<'static> {
        NarrativeState {
            loaded: false,
            blocks: &[],
            current_block_index: 0,
            showing_end_of_narrative: false,
        }
    }

    pub fn current_block(&self) -> Option<&Block> {
        if self.showing_end_of_narrative {
            return None;
        }
        self.blocks.get(self.current_block_index)
    }
}

/// One dot of the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMarker {
    pub index: usize,
    pub in_focus: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unloaded_state_has_no_block() {
        let state = NarrativeState::unloaded();
        assert!(!state.loaded);
        assert!(state.current_block().is_none());
    }
}
