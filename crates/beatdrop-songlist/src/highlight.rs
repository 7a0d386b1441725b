//! Keyboard highlight over the loaded rows.
//!
//! The index runs over `[-1, len]`: `-1` is "nothing highlighted" and `len`
//! is the load-more row after the last song.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightTarget {
    Song(usize),
    LoadMore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightNavigator {
    index: Option<usize>,
}

impl HighlightNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signed index, `-1` when nothing is highlighted.
    pub fn index(&self) -> isize {
        self.index.map(|i| i as isize).unwrap_or(-1)
    }

    /// Move up; stops at the first row and never returns to `-1`.
    pub fn up(&mut self) {
        if let Some(i) = self.index {
            if i > 0 {
                self.index = Some(i - 1);
            }
        }
    }

    /// Move down; stops on the load-more row.
    pub fn down(&mut self, len: usize) {
        self.index = match self.index {
            None => Some(0),
            Some(i) if i < len => Some(i + 1),
            other => other,
        };
    }

    pub fn target(&self, len: usize) -> Option<HighlightTarget> {
        match self.index {
            Some(i) if i < len => Some(HighlightTarget::Song(i)),
            Some(i) if i == len => Some(HighlightTarget::LoadMore),
            _ => None,
        }
    }

    /// Keep the index inside `[-1, len]` after the list shrank.
    pub fn clamp(&mut self, len: usize) {
        if let Some(i) = self.index {
            self.index = Some(i.min(len));
        }
    }

    pub fn reset(&mut self) {
        self.index = None;
    }
}
