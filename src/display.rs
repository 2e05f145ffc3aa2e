//! The surface rendered chat messages are pushed to.

use std::collections::VecDeque;

/// An HTML fragment for one chat message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFragment {
    pub sender: String,
    pub html: String,
}

/// Where rendered messages end up.
///
/// Called only from the thread that owns the chat tab, so calls are
/// serialized. Readiness is reported separately, through
/// [`ChatEvent::DisplayReady`](crate::protocol::ChatEvent::DisplayReady).
pub trait DisplaySurface {
    fn render(&mut self, fragment: &RenderedFragment);

    /// Keep the newest messages in view unless the user scrolled up.
    fn scroll_to_bottom_if_desired(&mut self) {}

    /// Drop the oldest messages until at most `max_retained` remain.
    fn prune_oldest(&mut self, max_retained: usize);
}

/// Keeps rendered fragments in memory, oldest first
#[derive(Debug, Default, Clone)]
pub struct MemoryDisplay {
    pub fragments: VecDeque<RenderedFragment>,
    pub scroll_requests: usize,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl DisplaySurface for MemoryDisplay {
    fn render(&mut self, fragment: &RenderedFragment) {
        self.fragments.push_back(fragment.clone());
    }

    fn scroll_to_bottom_if_desired(&mut self) {
        self.scroll_requests += 1;
    }

    fn prune_oldest(&mut self, max_retained: usize) {
        while self.fragments.len() > max_retained {
            self.fragments.pop_front();
        }
    }
}
