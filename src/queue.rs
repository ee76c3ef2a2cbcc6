//! FIFO work queue of pages to visit.

use std::collections::VecDeque;

use url::Url;

/// What a queued page is expected to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// A page listing product cards.
    Listing,
    /// A single product page.
    Detail,
}

/// One page waiting for a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: Url,
    pub depth: u32,
    pub kind: PageKind,
}

impl WorkItem {
    pub fn listing(url: Url, depth: u32) -> Self {
        Self {
            url,
            depth,
            kind: PageKind::Listing,
        }
    }

    pub fn detail(url: Url, depth: u32) -> Self {
        Self {
            url,
            depth,
            kind: PageKind::Detail,
        }
    }
}

/// First in, first out. The same URL may be queued more than once.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues every seed as a listing page at depth 0.
    pub fn seed(&mut self, urls: impl IntoIterator<Item = Url>) {
        for url in urls {
            self.push(WorkItem::listing(url, 0));
        }
    }

    pub fn push(&mut self, item: WorkItem) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
