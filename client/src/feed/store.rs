use swipe_common::ProfileCandidate;

/// Ordered candidates in server order.
///
/// `None` means no feed has been loaded yet. Within a session the sequence
/// only grows, except for the first-load replace and an explicit clear.
#[derive(Debug, Clone, Default)]
pub struct FeedStore {
    items: Option<Vec<ProfileCandidate>>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.items.is_some()
    }

    /// First load: install `items` as the feed.
    pub fn replace(&mut self, items: Vec<ProfileCandidate>) {
        self.items = Some(items);
    }

    /// Later pages, arrival order preserved.
    pub fn append(&mut self, items: Vec<ProfileCandidate>) {
        self.items.get_or_insert_with(Vec::new).extend(items);
    }

    /// Logout or manual refresh.
    pub fn clear(&mut self) {
        self.items = None;
    }

    pub fn len(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&ProfileCandidate> {
        self.items.as_ref().and_then(|items| items.get(index))
    }

    pub fn items(&self) -> &[ProfileCandidate] {
        self.items.as_deref().unwrap_or(&[])
    }
}
