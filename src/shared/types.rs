/// Offset/limit window for sequential scans.
///
/// `limit: None` means "everything after the offset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub offset: i64,
    pub limit: Option<i64>,
}

impl Page {
    pub fn new(offset: i64, limit: Option<i64>) -> Self {
        Self { offset, limit }
    }

    /// The whole collection
    pub fn all() -> Self {
        Self::default()
    }

    /// Offset clamped to zero
    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }

    /// Limit clamped to zero, if any
    pub fn limit(&self) -> Option<i64> {
        self.limit.map(|l| l.max(0))
    }

    /// Apply the window to an already ordered sequence
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.offset() as usize);
        match self.limit() {
            Some(limit) => skipped.take(limit as usize).collect(),
            None => skipped.collect(),
        }
    }
}
