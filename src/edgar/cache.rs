// src/edgar/cache.rs

/// A value that is fetched at most once and then served from memory.
///
/// Replaces hand-rolled "is it still None?" checks with an explicit state, so
/// a fetch either completes and is stored whole, or leaves the slot empty.
#[derive(Debug, Clone, Default)]
pub enum Cached<T> {
    #[default]
    Unfetched,
    Fetched(T),
}

impl<T> Cached<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Cached::Fetched(value) => Some(value),
            Cached::Unfetched => None,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, Cached::Fetched(_))
    }

    /// Replaces whatever was cached.
    pub fn store(&mut self, value: T) {
        *self = Cached::Fetched(value);
    }

    pub fn reset(&mut self) {
        *self = Cached::Unfetched;
    }
}
