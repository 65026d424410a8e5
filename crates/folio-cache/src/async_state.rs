//! Fetch-status wrapper for cached collection state.
//!
//! # Design
//! - A refresh never clears `data`, so the rendered page stays visible while it is in flight.
//! - Failures are stored as data; nothing here retries or panics.

/// Collection data paired with its in-flight and error status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsyncState<T, E> {
    /// A fetch is outstanding for this collection.
    pub updating: bool,
    /// Last fetch failure, cleared by the next successful ingest.
    pub error: Option<E>,
    /// Most recent data; retained across refreshes and failures.
    pub data: T,
}

impl<T, E> AsyncState<T, E> {
    /// State for a freshly mounted view whose first fetch has not completed yet.
    #[must_use]
    pub const fn pending(data: T) -> Self {
        Self {
            updating: true,
            error: None,
            data,
        }
    }

    /// Settled state holding `data`.
    #[must_use]
    pub const fn ready(data: T) -> Self {
        Self {
            updating: false,
            error: None,
            data,
        }
    }

    /// Whether the last fetch failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

impl<T, E> Default for AsyncState<T, E>
where
    T: Default,
{
    fn default() -> Self {
        Self::pending(T::default())
    }
}

impl<T, E> AsyncState<T, E>
where
    T: Clone,
    E: Clone,
{
    /// Mark a fetch as outstanding; data and error are kept.
    #[must_use]
    pub fn begin_fetch(&self) -> Self {
        Self {
            updating: true,
            error: self.error.clone(),
            data: self.data.clone(),
        }
    }

    /// Record a fetch failure verbatim and settle the state.
    #[must_use]
    pub fn fail_fetch(&self, error: E) -> Self {
        Self {
            updating: false,
            error: Some(error),
            data: self.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_state_starts_updating() {
        let state: AsyncState<Vec<u32>, String> = AsyncState::default();
        assert!(state.updating);
        assert!(state.error.is_none());
        assert!(state.data.is_empty());
    }

    #[test]
    fn begin_fetch_keeps_data_visible() {
        let state: AsyncState<Vec<u32>, String> = AsyncState::ready(vec![1, 2]);
        let next = state.begin_fetch();
        assert!(next.updating);
        assert_eq!(next.data, vec![1, 2]);
        assert!(!state.updating);
    }

    #[test]
    fn fail_fetch_records_error_and_settles() {
        let state: AsyncState<Vec<u32>, String> = AsyncState::pending(vec![7]);
        let failed = state.fail_fetch("timeout".to_string());
        assert!(!failed.updating);
        assert!(failed.is_failed());
        assert_eq!(failed.error.as_deref(), Some("timeout"));
        assert_eq!(failed.data, vec![7]);

        let retried = failed.begin_fetch();
        assert!(retried.updating);
        assert_eq!(retried.error.as_deref(), Some("timeout"));
    }
}
