//! Cancellation sources for in-flight requests.

use tokio_util::sync::CancellationToken;

/// A token paired with the capability to cancel it.
///
/// Clones share the same underlying token, so cancelling any clone aborts
/// every request that was handed the token.
#[derive(Debug, Clone, Default)]
pub struct CancelSource {
    token: CancellationToken,
}

impl CancelSource {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Returns the token to thread through a request config.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signals every request holding this source's token to abort.
    pub fn cancel(&self) {
        log::debug!("Cancelling request source");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Creates a fresh cancellation source for one logical operation.
pub fn make_cancel_source() -> CancelSource {
    CancelSource::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_source_is_not_cancelled() {
        let source = make_cancel_source();
        assert!(!source.is_cancelled());
        assert!(!source.token().is_cancelled());
    }

    #[test]
    fn test_cancel_reaches_previously_issued_tokens() {
        let source = make_cancel_source();
        let token = source.token();

        source.cancel();

        assert!(token.is_cancelled());
        assert!(source.is_cancelled());
    }

    #[test]
    fn test_clones_share_token() {
        let source = make_cancel_source();
        let clone = source.clone();

        clone.cancel();

        assert!(source.is_cancelled());
    }

    #[test]
    fn test_sources_are_independent() {
        let first = make_cancel_source();
        let second = make_cancel_source();

        first.cancel();

        assert!(!second.is_cancelled());
    }
}
