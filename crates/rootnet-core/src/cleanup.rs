//! Ordered release of resources acquired while configuring a network.
//!
//! Actions run in the order they were registered, which is the order the
//! resources were acquired. [`CleanupChain::run`] consumes the chain, so
//! each action runs at most once.

use std::fmt;

use rootnet_common::error::Result;

type Action = Box<dyn FnOnce() -> Result<()> + Send>;

/// Sequence of named release actions.
#[derive(Default)]
pub struct CleanupChain {
    actions: Vec<(String, Action)>,
}

impl CleanupChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action. It runs after every action already registered.
    pub fn push<F>(&mut self, name: impl Into<String>, action: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.actions.push((name.into(), Box::new(action)));
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Names of the registered actions, in run order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|(name, _)| name.as_str())
    }

    /// Runs every action in registration order.
    ///
    /// A failing action does not stop the ones after it.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any action.
    pub fn run(self) -> Result<()> {
        let mut first_err = None;
        for (name, action) in self.actions {
            tracing::debug!(action = %name, "running cleanup");
            if let Err(e) = action() {
                tracing::warn!(action = %name, error = %e, "cleanup failed");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for CleanupChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
