use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use std::fmt;
use std::sync::Arc;

/// Everything the jobs and reports need, passed explicitly instead of read
/// from process-wide state.
pub struct AppContext<Store, Notify> {
    /// Data-access collaborator
    pub store: Store,
    /// Notification dispatch collaborator
    pub notifier: Notify,
    /// Source of "now"
    pub clock: Arc<dyn Clock>,
    /// Runtime configuration
    pub config: Arc<Config>,
}

impl<Store, Notify> AppContext<Store, Notify> {
    /// Create a context reading the system clock.
    pub fn new(store: Store, notifier: Notify, config: Config) -> Self {
        Self {
            store,
            notifier,
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

impl<Store: Clone, Notify: Clone> Clone for AppContext<Store, Notify> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}

impl<Store, Notify> fmt::Debug for AppContext<Store, Notify> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("now", &self.clock.now())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
