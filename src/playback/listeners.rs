use crate::data::PlaybackEvent;
use std::sync::{Arc, Weak, RwLock};
use log::{debug, trace, warn};

/// Trait for objects that listen to playback controller events
pub trait PlaybackListener: Send + Sync {
    /// Called for every event the controller emits
    ///
    /// # Arguments
    ///
    /// * `event` - The event that occurred
    fn on_event(&self, event: &PlaybackEvent);
}

/// Listener that forwards events to a closure
pub struct CallbackListener<F>
where
    F: Fn(&PlaybackEvent) + Send + Sync + 'static,
{
    callback: F,
}

impl<F> CallbackListener<F>
where
    F: Fn(&PlaybackEvent) + Send + Sync + 'static,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> PlaybackListener for CallbackListener<F>
where
    F: Fn(&PlaybackEvent) + Send + Sync + 'static,
{
    fn on_event(&self, event: &PlaybackEvent) {
        (self.callback)(event);
    }
}

/// Registry of weakly held listeners
///
/// Listeners are kept as `Weak` references so a dropped listener never keeps
/// itself alive through the controller; dead entries are pruned on notify.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<RwLock<Vec<Weak<dyn PlaybackListener>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener to be notified of events
    ///
    /// Returns `false` if the same listener is already registered
    pub fn register_listener(&self, listener: Weak<dyn PlaybackListener>) -> bool {
        debug!("Attempting to register a new playback listener");
        if let Ok(mut listeners) = self.listeners.write() {
            if let Some(new) = listener.upgrade() {
                for existing in listeners.iter() {
                    if let Some(old) = existing.upgrade() {
                        if Arc::ptr_eq(&new, &old) {
                            debug!("Listener already registered, skipping");
                            return false;
                        }
                    }
                }
            }
            listeners.push(listener);
            debug!("Listener registered, total listeners: {}", listeners.len());
            return true;
        }
        warn!("Failed to acquire write lock when registering listener");
        false
    }

    /// Unregister a previously registered listener
    pub fn unregister_listener(&self, listener: &Arc<dyn PlaybackListener>) -> bool {
        if let Ok(mut listeners) = self.listeners.write() {
            let original_len = listeners.len();
            listeners.retain(|weak_ref| match weak_ref.upgrade() {
                Some(target) => !Arc::ptr_eq(&target, listener),
                None => false,
            });
            let removed = listeners.len() < original_len;
            debug!("Unregister listener: removed={}, remaining={}", removed, listeners.len());
            return removed;
        }
        warn!("Failed to acquire write lock when unregistering listener");
        false
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .map(|listeners| listeners.iter().filter(|l| l.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Deliver an event to every live listener
    pub fn notify(&self, event: &PlaybackEvent) {
        self.prune_dead_listeners();

        // Upgrade first so callbacks run without holding the lock
        let live: Vec<Arc<dyn PlaybackListener>> = match self.listeners.read() {
            Ok(listeners) => listeners.iter().filter_map(|l| l.upgrade()).collect(),
            Err(_) => {
                warn!("Failed to acquire read lock for listeners when notifying {}", event.name());
                return;
            }
        };

        trace!("Notifying {} listeners of {}", live.len(), event.name());
        for listener in live {
            listener.on_event(event);
        }
    }

    fn prune_dead_listeners(&self) {
        if let Ok(mut listeners) = self.listeners.write() {
            let original_len = listeners.len();
            listeners.retain(|weak_ref| weak_ref.strong_count() > 0);
            let removed = original_len - listeners.len();
            if removed > 0 {
                debug!("Pruned {} dead listeners, remaining: {}", removed, listeners.len());
            }
        }
    }
}
