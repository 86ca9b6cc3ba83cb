//! Current-workspace state and change notification.

use monoenv_core::{ThrottleSettings, Workspace};
use std::time::{Duration, Instant};

/// Payload delivered to change listeners on every workspace switch.
#[derive(Debug, Clone)]
pub struct WorkspaceEvent {
    /// Workspace that was active before the switch, if any.
    pub previous: Option<Workspace>,
    /// Workspace that is active after the switch, if any.
    pub current: Option<Workspace>,
}

/// Callback invoked after a workspace switch.
pub type WorkspaceListener = Box<dyn Fn(&WorkspaceEvent) + Send>;

/// Rate limit for automatic workspace switching.
///
/// A switch is admitted immediately once `min_interval` has elapsed since the
/// last one. Requests arriving sooner are coalesced into a single pending
/// slot; after `max_pending` consecutive deferrals the next request is
/// admitted regardless, so a burst of file events cannot starve switching
/// forever.
#[derive(Debug)]
pub struct AutoSwitchThrottle {
    min_interval: Duration,
    max_pending: usize,
    last_switch: Option<Instant>,
    deferred: usize,
}

impl AutoSwitchThrottle {
    /// Builds a throttle from configuration.
    #[must_use]
    pub fn new(settings: &ThrottleSettings) -> Self {
        Self {
            min_interval: Duration::from_millis(settings.min_interval_ms),
            max_pending: settings.max_pending,
            last_switch: None,
            deferred: 0,
        }
    }

    /// Whether a switch request may proceed now.
    pub fn admit(&mut self) -> bool {
        match self.last_switch {
            None => true,
            Some(at) if at.elapsed() >= self.min_interval => {
                self.deferred = 0;
                true
            }
            Some(_) => {
                self.deferred += 1;
                if self.deferred >= self.max_pending {
                    self.deferred = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Records that a switch happened, starting a new interval.
    pub fn record_switch(&mut self) {
        self.last_switch = Some(Instant::now());
        self.deferred = 0;
    }
}

/// Tracks the current workspace and notifies registered listeners on change.
pub struct WorkspaceManager {
    current: Option<Workspace>,
    listeners: Vec<(u64, WorkspaceListener)>,
    next_listener_id: u64,
    throttle: AutoSwitchThrottle,
}

impl WorkspaceManager {
    /// Creates a manager with no current workspace.
    #[must_use]
    pub fn new(throttle: &ThrottleSettings) -> Self {
        Self {
            current: None,
            listeners: Vec::new(),
            next_listener_id: 0,
            throttle: AutoSwitchThrottle::new(throttle),
        }
    }

    /// The active workspace, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Workspace> {
        self.current.as_ref()
    }

    /// Registers a change listener; returns an id for deregistration.
    pub fn on_change(&mut self, listener: WorkspaceListener) -> u64 {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener by id; returns whether it existed.
    pub fn remove_listener(&mut self, id: u64) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.listeners.len()
    }

    /// Whether switching to `target` would change the current workspace.
    /// Workspace identity is the absolute path.
    #[must_use]
    pub fn would_change(&self, target: Option<&Workspace>) -> bool {
        self.current.as_ref().map(|w| &w.path) != target.map(|w| &w.path)
    }

    /// Replaces the current workspace, firing listeners when `notify` is set.
    pub fn set_current(&mut self, workspace: Option<Workspace>, notify: bool) {
        let previous = self.current.take();
        self.current = workspace;
        self.throttle.record_switch();

        if notify && !self.listeners.is_empty() {
            let event = WorkspaceEvent {
                previous,
                current: self.current.clone(),
            };
            for (_, listener) in &self.listeners {
                listener(&event);
            }
        }
    }

    /// Throttle admission for an automatic switch request.
    pub fn throttle_admit(&mut self) -> bool {
        self.throttle.admit()
    }
}
