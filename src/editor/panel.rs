//! Hover-driven sidebar that collapses shortly after the pointer leaves it.
//!
//! Time is passed in by the caller, so every transition is deterministic.

use crate::constants::COLLAPSE_TIMEOUT_MS;
use std::time::{Duration, Instant};

/// Visible state of the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// Open, no collapse scheduled
    Expanded,
    /// Open, collapses once `deadline` passes
    CollapsePending {
        /// When the sidebar collapses
        deadline: Instant,
    },
    /// Collapsed
    Collapsed,
}

/// The sidebar state machine.
#[derive(Debug, Clone)]
pub struct SidePanel {
    state: PanelState,
    delay: Duration,
}

impl SidePanel {
    /// A freshly mounted sidebar: open, with a collapse already scheduled.
    pub fn new(now: Instant) -> Self {
        Self::with_delay(now, Duration::from_millis(COLLAPSE_TIMEOUT_MS))
    }

    /// Same as [`SidePanel::new`] with a custom collapse delay.
    pub fn with_delay(now: Instant, delay: Duration) -> Self {
        Self {
            state: PanelState::CollapsePending { deadline: now + delay },
            delay,
        }
    }

    /// Current state.
    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Whether the sidebar is drawn collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.state == PanelState::Collapsed
    }

    /// Pointer entered: cancel any pending collapse and open.
    pub fn mouse_enter(&mut self) {
        self.state = PanelState::Expanded;
    }

    /// Pointer left: schedule a collapse.
    pub fn mouse_leave(&mut self, now: Instant) {
        if !self.is_collapsed() {
            self.schedule(now);
        }
    }

    /// Collapse button. Expanding by hand still schedules a collapse.
    pub fn set_collapsed(&mut self, collapsed: bool, now: Instant) {
        if collapsed {
            self.state = PanelState::Collapsed;
        } else {
            self.schedule(now);
        }
    }

    /// Advances the clock, firing a due collapse. Returns true if the state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            PanelState::CollapsePending { deadline } if now >= deadline => {
                self.state = PanelState::Collapsed;
                true
            }
            _ => false,
        }
    }

    fn schedule(&mut self, now: Instant) {
        self.state = PanelState::CollapsePending {
            deadline: now + self.delay,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(COLLAPSE_TIMEOUT_MS);

    #[test]
    fn test_collapses_after_mount_delay() {
        let t0 = Instant::now();
        let mut panel = SidePanel::new(t0);

        assert!(!panel.tick(t0 + DELAY / 2));
        assert!(!panel.is_collapsed());
        assert!(panel.tick(t0 + DELAY));
        assert!(panel.is_collapsed());
    }

    #[test]
    fn test_enter_cancels_pending_collapse() {
        let t0 = Instant::now();
        let mut panel = SidePanel::new(t0);

        panel.mouse_enter();

        assert!(!panel.tick(t0 + DELAY * 4));
        assert_eq!(panel.state(), PanelState::Expanded);
    }

    #[test]
    fn test_leave_restarts_timer() {
        let t0 = Instant::now();
        let mut panel = SidePanel::new(t0);
        panel.mouse_enter();
        panel.mouse_leave(t0 + DELAY);
        panel.mouse_enter();
        panel.mouse_leave(t0 + DELAY * 2);

        // the first leave's deadline has passed but was superseded
        assert!(!panel.tick(t0 + DELAY * 2 + DELAY / 2));
        assert!(panel.tick(t0 + DELAY * 3));
    }

    #[test]
    fn test_manual_expand_schedules_collapse() {
        let t0 = Instant::now();
        let mut panel = SidePanel::new(t0);
        panel.set_collapsed(true, t0);
        assert!(panel.is_collapsed());

        panel.set_collapsed(false, t0);
        assert!(!panel.is_collapsed());
        assert!(panel.tick(t0 + DELAY));
        assert!(panel.is_collapsed());
    }

    #[test]
    fn test_leave_while_collapsed_stays_collapsed() {
        let t0 = Instant::now();
        let mut panel = SidePanel::new(t0);
        panel.tick(t0 + DELAY);

        panel.mouse_leave(t0 + DELAY);

        assert_eq!(panel.state(), PanelState::Collapsed);
    }
}
