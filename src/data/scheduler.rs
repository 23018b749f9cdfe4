//! Frame-coalescing render scheduler.
//!
//! A single-slot mailbox plus a "render scheduled" flag. Any number of
//! snapshots may arrive between two display refreshes; only the newest one is
//! kept and at most one render runs per refresh.

/// Single-slot, latest-wins render mailbox.
#[derive(Debug)]
pub struct RenderScheduler<T> {
    pending: Option<T>,
    scheduled: bool,
    offered: u64,
    coalesced: u64,
    renders: u64,
}

impl<T> Default for RenderScheduler<T> {
    fn default() -> Self {
        Self {
            pending: None,
            scheduled: false,
            offered: 0,
            coalesced: 0,
            renders: 0,
        }
    }
}

/// Clears the scheduled flag on every exit path of a render, unwinding included.
struct ScheduledGuard<'a>(&'a mut bool);

impl Drop for ScheduledGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl<T> RenderScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `item` as the pending value, replacing any older one.
    ///
    /// Returns `true` when the caller must request a refresh callback; `false`
    /// when one is already outstanding.
    pub fn offer(&mut self, item: T) -> bool {
        self.offered += 1;
        if self.pending.replace(item).is_some() {
            self.coalesced += 1;
        }
        if self.scheduled {
            false
        } else {
            self.scheduled = true;
            true
        }
    }

    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// Refresh callback. Runs `render` on the pending value if there is one,
    /// then clears the slot and the scheduled flag.
    ///
    /// The flag is cleared even if `render` fails or panics, so one bad frame
    /// never stalls later updates.
    pub fn fire<R, F>(&mut self, render: F) -> Option<R>
    where
        F: FnOnce(T) -> R,
    {
        let _guard = ScheduledGuard(&mut self.scheduled);
        let item = self.pending.take()?;
        self.renders += 1;
        Some(render(item))
    }

    /// Total values offered.
    #[inline]
    pub fn offered(&self) -> u64 {
        self.offered
    }

    /// Values replaced before they could be rendered.
    #[inline]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    #[inline]
    pub fn renders(&self) -> u64 {
        self.renders
    }
}
