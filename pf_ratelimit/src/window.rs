use std::collections::VecDeque;
use std::fmt;

use crate::time::DAY_MS;
use crate::time::HOUR_MS;

/// Which rolling window a count belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Hourly,
    Daily,
}

impl WindowKind {
    /// Window length in milliseconds
    pub const fn size_ms(self) -> u64 {
        match self {
            WindowKind::Hourly => HOUR_MS,
            WindowKind::Daily => DAY_MS,
        }
    }

    /// Capitalised label used at the start of a message
    pub const fn title(self) -> &'static str {
        match self {
            WindowKind::Hourly => "Hourly",
            WindowKind::Daily => "Daily",
        }
    }

    /// Lower-case label used mid-sentence
    pub const fn label(self) -> &'static str {
        match self {
            WindowKind::Hourly => "hourly",
            WindowKind::Daily => "daily",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rolling window over raw call timestamps
///
/// Timestamps are appended in non-decreasing order, so expired entries are always
/// at the front and pruning pops until the first live entry. Counting is exact:
/// an entry recorded at `T` is live for checks at `now < T + size_ms` and gone at
/// `now >= T + size_ms`.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    kind: WindowKind,
    size_ms: u64,
    limit: u32,
    /// Count at which the window starts reporting "approaching"
    warn_at: u32,
    entries: VecDeque<u64>,
}

impl SlidingWindow {
    pub fn new(kind: WindowKind, limit: u32, warn_at: u32) -> Self {
        Self { kind, size_ms: kind.size_ms(), limit, warn_at, entries: VecDeque::new() }
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of live entries as of the last prune
    pub fn count(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Drop every entry that has aged out as of `now_ms`
    #[inline]
    pub fn prune(&mut self, now_ms: u64) {
        while let Some(&oldest) = self.entries.front() {
            if now_ms.saturating_sub(oldest) >= self.size_ms {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a call made at `now_ms`
    #[inline]
    pub fn record(&mut self, now_ms: u64) {
        self.entries.push_back(now_ms);
    }

    pub fn is_exhausted(&self) -> bool {
        self.count() >= self.limit
    }

    pub fn is_approaching(&self) -> bool {
        self.count() >= self.warn_at
    }

    /// Milliseconds until the oldest entry leaves the window, plus `buffer_ms`
    ///
    /// Returns 0 for an empty window.
    pub fn delay_until_free(&self, now_ms: u64, buffer_ms: u64) -> u64 {
        match self.entries.front() {
            Some(&oldest) => (oldest + self.size_ms).saturating_sub(now_ms) + buffer_ms,
            None => 0,
        }
    }

    /// "Hourly rate limit exceeded (100/100)"
    pub fn exceeded_message(&self) -> String {
        format!("{} rate limit exceeded ({}/{})", self.kind.title(), self.count(), self.limit)
    }

    /// "Approaching hourly rate limit (90/100)"
    pub fn approaching_message(&self) -> String {
        format!("Approaching {} rate limit ({}/{})", self.kind.label(), self.count(), self.limit)
    }

    /// Threshold status of this window, if any
    pub fn threshold_message(&self) -> Option<String> {
        if self.is_exhausted() {
            Some(self.exceeded_message())
        } else if self.is_approaching() {
            Some(self.approaching_message())
        } else {
            None
        }
    }
}

/// Both rolling windows of a limiter
#[derive(Debug, Clone)]
pub struct CallLog {
    pub(crate) hourly: SlidingWindow,
    pub(crate) daily: SlidingWindow,
}

impl CallLog {
    pub fn new(hourly: SlidingWindow, daily: SlidingWindow) -> Self {
        Self { hourly, daily }
    }

    pub fn prune(&mut self, now_ms: u64) {
        self.hourly.prune(now_ms);
        self.daily.prune(now_ms);
    }

    /// One admitted call costs one unit in both windows
    pub fn record(&mut self, now_ms: u64) {
        self.hourly.record(now_ms);
        self.daily.record(now_ms);
    }

    /// Composed threshold warning across both windows, hourly first
    pub fn threshold_warning(&self) -> Option<String> {
        let messages: Vec<String> = [&self.hourly, &self.daily].into_iter().filter_map(SlidingWindow::threshold_message).collect();

        if messages.is_empty() { None } else { Some(messages.join("; ")) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_boundary_is_exclusive() {
        let mut window = SlidingWindow::new(WindowKind::Hourly, 10, 9);
        window.record(1_000);

        window.prune(1_000 + HOUR_MS - 1);
        assert_eq!(window.count(), 1);

        window.prune(1_000 + HOUR_MS);
        assert_eq!(window.count(), 0);
    }

    #[test]
    fn test_prune_stops_at_first_live_entry() {
        let mut window = SlidingWindow::new(WindowKind::Hourly, 10, 9);
        window.record(0);
        window.record(500);
        window.record(HOUR_MS);

        window.prune(HOUR_MS + 100);
        assert_eq!(window.count(), 2);
    }

    #[test]
    fn test_daily_window_outlives_hourly() {
        let mut log = CallLog::new(SlidingWindow::new(WindowKind::Hourly, 5, 5), SlidingWindow::new(WindowKind::Daily, 50, 45));
        log.record(0);

        log.prune(HOUR_MS);
        assert_eq!(log.hourly.count(), 0);
        assert_eq!(log.daily.count(), 1);

        log.prune(DAY_MS);
        assert_eq!(log.daily.count(), 0);
    }

    #[test]
    fn test_delay_until_free() {
        let mut window = SlidingWindow::new(WindowKind::Hourly, 1, 1);
        assert_eq!(window.delay_until_free(42, 100), 0);

        window.record(1_000);
        assert_eq!(window.delay_until_free(1_000, 100), HOUR_MS + 100);
        assert_eq!(window.delay_until_free(1_000 + HOUR_MS / 2, 100), HOUR_MS / 2 + 100);
        // Already expired but not yet pruned: only the buffer remains
        assert_eq!(window.delay_until_free(1_000 + HOUR_MS * 2, 100), 100);
    }

    #[test]
    fn test_threshold_messages() {
        let mut window = SlidingWindow::new(WindowKind::Hourly, 3, 2);
        assert_eq!(window.threshold_message(), None);

        window.record(0);
        window.record(1);
        assert_eq!(window.threshold_message().as_deref(), Some("Approaching hourly rate limit (2/3)"));

        window.record(2);
        assert_eq!(window.threshold_message().as_deref(), Some("Hourly rate limit exceeded (3/3)"));
    }

    #[test]
    fn test_composed_warning_lists_hourly_first() {
        let mut log = CallLog::new(SlidingWindow::new(WindowKind::Hourly, 2, 1), SlidingWindow::new(WindowKind::Daily, 2, 1));
        log.record(0);

        assert_eq!(log.threshold_warning().as_deref(), Some("Approaching hourly rate limit (1/2); Approaching daily rate limit (1/2)"));
    }
}
