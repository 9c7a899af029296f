use std::collections::VecDeque;
use wander_wiki::normalize_title;

/// Breadcrumb trail of visited titles.
///
/// Grows at the end, shrinks only through [`NavigationHistory::back`] (which
/// never removes the last remaining entry) or a full reset. Once longer than
/// its cap the oldest entries are dropped.
///
/// ```
/// use wander_session::NavigationHistory;
///
/// let mut h = NavigationHistory::new(3);
/// for t in ["A", "B", "C", "D"] {
///     h.push(t);
/// }
/// assert_eq!(h.titles().collect::<Vec<_>>(), ["B", "C", "D"]);
/// assert_eq!(h.back(), Some("C"));
/// assert_eq!(h.current(), Some("C"));
/// ```
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    entries: VecDeque<String>,
    cap: usize,
}

impl NavigationHistory {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append `title` unless it already is the current entry.
    pub fn push(&mut self, title: impl Into<String>) {
        let title = title.into();
        if self
            .current()
            .is_some_and(|cur| normalize_title(cur) == normalize_title(&title))
        {
            return;
        }
        self.entries.push_back(title);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    /// Start over from a single title.
    pub fn reset_to(&mut self, title: impl Into<String>) {
        self.entries.clear();
        self.entries.push_back(title.into());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop the current entry and return the new current one. Refuses to
    /// empty the trail.
    pub fn back(&mut self) -> Option<&str> {
        if self.entries.len() <= 1 {
            return None;
        }
        self.entries.pop_back();
        self.current()
    }

    /// The entry [`back`](Self::back) would land on.
    pub fn previous(&self) -> Option<&str> {
        let n = self.entries.len();
        if n < 2 {
            return None;
        }
        self.entries.get(n - 2).map(String::as_str)
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn can_go_back(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Oldest first.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// The last `n` titles, oldest first.
    pub fn tail(&self, n: usize) -> Vec<&str> {
        let skip = self.entries.len().saturating_sub(n);
        self.titles().skip(skip).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_never_empties() {
        let mut h = NavigationHistory::new(10);
        assert_eq!(h.back(), None);
        h.push("Only");
        assert_eq!(h.back(), None);
        assert_eq!(h.current(), Some("Only"));
    }

    #[test]
    fn back_returns_previous() {
        let mut h = NavigationHistory::new(10);
        h.push("A");
        h.push("B");
        assert_eq!(h.previous(), Some("A"));
        assert_eq!(h.back(), Some("A"));
        assert!(!h.can_go_back());
    }

    #[test]
    fn repeated_current_is_not_pushed() {
        let mut h = NavigationHistory::new(10);
        h.push("Alan_Turing");
        h.push("alan turing");
        assert_eq!(h.len(), 1);
        h.push("Enigma");
        h.push("Alan Turing");
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn cap_trims_oldest() {
        let mut h = NavigationHistory::new(2);
        h.push("A");
        h.push("B");
        h.push("C");
        assert_eq!(h.titles().collect::<Vec<_>>(), ["B", "C"]);
        assert_eq!(h.cap(), 2);
    }

    #[test]
    fn zero_cap_still_holds_current() {
        let mut h = NavigationHistory::new(0);
        h.push("A");
        h.push("B");
        assert_eq!(h.len(), 1);
        assert_eq!(h.current(), Some("B"));
    }

    #[test]
    fn tail_and_reset() {
        let mut h = NavigationHistory::new(10);
        for t in ["A", "B", "C", "D"] {
            h.push(t);
        }
        assert_eq!(h.tail(2), ["C", "D"]);
        assert_eq!(h.tail(9).len(), 4);
        h.reset_to("Z");
        assert_eq!(h.titles().collect::<Vec<_>>(), ["Z"]);
        h.clear();
        assert!(h.is_empty());
    }
}
