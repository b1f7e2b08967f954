//! Deterministic timer queue for a single-threaded, cooperative runtime.
//!
//! Key properties:
//! - Timers fire in total order on `(deadline, id)`; equal deadlines fire in
//!   scheduling order.
//! - Cancellation does not perturb the order of remaining timers.
//! - Every timer is tagged with the queue generation it was scheduled in.
//!   `clear()` bumps the generation, so ids handed out earlier can never be
//!   cancelled or fired again.
//!
//! Time is supplied by the caller (`pop_due(now)`), which keeps replays exact.
use foundation::handles::Generation;
use foundation::ids::IdAllocator;
use foundation::time::TimeMs;

foundation::define_id!(
    /// Identifies one scheduled timer.
    TimerId
);

#[derive(Debug, Copy, Clone, PartialEq)]
struct Key {
    deadline: TimeMs,
    id: TimerId,
}

impl Key {
    fn fires_before(&self, other: &Key) -> bool {
        self.deadline
            .total_cmp(&other.deadline)
            .then_with(|| self.id.cmp(&other.id))
            .is_lt()
    }
}

#[derive(Debug)]
struct Entry<T> {
    key: Key,
    generation: Generation,
    payload: T,
    canceled: bool,
}

/// A timer that reached its deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub deadline: TimeMs,
    pub payload: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    ids: IdAllocator,
    generation: Generation,
    entries: Vec<Entry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            ids: IdAllocator::new(),
            generation: Generation::default(),
            entries: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of live (not cancelled) timers.
    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn schedule_at(&mut self, deadline: TimeMs, payload: T) -> TimerId {
        let id = TimerId::allocate(&mut self.ids);
        self.entries.push(Entry {
            key: Key { deadline, id },
            generation: self.generation,
            payload,
            canceled: false,
        });
        id
    }

    pub fn schedule_after(&mut self, now: TimeMs, delay_ms: f64, payload: T) -> TimerId {
        self.schedule_at(now.after(delay_ms), payload)
    }

    /// Cancels a pending timer.
    ///
    /// Returns `false` if the timer already fired, was already cancelled, or
    /// belongs to an earlier generation.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let generation = self.generation;
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.key.id == id && e.generation.is_current(generation) && !e.canceled)
        {
            entry.canceled = true;
            return true;
        }
        false
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.live().any(|e| e.key.id == id)
    }

    /// Earliest live deadline, for hosts that sleep until the next timer.
    pub fn next_deadline(&self) -> Option<TimeMs> {
        self.live()
            .map(|e| e.key)
            .reduce(|best, k| if k.fires_before(&best) { k } else { best })
            .map(|k| k.deadline)
    }

    /// Pops the earliest timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: TimeMs) -> Option<Fired<T>> {
        let generation = self.generation;
        self.entries
            .retain(|e| !e.canceled && e.generation.is_current(generation));

        let mut best_idx: Option<usize> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.key.deadline.total_cmp(&now).is_gt() {
                continue;
            }
            match best_idx {
                None => best_idx = Some(idx),
                Some(best) => {
                    if entry.key.fires_before(&self.entries[best].key) {
                        best_idx = Some(idx);
                    }
                }
            }
        }

        let idx = best_idx?;
        let entry = self.entries.swap_remove(idx);
        Some(Fired {
            id: entry.key.id,
            deadline: entry.key.deadline,
            payload: entry.payload,
        })
    }

    /// Drops every timer and invalidates all previously issued ids.
    ///
    /// Returns how many live timers were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.len();
        self.entries.clear();
        self.generation.bump();
        dropped
    }

    fn live(&self) -> impl Iterator<Item = &Entry<T>> + '_ {
        let generation = self.generation;
        self.entries
            .iter()
            .filter(move |e| !e.canceled && e.generation.is_current(generation))
    }
}

#[cfg(test)]
mod tests {
    use super::TimerQueue;
    use foundation::time::TimeMs;

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let mut q = TimerQueue::new();
        q.schedule_at(TimeMs(20.0), "late");
        q.schedule_at(TimeMs(10.0), "a");
        q.schedule_at(TimeMs(10.0), "b");

        let now = TimeMs(100.0);
        let order: Vec<_> = std::iter::from_fn(|| q.pop_due(now).map(|f| f.payload)).collect();
        assert_eq!(order, vec!["a", "b", "late"]);
    }

    #[test]
    fn does_not_fire_before_deadline() {
        let mut q = TimerQueue::new();
        q.schedule_after(TimeMs(0.0), 3538.46, "arc");
        assert!(q.pop_due(TimeMs(3538.0)).is_none());
        let fired = q.pop_due(TimeMs(3538.46)).unwrap();
        assert_eq!(fired.payload, "arc");
        assert_eq!(fired.deadline, TimeMs(3538.46));
    }

    #[test]
    fn cancel_skips_timer() {
        let mut q = TimerQueue::new();
        let a = q.schedule_at(TimeMs(1.0), "a");
        q.schedule_at(TimeMs(2.0), "b");
        assert!(q.cancel(a));
        assert!(!q.cancel(a));
        assert!(!q.is_pending(a));

        assert_eq!(q.pop_due(TimeMs(5.0)).unwrap().payload, "b");
        assert!(q.pop_due(TimeMs(5.0)).is_none());
    }

    #[test]
    fn clear_invalidates_old_ids() {
        let mut q = TimerQueue::new();
        let a = q.schedule_at(TimeMs(1.0), "a");
        q.schedule_at(TimeMs(1.0), "b");
        let g0 = q.generation();

        assert_eq!(q.clear(), 2);
        assert_ne!(q.generation(), g0);
        assert!(!q.cancel(a));
        assert!(q.pop_due(TimeMs(10.0)).is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn next_deadline_ignores_cancelled() {
        let mut q = TimerQueue::new();
        let a = q.schedule_at(TimeMs(1.0), ());
        q.schedule_at(TimeMs(7.0), ());
        q.cancel(a);
        assert_eq!(q.next_deadline(), Some(TimeMs(7.0)));
    }
}
