use crate::location::Location;

/// Emitted when the active location changes by value.
///
/// `previous` is `None` only for the first activation of a session.
#[derive(Debug, Clone)]
pub struct LocationChange {
    pub previous: Option<Location>,
    pub current: Location,
}

impl LocationChange {
    pub fn is_first_activation(&self) -> bool {
        self.previous.is_none()
    }
}

/// Ordered location sequence plus the current index.
///
/// Index arithmetic always wraps, so every request lands in `[0, len)`.
/// With an empty sequence every operation is a no-op.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    sequence: Vec<Location>,
    current: usize,
    previous: Option<Location>,
}

impl NavigationState {
    pub fn new(sequence: Vec<Location>) -> Self {
        Self {
            sequence,
            current: 0,
            previous: None,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        (!self.sequence.is_empty()).then_some(self.current)
    }

    pub fn sequence(&self) -> &[Location] {
        &self.sequence
    }

    pub fn current(&self) -> Option<&Location> {
        self.sequence.get(self.current)
    }

    pub fn previous(&self) -> Option<&Location> {
        self.previous.as_ref()
    }

    pub fn next(&mut self) -> Option<LocationChange> {
        self.step(1)
    }

    pub fn prev(&mut self) -> Option<LocationChange> {
        self.step(-1)
    }

    /// Moves `delta` entries forward, or backward when negative, wrapping.
    pub fn step(&mut self, delta: i64) -> Option<LocationChange> {
        let n = self.sequence.len();
        if n == 0 {
            return None;
        }
        // Reduced first so any delta stays in range.
        let delta = delta.rem_euclid(n as i64);
        self.goto(self.current as i64 + delta)
    }

    /// Moves to `index`, wrapped into range.
    pub fn goto(&mut self, index: i64) -> Option<LocationChange> {
        let n = self.sequence.len();
        if n == 0 {
            return None;
        }
        self.current = wrap_index(index, n);
        self.commit()
    }

    /// Moves to the first entry at the same coordinates as `location`.
    ///
    /// Unknown coordinates leave the state untouched.
    pub fn goto_by_value(&mut self, location: &Location) -> Option<LocationChange> {
        let index = self
            .sequence
            .iter()
            .position(|candidate| candidate.same_point(location))?;
        self.goto(index as i64)
    }

    /// Installs a new sequence without committing.
    ///
    /// The current location is kept when an equal value is still present;
    /// otherwise the index is clamped into the new range. Call [`commit`]
    /// to learn whether the active location changed.
    ///
    /// [`commit`]: NavigationState::commit
    pub fn replace_sequence(&mut self, sequence: Vec<Location>) {
        let kept = self
            .current()
            .and_then(|current| sequence.iter().position(|l| l.same_value(current)));
        self.sequence = sequence;
        self.current = match kept {
            Some(index) => index,
            None => self.current.min(self.sequence.len().saturating_sub(1)),
        };
    }

    /// Compares the active location to the last committed one by value and
    /// reports a change only when they differ.
    pub fn commit(&mut self) -> Option<LocationChange> {
        let current = self.current()?.clone();
        if let Some(previous) = &self.previous
            && previous.same_value(&current)
        {
            return None;
        }
        let previous = self.previous.replace(current.clone());
        Some(LocationChange { previous, current })
    }
}

/// `((i % n) + n) % n`, for `n > 0`.
pub fn wrap_index(index: i64, n: usize) -> usize {
    debug_assert!(n > 0);
    let n = n as i64;
    index.rem_euclid(n) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seq(n: usize) -> Vec<Location> {
        (0..n)
            .map(|i| Location::new(format!("L{i}"), i as f64, i as f64 * 2.0))
            .collect()
    }

    #[test]
    fn next_cycles_back_after_n_calls() {
        for n in 1..6 {
            for start in 0..n {
                let mut nav = NavigationState::new(seq(n));
                nav.goto(start as i64);
                for _ in 0..n {
                    nav.next();
                    let idx = nav.index().unwrap();
                    assert!(idx < n);
                }
                assert_eq!(nav.index(), Some(start));
            }
        }
    }

    #[test]
    fn goto_wraps_out_of_range_indices() {
        let mut nav = NavigationState::new(seq(4));
        nav.goto(-1);
        assert_eq!(nav.index(), Some(3));
        nav.goto(9);
        assert_eq!(nav.index(), Some(1));
        nav.goto(-9);
        assert_eq!(nav.index(), Some(3));
        nav.goto(i64::MIN);
        assert!(nav.index().unwrap() < 4);
        assert_eq!(wrap_index(-5, 4), 3);
    }

    #[test]
    fn extreme_steps_wrap_without_overflow() {
        let mut nav = NavigationState::new(seq(4));
        nav.commit();
        nav.step(i64::MAX);
        assert_eq!(nav.index(), Some(3));
        // i64::MIN is a multiple of 4.
        assert!(nav.step(i64::MIN).is_none());
        assert_eq!(nav.index(), Some(3));
        nav.step(i64::MIN + 1);
        assert_eq!(nav.index(), Some(0));
    }

    #[test]
    fn empty_sequence_is_a_no_op() {
        let mut nav = NavigationState::new(Vec::new());
        assert!(nav.next().is_none());
        assert!(nav.prev().is_none());
        assert!(nav.goto(3).is_none());
        assert!(nav.goto_by_value(&Location::new("x", 0.0, 0.0)).is_none());
        assert!(nav.commit().is_none());
        assert_eq!(nav.index(), None);
    }

    #[test]
    fn first_commit_is_first_activation() {
        let mut nav = NavigationState::new(seq(3));
        let change = nav.commit().unwrap();
        assert!(change.is_first_activation());
        assert_eq!(change.current.name, "L0");
        assert!(nav.commit().is_none());
    }

    #[test]
    fn emits_only_on_value_change() {
        let mut nav = NavigationState::new(seq(3));
        nav.commit();

        assert!(nav.goto(0).is_none());
        let change = nav.next().unwrap();
        assert_eq!(change.previous.unwrap().name, "L0");
        assert_eq!(change.current.name, "L1");
    }

    #[test]
    fn equal_values_in_new_allocations_do_not_emit() {
        let mut nav = NavigationState::new(seq(3));
        nav.commit();
        nav.next();

        // Same values, new objects (as a polling provider would return).
        nav.replace_sequence(seq(3));
        assert!(nav.commit().is_none());
        assert_eq!(nav.index(), Some(1));
    }

    #[test]
    fn single_entry_sequence_never_emits_after_activation() {
        let mut nav = NavigationState::new(seq(1));
        nav.commit();
        assert!(nav.next().is_none());
        assert!(nav.prev().is_none());
    }

    #[test]
    fn duplicate_values_do_not_emit() {
        let a = Location::new("Depot", 10.0, 10.0);
        let mut nav = NavigationState::new(vec![a.clone(), a]);
        nav.commit();
        assert!(nav.next().is_none());
        assert_eq!(nav.index(), Some(1));
    }

    #[test]
    fn goto_by_value_matches_coordinates() {
        let mut nav = NavigationState::new(seq(4));
        nav.commit();
        let target = Location::new("renamed", 2.000_000_000_1, 4.0);
        let change = nav.goto_by_value(&target).unwrap();
        assert_eq!(change.current.name, "L2");
        assert_eq!(nav.index(), Some(2));

        assert!(nav.goto_by_value(&Location::new("nowhere", 80.0, 80.0)).is_none());
        assert_eq!(nav.index(), Some(2));
    }

    #[test]
    fn replace_sequence_clamps_when_current_is_gone() {
        let mut nav = NavigationState::new(seq(5));
        nav.commit();
        nav.goto(4);
        nav.replace_sequence(seq(2));
        let change = nav.commit().unwrap();
        assert_eq!(nav.index(), Some(1));
        assert_eq!(change.current.name, "L1");
        assert_eq!(change.previous.unwrap().name, "L4");
    }
}
