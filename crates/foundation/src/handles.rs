/// Generation token used to invalidate work scheduled by an earlier lifetime.
///
/// Anything tagged with a generation older than the owner's current one must
/// be ignored.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u32);

impl Generation {
    pub fn bump(&mut self) -> Generation {
        self.0 = self.0.wrapping_add(1);
        *self
    }

    pub fn is_current(self, current: Generation) -> bool {
        self == current
    }
}

#[cfg(test)]
mod tests {
    use super::Generation;

    #[test]
    fn bumping_invalidates_older_generations() {
        let mut g = Generation::default();
        let tagged = g;
        assert!(tagged.is_current(g));
        assert_eq!(g.bump(), Generation(1));
        assert!(!tagged.is_current(g));
    }

    #[test]
    fn bump_wraps() {
        let mut g = Generation(u32::MAX);
        assert_eq!(g.bump(), Generation(0));
    }
}
