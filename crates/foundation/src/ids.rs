/// Monotonic id allocator.
///
/// Ids are never reused within one allocator, which keeps ordering by id
/// equivalent to ordering by creation.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_raw(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Declares a `Copy` newtype id over `u64`.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            pub fn allocate(ids: &mut $crate::ids::IdAllocator) -> Self {
                $name(ids.next_raw())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::IdAllocator;

    define_id!(TestId);

    #[test]
    fn ids_are_monotonic() {
        let mut ids = IdAllocator::new();
        let a = TestId::allocate(&mut ids);
        let b = TestId::allocate(&mut ids);
        assert!(a < b);
        assert_eq!(a, TestId(0));
    }
}
