//! # Sizing function.
//!
//! A [`Sizer`] returns the desired number of live workers. The controller calls it
//! once per poll tick while input remains, so it should be cheap; any closure
//! `Fn(&C) -> usize` is a sizer.

use std::sync::Arc;

/// Shared handle to a sizing function.
pub type SizerRef<C> = Arc<dyn Sizer<C>>;

/// Desired pool size, evaluated against the run configuration.
pub trait Sizer<C>: Send + Sync + 'static {
    /// Returns the desired worker count (`0` is allowed and drains the pool).
    fn target(&self, config: &C) -> usize;
}

impl<C, F> Sizer<C> for F
where
    F: Fn(&C) -> usize + Send + Sync + 'static,
{
    fn target(&self, config: &C) -> usize {
        self(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Load {
        level: AtomicUsize,
    }

    impl Sizer<usize> for Load {
        fn target(&self, per_level: &usize) -> usize {
            self.level.load(Ordering::Relaxed) * per_level
        }
    }

    #[test]
    fn closures_and_structs_are_sizers() {
        let constant: SizerRef<()> = Arc::new(|_: &()| 3);
        assert_eq!(constant.target(&()), 3);

        let load = Load {
            level: AtomicUsize::new(2),
        };
        assert_eq!(load.target(&4), 8);
        load.level.store(0, Ordering::Relaxed);
        assert_eq!(load.target(&4), 0);
    }
}
