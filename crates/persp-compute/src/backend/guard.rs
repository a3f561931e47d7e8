//! Process-wide acceleration flag.
//!
//! GPU primitives refuse to dispatch while the flag is off. Accelerated
//! executor runs hold an [`AccelGuard`] for their whole duration; the flag
//! reads on while at least one guard is alive. Guards are counted rather
//! than swapped, so they may be dropped in any order and from any thread,
//! and runs on other backends never touch the flag.

use std::sync::atomic::{AtomicUsize, Ordering};

static HOLDERS: AtomicUsize = AtomicUsize::new(0);

/// Current value of the acceleration flag.
pub fn acceleration_enabled() -> bool {
    HOLDERS.load(Ordering::SeqCst) > 0
}

/// Number of live [`AccelGuard`]s.
pub fn acceleration_holders() -> usize {
    HOLDERS.load(Ordering::SeqCst)
}

/// Keeps the acceleration flag on until dropped.
#[must_use = "the flag is released when the guard drops"]
#[derive(Debug)]
pub struct AccelGuard {
    _private: (),
}

impl AccelGuard {
    /// Raises the flag for the lifetime of the guard.
    pub fn acquire() -> Self {
        let prev = HOLDERS.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(holders = prev + 1, "acceleration flag acquired");
        Self { _private: () }
    }
}

impl Drop for AccelGuard {
    fn drop(&mut self) {
        let prev = HOLDERS.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(holders = prev - 1, "acceleration flag released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    // Single test so parallel test threads never race on the global.
    #[test]
    fn test_guard_lifecycle() {
        let before = acceleration_holders();

        {
            let _outer = AccelGuard::acquire();
            assert!(acceleration_enabled());
            {
                let _inner = AccelGuard::acquire();
                assert_eq!(acceleration_holders(), before + 2);
            }
            assert!(acceleration_enabled());
        }
        assert_eq!(acceleration_holders(), before);

        // Released on unwind.
        let result = std::panic::catch_unwind(|| {
            let _g = AccelGuard::acquire();
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(acceleration_holders(), before);

        // Out-of-order release across threads: A acquires, B acquires,
        // A checks and drops first, then B drops.
        let step = Arc::new(Barrier::new(2));
        let a = {
            let step = Arc::clone(&step);
            thread::spawn(move || {
                let g = AccelGuard::acquire();
                step.wait(); // A holds
                step.wait(); // B holds
                let seen = acceleration_enabled();
                drop(g);
                step.wait(); // A released
                seen
            })
        };
        let b = {
            let step = Arc::clone(&step);
            thread::spawn(move || {
                step.wait();
                let g = AccelGuard::acquire();
                step.wait();
                step.wait();
                let seen = acceleration_enabled();
                drop(g);
                seen
            })
        };
        assert!(a.join().unwrap());
        assert!(b.join().unwrap());
        assert_eq!(acceleration_holders(), before);
    }
}
