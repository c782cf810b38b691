//! The single coarse lock serializing every public operation.
//!
//! The spec calls for exactly one filesystem-wide mutual-exclusion
//! primitive, treated as an injected dependency rather than a hardwired
//! `std::sync::Mutex` so a host embedding this crate can supply its own
//! primitive (a `Spinlock`, an async-aware mutex, ...).

use parking_lot::{Mutex, MutexGuard};

/// A mutual-exclusion primitive guarding a `T`.
///
/// Implementations must provide the usual mutex contract: at most one
/// caller holds the guard at a time, and acquisition order across
/// contending callers determines operation order (see the concurrency
/// model's total-ordering requirement).
pub trait RawLock<T> {
    type Guard<'a>: std::ops::DerefMut<Target = T>
    where
        Self: 'a,
        T: 'a;

    fn new(value: T) -> Self
    where
        Self: Sized;

    fn lock(&self) -> Self::Guard<'_>;
}

/// The default lock, backed by [`parking_lot::Mutex`].
pub struct DefaultLock<T>(Mutex<T>);

impl<T> RawLock<T> for DefaultLock<T> {
    type Guard<'a>
        = MutexGuard<'a, T>
    where
        T: 'a;

    fn new(value: T) -> Self {
        DefaultLock(Mutex::new(value))
    }

    fn lock(&self) -> Self::Guard<'_> {
        self.0.lock()
    }
}
