// ABOUTME: Values held by in-flight runs (host ports, tenant identities).
// ABOUTME: A reservation releases its value when dropped, on every exit path.

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Shared set of values claimed by runs that have not finished.
pub struct Reservations<T: Ord> {
    held: Arc<Mutex<BTreeSet<T>>>,
}

impl<T: Ord> Default for Reservations<T> {
    fn default() -> Self {
        Self {
            held: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }
}

impl<T: Ord> Clone for Reservations<T> {
    fn clone(&self) -> Self {
        Self {
            held: Arc::clone(&self.held),
        }
    }
}

impl<T: Ord + Copy> Reservations<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `value`. Returns None while another reservation holds it.
    pub fn try_reserve(&self, value: T) -> Option<Reservation<T>> {
        if !self.held.lock().insert(value) {
            return None;
        }
        Some(Reservation {
            held: Arc::clone(&self.held),
            value,
        })
    }

    pub fn is_held(&self, value: T) -> bool {
        self.held.lock().contains(&value)
    }

    /// Currently held values in ascending order.
    pub fn snapshot(&self) -> Vec<T> {
        self.held.lock().iter().copied().collect()
    }
}

impl<T: Ord + fmt::Debug> fmt::Debug for Reservations<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.held.lock().iter()).finish()
    }
}

/// A held value; dropping it makes the value available again.
#[must_use = "dropping a reservation releases it immediately"]
pub struct Reservation<T: Ord> {
    held: Arc<Mutex<BTreeSet<T>>>,
    value: T,
}

impl<T: Ord + Copy> Reservation<T> {
    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: Ord> Drop for Reservation<T> {
    fn drop(&mut self) {
        self.held.lock().remove(&self.value);
    }
}

impl<T: Ord + fmt::Debug> fmt::Debug for Reservation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reservation").field(&self.value).finish()
    }
}
