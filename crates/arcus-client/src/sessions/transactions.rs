// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transaction id allocation and correlation.
//!
//! Asynchronous session-level requests are identified on the wire by a
//! transaction id; the registry maps each id back to the caller-supplied
//! request handle so completions can be correlated. One mutex protects
//! both the id counter and the map: allocating an id and binding it must
//! be a single critical section, otherwise a completion racing the
//! binding could observe the id without its handle.

use std::collections::HashMap;

use parking_lot::Mutex;

use arcus_core::error::{ClientError, ClientResult};
use arcus_core::types::{RequestHandle, TransactionId};

// =============================================================================
// TransactionRegistry
// =============================================================================

#[derive(Debug)]
struct RegistryInner {
    /// Next id candidate. Wraps around; bound ids are skipped.
    next_id: u32,

    /// Live bindings.
    bindings: HashMap<TransactionId, RequestHandle>,
}

/// Allocates transaction ids and maps them to request handles.
#[derive(Debug)]
pub struct TransactionRegistry {
    inner: Mutex<RegistryInner>,
}

impl TransactionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 1,
                bindings: HashMap::new(),
            }),
        }
    }

    /// Allocates a fresh id and binds it to `handle` in one critical
    /// section.
    pub fn begin(&self, handle: RequestHandle) -> TransactionId {
        let mut inner = self.inner.lock();
        let id = Self::allocate(&mut inner);
        inner.bindings.insert(id, handle);
        id
    }

    /// Allocates a fresh id without binding it.
    ///
    /// Prefer [`begin`](Self::begin) when the id is to be bound: a
    /// separate `new_id` + `bind` pair is two critical sections.
    pub fn new_id(&self) -> TransactionId {
        let mut inner = self.inner.lock();
        Self::allocate(&mut inner)
    }

    /// Binds an id to a handle.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TransactionInUse`] if the id is already
    /// bound.
    pub fn bind(&self, id: TransactionId, handle: RequestHandle) -> ClientResult<()> {
        let mut inner = self.inner.lock();
        if inner.bindings.contains_key(&id) {
            return Err(ClientError::TransactionInUse { transaction_id: id });
        }
        inner.bindings.insert(id, handle);
        Ok(())
    }

    /// Atomically removes and returns the binding for `id`.
    ///
    /// An absent binding is not an error here: completions may arrive
    /// after a rollback or after shutdown, and the router drops them.
    pub fn take(&self, id: TransactionId) -> Option<RequestHandle> {
        self.inner.lock().bindings.remove(&id)
    }

    /// Removes the binding for `id`, if any. Used for rollback after a
    /// failed dispatch.
    pub fn erase(&self, id: TransactionId) -> bool {
        self.inner.lock().bindings.remove(&id).is_some()
    }

    /// Returns `true` if `id` is currently bound.
    pub fn contains(&self, id: TransactionId) -> bool {
        self.inner.lock().bindings.contains_key(&id)
    }

    /// Returns the number of live bindings.
    pub fn len(&self) -> usize {
        self.inner.lock().bindings.len()
    }

    /// Returns `true` if no bindings are live.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().bindings.is_empty()
    }

    /// Picks the next free id. The counter wraps; ids still bound are
    /// skipped so an id is never handed out twice while live.
    fn allocate(inner: &mut RegistryInner) -> TransactionId {
        loop {
            let candidate = TransactionId::new(inner.next_id);
            inner.next_id = inner.next_id.wrapping_add(1);
            if !inner.bindings.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_take_round_trip() {
        let registry = TransactionRegistry::new();
        let id = registry.begin(RequestHandle::new(42));

        assert!(registry.contains(id));
        assert_eq!(registry.take(id), Some(RequestHandle::new(42)));
        assert!(!registry.contains(id));
        assert_eq!(registry.take(id), None);
    }

    #[test]
    fn test_ids_are_unique_while_bound() {
        let registry = TransactionRegistry::new();
        let a = registry.begin(RequestHandle::new(1));
        let b = registry.begin(RequestHandle::new(2));
        let c = registry.new_id();

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_double_bind_fails() {
        let registry = TransactionRegistry::new();
        let id = registry.new_id();
        registry.bind(id, RequestHandle::new(1)).unwrap();

        let error = registry.bind(id, RequestHandle::new(2)).unwrap_err();
        assert!(matches!(error, ClientError::TransactionInUse { .. }));
        assert_eq!(registry.take(id), Some(RequestHandle::new(1)));
    }

    #[test]
    fn test_erase() {
        let registry = TransactionRegistry::new();
        let id = registry.begin(RequestHandle::new(7));

        assert!(registry.erase(id));
        assert!(!registry.erase(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_wrap_around_skips_bound_ids() {
        let registry = TransactionRegistry::new();
        {
            let mut inner = registry.inner.lock();
            inner.next_id = u32::MAX;
        }
        let a = registry.begin(RequestHandle::new(1));
        assert_eq!(a, TransactionId::new(u32::MAX));

        // The counter wraps to 0, then 1; both are free.
        let b = registry.begin(RequestHandle::new(2));
        assert_eq!(b, TransactionId::new(0));

        // Pin the counter back onto a bound id: allocation must skip it.
        {
            let mut inner = registry.inner.lock();
            inner.next_id = u32::MAX;
        }
        let c = registry.begin(RequestHandle::new(3));
        assert_eq!(c, TransactionId::new(1));
    }
}
