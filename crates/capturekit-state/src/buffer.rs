//! Shared, append-only record lists.

use std::sync::Arc;

use parking_lot::Mutex;

/// Handle to a live record list.
///
/// Clones share the same list, so the debugger controller can append without a
/// round-trip through the state manager and `clear` truncates in place.
#[derive(Debug)]
pub struct RecordBuffer<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for RecordBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RecordBuffer<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> RecordBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: T) {
        self.inner.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Run `f` with exclusive access to the list.
    pub fn with<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Whether two handles point at the same list.
    pub fn same_list(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> RecordBuffer<T> {
    /// Copy of the current records.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_list() {
        let a: RecordBuffer<u32> = RecordBuffer::new();
        let b = a.clone();
        a.push(1);
        b.push(2);
        assert_eq!(a.snapshot(), vec![1, 2]);
        assert!(a.same_list(&b));

        b.clear();
        assert!(a.is_empty());
    }

    #[test]
    fn test_with_mutation() {
        let buf: RecordBuffer<String> = RecordBuffer::new();
        buf.push("a".to_string());
        let found = buf.with(|records| {
            let r = records.iter_mut().find(|r| r.as_str() == "a")?;
            r.push('!');
            Some(r.clone())
        });
        assert_eq!(found.as_deref(), Some("a!"));
        assert_eq!(buf.len(), 1);
    }
}
