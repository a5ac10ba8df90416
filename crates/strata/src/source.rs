//! Row sources: addressable sequences the engine reads records from.
//!
//! A source only has to answer `count()` and `row(index)`; the engine makes
//! exactly one full pass per rebuild and never retains references into the
//! source afterwards, so hosts are free to keep the real dataset virtual.

use parking_lot::RwLock;

use strata_core::Signal;

/// An addressable sequence of model records.
pub trait RowSource: Send + Sync {
    /// The record type this source yields.
    type Row;

    /// Returns the number of records.
    fn count(&self) -> usize;

    /// Returns the record at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= count()`.
    fn row(&self, index: usize) -> Self::Row;
}

impl<T: Clone + Send + Sync> RowSource for Vec<T> {
    type Row = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> T {
        self[index].clone()
    }
}

/// Collection of signals emitted by a [`RecordList`].
///
/// Observers connect to these to stay synchronized with the list; a grouping
/// host typically triggers a regroup from the "after" signals.
pub struct ListSignals {
    /// Emitted just before rows are inserted. Args: (first row, last row).
    pub rows_about_to_be_inserted: Signal<(usize, usize)>,
    /// Emitted after rows have been inserted. Args: (first row, last row).
    pub rows_inserted: Signal<(usize, usize)>,
    /// Emitted just before rows are removed. Args: (first row, last row).
    pub rows_about_to_be_removed: Signal<(usize, usize)>,
    /// Emitted after rows have been removed. Args: (first row, last row).
    pub rows_removed: Signal<(usize, usize)>,
    /// Emitted when an existing row's data changes. Args: row index.
    pub row_changed: Signal<usize>,
    /// Emitted before the list is replaced wholesale.
    pub list_about_to_reset: Signal<()>,
    /// Emitted after the list has been replaced wholesale.
    pub list_reset: Signal<()>,
}

impl Default for ListSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ListSignals {
    /// Creates a new set of list signals.
    pub fn new() -> Self {
        Self {
            rows_about_to_be_inserted: Signal::new(),
            rows_inserted: Signal::new(),
            rows_about_to_be_removed: Signal::new(),
            rows_removed: Signal::new(),
            row_changed: Signal::new(),
            list_about_to_reset: Signal::new(),
            list_reset: Signal::new(),
        }
    }

    /// Emits signals for row insertion around the provided mutation.
    pub fn emit_rows_inserted<F>(&self, first: usize, last: usize, insert_fn: F)
    where
        F: FnOnce(),
    {
        self.rows_about_to_be_inserted.emit((first, last));
        insert_fn();
        self.rows_inserted.emit((first, last));
    }

    /// Emits signals for row removal around the provided mutation.
    pub fn emit_rows_removed<F>(&self, first: usize, last: usize, remove_fn: F)
    where
        F: FnOnce(),
    {
        self.rows_about_to_be_removed.emit((first, last));
        remove_fn();
        self.rows_removed.emit((first, last));
    }

    /// Emits signals for a wholesale reset around the provided mutation.
    pub fn emit_reset<F>(&self, reset_fn: F)
    where
        F: FnOnce(),
    {
        self.list_about_to_reset.emit(());
        reset_fn();
        self.list_reset.emit(());
    }
}

/// An observable, in-memory row source.
///
/// `RecordList<T>` holds the records behind a read-write lock and wraps each
/// mutation in before/after signal pairs, so hosts can schedule a regroup
/// whenever the data changes.
///
/// # Example
///
/// ```
/// use strata::RecordList;
///
/// let list = RecordList::new(vec!["ale".to_string(), "stout".to_string()]);
/// list.push("porter".to_string());
/// assert_eq!(list.len(), 3);
/// ```
pub struct RecordList<T> {
    items: RwLock<Vec<T>>,
    signals: ListSignals,
}

impl<T: Send + Sync> RecordList<T> {
    /// Creates a list holding the given records.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            signals: ListSignals::new(),
        }
    }

    /// Creates an empty list.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns the signals for this list.
    pub fn signals(&self) -> &ListSignals {
        &self.signals
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if the list holds no records.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Appends a record to the end of the list.
    pub fn push(&self, item: T) {
        let row = self.items.read().len();
        self.signals.emit_rows_inserted(row, row, || {
            self.items.write().push(item);
        });
    }

    /// Inserts a record at the specified index.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&self, index: usize, item: T) {
        self.signals.emit_rows_inserted(index, index, || {
            self.items.write().insert(index, item);
        });
    }

    /// Removes and returns the record at the specified index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove(&self, index: usize) -> T {
        let mut removed = None;
        self.signals.emit_rows_removed(index, index, || {
            removed = Some(self.items.write().remove(index));
        });
        removed.unwrap()
    }

    /// Removes all records from the list.
    pub fn clear(&self) {
        self.signals.emit_reset(|| {
            self.items.write().clear();
        });
    }

    /// Replaces all records in the list.
    pub fn set_items(&self, items: Vec<T>) {
        self.signals.emit_reset(|| {
            *self.items.write() = items;
        });
    }

    /// Provides mutable access to a record via a closure.
    ///
    /// Emits `row_changed` after the modification. Returns `None` when the
    /// index is out of range.
    pub fn modify<F, R>(&self, index: usize, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut items = self.items.write();
        if index >= items.len() {
            return None;
        }
        let result = f(&mut items[index]);
        drop(items);

        self.signals.row_changed.emit(index);
        Some(result)
    }

    /// Returns a read-only view of the records.
    pub fn items(&self) -> impl std::ops::Deref<Target = Vec<T>> + '_ {
        self.items.read()
    }
}

impl<T: Clone + Send + Sync> RowSource for RecordList<T> {
    type Row = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> T {
        self.items.read()[index].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_vec_source() {
        let rows = vec![10, 20, 30];
        assert_eq!(rows.count(), 3);
        assert_eq!(rows.row(1), 20);
    }

    #[test]
    fn test_push_and_signals() {
        let list = RecordList::<i32>::empty();
        let inserted = Arc::new(Mutex::new(Vec::new()));

        let recv = inserted.clone();
        list.signals().rows_inserted.connect(move |(first, last)| {
            recv.lock().push((*first, *last));
        });

        list.push(42);
        list.push(43);

        assert_eq!(list.len(), 2);
        assert_eq!(*inserted.lock(), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_remove_and_signals() {
        let list = RecordList::new(vec!["a", "b", "c"]);
        let removed = Arc::new(Mutex::new(Vec::new()));

        let recv = removed.clone();
        list.signals().rows_removed.connect(move |(first, last)| {
            recv.lock().push((*first, *last));
        });

        let item = list.remove(1);
        assert_eq!(item, "b");
        assert_eq!(list.len(), 2);
        assert_eq!(*removed.lock(), vec![(1, 1)]);
    }

    #[test]
    fn test_set_items_resets() {
        let list = RecordList::new(vec![1]);
        let reset = Arc::new(Mutex::new(false));

        let recv = reset.clone();
        list.signals().list_reset.connect(move |_| *recv.lock() = true);

        list.set_items(vec![1, 2, 3]);
        assert!(*reset.lock());
        assert_eq!(list.count(), 3);
    }

    #[test]
    fn test_modify() {
        let list = RecordList::new(vec![String::from("old")]);
        let changed = Arc::new(Mutex::new(None));

        let recv = changed.clone();
        list.signals().row_changed.connect(move |row| {
            *recv.lock() = Some(*row);
        });

        list.modify(0, |s| *s = "new".into());
        assert_eq!(list.row(0), "new");
        assert_eq!(*changed.lock(), Some(0));

        assert!(list.modify(5, |_| ()).is_none());
    }
}
