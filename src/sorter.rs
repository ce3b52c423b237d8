use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;

use crate::signal::Signal;

/// How strictly a [`Sorter`] orders items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SorterOrder {
    /// All items compare equal, sorting is pointless.
    None,
    /// Some items compare equal.
    Partial,
    /// No two different items compare equal.
    Total,
}

/// How the order of a [`Sorter`] changed. Views are free to treat every change as `Different`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SorterChange {
    Different,
    /// The order was reversed.
    Inverted,
    /// Items that compared equal may now compare unequal.
    LessStrict,
    /// Items that compared unequal may now compare equal.
    MoreStrict,
}

/// Compares item handles. Must be a total preorder for the sorted result to be meaningful.
pub trait Sorter<I> {
    fn compare(&self, a: &I, b: &I) -> Ordering;

    fn order(&self) -> SorterOrder;

    /// Emitted after the order changed, all previous comparison results are stale.
    fn changed(&self) -> &Signal<SorterChange>;
}

type SortFn<I> = Box<dyn Fn(&I, &I) -> Ordering>;

/// A [`Sorter`] backed by a closure.
pub struct CustomSorter<I> {
    sort_fn: RefCell<Option<SortFn<I>>>,
    reversed: Cell<bool>,
    changed: Signal<SorterChange>,
}

impl<I> fmt::Debug for CustomSorter<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSorter")
            .field("has_sort_fn", &self.sort_fn.borrow().is_some())
            .field("reversed", &self.reversed.get())
            .finish()
    }
}

impl<I> Default for CustomSorter<I> {
    fn default() -> Self {
        Self {
            sort_fn: RefCell::new(None),
            reversed: Cell::new(false),
            changed: Signal::new(),
        }
    }
}

impl<I> CustomSorter<I> {
    pub fn new<F>(sort_fn: F) -> Self
    where
        F: Fn(&I, &I) -> Ordering + 'static,
    {
        Self {
            sort_fn: RefCell::new(Some(Box::new(sort_fn))),
            ..Self::default()
        }
    }

    /// Sorts by a key extracted from each item.
    pub fn by_key<K, F>(key_fn: F) -> Self
    where
        K: Ord,
        F: Fn(&I) -> K + 'static,
    {
        Self::new(move |a, b| key_fn(a).cmp(&key_fn(b)))
    }

    /// A sorter without a function, its order is [`SorterOrder::None`].
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn set_sort_func<F>(&self, sort_fn: F)
    where
        F: Fn(&I, &I) -> Ordering + 'static,
    {
        *self.sort_fn.borrow_mut() = Some(Box::new(sort_fn));
        self.changed.emit(&SorterChange::Different);
    }

    pub fn clear_sort_func(&self) {
        if self.sort_fn.borrow_mut().take().is_some() {
            self.changed.emit(&SorterChange::Different);
        }
    }

    pub fn reversed(&self) -> bool {
        self.reversed.get()
    }

    pub fn set_reversed(&self, reversed: bool) {
        if self.reversed.replace(reversed) != reversed {
            self.changed.emit(&SorterChange::Inverted);
        }
    }
}

impl<I> Sorter<I> for CustomSorter<I> {
    fn compare(&self, a: &I, b: &I) -> Ordering {
        let sort_fn = self.sort_fn.borrow();
        let ordering = match sort_fn.as_ref() {
            Some(sort_fn) => sort_fn(a, b),
            None => Ordering::Equal,
        };

        if self.reversed.get() {
            ordering.reverse()
        } else {
            ordering
        }
    }

    fn order(&self) -> SorterOrder {
        if self.sort_fn.borrow().is_some() {
            SorterOrder::Partial
        } else {
            SorterOrder::None
        }
    }

    fn changed(&self) -> &Signal<SorterChange> {
        &self.changed
    }
}
