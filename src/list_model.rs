use std::cell::RefCell;

use crate::signal::Signal;

/// Describes an edit of a list that was already applied: at `position`, `removed` items were
/// replaced by `added` new ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemsChanged {
    pub position: usize,
    pub removed: usize,
    pub added: usize,
}

impl ItemsChanged {
    pub fn new(position: usize, removed: usize, added: usize) -> Self {
        Self {
            position,
            removed,
            added,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.added == 0
    }
}

/// An indexed collection of item handles that announces its changes.
///
/// Handles are cheap to clone, typically an `Rc`. Implementations must emit
/// [`items_changed`](Self::items_changed) after the edit is visible through
/// [`n_items`](Self::n_items) and [`item`](Self::item), and must not hold any borrow of their
/// own state while emitting.
pub trait ListModel {
    type Item: Clone;

    fn n_items(&self) -> usize;

    /// Returns `None` if `position` is out of bounds.
    fn item(&self, position: usize) -> Option<Self::Item>;

    fn items_changed(&self) -> &Signal<ItemsChanged>;
}

/// A plain, mutable list.
#[derive(Debug)]
pub struct VecModel<I> {
    items: RefCell<Vec<I>>,
    items_changed: Signal<ItemsChanged>,
}

impl<I> Default for VecModel<I> {
    fn default() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            items_changed: Signal::new(),
        }
    }
}

impl<I: Clone> VecModel<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<I>) -> Self {
        Self {
            items: RefCell::new(items),
            items_changed: Signal::new(),
        }
    }

    pub fn append(&self, item: I) {
        let position = self.items.borrow().len();
        self.splice(position, 0, [item]);
    }

    pub fn insert(&self, position: usize, item: I) {
        self.splice(position, 0, [item]);
    }

    pub fn remove(&self, position: usize) {
        self.splice(position, 1, []);
    }

    pub fn clear(&self) {
        let len = self.items.borrow().len();
        self.splice(0, len, []);
    }

    /// Replaces `n_removals` items at `position` with `additions`.
    ///
    /// # Panics
    ///
    /// Panics if the removed range is out of bounds.
    pub fn splice<A>(&self, position: usize, n_removals: usize, additions: A)
    where
        A: IntoIterator<Item = I>,
    {
        let added = {
            let mut items = self.items.borrow_mut();
            let len_before = items.len();
            assert!(
                position <= len_before && n_removals <= len_before - position,
                "VecModel::splice({position}, {n_removals}) out of bounds for length {len_before}"
            );

            items
                .splice(position..position + n_removals, additions)
                .for_each(drop);
            items.len() + n_removals - len_before
        };

        let change = ItemsChanged::new(position, n_removals, added);
        if !change.is_empty() {
            self.items_changed.emit(&change);
        }
    }

    pub fn to_vec(&self) -> Vec<I> {
        self.items.borrow().clone()
    }
}

impl<I: Clone> ListModel for VecModel<I> {
    type Item = I;

    fn n_items(&self) -> usize {
        self.items.borrow().len()
    }

    fn item(&self, position: usize) -> Option<I> {
        self.items.borrow().get(position).cloned()
    }

    fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.items_changed
    }
}
