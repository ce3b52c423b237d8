//! Keeps a [`SortArray`] in sync with edits of its source model.

use crate::list_model::{ItemsChanged, ListModel};
use crate::sort_array::SortArray;

/// The records of the previous view that an edit left in place: the first `start` and the last
/// `end` ones. `start + end` never exceeds the previous length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unmodified {
    pub start: usize,
    pub end: usize,
}

impl Unmodified {
    /// The change a view has to announce after records were dropped and `added` records were
    /// appended, going from `old_len` to `new_len` records.
    pub fn view_change(&self, old_len: usize, new_len: usize, added: usize) -> ItemsChanged {
        // Appended records are part of the changed range, so nothing at the end stays in place.
        let end = if added > 0 { 0 } else { self.end };
        let untouched = self.start + end;

        ItemsChanged::new(self.start, old_len - untouched, new_len - untouched)
    }
}

/// Drops the records whose source position falls into `position..position + removed` and moves
/// the positions of the records behind it by `added - removed`. The remaining records keep their
/// relative order.
///
/// # Panics
///
/// Panics if the number of dropped records differs from `removed`, which means the edit does not
/// match the state the array mirrors.
pub fn remove_items<I>(
    items: &mut SortArray<I>,
    position: usize,
    removed: usize,
    added: usize,
) -> Unmodified {
    let n_items = items.len();
    let removed_end = position + removed;

    let mut start = n_items;
    let mut end = 0;
    let mut index = 0;
    let mut kept = 0;

    items.retain_mut(|record| {
        let current = index;
        index += 1;

        if record.position >= removed_end {
            record.position = record.position - removed + added;
        } else if record.position >= position {
            start = start.min(kept);
            end = n_items - current - 1;
            return false;
        }

        kept += 1;
        true
    });

    assert_eq!(
        items.len() + removed,
        n_items,
        "removing {removed} items at {position} dropped {} records",
        n_items - items.len()
    );

    Unmodified { start, end }
}

/// Appends records for the source items at `position..position + added`, in source order.
///
/// # Panics
///
/// Panics if the model has no item at one of those positions.
pub fn append_items<I, M>(items: &mut SortArray<I>, model: &M, position: usize, added: usize)
where
    M: ListModel<Item = I> + ?Sized,
{
    items.reserve(added);
    for i in position..position + added {
        let item = model
            .item(i)
            .unwrap_or_else(|| panic!("source model has no item at {i}"));
        items.append(item, i);
    }
}

/// Decides how to restart the sort after an edit. Returns the length of the prefix that can be
/// assumed sorted, or `None` if no sort is needed.
///
/// Progress of an interrupted sort does not survive an edit, so the whole array is sorted again in
/// that case.
pub fn resort_hint(was_sorting: bool, new_len: usize, added: usize) -> Option<usize> {
    if was_sorting {
        Some(0)
    } else if added > 0 {
        Some(new_len - added)
    } else {
        None
    }
}
