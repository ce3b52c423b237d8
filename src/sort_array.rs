/// An item of the source model together with the position it was last known to have there.
///
/// `position` is a position in the *source* model, not in the sorted view. The position in the
/// view is the index of the record inside its [`SortArray`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortItem<I> {
    pub item: I,
    pub position: usize,
}

impl<I> SortItem<I> {
    pub fn new(item: I, position: usize) -> Self {
        Self { item, position }
    }
}

/// The sorted materialization of a source model.
///
/// Every record holds one reference to its item for as long as it is part of the array. The only
/// ways to release them are [`remove_range`](Self::remove_range), [`retain_mut`](Self::retain_mut),
/// [`set`](Self::set) and [`clear`](Self::clear).
///
/// An empty array means the view passes the source through unmodified.
#[derive(Clone, Debug)]
pub struct SortArray<I> {
    items: Vec<SortItem<I>>,
}

impl<I> Default for SortArray<I> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<I> SortArray<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    pub fn append(&mut self, item: I, position: usize) {
        self.items.push(SortItem::new(item, position));
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn get(&self, index: usize) -> &SortItem<I> {
        &self.items[index]
    }

    /// Replaces the record at `index`, releasing the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, record: SortItem<I>) {
        self.items[index] = record;
    }

    /// Removes and releases `count` records starting at `start`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn remove_range(&mut self, start: usize, count: usize) {
        let end = start
            .checked_add(count)
            .expect("SortArray::remove_range overflows");
        assert!(
            end <= self.items.len(),
            "SortArray::remove_range({start}, {count}) out of bounds for length {}",
            self.items.len()
        );

        self.items.drain(start..end);
    }

    /// Releases every record.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Keeps the records for which `keep` returns true, in order, releasing the others.
    pub fn retain_mut<F>(&mut self, keep: F)
    where
        F: FnMut(&mut SortItem<I>) -> bool,
    {
        self.items.retain_mut(keep);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SortItem<I>> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[SortItem<I>] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [SortItem<I>] {
        &mut self.items
    }
}

impl<I> Extend<SortItem<I>> for SortArray<I> {
    fn extend<T: IntoIterator<Item = SortItem<I>>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}
