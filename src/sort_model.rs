//! A list model that presents the items of another model in the order given by a [`Sorter`].
//!
//! Sorting happens incrementally on a [`Scheduler`], one bounded [`TimSort::step`] per dispatch.
//! Between steps the view exposes the partially sorted order and announces every step as a
//! view-wide change.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};
use std::thread;
use std::time::Instant;

use crate::config::SortConfig;
use crate::list_model::{ItemsChanged, ListModel};
use crate::reconcile;
use crate::scheduler::{Scheduler, TaskId};
use crate::signal::{HandlerId, Signal};
use crate::sort_array::{SortArray, SortItem};
use crate::sorter::{Sorter, SorterOrder};
use crate::timsort::TimSort;

/// Observable properties of a [`SortListModel`], carried by its [`notify`](SortListModel::notify)
/// signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Property {
    Model,
    Sorter,
    Sorting,
}

/// What a [`SortListModel`] currently shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    /// The source is shown unmodified, nothing is materialized.
    Passthrough,
    /// The items are materialized and a sort is scheduled, but no step ran yet.
    Materializing,
    /// A sort is in progress, the view shows a partially sorted order.
    Sorting,
    /// The view shows the sorted order.
    Sorted,
}

type Model<I> = Rc<dyn ListModel<Item = I>>;

struct State<I: Clone + 'static> {
    model: Option<Model<I>>,
    model_handler: Option<HandlerId>,
    sorter: Option<Rc<dyn Sorter<I>>>,
    sorter_handler: Option<HandlerId>,
    items: SortArray<I>,
    sort: TimSort,
    step_task: Option<TaskId>,
    steps: usize,
    started_at: Option<Instant>,
    /// A step unwound, the records are in no particular order.
    interrupted: bool,
}

impl<I: Clone + 'static> State<I> {
    fn should_sort(&self) -> bool {
        self.model.is_some()
            && self
                .sorter
                .as_ref()
                .map_or(false, |sorter| sorter.order() != SorterOrder::None)
    }

    fn is_sorting(&self) -> bool {
        self.step_task.is_some()
    }

    fn n_items(&self) -> usize {
        if !self.items.is_empty() {
            return self.items.len();
        }

        self.model.as_ref().map_or(0, |model| model.n_items())
    }
}

/// Notifications collected while the state is borrowed, emitted once it is released.
#[derive(Default)]
struct Emissions {
    items_changed: Vec<ItemsChanged>,
    notify: Vec<Property>,
}

/// Stops the sort when a step unwinds, so the view never claims to be sorting without a step
/// being scheduled.
struct StepGuard<'a, I: Clone + 'static> {
    shared: &'a Shared<I>,
    state: &'a mut State<I>,
}

impl<I: Clone + 'static> Drop for StepGuard<'_, I> {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::debug!(step = self.state.steps, "sort step unwound");
            self.state.interrupted = true;
            self.shared.stop_sorting(self.state);
        }
    }
}

struct Shared<I: Clone + 'static> {
    this: Weak<Shared<I>>,
    scheduler: Rc<dyn Scheduler>,
    state: RefCell<State<I>>,
    items_changed: Signal<ItemsChanged>,
    notify: Signal<Property>,
}

impl<I: Clone + 'static> Shared<I> {
    fn emit(&self, out: Emissions) {
        for change in out.items_changed {
            self.items_changed.emit(&change);
        }
        for property in out.notify {
            self.notify.emit(&property);
        }
    }

    fn update<F>(&self, f: F)
    where
        F: FnOnce(&Self, &mut State<I>, &mut Emissions),
    {
        let mut out = Emissions::default();
        {
            let mut state = self.state.borrow_mut();
            let was_sorting = state.is_sorting();

            f(self, &mut *state, &mut out);

            if state.is_sorting() != was_sorting {
                out.notify.push(Property::Sorting);
            }
        }
        self.emit(out);
    }

    fn start_sorting(&self, state: &mut State<I>) {
        if state.is_sorting() {
            return;
        }

        let this = self.this.clone();
        let task = self.scheduler.schedule(Box::new(move || match this.upgrade() {
            Some(shared) => shared.sort_step(),
            None => ControlFlow::Break(()),
        }));

        state.step_task = Some(task);
        state.steps = 0;
        state.started_at = Some(Instant::now());

        tracing::debug!(n_items = state.items.len(), "sort started");
    }

    fn stop_sorting(&self, state: &mut State<I>) {
        let Some(task) = state.step_task.take() else {
            return;
        };

        let completed = state.sort.is_finished();
        state.sort.finish();
        self.scheduler.cancel(task);

        let elapsed = state.started_at.take().map(|started| started.elapsed());
        tracing::debug!(
            n_items = state.items.len(),
            steps = state.steps,
            ?elapsed,
            completed,
            "sort stopped"
        );
    }

    fn clear_items(&self, state: &mut State<I>) {
        self.stop_sorting(state);
        state.items.clear();
        state.interrupted = false;
    }

    fn create_items(&self, state: &mut State<I>) {
        if !state.should_sort() {
            return;
        }

        if let Some(model) = state.model.clone() {
            reconcile::append_items(&mut state.items, &*model, 0, model.n_items());
        }
    }

    fn resort(&self, state: &mut State<I>, mut already_sorted: usize) {
        if state.is_sorting() {
            already_sorted = 0;
            self.stop_sorting(state);
        }
        if mem::take(&mut state.interrupted) {
            already_sorted = 0;
        }

        if !state.should_sort() {
            return;
        }

        state.sort.start(state.items.len(), already_sorted);
        self.start_sorting(state);
    }

    fn clear_model(&self, state: &mut State<I>) {
        let Some(model) = state.model.take() else {
            return;
        };

        if let Some(handler) = state.model_handler.take() {
            model.items_changed().disconnect(handler);
        }
        self.clear_items(state);
    }

    fn clear_sorter(&self, state: &mut State<I>) {
        let Some(sorter) = state.sorter.take() else {
            return;
        };

        if let Some(handler) = state.sorter_handler.take() {
            sorter.changed().disconnect(handler);
        }
        self.clear_items(state);
    }

    fn sort_step(&self) -> ControlFlow<()> {
        let mut flow = ControlFlow::Break(());

        self.update(|shared, state, out| {
            if !state.is_sorting() {
                return;
            }
            let Some(sorter) = state.sorter.clone() else {
                shared.stop_sorting(state);
                return;
            };

            let mut guard = StepGuard { shared, state };
            let state = &mut *guard.state;

            // Items the sorter considers equal keep their source order, also across edits.
            let more = state.sort.step(
                state.items.as_mut_slice(),
                &mut |a: &SortItem<I>, b: &SortItem<I>| match sorter.compare(&a.item, &b.item) {
                    Ordering::Equal => a.position < b.position,
                    order => order == Ordering::Less,
                },
            );
            state.steps += 1;

            let stats = state.sort.last_step();
            tracing::trace!(
                step = state.steps,
                comparisons = stats.comparisons,
                work = stats.work,
                more,
                "sort step"
            );

            let n_items = state.items.len();
            if n_items > 1 && stats.work > 0 {
                out.items_changed
                    .push(ItemsChanged::new(0, n_items, n_items));
            }

            if more {
                flow = ControlFlow::Continue(());
            } else {
                shared.stop_sorting(state);
            }
        });

        flow
    }

    fn items_changed_cb(&self, change: ItemsChanged) {
        if change.is_empty() {
            return;
        }

        self.update(|shared, state, out| {
            if !state.should_sort() {
                out.items_changed.push(change);
                return;
            }

            let was_sorting = state.is_sorting();
            shared.stop_sorting(state);

            let old_len = state.items.len();
            let unmodified = reconcile::remove_items(
                &mut state.items,
                change.position,
                change.removed,
                change.added,
            );

            if change.added > 0 {
                if let Some(model) = state.model.clone() {
                    reconcile::append_items(
                        &mut state.items,
                        &*model,
                        change.position,
                        change.added,
                    );
                }
            }

            let new_len = state.items.len();
            let hint =
                reconcile::resort_hint(was_sorting || state.interrupted, new_len, change.added);
            if let Some(already_sorted) = hint {
                shared.resort(state, already_sorted);
            }

            let view_change = unmodified.view_change(old_len, new_len, change.added);
            tracing::trace!(
                position = change.position,
                removed = change.removed,
                added = change.added,
                unmodified_start = unmodified.start,
                unmodified_end = unmodified.end,
                ?hint,
                "reconciled source change"
            );

            out.items_changed.push(view_change);
        });
    }

    fn sorter_changed(&self, state: &mut State<I>, out: &mut Emissions) {
        let order = state.sorter.as_ref().map(|sorter| sorter.order());

        if order == Some(SorterOrder::None) {
            self.clear_items(state);
        } else if state.items.is_empty() {
            self.create_items(state);
        }

        self.resort(state, 0);

        let n_items = state.n_items();
        if n_items > 1 {
            out.items_changed
                .push(ItemsChanged::new(0, n_items, n_items));
        }
    }
}

impl<I: Clone + 'static> Drop for Shared<I> {
    fn drop(&mut self) {
        let state = self.state.get_mut();

        if let Some(task) = state.step_task.take() {
            self.scheduler.cancel(task);
        }
        if let (Some(model), Some(handler)) = (&state.model, state.model_handler.take()) {
            model.items_changed().disconnect(handler);
        }
        if let (Some(sorter), Some(handler)) = (&state.sorter, state.sorter_handler.take()) {
            sorter.changed().disconnect(handler);
        }
    }
}

fn same_instance<T: ?Sized>(a: Option<&Rc<T>>, b: Option<&Rc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const (),
        (None, None) => true,
        _ => false,
    }
}

/// A [`ListModel`] that sorts the items of its source model incrementally.
///
/// Without a model, without a sorter or with a sorter of order [`SorterOrder::None`] the view
/// passes its model through. Otherwise it keeps its own copy of the item handles, which is
/// brought into order by steps dispatched from the scheduler.
///
/// The sorter must not access the view from its comparison function.
pub struct SortListModel<I: Clone + 'static> {
    shared: Rc<Shared<I>>,
}

impl<I: Clone + 'static> fmt::Debug for SortListModel<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortListModel")
            .field("state", &self.state())
            .field("n_items", &self.n_items())
            .finish()
    }
}

impl<I: Clone + 'static> SortListModel<I> {
    pub fn new(
        model: Option<Model<I>>,
        sorter: Option<Rc<dyn Sorter<I>>>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self::with_config(model, sorter, scheduler, SortConfig::global())
    }

    pub fn with_config(
        model: Option<Model<I>>,
        sorter: Option<Rc<dyn Sorter<I>>>,
        scheduler: Rc<dyn Scheduler>,
        config: SortConfig,
    ) -> Self {
        let shared = Rc::new_cyclic(|this| Shared {
            this: this.clone(),
            scheduler,
            state: RefCell::new(State {
                model: None,
                model_handler: None,
                sorter: None,
                sorter_handler: None,
                items: SortArray::new(),
                sort: TimSort::new(config),
                step_task: None,
                steps: 0,
                started_at: None,
                interrupted: false,
            }),
            items_changed: Signal::new(),
            notify: Signal::new(),
        });

        let view = Self { shared };
        if model.is_some() {
            view.set_model(model);
        }
        if sorter.is_some() {
            view.set_sorter(sorter);
        }
        view
    }

    pub fn model(&self) -> Option<Model<I>> {
        self.shared.state.borrow().model.clone()
    }

    /// Replaces the source model, announcing the whole content as replaced.
    pub fn set_model(&self, model: Option<Model<I>>) {
        if same_instance(self.shared.state.borrow().model.as_ref(), model.as_ref()) {
            return;
        }

        self.shared.update(|shared, state, out| {
            let removed = state.n_items();
            shared.clear_model(state);

            let added = match model {
                Some(model) => {
                    let this = shared.this.clone();
                    let handler = model.items_changed().connect(move |change| {
                        if let Some(shared) = this.upgrade() {
                            shared.items_changed_cb(*change);
                        }
                    });

                    let added = model.n_items();
                    state.model = Some(model);
                    state.model_handler = Some(handler);

                    shared.create_items(state);
                    shared.resort(state, 0);
                    added
                }
                None => 0,
            };

            tracing::debug!(removed, added, "model replaced");

            if removed > 0 || added > 0 {
                out.items_changed.push(ItemsChanged::new(0, removed, added));
            }
            out.notify.push(Property::Model);
        });
    }

    pub fn sorter(&self) -> Option<Rc<dyn Sorter<I>>> {
        self.shared.state.borrow().sorter.clone()
    }

    /// Replaces the sorter and sorts the view again from scratch.
    pub fn set_sorter(&self, sorter: Option<Rc<dyn Sorter<I>>>) {
        if same_instance(self.shared.state.borrow().sorter.as_ref(), sorter.as_ref()) {
            return;
        }

        self.shared.update(|shared, state, out| {
            shared.clear_sorter(state);

            match sorter {
                Some(sorter) => {
                    let this = shared.this.clone();
                    let handler = sorter.changed().connect(move |change| {
                        if let Some(shared) = this.upgrade() {
                            tracing::debug!(?change, "sorter changed");
                            shared.update(|shared, state, out| shared.sorter_changed(state, out));
                        }
                    });

                    state.sorter = Some(sorter);
                    state.sorter_handler = Some(handler);
                    shared.sorter_changed(state, out);
                }
                None => {
                    let n_items = state.n_items();
                    if n_items > 1 {
                        out.items_changed
                            .push(ItemsChanged::new(0, n_items, n_items));
                    }
                }
            }

            tracing::debug!(n_items = state.n_items(), "sorter replaced");
            out.notify.push(Property::Sorter);
        });
    }

    /// True while a sort step is scheduled.
    ///
    /// A panicking sorter aborts the sort: this turns false and the view keeps the partial order
    /// until the next source edit or sorter change sorts it from scratch.
    pub fn is_sorting(&self) -> bool {
        self.shared.state.borrow().is_sorting()
    }

    pub fn state(&self) -> ViewState {
        let state = self.shared.state.borrow();

        if !state.should_sort() {
            ViewState::Passthrough
        } else if !state.is_sorting() {
            ViewState::Sorted
        } else if state.steps == 0 {
            ViewState::Materializing
        } else {
            ViewState::Sorting
        }
    }

    /// Emitted after [`Property::Model`] or [`Property::Sorter`] was replaced, and whenever
    /// [`is_sorting`](Self::is_sorting) flipped.
    pub fn notify(&self) -> &Signal<Property> {
        &self.shared.notify
    }
}

impl<I: Clone + 'static> ListModel for SortListModel<I> {
    type Item = I;

    fn n_items(&self) -> usize {
        self.shared.state.borrow().n_items()
    }

    fn item(&self, position: usize) -> Option<I> {
        let state = self.shared.state.borrow();

        if state.items.is_empty() {
            return state.model.as_ref().and_then(|model| model.item(position));
        }

        (position < state.items.len()).then(|| state.items.get(position).item.clone())
    }

    fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.shared.items_changed
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};

    use super::*;
    use crate::list_model::VecModel;
    use crate::scheduler::IdleQueue;
    use crate::sorter::CustomSorter;

    type Item = Rc<char>;

    struct Fixture {
        queue: Rc<IdleQueue>,
        source: Rc<VecModel<Item>>,
        sorter: Rc<CustomSorter<Item>>,
        view: SortListModel<Item>,
        changes: Rc<RefCell<Vec<ItemsChanged>>>,
        notifies: Rc<RefCell<Vec<Property>>>,
    }

    fn handles(chars: &str) -> Vec<Item> {
        chars.chars().map(Rc::new).collect()
    }

    fn fixture(chars: &str, step_budget: usize) -> Fixture {
        let queue = Rc::new(IdleQueue::new());
        let source = Rc::new(VecModel::from_vec(handles(chars)));
        let sorter = Rc::new(CustomSorter::by_key(|c: &Item| **c));
        let config = SortConfig::default()
            .with_step_budget(step_budget)
            .unwrap();

        let view = SortListModel::with_config(
            Some(source.clone()),
            Some(sorter.clone()),
            queue.clone(),
            config,
        );

        let changes = Rc::new(RefCell::new(Vec::new()));
        {
            let changes = Rc::clone(&changes);
            view.items_changed()
                .connect(move |change| changes.borrow_mut().push(*change));
        }
        let notifies = Rc::new(RefCell::new(Vec::new()));
        {
            let notifies = Rc::clone(&notifies);
            view.notify()
                .connect(move |property| notifies.borrow_mut().push(*property));
        }

        Fixture {
            queue,
            source,
            sorter,
            view,
            changes,
            notifies,
        }
    }

    fn contents(view: &SortListModel<Item>) -> String {
        (0..view.n_items())
            .map(|i| *view.item(i).unwrap())
            .collect()
    }

    #[test]
    fn sorts_on_idle() {
        let f = fixture("EDCBA", 1024);

        assert_eq!(f.view.state(), ViewState::Materializing);
        assert!(f.view.is_sorting());

        assert_eq!(f.queue.run_until_idle(), 1);

        assert_eq!(contents(&f.view), "ABCDE");
        assert_eq!(f.view.state(), ViewState::Sorted);
        assert!(!f.view.is_sorting());
        assert_eq!(*f.changes.borrow(), [ItemsChanged::new(0, 5, 5)]);
        assert_eq!(*f.notifies.borrow(), [Property::Sorting]);
    }

    #[test]
    fn partial_order_between_steps() {
        let chars: String = (0..200u32)
            .rev()
            .map(|i| char::from_u32(0x100 + i).unwrap())
            .collect();
        let f = fixture(&chars, 16);

        assert!(f.queue.dispatch());
        assert_eq!(f.view.state(), ViewState::Sorting);
        assert_eq!(f.view.n_items(), 200);

        f.queue.run_until_idle();

        let mut expected: Vec<char> = chars.chars().collect();
        expected.sort();
        assert_eq!(contents(&f.view), expected.into_iter().collect::<String>());
        assert!(f.changes.borrow().len() > 1);
    }

    #[test]
    fn append_while_sorted() {
        let f = fixture("dbca", 1024);
        f.queue.run_until_idle();
        f.changes.borrow_mut().clear();

        f.source.append(Rc::new('e'));

        assert_eq!(f.changes.borrow()[0], ItemsChanged::new(4, 0, 1));
        assert!(f.view.is_sorting());

        f.source.append(Rc::new('0'));
        f.queue.run_until_idle();

        assert_eq!(contents(&f.view), "0abcde");
    }

    #[test]
    fn remove_while_sorted() {
        let f = fixture("dbca", 1024);
        f.queue.run_until_idle();
        f.changes.borrow_mut().clear();

        f.source.remove(0);

        assert_eq!(*f.changes.borrow(), [ItemsChanged::new(3, 1, 0)]);
        assert_eq!(contents(&f.view), "abc");
        assert_eq!(f.view.state(), ViewState::Sorted);
        assert_eq!(f.queue.pending(), 0);
    }

    #[test]
    fn remove_before_first_step() {
        let f = fixture("BA", 1024);

        f.source.remove(0);

        assert_eq!(*f.changes.borrow(), [ItemsChanged::new(0, 1, 0)]);
        assert!(f.view.is_sorting());

        f.queue.run_until_idle();

        assert_eq!(contents(&f.view), "A");
        assert!(!f.view.is_sorting());
    }

    #[test]
    fn clearing_sort_func_passes_through() {
        let f = fixture("cab", 1024);
        f.queue.run_until_idle();
        f.changes.borrow_mut().clear();

        f.sorter.clear_sort_func();

        assert_eq!(f.view.state(), ViewState::Passthrough);
        assert_eq!(f.queue.pending(), 0);
        assert_eq!(contents(&f.view), "cab");
        assert_eq!(*f.changes.borrow(), [ItemsChanged::new(0, 3, 3)]);

        // Source edits are forwarded unchanged.
        f.source.splice(1, 1, [Rc::new('x'), Rc::new('y')]);
        assert_eq!(f.changes.borrow()[1], ItemsChanged::new(1, 1, 2));
        assert_eq!(contents(&f.view), "cxyb");

        f.sorter.set_sort_func(|a: &Item, b: &Item| a.cmp(b));
        f.queue.run_until_idle();
        assert_eq!(contents(&f.view), "bcxy");
    }

    #[test]
    fn replacing_the_model() {
        let f = fixture("cab", 1024);
        f.queue.run_until_idle();
        f.changes.borrow_mut().clear();
        f.notifies.borrow_mut().clear();

        let other = Rc::new(VecModel::from_vec(handles("zy")));
        f.view.set_model(Some(other.clone()));

        assert_eq!(*f.changes.borrow(), [ItemsChanged::new(0, 3, 2)]);
        assert_eq!(
            *f.notifies.borrow(),
            [Property::Model, Property::Sorting]
        );
        assert_eq!(f.source.items_changed().handler_count(), 0);

        // Same instance again is a no-op.
        f.view.set_model(Some(other.clone()));
        assert_eq!(f.changes.borrow().len(), 1);

        f.queue.run_until_idle();
        assert_eq!(contents(&f.view), "yz");

        f.view.set_model(None);
        assert_eq!(f.view.n_items(), 0);
        assert_eq!(f.view.state(), ViewState::Passthrough);
        assert_eq!(f.changes.borrow().last(), Some(&ItemsChanged::new(0, 2, 0)));
    }

    #[test]
    fn replacing_the_sorter() {
        let f = fixture("cab", 1024);
        f.queue.run_until_idle();
        f.changes.borrow_mut().clear();

        let reversed = Rc::new(CustomSorter::new(|a: &Item, b: &Item| b.cmp(a)));
        f.view.set_sorter(Some(reversed.clone()));

        assert_eq!(f.sorter.changed().handler_count(), 0);
        assert_eq!(*f.changes.borrow(), [ItemsChanged::new(0, 3, 3)]);

        f.queue.run_until_idle();
        assert_eq!(contents(&f.view), "cba");

        f.view.set_sorter(None);
        assert_eq!(contents(&f.view), "cab");
        assert_eq!(reversed.changed().handler_count(), 0);
    }

    #[test]
    fn drop_tears_down() {
        let items = handles("dcba");
        let queue = Rc::new(IdleQueue::new());
        let source = Rc::new(VecModel::from_vec(items.clone()));
        let sorter = Rc::new(CustomSorter::by_key(|c: &Item| **c));

        let view = SortListModel::new(Some(source.clone()), Some(sorter.clone()), queue.clone());
        assert_eq!(queue.pending(), 1);
        assert!(items.iter().all(|item| Rc::strong_count(item) == 3));

        drop(view);

        assert_eq!(queue.pending(), 0);
        assert_eq!(source.items_changed().handler_count(), 0);
        assert_eq!(sorter.changed().handler_count(), 0);
        assert!(items.iter().all(|item| Rc::strong_count(item) == 2));
    }

    #[test]
    fn chained_views() {
        let f = fixture("bdac", 1024);
        let queue = f.queue.clone();
        let inner: Rc<SortListModel<Item>> = Rc::new(f.view);
        let outer = SortListModel::new(
            Some(inner.clone()),
            Some(Rc::new(CustomSorter::new(|a: &Item, b: &Item| b.cmp(a)))),
            queue.clone(),
        );

        queue.run_until_idle();
        assert_eq!(contents(&inner), "abcd");
        assert_eq!(contents(&outer), "dcba");

        f.source.append(Rc::new('e'));
        queue.run_until_idle();
        assert_eq!(contents(&outer), "edcba");
    }

    #[test]
    fn equal_keys_follow_source_order() {
        let f = fixture("a", 1024);
        f.queue.run_until_idle();

        let first = f.source.item(0).unwrap();
        let inserted = Rc::new('a');
        f.source.insert(0, inserted.clone());
        f.queue.run_until_idle();

        assert!(Rc::ptr_eq(&f.view.item(0).unwrap(), &inserted));
        assert!(Rc::ptr_eq(&f.view.item(1).unwrap(), &first));
    }

    #[test]
    fn panicking_sorter_stops_the_sort() {
        let queue = Rc::new(IdleQueue::new());
        let source = Rc::new(VecModel::from_vec(handles("dcba")));
        let fail = Rc::new(Cell::new(true));
        let sorter = {
            let fail = Rc::clone(&fail);
            Rc::new(CustomSorter::new(move |a: &Item, b: &Item| {
                assert!(!fail.get(), "sorter failed");
                a.cmp(b)
            }))
        };
        let view = SortListModel::new(Some(source.clone()), Some(sorter), queue.clone());
        assert!(view.is_sorting());

        let result = panic::catch_unwind(AssertUnwindSafe(|| queue.dispatch()));
        assert!(result.is_err());

        assert!(!view.is_sorting());
        assert_ne!(view.state(), ViewState::Materializing);
        assert_eq!(queue.pending(), 0);
        assert_eq!(view.n_items(), 4);

        // The next edit sorts everything again, not only the new tail.
        fail.set(false);
        source.append(Rc::new('e'));
        assert!(view.is_sorting());

        queue.run_until_idle();
        assert_eq!(contents(&view), "abcde");
        assert!(!view.is_sorting());
    }
}
