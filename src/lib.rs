//! Sorted list views that stay responsive.
//!
//! [`SortListModel`] presents the items of a [`ListModel`] in the order of a [`Sorter`]. The sort
//! itself is a stable, adaptive merge sort ([`TimSort`]) that runs in bounded steps on a
//! [`Scheduler`], so arbitrarily large models can be sorted without blocking the host loop.
//! Edits of the source model are reconciled with the sorted state as they happen.

pub mod config;
pub mod list_model;
pub mod patterns;
pub mod reconcile;
pub mod scheduler;
pub mod signal;
pub mod sort_array;
pub mod sort_model;
pub mod sorter;
pub mod timsort;

pub use config::{ConfigError, SortConfig};
pub use list_model::{ItemsChanged, ListModel, VecModel};
pub use scheduler::{IdleQueue, Scheduler, TaskId};
pub use signal::{HandlerId, Signal};
pub use sort_array::{SortArray, SortItem};
pub use sort_model::{Property, SortListModel, ViewState};
pub use sorter::{CustomSorter, Sorter, SorterChange, SorterOrder};
pub use timsort::{StepStats, TimSort};
