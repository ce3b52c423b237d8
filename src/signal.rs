use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Identifies a handler connected to a [`Signal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler<E> = Rc<RefCell<dyn FnMut(&E)>>;

/// Single threaded list of callbacks.
///
/// Handlers may connect and disconnect handlers, including themselves, while the signal is being
/// emitted. A handler disconnected during an emission is not called for the rest of it. A handler
/// must not re-emit the signal that is currently calling it.
pub struct Signal<E> {
    handlers: RefCell<Vec<(HandlerId, Handler<E>)>>,
    next_id: Cell<u64>,
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}

impl<E> Signal<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect<F>(&self, handler: F) -> HandlerId
    where
        F: FnMut(&E) + 'static,
    {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let handler: Handler<E> = Rc::new(RefCell::new(handler));
        self.handlers.borrow_mut().push((id, handler));

        id
    }

    /// Returns false if no handler with that id was connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let len_before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);

        handlers.len() != len_before
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn emit(&self, event: &E) {
        // Snapshot, so handlers can (dis)connect while we iterate.
        let snapshot: Vec<(HandlerId, Handler<E>)> = self.handlers.borrow().clone();

        for (id, handler) in snapshot {
            let still_connected = self
                .handlers
                .borrow()
                .iter()
                .any(|(handler_id, _)| *handler_id == id);

            if still_connected {
                (&mut *handler.borrow_mut())(event);
            }
        }
    }
}
