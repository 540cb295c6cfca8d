//! Single-threaded stand-in for the page environment the renderer lives in.
//!
//! The window loop owns one [`Host`]. It forwards resize and pointer events
//! through [`Host::dispatch`] and drives animation frames through
//! [`Host::run_frames`]. Everything runs on the event-loop thread, so shared
//! state is `Rc`/`RefCell` and listeners run to completion one at a time.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use crate::types::SurfaceSize;

/// Categories of host events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Resize,
    PointerMove,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// The viewport now has this size in physical pixels.
    Resized(SurfaceSize),
    /// Pointer position relative to the surface's top-left corner.
    PointerMoved { x: f64, y: f64 },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Resized(_) => EventKind::Resize,
            HostEvent::PointerMoved { .. } => EventKind::PointerMove,
        }
    }
}

/// Identifier returned by [`Host::request_frame`], needed to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

type Listener = Rc<RefCell<dyn FnMut(&HostEvent)>>;
type FrameCallback = Box<dyn FnOnce(Instant)>;

struct ListenerEntry {
    id: u64,
    kind: EventKind,
    listener: Listener,
}

#[derive(Default)]
struct HostInner {
    listeners: RefCell<Vec<ListenerEntry>>,
    frames: RefCell<Vec<(FrameHandle, FrameCallback)>>,
    next_id: Cell<u64>,
}

impl HostInner {
    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        id
    }

    fn remove_listener(&self, id: u64) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }
}

/// Cheaply cloneable handle to the event source and frame scheduler.
#[derive(Clone, Default)]
pub struct Host {
    inner: Rc<HostInner>,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind`. The listener stays active
    /// until the returned [`Subscription`] is disposed or dropped.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: FnMut(&HostEvent) + 'static,
    {
        let id = self.inner.allocate_id();
        let listener: Listener = Rc::new(RefCell::new(listener));
        self.inner.listeners.borrow_mut().push(ListenerEntry {
            id,
            kind,
            listener,
        });
        Subscription {
            host: Rc::downgrade(&self.inner),
            id,
            kind,
            active: true,
        }
    }

    /// Delivers `event` to every listener registered for its kind, in
    /// registration order. Returns how many listeners ran.
    pub fn dispatch(&self, event: &HostEvent) -> usize {
        let kind = event.kind();
        let targets: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| Rc::clone(&entry.listener))
            .collect();

        for listener in &targets {
            let mut callback = listener.borrow_mut();
            (*callback)(event);
        }
        targets.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    /// Queues `callback` for the next animation frame.
    pub fn request_frame<F>(&self, callback: F) -> FrameHandle
    where
        F: FnOnce(Instant) + 'static,
    {
        let handle = FrameHandle(self.inner.allocate_id());
        self.inner
            .frames
            .borrow_mut()
            .push((handle, Box::new(callback)));
        handle
    }

    /// Removes a queued frame callback. Returns false when the handle already
    /// ran or was cancelled.
    pub fn cancel_frame(&self, handle: FrameHandle) -> bool {
        let mut frames = self.inner.frames.borrow_mut();
        let before = frames.len();
        frames.retain(|(queued, _)| *queued != handle);
        frames.len() != before
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.frames.borrow().len()
    }

    pub fn frame_pending(&self) -> bool {
        self.pending_frames() > 0
    }

    /// Runs every callback that was queued when the call began. Callbacks
    /// queued while running wait for the next call.
    pub fn run_frames(&self, now: Instant) -> usize {
        let due = std::mem::take(&mut *self.inner.frames.borrow_mut());
        let count = due.len();
        for (_, callback) in due {
            callback(now);
        }
        count
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("resize_listeners", &self.listener_count(EventKind::Resize))
            .field(
                "pointer_listeners",
                &self.listener_count(EventKind::PointerMove),
            )
            .field("pending_frames", &self.pending_frames())
            .finish()
    }
}

/// Owned registration of a listener. Disposing (or dropping) it removes the
/// listener from the host.
#[derive(Debug)]
pub struct Subscription {
    host: Weak<HostInner>,
    id: u64,
    kind: EventKind,
    active: bool,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn dispose(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(host) = self.host.upgrade() {
            host.remove_listener(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn dispatch_reaches_only_matching_listeners() {
        let host = Host::new();
        let resizes = Rc::new(Cell::new(0));
        let moves = Rc::new(Cell::new(0));

        let resize_counter = Rc::clone(&resizes);
        let _resize = host.subscribe(EventKind::Resize, move |_| {
            resize_counter.set(resize_counter.get() + 1)
        });
        let move_counter = Rc::clone(&moves);
        let _pointer = host.subscribe(EventKind::PointerMove, move |_| {
            move_counter.set(move_counter.get() + 1)
        });

        assert_eq!(host.dispatch(&HostEvent::Resized(SurfaceSize::new(4, 4))), 1);
        host.dispatch(&HostEvent::PointerMoved { x: 1.0, y: 2.0 });
        host.dispatch(&HostEvent::PointerMoved { x: 3.0, y: 4.0 });

        assert_eq!(resizes.get(), 1);
        assert_eq!(moves.get(), 2);
    }

    #[test]
    fn disposing_subscription_removes_listener() {
        let host = Host::new();
        let mut subscription = host.subscribe(EventKind::Resize, |_| {});
        assert_eq!(host.listener_count(EventKind::Resize), 1);

        subscription.dispose();
        assert!(!subscription.is_active());
        assert_eq!(host.listener_count(EventKind::Resize), 0);

        subscription.dispose();
        assert_eq!(host.listener_count(EventKind::Resize), 0);
    }

    #[test]
    fn dropping_subscription_removes_listener() {
        let host = Host::new();
        {
            let _subscription = host.subscribe(EventKind::PointerMove, |_| {});
            assert_eq!(host.listener_count(EventKind::PointerMove), 1);
        }
        assert_eq!(host.listener_count(EventKind::PointerMove), 0);
    }

    #[test]
    fn subscription_outliving_host_is_harmless() {
        let host = Host::new();
        let mut subscription = host.subscribe(EventKind::Resize, |_| {});
        drop(host);
        subscription.dispose();
        assert!(!subscription.is_active());
    }

    #[test]
    fn cancelled_frames_never_run() {
        let host = Host::new();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let handle = host.request_frame(move |_| flag.set(true));

        assert!(host.cancel_frame(handle));
        assert!(!host.cancel_frame(handle));
        assert_eq!(host.run_frames(Instant::now()), 0);
        assert!(!ran.get());
    }

    #[test]
    fn frames_requested_during_a_run_wait_for_the_next_run() {
        let host = Host::new();
        let runs = Rc::new(Cell::new(0));

        let inner_host = host.clone();
        let counter = Rc::clone(&runs);
        host.request_frame(move |_| {
            counter.set(counter.get() + 1);
            let counter = Rc::clone(&counter);
            inner_host.request_frame(move |_| counter.set(counter.get() + 1));
        });

        let start = Instant::now();
        assert_eq!(host.run_frames(start), 1);
        assert_eq!(runs.get(), 1);
        assert_eq!(host.pending_frames(), 1);

        assert_eq!(host.run_frames(start + Duration::from_millis(16)), 1);
        assert_eq!(runs.get(), 2);
        assert!(!host.frame_pending());
    }

    #[test]
    fn frame_callbacks_receive_the_run_timestamp() {
        let host = Host::new();
        let seen = Rc::new(Cell::new(None));
        let slot = Rc::clone(&seen);
        host.request_frame(move |now| slot.set(Some(now)));

        let now = Instant::now();
        host.run_frames(now);
        assert_eq!(seen.get(), Some(now));
    }
}
