//! Shared handle for event-driven hosts
//!
//! Browser callbacks all reach the same session, and an async call (SDK
//! init, an ad break) can hold it across several event-loop turns. Gameplay
//! input arriving meanwhile is dropped, but actions that must not be lost
//! (preference changes) are queued and replayed in order once the holder
//! lets go.

use std::cell::{RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;

type Deferred<T> = Box<dyn FnOnce(&mut T)>;

pub struct Shared<T> {
    value: Rc<RefCell<T>>,
    deferred: Rc<RefCell<VecDeque<Deferred<T>>>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            deferred: Rc::clone(&self.deferred),
        }
    }
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            deferred: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Run `f` now, after any queued actions. `None` while the value is held.
    pub fn try_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut value = self.value.try_borrow_mut().ok()?;
        self.replay(&mut value);
        Some(f(&mut value))
    }

    /// Run `f` now if the value is free, otherwise once it is released.
    /// Returns whether it ran immediately.
    pub fn with_or_defer(&self, f: impl FnOnce(&mut T) + 'static) -> bool {
        match self.value.try_borrow_mut() {
            Ok(mut value) => {
                self.replay(&mut value);
                f(&mut value);
                true
            }
            Err(_) => {
                self.deferred.borrow_mut().push_back(Box::new(f));
                false
            }
        }
    }

    /// Exclusive borrow meant to be held across awaits. Queued actions run
    /// on the next `try_with` or `with_or_defer` after it is dropped.
    pub fn try_hold(&self) -> Option<RefMut<'_, T>> {
        self.value.try_borrow_mut().ok()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.borrow().len()
    }

    fn replay(&self, value: &mut T) {
        loop {
            // Queue borrow ends before the action runs
            let next = self.deferred.borrow_mut().pop_front();
            match next {
                Some(action) => action(value),
                None => break,
            }
        }
    }
}
