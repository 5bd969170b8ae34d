use core::fmt::{self, Debug, Formatter};
use tracing::trace_span;

/// Deferred `ref` callbacks and component `mount` hooks of one top-level call.
///
/// Drained in enqueue order once the structural work is done, so every callback observes a fully attached tree.
#[derive(Default)]
pub struct MountQueue {
	callbacks: Vec<Box<dyn FnOnce()>>,
}

impl MountQueue {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, callback: impl FnOnce() + 'static) {
		self.callbacks.push(Box::new(callback));
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.callbacks.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.callbacks.is_empty()
	}

	/// Runs every callback in enqueue order and returns how many ran.
	pub fn trigger(self) -> usize {
		let span = trace_span!("Draining mount queue", len = self.callbacks.len());
		let _enter = span.enter();
		let count = self.callbacks.len();
		for callback in self.callbacks {
			callback();
		}
		count
	}
}

impl Debug for MountQueue {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MountQueue").field("len", &self.callbacks.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::MountQueue;
	use std::{cell::RefCell, rc::Rc};

	#[test]
	fn triggers_in_enqueue_order() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut queue = MountQueue::new();
		for i in 0..3 {
			let log = log.clone();
			queue.push(move || log.borrow_mut().push(i));
		}
		assert_eq!(queue.trigger(), 3);
		assert_eq!(*log.borrow(), vec![0, 1, 2]);
	}
}
