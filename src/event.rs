//! Delegated event binding.
//!
//! [`Delegator`] is the registry behind [`Surface::bind_event`](`crate::Surface::bind_event`):
//! It keeps at most one handler per (event name, target) and tells its surface when a
//! root listener for an event name must be installed or can be torn down.

use crate::{ref_counts::RefCounts, surface::Handle};
use core::{
	any::Any,
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	hash::Hash,
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{error, trace};

pub type EventHandler<H> = Rc<dyn Fn(&Event<H>)>;

/// Prefix marking a property as an event binding, as in `ev-click`.
pub const EVENT_PROP_PREFIX: &str = "ev-";

/// Events that don't bubble and are bound on their target directly.
const UNDELEGATED: &[&str] = &["mouseenter", "mouseleave"];

#[must_use]
pub fn is_event_prop(name: &str) -> bool {
	name.len() > EVENT_PROP_PREFIX.len() && name.starts_with(EVENT_PROP_PREFIX)
}

/// Maps non-bubbling focus events to their bubbling counterparts.
#[must_use]
pub fn delegated_name(name: &str) -> &str {
	match name {
		"focus" => "focusin",
		"blur" => "focusout",
		name => name,
	}
}

#[must_use]
pub fn is_delegated(name: &str) -> bool {
	!UNDELEGATED.contains(&name)
}

/// An event as seen by handlers.
pub struct Event<H> {
	name: Rc<str>,
	target: H,
	current_target: RefCell<Option<H>>,
	propagation_stopped: Cell<bool>,
	default_prevented: Cell<bool>,
	raw: Option<Box<dyn Any>>,
}
impl<H: Handle> Event<H> {
	#[must_use]
	pub fn new(name: impl Into<Rc<str>>, target: H) -> Self {
		Self {
			name: name.into(),
			target,
			current_target: RefCell::new(None),
			propagation_stopped: Cell::new(false),
			default_prevented: Cell::new(false),
			raw: None,
		}
	}

	/// Attaches the surface-native event object.
	#[must_use]
	pub fn with_raw(mut self, raw: impl Any) -> Self {
		self.raw = Some(Box::new(raw));
		self
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn target(&self) -> &H {
		&self.target
	}

	/// The node whose handler is currently running.
	#[must_use]
	pub fn current_target(&self) -> Option<H> {
		self.current_target.borrow().clone()
	}

	pub fn set_current_target(&self, current_target: H) {
		*self.current_target.borrow_mut() = Some(current_target);
	}

	pub fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}

	#[must_use]
	pub fn is_propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}

	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	#[must_use]
	pub fn is_default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	#[must_use]
	pub fn raw<T: Any>(&self) -> Option<&T> {
		self.raw.as_ref()?.downcast_ref()
	}
}

impl<H: Debug> Debug for Event<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("name", &self.name)
			.field("target", &self.target)
			.field("current_target", &self.current_target)
			.field("propagation_stopped", &self.propagation_stopped.get())
			.field("default_prevented", &self.default_prevented.get())
			.finish_non_exhaustive()
	}
}

/// Where a listener has to be installed or removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Listener<K> {
	/// One shared listener for a delegated event name.
	Root(Rc<str>),
	/// A listener on a single target, for events that can't be delegated.
	Target(Rc<str>, K),
}

/// Listener changes a surface must apply after a [`Delegator::bind`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<K> {
	Unchanged,
	Attach(Listener<K>),
	Detach(Listener<K>),
}

/// Registry of active handlers, keyed by event name and target.
///
/// `K` identifies a target (a node id, or any other hashable stand-in for a live node).
pub struct Delegator<K, H> {
	roots: RefCounts<Rc<str>>,
	items: HashMap<(Rc<str>, K), EventHandler<H>>,
}

impl<K: Hash + Eq + Clone + Debug, H: Handle> Default for Delegator<K, H> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K: Hash + Eq + Clone + Debug, H: Handle> Delegator<K, H> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			roots: RefCounts::new(),
			items: HashMap::new(),
		}
	}

	/// Registers, replaces or removes the handler for `name` on `target`.
	///
	/// `name` is the bare event name (without [`EVENT_PROP_PREFIX`]).
	pub fn bind(&mut self, name: &str, previous: Option<&EventHandler<H>>, next: Option<&EventHandler<H>>, target: K) -> Transition<K> {
		let name: Rc<str> = delegated_name(name).into();
		let delegated = is_delegated(&name);
		match next {
			Some(next) => {
				let replaced = self.items.insert((name.clone(), target.clone()), next.clone());
				if replaced.is_some() {
					trace!("Replaced {:?} handler on {:?}.", name, target);
					return Transition::Unchanged;
				}
				if !delegated {
					return Transition::Attach(Listener::Target(name, target));
				}
				match self.roots.acquire(name.clone()) {
					Ok(true) => Transition::Attach(Listener::Root(name)),
					Ok(false) => Transition::Unchanged,
					Err(error) => {
						error!("Can't count another {:?} binding: {}", name, error);
						Transition::Unchanged
					}
				}
			}
			None => {
				if previous.is_none() {
					return Transition::Unchanged;
				}
				if self.items.remove(&(name.clone(), target.clone())).is_none() {
					trace!("No {:?} handler to remove on {:?}.", name, target);
					return Transition::Unchanged;
				}
				if !delegated {
					return Transition::Detach(Listener::Target(name, target));
				}
				match self.roots.release(&name) {
					Ok(true) => Transition::Detach(Listener::Root(name)),
					Ok(false) => Transition::Unchanged,
					Err(error) => {
						error!("Can't release a {:?} binding: {}", name, error);
						Transition::Unchanged
					}
				}
			}
		}
	}

	#[must_use]
	pub fn handler(&self, name: &str, target: &K) -> Option<EventHandler<H>> {
		self.items.get(&(Rc::<str>::from(delegated_name(name)), target.clone())).cloned()
	}

	/// Whether a root listener for the delegated event `name` is currently installed.
	#[must_use]
	pub fn is_rooted(&self, name: &str) -> bool {
		self.roots.is_used(delegated_name(name))
	}

	/// Number of active (name, target) bindings.
	#[must_use]
	pub fn len(&self) -> usize {
		self.items.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

impl<K: Debug, H> Debug for Delegator<K, H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Delegator")
			.field("roots", &self.roots)
			.field("items", &self.items.keys().collect::<Vec<_>>())
			.finish()
	}
}
