//! The rendering-surface binding the reconciler drives.

use crate::{Error, EventHandler, PropValue};
use core::fmt::Debug;

/// An opaque reference to a live node on some [`Surface`].
///
/// Handles are only meaningful between materialization and demolition of the virtual node they're stored on.
/// Using a stale handle is a precondition violation; surfaces should log and ignore it rather than panic.
pub trait Handle: Clone + PartialEq + Debug + 'static {}
impl<T: Clone + PartialEq + Debug + 'static> Handle for T {}

/// Namespace URI of elements created inside an `<svg>` element.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// A live display tree the reconciler can mutate.
///
/// Only [`create_element`](`Surface::create_element`) is fallible.
/// All other operations are infallible from the engine's point of view: implementations report problems
/// (unknown handles, nodes that aren't children of the given parent, ...) through [`tracing`] and carry on.
pub trait Surface {
	type Handle: Handle;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Result<Self::Handle, Error>;
	fn create_text(&mut self, text: &str) -> Self::Handle;
	fn create_comment(&mut self, text: &str) -> Self::Handle;

	/// Appends `child` to `parent`, detaching it from its current parent first.
	fn append_child(&mut self, parent: &Self::Handle, child: &Self::Handle);
	/// Inserts (or moves) `child` into `parent` right before `reference`.
	fn insert_before(&mut self, parent: &Self::Handle, child: &Self::Handle, reference: &Self::Handle);
	fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle);
	/// Puts `new` in place of `old` in `parent`.
	fn replace_child(&mut self, parent: &Self::Handle, new: &Self::Handle, old: &Self::Handle);

	fn parent_of(&self, node: &Self::Handle) -> Option<Self::Handle>;
	fn first_child(&self, node: &Self::Handle) -> Option<Self::Handle>;

	/// Overwrites the character data of a text or comment node.
	fn set_text(&mut self, node: &Self::Handle, text: &str);

	fn set_attribute(&mut self, node: &Self::Handle, name: &str, value: &str);
	fn remove_attribute(&mut self, node: &Self::Handle, name: &str);

	/// The current value of the live property `name`, if the surface tracks it.
	fn property(&self, node: &Self::Handle, name: &str) -> Option<PropValue<Self::Handle>>;
	fn set_property(&mut self, node: &Self::Handle, name: &str, value: &PropValue<Self::Handle>);
	fn remove_property(&mut self, node: &Self::Handle, name: &str);

	fn set_style(&mut self, node: &Self::Handle, name: &str, value: &str);
	fn remove_style(&mut self, node: &Self::Handle, name: &str);

	fn set_data(&mut self, node: &Self::Handle, name: &str, value: &str);
	fn remove_data(&mut self, node: &Self::Handle, name: &str);

	/// Sets `key` on the object-valued property `property`.
	fn set_object_entry(&mut self, node: &Self::Handle, property: &str, key: &str, value: &PropValue<Self::Handle>);
	fn remove_object_entry(&mut self, node: &Self::Handle, property: &str, key: &str);

	/// Registers, replaces or removes the handler for the event `name` (without `ev-` prefix) on `target`.
	///
	/// The engine calls this at most once per (name, target) per patch.
	fn bind_event(&mut self, name: &str, previous: Option<&EventHandler<Self::Handle>>, next: Option<&EventHandler<Self::Handle>>, target: &Self::Handle);
}
