//! Component capabilities.
//!
//! Every component implements [`Component`]. The optional lifecycle hooks are separate traits,
//! and a component advertises them by overriding the matching `as_*` accessor:
//!
//! ```
//! use vdom_reconcile::{Component, Context, Error, Mountable, VNode};
//!
//! struct Clock { mounted: bool }
//!
//! impl<H: vdom_reconcile::Handle> Component<H> for Clock {
//! 	fn init(&mut self, ctx: &mut dyn Context<H>, _: Option<&VNode<H>>, _: &VNode<H>) -> Result<H, Error> {
//! 		Ok(ctx.surface().create_text("12:00"))
//! 	}
//!
//! 	fn as_mountable(&mut self) -> Option<&mut dyn Mountable<H>> {
//! 		Some(self)
//! 	}
//! }
//!
//! impl<H: vdom_reconcile::Handle> Mountable<H> for Clock {
//! 	fn mount(&mut self, _: Option<&VNode<H>>, _: &VNode<H>) {
//! 		self.mounted = true;
//! 	}
//! }
//! ```

use crate::{surface::Handle, Children, Error, Props, Surface, VNode};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;

/// What a component sees of the engine while it runs.
///
/// Each nested call builds and drains its own mount queue.
pub trait Context<H: Handle> {
	fn render(&mut self, vnode: &VNode<H>, parent: Option<&H>) -> Result<H, Error>;
	fn patch(&mut self, previous: &VNode<H>, next: &VNode<H>, parent: Option<&H>) -> Result<H, Error>;
	fn remove(&mut self, vnode: &VNode<H>, parent: Option<&H>) -> Result<(), Error>;
	fn surface(&mut self) -> &mut dyn Surface<Handle = H>;
}

/// A stateful component.
pub trait Component<H: Handle> {
	/// Builds the component's live root.
	///
	/// `previous` is the node this component replaces, if any.
	fn init(&mut self, ctx: &mut dyn Context<H>, previous: Option<&VNode<H>>, next: &VNode<H>) -> Result<H, Error>;

	fn as_mountable(&mut self) -> Option<&mut dyn Mountable<H>> {
		None
	}

	fn as_updatable(&mut self) -> Option<&mut dyn Updatable<H>> {
		None
	}

	fn as_destroyable(&mut self) -> Option<&mut dyn Destroyable<H>> {
		None
	}
}

/// Called through the mount queue once the surrounding tree is fully attached.
pub trait Mountable<H: Handle> {
	fn mount(&mut self, previous: Option<&VNode<H>>, next: &VNode<H>);
}

/// Patches the component in place. May return a different root handle, which the engine then swaps in.
pub trait Updatable<H: Handle> {
	fn update(&mut self, ctx: &mut dyn Context<H>, previous: &VNode<H>, next: &VNode<H>) -> Result<H, Error>;
}

/// Tears the component down. `replacement` is the incoming node when this component is being replaced.
pub trait Destroyable<H: Handle> {
	fn destroy(&mut self, ctx: &mut dyn Context<H>, previous: &VNode<H>, replacement: Option<&VNode<H>>) -> Result<(), Error>;
}

pub type ComponentRef<H> = Rc<RefCell<dyn Component<H>>>;

/// Wraps `component` for use as a [`Tag`](`crate::Tag`) of a component-instance node.
pub fn instance<H: Handle>(component: impl Component<H> + 'static) -> ComponentRef<H> {
	Rc::new(RefCell::new(component))
}

/// A component "class": constructs a fresh instance from props for every mount.
///
/// Two class nodes only patch into each other if they share the same class (by reference).
pub struct ComponentClass<H: Handle> {
	name: &'static str,
	construct: Rc<dyn Fn(&Props<H>) -> ComponentRef<H>>,
}

impl<H: Handle> ComponentClass<H> {
	pub fn new<C: Component<H> + 'static>(name: &'static str, construct: impl Fn(&Props<H>) -> C + 'static) -> Self {
		Self {
			name,
			construct: Rc::new(move |props| instance(construct(props))),
		}
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	#[must_use]
	pub fn construct(&self, props: &Props<H>) -> ComponentRef<H> {
		(self.construct)(props)
	}

	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.construct, &other.construct)
	}
}

impl<H: Handle> Clone for ComponentClass<H> {
	fn clone(&self) -> Self {
		Self {
			name: self.name,
			construct: self.construct.clone(),
		}
	}
}

impl<H: Handle> Debug for ComponentClass<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ComponentClass").field(&self.name).finish()
	}
}

/// A stateless component, re-invoked on every render.
///
/// Its output must be a single node or text; [`Children::None`] renders as an empty comment placeholder.
pub struct FunctionComponent<H: Handle> {
	name: &'static str,
	render: Rc<dyn Fn(&Props<H>, &Children<H>) -> Children<H>>,
}

impl<H: Handle> FunctionComponent<H> {
	pub fn new(name: &'static str, render: impl Fn(&Props<H>, &Children<H>) -> Children<H> + 'static) -> Self {
		Self { name, render: Rc::new(render) }
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Invokes the function and coerces its output into a single node.
	///
	/// # Errors
	///
	/// [`Error::InvalidComponentOutput`] if it returned a sequence or fragment.
	pub fn render(&self, props: &Props<H>, children: &Children<H>) -> Result<VNode<H>, Error> {
		match (self.render)(props, children) {
			Children::None => Ok(VNode::comment("")),
			Children::Text(text) => Ok(VNode::text(text)),
			Children::Node(node) if node.kind().is_fragment() => Err(Error::InvalidComponentOutput(self.name)),
			Children::Node(node) if node.kind().is_empty() => Ok(VNode::comment("")),
			Children::Node(node) => Ok(node),
			Children::List(_) => Err(Error::InvalidComponentOutput(self.name)),
		}
	}

	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.render, &other.render)
	}
}

impl<H: Handle> Clone for FunctionComponent<H> {
	fn clone(&self) -> Self {
		Self {
			name: self.name,
			render: self.render.clone(),
		}
	}
}

impl<H: Handle> Debug for FunctionComponent<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("FunctionComponent").field(&self.name).finish()
	}
}
