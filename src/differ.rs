use crate::{component::Context, queue::MountQueue, Error, Surface, VNode};
use tracing::{info, instrument};

/// Owns a [`Surface`] and reconciles virtual trees onto it.
///
/// # Correct Use
///
/// A [`VNode`] must be materialized at most once at a time: handing the same node to [`render`](`Differ::render`)
/// twice, or using a node as the `next` side of two patches, overwrites its live handle.
///
/// Mount-queue callbacks run while the [`Differ`] is still borrowed by the call that drains them,
/// so they can't re-enter it. Components nest renders through their [`Context`] instead.
#[derive(Debug)]
pub struct Differ<S: Surface> {
	pub(crate) surface: S,
}

impl<S: Surface> Differ<S> {
	#[must_use]
	pub fn new(surface: S) -> Self {
		Self { surface }
	}

	#[must_use]
	pub fn surface(&self) -> &S {
		&self.surface
	}

	pub fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}

	#[must_use]
	pub fn into_surface(self) -> S {
		self.surface
	}

	/// Materializes `vnode` (appending it to `parent`, if given) and then runs all deferred callbacks.
	///
	/// # Errors
	///
	/// Construction-class errors from components and [`Error::UnknownNodeKind`] for unflattened fragments.
	/// The live tree is left as far as it got.
	#[instrument(skip(self, vnode))]
	pub fn render(&mut self, vnode: &VNode<S::Handle>, parent: Option<&S::Handle>) -> Result<S::Handle, Error> {
		let mut queue = MountQueue::new();
		let dom = self.materialize(vnode, parent, &mut queue, false)?;
		let count = queue.trigger();
		info!("Rendered. Mount callbacks: {}", count);
		Ok(dom)
	}

	/// Transforms the live tree of `previous` into one for `next`, in place where possible.
	///
	/// `parent` is only consulted when `previous` has to be replaced and isn't attached anywhere.
	///
	/// # Errors
	///
	/// [`Error::NotMaterialized`] if `previous` isn't live, and everything [`render`](`Differ::render`) can fail with.
	#[instrument(skip(self, previous, next))]
	pub fn patch(&mut self, previous: &VNode<S::Handle>, next: &VNode<S::Handle>, parent: Option<&S::Handle>) -> Result<S::Handle, Error> {
		let mut queue = MountQueue::new();
		let dom = self.patch_vnode(previous, next, parent, &mut queue, false)?;
		let count = queue.trigger();
		info!("Patched. Mount callbacks: {}", count);
		Ok(dom)
	}

	/// Demolishes `vnode`, detaching it from `parent` if given.
	///
	/// # Errors
	///
	/// Errors returned by component `destroy` hooks.
	#[instrument(skip(self, vnode))]
	pub fn remove(&mut self, vnode: &VNode<S::Handle>, parent: Option<&S::Handle>) -> Result<(), Error> {
		self.demolish(vnode, parent, None)?;
		info!("Removed.");
		Ok(())
	}
}

impl<S: Surface> Context<S::Handle> for Differ<S> {
	fn render(&mut self, vnode: &VNode<S::Handle>, parent: Option<&S::Handle>) -> Result<S::Handle, Error> {
		Differ::render(self, vnode, parent)
	}

	fn patch(&mut self, previous: &VNode<S::Handle>, next: &VNode<S::Handle>, parent: Option<&S::Handle>) -> Result<S::Handle, Error> {
		Differ::patch(self, previous, next, parent)
	}

	fn remove(&mut self, vnode: &VNode<S::Handle>, parent: Option<&S::Handle>) -> Result<(), Error> {
		Differ::remove(self, vnode, parent)
	}

	fn surface(&mut self) -> &mut dyn Surface<Handle = S::Handle> {
		&mut self.surface
	}
}

/// Text as it may appear in logs.
pub(crate) fn loggable(text: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		text
	} else {
		"<redacted>"
	}
}
