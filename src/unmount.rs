//! Demolition: tearing live nodes down again.

use crate::{
	differ::loggable,
	event::{is_event_prop, EVENT_PROP_PREFIX},
	vnode::{Kind, Rendered},
	Children, Differ, Error, PropValue, Surface, VNode,
};
use tracing::{trace, trace_span};

impl<S: Surface> Differ<S> {
	/// Tears down `vnode` depth-first, detaching it from `parent` if given.
	///
	/// `replacement` is the node taking `vnode`'s place, if any, and is passed on to `destroy` hooks.
	/// Nodes that were never materialized (or are already demolished) are skipped.
	/// The live handle is cleared afterwards, so tearing down a shared subtree twice is harmless.
	pub(crate) fn demolish(&mut self, vnode: &VNode<S::Handle>, parent: Option<&S::Handle>, replacement: Option<&VNode<S::Handle>>) -> Result<(), Error> {
		let dom = match vnode.dom() {
			Some(dom) => dom,
			None => {
				trace!("Skipping {} that isn't live.", vnode.kind().name());
				return Ok(());
			}
		};

		match vnode.kind() {
			Kind::Element(_) => {
				let span = trace_span!("Removing element", tag = vnode.tag().unwrap_or_default());
				let _enter = span.enter();

				if let Some(r#ref) = vnode.node_ref() {
					r#ref(None);
				}

				self.demolish_children(vnode.children(), None)?;

				for (name, value) in vnode.props().iter() {
					if let (true, PropValue::Handler(handler)) = (is_event_prop(name), value) {
						self.surface.bind_event(&name[EVENT_PROP_PREFIX.len()..], Some(handler), None, &dom);
					}
				}

				if let Some(parent) = parent {
					self.surface.remove_child(parent, &dom);
				}
			}

			Kind::Text | Kind::Comment => {
				let span = trace_span!("Removing text node", text = loggable(vnode.text_content().unwrap_or_default()));
				let _enter = span.enter();
				if let Some(parent) = parent {
					self.surface.remove_child(parent, &dom);
				}
			}

			Kind::ComponentClass(_) | Kind::ComponentInstance(_) => {
				let span = trace_span!("Removing component", kind = vnode.kind().name());
				let _enter = span.enter();

				self.demolish_children(vnode.children(), None)?;

				if let Some(instance) = vnode.instance() {
					let mut instance = instance.borrow_mut();
					if let Some(destroyable) = instance.as_destroyable() {
						destroyable.destroy(self, vnode, replacement)?;
					}
				}

				if let Some(r#ref) = vnode.node_ref() {
					r#ref(None);
				}

				if let Some(parent) = parent {
					if self.surface.parent_of(&dom).as_ref() == Some(parent) {
						self.surface.remove_child(parent, &dom);
					} else {
						trace!("Component root was already detached by `destroy`.");
					}
				}
			}

			Kind::ComponentFunction(function) => {
				let span = trace_span!("Removing function component", name = function.name());
				let _enter = span.enter();

				if let Some(r#ref) = vnode.node_ref() {
					r#ref(None);
				}
				if let Some(rendered) = vnode.rendered_node() {
					self.demolish(&rendered, parent, None)?;
				}
				vnode.set_rendered(Rendered::Nothing);
			}

			kind @ (Kind::Fragment | Kind::Empty) => return Err(Error::UnknownNodeKind(kind.name())),
		}

		vnode.set_dom(None);
		Ok(())
	}

	/// Demolishes every node in `children`. Raw text needs no teardown of its own.
	pub(crate) fn demolish_children(&mut self, children: &Children<S::Handle>, parent: Option<&S::Handle>) -> Result<(), Error> {
		for child in children.nodes() {
			self.demolish(child, parent, None)?;
		}
		Ok(())
	}
}
