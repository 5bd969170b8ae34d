//! Materialization: building live nodes for a virtual tree.

use crate::{
	attributes,
	differ::loggable,
	form,
	queue::MountQueue,
	surface::SVG_NAMESPACE,
	vnode::{ElementKind, Kind, Rendered},
	Children, Differ, Error, Surface, VNode,
};
use tracing::{instrument, trace_span};

impl<S: Surface> Differ<S> {
	/// Builds the live tree of `vnode` and appends it to `parent` if given.
	///
	/// `ref` callbacks and `mount` hooks are pushed onto `queue` rather than called.
	pub(crate) fn materialize(&mut self, vnode: &VNode<S::Handle>, parent: Option<&S::Handle>, queue: &mut MountQueue, is_svg: bool) -> Result<S::Handle, Error> {
		match vnode.kind() {
			Kind::Element(element_kind) => self.materialize_element(vnode, *element_kind, parent, queue, is_svg),
			Kind::Text | Kind::Comment => {
				let text = vnode.text_content().unwrap_or_default();
				let dom = if matches!(vnode.kind(), Kind::Text) {
					let span = trace_span!("Creating text node", text = loggable(text));
					let _enter = span.enter();
					self.surface.create_text(text)
				} else {
					let span = trace_span!("Creating comment", comment = loggable(text));
					let _enter = span.enter();
					self.surface.create_comment(text)
				};
				vnode.set_dom(Some(dom.clone()));
				if let Some(parent) = parent {
					self.surface.append_child(parent, &dom);
				}
				Ok(dom)
			}
			Kind::ComponentClass(_) | Kind::ComponentInstance(_) => self.materialize_component(vnode, parent, queue, None),
			Kind::ComponentFunction(function) => {
				let span = trace_span!("Creating function component", name = function.name());
				let _enter = span.enter();

				let rendered = function.render(vnode.props(), vnode.children())?;
				let dom = self.materialize(&rendered, parent, queue, is_svg)?;
				vnode.set_rendered(Rendered::Node(rendered));
				vnode.set_dom(Some(dom.clone()));
				enqueue_ref(vnode, &dom, queue);
				Ok(dom)
			}
			kind @ (Kind::Fragment | Kind::Empty) => Err(Error::UnknownNodeKind(kind.name())),
		}
	}

	#[instrument(skip(self, vnode, parent, queue))]
	fn materialize_element(&mut self, vnode: &VNode<S::Handle>, element_kind: ElementKind, parent: Option<&S::Handle>, queue: &mut MountQueue, is_svg: bool) -> Result<S::Handle, Error> {
		let tag = vnode.tag().ok_or(Error::UnknownNodeKind("element without tag"))?;
		let is_svg = is_svg || element_kind == ElementKind::Svg;
		let span = trace_span!("Creating element", tag, is_svg);
		let _enter = span.enter();

		let dom = self.surface.create_element(tag, is_svg.then_some(SVG_NAMESPACE))?;
		vnode.set_dom(Some(dom.clone()));

		self.materialize_children(vnode.children(), &dom, queue, is_svg && tag != "foreignObject")?;

		if let Some(class_name) = vnode.class_name() {
			self.surface.set_attribute(&dom, "class", class_name);
		}

		let is_select = element_kind == ElementKind::Select;
		for (name, value) in vnode.props().iter() {
			attributes::patch_property(&mut self.surface, name, None, value, &dom, is_select);
		}

		enqueue_ref(vnode, &dom, queue);

		if let Some(parent) = parent {
			self.surface.append_child(parent, &dom);
		}

		match element_kind {
			ElementKind::Select => form::process_select(&mut self.surface, vnode, true),
			ElementKind::Input | ElementKind::Textarea => form::init_default_value(&mut self.surface, vnode.props(), &dom),
			ElementKind::Html | ElementKind::Svg => (),
		}

		Ok(dom)
	}

	/// Builds `children` into `parent`.
	pub(crate) fn materialize_children(&mut self, children: &Children<S::Handle>, parent: &S::Handle, queue: &mut MountQueue, is_svg: bool) -> Result<(), Error> {
		match children {
			Children::None => (),
			Children::Text(text) => {
				let span = trace_span!("Creating text content", text = loggable(text));
				let _enter = span.enter();
				let dom = self.surface.create_text(text);
				self.surface.append_child(parent, &dom);
			}
			Children::Node(child) => {
				self.materialize(child, Some(parent), queue, is_svg)?;
			}
			Children::List(children) => {
				for child in children {
					self.materialize(child, Some(parent), queue, is_svg)?;
				}
			}
		}
		Ok(())
	}

	/// Instantiates (or reuses) the component behind `vnode` and initializes it.
	///
	/// `previous` is the node being replaced, if any, and is handed to `init` and `mount`.
	pub(crate) fn materialize_component(&mut self, vnode: &VNode<S::Handle>, parent: Option<&S::Handle>, queue: &mut MountQueue, previous: Option<&VNode<S::Handle>>) -> Result<S::Handle, Error> {
		let instance = match vnode.kind() {
			Kind::ComponentClass(class) => {
				let span = trace_span!("Constructing component", class = class.name());
				let _enter = span.enter();
				class.construct(vnode.props())
			}
			Kind::ComponentInstance(instance) => instance.clone(),
			kind => return Err(Error::UnknownNodeKind(kind.name())),
		};

		let span = trace_span!("Initializing component", kind = vnode.kind().name());
		let _enter = span.enter();

		let dom = instance.borrow_mut().init(self, previous, vnode)?;
		vnode.set_dom(Some(dom.clone()));
		vnode.set_rendered(Rendered::Instance(instance.clone()));

		if let Some(parent) = parent {
			// `init` may already have attached its root somewhere.
			if self.surface.parent_of(&dom).is_none() {
				self.surface.append_child(parent, &dom);
			}
		}

		let is_mountable = instance.borrow_mut().as_mountable().is_some();
		if is_mountable {
			let previous = previous.cloned();
			let next = vnode.clone();
			queue.push(move || {
				if let Some(mountable) = instance.borrow_mut().as_mountable() {
					mountable.mount(previous.as_ref(), &next);
				}
			});
		}
		enqueue_ref(vnode, &dom, queue);

		Ok(dom)
	}
}

/// Defers the `ref` callback of `vnode`, if any, with its live handle.
pub(crate) fn enqueue_ref<H: crate::Handle>(vnode: &VNode<H>, dom: &H, queue: &mut MountQueue) {
	if let Some(r#ref) = vnode.node_ref() {
		let r#ref = r#ref.clone();
		let dom = dom.clone();
		queue.push(move || r#ref(Some(&dom)));
	}
}
