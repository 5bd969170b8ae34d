//! An in-memory [`Surface`] that records every mutation.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. They're never freed:
//! a removed node simply stays detached, so handles held by stale virtual nodes remain harmless.
//!
//! ```
//! use vdom_reconcile::{h, memory::{MemoryDom, Mutation}, Differ, Surface};
//!
//! let mut differ = Differ::new(MemoryDom::new());
//! let body = differ.surface_mut().create_element("body", None).unwrap();
//!
//! let a = h("p", (), "Hello!").unwrap();
//! differ.render(&a, Some(&body)).unwrap();
//! assert_eq!(differ.surface().to_html(body), "<body><p>Hello!</p></body>");
//!
//! differ.surface_mut().clear_log();
//! let b = h("p", (), "Goodbye!").unwrap();
//! differ.patch(&a, &b, Some(&body)).unwrap();
//! assert!(matches!(differ.surface().log(), [Mutation::SetText(_)]));
//! ```

use crate::{
	event::{delegated_name, is_delegated, Delegator, Listener, Transition},
	Error, Event, EventHandler, PropValue, Surface,
};
use core::fmt::{self, Display, Formatter, Write as _};
use std::collections::BTreeMap;
use tracing::{error, trace, trace_span};

/// Index of a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
	#[must_use]
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

impl Display for NodeId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A single call the reconciler made against a [`MemoryDom`].
///
/// Property values are recorded in their attribute string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateElement { node: NodeId, tag: String, namespace: Option<String> },
	CreateText(NodeId),
	CreateComment(NodeId),
	AppendChild { parent: NodeId, child: NodeId },
	InsertBefore { parent: NodeId, child: NodeId, reference: NodeId },
	RemoveChild { parent: NodeId, child: NodeId },
	ReplaceChild { parent: NodeId, new: NodeId, old: NodeId },
	SetText(NodeId),
	SetAttribute { node: NodeId, name: String, value: String },
	RemoveAttribute { node: NodeId, name: String },
	SetProperty { node: NodeId, name: String, value: String },
	RemoveProperty { node: NodeId, name: String },
	SetStyle { node: NodeId, name: String, value: String },
	RemoveStyle { node: NodeId, name: String },
	SetData { node: NodeId, name: String, value: String },
	RemoveData { node: NodeId, name: String },
	SetObjectEntry { node: NodeId, property: String, key: String, value: String },
	RemoveObjectEntry { node: NodeId, property: String, key: String },
	/// `bound` is `false` when the handler was removed.
	BindEvent { node: NodeId, name: String, bound: bool },
}

impl Mutation {
	/// Whether this creates a node.
	#[must_use]
	pub fn is_creation(&self) -> bool {
		matches!(self, Self::CreateElement { .. } | Self::CreateText(_) | Self::CreateComment(_))
	}

	/// Whether this places `node` somewhere in the tree (appends and insertions, but not replacements).
	#[must_use]
	pub fn places(&self, node: NodeId) -> bool {
		match self {
			Self::AppendChild { child, .. } | Self::InsertBefore { child, .. } => *child == node,
			_ => false,
		}
	}
}

#[derive(Debug, Default)]
struct Element {
	tag: String,
	namespace: Option<String>,
	attributes: BTreeMap<String, String>,
	properties: BTreeMap<String, PropValue<NodeId>>,
	style: BTreeMap<String, String>,
	dataset: BTreeMap<String, String>,
	objects: BTreeMap<String, BTreeMap<String, PropValue<NodeId>>>,
}

#[derive(Debug)]
enum Data {
	Element(Element),
	Text(String),
	Comment(String),
}

#[derive(Debug)]
struct Node {
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	data: Data,
}

/// Arena-backed display tree with a mutation log and delegated event dispatch.
#[derive(Debug, Default)]
pub struct MemoryDom {
	nodes: Vec<Node>,
	log: Vec<Mutation>,
	events: Delegator<NodeId, NodeId>,
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of nodes ever created.
	#[must_use]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Every mutation since creation or the last [`clear_log`](`MemoryDom::clear_log`).
	#[must_use]
	pub fn log(&self) -> &[Mutation] {
		&self.log
	}

	pub fn take_log(&mut self) -> Vec<Mutation> {
		core::mem::take(&mut self.log)
	}

	pub fn clear_log(&mut self) {
		self.log.clear();
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		self.get(node).map_or(&[], |node| &node.children)
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.get(node)?.parent
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		self.element(node).map(|element| element.tag.as_str())
	}

	#[must_use]
	pub fn namespace(&self, node: NodeId) -> Option<&str> {
		self.element(node)?.namespace.as_deref()
	}

	/// Character data of a text or comment node.
	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match &self.get(node)?.data {
			Data::Text(text) | Data::Comment(text) => Some(text),
			Data::Element(_) => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node)?.attributes.get(name).map(String::as_str)
	}

	#[must_use]
	pub fn style(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node)?.style.get(name).map(String::as_str)
	}

	#[must_use]
	pub fn data(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node)?.dataset.get(name).map(String::as_str)
	}

	#[must_use]
	pub fn object_entry(&self, node: NodeId, property: &str, key: &str) -> Option<&PropValue<NodeId>> {
		self.element(node)?.objects.get(property)?.get(key)
	}

	/// Whether a root listener for the delegated event `name` is installed.
	#[must_use]
	pub fn is_listening(&self, name: &str) -> bool {
		self.events.is_rooted(name)
	}

	/// Number of bound (event, target) pairs.
	#[must_use]
	pub fn binding_count(&self) -> usize {
		self.events.len()
	}

	/// Fires the event `name` at `target` and returns how many handlers ran.
	///
	/// Delegated events bubble from `target` through its ancestors until a handler stops propagation.
	/// A `click` doesn't bubble into a disabled element.
	/// Events that can't be delegated only reach `target` itself.
	pub fn dispatch(&self, name: &str, target: NodeId) -> usize {
		let name = delegated_name(name);
		let span = trace_span!("Dispatching event", name, %target);
		let _enter = span.enter();

		if is_delegated(name) && !self.is_listening(name) {
			trace!("No root listener. Dropping the event.");
			return 0;
		}

		let event = Event::new(name, target);
		let mut count = 0;
		let mut current = Some(target);
		while let Some(node) = current {
			if let Some(handler) = self.events.handler(name, &node) {
				event.set_current_target(node);
				handler(&event);
				count += 1;
				if event.is_propagation_stopped() {
					break;
				}
			}
			current = if is_delegated(name) { self.parent(node) } else { None };
			if let Some(parent) = current.filter(|&parent| name == "click" && self.is_disabled(parent)) {
				trace!("Stopped at disabled {}.", parent);
				break;
			}
		}
		count
	}

	/// Serializes the subtree at `node`. Attributes are written in name order, inline styles last.
	#[must_use]
	pub fn to_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		let node = match self.get(node) {
			Some(node) => node,
			None => return,
		};
		match &node.data {
			Data::Text(text) => html.push_str(&escape(text)),
			Data::Comment(text) => {
				let _ = write!(html, "<!--{}-->", text);
			}
			Data::Element(element) => {
				html.push('<');
				html.push_str(&element.tag);
				for (name, value) in &element.attributes {
					let _ = write!(html, " {}=\"{}\"", name, escape(value).replace('"', "&quot;"));
				}
				if !element.style.is_empty() && !element.attributes.contains_key("style") {
					html.push_str(" style=\"");
					for (name, value) in &element.style {
						let _ = write!(html, "{}: {}; ", name, value);
					}
					html.truncate(html.len() - 1);
					html.push('"');
				}
				html.push('>');
				for &child in &node.children {
					self.write_html(child, html);
				}
				let _ = write!(html, "</{}>", element.tag);
			}
		}
	}

	fn is_disabled(&self, node: NodeId) -> bool {
		self.element(node).map_or(false, |element| {
			element.properties.get("disabled").map_or(false, PropValue::is_truthy) || element.attributes.contains_key("disabled")
		})
	}

	fn get(&self, node: NodeId) -> Option<&Node> {
		let found = self.nodes.get(node.index());
		if found.is_none() {
			error!("Unknown node {}.", node);
		}
		found
	}

	fn get_mut(&mut self, node: NodeId) -> Option<&mut Node> {
		let found = self.nodes.get_mut(node.index());
		if found.is_none() {
			error!("Unknown node {}.", node);
		}
		found
	}

	fn element(&self, node: NodeId) -> Option<&Element> {
		match &self.get(node)?.data {
			Data::Element(element) => Some(element),
			_ => None,
		}
	}

	fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
		match &mut self.get_mut(node)?.data {
			Data::Element(element) => Some(element),
			other => {
				error!("Expected an element at {} but found {:?}. Ignoring.", node, other);
				None
			}
		}
	}

	fn create(&mut self, data: Data) -> NodeId {
		#[allow(clippy::cast_possible_truncation)]
		let id = NodeId(self.nodes.len() as u32);
		self.nodes.push(Node { parent: None, children: Vec::new(), data });
		id
	}

	fn record(&mut self, mutation: Mutation) {
		trace!(?mutation);
		self.log.push(mutation);
	}

	fn detach(&mut self, child: NodeId) {
		if let Some(parent) = self.nodes.get_mut(child.index()).and_then(|node| node.parent.take()) {
			self.nodes[parent.index()].children.retain(|&c| c != child);
		}
	}

	/// Whether `child` can go into `parent`: both exist, `parent` is an element and `child` isn't its ancestor.
	fn can_adopt(&self, parent: NodeId, child: NodeId) -> bool {
		if self.element(parent).is_none() || self.get(child).is_none() {
			error!("Can't insert {} into {}.", child, parent);
			return false;
		}
		let mut current = Some(parent);
		while let Some(node) = current {
			if node == child {
				error!("Can't insert {} into its own descendant {}.", child, parent);
				return false;
			}
			current = self.nodes[node.index()].parent;
		}
		true
	}

	fn is_child_of(&self, parent: NodeId, child: NodeId) -> bool {
		let is_child = self.get(child).map_or(false, |node| node.parent == Some(parent));
		if !is_child {
			error!("{} is not a child of {}.", child, parent);
		}
		is_child
	}

	fn set_entry(&mut self, node: NodeId, mutation: Mutation, update: impl FnOnce(&mut Element)) {
		if let Some(element) = self.element_mut(node) {
			update(element);
			self.record(mutation);
		}
	}
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

impl Surface for MemoryDom {
	type Handle = NodeId;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Result<NodeId, Error> {
		if tag.is_empty() {
			return Err(Error::Surface {
				operation: "create_element",
				message: "Empty tag name".to_owned(),
			});
		}
		let node = self.create(Data::Element(Element {
			tag: tag.to_owned(),
			namespace: namespace.map(ToOwned::to_owned),
			..Element::default()
		}));
		self.record(Mutation::CreateElement {
			node,
			tag: tag.to_owned(),
			namespace: namespace.map(ToOwned::to_owned),
		});
		Ok(node)
	}

	fn create_text(&mut self, text: &str) -> NodeId {
		let node = self.create(Data::Text(text.to_owned()));
		self.record(Mutation::CreateText(node));
		node
	}

	fn create_comment(&mut self, text: &str) -> NodeId {
		let node = self.create(Data::Comment(text.to_owned()));
		self.record(Mutation::CreateComment(node));
		node
	}

	fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
		let (parent, child) = (*parent, *child);
		if !self.can_adopt(parent, child) {
			return;
		}
		self.detach(child);
		self.nodes[parent.index()].children.push(child);
		self.nodes[child.index()].parent = Some(parent);
		self.record(Mutation::AppendChild { parent, child });
	}

	fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: &NodeId) {
		let (parent, child, reference) = (*parent, *child, *reference);
		if child == reference {
			trace!("Inserting {} before itself. Nothing to do.", child);
			return;
		}
		if !self.can_adopt(parent, child) || !self.is_child_of(parent, reference) {
			return;
		}
		self.detach(child);
		let children = &mut self.nodes[parent.index()].children;
		match children.iter().position(|&c| c == reference) {
			Some(index) => children.insert(index, child),
			None => children.push(child),
		}
		self.nodes[child.index()].parent = Some(parent);
		self.record(Mutation::InsertBefore { parent, child, reference });
	}

	fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
		let (parent, child) = (*parent, *child);
		if !self.is_child_of(parent, child) {
			return;
		}
		self.detach(child);
		self.record(Mutation::RemoveChild { parent, child });
	}

	fn replace_child(&mut self, parent: &NodeId, new: &NodeId, old: &NodeId) {
		let (parent, new, old) = (*parent, *new, *old);
		if new == old {
			return;
		}
		if !self.can_adopt(parent, new) || !self.is_child_of(parent, old) {
			return;
		}
		self.detach(new);
		let children = &mut self.nodes[parent.index()].children;
		if let Some(slot) = children.iter_mut().find(|c| **c == old) {
			*slot = new;
		}
		self.nodes[old.index()].parent = None;
		self.nodes[new.index()].parent = Some(parent);
		self.record(Mutation::ReplaceChild { parent, new, old });
	}

	fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
		self.parent(*node)
	}

	fn first_child(&self, node: &NodeId) -> Option<NodeId> {
		self.children(*node).first().copied()
	}

	fn set_text(&mut self, node: &NodeId, text: &str) {
		let node = *node;
		match self.get_mut(node).map(|node| &mut node.data) {
			Some(Data::Text(data) | Data::Comment(data)) => {
				*data = text.to_owned();
				self.record(Mutation::SetText(node));
			}
			Some(Data::Element(_)) => error!("Can't set the text of element {}.", node),
			None => (),
		}
	}

	/// Writing or removing `style` replaces all inline styles.
	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		let mutation = Mutation::SetAttribute {
			node: *node,
			name: name.to_owned(),
			value: value.to_owned(),
		};
		self.set_entry(*node, mutation, |element| {
			element.attributes.insert(name.to_owned(), value.to_owned());
			if name == "style" {
				element.style.clear();
			}
		});
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		let mutation = Mutation::RemoveAttribute { node: *node, name: name.to_owned() };
		self.set_entry(*node, mutation, |element| {
			element.attributes.remove(name);
			if name == "style" {
				element.style.clear();
			}
		});
	}

	fn property(&self, node: &NodeId, name: &str) -> Option<PropValue<NodeId>> {
		self.element(*node)?.properties.get(name).cloned()
	}

	fn set_property(&mut self, node: &NodeId, name: &str, value: &PropValue<NodeId>) {
		let mutation = Mutation::SetProperty {
			node: *node,
			name: name.to_owned(),
			value: value.to_attribute_string().into_owned(),
		};
		self.set_entry(*node, mutation, |element| {
			element.properties.insert(name.to_owned(), value.clone());
		});
	}

	fn remove_property(&mut self, node: &NodeId, name: &str) {
		let mutation = Mutation::RemoveProperty { node: *node, name: name.to_owned() };
		self.set_entry(*node, mutation, |element| {
			element.properties.remove(name);
			element.objects.remove(name);
		});
	}

	fn set_style(&mut self, node: &NodeId, name: &str, value: &str) {
		let mutation = Mutation::SetStyle {
			node: *node,
			name: name.to_owned(),
			value: value.to_owned(),
		};
		self.set_entry(*node, mutation, |element| {
			element.style.insert(name.to_owned(), value.to_owned());
		});
	}

	fn remove_style(&mut self, node: &NodeId, name: &str) {
		let mutation = Mutation::RemoveStyle { node: *node, name: name.to_owned() };
		self.set_entry(*node, mutation, |element| {
			element.style.remove(name);
		});
	}

	fn set_data(&mut self, node: &NodeId, name: &str, value: &str) {
		let mutation = Mutation::SetData {
			node: *node,
			name: name.to_owned(),
			value: value.to_owned(),
		};
		self.set_entry(*node, mutation, |element| {
			element.dataset.insert(name.to_owned(), value.to_owned());
		});
	}

	fn remove_data(&mut self, node: &NodeId, name: &str) {
		let mutation = Mutation::RemoveData { node: *node, name: name.to_owned() };
		self.set_entry(*node, mutation, |element| {
			element.dataset.remove(name);
		});
	}

	fn set_object_entry(&mut self, node: &NodeId, property: &str, key: &str, value: &PropValue<NodeId>) {
		let mutation = Mutation::SetObjectEntry {
			node: *node,
			property: property.to_owned(),
			key: key.to_owned(),
			value: value.to_attribute_string().into_owned(),
		};
		self.set_entry(*node, mutation, |element| {
			element.objects.entry(property.to_owned()).or_default().insert(key.to_owned(), value.clone());
		});
	}

	fn remove_object_entry(&mut self, node: &NodeId, property: &str, key: &str) {
		let mutation = Mutation::RemoveObjectEntry {
			node: *node,
			property: property.to_owned(),
			key: key.to_owned(),
		};
		self.set_entry(*node, mutation, |element| {
			if let Some(object) = element.objects.get_mut(property) {
				object.remove(key);
			}
		});
	}

	fn bind_event(&mut self, name: &str, previous: Option<&EventHandler<NodeId>>, next: Option<&EventHandler<NodeId>>, target: &NodeId) {
		if self.get(*target).is_none() {
			return;
		}
		match self.events.bind(name, previous, next, *target) {
			Transition::Attach(Listener::Root(name)) => trace!("Installed root listener for {:?}.", name),
			Transition::Detach(Listener::Root(name)) => trace!("Tore down root listener for {:?}.", name),
			Transition::Attach(Listener::Target(name, target)) => trace!("Listening for {:?} on {}.", name, target),
			Transition::Detach(Listener::Target(name, target)) => trace!("Stopped listening for {:?} on {}.", name, target),
			Transition::Unchanged => (),
		}
		self.record(Mutation::BindEvent {
			node: *target,
			name: name.to_owned(),
			bound: next.is_some(),
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{cell::Cell, rc::Rc};

	fn tree() -> (MemoryDom, NodeId, NodeId, NodeId) {
		let mut dom = MemoryDom::new();
		let root = dom.create_element("div", None).unwrap();
		let button = dom.create_element("button", None).unwrap();
		let text = dom.create_text("Go");
		dom.append_child(&root, &button);
		dom.append_child(&button, &text);
		(dom, root, button, text)
	}

	#[test]
	fn moves_detach_first() {
		let (mut dom, root, button, text) = tree();
		dom.append_child(&root, &text);
		assert_eq!(dom.children(root), &[button, text]);
		assert!(dom.children(button).is_empty());

		dom.insert_before(&root, &text, &button);
		assert_eq!(dom.children(root), &[text, button]);
		assert_eq!(dom.to_html(root), "<div>Go<button></button></div>");
	}

	#[test]
	fn refuses_cycles_and_strangers() {
		let (mut dom, root, button, text) = tree();
		dom.clear_log();
		dom.append_child(&button, &root);
		dom.remove_child(&root, &text);
		dom.append_child(&text, &button);
		assert!(dom.log().is_empty());
		assert_eq!(dom.parent(button), Some(root));
	}

	#[test]
	fn bubbles_until_stopped() {
		let (mut dom, root, button, text) = tree();
		let hits = Rc::new(Cell::new(0));
		let counter = |hits: &Rc<Cell<i32>>, stop: bool| -> EventHandler<NodeId> {
			let hits = hits.clone();
			Rc::new(move |event: &Event<NodeId>| {
				hits.set(hits.get() + 1);
				if stop {
					event.stop_propagation();
				}
			})
		};

		dom.bind_event("click", None, Some(&counter(&hits, false)), &root);
		assert!(dom.is_listening("click"));
		assert_eq!(dom.dispatch("click", text), 1);

		let stopper = counter(&hits, true);
		dom.bind_event("click", None, Some(&stopper), &button);
		assert_eq!(dom.dispatch("click", text), 1);
		assert_eq!(hits.get(), 2);

		dom.bind_event("click", Some(&stopper), None, &button);
		dom.set_property(&button, "disabled", &PropValue::Bool(true));
		assert_eq!(dom.dispatch("click", text), 0);
	}
}
