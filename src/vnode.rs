//! The virtual node model.

use crate::{
	component::{ComponentClass, ComponentRef, FunctionComponent},
	props::{Key, PropValue, Props, RefCallback},
	surface::Handle,
	Error,
};
use core::{
	cell::{OnceCell, Ref, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::warn;

/// Element variants with specialized patch behaviour, detected by tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
	Html,
	Input,
	Select,
	Textarea,
	Svg,
}

impl ElementKind {
	fn of(tag: &str) -> Self {
		let kind = match tag {
			"input" => Self::Input,
			"select" => Self::Select,
			"textarea" => Self::Textarea,
			"svg" => Self::Svg,
			_ => Self::Html,
		};
		if kind == Self::Html && ["input", "select", "textarea", "svg"].iter().any(|special| special.eq_ignore_ascii_case(tag)) {
			warn!("Tag <{}> differs from a form control or <svg> only in case and will be treated as a plain element.", tag);
		}
		kind
	}
}

/// What a [`VNode`] represents.
///
/// [`Kind::Fragment`] and [`Kind::Empty`] only exist during construction.
/// They're flattened away by child normalization and never reach the reconciler.
pub enum Kind<H: Handle> {
	Text,
	Comment,
	Element(ElementKind),
	ComponentClass(ComponentClass<H>),
	ComponentFunction(FunctionComponent<H>),
	ComponentInstance(ComponentRef<H>),
	Fragment,
	Empty,
}

impl<H: Handle> Kind<H> {
	#[must_use]
	pub fn is_element(&self) -> bool {
		matches!(self, Self::Element(_))
	}

	/// Text or comment.
	#[must_use]
	pub fn is_text_like(&self) -> bool {
		matches!(self, Self::Text | Self::Comment)
	}

	/// Class or instance.
	#[must_use]
	pub fn is_stateful_component(&self) -> bool {
		matches!(self, Self::ComponentClass(_) | Self::ComponentInstance(_))
	}

	#[must_use]
	pub fn is_fragment(&self) -> bool {
		matches!(self, Self::Fragment)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Comment => "comment",
			Self::Element(_) => "element",
			Self::ComponentClass(_) => "component class",
			Self::ComponentFunction(_) => "function component",
			Self::ComponentInstance(_) => "component instance",
			Self::Fragment => "fragment",
			Self::Empty => "empty",
		}
	}
}

impl<H: Handle> Debug for Kind<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text => f.write_str("Text"),
			Self::Comment => f.write_str("Comment"),
			Self::Element(kind) => f.debug_tuple("Element").field(kind).finish(),
			Self::ComponentClass(class) => Debug::fmt(class, f),
			Self::ComponentFunction(function) => Debug::fmt(function, f),
			Self::ComponentInstance(instance) => write!(f, "ComponentInstance({:p})", Rc::as_ptr(instance).cast::<()>()),
			Self::Fragment => f.write_str("Fragment"),
			Self::Empty => f.write_str("Empty"),
		}
	}
}

/// The child slot of a node.
pub enum Children<H: Handle> {
	None,
	/// Raw text, rendered as a single text node.
	Text(Rc<str>),
	Node(VNode<H>),
	/// A keyed sibling list. After normalization every entry carries a key.
	List(Vec<VNode<H>>),
}

impl<H: Handle> Children<H> {
	#[must_use]
	pub fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}

	/// The child nodes, if any. Raw text has none.
	#[must_use]
	pub fn nodes(&self) -> &[VNode<H>] {
		match self {
			Self::None | Self::Text(_) => &[],
			Self::Node(node) => core::slice::from_ref(node),
			Self::List(nodes) => nodes,
		}
	}
}

impl<H: Handle> Clone for Children<H> {
	fn clone(&self) -> Self {
		match self {
			Self::None => Self::None,
			Self::Text(text) => Self::Text(text.clone()),
			Self::Node(node) => Self::Node(node.clone()),
			Self::List(nodes) => Self::List(nodes.clone()),
		}
	}
}

impl<H: Handle> Default for Children<H> {
	fn default() -> Self {
		Self::None
	}
}

impl<H: Handle> Debug for Children<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::None => f.write_str("None"),
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Self::List(nodes) => f.debug_tuple("List").field(nodes).finish(),
		}
	}
}

impl<H: Handle> From<()> for Children<H> {
	fn from((): ()) -> Self {
		Self::None
	}
}
impl<H: Handle> From<&str> for Children<H> {
	fn from(text: &str) -> Self {
		Self::Text(text.into())
	}
}
impl<H: Handle> From<String> for Children<H> {
	fn from(text: String) -> Self {
		Self::Text(text.into())
	}
}
impl<H: Handle> From<Rc<str>> for Children<H> {
	fn from(text: Rc<str>) -> Self {
		Self::Text(text)
	}
}
impl<H: Handle> From<i32> for Children<H> {
	fn from(number: i32) -> Self {
		Self::Text(number.to_string().into())
	}
}
impl<H: Handle> From<i64> for Children<H> {
	fn from(number: i64) -> Self {
		Self::Text(number.to_string().into())
	}
}
impl<H: Handle> From<f64> for Children<H> {
	fn from(number: f64) -> Self {
		Self::Text(PropValue::<H>::Float(number).to_attribute_string().into())
	}
}
impl<H: Handle> From<VNode<H>> for Children<H> {
	fn from(node: VNode<H>) -> Self {
		Self::Node(node)
	}
}
impl<H: Handle> From<Vec<VNode<H>>> for Children<H> {
	fn from(nodes: Vec<VNode<H>>) -> Self {
		Self::List(nodes)
	}
}
impl<H: Handle> From<Option<VNode<H>>> for Children<H> {
	fn from(node: Option<VNode<H>>) -> Self {
		node.map_or(Self::None, Self::Node)
	}
}

/// What to build: an element name or a component.
pub enum Tag<H: Handle> {
	Element(Rc<str>),
	Class(ComponentClass<H>),
	Function(FunctionComponent<H>),
	Instance(ComponentRef<H>),
}

impl<H: Handle> From<&str> for Tag<H> {
	fn from(name: &str) -> Self {
		Self::Element(name.into())
	}
}
impl<H: Handle> From<String> for Tag<H> {
	fn from(name: String) -> Self {
		Self::Element(name.into())
	}
}
impl<H: Handle> From<ComponentClass<H>> for Tag<H> {
	fn from(class: ComponentClass<H>) -> Self {
		Self::Class(class)
	}
}
impl<H: Handle> From<&ComponentClass<H>> for Tag<H> {
	fn from(class: &ComponentClass<H>) -> Self {
		Self::Class(class.clone())
	}
}
impl<H: Handle> From<FunctionComponent<H>> for Tag<H> {
	fn from(function: FunctionComponent<H>) -> Self {
		Self::Function(function)
	}
}
impl<H: Handle> From<&FunctionComponent<H>> for Tag<H> {
	fn from(function: &FunctionComponent<H>) -> Self {
		Self::Function(function.clone())
	}
}
impl<H: Handle> From<ComponentRef<H>> for Tag<H> {
	fn from(instance: ComponentRef<H>) -> Self {
		Self::Instance(instance)
	}
}

fn is_valid_tag_name(name: &str) -> bool {
	let mut chars = name.chars();
	chars.next().map_or(false, |first| first.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

/// What the engine built for a component node.
pub(crate) enum Rendered<H: Handle> {
	Nothing,
	Instance(ComponentRef<H>),
	Node(VNode<H>),
}

struct Inner<H: Handle> {
	kind: Kind<H>,
	tag: Option<Rc<str>>,
	props: Props<H>,
	children: Children<H>,
	class_name: Option<Rc<str>>,
	key: OnceCell<Key>,
	r#ref: Option<RefCallback<H>>,
	dom: RefCell<Option<H>>,
	rendered: RefCell<Rendered<H>>,
}

/// A virtual node.
///
/// Cloning yields another reference to the same node; [`VNode::ptr_eq`] tells them apart from equal-looking copies.
/// Apart from the live handle (which only the engine writes), a node is immutable once built.
pub struct VNode<H: Handle>(Rc<Inner<H>>);

impl<H: Handle> Clone for VNode<H> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<H: Handle> VNode<H> {
	fn new(kind: Kind<H>, tag: Option<Rc<str>>, props: Props<H>, children: Children<H>, class_name: Option<Rc<str>>, key: Option<Key>, r#ref: Option<RefCallback<H>>) -> Self {
		let key_cell = OnceCell::new();
		if let Some(key) = key {
			let _ = key_cell.set(key);
		}
		Self(Rc::new(Inner {
			kind,
			tag,
			props,
			children,
			class_name,
			key: key_cell,
			r#ref,
			dom: RefCell::new(None),
			rendered: RefCell::new(Rendered::Nothing),
		}))
	}

	#[must_use]
	pub fn text(text: impl Into<Rc<str>>) -> Self {
		Self::new(Kind::Text, None, Props::empty(), Children::Text(text.into()), None, None, None)
	}

	#[must_use]
	pub fn comment(text: impl Into<Rc<str>>) -> Self {
		Self::new(Kind::Comment, None, Props::empty(), Children::Text(text.into()), None, None, None)
	}

	/// A nested sequence, spliced into the surrounding child list.
	#[must_use]
	pub fn fragment(nodes: Vec<VNode<H>>) -> Self {
		Self::new(Kind::Fragment, None, Props::empty(), Children::List(nodes), None, None, None)
	}

	/// A hole in a child list, dropped during normalization.
	#[must_use]
	pub fn empty() -> Self {
		Self::new(Kind::Empty, None, Props::empty(), Children::None, None, None, None)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	#[must_use]
	pub fn kind(&self) -> &Kind<H> {
		&self.0.kind
	}

	/// The element name, for element nodes.
	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		self.0.tag.as_deref()
	}

	#[must_use]
	pub fn props(&self) -> &Props<H> {
		&self.0.props
	}

	#[must_use]
	pub fn children(&self) -> &Children<H> {
		&self.0.children
	}

	/// The character data of a text or comment node.
	#[must_use]
	pub fn text_content(&self) -> Option<&str> {
		match (&self.0.kind, &self.0.children) {
			(Kind::Text | Kind::Comment, Children::Text(text)) => Some(text),
			_ => None,
		}
	}

	#[must_use]
	pub fn class_name(&self) -> Option<&str> {
		self.0.class_name.as_deref()
	}

	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		self.0.key.get()
	}

	#[must_use]
	pub fn node_ref(&self) -> Option<&RefCallback<H>> {
		self.0.r#ref.as_ref()
	}

	/// The live handle, between materialization and demolition.
	#[must_use]
	pub fn dom(&self) -> Option<H> {
		self.0.dom.borrow().clone()
	}

	pub(crate) fn set_dom(&self, dom: Option<H>) {
		*self.0.dom.borrow_mut() = dom;
	}

	/// The component instance backing a class or instance node.
	#[must_use]
	pub fn instance(&self) -> Option<ComponentRef<H>> {
		match &*self.0.rendered.borrow() {
			Rendered::Instance(instance) => Some(instance.clone()),
			_ => match &self.0.kind {
				Kind::ComponentInstance(instance) => Some(instance.clone()),
				_ => None,
			},
		}
	}

	/// The node a function component rendered.
	#[must_use]
	pub fn rendered_node(&self) -> Option<VNode<H>> {
		match &*self.0.rendered.borrow() {
			Rendered::Node(node) => Some(node.clone()),
			_ => None,
		}
	}

	pub(crate) fn rendered(&self) -> Ref<'_, Rendered<H>> {
		self.0.rendered.borrow()
	}

	pub(crate) fn set_rendered(&self, rendered: Rendered<H>) {
		*self.0.rendered.borrow_mut() = rendered;
	}

	fn apply_key(&self, index: &mut usize) {
		if self.0.key.get().is_none() {
			let _ = self.0.key.set(Key::synthetic(*index));
			*index += 1;
		}
	}
}

impl<H: Handle> Debug for VNode<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("VNode");
		debug.field("kind", &self.0.kind);
		if let Some(tag) = &self.0.tag {
			debug.field("tag", tag);
		}
		if let Some(key) = self.0.key.get() {
			debug.field("key", key);
		}
		if let Some(class_name) = &self.0.class_name {
			debug.field("class_name", class_name);
		}
		if !self.0.props.is_empty() {
			debug.field("props", &self.0.props);
		}
		match (&self.0.kind, &self.0.children) {
			(Kind::Text | Kind::Comment, Children::Text(text)) => {
				if cfg!(feature = "dangerous-logging") {
					debug.field("text", text);
				} else {
					debug.field("text.len()", &text.len());
				}
			}
			(_, Children::None) => (),
			(_, children) => {
				debug.field("children", children);
			}
		}
		debug.field("dom", &self.0.dom.borrow());
		debug.finish()
	}
}

impl<H: Handle> From<&str> for VNode<H> {
	fn from(text: &str) -> Self {
		Self::text(text)
	}
}
impl<H: Handle> From<String> for VNode<H> {
	fn from(text: String) -> Self {
		Self::text(text)
	}
}
impl<H: Handle> From<i32> for VNode<H> {
	fn from(number: i32) -> Self {
		Self::text(number.to_string())
	}
}
impl<H: Handle> From<i64> for VNode<H> {
	fn from(number: i64) -> Self {
		Self::text(number.to_string())
	}
}
impl<H: Handle> From<f64> for VNode<H> {
	fn from(number: f64) -> Self {
		Self::text(PropValue::<H>::Float(number).to_attribute_string())
	}
}

/// Builds a node.
///
/// `class_name`, `key` and `r#ref` win over the same-named entries in `props`,
/// which are otherwise hoisted out of it. Children are [normalized](`normalize_children`).
///
/// # Errors
///
/// - [`Error::InvalidTag`] for an element name that isn't one,
/// - [`Error::InvalidKey`] if `props` has a `key` that is neither integer nor string,
/// - [`Error::InvalidRef`] if `props` has a `ref` that isn't a callback.
pub fn create_node<H: Handle>(
	tag: impl Into<Tag<H>>,
	props: impl Into<Props<H>>,
	children: impl Into<Children<H>>,
	class_name: Option<&str>,
	key: Option<Key>,
	r#ref: Option<RefCallback<H>>,
) -> Result<VNode<H>, Error> {
	let props = props.into();

	let (kind, tag) = match tag.into() {
		Tag::Element(name) => {
			if !is_valid_tag_name(&name) {
				return Err(Error::InvalidTag(name.to_string()));
			}
			(Kind::Element(ElementKind::of(&name)), Some(name))
		}
		Tag::Class(class) => (Kind::ComponentClass(class), None),
		Tag::Function(function) => (Kind::ComponentFunction(function), None),
		Tag::Instance(instance) => (Kind::ComponentInstance(instance), None),
	};

	let class_name = match class_name {
		Some(class_name) => Some(class_name.into()),
		None => match props.get("className") {
			None | Some(PropValue::Null) => None,
			Some(PropValue::Str(class_name)) => Some(class_name.clone()),
			Some(other) => Some(other.to_attribute_string().into()),
		},
	};

	let key = match key {
		Some(key) => Some(key),
		None => match props.get("key") {
			None | Some(PropValue::Null) => None,
			Some(PropValue::Int(key)) => Some(Key::Int(*key)),
			Some(PropValue::Str(key)) => Some(Key::Str(key.clone())),
			Some(other) => return Err(Error::InvalidKey(format!("{:?}", other))),
		},
	};

	let r#ref = match r#ref {
		Some(r#ref) => Some(r#ref),
		None => match props.get("ref") {
			None | Some(PropValue::Null) => None,
			Some(PropValue::Ref(r#ref)) => Some(r#ref.clone()),
			Some(other) => return Err(Error::InvalidRef(format!("{:?}", other))),
		},
	};

	Ok(VNode::new(kind, tag, props, normalize_children(children.into()), class_name, key, r#ref))
}

/// Shorthand for [`create_node`] without explicit `class_name`, `key` or `ref`.
///
/// # Errors
///
/// See [`create_node`].
pub fn h<H: Handle>(tag: impl Into<Tag<H>>, props: impl Into<Props<H>>, children: impl Into<Children<H>>) -> Result<VNode<H>, Error> {
	create_node(tag, props, children, None, None, None)
}

/// Flattens fragments, drops empty entries and keys every list entry.
///
/// Synthetic keys count up across the whole flattened list and only advance for entries without a key.
/// A list that needs no flattening is returned as-is, without reallocating.
pub fn normalize_children<H: Handle>(children: Children<H>) -> Children<H> {
	match children {
		Children::List(nodes) => {
			let mut index = 0;
			let nodes = flatten(nodes, &mut index);
			if nodes.is_empty() {
				Children::None
			} else {
				Children::List(nodes)
			}
		}
		Children::Node(node) if node.kind().is_fragment() => normalize_children(Children::List(vec![node])),
		Children::Node(node) if node.kind().is_empty() => Children::None,
		children => children,
	}
}

fn flatten<H: Handle>(nodes: Vec<VNode<H>>, index: &mut usize) -> Vec<VNode<H>> {
	let mut flattened: Option<Vec<VNode<H>>> = None;
	for (i, node) in nodes.iter().enumerate() {
		match node.kind() {
			Kind::Empty => {
				flattened.get_or_insert_with(|| nodes[..i].to_vec());
			}
			Kind::Fragment => {
				let flattened = flattened.get_or_insert_with(|| nodes[..i].to_vec());
				flattened.extend(flatten(node.children().nodes().to_vec(), index));
			}
			_ => {
				node.apply_key(index);
				if let Some(flattened) = &mut flattened {
					flattened.push(node.clone());
				}
			}
		}
	}
	flattened.unwrap_or(nodes)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::props;

	type Node = VNode<u32>;

	fn span(key: Option<i64>) -> Node {
		create_node("span", (), (), None, key.map(Key::Int), None).unwrap()
	}

	fn keys(children: &Children<u32>) -> Vec<Key> {
		children.nodes().iter().map(|node| node.key().cloned().unwrap()).collect()
	}

	#[test]
	fn untouched_list_keeps_its_buffer() {
		let nodes = vec![span(Some(1)), span(None), span(Some(3))];
		let before = nodes.as_ptr();
		let node = h("div", (), nodes).unwrap();
		match node.children() {
			Children::List(nodes) => assert_eq!(nodes.as_ptr(), before),
			other => panic!("Expected a list, found {:?}", other),
		}
		assert_eq!(keys(node.children()), vec![Key::Int(1), Key::synthetic(0), Key::Int(3)]);
	}

	#[test]
	fn synthetic_keys_continue_across_fragments() {
		let nodes = vec![
			span(None),
			VNode::fragment(vec![span(None), VNode::empty(), span(Some(7)), span(None)]),
			VNode::empty(),
			span(None),
		];
		let before = nodes.as_ptr();
		let node = h("div", (), nodes).unwrap();
		match node.children() {
			Children::List(nodes) => assert_ne!(nodes.as_ptr(), before),
			other => panic!("Expected a list, found {:?}", other),
		}
		assert_eq!(
			keys(node.children()),
			vec![Key::synthetic(0), Key::synthetic(1), Key::Int(7), Key::synthetic(2), Key::synthetic(3)]
		);
	}

	#[test]
	fn empty_lists_collapse() {
		let node: Node = h("div", (), vec![VNode::empty(), VNode::fragment(vec![])]).unwrap();
		assert!(node.children().is_none());

		let node = h("div", (), VNode::<u32>::empty()).unwrap();
		assert!(node.children().is_none());

		let node = h("div", (), VNode::fragment(vec![span(None)])).unwrap();
		assert!(matches!(node.children(), Children::List(nodes) if nodes.len() == 1));
	}

	#[test]
	fn hoists_from_props_unless_explicit() {
		let node: Node = h("div", props! { "className" => "a", "key" => "k" }, ()).unwrap();
		assert_eq!(node.class_name(), Some("a"));
		assert_eq!(node.key(), Some(&Key::from("k")));

		let node: Node = create_node("div", props! { "className" => "a", "key" => 1 }, (), Some("b"), Some(Key::Int(2)), None).unwrap();
		assert_eq!(node.class_name(), Some("b"));
		assert_eq!(node.key(), Some(&Key::Int(2)));
	}

	#[test]
	fn int_and_string_keys_are_distinct() {
		assert_ne!(Key::Int(1), Key::from("1"));
	}

	#[test]
	fn detects_element_kinds() {
		assert!(matches!(span(None).kind(), Kind::Element(ElementKind::Html)));
		assert!(matches!(h::<u32>("select", (), ()).unwrap().kind(), Kind::Element(ElementKind::Select)));
		assert!(matches!(h::<u32>("svg", (), ()).unwrap().kind(), Kind::Element(ElementKind::Svg)));
		assert!(matches!(h::<u32>("SELECT", (), ()).unwrap().kind(), Kind::Element(ElementKind::Html)));
	}

	#[test]
	fn rejects_invalid_input() {
		assert!(matches!(h::<u32>("", (), ()), Err(Error::InvalidTag(_))));
		assert!(matches!(h::<u32>("1div", (), ()), Err(Error::InvalidTag(_))));
		assert!(matches!(h::<u32>("di v", (), ()), Err(Error::InvalidTag(_))));
		assert!(matches!(h::<u32>("div", props! { "ref" => "nope" }, ()), Err(Error::InvalidRef(_))));
		assert!(matches!(h::<u32>("div", props! { "key" => true }, ()), Err(Error::InvalidKey(_))));
		assert!(h::<u32>("my-element", props! { "ref" => PropValue::Null }, ()).is_ok());
	}
}
