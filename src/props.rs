//! Property maps and values attached to virtual nodes.

use crate::{event::EventHandler, surface::Handle};
use core::fmt::{self, Debug, Formatter, Write as _};
use std::{borrow::Cow, rc::Rc};

/// Receives the live handle of its node once mounted, and [`None`] when the node is torn down.
pub type RefCallback<H> = Rc<dyn Fn(Option<&H>)>;

/// Identity of a node among its siblings.
///
/// Integer and string keys are distinct: `Key::Int(1) != Key::Str("1".into())`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	Int(i64),
	Str(Rc<str>),
}

impl Key {
	/// The positional key assigned to the `index`th unkeyed child of a flattened list.
	#[must_use]
	pub fn synthetic(index: usize) -> Self {
		Self::Str(format!(".${}", index).into())
	}
}

impl From<i64> for Key {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<i32> for Key {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}
impl From<&str> for Key {
	fn from(value: &str) -> Self {
		Self::Str(value.into())
	}
}
impl From<String> for Key {
	fn from(value: String) -> Self {
		Self::Str(value.into())
	}
}

/// A single property value.
///
/// Cloning is cheap: all heap-allocated variants are reference-counted.
pub enum PropValue<H: Handle> {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(Rc<str>),
	/// Multi-valued, for example the value of a `<select multiple>`.
	List(Rc<[PropValue<H>]>),
	/// A nested flat mapping (`style`, `dataset`, `attributes` or an arbitrary object property).
	Map(Props<H>),
	Handler(EventHandler<H>),
	Ref(RefCallback<H>),
}

impl<H: Handle> PropValue<H> {
	/// Wraps `handler` for use as an `ev-*` property.
	pub fn handler(handler: impl Fn(&crate::Event<H>) + 'static) -> Self {
		Self::Handler(Rc::new(handler))
	}

	/// Wraps `callback` for use as the `ref` property.
	pub fn node_ref(callback: impl Fn(Option<&H>) + 'static) -> Self {
		Self::Ref(Rc::new(callback))
	}

	/// Strict identity: primitives compare by value, everything else by reference.
	#[must_use]
	#[allow(clippy::float_cmp)]
	pub fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => Rc::ptr_eq(a, b) || a == b,
			(Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
			(Self::Map(a), Self::Map(b)) => a.ptr_eq(b),
			(Self::Handler(a), Self::Handler(b)) => Rc::ptr_eq(a, b),
			(Self::Ref(a), Self::Ref(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}

	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Null => false,
			Self::Bool(b) => *b,
			Self::Int(i) => *i != 0,
			Self::Float(f) => *f != 0.0 && !f.is_nan(),
			Self::Str(s) => !s.is_empty(),
			Self::List(_) | Self::Map(_) | Self::Handler(_) | Self::Ref(_) => true,
		}
	}

	/// The textual form written into attributes.
	#[must_use]
	pub fn to_attribute_string(&self) -> Cow<'_, str> {
		match self {
			Self::Null => Cow::Borrowed(""),
			Self::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
			Self::Int(i) => Cow::Owned(i.to_string()),
			Self::Float(f) => Cow::Owned(format_float(*f)),
			Self::Str(s) => Cow::Borrowed(s),
			Self::List(items) => {
				let mut joined = String::new();
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						joined.push(',');
					}
					joined.push_str(&item.to_attribute_string());
				}
				Cow::Owned(joined)
			}
			Self::Map(_) => Cow::Borrowed("[object Object]"),
			Self::Handler(_) | Self::Ref(_) => Cow::Borrowed(""),
		}
	}

	#[must_use]
	pub fn as_map(&self) -> Option<&Props<H>> {
		match self {
			Self::Map(map) => Some(map),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_handler(&self) -> Option<&EventHandler<H>> {
		match self {
			Self::Handler(handler) => Some(handler),
			_ => None,
		}
	}
}

#[allow(clippy::cast_possible_truncation)]
fn format_float(value: f64) -> String {
	if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
		(value as i64).to_string()
	} else {
		value.to_string()
	}
}

impl<H: Handle> Clone for PropValue<H> {
	fn clone(&self) -> Self {
		match self {
			Self::Null => Self::Null,
			Self::Bool(b) => Self::Bool(*b),
			Self::Int(i) => Self::Int(*i),
			Self::Float(f) => Self::Float(*f),
			Self::Str(s) => Self::Str(s.clone()),
			Self::List(items) => Self::List(items.clone()),
			Self::Map(map) => Self::Map(map.clone()),
			Self::Handler(handler) => Self::Handler(handler.clone()),
			Self::Ref(callback) => Self::Ref(callback.clone()),
		}
	}
}

impl<H: Handle> Debug for PropValue<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(b) => Debug::fmt(b, f),
			Self::Int(i) => Debug::fmt(i, f),
			Self::Float(x) => Debug::fmt(x, f),
			Self::Str(s) => Debug::fmt(s, f),
			Self::List(items) => f.debug_list().entries(items.iter()).finish(),
			Self::Map(map) => Debug::fmt(map, f),
			Self::Handler(handler) => write!(f, "<handler {:p}>", Rc::as_ptr(handler).cast::<()>()),
			Self::Ref(callback) => write!(f, "<ref {:p}>", Rc::as_ptr(callback).cast::<()>()),
		}
	}
}

impl<H: Handle> From<bool> for PropValue<H> {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl<H: Handle> From<i32> for PropValue<H> {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}
impl<H: Handle> From<i64> for PropValue<H> {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl<H: Handle> From<f64> for PropValue<H> {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl<H: Handle> From<&str> for PropValue<H> {
	fn from(value: &str) -> Self {
		Self::Str(value.into())
	}
}
impl<H: Handle> From<String> for PropValue<H> {
	fn from(value: String) -> Self {
		Self::Str(value.into())
	}
}
impl<H: Handle> From<Rc<str>> for PropValue<H> {
	fn from(value: Rc<str>) -> Self {
		Self::Str(value)
	}
}
impl<H: Handle> From<Props<H>> for PropValue<H> {
	fn from(value: Props<H>) -> Self {
		Self::Map(value)
	}
}
impl<H: Handle> From<Vec<PropValue<H>>> for PropValue<H> {
	fn from(value: Vec<PropValue<H>>) -> Self {
		Self::List(value.into())
	}
}
impl<H: Handle, T: Into<PropValue<H>>> From<Option<T>> for PropValue<H> {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// Ordered name → value entries.
pub struct PropMap<H: Handle> {
	entries: Vec<(Rc<str>, PropValue<H>)>,
}

/// An immutable, ordered property map.
///
/// Clones share the same allocation, and [`Props::ptr_eq`] detects that.
/// Mutating a map after handing it to a node is not supported:
/// the reconciler skips the property diff entirely when both sides share a map.
pub struct Props<H: Handle>(Option<Rc<PropMap<H>>>);

impl<H: Handle> Props<H> {
	/// The shared empty map. All empty maps built this way are identical to each other.
	#[must_use]
	pub fn empty() -> Self {
		Self(None)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		match (&self.0, &other.0) {
			(None, None) => true,
			(Some(a), Some(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.as_ref().map_or(true, |map| map.entries.is_empty())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.as_ref().map_or(0, |map| map.entries.len())
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&PropValue<H>> {
		self.0.as_ref()?.entries.iter().find(|(n, _)| &**n == name).map(|(_, v)| v)
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue<H>)> {
		self.0.iter().flat_map(|map| map.entries.iter().map(|(n, v)| (&**n, v)))
	}

	/// Returns a new map with `name` set to `value`, leaving `self` untouched.
	#[must_use]
	pub fn with(&self, name: impl Into<Rc<str>>, value: impl Into<PropValue<H>>) -> Self {
		let mut entries = self.0.as_ref().map_or_else(Vec::new, |map| map.entries.clone());
		insert_or_replace(&mut entries, name.into(), value.into());
		Self(Some(Rc::new(PropMap { entries })))
	}
}

fn insert_or_replace<H: Handle>(entries: &mut Vec<(Rc<str>, PropValue<H>)>, name: Rc<str>, value: PropValue<H>) {
	match entries.iter_mut().find(|(n, _)| *n == name) {
		Some((_, slot)) => *slot = value,
		None => entries.push((name, value)),
	}
}

impl<H: Handle> Clone for Props<H> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<H: Handle> Default for Props<H> {
	fn default() -> Self {
		Self::empty()
	}
}

impl<H: Handle> From<()> for Props<H> {
	fn from((): ()) -> Self {
		Self::empty()
	}
}

impl<H: Handle> From<Option<Props<H>>> for Props<H> {
	fn from(props: Option<Props<H>>) -> Self {
		props.unwrap_or_default()
	}
}

impl<H: Handle, K: Into<Rc<str>>, V: Into<PropValue<H>>> FromIterator<(K, V)> for Props<H> {
	/// Later entries replace earlier ones with the same name.
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut entries = Vec::new();
		for (name, value) in iter {
			insert_or_replace(&mut entries, name.into(), value.into());
		}
		Self(Some(Rc::new(PropMap { entries })))
	}
}

impl<H: Handle> Debug for Props<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.0.is_none() {
			f.write_char('_')?;
		}
		f.debug_map().entries(self.iter()).finish()
	}
}

/// Builds [`Props`] from `name => value` pairs.
///
/// ```
/// use vdom_reconcile::{props, memory::NodeId, Props};
///
/// let props: Props<NodeId> = props! { "id" => "main", "tabindex" => 1 };
/// assert_eq!(props.len(), 2);
/// assert!(props!{}.ptr_eq(&Props::<NodeId>::empty()));
/// ```
#[macro_export]
macro_rules! props {
	() => {
		$crate::Props::empty()
	};
	($($name:expr => $value:expr),+ $(,)?) => {
		<$crate::Props<_> as ::core::iter::FromIterator<(::std::rc::Rc<str>, $crate::PropValue<_>)>>::from_iter([
			$((::std::rc::Rc::<str>::from($name), $crate::PropValue::from($value))),+
		])
	};
}
