//! A [`Surface`] over the browser DOM.
//!
//! Delegated events are handled by one listener per event name on the [`web_sys::Document`],
//! which walks from the event target up through its ancestors to find bound handlers.
//! Events that don't bubble get a listener on their target instead.
//!
//! # Listener lifetime
//!
//! Listeners are removed when the [`WebSurface`] is dropped.
//! Handlers bound through a dropped surface are never called again.

use crate::{
	event::{Delegator, Listener, Transition},
	Error, Event, EventHandler, PropValue, Surface,
};
use core::cell::RefCell;
use hashbrown::HashMap;
use js_sys::{Array, Object, Reflect};
use std::rc::{Rc, Weak};
use tracing::{error, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// Expando property holding a node's delegation id.
const TARGET_ID: &str = "__vdomTarget";

type Registry = Rc<RefCell<Delegator<u32, web_sys::Node>>>;
type Listen = Closure<dyn Fn(web_sys::Event)>;

#[derive(Debug)]
pub struct WebSurface {
	document: web_sys::Document,
	events: Registry,
	listeners: HashMap<Listener<u32>, (web_sys::EventTarget, Listen)>,
	next_target_id: u32,
}

impl WebSurface {
	#[must_use]
	#[instrument]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			events: Rc::new(RefCell::new(Delegator::new())),
			listeners: HashMap::new(),
			next_target_id: 0,
		}
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// Number of installed DOM event listeners, root and per-target.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	fn target_id(&mut self, node: &web_sys::Node) -> u32 {
		if let Some(id) = target_id_of(node) {
			return id;
		}
		let id = self.next_target_id;
		self.next_target_id = self.next_target_id.wrapping_add(1);
		if let Err(error) = Reflect::set(node, &JsValue::from_str(TARGET_ID), &JsValue::from_f64(f64::from(id))) {
			error!("Failed to tag event target: {:?}", error);
		}
		id
	}

	fn attach(&mut self, listener: Listener<u32>, target: &web_sys::Node) {
		let (name, event_target, closure): (_, web_sys::EventTarget, _) = match &listener {
			Listener::Root(name) => (name.clone(), self.document.clone().into(), root_listener(name.clone(), Rc::downgrade(&self.events))),
			Listener::Target(name, id) => (name.clone(), target.clone().into(), target_listener(name.clone(), *id, target.clone(), Rc::downgrade(&self.events))),
		};
		if let Err(error) = event_target.add_event_listener_with_callback(&name, closure.as_ref().unchecked_ref()) {
			return error!("Failed to add {:?} listener: {:?}", name, error);
		}
		trace!("Added {:?}.", listener);
		self.listeners.insert(listener, (event_target, closure));
	}

	fn detach(&mut self, listener: &Listener<u32>) {
		let name = match listener {
			Listener::Root(name) | Listener::Target(name, _) => name,
		};
		match self.listeners.remove(listener) {
			Some((event_target, closure)) => {
				if let Err(error) = event_target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
					error!("Failed to remove {:?} listener: {:?}", name, error);
				}
				trace!("Removed {:?}.", listener);
			}
			None => error!("Expected to remove {:?}, but it isn't installed.", listener),
		}
	}
}

impl Drop for WebSurface {
	fn drop(&mut self) {
		for (listener, (event_target, closure)) in self.listeners.drain() {
			let name = match &listener {
				Listener::Root(name) | Listener::Target(name, _) => name,
			};
			if let Err(error) = event_target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
				error!("Failed to remove {:?} listener on drop: {:?}", name, error);
			}
		}
	}
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn target_id_of(node: &web_sys::Node) -> Option<u32> {
	Reflect::get(node, &JsValue::from_str(TARGET_ID)).ok()?.as_f64().map(|id| id as u32)
}

fn is_disabled(node: &web_sys::Node) -> bool {
	node.dyn_ref::<web_sys::Element>().map_or(false, |element| element.has_attribute("disabled"))
		|| Reflect::get(node, &JsValue::from_str("disabled")).ok().and_then(|disabled| disabled.as_bool()).unwrap_or(false)
}

fn root_listener(name: Rc<str>, events: Weak<RefCell<Delegator<u32, web_sys::Node>>>) -> Listen {
	Closure::wrap(Box::new(move |raw: web_sys::Event| {
		let span = trace_span!("Delegated event", name = &*name);
		let _enter = span.enter();

		let events = match events.upgrade() {
			Some(events) => events,
			None => return error!("Event fired after its surface was dropped."),
		};
		let target = match raw.target().and_then(|target| target.dyn_into::<web_sys::Node>().ok()) {
			Some(target) => target,
			None => return trace!("Event target isn't a node."),
		};

		let event = Event::new(name.clone(), target.clone()).with_raw(raw.clone());
		let is_click = &*name == "click";
		let mut current = Some(target);
		while let Some(node) = current {
			let handler = target_id_of(&node).and_then(|id| events.borrow().handler(&name, &id));
			if let Some(handler) = handler {
				event.set_current_target(node.clone());
				handler(&event);
				if event.is_propagation_stopped() {
					raw.stop_propagation();
					break;
				}
			}
			current = node.parent_node();
			if current.as_ref().map_or(false, |parent| is_click && is_disabled(parent)) {
				break;
			}
		}
		if event.is_default_prevented() {
			raw.prevent_default();
		}
	}) as Box<dyn Fn(web_sys::Event)>)
}

fn target_listener(name: Rc<str>, id: u32, target: web_sys::Node, events: Weak<RefCell<Delegator<u32, web_sys::Node>>>) -> Listen {
	Closure::wrap(Box::new(move |raw: web_sys::Event| {
		let span = trace_span!("Direct event", name = &*name);
		let _enter = span.enter();

		let handler = match events.upgrade() {
			Some(events) => {
				let handler = events.borrow().handler(&name, &id);
				handler
			}
			None => return error!("Event fired after its surface was dropped."),
		};
		if let Some(handler) = handler {
			let event = Event::new(name.clone(), target.clone()).with_raw(raw.clone());
			event.set_current_target(target.clone());
			handler(&event);
			if event.is_propagation_stopped() {
				raw.stop_propagation();
			}
			if event.is_default_prevented() {
				raw.prevent_default();
			}
		}
	}) as Box<dyn Fn(web_sys::Event)>)
}

#[allow(clippy::cast_precision_loss)]
fn to_js(value: &PropValue<web_sys::Node>) -> JsValue {
	match value {
		PropValue::Null => JsValue::NULL,
		PropValue::Bool(value) => JsValue::from_bool(*value),
		PropValue::Int(value) => JsValue::from_f64(*value as f64),
		PropValue::Float(value) => JsValue::from_f64(*value),
		PropValue::Str(value) => JsValue::from_str(value),
		PropValue::List(items) => items.iter().map(to_js).collect::<Array>().into(),
		PropValue::Map(map) => {
			let object = Object::new();
			for (key, value) in map.iter() {
				if let Err(error) = Reflect::set(&object, &JsValue::from_str(key), &to_js(value)) {
					error!("Failed to build object entry {:?}: {:?}", key, error);
				}
			}
			object.into()
		}
		PropValue::Handler(_) | PropValue::Ref(_) => {
			warn!("Callbacks can't be written into live properties. Writing `undefined`.");
			JsValue::UNDEFINED
		}
	}
}

fn from_js(value: &JsValue) -> Option<PropValue<web_sys::Node>> {
	if value.is_null() {
		Some(PropValue::Null)
	} else if let Some(value) = value.as_bool() {
		Some(PropValue::Bool(value))
	} else if let Some(value) = value.as_f64() {
		Some(PropValue::Float(value))
	} else {
		value.as_string().map(|value| PropValue::Str(value.into()))
	}
}

/// The object behind property `name` of `node`, created if missing.
fn object_property(node: &web_sys::Node, name: &str) -> Option<JsValue> {
	let key = JsValue::from_str(name);
	match Reflect::get(node, &key) {
		Ok(object) if object.is_object() => Some(object),
		Ok(_) => {
			let object: JsValue = Object::new().into();
			match Reflect::set(node, &key, &object) {
				Ok(_) => Some(object),
				Err(error) => {
					error!("Failed to create object property {:?}: {:?}", name, error);
					None
				}
			}
		}
		Err(error) => {
			error!("Failed to read object property {:?}: {:?}", name, error);
			None
		}
	}
}

fn set_entry(object: &JsValue, key: &str, value: &JsValue) {
	if let Err(error) = Reflect::set(object, &JsValue::from_str(key), value) {
		error!("Failed to set {:?}: {:?}", key, error);
	}
}

fn delete_entry(object: &JsValue, key: &str) {
	if let Err(error) = Reflect::delete_property(object.unchecked_ref::<Object>(), &JsValue::from_str(key)) {
		error!("Failed to delete {:?}: {:?}", key, error);
	}
}

fn element(node: &web_sys::Node) -> Option<&web_sys::Element> {
	let element = node.dyn_ref::<web_sys::Element>();
	if element.is_none() {
		error!("Expected an element but found {:?}. Ignoring.", node);
	}
	element
}

impl Surface for WebSurface {
	type Handle = web_sys::Node;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Result<web_sys::Node, Error> {
		let element = match namespace {
			Some(namespace) => self.document.create_element_ns(Some(namespace), tag),
			None => self.document.create_element(tag),
		};
		element.map(Into::into).map_err(|error| Error::Surface {
			operation: "create_element",
			message: format!("{:?}", error),
		})
	}

	fn create_text(&mut self, text: &str) -> web_sys::Node {
		self.document.create_text_node(text).into()
	}

	fn create_comment(&mut self, text: &str) -> web_sys::Node {
		self.document.create_comment(text).into()
	}

	fn append_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.append_child(child) {
			error!("Failed to append node: {:?}", error);
		}
	}

	fn insert_before(&mut self, parent: &web_sys::Node, child: &web_sys::Node, reference: &web_sys::Node) {
		if let Err(error) = parent.insert_before(child, Some(reference)) {
			error!("Failed to insert node: {:?}", error);
		}
	}

	fn remove_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.remove_child(child) {
			error!("Failed to remove the node: {:?}", error);
		}
	}

	fn replace_child(&mut self, parent: &web_sys::Node, new: &web_sys::Node, old: &web_sys::Node) {
		if let Err(error) = parent.replace_child(new, old) {
			error!("Failed to replace the node: {:?}", error);
		}
	}

	fn parent_of(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn first_child(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.first_child()
	}

	fn set_text(&mut self, node: &web_sys::Node, text: &str) {
		node.set_node_value(Some(text));
	}

	fn set_attribute(&mut self, node: &web_sys::Node, name: &str, value: &str) {
		if let Some(Err(error)) = element(node).map(|element| element.set_attribute(name, value)) {
			error!("Failed to set attribute {:?}: {:?}", name, error);
		}
	}

	fn remove_attribute(&mut self, node: &web_sys::Node, name: &str) {
		if let Some(Err(error)) = element(node).map(|element| element.remove_attribute(name)) {
			error!("Failed to remove attribute {:?}: {:?}", name, error);
		}
	}

	fn property(&self, node: &web_sys::Node, name: &str) -> Option<PropValue<web_sys::Node>> {
		Reflect::get(node, &JsValue::from_str(name)).ok().as_ref().and_then(from_js)
	}

	fn set_property(&mut self, node: &web_sys::Node, name: &str, value: &PropValue<web_sys::Node>) {
		set_entry(node, name, &to_js(value));
	}

	fn remove_property(&mut self, node: &web_sys::Node, name: &str) {
		set_entry(node, name, &JsValue::UNDEFINED);
		delete_entry(node, name);
	}

	fn set_style(&mut self, node: &web_sys::Node, name: &str, value: &str) {
		if let Some(style) = object_property(node, "style") {
			set_entry(&style, name, &JsValue::from_str(value));
		}
	}

	fn remove_style(&mut self, node: &web_sys::Node, name: &str) {
		if let Some(style) = object_property(node, "style") {
			set_entry(&style, name, &JsValue::from_str(""));
		}
	}

	fn set_data(&mut self, node: &web_sys::Node, name: &str, value: &str) {
		if let Some(dataset) = object_property(node, "dataset") {
			set_entry(&dataset, name, &JsValue::from_str(value));
		}
	}

	fn remove_data(&mut self, node: &web_sys::Node, name: &str) {
		if let Some(dataset) = object_property(node, "dataset") {
			delete_entry(&dataset, name);
		}
	}

	fn set_object_entry(&mut self, node: &web_sys::Node, property: &str, key: &str, value: &PropValue<web_sys::Node>) {
		if let Some(object) = object_property(node, property) {
			set_entry(&object, key, &to_js(value));
		}
	}

	fn remove_object_entry(&mut self, node: &web_sys::Node, property: &str, key: &str) {
		if let Some(object) = object_property(node, property) {
			delete_entry(&object, key);
		}
	}

	fn bind_event(&mut self, name: &str, previous: Option<&EventHandler<web_sys::Node>>, next: Option<&EventHandler<web_sys::Node>>, target: &web_sys::Node) {
		let id = self.target_id(target);
		let transition = self.events.borrow_mut().bind(name, previous, next, id);
		match transition {
			Transition::Unchanged => (),
			Transition::Attach(listener) => self.attach(listener, target),
			Transition::Detach(listener) => self.detach(&listener),
		}
	}
}
