//! Property patching against a [`Surface`].
//!
//! Every property name falls into exactly one category, checked in this order:
//!
//! 1. structural (`key`, `ref`, `children`, `className`), never written here,
//! 2. boolean, always written as a [`PropValue::Bool`],
//! 3. strict, written only when it differs from the live value,
//! 4. events (`ev-` prefix), forwarded to [`Surface::bind_event`],
//! 5. nested objects (`style`, `dataset`, `attributes` or any [`PropValue::Map`]), diffed key by key,
//! 6. everything else, written as an attribute.

use crate::{
	event::{is_event_prop, EVENT_PROP_PREFIX},
	surface::Handle,
	PropValue, Props, Surface,
};
use tracing::{trace_span, warn};

const STRUCTURAL: &[&str] = &["key", "ref", "children", "className"];

const BOOLEAN: &[&str] = &[
	"autofocus",
	"autoplay",
	"checked",
	"controls",
	"default",
	"defaultMuted",
	"disabled",
	"hidden",
	"indeterminate",
	"loop",
	"multiple",
	"muted",
	"noValidate",
	"open",
	"readOnly",
	"required",
	"reversed",
	"selected",
];

const STRICT: &[&str] = &["value", "volume", "defaultChecked", "defaultValue", "currentTime", "playbackRate"];

#[must_use]
pub fn is_structural(name: &str) -> bool {
	STRUCTURAL.contains(&name)
}

#[must_use]
pub fn is_boolean(name: &str) -> bool {
	BOOLEAN.contains(&name)
}

#[must_use]
pub fn is_strict(name: &str) -> bool {
	STRICT.contains(&name)
}

/// Brings property `name` of `target` from `previous` (absent if [`None`]) to `next`.
///
/// For `select` elements (`is_select`), `value` is left to [`form::process_select`](`crate::form::process_select`).
pub fn patch_property<S: Surface + ?Sized>(surface: &mut S, name: &str, previous: Option<&PropValue<S::Handle>>, next: &PropValue<S::Handle>, target: &S::Handle, is_select: bool) {
	let unchanged = previous.map_or_else(|| next.is_null(), |previous| previous.same(next));
	if unchanged || is_structural(name) || (is_select && name == "value") {
		return;
	}

	let span = trace_span!("Patching property", name);
	let _enter = span.enter();

	if is_boolean(name) {
		surface.set_property(target, name, &PropValue::Bool(next.is_truthy()));
	} else if is_strict(name) {
		let value = if next.is_null() { PropValue::Str("".into()) } else { next.clone() };
		if !surface.property(target, name).map_or(false, |current| current.same(&value)) {
			surface.set_property(target, name, &value);
		}
	} else if next.is_null() {
		if let Some(previous) = previous {
			remove_property(surface, name, previous, target);
		}
	} else if is_event_prop(name) {
		match next {
			PropValue::Handler(handler) => surface.bind_event(&name[EVENT_PROP_PREFIX.len()..], previous.and_then(PropValue::as_handler), Some(handler), target),
			other => warn!("Event property {:?} must be a handler, but got {:?}. Ignoring it.", name, other),
		}
	} else if let PropValue::Map(next) = next {
		patch_object(surface, name, previous, next, target);
	} else if let PropValue::Handler(_) | PropValue::Ref(_) = next {
		warn!("Callback in non-event property {:?}. Ignoring it.", name);
	} else {
		surface.set_attribute(target, name, &next.to_attribute_string());
	}
}

/// Clears property `name`, which was `previous`, from `target`.
pub fn remove_property<S: Surface + ?Sized>(surface: &mut S, name: &str, previous: &PropValue<S::Handle>, target: &S::Handle) {
	if previous.is_null() || is_structural(name) {
		return;
	}

	let span = trace_span!("Removing property", name);
	let _enter = span.enter();

	match name {
		"value" => surface.set_property(target, name, &PropValue::Str("".into())),
		"style" => surface.remove_attribute(target, "style"),
		"attributes" => {
			for (key, value) in previous.as_map().into_iter().flat_map(Props::iter) {
				if !value.is_null() {
					surface.remove_attribute(target, key);
				}
			}
		}
		"dataset" => {
			for (key, value) in previous.as_map().into_iter().flat_map(Props::iter) {
				if !value.is_null() {
					surface.remove_data(target, key);
				}
			}
		}
		name if is_boolean(name) => surface.set_property(target, name, &PropValue::Bool(false)),
		name if is_event_prop(name) => {
			if let Some(handler) = previous.as_handler() {
				surface.bind_event(&name[EVENT_PROP_PREFIX.len()..], Some(handler), None, target);
			}
		}
		name => match previous {
			PropValue::Map(_) => surface.remove_property(target, name),
			_ => surface.remove_attribute(target, name),
		},
	}
}

/// Patches every property of `next` and removes those only `previous` has.
pub fn patch_props<S: Surface + ?Sized>(surface: &mut S, previous: &Props<S::Handle>, next: &Props<S::Handle>, target: &S::Handle, is_select: bool) {
	for (name, value) in next.iter() {
		patch_property(surface, name, previous.get(name), value, target, is_select);
	}
	for (name, value) in previous.iter() {
		if !next.contains(name) {
			remove_property(surface, name, value, target);
		}
	}
}

fn patch_object<S: Surface + ?Sized>(surface: &mut S, name: &str, previous: Option<&PropValue<S::Handle>>, next: &Props<S::Handle>, target: &S::Handle) {
	let previous = match previous {
		Some(PropValue::Map(previous)) => Some(previous),
		Some(previous) if !previous.is_null() => {
			// A plain value (for example a `style` string) gives way to the mapping.
			remove_property(surface, name, previous, target);
			None
		}
		_ => None,
	};

	match name {
		"attributes" => patch_map(previous, next, |key, value| match value {
			Some(value) => surface.set_attribute(target, key, &value.to_attribute_string()),
			None => surface.remove_attribute(target, key),
		}),
		"style" => patch_map(previous, next, |key, value| match value {
			Some(value) => surface.set_style(target, key, &value.to_attribute_string()),
			None => surface.remove_style(target, key),
		}),
		"dataset" => patch_map(previous, next, |key, value| match value {
			Some(value) => surface.set_data(target, key, &value.to_attribute_string()),
			None => surface.remove_data(target, key),
		}),
		property => patch_map(previous, next, |key, value| match value {
			Some(value) => surface.set_object_entry(target, property, key, value),
			None => surface.remove_object_entry(target, property, key),
		}),
	}
}

/// Diffs two flat mappings. `apply` receives `Some` to write an entry and `None` to clear it.
///
/// Null entries count as absent.
fn patch_map<H: Handle>(previous: Option<&Props<H>>, next: &Props<H>, mut apply: impl FnMut(&str, Option<&PropValue<H>>)) {
	let previous_value = |key: &str| previous.and_then(|previous| previous.get(key)).filter(|value| !value.is_null());

	for (key, value) in next.iter() {
		match (previous_value(key), value.is_null()) {
			(Some(_), true) => apply(key, None),
			(None, true) => (),
			(Some(previous), false) if previous.same(value) => (),
			(_, false) => apply(key, Some(value)),
		}
	}

	for (key, value) in previous.into_iter().flat_map(Props::iter) {
		if !value.is_null() && !next.contains(key) {
			apply(key, None);
		}
	}
}
