//! Form-control values that depend on more than a single property.

use crate::{surface::Handle, PropValue, Props, Surface, VNode};
use tracing::trace_span;

fn non_null<'a, H: Handle>(props: &'a Props<H>, name: &str) -> Option<&'a PropValue<H>> {
	props.get(name).filter(|value| !value.is_null())
}

/// Selects the `option`s (also inside `optgroup`s) of `select` whose `value` matches the select's `value`.
///
/// A list value selects every option it contains. On the initial render (`is_render`), `defaultValue` stands in for a missing `value`.
/// Options are only written when their live `selected` state differs.
pub fn process_select<S: Surface + ?Sized>(surface: &mut S, select: &VNode<S::Handle>, is_render: bool) {
	let span = trace_span!("Processing select", is_render);
	let _enter = span.enter();

	let props = select.props();
	let mut value = non_null(props, "value");
	if is_render && value.is_none() {
		value = non_null(props, "defaultValue");
	}

	for child in select.children().nodes() {
		if child.tag() == Some("optgroup") {
			for option in child.children().nodes() {
				update_option(surface, option, value);
			}
		} else {
			update_option(surface, child, value);
		}
	}
}

fn update_option<S: Surface + ?Sized>(surface: &mut S, option: &VNode<S::Handle>, value: Option<&PropValue<S::Handle>>) {
	if option.tag() != Some("option") {
		return;
	}
	let dom = match option.dom() {
		Some(dom) => dom,
		None => return,
	};

	let option_value = option.props().get("value").map(PropValue::to_attribute_string);
	let selected = non_null(option.props(), "selected");
	let matches = match (value, &option_value) {
		(Some(PropValue::List(values)), Some(option_value)) => values.iter().any(|value| value.to_attribute_string() == *option_value),
		(Some(value), Some(option_value)) => value.to_attribute_string() == *option_value,
		_ => false,
	};

	let desired = if matches {
		true
	} else if value.is_some() || selected.is_some() {
		selected.map_or(false, PropValue::is_truthy)
	} else {
		return;
	};

	let current = surface.property(&dom, "selected").map_or(false, |current| current.is_truthy());
	if current != desired {
		surface.set_property(&dom, "selected", &PropValue::Bool(desired));
	}
}

/// Initializes `value` of an `input` or `textarea` from `defaultValue` when no `value` is given.
pub fn init_default_value<S: Surface + ?Sized>(surface: &mut S, props: &Props<S::Handle>, target: &S::Handle) {
	if non_null(props, "value").is_some() {
		return;
	}
	if let Some(default_value) = non_null(props, "defaultValue") {
		surface.set_property(target, "value", default_value);
	}
}
