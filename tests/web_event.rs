#![cfg(target_arch = "wasm32")]

use std::{cell::Cell, rc::Rc, sync::Once};
use vdom_reconcile::{h, props, web::WebSurface, Differ, Event, PropValue, VNode};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, HtmlElement, Node};

wasm_bindgen_test_configure!(run_in_browser);

static LOG_INITIALIZED: Once = Once::new();

fn setup() -> (Differ<WebSurface>, Node) {
	LOG_INITIALIZED.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let body: Node = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap().into();
	(Differ::new(WebSurface::new(document)), body)
}

fn counter(count: &Rc<Cell<usize>>) -> PropValue<Node> {
	let count = count.clone();
	PropValue::handler(move |event: &Event<Node>| {
		assert!(event.raw::<web_sys::Event>().is_some(), "Expected the native event.");
		count.set(count.get() + 1);
	})
}

fn by_id(id: &str) -> HtmlElement {
	window().unwrap().document().unwrap().get_element_by_id(id).unwrap().dyn_into().unwrap()
}

#[wasm_bindgen_test]
fn click() {
	let (mut differ, body) = setup();
	let click_count = Rc::new(Cell::new(0));

	let a: VNode<Node> = h("BUTTON", props! { "id" => "test-button", "ev-click" => counter(&click_count) }, ()).unwrap();
	differ.render(&a, Some(&body)).unwrap();
	assert_eq!(click_count.get(), 0);
	assert_eq!(differ.surface().listener_count(), 1);

	by_id("test-button").click();
	assert_eq!(click_count.get(), 1);

	let b = h("BUTTON", props! { "id" => "test-button" }, ()).unwrap();
	differ.patch(&a, &b, Some(&body)).unwrap();
	assert_eq!(differ.surface().listener_count(), 0);
	by_id("test-button").click();
	assert_eq!(click_count.get(), 1);

	differ.remove(&b, Some(&body)).unwrap();
}

#[wasm_bindgen_test]
fn bubbling_stops() {
	let (mut differ, body) = setup();
	let (outer, inner) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
	let stopper = {
		let inner = inner.clone();
		PropValue::handler(move |event: &Event<Node>| {
			inner.set(inner.get() + 1);
			event.stop_propagation();
		})
	};

	let a: VNode<Node> = h(
		"div",
		props! { "ev-click" => counter(&outer) },
		vec![h("span", props! { "id" => "bubbling-span" }, "Click").unwrap()],
	)
	.unwrap();
	differ.render(&a, Some(&body)).unwrap();
	by_id("bubbling-span").click();
	assert_eq!((outer.get(), inner.get()), (1, 0));

	let b = h(
		"div",
		props! { "ev-click" => counter(&outer) },
		vec![h("span", props! { "id" => "bubbling-span", "ev-click" => stopper }, "Click").unwrap()],
	)
	.unwrap();
	differ.patch(&a, &b, Some(&body)).unwrap();
	by_id("bubbling-span").click();
	assert_eq!((outer.get(), inner.get()), (1, 1));

	differ.remove(&b, Some(&body)).unwrap();
	assert_eq!(differ.surface().listener_count(), 0);
}

#[wasm_bindgen_test]
fn disabled_parent_swallows_clicks() {
	let (mut differ, body) = setup();
	let click_count = Rc::new(Cell::new(0));

	let a: VNode<Node> = h(
		"div",
		props! { "ev-click" => counter(&click_count) },
		vec![h("button", props! { "disabled" => true }, vec![h("b", props! { "id" => "disabled-label" }, "Go").unwrap()]).unwrap()],
	)
	.unwrap();
	differ.render(&a, Some(&body)).unwrap();
	by_id("disabled-label").click();
	assert_eq!(click_count.get(), 0);

	differ.remove(&a, Some(&body)).unwrap();
}

#[wasm_bindgen_test]
fn mouseenter_is_bound_on_its_target() {
	let (mut differ, body) = setup();
	let count = Rc::new(Cell::new(0));

	let a: VNode<Node> = h("div", props! { "id" => "hover-target", "ev-mouseenter" => counter(&count) }, ()).unwrap();
	differ.render(&a, Some(&body)).unwrap();
	assert_eq!(differ.surface().listener_count(), 1);

	let event = web_sys::Event::new("mouseenter").unwrap();
	by_id("hover-target").dispatch_event(&event).unwrap();
	assert_eq!(count.get(), 1);

	differ.remove(&a, Some(&body)).unwrap();
	assert_eq!(differ.surface().listener_count(), 0);
}
