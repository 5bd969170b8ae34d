#![cfg(target_arch = "wasm32")]

use std::{cell::Cell, rc::Rc, sync::Once};
use vdom_reconcile::{create_node, props, web::WebSurface, Children, Differ, FunctionComponent, PropValue, Props, RefCallback, VNode};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, Node};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn comment() {
	let placeholder = FunctionComponent::new("Placeholder", |_: &Props<Node>, _: &Children<Node>| Children::None);
	test_create_diff_identical_remove(|r#ref| create_node(&placeholder, (), (), None, None, Some(r#ref.clone())).unwrap(), 1);
}

#[wasm_bindgen_test]
fn text() {
	test_create_diff_identical_remove(|r#ref| create_node("p", (), "Hello vdom-reconcile text!", None, None, Some(r#ref.clone())).unwrap(), 1);
}

#[wasm_bindgen_test]
fn keyed() {
	test_create_diff_identical_remove(
		|r#ref| {
			let item = |key: i64, text: &str| create_node("li", props! { "key" => key }, text, None, None, Some(r#ref.clone())).unwrap();
			create_node("ul", (), vec![item(0, "Hello vdom-reconcile"), item(1, " keyed "), item(2, " nodes.")], None, None, None).unwrap()
		},
		3,
	);
}

#[wasm_bindgen_test]
fn minimal_div() {
	test_create_diff_identical_remove(|r#ref| create_node("DIV", (), (), None, None, Some(r#ref.clone())).unwrap(), 1);
}

#[wasm_bindgen_test]
fn clickable_div() {
	let clicked = PropValue::handler(|_| ());
	test_create_diff_identical_remove(
		|r#ref| create_node("DIV", props! { "ev-click" => clicked.clone() }, (), None, None, Some(r#ref.clone())).unwrap(),
		1,
	);
}

#[wasm_bindgen_test]
fn styled_div() {
	test_create_diff_identical_remove(
		|r#ref| {
			create_node(
				"div",
				props! { "style" => props! { "color" => "red" }, "dataset" => props! { "id" => 1 }, "title" => "styled" },
				(),
				None,
				None,
				Some(r#ref.clone()),
			)
			.unwrap()
		},
		1,
	);
}

#[wasm_bindgen_test]
fn minimal_svg() {
	test_create_diff_identical_remove(|r#ref| create_node("svg", (), (), None, None, Some(r#ref.clone())).unwrap(), 1);
}

static LOG_INITIALIZED: Once = Once::new();

fn test_create_diff_identical_remove(vdom: impl Fn(&RefCallback<Node>) -> VNode<Node>, binding_count: isize) {
	LOG_INITIALIZED.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let body: Node = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap().into();

	let mut differ = Differ::new(WebSurface::new(document));

	let ref_count = Rc::new(Cell::new(0));
	let callback: RefCallback<Node> = {
		let ref_count = ref_count.clone();
		Rc::new(move |dom: Option<&Node>| ref_count.set(ref_count.get() + if dom.is_some() { 1 } else { -1 }))
	};

	let a = vdom(&callback);
	differ.render(&a, Some(&body)).unwrap();
	assert_eq!(ref_count.get(), binding_count);

	differ.patch(&a, &a, Some(&body)).unwrap();
	assert_eq!(ref_count.get(), binding_count);

	let b = vdom(&callback);
	differ.patch(&a, &b, Some(&body)).unwrap();
	assert_eq!(ref_count.get(), binding_count);

	differ.remove(&b, Some(&body)).unwrap();
	assert_eq!(ref_count.get(), 0);
	assert_eq!(differ.surface().listener_count(), 0);
}
