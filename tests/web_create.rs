#![cfg(target_arch = "wasm32")]

use std::{cell::Cell, rc::Rc};
use vdom_reconcile::{create_node, web::WebSurface, Children, Differ, FunctionComponent, Props, RefCallback, VNode, SVG_NAMESPACE};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, Node};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn comment() {
	let placeholder = FunctionComponent::new("Placeholder", |_: &Props<Node>, _: &Children<Node>| Children::None);
	test_create(
		|r#ref| create_node(&placeholder, (), (), None, None, r#ref).unwrap(),
		|dom| assert_eq!(dom.node_type(), Node::COMMENT_NODE),
	);
}

#[wasm_bindgen_test]
fn text() {
	test_create(
		|r#ref| create_node("p", (), "Hello vdom-reconcile!", None, None, r#ref).unwrap(),
		|dom| assert_eq!(dom.text_content().as_deref(), Some("Hello vdom-reconcile!")),
	);
}

#[wasm_bindgen_test]
fn svg() {
	test_create(
		|r#ref| create_node("svg", (), vec![create_node("circle", (), (), None, None, None).unwrap()], None, None, r#ref).unwrap(),
		|dom| {
			let svg = dom.dyn_ref::<web_sys::Element>().unwrap();
			assert_eq!(svg.namespace_uri().as_deref(), Some(SVG_NAMESPACE));
			let circle = dom.first_child().unwrap().dyn_into::<web_sys::Element>().unwrap();
			assert_eq!(circle.namespace_uri().as_deref(), Some(SVG_NAMESPACE));
		},
	);
}

fn test_create(vdom: impl FnOnce(Option<RefCallback<Node>>) -> VNode<Node>, check: impl FnOnce(&Node)) {
	let document = window().unwrap().document().unwrap();
	let body: Node = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap().into();

	let mut differ = Differ::new(WebSurface::new(document));

	let got_ref = Rc::new(Cell::new(0));
	let callback: RefCallback<Node> = {
		let got_ref = got_ref.clone();
		Rc::new(move |dom: Option<&Node>| {
			if dom.is_some() {
				got_ref.set(got_ref.get() + 1);
			}
		})
	};

	let vdom = vdom(Some(callback));
	let dom = differ.render(&vdom, Some(&body)).unwrap();
	assert_eq!(got_ref.get(), 1);
	assert_eq!(dom.parent_node(), Some(body.clone()));
	check(&dom);

	differ.remove(&vdom, Some(&body)).unwrap();
	assert_eq!(dom.parent_node(), None);
}
