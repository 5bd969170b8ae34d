mod common;

use common::{count, setup, Node};
use vdom_reconcile::{
	h,
	memory::{Mutation, NodeId},
	props, Children, Error, FunctionComponent, Props, VNode, SVG_NAMESPACE,
};

#[test]
fn tag_mismatch_replaces() {
	let (mut differ, body) = setup();
	let a: Node = h("div", (), ()).unwrap();
	let div = differ.render(&a, Some(&body)).unwrap();
	differ.surface_mut().clear_log();

	let b = h("span", (), ()).unwrap();
	let span = differ.patch(&a, &b, Some(&body)).unwrap();

	assert_ne!(span, div);
	assert_eq!(b.dom(), Some(span));
	assert_eq!(differ.surface().tag(span), Some("span"));
	assert_eq!(differ.surface().children(body), &[span]);
	assert!(differ.surface().log().contains(&Mutation::ReplaceChild { parent: body, new: span, old: div }));
}

#[test]
fn tag_case_mismatch_replaces() {
	let (mut differ, body) = setup();
	let a: Node = h("div", (), ()).unwrap();
	let div = differ.render(&a, Some(&body)).unwrap();

	let b = h("DIV", (), ()).unwrap();
	assert_ne!(differ.patch(&a, &b, Some(&body)).unwrap(), div);
}

#[test]
fn text_patches_in_place() {
	let (mut differ, body) = setup();
	let a: Node = VNode::text("one");
	let text = differ.render(&a, Some(&body)).unwrap();
	differ.surface_mut().clear_log();

	let b = VNode::text("two");
	assert_eq!(differ.patch(&a, &b, Some(&body)).unwrap(), text);
	assert_eq!(differ.surface().log(), &[Mutation::SetText(text)]);
	assert_eq!(differ.surface().text(text), Some("two"));

	let c = VNode::text("two");
	differ.surface_mut().clear_log();
	differ.patch(&b, &c, Some(&body)).unwrap();
	assert!(differ.surface().log().is_empty());
}

#[test]
fn text_and_comment_patch_in_place() {
	let (mut differ, body) = setup();
	let a: Node = VNode::text("same");
	let text = differ.render(&a, Some(&body)).unwrap();
	differ.surface_mut().clear_log();

	let b = VNode::comment("same");
	assert_eq!(differ.patch(&a, &b, Some(&body)).unwrap(), text);
	assert_eq!(b.dom(), Some(text));
	assert!(differ.surface().log().is_empty());

	let c = VNode::text("changed");
	assert_eq!(differ.patch(&b, &c, Some(&body)).unwrap(), text);
	assert_eq!(differ.surface().log(), &[Mutation::SetText(text)]);
	assert_eq!(differ.surface().text(text), Some("changed"));
	assert_eq!(differ.surface().children(body), &[text]);
}

#[test]
fn raw_text_children() {
	let (mut differ, body) = setup();
	let a: Node = h("p", (), "before").unwrap();
	let p = differ.render(&a, Some(&body)).unwrap();
	let text = differ.surface().children(p)[0];
	differ.surface_mut().clear_log();

	let b = h("p", (), "after").unwrap();
	differ.patch(&a, &b, Some(&body)).unwrap();
	assert_eq!(differ.surface().log(), &[Mutation::SetText(text)]);

	let c = h("p", (), ()).unwrap();
	differ.patch(&b, &c, Some(&body)).unwrap();
	assert!(differ.surface().children(p).is_empty());
}

#[test]
fn shape_changes_rebuild_children() {
	let (mut differ, body) = setup();
	let a: Node = h("div", (), vec![h("i", (), ()).unwrap(), h("b", (), ()).unwrap()]).unwrap();
	differ.render(&a, Some(&body)).unwrap();

	let b = h("div", (), "text").unwrap();
	differ.patch(&a, &b, Some(&body)).unwrap();
	assert_eq!(differ.surface().to_html(body), "<body><div>text</div></body>");

	let c = h("div", (), h("hr", (), ()).unwrap()).unwrap();
	differ.patch(&b, &c, Some(&body)).unwrap();
	assert_eq!(differ.surface().to_html(body), "<body><div><hr></hr></div></body>");

	let d = h("div", (), vec![h("i", (), ()).unwrap()]).unwrap();
	differ.patch(&c, &d, Some(&body)).unwrap();
	assert_eq!(differ.surface().to_html(body), "<body><div><i></i></div></body>");
}

#[test]
fn fragments_are_spliced() {
	let (mut differ, body) = setup();
	let a: Node = h(
		"div",
		(),
		vec![
			h("a", (), ()).unwrap(),
			VNode::fragment(vec![h("b", (), ()).unwrap(), VNode::empty(), h("c", (), ()).unwrap()]),
			VNode::empty(),
		],
	)
	.unwrap();
	differ.render(&a, Some(&body)).unwrap();
	assert_eq!(differ.surface().to_html(body), "<body><div><a></a><b></b><c></c></div></body>");
}

#[test]
fn svg_namespace() {
	let (mut differ, body) = setup();
	let svg = |children: Vec<Node>| -> Node { h("svg", (), children).unwrap() };
	let circle = || -> Node { h("circle", props! { "key" => "circle" }, ()).unwrap() };
	let foreign = || -> Node { h("foreignObject", props! { "key" => "foreign" }, vec![h("div", (), ()).unwrap()]).unwrap() };

	let a = svg(vec![circle(), foreign()]);
	let root = differ.render(&a, Some(&body)).unwrap();
	let dom = differ.surface();
	let [circle_dom, foreign_dom] = <[NodeId; 2]>::try_from(dom.children(root)).unwrap();
	assert_eq!(dom.namespace(root), Some(SVG_NAMESPACE));
	assert_eq!(dom.namespace(circle_dom), Some(SVG_NAMESPACE));
	assert_eq!(dom.namespace(foreign_dom), Some(SVG_NAMESPACE));
	assert_eq!(dom.namespace(dom.children(foreign_dom)[0]), None);

	let b = svg(vec![circle(), foreign(), h("rect", props! { "key" => "rect" }, ()).unwrap()]);
	differ.patch(&a, &b, Some(&body)).unwrap();
	let rect = differ.surface().children(root)[2];
	assert_eq!(differ.surface().tag(rect), Some("rect"));
	assert_eq!(differ.surface().namespace(rect), Some(SVG_NAMESPACE));
}

fn greeting() -> FunctionComponent<NodeId> {
	FunctionComponent::new("Greeting", |props: &Props<NodeId>, _: &Children<NodeId>| {
		let name = props.get("name").map(|name| name.to_attribute_string().into_owned()).unwrap_or_default();
		h("b", (), name).unwrap().into()
	})
}

#[test]
fn function_components() {
	let (mut differ, body) = setup();
	let greeting = greeting();

	let a: Node = h(&greeting, props! { "name" => "Ada" }, ()).unwrap();
	let b_dom = differ.render(&a, Some(&body)).unwrap();
	assert_eq!(differ.surface().to_html(body), "<body><b>Ada</b></body>");
	assert_eq!(a.rendered_node().and_then(|node| node.dom()), Some(b_dom));
	differ.surface_mut().clear_log();

	let b = h(&greeting, props! { "name" => "Grace" }, ()).unwrap();
	assert_eq!(differ.patch(&a, &b, Some(&body)).unwrap(), b_dom);
	assert_eq!(count(differ.surface().log(), |m| matches!(m, Mutation::SetText(_))), 1);
	assert_eq!(differ.surface().log().len(), 1);

	let other = greeting_clone_with_other_identity();
	let c = h(&other, props! { "name" => "Grace" }, ()).unwrap();
	assert_ne!(differ.patch(&b, &c, Some(&body)).unwrap(), b_dom);
	assert_eq!(differ.surface().to_html(body), "<body><b>Grace</b></body>");

	differ.remove(&c, Some(&body)).unwrap();
	assert!(differ.surface().children(body).is_empty());
}

fn greeting_clone_with_other_identity() -> FunctionComponent<NodeId> {
	greeting()
}

#[test]
fn function_component_outputs() {
	let (mut differ, body) = setup();

	let nothing = FunctionComponent::new("Nothing", |_: &Props<NodeId>, _: &Children<NodeId>| Children::None);
	let a: Node = h(&nothing, (), ()).unwrap();
	differ.render(&a, Some(&body)).unwrap();
	assert_eq!(differ.surface().to_html(body), "<body><!----></body>");

	let text = FunctionComponent::new("Text", |_: &Props<NodeId>, _: &Children<NodeId>| "plain".into());
	let b: Node = h(&text, (), ()).unwrap();
	differ.patch(&a, &b, Some(&body)).unwrap();
	assert_eq!(differ.surface().to_html(body), "<body>plain</body>");

	let many = FunctionComponent::new("Many", |_: &Props<NodeId>, _: &Children<NodeId>| {
		Children::List(vec![VNode::text("a"), VNode::text("b")])
	});
	let c: Node = h(&many, (), ()).unwrap();
	assert!(matches!(differ.render(&c, Some(&body)), Err(Error::InvalidComponentOutput("Many"))));
}

#[test]
fn errors() {
	let (mut differ, body) = setup();

	assert!(matches!(h::<NodeId>("not a tag", (), ()), Err(Error::InvalidTag(_))));
	assert!(matches!(h::<NodeId>("div", props! { "ref" => 1 }, ()), Err(Error::InvalidRef(_))));
	assert!(matches!(h::<NodeId>("div", props! { "key" => 1.5 }, ()), Err(Error::InvalidKey(_))));

	let fragment: Node = VNode::fragment(vec![]);
	assert!(matches!(differ.render(&fragment, Some(&body)), Err(Error::UnknownNodeKind("fragment"))));

	let never_rendered: Node = h("div", (), ()).unwrap();
	let next = h("div", (), ()).unwrap();
	assert!(matches!(differ.patch(&never_rendered, &next, Some(&body)), Err(Error::NotMaterialized(_))));
}

#[test]
fn remove_detaches() {
	let (mut differ, body) = setup();
	let a: Node = h("div", (), vec![h("p", (), "x").unwrap()]).unwrap();
	differ.render(&a, Some(&body)).unwrap();

	differ.remove(&a, Some(&body)).unwrap();
	assert!(differ.surface().children(body).is_empty());

	// Removing something that was never rendered is a no-op.
	let stranger: Node = h("div", (), ()).unwrap();
	differ.surface_mut().clear_log();
	differ.remove(&stranger, Some(&body)).unwrap();
	assert!(differ.surface().log().is_empty());
}
