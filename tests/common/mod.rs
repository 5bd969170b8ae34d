#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};
use tracing_subscriber::EnvFilter;
use vdom_reconcile::{
	h,
	memory::{MemoryDom, Mutation, NodeId},
	props, Differ, Surface, VNode,
};

pub type Node = VNode<NodeId>;
pub type Log = Rc<RefCell<Vec<String>>>;

pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// A differ over a fresh [`MemoryDom`] with an empty `<body>` and a clean log.
pub fn setup() -> (Differ<MemoryDom>, NodeId) {
	init_logging();
	let mut differ = Differ::new(MemoryDom::new());
	let body = differ.surface_mut().create_element("body", None).unwrap();
	differ.surface_mut().clear_log();
	(differ, body)
}

pub fn item(key: i64) -> Node {
	h("li", props! { "key" => key }, key).unwrap()
}

pub fn list(keys: &[i64]) -> Node {
	h("ul", (), keys.iter().copied().map(item).collect::<Vec<_>>()).unwrap()
}

/// The live `<li>` handles of a rendered [`list`], in order.
pub fn items(differ: &Differ<MemoryDom>, list: &Node) -> Vec<NodeId> {
	differ.surface().children(list.dom().unwrap()).to_vec()
}

/// The text content of each live `<li>` of a rendered [`list`], in order.
pub fn item_keys(differ: &Differ<MemoryDom>, list: &Node) -> Vec<i64> {
	items(differ, list)
		.into_iter()
		.map(|item| {
			let text = differ.surface().children(item)[0];
			differ.surface().text(text).unwrap().parse().unwrap()
		})
		.collect()
}

pub fn count(log: &[Mutation], predicate: impl Fn(&Mutation) -> bool) -> usize {
	log.iter().filter(|mutation| predicate(mutation)).count()
}

pub fn new_log() -> Log {
	Rc::new(RefCell::new(Vec::new()))
}
