//! Reconciliation: patching a live tree from one virtual tree to the next.

use crate::{
	attributes,
	component::FunctionComponent,
	differ::loggable,
	form,
	lis::longest_increasing_subsequence,
	mount::enqueue_ref,
	props::{Key, RefCallback},
	queue::MountQueue,
	vnode::{ElementKind, Kind, Rendered},
	Children, Differ, Error, Surface, VNode,
};
use hashbrown::{hash_map::Entry, HashMap};
use std::rc::Rc;
use tracing::{error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// Below these sizes, the general keyed diff matches keys with a nested loop instead of a hash map.
const NESTED_LOOP_MAX_NEW: usize = 4;
const NESTED_LOOP_MAX_PRODUCT: usize = 16;

impl<S: Surface> Differ<S> {
	/// Reconciles `previous` into `next` and returns `next`'s live handle.
	///
	/// `parent` is the live parent both nodes (are to) live in, where known.
	pub(crate) fn patch_vnode(&mut self, previous: &VNode<S::Handle>, next: &VNode<S::Handle>, parent: Option<&S::Handle>, queue: &mut MountQueue, is_svg: bool) -> Result<S::Handle, Error> {
		if previous.ptr_eq(next) {
			trace!("Skipping identical {}.", next.kind().name());
			return previous.dom().ok_or(Error::NotMaterialized(previous.kind().name()));
		}

		match (previous.kind(), next.kind()) {
			(_, kind @ (Kind::Fragment | Kind::Empty)) | (kind @ (Kind::Fragment | Kind::Empty), _) => Err(Error::UnknownNodeKind(kind.name())),

			(Kind::Element(_), Kind::Element(element_kind)) => self.patch_element(previous, next, *element_kind, parent, queue, is_svg),

			(Kind::Text | Kind::Comment, Kind::Text | Kind::Comment) => self.patch_text(previous, next),

			(Kind::ComponentClass(class_1), Kind::ComponentClass(class_2)) if class_1.same(class_2) && previous.key() == next.key() => self.patch_component(previous, next, parent, queue),
			(Kind::ComponentInstance(instance_1), Kind::ComponentInstance(instance_2)) if Rc::ptr_eq(instance_1, instance_2) => self.patch_component(previous, next, parent, queue),
			(Kind::ComponentClass(_), Kind::ComponentClass(_)) | (Kind::ComponentInstance(_), Kind::ComponentInstance(_)) => self.replace_component(previous, next, parent, queue),

			(Kind::ComponentFunction(function_1), Kind::ComponentFunction(function_2)) if function_1.same(function_2) && previous.key() == next.key() => {
				self.patch_function_component(previous, next, function_2, parent, queue, is_svg)
			}

			// Mismatching nodes: Destroy and rebuild.
			_ => self.replace(previous, next, parent, queue, is_svg),
		}
	}

	#[instrument(skip(self, previous, next, parent, queue))]
	fn patch_element(&mut self, previous: &VNode<S::Handle>, next: &VNode<S::Handle>, element_kind: ElementKind, parent: Option<&S::Handle>, queue: &mut MountQueue, is_svg: bool) -> Result<S::Handle, Error> {
		let tag = next.tag().unwrap_or_default();
		if previous.tag() != Some(tag) {
			if STATIC_MAX_LEVEL >= Level::WARN && previous.tag().map_or(false, |previous| previous.eq_ignore_ascii_case(tag)) {
				warn!("Recreating element due to different tag name casing: {:?} -> {:?}", previous.tag(), tag);
			}
			return self.replace(previous, next, parent, queue, is_svg);
		}

		let span = trace_span!("Diffing element", tag);
		let _enter = span.enter();

		let dom = previous.dom().ok_or(Error::NotMaterialized("element"))?;
		next.set_dom(Some(dom.clone()));

		let is_svg = is_svg || element_kind == ElementKind::Svg;
		self.diff_children(previous.children(), next.children(), &dom, queue, is_svg && tag != "foreignObject")?;

		if !previous.props().ptr_eq(next.props()) {
			let is_select = element_kind == ElementKind::Select;
			attributes::patch_props(&mut self.surface, previous.props(), next.props(), &dom, is_select);
			if is_select && !next.props().is_empty() {
				form::process_select(&mut self.surface, next, false);
			}
		}

		if previous.class_name() != next.class_name() {
			match next.class_name() {
				Some(class_name) => self.surface.set_attribute(&dom, "class", class_name),
				None => self.surface.remove_attribute(&dom, "class"),
			}
		}

		loosen_ref(previous.node_ref(), next, &dom, queue);
		Ok(dom)
	}

	fn patch_text(&mut self, previous: &VNode<S::Handle>, next: &VNode<S::Handle>) -> Result<S::Handle, Error> {
		let (text_1, text_2) = (previous.text_content().unwrap_or_default(), next.text_content().unwrap_or_default());
		let span = trace_span!("Diffing text node", text_1 = loggable(text_1), text_2 = loggable(text_2));
		let _enter = span.enter();

		let dom = previous.dom().ok_or(Error::NotMaterialized(previous.kind().name()))?;
		next.set_dom(Some(dom.clone()));
		if text_1 != text_2 {
			self.surface.set_text(&dom, text_2);
		}
		Ok(dom)
	}

	/// Lets a live component update itself. It may return a different root, which is then swapped in.
	fn patch_component(&mut self, previous: &VNode<S::Handle>, next: &VNode<S::Handle>, parent: Option<&S::Handle>, queue: &mut MountQueue) -> Result<S::Handle, Error> {
		let span = trace_span!("Diffing component", kind = next.kind().name());
		let _enter = span.enter();

		let dom = previous.dom().ok_or(Error::NotMaterialized(previous.kind().name()))?;
		let instance = previous.instance().ok_or(Error::NotMaterialized(previous.kind().name()))?;
		next.set_rendered(Rendered::Instance(instance.clone()));

		let new_dom = {
			let mut component = instance.borrow_mut();
			match component.as_updatable() {
				Some(updatable) => updatable.update(self, previous, next)?,
				None => {
					trace!("Component can't update. Keeping its live root.");
					dom.clone()
				}
			}
		};
		next.set_dom(Some(new_dom.clone()));

		if new_dom != dom {
			self.swap_live(&dom, &new_dom, parent);
		}
		loosen_ref(previous.node_ref(), next, &new_dom, queue);
		Ok(new_dom)
	}

	/// Destroys the previous component in favour of a new one, handing each the other node.
	fn replace_component(&mut self, previous: &VNode<S::Handle>, next: &VNode<S::Handle>, parent: Option<&S::Handle>, queue: &mut MountQueue) -> Result<S::Handle, Error> {
		let span = trace_span!("Replacing component", kind = next.kind().name());
		let _enter = span.enter();

		let dom = previous.dom().ok_or(Error::NotMaterialized(previous.kind().name()))?;
		self.demolish(previous, None, Some(next))?;
		let new_dom = self.materialize_component(next, None, queue, Some(previous))?;
		if new_dom != dom {
			self.swap_live(&dom, &new_dom, parent);
		}
		Ok(new_dom)
	}

	fn patch_function_component(
		&mut self,
		previous: &VNode<S::Handle>,
		next: &VNode<S::Handle>,
		function: &FunctionComponent<S::Handle>,
		parent: Option<&S::Handle>,
		queue: &mut MountQueue,
		is_svg: bool,
	) -> Result<S::Handle, Error> {
		let span = trace_span!("Diffing function component", name = function.name());
		let _enter = span.enter();

		let rendered_1 = previous.rendered_node().ok_or(Error::NotMaterialized("function component"))?;
		let rendered_2 = function.render(next.props(), next.children())?;
		let dom = self.patch_vnode(&rendered_1, &rendered_2, parent, queue, is_svg)?;
		next.set_rendered(Rendered::Node(rendered_2));
		next.set_dom(Some(dom.clone()));
		loosen_ref(previous.node_ref(), next, &dom, queue);
		Ok(dom)
	}

	/// Demolishes `previous` and puts a freshly materialized `next` in its place.
	fn replace(&mut self, previous: &VNode<S::Handle>, next: &VNode<S::Handle>, parent: Option<&S::Handle>, queue: &mut MountQueue, is_svg: bool) -> Result<S::Handle, Error> {
		let span = trace_span!("Replace mismatching", previous = previous.kind().name(), next = next.kind().name());
		let _enter = span.enter();

		let dom = previous.dom().ok_or(Error::NotMaterialized(previous.kind().name()))?;
		let parent = self.surface.parent_of(&dom).or_else(|| parent.cloned());
		self.demolish(previous, None, Some(next))?;
		let new_dom = self.materialize(next, None, queue, is_svg)?;
		match parent {
			Some(parent) => self.surface.replace_child(&parent, &new_dom, &dom),
			None => warn!("Replaced a node without parent. The replacement stays detached."),
		}
		Ok(new_dom)
	}

	/// Puts `new` where `old` is, preferring `old`'s actual parent over `parent`.
	fn swap_live(&mut self, old: &S::Handle, new: &S::Handle, parent: Option<&S::Handle>) {
		match self.surface.parent_of(old).or_else(|| parent.cloned()) {
			Some(parent) => self.surface.replace_child(&parent, new, old),
			None => warn!("Can't swap in a new component root: The old one has no parent."),
		}
	}

	/// Diffs the child slots of an element, dispatching on their shapes.
	pub(crate) fn diff_children(&mut self, previous: &Children<S::Handle>, next: &Children<S::Handle>, parent: &S::Handle, queue: &mut MountQueue, is_svg: bool) -> Result<(), Error> {
		match (previous, next) {
			(Children::None, Children::None) => Ok(()),
			(Children::None, next) => self.materialize_children(next, parent, queue, is_svg),
			(previous, Children::None) => self.remove_children(previous, parent),
			(Children::Text(text_1), Children::Text(text_2)) => {
				if text_1 != text_2 {
					match self.surface.first_child(parent) {
						Some(text) => self.surface.set_text(&text, text_2),
						None => {
							error!("Expected a text node to update but found none. Recreating it.");
							let text = self.surface.create_text(text_2);
							self.surface.append_child(parent, &text);
						}
					}
				}
				Ok(())
			}
			(Children::List(nodes_1), Children::List(nodes_2)) => self.diff_keyed(nodes_1, nodes_2, parent, queue, is_svg),
			(Children::Node(node_1), Children::Node(node_2)) => self.patch_vnode(node_1, node_2, Some(parent), queue, is_svg).map(drop),
			// Shape change: No attempt at partial reconciliation.
			(previous, next) => {
				self.remove_children(previous, parent)?;
				self.materialize_children(next, parent, queue, is_svg)
			}
		}
	}

	fn remove_children(&mut self, children: &Children<S::Handle>, parent: &S::Handle) -> Result<(), Error> {
		match children {
			Children::Text(_) => {
				match self.surface.first_child(parent) {
					Some(text) => self.surface.remove_child(parent, &text),
					None => error!("Expected a text node to remove but found none."),
				}
				Ok(())
			}
			children => self.demolish_children(children, Some(parent)),
		}
	}

	/// The keyed list diff.
	///
	/// Trims matching heads and tails, catches single rotations, and otherwise matches keys,
	/// moving only nodes outside the longest increasing subsequence of surviving old positions.
	#[allow(clippy::too_many_lines)]
	#[instrument(skip(self, a, b, parent, queue))]
	fn diff_keyed(&mut self, a: &[VNode<S::Handle>], b: &[VNode<S::Handle>], parent: &S::Handle, queue: &mut MountQueue, is_svg: bool) -> Result<(), Error> {
		let span = trace_span!("Diffing keyed", "a.len()" = a.len(), "b.len()" = b.len());
		let _enter = span.enter();

		let (mut a_start, mut b_start) = (0, 0);
		let (mut a_end, mut b_end) = (a.len(), b.len());

		loop {
			while a_start < a_end && b_start < b_end && a[a_start].key() == b[b_start].key() {
				self.patch_vnode(&a[a_start], &b[b_start], Some(parent), queue, is_svg)?;
				a_start += 1;
				b_start += 1;
			}
			while a_start < a_end && b_start < b_end && a[a_end - 1].key() == b[b_end - 1].key() {
				self.patch_vnode(&a[a_end - 1], &b[b_end - 1], Some(parent), queue, is_svg)?;
				a_end -= 1;
				b_end -= 1;
			}
			if a_start == a_end || b_start == b_end {
				break;
			}

			if a[a_end - 1].key() == b[b_start].key() {
				let span = trace_span!("Moving last to front", key = ?b[b_start].key());
				let _enter = span.enter();
				let dom = self.patch_vnode(&a[a_end - 1], &b[b_start], Some(parent), queue, is_svg)?;
				let reference = a[a_start].dom().ok_or(Error::NotMaterialized(a[a_start].kind().name()))?;
				self.surface.insert_before(parent, &dom, &reference);
				a_end -= 1;
				b_start += 1;
				continue;
			}

			if a[a_start].key() == b[b_end - 1].key() {
				let span = trace_span!("Moving first to back", key = ?b[b_end - 1].key());
				let _enter = span.enter();
				let dom = self.patch_vnode(&a[a_start], &b[b_end - 1], Some(parent), queue, is_svg)?;
				self.insert_or_append(b_end - 1, &dom, b, parent);
				a_start += 1;
				b_end -= 1;
				continue;
			}

			break;
		}

		if a_start == a_end {
			for node in &b[b_start..b_end] {
				let dom = self.materialize(node, None, queue, is_svg)?;
				self.insert_or_append(b_end - 1, &dom, b, parent);
			}
			Ok(())
		} else if b_start == b_end {
			for node in &a[a_start..a_end] {
				self.demolish(node, Some(parent), None)?;
			}
			Ok(())
		} else {
			self.diff_keyed_general(&a[a_start..a_end], b, b_start, b_end, parent, queue, is_svg)
		}
	}

	/// The part of the keyed diff that can't be resolved by trimming or rotation.
	///
	/// `a` is the remaining old range. `b[b_start..b_end]` is the remaining new range,
	/// but all of `b` is needed to find already-positioned neighbours.
	#[allow(clippy::too_many_arguments)]
	#[allow(clippy::too_many_lines)]
	fn diff_keyed_general(&mut self, a: &[VNode<S::Handle>], b: &[VNode<S::Handle>], b_start: usize, b_end: usize, parent: &S::Handle, queue: &mut MountQueue, is_svg: bool) -> Result<(), Error> {
		let (a_len, b_len) = (a.len(), b_end - b_start);
		let span = trace_span!("Diffing keyed (general)", a_len, b_len);
		let _enter = span.enter();

		// Matching (old, new) positions, in old order.
		let mut pairs = Vec::with_capacity(a_len.min(b_len));
		// New positions already taken. A second old node with the same key stays unmatched and is demolished.
		let mut claimed = vec![false; b_len];
		let mut claim = |i: usize, j: usize, pairs: &mut Vec<(usize, usize)>| {
			if claimed[j - b_start] {
				error!("Duplicate key encountered among the previous nodes: {:?}. The extra node will be removed.", a[i].key());
			} else {
				claimed[j - b_start] = true;
				pairs.push((i, j));
			}
		};
		if b_len <= NESTED_LOOP_MAX_NEW || a_len * b_len <= NESTED_LOOP_MAX_PRODUCT {
			for (i, node) in a.iter().enumerate() {
				if pairs.len() >= b_len {
					break;
				}
				if let Some(j) = (b_start..b_end).find(|&j| node.key() == b[j].key()) {
					claim(i, j, &mut pairs);
				}
			}
		} else {
			let mut key_index: HashMap<Option<&Key>, usize> = HashMap::with_capacity(b_len);
			for (j, node) in b.iter().enumerate().take(b_end).skip(b_start) {
				match key_index.entry(node.key()) {
					Entry::Occupied(mut occupied) => {
						error!("Duplicate key encountered: {:?}. Only the last node with it will be matched.", node.key());
						occupied.insert(j);
					}
					Entry::Vacant(vacant) => {
						vacant.insert(j);
					}
				}
			}
			for (i, node) in a.iter().enumerate() {
				if pairs.len() >= b_len {
					break;
				}
				if let Some(&j) = key_index.get(&node.key()) {
					claim(i, j, &mut pairs);
				}
			}
		}

		// Old position supplying each new position, if any.
		let mut sources: Vec<Option<usize>> = vec![None; b_len];
		let mut matched = vec![false; a_len];
		let mut moved = false;
		let mut position = 0;
		for &(i, j) in &pairs {
			sources[j - b_start] = Some(i);
			if position > j {
				moved = true;
			} else {
				position = j;
			}
			self.patch_vnode(&a[i], &b[j], Some(parent), queue, is_svg)?;
			matched[i] = true;
		}
		let patched = pairs.len();

		if patched == 0 {
			let span = trace_span!("Replacing all");
			let _enter = span.enter();

			for node in a {
				self.demolish(node, Some(parent), None)?;
			}
			let anchor = match b.get(b_end) {
				Some(anchor) => Some(anchor.dom().ok_or(Error::NotMaterialized(anchor.kind().name()))?),
				None => None,
			};
			for node in &b[b_start..b_end] {
				let dom = self.materialize(node, None, queue, is_svg)?;
				match &anchor {
					Some(anchor) => self.surface.insert_before(parent, &dom, anchor),
					None => self.surface.append_child(parent, &dom),
				}
			}
			return Ok(());
		}

		// Insert before removing, back to front, so every insertion has a finished right-hand neighbour.
		if moved {
			let stable = longest_increasing_subsequence(&sources);
			trace!("Moving {} of {} matched node(s).", patched - stable.len(), patched);
			let mut remaining = stable.len();
			for i in (0..b_len).rev() {
				let position = b_start + i;
				if sources[i].is_none() {
					let dom = self.materialize(&b[position], None, queue, is_svg)?;
					self.insert_or_append(position, &dom, b, parent);
				} else if remaining == 0 || stable[remaining - 1] != i {
					let dom = b[position].dom().ok_or(Error::NotMaterialized(b[position].kind().name()))?;
					self.insert_or_append(position, &dom, b, parent);
				} else {
					remaining -= 1;
				}
			}
		} else if patched != b_len {
			for i in (0..b_len).rev() {
				if sources[i].is_none() {
					let position = b_start + i;
					let dom = self.materialize(&b[position], None, queue, is_svg)?;
					self.insert_or_append(position, &dom, b, parent);
				}
			}
		}

		for (node, _) in a.iter().zip(matched).filter(|(_, matched)| !matched) {
			self.demolish(node, Some(parent), None)?;
		}
		Ok(())
	}

	/// Inserts `dom` right before the live node of `nodes[position + 1]`, or appends it if there's none.
	fn insert_or_append(&mut self, position: usize, dom: &S::Handle, nodes: &[VNode<S::Handle>], parent: &S::Handle) {
		match nodes.get(position + 1) {
			Some(next) => match next.dom() {
				Some(reference) => self.surface.insert_before(parent, dom, &reference),
				None => {
					error!("Next sibling at {} has no live node. Appending instead.", position + 1);
					self.surface.append_child(parent, dom);
				}
			},
			None => self.surface.append_child(parent, dom),
		}
	}
}

/// Calls a replaced `ref` with [`None`] right away and defers the new one.
fn loosen_ref<H: crate::Handle>(previous: Option<&RefCallback<H>>, next: &VNode<H>, dom: &H, queue: &mut MountQueue) {
	match (previous, next.node_ref()) {
		(Some(previous), Some(next)) if Rc::ptr_eq(previous, next) => (),
		(previous, _) => {
			if let Some(previous) = previous {
				let span = trace_span!("Unbinding ref");
				let _enter = span.enter();
				previous(None);
			}
			enqueue_ref(next, dom, queue);
		}
	}
}
