/// Programmer-error-class failures raised while building or reconciling a tree.
///
/// None of these are caught or retried inside the crate.
/// A failing [`render`](`crate::Differ::render`) or [`patch`](`crate::Differ::patch`)
/// leaves the live tree in whatever partially-updated state it reached.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The `tag` passed to node construction is not a valid element name or component.
	#[error("Invalid tag {0:?}: Expected an element name or a component")]
	InvalidTag(String),

	/// A function component returned a sequence of nodes instead of a single node.
	#[error("Function component `{0}` returned a sequence instead of a single node")]
	InvalidComponentOutput(&'static str),

	/// A `ref` prop that isn't a callback.
	#[error("`ref` must be a callback, but got {0}")]
	InvalidRef(String),

	/// A `key` prop that is neither an integer nor a string.
	#[error("`key` must be an integer or a string, but got {0}")]
	InvalidKey(String),

	/// Dispatch received a node kind that can't be materialized or diffed.
	///
	/// Fragments and empty placeholders are flattened away during child normalization,
	/// so this only fires when one is handed to the engine directly.
	#[error("Unknown node kind `{0}` reached dispatch")]
	UnknownNodeKind(&'static str),

	/// A node that must already be live has no display handle.
	#[error("Expected a materialized `{0}` node, but it has no display handle")]
	NotMaterialized(&'static str),

	/// The rendering surface failed to perform an operation.
	#[error("Surface operation `{operation}` failed: {message}")]
	Surface { operation: &'static str, message: String },
}
