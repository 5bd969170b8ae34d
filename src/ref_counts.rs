//! Reference counts for listeners that are shared by many bindings.

use core::{borrow::Borrow, hash::Hash};
use hashbrown::{hash_map::Entry, HashMap};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

/// Counts how many bindings share each key.
///
/// [`RefCounts::acquire`] reports when a key goes from unused to used,
/// [`RefCounts::release`] when its last user is gone. Unused keys hold no entry.
#[derive(Debug)]
pub struct RefCounts<K, C = u32>(HashMap<K, C>);

impl<K: Hash + Eq, C: CheckedAdd + CheckedSub + One + Zero> Default for RefCounts<K, C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K: Hash + Eq, C: CheckedAdd + CheckedSub + One + Zero> RefCounts<K, C> {
	#[must_use]
	pub fn new() -> Self {
		Self(HashMap::new())
	}

	/// Adds a user of `key`. Returns `true` if it is the first one.
	///
	/// # Errors
	///
	/// Iff the count can't grow any further. It is left unchanged in that case.
	pub fn acquire(&mut self, key: K) -> Result<bool, CountError> {
		match self.0.entry(key) {
			Entry::Occupied(occupied) => {
				let count = occupied.into_mut();
				*count = count.checked_add(&C::one()).ok_or(CountError::Saturated)?;
				Ok(false)
			}
			Entry::Vacant(vacant) => {
				vacant.insert(C::one());
				Ok(true)
			}
		}
	}

	/// Drops a user of `key`. Returns `true` if it was the last one, in which case the entry is gone.
	///
	/// # Errors
	///
	/// Iff `key` has no users.
	pub fn release<Q: ?Sized + Hash + Eq>(&mut self, key: &Q) -> Result<bool, CountError>
	where
		K: Borrow<Q>,
	{
		let count = self.0.get_mut(key).ok_or(CountError::Unused)?;
		*count = count.checked_sub(&C::one()).ok_or(CountError::Unused)?;
		if count.is_zero() {
			self.0.remove(key);
			Ok(true)
		} else {
			Ok(false)
		}
	}

	#[must_use]
	pub fn is_used<Q: ?Sized + Hash + Eq>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
	{
		self.0.contains_key(key)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CountError {
	#[error("reference count saturated")]
	Saturated,
	#[error("released a key without users")]
	Unused,
}
