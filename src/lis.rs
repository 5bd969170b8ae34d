/// Positions in `sources` that form a longest strictly increasing subsequence of its [`Some`] values, in ascending order.
///
/// Patience sorting with predecessor links: O(n log n).
pub(crate) fn longest_increasing_subsequence(sources: &[Option<usize>]) -> Vec<usize> {
	// (value, position) of the smallest tail of each increasing run length found so far.
	let mut tails: Vec<(usize, usize)> = Vec::new();
	let mut predecessors: Vec<Option<usize>> = vec![None; sources.len()];

	for (position, value) in sources.iter().enumerate() {
		let value = match *value {
			Some(value) => value,
			None => continue,
		};
		let length = tails.partition_point(|&(tail, _)| tail < value);
		if length > 0 {
			predecessors[position] = Some(tails[length - 1].1);
		}
		if length == tails.len() {
			tails.push((value, position));
		} else {
			tails[length] = (value, position);
		}
	}

	let mut subsequence = Vec::with_capacity(tails.len());
	let mut next = tails.last().map(|&(_, position)| position);
	while let Some(position) = next {
		subsequence.push(position);
		next = predecessors[position];
	}
	subsequence.reverse();
	subsequence
}

#[cfg(test)]
mod tests {
	use super::longest_increasing_subsequence as lis;

	#[test]
	fn empty_and_unmatched() {
		assert_eq!(lis(&[]), Vec::<usize>::new());
		assert_eq!(lis(&[None, None]), Vec::<usize>::new());
	}

	#[test]
	fn already_sorted() {
		assert_eq!(lis(&[Some(0), Some(1), Some(2)]), vec![0, 1, 2]);
	}

	#[test]
	fn single_rotation() {
		// [2, 3, 1] as old positions [1, 2, 0]
		assert_eq!(lis(&[Some(1), Some(2), Some(0)]), vec![0, 1]);
	}

	#[test]
	fn skips_unmatched_slots() {
		assert_eq!(lis(&[None, Some(3), Some(1), None, Some(2)]), vec![2, 4]);
	}

	#[test]
	fn reversed() {
		assert_eq!(lis(&[Some(3), Some(2), Some(1), Some(0)]).len(), 1);
	}

	#[test]
	fn is_strictly_increasing() {
		let sources = [Some(9), Some(2), Some(5), Some(3), Some(7), Some(11), Some(8), Some(10), Some(13), Some(6)];
		let subsequence = lis(&sources);
		assert_eq!(subsequence.len(), 6);
		assert!(subsequence.windows(2).all(|w| w[0] < w[1] && sources[w[0]] < sources[w[1]]));
	}
}
