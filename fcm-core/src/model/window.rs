use std::collections::VecDeque;

/// Fixed-capacity FIFO buffer holding the most recent symbols.
///
/// Once full, each `push` evicts the oldest element. Position 0 is always
/// the oldest element still held.
#[derive(Clone, Debug)]
pub struct SlidingWindow<T> {
	capacity: usize,
	items: VecDeque<T>,
}

impl<T: Copy> SlidingWindow<T> {
	/// Empty window holding at most `capacity` items.
	pub fn new(capacity: usize) -> Self {
		Self { capacity, items: VecDeque::with_capacity(capacity) }
	}

	/// Builds a window already holding the last `capacity` items of `items`.
	pub fn from_slice(capacity: usize, items: &[T]) -> Self {
		let mut window = Self::new(capacity);
		for item in items {
			window.push(*item);
		}
		window
	}

	/// Appends `item`, evicting the oldest one when full.
	///
	/// # Notes
	/// - A window of capacity 0 ignores every push.
	pub fn push(&mut self, item: T) {
		if self.capacity == 0 {
			return;
		}
		if self.items.len() == self.capacity {
			self.items.pop_front();
		}
		self.items.push_back(item);
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// True once `capacity` items have been pushed.
	pub fn is_full(&self) -> bool {
		self.items.len() == self.capacity
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Item at `position`, 0 being the oldest.
	pub fn get(&self, position: usize) -> Option<T> {
		self.items.get(position).copied()
	}

	/// Most recently pushed element.
	pub fn last(&self) -> Option<T> {
		self.items.back().copied()
	}

	/// The first `n` elements, oldest first.
	pub fn head(&self, n: usize) -> impl Iterator<Item = &T> {
		self.items.iter().take(n)
	}

	/// Every item, oldest first.
	pub fn iter(&self) -> impl Iterator<Item = &T> {
		self.items.iter()
	}
}
