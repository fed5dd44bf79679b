//! Paged arrays for element counts beyond a single allocation.
//!
//! A [`HugeArray`] splits its elements into fixed pages of [`PAGE_SIZE`]
//! entries. An element index resolves to `(index >> PAGE_SHIFT,
//! index & PAGE_MASK)`. Pages are allocated independently, so the total size
//! is bounded by `MAX_PAGES * PAGE_SIZE` instead of by the largest contiguous
//! block the allocator will hand out.
//!
//! The module also carries the variable-length integer codec used by the
//! compressed adjacency lists of [`crate::graph::huge::HugeGraph`].

/// log2 of the page size.
pub const PAGE_SHIFT: u32 = 14;
/// Elements per page.
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;
/// Mask selecting the in-page offset of an index.
pub const PAGE_MASK: usize = PAGE_SIZE - 1;
/// Upper bound on the number of pages one array may hold.
pub const MAX_PAGES: usize = i32::MAX as usize;
/// Largest element count a paged array supports.
pub const HUGE_CAPACITY: u64 = (MAX_PAGES as u64) << PAGE_SHIFT;

#[inline]
#[must_use]
pub const fn page_index(index: u64) -> usize {
    (index >> PAGE_SHIFT) as usize
}

#[inline]
#[must_use]
pub const fn index_in_page(index: u64) -> usize {
    (index as usize) & PAGE_MASK
}

/// Number of pages needed for `len` elements.
#[inline]
#[must_use]
pub const fn pages_for(len: u64) -> usize {
    ((len + PAGE_MASK as u64) >> PAGE_SHIFT) as usize
}

/// Fixed-length array split into independently allocated pages.
#[derive(Debug, Clone)]
pub struct HugeArray<T> {
    pages: Vec<Box<[T]>>,
    len: u64,
}

impl<T: Copy + Default> HugeArray<T> {
    /// Allocate `len` default-initialized elements.
    #[must_use]
    pub fn new(len: u64) -> Self {
        let page_count = pages_for(len);
        let mut pages = Vec::with_capacity(page_count);
        let mut remaining = len;
        for _ in 0..page_count {
            let size = remaining.min(PAGE_SIZE as u64) as usize;
            pages.push(vec![T::default(); size].into_boxed_slice());
            remaining -= size as u64;
        }
        Self { pages, len }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: u64) -> T {
        self.pages[page_index(index)][index_in_page(index)]
    }

    #[inline]
    pub fn set(&mut self, index: u64, value: T) {
        self.pages[page_index(index)][index_in_page(index)] = value;
    }

    pub fn fill(&mut self, value: T) {
        for page in &mut self.pages {
            page.fill(value);
        }
    }

    /// Iterate all elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.pages.iter().flat_map(|page| page.iter().copied())
    }
}

impl<T> HugeArray<T> {
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn page(&self, page: usize) -> &[T] {
        &self.pages[page]
    }

    /// Heap bytes held by the element pages.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.pages.iter().map(|p| std::mem::size_of_val(&**p)).sum()
    }
}

impl<T: Copy + Default> Default for HugeArray<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl HugeArray<u64> {
    /// Add `delta` to the element at `index`, returning the previous value.
    #[inline]
    pub fn get_and_add(&mut self, index: u64, delta: u64) -> u64 {
        let slot = &mut self.pages[page_index(index)][index_in_page(index)];
        let previous = *slot;
        *slot += delta;
        previous
    }
}

/// Append-only builder producing a [`HugeArray`] without knowing the final
/// length up front.
#[derive(Debug)]
pub struct HugeArrayBuilder<T> {
    pages: Vec<Vec<T>>,
    len: u64,
}

impl<T: Copy + Default> HugeArrayBuilder<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pages: Vec::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        match self.pages.last_mut() {
            Some(page) if page.len() < PAGE_SIZE => page.push(value),
            _ => {
                let mut page = Vec::with_capacity(PAGE_SIZE);
                page.push(value);
                self.pages.push(page);
            }
        }
        self.len += 1;
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn build(self) -> HugeArray<T> {
        HugeArray {
            pages: self
                .pages
                .into_iter()
                .map(Vec::into_boxed_slice)
                .collect(),
            len: self.len,
        }
    }
}

impl<T: Copy + Default> Default for HugeArrayBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Variable-length integers
// ---------------------------------------------------------------------------

/// Append `value` as a little-endian base-128 varint (7 payload bits per
/// byte, high bit set on every byte but the last).
pub fn encode_vlong(mut value: u64, out: &mut HugeArrayBuilder<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Byte-wise reader over a paged byte array.
///
/// Holds its own page/offset position; every traversal creates one, so
/// concurrent readers never share cursor state.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    bytes: &'a HugeArray<u8>,
    page: usize,
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    #[must_use]
    pub const fn new(bytes: &'a HugeArray<u8>, start: u64) -> Self {
        Self {
            bytes,
            page: page_index(start),
            offset: index_in_page(start),
        }
    }

    #[inline]
    fn next_byte(&mut self) -> u8 {
        let page = self.bytes.page(self.page);
        let byte = page[self.offset];
        self.offset += 1;
        if self.offset == page.len() {
            self.page += 1;
            self.offset = 0;
        }
        byte
    }

    /// Decode the next varint written by [`encode_vlong`].
    #[inline]
    pub fn read_vlong(&mut self) -> u64 {
        let mut value = 0_u64;
        let mut shift = 0;
        loop {
            let byte = self.next_byte();
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return value;
            }
            shift += 7;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math_splits_index() {
        let index = (3_u64 << PAGE_SHIFT) + 17;
        assert_eq!(page_index(index), 3);
        assert_eq!(index_in_page(index), 17);
        assert_eq!(pages_for(0), 0);
        assert_eq!(pages_for(1), 1);
        assert_eq!(pages_for(PAGE_SIZE as u64), 1);
        assert_eq!(pages_for(PAGE_SIZE as u64 + 1), 2);
    }

    #[test]
    fn values_cross_page_boundaries() {
        let len = PAGE_SIZE as u64 * 2 + 5;
        let mut array = HugeArray::<u64>::new(len);
        assert_eq!(array.page_count(), 3);
        assert_eq!(array.page(2).len(), 5);

        for i in [0, PAGE_SIZE as u64 - 1, PAGE_SIZE as u64, len - 1] {
            array.set(i, i * 10);
        }
        assert_eq!(array.get(PAGE_SIZE as u64 - 1), (PAGE_SIZE as u64 - 1) * 10);
        assert_eq!(array.get(PAGE_SIZE as u64), PAGE_SIZE as u64 * 10);
        assert_eq!(array.get(len - 1), (len - 1) * 10);
        assert_eq!(array.iter().count() as u64, len);
    }

    #[test]
    fn get_and_add_returns_previous() {
        let mut array = HugeArray::<u64>::new(4);
        assert_eq!(array.get_and_add(2, 5), 0);
        assert_eq!(array.get_and_add(2, 1), 5);
        assert_eq!(array.get(2), 6);
    }

    #[test]
    fn builder_matches_pushed_sequence() {
        let mut builder = HugeArrayBuilder::new();
        let count = PAGE_SIZE as u64 + 100;
        for i in 0..count {
            builder.push(i as u32);
        }
        let array = builder.build();
        assert_eq!(array.len(), count);
        assert_eq!(array.get(PAGE_SIZE as u64 + 99), PAGE_SIZE as u32 + 99);
    }

    #[test]
    fn varints_decode_across_pages() {
        let mut builder = HugeArrayBuilder::new();
        // Pad so the multi-byte value straddles the first page boundary.
        for _ in 0..PAGE_SIZE - 2 {
            builder.push(0_u8);
        }
        let start = builder.len();
        let values = [u64::MAX, 0, 127, 128, 300, 1 << 40];
        for v in values {
            encode_vlong(v, &mut builder);
        }
        let bytes = builder.build();

        let mut cursor = ByteCursor::new(&bytes, start);
        for v in values {
            assert_eq!(cursor.read_vlong(), v);
        }
    }
}
