use byteorder::{BigEndian, ByteOrder};

/// Bytes reserved in front of every allocation for the size header
const HEADER_SIZE: u32 = 4;

/// A currently-unused span of the backing buffer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Chunk {
    base: u32,
    size: u32,
}

impl Chunk {
    fn end(&self) -> u32 {
        self.base + self.size
    }
}

/// First-fit heap over one fixed-size backing buffer
///
/// Every allocation is prefixed by a 4-byte header recording the requested
/// size, so [`Heap::free`] needs only the address. Allocation failure is a
/// normal `None` return, not an error. Freed chunks are kept in address
/// order and coalesced with contiguous neighbours on release.
pub struct Heap {
    data: Vec<u8>,

    /// Free chunks, sorted by base address, never touching
    free_list: Vec<Chunk>,
}

impl Heap {
    pub fn new(capacity: u32) -> Heap {
        Heap {
            data: vec![0; capacity as usize],
            free_list: vec![Chunk {
                base: 0,
                size: capacity,
            }],
        }
    }

    pub fn capacity(&self) -> u32 {
        self.data.len() as u32
    }

    /// Total bytes currently available (across all free chunks)
    pub fn free_bytes(&self) -> u32 {
        self.free_list.iter().map(|chunk| chunk.size).sum()
    }

    /// Bytes of an allocation, starting at an address returned by
    /// [`Heap::malloc`]
    pub fn bytes(&self, address: u32, length: u32) -> &[u8] {
        assert!(
            address.checked_add(length).map_or(false, |end| end <= self.capacity()),
            "read of {} bytes at {:#x} outside the heap",
            length,
            address
        );
        &self.data[address as usize..(address + length) as usize]
    }

    pub fn bytes_mut(&mut self, address: u32, length: u32) -> &mut [u8] {
        assert!(
            address.checked_add(length).map_or(false, |end| end <= self.capacity()),
            "write of {} bytes at {:#x} outside the heap",
            length,
            address
        );
        &mut self.data[address as usize..(address + length) as usize]
    }

    /// Allocate `size` bytes, returning the address of the first usable byte
    pub fn malloc(&mut self, size: u32) -> Option<u32> {
        let needed = size.checked_add(HEADER_SIZE)?;

        let position = self
            .free_list
            .iter()
            .position(|chunk| chunk.size >= needed)?;

        let chunk = &mut self.free_list[position];
        let base = chunk.base;
        if chunk.size == needed {
            self.free_list.remove(position);
        } else {
            chunk.base += needed;
            chunk.size -= needed;
        }

        BigEndian::write_u32(&mut self.data[base as usize..], size);
        let address = base + HEADER_SIZE;
        log::trace!("malloc({}) = {:#x}", size, address);
        Some(address)
    }

    /// Release an allocation made by [`Heap::malloc`]
    ///
    /// The address must be one previously returned by `malloc` and not yet
    /// freed; the size is recovered from the header in front of it.
    pub fn free(&mut self, address: u32) {
        assert!(
            address >= HEADER_SIZE && address <= self.capacity(),
            "free of address {:#x} outside the heap",
            address
        );
        let base = address - HEADER_SIZE;
        let size = BigEndian::read_u32(&self.data[base as usize..]);
        let chunk = Chunk {
            base,
            size: size + HEADER_SIZE,
        };
        assert!(
            chunk.end() <= self.capacity(),
            "free of address {:#x} with corrupt size header {}",
            address,
            size
        );
        log::trace!("free({:#x}), size {}", address, size);

        // Insertion point keeping the list address ordered
        let position = self
            .free_list
            .iter()
            .position(|existing| existing.base > chunk.base)
            .unwrap_or(self.free_list.len());

        let merges_prev = position > 0 && self.free_list[position - 1].end() == chunk.base;
        let merges_next =
            position < self.free_list.len() && chunk.end() == self.free_list[position].base;

        match (merges_prev, merges_next) {
            (true, true) => {
                let next = self.free_list.remove(position);
                let prev = &mut self.free_list[position - 1];
                prev.size += chunk.size + next.size;
            }
            (true, false) => self.free_list[position - 1].size += chunk.size,
            (false, true) => {
                let next = &mut self.free_list[position];
                next.base = chunk.base;
                next.size += chunk.size;
            }
            (false, false) => self.free_list.insert(position, chunk),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sequential_allocations() {
        let mut heap = Heap::new(64);
        assert_eq!(heap.malloc(8), Some(4));
        assert_eq!(heap.malloc(8), Some(16));
        assert_eq!(heap.free_bytes(), 64 - 24);
    }

    #[test]
    fn exhaustion_is_a_normal_return() {
        let mut heap = Heap::new(16);
        assert_eq!(heap.malloc(12), Some(4));
        assert_eq!(heap.malloc(1), None);
        assert_eq!(heap.malloc(u32::MAX), None);
    }

    #[test]
    fn first_fit_reuses_a_freed_chunk() {
        let mut heap = Heap::new(1024);
        let first = heap.malloc(100).unwrap();
        let _second = heap.malloc(50).unwrap();
        heap.free(first);
        // The freed chunk fits exactly, so first-fit hands it back
        assert_eq!(heap.malloc(100), Some(first));
    }

    #[test]
    fn adjacent_frees_coalesce() {
        let mut heap = Heap::new(1024);
        let first = heap.malloc(100).unwrap();
        let second = heap.malloc(50).unwrap();
        let third = heap.malloc(10).unwrap();
        heap.free(first);
        heap.free(second);

        // One merged chunk of both sizes plus both headers
        assert_eq!(heap.free_list[0], Chunk { base: 0, size: 158 });
        // Large enough for an allocation neither hole could satisfy alone
        assert_eq!(heap.malloc(154), Some(4));

        heap.free(third);
    }

    #[test]
    fn free_merges_in_both_directions() {
        let mut heap = Heap::new(1024);
        let a = heap.malloc(10).unwrap();
        let b = heap.malloc(10).unwrap();
        let c = heap.malloc(10).unwrap();
        heap.free(a);
        heap.free(c);
        // The chunk from `c` merges forward into the tail chunk
        assert_eq!(heap.free_list.len(), 2);
        // Freeing the middle block bridges all three chunks
        heap.free(b);
        assert_eq!(heap.free_list.len(), 1);
        assert_eq!(heap.free_bytes(), 1024);
    }

    #[test]
    fn allocations_hold_data() {
        let mut heap = Heap::new(64);
        let first = heap.malloc(4).unwrap();
        let second = heap.malloc(4).unwrap();
        heap.bytes_mut(first, 4).copy_from_slice(&[1, 2, 3, 4]);
        heap.bytes_mut(second, 4).copy_from_slice(&[5, 6, 7, 8]);

        assert_eq!(heap.bytes(first, 4), &[1, 2, 3, 4]);
        assert_eq!(heap.bytes(second, 4), &[5, 6, 7, 8]);
    }

    #[test]
    fn smaller_request_splits_the_front_of_a_chunk() {
        let mut heap = Heap::new(256);
        let first = heap.malloc(100).unwrap();
        heap.free(first);
        // First-fit takes the front of the recycled chunk
        assert_eq!(heap.malloc(10), Some(first));
    }
}
