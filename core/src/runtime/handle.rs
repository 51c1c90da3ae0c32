//! Handle table (§3 "Handle", §4.15): the indirection layer between Java
//! references and heap data. A reference is always a handle address, never
//! a data address, so compaction only ever rewrites offset 0 of the moved
//! object's handle.

/// Words per handle record. Handle addresses are always a multiple of this.
pub const HANDLE_WORDS: usize = 8;

/// Sentinel for "not on this list" in the next-link and gray-link words.
pub const LIST_END: u32 = u32::MAX;

mod offset {
    pub const DATA_PTR: usize = 0;
    pub const METHOD_TABLE_OR_LEN: usize = 1;
    pub const MARK: usize = 2;
    pub const TYPE_TAG: usize = 3;
    pub const NEXT_LINK: usize = 4;
    pub const GRAY_LINK: usize = 5;
}

/// Type discriminant stored at handle offset 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleType {
    Object,
    ReferenceArray,
    PrimitiveArray,
}

impl HandleType {
    fn encode(self) -> u32 {
        match self {
            HandleType::Object => 0,
            HandleType::ReferenceArray => 1,
            HandleType::PrimitiveArray => 2,
        }
    }

    fn decode(v: u32) -> Self {
        match v {
            1 => HandleType::ReferenceArray,
            2 => HandleType::PrimitiveArray,
            _ => HandleType::Object,
        }
    }
}

/// The handle area: `capacity` fixed-size 8-word records, each addressed by
/// `index * HANDLE_WORDS`. Address 0 is never allocated (§8 "Handle at
/// address 0 is never valid"), so index 0 is permanently reserved.
pub struct HandleTable {
    words: Vec<u32>,
    capacity: usize,
    free_head: u32,
    use_head: u32,
    live_count: usize,
}

impl HandleTable {
    pub fn new(capacity: usize) -> Self {
        let mut t = Self {
            words: vec![0; capacity * HANDLE_WORDS],
            capacity,
            free_head: LIST_END,
            use_head: LIST_END,
            live_count: 0,
        };
        // Build the free list over indices 1..capacity, threading offset 4
        // as the next-link. Index 0 is reserved and never linked in.
        for idx in (1..capacity).rev() {
            let addr = (idx * HANDLE_WORDS) as u32;
            t.set_word(addr, offset::NEXT_LINK, t.free_head);
            t.free_head = addr;
        }
        t
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn word(&self, handle_addr: u32, off: usize) -> u32 {
        self.words[handle_addr as usize + off]
    }

    fn set_word(&mut self, handle_addr: u32, off: usize, value: u32) {
        self.words[handle_addr as usize + off] = value;
    }

    pub fn is_free(&self, handle_addr: u32) -> bool {
        handle_addr == 0 || self.word(handle_addr, offset::DATA_PTR) == 0
    }

    pub fn data_pointer(&self, handle_addr: u32) -> u32 {
        self.word(handle_addr, offset::DATA_PTR)
    }

    pub fn set_data_pointer(&mut self, handle_addr: u32, data_ptr: u32) {
        self.set_word(handle_addr, offset::DATA_PTR, data_ptr);
    }

    /// Offset 1 doubles as method-table pointer for objects and array
    /// length for arrays; callers know which from the type tag.
    pub fn array_length(&self, handle_addr: u32) -> u32 {
        self.word(handle_addr, offset::METHOD_TABLE_OR_LEN)
    }

    pub fn method_table_pointer(&self, handle_addr: u32) -> u32 {
        self.word(handle_addr, offset::METHOD_TABLE_OR_LEN)
    }

    pub fn mark(&self, handle_addr: u32) -> u32 {
        self.word(handle_addr, offset::MARK)
    }

    pub fn set_mark(&mut self, handle_addr: u32, mark: u32) {
        self.set_word(handle_addr, offset::MARK, mark);
    }

    pub fn handle_type(&self, handle_addr: u32) -> HandleType {
        HandleType::decode(self.word(handle_addr, offset::TYPE_TAG))
    }

    pub fn gray_link(&self, handle_addr: u32) -> u32 {
        self.word(handle_addr, offset::GRAY_LINK)
    }

    pub fn set_gray_link(&mut self, handle_addr: u32, link: u32) {
        self.set_word(handle_addr, offset::GRAY_LINK, link);
    }

    pub fn next_link(&self, handle_addr: u32) -> u32 {
        self.word(handle_addr, offset::NEXT_LINK)
    }

    pub fn use_list_head(&self) -> u32 {
        self.use_head
    }

    pub fn free_list_head(&self) -> u32 {
        self.free_head
    }

    /// Pop a handle from the free list, fill offsets 0-3, and thread it
    /// onto the use list. Returns `None` if the free list is exhausted
    /// (§3 "Handle cap" — OutOfMemory regardless of remaining heap bytes).
    pub fn alloc(
        &mut self,
        data_ptr: u32,
        method_table_or_len: u32,
        ty: HandleType,
        current_mark: u32,
    ) -> Option<u32> {
        if self.free_head == LIST_END {
            return None;
        }
        let addr = self.free_head;
        self.free_head = self.next_link(addr);

        self.set_word(addr, offset::DATA_PTR, data_ptr);
        self.set_word(addr, offset::METHOD_TABLE_OR_LEN, method_table_or_len);
        self.set_word(addr, offset::MARK, current_mark);
        self.set_word(addr, offset::TYPE_TAG, ty.encode());
        self.set_word(addr, offset::NEXT_LINK, self.use_head);
        // 0 means "not currently on the gray list" (§3 Handle, offset 5);
        // LIST_END is reserved for marking the tail of a non-empty chain.
        self.set_word(addr, offset::GRAY_LINK, 0);
        self.use_head = addr;
        self.live_count += 1;
        Some(addr)
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Rebuild the free and use lists from scratch by walking every handle
    /// and partitioning on `mark == current_mark` (§4.15 SWEEP). Handles
    /// that keep their mark remain on the use list in whatever order the
    /// walk visits them; callers that need use-list order sorted by data
    /// pointer (§4.15 COMPACT) call `sort_use_list_by_data_pointer` after.
    pub fn sweep(&mut self, current_mark: u32) {
        let mut new_use_head = LIST_END;
        let mut new_free_head = LIST_END;
        let mut live = 0usize;
        for idx in (1..self.capacity).rev() {
            let addr = (idx * HANDLE_WORDS) as u32;
            if self.word(addr, offset::DATA_PTR) == 0 {
                self.set_word(addr, offset::NEXT_LINK, new_free_head);
                new_free_head = addr;
                continue;
            }
            if self.word(addr, offset::MARK) == current_mark {
                self.set_word(addr, offset::NEXT_LINK, new_use_head);
                new_use_head = addr;
                live += 1;
            } else {
                self.set_word(addr, offset::DATA_PTR, 0);
                self.set_word(addr, offset::NEXT_LINK, new_free_head);
                new_free_head = addr;
            }
        }
        self.use_head = new_use_head;
        self.free_head = new_free_head;
        self.live_count = live;
    }

    /// Insertion sort of the use list by ascending data pointer (§4.15
    /// COMPACT: "near-sorted after first cycle" is the expected shape this
    /// is tuned for).
    pub fn sort_use_list_by_data_pointer(&mut self) {
        let mut nodes: Vec<u32> = Vec::with_capacity(self.live_count);
        let mut cur = self.use_head;
        while cur != LIST_END {
            nodes.push(cur);
            cur = self.next_link(cur);
        }
        for i in 1..nodes.len() {
            let mut j = i;
            while j > 0
                && self.data_pointer(nodes[j - 1]) > self.data_pointer(nodes[j])
            {
                nodes.swap(j - 1, j);
                j -= 1;
            }
        }
        for window in nodes.windows(2) {
            self.set_word(window[0], offset::NEXT_LINK, window[1]);
        }
        if let Some(&last) = nodes.last() {
            self.set_word(last, offset::NEXT_LINK, LIST_END);
        }
        self.use_head = nodes.first().copied().unwrap_or(LIST_END);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_zero_is_never_allocatable() {
        let t = HandleTable::new(4);
        assert!(t.is_free(0));
    }

    #[test]
    fn alloc_fills_offsets_and_threads_use_list() {
        let mut t = HandleTable::new(4);
        let h = t.alloc(100, 0, HandleType::Object, 1).unwrap();
        assert_eq!(t.data_pointer(h), 100);
        assert_eq!(t.mark(h), 1);
        assert_eq!(t.use_list_head(), h);
        assert!(!t.is_free(h));
    }

    #[test]
    fn free_list_exhaustion_returns_none() {
        let mut t = HandleTable::new(2); // index 0 reserved, only 1 usable
        assert!(t.alloc(8, 0, HandleType::Object, 1).is_some());
        assert!(t.alloc(16, 0, HandleType::Object, 1).is_none());
    }

    #[test]
    fn sweep_frees_handles_with_stale_mark() {
        let mut t = HandleTable::new(4);
        let h1 = t.alloc(8, 0, HandleType::Object, 1).unwrap();
        let _h2 = t.alloc(16, 0, HandleType::Object, 1).unwrap();
        t.set_mark(h1, 2); // survives to new mark
        t.sweep(2);
        assert_eq!(t.live_count(), 1);
        assert!(t.is_free(h1) == false);
    }

    #[test]
    fn sort_use_list_orders_by_data_pointer() {
        let mut t = HandleTable::new(4);
        t.alloc(24, 0, HandleType::Object, 1).unwrap();
        t.alloc(8, 0, HandleType::Object, 1).unwrap();
        t.alloc(16, 0, HandleType::Object, 1).unwrap();
        t.sort_use_list_by_data_pointer();
        let mut ptrs = Vec::new();
        let mut cur = t.use_list_head();
        while cur != LIST_END {
            ptrs.push(t.data_pointer(cur));
            cur = t.next_link(cur);
        }
        assert_eq!(ptrs, vec![8, 16, 24]);
    }
}
