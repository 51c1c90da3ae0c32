//! Method descriptors (§3 "Method descriptor"): the bytecode-space
//! metadata the frontend and GC need per method — where it starts in JBC
//! space, how long it is, its constant-pool pointer, and which fields the
//! collector must treat as references.

#[derive(Clone, Copy, Debug)]
pub struct MethodDescriptor {
    pub start_addr: u32,
    pub len_bytes: u32,
    pub constant_pool_ptr: u32,
    /// Bit `i` set means field `i` of objects whose method table points at
    /// this descriptor holds a reference the GC must trace (§4.15 MARK).
    pub gc_info: u32,
}

/// A flat table of method descriptors indexed by method-table offset, the
/// bytecode-space analogue of a classfile's method table.
#[derive(Default)]
pub struct MethodTable {
    methods: Vec<MethodDescriptor>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self { methods: Vec::new() }
    }

    pub fn register(&mut self, descriptor: MethodDescriptor) -> u32 {
        let offset = self.methods.len() as u32;
        self.methods.push(descriptor);
        offset
    }

    pub fn get(&self, offset: u32) -> Option<&MethodDescriptor> {
        self.methods.get(offset as usize)
    }

    /// Reference-typed field indices for the object type described by the
    /// descriptor at `offset`, derived from its gc-info bitmask.
    pub fn reference_fields(&self, offset: u32) -> Vec<u32> {
        let Some(desc) = self.get(offset) else {
            return Vec::new();
        };
        (0..32).filter(|i| desc.gc_info & (1 << i) != 0).collect()
    }
}
