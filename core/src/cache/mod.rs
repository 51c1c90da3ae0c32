//! Semantic caches (§4.6-§4.8): method cache (M$), object cache (O$), and
//! array cache (A$). Each is fully-associative with FIFO replacement and
//! participates in the cross-core snoop fabric (§4.13).

pub mod array_cache;
pub mod method_cache;
pub mod object_cache;

pub use array_cache::ArrayCache;
pub use method_cache::MethodCache;
pub use object_cache::ObjectCache;
