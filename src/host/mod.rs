/// Access to the host application graph.
///
/// The extractor only ever talks to the host through [`HostGraph`]; the
/// in-memory [`MemoryGraph`] backs tests and embedding, while
/// [`crate::db::Database`] persists to SQLite.
mod memory;

pub use memory::MemoryGraph;

use crate::errors::Result;
use crate::types::{CallLink, HostObject, NewObject, ObjectId, ReferenceEdge};

/// Typed queries and mutations the extractor needs from the host graph.
pub trait HostGraph {
    /// Returns every object whose type is one of `types`.
    fn objects_of_types(&self, types: &[String]) -> Result<Vec<HostObject>>;

    /// Returns call links whose caller has type `caller_type` and whose callee
    /// is one of `callees`, with their source positions loaded.
    fn call_links(&self, caller_type: &str, callees: &[ObjectId]) -> Result<Vec<CallLink>>;

    /// Creates and persists a new object, returning it with its assigned ID.
    fn create_object(&mut self, object: NewObject) -> Result<HostObject>;

    /// Creates and persists a typed reference link.
    fn create_link(&mut self, edge: &ReferenceEdge) -> Result<()>;
}
