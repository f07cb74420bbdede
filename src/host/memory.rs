use std::collections::HashMap;

use crate::errors::{DsnLinksError, Result};
use crate::host::HostGraph;
use crate::types::*;

/// A call link as stored in the graph, by object index.
#[derive(Debug, Clone)]
struct StoredCall {
    caller: usize,
    callee: usize,
    positions: Vec<Position>,
}

/// In-memory host graph with indices by type and by endpoint.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    objects: Vec<HostObject>,
    by_id: HashMap<ObjectId, usize>,
    by_type: HashMap<String, Vec<usize>>,
    calls: Vec<StoredCall>,
    /// Call indices grouped by callee object index.
    calls_by_callee: HashMap<usize, Vec<usize>>,
    links: Vec<ReferenceEdge>,
    links_by_source: HashMap<ObjectId, Vec<usize>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object and returns it with its generated ID.
    pub fn add_object(
        &mut self,
        name: &str,
        type_name: &str,
        parent: Option<&str>,
    ) -> Result<HostObject> {
        let object = HostObject {
            id: generate_object_id(type_name, name, parent.unwrap_or_default()),
            name: name.to_string(),
            type_name: type_name.to_string(),
            parent: parent.map(str::to_string),
        };
        self.insert(object.clone())?;
        Ok(object)
    }

    /// Adds a call link between two existing objects.
    pub fn add_call(&mut self, caller: &str, callee: &str, positions: Vec<Position>) -> Result<()> {
        let caller = self.index_of(caller, "add_call")?;
        let callee = self.index_of(callee, "add_call")?;
        let idx = self.calls.len();
        self.calls.push(StoredCall {
            caller,
            callee,
            positions,
        });
        self.calls_by_callee.entry(callee).or_default().push(idx);
        Ok(())
    }

    /// Retrieves an object by ID.
    pub fn get_object(&self, id: &str) -> Option<&HostObject> {
        self.by_id.get(id).map(|&idx| &self.objects[idx])
    }

    /// Returns all objects of one type, in insertion order.
    pub fn objects_of_type(&self, type_name: &str) -> Vec<&HostObject> {
        self.by_type
            .get(type_name)
            .map(|idxs| idxs.iter().map(|&i| &self.objects[i]).collect())
            .unwrap_or_default()
    }

    /// Returns every reference link created so far, in creation order.
    pub fn reference_links(&self) -> &[ReferenceEdge] {
        &self.links
    }

    /// Returns the reference links leaving `source`, in creation order.
    pub fn links_from(&self, source: &str) -> Vec<&ReferenceEdge> {
        self.links_by_source
            .get(source)
            .map(|idxs| idxs.iter().map(|&i| &self.links[i]).collect())
            .unwrap_or_default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn insert(&mut self, object: HostObject) -> Result<()> {
        if self.by_id.contains_key(&object.id) {
            return Err(DsnLinksError::Host {
                message: format!("duplicate object id '{}' for '{}'", object.id, object.name),
                operation: "insert_object".to_string(),
            });
        }
        let idx = self.objects.len();
        self.by_id.insert(object.id.clone(), idx);
        self.by_type
            .entry(object.type_name.clone())
            .or_default()
            .push(idx);
        self.objects.push(object);
        Ok(())
    }

    fn index_of(&self, id: &str, operation: &str) -> Result<usize> {
        self.by_id.get(id).copied().ok_or_else(|| DsnLinksError::Host {
            message: format!("unknown object '{id}'"),
            operation: operation.to_string(),
        })
    }
}

impl HostGraph for MemoryGraph {
    fn objects_of_types(&self, types: &[String]) -> Result<Vec<HostObject>> {
        let mut idxs: Vec<usize> = types
            .iter()
            .filter_map(|t| self.by_type.get(t))
            .flatten()
            .copied()
            .collect();
        idxs.sort_unstable();
        idxs.dedup();
        Ok(idxs.into_iter().map(|i| self.objects[i].clone()).collect())
    }

    fn call_links(&self, caller_type: &str, callees: &[ObjectId]) -> Result<Vec<CallLink>> {
        let mut idxs: Vec<usize> = callees
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .filter_map(|callee| self.calls_by_callee.get(callee))
            .flatten()
            .copied()
            .collect();
        idxs.sort_unstable();
        idxs.dedup();

        Ok(idxs
            .into_iter()
            .map(|i| &self.calls[i])
            .filter(|call| self.objects[call.caller].type_name == caller_type)
            .map(|call| CallLink {
                caller: self.objects[call.caller].clone(),
                callee: self.objects[call.callee].clone(),
                positions: call.positions.clone(),
            })
            .collect())
    }

    fn create_object(&mut self, object: NewObject) -> Result<HostObject> {
        self.add_object(&object.name, &object.type_name, Some(object.parent.as_str()))
    }

    fn create_link(&mut self, edge: &ReferenceEdge) -> Result<()> {
        self.index_of(&edge.source, "create_link")?;
        self.index_of(&edge.target, "create_link")?;
        let idx = self.links.len();
        self.links_by_source
            .entry(edge.source.clone())
            .or_default()
            .push(idx);
        self.links.push(edge.clone());
        Ok(())
    }
}
