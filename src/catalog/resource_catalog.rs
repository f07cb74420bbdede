use std::collections::HashMap;

use tracing::info;

use crate::config::LinkerConfig;
use crate::errors::Result;
use crate::host::HostGraph;
use crate::types::*;

/// Run-scoped cache of dataset nodes keyed by exact name.
///
/// The datasets of the host are bulk-loaded on first use. Names missing
/// from the host get a placeholder node, created at most once per catalog
/// and reused by later runs.
pub struct ResourceCatalog {
    resolved_type: String,
    placeholder_type: String,
    /// Folder that owns placeholders; the referencing step when `None`.
    container: Option<ObjectId>,
    datasets: HashMap<String, ResourceNode>,
    loaded: bool,
    placeholders_created: usize,
}

impl ResourceCatalog {
    pub fn new(config: &LinkerConfig, container: Option<ObjectId>) -> Self {
        Self {
            resolved_type: config.resolved_dataset_type.clone(),
            placeholder_type: config.placeholder_type.clone(),
            container,
            datasets: HashMap::new(),
            loaded: false,
            placeholders_created: 0,
        }
    }

    /// Loads the host's resolved datasets and any placeholders already
    /// present. Only the first call does any work.
    pub fn load<H: HostGraph + ?Sized>(&mut self, host: &H) -> Result<()> {
        if self.loaded {
            return Ok(());
        }

        info!("loading datasets");
        // Placeholders left by an earlier run first, so a resolved dataset
        // of the same name takes precedence.
        let sources = [
            (&self.placeholder_type, ResourceOrigin::Placeholder),
            (&self.resolved_type, ResourceOrigin::Resolved),
        ];
        let mut found = Vec::new();
        for (type_name, origin) in sources {
            for object in host.objects_of_types(std::slice::from_ref(type_name))? {
                found.push(ResourceNode {
                    id: object.id,
                    name: object.name,
                    origin,
                    parent: object.parent,
                });
            }
        }
        for node in found {
            self.datasets.insert(node.name.clone(), node);
        }
        info!(count = self.datasets.len(), "datasets loaded");

        self.loaded = true;
        Ok(())
    }

    /// Returns the node for `name`, creating a placeholder in the host if
    /// the name is unknown.
    ///
    /// Placeholders are parented to the container folder, or to
    /// `fallback_parent` (normally the referencing step) when there is none.
    pub fn resolve_or_create<H: HostGraph + ?Sized>(
        &mut self,
        host: &mut H,
        name: &str,
        fallback_parent: &HostObject,
    ) -> Result<ResourceNode> {
        self.load(&*host)?;

        if let Some(node) = self.datasets.get(name) {
            return Ok(node.clone());
        }

        let parent = self
            .container
            .clone()
            .unwrap_or_else(|| fallback_parent.id.clone());
        let object = host.create_object(NewObject {
            name: name.to_string(),
            type_name: self.placeholder_type.clone(),
            parent,
        })?;
        info!(dataset = name, "created placeholder dataset");

        let node = ResourceNode {
            id: object.id,
            name: object.name,
            origin: ResourceOrigin::Placeholder,
            parent: object.parent,
        };
        self.datasets.insert(name.to_string(), node.clone());
        self.placeholders_created += 1;
        Ok(node)
    }

    /// Looks up a name without creating anything.
    pub fn get(&self, name: &str) -> Option<&ResourceNode> {
        self.datasets.get(name)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of placeholder nodes created so far.
    pub fn placeholders_created(&self) -> usize {
        self.placeholders_created
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
