/// Dataset catalog.
///
/// Maps dataset names to host nodes for the duration of one extraction run,
/// creating placeholder nodes for names the host does not know.
mod resource_catalog;

pub use resource_catalog::ResourceCatalog;
