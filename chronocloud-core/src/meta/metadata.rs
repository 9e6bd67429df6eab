use std::{any::Any, collections::BTreeMap, fmt::Display};

/// Trait for metadata that accompanies a projected raster. Metadata is persisted as a flat map of string
/// tags next to the pixel data, and individual entries can be queried by name with their natural type
pub trait Metadata: Display {
    /// Returns all metadata entries as string tags, keyed by tag name
    fn tags(&self) -> BTreeMap<String, String>;
    /// Returns the value of the metadata field named `field_name`, if it exists
    fn get_named_field(&self, field_name: &str) -> Option<Box<dyn Any>>;
}
