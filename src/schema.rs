//! Ordered field schemas

use crate::field::{FieldArena, FieldId, FieldRecord};

/// An ordered sequence of descriptor handles.
///
/// Order decides both parsing precedence (the first descriptor with a
/// matching name wins) and the line order on write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldId>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handle
    pub fn push(&mut self, id: FieldId) {
        self.fields.push(id);
    }

    /// All handles, in order
    pub fn ids(&self) -> &[FieldId] {
        &self.fields
    }

    /// Number of handles
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema is empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First descriptor named `name`
    pub fn find(&self, arena: &FieldArena, name: &str) -> Option<FieldId> {
        self.fields
            .iter()
            .copied()
            .find(|&id| arena.get(id).is_some_and(|r| r.name == name))
    }

    /// First descriptor named `name`, if it was parsed or supplied
    pub fn defined<'a>(&self, arena: &'a FieldArena, name: &str) -> Option<&'a FieldRecord> {
        self.find(arena, name)
            .and_then(|id| arena.get(id))
            .filter(|r| r.defined)
    }

    /// Resolved descriptors, in order. Stale handles are skipped.
    pub fn records<'a>(&'a self, arena: &'a FieldArena) -> impl Iterator<Item = &'a FieldRecord> + 'a {
        self.fields.iter().filter_map(move |&id| arena.get(id))
    }

    /// Names of the resolved descriptors, in order
    pub fn names(&self, arena: &FieldArena) -> Vec<String> {
        self.records(arena).map(|r| r.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    #[test]
    fn test_find_prefers_first_match() {
        let mut arena = FieldArena::new();
        let mut schema = Schema::new();
        let first = arena.insert(FieldRecord::read("Name", ValueType::String, false));
        let second = arena.insert(FieldRecord::read("Name", ValueType::Int, false));
        schema.push(first);
        schema.push(second);

        assert_eq!(schema.find(&arena, "Name"), Some(first));
        assert_eq!(schema.find(&arena, "Missing"), None);
    }

    #[test]
    fn test_defined_filters_unparsed() {
        let mut arena = FieldArena::new();
        let mut schema = Schema::new();
        schema.push(arena.insert(FieldRecord::read("ID", ValueType::Int, false)));
        schema.push(arena.insert(FieldRecord::scalar("NDims", ValueType::Int, 3.0)));

        assert!(schema.defined(&arena, "ID").is_none());
        assert_eq!(schema.defined(&arena, "NDims").and_then(|r| r.value()), Some(3.0));
    }

    #[test]
    fn test_records_skip_released() {
        let mut arena = FieldArena::new();
        let mut schema = Schema::new();
        let a = arena.insert(FieldRecord::read("A", ValueType::Int, false));
        schema.push(a);
        schema.push(arena.insert(FieldRecord::read("B", ValueType::Int, false)));
        arena.release(a);

        assert_eq!(schema.names(&arena), vec!["B".to_string()]);
        assert_eq!(schema.len(), 2);
    }
}
