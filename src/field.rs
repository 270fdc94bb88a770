//! Field descriptors and the arena that owns them

use serde::{Deserialize, Serialize};

use crate::value::{ValueShape, ValueType};

/// Non-owning handle to a descriptor in a [`FieldArena`].
///
/// A handle goes stale as soon as its descriptor is released; stale handles
/// resolve to `None` rather than to whatever reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId {
    index: u32,
    generation: u32,
}

/// One named header attribute: its type, requiredness, length policy and value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    /// Name as it appears on the left of the separator
    pub name: String,
    /// Declared external type
    pub value_type: ValueType,
    /// Whether a read fails when the field never appears
    pub required: bool,
    /// Name of the field whose value supplies this field's length
    pub depends_on: Option<String>,
    /// Element count (side length for matrices). Overwritten by the
    /// resolved length once the field has been decoded.
    pub length: usize,
    /// Set once a value was actually parsed (or supplied for writing)
    pub defined: bool,
    /// Stop scanning the header right after this field
    pub terminate_read: bool,
    /// Canonical numeric storage
    pub values: Vec<f64>,
    /// Storage for string-typed fields
    pub text: String,
}

impl FieldRecord {
    /// Create a read descriptor with no value yet
    pub fn read(name: impl Into<String>, value_type: ValueType, required: bool) -> Self {
        let length = match value_type.shape() {
            ValueShape::Scalar => 1,
            _ => 0,
        };
        Self {
            name: name.into(),
            value_type,
            required,
            depends_on: None,
            length,
            defined: false,
            terminate_read: false,
            values: Vec::new(),
            text: String::new(),
        }
    }

    /// Set the declared length
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Take the length from another field's value at decode time
    pub fn depending_on(mut self, field: impl Into<String>) -> Self {
        self.depends_on = Some(field.into());
        self
    }

    /// Stop the header scan after this field
    pub fn terminating(mut self) -> Self {
        self.terminate_read = true;
        self
    }

    /// Create a write descriptor holding one numeric value
    pub fn scalar(name: impl Into<String>, value_type: ValueType, value: f64) -> Self {
        let mut record = Self::read(name, value_type, false);
        record.values = vec![value];
        record.length = 1;
        record.defined = true;
        record
    }

    /// Create a write descriptor holding an array
    pub fn array(name: impl Into<String>, value_type: ValueType, values: &[f64]) -> Self {
        let mut record = Self::read(name, value_type, false);
        record.values = values.to_vec();
        record.length = values.len();
        record.defined = true;
        record
    }

    /// Create a write descriptor holding a `dim x dim` row-major matrix
    pub fn matrix(name: impl Into<String>, dim: usize, values: &[f64]) -> Self {
        let mut record = Self::read(name, ValueType::FloatMatrix, false);
        record.values = values.iter().copied().take(dim * dim).collect();
        record.length = dim;
        record.defined = true;
        record
    }

    /// Create a write descriptor holding text
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut record = Self::read(name, ValueType::String, false);
        record.length = text.len();
        record.text = text;
        record.defined = true;
        record
    }

    /// First numeric value, if any
    pub fn value(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Text value of a string field
    pub fn as_text(&self) -> &str {
        &self.text
    }

    /// Number of stored elements implied by the type and length
    pub fn element_count(&self) -> usize {
        match self.value_type.shape() {
            ValueShape::Scalar => 1,
            ValueShape::Array => self.length,
            ValueShape::Matrix => self.length * self.length,
            ValueShape::Text => self.text.len(),
        }
    }

    /// Forget any previously parsed value
    pub fn reset(&mut self) {
        self.defined = false;
        self.values.clear();
        self.text.clear();
    }
}

/// A header line that matched no descriptor, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalField {
    /// Field name
    pub name: String,
    /// Raw value text, never type-interpreted
    pub value: String,
}

impl AdditionalField {
    /// Length of the raw value text
    pub fn length(&self) -> usize {
        self.value.len()
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    record: Option<FieldRecord>,
}

/// Owns every descriptor; schemas and user lists hold [`FieldId`] handles only.
#[derive(Debug, Default)]
pub struct FieldArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl FieldArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a descriptor and hand back its handle
    pub fn insert(&mut self, record: FieldRecord) -> FieldId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some(record);
            return FieldId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            record: Some(record),
        });
        FieldId {
            index,
            generation: 0,
        }
    }

    /// Resolve a handle
    pub fn get(&self, id: FieldId) -> Option<&FieldRecord> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.record.as_ref())
    }

    /// Resolve a handle mutably
    pub fn get_mut(&mut self, id: FieldId) -> Option<&mut FieldRecord> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.record.as_mut())
    }

    /// Drop the descriptor behind `id`.
    ///
    /// Every outstanding copy of the handle goes stale. Releasing an already
    /// released handle is a no-op returning `None`.
    pub fn release(&mut self, id: FieldId) -> Option<FieldRecord> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let record = slot.record.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(record)
    }

    /// Number of live descriptors
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.record.is_some()).count()
    }

    /// Whether no descriptor is live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
