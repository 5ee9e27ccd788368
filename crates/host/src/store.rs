use annot_model::{parse_value, serialize_value, PdfValue};

/// Read/write access to the persisted value.
pub trait ValueStore {
    fn read(&self) -> PdfValue;
    fn write(&mut self, value: &PdfValue);
}

/// Store keeping the value in memory, for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryValueStore {
    value: PdfValue,
}

impl MemoryValueStore {
    pub fn new(value: PdfValue) -> Self {
        Self { value }
    }
}

impl ValueStore for MemoryValueStore {
    fn read(&self) -> PdfValue {
        self.value.clone()
    }

    fn write(&mut self, value: &PdfValue) {
        self.value = value.clone();
    }
}

/// Host-side string slot holding the serialized value.
pub trait RawValueSlot {
    fn get(&self) -> Option<String>;
    fn set(&mut self, raw: &str);
}

/// Adapts a host string slot into a [`ValueStore`] through the wire format.
///
/// Reads are lenient: a missing or malformed slot yields the default value.
pub struct SlotValueStore<S: RawValueSlot> {
    slot: S,
}

impl<S: RawValueSlot> SlotValueStore<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    pub fn into_inner(self) -> S {
        self.slot
    }
}

impl<S: RawValueSlot> ValueStore for SlotValueStore<S> {
    fn read(&self) -> PdfValue {
        parse_value(self.slot.get().as_deref())
    }

    fn write(&mut self, value: &PdfValue) {
        self.slot.set(&serialize_value(value));
    }
}
