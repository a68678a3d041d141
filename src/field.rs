//! Binary field model for the firmware asset image.
//!
//! Inline fields live inside a Struct body; out-of-line objects (Struct and
//! String bodies) live in an [`Arena`] and are referenced by [`ObjectId`].
//! Identity is the arena id: two value-equal objects at different ids are
//! placed twice (the firmware format does no deduplication).
//!
//! Layout rules: 2-byte fields align to a 2-byte boundary, 4-byte-or-larger
//! fields to a 4-byte boundary, and every object body is padded to a multiple
//! of 4. `pack_object` reproduces byte-for-byte the layout `finish` computed.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub enum Field {
    UInt8(u8),
    UInt16(u16),
    /// Two's complement, encoded via 65536 wrap for negatives.
    Int16(i16),
    /// Raw bytes, end-padded to a multiple of 4.
    Bytes(Vec<u8>),
    /// Inline u32 pointer to an out-of-line object; 0 when `None`.
    Ptr(Option<ObjectId>),
    /// Inline `[count:u32][first_item_offset:u32]` descriptor. Items must be
    /// discovered contiguously in addition order; the linker's breadth-first
    /// traversal guarantees that.
    List(Vec<ObjectId>),
}

impl Field {
    pub fn size(&self) -> u32 {
        match self {
            Field::UInt8(_) => 1,
            Field::UInt16(_) | Field::Int16(_) => 2,
            Field::Bytes(b) => pad4(b.len() as u32),
            Field::Ptr(_) => 4,
            Field::List(_) => 8,
        }
    }

    fn alignment(&self) -> u32 {
        match self.size() {
            0 | 1 => 1,
            2 | 3 => 2,
            _ => 4,
        }
    }

    fn referenced(&self, out: &mut Vec<ObjectId>) {
        match self {
            Field::UInt8(_) | Field::UInt16(_) | Field::Int16(_) | Field::Bytes(_) => {}
            Field::Ptr(id) => {
                if let Some(id) = id {
                    out.push(*id);
                }
            }
            Field::List(items) => out.extend_from_slice(items),
        }
    }

    fn pack_into(&self, arena: &Arena, out: &mut Vec<u8>) {
        match self {
            Field::UInt8(v) => out.push(*v),
            Field::UInt16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Field::Int16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Field::Bytes(b) => {
                let start = out.len();
                out.extend_from_slice(b);
                out.resize(start + pad4(b.len() as u32) as usize, 0);
            }
            Field::Ptr(id) => {
                let offset = id.map_or(0, |id| arena.object_offset(id));
                out.extend_from_slice(&offset.to_le_bytes());
            }
            Field::List(items) => {
                out.extend_from_slice(&(items.len() as u32).to_le_bytes());
                let first = items.first().map_or(0, |id| arena.object_offset(*id));
                out.extend_from_slice(&first.to_le_bytes());
            }
        }
    }
}

#[derive(Clone, Debug)]
pub enum ObjectBody {
    Struct(Vec<Field>),
    /// Raw character bytes; packed NUL-terminated and padded to 4.
    String(Vec<u8>),
}

#[derive(Clone, Debug)]
struct ArenaObject {
    body: ObjectBody,
    object_offset: u32,
    object_size: u32,
}

/// Owns every out-of-line object built during one serialization pass.
#[derive(Debug, Default)]
pub struct Arena {
    objects: Vec<ArenaObject>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_struct(&mut self, fields: Vec<Field>) -> ObjectId {
        self.add(ObjectBody::Struct(fields))
    }

    pub fn add_string(&mut self, value: &str) -> ObjectId {
        self.add(ObjectBody::String(value.as_bytes().to_vec()))
    }

    fn add(&mut self, body: ObjectBody) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(ArenaObject {
            body,
            object_offset: 0,
            object_size: 0,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object_offset(&self, id: ObjectId) -> u32 {
        self.objects[id.index()].object_offset
    }

    pub fn object_size(&self, id: ObjectId) -> u32 {
        self.objects[id.index()].object_size
    }

    pub(crate) fn set_object_offset(&mut self, id: ObjectId, offset: u32) {
        self.objects[id.index()].object_offset = offset;
    }

    pub(crate) fn referenced(&self, id: ObjectId, out: &mut Vec<ObjectId>) {
        match &self.objects[id.index()].body {
            ObjectBody::Struct(fields) => {
                for field in fields {
                    field.referenced(out);
                }
            }
            ObjectBody::String(_) => {}
        }
    }

    /// Computes the object's encoded size from its own fields. Sizes never
    /// depend on other objects, so finish order is free.
    pub fn finish(&mut self, id: ObjectId) {
        let size = match &self.objects[id.index()].body {
            ObjectBody::Struct(fields) => {
                let mut offset = 0u32;
                for field in fields {
                    offset = align_to(offset, field.alignment());
                    offset += field.size();
                }
                pad4(offset)
            }
            ObjectBody::String(bytes) => pad4(bytes.len() as u32 + 1),
        };
        self.objects[id.index()].object_size = size;
    }

    /// Emits the object's body bytes, re-walking fields with the same padding
    /// `finish` accounted for.
    pub fn pack_object(&self, id: ObjectId) -> Vec<u8> {
        match &self.objects[id.index()].body {
            ObjectBody::Struct(fields) => {
                let mut out = Vec::new();
                for field in fields {
                    let aligned = align_to(out.len() as u32, field.alignment());
                    out.resize(aligned as usize, 0);
                    field.pack_into(self, &mut out);
                }
                let padded = pad4(out.len() as u32);
                out.resize(padded as usize, 0);
                out
            }
            ObjectBody::String(bytes) => {
                let mut out = bytes.clone();
                out.push(0);
                let padded = pad4(out.len() as u32);
                out.resize(padded as usize, 0);
                out
            }
        }
    }
}

fn align_to(offset: u32, alignment: u32) -> u32 {
    debug_assert!(alignment.is_power_of_two());
    (offset + alignment - 1) & !(alignment - 1)
}

fn pad4(len: u32) -> u32 {
    align_to(len, 4)
}
