//! Per-type wire metadata and the process-wide descriptor table.
//!
//! Static call sites learn a type's wire kind from [`Described::KIND`] at
//! compile time. Struct codecs additionally need the ordered list of
//! visible fields and the emptiness flag; those are computed once per type,
//! cached process-wide, and never evicted. Two threads racing on the first
//! lookup for a type may both compute the descriptor; the insert is
//! idempotent and readers never wait on a computation in progress.

use std::any::TypeId;
use std::sync::{OnceLock, PoisonError, RwLock};

use hashbrown::HashMap;

use crate::encoding::Kind;

/// Types with a fixed wire kind.
///
/// Implemented for every primitive the codec supports and generated for
/// structs by `#[derive(EbeSerDe)]`.
pub trait Described {
    /// The wire kind this type encodes as. Also used as the element-kind
    /// byte when the type appears as an array element.
    const KIND: Kind;

    /// Builds the full descriptor. The default covers leaf types; struct
    /// derives override it with their field list.
    fn describe() -> Descriptor
    where
        Self: Sized,
    {
        Descriptor::leaf(std::any::type_name::<Self>(), Self::KIND)
    }
}

/// One visible struct field, in declaration order.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Field {
    /// Field name as declared (positional fields use their index).
    pub name: &'static str,
    /// Wire kind of the field's type.
    pub kind: Kind,
    /// Position among the visible fields.
    pub index: usize,
}

/// Cached wire metadata for one static type.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Descriptor {
    name: &'static str,
    kind: Kind,
    fields: Vec<Field>,
    empty: bool,
}

impl Descriptor {
    /// Descriptor for a non-struct type.
    pub fn leaf(name: &'static str, kind: Kind) -> Descriptor {
        Descriptor {
            name,
            kind,
            fields: Vec::new(),
            empty: false,
        }
    }

    /// Descriptor for a struct with the given visible fields.
    pub fn strukt(name: &'static str, fields: Vec<Field>) -> Descriptor {
        let empty = fields.is_empty();
        Descriptor {
            name,
            kind: Kind::Struct,
            fields,
            empty,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Visible fields, in wire order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// True for structs with no visible fields, which occupy zero bytes.
    pub fn is_empty(&self) -> bool {
        self.empty
    }
}

macro_rules! leaf_described {
    ($kind:expr, $($typ:ty),*) => {
        $(impl Described for $typ {
            const KIND: Kind = $kind;
        })*
    };
}

leaf_described!(Kind::UInt, u8, u16, u32, u64, usize);
leaf_described!(Kind::SInt, i8, i16, i32, i64, isize);
leaf_described!(Kind::Float, f32, f64, crate::float::Float);
leaf_described!(Kind::Boolean, bool);
leaf_described!(Kind::String, String, str);
leaf_described!(Kind::Buffer, bytes::Bytes);

impl<T: Described> Described for Vec<T> {
    const KIND: Kind = Kind::Array;
}

impl<T: Described> Described for [T] {
    const KIND: Kind = Kind::Array;
}

impl<T: Described, const N: usize> Described for [T; N] {
    const KIND: Kind = Kind::Array;
}

impl<K, V, S> Described for HashMap<K, V, S> {
    const KIND: Kind = Kind::Map;
}

// Wrappers are transparent on the wire.
impl<T: Described> Described for Option<T> {
    const KIND: Kind = T::KIND;
}

impl<T: Described + ?Sized> Described for Box<T> {
    const KIND: Kind = T::KIND;
}

impl<T: Described + ?Sized> Described for &T {
    const KIND: Kind = T::KIND;
}

type Table = RwLock<HashMap<TypeId, &'static Descriptor>>;

static TABLE: OnceLock<Table> = OnceLock::new();

fn table() -> &'static Table {
    TABLE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the cached descriptor for `T`, computing it on first use.
pub fn of<T: Described + 'static>() -> &'static Descriptor {
    let id = TypeId::of::<T>();
    {
        let read = table().read().unwrap_or_else(PoisonError::into_inner);
        if let Some(&desc) = read.get(&id) {
            return desc;
        }
    }
    // On a race the first insert wins; the table never shrinks, so every
    // returned reference stays valid.
    let computed: &'static Descriptor = Box::leak(Box::new(T::describe()));
    let mut write = table().write().unwrap_or_else(PoisonError::into_inner);
    *write.entry(id).or_insert(computed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_descriptors() {
        let d = of::<u32>();
        assert_eq!(d.kind(), Kind::UInt);
        assert!(!d.is_empty());
        assert_eq!(d.field_count(), 0);

        let d = of::<String>();
        assert_eq!(d.kind(), Kind::String);
    }

    #[test]
    fn lookups_are_cached() {
        let a = of::<i64>() as *const Descriptor;
        let b = of::<i64>() as *const Descriptor;
        assert_eq!(a, b);
    }

    #[test]
    fn concurrent_first_lookup() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| of::<Vec<bool>>() as *const Descriptor as usize))
            .collect();
        let mut seen: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        seen.dedup();
        // later lookups all observe whichever insert won
        assert_eq!(of::<Vec<bool>>() as *const Descriptor as usize, seen[0]);
    }
}
