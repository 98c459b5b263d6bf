// This module defines TypeToken, the compact value type carried by every IR DAG node.
// A token is either one of a small closed set of primitives (no-type, unsigned
// integers of 8 to 64 bits, bool, pointer-to-each-of-those and a generic pointer) or an
// opaque reference to an out-of-line type descriptor. Primitives are stored inline and
// compare by value; descriptor handles are only meaningful to whoever allocated them.
// The numeric primitive discriminants are part of the bytecode format, so they are
// pinned with explicit values and decoded through Primitive::from_raw.

//! Type tokens for target-independent DAGs.

use std::fmt;

/// Primitive type classes understood by the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Primitive {
    #[default]
    None = 0,
    U8 = 1,
    U16 = 2,
    U32 = 3,
    U64 = 4,
    Bool = 5,
    PtrU8 = 6,
    PtrU16 = 7,
    PtrU32 = 8,
    PtrU64 = 9,
    PtrBool = 10,
    Ptr = 11,
}

impl Primitive {
    /// Every primitive class in discriminant order.
    pub const ALL: [Primitive; 12] = [
        Primitive::None,
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::Bool,
        Primitive::PtrU8,
        Primitive::PtrU16,
        Primitive::PtrU32,
        Primitive::PtrU64,
        Primitive::PtrBool,
        Primitive::Ptr,
    ];

    /// Decode a raw discriminant, as stored in bytecode.
    pub fn from_raw(raw: u64) -> Option<Self> {
        Self::ALL.get(usize::try_from(raw).ok()?).copied()
    }

    pub const fn raw(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Primitive::None => "NONE",
            Primitive::U8 => "U8",
            Primitive::U16 => "U16",
            Primitive::U32 => "U32",
            Primitive::U64 => "U64",
            Primitive::Bool => "BOOL",
            Primitive::PtrU8 => "P_U8",
            Primitive::PtrU16 => "P_U16",
            Primitive::PtrU32 => "P_U32",
            Primitive::PtrU64 => "P_U64",
            Primitive::PtrBool => "P_BOOL",
            Primitive::Ptr => "PTR",
        }
    }

    /// Whether this is one of the typed pointer classes (`P_U8` .. `P_BOOL`).
    pub const fn is_typed_pointer(self) -> bool {
        matches!(
            self,
            Primitive::PtrU8 | Primitive::PtrU16 | Primitive::PtrU32 | Primitive::PtrU64 | Primitive::PtrBool
        )
    }

    /// Integer widths and the generic pointer: the only classes a matcher may be narrowed to.
    pub const fn is_scalar_constraint(self) -> bool {
        matches!(
            self,
            Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64 | Primitive::Ptr
        )
    }

    /// Size in bytes of an immediate of this type, if it can carry one.
    pub const fn immediate_width(self) -> Option<usize> {
        match self {
            Primitive::U8 | Primitive::Bool => Some(1),
            Primitive::U16 => Some(2),
            Primitive::U32 => Some(4),
            Primitive::U64 => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle to an out-of-line type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescId(pub u32);

/// Value type of an IR node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeToken {
    Primitive(Primitive),
    Descriptor(TypeDescId),
}

impl TypeToken {
    pub const NONE: TypeToken = TypeToken::Primitive(Primitive::None);

    pub const fn is_primitive(self) -> bool {
        matches!(self, TypeToken::Primitive(_))
    }

    pub const fn primitive(self) -> Option<Primitive> {
        match self {
            TypeToken::Primitive(p) => Some(p),
            TypeToken::Descriptor(_) => None,
        }
    }

    pub const fn descriptor(self) -> Option<TypeDescId> {
        match self {
            TypeToken::Descriptor(d) => Some(d),
            TypeToken::Primitive(_) => None,
        }
    }

    /// True for the typed pointer classes that normalization folds into [`Primitive::Ptr`].
    pub const fn is_pointer(self) -> bool {
        match self {
            TypeToken::Primitive(p) => p.is_typed_pointer(),
            TypeToken::Descriptor(_) => false,
        }
    }
}

impl Default for TypeToken {
    fn default() -> Self {
        TypeToken::NONE
    }
}

impl From<Primitive> for TypeToken {
    fn from(p: Primitive) -> Self {
        TypeToken::Primitive(p)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeToken::Primitive(p) => write!(f, "{p}"),
            TypeToken::Descriptor(d) => write!(f, "desc#{}", d.0),
        }
    }
}
