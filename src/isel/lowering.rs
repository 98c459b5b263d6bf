//! Type lowering tables.
//!
//! A [`TypeLowering`] maps every abstract primitive class to exactly one
//! target type. The typed pointer classes share the target's pointer mapping.

use crate::core::types::{Primitive, TypeToken};

/// Total map from IR primitive classes to a target's type values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLowering<T> {
    pub none: T,
    pub u8: T,
    pub u16: T,
    pub u32: T,
    pub u64: T,
    pub bool: T,
    pub ptr: T,
}

impl<T: Copy> TypeLowering<T> {
    pub fn lower(&self, primitive: Primitive) -> T {
        match primitive {
            Primitive::None => self.none,
            Primitive::U8 => self.u8,
            Primitive::U16 => self.u16,
            Primitive::U32 => self.u32,
            Primitive::U64 => self.u64,
            Primitive::Bool => self.bool,
            Primitive::PtrU8
            | Primitive::PtrU16
            | Primitive::PtrU32
            | Primitive::PtrU64
            | Primitive::PtrBool
            | Primitive::Ptr => self.ptr,
        }
    }

    /// Lower a token; descriptor references have no target equivalent.
    pub fn lower_token(&self, token: TypeToken) -> Option<T> {
        token.primitive().map(|p| self.lower(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TypeDescId;

    const TABLE: TypeLowering<u8> = TypeLowering {
        none: 0,
        u8: 1,
        u16: 2,
        u32: 3,
        u64: 4,
        bool: 5,
        ptr: 6,
    };

    #[test]
    fn test_every_class_is_mapped() {
        let lowered: Vec<u8> = Primitive::ALL.iter().map(|&p| TABLE.lower(p)).collect();
        assert_eq!(lowered, vec![0, 1, 2, 3, 4, 5, 6, 6, 6, 6, 6, 6]);
    }

    #[test]
    fn test_descriptor_does_not_lower() {
        assert_eq!(TABLE.lower_token(TypeToken::Descriptor(TypeDescId(1))), None);
        assert_eq!(TABLE.lower_token(Primitive::U16.into()), Some(2));
    }
}
