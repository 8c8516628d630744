// This module implements types and data-layout sizing for the text IR. Types live in a flat
// table owned by the module and refer to each other through TypeId indices. DataLayout starts
// from LLVM's built-in alignment table and applies the specifications of an LLVM data-layout
// string on top (pointer sizes per address space, integer/float/vector ABI alignments,
// aggregate alignment). Endianness never changes a size, so `e`/`E` are accepted and dropped. Allocation sizes follow LLVM's rules: the store size of a
// type rounded up to its ABI alignment, integers without an exact entry borrowing the next
// larger entry, and structs laying each field at an offset aligned to that field unless the
// struct is packed. Opaque structs have no size, and neither does a type whose size does not
// fit in a u64.

//! Types and data-layout sizing.

use crate::core::{MemcheckError, MemcheckResult};
use std::fmt;

/// Index into [`super::TextIR::types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

/// A first-class type of the text IR.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int { bits: u32 },
    Half,
    BFloat,
    Float,
    Double,
    X86Fp80,
    Fp128,
    PpcFp128,
    Ptr { addr_space: u32 },
    Array { len: u64, elem: TypeId },
    Vector { len: u64, elem: TypeId },
    Struct {
        name: Option<String>,
        fields: Vec<TypeId>,
        packed: bool,
    },
    Opaque { name: String },
}

impl Type {
    /// Whether the type may be a vector element.
    pub fn is_vector_element(&self) -> bool {
        matches!(
            self,
            Type::Int { .. }
                | Type::Half
                | Type::BFloat
                | Type::Float
                | Type::Double
                | Type::X86Fp80
                | Type::Fp128
                | Type::PpcFp128
                | Type::Ptr { .. }
        )
    }
}

/// Layout rules for one address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PointerSpec {
    addr_space: u32,
    size_bits: u32,
    abi_bits: u32,
}

/// ABI alignment of a scalar width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AlignSpec {
    bits: u32,
    abi_bits: u32,
}

/// Target-specific size and alignment rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pointers: Vec<PointerSpec>,
    ints: Vec<AlignSpec>,
    floats: Vec<AlignSpec>,
    vectors: Vec<AlignSpec>,
    aggregate_abi_bits: u32,
}

impl DataLayout {
    /// Layout string clang uses for x86-64 Linux.
    pub const X86_64_LINUX: &'static str =
        "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128";

    /// LLVM's defaults, used for anything a layout string leaves out.
    pub fn llvm_default() -> Self {
        let spec = |bits, abi_bits| AlignSpec { bits, abi_bits };
        Self {
            pointers: vec![PointerSpec {
                addr_space: 0,
                size_bits: 64,
                abi_bits: 64,
            }],
            ints: vec![spec(1, 8), spec(8, 8), spec(16, 16), spec(32, 32), spec(64, 32)],
            floats: vec![spec(16, 16), spec(32, 32), spec(64, 64), spec(128, 128)],
            vectors: vec![spec(64, 64), spec(128, 128)],
            aggregate_abi_bits: 0,
        }
    }

    pub fn x86_64() -> Self {
        // The constant is known to parse.
        Self::parse(Self::X86_64_LINUX).unwrap_or_else(|_| Self::llvm_default())
    }

    /// Parse an LLVM data-layout string on top of the defaults.
    ///
    /// Endianness, mangling, native widths, stack and program address
    /// space specifications are accepted and ignored.
    pub fn parse(spec: &str) -> MemcheckResult<Self> {
        let mut layout = Self::llvm_default();
        for token in spec.split('-').filter(|t| !t.is_empty()) {
            layout.apply(token).map_err(|reason| MemcheckError::DataLayout {
                spec: token.to_string(),
                reason,
            })?;
        }
        Ok(layout)
    }

    fn apply(&mut self, token: &str) -> Result<(), String> {
        let mut fields = token.split(':');
        let head = fields.next().unwrap_or_default();
        let rest: Vec<&str> = fields.collect();

        match head.as_bytes().first() {
            Some(b'e') | Some(b'E') if head.len() == 1 => {}
            Some(b'p') => {
                let addr_space = parse_bits_or(&head[1..], 0)?;
                let size_bits = parse_bits(rest.first().copied(), "pointer size")?;
                let abi_bits = match rest.get(1) {
                    Some(abi) => parse_align(abi)?,
                    None => size_bits,
                };
                if size_bits == 0 || size_bits % 8 != 0 {
                    return Err(format!("pointer size {size_bits} is not a whole number of bytes"));
                }
                let spec = PointerSpec {
                    addr_space,
                    size_bits,
                    abi_bits,
                };
                match self.pointers.iter_mut().find(|p| p.addr_space == addr_space) {
                    Some(existing) => *existing = spec,
                    None => self.pointers.push(spec),
                }
            }
            Some(b'i') | Some(b'f') | Some(b'v') => {
                let bits = parse_bits(Some(&head[1..]), "type width")?;
                if bits == 0 {
                    return Err("type width must be non-zero".to_string());
                }
                let abi_bits = parse_align(rest.first().ok_or("missing ABI alignment")?)?;
                let table = match head.as_bytes()[0] {
                    b'i' => &mut self.ints,
                    b'f' => &mut self.floats,
                    _ => &mut self.vectors,
                };
                set_align(table, bits, abi_bits);
            }
            Some(b'a') if head == "a" || head == "a0" => {
                self.aggregate_abi_bits = parse_align(rest.first().ok_or("missing ABI alignment")?)?;
            }
            // m: mangling, n: native widths, S: stack, P/A/G: address spaces, F: function pointers
            Some(b'm') | Some(b'n') | Some(b'S') | Some(b'P') | Some(b'A') | Some(b'G')
            | Some(b'F') => {}
            _ => return Err("unknown specification".to_string()),
        }
        Ok(())
    }

    /// Pointer size in bytes for an address space.
    pub fn pointer_size(&self, addr_space: u32) -> u64 {
        u64::from(self.pointer_spec(addr_space).size_bits / 8)
    }

    fn pointer_spec(&self, addr_space: u32) -> PointerSpec {
        self.pointers
            .iter()
            .find(|p| p.addr_space == addr_space)
            .or_else(|| self.pointers.iter().find(|p| p.addr_space == 0))
            .copied()
            .unwrap_or(PointerSpec {
                addr_space: 0,
                size_bits: 64,
                abi_bits: 64,
            })
    }

    /// Bytes occupied by a value of `ty` in memory, padding included.
    ///
    /// `None` for opaque structs, aggregates containing one, and sizes that
    /// overflow a u64.
    pub fn alloc_size(&self, types: &[Type], ty: TypeId) -> Option<u64> {
        let size = self.store_size(types, ty)?;
        let align = self.abi_align(types, ty)?;
        align_to(size, align)
    }

    /// Bytes written by a store of `ty`, without tail padding.
    pub fn store_size(&self, types: &[Type], ty: TypeId) -> Option<u64> {
        match lookup(types, ty)? {
            Type::Array { len, elem } => len.checked_mul(self.alloc_size(types, *elem)?),
            Type::Struct { fields, packed, .. } => {
                self.struct_layout(types, fields, *packed).map(|(size, _)| size)
            }
            Type::Opaque { .. } => None,
            _ => self.scalar_bits(types, ty).map(|bits| bits.div_ceil(8)),
        }
    }

    /// ABI alignment of `ty` in bytes.
    pub fn abi_align(&self, types: &[Type], ty: TypeId) -> Option<u64> {
        let align = match lookup(types, ty)? {
            Type::Int { bits } => self.int_align(*bits),
            Type::Half | Type::BFloat => self.float_align(16),
            Type::Float => self.float_align(32),
            Type::Double => self.float_align(64),
            Type::X86Fp80 => self.float_align(80),
            Type::Fp128 | Type::PpcFp128 => self.float_align(128),
            Type::Ptr { addr_space } => u64::from(self.pointer_spec(*addr_space).abi_bits / 8),
            Type::Array { elem, .. } => self.abi_align(types, *elem)?,
            Type::Vector { .. } => {
                let bits = self.scalar_bits(types, ty)?;
                let exact = self
                    .vectors
                    .iter()
                    .find(|spec| u64::from(spec.bits) == bits)
                    .map(|spec| u64::from(spec.abi_bits / 8));
                exact.unwrap_or_else(|| bits.div_ceil(8).next_power_of_two())
            }
            Type::Struct { fields, packed, .. } => self.struct_layout(types, fields, *packed)?.1,
            Type::Opaque { .. } => return None,
        };
        Some(align.max(1))
    }

    /// Size and alignment of a struct with the given fields.
    fn struct_layout(&self, types: &[Type], fields: &[TypeId], packed: bool) -> Option<(u64, u64)> {
        let mut align = if packed {
            1
        } else {
            u64::from(self.aggregate_abi_bits / 8).max(1)
        };
        let mut offset = 0u64;
        for &field in fields {
            let field_align = if packed { 1 } else { self.abi_align(types, field)? };
            align = align.max(field_align);
            offset = align_to(offset, field_align)?.checked_add(self.alloc_size(types, field)?)?;
        }
        Some((align_to(offset, align)?, align))
    }

    /// Width in bits of a scalar or vector type.
    fn scalar_bits(&self, types: &[Type], ty: TypeId) -> Option<u64> {
        let bits = match lookup(types, ty)? {
            Type::Int { bits } => u64::from(*bits),
            Type::Half | Type::BFloat => 16,
            Type::Float => 32,
            Type::Double => 64,
            Type::X86Fp80 => 80,
            Type::Fp128 | Type::PpcFp128 => 128,
            Type::Ptr { addr_space } => u64::from(self.pointer_spec(*addr_space).size_bits),
            Type::Vector { len, elem } => len.checked_mul(self.scalar_bits(types, *elem)?)?,
            _ => return None,
        };
        Some(bits)
    }

    fn int_align(&self, bits: u32) -> u64 {
        let spec = self
            .ints
            .iter()
            .find(|spec| spec.bits == bits)
            .or_else(|| self.ints.iter().find(|spec| spec.bits > bits))
            .or_else(|| self.ints.last());
        match spec {
            Some(spec) => u64::from(spec.abi_bits / 8),
            None => natural_align(u64::from(bits)),
        }
    }

    fn float_align(&self, bits: u32) -> u64 {
        self.floats
            .iter()
            .find(|spec| spec.bits == bits)
            .map(|spec| u64::from(spec.abi_bits / 8))
            .unwrap_or_else(|| natural_align(u64::from(bits)))
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::x86_64()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int { bits } => write!(f, "i{bits}"),
            Type::Half => f.write_str("half"),
            Type::BFloat => f.write_str("bfloat"),
            Type::Float => f.write_str("float"),
            Type::Double => f.write_str("double"),
            Type::X86Fp80 => f.write_str("x86_fp80"),
            Type::Fp128 => f.write_str("fp128"),
            Type::PpcFp128 => f.write_str("ppc_fp128"),
            Type::Ptr { addr_space: 0 } => f.write_str("ptr"),
            Type::Ptr { addr_space } => write!(f, "ptr addrspace({addr_space})"),
            Type::Array { len, elem } => write!(f, "[{len} x #{}]", elem.0),
            Type::Vector { len, elem } => write!(f, "<{len} x #{}>", elem.0),
            Type::Struct { name: Some(name), .. } | Type::Opaque { name } => write!(f, "%{name}"),
            Type::Struct {
                name: None,
                fields,
                packed,
            } => {
                let fields: Vec<String> = fields.iter().map(|field| format!("#{}", field.0)).collect();
                if *packed {
                    write!(f, "<{{ {} }}>", fields.join(", "))
                } else {
                    write!(f, "{{ {} }}", fields.join(", "))
                }
            }
        }
    }
}

fn lookup(types: &[Type], ty: TypeId) -> Option<&Type> {
    types.get(ty.0 as usize)
}

fn align_to(value: u64, align: u64) -> Option<u64> {
    value.div_ceil(align).checked_mul(align)
}

fn natural_align(bits: u64) -> u64 {
    bits.div_ceil(8).next_power_of_two()
}

fn set_align(table: &mut Vec<AlignSpec>, bits: u32, abi_bits: u32) {
    match table.binary_search_by_key(&bits, |spec| spec.bits) {
        Ok(idx) => table[idx].abi_bits = abi_bits,
        Err(idx) => table.insert(idx, AlignSpec { bits, abi_bits }),
    }
}

fn parse_bits(text: Option<&str>, what: &str) -> Result<u32, String> {
    let text = text.ok_or_else(|| format!("missing {what}"))?;
    text.parse::<u32>()
        .map_err(|_| format!("invalid {what} '{text}'"))
}

fn parse_bits_or(text: &str, default: u32) -> Result<u32, String> {
    if text.is_empty() {
        Ok(default)
    } else {
        parse_bits(Some(text), "address space")
    }
}

fn parse_align(text: &str) -> Result<u32, String> {
    let bits = parse_bits(Some(text), "alignment")?;
    if bits % 8 != 0 {
        return Err(format!("alignment {bits} is not a whole number of bytes"));
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Table {
        types: Vec<Type>,
    }

    impl Table {
        fn new() -> Self {
            Self { types: Vec::new() }
        }

        fn add(&mut self, ty: Type) -> TypeId {
            self.types.push(ty);
            TypeId(self.types.len() as u32 - 1)
        }
    }

    #[test]
    fn test_integer_sizes() {
        let layout = DataLayout::x86_64();
        let mut table = Table::new();
        let cases = [(1, 1), (8, 1), (16, 2), (24, 4), (32, 4), (48, 8), (64, 8), (128, 16), (256, 32)];
        for (bits, expected) in cases {
            let ty = table.add(Type::Int { bits });
            assert_eq!(layout.alloc_size(&table.types, ty), Some(expected), "i{bits}");
        }
    }

    #[test]
    fn test_default_i64_alignment_differs_from_x86_64() {
        let mut table = Table::new();
        let i8 = table.add(Type::Int { bits: 8 });
        let i64 = table.add(Type::Int { bits: 64 });
        let pair = table.add(Type::Struct {
            name: None,
            fields: vec![i8, i64],
            packed: false,
        });

        assert_eq!(DataLayout::llvm_default().alloc_size(&table.types, pair), Some(12));
        assert_eq!(DataLayout::x86_64().alloc_size(&table.types, pair), Some(16));
    }

    #[test]
    fn test_float_sizes() {
        let layout = DataLayout::x86_64();
        let mut table = Table::new();
        let cases = [
            (Type::Half, 2),
            (Type::Float, 4),
            (Type::Double, 8),
            (Type::X86Fp80, 16),
            (Type::Fp128, 16),
        ];
        for (ty, expected) in cases {
            let id = table.add(ty.clone());
            assert_eq!(layout.alloc_size(&table.types, id), Some(expected), "{ty}");
        }
    }

    #[test]
    fn test_struct_padding_and_packing() {
        let layout = DataLayout::x86_64();
        let mut table = Table::new();
        let i8 = table.add(Type::Int { bits: 8 });
        let i32 = table.add(Type::Int { bits: 32 });
        let padded = table.add(Type::Struct {
            name: None,
            fields: vec![i8, i32, i8],
            packed: false,
        });
        let packed = table.add(Type::Struct {
            name: None,
            fields: vec![i8, i32, i8],
            packed: true,
        });
        let empty = table.add(Type::Struct {
            name: None,
            fields: Vec::new(),
            packed: false,
        });

        assert_eq!(layout.alloc_size(&table.types, padded), Some(12));
        assert_eq!(layout.alloc_size(&table.types, packed), Some(6));
        assert_eq!(layout.alloc_size(&table.types, empty), Some(0));
    }

    #[test]
    fn test_arrays_and_vectors() {
        let layout = DataLayout::x86_64();
        let mut table = Table::new();
        let i16 = table.add(Type::Int { bits: 16 });
        let float = table.add(Type::Float);
        let array = table.add(Type::Array { len: 3, elem: i16 });
        let vec4 = table.add(Type::Vector { len: 4, elem: float });
        let vec3 = table.add(Type::Vector { len: 3, elem: float });

        assert_eq!(layout.alloc_size(&table.types, array), Some(6));
        assert_eq!(layout.alloc_size(&table.types, vec4), Some(16));
        // 12 bytes of data, aligned to the next power of two.
        assert_eq!(layout.alloc_size(&table.types, vec3), Some(16));
    }

    #[test]
    fn test_pointer_address_spaces() {
        let layout = DataLayout::parse("e-p:64:64-p3:32:32").unwrap();
        let mut table = Table::new();
        let generic = table.add(Type::Ptr { addr_space: 0 });
        let local = table.add(Type::Ptr { addr_space: 3 });
        let unknown = table.add(Type::Ptr { addr_space: 7 });

        assert_eq!(layout.alloc_size(&table.types, generic), Some(8));
        assert_eq!(layout.alloc_size(&table.types, local), Some(4));
        assert_eq!(layout.alloc_size(&table.types, unknown), Some(8));
        assert_eq!(layout.pointer_size(3), 4);
    }

    #[test]
    fn test_opaque_has_no_size() {
        let layout = DataLayout::x86_64();
        let mut table = Table::new();
        let opaque = table.add(Type::Opaque {
            name: "handle".to_string(),
        });
        let array = table.add(Type::Array { len: 2, elem: opaque });

        assert_eq!(layout.alloc_size(&table.types, opaque), None);
        assert_eq!(layout.alloc_size(&table.types, array), None);
    }

    #[test]
    fn test_oversized_types_have_no_size() {
        let layout = DataLayout::x86_64();
        let mut table = Table::new();
        let i8 = table.add(Type::Int { bits: 8 });
        let i32 = table.add(Type::Int { bits: 32 });
        let huge = table.add(Type::Array { len: u64::MAX, elem: i8 });
        let trailing = table.add(Type::Struct {
            name: None,
            fields: vec![huge, i32],
            packed: false,
        });
        let twice = table.add(Type::Struct {
            name: None,
            fields: vec![huge, huge],
            packed: true,
        });
        let wide = table.add(Type::Array { len: u64::MAX, elem: i32 });

        assert_eq!(layout.alloc_size(&table.types, huge), Some(u64::MAX));
        // Aligning the i32 field past the array does not fit.
        assert_eq!(layout.alloc_size(&table.types, trailing), None);
        assert_eq!(layout.abi_align(&table.types, trailing), None);
        assert_eq!(layout.alloc_size(&table.types, twice), None);
        assert_eq!(layout.alloc_size(&table.types, wide), None);
    }

    #[test]
    fn test_layout_string_errors() {
        assert_eq!(DataLayout::parse("E-p:64:64").unwrap(), DataLayout::parse("e-p:64:64").unwrap());
        assert!(matches!(
            DataLayout::parse("i32:33"),
            Err(MemcheckError::DataLayout { .. })
        ));
        assert!(DataLayout::parse("q:1").is_err());
        assert!(DataLayout::parse("i64").is_err());
    }
}
