//! Semantic tables and type queries.
//!
//! Static descriptions of the built-in base types, the implicit-cast ranking
//! used for call resolution and conversion checks, the binary-operator result
//! lookup, and member/swizzle typing. The tables are consulted both while
//! parsing (expression typing) and while emitting (cast decisions).

pub mod intrinsics;

use crate::ast::{BaseType, BinaryOp, Module, Type};
use crate::intern::Name;

/// Scalar families of the numeric base types, in cast-rank table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NumericType {
    Float,
    Half,
    Bool,
    Int,
    Uint,
}

/// Shape and family description of a base type.
#[derive(Debug, Clone, Copy)]
pub struct BaseTypeInfo {
    /// HLSL spelling, also used in diagnostics.
    pub type_name: &'static str,
    /// `None` for non-numeric types.
    pub numeric: Option<NumericType>,
    pub components: u8,
    pub dimensions: u8,
    pub height: u8,
}

const fn info_entry(
    type_name: &'static str,
    numeric: Option<NumericType>,
    components: u8,
    dimensions: u8,
    height: u8,
) -> BaseTypeInfo {
    BaseTypeInfo {
        type_name,
        numeric,
        components,
        dimensions,
        height,
    }
}

/// Indexed by `BaseType as usize`.
const BASE_TYPE_INFO: [BaseTypeInfo; 27] = [
    info_entry("unknown type", None, 0, 0, 0),                  // Unknown
    info_entry("void", None, 0, 0, 0),                          // Void
    info_entry("float", Some(NumericType::Float), 1, 0, 1),     // Float
    info_entry("float2", Some(NumericType::Float), 2, 1, 1),    // Float2
    info_entry("float3", Some(NumericType::Float), 3, 1, 3),    // Float3
    info_entry("float4", Some(NumericType::Float), 4, 1, 4),    // Float4
    info_entry("float3x3", Some(NumericType::Float), 3, 2, 3),  // Float3x3
    info_entry("float4x4", Some(NumericType::Float), 4, 2, 4),  // Float4x4
    info_entry("half", Some(NumericType::Half), 1, 0, 1),       // Half
    info_entry("half2", Some(NumericType::Half), 2, 1, 1),      // Half2
    info_entry("half3", Some(NumericType::Half), 3, 1, 1),      // Half3
    info_entry("half4", Some(NumericType::Half), 4, 1, 1),      // Half4
    info_entry("half3x3", Some(NumericType::Half), 3, 2, 3),    // Half3x3
    info_entry("half4x4", Some(NumericType::Half), 4, 2, 4),    // Half4x4
    info_entry("bool", Some(NumericType::Bool), 1, 0, 1),       // Bool
    info_entry("int", Some(NumericType::Int), 1, 0, 1),         // Int
    info_entry("int2", Some(NumericType::Int), 2, 1, 1),        // Int2
    info_entry("int3", Some(NumericType::Int), 3, 1, 1),        // Int3
    info_entry("int4", Some(NumericType::Int), 4, 1, 1),        // Int4
    info_entry("uint", Some(NumericType::Uint), 1, 0, 1),       // Uint
    info_entry("uint2", Some(NumericType::Uint), 2, 1, 1),      // Uint2
    info_entry("uint3", Some(NumericType::Uint), 3, 1, 1),      // Uint3
    info_entry("uint4", Some(NumericType::Uint), 4, 1, 1),      // Uint4
    info_entry("texture", None, 1, 0, 0),                       // Texture
    info_entry("sampler2D", None, 1, 0, 0),                     // Sampler2D
    info_entry("samplerCUBE", None, 1, 0, 0),                   // SamplerCube
    info_entry("user defined", None, 1, 0, 0),                  // UserDefined
];

#[inline]
pub fn info(base: BaseType) -> &'static BaseTypeInfo {
    &BASE_TYPE_INFO[base as usize]
}

/// Conversion cost between numeric families, rows = source, cols =
/// destination, order {Float, Half, Bool, Int, Uint}. float→int/uint at 4 is
/// cheaper than int→bool at 5, matching HLSL's permissive conversions.
const NUMBER_TYPE_RANK: [[i32; 5]; 5] = [
    //F  H  B  I  U
    [0, 4, 4, 4, 4], // Float
    [1, 0, 4, 4, 4], // Half
    [5, 5, 0, 5, 5], // Bool
    [5, 5, 4, 0, 3], // Int
    [5, 5, 4, 2, 0], // Uint
];

/// Result types of arithmetic binary operators over the numeric subrange.
mod binary_table {
    use crate::ast::BaseType::{self, *};

    #[rustfmt::skip]
    pub const BINARY_OP: [[BaseType; BaseType::NUMERIC_COUNT]; BaseType::NUMERIC_COUNT] = [
        // Float
        [Float, Float2, Float3, Float4, Float3x3, Float4x4, Float, Float2, Float3, Float4,
         Float3x3, Float4x4, Float, Float, Float2, Float3, Float4, Float, Float2, Float3, Float4],
        // Float2
        [Float2, Float2, Float2, Float2, Unknown, Unknown, Float2, Float2, Float2, Float2,
         Unknown, Unknown, Float2, Float2, Float2, Float2, Float2, Float2, Float2, Float2, Float2],
        // Float3
        [Float3, Float2, Float3, Float3, Unknown, Unknown, Float3, Float2, Float3, Float3,
         Unknown, Unknown, Float3, Float3, Float2, Float3, Float3, Float3, Float2, Float3, Float3],
        // Float4
        [Float4, Float2, Float3, Float4, Unknown, Unknown, Float4, Float2, Float3, Float4,
         Unknown, Unknown, Float4, Float4, Float2, Float3, Float4, Float4, Float2, Float3, Float4],
        // Float3x3
        [Float3x3, Unknown, Unknown, Unknown, Float3x3, Float3x3, Float3x3, Unknown, Unknown, Unknown,
         Float3x3, Float3x3, Float3x3, Float3x3, Unknown, Unknown, Unknown, Float3x3, Unknown, Unknown, Unknown],
        // Float4x4
        [Float4x4, Unknown, Unknown, Unknown, Float3x3, Float4x4, Float4x4, Unknown, Unknown, Unknown,
         Float3x3, Float4x4, Float4x4, Float4x4, Unknown, Unknown, Unknown, Float4x4, Unknown, Unknown, Unknown],
        // Half
        [Float, Float2, Float3, Float4, Float3x3, Float4x4, Half, Half2, Half3, Half4,
         Half3x3, Half4x4, Half, Half, Half2, Half3, Half4, Half, Half2, Half3, Half4],
        // Half2
        [Float2, Float2, Float2, Float2, Unknown, Unknown, Half2, Half2, Half2, Half2,
         Unknown, Unknown, Half2, Half2, Half2, Half2, Half2, Half2, Half2, Half2, Half2],
        // Half3
        [Float3, Float2, Float3, Float3, Unknown, Unknown, Half3, Half2, Half3, Half3,
         Unknown, Unknown, Half3, Half3, Half2, Half3, Half3, Half3, Half2, Half3, Half3],
        // Half4
        [Float4, Float2, Float3, Float4, Unknown, Unknown, Half4, Half2, Half3, Half4,
         Unknown, Unknown, Half4, Half4, Half2, Half3, Half4, Half4, Half2, Half3, Half4],
        // Half3x3
        [Float3x3, Unknown, Unknown, Unknown, Float3x3, Float3x3, Half3x3, Unknown, Unknown, Unknown,
         Half3x3, Half3x3, Half3x3, Half3x3, Unknown, Unknown, Unknown, Half3x3, Unknown, Unknown, Unknown],
        // Half4x4
        [Float4x4, Unknown, Unknown, Unknown, Float3x3, Float4x4, Half4x4, Unknown, Unknown, Unknown,
         Half3x3, Half4x4, Half4x4, Half4x4, Unknown, Unknown, Unknown, Half4x4, Unknown, Unknown, Unknown],
        // Bool
        [Float, Float2, Float3, Float4, Float3x3, Float4x4, Half, Half2, Half3, Half4,
         Half3x3, Half4x4, Int, Int, Int2, Int3, Int4, Uint, Uint2, Uint3, Uint4],
        // Int
        [Float, Float2, Float3, Float4, Float3x3, Float4x4, Half, Half2, Half3, Half4,
         Half3x3, Half4x4, Int, Int, Int2, Int3, Int4, Uint, Uint2, Uint3, Uint4],
        // Int2
        [Float2, Float2, Float2, Float2, Unknown, Unknown, Half2, Half2, Half2, Half2,
         Unknown, Unknown, Int2, Int2, Int2, Int2, Int2, Uint2, Uint2, Uint2, Uint2],
        // Int3
        [Float3, Float2, Float3, Float3, Unknown, Unknown, Half3, Half2, Half3, Half3,
         Unknown, Unknown, Int3, Int3, Int2, Int3, Int3, Uint3, Uint2, Uint3, Uint3],
        // Int4
        [Float4, Float2, Float3, Float4, Unknown, Unknown, Half4, Half2, Half3, Half4,
         Unknown, Unknown, Int4, Int4, Int2, Int3, Int4, Uint4, Uint2, Uint3, Uint4],
        // Uint
        [Float, Float2, Float3, Float4, Float3x3, Float4x4, Half, Half2, Half3, Half4,
         Half3x3, Half4x4, Uint, Uint, Uint2, Uint3, Uint4, Uint, Uint2, Uint3, Uint4],
        // Uint2
        [Float2, Float2, Float2, Float2, Unknown, Unknown, Half2, Half2, Half2, Half2,
         Unknown, Unknown, Uint2, Uint2, Uint2, Uint2, Uint2, Uint2, Uint2, Uint2, Uint2],
        // Uint3
        [Float3, Float2, Float3, Float3, Unknown, Unknown, Half3, Half2, Half3, Half3,
         Unknown, Unknown, Uint3, Uint3, Uint2, Uint3, Uint3, Uint3, Uint2, Uint3, Uint3],
        // Uint4
        [Float4, Float2, Float3, Float4, Unknown, Unknown, Half4, Half2, Half3, Half4,
         Unknown, Unknown, Uint4, Uint4, Uint2, Uint3, Uint4, Uint4, Uint2, Uint3, Uint4],
    ];
}

/// Quality of the implicit conversion from `src` to `dst`. Lower is better;
/// -1 means the conversion is impossible.
///
/// Result bits: `T RRR P` (truncation, conversion rank, dimension promotion).
pub fn cast_rank(src: &Type, dst: &Type) -> i32 {
    if src.array != dst.array || src.array_size != dst.array_size {
        return -1;
    }

    if src.base == BaseType::UserDefined && dst.base == BaseType::UserDefined {
        return if src.type_name == dst.type_name { 0 } else { -1 };
    }

    if src.base == dst.base {
        return 0;
    }

    let src_info = info(src.base);
    let dst_info = info(dst.base);
    let (Some(src_numeric), Some(dst_numeric)) = (src_info.numeric, dst_info.numeric) else {
        return -1;
    };

    let mut result = NUMBER_TYPE_RANK[src_numeric as usize][dst_numeric as usize] << 1;

    if src_info.dimensions == 0 && dst_info.dimensions > 0 {
        // Scalar dimension promotion.
        result |= 1 << 0;
    } else if (src_info.dimensions == dst_info.dimensions
        && src_info.components > dst_info.components)
        || (src_info.dimensions > 0 && dst_info.dimensions == 0)
    {
        // Truncation.
        result |= 1 << 4;
    } else if src_info.dimensions != dst_info.dimensions
        || src_info.components != dst_info.components
    {
        return -1;
    }

    result
}

/// Result type of a binary operator, or `None` when no operator exists for
/// the operand types. Logical and comparison operators produce `bool`;
/// arithmetic goes through the result table.
pub fn binary_op_result_type(op: BinaryOp, left: &Type, right: &Type) -> Option<Type> {
    if !left.base.is_numeric() || left.array || !right.base.is_numeric() || right.array {
        return None;
    }

    let base = if op.is_boolean() {
        BaseType::Bool
    } else {
        binary_table::BINARY_OP[left.base.numeric_index()][right.base.numeric_index()]
    };

    (base != BaseType::Unknown).then(|| Type::new(base))
}

/// Readable name of a type for diagnostics.
pub fn type_name<'m>(module: &'m Module, ty: &Type) -> &'m str {
    match ty.type_name {
        Some(name) if ty.base == BaseType::UserDefined => module.name(name),
        _ => info(ty.base).type_name,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberTypeError {
    /// A bad component letter or an over-long swizzle.
    InvalidSwizzle,
    /// No such struct field / matrix element / member at all.
    NoSuchMember,
}

const FLOAT_BY_WIDTH: [BaseType; 4] = [
    BaseType::Float,
    BaseType::Float2,
    BaseType::Float3,
    BaseType::Float4,
];
const HALF_BY_WIDTH: [BaseType; 4] = [
    BaseType::Half,
    BaseType::Half2,
    BaseType::Half3,
    BaseType::Half4,
];
const INT_BY_WIDTH: [BaseType; 4] = [
    BaseType::Int,
    BaseType::Int2,
    BaseType::Int3,
    BaseType::Int4,
];
const UINT_BY_WIDTH: [BaseType; 4] = [
    BaseType::Uint,
    BaseType::Uint2,
    BaseType::Uint3,
    BaseType::Uint4,
];

/// Type of `object.field`: a struct field, a vector/scalar swizzle, or a
/// chain of matrix element selectors (`_m00` zero-based, `_11` one-based).
pub fn member_type(
    module: &Module,
    object: &Type,
    field: Name,
) -> std::result::Result<Type, MemberTypeError> {
    if object.base == BaseType::UserDefined {
        let structure = object
            .type_name
            .and_then(|name| module.find_struct(name))
            .ok_or(MemberTypeError::NoSuchMember)?;
        return module
            .fields(structure.fields)
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.ty)
            .ok_or(MemberTypeError::NoSuchMember);
    }

    let object_info = info(object.base);
    let Some(numeric) = object_info.numeric else {
        return Err(MemberTypeError::NoSuchMember);
    };

    let field_str = module.name(field);
    let swizzle_len;

    if object_info.dimensions <= 1 {
        // Swizzle over a scalar or vector.
        if !field_str
            .chars()
            .all(|c| matches!(c, 'x' | 'y' | 'z' | 'w' | 'r' | 'g' | 'b' | 'a'))
        {
            return Err(MemberTypeError::InvalidSwizzle);
        }
        swizzle_len = field_str.len();
    } else {
        // Matrix element chain, e.g. `_m00` or `_11_12`.
        let bytes = field_str.as_bytes();
        let mut i = 0;
        let mut count = 0usize;
        while i < bytes.len() && bytes[i] == b'_' {
            i += 1;
            // `_m` selectors are zero-based, bare `_RC` selectors one-based.
            let origin = if i < bytes.len() && bytes[i] == b'm' {
                i += 1;
                0
            } else {
                1
            };
            if i + 1 >= bytes.len()
                || !bytes[i].is_ascii_digit()
                || !bytes[i + 1].is_ascii_digit()
            {
                return Err(MemberTypeError::NoSuchMember);
            }
            let row = i32::from(bytes[i] - b'0') - origin;
            let col = i32::from(bytes[i + 1] - b'0') - origin;
            if row < 0
                || col < 0
                || row >= i32::from(object_info.height)
                || col >= i32::from(object_info.components)
            {
                return Err(MemberTypeError::NoSuchMember);
            }
            count += 1;
            i += 2;
        }
        if i != bytes.len() || count == 0 {
            return Err(MemberTypeError::NoSuchMember);
        }
        swizzle_len = count;
    }

    if swizzle_len == 0 || swizzle_len > 4 {
        return Err(MemberTypeError::InvalidSwizzle);
    }

    let base = match numeric {
        NumericType::Float => FLOAT_BY_WIDTH[swizzle_len - 1],
        NumericType::Half => HALF_BY_WIDTH[swizzle_len - 1],
        NumericType::Int => INT_BY_WIDTH[swizzle_len - 1],
        NumericType::Uint => UINT_BY_WIDTH[swizzle_len - 1],
        NumericType::Bool => return Err(MemberTypeError::NoSuchMember),
    };
    Ok(Type::new(base))
}
