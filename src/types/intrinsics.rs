//! Built-in intrinsic catalog and call resolution.
//!
//! The catalog is a data-driven table built once: one entry per scalar width
//! and family, mirroring the HLSL vector-math library. Argument types are
//! marked `constant` so user expressions can always bind to them.

use std::sync::LazyLock;

use smallvec::SmallVec;

use super::cast_rank;
use crate::ast::{BaseType, Callee, Module, Type};

#[derive(Debug)]
pub struct Intrinsic {
    pub name: &'static str,
    pub return_type: Type,
    pub args: SmallVec<[Type; 4]>,
}

fn const_arg(base: BaseType) -> Type {
    let mut ty = Type::new(base);
    ty.constant = true;
    ty
}

fn entry(name: &'static str, return_type: BaseType, args: &[BaseType]) -> Intrinsic {
    Intrinsic {
        name,
        return_type: Type::new(return_type),
        args: args.iter().copied().map(const_arg).collect(),
    }
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

/// `T f(T)` for every float and half width.
fn push_float1(catalog: &mut Vec<Intrinsic>, name: &'static str) {
    for ty in FLOAT_BY_WIDTH.into_iter().chain(HALF_BY_WIDTH) {
        catalog.push(entry(name, ty, &[ty]));
    }
}

/// `T f(T, T)` for every float and half width.
fn push_float2(catalog: &mut Vec<Intrinsic>, name: &'static str) {
    for ty in FLOAT_BY_WIDTH.into_iter().chain(HALF_BY_WIDTH) {
        catalog.push(entry(name, ty, &[ty, ty]));
    }
}

/// `T f(T, s, T)` for every float and half width; the float forms take a
/// scalar middle argument, the half forms take the full width.
fn push_float3(catalog: &mut Vec<Intrinsic>, name: &'static str) {
    for ty in FLOAT_BY_WIDTH {
        catalog.push(entry(name, ty, &[ty, BaseType::Float, ty]));
    }
    for ty in HALF_BY_WIDTH {
        catalog.push(entry(name, ty, &[ty, ty, ty]));
    }
}

pub static INTRINSICS: LazyLock<Vec<Intrinsic>> = LazyLock::new(|| {
    use crate::ast::BaseType::*;

    let mut catalog = Vec::new();

    push_float1(&mut catalog, "abs");
    push_float2(&mut catalog, "atan2");
    push_float3(&mut catalog, "clamp");
    push_float1(&mut catalog, "cos");

    push_float3(&mut catalog, "lerp");
    push_float3(&mut catalog, "smoothstep");

    push_float1(&mut catalog, "floor");
    push_float1(&mut catalog, "ceil");
    push_float1(&mut catalog, "frac");

    push_float2(&mut catalog, "fmod");

    for ty in FLOAT_BY_WIDTH.into_iter().chain(HALF_BY_WIDTH) {
        catalog.push(entry("clip", Void, &[ty]));
    }

    for ty in FLOAT_BY_WIDTH {
        catalog.push(entry("dot", Float, &[ty, ty]));
    }
    for ty in HALF_BY_WIDTH {
        catalog.push(entry("dot", Half, &[ty, ty]));
    }

    catalog.push(entry("cross", Float3, &[Float3, Float3]));

    for ty in FLOAT_BY_WIDTH {
        catalog.push(entry("length", Float, &[ty]));
    }
    for ty in HALF_BY_WIDTH {
        catalog.push(entry("length", Half, &[ty]));
    }

    push_float2(&mut catalog, "max");
    push_float2(&mut catalog, "min");

    push_float2(&mut catalog, "mul");
    catalog.push(entry("mul", Float3, &[Float3, Float3x3]));
    catalog.push(entry("mul", Float4, &[Float4, Float4x4]));

    catalog.push(entry("transpose", Float3x3, &[Float3x3]));
    catalog.push(entry("transpose", Float4x4, &[Float4x4]));

    push_float1(&mut catalog, "normalize");
    push_float2(&mut catalog, "pow");
    push_float1(&mut catalog, "saturate");
    push_float1(&mut catalog, "sin");
    push_float1(&mut catalog, "sqrt");
    push_float1(&mut catalog, "rsqrt");
    push_float1(&mut catalog, "rcp");

    push_float1(&mut catalog, "ddx");
    push_float1(&mut catalog, "ddy");

    push_float1(&mut catalog, "sign");
    push_float2(&mut catalog, "step");
    push_float2(&mut catalog, "reflect");

    catalog.push(entry("tex2D", Float4, &[Sampler2D, Float2]));
    catalog.push(entry("tex2Dproj", Float4, &[Sampler2D, Float4]));
    catalog.push(entry("tex2Dlod", Float4, &[Sampler2D, Float4]));

    catalog.push(entry("texCUBE", Float4, &[SamplerCube, Float3]));
    catalog.push(entry("texCUBEbias", Float4, &[SamplerCube, Float4]));

    for ty in FLOAT_BY_WIDTH {
        catalog.push(entry("sincos", Void, &[ty, Float, ty]));
    }
    for ty in HALF_BY_WIDTH {
        catalog.push(entry("sincos", Void, &[ty, ty, ty]));
    }

    catalog
});

/// Whether any intrinsic has this name.
pub fn is_intrinsic_name(name: &str) -> bool {
    INTRINSICS.iter().any(|i| i.name == name)
}

// -----------------------------------------------------------------------------
// Callee signature access
// -----------------------------------------------------------------------------

pub fn callee_name<'m>(module: &'m Module, callee: Callee) -> &'m str {
    match callee {
        Callee::User(id) => module.name(module.function(id).name),
        Callee::Intrinsic(index) => INTRINSICS[index as usize].name,
    }
}

pub fn callee_return_type(module: &Module, callee: Callee) -> Type {
    match callee {
        Callee::User(id) => module.function(id).return_type,
        Callee::Intrinsic(index) => INTRINSICS[index as usize].return_type,
    }
}

pub fn callee_arg_types(module: &Module, callee: Callee) -> SmallVec<[Type; 4]> {
    match callee {
        Callee::User(id) => module
            .args(module.function(id).args)
            .iter()
            .map(|a| a.ty)
            .collect(),
        Callee::Intrinsic(index) => INTRINSICS[index as usize].args.clone(),
    }
}

// -----------------------------------------------------------------------------
// Overload ranking
// -----------------------------------------------------------------------------

/// Per-argument cast ranks of a viable candidate, sorted descending so
/// overloads compare lexicographically worst-argument-first. `None` when the
/// candidate cannot accept the call.
pub(crate) fn viable_ranks(
    call_args: &[Type],
    candidate_args: &[Type],
) -> Option<SmallVec<[i32; 4]>> {
    if call_args.len() != candidate_args.len() {
        return None;
    }
    let mut ranks: SmallVec<[i32; 4]> = SmallVec::with_capacity(call_args.len());
    for (src, dst) in call_args.iter().zip(candidate_args) {
        let rank = cast_rank(src, dst);
        if rank == -1 {
            return None;
        }
        ranks.push(rank);
    }
    ranks.sort_unstable_by(|a, b| b.cmp(a));
    Some(ranks)
}
