// End-to-end translation tests driving the public pipeline.

use pretty_assertions::assert_eq;

use hlslc::{parse, print_hlsl, translate_glsl, Target};

const LIT_SHADER: &str = "\
struct VIn {
    float4 pos : POSITION;
    float3 normal : NORMAL;
    float2 uv : TEXCOORD0;
};
struct VOut {
    float4 pos : SV_POSITION;
    float3 normal : TEXCOORD1;
    float2 uv : TEXCOORD0;
};
float4x4 worldViewProj;
cbuffer Lighting : register(b0) {
    float3 lightDir;
    float ambient;
};
sampler2D diffuseMap : register(s0);

VOut vertex_main(VIn i) {
    VOut o;
    o.pos = mul(i.pos, worldViewProj);
    o.normal = i.normal;
    o.uv = i.uv;
    return o;
}

float4 pixel_main(VOut i) : COLOR {
    float ndl = saturate(dot(normalize(i.normal), -lightDir));
    float4 albedo = tex2D(diffuseMap, i.uv);
    return albedo * (ndl + ambient);
}
";

#[test]
fn test_vertex_translation() {
    let glsl = translate_glsl(LIT_SHADER, "lit.hlsl", Target::Vertex, "vertex_main")
        .expect("translation should succeed");

    assert!(glsl.starts_with("#version 140\n"));
    // Vertex inputs carry the raw semantic names.
    assert!(glsl.contains("in vec4 POSITION;"));
    assert!(glsl.contains("in vec3 NORMAL;"));
    assert!(glsl.contains("in vec2 TEXCOORD0;"));
    // Non-built-in outputs are prefixed for the next stage.
    assert!(glsl.contains("out vec3 frag_TEXCOORD1;"));
    assert!(glsl.contains("out vec2 frag_TEXCOORD0;"));
    // The position write goes through the clip-space remap.
    assert!(glsl.contains("gl_Position = temp * vec4(1,-1,2,1) - vec4(0,0,temp.w,0);"));
    // mul() lowers to the operator with both operands parenthesized.
    assert!(glsl.contains("(((i).pos) * (worldViewProj))"));
    // The uniform block survives with its fields.
    assert!(glsl.contains("layout (std140) uniform Lighting {"));
    assert_eq!(glsl.matches("void main()").count(), 1);
}

#[test]
fn test_fragment_translation() {
    let glsl = translate_glsl(LIT_SHADER, "lit.hlsl", Target::Fragment, "pixel_main")
        .expect("translation should succeed");

    // Fragment inputs use the frag_ prefix; the built-in position does not
    // become an attribute.
    assert!(glsl.contains("in vec3 frag_TEXCOORD1;"));
    assert!(glsl.contains("in vec2 frag_TEXCOORD0;"));
    assert!(!glsl.contains("in vec4 frag_SV_POSITION;"));
    // Outputs use the rast_ prefix.
    assert!(glsl.contains("out vec4 rast_COLOR;"));
    assert!(glsl.contains("rast_COLOR = result;"));
    // Intrinsic remaps: saturate → clamp, tex2D → texture.
    assert!(glsl.contains("clamp("));
    assert!(glsl.contains("texture(diffuseMap, "));
    assert!(!glsl.contains("saturate("));
}

#[test]
fn test_wrapper_loads_struct_fields() {
    let glsl = translate_glsl(LIT_SHADER, "lit.hlsl", Target::Vertex, "vertex_main")
        .expect("translation should succeed");
    assert!(glsl.contains("VIn i;"));
    assert!(glsl.contains("i.pos = POSITION;"));
    assert!(glsl.contains("i.normal = NORMAL;"));
    assert!(glsl.contains("VOut result = vertex_main(i);"));
}

#[test]
fn test_hlsl_modes() {
    let legacy = print_hlsl(LIT_SHADER, "lit.hlsl", true).expect("print should succeed");
    assert!(legacy.contains("sampler2D diffuseMap : register(s0);"));
    assert!(!legacy.contains("cbuffer"));
    assert!(legacy.contains("float3 lightDir;"));

    let modern = print_hlsl(LIT_SHADER, "lit.hlsl", false).expect("print should succeed");
    assert!(modern.contains("cbuffer Lighting : register(b0) {"));
    assert!(modern.contains(
        "Texture2D diffuseMap_texture : register(t0); SamplerState diffuseMap_sampler : register(s0);"
    ));
}

#[test]
fn test_hlsl_legacy_round_trip_is_stable() {
    let first = print_hlsl(LIT_SHADER, "lit.hlsl", true).expect("print should succeed");
    let second = print_hlsl(&first, "lit.hlsl", true).expect("reprint should succeed");
    let third = print_hlsl(&second, "lit.hlsl", true).expect("reprint should succeed");
    assert_eq!(second, third);
}

#[test]
fn test_reserved_words_never_escape() {
    let source = "\
float input;
float output;
float mix;
float mod;
float main() : DEPTH { return input + output + mix + mod; }
";
    let glsl = translate_glsl(source, "reserved.hlsl", Target::Fragment, "main")
        .expect("translation should succeed");
    // Every user identifier that collides with a GLSL reserved word is
    // rewritten to a fresh name.
    assert!(glsl.contains("uniform float input0;"));
    assert!(glsl.contains("uniform float output0;"));
    assert!(glsl.contains("uniform float mix0;"));
    assert!(glsl.contains("uniform float mod0;"));
    assert!(!glsl.contains("uniform float input;"));
    assert!(!glsl.contains("uniform float mix;"));
}

#[test]
fn test_parse_error_carries_position() {
    let err = translate_glsl("float4 f() {\n    return 1.0 +;\n}", "bad.hlsl", Target::Fragment, "f")
        .expect_err("should fail")
        .to_string();
    assert!(err.starts_with("bad.hlsl:2: "));
}

#[test]
fn test_error_messages_match_reference() {
    let err = translate_glsl(
        "float f() { return float4(1.0, 2.0, 3.0, 4.0); }",
        "t.hlsl",
        Target::Fragment,
        "f",
    )
    .expect_err("should fail");
    assert_eq!(
        err.to_string(),
        "t.hlsl:1: Cannot implicitly convert from 'float4' to 'float'"
    );
}

#[test]
fn test_parse_exposes_typed_tree() {
    let module = parse(LIT_SHADER, "lit.hlsl").expect("parse should succeed");
    // Top level: 2 structs, 1 uniform, 1 cbuffer, 1 sampler, 2 functions.
    assert_eq!(module.root().len(), 7);
}

#[test]
fn test_scalar_swizzle_and_matrix_row() {
    let source = "\
float4x4 m;
float4 main(float t : TEXCOORD0) : SV_POSITION {
    float4 row = m[1];
    float3 spread = t.xxx;
    return row + float4(spread, 0.0);
}
";
    let glsl = translate_glsl(source, "sw.hlsl", Target::Vertex, "main")
        .expect("translation should succeed");
    assert!(glsl.contains("matrix_row0(m,1)"));
    assert!(glsl.contains("m_scalar_swizzle30(t)"));
}
