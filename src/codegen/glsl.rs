//! GLSL 1.40 code generator.
//!
//! Walks the typed AST and rewrites the HLSL-isms GLSL cannot express
//! directly: row-major matrix indexing, scalar swizzles, intrinsic renames,
//! the D3D clip-space conventions, and identifiers that are reserved words
//! in GLSL but not in HLSL. A `main()` wrapper unpacks `in` attributes,
//! calls the entry function, and writes `out` attributes.

use crate::ast::{
    Argument, BaseType, BinaryOp, Callee, Declaration, ExprId, ExprKind, ExprRange, Init, Literal,
    Module, StmtId, StmtKind, Type, UnaryOp,
};
use crate::codegen::writer::CodeWriter;
use crate::codegen::{choose_unique_name, format_float, Target};
use crate::errors::{CompileError, Result};
use crate::types::intrinsics::{callee_arg_types, callee_name};

// http://www.opengl.org/registry/doc/GLSLangSpec.Full.1.40.08.pdf

/// Reserved words in GLSL that are ordinary identifiers in HLSL.
const RESERVED_WORDS: [&str; 4] = ["output", "input", "mod", "mix"];

const BUILT_IN_SEMANTICS: [(&str, &str); 2] = [
    ("SV_POSITION", "gl_Position"),
    ("DEPTH", "gl_FragDepth"),
];

fn built_in_semantic(semantic: &str) -> Option<&'static str> {
    BUILT_IN_SEMANTICS
        .iter()
        .find(|(hlsl, _)| hlsl.eq_ignore_ascii_case(semantic))
        .map(|&(_, glsl)| glsl)
}

fn type_name<'m>(module: &'m Module, ty: &Type) -> &'m str {
    match ty.base {
        BaseType::Void => "void",
        BaseType::Float => "float",
        BaseType::Float2 => "vec2",
        BaseType::Float3 => "vec3",
        BaseType::Float4 => "vec4",
        BaseType::Float3x3 => "mat3",
        BaseType::Float4x4 => "mat4",
        BaseType::Half => "float",
        BaseType::Half2 => "vec2",
        BaseType::Half3 => "vec3",
        BaseType::Half4 => "vec4",
        BaseType::Half3x3 => "mat3",
        BaseType::Half4x4 => "mat4",
        BaseType::Bool => "bool",
        BaseType::Int => "int",
        BaseType::Int2 => "ivec2",
        BaseType::Int3 => "ivec3",
        BaseType::Int4 => "ivec4",
        BaseType::Uint => "uint",
        BaseType::Uint2 => "uvec2",
        BaseType::Uint3 => "uvec3",
        BaseType::Uint4 => "uvec4",
        BaseType::Texture => "texture",
        BaseType::Sampler2D => "sampler2D",
        BaseType::SamplerCube => "samplerCube",
        BaseType::UserDefined => ty.type_name.map(|n| module.name(n)).unwrap_or("?"),
        BaseType::Unknown => "?",
    }
}

/// GLSL casts are only needed when the base types differ; everything else is
/// representation-identical.
fn can_implicit_cast(src: &Type, dst: &Type) -> bool {
    src.base == dst.base
}

fn find_function(module: &Module, name: &str) -> Option<StmtId> {
    module.root().iter().copied().find(
        |&id| matches!(&module.stmt(id).kind, StmtKind::Function(f) if module.name(f.name) == name),
    )
}

fn find_struct_by_str<'m>(module: &'m Module, name: &str) -> Option<&'m crate::ast::StructDef> {
    module.root().iter().find_map(|&id| match &module.stmt(id).kind {
        StmtKind::Struct(s) if module.name(s.name) == name => Some(s),
        _ => None,
    })
}

/// Translate a parsed module to GLSL for the given stage and entry point.
pub fn generate(module: &Module, target: Target, entry_name: &str) -> Result<String> {
    GlslGenerator::new(module, target, entry_name).run()
}

struct GlslGenerator<'m> {
    module: &'m Module,
    writer: CodeWriter,
    target: Target,
    entry_name: &'m str,
    in_attr_prefix: &'static str,
    out_attr_prefix: &'static str,
    matrix_row_fn: String,
    clip_fn: String,
    tex2dlod_fn: String,
    tex_cube_bias_fn: String,
    scalar_swizzle2_fn: String,
    scalar_swizzle3_fn: String,
    scalar_swizzle4_fn: String,
    sincos_fn: String,
    /// Substitutes for RESERVED_WORDS, index-aligned.
    reserved_substitutes: [String; 4],
    output_position: bool,
    error: Option<CompileError>,
}

impl<'m> GlslGenerator<'m> {
    fn new(module: &'m Module, target: Target, entry_name: &'m str) -> Self {
        let reserved_substitutes = RESERVED_WORDS.map(|word| choose_unique_name(module, word));
        let (in_attr_prefix, out_attr_prefix) = match target {
            Target::Vertex => ("", "frag_"),
            Target::Fragment => ("frag_", "rast_"),
        };
        GlslGenerator {
            module,
            writer: CodeWriter::new(true),
            target,
            entry_name,
            in_attr_prefix,
            out_attr_prefix,
            matrix_row_fn: choose_unique_name(module, "matrix_row"),
            clip_fn: choose_unique_name(module, "clip"),
            tex2dlod_fn: choose_unique_name(module, "tex2Dlod"),
            tex_cube_bias_fn: choose_unique_name(module, "texCUBEbias"),
            scalar_swizzle2_fn: choose_unique_name(module, "m_scalar_swizzle2"),
            scalar_swizzle3_fn: choose_unique_name(module, "m_scalar_swizzle3"),
            scalar_swizzle4_fn: choose_unique_name(module, "m_scalar_swizzle4"),
            sincos_fn: choose_unique_name(module, "sincos"),
            reserved_substitutes,
            output_position: false,
            error: None,
        }
    }

    /// Record the first emission error; later ones are swallowed so broken
    /// input does not flood stderr.
    fn error(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(CompileError::msg(message));
        }
    }

    fn safe_identifier<'a>(&'a self, name: &'a str) -> &'a str {
        for (index, word) in RESERVED_WORDS.iter().enumerate() {
            if *word == name {
                return &self.reserved_substitutes[index];
            }
        }
        name
    }

    fn run(mut self) -> Result<String> {
        let module = self.module;
        tracing::debug!(entry = self.entry_name, target = ?self.target, "generating GLSL");

        let Some(entry_id) = find_function(module, self.entry_name) else {
            return Err(CompileError::msg(format!(
                "Entry point '{}' doesn't exist",
                self.entry_name
            )));
        };

        let uses_clip = module.contains_string("clip");
        let uses_tex2dlod = module.contains_string("tex2Dlod");
        let uses_tex_cube_bias = module.contains_string("texCUBEbias");
        let uses_sincos = module.contains_string("sincos");

        self.writer.write_line(0, "#version 140");

        // Pragmas for NVIDIA.
        self.writer.write_line(0, "#pragma optionNV(fastmath on)");
        self.writer.write_line(0, "#pragma optionNV(ifcvt none)");
        self.writer.write_line(0, "#pragma optionNV(inline all)");
        self.writer.write_line(0, "#pragma optionNV(strict on)");
        self.writer.write_line(0, "#pragma optionNV(unroll all)");

        // Row access over column-major matrices.
        let row = self.matrix_row_fn.clone();
        self.writer.write_line(
            0,
            &format!("vec3 {row}(mat3 m, int i) {{ return vec3( m[0][i], m[1][i], m[2][i] ); }}"),
        );
        self.writer.write_line(
            0,
            &format!(
                "vec4 {row}(mat4 m, int i) {{ return vec4( m[0][i], m[1][i], m[2][i], m[3][i] ); }}"
            ),
        );

        if uses_clip {
            let discard = if self.target == Target::Fragment {
                "discard"
            } else {
                ""
            };
            let clip = self.clip_fn.clone();
            self.writer.write_line(
                0,
                &format!("void {clip}(float x) {{ if (x < 0.0) {discard};  }}"),
            );
            self.writer.write_line(
                0,
                &format!("void {clip}(vec2  x) {{ if (any(lessThan(x, vec2(0.0, 0.0)))) {discard};  }}"),
            );
            self.writer.write_line(
                0,
                &format!(
                    "void {clip}(vec3  x) {{ if (any(lessThan(x, vec3(0.0, 0.0, 0.0)))) {discard};  }}"
                ),
            );
            self.writer.write_line(
                0,
                &format!(
                    "void {clip}(vec4  x) {{ if (any(lessThan(x, vec4(0.0, 0.0, 0.0, 0.0)))) {discard};  }}"
                ),
            );
        }

        if uses_tex2dlod {
            self.writer.write_line(
                0,
                &format!(
                    "vec4 {}(sampler2D sampler, vec4 texCoord) {{ return textureLod(sampler, texCoord.xy, texCoord.w);  }}",
                    self.tex2dlod_fn
                ),
            );
        }

        if uses_tex_cube_bias {
            if self.target == Target::Fragment {
                self.writer.write_line(
                    0,
                    &format!(
                        "vec4 {}(samplerCube sampler, vec4 texCoord) {{ return texture(sampler, texCoord.xyz, texCoord.w);  }}",
                        self.tex_cube_bias_fn
                    ),
                );
            } else {
                // The bias parameter is not supported in vertex shaders.
                self.writer.write_line(
                    0,
                    &format!(
                        "vec4 {}(samplerCube sampler, vec4 texCoord) {{ return texture(sampler, texCoord.xyz);  }}",
                        self.tex_cube_bias_fn
                    ),
                );
            }
        }

        let sw2 = self.scalar_swizzle2_fn.clone();
        self.writer
            .write_line(0, &format!("vec2  {sw2}(float x) {{ return  vec2(x, x); }}"));
        self.writer
            .write_line(0, &format!("ivec2 {sw2}(int   x) {{ return ivec2(x, x); }}"));
        self.writer
            .write_line(0, &format!("uvec2 {sw2}(uint  x) {{ return uvec2(x, x); }}"));

        let sw3 = self.scalar_swizzle3_fn.clone();
        self.writer
            .write_line(0, &format!("vec3  {sw3}(float x) {{ return  vec3(x, x, x); }}"));
        self.writer
            .write_line(0, &format!("ivec3 {sw3}(int   x) {{ return ivec3(x, x, x); }}"));
        self.writer
            .write_line(0, &format!("uvec3 {sw3}(uint  x) {{ return uvec3(x, x, x); }}"));

        let sw4 = self.scalar_swizzle4_fn.clone();
        self.writer
            .write_line(0, &format!("vec4  {sw4}(float x) {{ return  vec4(x, x, x, x); }}"));
        self.writer
            .write_line(0, &format!("ivec4 {sw4}(int   x) {{ return ivec4(x, x, x, x); }}"));
        self.writer
            .write_line(0, &format!("uvec4 {sw4}(uint  x) {{ return uvec4(x, x, x, x); }}"));

        if uses_sincos {
            let sincos = self.sincos_fn.clone();
            for float_type in ["float", "vec2", "vec3", "vec4"] {
                self.writer.write_line(
                    0,
                    &format!(
                        "void {sincos}({float_type} x, out {float_type} s, out {float_type} c) {{ s = sin(x); c = cos(x); }}"
                    ),
                );
            }
        }

        self.output_attributes(entry_id);
        let root: Vec<StmtId> = module.root().to_vec();
        self.output_statements(0, &root, None);
        self.output_entry_caller(entry_id);

        // GLSL compilers don't check for this, so report it ourselves.
        if self.target == Target::Vertex && !self.output_position {
            self.error("Vertex shader must output a position".to_owned());
        }

        match self.error {
            Some(error) => Err(error),
            None => Ok(self.writer.finish()),
        }
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    fn output_expression_list(&mut self, args: ExprRange, expected: Option<&[Type]>) {
        let list = self.module.expr_list(args);
        for (index, &arg) in list.iter().enumerate() {
            if index > 0 {
                self.writer.write(", ");
            }
            let dst = expected.and_then(|types| types.get(index));
            self.output_expression(arg, dst);
        }
    }

    fn output_expression(&mut self, id: ExprId, dst_type: Option<&Type>) {
        let module = self.module;
        let expr = module.expr(id);

        let mut cast =
            dst_type.is_some_and(|dst| !can_implicit_cast(&expr.ty, dst));
        if matches!(expr.kind, ExprKind::Cast { .. }) {
            // The expression is already a cast; don't wrap it in another.
            cast = false;
        }

        if cast {
            if let Some(dst) = dst_type {
                self.output_declaration_parts(dst, "");
            }
            self.writer.write("(");
        }

        match &expr.kind {
            ExprKind::Identifier { name, .. } => {
                let name = module.name(*name);
                self.output_identifier(name);
            }
            ExprKind::Constructor { ty, args } => {
                self.writer.write(&format!("{}(", type_name(module, ty)));
                self.output_expression_list(*args, None);
                self.writer.write(")");
            }
            ExprKind::Cast { ty, expr: inner } => {
                self.output_declaration_parts(ty, "");
                self.writer.write("(");
                self.output_expression(*inner, None);
                self.writer.write(")");
            }
            ExprKind::Literal(literal) => match *literal {
                Literal::Float(value) | Literal::Half(value) => {
                    self.writer.write(&format_float(value));
                }
                Literal::Int(value) => self.writer.write(&value.to_string()),
                Literal::Uint(value) => self.writer.write(&value.to_string()),
                Literal::Bool(value) => {
                    self.writer.write(if value { "true" } else { "false" });
                }
            },
            ExprKind::Unary { op, expr: inner } => {
                // `!` forces its operand to bool so conversions stay explicit.
                let inner_dst = if *op == UnaryOp::Not {
                    Some(expr.ty)
                } else {
                    None
                };
                self.writer.write("(");
                if op.is_postfix() {
                    self.output_expression(*inner, inner_dst.as_ref());
                    self.writer.write(op.symbol());
                } else {
                    self.writer.write(op.symbol());
                    self.output_expression(*inner, inner_dst.as_ref());
                }
                self.writer.write(")");
            }
            ExprKind::Binary { op, left, right } => {
                let result_ty = expr.ty;
                // Addition/subtraction and logical operators force both
                // sides to the result type; assignments force the value side.
                let (dst1, dst2) = match op {
                    BinaryOp::Add | BinaryOp::Sub | BinaryOp::And | BinaryOp::Or => {
                        (Some(result_ty), Some(result_ty))
                    }
                    BinaryOp::Assign
                    | BinaryOp::AddAssign
                    | BinaryOp::SubAssign
                    | BinaryOp::MulAssign
                    | BinaryOp::DivAssign => (None, Some(result_ty)),
                    _ => (None, None),
                };
                self.writer.write("(");
                self.output_expression(*left, dst1.as_ref());
                self.writer.write(&format!(" {} ", op.symbol()));
                self.output_expression(*right, dst2.as_ref());
                self.writer.write(")");
            }
            ExprKind::Conditional {
                cond,
                if_true,
                if_false,
            } => {
                let bool_type = Type::new(BaseType::Bool);
                self.writer.write("((");
                self.output_expression(*cond, Some(&bool_type));
                self.writer.write(")?(");
                self.output_expression(*if_true, None);
                self.writer.write("):(");
                self.output_expression(*if_false, None);
                self.writer.write("))");
            }
            ExprKind::Member { object, field } => {
                self.output_member_access(*object, *field);
            }
            ExprKind::Index { array, index } => {
                let array_ty = module.expr(*array).ty;
                if !array_ty.array
                    && matches!(array_ty.base, BaseType::Float3x3 | BaseType::Float4x4)
                {
                    // GLSL indexes a matrix as m[col][row] while HLSL uses
                    // m[row][col]; go through the row-access helper.
                    self.writer.write(&format!("{}(", self.matrix_row_fn));
                    self.output_expression(*array, None);
                    self.writer.write(",");
                    self.output_expression(*index, None);
                    self.writer.write(")");
                } else {
                    self.output_expression(*array, None);
                    self.writer.write("[");
                    self.output_expression(*index, None);
                    self.writer.write("]");
                }
            }
            ExprKind::Call { callee, args } => {
                self.output_call(*callee, *args);
            }
        }

        if cast {
            self.writer.write(")");
        }
    }

    fn output_member_access(&mut self, object: ExprId, field: crate::intern::Name) {
        let module = self.module;
        let object_ty = module.expr(object).ty;
        let field_str = module.name(field);

        if matches!(
            object_ty.base,
            BaseType::Half | BaseType::Float | BaseType::Int | BaseType::Uint
        ) {
            // Swizzles on scalars go through the generated helpers.
            let helper = match field_str.len() {
                2 => Some(self.scalar_swizzle2_fn.clone()),
                3 => Some(self.scalar_swizzle3_fn.clone()),
                4 => Some(self.scalar_swizzle4_fn.clone()),
                _ => None,
            };
            if let Some(helper) = helper {
                self.writer.write(&helper);
            }
            self.writer.write("(");
            self.output_expression(object, None);
            self.writer.write(")");
            return;
        }

        self.writer.write("(");
        self.output_expression(object, None);
        self.writer.write(")");

        if matches!(object_ty.base, BaseType::Float3x3 | BaseType::Float4x4) {
            // Matrix element selection becomes [col][row] index pairs.
            let bytes = field_str.as_bytes();
            let mut i = 0;
            while i < bytes.len() {
                if bytes[i] != b'_' {
                    break;
                }
                i += 1;
                let origin = if i < bytes.len() && bytes[i] == b'm' {
                    i += 1;
                    b'0'
                } else {
                    b'1'
                };
                if i + 1 < bytes.len()
                    && bytes[i].is_ascii_digit()
                    && bytes[i + 1].is_ascii_digit()
                {
                    self.writer.write(&format!(
                        "[{}][{}]",
                        bytes[i + 1] - origin,
                        bytes[i] - origin
                    ));
                    i += 2;
                } else {
                    break;
                }
            }
        } else {
            self.writer.write(&format!(".{field_str}"));
        }
    }

    fn output_call(&mut self, callee: Callee, args: ExprRange) {
        let module = self.module;
        let function_name = callee_name(module, callee);
        let arg_ids = module.expr_list(args);

        if function_name == "mul" {
            // Both operands are cast to the declared argument types, which
            // makes the GLSL multiply order correct as written.
            if arg_ids.len() != 2 {
                self.error("mul expects 2 arguments".to_owned());
                return;
            }
            let (a, b) = (arg_ids[0], arg_ids[1]);
            let arg_types = callee_arg_types(module, callee);
            self.writer.write("((");
            self.output_expression(a, arg_types.first());
            self.writer.write(") * (");
            self.output_expression(b, arg_types.get(1));
            self.writer.write("))");
            return;
        }

        if function_name == "saturate" {
            if arg_ids.len() != 1 {
                self.error("saturate expects 1 argument".to_owned());
                return;
            }
            let arg = arg_ids[0];
            self.writer.write("clamp(");
            self.output_expression(arg, None);
            self.writer.write(", 0.0, 1.0)");
            return;
        }

        let name = function_name.to_owned();
        let arg_types = callee_arg_types(module, callee);
        self.output_identifier(&name);
        self.writer.write("(");
        self.output_expression_list(args, Some(arg_types.as_slice()));
        self.writer.write(")");
    }

    fn output_identifier(&mut self, name: &str) {
        // Remap intrinsics that differ between the two languages.
        let output = match name {
            "tex2D" => "texture",
            "tex2Dproj" => "texture2DProj",
            "texCUBE" => "texture",
            "clip" => &self.clip_fn,
            "tex2Dlod" => &self.tex2dlod_fn,
            "texCUBEbias" => &self.tex_cube_bias_fn,
            "atan2" => "atan",
            "sincos" => &self.sincos_fn,
            // fmod differs from mod for negative operands; mod is kept for
            // performance.
            "fmod" => "mod",
            "lerp" => "mix",
            other => self.safe_identifier(other),
        };
        let output = output.to_owned();
        self.writer.write(&output);
    }

    // -------------------------------------------------------------------------
    // Declarations and statements
    // -------------------------------------------------------------------------

    fn output_declaration(&mut self, declaration: &Declaration) {
        let module = self.module;
        let name = self.safe_identifier(module.name(declaration.name)).to_owned();
        self.output_declaration_parts(&declaration.ty, &name);
        match declaration.assignment {
            Some(Init::List(list)) => {
                self.writer
                    .write(&format!(" = {}[]( ", type_name(module, &declaration.ty)));
                self.output_expression_list(list, None);
                self.writer.write(" )");
            }
            Some(Init::Expr(expr)) => {
                self.writer.write(" = ");
                let dst = declaration.ty;
                self.output_expression(expr, Some(&dst));
            }
            None => {}
        }
    }

    fn output_declaration_parts(&mut self, ty: &Type, name: &str) {
        let module = self.module;
        let safe_name = self.safe_identifier(name).to_owned();
        if !ty.array {
            self.writer
                .write(&format!("{} {}", type_name(module, ty), safe_name));
        } else {
            self.writer
                .write(&format!("{} {}[", type_name(module, ty), safe_name));
            if let Some(size) = ty.array_size {
                self.output_expression(size, None);
            }
            self.writer.write("]");
        }
    }

    fn output_arguments(&mut self, args: &[Argument]) {
        let module = self.module;
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                self.writer.write(", ");
            }
            match arg.modifier {
                crate::ast::ArgumentModifier::In => self.writer.write("in "),
                crate::ast::ArgumentModifier::Inout => self.writer.write("inout "),
                _ => {}
            }
            let name = module.name(arg.name).to_owned();
            self.output_declaration_parts(&arg.ty, &name);
        }
    }

    fn output_statements(&mut self, indent: usize, stmts: &[StmtId], return_type: Option<&Type>) {
        let module = self.module;

        for &stmt_id in stmts {
            let stmt = module.stmt(stmt_id);
            let file = module.name(stmt.loc.file).to_owned();
            let line = stmt.loc.line;

            match &stmt.kind {
                StmtKind::Declaration(declaration) => {
                    // GLSL has no uniform `texture` without a sampler; drop
                    // those declarations.
                    if declaration.ty.base != BaseType::Texture {
                        self.writer.begin_line_at(indent, &file, line);
                        if indent == 0 {
                            self.writer.write("uniform ");
                        }
                        self.output_declaration(declaration);
                        self.writer.end_line(";");
                    }
                }
                StmtKind::Struct(structure) => {
                    let name = module.name(structure.name);
                    self.writer.write_line(indent, &format!("struct {name} {{"));
                    for field in module.fields(structure.fields) {
                        let field_file = module.name(field.loc.file).to_owned();
                        self.writer
                            .begin_line_at(indent + 1, &field_file, field.loc.line);
                        let field_name = module.name(field.name).to_owned();
                        self.output_declaration_parts(&field.ty, &field_name);
                        self.writer.write(";");
                        self.writer.end_line("");
                    }
                    self.writer.write_line(indent, "};");
                }
                StmtKind::Buffer(buffer) => {
                    // Empty uniform blocks are rejected by NVIDIA; elide them.
                    if !buffer.fields.is_empty() {
                        let name = buffer.name.map(|n| module.name(n)).unwrap_or("");
                        self.writer.write_line_at(
                            indent,
                            &file,
                            line,
                            &format!("layout (std140) uniform {name} {{"),
                        );
                        for field in module.buffer_fields(buffer.fields) {
                            let field_file = module.name(field.loc.file).to_owned();
                            self.writer
                                .begin_line_at(indent + 1, &field_file, field.loc.line);
                            let field_name = module.name(field.name).to_owned();
                            self.output_declaration_parts(&field.ty, &field_name);
                            self.writer.write(";");
                            self.writer.end_line("");
                        }
                        self.writer.write_line(indent, "};");
                    }
                }
                StmtKind::Function(function) => {
                    let function_name = self
                        .safe_identifier(module.name(function.name))
                        .to_owned();
                    let return_type_name = type_name(module, &function.return_type).to_owned();

                    self.writer.begin_line_at(indent, &file, line);
                    self.writer
                        .write(&format!("{return_type_name} {function_name}("));
                    let args: Vec<Argument> = module.args(function.args).to_vec();
                    self.output_arguments(&args);
                    self.writer.write(") {");
                    self.writer.end_line("");

                    let body: Vec<StmtId> = module.stmt_list(function.body).to_vec();
                    let function_return_type = function.return_type;
                    self.output_statements(indent + 1, &body, Some(&function_return_type));
                    self.writer.write_line(indent, "}");
                }
                StmtKind::Expression(expression) => {
                    self.writer.begin_line_at(indent, &file, line);
                    self.output_expression(*expression, None);
                    self.writer.end_line(";");
                }
                StmtKind::Return(expression) => match expression {
                    Some(expression) => {
                        self.writer.begin_line_at(indent, &file, line);
                        self.writer.write("return ");
                        self.output_expression(*expression, return_type);
                        self.writer.end_line(";");
                    }
                    None => {
                        self.writer.write_line_at(indent, &file, line, "return;");
                    }
                },
                StmtKind::Discard => {
                    // Vertex shaders cannot discard.
                    if self.target == Target::Fragment {
                        self.writer.write_line_at(indent, &file, line, "discard;");
                    }
                }
                StmtKind::Break => {
                    self.writer.write_line_at(indent, &file, line, "break;");
                }
                StmtKind::Continue => {
                    self.writer.write_line_at(indent, &file, line, "continue;");
                }
                StmtKind::If(if_stmt) => {
                    let bool_type = Type::new(BaseType::Bool);
                    self.writer.begin_line_at(indent, &file, line);
                    self.writer.write("if (");
                    self.output_expression(if_stmt.cond, Some(&bool_type));
                    self.writer.write(") {");
                    self.writer.end_line("");
                    let then_body: Vec<StmtId> = module.stmt_list(if_stmt.then_body).to_vec();
                    self.output_statements(indent + 1, &then_body, return_type);
                    self.writer.write_line(indent, "}");
                    if let Some(else_body) = if_stmt.else_body {
                        self.writer.write_line(indent, "else {");
                        let else_body: Vec<StmtId> = module.stmt_list(else_body).to_vec();
                        self.output_statements(indent + 1, &else_body, return_type);
                        self.writer.write_line(indent, "}");
                    }
                }
                StmtKind::For(for_stmt) => {
                    let bool_type = Type::new(BaseType::Bool);
                    self.writer.begin_line_at(indent, &file, line);
                    self.writer.write("for (");
                    if let StmtKind::Declaration(init) = &module.stmt(for_stmt.init).kind {
                        self.output_declaration(init);
                    }
                    self.writer.write("; ");
                    if let Some(cond) = for_stmt.cond {
                        self.output_expression(cond, Some(&bool_type));
                    }
                    self.writer.write("; ");
                    if let Some(increment) = for_stmt.increment {
                        self.output_expression(increment, None);
                    }
                    self.writer.write(") {");
                    self.writer.end_line("");
                    let body: Vec<StmtId> = module.stmt_list(for_stmt.body).to_vec();
                    self.output_statements(indent + 1, &body, return_type);
                    self.writer.write_line(indent, "}");
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Entry-point attributes and wrapper
    // -------------------------------------------------------------------------

    fn output_attribute(
        &mut self,
        ty: &Type,
        semantic: Option<crate::intern::Name>,
        attr_type: &str,
        prefix: &str,
    ) {
        let module = self.module;
        if ty.base == BaseType::UserDefined {
            // Struct arguments contribute one attribute per field with a
            // non-built-in semantic.
            let Some(structure) = ty.type_name.and_then(|n| {
                let name = module.name(n);
                find_struct_by_str(module, name)
            }) else {
                return;
            };
            for field in module.fields(structure.fields) {
                if let Some(semantic) = field.semantic {
                    let semantic_str = module.name(semantic);
                    if built_in_semantic(semantic_str).is_none() {
                        let line = format!(
                            "{attr_type} {} {prefix}{semantic_str};",
                            type_name(module, &field.ty)
                        );
                        self.writer.write_line(0, &line);
                    }
                }
            }
        } else if let Some(semantic) = semantic {
            let semantic_str = module.name(semantic);
            if built_in_semantic(semantic_str).is_none() {
                let line = format!(
                    "{attr_type} {} {prefix}{semantic_str};",
                    type_name(module, ty)
                );
                self.writer.write_line(0, &line);
            }
        }
    }

    fn output_attributes(&mut self, entry_id: StmtId) {
        let module = self.module;
        let entry = module.function(entry_id);

        let args: Vec<Argument> = module.args(entry.args).to_vec();
        for arg in &args {
            self.output_attribute(&arg.ty, arg.semantic, "in", self.in_attr_prefix);
        }

        let return_type = entry.return_type;
        let semantic = entry.semantic;
        self.output_attribute(&return_type, semantic, "out", self.out_attr_prefix);
    }

    fn output_set_out_attribute(&mut self, semantic: &str, result_name: &str) {
        match built_in_semantic(semantic) {
            Some("gl_Position") => {
                // Mirror the y-coordinate to match the D3D texture-coordinate
                // origin in render-to-texture, and remap the D3D 0..1 depth
                // range to OpenGL's -1..1.
                self.writer
                    .write_line(1, &format!("vec4 temp = {result_name};"));
                self.writer.write_line(
                    1,
                    "gl_Position = temp * vec4(1,-1,2,1) - vec4(0,0,temp.w,0);",
                );
                self.output_position = true;
            }
            Some("gl_FragDepth") => {
                // Values outside 0..1 reject the fragment, unlike in D3D.
                self.writer.write_line(
                    1,
                    &format!("gl_FragDepth = clamp(float({result_name}), 0.0, 1.0);"),
                );
            }
            Some(built_in) => {
                self.writer
                    .write_line(1, &format!("{built_in} = {result_name};"));
            }
            None => {
                self.writer.write_line(
                    1,
                    &format!("{}{semantic} = {result_name};", self.out_attr_prefix),
                );
            }
        }
    }

    fn output_entry_caller(&mut self, entry_id: StmtId) {
        let module = self.module;
        let entry = module.function(entry_id);

        self.writer.write_line(0, "void main() {");

        // Local variables for each entry-point parameter, loaded from the
        // input attributes.
        let args: Vec<Argument> = module.args(entry.args).to_vec();
        for arg in &args {
            self.writer.begin_line(1);
            let arg_name = module.name(arg.name).to_owned();
            self.output_declaration_parts(&arg.ty, &arg_name);
            self.writer.end_line(";");

            if arg.ty.base == BaseType::UserDefined {
                let Some(structure) = arg.ty.type_name.and_then(|n| {
                    let name = module.name(n);
                    find_struct_by_str(module, name)
                }) else {
                    continue;
                };
                let fields: Vec<crate::ast::StructField> =
                    module.fields(structure.fields).to_vec();
                for field in &fields {
                    if let Some(semantic) = field.semantic {
                        let semantic_str = module.name(semantic).to_owned();
                        let arg_ident = self.safe_identifier(&arg_name).to_owned();
                        let field_ident =
                            self.safe_identifier(module.name(field.name)).to_owned();
                        let value = match built_in_semantic(&semantic_str) {
                            Some(built_in) => built_in.to_owned(),
                            None => format!("{}{semantic_str}", self.in_attr_prefix),
                        };
                        self.writer
                            .write_line(1, &format!("{arg_ident}.{field_ident} = {value};"));
                    }
                }
            } else if let Some(semantic) = arg.semantic {
                let semantic_str = module.name(semantic).to_owned();
                let arg_ident = self.safe_identifier(&arg_name).to_owned();
                let value = match built_in_semantic(&semantic_str) {
                    Some(built_in) => built_in.to_owned(),
                    None => format!("{}{semantic_str}", self.in_attr_prefix),
                };
                self.writer.write_line(1, &format!("{arg_ident} = {value};"));
            }
        }

        let result_name = "result";

        // Call the entry function.
        self.writer.begin_line(1);
        let return_type_name = type_name(module, &entry.return_type).to_owned();
        self.writer.write(&format!(
            "{return_type_name} {result_name} = {}(",
            self.entry_name
        ));
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                self.writer.write(", ");
            }
            let arg_ident = self.safe_identifier(module.name(arg.name)).to_owned();
            self.writer.write(&arg_ident);
        }
        self.writer.end_line(");");

        // Copy the result into the output attributes.
        if entry.return_type.base == BaseType::UserDefined {
            if let Some(structure) = entry.return_type.type_name.and_then(|n| {
                let name = module.name(n);
                find_struct_by_str(module, name)
            }) {
                let fields: Vec<crate::ast::StructField> =
                    module.fields(structure.fields).to_vec();
                for field in &fields {
                    if let Some(semantic) = field.semantic {
                        let semantic_str = module.name(semantic).to_owned();
                        let field_result = format!("{result_name}.{}", module.name(field.name));
                        self.output_set_out_attribute(&semantic_str, &field_result);
                    }
                }
            }
        } else if let Some(semantic) = entry.semantic {
            let semantic_str = module.name(semantic).to_owned();
            self.output_set_out_attribute(&semantic_str, result_name);
        }

        self.writer.write_line(0, "}");
    }
}
