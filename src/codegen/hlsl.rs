//! HLSL pretty-printer.
//!
//! Re-emits the AST as HLSL. Legacy mode targets the D3D9 dialect: combined
//! sampler types are kept and cbuffers are unwrapped into plain
//! declarations. Modern mode pairs every sampler with an explicit
//! `Texture2D`/`TextureCube` + `SamplerState` and redirects the `tex*`
//! intrinsics through generated helpers.

use crate::ast::{
    Argument, ArgumentModifier, BaseType, Declaration, ExprId, ExprKind, ExprRange, Init, Literal,
    Module, StmtId, StmtKind, Type,
};
use crate::codegen::writer::CodeWriter;
use crate::codegen::{choose_unique_name, format_float};
use crate::types;
use crate::types::intrinsics::callee_name;

fn is_sampler_type(ty: &Type) -> bool {
    matches!(ty.base, BaseType::Sampler2D | BaseType::SamplerCube)
}

/// Pretty-print a parsed module as HLSL.
pub fn generate(module: &Module, legacy: bool) -> String {
    HlslGenerator::new(module, legacy).run()
}

struct HlslGenerator<'m> {
    module: &'m Module,
    writer: CodeWriter,
    legacy: bool,
    texture_sampler_2d_struct: String,
    texture_sampler_2d_ctor: String,
    texture_sampler_cube_struct: String,
    texture_sampler_cube_ctor: String,
    tex2d_fn: String,
    tex2d_proj_fn: String,
    tex2d_lod_fn: String,
    tex_cube_fn: String,
    tex_cube_bias_fn: String,
}

impl<'m> HlslGenerator<'m> {
    fn new(module: &'m Module, legacy: bool) -> Self {
        HlslGenerator {
            module,
            // Output is re-parsed by this compiler, which has no
            // preprocessor, so no #line markers here.
            writer: CodeWriter::new(false),
            legacy,
            texture_sampler_2d_struct: choose_unique_name(module, "TextureSampler2D"),
            texture_sampler_2d_ctor: choose_unique_name(module, "CreateTextureSampler2D"),
            texture_sampler_cube_struct: choose_unique_name(module, "TextureSamplerCube"),
            texture_sampler_cube_ctor: choose_unique_name(module, "CreateTextureSamplerCube"),
            tex2d_fn: choose_unique_name(module, "tex2D"),
            tex2d_proj_fn: choose_unique_name(module, "tex2Dproj"),
            tex2d_lod_fn: choose_unique_name(module, "tex2Dlod"),
            tex_cube_fn: choose_unique_name(module, "texCUBE"),
            tex_cube_bias_fn: choose_unique_name(module, "texCUBEbias"),
        }
    }

    fn type_name(&self, ty: &Type) -> &'m str {
        types::type_name(self.module, ty)
    }

    fn run(mut self) -> String {
        tracing::debug!(legacy = self.legacy, "generating HLSL");

        if !self.legacy {
            self.output_sampler_preamble();
        }

        let root: Vec<StmtId> = self.module.root().to_vec();
        self.output_statements(0, &root);
        self.writer.finish()
    }

    /// Texture/sampler pair structs, constructors, and sampling helpers for
    /// the modern dialect.
    fn output_sampler_preamble(&mut self) {
        let ts2d = self.texture_sampler_2d_struct.clone();
        let ts2d_ctor = self.texture_sampler_2d_ctor.clone();
        let tscube = self.texture_sampler_cube_struct.clone();
        let tscube_ctor = self.texture_sampler_cube_ctor.clone();

        self.writer.write_line(0, &format!("struct {ts2d} {{"));
        self.writer.write_line(1, "Texture2D    t;");
        self.writer.write_line(1, "SamplerState s;");
        self.writer.write_line(0, "};");

        self.writer.write_line(0, &format!("struct {tscube} {{"));
        self.writer.write_line(1, "TextureCube   t;");
        self.writer.write_line(1, "SamplerState s;");
        self.writer.write_line(0, "};");

        self.writer.write_line(
            0,
            &format!("{ts2d} {ts2d_ctor}(Texture2D t, SamplerState s) {{"),
        );
        self.writer.write_line(1, &format!("{ts2d} ts;"));
        self.writer.write_line(1, "ts.t = t; ts.s = s;");
        self.writer.write_line(1, "return ts;");
        self.writer.write_line(0, "}");

        self.writer.write_line(
            0,
            &format!("{tscube} {tscube_ctor}(TextureCube t, SamplerState s) {{"),
        );
        self.writer.write_line(1, &format!("{tscube} ts;"));
        self.writer.write_line(1, "ts.t = t; ts.s = s;");
        self.writer.write_line(1, "return ts;");
        self.writer.write_line(0, "}");

        let tex2d = self.tex2d_fn.clone();
        self.writer
            .write_line(0, &format!("float4 {tex2d}({ts2d} ts, float2 texCoord) {{"));
        self.writer
            .write_line(1, "return ts.t.Sample(ts.s, texCoord);");
        self.writer.write_line(0, "}");

        let tex2d_proj = self.tex2d_proj_fn.clone();
        self.writer.write_line(
            0,
            &format!("float4 {tex2d_proj}({ts2d} ts, float4 texCoord) {{"),
        );
        self.writer
            .write_line(1, "return ts.t.Sample(ts.s, texCoord.xy / texCoord.w);");
        self.writer.write_line(0, "}");

        let tex2d_lod = self.tex2d_lod_fn.clone();
        self.writer.write_line(
            0,
            &format!("float4 {tex2d_lod}({ts2d} ts, float4 texCoord) {{"),
        );
        self.writer
            .write_line(1, "return ts.t.SampleLevel(ts.s, texCoord.xy, texCoord.w);");
        self.writer.write_line(0, "}");

        let tex_cube = self.tex_cube_fn.clone();
        self.writer.write_line(
            0,
            &format!("float4 {tex_cube}({tscube} ts, float3 texCoord) {{"),
        );
        self.writer
            .write_line(1, "return ts.t.Sample(ts.s, texCoord);");
        self.writer.write_line(0, "}");

        let tex_cube_bias = self.tex_cube_bias_fn.clone();
        self.writer.write_line(
            0,
            &format!("float4 {tex_cube_bias}({tscube} ts, float4 texCoord) {{"),
        );
        self.writer
            .write_line(1, "return ts.t.SampleBias(ts.s, texCoord.xyz, texCoord.w);");
        self.writer.write_line(0, "}");
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    fn output_expression_list(&mut self, args: ExprRange) {
        let list = self.module.expr_list(args);
        for (index, &arg) in list.iter().enumerate() {
            if index > 0 {
                self.writer.write(", ");
            }
            self.output_expression(arg);
        }
    }

    fn output_expression(&mut self, id: ExprId) {
        let module = self.module;
        let expr = module.expr(id);

        match &expr.kind {
            ExprKind::Identifier { name, global } => {
                let name_str = module.name(*name);
                if !self.legacy && is_sampler_type(&expr.ty) && *global {
                    // Global samplers were split into texture/sampler pairs;
                    // rebuild the pair object at each use.
                    let ctor = match expr.ty.base {
                        BaseType::Sampler2D => &self.texture_sampler_2d_ctor,
                        _ => &self.texture_sampler_cube_ctor,
                    };
                    let text = format!("{ctor}({name_str}_texture, {name_str}_sampler)");
                    self.writer.write(&text);
                } else {
                    let text = name_str.to_owned();
                    self.writer.write(&text);
                }
            }
            ExprKind::Cast { ty, expr: inner } => {
                self.writer.write("(");
                self.output_declaration_parts(ty, "", None);
                self.writer.write(")(");
                self.output_expression(*inner);
                self.writer.write(")");
            }
            ExprKind::Constructor { ty, args } => {
                self.writer.write(&format!("{}(", self.type_name(ty)));
                self.output_expression_list(*args);
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
                self.writer.write("(");
                if op.is_postfix() {
                    self.output_expression(*inner);
                    self.writer.write(op.symbol());
                } else {
                    self.writer.write(op.symbol());
                    self.output_expression(*inner);
                }
                self.writer.write(")");
            }
            ExprKind::Binary { op, left, right } => {
                self.writer.write("(");
                self.output_expression(*left);
                self.writer.write(&format!(" {} ", op.symbol()));
                self.output_expression(*right);
                self.writer.write(")");
            }
            ExprKind::Conditional {
                cond,
                if_true,
                if_false,
            } => {
                self.writer.write("((");
                self.output_expression(*cond);
                self.writer.write(")?(");
                self.output_expression(*if_true);
                self.writer.write("):(");
                self.output_expression(*if_false);
                self.writer.write("))");
            }
            ExprKind::Member { object, field } => {
                self.writer.write("(");
                self.output_expression(*object);
                let field_str = module.name(*field).to_owned();
                self.writer.write(&format!(").{field_str}"));
            }
            ExprKind::Index { array, index } => {
                self.output_expression(*array);
                self.writer.write("[");
                self.output_expression(*index);
                self.writer.write("]");
            }
            ExprKind::Call { callee, args } => {
                let name = callee_name(module, *callee);
                let name = if self.legacy {
                    name.to_owned()
                } else {
                    match name {
                        "tex2D" => self.tex2d_fn.clone(),
                        "tex2Dproj" => self.tex2d_proj_fn.clone(),
                        "tex2Dlod" => self.tex2d_lod_fn.clone(),
                        "texCUBE" => self.tex_cube_fn.clone(),
                        "texCUBEbias" => self.tex_cube_bias_fn.clone(),
                        other => other.to_owned(),
                    }
                };
                self.writer.write(&format!("{name}("));
                self.output_expression_list(*args);
                self.writer.write(")");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Declarations and statements
    // -------------------------------------------------------------------------

    fn output_declaration(&mut self, declaration: &Declaration) {
        let module = self.module;
        let name = module.name(declaration.name).to_owned();

        if !self.legacy && is_sampler_type(&declaration.ty) {
            // Split into an explicit texture/sampler pair; reuse the
            // register number for both bindings.
            let register: Option<i32> = declaration
                .register
                .and_then(|r| module.name(r).strip_prefix('s'))
                .and_then(|digits| digits.parse().ok());

            let texture_type = match declaration.ty.base {
                BaseType::Sampler2D => "Texture2D",
                _ => "TextureCube",
            };

            match register {
                Some(n) => self.writer.write(&format!(
                    "{texture_type} {name}_texture : register(t{n}); \
                     SamplerState {name}_sampler : register(s{n})"
                )),
                None => self.writer.write(&format!(
                    "{texture_type} {name}_texture; SamplerState {name}_sampler"
                )),
            }
            return;
        }

        self.output_declaration_parts(&declaration.ty, &name, None);

        // Registers only matter for samplers.
        if is_sampler_type(&declaration.ty) {
            if let Some(register) = declaration.register {
                let register = module.name(register).to_owned();
                self.writer.write(&format!(" : register({register})"));
            }
        }

        match declaration.assignment {
            Some(Init::List(list)) => {
                self.writer.write(" = { ");
                self.output_expression_list(list);
                self.writer.write(" }");
            }
            Some(Init::Expr(expr)) => {
                self.writer.write(" = ");
                self.output_expression(expr);
            }
            None => {}
        }
    }

    fn output_declaration_parts(&mut self, ty: &Type, name: &str, semantic: Option<&str>) {
        let mut type_name = self.type_name(ty);
        if !self.legacy {
            if ty.base == BaseType::Sampler2D {
                type_name = &self.texture_sampler_2d_struct;
            } else if ty.base == BaseType::SamplerCube {
                type_name = &self.texture_sampler_cube_struct;
            }
        }
        let type_name = type_name.to_owned();

        if ty.constant {
            self.writer.write("const ");
        }
        if !ty.array {
            match semantic {
                Some(semantic) => self
                    .writer
                    .write(&format!("{type_name} {name} : {semantic}")),
                None => self.writer.write(&format!("{type_name} {name}")),
            }
        } else {
            self.writer.write(&format!("{type_name} {name}["));
            if let Some(size) = ty.array_size {
                self.output_expression(size);
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
                ArgumentModifier::In => self.writer.write("in "),
                ArgumentModifier::Inout => self.writer.write("inout "),
                ArgumentModifier::Uniform => self.writer.write("uniform "),
                ArgumentModifier::None => {}
            }
            let name = module.name(arg.name).to_owned();
            let semantic = arg.semantic.map(|s| module.name(s).to_owned());
            self.output_declaration_parts(&arg.ty, &name, semantic.as_deref());
        }
    }

    fn output_statements(&mut self, indent: usize, stmts: &[StmtId]) {
        let module = self.module;

        for &stmt_id in stmts {
            let stmt = module.stmt(stmt_id);
            let file = module.name(stmt.loc.file).to_owned();
            let line = stmt.loc.line;

            match &stmt.kind {
                StmtKind::Declaration(declaration) => {
                    self.writer.begin_line_at(indent, &file, line);
                    self.output_declaration(declaration);
                    self.writer.end_line(";");
                }
                StmtKind::Struct(structure) => {
                    let name = module.name(structure.name);
                    self.writer.write_line(indent, &format!("struct {name} {{"));
                    for field in module.fields(structure.fields) {
                        let field_file = module.name(field.loc.file).to_owned();
                        self.writer
                            .begin_line_at(indent + 1, &field_file, field.loc.line);
                        let field_name = module.name(field.name).to_owned();
                        let semantic = field.semantic.map(|s| module.name(s).to_owned());
                        self.output_declaration_parts(&field.ty, &field_name, semantic.as_deref());
                        self.writer.write(";");
                        self.writer.end_line("");
                    }
                    self.writer.write_line(indent, "};");
                }
                StmtKind::Buffer(buffer) => {
                    if !self.legacy {
                        self.writer.begin_line_at(indent, &file, line);
                        let name = buffer.name.map(|n| module.name(n)).unwrap_or("");
                        self.writer.write(&format!("cbuffer {name}"));
                        if let Some(register) = buffer.register {
                            let register = module.name(register).to_owned();
                            self.writer.write(&format!(" : register({register})"));
                        }
                        self.writer.end_line(" {");
                    }

                    for field in module.buffer_fields(buffer.fields) {
                        let field_file = module.name(field.loc.file).to_owned();
                        self.writer
                            .begin_line_at(indent + 1, &field_file, field.loc.line);
                        let field_name = module.name(field.name).to_owned();
                        self.output_declaration_parts(&field.ty, &field_name, None);
                        self.writer.write(";");
                        self.writer.end_line("");
                    }

                    if !self.legacy {
                        self.writer.write_line(indent, "};");
                    }
                }
                StmtKind::Function(function) => {
                    let function_name = module.name(function.name).to_owned();
                    let return_type_name = self.type_name(&function.return_type).to_owned();

                    self.writer.begin_line_at(indent, &file, line);
                    self.writer
                        .write(&format!("{return_type_name} {function_name}("));
                    let args: Vec<Argument> = module.args(function.args).to_vec();
                    self.output_arguments(&args);

                    match function.semantic {
                        Some(semantic) => {
                            let semantic = module.name(semantic).to_owned();
                            self.writer.write(&format!(") : {semantic} {{"));
                        }
                        None => self.writer.write(") {"),
                    }
                    self.writer.end_line("");

                    let body: Vec<StmtId> = module.stmt_list(function.body).to_vec();
                    self.output_statements(indent + 1, &body);
                    self.writer.write_line(indent, "};");
                }
                StmtKind::Expression(expression) => {
                    self.writer.begin_line_at(indent, &file, line);
                    self.output_expression(*expression);
                    self.writer.end_line(";");
                }
                StmtKind::Return(expression) => match expression {
                    Some(expression) => {
                        self.writer.begin_line_at(indent, &file, line);
                        self.writer.write("return ");
                        self.output_expression(*expression);
                        self.writer.end_line(";");
                    }
                    None => {
                        self.writer.write_line_at(indent, &file, line, "return;");
                    }
                },
                StmtKind::Discard => {
                    self.writer.write_line_at(indent, &file, line, "discard;");
                }
                StmtKind::Break => {
                    self.writer.write_line_at(indent, &file, line, "break;");
                }
                StmtKind::Continue => {
                    self.writer.write_line_at(indent, &file, line, "continue;");
                }
                StmtKind::If(if_stmt) => {
                    self.writer.begin_line_at(indent, &file, line);
                    self.writer.write("if (");
                    self.output_expression(if_stmt.cond);
                    self.writer.write(") {");
                    self.writer.end_line("");
                    let then_body: Vec<StmtId> = module.stmt_list(if_stmt.then_body).to_vec();
                    self.output_statements(indent + 1, &then_body);
                    self.writer.write_line(indent, "}");
                    if let Some(else_body) = if_stmt.else_body {
                        self.writer.write_line(indent, "else {");
                        let else_body: Vec<StmtId> = module.stmt_list(else_body).to_vec();
                        self.output_statements(indent + 1, &else_body);
                        self.writer.write_line(indent, "}");
                    }
                }
                StmtKind::For(for_stmt) => {
                    self.writer.begin_line_at(indent, &file, line);
                    self.writer.write("for (");
                    if let StmtKind::Declaration(init) = &module.stmt(for_stmt.init).kind {
                        self.output_declaration(init);
                    }
                    self.writer.write("; ");
                    if let Some(cond) = for_stmt.cond {
                        self.output_expression(cond);
                    }
                    self.writer.write("; ");
                    if let Some(increment) = for_stmt.increment {
                        self.output_expression(increment);
                    }
                    self.writer.write(") {");
                    self.writer.end_line("");
                    let body: Vec<StmtId> = module.stmt_list(for_stmt.body).to_vec();
                    self.output_statements(indent + 1, &body);
                    self.writer.write_line(indent, "}");
                }
            }
        }
    }
}
