// HLSL shader translator library.
//
// Translates D3D-style HLSL into GLSL 1.40 or a normalized HLSL
// pretty-print. Usable as a library or through the hlslc binary.
//
// Pipeline: Source → Lexer → Parser (typed AST in an arena) → GLSL/HLSL
// code generator.

pub mod ast;
pub mod codegen;
pub mod errors;
pub mod intern;
pub mod lexer;
pub mod parser;
pub mod types;

pub use ast::Module;
pub use codegen::Target;
pub use errors::{CompileError, Result};

/// Parse HLSL source into a typed AST. `file_name` is used for diagnostics
/// and `#line` markers only; the compiler itself does no file I/O.
pub fn parse(source: &str, file_name: &str) -> Result<Module> {
    let tokens = lexer::tokenize(source, file_name)?;
    parser::parse(&tokens, file_name)
}

/// Translate HLSL source to GLSL 1.40 for the given stage and entry point.
pub fn translate_glsl(
    source: &str,
    file_name: &str,
    target: Target,
    entry_name: &str,
) -> Result<String> {
    let module = parse(source, file_name)?;
    codegen::glsl::generate(&module, target, entry_name)
}

/// Pretty-print HLSL source as normalized HLSL. Legacy mode targets the
/// D3D9 dialect with combined sampler types.
pub fn print_hlsl(source: &str, file_name: &str, legacy: bool) -> Result<String> {
    let module = parse(source, file_name)?;
    Ok(codegen::hlsl::generate(&module, legacy))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SHADER: &str = "\
struct PSIn { float4 color : COLOR0; };
float4 main(PSIn i) : SV_TARGET { return i.color; }
";

    #[test]
    fn test_parse_simple() {
        let module = parse(SIMPLE_SHADER, "test.hlsl").expect("parse should succeed");
        assert_eq!(module.root().len(), 2);
    }

    #[test]
    fn test_parse_syntax_error() {
        let result = parse("float4 main( {", "test.hlsl");
        assert!(result.is_err());
    }

    #[test]
    fn test_translate_glsl_simple() {
        let glsl = translate_glsl(SIMPLE_SHADER, "test.hlsl", Target::Fragment, "main")
            .expect("translation should succeed");
        assert!(glsl.contains("#version 140"));
        assert!(glsl.contains("void main()"));
    }

    #[test]
    fn test_translate_glsl_missing_entry() {
        let result = translate_glsl(SIMPLE_SHADER, "test.hlsl", Target::Fragment, "nope");
        assert_eq!(
            result.expect_err("should fail").to_string(),
            "Entry point 'nope' doesn't exist"
        );
    }

    #[test]
    fn test_print_hlsl_simple() {
        let hlsl = print_hlsl(SIMPLE_SHADER, "test.hlsl", true).expect("print should succeed");
        assert!(hlsl.contains("struct PSIn {"));
        assert!(hlsl.contains("float4 color : COLOR0;"));
    }
}
