use pretty_assertions::assert_eq;

use super::{tokenize, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source, "test.hlsl")
        .expect("tokenize should succeed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_punctuation() {
    assert_eq!(
        kinds("(){}[];,.:?"),
        vec![
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Semicolon,
            TokenKind::Comma,
            TokenKind::Dot,
            TokenKind::Colon,
            TokenKind::Question,
            TokenKind::EndOfStream,
        ]
    );
}

#[test]
fn test_compound_punctuation() {
    assert_eq!(
        kinds("== != <= >= && || ++ -- += -= *= /="),
        vec![
            TokenKind::EqualEqual,
            TokenKind::NotEqual,
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
            TokenKind::AndAnd,
            TokenKind::BarBar,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::PlusEqual,
            TokenKind::MinusEqual,
            TokenKind::TimesEqual,
            TokenKind::DivideEqual,
            TokenKind::EndOfStream,
        ]
    );
}

#[test]
fn test_keywords_and_identifiers() {
    assert_eq!(
        kinds("float4 color uniform samplerCUBE env"),
        vec![
            TokenKind::Float4,
            TokenKind::Identifier("color".to_owned()),
            TokenKind::Uniform,
            TokenKind::SamplerCube,
            TokenKind::Identifier("env".to_owned()),
            TokenKind::EndOfStream,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    // `floatish` must not lex as `float` + `ish`.
    assert_eq!(
        kinds("floatish"),
        vec![
            TokenKind::Identifier("floatish".to_owned()),
            TokenKind::EndOfStream
        ]
    );
}

#[test]
fn test_int_literals() {
    assert_eq!(
        kinds("0 42 0x1F"),
        vec![
            TokenKind::IntLiteral(0),
            TokenKind::IntLiteral(42),
            TokenKind::IntLiteral(31),
            TokenKind::EndOfStream,
        ]
    );
}

#[test]
fn test_float_literals() {
    assert_eq!(
        kinds("1.0 .5 2. 1e3 1.5e-2 3f"),
        vec![
            TokenKind::FloatLiteral(1.0),
            TokenKind::FloatLiteral(0.5),
            TokenKind::FloatLiteral(2.0),
            TokenKind::FloatLiteral(1000.0),
            TokenKind::FloatLiteral(0.015),
            TokenKind::FloatLiteral(3.0),
            TokenKind::EndOfStream,
        ]
    );
}

#[test]
fn test_half_literals() {
    assert_eq!(
        kinds("1.0h 2h"),
        vec![
            TokenKind::HalfLiteral(1.0),
            TokenKind::HalfLiteral(2.0),
            TokenKind::EndOfStream,
        ]
    );
}

#[test]
fn test_int_saturates() {
    assert_eq!(
        kinds("99999999999"),
        vec![TokenKind::IntLiteral(i32::MAX), TokenKind::EndOfStream]
    );
}

#[test]
fn test_comments_skipped() {
    assert_eq!(
        kinds("a // line comment\nb /* block */ c"),
        vec![
            TokenKind::Identifier("a".to_owned()),
            TokenKind::Identifier("b".to_owned()),
            TokenKind::Identifier("c".to_owned()),
            TokenKind::EndOfStream,
        ]
    );
}

#[test]
fn test_line_tracking() {
    let tokens = tokenize("a\nb\n\nc", "test.hlsl").expect("tokenize should succeed");
    let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
    // a=1, b=2, c=4, eof=4
    assert_eq!(lines, vec![1, 2, 4, 4]);
}

#[test]
fn test_line_tracking_through_block_comment() {
    let tokens = tokenize("/* one\ntwo\n*/ x", "test.hlsl").expect("tokenize should succeed");
    assert_eq!(tokens[0].kind, TokenKind::Identifier("x".to_owned()));
    assert_eq!(tokens[0].line, 3);
}

#[test]
fn test_unknown_character() {
    let err = tokenize("float4 @", "test.hlsl").expect_err("should fail");
    assert_eq!(
        err.to_string(),
        "test.hlsl:1: Syntax error: unexpected character '@'"
    );
}

#[test]
fn test_unterminated_block_comment() {
    let err = tokenize("x /* never closed", "test.hlsl").expect_err("should fail");
    assert_eq!(
        err.to_string(),
        "test.hlsl:1: Syntax error: unterminated block comment"
    );
}
