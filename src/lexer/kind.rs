//! Token kinds and their lexical patterns.

use std::fmt;

use logos::Logos;

use super::{
    count_newline, lex_float, lex_half, lex_hex_int, lex_int, scan_block_comment, LexErrorKind,
    LexerState,
};
use crate::ast::BaseType;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexErrorKind)]
#[logos(extras = LexerState)]
#[logos(skip r"[ \t\r]+")]
pub enum TokenKind {
    // Trivia. The variants exist so the callbacks can maintain the line
    // counter; tokenize() drops them from the stream.
    #[regex(r"\n", count_newline)]
    Newline,
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,
    #[token("/*", scan_block_comment)]
    BlockComment,

    // Type keywords.
    #[token("float")]
    Float,
    #[token("float2")]
    Float2,
    #[token("float3")]
    Float3,
    #[token("float4")]
    Float4,
    #[token("float3x3")]
    Float3x3,
    #[token("float4x4")]
    Float4x4,
    #[token("half")]
    Half,
    #[token("half2")]
    Half2,
    #[token("half3")]
    Half3,
    #[token("half4")]
    Half4,
    #[token("half3x3")]
    Half3x3,
    #[token("half4x4")]
    Half4x4,
    #[token("bool")]
    Bool,
    #[token("int")]
    Int,
    #[token("int2")]
    Int2,
    #[token("int3")]
    Int3,
    #[token("int4")]
    Int4,
    #[token("uint")]
    Uint,
    #[token("uint2")]
    Uint2,
    #[token("uint3")]
    Uint3,
    #[token("uint4")]
    Uint4,
    #[token("texture")]
    Texture,
    #[token("sampler2D")]
    Sampler2D,
    #[token("samplerCUBE")]
    SamplerCube,

    // Other keywords.
    #[token("const")]
    Const,
    #[token("void")]
    Void,
    #[token("struct")]
    Struct,
    #[token("cbuffer")]
    CBuffer,
    #[token("tbuffer")]
    TBuffer,
    #[token("register")]
    Register,
    #[token("packoffset")]
    PackOffset,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("return")]
    Return,
    #[token("discard")]
    Discard,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("in")]
    In,
    #[token("out")]
    Out,
    #[token("inout")]
    InOut,
    #[token("uniform")]
    Uniform,

    // Compound punctuation (before the single characters they start with).
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    BarBar,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("*=")]
    TimesEqual,
    #[token("/=")]
    DivideEqual,

    // Single-character punctuation.
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Times,
    #[token("/")]
    Divide,
    #[token("=")]
    Equal,
    #[token("!")]
    Bang,

    // Literals. Suffixed forms pick the float/half kinds; `h` marks half.
    #[regex(
        r"([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?[fF]?|[0-9]+[eE][+-]?[0-9]+[fF]?|[0-9]+[fF]",
        lex_float
    )]
    FloatLiteral(f32),
    #[regex(
        r"([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?[hH]|[0-9]+([eE][+-]?[0-9]+)?[hH]",
        lex_half
    )]
    HalfLiteral(f32),
    #[regex(r"[0-9]+", lex_int)]
    #[regex(r"0[xX][0-9a-fA-F]+", lex_hex_int)]
    IntLiteral(i32),

    // Identifiers.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_owned())]
    Identifier(String),

    // Appended by tokenize(); never produced by a lexical pattern.
    EndOfStream,
}

impl TokenKind {
    /// Map a type keyword to its base type.
    pub fn base_type(&self) -> Option<BaseType> {
        Some(match self {
            TokenKind::Float => BaseType::Float,
            TokenKind::Float2 => BaseType::Float2,
            TokenKind::Float3 => BaseType::Float3,
            TokenKind::Float4 => BaseType::Float4,
            TokenKind::Float3x3 => BaseType::Float3x3,
            TokenKind::Float4x4 => BaseType::Float4x4,
            TokenKind::Half => BaseType::Half,
            TokenKind::Half2 => BaseType::Half2,
            TokenKind::Half3 => BaseType::Half3,
            TokenKind::Half4 => BaseType::Half4,
            TokenKind::Half3x3 => BaseType::Half3x3,
            TokenKind::Half4x4 => BaseType::Half4x4,
            TokenKind::Bool => BaseType::Bool,
            TokenKind::Int => BaseType::Int,
            TokenKind::Int2 => BaseType::Int2,
            TokenKind::Int3 => BaseType::Int3,
            TokenKind::Int4 => BaseType::Int4,
            TokenKind::Uint => BaseType::Uint,
            TokenKind::Uint2 => BaseType::Uint2,
            TokenKind::Uint3 => BaseType::Uint3,
            TokenKind::Uint4 => BaseType::Uint4,
            TokenKind::Texture => BaseType::Texture,
            TokenKind::Sampler2D => BaseType::Sampler2D,
            TokenKind::SamplerCube => BaseType::SamplerCube,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::LineComment | TokenKind::BlockComment => f.write_str("comment"),
            TokenKind::Float => f.write_str("float"),
            TokenKind::Float2 => f.write_str("float2"),
            TokenKind::Float3 => f.write_str("float3"),
            TokenKind::Float4 => f.write_str("float4"),
            TokenKind::Float3x3 => f.write_str("float3x3"),
            TokenKind::Float4x4 => f.write_str("float4x4"),
            TokenKind::Half => f.write_str("half"),
            TokenKind::Half2 => f.write_str("half2"),
            TokenKind::Half3 => f.write_str("half3"),
            TokenKind::Half4 => f.write_str("half4"),
            TokenKind::Half3x3 => f.write_str("half3x3"),
            TokenKind::Half4x4 => f.write_str("half4x4"),
            TokenKind::Bool => f.write_str("bool"),
            TokenKind::Int => f.write_str("int"),
            TokenKind::Int2 => f.write_str("int2"),
            TokenKind::Int3 => f.write_str("int3"),
            TokenKind::Int4 => f.write_str("int4"),
            TokenKind::Uint => f.write_str("uint"),
            TokenKind::Uint2 => f.write_str("uint2"),
            TokenKind::Uint3 => f.write_str("uint3"),
            TokenKind::Uint4 => f.write_str("uint4"),
            TokenKind::Texture => f.write_str("texture"),
            TokenKind::Sampler2D => f.write_str("sampler2D"),
            TokenKind::SamplerCube => f.write_str("samplerCUBE"),
            TokenKind::Const => f.write_str("const"),
            TokenKind::Void => f.write_str("void"),
            TokenKind::Struct => f.write_str("struct"),
            TokenKind::CBuffer => f.write_str("cbuffer"),
            TokenKind::TBuffer => f.write_str("tbuffer"),
            TokenKind::Register => f.write_str("register"),
            TokenKind::PackOffset => f.write_str("packoffset"),
            TokenKind::If => f.write_str("if"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::For => f.write_str("for"),
            TokenKind::Return => f.write_str("return"),
            TokenKind::Discard => f.write_str("discard"),
            TokenKind::Break => f.write_str("break"),
            TokenKind::Continue => f.write_str("continue"),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::In => f.write_str("in"),
            TokenKind::Out => f.write_str("out"),
            TokenKind::InOut => f.write_str("inout"),
            TokenKind::Uniform => f.write_str("uniform"),
            TokenKind::EqualEqual => f.write_str("=="),
            TokenKind::NotEqual => f.write_str("!="),
            TokenKind::LessEqual => f.write_str("<="),
            TokenKind::GreaterEqual => f.write_str(">="),
            TokenKind::AndAnd => f.write_str("&&"),
            TokenKind::BarBar => f.write_str("||"),
            TokenKind::PlusPlus => f.write_str("++"),
            TokenKind::MinusMinus => f.write_str("--"),
            TokenKind::PlusEqual => f.write_str("+="),
            TokenKind::MinusEqual => f.write_str("-="),
            TokenKind::TimesEqual => f.write_str("*="),
            TokenKind::DivideEqual => f.write_str("/="),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Question => f.write_str("?"),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Times => f.write_str("*"),
            TokenKind::Divide => f.write_str("/"),
            TokenKind::Equal => f.write_str("="),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::FloatLiteral(v) => write!(f, "{v}"),
            TokenKind::HalfLiteral(v) => write!(f, "{v}"),
            TokenKind::IntLiteral(v) => write!(f, "{v}"),
            TokenKind::Identifier(s) => f.write_str(s),
            TokenKind::EndOfStream => f.write_str("end of file"),
        }
    }
}
