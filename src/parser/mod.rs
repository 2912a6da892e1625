//! Recursive-descent parser.
//!
//! Consumes the token stream and builds the typed AST in the module arena.
//! Identifier resolution is eager: a scoped variable stack (with sentinel
//! frames marking scope boundaries) resolves every identifier as it is
//! parsed, and every expression node carries its inferred type by the time
//! the enclosing statement is finished.

mod expr;

use crate::ast::{
    Argument, ArgumentModifier, ArgRange, BaseType, BufferDef, BufferField, Declaration, ForStmt,
    IfStmt, Init, Loc, Module, Stmt, StmtId, StmtKind, StmtRange, StructDef, StructField, Type,
};
use crate::errors::{CompileError, Result};
use crate::intern::Name;
use crate::lexer::{Token, TokenKind};
use crate::types;

/// Parse a token stream into a module. `file_name` is used for diagnostics
/// and for the `#line` markers the emitters produce.
pub fn parse(tokens: &[Token], file_name: &str) -> Result<Module> {
    Parser::new(tokens, file_name).parse_module()
}

struct ScopeEntry {
    /// `None` marks a scope boundary.
    name: Option<Name>,
    ty: Type,
}

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    module: Module,
    file: Name,
    file_name: &'a str,
    variables: Vec<ScopeEntry>,
    num_globals: usize,
    functions: Vec<StmtId>,
    user_types: Vec<StmtId>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], file_name: &'a str) -> Self {
        let mut module = Module::new();
        let file = module.intern(file_name);
        Parser {
            tokens,
            pos: 0,
            module,
            file,
            file_name,
            variables: Vec::new(),
            num_globals: 0,
            functions: Vec::new(),
            user_types: Vec::new(),
        }
    }

    fn parse_module(mut self) -> Result<Module> {
        tracing::debug!(file = self.file_name, "parsing translation unit");
        while !self.accept(TokenKind::EndOfStream) {
            if let Some(stmt) = self.parse_top_level()? {
                self.module.push_root(stmt);
            }
        }
        tracing::debug!(
            statements = self.module.root().len(),
            expressions = self.module.expr_count(),
            "parse complete"
        );
        Ok(self.module)
    }

    // -------------------------------------------------------------------------
    // Token cursor
    // -------------------------------------------------------------------------

    #[inline]
    fn current_kind(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    #[inline]
    fn line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    #[inline]
    fn loc(&self) -> Loc {
        Loc {
            file: self.file,
            line: self.line(),
        }
    }

    #[inline]
    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::EndOfStream)
    }

    #[inline]
    fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn accept(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.accept(kind.clone()) {
            Ok(())
        } else {
            Err(self.error(format!(
                "Syntax error: expected '{kind}' near '{}'",
                self.current_kind()
            )))
        }
    }

    /// Soft keyword: accept an identifier with this exact spelling.
    fn accept_word(&mut self, word: &str) -> bool {
        if matches!(self.current_kind(), TokenKind::Identifier(s) if s == word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn accept_identifier(&mut self) -> Option<Name> {
        let text = match self.current_kind() {
            TokenKind::Identifier(s) => s.clone(),
            _ => return None,
        };
        let name = self.module.intern(&text);
        self.advance();
        Some(name)
    }

    fn expect_identifier(&mut self) -> Result<Name> {
        self.accept_identifier().ok_or_else(|| {
            self.error(format!(
                "Syntax error: expected identifier near '{}'",
                self.current_kind()
            ))
        })
    }

    fn accept_int(&mut self) -> Option<i32> {
        if let TokenKind::IntLiteral(value) = *self.current_kind() {
            self.advance();
            Some(value)
        } else {
            None
        }
    }

    fn accept_float(&mut self) -> Option<f32> {
        if let TokenKind::FloatLiteral(value) = *self.current_kind() {
            self.advance();
            Some(value)
        } else {
            None
        }
    }

    fn accept_half(&mut self) -> Option<f32> {
        if let TokenKind::HalfLiteral(value) = *self.current_kind() {
            self.advance();
            Some(value)
        } else {
            None
        }
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::at(self.file_name, self.line(), message)
    }

    fn check_unexpected_eof(&mut self, end: &TokenKind) -> Result<()> {
        if self.accept(TokenKind::EndOfStream) {
            Err(self.error(format!(
                "Unexpected end of file while looking for '{end}'"
            )))
        } else {
            Ok(())
        }
    }

    // -------------------------------------------------------------------------
    // Scope stack
    // -------------------------------------------------------------------------

    fn begin_scope(&mut self) {
        self.variables.push(ScopeEntry {
            name: None,
            ty: Type::unknown(),
        });
    }

    fn end_scope(&mut self) {
        while let Some(entry) = self.variables.pop() {
            if entry.name.is_none() {
                break;
            }
        }
    }

    fn declare_variable(&mut self, name: Name, ty: Type) {
        // Declarations before the first scope opens extend the global region.
        if self.variables.len() == self.num_globals {
            self.num_globals += 1;
        }
        self.variables.push(ScopeEntry {
            name: Some(name),
            ty,
        });
    }

    /// Innermost binding for `name`, plus whether it lives in the global
    /// region.
    fn find_variable(&self, name: Name) -> Option<(Type, bool)> {
        self.variables
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entry)| entry.name == Some(name))
            .map(|(index, entry)| (entry.ty, index < self.num_globals))
    }

    fn find_user_type(&self, name: Name) -> Option<StmtId> {
        self.user_types.iter().copied().find(|&id| {
            matches!(&self.module.stmt(id).kind, StmtKind::Struct(s) if s.name == name)
        })
    }

    fn is_function(&self, name: Name, name_str: &str) -> bool {
        self.functions
            .iter()
            .any(|&id| self.module.function(id).name == name)
            || types::intrinsics::is_intrinsic_name(name_str)
    }

    // -------------------------------------------------------------------------
    // Types and declarations
    // -------------------------------------------------------------------------

    /// Accept a type name: a built-in keyword or a previously declared
    /// struct. When `allow_const` is set, a leading `const` is consumed even
    /// if no type follows.
    fn accept_type(
        &mut self,
        allow_void: bool,
        allow_const: bool,
    ) -> Option<(BaseType, Option<Name>, bool)> {
        let constant = allow_const && self.accept(TokenKind::Const);

        if let Some(base) = self.current_kind().base_type() {
            self.advance();
            return Some((base, None, constant));
        }
        if allow_void && self.accept(TokenKind::Void) {
            return Some((BaseType::Void, None, constant));
        }

        let identifier = match self.current_kind() {
            TokenKind::Identifier(s) => Some(s.clone()),
            _ => None,
        };
        if let Some(text) = identifier {
            let name = self.module.intern(&text);
            if self.find_user_type(name).is_some() {
                self.advance();
                return Some((BaseType::UserDefined, Some(name), constant));
            }
        }
        None
    }

    /// `type name [ '[' [expr] ']' ]`.
    fn accept_declaration(&mut self, allow_unsized_array: bool) -> Result<Option<(Type, Name)>> {
        let Some((base, type_name, constant)) = self.accept_type(false, true) else {
            return Ok(None);
        };
        let mut ty = Type::new(base);
        ty.type_name = type_name;
        ty.constant = constant;

        let name = self.expect_identifier()?;

        if self.accept(TokenKind::LBracket) {
            ty.array = true;
            if !(self.accept(TokenKind::RBracket) && allow_unsized_array) {
                ty.array_size = Some(self.parse_expression()?);
                self.expect(TokenKind::RBracket)?;
            }
        }
        Ok(Some((ty, name)))
    }

    fn expect_declaration(&mut self, allow_unsized_array: bool) -> Result<(Type, Name)> {
        match self.accept_declaration(allow_unsized_array)? {
            Some(decl) => Ok(decl),
            None => Err(self.error("Expected declaration")),
        }
    }

    fn check_type_cast(&self, src: Type, dst: Type) -> Result<()> {
        if types::cast_rank(&src, &dst) == -1 {
            let src_name = types::type_name(&self.module, &src);
            let dst_name = types::type_name(&self.module, &dst);
            return Err(self.error(format!(
                "Cannot implicitly convert from '{src_name}' to '{dst_name}'"
            )));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Top level
    // -------------------------------------------------------------------------

    fn parse_top_level(&mut self) -> Result<Option<StmtId>> {
        let loc = self.loc();
        let mut statement = None;

        if self.accept(TokenKind::Struct) {
            statement = Some(self.parse_struct(loc)?);
        } else if self.accept(TokenKind::CBuffer) || self.accept(TokenKind::TBuffer) {
            statement = Some(self.parse_buffer(loc)?);
        } else if let Some((base, type_name, constant)) = self.accept_type(true, true) {
            let name = self.expect_identifier()?;

            if self.accept(TokenKind::LParen) {
                // Function definition; no trailing semicolon.
                return Ok(Some(self.parse_function(loc, base, type_name, name)?));
            }

            // Uniform declaration.
            let mut ty = Type::new(base);
            ty.type_name = type_name;
            ty.constant = constant;

            if self.accept(TokenKind::LBracket) {
                if !self.accept(TokenKind::RBracket) {
                    ty.array_size = Some(self.parse_expression()?);
                    self.expect(TokenKind::RBracket)?;
                }
                ty.array = true;
            }

            let register = if self.accept(TokenKind::Colon) {
                Some(self.parse_register()?)
            } else {
                None
            };

            self.declare_variable(name, ty);
            let assignment = self.parse_declaration_assignment(ty)?;

            statement = Some(self.module.add_stmt(Stmt {
                kind: StmtKind::Declaration(Declaration {
                    name,
                    ty,
                    register,
                    assignment,
                }),
                loc,
            }));
        }

        self.expect(TokenKind::Semicolon)?;
        Ok(statement)
    }

    fn parse_register(&mut self) -> Result<Name> {
        self.expect(TokenKind::Register)?;
        self.expect(TokenKind::LParen)?;
        let register = self.expect_identifier()?;
        self.expect(TokenKind::RParen)?;
        Ok(register)
    }

    fn parse_struct(&mut self, loc: Loc) -> Result<StmtId> {
        let name = self.expect_identifier()?;
        if self.find_user_type(name).is_some() {
            return Err(self.error(format!("struct {} already defined", self.module.name(name))));
        }
        self.expect(TokenKind::LBrace)?;

        // Register the struct before its fields so they can refer to it.
        let stmt_id = self.module.add_stmt(Stmt {
            kind: StmtKind::Struct(StructDef {
                name,
                fields: crate::ast::FieldRange::EMPTY,
            }),
            loc,
        });
        self.user_types.push(stmt_id);

        let mut fields = Vec::new();
        while !self.accept(TokenKind::RBrace) {
            self.check_unexpected_eof(&TokenKind::RBrace)?;
            fields.push(self.parse_field_declaration()?);
        }
        let range = self.module.add_fields(fields);
        if let StmtKind::Struct(s) = &mut self.module.stmt_mut(stmt_id).kind {
            s.fields = range;
        }
        Ok(stmt_id)
    }

    fn parse_field_declaration(&mut self) -> Result<StructField> {
        let loc = self.loc();
        let (ty, name) = self.expect_declaration(false)?;
        let semantic = if self.accept(TokenKind::Colon) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(StructField {
            name,
            ty,
            semantic,
            loc,
        })
    }

    fn parse_buffer(&mut self, loc: Loc) -> Result<StmtId> {
        let name = self.accept_identifier();
        let register = if self.accept(TokenKind::Colon) {
            Some(self.parse_register()?)
        } else {
            None
        };

        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.accept(TokenKind::RBrace) {
            self.check_unexpected_eof(&TokenKind::RBrace)?;
            match self.parse_buffer_field_declaration()? {
                Some(field) => {
                    self.declare_variable(field.name, field.ty);
                    fields.push(field);
                }
                None => return Err(self.error("Expected variable declaration")),
            }
        }
        let range = self.module.add_buffer_fields(fields);

        Ok(self.module.add_stmt(Stmt {
            kind: StmtKind::Buffer(BufferDef {
                name,
                register,
                fields: range,
            }),
            loc,
        }))
    }

    fn parse_buffer_field_declaration(&mut self) -> Result<Option<BufferField>> {
        let loc = self.loc();
        let Some((ty, name)) = self.accept_declaration(false)? else {
            return Ok(None);
        };
        // Optional packoffset annotation, parsed and discarded.
        if self.accept(TokenKind::Colon) {
            self.expect(TokenKind::PackOffset)?;
            self.expect(TokenKind::LParen)?;
            self.expect_identifier()?;
            self.expect(TokenKind::Dot)?;
            self.expect_identifier()?;
            self.expect(TokenKind::RParen)?;
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(Some(BufferField { name, ty, loc }))
    }

    fn parse_function(
        &mut self,
        loc: Loc,
        base: BaseType,
        type_name: Option<Name>,
        name: Name,
    ) -> Result<StmtId> {
        let mut return_type = Type::new(base);
        return_type.type_name = type_name;

        let stmt_id = self.module.add_stmt(Stmt {
            kind: StmtKind::Function(crate::ast::Function {
                name,
                return_type,
                semantic: None,
                args: ArgRange::EMPTY,
                body: StmtRange::EMPTY,
            }),
            loc,
        });

        self.begin_scope();

        let args = self.parse_argument_list(TokenKind::RParen)?;
        let arg_range = self.module.add_args(args);

        let semantic = if self.accept(TokenKind::Colon) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        // Fill in the signature before the body so calls inside the body
        // (including recursive ones) resolve against it.
        if let StmtKind::Function(f) = &mut self.module.stmt_mut(stmt_id).kind {
            f.args = arg_range;
            f.semantic = semantic;
        }
        self.functions.push(stmt_id);

        self.expect(TokenKind::LBrace)?;
        let body = self.parse_block(&return_type)?;
        self.end_scope();

        if let StmtKind::Function(f) = &mut self.module.stmt_mut(stmt_id).kind {
            f.body = body;
        }
        Ok(stmt_id)
    }

    fn parse_argument_list(&mut self, end: TokenKind) -> Result<Vec<Argument>> {
        let loc = self.loc();
        let mut args = Vec::new();

        while !self.accept(end.clone()) {
            self.check_unexpected_eof(&end)?;
            if !args.is_empty() {
                self.expect(TokenKind::Comma)?;
            }

            let modifier = if self.accept(TokenKind::Uniform) {
                ArgumentModifier::Uniform
            } else if self.accept(TokenKind::In) {
                ArgumentModifier::In
            } else if self.accept(TokenKind::InOut) {
                ArgumentModifier::Inout
            } else {
                ArgumentModifier::None
            };

            let (ty, name) = self.expect_declaration(true)?;
            self.declare_variable(name, ty);

            let semantic = if self.accept(TokenKind::Colon) {
                Some(self.expect_identifier()?)
            } else {
                None
            };

            // Interpolation modifiers are contextual words, accepted and
            // dropped.
            let _ = self.accept_word("linear")
                || self.accept_word("centroid")
                || self.accept_word("nointerpolation")
                || self.accept_word("noperspective")
                || self.accept_word("sample");

            args.push(Argument {
                name,
                modifier,
                ty,
                semantic,
                loc,
            });
        }
        Ok(args)
    }

    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------

    fn parse_block(&mut self, return_type: &Type) -> Result<StmtRange> {
        let mut stmts = Vec::new();
        while !self.accept(TokenKind::RBrace) {
            self.check_unexpected_eof(&TokenKind::RBrace)?;
            if let Some(stmt) = self.parse_statement(return_type)? {
                stmts.push(stmt);
            }
        }
        Ok(self.module.add_stmt_list(stmts))
    }

    fn parse_statement_or_block(&mut self, return_type: &Type) -> Result<StmtRange> {
        if self.accept(TokenKind::LBrace) {
            self.begin_scope();
            let range = self.parse_block(return_type)?;
            self.end_scope();
            Ok(range)
        } else {
            match self.parse_statement(return_type)? {
                Some(id) => Ok(self.module.add_stmt_list([id])),
                None => Ok(self.module.add_stmt_list([])),
            }
        }
    }

    fn parse_statement(&mut self, return_type: &Type) -> Result<Option<StmtId>> {
        let loc = self.loc();

        // Empty statement.
        if self.accept(TokenKind::Semicolon) {
            return Ok(None);
        }

        if self.accept(TokenKind::If) {
            self.expect(TokenKind::LParen)?;
            let cond = self.parse_expression()?;
            self.expect(TokenKind::RParen)?;
            let then_body = self.parse_statement_or_block(return_type)?;
            let else_body = if self.accept(TokenKind::Else) {
                Some(self.parse_statement_or_block(return_type)?)
            } else {
                None
            };
            return Ok(Some(self.module.add_stmt(Stmt {
                kind: StmtKind::If(IfStmt {
                    cond,
                    then_body,
                    else_body,
                }),
                loc,
            })));
        }

        if self.accept(TokenKind::For) {
            self.expect(TokenKind::LParen)?;
            self.begin_scope();
            let init = match self.parse_declaration()? {
                Some(id) => id,
                None => return Err(self.error("Expected declaration")),
            };
            self.expect(TokenKind::Semicolon)?;
            let cond = if self.check(&TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(TokenKind::Semicolon)?;
            let increment = if self.check(&TokenKind::RParen) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(TokenKind::RParen)?;
            let body = self.parse_statement_or_block(return_type)?;
            self.end_scope();
            return Ok(Some(self.module.add_stmt(Stmt {
                kind: StmtKind::For(ForStmt {
                    init,
                    cond,
                    increment,
                    body,
                }),
                loc,
            })));
        }

        if self.accept(TokenKind::Discard) {
            self.expect(TokenKind::Semicolon)?;
            return Ok(Some(self.module.add_stmt(Stmt {
                kind: StmtKind::Discard,
                loc,
            })));
        }

        if self.accept(TokenKind::Break) {
            self.expect(TokenKind::Semicolon)?;
            return Ok(Some(self.module.add_stmt(Stmt {
                kind: StmtKind::Break,
                loc,
            })));
        }

        if self.accept(TokenKind::Continue) {
            self.expect(TokenKind::Semicolon)?;
            return Ok(Some(self.module.add_stmt(Stmt {
                kind: StmtKind::Continue,
                loc,
            })));
        }

        if self.accept(TokenKind::Return) {
            let expression = if self.accept(TokenKind::Semicolon) {
                None
            } else {
                let expr = self.parse_expression()?;
                // The return value must be castable to the function's
                // declared return type.
                let ty = self.module.expr(expr).ty;
                self.check_type_cast(ty, *return_type)?;
                self.expect(TokenKind::Semicolon)?;
                Some(expr)
            };
            return Ok(Some(self.module.add_stmt(Stmt {
                kind: StmtKind::Return(expression),
                loc,
            })));
        }

        let statement = if let Some(declaration) = self.parse_declaration()? {
            declaration
        } else {
            let expression = self.parse_expression()?;
            self.module.add_stmt(Stmt {
                kind: StmtKind::Expression(expression),
                loc,
            })
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Some(statement))
    }

    fn parse_declaration(&mut self) -> Result<Option<StmtId>> {
        let loc = self.loc();
        let Some((ty, name)) = self.accept_declaration(true)? else {
            return Ok(None);
        };
        self.declare_variable(name, ty);
        let assignment = self.parse_declaration_assignment(ty)?;
        Ok(Some(self.module.add_stmt(Stmt {
            kind: StmtKind::Declaration(Declaration {
                name,
                ty,
                register: None,
                assignment,
            }),
            loc,
        })))
    }

    fn parse_declaration_assignment(&mut self, ty: Type) -> Result<Option<Init>> {
        if !self.accept(TokenKind::Equal) {
            return Ok(None);
        }
        if ty.array {
            // Array initializers allow a trailing comma: { 1, 2, 3, }.
            self.expect(TokenKind::LBrace)?;
            let (range, _) = self.parse_expression_list(TokenKind::RBrace, true)?;
            Ok(Some(Init::List(range)))
        } else {
            Ok(Some(Init::Expr(self.parse_expression()?)))
        }
    }
}
