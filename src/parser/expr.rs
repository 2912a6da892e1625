//! Expression grammar: precedence climbing with an assignment post-pass, a
//! terminal parser covering literals, casts, constructors and identifiers,
//! and a postfix chain for member access, indexing, and calls. Every node is
//! typed as it is built.

use smallvec::SmallVec;

use super::Parser;
use crate::ast::{
    BaseType, BinaryOp, Callee, Expr, ExprId, ExprKind, ExprRange, Literal, Loc, Type, UnaryOp,
};
use crate::errors::Result;
use crate::intern::Name;
use crate::lexer::TokenKind;
use crate::types::{self, intrinsics, MemberTypeError};

/// Priority of the `? :` operator.
const CONDITIONAL_PRIORITY: u8 = 1;

impl Parser<'_> {
    /// Full expression: a priority-0 binary parse followed by a
    /// right-associative assignment pass.
    pub(super) fn parse_expression(&mut self) -> Result<ExprId> {
        let mut expr = self.parse_binary_expression(0)?;
        while let Some(op) = self.accept_assign() {
            let rhs = self.parse_binary_expression(0)?;
            let lhs_ty = self.module.expr(expr).ty;
            let rhs_ty = self.module.expr(rhs).ty;
            let loc = self.module.expr(expr).loc;
            self.check_type_cast(rhs_ty, lhs_ty)?;
            // An assignment takes the type of its left-hand side.
            expr = self.module.add_expr(Expr {
                kind: ExprKind::Binary {
                    op,
                    left: expr,
                    right: rhs,
                },
                ty: lhs_ty,
                loc,
            });
        }
        Ok(expr)
    }

    fn accept_assign(&mut self) -> Option<BinaryOp> {
        let op = match self.current_kind() {
            TokenKind::Equal => BinaryOp::Assign,
            TokenKind::PlusEqual => BinaryOp::AddAssign,
            TokenKind::MinusEqual => BinaryOp::SubAssign,
            TokenKind::TimesEqual => BinaryOp::MulAssign,
            TokenKind::DivideEqual => BinaryOp::DivAssign,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn accept_binary_operator(&mut self, priority: u8) -> Option<BinaryOp> {
        let op = match self.current_kind() {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Times => BinaryOp::Mul,
            TokenKind::Divide => BinaryOp::Div,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            TokenKind::EqualEqual => BinaryOp::Equal,
            TokenKind::NotEqual => BinaryOp::NotEqual,
            TokenKind::AndAnd => BinaryOp::And,
            TokenKind::BarBar => BinaryOp::Or,
            _ => return None,
        };
        if op.priority() > priority {
            self.advance();
            Some(op)
        } else {
            None
        }
    }

    fn accept_unary_operator(&mut self, pre: bool) -> Option<UnaryOp> {
        let op = match self.current_kind() {
            TokenKind::PlusPlus => {
                if pre {
                    UnaryOp::PreIncrement
                } else {
                    UnaryOp::PostIncrement
                }
            }
            TokenKind::MinusMinus => {
                if pre {
                    UnaryOp::PreDecrement
                } else {
                    UnaryOp::PostDecrement
                }
            }
            TokenKind::Minus if pre => UnaryOp::Negative,
            TokenKind::Plus if pre => UnaryOp::Positive,
            TokenKind::Bang if pre => UnaryOp::Not,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_binary_expression(&mut self, priority: u8) -> Result<ExprId> {
        let loc = self.loc();
        let (mut expr, needs_end_paren) = self.parse_terminal_expression()?;

        loop {
            if let Some(op) = self.accept_binary_operator(priority) {
                let rhs = self.parse_binary_expression(op.priority())?;
                let lhs_ty = self.module.expr(expr).ty;
                let rhs_ty = self.module.expr(rhs).ty;
                let Some(result_ty) = types::binary_op_result_type(op, &lhs_ty, &rhs_ty) else {
                    let name1 = types::type_name(&self.module, &lhs_ty);
                    let name2 = types::type_name(&self.module, &rhs_ty);
                    return Err(self.error(format!(
                        "binary '{}' : no global operator found which takes types '{name1}' \
                         and '{name2}' (or there is no acceptable conversion)",
                        op.symbol()
                    )));
                };
                expr = self.module.add_expr(Expr {
                    kind: ExprKind::Binary {
                        op,
                        left: expr,
                        right: rhs,
                    },
                    ty: result_ty,
                    loc,
                });
            } else if CONDITIONAL_PRIORITY > priority && self.accept(TokenKind::Question) {
                let if_true = self.parse_binary_expression(CONDITIONAL_PRIORITY)?;
                self.expect(TokenKind::Colon)?;
                let if_false = self.parse_binary_expression(CONDITIONAL_PRIORITY)?;

                let true_ty = self.module.expr(if_true).ty;
                let false_ty = self.module.expr(if_false).ty;
                if types::cast_rank(&true_ty, &false_ty) == -1 {
                    let src = types::type_name(&self.module, &false_ty);
                    let dst = types::type_name(&self.module, &true_ty);
                    return Err(self.error(format!(
                        "':' no possible conversion from '{src}' to '{dst}'"
                    )));
                }

                expr = self.module.add_expr(Expr {
                    kind: ExprKind::Conditional {
                        cond: expr,
                        if_true,
                        if_false,
                    },
                    ty: true_ty,
                    loc,
                });
            } else {
                break;
            }
        }

        if needs_end_paren {
            self.expect(TokenKind::RParen)?;
        }
        Ok(expr)
    }

    /// Constructor arguments after the type and `(` have been consumed.
    fn parse_partial_constructor(
        &mut self,
        loc: Loc,
        base: BaseType,
        type_name: Option<Name>,
    ) -> Result<ExprId> {
        let (args, _) = self.parse_expression_list(TokenKind::RParen, false)?;
        let mut ty = Type::new(base);
        ty.type_name = type_name;
        let mut result_ty = ty;
        result_ty.constant = true;
        Ok(self.module.add_expr(Expr {
            kind: ExprKind::Constructor { ty, args },
            ty: result_ty,
            loc,
        }))
    }

    /// Terminal expression plus its postfix chain. The `bool` in the result
    /// asks the binary-expression level to consume one trailing `)` (the
    /// `(float2(...))` constructor form).
    fn parse_terminal_expression(&mut self) -> Result<(ExprId, bool)> {
        let loc = self.loc();

        if let Some(op) = self.accept_unary_operator(true) {
            let (inner, needs_end_paren) = self.parse_terminal_expression()?;
            let ty = if op == UnaryOp::Not {
                Type::new(BaseType::Bool)
            } else {
                self.module.expr(inner).ty
            };
            let id = self.module.add_expr(Expr {
                kind: ExprKind::Unary { op, expr: inner },
                ty,
                loc,
            });
            return Ok((id, needs_end_paren));
        }

        // Parenthesized expressions and casts.
        let mut parenthesized = None;
        if self.accept(TokenKind::LParen) {
            if let Some((base, type_name, constant)) = self.accept_type(false, true) {
                // A second paren makes this a constructor: (float2(...
                if self.accept(TokenKind::LParen) {
                    let id = self.parse_partial_constructor(loc, base, type_name)?;
                    return Ok((id, true));
                }
                // A cast applies to the whole expression that follows.
                let mut ty = Type::new(base);
                ty.type_name = type_name;
                ty.constant = constant;
                self.expect(TokenKind::RParen)?;
                let inner = self.parse_expression()?;
                let id = self.module.add_expr(Expr {
                    kind: ExprKind::Cast { ty, expr: inner },
                    ty,
                    loc,
                });
                return Ok((id, false));
            }
            let inner = self.parse_expression()?;
            self.expect(TokenKind::RParen)?;
            // Feed the postfix chain below so (v).x and (m)[0] work; the
            // HLSL printer emits member access in this form.
            parenthesized = Some(inner);
        }

        if parenthesized.is_none() {
            // Literals.
            if let Some(value) = self.accept_float() {
                return Ok((self.add_literal(loc, Literal::Float(value), BaseType::Float), false));
            }
            if let Some(value) = self.accept_half() {
                return Ok((self.add_literal(loc, Literal::Half(value), BaseType::Half), false));
            }
            if let Some(value) = self.accept_int() {
                return Ok((self.add_literal(loc, Literal::Int(value), BaseType::Int), false));
            }
            if self.accept(TokenKind::True) {
                return Ok((self.add_literal(loc, Literal::Bool(true), BaseType::Bool), false));
            }
            if self.accept(TokenKind::False) {
                return Ok((self.add_literal(loc, Literal::Bool(false), BaseType::Bool), false));
            }
        }

        // Parenthesized expression, type constructor, or identifier.
        let mut expr = if let Some(inner) = parenthesized {
            inner
        } else if let Some((base, type_name, _)) = self.accept_type(false, false) {
            self.expect(TokenKind::LParen)?;
            self.parse_partial_constructor(loc, base, type_name)?
        } else {
            let name = self.expect_identifier()?;
            let (ty, global) = match self.find_variable(name) {
                Some((ty, global)) => (ty, global),
                None => {
                    let name_str = self.module.name(name).to_owned();
                    if !self.is_function(name, &name_str) {
                        return Err(self.error(format!("Undeclared identifier '{name_str}'")));
                    }
                    // Functions are always global scope; the type is pinned
                    // down when the call resolves.
                    (Type::unknown(), true)
                }
            };
            self.module.add_expr(Expr {
                kind: ExprKind::Identifier { name, global },
                ty,
                loc,
            })
        };

        // Postfix chain: ++/--, .member, [index], (call), repeated until
        // nothing more applies.
        let mut done = false;
        while !done {
            done = true;

            while let Some(op) = self.accept_unary_operator(false) {
                let ty = self.module.expr(expr).ty;
                expr = self.module.add_expr(Expr {
                    kind: ExprKind::Unary { op, expr },
                    ty,
                    loc,
                });
                done = false;
            }

            while self.accept(TokenKind::Dot) {
                let field = self.expect_identifier()?;
                let object_ty = self.module.expr(expr).ty;
                let member_ty = match types::member_type(&self.module, &object_ty, field) {
                    Ok(ty) => ty,
                    Err(MemberTypeError::InvalidSwizzle) => {
                        let field_str = self.module.name(field);
                        return Err(self.error(format!("Invalid swizzle '{field_str}'")));
                    }
                    Err(MemberTypeError::NoSuchMember) => {
                        let field_str = self.module.name(field);
                        return Err(self.error(format!("Couldn't access '{field_str}'")));
                    }
                };
                expr = self.module.add_expr(Expr {
                    kind: ExprKind::Member {
                        object: expr,
                        field,
                    },
                    ty: member_ty,
                    loc,
                });
                done = false;
            }

            while self.accept(TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket)?;
                let array_ty = self.module.expr(expr).ty;
                let result_ty = if array_ty.array {
                    let mut ty = array_ty;
                    ty.array = false;
                    ty.array_size = None;
                    ty
                } else {
                    let element = match array_ty.base {
                        BaseType::Float2 | BaseType::Float3 | BaseType::Float4 => BaseType::Float,
                        BaseType::Float3x3 => BaseType::Float3,
                        BaseType::Float4x4 => BaseType::Float4,
                        BaseType::Half2 | BaseType::Half3 | BaseType::Half4 => BaseType::Half,
                        BaseType::Half3x3 => BaseType::Half3,
                        BaseType::Half4x4 => BaseType::Half4,
                        BaseType::Int2 | BaseType::Int3 | BaseType::Int4 => BaseType::Int,
                        BaseType::Uint2 | BaseType::Uint3 | BaseType::Uint4 => BaseType::Uint,
                        _ => {
                            return Err(self.error(
                                "array, matrix, vector, or indexable object type expected in \
                                 index expression",
                            ))
                        }
                    };
                    Type::new(element)
                };
                expr = self.module.add_expr(Expr {
                    kind: ExprKind::Index { array: expr, index },
                    ty: result_ty,
                    loc,
                });
                done = false;
            }

            // Calls apply only to plain identifiers; HLSL has no function
            // values.
            if self.accept(TokenKind::LParen) {
                done = false;
                let (args, _) = self.parse_expression_list(TokenKind::RParen, false)?;
                let name = match &self.module.expr(expr).kind {
                    ExprKind::Identifier { name, .. } => *name,
                    _ => return Err(self.error("Expected function identifier")),
                };
                let callee = self.match_function_call(args, name)?;
                let ty = intrinsics::callee_return_type(&self.module, callee);
                expr = self.module.add_expr(Expr {
                    kind: ExprKind::Call { callee, args },
                    ty,
                    loc,
                });
            }
        }

        Ok((expr, false))
    }

    fn add_literal(&mut self, loc: Loc, literal: Literal, base: BaseType) -> ExprId {
        let mut ty = Type::new(base);
        ty.constant = true;
        self.module.add_expr(Expr {
            kind: ExprKind::Literal(literal),
            ty,
            loc,
        })
    }

    pub(super) fn parse_expression_list(
        &mut self,
        end: TokenKind,
        allow_empty_end: bool,
    ) -> Result<(ExprRange, usize)> {
        let mut items = Vec::new();
        while !self.accept(end.clone()) {
            self.check_unexpected_eof(&end)?;
            if !items.is_empty() {
                self.expect(TokenKind::Comma)?;
            }
            // A trailing comma may close the list in initializers.
            if allow_empty_end && self.accept(end.clone()) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        let count = items.len();
        Ok((self.module.add_expr_list(items), count))
    }

    /// Pick the best overload for a call site, over user functions and the
    /// intrinsic catalog. Candidates are compared by their sorted
    /// per-argument cast-rank vectors; a tie between best candidates makes
    /// the call ambiguous.
    fn match_function_call(&mut self, args: ExprRange, name: Name) -> Result<Callee> {
        let call_types: SmallVec<[Type; 4]> = self
            .module
            .expr_list(args)
            .iter()
            .map(|&id| self.module.expr(id).ty)
            .collect();
        let name_str = self.module.name(name).to_owned();

        let mut matched: Option<Callee> = None;
        let mut matched_ranks: Option<SmallVec<[i32; 4]>> = None;
        let mut num_matched = 0usize;
        let mut name_matches = false;

        for &id in &self.functions {
            if self.module.function(id).name != name {
                continue;
            }
            name_matches = true;
            let candidate_args = intrinsics::callee_arg_types(&self.module, Callee::User(id));
            consider(
                &mut matched,
                &mut matched_ranks,
                &mut num_matched,
                Callee::User(id),
                intrinsics::viable_ranks(&call_types, &candidate_args),
            );
        }

        for (index, intrinsic) in intrinsics::INTRINSICS.iter().enumerate() {
            if intrinsic.name != name_str {
                continue;
            }
            name_matches = true;
            consider(
                &mut matched,
                &mut matched_ranks,
                &mut num_matched,
                Callee::Intrinsic(index as u32),
                intrinsics::viable_ranks(&call_types, &intrinsic.args),
            );
        }

        match matched {
            Some(_) if num_matched > 1 => Err(self.error(format!(
                "'{name_str}' {num_matched} overloads have similar conversions"
            ))),
            Some(callee) => Ok(callee),
            None if name_matches => Err(self.error(format!(
                "'{name_str}' no overloaded function matched all of the arguments"
            ))),
            None => Err(self.error(format!("Undeclared identifier '{name_str}'"))),
        }
    }
}

/// Fold one candidate into the running best-overload state.
fn consider(
    matched: &mut Option<Callee>,
    matched_ranks: &mut Option<SmallVec<[i32; 4]>>,
    num_matched: &mut usize,
    callee: Callee,
    ranks: Option<SmallVec<[i32; 4]>>,
) {
    match ranks {
        None => {
            if matched.is_none() {
                *num_matched += 1;
            }
        }
        Some(ranks) => match matched_ranks {
            None => {
                *matched = Some(callee);
                *matched_ranks = Some(ranks);
                *num_matched = 1;
            }
            Some(best) => {
                if ranks.as_slice() < best.as_slice() {
                    *matched = Some(callee);
                    *matched_ranks = Some(ranks);
                    *num_matched = 1;
                } else if ranks.as_slice() == best.as_slice() {
                    *num_matched += 1;
                }
            }
        },
    }
}
