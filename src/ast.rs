//! Flat arena AST.
//!
//! All nodes of a compilation unit live in contiguous vectors inside a
//! [`Module`]; child references are typed indices (`ExprId`, `StmtId`) and
//! sibling lists are `(start, len)` ranges into side vectors. The module also
//! owns the string pool, so node lifetime, string lifetime, and arena
//! lifetime coincide.

use crate::intern::{Name, StringPool};

// -----------------------------------------------------------------------------
// Source locations
// -----------------------------------------------------------------------------

/// File name handle plus 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub file: Name,
    pub line: u32,
}

// -----------------------------------------------------------------------------
// Typed indices and ranges
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn new(index: u32) -> Self {
        ExprId(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(u32);

impl StmtId {
    #[inline]
    pub fn new(index: u32) -> Self {
        StmtId(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

macro_rules! define_range {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            pub start: u32,
            pub len: u16,
        }

        impl $name {
            pub const EMPTY: $name = $name { start: 0, len: 0 };

            #[inline]
            pub fn new(start: u32, len: u16) -> Self {
                $name { start, len }
            }

            #[inline]
            pub fn len(self) -> usize {
                self.len as usize
            }

            #[inline]
            pub fn is_empty(self) -> bool {
                self.len == 0
            }
        }
    };
}

define_range!(
    /// Range into the expression-list vector (call arguments, initializers).
    ExprRange
);
define_range!(
    /// Range into the statement-list vector (blocks).
    StmtRange
);
define_range!(
    /// Range into the struct-field vector.
    FieldRange
);
define_range!(
    /// Range into the buffer-field vector.
    BufferFieldRange
);
define_range!(
    /// Range into the function-argument vector.
    ArgRange
);

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Base types. The declaration order is load-bearing: the contiguous range
/// `Float..=Uint4` indexes the binary-operator result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BaseType {
    Unknown,
    Void,
    Float,
    Float2,
    Float3,
    Float4,
    Float3x3,
    Float4x4,
    Half,
    Half2,
    Half3,
    Half4,
    Half3x3,
    Half4x4,
    Bool,
    Int,
    Int2,
    Int3,
    Int4,
    Uint,
    Uint2,
    Uint3,
    Uint4,
    Texture,
    Sampler2D,
    SamplerCube,
    UserDefined,
}

impl BaseType {
    pub const FIRST_NUMERIC: BaseType = BaseType::Float;
    pub const LAST_NUMERIC: BaseType = BaseType::Uint4;
    pub const NUMERIC_COUNT: usize =
        BaseType::LAST_NUMERIC as usize - BaseType::FIRST_NUMERIC as usize + 1;

    #[inline]
    pub fn is_numeric(self) -> bool {
        (self as u8) >= (Self::FIRST_NUMERIC as u8) && (self as u8) <= (Self::LAST_NUMERIC as u8)
    }

    /// Index into the numeric subrange. Only valid for numeric base types.
    #[inline]
    pub fn numeric_index(self) -> usize {
        debug_assert!(self.is_numeric());
        self as usize - Self::FIRST_NUMERIC as usize
    }
}

/// Full type descriptor carried by every expression, declaration, field, and
/// argument. Array sizes reference the size expression node, so two array
/// types compare equal only when they share the size expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Type {
    pub base: BaseType,
    /// Set for `BaseType::UserDefined`.
    pub type_name: Option<Name>,
    pub array: bool,
    pub array_size: Option<ExprId>,
    pub constant: bool,
}

impl Type {
    pub fn new(base: BaseType) -> Self {
        Type {
            base,
            type_name: None,
            array: false,
            array_size: None,
            constant: false,
        }
    }

    pub fn unknown() -> Self {
        Type::new(BaseType::Unknown)
    }
}

// -----------------------------------------------------------------------------
// Operators and literals
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
        }
    }

    /// Binding strength for the precedence-climbing parser; assignment forms
    /// are handled by a separate post-pass and never appear here.
    pub fn priority(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Equal | BinaryOp::NotEqual => 3,
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div => 6,
            BinaryOp::Assign
            | BinaryOp::AddAssign
            | BinaryOp::SubAssign
            | BinaryOp::MulAssign
            | BinaryOp::DivAssign => 0,
        }
    }

    /// Operators whose result type is `bool` regardless of operand types.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::Less
                | BinaryOp::Greater
                | BinaryOp::LessEqual
                | BinaryOp::GreaterEqual
                | BinaryOp::Equal
                | BinaryOp::NotEqual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negative,
    Positive,
    Not,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Negative => "-",
            UnaryOp::Positive => "+",
            UnaryOp::Not => "!",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostIncrement | UnaryOp::PostDecrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Float(f32),
    Half(f32),
    Int(i32),
    Uint(u32),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentModifier {
    None,
    In,
    Inout,
    Uniform,
}

// -----------------------------------------------------------------------------
// Expressions
// -----------------------------------------------------------------------------

/// Resolved callee of a function call: either a user function statement or an
/// entry in the intrinsic catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    User(StmtId),
    Intrinsic(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    /// Inferred result type; determined by the time the enclosing statement
    /// finishes parsing.
    pub ty: Type,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier { name: Name, global: bool },
    Literal(Literal),
    Constructor { ty: Type, args: ExprRange },
    Cast { ty: Type, expr: ExprId },
    Unary { op: UnaryOp, expr: ExprId },
    Binary { op: BinaryOp, left: ExprId, right: ExprId },
    Conditional { cond: ExprId, if_true: ExprId, if_false: ExprId },
    Member { object: ExprId, field: Name },
    Index { array: ExprId, index: ExprId },
    Call { callee: Callee, args: ExprRange },
}

// -----------------------------------------------------------------------------
// Statements
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Declaration(Declaration),
    Struct(StructDef),
    Buffer(BufferDef),
    Function(Function),
    Expression(ExprId),
    Return(Option<ExprId>),
    Discard,
    Break,
    Continue,
    If(IfStmt),
    For(ForStmt),
}

/// Initializer of a declaration: a single expression, or a brace list for
/// arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    Expr(ExprId),
    List(ExprRange),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: Name,
    pub ty: Type,
    pub register: Option<Name>,
    pub assignment: Option<Init>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: Name,
    pub fields: FieldRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: Name,
    pub ty: Type,
    pub semantic: Option<Name>,
    pub loc: Loc,
}

/// A cbuffer or tbuffer declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferDef {
    pub name: Option<Name>,
    pub register: Option<Name>,
    pub fields: BufferFieldRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferField {
    pub name: Name,
    pub ty: Type,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Name,
    pub return_type: Type,
    pub semantic: Option<Name>,
    pub args: ArgRange,
    pub body: StmtRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Name,
    pub modifier: ArgumentModifier,
    pub ty: Type,
    pub semantic: Option<Name>,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: ExprId,
    pub then_body: StmtRange,
    pub else_body: Option<StmtRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: StmtId,
    pub cond: Option<ExprId>,
    pub increment: Option<ExprId>,
    pub body: StmtRange,
}

// -----------------------------------------------------------------------------
// Module (arena + string pool + root)
// -----------------------------------------------------------------------------

/// Abstract syntax tree for one parsed compilation unit.
#[derive(Debug, Default)]
pub struct Module {
    pool: StringPool,
    exprs: Vec<Expr>,
    expr_lists: Vec<ExprId>,
    stmts: Vec<Stmt>,
    stmt_lists: Vec<StmtId>,
    fields: Vec<StructField>,
    buffer_fields: Vec<BufferField>,
    args: Vec<Argument>,
    root: Vec<StmtId>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== String pool =====

    pub fn intern(&mut self, s: &str) -> Name {
        self.pool.intern(s)
    }

    #[inline]
    pub fn name(&self, name: Name) -> &str {
        self.pool.lookup(name)
    }

    /// Whether the string occurs anywhere in the source (used by the code
    /// generators to fabricate collision-free identifiers).
    pub fn contains_string(&self, s: &str) -> bool {
        self.pool.contains(s)
    }

    // ===== Expressions =====

    #[inline]
    pub fn add_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn add_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = self.expr_lists.len() as u32;
        self.expr_lists.extend(exprs);
        let len = (self.expr_lists.len() as u32 - start) as u16;
        ExprRange::new(start, len)
    }

    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    // ===== Statements =====

    #[inline]
    pub fn add_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    pub fn add_stmt_list(&mut self, stmts: impl IntoIterator<Item = StmtId>) -> StmtRange {
        let start = self.stmt_lists.len() as u32;
        self.stmt_lists.extend(stmts);
        let len = (self.stmt_lists.len() as u32 - start) as u16;
        StmtRange::new(start, len)
    }

    #[inline]
    pub fn stmt_list(&self, range: StmtRange) -> &[StmtId] {
        let start = range.start as usize;
        &self.stmt_lists[start..start + range.len()]
    }

    // ===== Struct fields, buffer fields, arguments =====

    pub fn add_fields(&mut self, fields: impl IntoIterator<Item = StructField>) -> FieldRange {
        let start = self.fields.len() as u32;
        self.fields.extend(fields);
        let len = (self.fields.len() as u32 - start) as u16;
        FieldRange::new(start, len)
    }

    #[inline]
    pub fn fields(&self, range: FieldRange) -> &[StructField] {
        let start = range.start as usize;
        &self.fields[start..start + range.len()]
    }

    pub fn add_buffer_fields(
        &mut self,
        fields: impl IntoIterator<Item = BufferField>,
    ) -> BufferFieldRange {
        let start = self.buffer_fields.len() as u32;
        self.buffer_fields.extend(fields);
        let len = (self.buffer_fields.len() as u32 - start) as u16;
        BufferFieldRange::new(start, len)
    }

    #[inline]
    pub fn buffer_fields(&self, range: BufferFieldRange) -> &[BufferField] {
        let start = range.start as usize;
        &self.buffer_fields[start..start + range.len()]
    }

    pub fn add_args(&mut self, args: impl IntoIterator<Item = Argument>) -> ArgRange {
        let start = self.args.len() as u32;
        self.args.extend(args);
        let len = (self.args.len() as u32 - start) as u16;
        ArgRange::new(start, len)
    }

    #[inline]
    pub fn args(&self, range: ArgRange) -> &[Argument] {
        let start = range.start as usize;
        &self.args[start..start + range.len()]
    }

    // ===== Root =====

    pub fn push_root(&mut self, id: StmtId) {
        self.root.push(id);
    }

    pub fn root(&self) -> &[StmtId] {
        &self.root
    }

    // ===== Lookups over top-level statements =====

    /// Get the function payload of a statement.
    ///
    /// # Panics
    /// Panics if the statement is not a function.
    #[track_caller]
    pub fn function(&self, id: StmtId) -> &Function {
        match &self.stmt(id).kind {
            StmtKind::Function(f) => f,
            other => panic!("statement is not a function: {other:?}"),
        }
    }

    pub fn find_function(&self, name: Name) -> Option<StmtId> {
        self.root.iter().copied().find(|&id| {
            matches!(&self.stmt(id).kind, StmtKind::Function(f) if f.name == name)
        })
    }

    pub fn find_struct(&self, name: Name) -> Option<&StructDef> {
        self.root.iter().find_map(|&id| match &self.stmt(id).kind {
            StmtKind::Struct(s) if s.name == name => Some(s),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(module: &mut Module) -> Loc {
        let file = module.intern("test.hlsl");
        Loc { file, line: 1 }
    }

    #[test]
    fn test_numeric_range() {
        assert!(BaseType::Float.is_numeric());
        assert!(BaseType::Uint4.is_numeric());
        assert!(!BaseType::Void.is_numeric());
        assert!(!BaseType::Texture.is_numeric());
        assert_eq!(BaseType::NUMERIC_COUNT, 21);
        assert_eq!(BaseType::Float.numeric_index(), 0);
        assert_eq!(BaseType::Uint4.numeric_index(), 20);
    }

    #[test]
    fn test_expr_arena() {
        let mut module = Module::new();
        let at = loc(&mut module);

        let one = module.add_expr(Expr {
            kind: ExprKind::Literal(Literal::Int(1)),
            ty: Type::new(BaseType::Int),
            loc: at,
        });
        let two = module.add_expr(Expr {
            kind: ExprKind::Literal(Literal::Int(2)),
            ty: Type::new(BaseType::Int),
            loc: at,
        });

        assert_eq!(one.index(), 0);
        assert_eq!(two.index(), 1);

        let list = module.add_expr_list([one, two]);
        assert_eq!(module.expr_list(list), &[one, two]);
    }

    #[test]
    fn test_find_function() {
        let mut module = Module::new();
        let at = loc(&mut module);
        let name = module.intern("main");

        let id = module.add_stmt(Stmt {
            kind: StmtKind::Function(Function {
                name,
                return_type: Type::new(BaseType::Float4),
                semantic: None,
                args: ArgRange::EMPTY,
                body: StmtRange::EMPTY,
            }),
            loc: at,
        });
        module.push_root(id);

        assert_eq!(module.find_function(name), Some(id));
        let missing = module.intern("missing");
        assert_eq!(module.find_function(missing), None);
    }

    #[test]
    fn test_walk_visits_each_node_once() {
        // A tree built through the arena has no shared children: every id is
        // allocated exactly once and referenced by exactly one parent.
        let mut module = Module::new();
        let at = loc(&mut module);

        let x = module.intern("x");
        let lhs = module.add_expr(Expr {
            kind: ExprKind::Identifier { name: x, global: false },
            ty: Type::new(BaseType::Float),
            loc: at,
        });
        let rhs = module.add_expr(Expr {
            kind: ExprKind::Literal(Literal::Float(1.0)),
            ty: Type::new(BaseType::Float),
            loc: at,
        });
        let sum = module.add_expr(Expr {
            kind: ExprKind::Binary { op: BinaryOp::Add, left: lhs, right: rhs },
            ty: Type::new(BaseType::Float),
            loc: at,
        });

        let mut visited = vec![false; module.expr_count()];
        let mut stack = vec![sum];
        while let Some(id) = stack.pop() {
            assert!(!visited[id.index()], "node visited twice");
            visited[id.index()] = true;
            if let ExprKind::Binary { left, right, .. } = module.expr(id).kind {
                stack.push(left);
                stack.push(right);
            }
        }
        assert!(visited.iter().all(|&v| v));
    }
}
