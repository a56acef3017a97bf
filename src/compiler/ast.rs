use crate::compiler::lexer::Span;

/// An identifier occurrence. Every name in a source file is one of these,
/// which is what lets the substitution passes rename in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}

/// Comments and spacing carried from the source so the printer can keep them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trivia {
    /// Own-line comments before the node; an empty entry is a blank line.
    pub doc: Vec<String>,
    /// Comment at the end of the node's last line.
    pub comment: Option<String>,
    /// The source had a blank line before the node.
    pub blank_before: bool,
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct File {
    /// Path used in diagnostics.
    pub path: String,
    pub trivia: Trivia,
    pub package: Ident,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<Decl>,
    /// Comments after the last declaration.
    pub trailing_doc: Vec<String>,
}

/// An `import` declaration, grouped or not.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub trivia: Trivia,
    pub specs: Vec<ImportSpec>,
    pub grouped: bool,
    pub end_doc: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub trivia: Trivia,
    /// Local name: an identifier, `_` or `.`.
    pub name: Option<Ident>,
    /// The path literal as written, quotes included.
    pub path: String,
    pub span: Span,
}

/// Top-level declarations.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKeyword {
    Const,
    Var,
    Type,
}

impl DeclKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKeyword::Const => "const",
            DeclKeyword::Var => "var",
            DeclKeyword::Type => "type",
        }
    }
}

/// A `const`, `var` or `type` declaration.
#[derive(Debug, Clone)]
pub struct GenDecl {
    pub trivia: Trivia,
    pub keyword: DeclKeyword,
    pub specs: Vec<Spec>,
    pub grouped: bool,
    pub end_doc: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Spec {
    Value(ValueSpec),
    Type(TypeSpec),
}

/// `a, b T = x, y` inside a const or var declaration.
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub trivia: Trivia,
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    /// Position in its const group, the value of `iota`.
    pub iota: usize,
    pub span: Span,
}

/// `Name T` or `Name = T`.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub trivia: Trivia,
    pub name: Ident,
    pub alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub trivia: Trivia,
    pub recv: Option<Param>,
    pub name: Ident,
    pub sig: FuncType,
    pub body: Option<Block>,
    pub span: Span,
}

/// A parameter group: `a, b int`, `int` or `xs ...T`.
#[derive(Debug, Clone)]
pub struct Param {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub struct FuncType {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub span: Span,
}

/// A struct field line: `a, b T "tag"` or an embedded `T`.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub trivia: Trivia,
    /// Empty for an embedded field.
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub tag: Option<String>,
}

#[derive(Debug, Clone)]
pub enum InterfaceElem {
    Method {
        trivia: Trivia,
        name: Ident,
        sig: FuncType,
    },
    Embed {
        trivia: Trivia,
        ty: TypeExpr,
    },
}

/// Type expressions as written in source.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// `T` or `pkg.T`
    Name {
        pkg: Option<Ident>,
        name: Ident,
    },
    Pointer {
        elem: Box<TypeExpr>,
        span: Span,
    },
    Slice {
        elem: Box<TypeExpr>,
        span: Span,
    },
    /// `[N]T`; `len` is `None` for `[...]T` in composite literals.
    Array {
        len: Option<Box<Expr>>,
        elem: Box<TypeExpr>,
        span: Span,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
        span: Span,
    },
    Struct {
        fields: Vec<FieldDecl>,
        end_doc: Vec<String>,
        span: Span,
    },
    Interface {
        elems: Vec<InterfaceElem>,
        end_doc: Vec<String>,
        span: Span,
    },
    Func(FuncType),
    Paren {
        inner: Box<TypeExpr>,
        span: Span,
    },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Name { pkg, name } => pkg.as_ref().map(|p| p.span).unwrap_or(name.span),
            TypeExpr::Pointer { span, .. }
            | TypeExpr::Slice { span, .. }
            | TypeExpr::Array { span, .. }
            | TypeExpr::Map { span, .. }
            | TypeExpr::Struct { span, .. }
            | TypeExpr::Interface { span, .. }
            | TypeExpr::Paren { span, .. } => *span,
            TypeExpr::Func(func) => func.span,
        }
    }
}

/// A block of statements.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Comments before the closing brace.
    pub end_doc: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub trivia: Trivia,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::AndNot => "&^=",
        }
    }

    /// The binary operator a compound assignment applies.
    pub fn binary(&self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Rem => Some(BinaryOp::Rem),
            AssignOp::And => Some(BinaryOp::And),
            AssignOp::Or => Some(BinaryOp::Or),
            AssignOp::Xor => Some(BinaryOp::Xor),
            AssignOp::Shl => Some(BinaryOp::Shl),
            AssignOp::Shr => Some(BinaryOp::Shr),
            AssignOp::AndNot => Some(BinaryOp::AndNot),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Fallthrough,
}

/// Statements in a function body.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum StmtKind {
    Decl(GenDecl),
    Expr(Expr),
    /// `a, b := x, y`
    ShortVar {
        names: Vec<Ident>,
        values: Vec<Expr>,
    },
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    IncDec {
        expr: Expr,
        inc: bool,
    },
    Return(Vec<Expr>),
    If(IfStmt),
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    /// `for k, v := range x` / `for k = range x` / `for range x`
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        expr: Expr,
        body: Block,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        clauses: Vec<CaseClause>,
        end_doc: Vec<String>,
    },
    Branch(BranchKind),
    Block(Block),
    Go(Expr),
    Defer(Expr),
    Empty,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    pub els: Option<Box<Else>>,
}

#[derive(Debug, Clone)]
pub enum Else {
    If(IfStmt),
    Block(Block),
}

#[derive(Debug, Clone)]
pub struct CaseClause {
    pub trivia: Trivia,
    /// `None` for `default`.
    pub exprs: Option<Vec<Expr>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Rune,
    Str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    Xor,
    Deref,
    Addr,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Xor => "^",
            UnaryOp::Deref => "*",
            UnaryOp::Addr => "&",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LogOr,
    LogAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::LogOr => "||",
            BinaryOp::LogAnd => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&",
            BinaryOp::AndNot => "&^",
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::LogOr => 1,
            BinaryOp::LogAnd => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::AndNot => 5,
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.precedence() == 3
    }
}

/// An element of a composite literal: `value` or `key: value`.
#[derive(Debug, Clone)]
pub struct Element {
    pub key: Option<Expr>,
    pub value: Expr,
}

/// Where one argument or element sat in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemLayout {
    /// Comments before the item, and the comment after its comma.
    pub trivia: Trivia,
    /// The item started on a new line.
    pub line_break: bool,
}

/// Source layout of call arguments or composite literal elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListLayout {
    /// Comment after the opening bracket.
    pub open_comment: Option<String>,
    /// One entry per item.
    pub items: Vec<ItemLayout>,
    /// Comments before the closing bracket.
    pub end_doc: Vec<String>,
    /// The closing bracket was on its own line.
    pub close_break: bool,
}

impl ListLayout {
    /// Nothing in the list forces a line break.
    pub fn is_single_line(&self) -> bool {
        !self.close_break
            && self.open_comment.is_none()
            && self.end_doc.is_empty()
            && self
                .items
                .iter()
                .all(|item| !item.line_break && item.trivia.comment.is_none())
    }
}

/// Expressions.
#[derive(Debug, Clone)]
pub enum Expr {
    Ident(Ident),
    BasicLit {
        kind: LitKind,
        value: String,
        span: Span,
    },
    /// `T{...}`; `ty` is `None` when elided inside an outer literal.
    Composite {
        ty: Option<TypeExpr>,
        elems: Vec<Element>,
        layout: ListLayout,
        span: Span,
    },
    FuncLit {
        sig: FuncType,
        body: Block,
    },
    Paren {
        inner: Box<Expr>,
        span: Span,
    },
    Selector {
        expr: Box<Expr>,
        sel: Ident,
    },
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Slice {
        expr: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
        span: Span,
    },
    TypeAssert {
        expr: Box<Expr>,
        ty: TypeExpr,
        span: Span,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        /// Final argument spread with `...`.
        ellipsis: bool,
        layout: ListLayout,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// A type used as an operand: `[]int(x)`, `make(map[K]V)`.
    Type(TypeExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(ident) => ident.span,
            Expr::BasicLit { span, .. }
            | Expr::Composite { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. }
            | Expr::TypeAssert { span, .. }
            | Expr::Call { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. } => *span,
            Expr::FuncLit { sig, .. } => sig.span,
            Expr::Selector { expr, .. } => expr.span(),
            Expr::Type(ty) => ty.span(),
        }
    }
}
