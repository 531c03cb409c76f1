//! A minimal model of the target (Go) surface grammar: just the
//! declarations, statements, and expressions the generator emits. All nodes
//! are build-once value trees.

/// The dynamically-typed element/value type every surface value maps to.
pub const ANY_TYPE: &str = "core.Any";

/// The fixed runtime-support package operators lower into.
pub const SUPPORT_PACKAGE: &str = "core";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident(pub Box<str>);

impl Ident {
    pub fn new(name: impl Into<Box<str>>) -> Ident {
        Ident(name.into())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Ident(Ident),
    BasicLit {
        kind: LitKind,
        /// The literal as written, quotes included for strings.
        value: Box<str>,
    },
    /// `[]elem_ty{elems...}`
    CompositeLit {
        elem_ty: Ident,
        elems: Vec<Expr>,
    },
    /// `base.field`
    Selector {
        base: Box<Expr>,
        field: Ident,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// An anonymous function. Parameters are untyped at this level; the
    /// backend gives every parameter (and the single result) the dynamic
    /// value type.
    FuncLit {
        params: Vec<Ident>,
        variadic: Option<Ident>,
        body: Vec<Stmt>,
    },
    /// `expr.(ty)` — modeled but emitted by no lowering rule today.
    TypeAssert {
        expr: Box<Expr>,
        ty: Ident,
    },
}

impl Expr {
    pub fn ident(name: impl Into<Box<str>>) -> Expr {
        Expr::Ident(Ident::new(name))
    }

    pub fn lit(kind: LitKind, value: impl Into<Box<str>>) -> Expr {
        Expr::BasicLit {
            kind,
            value: value.into(),
        }
    }

    pub fn selector(base: Expr, field: impl Into<Box<str>>) -> Expr {
        Expr::Selector {
            base: Box::new(base),
            field: Ident::new(field),
        }
    }

    pub fn call(fun: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            fun: Box::new(fun),
            args,
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Whether this expression is a numeric basic literal.
    pub fn is_numeric_lit(&self) -> bool {
        matches!(
            self,
            Expr::BasicLit {
                kind: LitKind::Int | LitKind::Float,
                ..
            }
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Str,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `&&`
    LAnd,
    /// `||`
    LOr,
    Add,
    Sub,
    Mul,
    Quo,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Return(Vec<Expr>),
    /// One (possibly multi-target) assignment: `:=` when `define`, `=`
    /// otherwise. Targets and values pair positionally; values are all
    /// evaluated before any target is written.
    Assign {
        targets: Vec<Expr>,
        values: Vec<Expr>,
        define: bool,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Vec<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    Branch {
        kind: BranchKind,
        label: Option<Ident>,
    },
    Labeled {
        label: Ident,
        stmt: Box<Stmt>,
    },
    /// A `var` declaration in statement position.
    Var {
        name: Ident,
        ty: Option<Ident>,
        value: Option<Expr>,
    },
}

impl Stmt {
    pub fn ret(expr: Expr) -> Stmt {
        Stmt::Return(vec![expr])
    }

    pub fn assign(targets: Vec<Expr>, values: Vec<Expr>) -> Stmt {
        Stmt::Assign {
            targets,
            values,
            define: false,
        }
    }

    pub fn define(targets: Vec<Expr>, values: Vec<Expr>) -> Stmt {
        Stmt::Assign {
            targets,
            values,
            define: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Func {
        name: Ident,
        params: Vec<Ident>,
        variadic: Option<Ident>,
        /// The default convention is a single dynamic-value result; the
        /// program entry point drops it.
        returns_value: bool,
        body: Vec<Stmt>,
    },
    Import(Vec<ImportSpec>),
    Var {
        name: Ident,
        value: Expr,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSpec {
    /// The import path as written, quotes included.
    pub path: Box<str>,
    pub alias: Option<Ident>,
}

/// The root of a generated compilation unit.
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    pub package: Ident,
    pub decls: Vec<Decl>,
}
