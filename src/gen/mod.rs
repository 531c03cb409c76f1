//! Lowers the surface tree into the target syntax tree: top-level
//! declaration dispatch, special-form recognition, operator lowering, and
//! identifier adaptation.

use std::{collections::HashSet, fmt};

use crate::{
    ast::{Node, NodeKind, NumberKind},
    go,
    token::{Span, Spanned},
};

mod idents;
mod operators;
mod special;

pub use idents::camel_case;

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lowers the parsed top-level forms into a target file. Fails fast: the
/// first error aborts the whole run.
pub fn generate(forms: &[Node]) -> Result<go::File> {
    Generator::new(forms).generate(forms)
}

pub struct Generator {
    /// Names bound by top-level `def`s. Collected up front so references
    /// (including forward ones) adapt to the public naming convention.
    defs: HashSet<Box<str>>,
    /// Innermost-last stack of enclosing `loop` scopes.
    loops: Vec<special::LoopScope>,
    /// Fresh-name counter, private to this invocation.
    gensym: u32,
}

impl Generator {
    fn new(forms: &[Node]) -> Generator {
        let mut defs = HashSet::new();
        for form in forms {
            if let NodeKind::Call { callee, args } = &form.kind {
                if callee.is_ident("def") {
                    if let Some(name) = args.first().and_then(Node::as_ident) {
                        defs.insert(name.into());
                    }
                }
            }
        }
        Generator {
            defs,
            loops: Vec::new(),
            gensym: 0,
        }
    }

    fn generate(mut self, forms: &[Node]) -> Result<go::File> {
        let mut package = go::Ident::new("main");
        let mut decls = Vec::with_capacity(forms.len());
        let mut rest = forms;

        // A namespace declaration is only recognized as the very first
        // top-level form; it names the package and brings in imports.
        if let Some((first, tail)) = forms.split_first() {
            if is_ns_form(first) {
                let (name, imports) = self.namespace(first)?;
                package = name;
                decls.extend(imports.map(go::Decl::Import));
                rest = tail;
            }
        }

        for form in rest {
            decls.push(self.decl(form)?);
        }

        Ok(go::File { package, decls })
    }

    /// Lowers one top-level form. Only `def` declares; anything else at
    /// the top level is an error.
    fn decl(&mut self, form: &Node) -> Result<go::Decl> {
        let NodeKind::Call { callee, args } = &form.kind else {
            return Err(form.span.wrap(Error::ExpectedTopLevelCall));
        };
        match callee.as_ident() {
            Some("def") => self.def(args, form.span),
            Some("ns") => Err(form.span.wrap(Error::NamespaceNotFirst)),
            _ => Err(callee.span.wrap(Error::ExpectedDef)),
        }
    }

    /// `(def name value)`. A function-literal value becomes a function
    /// declaration; anything else becomes a variable declaration. The
    /// entry point is special-cased to the host's `main` convention.
    fn def(&mut self, args: &[Node], span: Span) -> Result<go::Decl> {
        let [name, value] = args else {
            return Err(span.wrap(Error::DefArity { found: args.len() }));
        };
        let Some(name) = name.as_ident() else {
            return Err(name.span.wrap(Error::ExpectedName { form: "def" }));
        };

        let value = self.eval_expr(value)?;
        let name = idents::public_ident(name);

        let go::Expr::FuncLit {
            params,
            variadic,
            body,
        } = value
        else {
            return Ok(go::Decl::Var { name, value });
        };

        if name.0.as_ref() == "Main" {
            // The entry point takes the no-return-value signature; its
            // final return demotes to a plain expression statement.
            return Ok(go::Decl::Func {
                name: go::Ident::new("main"),
                params,
                variadic,
                returns_value: false,
                body: demote_final_return(body),
            });
        }
        Ok(go::Decl::Func {
            name,
            params,
            variadic,
            returns_value: true,
            body,
        })
    }

    /// `(ns package imports...)`. Imports are either a bare path string or
    /// a `[path :as alias]` vector.
    fn namespace(&mut self, form: &Node) -> Result<(go::Ident, Option<Vec<go::ImportSpec>>)> {
        let NodeKind::Call { args, .. } = &form.kind else {
            unreachable!("checked by is_ns_form");
        };
        let Some((name, imports)) = args.split_first() else {
            return Err(form.span.wrap(Error::ExpectedName { form: "ns" }));
        };
        let Some(name) = name.as_ident() else {
            return Err(name.span.wrap(Error::ExpectedName { form: "ns" }));
        };

        if imports.is_empty() {
            return Ok((go::Ident::new(name), None));
        }
        let specs = imports
            .iter()
            .map(import_spec)
            .collect::<Result<Vec<_>>>()?;
        Ok((go::Ident::new(name), Some(specs)))
    }

    pub(crate) fn eval_exprs(&mut self, nodes: &[Node]) -> Result<Vec<go::Expr>> {
        nodes.iter().map(|node| self.eval_expr(node)).collect()
    }

    pub(crate) fn eval_expr(&mut self, node: &Node) -> Result<go::Expr> {
        match &node.kind {
            NodeKind::Ident(name) => Ok(self.eval_ident(name)),
            NodeKind::Str(raw) => Ok(go::Expr::lit(go::LitKind::Str, &**raw)),
            NodeKind::Number { text, kind } => {
                let kind = match kind {
                    NumberKind::Int => go::LitKind::Int,
                    NumberKind::Float => go::LitKind::Float,
                    NumberKind::Complex => go::LitKind::Imag,
                };
                Ok(go::Expr::lit(kind, &**text))
            }
            NodeKind::Vector(elems) => Ok(go::Expr::CompositeLit {
                elem_ty: go::Ident::new(go::ANY_TYPE),
                elems: self.eval_exprs(elems)?,
            }),
            NodeKind::Call { callee, args } => self.eval_call(callee, args, node.span),
        }
    }

    fn eval_ident(&self, name: &str) -> go::Expr {
        match name {
            // Boolean literal identifiers map to the target's native ones.
            "#t" => return go::Expr::ident("true"),
            "#f" => return go::Expr::ident("false"),
            "nil" => return go::Expr::ident("nil"),
            _ => {}
        }
        if name.contains('/') {
            return idents::path_selector(name);
        }
        if self.defs.contains(name) {
            return go::Expr::Ident(idents::public_ident(name));
        }
        go::Expr::Ident(idents::private_ident(name))
    }

    /// Dispatches a parenthesized form through the special-form
    /// recognizers, in precedence order; anything unrecognized lowers as a
    /// plain call.
    fn eval_call(&mut self, callee: &Node, args: &[Node], span: Span) -> Result<go::Expr> {
        if let Some(name) = callee.as_ident() {
            if let Some(op) = operators::UNARY.get(name) {
                return self.lower_unary(*op, args, span);
            }
            if let Some(&support) = operators::CALLABLE.get(name) {
                return self.lower_callable(name, support, args, span);
            }
            if let Some(op) = operators::LOGIC.get(name) {
                return self.lower_logic(*op, name, args, span);
            }
            match name {
                "loop" => return self.lower_loop(args, span),
                "recur" => return self.lower_recur(args, span),
                "let" => return self.lower_let(args, span),
                "if" => return self.lower_if(args, span),
                "fn" => return self.lower_fn(args, span),
                "def" | "ns" => {
                    return Err(span.wrap(Error::DeclarationInExpr { form: name.into() }));
                }
                _ => {}
            }
        }

        // A plain call. A callee that stays a plain identifier adapts to
        // the public naming convention.
        let fun = match callee.as_ident() {
            Some(name) if !name.contains('/') => go::Expr::Ident(idents::public_ident(name)),
            _ => self.eval_expr(callee)?,
        };
        let args = self.eval_exprs(args)?;
        Ok(go::Expr::call(fun, args))
    }

    /// Produces an identifier that cannot collide with any adapted surface
    /// symbol (the case converter never emits a `_`).
    fn fresh_ident(&mut self) -> go::Ident {
        let name = format!("GEN_{}", self.gensym);
        self.gensym += 1;
        go::Ident::new(name)
    }
}

fn is_ns_form(node: &Node) -> bool {
    matches!(&node.kind, NodeKind::Call { callee, .. } if callee.is_ident("ns"))
}

fn import_spec(node: &Node) -> Result<go::ImportSpec> {
    match &node.kind {
        NodeKind::Str(path) => Ok(go::ImportSpec {
            path: path.clone(),
            alias: None,
        }),
        NodeKind::Vector(elems) => {
            let [path, marker, alias] = &elems[..] else {
                return Err(node.span.wrap(Error::InvalidImport));
            };
            let NodeKind::Str(path) = &path.kind else {
                return Err(path.span.wrap(Error::InvalidImport));
            };
            if !marker.is_ident(":as") {
                return Err(marker.span.wrap(Error::InvalidImport));
            }
            let Some(alias) = alias.as_ident() else {
                return Err(alias.span.wrap(Error::InvalidImport));
            };
            Ok(go::ImportSpec {
                path: path.clone(),
                alias: Some(go::Ident::new(alias)),
            })
        }
        _ => Err(node.span.wrap(Error::InvalidImport)),
    }
}

/// Rewrites a function body from the value-returning convention to the
/// entry point's bare-statement convention.
fn demote_final_return(mut body: Vec<go::Stmt>) -> Vec<go::Stmt> {
    match body.pop() {
        Some(go::Stmt::Return(mut results)) if results.len() == 1 => {
            body.push(go::Stmt::Expr(results.remove(0)));
        }
        Some(stmt) => body.push(stmt),
        None => {}
    }
    body
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    // Declaration errors.
    ExpectedTopLevelCall,
    ExpectedDef,
    NamespaceNotFirst,
    DeclarationInExpr { form: Box<str> },
    ExpectedName { form: &'static str },
    InvalidImport,

    // Shape errors.
    DefArity { found: usize },
    UnaryArity { found: usize },
    ModArity { found: usize },
    OperatorArity { op: Box<str>, found: usize },
    BindingsNotVector { form: &'static str },
    UnevenBindings { form: &'static str },
    BindingName { form: &'static str },
    MissingBody { form: &'static str },
    IfArity { found: usize },
    ParamsNotVector,
    ParamNotIdent,
    RestParam,
    LoopWithoutRecur,
    RecurArity { expected: usize, found: usize },

    // Lowering errors.
    RecurOutsideLoop,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            ExpectedTopLevelCall => write!(f, "expected a parenthesized form at the top level"),
            ExpectedDef => write!(f, "top-level forms must be def declarations"),
            NamespaceNotFirst => write!(f, "ns must be the first top-level form"),
            DeclarationInExpr { form } => {
                write!(f, "{form} is not allowed in expression position")
            }
            ExpectedName { form } => write!(f, "{form} expects an identifier name"),
            InvalidImport => write!(f, "invalid import; expected a path or [path :as alias]"),
            DefArity { found } => {
                write!(f, "def takes a name and a value, but got {found} arguments")
            }
            UnaryArity { found } => {
                write!(f, "unary operator takes exactly one argument, but got {found}")
            }
            ModArity { found } => {
                write!(f, "mod takes exactly two arguments, but got {found}")
            }
            OperatorArity { op, found } => {
                write!(f, "operator {op} needs at least two arguments, but got {found}")
            }
            BindingsNotVector { form } => write!(f, "{form} bindings must be a vector"),
            UnevenBindings { form } => {
                write!(f, "{form} bindings must pair each name with a value")
            }
            BindingName { form } => write!(f, "{form} binding names must be identifiers"),
            MissingBody { form } => write!(f, "{form} needs at least one body form"),
            IfArity { found } => {
                write!(f, "if takes a condition and one or two branches, but got {found} arguments")
            }
            ParamsNotVector => write!(f, "fn parameters must be a vector"),
            ParamNotIdent => write!(f, "fn parameters must be identifiers"),
            RestParam => write!(f, "& must be followed by exactly one rest parameter name"),
            LoopWithoutRecur => write!(f, "loop body has no reachable recur"),
            RecurArity { expected, found } => {
                write!(f, "recur takes {expected} arguments to match the loop bindings, but got {found}")
            }
            RecurOutsideLoop => write!(f, "recur used outside of a loop body"),
        }
    }
}
