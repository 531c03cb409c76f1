use super::{idents, Error, Generator, Result};
use crate::{
    ast::{Node, NodeKind},
    go,
    token::Span,
};

/// The binding scope of one enclosing `loop`. A `recur` always targets the
/// innermost scope on the generator's stack.
pub(super) struct LoopScope {
    /// Lowered binding names, in declaration order.
    targets: Vec<go::Ident>,
    /// The loop's keep-looping flag.
    flag: go::Ident,
}

impl Generator {
    /// `(fn [params... & rest] body...)` — a function literal. The final
    /// body form's value is returned.
    pub(super) fn lower_fn(&mut self, args: &[Node], span: Span) -> Result<go::Expr> {
        let Some((param_vect, body)) = args.split_first() else {
            return Err(span.wrap(Error::ParamsNotVector));
        };
        let (params, variadic) = read_params(param_vect)?;
        let body = self.body_stmts(body, "fn", span)?;
        Ok(go::Expr::FuncLit {
            params,
            variadic,
            body,
        })
    }

    /// `(let [name init ...] body...)` — all initializers are evaluated
    /// independently and bound by a single simultaneous declaration, then
    /// the body runs inside an immediately-invoked function literal whose
    /// final value is the result.
    pub(super) fn lower_let(&mut self, args: &[Node], span: Span) -> Result<go::Expr> {
        let (bindings, body) = split_bindings(args, "let", span)?;
        let bindings = read_bindings(bindings, "let")?;

        let targets: Vec<go::Expr> = bindings
            .iter()
            .map(|(name, _)| lower_binding_target(name))
            .collect();
        let values = self.eval_binding_inits(&bindings)?;

        let mut stmts = Vec::with_capacity(body.len() + 1);
        if !targets.is_empty() {
            stmts.push(go::Stmt::define(targets, values));
        }
        stmts.extend(self.body_stmts(body, "let", span)?);
        Ok(immediately_invoked(stmts))
    }

    /// `(if cond then else?)` — an immediately-invoked function literal
    /// holding a single conditional whose branches return their values. A
    /// missing else branch returns the null value.
    pub(super) fn lower_if(&mut self, args: &[Node], span: Span) -> Result<go::Expr> {
        let (cond, then, otherwise) = match args {
            [cond, then] => (cond, then, None),
            [cond, then, otherwise] => (cond, then, Some(otherwise)),
            _ => return Err(span.wrap(Error::IfArity { found: args.len() })),
        };

        let cond = self.eval_expr(cond)?;
        let then = vec![go::Stmt::ret(self.eval_expr(then)?)];
        let otherwise = vec![go::Stmt::ret(match otherwise {
            Some(node) => self.eval_expr(node)?,
            None => go::Expr::ident("nil"),
        })];

        Ok(immediately_invoked(vec![go::Stmt::If {
            cond,
            then,
            otherwise: Some(otherwise),
        }]))
    }

    /// `(loop [name init ...] body...)` — bounded iteration. Desugars to an
    /// immediately-invoked function literal:
    ///
    /// * the bindings become one simultaneous declaration;
    /// * a fresh result variable and a fresh keep-looping flag are
    ///   declared;
    /// * the body runs inside a flag-guarded iteration that first clears
    ///   the flag and captures the final form's value into the result;
    /// * the result is returned once an iteration finishes without a
    ///   reachable `recur` firing.
    pub(super) fn lower_loop(&mut self, args: &[Node], span: Span) -> Result<go::Expr> {
        let (binding_vect, body) = split_bindings(args, "loop", span)?;
        let bindings = read_bindings(binding_vect, "loop")?;

        if !contains_recur(body) {
            return Err(span.wrap(Error::LoopWithoutRecur));
        }

        // Initializers are evaluated in the enclosing scope, before this
        // loop's own scope exists.
        let values = self.eval_binding_inits(&bindings)?;
        let targets: Vec<go::Ident> = bindings
            .iter()
            .map(|(name, _)| idents::private_ident(name))
            .collect();

        let result = self.fresh_ident();
        let flag = self.fresh_ident();

        self.loops.push(LoopScope {
            targets: targets.clone(),
            flag: flag.clone(),
        });
        let body = self.loop_body(body, &result, span);
        self.loops.pop();
        let body = body?;

        let mut stmts = Vec::with_capacity(4);
        if !targets.is_empty() {
            stmts.push(go::Stmt::define(
                targets.into_iter().map(go::Expr::Ident).collect(),
                values,
            ));
        }
        stmts.extend([
            go::Stmt::Var {
                name: result.clone(),
                ty: Some(go::Ident::new(go::ANY_TYPE)),
                value: None,
            },
            go::Stmt::For {
                init: Some(Box::new(go::Stmt::define(
                    vec![go::Expr::Ident(flag.clone())],
                    vec![go::Expr::ident("true")],
                ))),
                cond: Some(go::Expr::Ident(flag.clone())),
                post: None,
                body,
            },
            go::Stmt::Return(vec![go::Expr::Ident(result)]),
        ]);
        Ok(immediately_invoked(stmts))
    }

    /// Lowers a loop's body forms: the flag is cleared first, every form
    /// runs in sequence, and the final form's value is captured into the
    /// result variable.
    fn loop_body(&mut self, body: &[Node], result: &go::Ident, span: Span) -> Result<Vec<go::Stmt>> {
        let flag = self
            .loops
            .last()
            .map(|scope| scope.flag.clone())
            .expect("loop scope pushed by caller");

        let Some((last, rest)) = body.split_last() else {
            return Err(span.wrap(Error::MissingBody { form: "loop" }));
        };

        let mut stmts = vec![go::Stmt::assign(
            vec![go::Expr::Ident(flag)],
            vec![go::Expr::ident("false")],
        )];
        for form in rest {
            let expr = self.eval_expr(form)?;
            stmts.push(go::Stmt::Expr(expr));
        }
        let expr = self.eval_expr(last)?;
        stmts.push(go::Stmt::assign(
            vec![go::Expr::Ident(result.clone())],
            vec![expr],
        ));
        Ok(stmts)
    }

    /// `(recur args...)` — rebinds the innermost enclosing loop's bindings
    /// and arms its flag. All argument expressions are evaluated against
    /// the current iteration's bindings before any binding is written (one
    /// simultaneous assignment), so new values never observe partially
    /// updated bindings.
    pub(super) fn lower_recur(&mut self, args: &[Node], span: Span) -> Result<go::Expr> {
        let Some(scope) = self.loops.last() else {
            return Err(span.wrap(Error::RecurOutsideLoop));
        };
        if args.len() != scope.targets.len() {
            return Err(span.wrap(Error::RecurArity {
                expected: scope.targets.len(),
                found: args.len(),
            }));
        }
        let targets: Vec<go::Expr> = scope.targets.iter().cloned().map(go::Expr::Ident).collect();
        let flag = scope.flag.clone();

        let values = self.eval_exprs(args)?;

        let mut stmts = Vec::with_capacity(3);
        if !targets.is_empty() {
            stmts.push(go::Stmt::assign(targets, values));
        }
        stmts.push(go::Stmt::assign(
            vec![go::Expr::Ident(flag)],
            vec![go::Expr::ident("true")],
        ));
        stmts.push(go::Stmt::ret(go::Expr::ident("nil")));
        Ok(immediately_invoked(stmts))
    }

    /// Lowers body forms in sequence; the final form's value is returned.
    pub(super) fn body_stmts(
        &mut self,
        body: &[Node],
        form: &'static str,
        span: Span,
    ) -> Result<Vec<go::Stmt>> {
        let Some((last, rest)) = body.split_last() else {
            return Err(span.wrap(Error::MissingBody { form }));
        };
        let mut stmts = Vec::with_capacity(body.len());
        for node in rest {
            let expr = self.eval_expr(node)?;
            stmts.push(go::Stmt::Expr(expr));
        }
        let expr = self.eval_expr(last)?;
        stmts.push(go::Stmt::ret(expr));
        Ok(stmts)
    }

    fn eval_binding_inits(&mut self, bindings: &[(&str, &Node)]) -> Result<Vec<go::Expr>> {
        bindings
            .iter()
            .map(|&(_, init)| self.eval_expr(init))
            .collect()
    }
}

/// Splits a special form's arguments into its leading bindings/params
/// vector and the remaining body forms.
fn split_bindings<'n>(
    args: &'n [Node],
    form: &'static str,
    span: Span,
) -> Result<(&'n Node, &'n [Node])> {
    match args.split_first() {
        Some((first, rest)) => Ok((first, rest)),
        None => Err(span.wrap(Error::BindingsNotVector { form })),
    }
}

/// Reads a flat `[name init name init ...]` bindings vector into pairs.
fn read_bindings<'n>(node: &'n Node, form: &'static str) -> Result<Vec<(&'n str, &'n Node)>> {
    let NodeKind::Vector(elems) = &node.kind else {
        return Err(node.span.wrap(Error::BindingsNotVector { form }));
    };
    if elems.len() % 2 != 0 {
        return Err(node.span.wrap(Error::UnevenBindings { form }));
    }
    elems
        .chunks_exact(2)
        .map(|pair| match pair[0].as_ident() {
            Some(name) => Ok((name, &pair[1])),
            None => Err(pair[0].span.wrap(Error::BindingName { form })),
        })
        .collect()
}

/// A bound name is usually a plain symbol, but may be a path, in which
/// case it addresses a namespaced target.
fn lower_binding_target(name: &str) -> go::Expr {
    if name.contains('/') {
        idents::path_selector(name)
    } else {
        go::Expr::Ident(idents::private_ident(name))
    }
}

/// Reads a `fn` parameter vector. A `&` marker introduces the trailing
/// rest parameter, which must be a single identifier in final position.
fn read_params(node: &Node) -> Result<(Vec<go::Ident>, Option<go::Ident>)> {
    let NodeKind::Vector(elems) = &node.kind else {
        return Err(node.span.wrap(Error::ParamsNotVector));
    };

    let mut params = Vec::with_capacity(elems.len());
    let mut iter = elems.iter();
    while let Some(elem) = iter.next() {
        let Some(name) = elem.as_ident() else {
            return Err(elem.span.wrap(Error::ParamNotIdent));
        };
        if name != "&" {
            params.push(idents::private_ident(name));
            continue;
        }
        let rest = match (iter.next(), iter.next()) {
            (Some(rest), None) => rest,
            _ => return Err(elem.span.wrap(Error::RestParam)),
        };
        let Some(rest) = rest.as_ident() else {
            return Err(rest.span.wrap(Error::RestParam));
        };
        return Ok((params, Some(idents::private_ident(rest))));
    }
    Ok((params, None))
}

/// Whether any form contains a `recur` call reachable through argument
/// positions. A nested `loop` owns the `recur`s in its body, so the search
/// does not descend into one — except through its binding initializers,
/// which still evaluate in the enclosing scope.
fn contains_recur(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| {
        let NodeKind::Call { callee, args } = &node.kind else {
            return false;
        };
        if callee.is_ident("recur") {
            return true;
        }
        if callee.is_ident("loop") {
            let Some(NodeKind::Vector(elems)) = args.first().map(|a| &a.kind) else {
                return false;
            };
            return elems
                .chunks(2)
                .any(|pair| pair.len() == 2 && contains_recur(&pair[1..]));
        }
        contains_recur(args)
    })
}

/// Wraps statements in a zero-parameter function literal invoked in place.
fn immediately_invoked(body: Vec<go::Stmt>) -> go::Expr {
    go::Expr::call(
        go::Expr::FuncLit {
            params: Vec::new(),
            variadic: None,
            body,
        },
        Vec::new(),
    )
}
