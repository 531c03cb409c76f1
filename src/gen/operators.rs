use phf::phf_map;

use super::{Error, Generator, Result};
use crate::{
    ast::Node,
    go::{self, BinaryOp, UnaryOp},
    token::Span,
};

/// Operators implemented by the runtime-support package. The surface
/// language's values are dynamically typed, so these cannot lower to the
/// target's native (statically-typed) operators; each maps to a fixed
/// support function instead.
pub(super) static CALLABLE: phf::Map<&'static str, &'static str> = phf_map! {
    "+" => "ADD",
    "-" => "SUB",
    "*" => "MUL",
    "/" => "DIV",
    ">" => "GT",
    ">=" => "GTEQ",
    "<" => "LT",
    "<=" => "LTEQ",
    "=" => "EQ",
    "mod" => "MOD",
};

/// The arithmetic subset of [`CALLABLE`]: n-ary calls left-fold into
/// nested two-argument support calls. These also have a native binary
/// counterpart used when both operands are numeric literals.
static NATIVE_BINARY: phf::Map<&'static str, BinaryOp> = phf_map! {
    "+" => BinaryOp::Add,
    "-" => BinaryOp::Sub,
    "*" => BinaryOp::Mul,
    "/" => BinaryOp::Quo,
};

/// Short-circuit operators lower to the target's native binary form; the
/// left fold preserves left-to-right evaluation order.
pub(super) static LOGIC: phf::Map<&'static str, BinaryOp> = phf_map! {
    "and" => BinaryOp::LAnd,
    "or" => BinaryOp::LOr,
};

pub(super) static UNARY: phf::Map<&'static str, UnaryOp> = phf_map! {
    "!" => UnaryOp::Not,
};

fn support_call(name: &str, args: Vec<go::Expr>) -> go::Expr {
    go::Expr::call(
        go::Expr::selector(go::Expr::ident(go::SUPPORT_PACKAGE), name),
        args,
    )
}

impl Generator {
    pub(super) fn lower_unary(
        &mut self,
        op: UnaryOp,
        args: &[Node],
        span: Span,
    ) -> Result<go::Expr> {
        let [operand] = args else {
            return Err(span.wrap(Error::UnaryArity { found: args.len() }));
        };
        Ok(go::Expr::unary(op, self.eval_expr(operand)?))
    }

    pub(super) fn lower_callable(
        &mut self,
        op: &str,
        support: &'static str,
        args: &[Node],
        span: Span,
    ) -> Result<go::Expr> {
        if op == "mod" {
            if args.len() != 2 {
                return Err(span.wrap(Error::ModArity { found: args.len() }));
            }
            return Ok(support_call(support, self.eval_exprs(args)?));
        }

        if args.len() < 2 {
            return Err(span.wrap(Error::OperatorArity {
                op: op.into(),
                found: args.len(),
            }));
        }

        let Some(native) = NATIVE_BINARY.get(op) else {
            // Comparison: one variadic support call over all operands.
            return Ok(support_call(support, self.eval_exprs(args)?));
        };

        // Arithmetic. Two numeric literals take the native operator; any
        // other shape left-folds into nested support calls.
        let mut exprs = self.eval_exprs(args)?.into_iter();
        let first = exprs.next().expect("arity checked above");
        let second = exprs.next().expect("arity checked above");
        if args.len() == 2 && first.is_numeric_lit() && second.is_numeric_lit() {
            return Ok(go::Expr::binary(*native, first, second));
        }
        let mut outer = support_call(support, vec![first, second]);
        for arg in exprs {
            outer = support_call(support, vec![outer, arg]);
        }
        Ok(outer)
    }

    pub(super) fn lower_logic(
        &mut self,
        op: BinaryOp,
        name: &str,
        args: &[Node],
        span: Span,
    ) -> Result<go::Expr> {
        if args.len() < 2 {
            return Err(span.wrap(Error::OperatorArity {
                op: name.into(),
                found: args.len(),
            }));
        }
        let mut exprs = self.eval_exprs(args)?.into_iter();
        let mut outer = exprs.next().expect("arity checked above");
        for arg in exprs {
            outer = go::Expr::binary(op, outer, arg);
        }
        Ok(outer)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{expr_of, gen_err};
    use super::*;
    use crate::go::LitKind;
    use pretty_assertions::assert_eq;

    fn support(name: &str, args: Vec<go::Expr>) -> go::Expr {
        support_call(name, args)
    }

    #[test]
    fn arithmetic_folds_left_to_right() {
        assert_eq!(
            expr_of("(+ a b c d)"),
            support(
                "ADD",
                vec![
                    support(
                        "ADD",
                        vec![
                            support("ADD", vec![go::Expr::ident("a"), go::Expr::ident("b")]),
                            go::Expr::ident("c"),
                        ],
                    ),
                    go::Expr::ident("d"),
                ],
            ),
        );
    }

    #[test]
    fn two_numeric_literals_use_the_native_operator() {
        assert_eq!(
            expr_of("(+ 1 2)"),
            go::Expr::binary(
                BinaryOp::Add,
                go::Expr::lit(LitKind::Int, "1"),
                go::Expr::lit(LitKind::Int, "2"),
            ),
        );
        // Three literals still fold through the support package.
        assert_eq!(
            expr_of("(* 1 2 3)"),
            support(
                "MUL",
                vec![
                    support(
                        "MUL",
                        vec![
                            go::Expr::lit(LitKind::Int, "1"),
                            go::Expr::lit(LitKind::Int, "2"),
                        ],
                    ),
                    go::Expr::lit(LitKind::Int, "3"),
                ],
            ),
        );
        // A non-literal operand disables the native form.
        assert_eq!(
            expr_of("(+ x 2)"),
            support(
                "ADD",
                vec![go::Expr::ident("x"), go::Expr::lit(LitKind::Int, "2")],
            ),
        );
    }

    #[test]
    fn comparison_is_one_variadic_support_call() {
        assert_eq!(
            expr_of("(< a b c)"),
            support(
                "LT",
                vec![
                    go::Expr::ident("a"),
                    go::Expr::ident("b"),
                    go::Expr::ident("c"),
                ],
            ),
        );
    }

    #[test]
    fn logic_folds_preserve_order() {
        assert_eq!(
            expr_of("(and a b c)"),
            go::Expr::binary(
                BinaryOp::LAnd,
                go::Expr::binary(BinaryOp::LAnd, go::Expr::ident("a"), go::Expr::ident("b")),
                go::Expr::ident("c"),
            ),
        );
        assert_eq!(
            expr_of("(or a b)"),
            go::Expr::binary(BinaryOp::LOr, go::Expr::ident("a"), go::Expr::ident("b")),
        );
    }

    #[test]
    fn unary_not() {
        assert_eq!(
            expr_of("(! a)"),
            go::Expr::unary(UnaryOp::Not, go::Expr::ident("a")),
        );
    }

    #[test]
    fn operator_arity_errors() {
        assert_eq!(gen_err("(def x (! a b))"), Error::UnaryArity { found: 2 });
        assert_eq!(
            gen_err("(def x (+ a))"),
            Error::OperatorArity {
                op: "+".into(),
                found: 1,
            },
        );
        assert_eq!(
            gen_err("(def x (< a))"),
            Error::OperatorArity {
                op: "<".into(),
                found: 1,
            },
        );
        assert_eq!(
            gen_err("(def x (and a))"),
            Error::OperatorArity {
                op: "and".into(),
                found: 1,
            },
        );
        assert_eq!(gen_err("(def x (mod a b c))"), Error::ModArity { found: 3 });
    }
}
