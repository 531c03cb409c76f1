use std::io::Write;

use crate::ast::{Node, NodeKind};

const INDENT_WIDTH: usize = 2;

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

/// Prints the forms as an indented tree, one node per line. Only used for
/// test assertions and debugging.
pub fn print_forms_string(forms: &[Node]) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_forms(&mut buf, forms).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_forms(w: &mut impl Write, forms: &[Node]) -> std::io::Result<()> {
    for form in forms {
        print_node(w, 0, form)?;
    }
    Ok(())
}

pub fn print_node(w: &mut impl Write, i: usize, node: &Node) -> std::io::Result<()> {
    sp(w, i)?;
    let span = node.span;
    match &node.kind {
        NodeKind::Ident(name) => writeln!(w, "ident {name} ({span})"),
        NodeKind::Str(raw) => writeln!(w, "string {raw} ({span})"),
        NodeKind::Number { text, kind } => writeln!(w, "number {kind:?} {text} ({span})"),
        NodeKind::Vector(elems) => {
            writeln!(w, "vector ({span})")?;
            for elem in elems {
                print_node(w, i + 1, elem)?;
            }
            Ok(())
        }
        NodeKind::Call { callee, args } => {
            writeln!(w, "call ({span})")?;
            print_node(w, i + 1, callee)?;
            for arg in args {
                print_node(w, i + 1, arg)?;
            }
            Ok(())
        }
    }
}
