use crate::go;

/// Reassembles a surface symbol in the target's medial-capitalization
/// style: the name is split into `[0-9A-Za-z]+` chunks (separators are
/// dropped), every chunk after the first gets its first character
/// capitalized, and `capitalize_first` controls the first chunk — `true`
/// in publicly-visible positions, `false` otherwise.
pub fn camel_case(src: &str, capitalize_first: bool) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chunk_index = 0;
    let mut in_chunk = false;
    for c in src.chars() {
        if c.is_ascii_alphanumeric() {
            if !in_chunk {
                in_chunk = true;
                if chunk_index > 0 || capitalize_first {
                    out.extend(c.to_uppercase());
                } else {
                    out.push(c);
                }
                chunk_index += 1;
                continue;
            }
            out.push(c);
        } else {
            in_chunk = false;
        }
    }
    out
}

pub fn public_ident(src: &str) -> go::Ident {
    go::Ident::new(camel_case(src, true))
}

pub fn private_ident(src: &str) -> go::Ident {
    go::Ident::new(camel_case(src, false))
}

/// Lowers a path symbol (`module/sub/name`) to a selector chain. The first
/// segment keeps the private casing (it names a package); every following
/// segment is a public field/function access.
pub fn path_selector(src: &str) -> go::Expr {
    let mut parts = src.split('/');
    let first = parts.next().unwrap_or_default();
    let mut expr = go::Expr::Ident(private_ident(first));
    for part in parts {
        expr = go::Expr::Selector {
            base: Box::new(expr),
            field: public_ident(part),
        };
    }
    expr
}
