// Compile-time validation of service path templates

use proc_macro2::Span;
use syn::Error;

/// A path template that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    pub path: String,
    pub placeholders: Vec<String>,
}

/// Validate a path template relative to the factory's base URL.
///
/// Placeholders use `{name}` syntax and may appear anywhere inside a segment.
pub fn validate_path_template(path: &str, span: Span) -> Result<PathTemplate, Error> {
    if path.starts_with('/') {
        return Err(Error::new(
            span,
            format!(
                "service path must be relative to the base URL, got: \"{}\"\n\
                 hint: change to \"{}\"",
                path,
                path.trim_start_matches('/')
            ),
        ));
    }

    if path.contains("//") {
        return Err(Error::new(
            span,
            format!(
                "service path contains double slashes: \"{}\"\n\
                 hint: remove consecutive slashes",
                path
            ),
        ));
    }

    if path.contains('?') || path.contains('#') {
        return Err(Error::new(
            span,
            format!(
                "service path must not carry a query or fragment: \"{}\"\n\
                 hint: bind query values with #[query] parameters",
                path
            ),
        ));
    }

    let mut placeholders: Vec<String> = Vec::new();
    let mut rest = path;

    while let Some(open) = rest.find(['{', '}']) {
        validate_literal(&rest[..open], path, span)?;

        if rest[open..].starts_with('}') {
            return Err(unbalanced(path, span));
        }

        let after = &rest[open + 1..];
        let close = after.find(['{', '}']).ok_or_else(|| unbalanced(path, span))?;
        if after[close..].starts_with('{') {
            return Err(Error::new(
                span,
                format!("nested placeholder in service path: \"{}\"", path),
            ));
        }

        let name = &after[..close];
        validate_placeholder(name, path, span)?;
        if placeholders.iter().any(|p| p == name) {
            return Err(Error::new(
                span,
                format!(
                    "duplicate placeholder '{{{}}}' in service path: \"{}\"\n\
                     hint: each placeholder name must be unique",
                    name, path
                ),
            ));
        }
        placeholders.push(name.to_string());

        rest = &after[close + 1..];
    }
    validate_literal(rest, path, span)?;

    Ok(PathTemplate {
        path: path.to_string(),
        placeholders,
    })
}

fn unbalanced(path: &str, span: Span) -> Error {
    Error::new(
        span,
        format!(
            "unbalanced braces in service path: \"{}\"\n\
             hint: placeholders look like {{id}}",
            path
        ),
    )
}

fn validate_placeholder(name: &str, path: &str, span: Span) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::new(
            span,
            format!("empty placeholder '{{}}' in service path: \"{}\"", path),
        ));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.'))
    {
        return Err(Error::new(
            span,
            format!(
                "placeholder '{{{}}}' contains invalid character '{}'\n\
                 hint: use only letters, numbers, hyphens, underscores and dots",
                name, c
            ),
        ));
    }

    Ok(())
}

// Literal text may hold any RFC 3986 path character.
fn validate_literal(literal: &str, path: &str, span: Span) -> Result<(), Error> {
    let allowed = |c: char| {
        c.is_ascii_alphanumeric()
            || matches!(
                c,
                '/' | '-' | '_' | '.' | '~' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+'
                    | ',' | ';' | '=' | ':' | '@' | '%'
            )
    };

    if let Some(c) = literal.chars().find(|c| !allowed(*c)) {
        return Err(Error::new(
            span,
            format!(
                "service path \"{}\" contains invalid character '{}'\n\
                 hint: percent-encode it or bind the value as a path parameter",
                path, c
            ),
        ));
    }

    Ok(())
}
