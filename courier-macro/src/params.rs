// Method and parameter attribute parsing for service interfaces

use crate::path_validation::{PathTemplate, validate_path_template};
use proc_macro2::Span;
use syn::parse::ParseStream;
use syn::spanned::Spanned;
use syn::{Attribute, Error, FnArg, Ident, LitStr, Meta, Pat, PatType, Token};

const VERBS: &[(&str, &str)] = &[
    ("get", "GET"),
    ("post", "POST"),
    ("put", "PUT"),
    ("patch", "PATCH"),
    ("delete", "DELETE"),
    ("head", "HEAD"),
];

const BINDINGS: &[&str] = &["path", "query", "header", "body"];

/// A parsed verb attribute such as `#[get("users/{id}")]`.
#[derive(Debug)]
pub struct Verb {
    pub method: &'static str,
    pub template: PathTemplate,
    pub media_type: Option<LitStr>,
    pub span: Span,
}

/// How an argument is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Path(String),
    Query(String),
    Header(String),
    Body,
}

/// An argument together with its binding.
#[derive(Debug)]
pub struct BoundParam {
    pub ident: Ident,
    pub binding: Binding,
    pub span: Span,
}

fn is_verb(attr: &Attribute) -> Option<&'static str> {
    VERBS
        .iter()
        .find(|(name, _)| attr.path().is_ident(name))
        .map(|(_, method)| *method)
}

fn is_binding(attr: &Attribute) -> bool {
    BINDINGS.iter().any(|name| attr.path().is_ident(name))
}

/// Remove the verb attribute from a method's attributes and parse it.
pub fn take_verb(attrs: &mut Vec<Attribute>, method: &Ident) -> Result<Verb, Error> {
    let mut verbs: Vec<(&'static str, Attribute)> = Vec::new();
    attrs.retain(|attr| match is_verb(attr) {
        Some(verb) => {
            verbs.push((verb, attr.clone()));
            false
        }
        None => true,
    });

    let (verb, attr) = match verbs.len() {
        1 => verbs.remove(0),
        0 => {
            return Err(Error::new(
                method.span(),
                format!(
                    "service method `{}` has no HTTP verb\n\
                     hint: annotate it with #[get(\"path\")], #[post], #[put], #[patch], #[delete] or #[head]",
                    method
                ),
            ));
        }
        _ => {
            return Err(Error::new(
                verbs[1].1.span(),
                format!("service method `{}` has more than one HTTP verb", method),
            ));
        }
    };

    let span = attr.span();
    let (path, media_type) = match &attr.meta {
        Meta::Path(_) => (None, None),
        Meta::List(_) => attr.parse_args_with(parse_verb_args)?,
        Meta::NameValue(nv) => {
            return Err(Error::new(
                nv.span(),
                "expected #[verb(\"path\")], not #[verb = ...]",
            ));
        }
    };

    let path_value = path.as_ref().map(LitStr::value).unwrap_or_default();
    let path_span = path.as_ref().map(LitStr::span).unwrap_or(span);
    let template = validate_path_template(&path_value, path_span)?;

    Ok(Verb {
        method: verb,
        template,
        media_type,
        span,
    })
}

// "path" [, media_type = "type/subtype"]
fn parse_verb_args(input: ParseStream) -> syn::Result<(Option<LitStr>, Option<LitStr>)> {
    let mut path = None;
    let mut media_type = None;

    if input.peek(LitStr) {
        path = Some(input.parse()?);
        if !input.is_empty() {
            input.parse::<Token![,]>()?;
        }
    }

    while !input.is_empty() {
        let key: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let value: LitStr = input.parse()?;
        if key == "media_type" {
            media_type = Some(value);
        } else {
            return Err(Error::new(
                key.span(),
                format!("unknown verb argument `{}`\nhint: expected `media_type`", key),
            ));
        }
        if !input.is_empty() {
            input.parse::<Token![,]>()?;
        }
    }

    Ok((path, media_type))
}

/// Strip the binding attribute from an argument and parse it.
pub fn take_binding(arg: &mut PatType) -> Result<BoundParam, Error> {
    let ident = match arg.pat.as_ref() {
        Pat::Ident(pat) => pat.ident.clone(),
        other => {
            return Err(Error::new(
                other.span(),
                "service method parameters must be plain identifiers",
            ));
        }
    };

    let mut bindings = Vec::new();
    arg.attrs.retain(|attr| {
        if is_binding(attr) {
            bindings.push(attr.clone());
            false
        } else {
            true
        }
    });

    let attr = match bindings.len() {
        1 => bindings.remove(0),
        0 => {
            return Err(Error::new(
                ident.span(),
                format!(
                    "parameter `{}` is not bound to the request\n\
                     hint: annotate it with #[path], #[query], #[header(\"Name\")] or #[body]",
                    ident
                ),
            ));
        }
        _ => {
            return Err(Error::new(
                bindings[1].span(),
                format!("parameter `{}` has more than one binding", ident),
            ));
        }
    };

    let explicit = match &attr.meta {
        Meta::Path(_) => None,
        Meta::List(_) => Some(attr.parse_args::<LitStr>()?.value()),
        Meta::NameValue(nv) => {
            return Err(Error::new(nv.span(), "expected #[binding(\"name\")]"));
        }
    };
    let default_name = ident.to_string().trim_start_matches("r#").to_string();

    let binding = if attr.path().is_ident("body") {
        if explicit.is_some() {
            return Err(Error::new(attr.span(), "#[body] takes no arguments"));
        }
        Binding::Body
    } else if attr.path().is_ident("path") {
        Binding::Path(explicit.unwrap_or(default_name))
    } else if attr.path().is_ident("query") {
        Binding::Query(explicit.unwrap_or(default_name))
    } else {
        Binding::Header(explicit.unwrap_or_else(|| default_name.replace('_', "-")))
    };

    Ok(BoundParam {
        ident,
        binding,
        span: attr.span(),
    })
}

/// Bind every typed argument of a method.
pub fn take_bindings<'a>(
    inputs: impl Iterator<Item = &'a mut FnArg>,
) -> Result<Vec<BoundParam>, Error> {
    let mut params = Vec::new();
    for input in inputs {
        if let FnArg::Typed(arg) = input {
            params.push(take_binding(arg)?);
        }
    }
    Ok(params)
}

/// Check that path parameters and placeholders match one to one.
pub fn check_bindings(verb: &Verb, params: &[BoundParam]) -> Result<(), Error> {
    let mut bodies = params.iter().filter(|p| p.binding == Binding::Body);
    if let (Some(_), Some(second)) = (bodies.next(), bodies.next()) {
        return Err(Error::new(
            second.span,
            "a service method can have at most one #[body] parameter",
        ));
    }

    let mut seen: Vec<&str> = Vec::new();
    for param in params {
        let Binding::Path(name) = &param.binding else {
            continue;
        };
        if seen.contains(&name.as_str()) {
            return Err(Error::new(
                param.span,
                format!("path parameter '{}' is bound twice", name),
            ));
        }
        if !verb.template.placeholders.contains(name) {
            return Err(Error::new(
                param.span,
                format!(
                    "path parameter '{}' has no placeholder in \"{}\"\n\
                     hint: add {{{}}} to the path or bind it with #[query]",
                    name, verb.template.path, name
                ),
            ));
        }
        seen.push(name);
    }

    if let Some(missing) = verb
        .template
        .placeholders
        .iter()
        .find(|p| !seen.contains(&p.as_str()))
    {
        return Err(Error::new(
            verb.span,
            format!(
                "placeholder '{{{}}}' in \"{}\" is not bound\n\
                 hint: add a parameter annotated with #[path(\"{}\")]",
                missing, verb.template.path, missing
            ),
        ));
    }

    Ok(())
}
