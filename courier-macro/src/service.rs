// #[http_service] expansion

use crate::params::{Binding, BoundParam, Verb, check_bindings, take_bindings, take_verb};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{
    Error, FnArg, GenericArgument, ItemTrait, LitBool, LitStr, Path, PathArguments, ReturnType,
    TraitItem, TraitItemFn, Type, parse_macro_input, parse_quote,
};

#[derive(Default)]
struct ServiceArgs {
    name: Option<LitStr>,
    registry: Option<LitStr>,
    singleton: Option<LitBool>,
    krate: Option<Path>,
}

impl ServiceArgs {
    fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            self.name = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("registry") {
            self.registry = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("singleton") {
            self.singleton = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("crate") {
            let path: LitStr = meta.value()?.parse()?;
            self.krate = Some(path.parse()?);
        } else {
            return Err(meta.error(
                "unknown http_service argument\n\
                 hint: expected `name`, `registry`, `singleton` or `crate`",
            ));
        }
        Ok(())
    }
}

/// One method of the interface after its attributes were consumed.
struct ServiceMethod {
    item: TraitItemFn,
    verb: Verb,
    params: Vec<BoundParam>,
    output: Type,
    returns_unit: bool,
}

pub fn http_service_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = ServiceArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);
    let item_trait = parse_macro_input!(item as ItemTrait);

    match expand(args, item_trait) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: ServiceArgs, mut item_trait: ItemTrait) -> Result<TokenStream2, Error> {
    if !item_trait.generics.params.is_empty() || item_trait.generics.where_clause.is_some() {
        return Err(Error::new(
            item_trait.generics.span(),
            "service traits cannot be generic",
        ));
    }
    if let Some(unsafety) = item_trait.unsafety {
        return Err(Error::new(unsafety.span, "service traits cannot be unsafe"));
    }

    let krate = args
        .krate
        .unwrap_or_else(|| parse_quote!(::courier_core));
    let private = quote!(#krate::__private);

    let mut methods = Vec::new();
    for trait_item in &mut item_trait.items {
        match trait_item {
            TraitItem::Fn(method) => methods.push(service_method(method)?),
            other => {
                return Err(Error::new(
                    other.span(),
                    "service traits may only declare methods",
                ));
            }
        }
    }

    item_trait.supertraits.push(parse_quote!(::core::marker::Send));
    item_trait.supertraits.push(parse_quote!(::core::marker::Sync));
    item_trait
        .attrs
        .push(parse_quote!(#[#private::async_trait]));

    let trait_ident = &item_trait.ident;
    let type_name = trait_ident.to_string();
    let proxy = format_ident!("__{}Proxy", trait_ident);

    let name = option_tokens(args.name.as_ref());
    let registry = option_tokens(args.registry.as_ref());
    let singleton = args.singleton.map(|b| b.value).unwrap_or(true);

    let descriptors = methods.iter().map(|m| {
        let name = m.item.sig.ident.to_string();
        let verb = m.verb.method;
        let path = &m.verb.template.path;
        quote! {
            #private::MethodDescriptor { name: #name, verb: #verb, path: #path }
        }
    });

    let bodies = methods
        .iter()
        .map(|m| proxy_method(m, &type_name, &private));

    Ok(quote! {
        #item_trait

        #[doc(hidden)]
        #[derive(Clone)]
        struct #proxy {
            factory: #private::ClientFactory,
        }

        #[#private::async_trait]
        impl #trait_ident for #proxy {
            #(#bodies)*
        }

        impl #private::HttpService for dyn #trait_ident {
            const DESCRIPTOR: #private::ServiceDescriptor = #private::ServiceDescriptor {
                type_name: #type_name,
                module_path: ::core::module_path!(),
                name: #name,
                registry: #registry,
                singleton: #singleton,
                methods: &[#(#descriptors),*],
            };

            fn bind(factory: #private::ClientFactory) -> #private::Arc<Self> {
                #private::Arc::new(#proxy { factory })
            }
        }

        const _: () = {
            static DESCRIPTOR: #private::ServiceDescriptor =
                <dyn #trait_ident as #private::HttpService>::DESCRIPTOR;

            #private::inventory::submit! {
                #private::ServiceRegistration::new(
                    &DESCRIPTOR,
                    #private::register_service::<dyn #trait_ident>,
                )
            }
        };
    })
}

fn option_tokens(value: Option<&LitStr>) -> TokenStream2 {
    match value {
        Some(lit) => quote!(::core::option::Option::Some(#lit)),
        None => quote!(::core::option::Option::None),
    }
}

fn service_method(method: &mut TraitItemFn) -> Result<ServiceMethod, Error> {
    let ident = method.sig.ident.clone();

    if method.sig.asyncness.is_none() {
        return Err(Error::new(
            method.sig.fn_token.span,
            format!(
                "service method `{}` must be async\nhint: declare it as `async fn {}`",
                ident, ident
            ),
        ));
    }
    if let Some(body) = &method.default {
        return Err(Error::new(
            body.span(),
            "service methods are implemented by the proxy and cannot have a body",
        ));
    }
    if !method.sig.generics.params.is_empty() {
        return Err(Error::new(
            method.sig.generics.span(),
            "service methods cannot be generic",
        ));
    }

    match method.sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(Error::new(
                method.sig.inputs.span(),
                format!("service method `{}` must take `&self`", ident),
            ));
        }
    }

    let (output, returns_unit) = success_type(&method.sig.output, &ident)?;
    let verb = take_verb(&mut method.attrs, &ident)?;
    let params = take_bindings(method.sig.inputs.iter_mut())?;
    check_bindings(&verb, &params)?;

    Ok(ServiceMethod {
        item: method.clone(),
        verb,
        params,
        output,
        returns_unit,
    })
}

// The `T` of a `CallResult<T>` or `Result<T, E>` return type.
fn success_type(output: &ReturnType, method: &syn::Ident) -> Result<(Type, bool), Error> {
    let error = |span| {
        Error::new(
            span,
            format!(
                "service method `{}` must return `CallResult<T>`\n\
                 hint: remote calls can fail, so the return type must be a Result",
                method
            ),
        )
    };

    let ReturnType::Type(_, ty) = output else {
        return Err(error(method.span()));
    };
    let Type::Path(type_path) = ty.as_ref() else {
        return Err(error(ty.span()));
    };
    let Some(segment) = type_path.path.segments.last() else {
        return Err(error(ty.span()));
    };
    if segment.ident != "CallResult" && segment.ident != "Result" {
        return Err(error(ty.span()));
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return Err(error(ty.span()));
    };
    let Some(GenericArgument::Type(success)) = arguments.args.first() else {
        return Err(error(ty.span()));
    };

    let returns_unit = matches!(success, Type::Tuple(tuple) if tuple.elems.is_empty());
    Ok((success.clone(), returns_unit))
}

fn proxy_method(method: &ServiceMethod, type_name: &str, private: &TokenStream2) -> TokenStream2 {
    let sig = &method.item.sig;
    let operation = sig.ident.to_string();
    let verb = format_ident!("{}", method.verb.method);
    let path = &method.verb.template.path;

    let bindings = method.params.iter().map(|param| {
        let ident = &param.ident;
        match &param.binding {
            Binding::Path(name) => quote!(let __call = __call.path_param(#name, &#ident)?;),
            Binding::Query(name) => quote!(let __call = __call.query(#name, &#ident)?;),
            Binding::Header(name) => quote!(let __call = __call.header(#name, &#ident)?;),
            Binding::Body => quote!(let __call = __call.body(&#ident)?;),
        }
    });

    let media_type = method
        .verb
        .media_type
        .as_ref()
        .map(|media_type| quote!(let __call = __call.media_type(#media_type);));

    let output = &method.output;
    let dispatch = if method.returns_unit {
        quote!(self.factory.send(__call).await?)
    } else {
        quote!(self.factory.call::<#output>(__call).await?)
    };

    quote! {
        #sig {
            let __call = #private::CallDescriptor::new(#private::Method::#verb, #path)
                .named(#type_name, #operation);
            #(#bindings)*
            #media_type
            ::core::result::Result::Ok(#dispatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(args: ServiceArgs, item: ItemTrait) -> Result<String, String> {
        expand(args, item)
            .map(|tokens| tokens.to_string())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_expands_proxy_and_descriptor() {
        let expanded = expand_str(
            ServiceArgs {
                name: Some(parse_quote!("calculator")),
                ..Default::default()
            },
            parse_quote! {
                pub trait CalculatorClient {
                    #[get("calculate/add")]
                    async fn add(&self, #[query] first: i64, #[query] second: i64) -> CallResult<i64>;
                }
            },
        )
        .unwrap();

        assert!(expanded.contains("struct __CalculatorClientProxy"));
        assert!(expanded.contains("impl :: courier_core :: __private :: HttpService for dyn CalculatorClient"));
        assert!(expanded.contains("Some (\"calculator\")"));
        assert!(expanded.contains("inventory :: submit !"));
        assert!(!expanded.contains("# [query]"));
        assert!(!expanded.contains("# [get"));
    }

    #[test]
    fn test_custom_crate_path() {
        let expanded = expand_str(
            ServiceArgs {
                krate: Some(parse_quote!(::courier::core)),
                ..Default::default()
            },
            parse_quote! {
                trait Ping {
                    #[head("ping")]
                    async fn ping(&self) -> CallResult<()>;
                }
            },
        )
        .unwrap();

        assert!(expanded.contains(":: courier :: core :: __private :: async_trait"));
        assert!(expanded.contains("self . factory . send (__call)"));
    }

    #[test]
    fn test_rejects_invalid_methods() {
        let sync = expand_str(
            ServiceArgs::default(),
            parse_quote! {
                trait Ping {
                    #[get("ping")]
                    fn ping(&self) -> CallResult<()>;
                }
            },
        );
        assert!(sync.unwrap_err().contains("must be async"));

        let infallible = expand_str(
            ServiceArgs::default(),
            parse_quote! {
                trait Ping {
                    #[get("ping")]
                    async fn ping(&self) -> u32;
                }
            },
        );
        assert!(infallible.unwrap_err().contains("must return `CallResult<T>`"));

        let owned = expand_str(
            ServiceArgs::default(),
            parse_quote! {
                trait Ping {
                    #[get("ping")]
                    async fn ping(self) -> CallResult<()>;
                }
            },
        );
        assert!(owned.unwrap_err().contains("must take `&self`"));
    }

    #[test]
    fn test_rejects_generic_traits() {
        let err = expand_str(
            ServiceArgs::default(),
            parse_quote! {
                trait Store<T> {
                    #[get("items")]
                    async fn items(&self) -> CallResult<Vec<T>>;
                }
            },
        )
        .unwrap_err();
        assert!(err.contains("cannot be generic"));
    }
}
