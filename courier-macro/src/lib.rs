// Procedural macros for Courier service interfaces

use proc_macro::TokenStream;

mod params;
mod path_validation;
mod service;

/// Turns a trait into a declarative HTTP service interface.
///
/// Every method must be an `async fn(&self, ..) -> CallResult<T>` carrying one
/// verb attribute (`#[get("path")]`, `#[post]`, `#[put]`, `#[patch]`,
/// `#[delete]` or `#[head]`). Every other parameter is bound with `#[path]`,
/// `#[query]`, `#[header("Name")]` or `#[body]`.
///
/// Attribute arguments:
/// - `name = "..."`: logical service name, defaults to the
///   fully qualified trait path (`my_app::clients::CalculatorClient`)
/// - `registry = "..."`: client factory to bind against
/// - `singleton = false`: hand out a fresh proxy on every resolve
/// - `crate = "..."`: path to `courier_core` when it is re-exported
///
/// ```ignore
/// #[http_service(name = "calculator", registry = "custom")]
/// pub trait CalculatorClient {
///     #[get("calculate/add")]
///     async fn add(&self, #[query] first: i64, #[query] second: i64) -> CallResult<i64>;
///
///     #[get("users/{id}")]
///     async fn user(&self, #[path] id: u64) -> CallResult<User>;
/// }
/// ```
#[proc_macro_attribute]
pub fn http_service(attr: TokenStream, item: TokenStream) -> TokenStream {
    service::http_service_impl(attr, item)
}
