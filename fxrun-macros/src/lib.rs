//! Procedural macros for fxrun.
//!
//! - `#[derive(Shape)]` - declares codec bindings and member shapes
//! - `#[function]` - turns an `async fn` into a `Handler`
//!
//! Both expand to paths under `::fxrun`, so they are meant to be used through
//! the facade crate.

use proc_macro::TokenStream;

mod function;
mod shape;

/// Derive macro for implementing `Shape`.
///
/// ```rust,ignore
/// #[derive(Shape, Serialize, Deserialize)]
/// #[shape(binding = "camel_case")]
/// struct Account {
///     account_name: String,
///     #[shape(skip)]
///     cached: Option<Value>,
/// }
/// ```
///
/// `#[shape(binding = "...")]` may appear on the container or on fields and
/// may repeat; every binding found is declared by the type. `#[shape(skip)]`
/// leaves a field out of member inspection.
#[proc_macro_derive(Shape, attributes(shape))]
pub fn derive_shape(input: TokenStream) -> TokenStream {
    shape::derive_shape_impl(input)
}

/// Attribute macro turning an `async fn` into a function `Handler`.
///
/// ```rust,ignore
/// #[fxrun::function]
/// async fn greet(name: String) -> Result<String, BoxError> {
///     Ok(format!("hello {name}"))
/// }
///
/// #[fxrun::function(name = "Totals")]
/// async fn totals(order: Json<Order>, ctx: FunctionContext) -> Result<Json<Receipt>, BoxError> {
///     ...
/// }
/// ```
///
/// The function must be `async`, take the payload and optionally a context,
/// and return a `Result` whose error converts into `BoxError`. The generated
/// unit struct carries the function's name unless `name = "..."` is given.
#[proc_macro_attribute]
pub fn function(attr: TokenStream, item: TokenStream) -> TokenStream {
    function::function_impl(attr, item)
}
