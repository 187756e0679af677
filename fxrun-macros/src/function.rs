//! `#[function]`.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    FnArg, GenericArgument, Ident, ItemFn, LitStr, PathArguments, ReturnType, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

/// Arguments for the `#[function]` macro.
struct FunctionArgs {
    name: Option<String>,
}

impl Parse for FunctionArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut name = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "name" => {
                    let lit: LitStr = input.parse()?;
                    name = Some(lit.value());
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(FunctionArgs { name })
    }
}

/// The `T` of `Result<T, E>` (or of any alias taking `T` first).
fn ok_type(output: &ReturnType) -> Option<&Type> {
    let ReturnType::Type(_, ty) = output else {
        return None;
    };
    let Type::Path(path) = &**ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    }
}

pub(crate) fn function_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as FunctionArgs);
    let input = parse_macro_input!(item as ItemFn);

    let fn_name = &input.sig.ident;
    let fn_vis = &input.vis;
    let fn_block = &input.block;
    let fn_output = &input.sig.output;

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(&input.sig.fn_token, "Function must be async")
            .to_compile_error()
            .into();
    }

    let Some(output_type) = ok_type(fn_output) else {
        return syn::Error::new_spanned(
            &input.sig,
            "Function must return Result<T, E> where E: Into<BoxError>",
        )
        .to_compile_error()
        .into();
    };

    let mut typed = Vec::new();
    for arg in &input.sig.inputs {
        match arg {
            FnArg::Typed(pat_type) => typed.push(pat_type),
            FnArg::Receiver(receiver) => {
                return syn::Error::new_spanned(receiver, "Function cannot have self parameter")
                    .to_compile_error()
                    .into();
            }
        }
    }

    let (payload, context) = match typed.as_slice() {
        [payload] => (*payload, None),
        [payload, context] => (*payload, Some(*context)),
        _ => {
            return syn::Error::new_spanned(
                &input.sig.inputs,
                "Function must take a payload and optionally a context: fn(payload: P, ctx: C)",
            )
            .to_compile_error()
            .into();
        }
    };

    let struct_name = if let Some(ref custom_name) = args.name {
        Ident::new(custom_name, fn_name.span())
    } else {
        fn_name.clone()
    };

    let payload_pat = &payload.pat;
    let payload_type = &payload.ty;
    let payload_arg = format_ident!("__payload");
    let context_arg = format_ident!("__context");

    let (context_type, inner_params, inner_args) = match context {
        Some(context) => {
            let context_pat = &context.pat;
            let context_type = &context.ty;
            (
                quote! { #context_type },
                quote! { #payload_pat: #payload_type, #context_pat: #context_type },
                quote! { #payload_arg, #context_arg },
            )
        }
        None => (
            quote! { () },
            quote! { #payload_pat: #payload_type },
            quote! { #payload_arg },
        ),
    };

    let expanded = quote! {
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Default)]
        #[doc = concat!(
            "Function handler generated by `#[fxrun::function]` on `",
            stringify!(#fn_name),
            "`"
        )]
        #fn_vis struct #struct_name;

        impl ::fxrun::Handler for #struct_name {
            type Payload = #payload_type;
            type Context = #context_type;
            type Output = #output_type;

            #[allow(unused_variables)]
            async fn call(
                &self,
                #payload_arg: #payload_type,
                #context_arg: #context_type,
            ) -> ::core::result::Result<#output_type, ::fxrun::BoxError> {
                async fn __inner(#inner_params) #fn_output #fn_block
                __inner(#inner_args).await.map_err(::core::convert::Into::into)
            }
        }
    };

    TokenStream::from(expanded)
}
