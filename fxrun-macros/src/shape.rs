//! `#[derive(Shape)]`.
//!
//! Besides bindings and members, the derive records the JSON layout serde
//! gives the type by default: named structs are records keyed by field name,
//! newtypes are transparent, tuple structs are arrays and enums are
//! externally tagged.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashSet;
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericParam, LitStr, ext::IdentExt, parse_macro_input,
    parse_quote,
};

#[derive(Default)]
struct ShapeAttrs {
    bindings: Vec<LitStr>,
    skip: bool,
}

fn parse_shape_attrs(attrs: &[Attribute], allow_skip: bool) -> syn::Result<ShapeAttrs> {
    let mut parsed = ShapeAttrs::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("shape")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("binding") {
                parsed.bindings.push(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("skip") && allow_skip {
                parsed.skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown shape attribute"))
            }
        })?;
    }
    Ok(parsed)
}

/// Pushes one member per field, skipped fields included, and returns the
/// field names (empty for tuple and unit fields).
fn collect_fields(
    fields: &Fields,
    bindings: &mut Vec<LitStr>,
    members: &mut Vec<TokenStream2>,
) -> syn::Result<Vec<String>> {
    let mut names = Vec::new();
    for field in fields {
        let attrs = parse_shape_attrs(&field.attrs, true)?;
        bindings.extend(attrs.bindings);
        if let Some(ident) = &field.ident {
            names.push(ident.unraw().to_string());
        }
        let ty = &field.ty;
        members.push(if attrs.skip {
            quote!(::fxrun::ShapeInfo::skipped())
        } else {
            quote!(<#ty as ::fxrun::Shape>::shape())
        });
    }
    Ok(names)
}

fn struct_layout(fields: &Fields, names: &[String]) -> TokenStream2 {
    match fields {
        Fields::Named(_) => quote!(::fxrun::Layout::Record(&[#(#names),*])),
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
            quote!(::fxrun::Layout::Transparent)
        }
        Fields::Unnamed(_) => quote!(::fxrun::Layout::Tuple),
        Fields::Unit => quote!(::fxrun::Layout::Opaque),
    }
}

pub(crate) fn derive_shape_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let container = parse_shape_attrs(&input.attrs, false)?;
    let mut bindings = container.bindings;
    let mut members = Vec::new();

    let layout = match &input.data {
        Data::Struct(data) => {
            let names = collect_fields(&data.fields, &mut bindings, &mut members)?;
            struct_layout(&data.fields, &names)
        }
        Data::Enum(data) => {
            let mut variants = Vec::new();
            for variant in &data.variants {
                let first = members.len();
                let names = collect_fields(&variant.fields, &mut bindings, &mut members)?;
                let len = members.len() - first;
                let tag = variant.ident.unraw().to_string();
                variants.push(quote! {
                    ::fxrun::Variant {
                        name: #tag,
                        fields: &[#(#names),*],
                        first: #first,
                        len: #len,
                    }
                });
            }
            quote!(::fxrun::Layout::Variants(&[#(#variants),*]))
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(Shape)] is not supported on unions",
            ));
        }
    };

    let mut seen = HashSet::new();
    bindings.retain(|binding| seen.insert(binding.value()));

    for param in input.generics.params.iter_mut() {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::fxrun::Shape));
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::fxrun::Shape for #name #ty_generics #where_clause {
            fn shape() -> ::fxrun::ShapeInfo {
                ::fxrun::ShapeInfo::new::<Self>(
                    &[#(#bindings),*],
                    || ::std::vec![#(#members),*],
                )
                .with_layout(#layout)
            }
        }
    })
}
