//! Mappable derive macro implementation

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

use crate::attributes::{Access, FieldAttributes, parse_field_attributes, parse_type_attributes};

/// Implementation of the Mappable derive macro
pub fn derive_mappable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Mappable cannot be derived for generic types; describe them by hand",
        ));
    }
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Mappable can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Mappable can only be derived for structs with named fields",
        ));
    };

    let name = &input.ident;
    let type_attributes = parse_type_attributes(&input.attrs)?;

    let mut field_entries = Vec::new();
    let mut mappings = Vec::new();
    for field in &fields.named {
        let Some(ident) = &field.ident else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let ty = &field.ty;
        let attributes = parse_field_attributes(field)?;

        let access = match attributes.access {
            Access::ReadWrite => quote! {},
            Access::ReadOnly => quote! { , read_only },
            Access::Hidden => quote! { , hidden },
        };
        field_entries.push(quote! {
            .field(::reflectmap::field!(#name, #ident: #ty #access))
        });

        if let Some(mapping) = field_mapping(&ident.to_string(), &attributes) {
            mappings.push(mapping);
        }
    }

    let supertypes = type_attributes.supertypes.iter().map(|supertype| {
        quote! { .is_a::<#name, #supertype>() }
    });
    let constructor = if type_attributes.default {
        quote! { .default_constructor::<#name>() }
    } else if let Some(constructor) = &type_attributes.constructor {
        quote! {
            .constructor(|| -> ::std::boxed::Box<dyn ::core::any::Any + ::core::marker::Send> {
                ::std::boxed::Box::new(#constructor())
            })
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        impl ::reflectmap::FieldType for #name {
            fn value_type() -> ::reflectmap::ValueType {
                ::reflectmap::ValueType::record::<Self>()
            }
        }

        impl ::reflectmap::Mappable for #name {
            fn descriptor() -> &'static ::reflectmap::TypeDescriptor {
                static DESCRIPTOR: ::std::sync::LazyLock<::reflectmap::TypeDescriptor> =
                    ::std::sync::LazyLock::new(|| {
                        ::reflectmap::TypeDescriptor::of::<#name>()
                            #(#field_entries)*
                            #(#mappings)*
                            #(#supertypes)*
                            #constructor
                    });
                &DESCRIPTOR
            }
        }
    })
}

/// `.mapping(...)` call for a field with candidates
fn field_mapping(target: &str, attributes: &FieldAttributes) -> Option<TokenStream2> {
    if attributes.candidates.is_empty() {
        return None;
    }
    let candidates = attributes.candidates.iter().map(|candidate| {
        let source = &candidate.source;
        let path = candidate.path.as_deref().unwrap_or(target);
        let container = candidate
            .container
            .as_ref()
            .map(|container| quote! { .container(#container) });
        quote! {
            .candidate(::reflectmap::Candidate::new::<#source>(#path) #container)
        }
    });
    Some(quote! {
        .mapping(::reflectmap::FieldMapping::new(#target) #(#candidates)*)
    })
}
