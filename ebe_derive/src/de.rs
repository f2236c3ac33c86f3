use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataStruct, DeriveInput};

use crate::{hidden_fields, visible_fields};

pub(crate) fn struct_impl(ast: &DeriveInput, data: &DataStruct) -> TokenStream {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let visible = visible_fields(data);
    let defaults: Vec<TokenStream> = hidden_fields(data)
        .into_iter()
        .map(|member| {
            quote! {
                #member: ::core::default::Default::default(),
            }
        })
        .collect();

    // A struct with no visible fields occupies zero bytes, so its decode
    // consumes nothing. That choice is made here, at expansion time.
    if visible.is_empty() {
        return quote! {
            impl #impl_generics ::ebe::De for #name #ty_generics #where_clause {
                fn de<D: ::ebe::Deserializer>(_d: &mut D) -> ::ebe::Result<Self> {
                    Ok(#name {
                        #(#defaults)*
                    })
                }
            }
        };
    }

    // Struct literal fields evaluate in source order, so listing the
    // visible fields first reads them off the wire in declaration order.
    let reads = visible.into_iter().map(|field| {
        let member = field.member;
        let ty = field.ty;
        quote! {
            #member: <#ty as ::ebe::De>::de(d)?,
        }
    });

    quote! {
        impl #impl_generics ::ebe::De for #name #ty_generics #where_clause {
            fn de<D: ::ebe::Deserializer>(d: &mut D) -> ::ebe::Result<Self> {
                d.read_struct_header(::ebe::descriptor::of::<Self>())?;
                Ok(#name {
                    #(#reads)*
                    #(#defaults)*
                })
            }
        }
    }
}
