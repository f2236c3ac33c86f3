//! Derive support for the EBE binary format.

mod de;
mod ser;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Index, Member, Type, Visibility};

/// Derives `Ser`, `De`, and `Described` for a struct.
///
/// Only `pub` fields touch the wire: they are encoded in declaration order
/// and decoded back in the same order, without names. Non-pub fields are
/// skipped on encode and default-initialized on decode. A struct with no
/// `pub` fields occupies zero bytes on the wire.
///
/// Named, tuple, and unit structs are supported; enums and unions are not.
#[proc_macro_derive(EbeSerDe)]
pub fn ebe_ser_de(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match &ast.data {
        Data::Struct(data) => {
            let ser = ser::struct_impl(&ast, data);
            let de = de::struct_impl(&ast, data);
            let described = described_impl(&ast, data);
            quote! {
                #ser
                #de
                #described
            }
            .into()
        }
        _ => syn::Error::new_spanned(&ast.ident, "EbeSerDe can only be derived for structs")
            .to_compile_error()
            .into(),
    }
}

/// One struct field as the generated code sees it.
pub(crate) struct FieldModel<'a> {
    pub member: Member,
    pub ty: &'a Type,
    pub name: String,
}

/// Fields the codec touches, in declaration order.
pub(crate) fn visible_fields<'a>(data: &'a DataStruct) -> Vec<FieldModel<'a>> {
    data.fields
        .iter()
        .enumerate()
        .filter(|(_, field)| matches!(field.vis, Visibility::Public(_)))
        .map(|(i, field)| match &field.ident {
            Some(ident) => FieldModel {
                member: Member::Named(ident.clone()),
                ty: &field.ty,
                name: ident.to_string(),
            },
            None => FieldModel {
                member: Member::Unnamed(Index::from(i)),
                ty: &field.ty,
                name: i.to_string(),
            },
        })
        .collect()
}

/// Fields the codec skips; they are default-initialized on decode.
pub(crate) fn hidden_fields(data: &DataStruct) -> Vec<Member> {
    data.fields
        .iter()
        .enumerate()
        .filter(|(_, field)| !matches!(field.vis, Visibility::Public(_)))
        .map(|(i, field)| match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(i)),
        })
        .collect()
}

fn described_impl(ast: &DeriveInput, data: &DataStruct) -> TokenStream2 {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let entries = visible_fields(data).into_iter().enumerate().map(|(index, field)| {
        let fname = field.name;
        let ty = field.ty;
        quote! {
            ::ebe::descriptor::Field {
                name: #fname,
                kind: <#ty as ::ebe::descriptor::Described>::KIND,
                index: #index,
            }
        }
    });

    quote! {
        impl #impl_generics ::ebe::descriptor::Described for #name #ty_generics #where_clause {
            const KIND: ::ebe::Kind = ::ebe::Kind::Struct;

            fn describe() -> ::ebe::descriptor::Descriptor {
                ::ebe::descriptor::Descriptor::strukt(
                    ::core::any::type_name::<Self>(),
                    ::std::vec![#(#entries),*],
                )
            }
        }
    }
}
