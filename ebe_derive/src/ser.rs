use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataStruct, DeriveInput};

use crate::visible_fields;

pub(crate) fn struct_impl(ast: &DeriveInput, data: &DataStruct) -> TokenStream {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let writes = visible_fields(data).into_iter().map(|field| {
        let member = field.member;
        quote! {
            ::ebe::Ser::ser(&self.#member, s)?;
        }
    });

    quote! {
        impl #impl_generics ::ebe::Ser for #name #ty_generics #where_clause {
            fn ser<S: ::ebe::Serializer>(&self, s: &mut S) -> ::ebe::Result<()> {
                let desc = ::ebe::descriptor::of::<Self>();
                if desc.is_empty() {
                    return Ok(());
                }
                s.struct_start(desc.field_count());
                #(#writes)*
                Ok(())
            }
        }
    }
}
