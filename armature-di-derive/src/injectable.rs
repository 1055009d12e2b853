use crate::attributes::{DefaultDefinition, FieldAttributes};
use itertools::Itertools;
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::spanned::Spanned;
use syn::{
    Data, DataStruct, DeriveInput, Error, Field, Fields, GenericArgument, PathArguments, Result,
    Type,
};

const INJECT: &str = "inject";

const POINTER_TYPES: [&str; 3] = ["Arc", "Rc", "InstancePtr"];

const STRING_TYPES: [&str; 3] = ["String", "str", "Cow"];

const NUMBER_TYPES: [&str; 12] = [
    "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32", "f64",
];

const BIG_INTEGER_TYPES: [&str; 2] = ["i128", "u128"];

/// Generated parts for a single field: an optional capability record entry and the expression
/// initializing the field.
struct FieldInjection {
    dependency: Option<TokenStream>,
    construction: TokenStream,
}

fn last_segment_ident(ty: &Type) -> Option<&Ident> {
    if let Type::Path(path) = ty {
        path.path.segments.last().map(|segment| &segment.ident)
    } else {
        None
    }
}

fn pointer_target(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };

    let segment = path.path.segments.last()?;
    if !POINTER_TYPES.iter().any(|name| segment.ident == *name) {
        return None;
    }

    if let PathArguments::AngleBracketed(arguments) = &segment.arguments {
        arguments.args.iter().find_map(|argument| match argument {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
    } else {
        None
    }
}

fn primitive_type(ty: &Type) -> Ident {
    let name = match ty {
        Type::Reference(reference) => return primitive_type(&reference.elem),
        Type::Group(group) => return primitive_type(&group.elem),
        Type::Paren(paren) => return primitive_type(&paren.elem),
        _ => last_segment_ident(ty).map(|ident| ident.to_string()),
    };

    let variant = match name.as_deref() {
        Some(name) if STRING_TYPES.contains(&name) => "String",
        Some(name) if NUMBER_TYPES.contains(&name) => "Number",
        Some(name) if BIG_INTEGER_TYPES.contains(&name) => "BigInteger",
        Some("bool") => "Boolean",
        Some("char") => "Character",
        _ => "Untyped",
    };

    Ident::new(variant, Span::call_site())
}

fn extract_field_attributes(field: &Field) -> Result<FieldAttributes> {
    field
        .attrs
        .iter()
        .filter(|attribute| attribute.path().is_ident(INJECT))
        .map(FieldAttributes::try_from)
        .next()
        .transpose()
        .map(Option::unwrap_or_default)
}

fn generate_injection(field: &Field, index: usize) -> Result<FieldInjection> {
    let attributes = extract_field_attributes(field)?;
    let ty = &field.ty;

    match &attributes.default {
        Some(DefaultDefinition::Expr(path)) => {
            return Ok(FieldInjection {
                dependency: None,
                construction: quote!(#path()),
            })
        }
        Some(DefaultDefinition::Default) => {
            return Ok(FieldInjection {
                dependency: None,
                construction: quote!(std::default::Default::default()),
            })
        }
        None => {}
    }

    let target = pointer_target(ty).filter(|target| !matches!(target, Type::TraitObject(_)));

    if let Some(key) = &attributes.key {
        let context = attributes
            .context
            .as_ref()
            .map(|context| quote!(Some(#context)))
            .unwrap_or_else(|| quote!(None));

        let construction = if let Some(target) = target {
            quote!(dependencies.instance::<#target>(#index)?)
        } else {
            quote!(dependencies.value::<#ty>(#index)?)
        };

        return Ok(FieldInjection {
            dependency: Some(quote! {
                armature_di::injectable::DependencyType::binding::<#ty>(#key, #context)
            }),
            construction,
        });
    }

    match pointer_target(ty) {
        Some(Type::TraitObject(_)) => Err(Error::new(
            field.span(),
            "Trait object dependencies need #[inject(key = \"...\")]!",
        )),
        Some(target) => Ok(FieldInjection {
            dependency: Some(quote! {
                armature_di::injectable::DependencyType::of::<#target>()
            }),
            construction: quote!(dependencies.instance::<#target>(#index)?),
        }),
        None => {
            let primitive = primitive_type(ty);
            Ok(FieldInjection {
                dependency: Some(quote! {
                    armature_di::injectable::DependencyType::Primitive(
                        armature_di::injectable::PrimitiveType::#primitive
                    )
                }),
                construction: quote!(dependencies.unresolvable(#index)?),
            })
        }
    }
}

fn generate_injections<'a>(
    fields: impl Iterator<Item = &'a Field>,
) -> Result<Vec<FieldInjection>> {
    let mut index = 0;
    fields
        .map(|field| {
            let injection = generate_injection(field, index)?;
            if injection.dependency.is_some() {
                index += 1;
            }

            Ok(injection)
        })
        .try_collect()
}

pub fn expand_injectable(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(DataStruct { fields, .. }) = &input.data else {
        return Err(Error::new(
            input.span(),
            "Can only derive Injectable on structs!",
        ));
    };

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Cannot derive Injectable for generic structs!",
        ));
    }

    let ident = &input.ident;
    let injections = generate_injections(fields.iter())?;
    let dependencies = injections
        .iter()
        .filter_map(|injection| injection.dependency.as_ref())
        .collect_vec();
    let constructions = injections
        .iter()
        .map(|injection| &injection.construction)
        .collect_vec();

    let generation = match fields {
        Fields::Named(fields) => {
            let idents = fields.named.iter().filter_map(|field| field.ident.as_ref());
            quote! {
                Self {
                    #(#idents: #constructions),*
                }
            }
        }
        Fields::Unnamed(_) => quote! {
            Self(#(#constructions),*)
        },
        Fields::Unit => quote! { Self },
    };

    Ok(quote! {
        #[automatically_derived]
        impl armature_di::injectable::Injectable for #ident {
            fn capability() -> &'static armature_di::injectable::CapabilityRecord {
                static RECORD: std::sync::OnceLock<armature_di::injectable::CapabilityRecord> =
                    std::sync::OnceLock::new();
                RECORD.get_or_init(|| {
                    armature_di::injectable::CapabilityRecord::new::<Self>(vec![#(#dependencies),*])
                })
            }

            #[allow(unused_variables)]
            fn construct(
                dependencies: &mut armature_di::injectable::Dependencies,
            ) -> Result<Self, armature_di::ContainerError> {
                Ok(#generation)
            }
        }
    })
}
