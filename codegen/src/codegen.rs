use log::{trace, warn};
use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};
use std::collections::BTreeSet;
use wsdl2rs_wsdl::types::{trim_ns, Restriction, SimpleDerivation, SimpleType, Union};

use super::{
    error::Error,
    naming::{doc_lines, type_name},
    registry::TypeEntry,
    types::{integer_range, Context, DateAlias, Field, RustType, Scalar},
};

pub trait Codegen {
    fn codegen(&self, context: &Context) -> TokenStream;
}

fn codegen_all<'a, T: Codegen + 'a>(
    all: impl IntoIterator<Item = &'a T>,
    context: &Context,
) -> Vec<TokenStream> {
    all.into_iter().map(|item| item.codegen(context)).collect()
}

pub fn doc_attributes(symbol: &str, documentation: Option<&str>) -> TokenStream {
    let lines = doc_lines(symbol, documentation)
        .into_iter()
        .map(|line| format!(" {}", line));

    quote! { #(#[doc = #lines])* }
}

fn derives() -> TokenStream {
    quote! { #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)] }
}

/// Builds `[literals].iter().any(..)` for an enumeration, or nothing when
/// the restricted type has no literal syntax.
fn validator(context: &Context, name: &Ident, restriction: &Restriction) -> Option<TokenStream> {
    if restriction.enumerations.is_empty() {
        return None;
    }

    let mut access = quote!(self.0);
    let mut base = restriction.base.clone();
    let mut visited = BTreeSet::new();

    while let Some(SimpleType {
        name: base_name,
        derivation: Some(SimpleDerivation::Restriction(inner)),
        ..
    }) = context.registry.simple(&base)
    {
        if !visited.insert(base_name.clone()) {
            break;
        }
        access = quote!(#access.0);
        base = inner.base.clone();
    }

    let values = restriction.enumerations.iter();
    let range = integer_range(&base);
    let (literals, comparison) = match context.map_type(&base) {
        RustType::Builtin {
            scalar: Scalar::Integer,
            ..
        } => (
            values
                .filter_map(|value| match value.trim().parse::<i128>() {
                    Ok(number) if range.as_ref().map_or(true, |range| range.contains(&number)) => {
                        Some(Literal::i128_unsuffixed(number))
                    }
                    Ok(_) => {
                        warn!("Ignoring enumeration {:?} of {}, out of range", value, name);
                        None
                    }
                    Err(_) => {
                        warn!("Ignoring enumeration {:?} of {}", value, name);
                        None
                    }
                })
                .map(|literal| quote!(#literal))
                .collect::<Vec<_>>(),
            quote!(#access == *literal),
        ),

        RustType::Builtin {
            scalar: Scalar::Float,
            ..
        } => (
            values
                .filter_map(|value| match value.trim().parse::<f64>() {
                    Ok(number) if number.is_finite() => Some(Literal::f64_unsuffixed(number)),
                    _ => {
                        warn!("Ignoring enumeration {:?} of {}", value, name);
                        None
                    }
                })
                .map(|literal| quote!(#literal))
                .collect(),
            quote!(#access == *literal),
        ),

        RustType::Builtin {
            scalar: Scalar::Boolean,
            ..
        } => (
            values
                .map(|value| match value.trim() {
                    "true" | "1" => quote!(true),
                    _ => quote!(false),
                })
                .collect(),
            quote!(#access == *literal),
        ),

        RustType::Builtin {
            scalar: Scalar::Binary,
            ..
        } => (
            values.map(|value| quote!(#value)).collect(),
            quote!(#access == literal.as_bytes()),
        ),

        RustType::Builtin {
            scalar: Scalar::Text,
            ..
        }
        | RustType::Date(_) => (
            values.map(|value| quote!(#value)).collect(),
            quote!(#access == *literal),
        ),

        RustType::Any => (
            values.map(|value| quote!(#value)).collect(),
            quote!(#access.text.as_deref() == Some(*literal)),
        ),

        RustType::Simple(_) | RustType::Complex(_) => {
            trace!("No literal syntax for the base of {}", name);
            return None;
        }
    };

    if literals.is_empty() {
        return None;
    }

    Some(quote! {
        impl #name {
            #[doc = " Reports whether the value is one of the enumerated literals."]
            pub fn validate(&self) -> bool {
                [#(#literals),*].iter().any(|literal| #comparison)
            }
        }
    })
}

fn union_base(context: &Context, union: &Union, symbol: &str) -> Option<String> {
    let mut bases = BTreeSet::new();

    for member in &union.member_types {
        let local = trim_ns(member);

        match context.registry.simple(local) {
            Some(SimpleType {
                derivation: Some(SimpleDerivation::Restriction(restriction)),
                ..
            }) => {
                bases.insert(trim_ns(&restriction.base).to_owned());
            }
            Some(_) => {
                bases.insert(local.to_owned());
            }
            None if super::types::is_builtin(local) => {
                bases.insert(local.to_owned());
            }
            None => warn!("Union {} names undeclared member type {}", symbol, member),
        }
    }

    for inline in &union.simple_types {
        if let Some(SimpleDerivation::Restriction(restriction)) = &inline.derivation {
            bases.insert(trim_ns(&restriction.base).to_owned());
        }
    }

    match bases.len() {
        1 => bases.into_iter().next(),
        _ => None,
    }
}

impl Codegen for SimpleType {
    fn codegen(&self, context: &Context) -> TokenStream {
        let symbol = type_name(&self.name);
        let name = format_ident!("{}", symbol);
        let docs = doc_attributes(&symbol, self.documentation.as_deref());

        match &self.derivation {
            Some(SimpleDerivation::Restriction(restriction)) => {
                let base = context.map_type(&restriction.base).tokens();
                let derives = derives();
                let validator = validator(context, &name, restriction);

                quote! {
                    #docs
                    #derives
                    #[serde(transparent)]
                    pub struct #name(pub #base);

                    #validator
                }
            }

            Some(SimpleDerivation::Union(union)) => {
                let members = union
                    .member_types
                    .iter()
                    .map(String::as_str)
                    .chain(union.simple_types.iter().map(|_| "anonymous"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let description = format!("{} is a union of: {}", symbol, members);
                let members_docs = doc_attributes(&symbol, Some(&description));

                let ty = match union_base(context, union, &symbol) {
                    Some(base) => context.map_type(&base).tokens(),
                    None => quote!(runtime::xml::AnyValue),
                };

                quote! {
                    #docs
                    #members_docs
                    pub type #name = #ty;
                }
            }

            None => quote! {
                #docs
                pub type #name = String;
            },
        }
    }
}

impl Codegen for TypeEntry {
    fn codegen(&self, context: &Context) -> TokenStream {
        let ty = &self.ty;
        let symbol = type_name(&ty.name);
        let name = format_ident!("{}", symbol);
        let docs = doc_attributes(&symbol, ty.documentation.as_deref());
        let derives = derives();

        if ty.is_abstract {
            return quote! {
                #docs
                pub type #name = runtime::xml::AnyValue;
            };
        }

        if self.shape.wildcard_only {
            return quote! {
                #docs
                pub type #name = Vec<runtime::xml::AnyValue>;
            };
        }

        if let Some(item) = &self.shape.array_item {
            let item = context.map_type(item).inner();

            return quote! {
                #docs
                #derives
                pub struct #name {
                    #[serde(rename = "item", default)]
                    pub items: Vec<#item>,
                }
            };
        }

        let Some((fields, typed)) = struct_fields(context, self) else {
            return quote! {
                #docs
                #derives
                pub struct #name {}
            };
        };

        let mut fields = fields
            .iter()
            .map(Field::declaration)
            .collect::<Vec<_>>();

        if typed {
            fields.push(quote! {
                #[serde(rename = "@xmlns", default, skip_serializing_if = "String::is_empty")]
                pub type_namespace: String,
                #[serde(skip)]
                pub override_type_namespace: Option<String>,
            });
        }

        let set_xml_type = (typed
            && self.shape.extension_base.is_some()
            && !ty.target_namespace.is_empty())
        .then(|| {
            let namespace = &ty.target_namespace;

            quote! {
                impl #name {
                    #[doc = " Stamps the namespace of this type onto the value, preferring the override."]
                    pub fn set_xml_type(&mut self) {
                        self.type_namespace = match &self.override_type_namespace {
                            Some(namespace) => namespace.clone(),
                            None => #namespace.to_owned(),
                        };
                    }
                }
            }
        });

        quote! {
            #docs
            #derives
            pub struct #name {
                #(#fields)*
            }

            #set_xml_type
        }
    }
}

/// Fields of the struct emitted for `entry` and whether it carries the
/// type namespace pair. `None` when the type emits as an alias or as an
/// empty placeholder.
pub fn struct_fields(context: &Context, entry: &TypeEntry) -> Option<(Vec<Field>, bool)> {
    let ty = &entry.ty;
    let shape = &entry.shape;

    if ty.is_abstract || shape.wildcard_only || shape.array_item.is_some() {
        return None;
    }

    if ty.all_elements.is_empty() && ty.attributes.is_empty() && !shape.simple_content {
        return None;
    }

    let mut seen = BTreeSet::new();
    let fields = ty
        .all_elements
        .iter()
        .filter_map(|element| context.element_field(element))
        .chain(
            ty.attributes
                .iter()
                .map(|attribute| context.attribute_field(attribute)),
        )
        .filter(|field| seen.insert(field.ident.to_string()))
        .collect::<Vec<_>>();

    let typed = (shape.grouped || shape.extension_base.is_some())
        && !seen.contains("type_namespace")
        && !seen.contains("override_type_namespace");

    Some((fields, typed))
}

pub fn wrapper_ident(message: &str) -> Ident {
    format_ident!("Operation{}", type_name(message))
}

/// One wrapper struct per distinct message used by a bound operation.
fn operation_wrappers(context: &Context) -> Result<Vec<TokenStream>, Error> {
    let mut emitted = BTreeSet::new();
    let mut wrappers = Vec::new();

    for (name, cataloged) in &context.registry.operations {
        if cataloged.binding_operation().is_none() {
            continue;
        }

        let operation = &cataloged.operation;
        for reference in operation.input.iter().chain(operation.output.iter()) {
            let message =
                context
                    .registry
                    .message(reference)
                    .ok_or_else(|| Error::UndefinedMessage {
                        operation: name.clone(),
                        message: reference.clone(),
                    })?;

            if message.parts.is_empty() || !emitted.insert(message.name.clone()) {
                continue;
            }

            let ident = wrapper_ident(&message.name);
            let symbol = ident.to_string();
            let purpose = doc_attributes(&symbol, Some(&format!("Operation wrapper for {}.", name)));
            let generated = doc_attributes(&symbol, None);
            let derives = derives();

            let fields = context.part_shapes(message).into_iter().map(|part| {
                let (ident, tag, ty) = (part.ident, part.tag, part.ty.tokens());

                quote! {
                    #[serde(rename = #tag, default, skip_serializing_if = "Option::is_none")]
                    pub #ident: Option<#ty>,
                }
            });

            wrappers.push(quote! {
                #purpose
                #generated
                #derives
                pub struct #ident {
                    #(#fields)*
                }
            });
        }
    }

    Ok(wrappers)
}

fn date_alias(alias: DateAlias) -> TokenStream {
    let name = alias.ident();
    let description = format!("{} is an XML {} value, kept as text.", name, alias.xsd_name());

    quote! {
        #[doc = #description]
        pub type #name = String;
    }
}

/// String aliases for the date and time types referred to so far.
pub fn date_aliases(context: &Context) -> Vec<TokenStream> {
    context.needed_dates().into_iter().map(date_alias).collect()
}

/// The type section: simple types, complex types and operation wrappers,
/// each in name order.
pub fn types_section(context: &Context) -> Result<Vec<TokenStream>, Error> {
    let mut items = codegen_all(context.registry.simple_types.values(), context);
    items.extend(codegen_all(context.registry.complex_types.values(), context));
    items.extend(operation_wrappers(context)?);

    Ok(items)
}
