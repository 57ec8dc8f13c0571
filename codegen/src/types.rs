use log::warn;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use std::{cell::RefCell, collections::BTreeSet, ops::RangeInclusive};
use wsdl2rs_wsdl::types::{trim_ns, Attribute, Content, Element, Message, Part};

use super::{
    naming::{snake_name, type_name},
    options::Options,
    registry::Registry,
};

/// String aliases emitted at the top of the module when a schema uses the
/// matching XSD type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateAlias {
    Date,
    Time,
    DateTime,
    Duration,
}

impl DateAlias {
    pub fn ident(self) -> Ident {
        match self {
            DateAlias::Date => format_ident!("Date"),
            DateAlias::Time => format_ident!("Time"),
            DateAlias::DateTime => format_ident!("DateTime"),
            DateAlias::Duration => format_ident!("Duration"),
        }
    }

    pub fn xsd_name(self) -> &'static str {
        match self {
            DateAlias::Date => "date",
            DateAlias::Time => "time",
            DateAlias::DateTime => "dateTime",
            DateAlias::Duration => "duration",
        }
    }
}

/// Scalar kinds with their own literal syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Text,
    Integer,
    Float,
    Boolean,
    Binary,
}

#[derive(Debug, Clone)]
pub enum RustType {
    Builtin { tokens: TokenStream, scalar: Scalar },
    Date(DateAlias),
    Simple(Ident),
    /// Registered complex types are boxed wherever they are held by value.
    Complex(Ident),
    Any,
}

impl RustType {
    fn builtin(tokens: TokenStream, scalar: Scalar) -> Self {
        RustType::Builtin { tokens, scalar }
    }

    fn string() -> Self {
        RustType::builtin(quote!(String), Scalar::Text)
    }

    pub fn is_boxed(&self) -> bool {
        matches!(self, RustType::Complex(_))
    }

    /// The type without the box, as used inside collections.
    pub fn inner(&self) -> TokenStream {
        match self {
            RustType::Builtin { tokens, .. } => tokens.clone(),
            RustType::Date(alias) => {
                let ident = alias.ident();
                quote!(#ident)
            }
            RustType::Simple(ident) | RustType::Complex(ident) => quote!(#ident),
            RustType::Any => quote!(runtime::xml::AnyValue),
        }
    }

    pub fn tokens(&self) -> TokenStream {
        let inner = self.inner();

        match self {
            RustType::Complex(_) => quote!(Box<#inner>),
            _ => inner,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            RustType::Builtin {
                scalar: Scalar::Text,
                ..
            }
        )
    }
}

/// Names the mapping knows without consulting the registry.
pub fn is_builtin(name: &str) -> bool {
    builtin_type(name).is_some()
}

fn builtin_type(name: &str) -> Option<RustType> {
    let ty = match name.trim() {
        "byte" | "unsignedByte" => RustType::builtin(quote!(u8), Scalar::Integer),
        "short" => RustType::builtin(quote!(i16), Scalar::Integer),
        "unsignedShort" => RustType::builtin(quote!(u16), Scalar::Integer),
        "int" => RustType::builtin(quote!(i32), Scalar::Integer),
        "integer" | "long" => RustType::builtin(quote!(i64), Scalar::Integer),
        "nonNegativeInteger" | "unsignedInt" => RustType::builtin(quote!(u32), Scalar::Integer),
        "positiveInteger" | "unsignedLong" => RustType::builtin(quote!(u64), Scalar::Integer),
        "float" | "double" | "decimal" => RustType::builtin(quote!(f64), Scalar::Float),
        "boolean" => RustType::builtin(quote!(bool), Scalar::Boolean),
        "hexBinary" | "base64Binary" => RustType::builtin(quote!(Vec<u8>), Scalar::Binary),
        "string" | "anyURI" | "token" | "NMTOKEN" | "QName" | "language" | "ID"
        | "normalizedString" | "IDREF" | "IDREFS" => RustType::string(),
        "date" => RustType::Date(DateAlias::Date),
        "time" => RustType::Date(DateAlias::Time),
        "dateTime" => RustType::Date(DateAlias::DateTime),
        "duration" => RustType::Date(DateAlias::Duration),
        "anyType" | "anySimpleType" | "anysequence" => RustType::Any,
        _ => return None,
    };

    Some(ty)
}

/// Values the Rust type of an XSD integer type can hold.
pub fn integer_range(name: &str) -> Option<RangeInclusive<i128>> {
    let range = match trim_ns(name).trim() {
        "byte" | "unsignedByte" => i128::from(u8::MIN)..=i128::from(u8::MAX),
        "short" => i128::from(i16::MIN)..=i128::from(i16::MAX),
        "unsignedShort" => i128::from(u16::MIN)..=i128::from(u16::MAX),
        "int" => i128::from(i32::MIN)..=i128::from(i32::MAX),
        "integer" | "long" => i128::from(i64::MIN)..=i128::from(i64::MAX),
        "nonNegativeInteger" | "unsignedInt" => i128::from(u32::MIN)..=i128::from(u32::MAX),
        "positiveInteger" | "unsignedLong" => i128::from(u64::MIN)..=i128::from(u64::MAX),
        _ => return None,
    };

    Some(range)
}

/// How many values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Required,
    Optional,
    Repeated,
    OptionalRepeated,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub ident: Ident,
    pub tag: String,
    pub ty: RustType,
    pub cardinality: Cardinality,
    /// Held by value: the anonymous wrapper around a single child.
    pub nested: bool,
}

impl Field {
    pub fn declaration(&self) -> TokenStream {
        let Field { ident, tag, .. } = self;

        let repeated = matches!(
            self.cardinality,
            Cardinality::Repeated | Cardinality::OptionalRepeated
        );

        let value = if repeated || self.nested {
            let inner = self.ty.inner();
            if repeated {
                quote!(Vec<#inner>)
            } else {
                inner
            }
        } else {
            self.ty.tokens()
        };

        match self.cardinality {
            Cardinality::Optional | Cardinality::OptionalRepeated => quote! {
                #[serde(rename = #tag, default, skip_serializing_if = "Option::is_none")]
                pub #ident: Option<#value>,
            },
            Cardinality::Repeated => quote! {
                #[serde(rename = #tag, default, skip_serializing_if = "Vec::is_empty")]
                pub #ident: #value,
            },
            Cardinality::Required => quote! {
                #[serde(rename = #tag, default)]
                pub #ident: #value,
            },
        }
    }
}

/// How an element with an anonymous single-child type is emitted.
enum Collapse {
    Wrapper,
    Wildcard(Element),
}

/// A message part as seen by the client: parameter, wrapper field and tag.
#[derive(Debug, Clone)]
pub struct PartShape {
    pub ident: Ident,
    pub tag: String,
    pub ty: RustType,
    /// Schema type the part resolves to.
    pub type_ref: String,
}

/// Everything the emitters need while walking the registry.
pub struct Context<'a> {
    pub registry: &'a Registry,
    pub options: &'a Options,
    dates: RefCell<BTreeSet<DateAlias>>,
}

impl<'a> Context<'a> {
    pub fn new(registry: &'a Registry, options: &'a Options) -> Self {
        Self {
            registry,
            options,
            dates: RefCell::new(BTreeSet::new()),
        }
    }

    /// Date aliases the emitted code has referred to so far.
    pub fn needed_dates(&self) -> Vec<DateAlias> {
        self.dates.borrow().iter().copied().collect()
    }

    /// Maps a schema type reference to the Rust type fields hold. Unknown
    /// types fall back to `String`.
    pub fn map_type(&self, type_ref: &str) -> RustType {
        let type_ref = if type_ref.trim().is_empty() {
            "string"
        } else {
            type_ref
        };
        let local = trim_ns(type_ref).trim();

        if self.registry.simple_types.contains_key(local) {
            return RustType::Simple(format_ident!("{}", type_name(local)));
        }

        match builtin_type(local) {
            Some(RustType::Date(alias)) => {
                self.dates.borrow_mut().insert(alias);
                RustType::Date(alias)
            }
            Some(ty) => ty,
            None if self.registry.complex_types.contains_key(local) => {
                RustType::Complex(format_ident!("{}", type_name(local)))
            }
            None => RustType::string(),
        }
    }

    /// Collapses an element whose anonymous type wraps exactly one child.
    /// The element keeps its own tag and cardinality and holds the
    /// registered anonymous type by value, whose one field carries the
    /// child's tag. A lone wildcard child becomes an opaque value.
    fn collapse(&self, element: &Element) -> Option<Collapse> {
        let ty = element.complex_type.as_deref()?;
        if !ty.attributes.is_empty() || !ty.all_elements.is_empty() {
            return None;
        }

        let (elements, any) = match &ty.content {
            Some(Content::Sequence(sequence)) if sequence.choices.is_empty() => {
                (&sequence.elements, &sequence.any)
            }
            Some(Content::Choice(choice)) if choice.sequence.is_none() => {
                (&choice.elements, &choice.any)
            }
            _ => return None,
        };

        match (elements.as_slice(), any.as_slice()) {
            ([_], []) if self.registry.complex(&element.type_name).is_some() => {
                Some(Collapse::Wrapper)
            }
            ([], [_]) => Some(Collapse::Wildcard(Element {
                name: element.name.clone(),
                type_name: "anyType".to_owned(),
                min_occurs: element.min_occurs,
                max_occurs: element.max_occurs,
                nillable: element.nillable,
                ..Default::default()
            })),
            _ => None,
        }
    }

    fn dereference(&self, element: &Element) -> Option<Element> {
        if element.ref_name.is_empty() {
            return Some(element.clone());
        }

        match self.registry.element(&element.ref_name) {
            Some(target) => Some(target.enriched_by(element)),
            None => {
                warn!("Skipping reference to undeclared element {}", element.ref_name);
                None
            }
        }
    }

    pub fn element_field(&self, element: &Element) -> Option<Field> {
        let element = self.dereference(element)?;

        let (element, nested) = match self.collapse(&element) {
            Some(Collapse::Wrapper) => (element, true),
            Some(Collapse::Wildcard(opaque)) => (opaque, false),
            None => (element, false),
        };

        if element.name.is_empty() {
            warn!("Skipping element without a name of type {}", element.type_name);
            return None;
        }

        let ty = self.map_type(&element.type_name);
        let optional = element.nillable || element.min_occurs == 0;
        let indirect = !self.options.no_simple_type_indirect || ty.is_boxed();

        let cardinality = match (element.max_occurs.is_repeated(), optional && indirect) {
            (true, true) => Cardinality::OptionalRepeated,
            (true, false) => Cardinality::Repeated,
            (false, true) => Cardinality::Optional,
            (false, false) => Cardinality::Required,
        };

        Some(Field {
            ident: format_ident!("{}", snake_name(&element.name)),
            tag: element.tag.clone().unwrap_or_else(|| element.name.clone()),
            ty,
            cardinality,
            nested,
        })
    }

    pub fn attribute_field(&self, attribute: &Attribute) -> Field {
        let name = if attribute.name.is_empty() {
            trim_ns(&attribute.ref_name)
        } else {
            &attribute.name
        };

        let ty = match self.map_type(&attribute.type_name) {
            RustType::Complex(_) => RustType::string(),
            ty => ty,
        };

        let optional = !attribute.required && !self.options.no_simple_type_indirect;
        let tag = attribute.tag_name.as_deref().unwrap_or(name);

        Field {
            ident: format_ident!("{}", snake_name(name)),
            tag: format!("@{}", tag),
            ty,
            cardinality: if optional {
                Cardinality::Optional
            } else {
                Cardinality::Required
            },
            nested: false,
        }
    }

    fn part_shape(&self, part: &Part) -> PartShape {
        let (name, type_ref) = match (&part.element, &part.type_name) {
            (Some(element), _) => match self.registry.element(element) {
                Some(declared) => (trim_ns(&declared.name), declared.type_name.as_str()),
                None => (trim_ns(element), element.as_str()),
            },
            (None, type_name) => (part.name.as_str(), type_name.as_deref().unwrap_or_default()),
        };

        PartShape {
            ident: format_ident!("{}", snake_name(name)),
            tag: name.to_owned(),
            ty: self.map_type(type_ref),
            type_ref: type_ref.to_owned(),
        }
    }

    /// Part shapes of a message with parameter names made unique.
    pub fn part_shapes(&self, message: &Message) -> Vec<PartShape> {
        let mut seen = BTreeSet::new();

        message
            .parts
            .iter()
            .map(|part| {
                let mut shape = self.part_shape(part);

                let base = shape.ident.to_string();
                let mut index = 1usize;
                while !seen.insert(shape.ident.to_string()) {
                    index += 1;
                    shape.ident = format_ident!("{}_{}", base, index);
                }

                shape
            })
            .collect()
    }
}
