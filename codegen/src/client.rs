use log::{debug, trace};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use std::collections::BTreeSet;
use wsdl2rs_wsdl::types::{ns_prefix, BindingOperation, Operation};

use super::{
    codegen::{doc_attributes, struct_fields, wrapper_ident},
    error::Error,
    naming::{snake_name, type_name},
    registry::{CatalogedOperation, Style},
    types::{Cardinality, Context, PartShape, RustType},
};

/// Client code, split the way the assembler orders it.
#[derive(Default)]
pub struct ClientSections {
    /// The service trait and its constructor.
    pub interface: Vec<TokenStream>,
    /// The struct implementing the trait.
    pub client_type: Vec<TokenStream>,
    /// Stubs for operations the binding does not cover.
    pub client_funcs: Vec<TokenStream>,
}

/// One side of an operation: its wrapper, if the message has parts.
struct Side {
    wrapper: Option<Ident>,
    parts: Vec<PartShape>,
}

struct Signature {
    ident: Ident,
    docs: TokenStream,
    inputs: Side,
    outputs: Side,
}

impl Signature {
    fn params(&self, mutable_first: bool) -> Vec<TokenStream> {
        self.inputs
            .parts
            .iter()
            .enumerate()
            .map(|(index, part)| {
                let (ident, ty) = (&part.ident, part.ty.inner());
                if mutable_first && index == 0 {
                    quote!(mut #ident: #ty)
                } else {
                    quote!(#ident: #ty)
                }
            })
            .collect()
    }

    fn returns(&self) -> TokenStream {
        let outputs = self
            .outputs
            .parts
            .iter()
            .map(|part| match &part.ty {
                RustType::Complex(ident) => quote!(Option<#ident>),
                ty => ty.tokens(),
            })
            .collect::<Vec<_>>();

        match outputs.as_slice() {
            [] => quote!(Result<(), runtime::Error>),
            [single] => quote!(Result<#single, runtime::Error>),
            _ => quote!(Result<(#(#outputs),*), runtime::Error>),
        }
    }

    fn declaration(&self, mutable_first: bool) -> TokenStream {
        let (ident, params, returns) = (&self.ident, self.params(mutable_first), self.returns());
        quote!(fn #ident(&self, #(#params),*) -> #returns)
    }
}

fn side(context: &Context, operation: &str, reference: Option<&String>) -> Result<Side, Error> {
    let Some(reference) = reference else {
        return Ok(Side {
            wrapper: None,
            parts: Vec::new(),
        });
    };

    let message = context
        .registry
        .message(reference)
        .ok_or_else(|| Error::UndefinedMessage {
            operation: operation.to_owned(),
            message: reference.clone(),
        })?;

    Ok(Side {
        wrapper: (!message.parts.is_empty()).then(|| wrapper_ident(&message.name)),
        parts: context.part_shapes(message),
    })
}

fn signature(context: &Context, operation: &Operation, ident: Ident) -> Result<Signature, Error> {
    Ok(Signature {
        ident,
        docs: doc_attributes(&operation.name, operation.documentation.as_deref()),
        inputs: side(context, &operation.name, operation.input.as_ref())?,
        outputs: side(context, &operation.name, operation.output.as_ref())?,
    })
}

/// Tag of the operation element in a request: `prefix:Name` when the
/// namespace override or the input message reference carries a prefix.
fn operation_tag(context: &Context, operation: &Operation) -> String {
    let prefix = context
        .options
        .namespace
        .as_deref()
        .or_else(|| operation.input.as_deref().and_then(ns_prefix));

    match prefix {
        Some(prefix) => format!("{}:{}", prefix, operation.name),
        None => operation.name.clone(),
    }
}

/// Local items the request needs and the expression building it. Rpc
/// requests nest the parts under the operation element, document requests
/// put them straight into the body.
fn request(context: &Context, operation: &Operation, signature: &Signature, style: Style) -> (TokenStream, TokenStream) {
    let tag = operation_tag(context, operation);

    match (&signature.inputs.wrapper, style) {
        (Some(wrapper), style) => {
            let values = signature.inputs.parts.iter().map(|part| {
                let ident = &part.ident;
                if part.ty.is_boxed() {
                    quote!(#ident: Some(Box::new(#ident)))
                } else {
                    quote!(#ident: Some(#ident))
                }
            });
            let value = quote!(#wrapper { #(#values),* });

            match style {
                Style::Document => (quote!(), value),
                Style::Rpc => (
                    quote! {
                        #[derive(Serialize)]
                        struct Request {
                            #[serde(rename = #tag)]
                            operation: #wrapper,
                        }
                    },
                    quote!(Request { operation: #value }),
                ),
            }
        }

        (None, Style::Rpc) => (
            quote! {
                #[derive(Serialize)]
                struct Request {
                    #[serde(rename = #tag)]
                    operation: (),
                }
            },
            quote!(Request { operation: () }),
        ),

        (None, Style::Document) => (
            quote! {
                #[derive(Serialize)]
                struct Request {}
            },
            quote!(Request {}),
        ),
    }
}

/// Turns the optional values held by `source` into the return value.
fn unwrap_outputs(signature: &Signature, source: TokenStream) -> TokenStream {
    let values = signature
        .outputs
        .parts
        .iter()
        .map(|part| {
            let ident = &part.ident;
            if part.ty.is_boxed() {
                quote!(#source.#ident.map(|value| *value))
            } else {
                quote!(#source.#ident.unwrap_or_default())
            }
        })
        .collect::<Vec<_>>();

    match values.as_slice() {
        [] => quote!(Ok(())),
        [single] => quote!(Ok(#single)),
        _ => quote!(Ok((#(#values),*))),
    }
}

/// Statements filling `version`, `type_namespace` and `party` on the
/// first input when its type declares them as strings.
fn injections(context: &Context, signature: &Signature) -> Vec<TokenStream> {
    let Some(first) = signature.inputs.parts.first().filter(|part| part.ty.is_boxed()) else {
        return Vec::new();
    };
    let Some(entry) = context.registry.complex(&first.type_ref) else {
        return Vec::new();
    };
    let Some((fields, typed)) = struct_fields(context, entry) else {
        return Vec::new();
    };

    let target = &first.ident;
    let string_field = |name: &str| {
        fields
            .iter()
            .find(|field| field.ident == name && field.ty.is_string() && !field.nested)
            .map(|field| field.cardinality)
    };

    let mut statements = Vec::new();

    if context.options.request_version.is_some() {
        match string_field("version") {
            Some(Cardinality::Optional) => {
                statements.push(quote!(#target.version = Some(REQUEST_VERSION.to_owned());))
            }
            Some(Cardinality::Required) => {
                statements.push(quote!(#target.version = REQUEST_VERSION.to_owned();))
            }
            _ => (),
        }
    }

    if typed {
        statements.push(quote!(#target.type_namespace = NAMESPACE.to_owned();));
    }

    match string_field("party") {
        Some(Cardinality::Optional) => statements.push(quote!(#target.party = self.cli.party();)),
        Some(Cardinality::Required) => {
            statements.push(quote!(#target.party = self.cli.party().unwrap_or_default();))
        }
        _ => (),
    }

    statements
}

/// Local items the reply needs, its type and the statements turning it
/// into the return value. Rpc replies nest the parts under
/// `<operation>Response`, document replies carry them in the body.
fn output_response(signature: &Signature, tag: &str, style: Style) -> (TokenStream, TokenStream, TokenStream) {
    match (&signature.outputs.wrapper, style) {
        (Some(wrapper), Style::Document) => (
            quote!(),
            quote!(#wrapper),
            unwrap_outputs(signature, quote!(response)),
        ),

        (Some(wrapper), Style::Rpc) => {
            let unwrap = unwrap_outputs(signature, quote!(output));

            (
                quote! {
                    #[derive(Deserialize)]
                    struct Response {
                        #[serde(rename = #tag, default)]
                        operation: Option<#wrapper>,
                    }
                },
                quote!(Response),
                quote! {
                    let output = response.operation.unwrap_or_default();
                    #unwrap
                },
            )
        }

        (None, _) => (
            quote! {
                #[derive(Deserialize)]
                struct Response {}
            },
            quote!(Response),
            quote! {
                let _ = response;
                Ok(())
            },
        ),
    }
}

fn bound_body(
    context: &Context,
    cataloged: &CatalogedOperation,
    binding: &BindingOperation,
    signature: &Signature,
) -> (bool, TokenStream) {
    let operation = &cataloged.operation;
    let style = context.registry.style(binding);
    let (request, value) = request(context, operation, signature, style);
    let response_tag = format!("{}Response", operation.name);

    let action = |action: &Option<String>| action.clone().filter(|action| !action.is_empty());

    if let Some(action) = action(&binding.soap12_action) {
        trace!("{} goes over SOAP 1.2", operation.name);
        let (response, reply, unwrap) = output_response(signature, &response_tag, style);

        return (
            false,
            quote! {
                #request
                #response

                let request = #value;
                let response: #reply = self.cli.round_trip_soap12(#action, &request)?;
                #unwrap
            },
        );
    }

    if let Some(action) = action(&binding.soap11_action) {
        trace!("{} goes over SOAP 1.1", operation.name);
        let injections = injections(context, signature);

        let (body_fields, unwrap) = match style {
            Style::Rpc => {
                let field = signature.outputs.wrapper.as_ref().map(|wrapper| {
                    quote! {
                        #[serde(rename = #response_tag, default)]
                        operation: Option<#wrapper>,
                    }
                });
                let unwrap = match &signature.outputs.wrapper {
                    Some(_) => {
                        let unwrap = unwrap_outputs(signature, quote!(output));
                        quote! {
                            let output = response.body.operation.unwrap_or_default();
                            #unwrap
                        }
                    }
                    None => quote! {
                        let _ = response;
                        Ok(())
                    },
                };
                (quote!(#field), unwrap)
            }

            Style::Document => {
                let fields = signature.outputs.parts.iter().map(|part| {
                    let (ident, tag, ty) = (&part.ident, &part.tag, part.ty.tokens());
                    quote! {
                        #[serde(rename = #tag, default)]
                        #ident: Option<#ty>,
                    }
                });
                let unwrap = unwrap_outputs(signature, quote!(body));
                (
                    quote!(#(#fields)*),
                    quote! {
                        let body = response.body;
                        #unwrap
                    },
                )
            }
        };

        return (
            !injections.is_empty(),
            quote! {
                #request

                #[derive(Deserialize)]
                struct ResponseBody {
                    #body_fields
                }

                #[derive(Deserialize)]
                struct ResponseEnvelope {
                    #[serde(rename = "Body")]
                    body: ResponseBody,
                }

                #(#injections)*

                let request = #value;
                let response: ResponseEnvelope = self.cli.call(#action, &request)?;
                #unwrap
            },
        );
    }

    let name = &operation.name;
    let (response, reply, unwrap) = output_response(signature, &response_tag, style);

    (
        false,
        quote! {
            #request
            #response

            let request = #value;
            let response: #reply = self.cli.round_trip(#name, &request)?;
            #unwrap
        },
    )
}

/// Service trait name, from the options or the port type.
pub fn client_type_name(context: &Context) -> String {
    let name = context
        .options
        .client_type
        .as_deref()
        .or(context.registry.port_type.as_deref())
        .unwrap_or("Service");

    type_name(name)
}

/// Free function name for an unbound operation, suffixed with `Func`
/// while it collides with a type name.
fn unbound_ident(context: &Context, operation: &str) -> Ident {
    let taken = context
        .registry
        .simple_types
        .keys()
        .chain(context.registry.complex_types.keys())
        .map(|name| type_name(name))
        .collect::<BTreeSet<_>>();

    let mut symbol = type_name(operation);
    while taken.contains(&symbol) {
        symbol.push_str("Func");
    }

    format_ident!("{}", snake_name(&symbol))
}

pub fn client_sections(context: &Context) -> Result<ClientSections, Error> {
    let registry = context.registry;

    if let (Some(binding), None) = (&registry.binding, &registry.port_type) {
        return Err(Error::BindingMismatch {
            binding: binding.name.clone(),
            port_type: binding.port_type.clone(),
        });
    }

    let mut sections = ClientSections::default();
    let mut declarations = Vec::new();
    let mut implementations = Vec::new();

    for cataloged in registry.operations.values() {
        let operation = &cataloged.operation;

        match cataloged.binding_operation() {
            Some(binding) => {
                let signature =
                    signature(context, operation, format_ident!("{}", snake_name(&operation.name)))?;
                let (mutable_first, body) = bound_body(context, cataloged, binding, &signature);

                let docs = &signature.docs;
                let declaration = signature.declaration(false);
                declarations.push(quote! {
                    #docs
                    #declaration;
                });

                let implementation = signature.declaration(mutable_first);
                implementations.push(quote! {
                    #implementation {
                        #body
                    }
                });
            }

            None => {
                debug!("Operation {} is not bound, emitting a stub", operation.name);
                let signature = signature(context, operation, unbound_ident(context, &operation.name))?;
                let (docs, ident, name) = (&signature.docs, &signature.ident, &operation.name);
                let (params, returns) = (signature.params(false), signature.returns());

                sections.client_funcs.push(quote! {
                    #docs
                    pub fn #ident(#(#params),*) -> #returns {
                        Err(runtime::Error::NotImplemented(#name))
                    }
                });
            }
        }
    }

    if declarations.is_empty() {
        return Ok(sections);
    }

    let symbol = client_type_name(context);
    let trait_ident = format_ident!("{}", symbol);
    let client_ident = format_ident!("{}Client", symbol);
    let constructor = format_ident!("new_{}", snake_name(&symbol));

    let trait_docs = doc_attributes(&symbol, None);
    let constructor_docs = doc_attributes(
        &constructor.to_string(),
        Some(&format!("Creates an initialized {}.", symbol)),
    );
    let client_docs = doc_attributes(
        &client_ident.to_string(),
        Some(&format!("{} implements {} on top of a SOAP client.", client_ident, symbol)),
    );

    sections.interface.push(quote! {
        #trait_docs
        pub trait #trait_ident {
            #(#declarations)*
        }

        #constructor_docs
        pub fn #constructor(cli: runtime::Client) -> impl #trait_ident {
            #client_ident::new(cli)
        }
    });

    sections.client_type.push(quote! {
        #client_docs
        pub struct #client_ident {
            cli: runtime::Client,
        }

        impl #client_ident {
            pub fn new(cli: runtime::Client) -> Self {
                Self { cli }
            }
        }

        impl #trait_ident for #client_ident {
            #(#implementations)*
        }
    });

    Ok(sections)
}
