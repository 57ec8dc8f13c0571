use log::trace;
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use std::collections::HashMap;

use super::{
    error::Error,
    types::{
        Any, Attribute, Binding, BindingOperation, Choice, ComplexContent, ComplexRestriction,
        ComplexType, Content, Definitions, Element, Extension, Import, MaxOccurs, Message,
        Operation, Part, PortType, Restriction, Schema, Sequence, SimpleContent, SimpleDerivation,
        SimpleType, Union,
    },
};

const SOAP12_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, local_name)) => (Some(prefix), local_name),
        None => (None, prefixed_name),
    }
}

fn get_attributes<const N: usize>(
    start: &BytesStart<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = std::str::from_utf8(attribute.key.as_ref())?;
        let (prefix, local_name) = split_namespaced_name(key);

        if key == "xmlns" || prefix == Some("xmlns") {
            continue;
        }

        for (index, name) in names.iter().enumerate() {
            if local_name == *name {
                result[index] = Some(attribute.unescape_value()?.into_owned());
                break;
            }
        }
    }

    Ok(result)
}

fn namespace_declarations(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, Error> {
    let mut declarations = Vec::new();

    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = std::str::from_utf8(attribute.key.as_ref())?;

        let prefix = match split_namespaced_name(key) {
            (None, "xmlns") => "",
            (Some("xmlns"), prefix) => prefix,
            _ => continue,
        };

        declarations.push((prefix.to_owned(), attribute.unescape_value()?.into_owned()));
    }

    Ok(declarations)
}

fn required(
    value: Option<String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, Error> {
    value.ok_or(Error::MissingAttribute { element, attribute })
}

fn occurs(min: Option<String>, max: Option<String>) -> (u32, MaxOccurs) {
    let min = min.and_then(|min| min.trim().parse().ok()).unwrap_or(1);
    let max = max.as_deref().map(MaxOccurs::parse).unwrap_or_default();
    (min, max)
}

fn is_true(value: Option<String>) -> bool {
    matches!(value.as_deref().map(str::trim), Some("true" | "1"))
}

fn simple_base(ty: &SimpleType) -> String {
    match &ty.derivation {
        Some(SimpleDerivation::Restriction(restriction)) => restriction.base.clone(),
        _ => "string".to_owned(),
    }
}

fn non_empty(text: String) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

#[derive(Default)]
struct Parser {
    definitions: Definitions,
    prefixes: HashMap<String, String>,
}

#[derive(Debug)]
enum ParseState {
    Definitions,
    Types,
    Schema(Schema),

    Element(Element),
    ComplexType(ComplexType),
    Sequence(Sequence),
    Choice(Choice),
    All(Vec<Element>),
    Any(Any),
    ComplexContent(ComplexContent),
    SimpleContent(SimpleContent),
    Extension(Extension),
    ComplexRestriction(ComplexRestriction),
    Attribute(Attribute),
    SimpleType(SimpleType),
    Restriction(Restriction),
    Union(Union),
    Annotation(Option<String>),
    Documentation(String),

    Message(Message),
    PortType(PortType),
    Operation(Operation),
    Binding(Binding),
    BindingOperation(BindingOperation),

    /// An element whose content was consumed from its attributes.
    Leaf(String),
    Other(String),
}

impl Parser {
    fn parse(mut self, text: &str) -> Result<Definitions, Error> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);

        let mut stack = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => self.handle_start(&mut stack, &start)?,
                Event::End(..) => self.handle_end(&mut stack)?,

                Event::Empty(start) => {
                    self.handle_start(&mut stack, &start)?;
                    self.handle_end(&mut stack)?;
                }

                Event::Text(text) => handle_text(&mut stack, &text.unescape()?),
                Event::CData(data) => handle_text(&mut stack, std::str::from_utf8(&data)?),

                Event::Eof => break,
                _ => (),
            }
        }

        Ok(self.definitions)
    }

    fn start_schema(
        &mut self,
        start: &BytesStart<'_>,
        declarations: Vec<(String, String)>,
    ) -> Result<ParseState, Error> {
        let [namespace] = get_attributes(start, ["targetNamespace"])?;

        Ok(ParseState::Schema(Schema {
            target_namespace: namespace.unwrap_or_default(),
            namespaces: declarations.into_iter().collect(),
            ..Default::default()
        }))
    }

    fn handle_start(
        &mut self,
        stack: &mut Vec<ParseState>,
        start: &BytesStart<'_>,
    ) -> Result<(), Error> {
        let qname = start.name();
        let (prefix, local_name) = split_namespaced_name(std::str::from_utf8(qname.as_ref())?);

        let declarations = namespace_declarations(start)?;
        self.prefixes.extend(declarations.iter().cloned());

        let new_state = match stack.last_mut() {
            None => match local_name {
                "definitions" => {
                    let [namespace, name] =
                        get_attributes(start, ["targetNamespace", "name"])?;

                    self.definitions.target_namespace = namespace.unwrap_or_default();
                    self.definitions.name = name;
                    self.definitions.namespaces.extend(declarations);

                    ParseState::Definitions
                }

                "schema" => self.start_schema(start, declarations)?,

                other => return Err(Error::UnexpectedRoot(other.to_owned())),
            },

            Some(ParseState::Definitions) => match local_name {
                "import" => {
                    let [location, namespace] =
                        get_attributes(start, ["location", "namespace"])?;

                    if let Some(location) = location.filter(|location| !location.is_empty()) {
                        self.definitions.imports.push(Import {
                            namespace,
                            location,
                        });
                    }

                    ParseState::Leaf(local_name.to_owned())
                }

                "types" => ParseState::Types,

                "message" => {
                    let [name] = get_attributes(start, ["name"])?;

                    ParseState::Message(Message {
                        name: required(name, "message", "name")?,
                        parts: Vec::new(),
                    })
                }

                "portType" => {
                    let [name] = get_attributes(start, ["name"])?;

                    ParseState::PortType(PortType {
                        name: required(name, "portType", "name")?,
                        operations: Vec::new(),
                    })
                }

                "binding" => {
                    let [name, ty] = get_attributes(start, ["name", "type"])?;

                    ParseState::Binding(Binding {
                        name: required(name, "binding", "name")?,
                        port_type: required(ty, "binding", "type")?,
                        ..Default::default()
                    })
                }

                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Types) => match local_name {
                "schema" => self.start_schema(start, declarations)?,
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Schema(schema)) => match local_name {
                "import" | "include" => {
                    let [location, namespace] =
                        get_attributes(start, ["schemaLocation", "namespace"])?;

                    if let Some(location) = location.filter(|location| !location.is_empty()) {
                        let import = Import {
                            namespace,
                            location,
                        };

                        if local_name == "import" {
                            schema.imports.push(import);
                        } else {
                            schema.includes.push(import);
                        }
                    }

                    ParseState::Leaf(local_name.to_owned())
                }

                "element" => ParseState::Element(start_element(start)?),
                "complexType" => ParseState::ComplexType(start_complex_type(start)?),
                "simpleType" => ParseState::SimpleType(start_simple_type(start)?),

                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Element(_)) => match local_name {
                "complexType" => ParseState::ComplexType(start_complex_type(start)?),
                "simpleType" => ParseState::SimpleType(start_simple_type(start)?),
                "annotation" => ParseState::Annotation(None),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Attribute(_)) => match local_name {
                "simpleType" => ParseState::SimpleType(start_simple_type(start)?),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::ComplexType(_)) => match local_name {
                "sequence" => ParseState::Sequence(Sequence::default()),
                "choice" => ParseState::Choice(Choice::default()),
                "all" => ParseState::All(Vec::new()),
                "complexContent" => ParseState::ComplexContent(ComplexContent::default()),
                "simpleContent" => ParseState::SimpleContent(SimpleContent::default()),
                "attribute" => ParseState::Attribute(start_attribute(start)?),
                "annotation" => ParseState::Annotation(None),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Sequence(_) | ParseState::Choice(_)) => match local_name {
                "element" => ParseState::Element(start_element(start)?),
                "sequence" => ParseState::Sequence(Sequence::default()),
                "choice" => ParseState::Choice(Choice::default()),
                "complexType" => ParseState::ComplexType(start_complex_type(start)?),
                "any" => {
                    let [min, max] = get_attributes(start, ["minOccurs", "maxOccurs"])?;
                    let (min_occurs, max_occurs) = occurs(min, max);

                    ParseState::Any(Any {
                        min_occurs,
                        max_occurs,
                    })
                }
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::All(_)) => match local_name {
                "element" => ParseState::Element(start_element(start)?),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::ComplexContent(_)) => match local_name {
                "extension" => ParseState::Extension(start_extension(start)?),
                "restriction" => {
                    let [base] = get_attributes(start, ["base"])?;

                    ParseState::ComplexRestriction(ComplexRestriction {
                        base: base.unwrap_or_default(),
                        attributes: Vec::new(),
                    })
                }
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::SimpleContent(_)) => match local_name {
                "extension" | "restriction" => ParseState::Extension(start_extension(start)?),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Extension(_)) => match local_name {
                "sequence" => ParseState::Sequence(Sequence::default()),
                "choice" => ParseState::Choice(Choice::default()),
                "all" => ParseState::All(Vec::new()),
                "attribute" => ParseState::Attribute(start_attribute(start)?),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::ComplexRestriction(_)) => match local_name {
                "attribute" => ParseState::Attribute(start_attribute(start)?),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::SimpleType(_)) => match local_name {
                "restriction" => {
                    let [base] = get_attributes(start, ["base"])?;

                    ParseState::Restriction(Restriction {
                        base: base.unwrap_or_else(|| "string".to_owned()),
                        enumerations: Vec::new(),
                    })
                }

                "union" => {
                    let [members] = get_attributes(start, ["memberTypes"])?;

                    ParseState::Union(Union {
                        member_types: members
                            .unwrap_or_default()
                            .split_whitespace()
                            .map(ToOwned::to_owned)
                            .collect(),
                        simple_types: Vec::new(),
                    })
                }

                "annotation" => ParseState::Annotation(None),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Restriction(restriction)) => match local_name {
                "enumeration" => {
                    let [value] = get_attributes(start, ["value"])?;
                    restriction
                        .enumerations
                        .push(required(value, "enumeration", "value")?);

                    ParseState::Leaf(local_name.to_owned())
                }

                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Union(_)) => match local_name {
                "simpleType" => ParseState::SimpleType(start_simple_type(start)?),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Annotation(_)) => match local_name {
                "documentation" => ParseState::Documentation(String::new()),
                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Message(message)) => match local_name {
                "part" => {
                    let [name, ty, element] = get_attributes(start, ["name", "type", "element"])?;

                    message.parts.push(Part {
                        name: required(name, "part", "name")?,
                        type_name: ty,
                        element,
                    });

                    ParseState::Leaf(local_name.to_owned())
                }

                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::PortType(_)) => match local_name {
                "operation" => {
                    let [name] = get_attributes(start, ["name"])?;

                    ParseState::Operation(Operation {
                        name: required(name, "operation", "name")?,
                        ..Default::default()
                    })
                }

                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Operation(operation)) => match local_name {
                "documentation" => ParseState::Documentation(String::new()),

                "input" | "output" => {
                    let [message] = get_attributes(start, ["message"])?;
                    let message = required(message, "input", "message")?;

                    if local_name == "input" {
                        operation.input = Some(message);
                    } else {
                        operation.output = Some(message);
                    }

                    ParseState::Leaf(local_name.to_owned())
                }

                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Binding(binding)) => match local_name {
                "binding" => {
                    let [style, transport] = get_attributes(start, ["style", "transport"])?;
                    binding.style = style;
                    binding.transport = transport;

                    ParseState::Leaf(local_name.to_owned())
                }

                "operation" => {
                    let [name] = get_attributes(start, ["name"])?;

                    ParseState::BindingOperation(BindingOperation {
                        name: required(name, "operation", "name")?,
                        ..Default::default()
                    })
                }

                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::BindingOperation(operation)) => match local_name {
                "operation" => {
                    let [action, style] = get_attributes(start, ["soapAction", "style"])?;

                    let namespace = prefix.and_then(|prefix| self.prefixes.get(prefix));
                    if namespace.map(String::as_str) == Some(SOAP12_NAMESPACE) {
                        operation.soap12_action = action;
                    } else {
                        operation.soap11_action = action;
                    }

                    if style.is_some() {
                        operation.style = style;
                    }

                    ParseState::Leaf(local_name.to_owned())
                }

                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(
                ParseState::Any(_)
                | ParseState::Documentation(_)
                | ParseState::Leaf(_)
                | ParseState::Other(_),
            ) => ParseState::Other(local_name.to_owned()),
        };

        stack.push(new_state);
        Ok(())
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<(), Error> {
        let finished_state = stack
            .pop()
            .ok_or_else(|| Error::UnexpectedEnd("document".to_owned()))?;

        match (finished_state, stack.last_mut()) {
            (ParseState::Schema(schema), _) => self.definitions.schemas.push(schema),

            (ParseState::Element(element), Some(ParseState::Schema(schema))) => {
                schema.elements.push(element)
            }
            (ParseState::Element(element), Some(ParseState::Sequence(sequence))) => {
                sequence.elements.push(element)
            }
            (ParseState::Element(element), Some(ParseState::Choice(choice))) => {
                choice.elements.push(element)
            }
            (ParseState::Element(element), Some(ParseState::All(elements))) => {
                elements.push(element)
            }

            (ParseState::ComplexType(ty), Some(ParseState::Schema(schema))) => {
                schema.complex_types.push(ty)
            }
            (ParseState::ComplexType(ty), Some(ParseState::Element(element))) => {
                element.complex_type = Some(Box::new(ty))
            }
            (ParseState::ComplexType(ty), Some(ParseState::Sequence(sequence))) => {
                sequence.complex_types.push(ty)
            }
            (ParseState::ComplexType(ty), Some(ParseState::Choice(choice))) => {
                choice.complex_types.push(ty)
            }

            (ParseState::SimpleType(ty), Some(ParseState::Schema(schema))) => {
                schema.simple_types.push(ty)
            }
            (ParseState::SimpleType(ty), Some(ParseState::Union(union))) => {
                union.simple_types.push(ty)
            }
            (ParseState::SimpleType(ty), Some(ParseState::Element(element))) => {
                if element.type_name.is_empty() {
                    element.type_name = simple_base(&ty);
                }
            }
            (ParseState::SimpleType(ty), Some(ParseState::Attribute(attribute))) => {
                if attribute.type_name.is_empty() {
                    attribute.type_name = simple_base(&ty);
                }
            }

            (ParseState::Sequence(sequence), Some(ParseState::ComplexType(ty))) => {
                ty.content = Some(Content::Sequence(sequence))
            }
            (ParseState::Sequence(sequence), Some(ParseState::Extension(extension))) => {
                extension.sequence = Some(sequence)
            }
            (ParseState::Sequence(sequence), Some(ParseState::Choice(choice))) => {
                choice.sequence = Some(Box::new(sequence))
            }
            (ParseState::Sequence(inner), Some(ParseState::Sequence(outer))) => {
                outer.elements.extend(inner.elements);
                outer.complex_types.extend(inner.complex_types);
                outer.choices.extend(inner.choices);
                outer.any.extend(inner.any);
            }

            (ParseState::Choice(choice), Some(ParseState::ComplexType(ty))) => {
                ty.content = Some(Content::Choice(choice))
            }
            (ParseState::Choice(choice), Some(ParseState::Sequence(sequence))) => {
                sequence.choices.push(choice)
            }
            (ParseState::Choice(choice), Some(ParseState::Extension(extension))) => {
                extension.choice = Some(choice)
            }
            (ParseState::Choice(inner), Some(ParseState::Choice(outer))) => {
                outer.elements.extend(inner.elements);
                outer.complex_types.extend(inner.complex_types);
                outer.any.extend(inner.any);
            }

            (ParseState::All(elements), Some(ParseState::ComplexType(ty))) => {
                ty.all_elements.extend(elements)
            }
            (ParseState::All(elements), Some(ParseState::Extension(extension))) => extension
                .sequence
                .get_or_insert_with(Sequence::default)
                .elements
                .extend(elements),

            (ParseState::Any(any), Some(ParseState::Sequence(sequence))) => sequence.any.push(any),
            (ParseState::Any(any), Some(ParseState::Choice(choice))) => choice.any.push(any),

            (ParseState::Attribute(attribute), Some(ParseState::ComplexType(ty))) => {
                ty.attributes.push(attribute)
            }
            (ParseState::Attribute(attribute), Some(ParseState::Extension(extension))) => {
                extension.attributes.push(attribute)
            }
            (ParseState::Attribute(attribute), Some(ParseState::ComplexRestriction(restriction))) => {
                restriction.attributes.push(attribute)
            }

            (ParseState::ComplexContent(content), Some(ParseState::ComplexType(ty))) => {
                ty.content = Some(Content::ComplexContent(content))
            }
            (ParseState::SimpleContent(content), Some(ParseState::ComplexType(ty))) => {
                ty.content = Some(Content::SimpleContent(content))
            }
            (ParseState::Extension(extension), Some(ParseState::ComplexContent(content))) => {
                content.extension = Some(extension)
            }
            (ParseState::Extension(extension), Some(ParseState::SimpleContent(content))) => {
                content.extension = Some(extension)
            }
            (
                ParseState::ComplexRestriction(restriction),
                Some(ParseState::ComplexContent(content)),
            ) => content.restriction = Some(restriction),

            (ParseState::Restriction(restriction), Some(ParseState::SimpleType(ty))) => {
                ty.derivation = Some(SimpleDerivation::Restriction(restriction))
            }
            (ParseState::Union(union), Some(ParseState::SimpleType(ty))) => {
                ty.derivation = Some(SimpleDerivation::Union(union))
            }

            (ParseState::Documentation(text), Some(ParseState::Annotation(documentation))) => {
                *documentation = non_empty(text)
            }
            (ParseState::Documentation(text), Some(ParseState::Operation(operation))) => {
                operation.documentation = non_empty(text)
            }
            (ParseState::Annotation(documentation), Some(ParseState::ComplexType(ty))) => {
                ty.documentation = documentation
            }
            (ParseState::Annotation(documentation), Some(ParseState::SimpleType(ty))) => {
                ty.documentation = documentation
            }

            (ParseState::Message(message), Some(ParseState::Definitions)) => {
                self.definitions.messages.push(message)
            }
            (ParseState::PortType(port_type), Some(ParseState::Definitions)) => {
                self.definitions.port_types.push(port_type)
            }
            (ParseState::Operation(operation), Some(ParseState::PortType(port_type))) => {
                port_type.operations.push(operation)
            }
            (ParseState::Binding(binding), Some(ParseState::Definitions)) => {
                self.definitions.bindings.push(binding)
            }
            (ParseState::BindingOperation(operation), Some(ParseState::Binding(binding))) => {
                binding.operations.push(operation)
            }

            (finished_state, _) => trace!("finished {:?}", finished_state),
        }

        Ok(())
    }
}

fn handle_text(stack: &mut [ParseState], text: &str) {
    if let Some(ParseState::Documentation(documentation)) = stack.last_mut() {
        if !documentation.is_empty() {
            documentation.push(' ');
        }
        documentation.push_str(text);
    }
}

fn start_element(start: &BytesStart<'_>) -> Result<Element, Error> {
    let [name, ty, reference, min, max, nillable] = get_attributes(
        start,
        ["name", "type", "ref", "minOccurs", "maxOccurs", "nillable"],
    )?;
    let (min_occurs, max_occurs) = occurs(min, max);

    Ok(Element {
        name: name.unwrap_or_default(),
        type_name: ty.unwrap_or_default(),
        ref_name: reference.unwrap_or_default(),
        min_occurs,
        max_occurs,
        nillable: is_true(nillable),
        complex_type: None,
        tag: None,
    })
}

fn start_complex_type(start: &BytesStart<'_>) -> Result<ComplexType, Error> {
    let [name, is_abstract] = get_attributes(start, ["name", "abstract"])?;

    Ok(ComplexType {
        name: name.unwrap_or_default(),
        is_abstract: is_true(is_abstract),
        ..Default::default()
    })
}

fn start_simple_type(start: &BytesStart<'_>) -> Result<SimpleType, Error> {
    let [name] = get_attributes(start, ["name"])?;

    Ok(SimpleType {
        name: name.unwrap_or_default(),
        ..Default::default()
    })
}

fn start_attribute(start: &BytesStart<'_>) -> Result<Attribute, Error> {
    let [name, ty, reference, usage, array_type] =
        get_attributes(start, ["name", "type", "ref", "use", "arrayType"])?;

    Ok(Attribute {
        name: name.unwrap_or_default(),
        ref_name: reference.unwrap_or_default(),
        type_name: ty.unwrap_or_default(),
        tag_name: None,
        required: usage.as_deref() == Some("required"),
        array_type,
    })
}

fn start_extension(start: &BytesStart<'_>) -> Result<Extension, Error> {
    let [base] = get_attributes(start, ["base"])?;

    Ok(Extension {
        base: base.unwrap_or_default(),
        ..Default::default()
    })
}

/// Parses a WSDL document, or a bare XML Schema document, into its object
/// model. Type references are kept as written, prefixes included.
pub fn parse_str(text: &str) -> Result<Definitions, Error> {
    Parser::default().parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALCULATOR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
    xmlns:tns="http://tempuri.org/"
    xmlns:s="http://www.w3.org/2001/XMLSchema"
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    targetNamespace="http://tempuri.org/">
  <wsdl:types>
    <s:schema elementFormDefault="qualified" targetNamespace="http://tempuri.org/">
      <s:import namespace="urn:common" schemaLocation="common.xsd"/>
      <s:element name="Add">
        <s:complexType>
          <s:sequence>
            <s:element minOccurs="1" maxOccurs="1" name="intA" type="s:int" />
            <s:element minOccurs="0" maxOccurs="unbounded" name="notes" type="s:string" />
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:simpleType name="Color">
        <s:annotation><s:documentation>A primary color.</s:documentation></s:annotation>
        <s:restriction base="s:string">
          <s:enumeration value="red"/>
          <s:enumeration value="green"/>
        </s:restriction>
      </s:simpleType>
      <s:complexType name="Base" abstract="true">
        <s:attribute name="id" type="s:string" use="required"/>
      </s:complexType>
    </s:schema>
  </wsdl:types>
  <wsdl:message name="AddSoapIn">
    <wsdl:part name="parameters" element="tns:Add" />
  </wsdl:message>
  <wsdl:portType name="CalculatorSoap">
    <wsdl:operation name="Add">
      <wsdl:documentation>Adds two integers.</wsdl:documentation>
      <wsdl:input message="tns:AddSoapIn" />
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="CalculatorSoap" type="tns:CalculatorSoap">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" />
    <wsdl:operation name="Add">
      <soap:operation soapAction="http://tempuri.org/Add" style="document" />
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:binding name="CalculatorSoap12" type="tns:CalculatorSoap">
    <soap12:binding transport="http://schemas.xmlsoap.org/soap/http" style="rpc" />
    <wsdl:operation name="Add">
      <soap12:operation soapAction="http://tempuri.org/Add" />
    </wsdl:operation>
  </wsdl:binding>
</wsdl:definitions>"#;

    #[test]
    fn parses_definitions() {
        let definitions = parse_str(CALCULATOR).unwrap();

        assert_eq!(definitions.target_namespace, "http://tempuri.org/");
        assert_eq!(definitions.namespaces["tns"], "http://tempuri.org/");
        assert_eq!(definitions.schemas.len(), 1);

        let schema = &definitions.schemas[0];
        assert_eq!(schema.imports[0].location, "common.xsd");
        assert_eq!(schema.elements[0].name, "Add");

        let add = schema.elements[0].complex_type.as_ref().unwrap();
        let Some(Content::Sequence(sequence)) = &add.content else {
            panic!("expected a sequence, got {:?}", add.content);
        };
        assert_eq!(sequence.elements.len(), 2);
        assert_eq!(sequence.elements[0].type_name, "s:int");
        assert_eq!(sequence.elements[1].min_occurs, 0);
        assert_eq!(sequence.elements[1].max_occurs, MaxOccurs::Unbounded);
    }

    #[test]
    fn parses_simple_and_abstract_types() {
        let definitions = parse_str(CALCULATOR).unwrap();
        let schema = &definitions.schemas[0];

        let color = &schema.simple_types[0];
        assert_eq!(color.documentation.as_deref(), Some("A primary color."));
        let Some(SimpleDerivation::Restriction(restriction)) = &color.derivation else {
            panic!("expected a restriction");
        };
        assert_eq!(restriction.base, "s:string");
        assert_eq!(restriction.enumerations, vec!["red", "green"]);

        let base = &schema.complex_types[0];
        assert!(base.is_abstract);
        assert!(base.attributes[0].required);
    }

    #[test]
    fn parses_messages_and_port_types() {
        let definitions = parse_str(CALCULATOR).unwrap();

        let part = &definitions.messages[0].parts[0];
        assert_eq!(part.element.as_deref(), Some("tns:Add"));
        assert_eq!(part.type_name, None);

        let operation = &definitions.port_types[0].operations[0];
        assert_eq!(operation.documentation.as_deref(), Some("Adds two integers."));
        assert_eq!(operation.input.as_deref(), Some("tns:AddSoapIn"));
        assert_eq!(operation.output, None);
    }

    #[test]
    fn distinguishes_soap_versions() {
        let definitions = parse_str(CALCULATOR).unwrap();

        let soap11 = &definitions.bindings[0];
        assert_eq!(soap11.port_type, "tns:CalculatorSoap");
        assert_eq!(soap11.style, None);
        let operation = &soap11.operations[0];
        assert_eq!(operation.soap11_action.as_deref(), Some("http://tempuri.org/Add"));
        assert_eq!(operation.soap12_action, None);
        assert_eq!(operation.style.as_deref(), Some("document"));

        let soap12 = &definitions.bindings[1];
        assert_eq!(soap12.style.as_deref(), Some("rpc"));
        let operation = &soap12.operations[0];
        assert_eq!(operation.soap12_action.as_deref(), Some("http://tempuri.org/Add"));
        assert_eq!(operation.soap11_action, None);
    }

    #[test]
    fn parses_bare_schema_with_extension() {
        let definitions = parse_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:x">
                <xs:include schemaLocation="more.xsd"/>
                <xs:complexType name="Derived">
                  <xs:complexContent>
                    <xs:extension base="Base">
                      <xs:sequence><xs:element name="extra" type="xs:int"/></xs:sequence>
                      <xs:attribute name="flag" type="xs:boolean"/>
                    </xs:extension>
                  </xs:complexContent>
                </xs:complexType>
              </xs:schema>"#,
        )
        .unwrap();

        let schema = &definitions.schemas[0];
        assert_eq!(schema.target_namespace, "urn:x");
        assert_eq!(schema.includes[0].location, "more.xsd");

        let Some(Content::ComplexContent(content)) = &schema.complex_types[0].content else {
            panic!("expected complex content");
        };
        let extension = content.extension.as_ref().unwrap();
        assert_eq!(extension.base, "Base");
        assert_eq!(extension.sequence.as_ref().unwrap().elements[0].name, "extra");
        assert_eq!(extension.attributes[0].name, "flag");
    }

    #[test]
    fn inline_simple_type_sets_element_type() {
        let definitions = parse_str(
            r#"<schema targetNamespace="urn:x">
                <element name="code">
                  <simpleType><restriction base="xs:token"/></simpleType>
                </element>
              </schema>"#,
        )
        .unwrap();

        assert_eq!(definitions.schemas[0].elements[0].type_name, "xs:token");
    }

    #[test]
    fn rejects_unknown_root() {
        assert!(matches!(
            parse_str("<html/>"),
            Err(Error::UnexpectedRoot(root)) if root == "html"
        ));
    }

    #[test]
    fn reports_missing_attribute() {
        let result = parse_str(r#"<definitions><message/></definitions>"#);
        assert!(matches!(
            result,
            Err(Error::MissingAttribute {
                element: "message",
                attribute: "name"
            })
        ));
    }
}
