use log::trace;
use std::collections::BTreeSet;
use wsdl2rs_wsdl::types::{
    trim_ns, Attribute, Choice, ComplexType, Content, Element, Extension, Sequence,
};

use super::registry::{Registry, Shape, TypeEntry};

/// Turns every registered complex type into a flat list of fields and
/// attributes, base type fields first. Safe to run more than once.
pub fn flatten(registry: &mut Registry) {
    let names = registry.complex_types.keys().cloned().collect::<Vec<_>>();

    for name in names {
        flatten_type(registry, &name);
    }
}

/// A type missing from the registry is either unknown or being flattened
/// further up the stack, which breaks extension cycles.
fn flatten_type(registry: &mut Registry, name: &str) {
    let Some(mut entry) = registry.complex_types.remove(name) else {
        return;
    };

    if !entry.flattened {
        trace!("Flattening {}", name);
        flatten_entry(registry, &mut entry);
        entry.flattened = true;
    }

    registry.complex_types.insert(name.to_owned(), entry);
}

fn flattened_base(registry: &mut Registry, base: &str) -> Option<ComplexType> {
    let name = trim_ns(base);
    flatten_type(registry, name);
    registry.complex_types.get(name).map(|entry| entry.ty.clone())
}

fn is_wildcard_only(sequence: &Sequence) -> bool {
    sequence.elements.is_empty()
        && !sequence.any.is_empty()
        && sequence.choices.iter().all(|choice| choice.elements.is_empty())
}

fn append_unique<T, F: Fn(&T) -> &str>(target: &mut Vec<T>, source: Vec<T>, seen: &mut BTreeSet<String>, name: F) {
    for item in source {
        if seen.insert(name(&item).to_owned()) {
            target.push(item);
        } else {
            trace!("Dropping redefined field {}", name(&item));
        }
    }
}

fn attribute_name(attribute: &Attribute) -> &str {
    if attribute.name.is_empty() {
        trim_ns(&attribute.ref_name)
    } else {
        &attribute.name
    }
}

fn element_name(element: &Element) -> &str {
    if element.name.is_empty() {
        trim_ns(&element.ref_name)
    } else {
        &element.name
    }
}

/// Only one alternative of a choice is present, so every one is optional.
fn alternatives(mut elements: Vec<Element>) -> Vec<Element> {
    for element in &mut elements {
        element.min_occurs = 0;
    }
    elements
}

/// A choice as a sequence of optional alternatives, its nested sequence
/// included.
fn choice_sequence(choice: &Choice) -> Sequence {
    let mut sequence = choice.as_sequence();

    if let Some(nested) = &choice.sequence {
        sequence.elements.extend(nested.elements.iter().cloned());
        sequence.complex_types.extend(nested.complex_types.iter().cloned());
        sequence.any.extend(nested.any.iter().copied());
    }

    sequence.elements = alternatives(sequence.elements);
    sequence
}

fn append_sequence(target: &mut Sequence, mut source: Sequence) {
    for choice in source.choices.drain(..) {
        let alternatives = choice_sequence(&choice);
        source.elements.extend(alternatives.elements);
        source.complex_types.extend(alternatives.complex_types);
        source.any.extend(alternatives.any);
    }

    target.elements.extend(source.elements);
    target.complex_types.extend(source.complex_types);
    target.any.extend(source.any);
}

/// Folds a complex content extension into the collected parts. The base
/// becomes the first fragment.
fn apply_extension(
    registry: &mut Registry,
    extension: Extension,
    fragments: &mut Vec<ComplexType>,
    attributes: &mut Vec<Attribute>,
    sequence: &mut Sequence,
) {
    if !extension.base.is_empty() {
        if let Some(base) = flattened_base(registry, &extension.base) {
            fragments.push(base);
        }
    }

    append_unique(attributes, extension.attributes, &mut BTreeSet::new(), attribute_name);

    if let Some(extended) = extension.sequence {
        append_sequence(sequence, extended);
    }

    if let Some(choice) = extension.choice {
        append_sequence(sequence, choice_sequence(&choice));
    }
}

fn flatten_fragment(registry: &mut Registry, fragment: ComplexType) -> ComplexType {
    let mut entry = TypeEntry::new(fragment);
    flatten_entry(registry, &mut entry);
    entry.ty
}

fn flatten_entry(registry: &mut Registry, entry: &mut TypeEntry) {
    let ty = &mut entry.ty;
    let mut shape = Shape::default();

    let mut attributes = std::mem::take(&mut ty.attributes);
    let mut elements = std::mem::take(&mut ty.all_elements);
    let mut fragments = Vec::new();
    let mut sequence = Sequence::default();
    let mut choices = Vec::new();

    match ty.content.take() {
        Some(Content::Sequence(own)) => {
            shape.grouped = true;
            shape.wildcard_only = is_wildcard_only(&own);
            sequence = own;
        }

        Some(Content::Choice(choice)) => {
            shape.grouped = true;
            shape.wildcard_only = choice.elements.is_empty()
                && !choice.any.is_empty()
                && choice.sequence.as_ref().map_or(true, |nested| nested.elements.is_empty());

            let choice = choice_sequence(&choice);
            sequence.complex_types.extend(choice.complex_types);
            choices.extend(choice.elements);
        }

        Some(Content::ComplexContent(content)) => {
            if let Some(restriction) = content.restriction {
                shape.array_item = restriction
                    .attributes
                    .iter()
                    .find_map(|attribute| attribute.array_type.as_deref())
                    .map(|array_type| {
                        let item = trim_ns(array_type);
                        item.split('[').next().unwrap_or(item).to_owned()
                    });
            }

            if let Some(extension) = content.extension {
                if !extension.base.is_empty() {
                    shape.extension_base = Some(extension.base.clone());
                }

                apply_extension(registry, extension, &mut fragments, &mut attributes, &mut sequence);
            }
        }

        Some(Content::SimpleContent(content)) => {
            shape.simple_content = true;

            if let Some(extension) = content.extension {
                append_unique(
                    &mut attributes,
                    extension.attributes,
                    &mut BTreeSet::new(),
                    attribute_name,
                );

                if registry.complex(&extension.base).is_some() {
                    if let Some(base) = flattened_base(registry, &extension.base) {
                        fragments.push(base);
                    }
                } else if !extension.base.is_empty() {
                    elements.push(Element {
                        name: "Content".to_owned(),
                        type_name: trim_ns(&extension.base).to_owned(),
                        tag: Some("$text".to_owned()),
                        ..Default::default()
                    });
                }
            }
        }

        None => (),
    }

    fragments.append(&mut sequence.complex_types);

    for fragment in fragments {
        let fragment = flatten_fragment(registry, fragment);

        append_unique(&mut attributes, fragment.attributes, &mut BTreeSet::new(), attribute_name);
        append_unique(&mut elements, fragment.all_elements, &mut BTreeSet::new(), element_name);
    }

    let mut seen = BTreeSet::new();
    append_unique(&mut elements, sequence.elements, &mut seen, element_name);
    for choice in sequence.choices {
        append_unique(&mut elements, choice_sequence(&choice).elements, &mut seen, element_name);
    }
    append_unique(&mut elements, choices, &mut seen, element_name);

    ty.attributes = attributes;
    ty.all_elements = elements;
    entry.shape = shape;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::Options, resolver::Resolved};

    fn flattened(schema: &str) -> Registry {
        let mut definitions = wsdl2rs_wsdl::parse_str(schema).unwrap();
        let schema = definitions.schemas.remove(0);

        let mut registry = Registry::build(
            Resolved {
                definitions,
                schema,
            },
            &Options::default(),
        );
        flatten(&mut registry);
        registry
    }

    fn field_names(registry: &Registry, name: &str) -> Vec<String> {
        registry.complex_types[name]
            .ty
            .all_elements
            .iter()
            .map(|element| element.name.clone())
            .collect()
    }

    #[test]
    fn base_fields_come_first() {
        let registry = flattened(
            r#"<schema targetNamespace="urn:x" xmlns:tns="urn:x">
                 <complexType name="Derived">
                   <complexContent><extension base="tns:Base">
                     <sequence><element name="extra" type="string"/></sequence>
                     <attribute name="flag" type="boolean"/>
                   </extension></complexContent>
                 </complexType>
                 <complexType name="Base">
                   <sequence><element name="id" type="int"/></sequence>
                   <attribute name="kind" type="string"/>
                 </complexType>
               </schema>"#,
        );

        assert_eq!(field_names(&registry, "Derived"), vec!["id", "extra"]);

        let attributes = registry.complex_types["Derived"]
            .ty
            .attributes
            .iter()
            .map(|attribute| attribute.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(attributes, vec!["flag", "kind"]);

        let shape = &registry.complex_types["Derived"].shape;
        assert_eq!(shape.extension_base.as_deref(), Some("tns:Base"));
        assert!(registry.complex_types["Derived"].ty.content.is_none());
    }

    #[test]
    fn drops_redefined_fields() {
        let registry = flattened(
            r#"<schema targetNamespace="urn:x">
                 <complexType name="Pick">
                   <sequence>
                     <element name="a" type="string"/>
                     <choice>
                       <element name="a" type="int"/>
                       <element name="b" type="int"/>
                     </choice>
                   </sequence>
                 </complexType>
               </schema>"#,
        );

        assert_eq!(field_names(&registry, "Pick"), vec!["a", "b"]);
        assert_eq!(registry.complex_types["Pick"].ty.all_elements[0].type_name, "string");
    }

    fn min_occurs(registry: &Registry, name: &str) -> Vec<u32> {
        registry.complex_types[name]
            .ty
            .all_elements
            .iter()
            .map(|element| element.min_occurs)
            .collect()
    }

    #[test]
    fn choice_alternatives_are_optional() {
        let registry = flattened(
            r#"<schema targetNamespace="urn:x" xmlns:tns="urn:x">
                 <complexType name="Tree">
                   <choice>
                     <element name="leaf" type="int"/>
                     <element name="node" type="tns:Tree"/>
                   </choice>
                 </complexType>
                 <complexType name="Shape">
                   <sequence>
                     <element name="id" type="int"/>
                     <choice>
                       <element name="circle" type="double"/>
                       <sequence><element name="width" type="double"/></sequence>
                     </choice>
                   </sequence>
                 </complexType>
                 <complexType name="Labelled">
                   <complexContent><extension base="tns:Shape">
                     <choice>
                       <element name="text" type="string"/>
                       <element name="icon" type="string"/>
                     </choice>
                   </extension></complexContent>
                 </complexType>
               </schema>"#,
        );

        assert_eq!(field_names(&registry, "Tree"), vec!["leaf", "node"]);
        assert_eq!(min_occurs(&registry, "Tree"), vec![0, 0]);

        assert_eq!(field_names(&registry, "Shape"), vec!["id", "circle", "width"]);
        assert_eq!(min_occurs(&registry, "Shape"), vec![1, 0, 0]);

        assert_eq!(
            field_names(&registry, "Labelled"),
            vec!["id", "circle", "width", "text", "icon"]
        );
        assert_eq!(min_occurs(&registry, "Labelled"), vec![1, 0, 0, 0, 0]);
    }

    #[test]
    fn simple_content_becomes_text() {
        let registry = flattened(
            r#"<schema targetNamespace="urn:x">
                 <complexType name="Price">
                   <simpleContent><extension base="decimal">
                     <attribute name="currency" type="string"/>
                   </extension></simpleContent>
                 </complexType>
               </schema>"#,
        );

        let price = &registry.complex_types["Price"];
        assert!(price.shape.simple_content);
        assert_eq!(price.ty.all_elements[0].tag.as_deref(), Some("$text"));
        assert_eq!(price.ty.all_elements[0].type_name, "decimal");
        assert_eq!(price.ty.attributes[0].name, "currency");
    }

    #[test]
    fn survives_extension_cycles() {
        let registry = flattened(
            r#"<schema targetNamespace="urn:x">
                 <complexType name="A"><complexContent><extension base="B">
                   <sequence><element name="a" type="string"/></sequence>
                 </extension></complexContent></complexType>
                 <complexType name="B"><complexContent><extension base="A">
                   <sequence><element name="b" type="string"/></sequence>
                 </extension></complexContent></complexType>
               </schema>"#,
        );

        assert_eq!(field_names(&registry, "A"), vec!["b", "a"]);
        assert_eq!(field_names(&registry, "B"), vec!["b"]);
    }

    #[test]
    fn flattening_twice_changes_nothing() {
        let mut registry = flattened(
            r#"<schema targetNamespace="urn:x">
                 <complexType name="Wild"><sequence><any maxOccurs="unbounded"/></sequence></complexType>
                 <complexType name="Items">
                   <complexContent><restriction base="Array">
                     <attribute ref="arrayType" arrayType="tns:Item[]"/>
                   </restriction></complexContent>
                 </complexType>
               </schema>"#,
        );

        flatten(&mut registry);

        assert!(registry.complex_types["Wild"].shape.wildcard_only);
        assert_eq!(
            registry.complex_types["Items"].shape.array_item.as_deref(),
            Some("Item")
        );
    }
}
