use log::{debug, trace, warn};
use std::collections::BTreeMap;
use wsdl2rs_wsdl::types::{
    trim_ns, Attribute, Binding, BindingOperation, Choice, ComplexType, Content, Element,
    Extension, Message, Namespaces, Operation, PortType, Sequence, SimpleType,
};

use super::{options::Options, resolver::Resolved, types::is_builtin};

/// What a complex type looked like before flattening.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    /// Base of a complex content extension.
    pub extension_base: Option<String>,
    /// Content was a sequence or a choice.
    pub grouped: bool,
    /// The group held wildcards and nothing else.
    pub wildcard_only: bool,
    /// Item type of a SOAP-encoded array restriction.
    pub array_item: Option<String>,
    pub simple_content: bool,
}

#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub ty: ComplexType,
    pub shape: Shape,
    pub flattened: bool,
}

impl TypeEntry {
    pub fn new(ty: ComplexType) -> Self {
        Self {
            ty,
            shape: Shape::default(),
            flattened: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum OperationBinding {
    Bound(BindingOperation),
    Unbound,
}

#[derive(Debug, Clone)]
pub struct CatalogedOperation {
    pub operation: Operation,
    pub binding: OperationBinding,
}

impl CatalogedOperation {
    pub fn binding_operation(&self) -> Option<&BindingOperation> {
        match &self.binding {
            OperationBinding::Bound(binding) => Some(binding),
            OperationBinding::Unbound => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Rpc,
    Document,
}

/// Name-keyed catalogs of everything the emitters look up.
#[derive(Debug, Default)]
pub struct Registry {
    pub target_namespace: String,
    pub namespaces: Namespaces,
    pub simple_types: BTreeMap<String, SimpleType>,
    pub complex_types: BTreeMap<String, TypeEntry>,
    /// Scoped element name to the type it declares.
    pub type_aliases: BTreeMap<String, String>,
    pub elements: BTreeMap<String, Element>,
    pub messages: BTreeMap<String, Message>,
    pub operations: BTreeMap<String, CatalogedOperation>,
    pub binding_operations: BTreeMap<String, BindingOperation>,
    pub binding: Option<Binding>,
    pub port_type: Option<String>,
}

fn for_each_element(ty: &mut ComplexType, visit: &mut dyn FnMut(&mut Element)) {
    for element in &mut ty.all_elements {
        visit_element(element, visit);
    }

    match &mut ty.content {
        Some(Content::Sequence(sequence)) => for_each_sequence_element(sequence, visit),
        Some(Content::Choice(choice)) => for_each_choice_element(choice, visit),
        Some(Content::ComplexContent(content)) => {
            if let Some(extension) = &mut content.extension {
                for_each_extension_element(extension, visit);
            }
        }
        Some(Content::SimpleContent(_)) | None => (),
    }
}

fn visit_element(element: &mut Element, visit: &mut dyn FnMut(&mut Element)) {
    visit(element);

    if let Some(ty) = &mut element.complex_type {
        for_each_element(ty, visit);
    }
}

fn for_each_sequence_element(sequence: &mut Sequence, visit: &mut dyn FnMut(&mut Element)) {
    for element in &mut sequence.elements {
        visit_element(element, visit);
    }
    for ty in &mut sequence.complex_types {
        for_each_element(ty, visit);
    }
    for choice in &mut sequence.choices {
        for_each_choice_element(choice, visit);
    }
}

fn for_each_choice_element(choice: &mut Choice, visit: &mut dyn FnMut(&mut Element)) {
    for element in &mut choice.elements {
        visit_element(element, visit);
    }
    for ty in &mut choice.complex_types {
        for_each_element(ty, visit);
    }
    if let Some(sequence) = &mut choice.sequence {
        for_each_sequence_element(sequence, visit);
    }
}

fn for_each_extension_element(extension: &mut Extension, visit: &mut dyn FnMut(&mut Element)) {
    if let Some(sequence) = &mut extension.sequence {
        for_each_sequence_element(sequence, visit);
    }
    if let Some(choice) = &mut extension.choice {
        for_each_choice_element(choice, visit);
    }
}

impl Registry {
    pub fn build(resolved: Resolved, options: &Options) -> Registry {
        let Resolved {
            definitions,
            mut schema,
        } = resolved;

        let mut registry = Registry {
            target_namespace: schema.target_namespace.clone(),
            namespaces: schema.namespaces.clone(),
            ..Default::default()
        };

        registry.catalog_element_types(&mut schema.elements, "");

        for ty in schema.simple_types {
            registry.simple_types.insert(ty.name.clone(), ty);
        }

        for mut ty in schema.complex_types {
            registry.catalog_complex_type(&mut ty, "");
        }

        registry.catalog_elements(schema.elements);

        for message in definitions.messages {
            registry.messages.insert(message.name.clone(), message);
        }

        registry.select_service(definitions.bindings, definitions.port_types);

        if let Some(version) = &options.request_version {
            registry.add_version_attribute(version);
        }

        debug!(
            "Cataloged {} simple types, {} complex types, {} elements, {} operations",
            registry.simple_types.len(),
            registry.complex_types.len(),
            registry.elements.len(),
            registry.operations.len()
        );

        registry
    }

    fn catalog_element_types(&mut self, elements: &mut [Element], prefix: &str) {
        for element in elements {
            let type_name = format!("{}{}", prefix, element.name);

            if !element.name.is_empty() && !element.type_name.is_empty() {
                self.type_aliases
                    .insert(type_name.clone(), element.type_name.clone());
            }

            let Some(ty) = element.complex_type.as_mut() else {
                continue;
            };

            if element.type_name.is_empty() {
                element.type_name = type_name.clone();
            }

            self.catalog_complex_type(ty, &type_name);
        }
    }

    /// Registers `ty` and the anonymous types nested inside it. Nested
    /// types are registered before the type that contains them.
    fn catalog_complex_type(&mut self, ty: &mut ComplexType, scope_name: &str) {
        if ty.name.is_empty() {
            ty.name = scope_name.to_owned();
        }

        if ty.name.is_empty() {
            trace!("Skipping anonymous complex type without a scope");
            return;
        }

        let name = ty.name.clone();

        match &mut ty.content {
            Some(Content::Sequence(sequence)) => self.catalog_sequence_types(sequence, &name),
            Some(Content::Choice(choice)) => self.catalog_choice_types(choice, &name),
            Some(Content::ComplexContent(content)) => {
                if let Some(extension) = &mut content.extension {
                    if let Some(sequence) = &mut extension.sequence {
                        self.catalog_sequence_types(sequence, &name);
                    }
                    if let Some(choice) = &mut extension.choice {
                        self.catalog_choice_types(choice, &name);
                    }
                }
            }
            Some(Content::SimpleContent(_)) | None => (),
        }

        self.complex_types.insert(name, TypeEntry::new(ty.clone()));
    }

    fn catalog_sequence_types(&mut self, sequence: &mut Sequence, name: &str) {
        for ty in &mut sequence.complex_types {
            self.catalog_complex_type(ty, "");
        }

        self.catalog_element_types(&mut sequence.elements, name);

        for choice in &mut sequence.choices {
            for ty in &mut choice.complex_types {
                self.catalog_complex_type(ty, "");
            }

            self.catalog_element_types(&mut choice.elements, name);
        }
    }

    fn catalog_choice_types(&mut self, choice: &mut Choice, name: &str) {
        self.catalog_element_types(&mut choice.elements, name);

        if let Some(sequence) = &mut choice.sequence {
            self.catalog_sequence_types(sequence, name);
        }
    }

    /// Rewrites an element type that names another element to the type
    /// that element declares.
    fn alias_target(&self, type_name: &str) -> Option<String> {
        let local = trim_ns(type_name);
        if local.is_empty()
            || self.complex_types.contains_key(local)
            || self.simple_types.contains_key(local)
            || is_builtin(local)
        {
            return None;
        }

        self.type_aliases
            .get(type_name)
            .or_else(|| self.type_aliases.get(local))
            .cloned()
    }

    fn resolve_element(&self, element: &mut Element) {
        if !element.ref_name.is_empty() {
            let target_name = trim_ns(&element.ref_name).to_owned();

            match self.elements.get(&target_name) {
                Some(target) => {
                    *element = target.enriched_by(element);
                    element.ref_name.clear();
                }
                None => {
                    if element.name.is_empty() {
                        element.name = target_name.clone();
                    }
                    if element.type_name.is_empty() {
                        element.type_name = target_name;
                    }
                }
            }
        }

        if let Some(target) = self.alias_target(&element.type_name) {
            element.type_name = target;
        }
    }

    fn catalog_element(&mut self, element: &mut Element) {
        self.resolve_element(element);

        if element.name.is_empty() || element.type_name.is_empty() {
            return;
        }

        let name = trim_ns(&element.name).to_owned();
        self.elements.entry(name).or_insert_with(|| element.clone());
    }

    /// Catalogs top-level elements first, then the elements nested in
    /// each complex type, rewriting `ref`s and element aliases in place.
    fn catalog_elements(&mut self, mut top_level: Vec<Element>) {
        for element in &mut top_level {
            self.catalog_element(element);
        }

        for element in &mut top_level {
            if let Some(ty) = &mut element.complex_type {
                for_each_element(ty, &mut |nested| self.catalog_element(nested));
            }
        }

        let names = self.complex_types.keys().cloned().collect::<Vec<_>>();
        for name in names {
            if let Some(mut entry) = self.complex_types.remove(&name) {
                for_each_element(&mut entry.ty, &mut |nested| self.catalog_element(nested));
                self.complex_types.insert(name, entry);
            }
        }
    }

    fn select_service(&mut self, bindings: Vec<Binding>, port_types: Vec<PortType>) {
        let binding = bindings.into_iter().next();

        let port_type = match &binding {
            Some(binding) => {
                let wanted = trim_ns(&binding.port_type);
                port_types
                    .into_iter()
                    .find(|port_type| port_type.name == wanted)
            }
            None => port_types.into_iter().next(),
        };

        if let Some(binding) = &binding {
            for operation in &binding.operations {
                self.binding_operations
                    .insert(operation.name.clone(), operation.clone());
            }

            if port_type.is_none() {
                warn!(
                    "Binding {} requires undeclared port type {}",
                    binding.name, binding.port_type
                );
            }
        }

        if let Some(port_type) = port_type {
            for operation in port_type.operations {
                let binding = match self.binding_operations.get(&operation.name) {
                    Some(binding) => OperationBinding::Bound(binding.clone()),
                    None => OperationBinding::Unbound,
                };

                self.operations.insert(
                    operation.name.clone(),
                    CatalogedOperation { operation, binding },
                );
            }

            self.port_type = Some(port_type.name);
        }

        self.binding = binding;
    }

    /// Complex type carried by the first part of `message`.
    pub fn first_part_type(&self, message: &str) -> Option<String> {
        let part = self.messages.get(trim_ns(message))?.parts.first()?;

        let type_name = match (&part.type_name, &part.element) {
            (Some(type_name), _) => trim_ns(type_name).to_owned(),
            (None, Some(element)) => {
                let element = trim_ns(element);
                match self.elements.get(element) {
                    Some(element) => trim_ns(&element.type_name).to_owned(),
                    None => element.to_owned(),
                }
            }
            (None, None) => return None,
        };

        Some(type_name).filter(|name| self.complex_types.contains_key(name))
    }

    fn add_version_attribute(&mut self, version: &str) {
        let types = self
            .operations
            .values()
            .filter_map(|cataloged| cataloged.operation.input.as_deref())
            .filter_map(|message| self.first_part_type(message))
            .collect::<Vec<_>>();

        for name in types {
            if let Some(entry) = self.complex_types.get_mut(&name) {
                if entry.ty.attributes.iter().any(|attribute| attribute.name == "Version") {
                    continue;
                }

                trace!("Adding version {} to {}", version, name);
                entry.ty.attributes.push(Attribute {
                    name: "Version".to_owned(),
                    type_name: "string".to_owned(),
                    ..Default::default()
                });
            }
        }
    }

    pub fn complex(&self, type_name: &str) -> Option<&TypeEntry> {
        self.complex_types.get(trim_ns(type_name))
    }

    pub fn simple(&self, type_name: &str) -> Option<&SimpleType> {
        self.simple_types.get(trim_ns(type_name))
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.get(trim_ns(name))
    }

    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.get(trim_ns(name))
    }

    pub fn has_binding_operations(&self) -> bool {
        !self.binding_operations.is_empty()
    }

    /// The operation level style wins over the binding style.
    pub fn style(&self, operation: &BindingOperation) -> Style {
        let style = operation
            .style
            .as_deref()
            .or_else(|| self.binding.as_ref().and_then(|binding| binding.style.as_deref()));

        match style {
            Some("rpc") => Style::Rpc,
            _ => Style::Document,
        }
    }
}
