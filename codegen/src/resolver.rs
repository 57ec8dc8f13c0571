use log::{debug, trace};
use std::collections::BTreeSet;
use url::Url;
use wsdl2rs_wsdl::{
    self as wsdl,
    error::Error as WsdlError,
    types::{Definitions, Schema},
    Fetch,
};

use super::error::Error;

/// A root document with every import and include folded in.
#[derive(Debug, Default)]
pub struct Resolved {
    /// Messages, port types and bindings of the root and its WSDL imports.
    /// The schemas have been moved into `schema`.
    pub definitions: Definitions,
    pub schema: Schema,
}

struct Resolver<'a> {
    fetcher: &'a dyn Fetch,
    fetched: BTreeSet<String>,
    schema: Schema,
}

impl<'a> Resolver<'a> {
    fn mark_fetched(&mut self, location: &Url) -> bool {
        let fresh = self.fetched.insert(location.to_string());
        if !fresh {
            trace!("Already fetched {}", location);
        }
        fresh
    }

    fn fold(&mut self, mut schema: Schema, declared_at: &Url) -> Result<(), Error> {
        let references = schema
            .imports
            .drain(..)
            .chain(schema.includes.drain(..))
            .collect::<Vec<_>>();

        self.schema.merge(schema);

        for reference in references {
            self.include(&reference.location, declared_at)?;
        }

        Ok(())
    }

    fn include(&mut self, location: &str, declared_at: &Url) -> Result<(), Error> {
        if location.is_empty() {
            return Ok(());
        }

        let url = declared_at.join(location).map_err(WsdlError::from)?;
        if !self.mark_fetched(&url) {
            return Ok(());
        }

        debug!("Including schema {}", url);
        let fragment = wsdl::parse_url(&url, self.fetcher)?;

        for schema in fragment.schemas {
            self.fold(schema, &url)?;
        }

        Ok(())
    }

    fn import(
        &mut self,
        definitions: &mut Definitions,
        location: &str,
        declared_at: &Url,
    ) -> Result<(), Error> {
        if location.is_empty() {
            return Ok(());
        }

        let url = declared_at.join(location).map_err(WsdlError::from)?;
        if !self.mark_fetched(&url) {
            return Ok(());
        }

        debug!("Importing definitions {}", url);
        let mut imported = wsdl::parse_url(&url, self.fetcher)?;

        let imports = std::mem::take(&mut imported.imports);
        let schemas = std::mem::take(&mut imported.schemas);
        definitions.merge(imported);

        for import in imports {
            self.import(definitions, &import.location, &url)?;
        }

        for schema in schemas {
            self.fold(schema, &url)?;
        }

        Ok(())
    }
}

/// Folds the inline schemas of `definitions` into one schema, then follows
/// WSDL imports, schema imports and schema includes. Each distinct
/// location is fetched once, locations are resolved against the document
/// that declares them.
pub fn resolve(
    mut definitions: Definitions,
    base: &Url,
    fetcher: &dyn Fetch,
) -> Result<Resolved, Error> {
    let mut resolver = Resolver {
        fetcher,
        fetched: BTreeSet::new(),
        schema: Schema::default(),
    };
    resolver.fetched.insert(base.to_string());

    resolver.schema.target_namespace = definitions
        .schemas
        .first()
        .map(|schema| schema.target_namespace.clone())
        .filter(|namespace| !namespace.is_empty())
        .unwrap_or_else(|| definitions.target_namespace.clone());
    resolver.schema.namespaces = definitions.namespaces.clone();

    let schemas = std::mem::take(&mut definitions.schemas);
    for schema in schemas {
        resolver.fold(schema, base)?;
    }

    let imports = std::mem::take(&mut definitions.imports);
    for import in imports {
        resolver.import(&mut definitions, &import.location, base)?;
    }

    debug!(
        "Resolved {} documents into {} complex types and {} simple types",
        resolver.fetched.len(),
        resolver.schema.complex_types.len(),
        resolver.schema.simple_types.len()
    );

    Ok(Resolved {
        definitions,
        schema: resolver.schema,
    })
}
