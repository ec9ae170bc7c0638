//! The schema registry
//!
//! Stores schemas by canonical absolute URI and indexes their anchors
//! and dynamic anchors. Schemas nested under their own `$id` are
//! registered as resources in their own right (the subtree is cloned;
//! schemas are immutable after load, so the copies cannot diverge).
//! The registry is append-only: registration happens up front, and
//! validation only reads.

use crate::draft::{Draft, VocabularySet};
use crate::error::{SchemaError, SchemaResult};
use crate::pointer::JsonPointer;
use crate::schema::Schema;
use crate::uri;
use serde_json::Value;
use std::collections::HashMap;

/// Everything the registry knows about one schema resource
#[derive(Debug)]
pub struct RegistryEntry {
    pub schema: Schema,
    pub draft: Draft,
    pub vocabularies: VocabularySet,
    /// `$anchor` names (and `$dynamicAnchor` names, which are also
    /// statically resolvable), pointing into the resource
    pub anchors: HashMap<String, JsonPointer>,
    /// `$dynamicAnchor` names only
    pub dynamic_anchors: HashMap<String, JsonPointer>,
    /// Whether the resource root declares `$recursiveAnchor: true`
    pub recursive_anchor: bool,
}

/// Schema storage keyed by canonical absolute URI
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a schema document under a retrieval URI
    ///
    /// The document's root `$id` (resolved against `retrieval_uri`)
    /// wins over the retrieval URI itself. Returns the canonical URI
    /// the root was stored under. Registering an already-taken URI is
    /// an error.
    pub fn register(&mut self, document: &Value, retrieval_uri: &str) -> SchemaResult<String> {
        let draft = document_draft(document)?;
        let vocabularies = VocabularySet::from_document(document, draft);
        let mut schema = Schema::from_value(document, draft)?;

        let root_uri = match root_id(&schema) {
            Some(id) => {
                if uri::is_absolute(&id) {
                    uri::canonical(&id)?
                } else if retrieval_uri.is_empty() {
                    return Err(SchemaError::InvalidUri(id));
                } else {
                    uri::join(retrieval_uri, &id)?
                }
            }
            None => uri::canonical(retrieval_uri)?,
        };

        if let Schema::Object(obj) = &mut schema {
            obj.base_uri = Some(root_uri.clone());
        }
        absolutize(&mut schema, &root_uri)?;

        let mut resources = Vec::new();
        collect_resources(&schema, &root_uri, true, &mut resources)?;

        let mut fresh = std::collections::HashSet::new();
        for (resource_uri, _) in &resources {
            if self.entries.contains_key(resource_uri) || !fresh.insert(resource_uri.clone()) {
                return Err(SchemaError::DuplicateRegistration(resource_uri.clone()));
            }
        }

        for (resource_uri, resource) in resources {
            let mut anchors = HashMap::new();
            let mut dynamic_anchors = HashMap::new();
            collect_anchors(
                resource,
                JsonPointer::root(),
                true,
                &mut anchors,
                &mut dynamic_anchors,
            )?;
            let recursive_anchor = resource
                .as_object()
                .is_some_and(|obj| obj.recursive_anchor);
            tracing::debug!(
                uri = %resource_uri,
                anchors = anchors.len(),
                dynamic_anchors = dynamic_anchors.len(),
                "Registered schema resource"
            );
            self.entries.insert(
                resource_uri,
                RegistryEntry {
                    schema: resource.clone(),
                    draft,
                    vocabularies,
                    anchors,
                    dynamic_anchors,
                    recursive_anchor,
                },
            );
        }

        Ok(root_uri)
    }

    /// Look up a resource by URI (canonicalized if needed)
    pub fn get(&self, uri: &str) -> Option<&RegistryEntry> {
        if let Some(entry) = self.entries.get(uri) {
            return Some(entry);
        }
        let canonical = uri::canonical(uri).ok()?;
        self.entries.get(&canonical)
    }

    /// Resolve an `$anchor` (or `$dynamicAnchor`) name statically
    pub fn resolve_anchor(&self, uri: &str, anchor: &str) -> Option<&Schema> {
        let entry = self.get(uri)?;
        let pointer = entry.anchors.get(anchor)?;
        entry.schema.resolve_pointer(pointer)
    }

    /// Resolve a `$dynamicAnchor` name in one resource
    pub fn resolve_dynamic_anchor(&self, uri: &str, anchor: &str) -> Option<&Schema> {
        let entry = self.get(uri)?;
        let pointer = entry.dynamic_anchors.get(anchor)?;
        entry.schema.resolve_pointer(pointer)
    }

    /// Whether the resource at `uri` declares `$dynamicAnchor` `anchor`
    pub fn dynamic_scope_defines_anchor(&self, uri: &str, anchor: &str) -> bool {
        self.get(uri)
            .is_some_and(|entry| entry.dynamic_anchors.contains_key(anchor))
    }

    /// All registered canonical URIs
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

fn document_draft(document: &Value) -> SchemaResult<Draft> {
    match document.get("$schema") {
        Some(Value::String(meta)) => {
            Draft::from_meta_schema(meta).ok_or_else(|| SchemaError::UnknownMetaSchema(meta.clone()))
        }
        Some(_) => Err(SchemaError::UnknownMetaSchema(
            "(non-string $schema)".to_string(),
        )),
        None => Ok(Draft::latest()),
    }
}

fn root_id(schema: &Schema) -> Option<String> {
    schema.as_object()?.base_uri.clone()
}

/// Rewrite every `$id` in the tree to its absolute form
fn absolutize(schema: &mut Schema, base: &str) -> SchemaResult<()> {
    let Schema::Object(obj) = schema else {
        return Ok(());
    };
    let current_base = match obj.base_uri.take() {
        Some(raw) => {
            let absolute = uri::join(base, &raw)?;
            obj.base_uri = Some(absolute.clone());
            absolute
        }
        None => base.to_string(),
    };
    for keyword in &mut obj.keywords {
        for child in keyword.subschemas_mut() {
            absolutize(child, &current_base)?;
        }
    }
    Ok(())
}

/// Collect every resource root (the document root plus each embedded `$id`)
fn collect_resources<'a>(
    schema: &'a Schema,
    parent_uri: &str,
    is_root: bool,
    out: &mut Vec<(String, &'a Schema)>,
) -> SchemaResult<()> {
    let Schema::Object(obj) = schema else {
        if is_root {
            out.push((parent_uri.to_string(), schema));
        }
        return Ok(());
    };
    let this_uri = obj.base_uri.as_deref().unwrap_or(parent_uri);
    if is_root || obj.base_uri.is_some() {
        out.push((this_uri.to_string(), schema));
    }
    for keyword in &obj.keywords {
        for (_, child) in keyword.subschemas() {
            collect_resources(child, this_uri, false, out)?;
        }
    }
    Ok(())
}

/// Index anchors within one resource; nested `$id` resources keep their own
fn collect_anchors(
    schema: &Schema,
    pointer: JsonPointer,
    is_root: bool,
    anchors: &mut HashMap<String, JsonPointer>,
    dynamic_anchors: &mut HashMap<String, JsonPointer>,
) -> SchemaResult<()> {
    let Schema::Object(obj) = schema else {
        return Ok(());
    };
    if !is_root && obj.base_uri.is_some() {
        return Ok(());
    }
    if let Some(name) = &obj.anchor {
        if anchors.insert(name.clone(), pointer.clone()).is_some() {
            return Err(SchemaError::InvalidAnchor(name.clone()));
        }
    }
    if let Some(name) = &obj.dynamic_anchor {
        if dynamic_anchors
            .insert(name.clone(), pointer.clone())
            .is_some()
        {
            return Err(SchemaError::InvalidAnchor(name.clone()));
        }
        anchors.entry(name.clone()).or_insert_with(|| pointer.clone());
    }
    for keyword in &obj.keywords {
        for (tokens, child) in keyword.subschemas() {
            let mut child_pointer = pointer.clone();
            for token in tokens {
                child_pointer.push(token);
            }
            collect_anchors(child, child_pointer, false, anchors, dynamic_anchors)?;
        }
    }
    Ok(())
}
