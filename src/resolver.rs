//! Reference resolution
//!
//! Turns a `$ref`/`$dynamicRef`/`$recursiveRef` URI reference into a
//! target schema under both lexical and dynamic scopes, detects cycles
//! via the (absolute reference, instance fingerprint) visited set, and
//! evaluates the target under its own base URI. Reference errors and
//! cycles become validation failures on the referencing keyword; they
//! never abort the outer call.

use crate::annotations::AnnotationStore;
use crate::error::ValidationErrorKind;
use crate::pointer::JsonPointer;
use crate::registry::{Registry, RegistryEntry};
use crate::schema::{is_anchor_name, Schema};
use crate::uri;
use crate::validator::{evaluate, Outcome, ValidationContext};
use crate::value;
use serde_json::Value;

/// Which reference keyword is being applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefStyle {
    /// `$ref`
    Static,
    /// `$dynamicRef` (2020-12)
    Dynamic,
    /// `$recursiveRef` (2019-09)
    Recursive,
}

pub(crate) fn apply_reference(
    reference: &str,
    style: RefStyle,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let (base, fragment) = uri::split_fragment(reference);
    let fragment = fragment.unwrap_or("");

    let new_uri = if base.is_empty() {
        ctx.base_uri.clone()
    } else {
        match uri::join(&ctx.base_uri, base) {
            Ok(joined) => joined,
            Err(_) => {
                return ctx.fail(ValidationErrorKind::UnresolvedReference {
                    reference: reference.to_string(),
                })
            }
        }
    };

    tracing::trace!(reference = %reference, uri = %new_uri, style = ?style, "Resolving reference");

    let registry = ctx.registry;
    let (target_uri, entry, target) =
        match resolve_target(registry, &new_uri, fragment, style, &ctx.dynamic_scope) {
            Ok(resolved) => resolved,
            Err(kind) => return ctx.fail(kind),
        };

    // The key names the resolved target, so a dynamically retargeted
    // reference does not collide with a lexical reference to the same
    // URI on the same instance.
    let absolute_reference = format!("{}#{}", target_uri, fragment);
    let visit_key = (absolute_reference.clone(), value::fingerprint(instance));
    if ctx.visited.contains(&visit_key) {
        return ctx.fail(ValidationErrorKind::RecursiveReference {
            reference: absolute_reference,
        });
    }

    ctx.visited.insert(visit_key.clone());
    ctx.enter_dynamic_scope(&target_uri);
    let (outcome, child_store) =
        ctx.with_resource(target_uri, entry, |ctx| evaluate(instance, target, ctx));
    ctx.visited.remove(&visit_key);

    // A reference applies in place, so its annotations consolidate
    if outcome.valid {
        store.merge_from(child_store);
    }
    outcome
}

fn resolve_target<'r>(
    registry: &'r Registry,
    new_uri: &str,
    fragment: &str,
    style: RefStyle,
    dynamic_scope: &[String],
) -> Result<(String, &'r RegistryEntry, &'r Schema), ValidationErrorKind> {
    match style {
        RefStyle::Recursive => {
            // The parser guarantees the reference is exactly `#`
            let entry = registry.get(new_uri).ok_or_else(|| {
                ValidationErrorKind::UnresolvedReference {
                    reference: new_uri.to_string(),
                }
            })?;
            if entry.recursive_anchor {
                // Late binding: the outermost dynamic-scope entry that
                // also declares `$recursiveAnchor` wins
                for uri in dynamic_scope {
                    if let Some(outer) = registry.get(uri) {
                        if outer.recursive_anchor {
                            return Ok((uri.clone(), outer, &outer.schema));
                        }
                    }
                }
            }
            Ok((new_uri.to_string(), entry, &entry.schema))
        }
        RefStyle::Dynamic if is_anchor_name(fragment) => {
            // Dynamic lookup applies only when the current scope itself
            // declares the anchor dynamically; otherwise the reference
            // behaves statically and must not pick up an unrelated
            // anchor elsewhere in the scope
            if registry.dynamic_scope_defines_anchor(new_uri, fragment) {
                // Walk the scope outermost-in; the outermost resource
                // that declares the dynamic anchor wins
                for uri in dynamic_scope {
                    if let Some(entry) = registry.get(uri) {
                        if let Some(pointer) = entry.dynamic_anchors.get(fragment) {
                            if let Some(schema) = entry.schema.resolve_pointer(pointer) {
                                return Ok((uri.clone(), entry, schema));
                            }
                        }
                    }
                }
            }
            static_target(registry, new_uri, fragment)
        }
        _ => static_target(registry, new_uri, fragment),
    }
}

fn static_target<'r>(
    registry: &'r Registry,
    new_uri: &str,
    fragment: &str,
) -> Result<(String, &'r RegistryEntry, &'r Schema), ValidationErrorKind> {
    let entry = registry
        .get(new_uri)
        .ok_or_else(|| ValidationErrorKind::UnresolvedReference {
            reference: new_uri.to_string(),
        })?;

    if fragment.is_empty() {
        return Ok((new_uri.to_string(), entry, &entry.schema));
    }

    if is_anchor_name(fragment) {
        let pointer =
            entry
                .anchors
                .get(fragment)
                .ok_or_else(|| ValidationErrorKind::UnresolvedAnchor {
                    anchor: fragment.to_string(),
                    uri: new_uri.to_string(),
                })?;
        let schema = entry.schema.resolve_pointer(pointer).ok_or_else(|| {
            ValidationErrorKind::UnresolvedAnchor {
                anchor: fragment.to_string(),
                uri: new_uri.to_string(),
            }
        })?;
        return Ok((new_uri.to_string(), entry, schema));
    }

    let decoded = uri::percent_decode(fragment);
    let pointer = JsonPointer::parse(&decoded).map_err(|_| {
        ValidationErrorKind::BadPointerFragment {
            fragment: fragment.to_string(),
        }
    })?;
    let schema = entry.schema.resolve_pointer(&pointer).ok_or_else(|| {
        ValidationErrorKind::UnresolvedReference {
            reference: format!("{}#{}", new_uri, fragment),
        }
    })?;
    Ok((new_uri.to_string(), entry, schema))
}
