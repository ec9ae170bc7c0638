//! Validation output formats
//!
//! The engine records one entry per executed keyword (failures always,
//! successes only under the verbose format); rendering shapes those
//! records into the requested output: `flag` is a bare boolean, `basic`
//! a flat error list, `detailed`/`verbose` a tree following the schema
//! structure.

use serde::Serialize;

/// How much structure the caller wants back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Validity and at most one error; permits short-circuiting
    #[default]
    Flag,
    /// Flat list of failed keywords
    Basic,
    /// Tree along the schema structure, valid subtrees pruned
    Detailed,
    /// Tree along the schema structure, everything kept
    Verbose,
}

/// One node of structured output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputUnit {
    pub valid: bool,
    pub keyword_location: String,
    pub instance_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<OutputUnit>,
}

/// A validation result, shaped per the requested output format
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Flag {
        valid: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Basic {
        valid: bool,
        errors: Vec<OutputUnit>,
    },
    Hierarchical(OutputUnit),
}

impl Output {
    /// Overall validity regardless of shape
    pub fn valid(&self) -> bool {
        match self {
            Output::Flag { valid, .. } => *valid,
            Output::Basic { valid, .. } => *valid,
            Output::Hierarchical(unit) => unit.valid,
        }
    }

    /// The first error message, if any
    pub fn first_error(&self) -> Option<&str> {
        match self {
            Output::Flag { error, .. } => error.as_deref(),
            Output::Basic { errors, .. } => {
                errors.iter().find_map(|unit| unit.error.as_deref())
            }
            Output::Hierarchical(unit) => first_error_in(unit),
        }
    }
}

fn first_error_in(unit: &OutputUnit) -> Option<&str> {
    if let Some(error) = unit.error.as_deref() {
        return Some(error);
    }
    unit.details.iter().find_map(first_error_in)
}

/// One executed keyword, recorded by the engine in execution order
#[derive(Debug, Clone)]
pub(crate) struct OutputRecord {
    pub valid: bool,
    pub keyword_location: String,
    pub instance_location: String,
    pub error: Option<String>,
}

pub(crate) fn render(
    valid: bool,
    error: Option<String>,
    records: Vec<OutputRecord>,
    format: OutputFormat,
) -> Output {
    match format {
        OutputFormat::Flag => Output::Flag { valid, error },
        OutputFormat::Basic => Output::Basic {
            valid,
            errors: records
                .into_iter()
                .filter(|record| !record.valid)
                .map(leaf_unit)
                .collect(),
        },
        OutputFormat::Detailed => {
            let mut root = build_tree(valid, error, records);
            prune_valid(&mut root);
            Output::Hierarchical(root)
        }
        OutputFormat::Verbose => Output::Hierarchical(build_tree(valid, error, records)),
    }
}

fn leaf_unit(record: OutputRecord) -> OutputUnit {
    OutputUnit {
        valid: record.valid,
        keyword_location: record.keyword_location,
        instance_location: record.instance_location,
        error: record.error,
        details: Vec::new(),
    }
}

/// Records arrive in post-order (a keyword's outcome is known only
/// after its subschemas ran), so the tree is assembled in reverse with
/// a stack of open ancestors.
fn build_tree(valid: bool, error: Option<String>, records: Vec<OutputRecord>) -> OutputUnit {
    let root = OutputUnit {
        valid,
        keyword_location: String::new(),
        instance_location: String::new(),
        error: if valid { None } else { error },
        details: Vec::new(),
    };

    let mut stack: Vec<OutputUnit> = vec![root];
    for record in records.into_iter().rev() {
        while stack.len() > 1
            && !is_location_prefix(
                &stack.last().expect("stack is never empty").keyword_location,
                &record.keyword_location,
            )
        {
            let finished = stack.pop().expect("stack is never empty");
            attach(&mut stack, finished);
        }
        stack.push(leaf_unit(record));
    }
    while stack.len() > 1 {
        let finished = stack.pop().expect("stack is never empty");
        attach(&mut stack, finished);
    }

    let mut root = stack.pop().expect("stack is never empty");
    reverse_details(&mut root);
    root
}

fn attach(stack: &mut [OutputUnit], unit: OutputUnit) {
    stack
        .last_mut()
        .expect("stack is never empty")
        .details
        .push(unit);
}

fn reverse_details(unit: &mut OutputUnit) {
    unit.details.reverse();
    for child in &mut unit.details {
        reverse_details(child);
    }
}

fn is_location_prefix(parent: &str, child: &str) -> bool {
    parent.is_empty()
        || (child.starts_with(parent) && child[parent.len()..].starts_with('/'))
}

/// Detailed output keeps only the subtrees that carry failures
fn prune_valid(unit: &mut OutputUnit) {
    unit.details.retain(|child| !child.valid);
    for child in &mut unit.details {
        prune_valid(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(valid: bool, keyword: &str, instance: &str, error: Option<&str>) -> OutputRecord {
        OutputRecord {
            valid,
            keyword_location: keyword.to_string(),
            instance_location: instance.to_string(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_flag_output() {
        let output = render(
            false,
            Some("Expected integer, got string".to_string()),
            Vec::new(),
            OutputFormat::Flag,
        );
        assert!(!output.valid());
        assert_eq!(output.first_error(), Some("Expected integer, got string"));
    }

    #[test]
    fn test_basic_output_keeps_only_failures() {
        let records = vec![
            record(true, "/properties/a/type", "/a", None),
            record(false, "/required", "", Some("Missing required property 'b'")),
        ];
        let output = render(false, None, records, OutputFormat::Basic);
        match &output {
            Output::Basic { valid, errors } => {
                assert!(!valid);
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].keyword_location, "/required");
            }
            other => panic!("Expected basic output, got {:?}", other),
        }
    }

    #[test]
    fn test_tree_nests_post_order_records() {
        // Child failures precede their parent keyword's record
        let records = vec![
            record(false, "/properties/a/type", "/a", Some("Expected integer, got string")),
            record(false, "/properties", "", None),
        ];
        let output = render(false, None, records, OutputFormat::Detailed);
        match output {
            Output::Hierarchical(root) => {
                assert!(!root.valid);
                assert_eq!(root.details.len(), 1);
                assert_eq!(root.details[0].keyword_location, "/properties");
                assert_eq!(
                    root.details[0].details[0].keyword_location,
                    "/properties/a/type"
                );
            }
            other => panic!("Expected hierarchical output, got {:?}", other),
        }
    }

    #[test]
    fn test_detailed_prunes_valid_siblings() {
        let records = vec![
            record(true, "/anyOf/0/type", "", None),
            record(false, "/anyOf/1/type", "", Some("Expected integer, got string")),
            record(true, "/anyOf", "", None),
        ];
        let output = render(true, None, records, OutputFormat::Detailed);
        match output {
            Output::Hierarchical(root) => {
                assert!(root.valid);
                // The valid anyOf subtree disappears entirely
                assert!(root.details.is_empty());
            }
            other => panic!("Expected hierarchical output, got {:?}", other),
        }
    }

    #[test]
    fn test_verbose_keeps_valid_units() {
        let records = vec![
            record(true, "/anyOf/0/type", "", None),
            record(true, "/anyOf", "", None),
        ];
        let output = render(true, None, records, OutputFormat::Verbose);
        match output {
            Output::Hierarchical(root) => {
                assert_eq!(root.details.len(), 1);
                assert_eq!(root.details[0].details.len(), 1);
            }
            other => panic!("Expected hierarchical output, got {:?}", other),
        }
    }

    #[test]
    fn test_location_prefix_respects_boundaries() {
        assert!(is_location_prefix("", "/a"));
        assert!(is_location_prefix("/a", "/a/b"));
        assert!(!is_location_prefix("/a", "/ab"));
        assert!(!is_location_prefix("/a/b", "/a"));
    }
}
