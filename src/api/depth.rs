//! Limits how deeply selection sets of an operation can be nested.
//!
//! Top level fields of an operation are at depth 0; the fields selected on
//! them at depth 1 and so on. A field is reported once it sits deeper than the
//! configured maximum. Fragments (spread or inline) are transparent: they do
//! not add a level. Introspection fields (`__schema`, `__type`, ...) do not
//! count towards the depth of their parent.

use std::collections::{HashMap, HashSet};

use graphql_parser::{
    Pos,
    query::{Definition, Document, FragmentDefinition, OperationDefinition, Selection, SelectionSet},
};
use serde::Serialize;


/// A violation of the depth limit, serialized like any other GraphQL error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DepthLimitError {
    pub(crate) message: String,
    pub(crate) locations: Vec<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct Location {
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl From<Pos> for Location {
    fn from(pos: Pos) -> Self {
        Self { line: pos.line, column: pos.column }
    }
}

/// Checks all operations in `doc` and returns one error per selection that
/// exceeds `max_depth`. An empty vector means the document is fine.
pub(crate) fn check<'a>(doc: &Document<'a, &'a str>, max_depth: usize) -> Vec<DepthLimitError> {
    let fragments = doc.definitions.iter()
        .filter_map(|def| match def {
            Definition::Fragment(f) => Some((f.name, f)),
            Definition::Operation(_) => None,
        })
        .collect::<HashMap<_, _>>();

    let mut errors = Vec::new();
    for def in &doc.definitions {
        let Definition::Operation(op) = def else {
            continue;
        };

        let (name, selection_set) = match op {
            OperationDefinition::SelectionSet(s) => (None, s),
            OperationDefinition::Query(q) => (q.name, &q.selection_set),
            OperationDefinition::Mutation(m) => (m.name, &m.selection_set),
            OperationDefinition::Subscription(s) => (s.name, &s.selection_set),
        };

        let mut walker = Walker {
            fragments: &fragments,
            max_depth,
            operation_name: name.unwrap_or(""),
            visiting: HashSet::new(),
            errors: &mut errors,
        };
        let depth = walker.selection_set(selection_set, 0);
        tracing::trace!(operation = name.unwrap_or("<anonymous>"), depth, "Checked query depth");
    }

    errors
}

struct Walker<'doc, 'a> {
    fragments: &'doc HashMap<&'a str, &'doc FragmentDefinition<'a, &'a str>>,
    max_depth: usize,
    operation_name: &'a str,

    /// Fragments on the current path, to not loop forever on fragment cycles.
    /// Those are invalid anyway and rejected by the schema validation.
    visiting: HashSet<&'a str>,
    errors: &'doc mut Vec<DepthLimitError>,
}

impl<'doc, 'a> Walker<'doc, 'a> {
    /// Returns the depth of the deepest branch below this selection set.
    fn selection_set(&mut self, set: &'doc SelectionSet<'a, &'a str>, depth: usize) -> usize {
        set.items.iter()
            .map(|selection| self.selection(selection, depth))
            .max()
            .unwrap_or(0)
    }

    fn selection(&mut self, selection: &'doc Selection<'a, &'a str>, depth: usize) -> usize {
        let position = match selection {
            Selection::Field(f) => f.position,
            Selection::FragmentSpread(f) => f.position,
            Selection::InlineFragment(f) => f.position,
        };
        if depth > self.max_depth {
            self.report(position);
            return 0;
        }

        match selection {
            Selection::Field(field) => {
                if field.name.starts_with("__") || field.selection_set.items.is_empty() {
                    0
                } else {
                    1 + self.selection_set(&field.selection_set, depth + 1)
                }
            }
            Selection::InlineFragment(fragment) => {
                self.selection_set(&fragment.selection_set, depth)
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.fragment_name;
                let Some(fragment) = self.fragments.get(name).copied() else {
                    return 0;
                };
                if !self.visiting.insert(name) {
                    return 0;
                }
                let out = self.selection_set(&fragment.selection_set, depth);
                self.visiting.remove(name);
                out
            }
        }
    }

    fn report(&mut self, position: Pos) {
        self.errors.push(DepthLimitError {
            message: format!(
                "'{}' exceeds maximum operation depth of {}",
                self.operation_name,
                self.max_depth,
            ),
            locations: vec![position.into()],
        });
    }
}
