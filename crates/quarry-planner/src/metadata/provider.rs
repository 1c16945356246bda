//! Metadata providers and the handler dispatch table
//!
//! A provider answers named metadata queries (unique keys, column uniqueness,
//! ...) about a single operator. [`HandlerTable`] is the standard provider:
//! handlers are registered per query name, operator variant tag and argument
//! signature, and a request is routed to the handler registered for the most
//! specific tag in the operator's [`RelKind::lineage`].

use crate::metadata::query::RelMetadataQuery;
use quarry_common::{QuarryError, Result};
use quarry_sql::{ColumnMask, LogicalPlan, RelKind};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Query name for [`RelMetadataQuery::get_unique_keys`]
pub const UNIQUE_KEYS: &str = "unique_keys";

/// Query name for [`RelMetadataQuery::are_columns_unique`]
pub const COLUMNS_UNIQUE: &str = "columns_unique";

/// Type of an argument passed to a metadata handler after the operator itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    Bool,
    ColumnMask,
}

/// Argument passed to a metadata handler after the operator itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataArg {
    Bool(bool),
    ColumnMask(ColumnMask),
}

impl MetadataArg {
    pub fn arg_type(&self) -> ArgType {
        match self {
            MetadataArg::Bool(_) => ArgType::Bool,
            MetadataArg::ColumnMask(_) => ArgType::ColumnMask,
        }
    }
}

/// Value produced by a metadata handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    ColumnMasks(HashSet<ColumnMask>),
    Bool(bool),
}

/// Handler for one (query, variant, signature) combination.
///
/// `Ok(None)` means no information; errors are rule failures and reach the
/// caller unchanged.
pub type MetadataHandler = Arc<
    dyn Fn(&RelMetadataQuery<'_>, &LogicalPlan, &[MetadataArg]) -> Result<Option<MetadataValue>>
        + Send
        + Sync,
>;

/// Source of metadata about operators
pub trait RelMetadataProvider: Send + Sync {
    /// Answers `query` for `rel`. `mq` is the facade handlers use to ask
    /// about other operators (usually the children of `rel`).
    fn relational_metadata(
        &self,
        mq: &RelMetadataQuery<'_>,
        rel: &LogicalPlan,
        query: &str,
        args: &[MetadataArg],
    ) -> Result<Option<MetadataValue>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HandlerKey {
    query: String,
    kind: RelKind,
    signature: Vec<ArgType>,
}

/// Collects handlers before they are frozen into a [`HandlerTable`].
pub struct HandlerTableBuilder {
    name: String,
    parameter_types: HashMap<String, Vec<ArgType>>,
    handlers: HashMap<HandlerKey, MetadataHandler>,
}

impl HandlerTableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter_types: HashMap::new(),
            handlers: HashMap::new(),
        }
    }

    /// Declares the argument types (beyond the operator) that `query` is
    /// dispatched with. Queries without a declaration take no arguments.
    pub fn map_parameter_types(mut self, query: &str, parameter_types: Vec<ArgType>) -> Self {
        self.parameter_types.insert(query.to_string(), parameter_types);
        self
    }

    /// Registers `handler` for `query` on operators of tag `kind` (and, unless
    /// a more specific handler exists, on every descendant tag).
    ///
    /// Registering a second handler for the same query, tag and signature is
    /// an error: there would be no way to pick between them.
    pub fn register<F>(
        mut self,
        query: &str,
        kind: RelKind,
        signature: &[ArgType],
        handler: F,
    ) -> Result<Self>
    where
        F: Fn(&RelMetadataQuery<'_>, &LogicalPlan, &[MetadataArg]) -> Result<Option<MetadataValue>>
            + Send
            + Sync
            + 'static,
    {
        let key = HandlerKey {
            query: query.to_string(),
            kind,
            signature: signature.to_vec(),
        };
        if self.handlers.contains_key(&key) {
            return Err(QuarryError::AmbiguousHandler {
                query: key.query,
                kind: kind.to_string(),
                signature: format!("{:?}", key.signature),
            });
        }
        self.handlers.insert(key, Arc::new(handler));
        Ok(self)
    }

    pub fn build(self) -> HandlerTable {
        tracing::debug!(
            "Built metadata handler table '{}' with {} handlers",
            self.name,
            self.handlers.len()
        );
        HandlerTable {
            name: self.name,
            parameter_types: self.parameter_types,
            handlers: self.handlers,
        }
    }
}

/// Immutable table of metadata handlers; safe to share across threads.
pub struct HandlerTable {
    name: String,
    parameter_types: HashMap<String, Vec<ArgType>>,
    handlers: HashMap<HandlerKey, MetadataHandler>,
}

impl HandlerTable {
    pub fn builder(name: impl Into<String>) -> HandlerTableBuilder {
        HandlerTableBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared argument types of `query`, empty when undeclared.
    pub fn parameter_types(&self, query: &str) -> &[ArgType] {
        self.parameter_types
            .get(query)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Finds the handler for `query` registered against the most specific tag
    /// in the lineage of `kind`, together with that tag.
    pub fn resolve(&self, kind: RelKind, query: &str) -> Option<(RelKind, &MetadataHandler)> {
        let signature = self.parameter_types(query).to_vec();
        let mut key = HandlerKey {
            query: query.to_string(),
            kind,
            signature,
        };
        for candidate in kind.lineage() {
            key.kind = candidate;
            if let Some(handler) = self.handlers.get(&key) {
                return Some((candidate, handler));
            }
        }
        None
    }
}

impl RelMetadataProvider for HandlerTable {
    fn relational_metadata(
        &self,
        mq: &RelMetadataQuery<'_>,
        rel: &LogicalPlan,
        query: &str,
        args: &[MetadataArg],
    ) -> Result<Option<MetadataValue>> {
        let kind = rel.kind();
        let Some((resolved, handler)) = self.resolve(kind, query) else {
            tracing::trace!("{}: no handler for {} on {}", self.name, query, kind);
            return Ok(None);
        };

        let expected = self.parameter_types(query);
        let matches = expected.len() == args.len()
            && expected.iter().zip(args).all(|(t, a)| *t == a.arg_type());
        if !matches {
            return Err(QuarryError::Metadata(format!(
                "{}: query '{}' expects arguments {:?}, got {:?}",
                self.name, query, expected, args
            )));
        }

        tracing::trace!(
            "{}: dispatching {} on {} to handler for {}",
            self.name,
            query,
            kind,
            resolved
        );
        handler(mq, rel, args)
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .handlers
            .keys()
            .map(|k| format!("{}:{}{:?}", k.query, k.kind, k.signature))
            .collect();
        keys.sort();
        f.debug_struct("HandlerTable")
            .field("name", &self.name)
            .field("handlers", &keys)
            .finish()
    }
}

/// Consults a list of providers in order; the first answer other than
/// "no information" wins.
#[derive(Default)]
pub struct ChainedProvider {
    providers: Vec<Arc<dyn RelMetadataProvider>>,
}

impl ChainedProvider {
    pub fn new(providers: Vec<Arc<dyn RelMetadataProvider>>) -> Self {
        Self { providers }
    }

    /// Adds a provider at the lowest priority.
    pub fn push(&mut self, provider: Arc<dyn RelMetadataProvider>) {
        self.providers.push(provider);
    }
}

impl RelMetadataProvider for ChainedProvider {
    fn relational_metadata(
        &self,
        mq: &RelMetadataQuery<'_>,
        rel: &LogicalPlan,
        query: &str,
        args: &[MetadataArg],
    ) -> Result<Option<MetadataValue>> {
        for provider in &self.providers {
            if let Some(value) = provider.relational_metadata(mq, rel, query, args)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::{DataType, Field, Schema};
    use quarry_sql::{Expr, JoinType};

    fn scan() -> LogicalPlan {
        LogicalPlan::Scan {
            table_name: "t".to_string(),
            schema: Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)])),
            unique_keys: vec![],
        }
    }

    fn filter(input: LogicalPlan) -> LogicalPlan {
        LogicalPlan::Filter {
            input: Box::new(input),
            predicate: Expr::InputRef(0),
        }
    }

    fn constant(value: bool) -> impl Fn(&RelMetadataQuery<'_>, &LogicalPlan, &[MetadataArg]) -> Result<Option<MetadataValue>>
           + Send
           + Sync
           + 'static {
        move |_, _, _| Ok(Some(MetadataValue::Bool(value)))
    }

    #[test]
    fn test_most_specific_handler_wins() {
        let table = HandlerTable::builder("test")
            .register("q", RelKind::Rel, &[], constant(false))
            .unwrap()
            .register("q", RelKind::Filter, &[], constant(true))
            .unwrap()
            .build();
        let mq = RelMetadataQuery::new(&table);

        assert_eq!(
            mq.metadata(&filter(scan()), "q", &[]).unwrap(),
            Some(MetadataValue::Bool(true))
        );
        assert_eq!(
            mq.metadata(&scan(), "q", &[]).unwrap(),
            Some(MetadataValue::Bool(false))
        );
    }

    #[test]
    fn test_semi_join_falls_back_to_join_handler() {
        let table = HandlerTable::builder("test")
            .register("q", RelKind::Join, &[], constant(true))
            .unwrap()
            .build();
        let semi = LogicalPlan::SemiJoin {
            left: Box::new(scan()),
            right: Box::new(scan()),
            condition: Expr::InputRef(0),
        };
        let (resolved, _) = table.resolve(semi.kind(), "q").unwrap();
        assert_eq!(resolved, RelKind::Join);
        assert!(table.resolve(RelKind::Filter, "q").is_none());

        let join = LogicalPlan::Join {
            left: Box::new(scan()),
            right: Box::new(scan()),
            join_type: JoinType::Inner,
            condition: Expr::InputRef(0),
            schema: scan().schema(),
        };
        assert!(table.resolve(join.kind(), "q").is_some());
    }

    #[test]
    fn test_no_handler_is_no_information() {
        let table = HandlerTable::builder("empty").build();
        let mq = RelMetadataQuery::new(&table);
        assert_eq!(mq.metadata(&scan(), "q", &[]).unwrap(), None);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let err = HandlerTable::builder("test")
            .register("q", RelKind::Sort, &[ArgType::Bool], constant(true))
            .unwrap()
            .register("q", RelKind::Sort, &[ArgType::Bool], constant(false))
            .err()
            .unwrap();
        assert!(matches!(err, QuarryError::AmbiguousHandler { .. }));
    }

    #[test]
    fn test_overloads_resolved_by_declared_signature() {
        let table = HandlerTable::builder("test")
            .map_parameter_types("q", vec![ArgType::Bool])
            .register("q", RelKind::Scan, &[], constant(false))
            .unwrap()
            .register("q", RelKind::Scan, &[ArgType::Bool], constant(true))
            .unwrap()
            .build();
        let mq = RelMetadataQuery::new(&table);

        assert_eq!(
            mq.metadata(&scan(), "q", &[MetadataArg::Bool(true)]).unwrap(),
            Some(MetadataValue::Bool(true))
        );
        let err = mq
            .metadata(&scan(), "q", &[MetadataArg::ColumnMask(ColumnMask::new())])
            .unwrap_err();
        assert!(matches!(err, QuarryError::Metadata(_)));
    }

    #[test]
    fn test_handler_errors_propagate() {
        let table = HandlerTable::builder("test")
            .register("q", RelKind::Rel, &[], |_: &RelMetadataQuery<'_>, _: &LogicalPlan, _: &[MetadataArg]| {
                Err(QuarryError::Rule("boom".to_string()))
            })
            .unwrap()
            .build();
        let mq = RelMetadataQuery::new(&table);
        let err = mq.metadata(&scan(), "q", &[]).unwrap_err();
        assert!(matches!(err, QuarryError::Rule(msg) if msg == "boom"));
    }

    #[test]
    fn test_chain_skips_providers_without_information() {
        let silent = HandlerTable::builder("silent")
            .register("q", RelKind::Rel, &[], |_: &RelMetadataQuery<'_>, _: &LogicalPlan, _: &[MetadataArg]| Ok(None))
            .unwrap()
            .build();
        let answering = HandlerTable::builder("answering")
            .register("q", RelKind::Scan, &[], constant(true))
            .unwrap()
            .build();
        let chain = ChainedProvider::new(vec![Arc::new(silent), Arc::new(answering)]);
        let mq = RelMetadataQuery::new(&chain);

        assert_eq!(
            mq.metadata(&scan(), "q", &[]).unwrap(),
            Some(MetadataValue::Bool(true))
        );
        assert_eq!(mq.metadata(&filter(scan()), "q", &[]).unwrap(), None);
    }
}
