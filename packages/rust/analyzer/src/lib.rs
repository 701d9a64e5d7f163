//! Static analysis of workflow definitions for flowindex.
//!
//! - [`graph`] parses definition bytes into a [`WorkflowGraph`]
//! - [`GraphAnalyzer`] derives the persistent [`WorkflowRecord`](flowindex_shared::WorkflowRecord)
//! - [`ServiceCatalog`] maps node types to integration display names
//! - [`steps`] and [`diagram`] build the on-demand detail views
//! - [`CategoryMapper`] groups integrations into domain categories

pub mod analyzer;
pub mod category;
pub mod describe;
pub mod diagram;
pub mod graph;
pub mod services;
pub mod steps;

pub use analyzer::{GraphAnalyzer, classify, classify_trigger};
pub use category::{CategoryDefinition, CategoryMapper, UNCATEGORIZED, load_definitions};
pub use describe::synthesize_description;
pub use diagram::{EMPTY_DIAGRAM, NodeCategory};
pub use graph::{Node, NodeOutputs, WorkflowDocument, WorkflowGraph, parse_document};
pub use services::{ExclusionKind, ServiceCatalog};
