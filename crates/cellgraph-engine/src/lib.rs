//! cellgraph_engine - Formula language, dependency graph and cell types.

pub mod engine;
