//! UCCA trees, delinearization and MRP serialization.

pub mod mrp;
pub mod tree;

pub use mrp::{write_mrp, MrpConverter, MrpGraph, UccaMrpConverter};
pub use tree::{
    BracketDelinearizer, Delinearizer, ParseError, Restored, UccaTree, TOY_GRAPH, TOY_SENT,
};
