//! Typed shader node graph: graph structure, socket types, the node kind interface and the
//! parsers backing function-derived kinds.

pub mod graph;
pub mod kind;
pub mod parsing;
pub mod sockets;
pub mod template;
