#![warn(missing_docs)]

//! Library used by the shadegraph software. Compiles a graph of typed shading nodes into a
//! vertex/fragment GLSL program pair plus the uniform bindings they require.

pub mod config;
pub mod engine;
pub mod shader;
pub mod shaderlib;
pub mod writer;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        config::Config,
        engine::{compile, Engine, Error, PassStatus},
        shader::{
            graph::{Graph, Name, Node, NodeId, SocketRef, Unvalidated, Validated},
            kind::{Inputs, NodeContext, NodeKind, Outputs, Skip},
            sockets::{SocketType, Value},
        },
        shaderlib::Catalogue,
        writer::{CompiledShader, Feature, UniformBinding, UniformValue, Writer},
    };
}
