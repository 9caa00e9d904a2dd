//! Node kind interface: a kind declares its sockets once and evaluates resolved input [Values](Value)
//! into output values, writing shader code into the [Writer] as a side effect.

use super::{
    graph::{Name, NodeId},
    sockets::{SocketType, Sockets, Value},
};

use crate::writer::Writer;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Debug,
};

/// Resolved input values, keyed by input socket name. Unconnected sockets are absent.
pub type Inputs = BTreeMap<Name, Value>;
/// Produced output values, keyed by output socket name.
pub type Outputs = BTreeMap<Name, Value>;

#[derive(Debug, PartialEq, thiserror::Error)]
/// Reasons a node contributes nothing to the current pass. Skipping is expected while a graph
/// is being wired and propagates downstream through absent values.
pub enum Skip {
    #[error("Missing {} on {0:?} side", .1.to_string())]
    /// Missing socket or value.
    Missing(Side, Name),

    #[error("Missing {} on {0:?} side", .1.iter().map(|v| v.to_string()).collect::<Vec<String>>().join(", "))]
    /// Missing many sockets or values.
    MissingMany(Side, Vec<Name>),

    #[error("Mismatched type between {} ({:?}) and {} ({:?})",
        {let (name, _) = .0; name.to_string()}, {let (_, ty) = .0; ty},
        {let (name, _) = .1; name.to_string()}, {let (_, ty) = .1; ty})]
    /// Operand types cannot be combined.
    MismatchedTypes((Name, SocketType), (Name, SocketType)),

    #[error("Invalid type {got:?} for {}, expected {expected:?}", .name.to_string())]
    /// A value has the wrong [SocketType] for the socket it reached.
    InvalidType {
        /// [Name] of the socket.
        name: Name,
        /// Type of the received value.
        got: SocketType,
        /// Type the socket requires.
        expected: SocketType,
    },

    #[error("Static data `{0}` is unset or malformed")]
    /// Control value has not been set yet.
    Unset(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Socket side.
pub enum Side {
    #[allow(missing_docs)]
    Input,
    #[allow(missing_docs)]
    Output,
}

/// Read-only view of the node being evaluated.
#[derive(Clone, Debug)]
pub struct NodeContext<'a> {
    /// Id of the node.
    pub id: &'a NodeId,
    /// Static data set by the node's controls.
    pub data: &'a BTreeMap<String, String>,
    /// Output sockets with at least one downstream connection.
    pub connected: &'a BTreeSet<Name>,
}

impl NodeContext<'_> {
    /// Pass-unique variable name for a node of the given kind: `<kind>_<id>`, lowercased.
    pub fn variable(&self, kind: &str) -> String {
        format!("{}_{}", kind.to_lowercase(), self.id.sanitized())
    }

    /// Static data value, treated as unset when empty.
    pub fn data(&self, key: &str) -> Result<&str, Skip> {
        self.data
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| Skip::Unset(key.to_owned()))
    }

    /// Check whether an output socket feeds anything.
    pub fn is_connected(&self, output: &str) -> bool {
        self.connected.contains(&Name::from(output))
    }
}

/// A polymorphic unit of the catalogue.
pub trait NodeKind: dyn_clone::DynClone + Debug + Send + Sync {
    /// Catalogue name, also used as the variable name prefix.
    fn name(&self) -> &str;

    /// Register input/output sockets and controls.
    fn declare_sockets(&self, sockets: &mut Sockets);

    /// Produce output values from resolved inputs, writing code into the [Writer].
    ///
    /// Returning a [Skip] means the node contributes nothing this pass: implementations check
    /// every input before touching the writer.
    fn evaluate(
        &self,
        node: &NodeContext,
        inputs: &Inputs,
        writer: &mut Writer,
    ) -> Result<Outputs, Skip>;

    /// Collected socket declarations.
    fn sockets(&self) -> Sockets {
        let mut sockets = Sockets::default();
        self.declare_sockets(&mut sockets);
        sockets
    }

    /// Graph sinks have no output socket.
    fn is_sink(&self) -> bool {
        self.sockets().outputs.is_empty()
    }
}

dyn_clone::clone_trait_object!(NodeKind);

/// Check that a value has the expected type.
pub fn expect_type(name: &str, value: &Value, expected: SocketType) -> Result<(), Skip> {
    if value.r#type() == expected {
        Ok(())
    } else {
        Err(Skip::InvalidType {
            name: name.into(),
            got: value.r#type(),
            expected,
        })
    }
}

#[macro_export]
/// [get](std::collections::BTreeMap::get)s a resolved input, returning a [Skip] from the
/// enclosing function when it is absent or, if a type is given, of the wrong type.
///
/// # Example
///
/// ```
/// use shadegraph::{get_value, shader::{kind::{Inputs, Skip}, sockets::{SocketType, Value}}};
///
/// let mut inputs = Inputs::new();
/// inputs.insert("uv".into(), Value::new("vUv", SocketType::Vec2));
///
/// (|| {
///     get_value!(inputs . "uv" : Vec2 > uv);
///     assert_eq!(uv.variable(), "vUv");
///     Ok::<(), Skip>(())
/// })().unwrap();
///
/// let result: Result<(), Skip> = (|| {
///     get_value!(inputs . "uv" : Vec3 > _uv);
///     Ok(())
/// })();
/// assert!(matches!(result, Err(Skip::InvalidType { .. })));
/// ```
macro_rules! get_value {
    ($hashmap:ident . $field:literal > $name:ident) => {
        let $name = $hashmap.get(&$crate::shader::graph::Name::from($field)).ok_or_else(|| {
            $crate::shader::kind::Skip::Missing(
                $crate::shader::kind::Side::Input,
                $field.into(),
            )
        })?;
    };

    ($hashmap:ident . $field:literal : $type:ident > $name:ident) => {
        $crate::shader::kind::get_value!($hashmap . $field > $name);
        $crate::shader::kind::expect_type(
            $field,
            $name,
            $crate::shader::sockets::SocketType::$type,
        )?;
    };
}

pub use get_value;
