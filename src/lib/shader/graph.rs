//! Flat [Graph] data structure: node instances plus directed links between their sockets.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Debug,
    marker::PhantomData,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
/// Wrapper around [String].
pub struct NodeId(String);
impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
impl NodeId {
    /// Identifier-safe encoding of the id, usable inside GLSL variable names.
    ///
    /// ASCII alphanumerics are kept, `_` becomes `_u` and every other byte becomes `_xHH`, so
    /// distinct ids never share an encoding. An underscore in the result is always followed by
    /// `u` or `x`: suffixes such as `_map` appended to a variable cannot collide with another
    /// node's variable.
    pub fn sanitized(&self) -> String {
        let mut encoded = String::with_capacity(self.0.len());
        for byte in self.0.bytes() {
            match byte {
                b'_' => encoded.push_str("_u"),
                byte if byte.is_ascii_alphanumeric() => encoded.push(char::from(byte)),
                byte => encoded.push_str(&format!("_x{byte:02x}")),
            }
        }
        encoded
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
/// Wrapper around [String].
pub struct Name(String);
impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
impl From<String> for Name {
    fn from(value: String) -> Self {
        Self(value)
    }
}
impl From<&Name> for String {
    fn from(name: &Name) -> Self {
        name.0.clone()
    }
}
impl Name {
    #[allow(missing_docs)]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[display(fmt = "{}.{}", node, socket)]
/// Reference to a [Node] socket.
pub struct SocketRef {
    /// Node owning the socket.
    pub node: NodeId,
    /// Socket name.
    pub socket: Name,
}

impl SocketRef {
    #[allow(missing_docs)]
    pub fn new(node: impl Into<NodeId>, socket: impl Into<Name>) -> Self {
        Self {
            node: node.into(),
            socket: socket.into(),
        }
    }
}

#[macro_export]
/// Shorthand to reference node sockets.
/// # Example
/// ```
/// use shadegraph::{sref, shader::graph::{SocketRef, Name, NodeId}};
///
/// let socket = sref!(node "geometry" "normal");
/// assert_eq!(socket, SocketRef { node: NodeId::from("geometry"), socket: Name::from("normal") });
///
/// let id = String::from("2");
/// assert_eq!(sref!(node id.as_str() => "c"), SocketRef::new("2", "c"));
/// ```
macro_rules! sref {
    (node $node:literal $field:literal) => {
        $crate::shader::graph::SocketRef::new($node, $field)
    };

    (node $node:expr => $field:expr) => {
        $crate::shader::graph::SocketRef::new($node, $field)
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Directed connection from an output socket to an input socket.
pub struct Connection {
    #[allow(missing_docs)]
    pub from: SocketRef,
    #[allow(missing_docs)]
    pub to: SocketRef,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Node instance: the name of its kind plus static data set by the node's controls.
pub struct Node {
    /// Name of the node kind in the catalogue.
    pub kind: Name,
    /// Control values, e.g. a constant's literal text or a selected texture key.
    pub data: BTreeMap<String, String>,
}

impl Node {
    /// Create a node of the given kind with no static data.
    pub fn new(kind: impl Into<Name>) -> Self {
        Self {
            kind: kind.into(),
            data: BTreeMap::new(),
        }
    }

    /// Builder-style static data setter.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.insert(key.to_owned(), value.into());
        self
    }
}

#[macro_export]
/// Instantiate a [Node] concisely.
/// # Example
/// ```
/// use shadegraph::node;
///
/// let node = node!(ConstantVector3 { "value": "1,2,3" });
/// assert_eq!(node.kind.as_str(), "ConstantVector3");
/// assert_eq!(node.data.get("value").map(String::as_str), Some("1,2,3"));
///
/// let sink = node!(FragColor);
/// assert!(sink.data.is_empty());
/// ```
macro_rules! node {
    ($kind:ident $({ $($key:literal : $value:expr),* $(,)? })?) => {{
        #[allow(unused_mut)]
        let mut node = $crate::shader::graph::Node::new(stringify!($kind));
        $($(
            node.data.insert($key.to_string(), ($value).to_string());
        )*)?
        node
    }};
}

macro_rules! states {
    ($($(#[$attr:meta])* $state:ident),+ $(,)?) => {
        $(
            #[derive(Clone, Debug, Default, PartialEq)]
            $(#[$attr])*
            pub struct $state;
        )+
    };
}
states! {
    /// Graph being edited, no structural guarantee.
    Unvalidated,
    /// Checked for cycles, dangling links and multiple producers; carries an evaluation order.
    Validated,
}

#[derive(Debug, PartialEq, thiserror::Error)]
/// Structural [Graph] fault.
pub enum Error {
    #[error("Detected a cycle walking upstream through {during:?}, reaching node `{detected}` again")]
    /// Detected a cycle on the node with the given [NodeId].
    Cycle {
        /// Nodes walked through, following producers upstream.
        during: Vec<NodeId>,
        /// Node detected as already visited in the current path.
        detected: NodeId,
    },

    #[error("Input `{input}` is fed by more than one output: {producers:?}")]
    /// More than one output socket is wired into a single input socket.
    MultipleProducers {
        #[allow(missing_docs)]
        input: SocketRef,
        #[allow(missing_docs)]
        producers: Vec<SocketRef>,
    },

    #[error("Link `{referenced_by}` references missing node `{node}`")]
    /// A link endpoint names a node that is not part of the graph.
    MissingNode {
        #[allow(missing_docs)]
        node: NodeId,
        #[allow(missing_docs)]
        referenced_by: SocketRef,
    },

    #[error("Node `{0}` already exists")]
    /// Tried to add a node under an id already in use.
    DuplicateNode(NodeId),
}

#[derive(Clone, Debug, PartialEq)]
/// Flat graph data structure state machine implementation.
pub struct Graph<State> {
    /// Mapping of [NodeIds](NodeId) to [Nodes](Node).
    pub nodes: BTreeMap<NodeId, Node>,
    /// Mapping of output sockets to the ordered input sockets they feed.
    pub links: BTreeMap<SocketRef, Vec<SocketRef>>,

    order: Vec<NodeId>,
    producers: BTreeMap<SocketRef, SocketRef>,

    /// Current state
    pub state: PhantomData<State>,
}

impl<State> Default for Graph<State> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            order: Vec::new(),
            producers: BTreeMap::new(),
            state: PhantomData,
        }
    }
}

#[macro_export]
/// Instantiate a [Graph] concisely.
/// # Example
/// ```
/// use shadegraph::{graph, node, sref};
///
/// let graph = graph! {
///     nodes:
///         "1": node!(ConstantVector3 { "value": "1,0,0" }),
///         "2": node!(FragColor);
///     links:
///         sref!(node "1" "value") => sref!(node "2" "color"),
/// };
///
/// assert_eq!(graph.nodes.len(), 2);
/// assert!(graph.validate().is_ok());
/// ```
macro_rules! graph {
    {
        nodes: $($id:literal : $node:expr),* $(,)?
        $(; links: $($from:expr => $to:expr),* $(,)?)?
    } => {{
        #[allow(unused_mut)]
        let mut graph = $crate::shader::graph::Graph::<$crate::shader::graph::Unvalidated>::new();
        $(
            graph.nodes.insert($crate::shader::graph::NodeId::from($id), $node);
        )*
        $($(
            graph.link($from, $to);
        )*)?
        graph
    }};
}

impl<State> Graph<State> {
    /// Outputs of a node that feed at least one input.
    pub fn connected_outputs(&self, node: &NodeId) -> BTreeSet<Name> {
        self.links
            .iter()
            .filter(|(from, to)| &from.node == node && !to.is_empty())
            .map(|(from, _to)| from.socket.clone())
            .collect()
    }

    /// Iterate over every connection.
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.links.iter().flat_map(|(from, to)| {
            to.iter().map(|to| Connection {
                from: from.clone(),
                to: to.clone(),
            })
        })
    }
}

impl Graph<Unvalidated> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an editor snapshot.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = (NodeId, Node)>,
        connections: impl IntoIterator<Item = Connection>,
    ) -> Result<Self, Error> {
        let mut graph = Self::new();

        for (id, node) in nodes {
            graph.add_node(id, node)?;
        }

        for Connection { from, to } in connections {
            graph.link(from, to);
        }

        Ok(graph)
    }

    /// Add a node under a new id.
    pub fn add_node(&mut self, id: impl Into<NodeId>, node: Node) -> Result<&mut Self, Error> {
        let id = id.into();

        if self.nodes.contains_key(&id) {
            return Err(Error::DuplicateNode(id));
        }

        self.nodes.insert(id, node);
        Ok(self)
    }

    /// Remove a node and every link touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;

        self.links.retain(|from, to| {
            to.retain(|to| &to.node != id);
            &from.node != id && !to.is_empty()
        });

        Some(node)
    }

    /// Connect an output socket to an input socket. Fan-out is allowed; fan-in is rejected
    /// by [validate](Self::validate).
    pub fn link(&mut self, from: SocketRef, to: SocketRef) -> &mut Self {
        let targets = self.links.entry(from).or_default();

        if !targets.contains(&to) {
            targets.push(to);
        }

        self
    }

    /// Remove a connection, returning whether it existed.
    pub fn unlink(&mut self, from: &SocketRef, to: &SocketRef) -> bool {
        let Some(targets) = self.links.get_mut(from) else {
            return false;
        };

        let before = targets.len();
        targets.retain(|target| target != to);
        let removed = targets.len() != before;

        if targets.is_empty() {
            self.links.remove(from);
        }

        removed
    }

    /// Check the [unvalidated](Unvalidated) [Graph] for dangling links, inputs with multiple
    /// producers and cycles, computing the evaluation order on success.
    ///
    /// Nodes become eligible once all their producers have been ordered; ties are broken by
    /// [NodeId] so the order is stable for a given graph.
    pub fn validate(self) -> Result<Graph<Validated>, Error> {
        let mut producers: BTreeMap<SocketRef, SocketRef> = BTreeMap::new();

        for Connection { from, to } in self.connections() {
            for endpoint in [&from, &to] {
                if !self.nodes.contains_key(&endpoint.node) {
                    return Err(Error::MissingNode {
                        node: endpoint.node.clone(),
                        referenced_by: endpoint.clone(),
                    });
                }
            }

            if let Some(previous) = producers.get(&to) {
                return Err(Error::MultipleProducers {
                    producers: vec![previous.clone(), from],
                    input: to,
                });
            }

            producers.insert(to, from);
        }

        let order = evaluation_order(&self.nodes, &producers)?;

        let Self { nodes, links, .. } = self;

        Ok(Graph {
            nodes,
            links,
            order,
            producers,
            state: PhantomData::<Validated>,
        })
    }
}

/// Topological order of the nodes. Nodes become eligible once all their producers have been
/// ordered; ties are broken by [NodeId].
fn evaluation_order(
    nodes: &BTreeMap<NodeId, Node>,
    producers: &BTreeMap<SocketRef, SocketRef>,
) -> Result<Vec<NodeId>, Error> {
    // Upstream nodes of each node.
    let mut upstream: BTreeMap<&NodeId, BTreeSet<&NodeId>> =
        nodes.keys().map(|id| (id, BTreeSet::new())).collect();
    let mut downstream: BTreeMap<&NodeId, BTreeSet<&NodeId>> =
        nodes.keys().map(|id| (id, BTreeSet::new())).collect();

    for (to, from) in producers.iter() {
        upstream.entry(&to.node).or_default().insert(&from.node);
        downstream.entry(&from.node).or_default().insert(&to.node);
    }

    let mut pending: BTreeMap<&NodeId, usize> = upstream
        .iter()
        .map(|(&id, ups)| (id, ups.len()))
        .collect();
    let mut ready: BTreeSet<&NodeId> = pending
        .iter()
        .filter(|(_id, &count)| count == 0)
        .map(|(&id, _count)| id)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(current) = ready.pop_first() {
        pending.remove(current);
        order.push(current.clone());

        for &next in downstream.get(current).into_iter().flatten() {
            if let Some(count) = pending.get_mut(next) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(next);
                }
            }
        }
    }

    if let Some((&start, _count)) = pending.iter().next() {
        // Every leftover node has a leftover producer, so walking upstream must loop.
        let mut during: Vec<NodeId> = Vec::new();
        let mut current = start;

        loop {
            if during.contains(current) {
                return Err(Error::Cycle {
                    during,
                    detected: current.clone(),
                });
            }

            during.push(current.clone());

            let Some(&next) = upstream
                .get(current)
                .into_iter()
                .flatten()
                .find(|id| pending.contains_key(*id))
            else {
                unreachable!("leftover node `{current}` has no leftover producer")
            };

            current = next;
        }
    }

    Ok(order)
}

impl Graph<Validated> {
    /// Node ids in evaluation order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Output socket feeding the given input socket, if any.
    pub fn producer(&self, input: &SocketRef) -> Option<&SocketRef> {
        self.producers.get(input)
    }

    /// Go back to editing.
    pub fn edit(self) -> Graph<Unvalidated> {
        Graph {
            nodes: self.nodes,
            links: self.links,
            order: Vec::new(),
            producers: BTreeMap::new(),
            state: PhantomData,
        }
    }
}

// Export macros
pub use {graph, node, sref};
