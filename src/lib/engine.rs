//! Evaluation engine driving compilation passes over validated graphs.
//!
//! A pass walks the graph's evaluation order one node at a time, resolving each node's inputs
//! from the values produced upstream during the same pass. Starting a pass aborts the one in
//! flight, discarding its writer.

use crate::{
    config::Config,
    shader::{
        graph::{self, Graph, Name, NodeId, SocketRef, Validated},
        kind::{Inputs, NodeContext, NodeKind, Side},
        parsing,
        sockets::Value,
    },
    shaderlib::Catalogue,
    writer::{CompiledShader, Writer},
};

use std::collections::BTreeMap;

#[derive(Debug, PartialEq, thiserror::Error)]
/// Faults preventing a pass from running.
pub enum Error {
    #[error(transparent)]
    #[allow(missing_docs)]
    Graph(#[from] graph::Error),

    #[error(transparent)]
    #[allow(missing_docs)]
    Parsing(#[from] parsing::Error),

    #[error("Node `{node}` is of unknown kind `{kind}`")]
    /// A node names a kind the catalogue does not hold.
    UnknownKind {
        #[allow(missing_docs)]
        node: NodeId,
        #[allow(missing_docs)]
        kind: Name,
    },

    #[error("Node `{node}` declares no {side:?} socket `{socket}`")]
    /// A link endpoint names a socket its node's kind does not declare.
    UnknownSocket {
        #[allow(missing_docs)]
        node: NodeId,
        #[allow(missing_docs)]
        side: Side,
        #[allow(missing_docs)]
        socket: Name,
    },

    #[error("No pass is running")]
    /// Tried to drive a pass that was never started or has been aborted.
    NoActivePass,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Lifecycle of the latest pass.
pub enum PassStatus {
    #[default]
    /// No pass was ever started.
    Idle,
    /// Nodes remain to be evaluated.
    Running,
    /// Every node has been evaluated.
    Completed,
    /// Superseded or cancelled before completion.
    Aborted,
}

#[derive(Debug)]
struct Pass {
    id: u64,
    graph: Graph<Validated>,
    cursor: usize,
    writer: Writer,
    values: BTreeMap<SocketRef, Value>,
}

#[derive(Debug)]
/// Graph to shader compiler. Runs at most one pass at a time.
pub struct Engine {
    catalogue: Catalogue,
    config: Config,
    pass: Option<Pass>,
    status: PassStatus,
    passes: u64,
}

impl Engine {
    /// Create an engine using the standard catalogue.
    pub fn new(config: Config) -> Result<Self, Error> {
        Ok(Self::with_catalogue(Catalogue::shared()?, config))
    }

    /// Create an engine resolving node kinds from the given catalogue.
    pub fn with_catalogue(catalogue: Catalogue, config: Config) -> Self {
        Self {
            catalogue,
            config,
            pass: None,
            status: PassStatus::Idle,
            passes: 0,
        }
    }

    #[allow(missing_docs)]
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[allow(missing_docs)]
    pub fn status(&self) -> PassStatus {
        self.status
    }

    /// Output values produced so far by the current or latest completed pass.
    pub fn values(&self) -> Option<&BTreeMap<SocketRef, Value>> {
        match self.status {
            PassStatus::Running | PassStatus::Completed => self.pass.as_ref().map(|pass| &pass.values),
            PassStatus::Idle | PassStatus::Aborted => None,
        }
    }

    /// Begin a new pass over a graph, aborting the pass in flight.
    ///
    /// Fails if a node's kind is not in the catalogue or a link references a socket its kind
    /// does not declare.
    pub fn start(&mut self, graph: Graph<Validated>) -> Result<&mut Self, Error> {
        self.abort();
        self.check(&graph)?;

        self.passes += 1;
        log::debug!(
            "Starting pass {} over {} nodes",
            self.passes,
            graph.nodes.len()
        );

        self.pass = Some(Pass {
            id: self.passes,
            graph,
            cursor: 0,
            writer: Writer::new(self.config.clone()),
            values: BTreeMap::new(),
        });
        self.status = PassStatus::Running;

        Ok(self)
    }

    fn kind(&self, id: &NodeId, kind: &Name) -> Result<&dyn NodeKind, Error> {
        self.catalogue
            .get(kind)
            .ok_or_else(|| Error::UnknownKind {
                node: id.clone(),
                kind: kind.clone(),
            })
    }

    fn check(&self, graph: &Graph<Validated>) -> Result<(), Error> {
        let mut sinks = 0;
        let mut sockets = BTreeMap::new();

        for (id, node) in graph.nodes.iter() {
            let kind = self.kind(id, &node.kind)?;
            if kind.is_sink() {
                sinks += 1;
            }
            sockets.insert(id, kind.sockets());
        }

        for connection in graph.connections() {
            for (side, socket) in [(Side::Output, &connection.from), (Side::Input, &connection.to)] {
                let declared = sockets
                    .get(&socket.node)
                    .and_then(|sockets| sockets.get(side, &socket.socket));

                if declared.is_none() {
                    return Err(Error::UnknownSocket {
                        node: socket.node.clone(),
                        side,
                        socket: socket.socket.clone(),
                    });
                }
            }
        }

        if sinks != 1 {
            log::warn!("Graph has {sinks} sink nodes, expected exactly one");
        }

        Ok(())
    }

    /// Evaluate the next node of the running pass. Returns `false` once every node has been
    /// evaluated, completing the pass.
    pub fn step(&mut self) -> Result<bool, Error> {
        match self.status {
            PassStatus::Running => {}
            PassStatus::Completed => return Ok(false),
            PassStatus::Idle | PassStatus::Aborted => return Err(Error::NoActivePass),
        }

        let Some(pass) = self.pass.as_mut() else {
            return Err(Error::NoActivePass);
        };

        let Some(id) = pass.graph.order().get(pass.cursor).cloned() else {
            log::debug!(
                "Completed pass {} with {} statements",
                pass.id,
                pass.writer.statements().len()
            );
            self.status = PassStatus::Completed;
            return Ok(false);
        };
        pass.cursor += 1;

        let Some(node) = pass.graph.nodes.get(&id) else {
            unreachable!("evaluation order only holds graph nodes")
        };
        let kind = self
            .catalogue
            .get(&node.kind)
            .ok_or_else(|| Error::UnknownKind {
                node: id.clone(),
                kind: node.kind.clone(),
            })?;

        let inputs: Inputs = kind
            .sockets()
            .inputs
            .into_iter()
            .filter_map(|decl| {
                let producer = pass.graph.producer(&SocketRef::new(id.clone(), decl.name.clone()))?;
                let value = pass.values.get(producer)?;
                Some((decl.name, value.clone()))
            })
            .collect();

        let connected = pass.graph.connected_outputs(&id);
        let context = NodeContext {
            id: &id,
            data: &node.data,
            connected: &connected,
        };

        match kind.evaluate(&context, &inputs, &mut pass.writer) {
            Ok(outputs) => {
                log::trace!("Evaluated `{id}` ({}): {} outputs", node.kind, outputs.len());
                pass.values.extend(
                    outputs
                        .into_iter()
                        .map(|(socket, value)| (SocketRef::new(id.clone(), socket), value)),
                );
            }
            Err(skip) => log::debug!("Skipping `{id}` ({}): {skip}", node.kind),
        }

        Ok(true)
    }

    /// Evaluate the remaining nodes and assemble the programs.
    pub fn finish(&mut self) -> Result<CompiledShader, Error> {
        while self.step()? {}

        self.pass
            .as_ref()
            .map(|pass| pass.writer.finish())
            .ok_or(Error::NoActivePass)
    }

    /// Cancel the running pass, discarding its writer. Returns whether a pass was running.
    pub fn abort(&mut self) -> bool {
        if self.status != PassStatus::Running {
            return false;
        }

        if let Some(pass) = self.pass.take() {
            log::debug!(
                "Aborting pass {} after {}/{} nodes",
                pass.id,
                pass.cursor,
                pass.graph.order().len()
            );
        }
        self.status = PassStatus::Aborted;

        true
    }

    /// Run a whole pass over a graph.
    pub fn process(&mut self, graph: &Graph<Validated>) -> Result<CompiledShader, Error> {
        self.start(graph.clone())?.finish()
    }
}

/// Compile a graph with the standard catalogue and default configuration.
pub fn compile(graph: &Graph<Validated>) -> Result<CompiledShader, Error> {
    Engine::new(Config::default())?.process(graph)
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{graph, node, sref, shader::sockets::SocketType};

    fn textured() -> Graph<Validated> {
        graph! {
            nodes:
                "geometry": node!(Geometry),
                "texture": node!(Texture { "texture": "bricks" }),
                "output": node!(FragColor);
            links:
                sref!(node "geometry" "uv0") => sref!(node "texture" "uv"),
                sref!(node "texture" "rgb") => sref!(node "output" "color"),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn pass_lifecycle() {
        let mut engine = Engine::new(Config::default()).unwrap();
        assert_eq!(engine.status(), PassStatus::Idle);
        assert_eq!(engine.step(), Err(Error::NoActivePass));

        engine.start(textured()).unwrap();
        assert_eq!(engine.status(), PassStatus::Running);

        // geometry, texture, output
        assert_eq!(engine.step(), Ok(true));
        assert_eq!(engine.step(), Ok(true));
        assert_eq!(engine.step(), Ok(true));
        assert_eq!(engine.step(), Ok(false));
        assert_eq!(engine.status(), PassStatus::Completed);

        let values = engine.values().unwrap();
        assert_eq!(
            values.get(&sref!(node "texture" "rgb")),
            Some(&Value::new("texture_texture.rgb", SocketType::Vec3))
        );

        let shader = engine.finish().unwrap();
        assert!(shader
            .fragment_shader
            .contains("\tgl_FragColor = vec4(texture_texture.rgb, 1.0);\n"));
    }

    #[test]
    fn restart_aborts() {
        let mut engine = Engine::new(Config::default()).unwrap();

        engine.start(textured()).unwrap();
        engine.step().unwrap();
        engine.start(textured()).unwrap();
        assert_eq!(engine.status(), PassStatus::Running);

        let shader = engine.finish().unwrap();
        assert_eq!(shader.fragment_shader.matches("texture2D(").count(), 1);

        assert!(!engine.abort());
        engine.start(textured()).unwrap();
        assert!(engine.abort());
        assert_eq!(engine.status(), PassStatus::Aborted);
        assert!(engine.values().is_none());
        assert_eq!(engine.finish(), Err(Error::NoActivePass));
    }

    #[test]
    fn process_is_repeatable() {
        let graph = textured();
        let mut engine = Engine::new(Config::default()).unwrap();

        let first = engine.process(&graph).unwrap();
        let second = engine.process(&graph).unwrap();

        assert_eq!(first, second);
        assert_eq!(compile(&graph).unwrap(), first);
    }

    #[test]
    fn unknown_kind() {
        let graph = graph! { nodes: "1": node!(Teapot) }.validate().unwrap();

        assert_eq!(
            compile(&graph).unwrap_err(),
            Error::UnknownKind {
                node: "1".into(),
                kind: "Teapot".into()
            }
        );
    }

    #[test]
    fn unknown_socket() {
        let graph = graph! {
            nodes:
                "1": node!(Geometry),
                "2": node!(FragColor);
            links:
                sref!(node "1" "tangent") => sref!(node "2" "color"),
        }
        .validate()
        .unwrap();

        assert_eq!(
            compile(&graph).unwrap_err(),
            Error::UnknownSocket {
                node: "1".into(),
                side: Side::Output,
                socket: "tangent".into()
            }
        );

        let graph = graph! {
            nodes:
                "1": node!(Geometry),
                "2": node!(FragColor);
            links:
                sref!(node "1" "normal") => sref!(node "2" "emissive"),
        }
        .validate()
        .unwrap();

        assert!(matches!(
            compile(&graph),
            Err(Error::UnknownSocket {
                side: Side::Input,
                ..
            })
        ));
    }

    #[test]
    fn skipped_nodes_propagate() {
        let graph = graph! {
            nodes:
                "1": node!(ConstantVector2 { "value": "1,2" }),
                "2": node!(ConstantVector3 { "value": "1,2,3" }),
                "3": node!(Add),
                "4": node!(FragColor);
            links:
                sref!(node "1" "value") => sref!(node "3" "a"),
                sref!(node "2" "value") => sref!(node "3" "b"),
                sref!(node "3" "c") => sref!(node "4" "color"),
        }
        .validate()
        .unwrap();

        let mut engine = Engine::new(Config::default()).unwrap();
        let shader = engine.process(&graph).unwrap();

        assert!(!shader.fragment_shader.contains("add_3"));
        assert!(shader
            .fragment_shader
            .contains("\tgl_FragColor = vec4(0.0, 0.0, 0.0, 1.0);\n"));
        assert!(engine
            .values()
            .unwrap()
            .keys()
            .all(|socket| socket.node != NodeId::from("3")));
    }
}
