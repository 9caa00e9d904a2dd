//! Surface attributes interpolated from the vertex stage.

use crate::{
    shader::{
        kind::{NodeContext, NodeKind, Outputs, Inputs, Skip},
        sockets::{SocketType, Sockets, Value},
    },
    writer::{Feature, Writer},
};

/// Output socket, the expression it reads and the varying it requires.
const ATTRIBUTES: [(&str, &str, SocketType, Feature); 3] = [
    ("position", "vViewPosition", SocketType::Vec3, Feature::Position),
    ("normal", "normal", SocketType::Vec3, Feature::Normal),
    ("uv0", "vUv", SocketType::Vec2, Feature::Uv),
];

#[derive(Clone, Debug, Default)]
/// View-space position, normal and first UV set. Only connected outputs enable their varying.
pub struct Geometry;

impl NodeKind for Geometry {
    fn name(&self) -> &str {
        "Geometry"
    }

    fn declare_sockets(&self, sockets: &mut Sockets) {
        for (name, _, r#type, _) in ATTRIBUTES {
            sockets.output(name, r#type);
        }
    }

    fn evaluate(
        &self,
        node: &NodeContext,
        _inputs: &Inputs,
        writer: &mut Writer,
    ) -> Result<Outputs, Skip> {
        Ok(ATTRIBUTES
            .into_iter()
            .filter(|(name, ..)| node.is_connected(name))
            .map(|(name, variable, r#type, feature)| {
                writer.enable(feature);
                (name.into(), Value::new(variable, r#type))
            })
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::shader::graph::{Name, NodeId};

    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn connected_outputs_only() {
        let id = NodeId::from("1");
        let data = BTreeMap::new();
        let connected = BTreeSet::from([Name::from("uv0")]);
        let node = NodeContext {
            id: &id,
            data: &data,
            connected: &connected,
        };

        let mut writer = Writer::default();
        let outputs = Geometry
            .evaluate(&node, &Inputs::new(), &mut writer)
            .unwrap();

        assert_eq!(
            outputs,
            Outputs::from([("uv0".into(), Value::new("vUv", SocketType::Vec2))])
        );
        assert!(writer.features().is_enabled(Feature::Uv));
        assert!(!writer.features().is_enabled(Feature::Normal));
        assert!(!writer.features().is_enabled(Feature::Position));
        assert!(writer.statements().is_empty());
    }

    #[test]
    fn unconnected() {
        let id = NodeId::from("1");
        let data = BTreeMap::new();
        let connected = BTreeSet::new();
        let node = NodeContext {
            id: &id,
            data: &data,
            connected: &connected,
        };

        let mut writer = Writer::default();
        let outputs = Geometry
            .evaluate(&node, &Inputs::new(), &mut writer)
            .unwrap();

        assert!(outputs.is_empty());
        assert!(writer.features().enabled().is_empty());
    }
}
