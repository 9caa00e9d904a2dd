//! Graph sink writing `gl_FragColor`.

use crate::{
    shader::{
        graph::Name,
        kind::{NodeContext, NodeKind, Outputs, Inputs, Skip},
        sockets::{SocketType, Sockets},
    },
    writer::Writer,
};

#[derive(Clone, Debug, Default)]
/// Final color of the fragment. Never skips: a missing color, or one narrower than `vec3`,
/// yields opaque black.
pub struct FragColor;

impl NodeKind for FragColor {
    fn name(&self) -> &str {
        "FragColor"
    }

    fn declare_sockets(&self, sockets: &mut Sockets) {
        sockets.input("color", None).input("alpha", SocketType::Float);
    }

    fn evaluate(
        &self,
        _node: &NodeContext,
        inputs: &Inputs,
        writer: &mut Writer,
    ) -> Result<Outputs, Skip> {
        let alpha = inputs
            .get(&Name::from("alpha"))
            .filter(|alpha| alpha.r#type().is_float());

        let color = inputs
            .get(&Name::from("color"))
            .filter(|color| color.dimension() >= 3);

        let color = match (color, alpha) {
            (None, _) => "vec4(0.0, 0.0, 0.0, 1.0)".to_owned(),
            (Some(color), Some(alpha)) => {
                format!("vec4({}.rgb, {})", color.variable(), alpha.variable())
            }
            (Some(color), None) if color.r#type().is_vec3() => {
                format!("vec4({}, 1.0)", color.variable())
            }
            (Some(color), None) => color.variable().to_owned(),
        };

        writer.append_statement(format!("gl_FragColor = {color}"));

        Ok(Outputs::new())
    }
}
