//! Node kinds derived from a literal GLSL function definition. The signature gives the sockets:
//! one typed input per parameter, and a `result` output of the return type.

use super::utils::{arguments, require_all};

use crate::{
    shader::{
        kind::{NodeContext, NodeKind, Outputs, Inputs, Skip},
        parsing::{parse_function, Function, PResult},
        sockets::{SocketType, Sockets},
    },
    writer::Writer,
};

#[derive(Clone, Debug)]
/// Node calling a shared GLSL function.
pub struct FunctionNode {
    function: Function,
}

impl FunctionNode {
    /// Parse a GLSL function definition into a node kind.
    pub fn new(source: &str) -> PResult<Self> {
        Ok(Self {
            function: parse_function(source)?,
        })
    }
}

impl NodeKind for FunctionNode {
    fn name(&self) -> &str {
        &self.function.name
    }

    fn declare_sockets(&self, sockets: &mut Sockets) {
        for (name, r#type) in self.function.parameters.iter() {
            sockets.input(name.as_str(), *r#type);
        }
        sockets.output("result", self.function.return_type);
    }

    fn evaluate(
        &self,
        node: &NodeContext,
        inputs: &Inputs,
        writer: &mut Writer,
    ) -> Result<Outputs, Skip> {
        let parameters: Vec<(&str, SocketType)> = self
            .function
            .parameters
            .iter()
            .map(|(name, r#type)| (name.as_str(), *r#type))
            .collect();
        let values = require_all(inputs, &parameters)?;

        writer.add_function(self.function.name.as_str(), self.function.source.as_str());

        let result = writer.declare(
            node.variable(&self.function.name),
            self.function.return_type,
            &format!("{}({})", self.function.name, arguments(&values)),
        );

        Ok(Outputs::from([("result".into(), result)]))
    }
}

/// Exposure scaling only.
pub const LINEAR: &str = "vec3 LinearToneMapping(vec3 color, float exposure) {
\treturn exposure * color;
}";

/// Reinhard operator on exposed color.
pub const REINHARD: &str = "vec3 ReinhardToneMapping(vec3 color, float exposure) {
\tcolor *= exposure;
\treturn clamp(color / (vec3(1.0) + color), 0.0, 1.0);
}";

/// Filmic curve by Jim Hejl and Richard Burgess-Dawson, gamma included.
pub const OPTIMIZED_CINEON: &str = "vec3 OptimizedCineonToneMapping(vec3 color, float exposure) {
\tcolor *= exposure;
\tcolor = max(vec3(0.0), color - 0.004);
\treturn pow((color * (6.2 * color + 0.5)) / (color * (6.2 * color + 1.7) + 0.06), vec3(2.2));
}";

/// Narkowicz's ACES filmic curve fit.
pub const ACES_FILMIC: &str = "vec3 ACESFilmicToneMapping(vec3 color, float exposure) {
\tcolor *= exposure;
\treturn clamp((color * (2.51 * color + 0.03)) / (color * (2.43 * color + 0.59) + 0.14), 0.0, 1.0);
}";

/// Every built-in tone mapping operator.
pub const TONE_MAPPING: [&str; 4] = [LINEAR, REINHARD, OPTIMIZED_CINEON, ACES_FILMIC];
