//! Texture sampling nodes. Both bind a `sampler2D` uniform to the texture reference picked
//! through their image control.

use crate::{
    get_value,
    shader::{
        graph::Name,
        kind::{expect_type, NodeContext, NodeKind, Outputs, Inputs, Skip},
        sockets::{Control, SocketType, Sockets},
    },
    writer::{Feature, UniformValue, Writer},
};

const KEY: &str = "texture";

fn image_control() -> Control {
    Control::Image {
        key: KEY.to_owned(),
    }
}

/// Declare the sampler uniform of a node and return its name.
fn bind_sampler(node: &NodeContext, variable: &str, writer: &mut Writer) -> Result<String, Skip> {
    let texture = node.data(KEY)?;
    let sampler = format!("{variable}_map");

    writer.append_uniform(
        sampler.as_str(),
        "sampler2D",
        UniformValue::Texture(texture.to_owned()),
    );

    Ok(sampler)
}

/// Swizzled outputs of a sampled texel.
const CHANNELS: [(&str, &str); 6] = [
    ("rgba", "rgba"),
    ("rgb", "rgb"),
    ("r", "r"),
    ("g", "g"),
    ("b", "b"),
    ("a", "a"),
];

#[derive(Clone, Debug, Default)]
/// Sample a texture at `uv`.
pub struct Texture;

impl NodeKind for Texture {
    fn name(&self) -> &str {
        "Texture"
    }

    fn declare_sockets(&self, sockets: &mut Sockets) {
        sockets.input("uv", SocketType::Vec2);
        for (name, components) in CHANNELS {
            sockets.output(name, SocketType::from_dimension(components.len() as u8));
        }
        sockets.control(image_control());
    }

    fn evaluate(
        &self,
        node: &NodeContext,
        inputs: &Inputs,
        writer: &mut Writer,
    ) -> Result<Outputs, Skip> {
        get_value!(inputs . "uv" : Vec2 > uv);
        // Checked before any uniform is declared
        node.data(KEY)?;

        let variable = node.variable(self.name());
        let sampler = bind_sampler(node, &variable, writer)?;
        let texel = writer.declare(
            variable,
            SocketType::Vec4,
            &format!("texture2D({sampler}, {})", uv.variable()),
        );

        Ok(CHANNELS
            .into_iter()
            .filter_map(|(name, components)| {
                let value = if components == "rgba" {
                    texel.clone()
                } else {
                    texel.swizzle(components)?
                };
                Some((Name::from(name), value))
            })
            .collect())
    }
}

#[derive(Clone, Debug, Default)]
/// Perturb the interpolated normal with a tangent-space normal map sampled at `uv`.
pub struct NormalMap;

impl NodeKind for NormalMap {
    fn name(&self) -> &str {
        "NormalMap"
    }

    fn declare_sockets(&self, sockets: &mut Sockets) {
        sockets
            .input("uv", SocketType::Vec2)
            .input("normalScale", SocketType::Float)
            .output("normal", SocketType::Vec3)
            .control(image_control());
    }

    fn evaluate(
        &self,
        node: &NodeContext,
        inputs: &Inputs,
        writer: &mut Writer,
    ) -> Result<Outputs, Skip> {
        get_value!(inputs . "uv" : Vec2 > uv);

        let scale = match inputs.get(&Name::from("normalScale")) {
            Some(scale) => {
                expect_type("normalScale", scale, SocketType::Float)?;
                scale.variable()
            }
            None => "1.0",
        };

        node.data(KEY)?;

        let variable = node.variable(self.name());
        let sampler = bind_sampler(node, &variable, writer)?;
        let normal = writer.declare(
            variable,
            SocketType::Vec3,
            &format!(
                "perturbNormal2Arb(-vViewPosition, normal, texture2D({sampler}, {uv}).xyz * 2.0 - 1.0, {uv}, {scale})",
                uv = uv.variable()
            ),
        );

        writer
            .enable(Feature::Normal)
            .enable(Feature::Position)
            .enable(Feature::NormalMap);

        Ok(Outputs::from([(Name::from("normal"), normal)]))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::shader::{
        graph::NodeId,
        kind::Side,
        sockets::Value,
    };

    use std::collections::{BTreeMap, BTreeSet};

    fn run(
        kind: &dyn NodeKind,
        texture: Option<&str>,
        inputs: &[(&str, &str, SocketType)],
    ) -> (Result<Outputs, Skip>, Writer) {
        let id = NodeId::from("2");
        let data: BTreeMap<String, String> = texture
            .map(|texture| (KEY.to_owned(), texture.to_owned()))
            .into_iter()
            .collect();
        let connected = BTreeSet::new();
        let node = NodeContext {
            id: &id,
            data: &data,
            connected: &connected,
        };
        let inputs: Inputs = inputs
            .iter()
            .map(|&(name, variable, r#type)| (Name::from(name), Value::new(variable, r#type)))
            .collect();

        let mut writer = Writer::default();
        let result = kind.evaluate(&node, &inputs, &mut writer);
        (result, writer)
    }

    #[test]
    fn sampling() {
        let (result, writer) = run(&Texture, Some("bricks"), &[("uv", "vUv", SocketType::Vec2)]);
        let outputs = result.unwrap();

        assert_eq!(
            outputs[&Name::from("rgba")],
            Value::new("texture_2", SocketType::Vec4)
        );
        assert_eq!(
            outputs[&Name::from("rgb")],
            Value::new("texture_2.rgb", SocketType::Vec3)
        );
        assert_eq!(
            outputs[&Name::from("a")],
            Value::new("texture_2.a", SocketType::Float)
        );
        assert_eq!(
            writer.statements(),
            ["vec4 texture_2 = texture2D(texture_2_map, vUv)"]
        );

        let shader = writer.finish();
        assert!(shader
            .fragment_shader
            .contains("uniform sampler2D texture_2_map;"));
        assert_eq!(
            shader.uniforms[&Name::from("texture_2_map")].value,
            UniformValue::Texture("bricks".into())
        );
    }

    #[test]
    fn incomplete_texture() {
        // Disconnected uv
        let (result, writer) = run(&Texture, Some("bricks"), &[]);
        assert_eq!(result.unwrap_err(), Skip::Missing(Side::Input, "uv".into()));
        assert_eq!(writer.uniforms().count(), 0);

        // No texture picked
        let (result, writer) = run(&Texture, None, &[("uv", "vUv", SocketType::Vec2)]);
        assert_eq!(result.unwrap_err(), Skip::Unset(KEY.into()));
        assert_eq!(writer.uniforms().count(), 0);
        assert!(writer.statements().is_empty());

        // Wrong uv dimension
        let (result, _writer) = run(&Texture, Some("bricks"), &[("uv", "p", SocketType::Vec3)]);
        assert!(matches!(result, Err(Skip::InvalidType { .. })));
    }

    #[test]
    fn normal_perturbation() {
        let (result, writer) = run(
            &NormalMap,
            Some("bumps"),
            &[("uv", "vUv", SocketType::Vec2)],
        );

        assert_eq!(
            result.unwrap()[&Name::from("normal")],
            Value::new("normalmap_2", SocketType::Vec3)
        );
        assert_eq!(
            writer.statements(),
            ["vec3 normalmap_2 = perturbNormal2Arb(-vViewPosition, normal, texture2D(normalmap_2_map, vUv).xyz * 2.0 - 1.0, vUv, 1.0)"]
        );

        let features = writer.features();
        assert!(features.normal && features.position && features.normal_map);
        assert!(writer.finish().requires_derivatives);
    }

    #[test]
    fn normal_scale() {
        let (_result, writer) = run(
            &NormalMap,
            Some("bumps"),
            &[
                ("uv", "vUv", SocketType::Vec2),
                ("normalScale", "s", SocketType::Float),
            ],
        );
        assert!(writer.statements()[0].ends_with("vUv, s)"));

        let (result, writer) = run(
            &NormalMap,
            Some("bumps"),
            &[
                ("uv", "vUv", SocketType::Vec2),
                ("normalScale", "s", SocketType::Vec2),
            ],
        );
        assert!(result.is_err());
        assert!(writer.features().enabled().is_empty());
    }
}
