//! Lit shading models. Each model packs its inputs into a material struct and calls a shared
//! function looping over the directional lights.
//!
//! The field list of a model drives the struct declaration, the constructor call and the
//! socket declarations, so the three always agree on order.

use super::utils::{arguments, require_all};

use crate::{
    shader::{
        kind::{NodeContext, NodeKind, Outputs, Inputs, Skip},
        sockets::{SocketType, Sockets},
    },
    writer::{Feature, Writer},
};

#[derive(Clone, Debug)]
/// Shading model node, output `color`.
pub struct ShadingModel {
    name: &'static str,
    fields: &'static [(&'static str, SocketType)],
    helpers: &'static str,
    body: &'static str,
    fresnel: bool,
}

impl ShadingModel {
    fn material(&self) -> String {
        format!("{}Material", self.name)
    }

    /// Struct declaration, helpers and lighting function, registered once per pass.
    pub fn source(&self) -> String {
        let fields: String = self
            .fields
            .iter()
            .map(|(name, r#type)| format!("\t{} {name};\n", r#type.glsl()))
            .collect();

        format!(
            "struct {material} {{\n{fields}}};\n\n{helpers}vec3 {name}(const in {material} material, const in vec3 normal, const in vec3 viewDir) {{\n{body}}}\n",
            material = self.material(),
            helpers = self.helpers,
            name = self.name,
            body = self.body,
        )
    }
}

impl NodeKind for ShadingModel {
    fn name(&self) -> &str {
        self.name
    }

    fn declare_sockets(&self, sockets: &mut Sockets) {
        for &(name, r#type) in self.fields {
            sockets.input(name, r#type);
        }
        sockets
            .input("normal", SocketType::Vec3)
            .output("color", SocketType::Vec3);
    }

    fn evaluate(
        &self,
        node: &NodeContext,
        inputs: &Inputs,
        writer: &mut Writer,
    ) -> Result<Outputs, Skip> {
        let mut sockets = self.fields.to_vec();
        sockets.push(("normal", SocketType::Vec3));

        let values = require_all(inputs, &sockets)?;
        let (fields, normal) = values.split_at(self.fields.len());

        writer.add_function(self.name, self.source());

        let variable = node.variable(self.name);
        let material = format!("{variable}_material");

        writer.append_statement(format!(
            "{ty} {material} = {ty}({args})",
            ty = self.material(),
            args = arguments(fields),
        ));
        let color = writer.declare(
            variable,
            SocketType::Vec3,
            &format!(
                "{}({material}, normalize({}), normalize(vViewPosition))",
                self.name,
                arguments(normal),
            ),
        );

        writer.enable(Feature::Light).enable(Feature::Position);
        if self.fresnel {
            writer.enable(Feature::Fresnel);
        }

        Ok(Outputs::from([("color".into(), color)]))
    }
}

/// Lambertian diffuse with a Blinn-Phong specular lobe.
pub fn blinn_phong() -> ShadingModel {
    ShadingModel {
        name: "BlinnPhong",
        fields: &[
            ("color", SocketType::Vec3),
            ("specular", SocketType::Float),
            ("shininess", SocketType::Float),
        ],
        helpers: "",
        body: "\tvec3 diffuse = material.color * RECIPROCAL_PI;
\tvec3 outgoing = ambientLightColor * diffuse;
#if NUM_DIR_LIGHTS > 0
\tfor (int i = 0; i < NUM_DIR_LIGHTS; i++) {
\t\tvec3 lightDir = directionalLights[i].direction;
\t\tvec3 halfDir = normalize(lightDir + viewDir);
\t\tfloat dotNL = clamp(dot(normal, lightDir), 0.0, 1.0);
\t\tfloat dotNH = clamp(dot(normal, halfDir), 0.0, 1.0);
\t\tfloat specular = material.specular * pow(dotNH, material.shininess);
\t\toutgoing += directionalLights[i].color * dotNL * (diffuse + vec3(specular));
\t}
#endif
\treturn outgoing;
",
        fresnel: false,
    }
}

/// Metallic-roughness model: GGX distribution with height-correlated Smith visibility.
pub fn standard() -> ShadingModel {
    ShadingModel {
        name: "Standard",
        fields: &[
            ("color", SocketType::Vec3),
            ("roughness", SocketType::Float),
            ("metalness", SocketType::Float),
            ("reflectance", SocketType::Float),
        ],
        helpers: "float D_GGX(const in float alpha, const in float dotNH) {
\tfloat a2 = alpha * alpha;
\tfloat denom = dotNH * dotNH * (a2 - 1.0) + 1.0;
\treturn RECIPROCAL_PI * a2 / (denom * denom);
}

float V_SmithGGXCorrelated(const in float alpha, const in float dotNL, const in float dotNV) {
\tfloat a2 = alpha * alpha;
\tfloat gv = dotNL * sqrt(a2 + (1.0 - a2) * dotNV * dotNV);
\tfloat gl = dotNV * sqrt(a2 + (1.0 - a2) * dotNL * dotNL);
\treturn 0.5 / max(gv + gl, EPSILON);
}

",
        body: "\tfloat alpha = max(material.roughness * material.roughness, 0.0007);
\tvec3 diffuse = material.color * (1.0 - material.metalness) * RECIPROCAL_PI;
\tvec3 specularColor = mix(vec3(0.16 * material.reflectance * material.reflectance), material.color, material.metalness);
\tfloat dotNV = clamp(dot(normal, viewDir), EPSILON, 1.0);
\tvec3 outgoing = ambientLightColor * diffuse;
#if NUM_DIR_LIGHTS > 0
\tfor (int i = 0; i < NUM_DIR_LIGHTS; i++) {
\t\tvec3 lightDir = directionalLights[i].direction;
\t\tvec3 halfDir = normalize(lightDir + viewDir);
\t\tfloat dotNL = clamp(dot(normal, lightDir), 0.0, 1.0);
\t\tfloat dotNH = clamp(dot(normal, halfDir), 0.0, 1.0);
\t\tfloat dotLH = clamp(dot(lightDir, halfDir), 0.0, 1.0);
\t\tvec3 specular = F_Schlick(specularColor, dotLH) * (D_GGX(alpha, dotNH) * V_SmithGGXCorrelated(alpha, dotNL, dotNV));
\t\toutgoing += directionalLights[i].color * dotNL * (diffuse + specular);
\t}
#endif
\treturn outgoing;
",
        fresnel: true,
    }
}

/// Sheen-based cloth model: Charlie distribution with Neubelt visibility.
pub fn cloth() -> ShadingModel {
    ShadingModel {
        name: "Cloth",
        fields: &[
            ("color", SocketType::Vec3),
            ("roughness", SocketType::Float),
            ("sheen", SocketType::Float),
        ],
        helpers: "float D_Charlie(const in float roughness, const in float dotNH) {
\tfloat invAlpha = 1.0 / max(roughness * roughness, EPSILON);
\tfloat sin2h = max(1.0 - dotNH * dotNH, 0.0078125);
\treturn (2.0 + invAlpha) * pow(sin2h, invAlpha * 0.5) * RECIPROCAL_PI * 0.5;
}

float V_Neubelt(const in float dotNV, const in float dotNL) {
\treturn clamp(1.0 / (4.0 * (dotNL + dotNV - dotNL * dotNV)), 0.0, 1.0);
}

",
        body: "\tvec3 diffuse = material.color * RECIPROCAL_PI;
\tvec3 sheenColor = vec3(material.sheen);
\tfloat dotNV = clamp(dot(normal, viewDir), EPSILON, 1.0);
\tvec3 outgoing = ambientLightColor * diffuse;
#if NUM_DIR_LIGHTS > 0
\tfor (int i = 0; i < NUM_DIR_LIGHTS; i++) {
\t\tvec3 lightDir = directionalLights[i].direction;
\t\tvec3 halfDir = normalize(lightDir + viewDir);
\t\tfloat dotNL = clamp(dot(normal, lightDir), 0.0, 1.0);
\t\tfloat dotNH = clamp(dot(normal, halfDir), 0.0, 1.0);
\t\tfloat dotLH = clamp(dot(lightDir, halfDir), 0.0, 1.0);
\t\tvec3 specular = F_Schlick(sheenColor, dotLH) * (D_Charlie(material.roughness, dotNH) * V_Neubelt(dotNV, dotNL));
\t\toutgoing += directionalLights[i].color * dotNL * (diffuse + specular);
\t}
#endif
\treturn outgoing;
",
        fresnel: true,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::shader::{
        graph::{Name, NodeId},
        kind::Side,
        sockets::Value,
    };

    use std::collections::{BTreeMap, BTreeSet};

    fn evaluate(
        model: &ShadingModel,
        id: &str,
        inputs: &[(&str, SocketType)],
        writer: &mut Writer,
    ) -> Result<Outputs, Skip> {
        let id = NodeId::from(id);
        let data = BTreeMap::new();
        let connected = BTreeSet::new();
        let node = NodeContext {
            id: &id,
            data: &data,
            connected: &connected,
        };
        let inputs: Inputs = inputs
            .iter()
            .map(|&(name, r#type)| (Name::from(name), Value::new(format!("in_{name}"), r#type)))
            .collect();

        model.evaluate(&node, &inputs, writer)
    }

    const STANDARD_INPUTS: [(&str, SocketType); 5] = [
        ("color", SocketType::Vec3),
        ("roughness", SocketType::Float),
        ("metalness", SocketType::Float),
        ("reflectance", SocketType::Float),
        ("normal", SocketType::Vec3),
    ];

    #[test]
    fn material_struct() {
        let source = standard().source();

        assert!(source.starts_with(
            "struct StandardMaterial {\n\tvec3 color;\n\tfloat roughness;\n\tfloat metalness;\n\tfloat reflectance;\n};\n"
        ));
        assert!(source.contains("float D_GGX("));
        assert!(source.contains(
            "vec3 Standard(const in StandardMaterial material, const in vec3 normal, const in vec3 viewDir) {\n"
        ));
        assert!(source.ends_with("\treturn outgoing;\n}\n"));
    }

    #[test]
    fn statements() {
        let mut writer = Writer::default();
        let outputs = evaluate(&standard(), "4", &STANDARD_INPUTS, &mut writer).unwrap();

        assert_eq!(
            outputs[&Name::from("color")],
            Value::new("standard_4", SocketType::Vec3)
        );
        assert_eq!(
            writer.statements(),
            [
                "StandardMaterial standard_4_material = StandardMaterial(in_color, in_roughness, in_metalness, in_reflectance)",
                "vec3 standard_4 = Standard(standard_4_material, normalize(in_normal), normalize(vViewPosition))",
            ]
        );

        let features = writer.features();
        assert!(features.light && features.position && features.fresnel);
        assert!(!features.normal);
    }

    #[test]
    fn single_shared_function() {
        let mut writer = Writer::default();
        evaluate(&standard(), "1", &STANDARD_INPUTS, &mut writer).unwrap();
        evaluate(&standard(), "2", &STANDARD_INPUTS, &mut writer).unwrap();

        let fragment = writer.fragment_shader();
        assert_eq!(fragment.matches("struct StandardMaterial").count(), 1);
        assert_eq!(fragment.matches("= Standard(").count(), 2);
    }

    #[test]
    fn blinn_phong_skips_fresnel() {
        let mut writer = Writer::default();
        evaluate(
            &blinn_phong(),
            "1",
            &[
                ("color", SocketType::Vec3),
                ("specular", SocketType::Float),
                ("shininess", SocketType::Float),
                ("normal", SocketType::Vec3),
            ],
            &mut writer,
        )
        .unwrap();

        assert!(writer.features().light);
        assert!(!writer.features().fresnel);
    }

    #[test]
    fn missing_inputs() {
        let mut writer = Writer::default();
        let result = evaluate(
            &cloth(),
            "1",
            &[("color", SocketType::Vec3), ("roughness", SocketType::Float)],
            &mut writer,
        );

        assert_eq!(
            result.unwrap_err(),
            Skip::MissingMany(Side::Input, vec!["sheen".into(), "normal".into()])
        );
        assert!(writer.statements().is_empty());
        assert_eq!(writer.functions().count(), 0);
        assert!(!writer.features().light);
    }

    #[test]
    fn sockets() {
        let sockets = cloth().sockets();

        assert_eq!(
            sockets.inputs.iter().map(|decl| decl.name.as_str()).collect::<Vec<_>>(),
            vec!["color", "roughness", "sheen", "normal"]
        );
        assert_eq!(sockets.outputs[0].r#type, Some(SocketType::Vec3));
    }
}
