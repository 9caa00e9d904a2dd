//! Per-pass code generation accumulator. Node kinds append statements, uniforms, shared
//! functions and feature flags; the [Writer] then assembles the vertex and fragment programs.

pub mod chunks;

use crate::{
    config::Config,
    shader::{
        graph::Name,
        sockets::{SocketType, Value},
    },
};

use std::collections::BTreeMap;

use paste::paste;

macro_rules! features {
    { $($(#[$attr:meta])* $name:ident),+ $(,)? } => {
        paste! {
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            /// Flags gating optional shader chunks, all off at the start of a pass.
            pub struct Features {
                $(
                    $(#[$attr])*
                    pub $name: bool,
                )+
            }

            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            /// Single feature flag.
            pub enum Feature {
                $(
                    $(#[$attr])*
                    [<$name:camel>],
                )+
            }

            impl Features {
                /// Turn a feature on. Flags are never turned off during a pass.
                pub fn enable(&mut self, feature: Feature) {
                    match feature {
                        $(Feature::[<$name:camel>] => self.$name = true,)+
                    }
                }

                /// Check whether a feature is on.
                pub fn is_enabled(&self, feature: Feature) -> bool {
                    match feature {
                        $(Feature::[<$name:camel>] => self.$name,)+
                    }
                }

                /// Every enabled feature, in declaration order.
                pub fn enabled(&self) -> Vec<Feature> {
                    [$(Feature::[<$name:camel>]),+]
                        .into_iter()
                        .filter(|feature| self.is_enabled(*feature))
                        .collect()
                }
            }
        }
    };
}

features! {
    /// `vNormal` varying and the `normal` prelude.
    normal,
    /// `vUv` varying.
    uv,
    /// `vViewPosition` varying.
    position,
    /// Directional light declarations.
    light,
    /// `perturbNormal2Arb` helper, needs derivatives.
    normal_map,
    /// `F_Schlick` helper.
    fresnel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Host-side value bound to a uniform.
pub enum UniformValue {
    /// Texture reference key selected through an image control.
    Texture(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Uniform declared by the generated program, to be bound by the renderer.
pub struct UniformBinding {
    /// GLSL type of the uniform.
    pub r#type: String,
    #[allow(missing_docs)]
    pub value: UniformValue,
}

#[derive(Clone, Debug, PartialEq)]
/// Output of a completed pass.
pub struct CompiledShader {
    #[allow(missing_docs)]
    pub vertex_shader: String,
    #[allow(missing_docs)]
    pub fragment_shader: String,
    /// Uniforms declared by the fragment program.
    pub uniforms: BTreeMap<Name, UniformBinding>,
    /// The program reads the host's light uniforms.
    pub uses_lighting: bool,
    /// The program uses `dFdx`/`dFdy` and needs the standard derivatives extension.
    pub requires_derivatives: bool,
}

#[derive(Clone, Debug, Default)]
/// Code generation accumulator, owned by a single pass.
pub struct Writer {
    config: Config,

    statements: Vec<String>,
    uniforms: Vec<(Name, UniformBinding)>,
    functions: Vec<(Name, String)>,
    features: Features,
}

impl Writer {
    /// Create an empty writer.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Append a `main` statement, without its terminating semicolon.
    pub fn append_statement(&mut self, statement: impl Into<String>) -> &mut Self {
        self.statements.push(statement.into());
        self
    }

    /// Append `<type> <name> = <expression>` and return the declared variable as a [Value].
    pub fn declare(&mut self, name: impl Into<String>, r#type: SocketType, expression: &str) -> Value {
        let name = name.into();
        self.append_statement(format!("{} {name} = {expression}", r#type.glsl()));
        Value::new(name, r#type)
    }

    /// Declare a uniform. Declaring the same name twice keeps the first declaration.
    pub fn append_uniform(
        &mut self,
        name: impl Into<Name>,
        r#type: &str,
        value: UniformValue,
    ) -> &mut Self {
        let name = name.into();

        if !self.uniforms.iter().any(|(existing, _)| existing == &name) {
            self.uniforms.push((
                name,
                UniformBinding {
                    r#type: r#type.to_owned(),
                    value,
                },
            ));
        }

        self
    }

    /// Register a shared function body under a name, returning `false` if the name was
    /// already registered (the body is then ignored).
    pub fn add_function(&mut self, name: impl Into<Name>, source: impl Into<String>) -> bool {
        let name = name.into();

        if self.functions.iter().any(|(existing, _)| existing == &name) {
            log::trace!("Shared function `{name}` already registered");
            return false;
        }

        self.functions.push((name, source.into()));
        true
    }

    /// Turn a feature flag on.
    pub fn enable(&mut self, feature: Feature) -> &mut Self {
        self.features.enable(feature);
        self
    }

    #[allow(missing_docs)]
    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Statements in emission order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Uniforms in declaration order.
    pub fn uniforms(&self) -> impl Iterator<Item = (&Name, &UniformBinding)> {
        self.uniforms.iter().map(|(name, binding)| (name, binding))
    }

    /// Shared function names in registration order.
    pub fn functions(&self) -> impl Iterator<Item = &Name> {
        self.functions.iter().map(|(name, _)| name)
    }

    fn line(&self, statement: &str) -> String {
        format!("{}{statement};\n", self.config.indent)
    }

    fn varyings(&self) -> String {
        let mut res = String::new();

        if self.features.uv {
            res.push_str(chunks::VARYING_UV);
        }
        if self.features.normal {
            res.push_str(chunks::VARYING_NORMAL);
        }
        if self.features.position {
            res.push_str(chunks::VARYING_POSITION);
        }

        res
    }

    /// Assemble the fragment program: constants, uniforms, varyings, built-in chunks, shared
    /// functions, then `main`.
    pub fn fragment_shader(&self) -> String {
        let mut sections: Vec<String> = vec![chunks::CONSTANTS.to_owned()];

        let uniforms: String = self
            .uniforms
            .iter()
            .map(|(name, binding)| format!("uniform {} {name};\n", binding.r#type))
            .collect();
        sections.push(uniforms);

        sections.push(self.varyings());

        if self.features.light {
            sections.push(chunks::lights(self.config.directional_lights));
        }
        if self.features.normal_map {
            sections.push(chunks::NORMAL_MAP.to_owned());
        }
        if self.features.fresnel {
            sections.push(chunks::FRESNEL.to_owned());
        }

        sections.extend(
            self.functions
                .iter()
                .map(|(_name, source)| format!("{}\n", source.trim_end())),
        );

        let mut main = String::from("void main() {\n");
        if self.features.normal {
            main.push_str(&self.line(chunks::NORMAL_PRELUDE));
        }
        for statement in self.statements.iter() {
            main.push_str(&self.line(statement));
        }
        main.push_str("}\n");
        sections.push(main);

        join_sections(sections)
    }

    /// Assemble the vertex program from the same flags as the fragment program.
    pub fn vertex_shader(&self) -> String {
        let mut main = String::from("void main() {\n");

        if self.features.uv {
            main.push_str(&self.line(chunks::ASSIGN_UV));
        }
        if self.features.normal {
            main.push_str(&self.line(chunks::ASSIGN_NORMAL));
        }
        main.push_str(&self.line(chunks::MODEL_VIEW_POSITION));
        if self.features.position {
            main.push_str(&self.line(chunks::ASSIGN_POSITION));
        }
        main.push_str(&self.line(chunks::GL_POSITION));
        main.push_str("}\n");

        join_sections(vec![self.varyings(), main])
    }

    /// Assemble both programs and the uniform binding table.
    pub fn finish(&self) -> CompiledShader {
        CompiledShader {
            vertex_shader: self.vertex_shader(),
            fragment_shader: self.fragment_shader(),
            uniforms: self.uniforms.iter().cloned().collect(),
            uses_lighting: self.features.light,
            requires_derivatives: self.features.normal_map,
        }
    }
}

/// Join non-empty sections with a blank line.
fn join_sections(sections: Vec<String>) -> String {
    sections
        .into_iter()
        .filter(|section| !section.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
