//! Compiler configuration.

#[derive(Clone, Debug, PartialEq, Eq)]
/// Settings shared by every pass of an [Engine](crate::engine::Engine).
pub struct Config {
    /// Fallback for the `NUM_DIR_LIGHTS` preprocessor constant sizing the directional light
    /// array. Hosts defining the constant themselves take precedence.
    pub directional_lights: u32,
    /// Prefix of every statement line inside `main`.
    pub indent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directional_lights: 3,
            indent: "\t".to_owned(),
        }
    }
}

impl Config {
    /// Set the fallback directional light count.
    pub fn with_directional_lights(mut self, count: u32) -> Self {
        self.directional_lights = count;
        self
    }

    /// Set the statement indentation.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }
}
