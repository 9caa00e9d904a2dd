//! Socket types, the values flowing along graph edges and socket declarations.

use super::graph::Name;

use std::{fmt::Debug, str::FromStr};

use paste::paste;

macro_rules! socket_type {
    { $($(#[$attr:meta])* $name:ident = $dim:literal => $glsl:literal),+ $(,)? } => {
        paste! {
            #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
            /// Possible socket types, i.e. the scalar/vector width of a shader value.
            pub enum SocketType {
                $(
                    $(#[$attr])*
                    $name,
                )+
            }

            impl SocketType {
                /// Every socket type, ordered by dimension.
                pub const ALL: [SocketType; 4] = [$(SocketType::$name),+];

                /// Number of components, from 1 to 4.
                pub fn dimension(&self) -> u8 {
                    match self {
                        $(SocketType::$name => $dim,)+
                    }
                }

                /// GLSL type keyword.
                pub fn glsl(&self) -> &'static str {
                    match self {
                        $(SocketType::$name => $glsl,)+
                    }
                }

                /// Socket type of the given dimension.
                pub fn from_dimension(dimension: u8) -> Option<Self> {
                    match dimension {
                        $($dim => Some(SocketType::$name),)+
                        _ => None,
                    }
                }

                $(
                    #[doc = concat!("Check if this is a `", $glsl, "`.")]
                    pub fn [<is_ $name:lower>](&self) -> bool {
                        *self == SocketType::$name
                    }
                )+
            }

            impl std::fmt::Display for SocketType {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.glsl())
                }
            }

            impl FromStr for SocketType {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Ok(match s {
                        $($glsl => Self::$name,)+
                        other => Err(format!("Unrecognized socket type `{other}`."))?,
                    })
                }
            }
        }
    };
}

socket_type! {
    /// Single value
    Float = 1 => "float",
    /// 2D vector
    Vec2 = 2 => "vec2",
    /// 3D vector
    Vec3 = 3 => "vec3",
    /// 4D vector
    Vec4 = 4 => "vec4",
}

impl SocketType {
    /// Largest of two types, used for scalar broadcasting.
    pub fn widest(self, other: Self) -> Self {
        self.max(other)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Result flowing along one graph edge: a GLSL expression (usually a variable) of a known type.
pub struct Value {
    variable: String,
    r#type: SocketType,
}

impl Value {
    /// Create a value from a variable name or expression and its type.
    pub fn new(variable: impl Into<String>, r#type: SocketType) -> Self {
        Self {
            variable: variable.into(),
            r#type,
        }
    }

    /// GLSL expression referencing the value.
    pub fn variable(&self) -> &str {
        self.variable.as_str()
    }

    /// Type of the value.
    pub fn r#type(&self) -> SocketType {
        self.r#type
    }

    /// Shorthand for `self.r#type().dimension()`.
    pub fn dimension(&self) -> u8 {
        self.r#type.dimension()
    }

    /// Swizzled view of the value, e.g. `.rgb`. No statement is needed to produce it.
    pub fn swizzle(&self, components: &str) -> Option<Self> {
        let r#type = SocketType::from_dimension(u8::try_from(components.len()).ok()?)?;

        Some(Self::new(format!("{}.{components}", self.variable), r#type))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Input or output port declared by a node kind.
pub struct SocketDecl {
    /// Socket name, unique per side.
    pub name: Name,
    /// Expected type, `None` when the kind accepts any dimension and checks it itself.
    pub r#type: Option<SocketType>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Node-local control surface, handled by the UI control subsystem.
pub enum Control {
    /// Text box holding a literal of the given dimension.
    Literal {
        /// Static data key the validated text is stored under.
        key: String,
        #[allow(missing_docs)]
        dimension: u8,
    },
    /// Image picker storing a texture reference key.
    Image {
        /// Static data key the texture reference is stored under.
        key: String,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Sockets and controls registered by a node kind.
pub struct Sockets {
    /// Ordered input sockets.
    pub inputs: Vec<SocketDecl>,
    /// Ordered output sockets.
    pub outputs: Vec<SocketDecl>,
    /// Controls to be presented by the editor.
    pub controls: Vec<Control>,
}

impl Sockets {
    /// Register an input socket.
    pub fn input(&mut self, name: &str, r#type: impl Into<Option<SocketType>>) -> &mut Self {
        self.inputs.push(SocketDecl {
            name: name.into(),
            r#type: r#type.into(),
        });
        self
    }

    /// Register an output socket.
    pub fn output(&mut self, name: &str, r#type: impl Into<Option<SocketType>>) -> &mut Self {
        self.outputs.push(SocketDecl {
            name: name.into(),
            r#type: r#type.into(),
        });
        self
    }

    /// Register a control.
    pub fn control(&mut self, control: Control) -> &mut Self {
        self.controls.push(control);
        self
    }

    /// Look a socket up by side and name.
    pub fn get(&self, side: super::kind::Side, name: &Name) -> Option<&SocketDecl> {
        match side {
            super::kind::Side::Input => &self.inputs,
            super::kind::Side::Output => &self.outputs,
        }
        .iter()
        .find(|decl| &decl.name == name)
    }
}
