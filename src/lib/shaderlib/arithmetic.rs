//! Expression nodes: arithmetic operators and vector functions over any dimension.
//!
//! Inputs are untyped; each node derives its output type from the connected values:
//! - `Add`, `Subtract`, `Multiply`, `Divide`: `a`, `b` of equal dimension, or either a scalar
//!   (broadcast). Output `c` has the widest dimension.
//! - `Dot`: `a`, `b` of equal dimension, output `c` is a `float`.
//! - `Cross`: `a`, `b` of equal dimension, output `c` has the same dimension.
//! - `Mix`: `a`, `b` of equal dimension, `c` scalar or of the same dimension. Output `d`.

use crate::{
    shader::{
        kind::{NodeContext, NodeKind, Outputs, Inputs, Skip},
        sockets::{SocketType, Sockets, Value},
        template::Expression,
    },
    writer::Writer,
};

use paste::paste;

#[derive(Clone, Debug)]
/// Node emitting a single expression statement over `N` inputs.
pub struct ExpressionNode<const N: usize> {
    name: &'static str,
    output: &'static str,
    expression: Expression<N>,
    derive: fn([SocketType; N]) -> Option<SocketType>,
}

impl<const N: usize> ExpressionNode<N> {
    fn mismatch(&self, types: [SocketType; N]) -> Skip {
        let slots = self.expression.slots();
        let culprit = (1..N)
            .find(|&i| types[i] != types[0])
            .unwrap_or(N.saturating_sub(1));

        Skip::MismatchedTypes(
            (slots[0].into(), types[0]),
            (slots[culprit].into(), types[culprit]),
        )
    }
}

impl<const N: usize> NodeKind for ExpressionNode<N> {
    fn name(&self) -> &str {
        self.name
    }

    fn declare_sockets(&self, sockets: &mut Sockets) {
        for slot in self.expression.slots() {
            sockets.input(slot, None);
        }
        sockets.output(self.output, None);
    }

    fn evaluate(
        &self,
        node: &NodeContext,
        inputs: &Inputs,
        writer: &mut Writer,
    ) -> Result<Outputs, Skip> {
        let values = self.expression.resolve(inputs)?;
        let types = values.map(Value::r#type);
        let r#type = (self.derive)(types).ok_or_else(|| self.mismatch(types))?;

        let value = writer.declare(
            node.variable(self.name),
            r#type,
            &self.expression.render(&values),
        );

        Ok(Outputs::from([(self.output.into(), value)]))
    }
}

/// Equal dimensions, or a scalar broadcast to the other operand.
fn broadcast([a, b]: [SocketType; 2]) -> Option<SocketType> {
    (a == b || a.is_float() || b.is_float()).then(|| a.widest(b))
}

fn same_to_scalar([a, b]: [SocketType; 2]) -> Option<SocketType> {
    (a == b).then_some(SocketType::Float)
}

fn same([a, b]: [SocketType; 2]) -> Option<SocketType> {
    (a == b).then_some(a)
}

fn interpolation([a, b, c]: [SocketType; 3]) -> Option<SocketType> {
    (a == b && (c.is_float() || c == a)).then_some(a)
}

macro_rules! arithmetic {
    ($($name:ident => $symbol:literal),+ $(,)?) => {
        paste! {
            $(
                #[doc = concat!("`a ", $symbol, " b`, broadcasting scalars.")]
                pub fn [<$name:lower>]() -> ExpressionNode<2> {
                    ExpressionNode {
                        name: stringify!($name),
                        output: "c",
                        expression: Expression::new(["a", "b"], |[a, b]| {
                            format!(concat!("{} ", $symbol, " {}"), a, b)
                        }),
                        derive: broadcast,
                    }
                }
            )+
        }
    };
}

arithmetic! {
    Add => "+",
    Subtract => "-",
    Multiply => "*",
    Divide => "/",
}

/// `dot(a, b)`
pub fn dot() -> ExpressionNode<2> {
    ExpressionNode {
        name: "Dot",
        output: "c",
        expression: Expression::new(["a", "b"], |[a, b]| format!("dot({a}, {b})")),
        derive: same_to_scalar,
    }
}

/// `cross(a, b)`
pub fn cross() -> ExpressionNode<2> {
    ExpressionNode {
        name: "Cross",
        output: "c",
        expression: Expression::new(["a", "b"], |[a, b]| format!("cross({a}, {b})")),
        derive: same,
    }
}

/// `mix(a, b, c)`
pub fn mix() -> ExpressionNode<3> {
    ExpressionNode {
        name: "Mix",
        output: "d",
        expression: Expression::new(["a", "b", "c"], |[a, b, c]| format!("mix({a}, {b}, {c})")),
        derive: interpolation,
    }
}
