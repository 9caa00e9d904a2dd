//! Constant nodes holding a user-entered literal.

use crate::{
    shader::{
        kind::{NodeContext, NodeKind, Outputs, Inputs, Skip},
        parsing::validate_literal,
        sockets::{Control, SocketType, Sockets},
    },
    writer::Writer,
};

const KEY: &str = "value";

#[derive(Clone, Debug)]
/// Literal of a fixed dimension, exposed on output `value`.
pub struct Constant {
    name: &'static str,
    r#type: SocketType,
}

impl Constant {
    #[allow(missing_docs)]
    pub fn new(r#type: SocketType) -> Self {
        let name = match r#type {
            SocketType::Float => "ConstantFloat",
            SocketType::Vec2 => "ConstantVector2",
            SocketType::Vec3 => "ConstantVector3",
            SocketType::Vec4 => "ConstantVector4",
        };

        Self { name, r#type }
    }
}

impl NodeKind for Constant {
    fn name(&self) -> &str {
        self.name
    }

    fn declare_sockets(&self, sockets: &mut Sockets) {
        sockets
            .output(KEY, self.r#type)
            .control(Control::Literal {
                key: KEY.to_owned(),
                dimension: self.r#type.dimension(),
            });
    }

    fn evaluate(
        &self,
        node: &NodeContext,
        _inputs: &Inputs,
        writer: &mut Writer,
    ) -> Result<Outputs, Skip> {
        let literal = node.data(KEY)?;
        let components = validate_literal(literal, self.r#type.dimension())
            .map_err(|_| Skip::Unset(KEY.to_owned()))?;

        let expression = if self.r#type.is_float() {
            components.join(",")
        } else {
            format!("{}({})", self.r#type, components.join(","))
        };

        let value = writer.declare(node.variable(self.name), self.r#type, &expression);

        Ok(Outputs::from([(KEY.into(), value)]))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::shader::{
        graph::{Name, NodeId},
        sockets::Value,
    };

    use std::collections::{BTreeMap, BTreeSet};

    fn run(r#type: SocketType, literal: Option<&str>) -> (Result<Outputs, Skip>, Writer) {
        let id = NodeId::from("3");
        let data: BTreeMap<String, String> = literal
            .map(|literal| (KEY.to_owned(), literal.to_owned()))
            .into_iter()
            .collect();
        let connected = BTreeSet::new();
        let node = NodeContext {
            id: &id,
            data: &data,
            connected: &connected,
        };

        let mut writer = Writer::default();
        let result = Constant::new(r#type).evaluate(&node, &Inputs::new(), &mut writer);
        (result, writer)
    }

    #[test]
    fn vector_literal() {
        let (result, writer) = run(SocketType::Vec3, Some("1,2,3"));

        assert_eq!(
            result.unwrap()[&Name::from("value")],
            Value::new("constantvector3_3", SocketType::Vec3)
        );
        assert_eq!(
            writer.statements(),
            ["vec3 constantvector3_3 = vec3(1,2,3)"]
        );
    }

    #[test]
    fn float_literal() {
        let (result, writer) = run(SocketType::Float, Some("0.5"));

        assert!(result.is_ok());
        assert_eq!(writer.statements(), ["float constantfloat_3 = 0.5"]);
    }

    #[test]
    fn invalid_literals() {
        for (r#type, literal) in [
            (SocketType::Vec3, Some("1,2")),
            (SocketType::Vec2, Some("x,y")),
            (SocketType::Float, Some("1")),
            (SocketType::Vec4, None),
        ] {
            let (result, writer) = run(r#type, literal);

            assert_eq!(result.unwrap_err(), Skip::Unset(KEY.to_owned()));
            assert!(writer.statements().is_empty());
        }
    }

    #[test]
    fn sockets() {
        let sockets = Constant::new(SocketType::Vec2).sockets();

        assert!(sockets.inputs.is_empty());
        assert_eq!(sockets.outputs[0].r#type, Some(SocketType::Vec2));
        assert_eq!(
            sockets.controls,
            vec![Control::Literal {
                key: KEY.to_owned(),
                dimension: 2
            }]
        );
    }
}
