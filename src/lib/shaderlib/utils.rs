use crate::shader::{
    graph::Name,
    kind::{expect_type, Inputs, Side, Skip},
    sockets::{SocketType, Value},
};

/// Gather typed inputs in the given order. Every absent input is reported at once before any
/// type is checked.
pub fn require_all<'a>(
    inputs: &'a Inputs,
    sockets: &[(&str, SocketType)],
) -> Result<Vec<&'a Value>, Skip> {
    let mut missing: Vec<Name> = sockets
        .iter()
        .filter(|(name, _)| !inputs.contains_key(&Name::from(*name)))
        .map(|(name, _)| Name::from(*name))
        .collect();

    match missing.len() {
        0 => {}
        1 => return Err(Skip::Missing(Side::Input, missing.remove(0))),
        _ => return Err(Skip::MissingMany(Side::Input, missing)),
    }

    sockets
        .iter()
        .map(|&(name, r#type)| {
            let value = &inputs[&Name::from(name)];
            expect_type(name, value, r#type).map(|_| value)
        })
        .collect()
}

/// Comma-separated argument list.
pub fn arguments(values: &[&Value]) -> String {
    values
        .iter()
        .map(|value| value.variable())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod test {
    use super::*;

    fn inputs(values: &[(&str, SocketType)]) -> Inputs {
        values
            .iter()
            .map(|&(name, r#type)| (Name::from(name), Value::new(name, r#type)))
            .collect()
    }

    #[test]
    fn ordered_resolution() {
        let inputs = inputs(&[("b", SocketType::Float), ("a", SocketType::Vec3)]);
        let values =
            require_all(&inputs, &[("a", SocketType::Vec3), ("b", SocketType::Float)]).unwrap();

        assert_eq!(arguments(&values), "a, b");
    }

    #[test]
    fn missing_before_types() {
        let inputs = inputs(&[("a", SocketType::Vec2)]);

        assert_eq!(
            require_all(
                &inputs,
                &[
                    ("a", SocketType::Vec3),
                    ("b", SocketType::Float),
                    ("c", SocketType::Float)
                ]
            )
            .unwrap_err(),
            Skip::MissingMany(Side::Input, vec!["b".into(), "c".into()])
        );
        assert_eq!(
            require_all(&inputs, &[("a", SocketType::Vec3)]).unwrap_err(),
            Skip::InvalidType {
                name: "a".into(),
                got: SocketType::Vec2,
                expected: SocketType::Vec3
            }
        );
    }
}
