//! Expression templates: an ordered list of input slots and a fixed-arity formatting function.
//! Slots are resolved by position, so the `n`-th argument of the format function is always the
//! value connected to the `n`-th slot.

use super::{
    graph::Name,
    kind::{Inputs, Side, Skip},
    sockets::Value,
};

#[derive(Clone, Copy)]
/// GLSL expression over `N` named inputs.
pub struct Expression<const N: usize> {
    slots: [&'static str; N],
    format: fn([&str; N]) -> String,
}

impl<const N: usize> std::fmt::Debug for Expression<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expression")
            .field("slots", &self.slots)
            .field("sample", &self.apply(self.slots))
            .finish()
    }
}

impl<const N: usize> Expression<N> {
    #[allow(missing_docs)]
    pub const fn new(slots: [&'static str; N], format: fn([&str; N]) -> String) -> Self {
        Self { slots, format }
    }

    /// Input socket names, in positional order.
    pub fn slots(&self) -> &[&'static str; N] {
        &self.slots
    }

    /// Format the expression from already-resolved argument expressions.
    pub fn apply(&self, args: [&str; N]) -> String {
        (self.format)(args)
    }

    /// Gather the values connected to every slot, reporting all missing ones at once.
    pub fn resolve<'a>(&self, inputs: &'a Inputs) -> Result<[&'a Value; N], Skip> {
        let mut missing = Vec::new();
        let mut resolved = Vec::with_capacity(N);

        for slot in self.slots {
            match inputs.get(&Name::from(slot)) {
                Some(value) => resolved.push(value),
                None => missing.push(Name::from(slot)),
            }
        }

        match missing.len() {
            0 => Ok(resolved
                .try_into()
                .unwrap_or_else(|_| unreachable!("one value per slot"))),
            1 => Err(Skip::Missing(Side::Input, missing.remove(0))),
            _ => Err(Skip::MissingMany(Side::Input, missing)),
        }
    }

    /// Format the expression from resolved values.
    pub fn render(&self, values: &[&Value; N]) -> String {
        self.apply(values.map(Value::variable))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::shader::sockets::SocketType;

    const MIX: Expression<3> = Expression::new(["a", "b", "c"], |[a, b, c]| {
        format!("mix({a}, {b}, {c})")
    });

    fn inputs(names: &[&str]) -> Inputs {
        names
            .iter()
            .map(|&name| {
                (
                    Name::from(name),
                    Value::new(format!("{name}_var"), SocketType::Vec3),
                )
            })
            .collect()
    }

    #[test]
    fn positional_substitution() {
        let inputs = inputs(&["c", "a", "b"]);
        let values = MIX.resolve(&inputs).unwrap();

        assert_eq!(MIX.render(&values), "mix(a_var, b_var, c_var)");
        assert_eq!(MIX.apply(["x", "y", "z"]), "mix(x, y, z)");
    }

    #[test]
    fn missing_slots() {
        assert_eq!(
            MIX.resolve(&inputs(&["a", "b"])).unwrap_err(),
            Skip::Missing(Side::Input, "c".into())
        );
        assert_eq!(
            MIX.resolve(&inputs(&["b"])).unwrap_err(),
            Skip::MissingMany(Side::Input, vec!["a".into(), "c".into()])
        );
    }
}
