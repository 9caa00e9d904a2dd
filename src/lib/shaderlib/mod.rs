//! Built-in node kinds and the catalogue resolving node kind names.

mod utils;

pub mod arithmetic;
pub mod constant;
pub mod function;
pub mod geometry;
pub mod output;
pub mod shading;
pub mod texture;

use crate::shader::{
    graph::Name,
    kind::NodeKind,
    parsing::PResult,
    sockets::SocketType,
};

use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
/// Registry of node kinds, grouped by editor menu category.
pub struct Catalogue {
    kinds: BTreeMap<Name, Box<dyn NodeKind>>,
    categories: Vec<(String, Vec<Name>)>,
}

macro_rules! create_catalogue {
    (
        $($category:literal: [$($kind:expr),+ $(,)?]),+;
        $($parsed:literal: $sources:expr),* $(,)?
    ) => {
        /// Catalogue of every built-in node kind.
        pub fn standard() -> PResult<Self> {
            let mut catalogue = Self::new();
            $(
                $(
                    catalogue.register($category, $kind);
                )+
            )+
            $(
                for source in $sources {
                    catalogue.register($parsed, function::FunctionNode::new(source)?);
                }
            )*
            Ok(catalogue)
        }
    };
}

impl Catalogue {
    /// Create an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    create_catalogue! {
        "Input": [geometry::Geometry],
        "Output": [output::FragColor],
        "Math": [
            arithmetic::add(),
            arithmetic::subtract(),
            arithmetic::multiply(),
            arithmetic::divide(),
            arithmetic::dot(),
            arithmetic::cross(),
            arithmetic::mix(),
        ],
        "Constant": [
            constant::Constant::new(SocketType::Float),
            constant::Constant::new(SocketType::Vec2),
            constant::Constant::new(SocketType::Vec3),
            constant::Constant::new(SocketType::Vec4),
        ],
        "ShadingModel": [shading::blinn_phong(), shading::standard(), shading::cloth()],
        "Map": [texture::Texture, texture::NormalMap];
        "ToneMapping": function::TONE_MAPPING,
    }

    /// Shared copy of the [standard](Self::standard) catalogue, parsed once.
    pub fn shared() -> PResult<Self> {
        SHADERLIB.clone()
    }

    /// Register a node kind under a category. A kind registered twice replaces the previous
    /// one and keeps its first category.
    pub fn register(&mut self, category: &str, kind: impl NodeKind + 'static) -> &mut Self {
        let name = Name::from(kind.name());

        if self.kinds.insert(name.clone(), Box::new(kind)).is_some() {
            log::warn!("Node kind `{name}` registered twice, keeping the latest");
            return self;
        }

        match self
            .categories
            .iter()
            .position(|(existing, _)| existing == category)
        {
            Some(index) => self.categories[index].1.push(name),
            None => self.categories.push((category.to_owned(), vec![name])),
        }

        self
    }

    /// Look a node kind up by name.
    pub fn get(&self, name: &Name) -> Option<&dyn NodeKind> {
        self.kinds.get(name).map(Box::as_ref)
    }

    /// Check whether a node kind is registered.
    pub fn contains(&self, name: &Name) -> bool {
        self.kinds.contains_key(name)
    }

    /// Categories and their node kind names, in registration order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Name])> {
        self.categories
            .iter()
            .map(|(category, names)| (category.as_str(), names.as_slice()))
    }

    /// Every registered node kind name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.kinds.keys()
    }
}

lazy_static::lazy_static! {
    static ref SHADERLIB: PResult<Catalogue> = Catalogue::standard();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_catalogue() {
        let catalogue = Catalogue::shared().unwrap();

        for name in [
            "Geometry",
            "FragColor",
            "Add",
            "Mix",
            "ConstantVector3",
            "Standard",
            "Cloth",
            "NormalMap",
            "ReinhardToneMapping",
        ] {
            assert!(catalogue.contains(&name.into()), "{name} is missing");
        }
        assert_eq!(catalogue.names().count(), 22);
        assert!(catalogue.get(&"Unknown".into()).is_none());
    }

    #[test]
    fn categories() {
        let catalogue = Catalogue::standard().unwrap();
        let categories: Vec<&str> = catalogue.categories().map(|(category, _)| category).collect();

        assert_eq!(
            categories,
            vec!["Input", "Output", "Math", "Constant", "ShadingModel", "Map", "ToneMapping"]
        );

        let (_, shading) = catalogue
            .categories()
            .find(|(category, _)| *category == "ShadingModel")
            .unwrap();
        assert_eq!(
            shading,
            &[
                Name::from("BlinnPhong"),
                Name::from("Standard"),
                Name::from("Cloth")
            ]
        );
    }

    #[test]
    fn only_fragcolor_is_a_sink() {
        let catalogue = Catalogue::standard().unwrap();
        let sinks: Vec<&Name> = catalogue
            .names()
            .filter(|name| catalogue.get(name).map_or(false, |kind| kind.is_sink()))
            .collect();

        assert_eq!(sinks, vec![&Name::from("FragColor")]);
    }

    #[test]
    fn reregistration() {
        let mut catalogue = Catalogue::new();
        catalogue
            .register("Math", arithmetic::add())
            .register("Other", arithmetic::add());

        assert_eq!(catalogue.names().count(), 1);
        assert_eq!(catalogue.categories().count(), 1);
    }
}
