use super::Feature;
use super::builtin;
use crate::engine::error::EngineError;
use std::collections::{BTreeMap, HashSet};

pub type FeatureFactory = fn() -> Box<dyn Feature>;

/// Maps feature names to factories.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    factories: BTreeMap<&'static str, FeatureFactory>,
}

impl FeatureRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in feature.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for factory in builtin::FACTORIES {
            registry.register(factory);
        }
        registry
    }

    /// Registers `factory` under the name of the feature it produces, replacing any
    /// earlier factory of the same name.
    pub fn register(&mut self, factory: FeatureFactory) {
        let name = factory().name();
        self.factories.insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Feature>, EngineError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| EngineError::UnknownFeature(name.to_string()))
    }

    /// Instantiates the named features in order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownFeature`] for a name that is not registered and
    /// [`EngineError::MalformedInput`] for a name listed twice.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Box<dyn Feature>>, EngineError> {
        let mut seen = HashSet::new();
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                if !seen.insert(name) {
                    return Err(EngineError::MalformedInput(format!(
                        "feature '{}' is listed more than once",
                        name
                    )));
                }
                self.create(name)
            })
            .collect()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::DEFAULT_FEATURES;

    #[test]
    fn builtin_registry_knows_every_default_feature() {
        let registry = FeatureRegistry::with_builtin();
        for name in DEFAULT_FEATURES {
            assert!(registry.contains(name), "missing {}", name);
        }
        let features = registry.resolve(&DEFAULT_FEATURES).unwrap();
        let names: Vec<_> = features.iter().map(|f| f.name()).collect();
        assert_eq!(names, DEFAULT_FEATURES);
    }

    #[test]
    fn builtin_names_are_sorted_and_complete() {
        let registry = FeatureRegistry::with_builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "Atom0",
                "Atom0Bonds",
                "Atom0Count",
                "Atom0Electronegativity",
                "Atom1",
                "Atom1Bonds",
                "Atom1Count",
                "Atom1Electronegativity",
                "Distance",
                "MoleculeCount",
                "MoleculeDistanceStatistics",
                "Type",
                "Type0",
                "Type1",
                "TypeDistanceStatistics",
            ]
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        let registry = FeatureRegistry::with_builtin();
        let result = registry.resolve(&["MoleculeCount", "Bogus"]);
        assert!(matches!(result, Err(EngineError::UnknownFeature(name)) if name == "Bogus"));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let registry = FeatureRegistry::with_builtin();
        let result = registry.resolve(&["Type", "Type"]);
        assert!(matches!(result, Err(EngineError::MalformedInput(_))));
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = FeatureRegistry::new();
        assert!(matches!(
            registry.create("Type"),
            Err(EngineError::UnknownFeature(_))
        ));
    }
}
