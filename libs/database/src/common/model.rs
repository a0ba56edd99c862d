use std::collections::HashMap;

/// A document type that can be stored in a collection.
///
/// `NAME` identifies the model in the [`ModelRegistry`]; it is also what
/// error messages report when the model has not been registered.
pub trait Model: Send + Sync + 'static {
    const NAME: &'static str;
}

/// Registration record for one model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelMetadata {
    pub model: &'static str,
    pub collection: String,
}

/// Startup-time table mapping models to the collections that back them.
///
/// # Example
/// ```ignore
/// let registry = ModelRegistry::new()
///     .with::<Note>("notes")
///     .with::<User>("users");
/// ```
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<&'static str, ModelMetadata>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` against `collection`, replacing any earlier registration.
    pub fn register<T: Model>(&mut self, collection: impl Into<String>) -> &mut Self {
        self.models.insert(
            T::NAME,
            ModelMetadata {
                model: T::NAME,
                collection: collection.into(),
            },
        );
        self
    }

    pub fn with<T: Model>(mut self, collection: impl Into<String>) -> Self {
        self.register::<T>(collection);
        self
    }

    pub fn metadata<T: Model>(&self) -> Option<&ModelMetadata> {
        self.resolve(T::NAME)
    }

    pub fn resolve(&self, model: &str) -> Option<&ModelMetadata> {
        self.models.get(model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note;
    impl Model for Note {
        const NAME: &'static str = "Note";
    }

    struct Author;
    impl Model for Author {
        const NAME: &'static str = "Author";
    }

    #[test]
    fn test_registered_model_resolves_to_collection() {
        let registry = ModelRegistry::new().with::<Note>("notes");

        let metadata = registry.metadata::<Note>().unwrap();
        assert_eq!(metadata.model, "Note");
        assert_eq!(metadata.collection, "notes");
        assert_eq!(registry.resolve("Note"), Some(metadata));
    }

    #[test]
    fn test_unregistered_model_is_absent() {
        let registry = ModelRegistry::new().with::<Note>("notes");
        assert!(registry.metadata::<Author>().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_replaces_previous_collection() {
        let mut registry = ModelRegistry::new();
        registry.register::<Note>("notes").register::<Note>("archived_notes");

        assert_eq!(registry.metadata::<Note>().unwrap().collection, "archived_notes");
        assert_eq!(registry.len(), 1);
    }
}
