//! Provider selection by configuration key.

use std::collections::HashMap;
use std::sync::Arc;

use converter_types::{ProviderError, ProviderKey, RateProvider};

use crate::frankfurter::{FrankfurterOptions, FrankfurterProvider};
use crate::resilience::ResilienceOptions;

/// Explicit mapping from [`ProviderKey`] to provider, resolved once at startup.
///
/// Construction fails if the active key has no registered provider, so
/// [`ProviderRegistry::active`] never fails at request time.
pub struct ProviderRegistry {
    active_key: ProviderKey,
    active: Arc<dyn RateProvider>,
    providers: HashMap<ProviderKey, Arc<dyn RateProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("active_key", &self.active_key)
            .field("registered", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new(
        active_key: ProviderKey,
        providers: HashMap<ProviderKey, Arc<dyn RateProvider>>,
    ) -> Result<Self, ProviderError> {
        let active = providers
            .get(&active_key)
            .cloned()
            .ok_or(ProviderError::NotRegistered(active_key))?;

        Ok(Self {
            active_key,
            active,
            providers,
        })
    }

    /// Builds the registry with every built-in provider.
    pub fn from_options(
        active_key: ProviderKey,
        frankfurter: FrankfurterOptions,
        resilience: ResilienceOptions,
    ) -> Result<Self, ProviderError> {
        let mut providers: HashMap<ProviderKey, Arc<dyn RateProvider>> = HashMap::new();
        providers.insert(
            ProviderKey::Frankfurter,
            Arc::new(FrankfurterProvider::new(frankfurter, resilience)?),
        );

        tracing::info!(provider = %active_key, "Currency provider selected");
        Self::new(active_key, providers)
    }

    pub fn active(&self) -> Arc<dyn RateProvider> {
        self.active.clone()
    }

    pub fn active_key(&self) -> ProviderKey {
        self.active_key
    }

    pub fn get(&self, key: ProviderKey) -> Option<Arc<dyn RateProvider>> {
        self.providers.get(&key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_active_key_fails_at_construction() {
        let err = ProviderRegistry::new(ProviderKey::Frankfurter, HashMap::new()).unwrap_err();
        assert!(matches!(err, ProviderError::NotRegistered(ProviderKey::Frankfurter)));
        assert_eq!(
            err.to_string(),
            "No currency provider registered for key 'frankfurter'"
        );
    }

    #[test]
    fn test_from_options_resolves_frankfurter() {
        let registry = ProviderRegistry::from_options(
            ProviderKey::Frankfurter,
            FrankfurterOptions::default(),
            ResilienceOptions::default(),
        )
        .unwrap();

        assert_eq!(registry.active_key(), ProviderKey::Frankfurter);
        assert!(registry.get(ProviderKey::Frankfurter).is_some());
        assert!(Arc::ptr_eq(
            &registry.active(),
            &registry.get(ProviderKey::Frankfurter).unwrap()
        ));
    }
}
