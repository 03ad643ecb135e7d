use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::ports::ProviderSource;
use crate::provider::FixProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub id: String,
    pub fixable_diagnostic_ids: BTreeSet<String>,
}

impl ProviderDescriptor {
    pub fn can_fix(&self, diagnostic_id: &str) -> bool {
        self.fixable_diagnostic_ids.contains(diagnostic_id)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("provider `{id}` is registered more than once")]
    DuplicateProvider { id: String },
}

struct Entry {
    descriptor: ProviderDescriptor,
    provider: Arc<dyn FixProvider>,
}

/// Immutable set of providers, in registration order.
///
/// Built once at startup and shared read-only afterwards.
pub struct ProviderRegistry {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.descriptor))
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn FixProvider>>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(providers.len());

        for provider in providers {
            let id = provider.id().to_string();
            if !seen.insert(id.clone()) {
                return Err(RegistryError::DuplicateProvider { id });
            }

            let fixable_diagnostic_ids = provider.fixable_diagnostic_ids();
            if fixable_diagnostic_ids.is_empty() {
                warn!(provider = %id, "provider declares no fixable diagnostics");
            }
            debug!(provider = %id, rules = fixable_diagnostic_ids.len(), "registered fix provider");

            entries.push(Entry {
                descriptor: ProviderDescriptor {
                    id,
                    fixable_diagnostic_ids,
                },
                provider,
            });
        }

        Ok(Self { entries })
    }

    pub fn from_source(source: &dyn ProviderSource) -> Result<Self, RegistryError> {
        Self::new(source.providers())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Descriptors of providers that can fix `diagnostic_id`, in registration order.
    pub fn applicable_providers<'a>(
        &'a self,
        diagnostic_id: &str,
    ) -> Vec<&'a ProviderDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.can_fix(diagnostic_id))
            .map(|e| &e.descriptor)
            .collect()
    }

    pub(crate) fn applicable<'a>(
        &'a self,
        diagnostic_id: &'a str,
    ) -> impl Iterator<Item = (&'a ProviderDescriptor, &'a dyn FixProvider)> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.descriptor.can_fix(diagnostic_id))
            .map(|e| (&e.descriptor, e.provider.as_ref()))
    }
}
