use crate::config::BrokerConfig;
use crate::storage::Transaction;

/// One broker endpoint the gateway may try
#[derive(Debug, Clone)]
pub struct BrokerProvider {
    pub name: String,
    pub endpoint: String,
    pub api_key: String,
}

/// Which providers to try for a transaction, and in what order.
///
/// Injected into the gateway so the policy is explicit instead of
/// hiding in global configuration.
pub trait BrokerSelectionStrategy: Send + Sync {
    fn providers_for(&self, tx: &Transaction) -> Vec<BrokerProvider>;
}

/// Default policy: the configured provider list, in file order.
pub struct ConfiguredOrderStrategy {
    providers: Vec<BrokerProvider>,
}

impl ConfiguredOrderStrategy {
    pub fn new(providers: Vec<BrokerProvider>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &BrokerConfig) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|p| BrokerProvider {
                name: p.name.clone(),
                endpoint: p.endpoint.clone(),
                api_key: p.api_key.clone(),
            })
            .collect();
        Self { providers }
    }
}

impl BrokerSelectionStrategy for ConfiguredOrderStrategy {
    fn providers_for(&self, _tx: &Transaction) -> Vec<BrokerProvider> {
        self.providers.clone()
    }
}
