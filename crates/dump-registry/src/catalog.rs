//! Swappable in-memory token catalog.

use crate::error::{RegistryError, RegistryResult};
use dump_core::{ContractId, Network, TokenView};
use dump_detector::TokenRegistry;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable, validated catalog contents.
#[derive(Debug, Default)]
pub struct CatalogState {
    tokens: Vec<TokenView>,
    /// contract -> index into `tokens`
    by_contract: HashMap<ContractId, usize>,
}

impl CatalogState {
    /// Validate and index `tokens`.
    ///
    /// Every token needs a non-empty symbol and at least one contract, and
    /// no contract may belong to two tokens. A contract listed twice by the
    /// same token is indexed once.
    pub fn build(tokens: Vec<TokenView>) -> RegistryResult<Self> {
        let mut by_contract = HashMap::new();
        for (index, token) in tokens.iter().enumerate() {
            if token.symbol.trim().is_empty() {
                return Err(RegistryError::InvalidToken(format!(
                    "tokens[{index}]: symbol is empty"
                )));
            }
            if token.contracts.is_empty() {
                return Err(RegistryError::InvalidToken(format!(
                    "{}: no contracts",
                    token.symbol
                )));
            }
            for contract in &token.contracts {
                if let Some(&other) = by_contract.get(contract) {
                    if other == index {
                        debug!(%contract, symbol = %token.symbol, "Repeated contract in token, skipping");
                        continue;
                    }
                    let first: &TokenView = &tokens[other];
                    return Err(RegistryError::DuplicateContract {
                        contract: contract.to_string(),
                        first: first.symbol.clone(),
                        second: token.symbol.clone(),
                    });
                }
                by_contract.insert(contract.clone(), index);
            }
        }
        Ok(Self {
            tokens,
            by_contract,
        })
    }

    pub fn tokens(&self) -> &[TokenView] {
        &self.tokens
    }

    pub fn get(&self, contract: &ContractId) -> Option<&TokenView> {
        self.by_contract.get(contract).map(|&i| &self.tokens[i])
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ContractId> {
        self.by_contract.keys()
    }
}

/// Token catalog implementing [`TokenRegistry`].
///
/// Readers take an `Arc` of the current state and never block a
/// [`replace`](Self::replace) for longer than the pointer swap.
pub struct TokenCatalog {
    enabled_networks: BTreeSet<Network>,
    state: RwLock<Arc<CatalogState>>,
}

impl TokenCatalog {
    /// Empty catalog tracking contracts on `enabled_networks` only.
    pub fn new(enabled_networks: impl IntoIterator<Item = Network>) -> Self {
        Self {
            enabled_networks: enabled_networks.into_iter().collect(),
            state: RwLock::new(Arc::new(CatalogState::default())),
        }
    }

    /// Catalog pre-filled with `tokens`.
    pub fn with_tokens(
        enabled_networks: impl IntoIterator<Item = Network>,
        tokens: Vec<TokenView>,
    ) -> RegistryResult<Self> {
        let catalog = Self::new(enabled_networks);
        catalog.replace(tokens)?;
        Ok(catalog)
    }

    /// Swap in a new token set. On error the current set is kept.
    pub fn replace(&self, tokens: Vec<TokenView>) -> RegistryResult<()> {
        let next = Arc::new(CatalogState::build(tokens)?);
        let token_count = next.tokens().len();
        let contract_count = next.by_contract.len();
        *self.state.write() = next;
        info!(
            tokens = token_count,
            contracts = contract_count,
            tracked = self.tracked_contracts().len(),
            "Token catalog replaced"
        );
        Ok(())
    }

    /// Current contents.
    pub fn snapshot(&self) -> Arc<CatalogState> {
        self.state.read().clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().tokens().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn enabled_networks(&self) -> &BTreeSet<Network> {
        &self.enabled_networks
    }
}

impl TokenRegistry for TokenCatalog {
    fn tracked_contracts(&self) -> BTreeSet<ContractId> {
        let state = self.snapshot();
        let tracked: BTreeSet<ContractId> = state
            .contracts()
            .filter(|c| self.enabled_networks.contains(&c.network()))
            .cloned()
            .collect();
        debug!(tracked = tracked.len(), "Tracked contracts listed");
        tracked
    }

    fn resolve(&self, contract: &ContractId) -> Option<TokenView> {
        self.snapshot().get(contract).cloned()
    }
}
