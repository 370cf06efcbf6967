//! In-memory investment ledger with optional snapshot autosave

use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::types::{Investment, InvestmentUpdate, LedgerSnapshot, NewInvestment};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use pfm_risk::{LedgerStore, Position, Result as RiskResult};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// In-memory investment ledger, insertion-ordered
pub struct MemoryLedger {
    investments: RwLock<IndexMap<Uuid, Investment>>,
    config: StorageConfig,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new(config: StorageConfig) -> Self {
        Self {
            investments: RwLock::new(IndexMap::new()),
            config,
        }
    }

    /// Create a ledger, loading `seed_file` when it exists
    pub async fn open(config: StorageConfig) -> Result<Self> {
        config.validate()?;

        let ledger = Self::new(config);
        if let Some(path) = &ledger.config.seed_file {
            if tokio::fs::try_exists(path).await? {
                let snapshot = Self::load(path).await?;
                info!(
                    "Loaded {} investments from {}",
                    snapshot.investments.len(),
                    path.display()
                );
                ledger.restore(snapshot).await?;
            } else {
                info!("Seed file {} not found, starting with an empty ledger", path.display());
            }
        }

        Ok(ledger)
    }

    /// Add an investment
    pub async fn create(&self, new: NewInvestment) -> Result<Investment> {
        let symbol = normalize_symbol(&new.symbol);
        let name = if new.name.trim().is_empty() {
            symbol.clone()
        } else {
            new.name.trim().to_string()
        };

        let investment = Investment {
            id: Uuid::new_v4(),
            symbol,
            name,
            kind: new.kind,
            quantity: new.quantity,
            purchase_price: new.purchase_price,
            current_price: new.current_price,
            purchase_date: new.purchase_date,
            created_at: Utc::now(),
        };
        validate(&investment)?;

        let created = investment.clone();
        self.commit(move |investments| {
            investments.insert(investment.id, investment);
            Ok(())
        })
        .await?;
        debug!("Created investment {} ({})", created.id, created.symbol);

        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<Investment> {
        let investments = self.investments.read().await;
        investments.get(&id).cloned().ok_or(StorageError::NotFound(id))
    }

    /// All investments in insertion order
    pub async fn list(&self) -> Vec<Investment> {
        let investments = self.investments.read().await;
        investments.values().cloned().collect()
    }

    /// Apply a partial update; the record is unchanged if the result is invalid
    pub async fn update(&self, id: Uuid, update: InvestmentUpdate) -> Result<Investment> {
        let updated = self
            .commit(|investments| {
                let current = investments.get_mut(&id).ok_or(StorageError::NotFound(id))?;

                let mut candidate = current.clone();
                if let Some(symbol) = update.symbol {
                    candidate.symbol = normalize_symbol(&symbol);
                }
                if let Some(name) = update.name {
                    candidate.name = name.trim().to_string();
                }
                if let Some(kind) = update.kind {
                    candidate.kind = kind;
                }
                if let Some(quantity) = update.quantity {
                    candidate.quantity = quantity;
                }
                if let Some(price) = update.purchase_price {
                    candidate.purchase_price = price;
                }
                if let Some(price) = update.current_price {
                    candidate.current_price = Some(price);
                }
                if let Some(date) = update.purchase_date {
                    candidate.purchase_date = date;
                }
                validate(&candidate)?;

                *current = candidate.clone();
                Ok(candidate)
            })
            .await?;
        debug!("Updated investment {}", id);

        Ok(updated)
    }

    /// Remove an investment, keeping the order of the others
    pub async fn delete(&self, id: Uuid) -> Result<Investment> {
        let removed = self
            .commit(|investments| investments.shift_remove(&id).ok_or(StorageError::NotFound(id)))
            .await?;
        debug!("Deleted investment {} ({})", id, removed.symbol);

        Ok(removed)
    }

    /// Record the latest market price of an investment
    pub async fn set_current_price(&self, id: Uuid, price: f64) -> Result<()> {
        validate_current_price(price)?;
        self.commit(|investments| {
            let investment = investments.get_mut(&id).ok_or(StorageError::NotFound(id))?;
            investment.current_price = Some(price);
            Ok(())
        })
        .await
    }

    pub async fn len(&self) -> usize {
        self.investments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.investments.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(self.list().await)
    }

    /// Replace the ledger content with a validated snapshot
    pub async fn restore(&self, snapshot: LedgerSnapshot) -> Result<()> {
        let mut restored = IndexMap::with_capacity(snapshot.investments.len());
        for mut investment in snapshot.investments {
            investment.symbol = normalize_symbol(&investment.symbol);
            validate(&investment)?;
            if restored.insert(investment.id, investment).is_some() {
                return Err(StorageError::InvalidParameters(
                    "Snapshot contains duplicate investment ids".to_string(),
                ));
            }
        }

        *self.investments.write().await = restored;
        Ok(())
    }

    /// Write the snapshot to `path`; format follows the file extension
    pub async fn save(&self, path: &Path) -> Result<()> {
        write_snapshot(path, &self.snapshot().await).await
    }

    /// Read a snapshot file
    pub async fn load(path: &Path) -> Result<LedgerSnapshot> {
        let contents = tokio::fs::read_to_string(path).await?;
        let snapshot = match extension(path).as_deref() {
            Some("json") => serde_json::from_str(&contents)?,
            _ => serde_yaml::from_str(&contents)?,
        };
        Ok(snapshot)
    }

    /// Apply `change` under the write lock.
    ///
    /// With autosave the change is made on a copy, written to `seed_file`
    /// and only then swapped in, so a failed write leaves the ledger as it was.
    /// `change` must not modify the map before returning an error.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut IndexMap<Uuid, Investment>) -> Result<T>,
    ) -> Result<T> {
        let mut investments = self.investments.write().await;

        let Some(path) = self.autosave_path() else {
            return change(&mut *investments);
        };

        let mut candidate = investments.clone();
        let output = change(&mut candidate)?;
        let snapshot = LedgerSnapshot::new(candidate.values().cloned().collect());
        if let Err(e) = write_snapshot(path, &snapshot).await {
            warn!("Autosave to {} failed, change discarded: {}", path.display(), e);
            return Err(e);
        }

        *investments = candidate;
        Ok(output)
    }

    fn autosave_path(&self) -> Option<&Path> {
        if !self.config.autosave {
            return None;
        }
        if self.config.seed_file.is_none() {
            warn!("Autosave enabled without seed_file, skipping");
        }
        self.config.seed_file.as_deref()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn list_positions(&self) -> RiskResult<Vec<Position>> {
        let investments = self.investments.read().await;
        Ok(investments.values().map(Investment::to_position).collect())
    }

    async fn update_current_price(&self, id: Uuid, price: f64) -> RiskResult<()> {
        self.set_current_price(id, price).await.map_err(Into::into)
    }
}

/// Serialize by file extension, write to a temp file and rename over `path`
async fn write_snapshot(path: &Path, snapshot: &LedgerSnapshot) -> Result<()> {
    let contents = match extension(path).as_deref() {
        Some("json") => serde_json::to_string_pretty(snapshot)?,
        _ => serde_yaml::to_string(snapshot)?,
    };

    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;

    debug!("Saved {} investments to {}", snapshot.investments.len(), path.display());
    Ok(())
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn validate(investment: &Investment) -> Result<()> {
    if investment.symbol.is_empty() {
        return Err(StorageError::InvalidParameters(
            "symbol must not be empty".to_string(),
        ));
    }
    if !(investment.quantity.is_finite() && investment.quantity >= 0.0) {
        return Err(StorageError::InvalidParameters(format!(
            "quantity must be a non-negative number, got {}",
            investment.quantity
        )));
    }
    if !(investment.purchase_price.is_finite() && investment.purchase_price >= 0.0) {
        return Err(StorageError::InvalidParameters(format!(
            "purchase_price must be a non-negative number, got {}",
            investment.purchase_price
        )));
    }
    if let Some(price) = investment.current_price {
        validate_current_price(price)?;
    }
    Ok(())
}

fn validate_current_price(price: f64) -> Result<()> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(StorageError::InvalidParameters(format!(
            "current_price must be positive, got {}",
            price
        )))
    }
}
