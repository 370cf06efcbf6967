//! Ledger store trait
//!
//! The ledger owns positions. Risk computation only reads them; price refresh
//! writes back the latest known price of a position.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::Position;

/// Ledger store interface
///
/// Implementations map their own failures to `RiskError::Ledger`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// All held positions
    async fn list_positions(&self) -> Result<Vec<Position>>;

    /// Record the latest market price of a position
    async fn update_current_price(&self, id: Uuid, price: f64) -> Result<()>;
}
