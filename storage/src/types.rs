use chrono::{DateTime, NaiveDate, Utc};
use pfm_risk::Position;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asset class of an investment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentKind {
    #[default]
    Stock,
    Etf,
    Bond,
    Crypto,
    Fund,
    #[serde(other)]
    Other,
}

/// Investment record held in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: InvestmentKind,
    pub quantity: f64,
    pub purchase_price: f64,
    #[serde(default)]
    pub current_price: Option<f64>,
    pub purchase_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Investment {
    /// Risk-core view of this record
    pub fn to_position(&self) -> Position {
        Position {
            id: self.id,
            symbol: self.symbol.clone(),
            quantity: self.quantity,
            acquisition_price: self.purchase_price,
            current_price: self.current_price,
        }
    }
}

/// Fields of a new investment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvestment {
    pub symbol: String,
    /// Display name, the symbol when empty
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: InvestmentKind,
    pub quantity: f64,
    pub purchase_price: f64,
    pub purchase_date: NaiveDate,
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl NewInvestment {
    pub fn new(
        symbol: impl Into<String>,
        quantity: f64,
        purchase_price: f64,
        purchase_date: NaiveDate,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: String::new(),
            kind: InvestmentKind::default(),
            quantity,
            purchase_price,
            purchase_date,
            current_price: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_kind(mut self, kind: InvestmentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_current_price(mut self, price: f64) -> Self {
        self.current_price = Some(price);
        self
    }
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentUpdate {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<InvestmentKind>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
}

impl InvestmentUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Serialized form of the whole ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default = "default_snapshot_version")]
    pub version: u32,
    #[serde(default)]
    pub investments: Vec<Investment>,
}

impl LedgerSnapshot {
    pub fn new(investments: Vec<Investment>) -> Self {
        Self {
            version: default_snapshot_version(),
            investments,
        }
    }
}

fn default_snapshot_version() -> u32 {
    1
}
