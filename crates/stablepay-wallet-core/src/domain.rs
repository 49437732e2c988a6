use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Non-negative token amount. Displayed with two fractional digits.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Negative values clamp to zero.
    pub fn new(value: Decimal) -> Self {
        Self(value.max(Decimal::ZERO))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount::new(self.0 - other.0)
    }

    /// `None` when the sum does not fit in a `Decimal`.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(Decimal::from(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.0.round_dp(2);
        rounded.rescale(2);
        write!(f, "{rounded}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinType {
    #[default]
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "USDT")]
    Usdt,
    #[serde(rename = "DAI")]
    Dai,
    #[serde(rename = "BUSD")]
    Busd,
    #[serde(rename = "ETH")]
    Eth,
}

impl CoinType {
    pub const ALL: [CoinType; 5] = [
        CoinType::Usdc,
        CoinType::Usdt,
        CoinType::Dai,
        CoinType::Busd,
        CoinType::Eth,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            CoinType::Usdc => "USDC",
            CoinType::Usdt => "USDT",
            CoinType::Dai => "DAI",
            CoinType::Busd => "BUSD",
            CoinType::Eth => "ETH",
        }
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for CoinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoinType::ALL
            .into_iter()
            .find(|c| c.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported coin type: {s}"))
    }
}

/// Identifiers of the custodial wallet the current UI session operates on.
#[derive(Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub identifier: String,
    pub address: String,
    private_key: Option<String>,
}

impl WalletSession {
    pub fn new(identifier: String, address: String, private_key: Option<String>) -> Self {
        Self {
            identifier,
            address,
            private_key: private_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Demo backends hand the owner key back to the client; it is only ever
    /// forwarded to the approve call.
    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref()
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("identifier", &self.identifier)
            .field("address", &self.address)
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    pub amount: Amount,
    pub coin_type: CoinType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PendingAction {
    CreatingWallet,
    Depositing,
    Approving,
    Transferring,
    RefreshingBalance,
    LoadingCustomers,
}

impl PendingAction {
    pub fn label(&self) -> &'static str {
        match self {
            PendingAction::CreatingWallet => "Creating wallet...",
            PendingAction::Depositing => "Minting...",
            PendingAction::Approving => "Approving...",
            PendingAction::Transferring => "Transferring...",
            PendingAction::RefreshingBalance => "Refreshing balance...",
            PendingAction::LoadingCustomers => "Loading customers...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// The single user-visible message slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(alias = "CUST_ID", deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unsupported customer id: {other}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerCredentials {
    pub address: String,
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOwnerAddressRequest {
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    #[serde(rename = "toAddress")]
    pub to_address: String,
    pub amount: Amount,
    pub user_name: String,
    #[serde(rename = "coinType")]
    pub coin_type: CoinType,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub user_name: String,
    #[serde(
        rename = "ownerPrivateKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_private_key: Option<String>,
    #[serde(rename = "ownerAddress")]
    pub owner_address: String,
    pub amount: Amount,
}

impl fmt::Debug for ApproveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApproveRequest")
            .field("user_name", &self.user_name)
            .field(
                "owner_private_key",
                &self.owner_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("owner_address", &self.owner_address)
            .field("amount", &self.amount)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub user_name: String,
    #[serde(rename = "fromAddress")]
    pub from_address: String,
    #[serde(rename = "toAddress")]
    pub to_address: String,
    pub amount: Amount,
    #[serde(rename = "tnxType")]
    pub tnx_type: TransactionKind,
}
