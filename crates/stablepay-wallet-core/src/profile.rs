use crate::domain::CoinType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferMode {
    /// Transfers go through the custody service's transferFrom call.
    #[default]
    Remote,
    /// Transfers only debit the cached balance.
    Simulated,
}

/// Per-screen configuration of the one wallet workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowProfile {
    pub key: &'static str,
    pub title: String,
    pub tagline: String,
    pub coin_types: Vec<CoinType>,
    pub default_coin: CoinType,
    /// Preset target addresses offered by the transfer form. Empty means free text.
    pub custodial_targets: Vec<String>,
    pub transfer_mode: TransferMode,
}

impl WorkflowProfile {
    pub fn dexi() -> Self {
        Self {
            key: "dexi",
            title: "DEXI".to_owned(),
            tagline: "DEXI plays Payer role to purchase stablecoins and transfer to Custodial \
                      wallet at Payer bank"
                .to_owned(),
            coin_types: vec![CoinType::Usdc, CoinType::Eth, CoinType::Dai],
            default_coin: CoinType::Usdc,
            custodial_targets: vec![
                "0xCustodial1A2B3C4D5E6F7G8H9I0J1K2L3M4N5O6P7Q8R9S0T".to_owned(),
                "0xCustodial2B3C4D5E6F7G8H9I0J1K2L3M4N5O6P7Q8R9S0T1U".to_owned(),
                "0xCustodial3C4D5E6F7G8H9I0J1K2L3M4N5O6P7Q8R9S0T1U2V".to_owned(),
            ],
            transfer_mode: TransferMode::Remote,
        }
    }

    pub fn dex_simulator() -> Self {
        Self {
            key: "dex-sim",
            title: "DEX Simulator".to_owned(),
            tagline: "Create a wallet, deposit, approve an allowance and transfer.".to_owned(),
            coin_types: vec![CoinType::Usdc],
            default_coin: CoinType::Usdc,
            custodial_targets: Vec::new(),
            transfer_mode: TransferMode::Simulated,
        }
    }

    pub fn stablepay() -> Self {
        Self {
            key: "stablepay",
            title: "StablePay".to_owned(),
            tagline: "Custodial stablecoin wallets".to_owned(),
            coin_types: vec![CoinType::Usdc, CoinType::Usdt, CoinType::Dai, CoinType::Busd],
            default_coin: CoinType::Usdc,
            custodial_targets: Vec::new(),
            transfer_mode: TransferMode::Remote,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "dexi" => Some(Self::dexi()),
            "dex-sim" | "dex_sim" | "dex-simulator" => Some(Self::dex_simulator()),
            "stablepay" => Some(Self::stablepay()),
            _ => None,
        }
    }
}

impl Default for WorkflowProfile {
    fn default() -> Self {
        Self::dexi()
    }
}
