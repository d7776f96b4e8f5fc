// Copyright (c) 2024 The Botho Foundation

//! Public account records and their signing capabilities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The CAIP-2 namespace of EVM chains.
pub const EIP155_NAMESPACE: &str = "eip155:";

/// A signing method an externally-owned account supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EthMethod {
    /// EIP-191 personal message signing
    #[serde(rename = "personal_sign")]
    PersonalSign,

    /// Raw 32-byte digest signing
    #[serde(rename = "eth_sign")]
    Sign,

    /// Transaction signing, legacy and EIP-1559
    #[serde(rename = "eth_signTransaction")]
    SignTransaction,

    /// Legacy (pre-EIP-712) typed-data signing
    #[serde(rename = "eth_signTypedData_v1")]
    SignTypedDataV1,

    /// EIP-712 typed-data signing, version 3
    #[serde(rename = "eth_signTypedData_v3")]
    SignTypedDataV3,

    /// EIP-712 typed-data signing, version 4
    #[serde(rename = "eth_signTypedData_v4")]
    SignTypedDataV4,
}

impl EthMethod {
    /// The canonical capability set granted to every new account.
    pub const ALL: [EthMethod; 6] = [
        EthMethod::PersonalSign,
        EthMethod::Sign,
        EthMethod::SignTransaction,
        EthMethod::SignTypedDataV1,
        EthMethod::SignTypedDataV3,
        EthMethod::SignTypedDataV4,
    ];

    /// The method's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EthMethod::PersonalSign => "personal_sign",
            EthMethod::Sign => "eth_sign",
            EthMethod::SignTransaction => "eth_signTransaction",
            EthMethod::SignTypedDataV1 => "eth_signTypedData_v1",
            EthMethod::SignTypedDataV3 => "eth_signTypedData_v3",
            EthMethod::SignTypedDataV4 => "eth_signTypedData_v4",
        }
    }
}

impl std::fmt::Display for EthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal_sign" => Ok(EthMethod::PersonalSign),
            "eth_sign" => Ok(EthMethod::Sign),
            "eth_signTransaction" => Ok(EthMethod::SignTransaction),
            "eth_signTypedData_v1" => Ok(EthMethod::SignTypedDataV1),
            "eth_signTypedData_v3" => Ok(EthMethod::SignTypedDataV3),
            "eth_signTypedData_v4" => Ok(EthMethod::SignTypedDataV4),
            _ => Err(format!("Unknown signing method: {}", s)),
        }
    }
}

/// The account-type tag of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    /// An externally-owned account on an EVM chain
    #[default]
    #[serde(rename = "eip155:eoa")]
    Eoa,
}

/// Public record describing one custodied signing identity.
///
/// The address, capability set, type and options bag are fixed at
/// creation; only the display name may change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringAccount {
    /// Opaque unique identifier (UUID)
    pub id: String,

    /// Optional display name, the only mutable field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// EIP-55 checksummed address
    pub address: String,

    /// Options bag supplied at creation (key material stripped)
    #[serde(default)]
    pub options: Map<String, Value>,

    /// Signing methods this account supports
    pub methods: Vec<EthMethod>,

    /// Account type tag
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_wire_names_round_trip() {
        for method in EthMethod::ALL {
            let parsed: EthMethod = method.as_str().parse().unwrap();
            assert_eq!(parsed, method);
        }
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!("eth_sendTransaction".parse::<EthMethod>().is_err());
        assert!("".parse::<EthMethod>().is_err());
    }

    #[test]
    fn test_account_serialization_shape() {
        let account = KeyringAccount {
            id: "3ac710e2-42ae-4f64-a55f-1b5390c45f73".to_string(),
            name: None,
            address: "0x0000000000000000000000000000000000000001".to_string(),
            options: Map::new(),
            methods: EthMethod::ALL.to_vec(),
            account_type: AccountType::Eoa,
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["type"], "eip155:eoa");
        assert_eq!(json["methods"][0], "personal_sign");
        // The absent display name is omitted entirely.
        assert!(json.get("name").is_none());

        let restored: KeyringAccount = serde_json::from_value(json).unwrap();
        assert_eq!(restored, account);
    }
}
