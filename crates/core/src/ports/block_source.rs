//! Port trait for the block extract source.
//!
//! Acquisition of raw block data lives outside the core. This module fixes
//! the shape of one block extract and the stream contract a source must
//! honour: finite, ordered by ascending height, lazily produced.

use async_trait::async_trait;
use futures::Stream;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::pin::Pin;

use crate::error::ChainResult;

/// One block extract: header plus every record the block carries.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    pub header: RawHeader,
    /// Extrinsics in block order.
    #[serde(default)]
    pub extrinsics: Vec<RawExtrinsic>,
    /// Calls in source enumeration order (children before parents).
    #[serde(default)]
    pub calls: Vec<RawCall>,
    /// Events in block order.
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

impl RawBlock {
    pub fn height(&self) -> u64 {
        self.header.height
    }
}

/// Block header as delivered by the source. Hashes are hex strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHeader {
    pub id: String,
    pub height: u64,
    pub hash: String,
    pub parent_hash: String,
    pub state_root: String,
    pub extrinsics_root: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub spec_name: String,
    pub spec_version: u32,
    pub impl_name: String,
    pub impl_version: u32,
    #[serde(default)]
    pub validator: Option<String>,
}

/// Raw extrinsic record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtrinsic {
    pub id: String,
    pub index: u32,
    pub version: u32,
    pub hash: String,
    #[serde(default)]
    pub signature: Option<serde_json::Value>,
    pub success: bool,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_opt_u128")]
    pub fee: Option<u128>,
    #[serde(default, deserialize_with = "deserialize_opt_u128")]
    pub tip: Option<u128>,
}

/// Raw call record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCall {
    pub id: String,
    pub extrinsic_id: String,
    #[serde(default)]
    pub parent_call_id: Option<String>,
    /// Qualified `Pallet.name`.
    pub name: String,
    #[serde(default)]
    pub address: Vec<u32>,
    #[serde(default)]
    pub args: serde_json::Value,
    pub success: bool,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Raw event record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub id: String,
    pub index: u32,
    pub phase: String,
    #[serde(default)]
    pub extrinsic_id: Option<String>,
    #[serde(default)]
    pub call_id: Option<String>,
    /// Qualified `Pallet.Name`.
    pub name: String,
    #[serde(default)]
    pub args: Option<serde_json::Value>,
}

/// Balances exceed JSON's safe integer range, so sources send them either
/// as numbers or as decimal strings.
fn deserialize_opt_u128<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .map(|v| Some(u128::from(v)))
            .ok_or_else(|| D::Error::custom(format!("amount is not an unsigned integer: {n}"))),
        Some(serde_json::Value::String(s)) => s
            .parse::<u128>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid amount {s:?}: {e}"))),
        Some(other) => Err(D::Error::custom(format!("unexpected amount: {other}"))),
    }
}

/// Stream of block extracts in ascending height order.
pub type BlockStream = Pin<Box<dyn Stream<Item = ChainResult<RawBlock>> + Send>>;

/// Port trait for the block extract source.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Stream every available block with height `>= from_height`.
    async fn blocks(&self, from_height: u64) -> ChainResult<BlockStream>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extrinsic_json(fee: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "0000000001-000000-aaaaa",
            "index": 0,
            "version": 4,
            "hash": "0x00",
            "success": true,
            "fee": fee,
        })
    }

    #[test]
    fn amounts_accept_numbers_and_decimal_strings() {
        let ext: RawExtrinsic = serde_json::from_value(extrinsic_json(json!(125))).unwrap();
        assert_eq!(ext.fee, Some(125));

        let big = "340282366920938463463374607431768211455";
        let ext: RawExtrinsic = serde_json::from_value(extrinsic_json(json!(big))).unwrap();
        assert_eq!(ext.fee, Some(u128::MAX));
        assert_eq!(ext.tip, None);
    }

    #[test]
    fn amounts_reject_negative_and_garbage() {
        assert!(serde_json::from_value::<RawExtrinsic>(extrinsic_json(json!(-1))).is_err());
        assert!(serde_json::from_value::<RawExtrinsic>(extrinsic_json(json!("1e9"))).is_err());
    }

    #[test]
    fn block_extract_defaults_empty_collections() {
        let raw: RawBlock = serde_json::from_value(json!({
            "header": {
                "id": "0000000007-abcde",
                "height": 7,
                "hash": "0x01",
                "parentHash": "0x02",
                "stateRoot": "0x03",
                "extrinsicsRoot": "0x04",
                "specName": "node",
                "specVersion": 100,
                "implName": "node",
                "implVersion": 1
            }
        }))
        .unwrap();
        assert_eq!(raw.height(), 7);
        assert!(raw.header.timestamp.is_none());
        assert!(raw.extrinsics.is_empty() && raw.calls.is_empty() && raw.events.is_empty());
    }
}
