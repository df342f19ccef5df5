//! Domain models representing the normalized entity graph.
//!
//! These models are storage-agnostic. Relations between entities are
//! carried as identity strings (foreign keys), never as shared pointers.

mod args;
mod name;

pub use args::{EventArgs, Scalar};
pub use name::QualifiedName;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// 32-byte Hash Types
// =============================================================================

/// Macro to generate 32-byte hash newtypes with common functionality.
///
/// Generates:
/// - `from_hex()` - Parse from hex string (with or without 0x prefix)
/// - `to_hex()` - Convert to 0x-prefixed hex string
/// - `Display` trait implementation
macro_rules! hash32_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Parse from hex string (with or without 0x prefix).
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s)?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }

            /// Convert to 0x-prefixed hex string.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }
    };
}

hash32_newtype!(
    /// 32-byte block hash or trie root (Blake2-256).
    BlockHash
);

hash32_newtype!(
    /// 32-byte extrinsic hash.
    ExtrinsicHash
);

// =============================================================================
// Entity Kinds
// =============================================================================

/// The four kinds of entity the linker produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Block,
    Extrinsic,
    Call,
    Event,
}

impl EntityKind {
    /// Storage name of this kind (also its table name).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Block => "block",
            EntityKind::Extrinsic => "extrinsic",
            EntityKind::Call => "call",
            EntityKind::Event => "event",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Block
// =============================================================================

/// Normalized block with per-block aggregate counters.
///
/// The counters start at zero and are incremented once per child linked
/// while the block is being processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block identity as assigned by the source.
    pub id: String,
    /// Block number (height).
    pub height: u64,
    /// Block hash.
    pub hash: BlockHash,
    /// Parent block hash.
    pub parent_hash: BlockHash,
    /// Extrinsics root (merkle root of extrinsics).
    pub extrinsics_root: BlockHash,
    /// State root after executing this block.
    pub state_root: BlockHash,
    /// Block timestamp; the Unix epoch when the source had none.
    pub timestamp: DateTime<Utc>,
    /// Runtime spec name.
    pub spec_name: String,
    /// Runtime spec version.
    pub spec_version: u32,
    /// Runtime implementation name.
    pub impl_name: String,
    /// Runtime implementation version.
    pub impl_version: u32,
    /// Block author/validator account bytes, of whatever length the chain uses.
    pub validator: Option<Vec<u8>>,
    /// Number of extrinsics linked to this block.
    pub extrinsics_count: u32,
    /// Number of calls linked to this block.
    pub calls_count: u32,
    /// Number of events linked to this block.
    pub events_count: u32,
}

// =============================================================================
// Extrinsics
// =============================================================================

/// Signature envelope of a signed extrinsic.
///
/// All three parts are kept as the source delivered them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrinsicSignature {
    pub address: serde_json::Value,
    pub signature: serde_json::Value,
    #[serde(default)]
    pub signed_extensions: serde_json::Value,
}

/// Indexed extrinsic (transaction or inherent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extrinsic {
    pub id: String,
    /// Owning block.
    pub block_id: String,
    /// Index within the block (0-based).
    pub index: u32,
    pub hash: ExtrinsicHash,
    /// Signature (None for unsigned/inherent).
    pub signature: Option<ExtrinsicSignature>,
    pub success: bool,
    /// Dispatch error if failed.
    pub error: Option<serde_json::Value>,
    /// Fee paid (in smallest unit).
    pub fee: Option<u128>,
    /// Tip paid (in smallest unit).
    pub tip: Option<u128>,
    /// Extrinsic format version.
    pub version: u32,
    /// Root call of this extrinsic, set once that call is linked.
    pub call_id: Option<String>,
}

// =============================================================================
// Calls
// =============================================================================

/// A call inside an extrinsic's call tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    pub block_id: String,
    pub extrinsic_id: String,
    /// Enclosing call; None for the root call.
    pub parent_id: Option<String>,
    /// Position in the extrinsic's call tree; empty for the root call.
    pub address: Vec<u32>,
    pub pallet: String,
    pub name: String,
    pub args: serde_json::Value,
    pub success: bool,
    pub error: Option<serde_json::Value>,
}

impl Call {
    /// Whether this call is the root of its extrinsic's call tree.
    pub fn is_root(&self) -> bool {
        self.address.is_empty()
    }
}

// =============================================================================
// Events
// =============================================================================

/// Indexed event emitted during block execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub block_id: String,
    /// Height of the owning block, copied at write time.
    pub block_number: u64,
    pub extrinsic_id: Option<String>,
    pub call_id: Option<String>,
    /// Index within the block (0-based).
    pub index: u32,
    /// Execution phase (`Initialization`, `ApplyExtrinsic`, `Finalization`).
    pub phase: String,
    pub pallet: String,
    pub name: String,
    /// Event arguments as delivered by the source (`null` when absent).
    pub args: serde_json::Value,
    /// Flattened printable form of `args`.
    pub args_str: Vec<String>,
}

// =============================================================================
// Entity
// =============================================================================

/// Any entity the store facade can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Block(Block),
    Extrinsic(Extrinsic),
    Call(Call),
    Event(Event),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Block(_) => EntityKind::Block,
            Entity::Extrinsic(_) => EntityKind::Extrinsic,
            Entity::Call(_) => EntityKind::Call,
            Entity::Event(_) => EntityKind::Event,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Block(b) => &b.id,
            Entity::Extrinsic(e) => &e.id,
            Entity::Call(c) => &c.id,
            Entity::Event(e) => &e.id,
        }
    }
}

/// A model type that maps onto exactly one [`EntityKind`].
///
/// This is what lets the typed store helpers (`get_or_fail::<Block>`)
/// work over a store that only speaks [`Entity`].
pub trait StoredEntity: Clone + Send + Sync + Into<Entity> + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Unwrap the matching variant; None for any other kind.
    fn from_entity(entity: Entity) -> Option<Self>;
}

macro_rules! stored_entity {
    ($ty:ident) => {
        impl From<$ty> for Entity {
            fn from(value: $ty) -> Self {
                Entity::$ty(value)
            }
        }

        impl StoredEntity for $ty {
            const KIND: EntityKind = EntityKind::$ty;

            fn id(&self) -> &str {
                &self.id
            }

            fn from_entity(entity: Entity) -> Option<Self> {
                match entity {
                    Entity::$ty(value) => Some(value),
                    _ => None,
                }
            }
        }
    };
}

stored_entity!(Block);
stored_entity!(Extrinsic);
stored_entity!(Call);
stored_entity!(Event);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_hash_hex_roundtrip() {
        let hex = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        let hash = BlockHash::from_hex(hex).unwrap();
        assert_eq!(hash.to_hex(), hex);
    }

    #[test]
    fn block_hash_without_prefix() {
        let hex = "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        let hash = BlockHash::from_hex(hex).unwrap();
        assert_eq!(hash.to_hex(), format!("0x{}", hex));
    }

    #[test]
    fn hash32_invalid_length() {
        assert!(BlockHash::from_hex("0x1234").is_err());
        assert!(ExtrinsicHash::from_hex("0xzz").is_err());
    }

    #[test]
    fn entity_kind_and_id_follow_variant() {
        let call = Call {
            id: "c1".into(),
            block_id: "b".into(),
            extrinsic_id: "x".into(),
            parent_id: None,
            address: vec![],
            pallet: "Utility".into(),
            name: "batch".into(),
            args: serde_json::Value::Null,
            success: true,
            error: None,
        };
        assert!(call.is_root());

        let entity: Entity = call.clone().into();
        assert_eq!(entity.kind(), EntityKind::Call);
        assert_eq!(entity.id(), "c1");
        assert_eq!(Call::from_entity(entity.clone()), Some(call));
        assert_eq!(Block::from_entity(entity), None);
    }

    #[test]
    fn entity_kind_display_is_table_name() {
        assert_eq!(EntityKind::Extrinsic.to_string(), "extrinsic");
        assert_eq!(EntityKind::Event.as_str(), "event");
    }
}
