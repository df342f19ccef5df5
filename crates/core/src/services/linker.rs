//! Entity linker - turns one block extract into linked entities.
//!
//! Every operation fetches the parents it references before writing, so
//! the order in which they are called within a block matters:
//! block, then extrinsics, then calls (parents first), then events.
//! Block counters are maintained by fetch/increment/upsert, which relies
//! on blocks being linked one at a time.

use std::sync::Arc;

use chrono::DateTime;
use tracing::{debug, instrument, trace, warn};

use crate::error::{DomainError, DomainResult};
use crate::metrics::{record_entity_linked, record_link_error};
use crate::models::{
    Block, BlockHash, Call, EntityKind, Event, EventArgs, Extrinsic, ExtrinsicHash,
    ExtrinsicSignature, QualifiedName,
};
use crate::ports::{RawBlock, RawCall, RawEvent, RawExtrinsic, RawHeader, Store, StoreExt};

use super::call_order::order_calls_parent_first;

/// Counts of what was linked for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockSummary {
    pub height: u64,
    pub extrinsics: u32,
    pub calls: u32,
    pub events: u32,
}

/// Builds entities from raw records and links them through a [`Store`].
pub struct EntityLinker<S: Store + ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> EntityLinker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The store entities are written to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Link every record of one block extract.
    ///
    /// The first failure aborts the block; nothing already written is
    /// rolled back here.
    #[instrument(skip_all, fields(block = raw.header.height))]
    pub async fn process_block(&self, raw: RawBlock) -> DomainResult<BlockSummary> {
        let RawBlock {
            header,
            extrinsics,
            calls,
            events,
        } = raw;

        debug!(
            extrinsics = extrinsics.len(),
            calls = calls.len(),
            events = events.len(),
            "Linking block"
        );

        let calls = order_calls_parent_first(calls)?;

        let block = self
            .link_block(&header)
            .await
            .inspect_err(|e| link_failed(EntityKind::Block, &header.id, e))?;

        for ext in &extrinsics {
            self.link_extrinsic(&block.id, ext)
                .await
                .inspect_err(|e| link_failed(EntityKind::Extrinsic, &ext.id, e))?;
        }

        for call in &calls {
            self.link_call(&block.id, call)
                .await
                .inspect_err(|e| link_failed(EntityKind::Call, &call.id, e))?;
        }

        for event in &events {
            self.link_event(&block.id, event)
                .await
                .inspect_err(|e| link_failed(EntityKind::Event, &event.id, e))?;
        }

        Ok(BlockSummary {
            height: block.height,
            extrinsics: count("extrinsics", extrinsics.len())?,
            calls: count("calls", calls.len())?,
            events: count("events", events.len())?,
        })
    }

    /// Materialize and insert a block with zeroed counters.
    pub async fn link_block(&self, header: &RawHeader) -> DomainResult<Block> {
        let timestamp = DateTime::from_timestamp_millis(header.timestamp.unwrap_or(0))
            .ok_or_else(|| {
                DomainError::ValidationError(format!(
                    "block {} timestamp out of range: {:?}",
                    header.height, header.timestamp
                ))
            })?;

        let validator = header
            .validator
            .as_deref()
            .map(|v| {
                hex::decode(v.strip_prefix("0x").unwrap_or(v))
                    .map_err(|e| DomainError::InvalidAccountId(format!("{v}: {e}")))
            })
            .transpose()?;

        let block = Block {
            id: header.id.clone(),
            height: header.height,
            hash: decode_hash("block.hash", &header.hash)?,
            parent_hash: decode_hash("block.parent_hash", &header.parent_hash)?,
            extrinsics_root: decode_hash("block.extrinsics_root", &header.extrinsics_root)?,
            state_root: decode_hash("block.state_root", &header.state_root)?,
            timestamp,
            spec_name: header.spec_name.clone(),
            spec_version: header.spec_version,
            impl_name: header.impl_name.clone(),
            impl_version: header.impl_version,
            validator,
            extrinsics_count: 0,
            calls_count: 0,
            events_count: 0,
        };

        self.store.insert_entity(block.clone()).await?;
        record_entity_linked(EntityKind::Block);
        trace!(id = %block.id, "Block inserted");

        Ok(block)
    }

    /// Insert an extrinsic and count it on its block.
    pub async fn link_extrinsic(&self, block_id: &str, raw: &RawExtrinsic) -> DomainResult<Extrinsic> {
        let mut block: Block = self.store.get_or_fail(block_id).await?;

        let hash = ExtrinsicHash::from_hex(&raw.hash).map_err(|e| DomainError::InvalidHash {
            field: "extrinsic.hash",
            message: e.to_string(),
        })?;

        let signature = match &raw.signature {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<ExtrinsicSignature>(value.clone()).map_err(|e| {
                    DomainError::DecodingError(format!("extrinsic {} signature: {}", raw.id, e))
                })?,
            ),
        };

        let extrinsic = Extrinsic {
            id: raw.id.clone(),
            block_id: block.id.clone(),
            index: raw.index,
            hash,
            signature,
            success: raw.success,
            error: raw.error.clone(),
            fee: raw.fee,
            tip: raw.tip,
            version: raw.version,
            call_id: None,
        };
        self.store.insert_entity(extrinsic.clone()).await?;
        record_entity_linked(EntityKind::Extrinsic);

        block.extrinsics_count = increment(block.extrinsics_count, "block.extrinsics_count")?;
        self.store.upsert_entity(block).await?;

        trace!(id = %extrinsic.id, "Extrinsic linked");
        Ok(extrinsic)
    }

    /// Insert a call, count it on its block, and back-link root calls.
    ///
    /// The parent call, if any, must already be stored.
    pub async fn link_call(&self, block_id: &str, raw: &RawCall) -> DomainResult<Call> {
        let mut block: Block = self.store.get_or_fail(block_id).await?;
        let mut extrinsic: Extrinsic = self.store.get_or_fail(&raw.extrinsic_id).await?;
        let parent = match raw.parent_call_id.as_deref() {
            Some(parent_id) => Some(self.store.get_or_fail::<Call>(parent_id).await?),
            None => None,
        };

        let QualifiedName { pallet, name } = QualifiedName::parse(&raw.name)?;

        let call = Call {
            id: raw.id.clone(),
            block_id: block.id.clone(),
            extrinsic_id: extrinsic.id.clone(),
            parent_id: parent.map(|p| p.id),
            address: raw.address.clone(),
            pallet,
            name,
            args: raw.args.clone(),
            success: raw.success,
            error: raw.error.clone(),
        };
        self.store.insert_entity(call.clone()).await?;
        record_entity_linked(EntityKind::Call);

        block.calls_count = increment(block.calls_count, "block.calls_count")?;
        self.store.upsert_entity(block).await?;

        if call.is_root() {
            extrinsic.call_id = Some(call.id.clone());
            self.store.upsert_entity(extrinsic).await?;
        }

        trace!(id = %call.id, root = call.is_root(), "Call linked");
        Ok(call)
    }

    /// Insert an event with its flattened arguments and count it on its block.
    pub async fn link_event(&self, block_id: &str, raw: &RawEvent) -> DomainResult<Event> {
        let mut block: Block = self.store.get_or_fail(block_id).await?;
        let extrinsic_id = match raw.extrinsic_id.as_deref() {
            Some(id) => Some(self.store.get_or_fail::<Extrinsic>(id).await?.id),
            None => None,
        };
        let call_id = match raw.call_id.as_deref() {
            Some(id) => Some(self.store.get_or_fail::<Call>(id).await?.id),
            None => None,
        };

        let QualifiedName { pallet, name } = QualifiedName::parse(&raw.name)?;

        let args = raw.args.clone().unwrap_or(serde_json::Value::Null);
        let args_str = EventArgs::from(args.clone()).to_args_str();

        let event = Event {
            id: raw.id.clone(),
            block_id: block.id.clone(),
            block_number: block.height,
            extrinsic_id,
            call_id,
            index: raw.index,
            phase: raw.phase.clone(),
            pallet,
            name,
            args,
            args_str,
        };
        self.store.insert_entity(event.clone()).await?;
        record_entity_linked(EntityKind::Event);

        block.events_count = increment(block.events_count, "block.events_count")?;
        self.store.upsert_entity(block).await?;

        trace!(id = %event.id, "Event linked");
        Ok(event)
    }
}

fn decode_hash(field: &'static str, value: &str) -> DomainResult<BlockHash> {
    BlockHash::from_hex(value).map_err(|e| DomainError::InvalidHash {
        field,
        message: e.to_string(),
    })
}

fn count(what: &str, len: usize) -> DomainResult<u32> {
    u32::try_from(len)
        .map_err(|_| DomainError::ValidationError(format!("too many {what} in block: {len}")))
}

fn increment(counter: u32, field: &str) -> DomainResult<u32> {
    counter
        .checked_add(1)
        .ok_or_else(|| DomainError::ValidationError(format!("{field} overflow")))
}

fn link_failed(kind: EntityKind, id: &str, error: &DomainError) {
    warn!(kind = %kind, id, error = %error, "❌ Linking failed");
    record_link_error(kind);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_overflow_is_a_validation_error() {
        assert_eq!(increment(6, "block.calls_count").unwrap(), 7);
        let err = increment(u32::MAX, "block.calls_count").unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(ref m) if m.contains("calls_count")));
    }

    #[test]
    fn oversized_collection_is_a_validation_error() {
        assert_eq!(count("events", 3).unwrap(), 3);
        assert!(count("events", u32::MAX as usize + 1).is_err());
    }

    #[test]
    fn decode_hash_names_the_field() {
        let err = decode_hash("block.state_root", "0x12").unwrap_err();
        assert!(err.to_string().contains("block.state_root"));
    }
}
