//! Liquid decoders for both generations of liquid data.
//!
//! - [`LegacyLiquid`]: one record per terrain chunk (MCLQ), pre-WotLK.
//! - [`LiquidTable`]: one table per tile (MH2O), WotLK and later.

pub mod legacy;
pub mod modern;

pub use legacy::{LegacyLiquid, LegacyLiquidType, LegacyLiquidVertex, LiquidFlow};
pub use modern::{
    LIQUID_CHUNK_COUNT, LiquidAttributes, LiquidInstance, LiquidTable, LiquidVertexFormat,
};

/// Entry points for both liquid formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidDecoder;

impl LiquidDecoder {
    /// Decode a legacy liquid body; never fails, short input yields fewer fields.
    pub fn decode_legacy(payload: &[u8], liquid_type_hint: LegacyLiquidType) -> LegacyLiquid {
        LegacyLiquid::decode(payload, liquid_type_hint)
    }

    /// Decode a tile-wide liquid table into per-chunk instance lists.
    ///
    /// Use [`LiquidTable::decode`] to also get attributes and per-instance errors.
    pub fn decode_modern(
        chunk_table_payload: &[u8],
    ) -> [Option<Vec<LiquidInstance<'_>>>; LIQUID_CHUNK_COUNT] {
        LiquidTable::decode(chunk_table_payload).into_chunks()
    }
}
