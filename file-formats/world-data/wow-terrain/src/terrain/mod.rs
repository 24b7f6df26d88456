//! Terrain chunk (MCNK) decoding.
//!
//! A terrain chunk payload is a 128-byte header followed by sub-records. The
//! header points at each sub-record with an offset (and sometimes a size); an
//! offset of 0 means the sub-record is absent.
//!
//! Decoding is partial: a damaged sub-record becomes a [`FieldError`] and every
//! other field is still decoded. Only a short header fails the whole chunk.
//!
//! ```text
//! MCNK payload
//! ├── header (128 bytes)
//! ├── MCVT heights ─────────► HeightMap
//! ├── MCNR normals ─────────► NormalMap
//! ├── MCLY layers ──────────► TextureLayer[]
//! ├── MCRF references ──────► ObjectReferences
//! ├── MCSH shadow ──────────► ShadowMap
//! ├── MCAL alpha maps ──────► AlphaMapCodec, one grid per layer
//! ├── MCLQ liquid ──────────► LegacyLiquid[]
//! └── MCCV vertex colors ───► VertexColors
//! ```

pub mod header;
pub mod layers;
pub mod samples;

use crate::alpha::AlphaMapCodec;
use crate::chunk_id::ChunkId;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, FieldError, Result};
use crate::format::{Dialect, Orientation};
use crate::liquid::{LegacyLiquid, LegacyLiquidType};
use crate::liquid::legacy::LEGACY_BODY_SIZE;
use crate::names::TextureTable;
use crate::walker::{ChunkWalker, RECORD_HEADER_SIZE, RawChunk};

pub use header::{HoleMask, SubRecordRef, TERRAIN_HEADER_SIZE, TerrainChunkFlags, TerrainChunkHeader};
pub use layers::{LayerFlags, TextureLayer};
pub use samples::{HeightMap, NormalMap, ObjectReferences, ShadowMap, VertexColors};

/// Size of one legacy liquid record including its height range.
const LEGACY_LIQUID_RECORD_SIZE: usize = 8 + LEGACY_BODY_SIZE;

/// Tag orientation and dialect a terrain chunk was stored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainContext {
    /// Tag orientation of sub-records.
    pub orientation: Orientation,
    /// Header and sub-record layouts.
    pub dialect: Dialect,
}

impl Default for TerrainContext {
    fn default() -> Self {
        Self {
            orientation: Orientation::Reversed,
            dialect: Dialect::Modern,
        }
    }
}

/// Terrain chunk field that can fail on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerrainField {
    /// MCVT
    Heights,
    /// MCNR
    Normals,
    /// MCLY
    Layers,
    /// MCRF
    References,
    /// MCAL as a whole
    AlphaMaps,
    /// The alpha grid of one layer
    Alpha {
        /// Layer index
        layer: usize,
    },
    /// MCSH
    Shadow,
    /// MCSE
    SoundEmitters,
    /// MCLQ
    Liquid,
    /// MCCV
    VertexColors,
}

/// Decoded terrain chunk.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TerrainChunk<'a> {
    /// Fixed header.
    pub header: TerrainChunkHeader,
    /// 145 heights.
    pub height_map: Option<HeightMap>,
    /// 145 normals.
    pub normals: Option<NormalMap>,
    /// Texture layers, each owning its decoded alpha grid.
    pub layers: Option<Vec<TextureLayer>>,
    /// Doodad and object references.
    pub references: Option<ObjectReferences>,
    /// Raw alpha map data shared by all layers.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub alpha_maps: Option<&'a [u8]>,
    /// Baked shadows.
    pub shadow_map: Option<ShadowMap>,
    /// Raw sound emitter records.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub sound_emitters: Option<&'a [u8]>,
    /// Legacy liquids, one per liquid flag set on the chunk.
    pub liquids: Vec<LegacyLiquid>,
    /// Vertex colors.
    pub vertex_colors: Option<VertexColors>,
    /// Fields that failed to decode.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub errors: Vec<FieldError>,
    #[cfg_attr(feature = "serde", serde(skip))]
    payload: &'a [u8],
    #[cfg_attr(feature = "serde", serde(skip))]
    context: TerrainContext,
}

impl<'a> TerrainChunk<'a> {
    /// Decode a retail terrain chunk payload with byte-reversed tags.
    pub fn decode(payload: &'a [u8]) -> Result<Self> {
        Self::decode_with(payload, TerrainContext::default())
    }

    /// Decode a terrain chunk record found by a walker.
    pub fn decode_record(record: &RawChunk<'a>, context: TerrainContext) -> Result<Self> {
        Self::decode_with(record.payload, context)
    }

    /// Decode a terrain chunk payload stored with `context`.
    pub fn decode_with(payload: &'a [u8], context: TerrainContext) -> Result<Self> {
        let legacy = context.dialect.uses_legacy_layout();
        let header = if legacy {
            TerrainChunkHeader::decode_legacy(payload)?
        } else {
            TerrainChunkHeader::decode_modern(payload)?
        };

        let mut chunk = Self {
            header,
            height_map: None,
            normals: None,
            layers: None,
            references: None,
            alpha_maps: None,
            shadow_map: None,
            sound_emitters: None,
            liquids: Vec::new(),
            vertex_colors: None,
            errors: Vec::new(),
            payload,
            context,
        };
        let resolver = SubRecords::new(payload, context);
        let header = &chunk.header;
        let mut errors = Vec::new();

        chunk.height_map = if legacy {
            resolver
                .untagged(header.heights, samples::HEIGHTS_SIZE)
                .map(|raw| raw.map(HeightMap::decode_split).transpose())
        } else {
            resolver
                .tagged_or_found(ChunkId::MCVT, header.heights)
                .map(|raw| raw.map(HeightMap::decode).transpose())
        }
        .and_then(|result| result)
        .or_field(TerrainField::Heights, &mut errors);

        chunk.normals = if legacy {
            resolver
                .untagged(header.normals, samples::NORMALS_PADDED_SIZE)
                .map(|raw| raw.map(NormalMap::decode_split).transpose())
        } else {
            resolver
                .tagged_or_found(ChunkId::MCNR, header.normals)
                .map(|raw| raw.map(NormalMap::decode).transpose())
        }
        .and_then(|result| result)
        .or_field(TerrainField::Normals, &mut errors);

        chunk.layers = resolver
            .tagged(ChunkId::MCLY, header.layers)
            .and_then(|raw| raw.map(|raw| decode_layers(raw, header.layer_count)).transpose())
            .or_field(TerrainField::Layers, &mut errors);

        chunk.references = resolver
            .tagged(ChunkId::MCRF, header.references)
            .and_then(|raw| {
                raw.map(|raw| {
                    ObjectReferences::decode(raw, header.doodad_ref_count, header.object_ref_count)
                })
                .transpose()
            })
            .or_field(TerrainField::References, &mut errors);

        chunk.alpha_maps = resolver
            .tagged(ChunkId::MCAL, header.alpha_maps)
            .or_field(TerrainField::AlphaMaps, &mut errors);

        chunk.shadow_map = resolver
            .tagged(ChunkId::MCSH, header.shadow)
            .and_then(|raw| raw.map(ShadowMap::decode).transpose())
            .or_field(TerrainField::Shadow, &mut errors);

        chunk.sound_emitters = resolver
            .tagged(ChunkId::MCSE, header.sound_emitters)
            .or_field(TerrainField::SoundEmitters, &mut errors);

        if let Some(raw) = resolver
            .liquid(header.liquid)
            .or_field(TerrainField::Liquid, &mut errors)
        {
            chunk.liquids = decode_liquids(raw, header.flags);
        }

        if !legacy {
            chunk.vertex_colors = resolver
                .tagged(ChunkId::MCCV, header.vertex_colors)
                .and_then(|raw| raw.map(VertexColors::decode).transpose())
                .or_field(TerrainField::VertexColors, &mut errors);
        }

        if let (Some(layers), Some(alpha)) = (chunk.layers.as_mut(), chunk.alpha_maps) {
            attach_alpha_maps(
                layers,
                alpha,
                chunk.header.flags.fixes_alpha_edges(),
                &mut errors,
            );
        }

        chunk.errors = errors;
        Ok(chunk)
    }

    /// Whether every present sub-record decoded cleanly.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors recorded for `field`.
    pub fn field_errors(&self, field: TerrainField) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(move |error| error.field == field)
    }

    /// Tag orientation and dialect used to decode this chunk.
    pub fn context(&self) -> TerrainContext {
        self.context
    }

    /// Walk the tagged sub-records after the header without decoding them.
    ///
    /// Alpha files store heights and normals untagged, so the walk is only
    /// meaningful for retail chunks.
    pub fn raw_sub_records(&self) -> ChunkWalker<'a> {
        ChunkWalker::starting_at(self.payload, self.context.orientation, TERRAIN_HEADER_SIZE)
    }

    /// Walk the tagged sub-records after the header in storage order, decoding
    /// each one. Tags without a decoder come back as [`TerrainSubRecord::Unknown`].
    pub fn sub_records(&self) -> impl Iterator<Item = Result<TerrainSubRecord<'a>>> + use<'a> {
        let header = self.header.clone();
        self.raw_sub_records()
            .map(move |record| TerrainSubRecord::decode(record, &header))
    }

    /// Texture names of every layer, resolved through a file's texture table.
    pub fn texture_names<'t>(&self, textures: &'t TextureTable) -> Vec<Option<&'t str>> {
        self.layers
            .iter()
            .flatten()
            .map(|layer| layer.texture_name(textures))
            .collect()
    }
}

/// One tagged terrain sub-record, decoded on its own.
#[derive(Debug)]
pub enum TerrainSubRecord<'a> {
    /// MCVT
    Heights(HeightMap),
    /// MCNR
    Normals(NormalMap),
    /// MCLY, without alpha grids
    Layers(Vec<TextureLayer>),
    /// MCRF
    References(ObjectReferences),
    /// MCAL
    AlphaMaps(&'a [u8]),
    /// MCSH
    Shadow(ShadowMap),
    /// MCSE
    SoundEmitters(&'a [u8]),
    /// MCLQ as framed by its own length field, usually empty
    Liquid(&'a [u8]),
    /// MCCV
    VertexColors(VertexColors),
    /// Any other tag.
    Unknown(RawChunk<'a>),
}

impl<'a> TerrainSubRecord<'a> {
    /// Decode one sub-record; counts come from the chunk header.
    pub fn decode(record: RawChunk<'a>, header: &TerrainChunkHeader) -> Result<Self> {
        let payload = record.payload;
        Ok(match record.tag {
            ChunkId::MCVT => Self::Heights(HeightMap::decode(payload)?),
            ChunkId::MCNR => Self::Normals(NormalMap::decode(payload)?),
            ChunkId::MCLY => Self::Layers(decode_layers(payload, header.layer_count)?),
            ChunkId::MCRF => Self::References(ObjectReferences::decode(
                payload,
                header.doodad_ref_count,
                header.object_ref_count,
            )?),
            ChunkId::MCAL => Self::AlphaMaps(payload),
            ChunkId::MCSH => Self::Shadow(ShadowMap::decode(payload)?),
            ChunkId::MCSE => Self::SoundEmitters(payload),
            ChunkId::MCLQ => Self::Liquid(payload),
            ChunkId::MCCV => Self::VertexColors(VertexColors::decode(payload)?),
            _ => Self::Unknown(record),
        })
    }

    /// Tag this sub-record was stored under.
    pub fn tag(&self) -> ChunkId {
        match self {
            Self::Heights(_) => ChunkId::MCVT,
            Self::Normals(_) => ChunkId::MCNR,
            Self::Layers(_) => ChunkId::MCLY,
            Self::References(_) => ChunkId::MCRF,
            Self::AlphaMaps(_) => ChunkId::MCAL,
            Self::Shadow(_) => ChunkId::MCSH,
            Self::SoundEmitters(_) => ChunkId::MCSE,
            Self::Liquid(_) => ChunkId::MCLQ,
            Self::VertexColors(_) => ChunkId::MCCV,
            Self::Unknown(record) => record.tag,
        }
    }
}

/// Records a failed field and turns the result into an `Option`.
trait OrField<T> {
    fn or_field(self, field: TerrainField, errors: &mut Vec<FieldError>) -> Option<T>;
}

impl<T> OrField<T> for Result<Option<T>> {
    fn or_field(self, field: TerrainField, errors: &mut Vec<FieldError>) -> Option<T> {
        match self {
            Ok(value) => value,
            Err(error) => {
                log::warn!("Terrain chunk field {field:?} skipped: {error}");
                errors.push(FieldError { field, error });
                None
            }
        }
    }
}

/// Locates sub-records from header offsets.
struct SubRecords<'a> {
    cursor: ByteCursor<'a>,
    context: TerrainContext,
}

impl<'a> SubRecords<'a> {
    fn new(payload: &'a [u8], context: TerrainContext) -> Self {
        Self {
            cursor: ByteCursor::new(payload),
            context,
        }
    }

    /// Payload position of a header offset.
    ///
    /// Retail offsets count from the record's 8-byte tag and length, alpha
    /// offsets from the end of the header.
    fn position(&self, offset: u32) -> Result<usize> {
        let offset = offset as usize;
        if self.context.dialect.uses_legacy_layout() {
            Ok(TERRAIN_HEADER_SIZE + offset)
        } else {
            offset
                .checked_sub(RECORD_HEADER_SIZE)
                .ok_or(DecodeError::OutOfBounds {
                    offset,
                    len: RECORD_HEADER_SIZE,
                    available: self.cursor.len(),
                })
        }
    }

    /// Payload of the tagged sub-record the header points at, `None` when absent.
    ///
    /// The payload length is the sub-record's own length field, or the header
    /// size minus the 8-byte sub-record header when the length field is 0. It is
    /// clamped to the chunk payload.
    fn tagged(&self, expected: ChunkId, reference: SubRecordRef) -> Result<Option<&'a [u8]>> {
        self.resolve(expected, reference, false)
    }

    /// Liquid sub-record. Its own length field is 0 in real files, and alpha
    /// headers carry no size for it, so there it runs to the end of the chunk.
    fn liquid(&self, reference: SubRecordRef) -> Result<Option<&'a [u8]>> {
        self.resolve(
            ChunkId::MCLQ,
            reference,
            self.context.dialect.uses_legacy_layout(),
        )
    }

    fn resolve(
        &self,
        expected: ChunkId,
        reference: SubRecordRef,
        open_ended: bool,
    ) -> Result<Option<&'a [u8]>> {
        if !reference.is_present() {
            return Ok(None);
        }
        let position = self.position(reference.offset)?;
        let found = ChunkId::from_disk(self.cursor.read_tag_bytes(position)?, self.context.orientation);
        if found != expected {
            return Err(DecodeError::InvalidMagic {
                expected,
                found,
                offset: position,
            });
        }
        let declared = self.cursor.read_u32(position + 4)? as usize;
        let len = match (declared, reference.size) {
            (0, 0) if open_ended => usize::MAX,
            (0, size) => (size as usize).saturating_sub(RECORD_HEADER_SIZE),
            (declared, _) => declared,
        };
        let payload = self.cursor.slice_clamped(position + RECORD_HEADER_SIZE, len)?;
        log::trace!("{expected} at payload offset {position}, {} bytes", payload.len());
        Ok(Some(payload))
    }

    /// Like [`Self::tagged`], but walks the sub-records when the header slot holds
    /// something else (high-res holes).
    fn tagged_or_found(
        &self,
        expected: ChunkId,
        reference: Option<SubRecordRef>,
    ) -> Result<Option<&'a [u8]>> {
        match reference {
            Some(reference) => self.tagged(expected, reference),
            None => Ok(ChunkWalker::starting_at(
                self.cursor.data(),
                self.context.orientation,
                TERRAIN_HEADER_SIZE,
            )
            .find(|record| record.tag == expected)
            .map(|record| record.payload)),
        }
    }

    /// Untagged alpha sub-record of fixed size.
    ///
    /// Offset 0 is a valid position here; the field is absent only when the chunk
    /// has no body at all.
    fn untagged(&self, reference: Option<SubRecordRef>, len: usize) -> Result<Option<&'a [u8]>> {
        let Some(reference) = reference else {
            return Ok(None);
        };
        if self.cursor.len() <= TERRAIN_HEADER_SIZE {
            return Ok(None);
        }
        let position = self.position(reference.offset)?;
        Ok(Some(self.cursor.slice_clamped(position, len)?))
    }
}

fn decode_layers(raw: &[u8], expected: u32) -> Result<Vec<TextureLayer>> {
    let (layers, trailing) = ByteCursor::new(raw).read_records::<TextureLayer>(0)?;
    if trailing != 0 || layers.len() != expected as usize {
        log::debug!(
            "Layer table holds {} entries (+{trailing} bytes), header says {expected}",
            layers.len()
        );
    }
    Ok(layers)
}

/// One liquid per liquid flag, in flag order; water when data exists without flags.
fn decode_liquids(raw: &[u8], flags: TerrainChunkFlags) -> Vec<LegacyLiquid> {
    let mut types = flags.liquid_types();
    if types.is_empty() {
        types.push(LegacyLiquidType::Water);
    }
    types
        .into_iter()
        .enumerate()
        .map_while(|(index, liquid_type)| {
            let record = raw.get(index * LEGACY_LIQUID_RECORD_SIZE..)?;
            (!record.is_empty()).then(|| LegacyLiquid::decode_with_range(record, liquid_type))
        })
        .collect()
}

/// Decode each layer's alpha grid from the shared alpha data.
///
/// A layer's region runs from its own offset to the next alpha layer's offset, or
/// to the end of the data.
fn attach_alpha_maps(
    layers: &mut [TextureLayer],
    alpha: &[u8],
    fix_edges: bool,
    errors: &mut Vec<FieldError>,
) {
    let offsets: Vec<Option<usize>> = layers
        .iter()
        .enumerate()
        .map(|(index, layer)| {
            (index > 0 && layer.uses_alpha_map()).then_some(layer.alpha_map_offset as usize)
        })
        .collect();

    let cursor = ByteCursor::new(alpha);
    for (index, layer) in layers.iter_mut().enumerate() {
        let Some(start) = offsets[index] else {
            continue;
        };
        let end = offsets[index + 1..]
            .iter()
            .flatten()
            .next()
            .copied()
            .filter(|&next| next > start)
            .unwrap_or(alpha.len());

        let region = match cursor.slice_clamped(start, end.saturating_sub(start)) {
            Ok(region) => region,
            Err(error) => {
                log::warn!("Alpha map of layer {index} skipped: {error}");
                errors.push(FieldError {
                    field: TerrainField::Alpha { layer: index },
                    error,
                });
                continue;
            }
        };

        let compressed = layer.flags.contains(LayerFlags::ALPHA_MAP_COMPRESSED);
        let (grid, issue) = AlphaMapCodec::decode_checked(region, compressed, fix_edges);
        layer.alpha_map = Some(Box::new(grid));
        if let Some(error) = issue {
            errors.push(FieldError {
                field: TerrainField::Alpha { layer: index },
                error,
            });
        }
    }
}
