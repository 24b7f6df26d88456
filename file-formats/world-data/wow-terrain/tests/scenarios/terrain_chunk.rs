//! Terrain chunk decoding against hand-built payloads.

use pretty_assertions::assert_eq;
use wow_terrain::alpha::ALPHA_MAP_SIZE;
use wow_terrain::{
    AlphaMapCodec, ChunkId, DecodeError, Dialect, HoleMask, LegacyLiquidType, Orientation,
    TerrainChunk, TerrainChunkFlags, TerrainContext, TerrainField, TerrainSubRecord,
};

use crate::support::{
    TerrainChunkBuilder, flat_normals, floats, init_logger, layer, legacy_liquid_record,
    ramp_heights, slot,
};

const USE_ALPHA: u32 = 0x100;
const COMPRESSED: u32 = 0x200;
const DO_NOT_FIX_ALPHA: u32 = 0x8000;
const HIGH_RES_HOLES: u32 = 0x1_0000;

fn blend_grid() -> [u8; ALPHA_MAP_SIZE] {
    let mut grid = [0u8; ALPHA_MAP_SIZE];
    for (i, value) in grid.iter_mut().enumerate() {
        *value = ((i / 64) * 4) as u8;
    }
    grid
}

fn full_chunk() -> TerrainChunkBuilder {
    TerrainChunkBuilder::new()
        .flags(DO_NOT_FIX_ALPHA | TerrainChunkFlags::HAS_SHADOW.bits())
        .index(3, 7)
        .set(slot::AREA_ID, 12)
        .heights(&ramp_heights())
        .normals(&flat_normals())
        .layers(&[layer(0, 0, 0), layer(1, USE_ALPHA | COMPRESSED, 0)])
        .alpha(&AlphaMapCodec::encode(&blend_grid()))
        .shadow(&[0xFF; 512])
}

#[test]
fn header_without_sub_records_decodes_empty() {
    init_logger();
    let payload = TerrainChunkBuilder::new().index(1, 2).build();
    let chunk = TerrainChunk::decode(&payload).unwrap();

    assert_eq!((chunk.header.index_x, chunk.header.index_y), (1, 2));
    assert!(chunk.height_map.is_none());
    assert!(chunk.normals.is_none());
    assert!(chunk.layers.is_none());
    assert!(chunk.references.is_none());
    assert!(chunk.alpha_maps.is_none());
    assert!(chunk.shadow_map.is_none());
    assert!(chunk.sound_emitters.is_none());
    assert!(chunk.liquids.is_empty());
    assert!(chunk.vertex_colors.is_none());
    assert!(chunk.errors.is_empty());
}

#[test]
fn every_present_sub_record_is_decoded() {
    init_logger();
    let payload = full_chunk().build();
    let chunk = TerrainChunk::decode(&payload).unwrap();

    assert!(chunk.is_complete(), "{:?}", chunk.errors);
    assert_eq!(chunk.header.area_id, 12);

    let heights = chunk.height_map.as_ref().unwrap();
    assert_eq!(heights.len(), 145);
    assert_eq!(heights.heights[144], 144.0);

    let normals = chunk.normals.as_ref().unwrap();
    assert_eq!(normals.normals[0], [0.0, 0.0, 1.0]);

    let layers = chunk.layers.as_ref().unwrap();
    assert_eq!(layers.len(), 2);
    assert!(layers[0].alpha_map.is_none());
    assert_eq!(layers[1].alpha_map.as_deref(), Some(&blend_grid()));

    let shadow = chunk.shadow_map.as_ref().unwrap();
    assert!(shadow.is_shadowed(63, 63));
}

#[test]
fn alpha_offset_past_payload_end_fails_only_that_field() {
    init_logger();
    let built = full_chunk().build();
    let past_end = (built.len() + 1 + 8) as u32;
    let payload = full_chunk().set(slot::ALPHA, past_end).build();

    let chunk = TerrainChunk::decode(&payload).unwrap();

    assert_eq!(chunk.errors.len(), 1);
    assert_eq!(chunk.errors[0].field, TerrainField::AlphaMaps);
    assert!(matches!(
        chunk.errors[0].error,
        DecodeError::OutOfBounds { .. }
    ));
    assert!(chunk.alpha_maps.is_none());
    assert_eq!(chunk.height_map.map(|h| h.len()), Some(145));
    assert!(chunk.normals.is_some());
    assert_eq!(chunk.layers.map(|l| l.len()), Some(2));
    assert!(chunk.shadow_map.is_some());
}

#[test]
fn wrong_size_heights_are_a_field_error() {
    let payload = TerrainChunkBuilder::new()
        .heights(&ramp_heights()[..144])
        .shadow(&[0; 512])
        .build();
    let chunk = TerrainChunk::decode(&payload).unwrap();

    assert!(chunk.height_map.is_none());
    assert!(chunk.shadow_map.is_some());
    let errors: Vec<_> = chunk.field_errors(TerrainField::Heights).collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].error,
        DecodeError::InvalidRecordSize {
            expected: 580,
            actual: 576,
            ..
        }
    ));
}

#[test]
fn offset_landing_on_other_tag_is_invalid_magic() {
    let payload = TerrainChunkBuilder::new()
        .sub_record(slot::HEIGHTS, None, ChunkId::MCNR, &flat_normals())
        .build();
    let chunk = TerrainChunk::decode(&payload).unwrap();

    assert!(matches!(
        chunk.errors[0].error,
        DecodeError::InvalidMagic {
            expected: ChunkId::MCVT,
            found: ChunkId::MCNR,
            ..
        }
    ));
}

#[test]
fn high_res_holes_find_heights_by_walking() {
    let payload = TerrainChunkBuilder::new()
        .flags(HIGH_RES_HOLES)
        .set(slot::HEIGHTS, 0x0000_0001)
        .set(slot::NORMALS, 0x8000_0000)
        .trailing_record(ChunkId::MCVT, &floats(ramp_heights()))
        .build();
    let chunk = TerrainChunk::decode(&payload).unwrap();

    assert!(chunk.is_complete(), "{:?}", chunk.errors);
    assert_eq!(chunk.header.holes, HoleMask::HighRes(0x8000_0000_0000_0001));
    assert!(chunk.header.holes.is_hole(0, 0));
    assert!(chunk.header.holes.is_hole(7, 7));
    assert!(!chunk.header.holes.is_hole(1, 0));
    assert_eq!(chunk.height_map.map(|h| h.heights[10]), Some(10.0));
    assert!(chunk.normals.is_none());
}

#[test]
fn legacy_liquid_follows_chunk_flags() {
    let flags = TerrainChunkFlags::LIQUID_OCEAN | TerrainChunkFlags::LIQUID_MAGMA;
    let mut records = legacy_liquid_record(1.0, 2.0, 1.5);
    records.extend(legacy_liquid_record(5.0, 6.0, 5.5));

    let payload = TerrainChunkBuilder::new()
        .flags(flags.bits())
        .liquid(&records)
        .build();
    let chunk = TerrainChunk::decode(&payload).unwrap();

    let kinds: Vec<_> = chunk.liquids.iter().map(|l| l.liquid_type).collect();
    assert_eq!(kinds, vec![LegacyLiquidType::Ocean, LegacyLiquidType::Magma]);
    assert_eq!(chunk.liquids[0].height_range, Some((1.0, 2.0)));
    assert_eq!(chunk.liquids[1].height_range, Some((5.0, 6.0)));
    assert_eq!(chunk.liquids[1].vertices[0].height(), Some(5.5));
    assert_eq!(chunk.liquids[0].flows.len(), 2);
    assert!(chunk.liquids[0].has_liquid(0, 0));
}

#[test]
fn truncated_header_fails_the_chunk() {
    let payload = vec![0u8; 127];
    assert!(matches!(
        TerrainChunk::decode(&payload),
        Err(DecodeError::TruncatedHeader {
            expected: 128,
            actual: 127,
            ..
        })
    ));
}

#[test]
fn legacy_chunk_reorders_untagged_heights() {
    let mut header = vec![0u8; 128];
    header[0x1C..0x20].copy_from_slice(&580u32.to_le_bytes());
    header[0x0C..0x10].copy_from_slice(&4.5f32.to_le_bytes());
    let mut payload = header;
    payload.extend(floats(ramp_heights()));
    payload.extend(flat_normals());

    let context = TerrainContext {
        orientation: Orientation::Forward,
        dialect: Dialect::Legacy,
    };
    let chunk = TerrainChunk::decode_with(&payload, context).unwrap();

    assert!(chunk.is_complete(), "{:?}", chunk.errors);
    assert_eq!(chunk.header.radius, Some(4.5));
    let heights = chunk.height_map.unwrap();
    assert_eq!(heights.outer(2, 1), Some(11.0));
    assert_eq!(heights.inner(3, 2), Some(100.0));
    assert_eq!(heights.heights[9], 81.0);
}

#[test]
fn zero_length_liquid_uses_header_size() {
    let payload = TerrainChunkBuilder::new()
        .flags(TerrainChunkFlags::LIQUID_RIVER.bits())
        .liquid_zero_length(&legacy_liquid_record(3.0, 4.0, 3.5))
        .build();
    let chunk = TerrainChunk::decode(&payload).unwrap();

    assert!(chunk.is_complete(), "{:?}", chunk.errors);
    assert_eq!(chunk.liquids.len(), 1);
    assert_eq!(chunk.liquids[0].liquid_type, LegacyLiquidType::Water);
    assert_eq!(chunk.liquids[0].height_range, Some((3.0, 4.0)));
    assert_eq!(chunk.liquids[0].vertices[80].height(), Some(3.5));
}

#[test]
fn legacy_liquid_runs_to_end_of_chunk() {
    init_logger();
    let flags = TerrainChunkFlags::LIQUID_RIVER | TerrainChunkFlags::LIQUID_SLIME;
    let mut header = vec![0u8; 128];
    header[0x00..0x04].copy_from_slice(&flags.bits().to_le_bytes());
    header[0x1C..0x20].copy_from_slice(&580u32.to_le_bytes());
    header[0x64..0x68].copy_from_slice(&(580u32 + 448).to_le_bytes());
    let mut payload = header;
    payload.extend(floats(ramp_heights()));
    payload.extend(flat_normals());
    payload.extend_from_slice(&ChunkId::MCLQ.to_disk(Orientation::Forward));
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend(legacy_liquid_record(1.0, 2.0, 1.5));
    payload.extend(legacy_liquid_record(7.0, 8.0, 7.5));

    let context = TerrainContext {
        orientation: Orientation::Forward,
        dialect: Dialect::Legacy,
    };
    let chunk = TerrainChunk::decode_with(&payload, context).unwrap();

    assert!(chunk.is_complete(), "{:?}", chunk.errors);
    let kinds: Vec<_> = chunk.liquids.iter().map(|l| l.liquid_type).collect();
    assert_eq!(kinds, vec![LegacyLiquidType::Water, LegacyLiquidType::Slime]);
    assert_eq!(chunk.liquids[1].height_range, Some((7.0, 8.0)));
    assert_eq!(chunk.liquids[1].vertices[0].height(), Some(7.5));
}

#[test]
fn sub_records_decode_in_storage_order() {
    let payload = full_chunk()
        .trailing_record(ChunkId(*b"MCBB"), &[1, 2, 3, 4])
        .build();
    let chunk = TerrainChunk::decode(&payload).unwrap();

    let records: Vec<_> = chunk.sub_records().collect::<Result<_, _>>().unwrap();
    let tags: Vec<_> = records.iter().map(TerrainSubRecord::tag).collect();
    assert_eq!(
        tags,
        vec![
            ChunkId::MCVT,
            ChunkId::MCNR,
            ChunkId::MCLY,
            ChunkId::MCAL,
            ChunkId::MCSH,
            ChunkId(*b"MCBB"),
        ]
    );

    assert!(matches!(&records[0], TerrainSubRecord::Heights(h) if h.heights[3] == 3.0));
    assert!(matches!(&records[2], TerrainSubRecord::Layers(l) if l.len() == 2));
    let TerrainSubRecord::Unknown(unknown) = &records[5] else {
        panic!("expected an unknown sub-record, got {:?}", records[5]);
    };
    assert_eq!(unknown.payload, &[1, 2, 3, 4]);
    assert_eq!(chunk.raw_sub_records().count(), 6);
}
