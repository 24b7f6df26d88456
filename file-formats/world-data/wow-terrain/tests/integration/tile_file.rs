//! Decoding complete retail tile files.

use pretty_assertions::assert_eq;
use wow_terrain::{
    ChunkId, DecodeOptions, Dialect, MapFile, MapRecord, Orientation, TerrainChunk, TileHeader,
    detect,
};

use crate::support::{
    TerrainChunkBuilder, init_logger, layer, push_record, ramp_heights, words,
};

const REVERSED: Orientation = Orientation::Reversed;

fn doodad(name_id: u32, unique_id: u32) -> Vec<u8> {
    let mut data = words(&[name_id, unique_id]);
    data.extend(std::iter::repeat_n(0u8, 24));
    data.extend_from_slice(&1024u16.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes());
    data
}

fn object(name_id: u32) -> Vec<u8> {
    let mut data = words(&[name_id, 77]);
    data.resize(64, 0);
    data
}

fn terrain_chunk(x: u32, y: u32) -> Vec<u8> {
    TerrainChunkBuilder::new()
        .index(x, y)
        .heights(&ramp_heights())
        .layers(&[layer(1, 0, 0)])
        .build()
}

fn tile_file() -> Vec<u8> {
    let mut mhdr = words(&[0, 0x40]);
    mhdr.resize(64, 0);

    let mut mcin = vec![0u8; 256 * 16];
    mcin[..8].copy_from_slice(&words(&[0x1000, 0x300]));
    mcin[16..24].copy_from_slice(&words(&[0x1300, 0x300]));

    let mut data = Vec::new();
    push_record(&mut data, REVERSED, ChunkId::MVER, &18u32.to_le_bytes());
    push_record(&mut data, REVERSED, ChunkId::MHDR, &mhdr);
    push_record(&mut data, REVERSED, ChunkId::MCIN, &mcin);
    push_record(&mut data, REVERSED, ChunkId::MTEX, b"Tileset\\Grass.blp\0Tileset\\Dirt.blp\0");
    push_record(&mut data, REVERSED, ChunkId::MMDX, b"Tree.m2\0Rock.m2\0");
    push_record(&mut data, REVERSED, ChunkId::MMID, &words(&[0, 8]));
    push_record(&mut data, REVERSED, ChunkId::MWMO, b"Keep.wmo\0");
    push_record(&mut data, REVERSED, ChunkId::MWID, &words(&[0]));
    push_record(&mut data, REVERSED, ChunkId::MDDF, &[doodad(1, 10), doodad(0, 11)].concat());
    push_record(&mut data, REVERSED, ChunkId::MODF, &object(0));
    push_record(&mut data, REVERSED, ChunkId::MCNK, &terrain_chunk(0, 0));
    push_record(&mut data, REVERSED, ChunkId::MCNK, &terrain_chunk(1, 0));
    data
}

#[test]
fn detects_retail_tile() {
    assert_eq!(detect(&tile_file()), (Orientation::Reversed, Dialect::Modern));
}

#[test]
fn decodes_every_record() {
    init_logger();
    let data = tile_file();
    let file = MapFile::decode(&data);

    assert!(file.is_complete(), "{:?}", file.errors);
    assert_eq!(file.version, Some(18));
    assert!(matches!(
        file.tile_header,
        Some(TileHeader::Modern { offsets, .. }) if offsets.chunk_index == 0x40
    ));

    let index = file.chunk_index.as_ref().unwrap();
    assert_eq!(index.width, 16);
    assert_eq!(index.len(), 2);
    assert_eq!(index.get(1, 0).map(|l| l.offset), Some(0x1300));

    assert_eq!(file.doodad_placements.len(), 2);
    assert_eq!(file.doodad_name(&file.doodad_placements[0]), Some("Rock.m2"));
    assert_eq!(file.doodad_name(&file.doodad_placements[1]), Some("Tree.m2"));
    assert_eq!(file.object_name(&file.object_placements[0]), Some("Keep.wmo"));

    assert_eq!(file.terrain_chunks.len(), 2);
    let chunk = file.terrain_chunk(1, 0).unwrap();
    assert_eq!(chunk.height_map.as_ref().map(|h| h.len()), Some(145));
    let textures = file.texture_table();
    assert_eq!(chunk.texture_names(&textures), vec![Some("Tileset\\Dirt.blp")]);
}

#[test]
fn truncated_tile_keeps_complete_records() {
    let data = tile_file();
    let cut = &data[..data.len() - 100];
    let file = MapFile::decode(cut);

    assert_eq!(file.terrain_chunks.len(), 1);
    assert_eq!(file.doodad_placements.len(), 2);
    assert!(file.is_complete());
}

#[test]
fn terrain_can_be_skipped() {
    let data = tile_file();
    let file = MapFile::decode_with(&data, &DecodeOptions::new().with_terrain(false));

    assert!(file.terrain_chunks.is_empty());
    let skipped: Vec<_> = file.unknown.iter().map(|r| r.tag).collect();
    assert_eq!(skipped, vec![ChunkId::MCNK, ChunkId::MCNK]);
}

#[test]
fn records_decode_one_at_a_time() {
    let data = tile_file();
    let options = DecodeOptions::default();
    let context = Default::default();

    let chunks: Vec<TerrainChunk<'_>> = wow_terrain::ChunkWalker::new(&data, REVERSED)
        .filter_map(|raw| match MapRecord::decode(raw, context, &options) {
            Ok(MapRecord::TerrainChunk(chunk)) => Some(*chunk),
            _ => None,
        })
        .collect();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].header.index_x, 1);
}
