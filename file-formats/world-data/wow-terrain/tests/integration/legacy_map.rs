//! Decoding single-file alpha maps (forward tags, legacy layouts).

use pretty_assertions::assert_eq;
use wow_terrain::{
    ChunkId, DecodeOptions, Dialect, MapFile, MapHeader, Orientation, TileEntryLayout, TileHeader,
    detect,
};

use crate::support::{flat_normals, floats, init_logger, layer, push_record, ramp_heights, words};

const FORWARD: Orientation = Orientation::Forward;

fn legacy_terrain_chunk(x: u32, y: u32) -> Vec<u8> {
    let mut header = vec![0u8; 128];
    let mut put = |at: usize, value: u32| header[at..at + 4].copy_from_slice(&value.to_le_bytes());
    put(0x04, x);
    put(0x08, y);
    put(0x10, 1);
    put(0x18, 0);
    put(0x1C, 580);
    put(0x20, 580 + 448);

    let mut payload = header;
    payload.extend(floats(ramp_heights()));
    payload.extend(flat_normals());
    push_record(&mut payload, FORWARD, ChunkId::MCLY, &layer(0, 0, 0));
    payload
}

fn alpha_map() -> Vec<u8> {
    let mut mphd = words(&[2, 0, 1, 0]);
    mphd.resize(128, 0);

    let mut main = vec![0u8; 64 * 64 * 16];
    let cell = 30 * 64 + 31;
    main[cell * 16..cell * 16 + 8].copy_from_slice(&words(&[0x2_0000, 0x4000]));

    let mut mhdr = words(&[0x40, 0, 0, 0, 0, 0, 0]);
    mhdr.resize(64, 0);

    let mut data = Vec::new();
    push_record(&mut data, FORWARD, ChunkId::MVER, &18u32.to_le_bytes());
    push_record(&mut data, FORWARD, ChunkId::MPHD, &mphd);
    push_record(&mut data, FORWARD, ChunkId::MAIN, &main);
    push_record(&mut data, FORWARD, ChunkId::MDNM, b"Tree.mdx\0Bush.mdx\0");
    push_record(&mut data, FORWARD, ChunkId::MONM, b"Inn.wmo\0");
    push_record(&mut data, FORWARD, ChunkId::MHDR, &mhdr);
    push_record(&mut data, FORWARD, ChunkId::MCIN, &vec![0u8; 256 * 16]);
    push_record(&mut data, FORWARD, ChunkId::MTEX, b"Grass.blp\0");
    push_record(&mut data, FORWARD, ChunkId::MCNK, &legacy_terrain_chunk(0, 0));
    data
}

#[test]
fn detects_forward_legacy() {
    assert_eq!(detect(&alpha_map()), (Orientation::Forward, Dialect::Legacy));
}

#[test]
fn decodes_legacy_layouts() {
    init_logger();
    let data = alpha_map();
    let file = MapFile::decode(&data);

    assert!(file.is_complete(), "{:?}", file.errors);
    assert_eq!(
        file.map_header,
        Some(MapHeader::Legacy {
            doodad_name_count: 2,
            doodad_names_offset: 0,
            object_name_count: 1,
            object_names_offset: 0,
        })
    );
    assert!(matches!(
        file.tile_header,
        Some(TileHeader::Legacy { chunk_index: 0x40, .. })
    ));

    let tiles = file.tile_table.as_ref().unwrap();
    assert_eq!(tiles.width, 64);
    assert_eq!(tiles.layout, TileEntryLayout::Located);
    assert_eq!(tiles.len(), 1);
    assert_eq!(tiles.get(31, 30).map(|t| t.size), Some(0x4000));

    assert_eq!(file.model_names.as_ref().map(|n| n.len()), Some(2));
    assert_eq!(file.object_names.as_ref().and_then(|n| n.get(0)), Some("Inn.wmo"));

    let chunk = &file.terrain_chunks[0];
    assert!(chunk.is_complete(), "{:?}", chunk.errors);
    assert_eq!(chunk.height_map.as_ref().and_then(|h| h.inner(0, 0)), Some(81.0));
    assert_eq!(chunk.normals.as_ref().map(|n| n.normals[0]), Some([0.0, 0.0, 1.0]));
    assert_eq!(chunk.layers.as_ref().map(Vec::len), Some(1));
    assert_eq!(file.texture_table().name(0), Some("Grass.blp"));
}

#[test]
fn forced_dialect_wins_over_detection() {
    let data = alpha_map();
    let options = DecodeOptions::new().with_dialect(Dialect::Modern);
    let file = MapFile::decode_with(&data, &options);

    assert_eq!(file.orientation, Orientation::Forward);
    assert_eq!(file.dialect, Dialect::Modern);
    assert!(matches!(file.map_header, Some(MapHeader::Modern { .. })));
}

#[test]
fn no_known_tags_fall_back_to_forward_unknown() {
    let mut data = Vec::new();
    push_record(&mut data, FORWARD, ChunkId(*b"ABCD"), &[1, 2, 3]);
    push_record(&mut data, FORWARD, ChunkId(*b"EFGH"), &[]);

    let file = MapFile::decode(&data);
    assert_eq!(file.orientation, Orientation::Forward);
    assert_eq!(file.dialect, Dialect::Unknown);
    assert_eq!(file.dialect.to_string(), "legacy-unknown");
    assert_eq!(file.unknown.len(), 2);
}
