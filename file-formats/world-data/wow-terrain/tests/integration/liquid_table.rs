//! Tile-wide liquid table decoding.

use pretty_assertions::assert_eq;
use test_case::test_case;
use wow_terrain::liquid::LIQUID_CHUNK_COUNT;
use wow_terrain::{LiquidDecoder, LiquidTable, LiquidVertexFormat};

use crate::support::{floats, words};

const HEADER_TABLE: usize = LIQUID_CHUNK_COUNT * 12;

/// Instance record with a 2×2 cell region (9 vertices).
fn instance(liquid_type: u16, exists: u32, vertices: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&liquid_type.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes());
    data.extend(floats([1.0, 2.0]));
    data.extend_from_slice(&[1, 2, 2, 2]);
    data.extend(words(&[exists, vertices]));
    data
}

/// Liquid table with one instance on chunk 0 followed by `vertex_data`.
fn table_with_vertices(vertex_data: &[u8]) -> Vec<u8> {
    let instances = HEADER_TABLE as u32;
    let attributes = instances + 24;
    let exists = attributes + 16;
    let vertices = exists + 1;

    let mut payload = vec![0u8; HEADER_TABLE];
    payload[..12].copy_from_slice(&words(&[instances, 1, attributes]));
    payload.extend(instance(5, exists, vertices));
    payload.extend_from_slice(&u64::MAX.to_le_bytes());
    payload.extend_from_slice(&1u64.to_le_bytes());
    payload.push(0b0000_0101);
    payload.extend_from_slice(vertex_data);
    payload
}

#[test_case(45, LiquidVertexFormat::HeightOnly ; "five bytes per vertex")]
#[test_case(72, LiquidVertexFormat::HeightUv ; "eight bytes per vertex")]
#[test_case(9, LiquidVertexFormat::DepthOnly ; "one byte per vertex")]
#[test_case(81, LiquidVertexFormat::HeightUvDepth ; "nine bytes per vertex")]
#[test_case(18, LiquidVertexFormat::Unknown ; "two bytes per vertex")]
#[test_case(50, LiquidVertexFormat::Unknown ; "uneven size")]
fn vertex_format_follows_region_size(len: usize, expected: LiquidVertexFormat) {
    let payload = table_with_vertices(&vec![0u8; len]);
    let table = LiquidTable::decode(&payload);
    let instance = &table.chunk(0).unwrap()[0];

    assert_eq!(instance.vertex_count(), 9);
    assert_eq!(instance.vertex_format, Some(expected));
    assert_eq!(instance.heights.is_some(), matches!(
        expected,
        LiquidVertexFormat::HeightOnly | LiquidVertexFormat::HeightUv | LiquidVertexFormat::HeightUvDepth
    ));
    if expected == LiquidVertexFormat::Unknown {
        assert!(instance.uvs.is_none());
        assert!(instance.depths.is_none());
    }
}

#[test]
fn height_and_depth_arrays_are_split() {
    let mut vertices = floats((0..9).map(|i| i as f32 * 0.5));
    vertices.extend(0u8..9);
    let payload = table_with_vertices(&vertices);

    let table = LiquidTable::decode(&payload);
    assert!(table.errors.is_empty());
    let instance = &table.chunk(0).unwrap()[0];

    assert_eq!(instance.liquid_type, 5);
    assert_eq!(instance.height_range, (1.0, 2.0));
    assert_eq!(instance.region, (1, 2, 2, 2));
    assert_eq!(instance.heights.as_ref().map(|h| h[4]), Some(2.0));
    assert_eq!(instance.depths.as_deref(), Some(&[0u8, 1, 2, 3, 4, 5, 6, 7, 8][..]));

    assert!(instance.exists(0, 0));
    assert!(!instance.exists(1, 0));
    assert!(instance.exists(0, 1));
    assert!(!instance.exists(2, 0));

    let attributes = table.attributes[0].unwrap();
    assert!(attributes.is_fishable(7, 7));
    assert!(attributes.is_deep(0, 0));
    assert!(!attributes.is_deep(1, 0));
}

#[test]
fn only_chunks_with_liquid_are_populated() {
    let payload = table_with_vertices(&[0u8; 45]);
    let chunks = LiquidDecoder::decode_modern(&payload);

    assert_eq!(chunks.len(), 256);
    assert!(chunks[0].is_some());
    assert_eq!(chunks.iter().filter(|c| c.is_some()).count(), 1);
}

#[test]
fn broken_instance_is_reported_next_to_siblings() {
    let mut payload = table_with_vertices(&[0u8; 45]);
    payload[12..24].copy_from_slice(&words(&[0xFFFF_FF00, 1, 0]));

    let table = LiquidTable::decode(&payload);
    assert_eq!(table.liquid_chunk_count(), 2);
    assert_eq!(table.chunk(0).map(<[_]>::len), Some(1));
    assert_eq!(table.chunk(1).map(<[_]>::len), Some(0));
    assert_eq!(table.errors.len(), 1);
    assert_eq!((table.errors[0].chunk, table.errors[0].layer), (1, Some(0)));
}
