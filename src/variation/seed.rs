//! Deterministic seed derivation from a building's tile footprint.
//!
//! Tiles are sorted before hashing so callers never need to pre-sort, and the
//! hash is a byte-wise FNV-1a over `"{salt}#{style}"` followed by every tile
//! coordinate as four little-endian bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// FNV-1a 32-bit offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Integer grid coordinate of one footprint tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for TileCoord {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for TileCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<&TileCoord> for TileCoord {
    fn from(t: &TileCoord) -> Self {
        *t
    }
}

/// Salt and style strings mixed into the footprint hash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedOptions<'a> {
    pub salt: &'a str,
    pub style_id: &'a str,
}

impl<'a> SeedOptions<'a> {
    pub fn salt(salt: &'a str) -> Self {
        Self { salt, style_id: "" }
    }

    pub fn with_style(mut self, style_id: &'a str) -> Self {
        self.style_id = style_id;
        self
    }
}

#[inline]
fn fnv_step(hash: u32, byte: u8) -> u32 {
    (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
}

/// FNV-1a over raw bytes, continuing from `hash`.
pub fn fnv1a_32_continue(hash: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(hash, |h, &b| fnv_step(h, b))
}

/// FNV-1a over the UTF-8 bytes of `text`.
pub fn fnv1a_32(text: &str) -> u32 {
    fnv1a_32_continue(FNV_OFFSET_BASIS, text.as_bytes())
}

/// Compute the unsigned 32-bit variation seed for a footprint.
///
/// Order-independent with respect to `tiles`, sensitive to the exact tile set,
/// the salt and the style id. An empty footprint hashes the salt/style alone.
pub fn compute_seed_from_tiles<I, T>(tiles: I, options: &SeedOptions<'_>) -> u32
where
    I: IntoIterator<Item = T>,
    T: Into<TileCoord>,
{
    let mut sorted: Vec<TileCoord> = tiles.into_iter().map(Into::into).collect();
    sorted.sort_unstable();

    let mut hash = fnv1a_32(&format!("{}#{}", options.salt, options.style_id));
    for tile in &sorted {
        hash = fnv1a_32_continue(hash, &tile.x.to_le_bytes());
        hash = fnv1a_32_continue(hash, &tile.y.to_le_bytes());
    }
    hash
}

/// Read tile coordinates from JSON, accepting `[x, y]` pairs and `{x, y}` objects.
///
/// Components may be numbers or numeric strings and are truncated toward zero.
/// Entries that are not a pair/object, or that carry non-finite components,
/// are skipped.
pub fn tiles_from_value(value: &Value) -> Vec<TileCoord> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Array(pair) if pair.len() >= 2 => {
                Some(TileCoord::new(tile_component(&pair[0])?, tile_component(&pair[1])?))
            }
            Value::Object(obj) => Some(TileCoord::new(
                tile_component(obj.get("x")?)?,
                tile_component(obj.get("y")?)?,
            )),
            _ => None,
        })
        .collect()
}

fn tile_component(value: &Value) -> Option<i32> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !v.is_finite() {
        return None;
    }
    let t = v.trunc();
    if t < i32::MIN as f64 || t > i32::MAX as f64 {
        return None;
    }
    Some(t as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn building() -> SeedOptions<'static> {
        SeedOptions::salt("building")
    }

    #[test]
    fn test_fnv_reference_vectors() {
        // Published FNV-1a 32-bit test vectors.
        assert_eq!(fnv1a_32(""), 0x811c_9dc5);
        assert_eq!(fnv1a_32("a"), 0xe40c_292c);
        assert_eq!(fnv1a_32("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_repeatable() {
        let a = compute_seed_from_tiles([[0, 0], [1, 0]], &building());
        let b = compute_seed_from_tiles([[0, 0], [1, 0]], &building());
        assert_eq!(a, b);
    }

    #[test]
    fn test_adding_tile_changes_seed() {
        let two = compute_seed_from_tiles([[0, 0], [1, 0]], &building());
        let three = compute_seed_from_tiles([[0, 0], [1, 0], [2, 0]], &building());
        assert_ne!(two, three);
    }

    #[test]
    fn test_order_independent() {
        let tiles = [[3, -1], [0, 0], [1, 0], [0, 5], [-2, 2]];
        let base = compute_seed_from_tiles(tiles, &building());

        let mut reversed = tiles;
        reversed.reverse();
        assert_eq!(compute_seed_from_tiles(reversed, &building()), base);

        let mut rotated = tiles;
        rotated.rotate_left(2);
        assert_eq!(compute_seed_from_tiles(rotated, &building()), base);
    }

    #[test]
    fn test_salt_and_style_sensitivity() {
        let tiles = [[4, 4], [5, 4]];
        let base = compute_seed_from_tiles(tiles, &building());
        assert_ne!(compute_seed_from_tiles(tiles, &SeedOptions::salt("roof")), base);
        assert_ne!(
            compute_seed_from_tiles(tiles, &building().with_style("brick_red")),
            base
        );
    }

    #[test]
    fn test_single_coordinate_change() {
        let base = compute_seed_from_tiles([[0, 0], [1, 0]], &building());
        assert_ne!(compute_seed_from_tiles([[0, 0], [1, 1]], &building()), base);
        assert_ne!(compute_seed_from_tiles([[0, 0], [-1, 0]], &building()), base);
    }

    #[test]
    fn test_empty_footprint_hashes_salt_only() {
        let empty: [TileCoord; 0] = [];
        assert_eq!(compute_seed_from_tiles(empty, &building()), fnv1a_32("building#"));
    }

    #[test]
    fn test_coordinate_bytes_little_endian() {
        let expected = fnv1a_32_continue(
            fnv1a_32("s#"),
            &[0x02, 0x01, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff],
        );
        assert_eq!(compute_seed_from_tiles([(0x0102, -1)], &SeedOptions::salt("s")), expected);
    }

    #[test]
    fn test_tiles_from_mixed_json() {
        let value = json!([[1, 2], {"x": 3, "y": -4}, ["5", 6.9], "junk", [7], {"x": 1}, [1, "NaN"]]);
        let tiles = tiles_from_value(&value);
        assert_eq!(
            tiles,
            vec![TileCoord::new(1, 2), TileCoord::new(3, -4), TileCoord::new(5, 6)]
        );
    }

    #[test]
    fn test_json_and_typed_tiles_agree() {
        let from_json = tiles_from_value(&json!([{"x": 1, "y": 0}, [0, 0]]));
        assert_eq!(
            compute_seed_from_tiles(&from_json, &building()),
            compute_seed_from_tiles([[0, 0], [1, 0]], &building())
        );
    }

    #[test]
    fn test_non_array_value_yields_no_tiles() {
        assert!(tiles_from_value(&json!({"x": 1, "y": 2})).is_empty());
        assert!(tiles_from_value(&Value::Null).is_empty());
    }
}
