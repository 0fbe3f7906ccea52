//! Piece templates and the catalog of placeable variants.
//!
//! The catalog starts from a handful of hand-authored base shapes and grows
//! by mirroring each of them horizontally and vertically. Variants whose
//! normalized hex sets coincide are kept only once.

use crate::board::Color;
use crate::hex::{HexCoord, Orientation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// One hex of a piece, relative to the piece origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceHex {
    pub coord: HexCoord,
    pub orientation: Orientation,
}

impl PieceHex {
    pub fn new(coord: HexCoord) -> Self {
        Self {
            coord,
            orientation: Orientation::Flat,
        }
    }

    fn with_coord(self, coord: HexCoord) -> Self {
        Self { coord, ..self }
    }
}

/// Shift so the smallest row and column are zero, then sort by `(col, row)`
pub fn normalize(hexes: &[PieceHex]) -> Vec<PieceHex> {
    let min_row = hexes.iter().map(|h| h.coord.row).min().unwrap_or(0);
    let min_half_col = hexes.iter().map(|h| h.coord.half_col).min().unwrap_or(0);
    let origin = HexCoord::new(min_row, min_half_col);

    let mut normalized: Vec<PieceHex> = hexes
        .iter()
        .map(|h| h.with_coord(h.coord - origin))
        .collect();
    normalized.sort_by_key(|h| (h.coord.half_col, h.coord.row));
    normalized
}

/// Canonical `col,row|col,row|...` key of the normalized hex set
pub fn canonical_key(hexes: &[PieceHex]) -> String {
    normalize(hexes)
        .iter()
        .map(|h| h.coord.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

/// An immutable, named piece template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    name: String,
    hexes: Vec<PieceHex>,
    color: Color,
}

impl Piece {
    /// Create a piece; its hexes are stored normalized
    pub fn new(name: impl Into<String>, hexes: &[PieceHex], color: Color) -> Self {
        Self {
            name: name.into(),
            hexes: normalize(hexes),
            color,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hexes(&self) -> &[PieceHex] {
        &self.hexes
    }

    /// Fill color shared by every hex of the piece
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }

    pub fn key(&self) -> String {
        canonical_key(&self.hexes)
    }

    /// Switch every hex to the other rotation class. The shape is unchanged.
    pub fn toggle_orientation(&mut self) {
        for hex in &mut self.hexes {
            hex.orientation = hex.orientation.toggled();
        }
    }
}

/// Orientation used by base-shape hexes that carry no override
const DEFAULT_ORIENTATION: Orientation = Orientation::Flat;

/// A hand-authored shape. Hexes are `(col, row, orientation override)` with
/// half-integer columns.
struct BaseShape {
    name: &'static str,
    hexes: &'static [(f64, i32, Option<Orientation>)],
}

const FLAT: Option<Orientation> = Some(Orientation::Flat);

const BASE_SHAPES: [BaseShape; 7] = [
    BaseShape {
        name: "Shape1",
        hexes: &[(0.0, 0, None), (1.0, 0, None), (1.5, 1, None), (2.0, 0, None)],
    },
    BaseShape {
        name: "Shape2",
        hexes: &[(0.0, 0, None), (1.0, 0, None), (0.5, 1, None), (1.5, 1, None)],
    },
    BaseShape {
        name: "Shape3",
        hexes: &[(0.5, -1, None), (1.0, 0, None), (0.5, 1, None), (1.5, 1, None)],
    },
    // Slanted bar, pinned flat hex by hex
    BaseShape {
        name: "Shape4",
        hexes: &[(0.0, 0, FLAT), (0.5, 1, FLAT), (1.0, 2, FLAT), (1.5, 3, FLAT)],
    },
    BaseShape {
        name: "Shape5",
        hexes: &[(0.0, 0, None), (1.0, 0, None), (2.0, 0, None), (3.0, 0, None)],
    },
    BaseShape {
        name: "Single",
        hexes: &[(0.0, 0, None)],
    },
    BaseShape {
        name: "Shape6",
        hexes: &[(0.0, 0, None), (-0.5, -1, None), (0.5, -1, None), (0.0, -2, None)],
    },
];

impl BaseShape {
    fn hexes(&self) -> Vec<PieceHex> {
        self.hexes
            .iter()
            .map(|&(col, row, orientation)| PieceHex {
                coord: HexCoord::from_col(row, col),
                orientation: orientation.unwrap_or(DEFAULT_ORIENTATION),
            })
            .collect()
    }
}

/// Deepest flip chain explored from a base shape
const MAX_FLIP_DEPTH: usize = 2;

/// Flip expansion state shared across all base shapes
struct Expansion<'r, R: Rng> {
    seen: HashSet<String>,
    variants: Vec<Piece>,
    rng: &'r mut R,
}

impl<R: Rng> Expansion<'_, R> {
    fn visit(&mut self, name: String, hexes: Vec<PieceHex>, depth: usize) {
        if depth > MAX_FLIP_DEPTH {
            return;
        }
        if !self.seen.insert(canonical_key(&hexes)) {
            return;
        }

        let color = self.rng.gen_range(0..=0xFF_FFFF);
        self.variants.push(Piece::new(name.clone(), &hexes, color));

        let flipped_h = hexes
            .iter()
            .map(|h| h.with_coord(h.coord.flip_horizontal()))
            .collect();
        self.visit(format!("{name}_FlipH"), flipped_h, depth + 1);

        let flipped_v = hexes
            .iter()
            .map(|h| h.with_coord(h.coord.flip_vertical()))
            .collect();
        self.visit(format!("{name}_FlipV"), flipped_v, depth + 1);
    }
}

/// The set of distinct pieces that can be staged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pieces: Vec<Piece>,
}

impl Catalog {
    /// Expand the built-in base shapes using thread-local randomness for colors
    pub fn standard() -> Self {
        Self::standard_with_rng(&mut rand::thread_rng())
    }

    /// Expand the built-in base shapes with a specific RNG (useful for testing)
    pub fn standard_with_rng<R: Rng>(rng: &mut R) -> Self {
        let mut expansion = Expansion {
            seen: HashSet::new(),
            variants: Vec::new(),
            rng,
        };
        for shape in &BASE_SHAPES {
            expansion.visit(shape.name.to_string(), shape.hexes(), 0);
        }
        debug!(variants = expansion.variants.len(), "Built piece catalog");
        Self {
            pieces: expansion.variants,
        }
    }

    /// Use an explicit list of pieces, dropping duplicates of earlier ones
    pub fn from_pieces(pieces: impl IntoIterator<Item = Piece>) -> Self {
        let mut seen = HashSet::new();
        let pieces = pieces.into_iter().filter(|p| seen.insert(p.key())).collect();
        Self { pieces }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.name() == name)
    }

    /// Uniformly random piece, `None` for an empty catalog
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<&Piece> {
        if self.pieces.is_empty() {
            return None;
        }
        self.pieces.get(rng.gen_range(0..self.pieces.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> Catalog {
        Catalog::standard_with_rng(&mut StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_standard_catalog_variants() {
        let catalog = catalog();
        let names: Vec<&str> = catalog.pieces().iter().map(Piece::name).collect();
        assert_eq!(
            names,
            vec![
                "Shape1",
                "Shape1_FlipH",
                "Shape1_FlipH_FlipV",
                "Shape1_FlipV",
                "Shape2",
                "Shape2_FlipH",
                "Shape3",
                "Shape3_FlipH",
                "Shape3_FlipH_FlipV",
                "Shape3_FlipV",
                "Shape4",
                "Shape4_FlipH",
                "Shape5",
                "Single",
                "Shape6",
            ]
        );
    }

    #[test]
    fn test_orientation_overrides_apply_per_hex() {
        let mixed = BaseShape {
            name: "Mixed",
            hexes: &[(0.0, 0, None), (1.0, 0, Some(Orientation::Rotated))],
        };
        let orientations: Vec<Orientation> = mixed.hexes().iter().map(|h| h.orientation).collect();
        assert_eq!(orientations, vec![Orientation::Flat, Orientation::Rotated]);

        let catalog = catalog();
        let bar = catalog.get("Shape4").unwrap();
        assert!(bar.hexes().iter().all(|h| h.orientation == Orientation::Flat));
    }

    #[test]
    fn test_flips_keep_hex_orientation() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut expansion = Expansion {
            seen: HashSet::new(),
            variants: Vec::new(),
            rng: &mut rng,
        };
        let shape = BaseShape {
            name: "Hook",
            hexes: &[(0.0, 0, Some(Orientation::Rotated)), (1.0, 0, None), (1.5, 1, None)],
        };
        expansion.visit(shape.name.to_string(), shape.hexes(), 0);

        for variant in &expansion.variants {
            let rotated = variant
                .hexes()
                .iter()
                .filter(|h| h.orientation == Orientation::Rotated)
                .count();
            assert_eq!(rotated, 1, "{} lost its override", variant.name());
        }
    }

    #[test]
    fn test_keys_are_unique() {
        let catalog = catalog();
        let keys: HashSet<String> = catalog.pieces().iter().map(Piece::key).collect();
        assert_eq!(keys.len(), catalog.len());
    }

    #[test]
    fn test_shape_is_stored_normalized() {
        let catalog = catalog();
        let shape3 = catalog.get("Shape3").unwrap();
        assert_eq!(shape3.key(), "0,0|0,2|0.5,1|1,2");
        let first = shape3.hexes()[0].coord;
        assert_eq!(first, HexCoord::new(0, 0));
    }

    #[test]
    fn test_colors_are_rgb() {
        for piece in catalog().pieces() {
            assert!(piece.color() <= 0xFF_FFFF);
        }
    }

    #[test]
    fn test_same_seed_same_colors() {
        assert_eq!(catalog(), catalog());
    }

    #[test]
    fn test_from_pieces_drops_duplicates() {
        let single = Piece::new("A", &[PieceHex::new(HexCoord::new(3, 3))], 1);
        let moved = Piece::new("B", &[PieceHex::new(HexCoord::new(-2, 8))], 2);
        let catalog = Catalog::from_pieces([single, moved]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.pieces()[0].name(), "A");
    }

    #[test]
    fn test_pick_from_empty_catalog() {
        let empty = Catalog::from_pieces([]);
        assert!(empty.pick(&mut StdRng::seed_from_u64(0)).is_none());
    }

    #[test]
    fn test_pick_reaches_every_variant() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let picked: HashSet<&str> = (0..1000)
            .filter_map(|_| catalog.pick(&mut rng))
            .map(Piece::name)
            .collect();
        assert_eq!(picked.len(), catalog.len());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn hexes() -> impl Strategy<Value = Vec<PieceHex>> {
            proptest::collection::vec((-6..6i32, -12..12i32), 1..8).prop_map(|cells| {
                cells
                    .into_iter()
                    .map(|(row, half_col)| PieceHex::new(HexCoord::new(row, half_col)))
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn normalize_is_idempotent(hexes in hexes()) {
                let once = normalize(&hexes);
                prop_assert_eq!(normalize(&once), once.clone());
                prop_assert_eq!(once.iter().map(|h| h.coord.row).min(), Some(0));
                prop_assert_eq!(once.iter().map(|h| h.coord.half_col).min(), Some(0));
            }

            #[test]
            fn key_ignores_translation(hexes in hexes(), dr in -5..5i32, dc in -5..5i32) {
                let shifted: Vec<PieceHex> = hexes
                    .iter()
                    .map(|h| h.with_coord(h.coord + HexCoord::new(dr, dc)))
                    .collect();
                prop_assert_eq!(canonical_key(&shifted), canonical_key(&hexes));
            }
        }
    }
}
