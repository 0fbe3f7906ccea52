//! The staging column: pieces waiting to be dragged onto the board.

use crate::board::HexCell;
use crate::config::CanvasSize;
use crate::hex::{GeometryError, HexGeometry, Orientation};
use crate::pieces::Piece;
use crate::polygon::{self, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a live piece instance, unique for the lifetime of a staging area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u64);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "piece#{}", self.0)
    }
}

/// Stable handle for one hex of a live piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceHexId {
    pub piece: PieceId,
    pub index: usize,
}

/// A piece instance sitting in (or dragged out of) a staging slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedPiece {
    pub id: PieceId,
    pub slot: usize,
    pub piece: Piece,
    /// Pixel position of the piece origin
    pub position: Point,
    /// Where the piece springs back to after a failed drop
    pub home: Point,
}

impl StagedPiece {
    pub fn hex_id(&self, index: usize) -> PieceHexId {
        PieceHexId {
            piece: self.id,
            index,
        }
    }

    /// Pixel center of the piece's `index`-th hex
    pub fn hex_center(&self, index: usize, geometry: &HexGeometry) -> Result<Option<Point>, GeometryError> {
        match self.piece.hexes().get(index) {
            Some(hex) => Ok(Some(self.position + geometry.offset(hex.coord)?)),
            None => Ok(None),
        }
    }

    /// Pixel outline of every hex, in piece order
    pub fn polygons(&self, geometry: &HexGeometry) -> Result<Vec<[Point; 6]>, GeometryError> {
        self.piece
            .hexes()
            .iter()
            .map(|hex| {
                let center = self.position + geometry.offset(hex.coord)?;
                geometry.polygon_at(center, hex.orientation)
            })
            .collect()
    }

    /// True if the point lies inside any hex of the piece
    pub fn contains(&self, point: Point, geometry: &HexGeometry) -> Result<bool, GeometryError> {
        Ok(self
            .polygons(geometry)?
            .iter()
            .any(|outline| polygon::contains(outline, point)))
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Move the piece so its first hex is centered on `center`
    pub fn align_first_hex(&mut self, center: Point, geometry: &HexGeometry) -> Result<(), GeometryError> {
        let first = self.piece.hexes().first().map(|h| h.coord).unwrap_or_default();
        self.position = center - geometry.offset(first)?;
        Ok(())
    }

    pub fn return_home(&mut self) {
        self.position = self.home;
    }

    pub fn is_home(&self) -> bool {
        self.position == self.home
    }
}

/// Fixed set of slots holding the pieces on offer
#[derive(Debug, Clone, Default)]
pub struct Staging {
    slots: Vec<Option<StagedPiece>>,
    /// Slot anchor points, stacked in a column on the right of the canvas
    anchors: Vec<Point>,
    next_id: u64,
    hexes: HashMap<PieceHexId, HexCell>,
}

impl Staging {
    pub fn new(slot_count: usize, canvas: CanvasSize) -> Self {
        let x = canvas.width * 0.85;
        let anchors = (0..slot_count)
            .map(|i| Point::new(x, canvas.height * (i + 1) as f64 / (slot_count + 1) as f64))
            .collect();
        Self {
            slots: vec![None; slot_count],
            anchors,
            next_id: 0,
            hexes: HashMap::new(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Anchor point of a slot
    pub fn anchor(&self, slot: usize) -> Option<Point> {
        self.anchors.get(slot).copied()
    }

    /// Place a new instance of `piece` in `slot`, centered on the slot anchor.
    ///
    /// Returns `Ok(None)` if the slot does not exist. Any piece already in the
    /// slot is replaced but its hexes stay registered until `forget`.
    pub fn stage(
        &mut self,
        slot: usize,
        piece: Piece,
        geometry: &HexGeometry,
    ) -> Result<Option<PieceId>, GeometryError> {
        let Some(anchor) = self.anchor(slot) else {
            return Ok(None);
        };

        let offsets = piece
            .hexes()
            .iter()
            .map(|hex| geometry.offset(hex.coord))
            .collect::<Result<Vec<Point>, GeometryError>>()?;
        let count = offsets.len().max(1) as f64;
        let sum = offsets.iter().fold(Point::default(), |acc, &p| acc + p);
        let centroid = Point::new(sum.x / count, sum.y / count);
        let home = anchor - centroid;

        let id = PieceId(self.next_id);
        self.next_id += 1;

        for (index, hex) in piece.hexes().iter().enumerate() {
            self.hexes.insert(
                PieceHexId { piece: id, index },
                HexCell {
                    coord: hex.coord,
                    orientation: hex.orientation,
                    occupied: false,
                },
            );
        }

        self.slots[slot] = Some(StagedPiece {
            id,
            slot,
            piece,
            position: home,
            home,
        });
        Ok(Some(id))
    }

    /// Remove the piece from its slot, leaving the slot empty
    pub fn take(&mut self, slot: usize) -> Option<StagedPiece> {
        self.slots.get_mut(slot)?.take()
    }

    /// Drop the side-table entries of a destroyed piece. Returns how many were removed.
    pub fn forget(&mut self, id: PieceId) -> usize {
        let before = self.hexes.len();
        self.hexes.retain(|key, _| key.piece != id);
        before - self.hexes.len()
    }

    pub fn get(&self, slot: usize) -> Option<&StagedPiece> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut StagedPiece> {
        self.slots.get_mut(slot)?.as_mut()
    }

    pub fn find(&self, id: PieceId) -> Option<&StagedPiece> {
        self.pieces().find(|p| p.id == id)
    }

    pub fn find_mut(&mut self, id: PieceId) -> Option<&mut StagedPiece> {
        self.slots.iter_mut().flatten().find(|p| p.id == id)
    }

    /// Every staged piece, in slot order
    pub fn pieces(&self) -> impl Iterator<Item = &StagedPiece> {
        self.slots.iter().flatten()
    }

    /// Flip the rotation class of every hex of a live piece, keeping the side
    /// table in step. Returns the new orientations in piece order.
    pub fn toggle_orientation(&mut self, id: PieceId) -> Option<Vec<Orientation>> {
        let staged = self.slots.iter_mut().flatten().find(|p| p.id == id)?;
        staged.piece.toggle_orientation();

        let orientations: Vec<Orientation> = staged.piece.hexes().iter().map(|h| h.orientation).collect();
        for (index, &orientation) in orientations.iter().enumerate() {
            if let Some(cell) = self.hexes.get_mut(&PieceHexId { piece: id, index }) {
                cell.orientation = orientation;
            }
        }
        Some(orientations)
    }

    /// Logical data behind a rendered piece hex
    pub fn hex(&self, id: PieceHexId) -> Option<&HexCell> {
        self.hexes.get(&id)
    }

    pub fn registered_hexes(&self) -> usize {
        self.hexes.len()
    }

    /// The staged piece under a point, if any
    pub fn hit_test(&self, point: Point, geometry: &HexGeometry) -> Result<Option<PieceId>, GeometryError> {
        for staged in self.pieces() {
            if staged.contains(point, geometry)? {
                return Ok(Some(staged.id));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{HexCoord, HexSettings};
    use crate::pieces::PieceHex;

    fn geometry() -> HexGeometry {
        HexGeometry::with_settings(HexSettings::default())
    }

    fn bar() -> Piece {
        let hexes: Vec<PieceHex> = (0..3).map(|c| PieceHex::new(HexCoord::new(0, 2 * c))).collect();
        Piece::new("Bar", &hexes, 0xabcdef)
    }

    #[test]
    fn test_slots_stack_on_the_right() {
        let staging = Staging::new(3, CanvasSize::default());
        assert_eq!(staging.anchor(0), Some(Point::new(1360.0, 256.0)));
        assert_eq!(staging.anchor(2), Some(Point::new(1360.0, 768.0)));
        assert_eq!(staging.anchor(3), None);
    }

    #[test]
    fn test_stage_centers_piece_on_anchor() {
        let geometry = geometry();
        let mut staging = Staging::new(3, CanvasSize::default());
        let id = staging.stage(1, bar(), &geometry).unwrap().unwrap();
        let staged = staging.find(id).unwrap();
        // Middle hex of the bar is its centroid
        let middle = staged.hex_center(1, &geometry).unwrap().unwrap();
        assert_eq!(middle, staging.anchor(1).unwrap());
        assert!(staged.is_home());
    }

    #[test]
    fn test_stage_into_missing_slot() {
        let mut staging = Staging::new(1, CanvasSize::default());
        assert_eq!(staging.stage(4, bar(), &geometry()).unwrap(), None);
        assert_eq!(staging.registered_hexes(), 0);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let geometry = geometry();
        let mut staging = Staging::new(2, CanvasSize::default());
        let a = staging.stage(0, bar(), &geometry).unwrap().unwrap();
        let b = staging.stage(1, bar(), &geometry).unwrap().unwrap();
        let c = staging.stage(0, bar(), &geometry).unwrap().unwrap();
        assert!(a < b && b < c);
        assert!(staging.find(a).is_none());
    }

    #[test]
    fn test_side_table_outlives_slot_until_forgotten() {
        let geometry = geometry();
        let mut staging = Staging::new(3, CanvasSize::default());
        let id = staging.stage(0, bar(), &geometry).unwrap().unwrap();
        let hex_id = PieceHexId { piece: id, index: 2 };
        assert_eq!(staging.hex(hex_id).unwrap().coord, HexCoord::new(0, 4));

        let taken = staging.take(0).unwrap();
        assert_eq!(taken.id, id);
        assert!(staging.get(0).is_none());
        assert!(staging.hex(hex_id).is_some());

        assert_eq!(staging.forget(id), 3);
        assert!(staging.hex(hex_id).is_none());
    }

    #[test]
    fn test_hit_test() {
        let geometry = geometry();
        let mut staging = Staging::new(3, CanvasSize::default());
        let id = staging.stage(2, bar(), &geometry).unwrap().unwrap();
        let anchor = staging.anchor(2).unwrap();
        assert_eq!(staging.hit_test(anchor, &geometry).unwrap(), Some(id));
        assert_eq!(staging.hit_test(Point::new(10.0, 10.0), &geometry).unwrap(), None);
    }

    #[test]
    fn test_return_home() {
        let geometry = geometry();
        let mut staging = Staging::new(1, CanvasSize::default());
        staging.stage(0, bar(), &geometry).unwrap();
        let staged = staging.get_mut(0).unwrap();
        staged.set_position(Point::new(5.0, 5.0));
        assert!(!staged.is_home());
        staged.return_home();
        assert!(staged.is_home());
    }
}
