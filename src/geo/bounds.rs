use serde::Serialize;

use super::coordinates::Position;

/// Smallest lat/lng rectangle enclosing a set of positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    fn around(p: Position) -> Self {
        BoundingBox { min_lat: p.lat, min_lng: p.lng, max_lat: p.lat, max_lng: p.lng }
    }

    fn include(mut self, p: Position) -> Self {
        self.min_lat = self.min_lat.min(p.lat);
        self.min_lng = self.min_lng.min(p.lng);
        self.max_lat = self.max_lat.max(p.lat);
        self.max_lng = self.max_lng.max(p.lng);
        self
    }

    /// `None` when there is nothing to enclose
    pub fn from_positions<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        Some(iter.fold(BoundingBox::around(first), BoundingBox::include))
    }
}
