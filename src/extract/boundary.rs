use std::collections::HashMap;

use anyhow::{Result, bail};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use polars::prelude::*;
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};

use crate::source::ShapeFeed;
use crate::types::{BoundaryRecord, FipsCode};

/// States outside the continental scope: Alaska, Hawaii, Puerto Rico.
const NON_CONTINENTAL: [&str; 3] = ["02", "15", "72"];

/// Boundary attributes as a joinable frame, with the geometries kept in a
/// parallel side table keyed by county code. The resolver only joins the
/// frame; the geometry map rides along for the choropleth collaborator.
pub struct BoundaryLayer {
    pub frame: DataFrame,
    pub geoms: HashMap<FipsCode, MultiPolygon<f64>>,
}

/// Load the cartographic boundary layer, keeping the continental US only.
pub fn extract_boundaries(feed: &dyn ShapeFeed) -> Result<BoundaryLayer> {
    /// Get the value of a character field from a Record
    fn get_character_field(record: &Record, field: &str) -> Result<String> {
        match record.get(field) {
            Some(FieldValue::Character(Some(s))) => Ok(s.trim().to_string()),
            _ => bail!("missing or invalid character field: {}", field),
        }
    }

    /// Get the value of a numeric field from a Record
    fn get_numeric_field(record: &Record, field: &str) -> Result<f64> {
        match record.get(field) {
            Some(FieldValue::Numeric(Some(n))) => Ok(*n),
            _ => bail!("missing or invalid numeric field: {}", field),
        }
    }

    let items = feed.shapes()?;

    let mut records: Vec<BoundaryRecord> = Vec::new();
    for (shape, record) in items {
        if NON_CONTINENTAL.contains(&get_character_field(&record, "STATEFP")?.as_str()) {
            continue;
        }
        records.push(BoundaryRecord {
            fips: FipsCode::new(&get_character_field(&record, "GEOID")?)?,
            name: get_character_field(&record, "NAME")?,
            lsad: get_character_field(&record, "LSAD")?,
            land_area: get_numeric_field(&record, "ALAND")?,
            water_area: get_numeric_field(&record, "AWATER")?,
            geometry: shape_to_multipolygon(shape)?,
        });
    }

    let frame = boundary_frame(&records)?;
    let geoms = records.into_iter().map(|r| (r.fips, r.geometry)).collect();

    Ok(BoundaryLayer { frame, geoms })
}

pub fn boundary_frame(records: &[BoundaryRecord]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("COUNTYFP".into(), records.iter().map(|r| r.fips.as_str()).collect::<Vec<_>>()),
        Column::new("NAME".into(), records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>()),
        Column::new("LSAD".into(), records.iter().map(|r| r.lsad.as_str()).collect::<Vec<_>>()),
        Column::new("ALAND".into(), records.iter().map(|r| r.land_area).collect::<Vec<_>>()),
        Column::new("AWATER".into(), records.iter().map(|r| r.water_area).collect::<Vec<_>>()),
    ])?)
}

/// Coerce a generic shape into an owned multipolygon. Shapefiles store each
/// outer ring followed by the holes it owns, and the reader has already
/// classified the rings, so grouping is a single pass.
fn shape_to_multipolygon(shape: Shape) -> Result<MultiPolygon<f64>> {
    let polygon = match shape {
        Shape::Polygon(polygon) => polygon,
        other => bail!("found non-Polygon shape in boundary layer: {:?}", other.shapetype()),
    };

    /// Close a ring of points into a geo::LineString
    fn ring_to_linestring(points: &[shapefile::Point]) -> LineString<f64> {
        let mut coords: Vec<Coord<f64>> =
            points.iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last {
                coords.push(first);
            }
        }
        LineString(coords)
    }

    let mut polys: Vec<Polygon<f64>> = Vec::new();
    for ring in polygon.rings() {
        match ring {
            PolygonRing::Outer(points) => {
                polys.push(Polygon::new(ring_to_linestring(points), vec![]));
            }
            PolygonRing::Inner(points) => match polys.last_mut() {
                Some(poly) => poly.interiors_push(ring_to_linestring(points)),
                None => bail!("boundary ring order is corrupt: hole before any outer ring"),
            },
        }
    }
    Ok(MultiPolygon(polys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use shapefile::Point;

    struct Shapes(std::cell::RefCell<Vec<(Shape, Record)>>);

    impl ShapeFeed for Shapes {
        fn name(&self) -> &'static str {
            "county boundaries"
        }
        fn shapes(&self) -> Result<Vec<(Shape, Record)>> {
            Ok(std::mem::take(&mut self.0.borrow_mut()))
        }
    }

    fn make_record(statefp: &str, geoid: &str, name: &str) -> Record {
        let mut record = Record::default();
        record.insert("STATEFP".to_string(), FieldValue::Character(Some(statefp.to_string())));
        record.insert("GEOID".to_string(), FieldValue::Character(Some(geoid.to_string())));
        record.insert("NAME".to_string(), FieldValue::Character(Some(name.to_string())));
        record.insert("LSAD".to_string(), FieldValue::Character(Some("06".to_string())));
        record.insert("ALAND".to_string(), FieldValue::Numeric(Some(1_000_000.0)));
        record.insert("AWATER".to_string(), FieldValue::Numeric(Some(0.0)));
        record
    }

    fn unit_square() -> Shape {
        // Shapefile outer rings wind clockwise.
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 0.0),
        ];
        Shape::Polygon(shapefile::Polygon::with_rings(vec![PolygonRing::Outer(points)]))
    }

    #[test]
    fn non_continental_states_are_filtered() {
        let feed = Shapes(std::cell::RefCell::new(vec![
            (unit_square(), make_record("01", "01001", "Autauga")),
            (unit_square(), make_record("02", "02013", "Aleutians East")),
            (unit_square(), make_record("15", "15001", "Hawaii")),
            (unit_square(), make_record("72", "72001", "Adjuntas")),
        ]));

        let layer = extract_boundaries(&feed).unwrap();
        assert_eq!(layer.frame.height(), 1);
        assert_eq!(layer.geoms.len(), 1);
        assert!(layer.geoms.contains_key(&FipsCode::new("01001").unwrap()));
    }

    #[test]
    fn rings_become_closed_multipolygons() {
        let feed = Shapes(std::cell::RefCell::new(vec![(unit_square(), make_record("01", "01001", "Autauga"))]));
        let layer = extract_boundaries(&feed).unwrap();
        let geom = &layer.geoms[&FipsCode::new("01001").unwrap()];
        assert_eq!(geom.0.len(), 1);
        assert!((geom.unsigned_area() - 1.0).abs() < 1e-9);
    }
}
