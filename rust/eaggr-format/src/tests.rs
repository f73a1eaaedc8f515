use eaggr_common::error::ErrorKind;

use crate::{
    cell::{CellId, MAX_CELL_LEN},
    shape::{GeoLinestring, GeoPoint, GeoPolygon, GeoShape, Linestring, Polygon, Shape, ShapeLocation},
    wire::{
        self, CellBuffer, GeoShapeRecord, RecordView, ShapeKind, ShapeRecord, from_wire,
        geo_from_wire, geo_to_wire, to_wire,
    },
};

fn ring(ids: &[&str]) -> Linestring {
    ids.iter().copied().collect()
}

fn sample_shapes() -> Vec<Shape> {
    vec![
        Shape::cell("0000"),
        Shape::Cell {
            cell: "07231131111113100331001".into(),
            location: ShapeLocation::TwoFaces,
        },
        Shape::Linestring(ring(&["0001", "0002", "0003"])),
        Shape::Linestring(Linestring::default()),
        Shape::Polygon(Polygon::new(
            ring(&["00111", "0002", "0001", "00333"]),
            vec![ring(&["00312", "00302", "00321"])],
        )),
        Shape::Polygon(Polygon::new(ring(&["0700", "0701", "0702"]), vec![])),
        Shape::Polygon(Polygon::new(
            ring(&["01033,6", "01034,6", "01035,6"]),
            vec![ring(&["01033,5"]), ring(&[]), ring(&["01022,3", "01022,4"])],
        )),
    ]
}

fn random_id(rng: &mut fastrand::Rng) -> CellId {
    let len = rng.usize(2..MAX_CELL_LEN);
    CellId::new(
        (0..len)
            .map(|_| char::from(b'0' + rng.u8(0..4)))
            .collect::<String>(),
    )
}

fn random_ring(rng: &mut fastrand::Rng) -> Linestring {
    (0..rng.usize(0..12)).map(|_| random_id(rng)).collect()
}

#[test]
fn test_shape_round_trip() {
    for shape in sample_shapes() {
        let record = to_wire(&shape).unwrap();
        assert_eq!(from_wire(&record).unwrap(), shape);
    }
}

#[test]
fn test_random_polygon_round_trip() {
    let mut rng = fastrand::Rng::with_seed(8086);
    for _ in 0..50 {
        let inner = (0..rng.usize(0..5)).map(|_| random_ring(&mut rng)).collect();
        let shape = Shape::Polygon(Polygon::new(random_ring(&mut rng), inner));
        let record = to_wire(&shape).unwrap();
        assert_eq!(from_wire(&record).unwrap(), shape);
    }
}

#[test]
fn test_linestring_layout() {
    let record = to_wire(&Shape::Linestring(ring(&["0001", "0002"]))).unwrap();
    assert_eq!(record.kind().unwrap(), ShapeKind::Linestring);
    assert_eq!(record.raw_location(), ShapeLocation::NoLocation.as_raw());
    let payload = record.payload();
    assert_eq!(payload.len(), 2 + 2 * MAX_CELL_LEN);
    assert_eq!(&payload[..2], &2u16.to_le_bytes());
    assert_eq!(&payload[2..6], b"0001");
    assert_eq!(&payload[2 + MAX_CELL_LEN..2 + MAX_CELL_LEN + 4], b"0002");
}

#[test]
fn test_polygon_rings_have_own_buffers() {
    let shape = Shape::Polygon(Polygon::new(
        ring(&["00111", "0002", "0001", "00333"]),
        vec![ring(&["00312", "00302", "00321"]), ring(&["00313"])],
    ));
    let record = to_wire(&shape).unwrap();
    assert_eq!(record.ring_buffers().len(), 2);
    assert_eq!(record.ring_buffers()[0].len(), 3);
    assert_eq!(record.ring_buffers()[1].len(), 1);

    match record.view().unwrap() {
        RecordView::Polygon { outer, inner } => {
            assert_eq!(outer.len(), 4);
            assert_eq!(inner.len(), 2);
            assert_eq!(inner[1].to_cells().unwrap(), vec![CellId::new("00313")]);
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn test_extended_shapes_ignore_location_tag() {
    let cells = CellBuffer::from_cells(&[CellId::new("0001")]).unwrap();
    let record = ShapeRecord::linestring(cells.as_slice()).unwrap();
    let tagged = ShapeRecord::from_parts(
        record.discriminant(),
        ShapeLocation::ManyFaces.as_raw(),
        record.payload().to_vec(),
        vec![],
    );
    assert_eq!(from_wire(&tagged).unwrap().location(), ShapeLocation::NoLocation);
}

#[test]
fn test_unsupported_discriminant() {
    let good = to_wire(&Shape::cell("0000")).unwrap();
    for discriminant in [3, 7, u32::MAX] {
        let record =
            ShapeRecord::from_parts(discriminant, 0, good.payload().to_vec(), vec![]);
        let err = from_wire(&record).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedShapeType { discriminant: d } if *d == discriminant
        ));
    }
}

#[test]
fn test_discriminant_checked_before_payload() {
    // A cell-sized payload tagged as a polygon must not be read as a cell.
    let good = to_wire(&Shape::cell("0000")).unwrap();
    let record = ShapeRecord::from_parts(
        ShapeKind::Polygon.as_raw(),
        0,
        good.payload().to_vec(),
        vec![],
    );
    let err = from_wire(&record).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
}

#[test]
fn test_id_too_long_is_encoding_overflow() {
    let long = "0".repeat(MAX_CELL_LEN);
    let shapes = [
        Shape::cell(long.as_str()),
        Shape::Linestring(ring(&["0001", long.as_str()])),
        Shape::Polygon(Polygon::new(ring(&["0001"]), vec![ring(&[long.as_str()])])),
    ];
    for shape in shapes {
        let err = to_wire(&shape).unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::EncodingOverflow { .. }),
            "{err}"
        );
    }
}

#[test]
fn test_trailing_whitespace_id_is_not_silently_trimmed() {
    let shapes = [
        Shape::cell("0701 "),
        Shape::Linestring(ring(&["0701 ", "0702"])),
        Shape::Polygon(Polygon::new(ring(&["0700", "0701", "0702"]), vec![ring(&["07021\t"])])),
    ];
    for shape in shapes {
        let err = to_wire(&shape).unwrap_err();
        assert!(err.to_string().contains("ends with whitespace"), "{err}");
    }
}

#[test]
fn test_linestring_count_overflow() {
    let cells: Linestring = std::iter::repeat_n("07", u16::MAX as usize + 1).collect();
    let err = to_wire(&Shape::Linestring(cells)).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::EncodingOverflow { .. }));

    let cells: Linestring = std::iter::repeat_n("07", u16::MAX as usize).collect();
    let record = to_wire(&Shape::Linestring(cells)).unwrap();
    assert_eq!(from_wire(&record).unwrap().as_linestring().unwrap().len(), 65535);
}

#[test]
fn test_empty_cell_rejected() {
    let err = to_wire(&Shape::cell("")).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));

    let record = ShapeRecord::single(&[0u8; MAX_CELL_LEN], ShapeLocation::OneFace).unwrap();
    let err = from_wire(&record).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
}

#[test]
fn test_truncated_payloads() {
    for shape in sample_shapes() {
        let record = to_wire(&shape).unwrap();
        let payload = record.payload();
        for len in [0, 1, payload.len() - 1] {
            let truncated = ShapeRecord::from_parts(
                record.discriminant(),
                record.raw_location(),
                payload[..len].to_vec(),
                record.ring_buffers().to_vec(),
            );
            let err = from_wire(&truncated).unwrap_err();
            assert!(
                matches!(err.kind(), ErrorKind::InvalidFormat { .. }),
                "{shape:?} truncated to {len}: {err}"
            );
        }
    }
}

#[test]
fn test_missing_ring_buffer() {
    let shape = Shape::Polygon(Polygon::new(ring(&["0001"]), vec![ring(&["0002"])]));
    let record = to_wire(&shape).unwrap();
    let stripped = ShapeRecord::from_parts(
        record.discriminant(),
        record.raw_location(),
        record.payload().to_vec(),
        vec![],
    );
    let err = from_wire(&stripped).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
}

#[test]
fn test_unknown_location_rejected() {
    let good = to_wire(&Shape::cell("0000")).unwrap();
    let record = ShapeRecord::from_parts(0, 9, good.payload().to_vec(), vec![]);
    assert!(from_wire(&record).is_err());
}

#[test]
fn test_geo_shape_round_trip() {
    let a = GeoPoint::new(1.234, 2.345, 3.879);
    let b = GeoPoint::new(3.456, 4.567, 3.879);
    let c = GeoPoint::new(2.0, 5.0, 3.879);
    let shapes = [
        GeoShape::Point(a),
        GeoShape::Linestring(GeoLinestring::new(vec![a, b])),
        GeoShape::Polygon(GeoPolygon::new(
            GeoLinestring::new(vec![a, b, c, a]),
            vec![GeoLinestring::new(vec![b, c, b])],
        )),
    ];
    for shape in shapes {
        let record: GeoShapeRecord = geo_to_wire(&shape).unwrap();
        assert_eq!(record.raw_location(), ShapeLocation::NoLocation.as_raw());
        assert_eq!(geo_from_wire(&record).unwrap(), shape);
    }
}

#[test]
fn test_geo_point_record_width() {
    let record = geo_to_wire(&GeoShape::Point(GeoPoint::new(1.0, 2.0, 3.0))).unwrap();
    assert_eq!(record.payload().len(), 24);
    assert_eq!(record.kind().unwrap(), wire::ShapeKind::Cell);
}

#[test]
fn test_shape_serde() {
    let shape = Shape::Polygon(Polygon::new(ring(&["0001", "0002"]), vec![]));
    let json = serde_json::to_string(&shape).unwrap();
    let parsed: Shape = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, shape);

    let point: GeoPoint =
        serde_json::from_str(r#"{"latitude": 1.234, "longitude": 2.345, "accuracy": 3.879}"#)
            .unwrap();
    assert_eq!(point, GeoPoint::new(1.234, 2.345, 3.879));
}
