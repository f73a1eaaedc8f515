//! Tagged-union shape records.
//!
//! A record is a discriminant, a location tag and a flat payload whose layout
//! is selected solely by the discriminant:
//!
//! | kind | payload |
//! |---|---|
//! | single element | one element |
//! | linestring | `u16` count, flattened elements |
//! | polygon | outer linestring block, `u16` inner ring count, one [`RingHeader`] per inner ring |
//!
//! Inner rings do not share a backing store: each header carries its own
//! count and the index of the separately owned buffer holding its elements.
//! All integers are little-endian.

use eaggr_common::{Result, error::Error, verify_arg, verify_data};

use super::{
    ShapeKind,
    flat::{CellElement, Element, FlatBuffer, FlatSlice, PointElement},
};
use crate::shape::ShapeLocation;

const COUNT_LEN: usize = std::mem::size_of::<u16>();

/// Header of one inner ring inside a polygon payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingHeader {
    /// Number of elements in the ring.
    pub count: u16,
    /// Index of the ring's buffer in the record's ring buffers.
    pub buffer: u32,
}

impl RingHeader {
    pub const ENCODED_LEN: usize = 6;

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.count.to_le_bytes());
        out.extend_from_slice(&self.buffer.to_le_bytes());
    }

    fn read(bytes: &[u8]) -> RingHeader {
        RingHeader {
            count: u16::from_le_bytes([bytes[0], bytes[1]]),
            buffer: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
        }
    }
}

/// A boundary record holding one shape of `E` elements.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord<E: Element> {
    discriminant: u32,
    location: u32,
    payload: Vec<u8>,
    rings: Vec<FlatBuffer<E>>,
}

/// A record of cell ids, the engine's shape representation.
pub type ShapeRecord = TaggedRecord<CellElement>;

/// A record of geographic points, the engine's input shape representation.
/// Discriminant 0 denotes a point.
pub type GeoShapeRecord = TaggedRecord<PointElement>;

/// A decoded view of a record's payload, borrowed from the record.
#[derive(Debug, Clone)]
pub enum RecordView<'a> {
    Single(&'a [u8]),
    Linestring(FlatSlice<'a>),
    Polygon {
        outer: FlatSlice<'a>,
        inner: Vec<FlatSlice<'a>>,
    },
}

impl<E: Element> TaggedRecord<E> {
    /// Assembles a record from raw parts without validating them; validation
    /// happens when the record is viewed.
    pub fn from_parts(
        discriminant: u32,
        location: u32,
        payload: Vec<u8>,
        rings: Vec<FlatBuffer<E>>,
    ) -> TaggedRecord<E> {
        TaggedRecord {
            discriminant,
            location,
            payload,
            rings,
        }
    }

    /// Builds a single-element record.
    pub fn single(element: &[u8], location: ShapeLocation) -> Result<TaggedRecord<E>> {
        verify_arg!(element, element.len() == E::WIDTH);
        Ok(TaggedRecord::from_parts(
            ShapeKind::Cell.as_raw(),
            location.as_raw(),
            element.to_vec(),
            Vec::new(),
        ))
    }

    /// Builds a linestring record from a flattened element array.
    pub fn linestring(elements: FlatSlice<'_>) -> Result<TaggedRecord<E>> {
        let mut payload = Vec::with_capacity(COUNT_LEN + elements.as_bytes().len());
        write_block::<E>(&mut payload, elements, "linestring")?;
        Ok(TaggedRecord::from_parts(
            ShapeKind::Linestring.as_raw(),
            ShapeLocation::NoLocation.as_raw(),
            payload,
            Vec::new(),
        ))
    }

    /// Builds a polygon record; each inner ring is copied into its own buffer.
    pub fn polygon(outer: FlatSlice<'_>, inner: &[FlatSlice<'_>]) -> Result<TaggedRecord<E>> {
        let mut payload = Vec::with_capacity(
            2 * COUNT_LEN + outer.as_bytes().len() + inner.len() * RingHeader::ENCODED_LEN,
        );
        write_block::<E>(&mut payload, outer, "polygon outer ring")?;
        let inner_count = u16::try_from(inner.len()).map_err(|_| {
            Error::encoding_overflow(
                "polygon inner rings",
                Error::invalid_arg("count", format!("{} exceeds {}", inner.len(), u16::MAX)),
            )
        })?;
        payload.extend_from_slice(&inner_count.to_le_bytes());

        let mut rings = Vec::with_capacity(inner.len());
        for (i, ring) in inner.iter().enumerate() {
            let element = format!("polygon inner ring[{i}]");
            verify_arg!(ring, ring.width() == E::WIDTH);
            let count = checked_count(ring.len(), &element)?;
            RingHeader {
                count,
                buffer: i as u32,
            }
            .write(&mut payload);
            rings.push(FlatBuffer::copy_from(*ring)?);
        }

        Ok(TaggedRecord::from_parts(
            ShapeKind::Polygon.as_raw(),
            ShapeLocation::NoLocation.as_raw(),
            payload,
            rings,
        ))
    }

    pub fn discriminant(&self) -> u32 {
        self.discriminant
    }

    /// Checks the discriminant against the known set.
    pub fn kind(&self) -> Result<ShapeKind> {
        ShapeKind::try_from(self.discriminant)
    }

    pub fn raw_location(&self) -> u32 {
        self.location
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn ring_buffers(&self) -> &[FlatBuffer<E>] {
        &self.rings
    }

    /// Decodes the payload layout selected by the discriminant.
    pub fn view(&self) -> Result<RecordView<'_>> {
        match self.kind()? {
            ShapeKind::Cell => {
                verify_data!(payload, self.payload.len() == E::WIDTH);
                Ok(RecordView::Single(&self.payload))
            }
            ShapeKind::Linestring => {
                let (elements, rest) = read_block::<E>(&self.payload)?;
                verify_data!(payload, rest.is_empty());
                Ok(RecordView::Linestring(elements))
            }
            ShapeKind::Polygon => {
                let (outer, rest) = read_block::<E>(&self.payload)?;
                verify_data!(payload, rest.len() >= COUNT_LEN);
                let inner_count = u16::from_le_bytes([rest[0], rest[1]]) as usize;
                let headers = &rest[COUNT_LEN..];
                verify_data!(
                    payload,
                    headers.len() == inner_count * RingHeader::ENCODED_LEN
                );
                let inner = headers
                    .chunks_exact(RingHeader::ENCODED_LEN)
                    .map(|bytes| {
                        let header = RingHeader::read(bytes);
                        let ring = self.rings.get(header.buffer as usize).ok_or_else(|| {
                            Error::invalid_format(
                                "polygon inner ring",
                                format!("buffer {} does not exist", header.buffer),
                            )
                        })?;
                        FlatSlice::new(ring.as_bytes(), E::WIDTH, header.count as usize)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(RecordView::Polygon { outer, inner })
            }
        }
    }
}

fn checked_count(len: usize, element: &str) -> Result<u16> {
    u16::try_from(len).map_err(|_| {
        Error::encoding_overflow(
            element,
            Error::invalid_arg("count", format!("{len} exceeds {}", u16::MAX)),
        )
    })
}

fn write_block<E: Element>(out: &mut Vec<u8>, elements: FlatSlice<'_>, element: &str) -> Result<()> {
    verify_arg!(elements, elements.width() == E::WIDTH);
    let count = checked_count(elements.len(), element)?;
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(elements.as_bytes());
    Ok(())
}

fn read_block<E: Element>(bytes: &[u8]) -> Result<(FlatSlice<'_>, &[u8])> {
    verify_data!(bytes, bytes.len() >= COUNT_LEN);
    let count = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
    let body = &bytes[COUNT_LEN..];
    let elements = FlatSlice::new(body, E::WIDTH, count)?;
    Ok((elements, &body[count * E::WIDTH..]))
}
