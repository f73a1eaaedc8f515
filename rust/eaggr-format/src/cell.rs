//! Grid cell identifiers.
//!
//! A cell id is an opaque string token. Across the engine boundary it travels
//! as a fixed-width, NUL-padded byte field of [`MAX_CELL_LEN`] bytes, which
//! includes room for the C string terminator.

use eaggr_common::{Result, error::Error, verify_data};
use serde::{Deserialize, Serialize};

/// Width in bytes of the cell id field at the engine boundary, terminator included.
pub const MAX_CELL_LEN: usize = 43;

/// A cell id in its boundary (fixed-width) form.
pub type EncodedCell = [u8; MAX_CELL_LEN];

/// Identifier of a single grid cell.
///
/// Equality is plain string equality. Any structure carried by the id (such as
/// hierarchical prefixes) depends on the grid topology and is interpreted by
/// the indexer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    pub fn new(id: impl Into<String>) -> CellId {
        CellId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns the id formed by the first `len` bytes of this one, or `None` if
    /// `len` is out of range or does not fall on a character boundary.
    pub fn prefix(&self, len: usize) -> Option<CellId> {
        self.0.get(..len).map(CellId::new)
    }

    /// Encodes the id into its fixed-width boundary form.
    ///
    /// The id must leave room for the terminating NUL, so any id of
    /// `MAX_CELL_LEN` bytes or more is rejected with `IdTooLong`. Ids ending in
    /// whitespace are rejected too, since decoding trims it.
    pub fn encode(&self) -> Result<EncodedCell> {
        let mut buf = [0u8; MAX_CELL_LEN];
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Encodes the id into `dest`, which must be exactly `MAX_CELL_LEN` bytes.
    /// Bytes past the id are zeroed.
    pub fn encode_into(&self, dest: &mut [u8]) -> Result<()> {
        let bytes = self.0.as_bytes();
        if bytes.len() >= MAX_CELL_LEN {
            return Err(Error::id_too_long(self.0.clone(), MAX_CELL_LEN - 1));
        }
        if bytes.contains(&0) {
            return Err(Error::invalid_arg(
                "cell id",
                format!("'{}' contains a NUL byte", self.0.escape_debug()),
            ));
        }
        if self.0.ends_with(char::is_whitespace) {
            return Err(Error::invalid_arg(
                "cell id",
                format!("'{}' ends with whitespace", self.0.escape_debug()),
            ));
        }
        if dest.len() != MAX_CELL_LEN {
            return Err(Error::invalid_arg(
                "dest",
                format!("expected {MAX_CELL_LEN} bytes, got {}", dest.len()),
            ));
        }
        dest[..bytes.len()].copy_from_slice(bytes);
        dest[bytes.len()..].fill(0);
        Ok(())
    }

    /// Decodes a fixed-width cell field.
    ///
    /// The id ends at the first NUL byte; trailing whitespace is trimmed. A
    /// field whose id fills all `MAX_CELL_LEN` bytes has no room for the
    /// terminator and is rejected.
    pub fn decode(bytes: &[u8]) -> Result<CellId> {
        verify_data!(bytes, bytes.len() == MAX_CELL_LEN);
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = std::str::from_utf8(&bytes[..end])
            .map_err(|e| Error::invalid_format("cell id", e.to_string()))?
            .trim_end();
        if text.len() >= MAX_CELL_LEN {
            return Err(Error::invalid_format(
                "cell id",
                format!("id fills all {MAX_CELL_LEN} bytes without a terminator"),
            ));
        }
        Ok(CellId::new(text))
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CellId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        CellId::new(id)
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        CellId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eaggr_common::error::ErrorKind;

    #[test]
    fn test_encode_pads_with_nul() {
        let encoded = CellId::new("07231131111113100331001").encode().unwrap();
        assert_eq!(&encoded[..23], b"07231131111113100331001");
        assert!(encoded[23..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_trims_padding() {
        let mut raw = [0u8; MAX_CELL_LEN];
        raw[..7].copy_from_slice(b"01033,6");
        assert_eq!(CellId::decode(&raw).unwrap().as_str(), "01033,6");

        let mut raw = [b' '; MAX_CELL_LEN];
        raw[..4].copy_from_slice(b"0700");
        assert_eq!(CellId::decode(&raw).unwrap().as_str(), "0700");
    }

    #[test]
    fn test_round_trip_below_limit() {
        for len in 0..MAX_CELL_LEN {
            let id = CellId::new("3".repeat(len));
            let encoded = id.encode().unwrap();
            assert_eq!(CellId::decode(&encoded).unwrap(), id);
        }
    }

    #[test]
    fn test_encode_at_or_over_limit_fails() {
        for len in [MAX_CELL_LEN, MAX_CELL_LEN + 1, 100] {
            let err = CellId::new("0".repeat(len)).encode().unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::IdTooLong { .. }));
        }
        // The 43-character id the engine itself rejects.
        let err = CellId::new("0123012301230123012301230123012301230123012")
            .encode()
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::IdTooLong { max_len: 42, .. }));
    }

    #[test]
    fn test_encode_rejects_interior_nul() {
        let err = CellId::new("07\0").encode().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_encode_rejects_trailing_whitespace() {
        for id in ["07 ", "0701\t", "01033,6\n"] {
            let err = CellId::new(id).encode().unwrap_err();
            assert!(
                matches!(err.kind(), ErrorKind::InvalidArgument { .. }),
                "{err}"
            );
        }
        // Leading and interior whitespace survive decoding, so they are kept.
        for id in [" 07", "07 01"] {
            let id = CellId::new(id);
            assert_eq!(CellId::decode(&id.encode().unwrap()).unwrap(), id);
        }
    }

    #[test]
    fn test_decode_requires_room_for_terminator() {
        let err = CellId::decode(&[b'1'; MAX_CELL_LEN]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));

        let mut raw = [b'1'; MAX_CELL_LEN];
        raw[MAX_CELL_LEN - 1] = 0;
        let id = CellId::decode(&raw).unwrap();
        assert_eq!(id.len(), MAX_CELL_LEN - 1);
        assert_eq!(id.encode().unwrap(), raw);
    }

    #[test]
    fn test_decode_wrong_width() {
        let err = CellId::decode(b"0700").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let mut raw = [0u8; MAX_CELL_LEN];
        raw[0] = 0xff;
        raw[1] = 0xfe;
        let err = CellId::decode(&raw).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }

    #[test]
    fn test_prefix() {
        let id = CellId::new("0723");
        assert_eq!(id.prefix(2).unwrap().as_str(), "07");
        assert_eq!(id.prefix(4).unwrap(), id);
        assert!(id.prefix(5).is_none());
    }
}
