//! Relations of the triangular aperture 4 grid, derived from the ids.
//!
//! A cell id is a two character face number followed by one digit in `0..4`
//! per resolution. Every prefix of at least two characters is an ancestor.

use eaggr_format::{CellId, topology::FACE_ID_LEN};

const DIGITS: [char; 4] = ['0', '1', '2', '3'];

pub fn parent(cell: &CellId) -> Option<CellId> {
    if cell.len() > FACE_ID_LEN {
        cell.prefix(cell.len() - 1)
    } else {
        None
    }
}

pub fn children(cell: &CellId) -> Vec<CellId> {
    DIGITS
        .iter()
        .map(|digit| CellId::new(format!("{cell}{digit}")))
        .collect()
}

/// The other children of the cell's parent.
pub fn siblings(cell: &CellId) -> Vec<CellId> {
    match parent(cell) {
        Some(parent) => children(&parent)
            .into_iter()
            .filter(|child| child != cell)
            .collect(),
        None => Vec::new(),
    }
}

/// The longest common prefix of all cells, if it still names a face.
pub fn bounding(cells: &[CellId]) -> Option<CellId> {
    let (first, rest) = cells.split_first()?;
    let mut len = first.len();
    for cell in rest {
        len = first
            .as_str()
            .bytes()
            .zip(cell.as_str().bytes())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
    }
    if len >= FACE_ID_LEN {
        first.prefix(len)
    } else {
        None
    }
}

/// Whether `ancestor` is `cell` or one of its ancestors.
pub fn is_ancestor_or_self(ancestor: &CellId, cell: &CellId) -> bool {
    ancestor.len() >= FACE_ID_LEN && cell.as_str().starts_with(ancestor.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[&str]) -> Vec<CellId> {
        ids.iter().copied().map(CellId::from).collect()
    }

    #[test]
    fn test_bounding() {
        assert_eq!(
            bounding(&ids(&["07001", "07002", "07003"])).unwrap().as_str(),
            "0700"
        );
        assert_eq!(bounding(&ids(&["0723"])).unwrap().as_str(), "0723");
        assert_eq!(bounding(&ids(&["0723", "072"])).unwrap().as_str(), "072");
        assert!(bounding(&ids(&["0723", "0823"])).is_none());
        assert!(bounding(&[]).is_none());
    }

    #[test]
    fn test_parent_children_siblings() {
        let cell = CellId::new("0700");
        assert_eq!(parent(&cell).unwrap().as_str(), "070");
        assert!(parent(&CellId::new("07")).is_none());
        assert_eq!(children(&cell), ids(&["07000", "07001", "07002", "07003"]));
        assert_eq!(siblings(&cell), ids(&["0701", "0702", "0703"]));
    }
}
