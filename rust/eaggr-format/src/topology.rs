//! Grid topologies supported by the engine.

use eaggr_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

use crate::cell::CellId;

/// Number of leading id characters naming the polyhedron face.
pub const FACE_ID_LEN: usize = 2;

/// The grid subdivision scheme a session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Topology {
    /// Icosahedral Snyder equal area, aperture 4 triangles.
    ///
    /// Ids are hierarchical: every prefix of at least [`FACE_ID_LEN`]
    /// characters is an ancestor cell.
    #[default]
    #[serde(rename = "ISEA4T")]
    Isea4t,
    /// Icosahedral Snyder equal area, aperture 3 hexagons.
    ///
    /// Ids have the form `FFRR<offsets>`; the resolution is encoded in
    /// characters 2..4 and id length carries no hierarchy.
    #[serde(rename = "ISEA3H")]
    Isea3h,
}

impl Topology {
    /// Ordinal of the model in the engine's C enumeration.
    pub const fn as_raw(self) -> u32 {
        match self {
            Topology::Isea4t => 0,
            Topology::Isea3h => 1,
        }
    }

    pub fn from_raw(raw: u32) -> Result<Topology> {
        match raw {
            0 => Ok(Topology::Isea4t),
            1 => Ok(Topology::Isea3h),
            _ => Err(Error::invalid_arg("model", format!("unknown model {raw}"))),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Topology::Isea4t => "ISEA4T",
            Topology::Isea3h => "ISEA3H",
        }
    }

    /// Number of child cells per parent between adjacent resolutions.
    pub const fn aperture(self) -> u32 {
        match self {
            Topology::Isea4t => 4,
            Topology::Isea3h => 3,
        }
    }

    /// Whether ancestors can be derived from the id alone.
    pub const fn is_hierarchical(self) -> bool {
        matches!(self, Topology::Isea4t)
    }

    /// Returns the resolution of `cell` under this topology.
    pub fn resolution(self, cell: &CellId) -> Result<u32> {
        match self {
            Topology::Isea4t => {
                if cell.len() < FACE_ID_LEN {
                    return Err(Error::invalid_arg(
                        "cell",
                        format!("'{cell}' is shorter than a face id"),
                    ));
                }
                Ok((cell.len() - FACE_ID_LEN) as u32)
            }
            Topology::Isea3h => cell
                .as_str()
                .get(FACE_ID_LEN..FACE_ID_LEN + 2)
                .and_then(|digits| digits.parse::<u32>().ok())
                .ok_or_else(|| {
                    Error::invalid_arg(
                        "cell",
                        format!("'{cell}' does not carry a resolution in characters 2..4"),
                    )
                }),
        }
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Topology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ISEA4T" => Ok(Topology::Isea4t),
            "ISEA3H" => Ok(Topology::Isea3h),
            _ => Err(Error::invalid_arg("model", format!("unknown model '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_isea4t() {
        let cell = CellId::new("07231131111113100331001");
        assert_eq!(Topology::Isea4t.resolution(&cell).unwrap(), 21);
        assert_eq!(Topology::Isea4t.resolution(&"07".into()).unwrap(), 0);
        assert!(Topology::Isea4t.resolution(&"0".into()).is_err());
    }

    #[test]
    fn test_resolution_isea3h() {
        assert_eq!(Topology::Isea3h.resolution(&"01033,6".into()).unwrap(), 3);
        assert_eq!(Topology::Isea3h.resolution(&"07120,0".into()).unwrap(), 12);
        // Signed offsets as the engine writes them at fine resolutions.
        assert_eq!(
            Topology::Isea3h
                .resolution(&"0728-549628,-522499".into())
                .unwrap(),
            28
        );
        assert!(Topology::Isea3h.resolution(&"01".into()).is_err());
        assert!(Topology::Isea3h.resolution(&"01x3,6".into()).is_err());
    }

    #[test]
    fn test_names_and_ordinals() {
        for topology in [Topology::Isea4t, Topology::Isea3h] {
            assert_eq!(topology.name().parse::<Topology>().unwrap(), topology);
            assert_eq!(Topology::from_raw(topology.as_raw()).unwrap(), topology);
        }
        assert!("ISEA9R".parse::<Topology>().is_err());
        assert_eq!(Topology::default(), Topology::Isea4t);
    }
}
