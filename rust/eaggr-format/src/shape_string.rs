//! Textual shape formats accepted and produced by the engine.

use eaggr_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ShapeStringFormat {
    #[serde(rename = "WKT")]
    Wkt = 0,
    #[serde(rename = "GEO_JSON")]
    GeoJson = 1,
}

impl ShapeStringFormat {
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    pub fn from_raw(raw: u32) -> Result<ShapeStringFormat> {
        match raw {
            0 => Ok(ShapeStringFormat::Wkt),
            1 => Ok(ShapeStringFormat::GeoJson),
            _ => Err(Error::invalid_arg(
                "format",
                format!("unknown shape string format {raw}"),
            )),
        }
    }
}
