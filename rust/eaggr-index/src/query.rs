//! Resolution of search queries to a single cell id.

use eaggr_common::{Result, error::Error};
use eaggr_engine::{EngineBoundary, EngineSession};
use eaggr_format::{CellId, GeoPoint, Topology};
use serde::{Deserialize, Serialize};

/// A point query: find documents indexed with the cell containing
/// (`lat`, `lon`) at `accuracy` square metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellQuery {
    pub lat: f64,
    pub lon: f64,
    pub accuracy: f64,
    #[serde(default)]
    pub model: Topology,
}

impl CellQuery {
    pub fn new(lat: f64, lon: f64, accuracy: f64, model: Topology) -> CellQuery {
        CellQuery {
            lat,
            lon,
            accuracy,
            model,
        }
    }

    /// Parses and validates a JSON query body such as
    /// `{"lat": 1.234, "lon": 2.345, "accuracy": 3.879, "model": "ISEA3H"}`.
    pub fn from_json(text: &str) -> Result<CellQuery> {
        let query: CellQuery =
            serde_json::from_str(text).map_err(|e| Error::invalid_format("query", e.to_string()))?;
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::invalid_arg(
                "lat",
                format!("latitude {} is outside [-90, 90]", self.lat),
            ));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::invalid_arg(
                "lon",
                format!("longitude {} is outside [-180, 180]", self.lon),
            ));
        }
        if !self.accuracy.is_finite() || self.accuracy <= 0.0 {
            return Err(Error::invalid_arg(
                "accuracy",
                format!("accuracy {} must be a positive area", self.accuracy),
            ));
        }
        Ok(())
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon, self.accuracy)
    }
}

/// Resolves queries against an open session.
pub struct QueryCellResolver<'s, B: EngineBoundary> {
    session: &'s EngineSession<B>,
}

impl<'s, B: EngineBoundary> QueryCellResolver<'s, B> {
    pub fn new(session: &'s EngineSession<B>) -> Self {
        QueryCellResolver { session }
    }

    /// Returns the single cell a document indexed at the query accuracy
    /// would carry for the query point.
    ///
    /// The query model must match the session topology.
    pub fn resolve(&self, query: &CellQuery) -> Result<CellId> {
        query.validate()?;
        let topology = self.session.topology();
        if query.model != topology {
            return Err(Error::invalid_arg(
                "model",
                format!("query model {} does not match the {topology} session", query.model),
            ));
        }
        self.session.project_point(&query.point())
    }
}

/// Resolves `query` in a session opened for the query model and closed
/// before returning.
///
/// A failed projection is reported in preference to a failed close.
pub fn resolve_query<B: EngineBoundary>(boundary: B, query: &CellQuery) -> Result<CellId> {
    query.validate()?;
    let mut session = EngineSession::open(boundary, query.model)?;
    let cell = QueryCellResolver::new(&session).resolve(query);
    let closed = session.close();
    let cell = cell?;
    closed?;
    log::debug!(
        "query ({}, {}) at {} resolved to {} cell {cell}",
        query.lat,
        query.lon,
        query.accuracy,
        query.model
    );
    Ok(cell)
}
