use eaggr_common::{StatusCode, error::ErrorKind};
use eaggr_engine::EngineSession;
use eaggr_format::{CellId, Predicate, Shape, ShapeStringFormat, Topology};
use eaggr_testkit::{Call, ScriptedEngine, datasets::POINT_A};

#[test]
fn test_open_and_close() {
    let engine = ScriptedEngine::new();
    let stats = engine.stats();
    let mut session = EngineSession::open(engine, Topology::Isea3h).unwrap();
    assert!(session.is_open());
    assert_eq!(session.topology(), Topology::Isea3h);
    assert_eq!(stats.open_handles(), 1);

    session.close().unwrap();
    assert!(!session.is_open());
    assert_eq!(stats.open_handles(), 0);
    assert_eq!(stats.calls(Call::Close), 1);
}

#[test]
fn test_double_close_is_a_local_error() {
    let engine = ScriptedEngine::new();
    let stats = engine.stats();
    let mut session = EngineSession::open(engine, Topology::Isea4t).unwrap();
    session.close().unwrap();
    let err = session.close().unwrap_err();
    match err.kind() {
        ErrorKind::SessionClosed { operation } => assert_eq!(operation, "close"),
        other => panic!("unexpected error kind: {other:?}"),
    }
    assert_eq!(stats.calls(Call::Close), 1);
}

#[test]
fn test_use_after_close_never_reaches_the_engine() {
    let engine = ScriptedEngine::new();
    let stats = engine.stats();
    let mut session = EngineSession::open(engine, Topology::Isea4t).unwrap();
    session.close().unwrap();
    let calls = stats.total_calls();

    let cell = CellId::new("0700");
    let shape = Shape::cell("0700");
    let errors = [
        session.project_point(&POINT_A).unwrap_err(),
        session.project_shapes(&[]).unwrap_err(),
        session.unproject_cells(&[]).unwrap_err(),
        session
            .project_shape_string("POINT (0 0)", ShapeStringFormat::Wkt, 1.0)
            .unwrap_err(),
        session
            .cells_to_shape_string(&[cell.clone()], ShapeStringFormat::Wkt)
            .unwrap_err(),
        session
            .cell_outline_to_shape_string(&cell, ShapeStringFormat::GeoJson)
            .unwrap_err(),
        session.parents(&cell).unwrap_err(),
        session.children(&cell).unwrap_err(),
        session.siblings(&cell).unwrap_err(),
        session.bounding_cell(&[cell.clone()]).unwrap_err(),
        session
            .compare(&shape, &shape, Predicate::Equals)
            .unwrap_err(),
        session.version().unwrap_err(),
        session.last_error().unwrap_err(),
    ];
    for err in errors {
        assert!(
            matches!(err.kind(), ErrorKind::SessionClosed { .. }),
            "{err}"
        );
    }
    assert_eq!(stats.total_calls(), calls);
}

#[test]
fn test_failed_close_still_closes_locally() {
    let engine = ScriptedEngine::new().with_failure(Call::Close, StatusCode::InvalidHandle, "");
    let stats = engine.stats();
    let mut session = EngineSession::open(engine, Topology::Isea4t).unwrap();
    let err = session.close().unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::EngineCloseFailed {
            code: StatusCode::InvalidHandle
        }
    ));
    assert!(!session.is_open());
    assert!(matches!(
        session.close().unwrap_err().kind(),
        ErrorKind::SessionClosed { .. }
    ));
    drop(session);
    assert_eq!(stats.calls(Call::Close), 1);
}

#[test]
fn test_drop_closes_open_session() {
    let engine = ScriptedEngine::new();
    let stats = engine.stats();
    {
        let _session = EngineSession::open(engine, Topology::Isea4t).unwrap();
        assert_eq!(stats.open_handles(), 1);
    }
    assert_eq!(stats.open_handles(), 0);
    assert_eq!(stats.calls(Call::Close), 1);
}

#[test]
fn test_open_failure() {
    let engine = ScriptedEngine::new().with_failure(
        Call::Open,
        StatusCode::MemoryAllocationFailure,
        "",
    );
    let stats = engine.stats();
    let err = EngineSession::open(engine, Topology::Isea4t).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::EngineOpenFailed {
            code: StatusCode::MemoryAllocationFailure
        }
    ));
    assert_eq!(err.engine_code(), Some(StatusCode::MemoryAllocationFailure));
    assert_eq!(stats.open_handles(), 0);
}

#[test]
fn test_open_unrecognised_status() {
    let engine = ScriptedEngine::new().with_raw_failure(Call::Open, -3, "");
    let err = EngineSession::open(engine, Topology::Isea4t).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnrecognisedEngineStatus { raw: -3 }
    ));
}

#[test]
fn test_independent_sessions_in_parallel() {
    let handles: Vec<_> = [Topology::Isea4t, Topology::Isea3h, Topology::Isea4t]
        .into_iter()
        .map(|topology| {
            std::thread::spawn(move || {
                let mut session = EngineSession::open(ScriptedEngine::new(), topology).unwrap();
                let parents = session.parents(&"0700".into());
                session.close().unwrap();
                (topology, parents.is_ok())
            })
        })
        .collect();
    for handle in handles {
        let (topology, ok) = handle.join().unwrap();
        // Only the triangular hierarchy is derived without a script.
        assert_eq!(ok, topology == Topology::Isea4t);
    }
}
