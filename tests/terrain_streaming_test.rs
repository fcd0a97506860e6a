//! End-to-end terrain streaming without a GPU or a reachable elevation
//! service: the fetch degrades to sea level, the load still completes, and
//! the integrator hands the bundle over exactly once.

use std::thread;
use std::time::{Duration, Instant};

use overflight::streaming::{StreamingIntegrator, TerrainPoll};
use overflight::terrain::{
    AsyncTerrainLoader, ElevationClient, GeoBoundingBox, TerrainBundle, TerrainRequest,
};

const POINTS_PER_AXIS: usize = 9;

fn innsbruck_request() -> TerrainRequest {
    let bbox = GeoBoundingBox {
        ll_lat: 47.20,
        ll_lon: 11.30,
        ur_lat: 47.30,
        ur_lon: 11.45,
    };
    TerrainRequest {
        bbox,
        points_per_axis: POINTS_PER_AXIS,
        origin: bbox.center(),
    }
}

/// Drive the integrator the way the frame loop does: one non-blocking poll
/// per iteration until the load resolves.
fn poll_until_done(integrator: &mut StreamingIntegrator, deadline: Duration) -> TerrainBundle {
    let started = Instant::now();
    loop {
        match integrator.poll() {
            TerrainPoll::Pending => {
                assert!(
                    started.elapsed() < deadline,
                    "terrain load did not resolve within {:?}",
                    deadline
                );
                thread::sleep(Duration::from_millis(10));
            }
            TerrainPoll::Ready(bundle) => return bundle,
            TerrainPoll::Failed(e) => panic!("terrain load failed: {:#}", e),
            TerrainPoll::Idle => panic!("integrator went idle without delivering a bundle"),
        }
    }
}

#[test]
fn an_unreachable_elevation_service_still_yields_a_renderable_mesh() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    // Port 9 (discard) refuses connections; every batch falls back to zero.
    let loader = AsyncTerrainLoader::new(ElevationClient::new("http://127.0.0.1:9/api/v1/lookup"));
    let mut integrator = StreamingIntegrator::new(loader);

    assert!(integrator.begin_load(runtime.handle(), innsbruck_request()));
    let bundle = poll_until_done(&mut integrator, Duration::from_secs(60));

    let p = POINTS_PER_AXIS;
    assert_eq!(bundle.mesh.vertices.len(), p * p);
    assert_eq!(bundle.mesh.triangle_count(), 2 * (p - 1) * (p - 1));
    assert_eq!(bundle.tint.width as usize, p);
    assert_eq!(bundle.tint.height as usize, p);

    // All elevations degraded to zero, so the mesh is flat and every normal
    // points straight up.
    for vertex in &bundle.mesh.vertices {
        assert_eq!(vertex.position[1], 0.0);
        let [x, y, z] = vertex.normal;
        assert_eq!((x, z), (0.0, 0.0));
        assert!((y - 1.0).abs() < 1e-6, "normal {:?}", vertex.normal);
    }

    // The handoff is one-shot: once delivered, the integrator is idle and a
    // new load may start.
    assert!(matches!(integrator.poll(), TerrainPoll::Idle));
    assert!(integrator.begin_load(runtime.handle(), innsbruck_request()));
    poll_until_done(&mut integrator, Duration::from_secs(60));
}

#[test]
fn a_second_load_is_rejected_until_the_first_resolves() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let loader = AsyncTerrainLoader::new(ElevationClient::new("http://127.0.0.1:9/api/v1/lookup"));
    let mut integrator = StreamingIntegrator::new(loader);

    assert!(integrator.begin_load(runtime.handle(), innsbruck_request()));
    // Outstanding load: the second request must be refused, not queued.
    assert!(!integrator.begin_load(runtime.handle(), innsbruck_request()));

    poll_until_done(&mut integrator, Duration::from_secs(60));
    assert!(integrator.begin_load(runtime.handle(), innsbruck_request()));
}
