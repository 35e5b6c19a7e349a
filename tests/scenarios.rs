//! End-to-end scenario coverage wiring the orchestrator, chunk ladder, and scene harness together
//! — the cases from the scene harness' "literal" scenarios that are worth pinning down with a
//! dedicated integration test on top of the module-local unit tests.

use cadence::orchestrator::Orchestrator;
use cadence::playback_buffer::PlaybackBuffer;
use cadence::scene::mock::{ColdStartAdapter, LongReadAdapter, SwapAdapter};
use cadence::scene::{SceneOptions, run_barge_in_scene, run_scene};
use futures_util::StreamExt;

#[tokio::test]
async fn long_read_settles_the_ladder_into_a_steady_index() {
    let adapter = LongReadAdapter::new(60);
    let mut orch = Orchestrator::new(adapter, PlaybackBuffer::new(1000.0), None);

    let results: Vec<_> = orch.stream(|_| {}).collect().await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert!(orch.events().len() >= 50);

    let durations: Vec<f64> = orch.events().iter().map(|e| e.render_ms).collect();
    assert!(durations.iter().all(|ms| *ms >= 0.0));

    // 10ms chunks land comfortably under the 50ms low-water mark, so the ladder should have
    // stepped all the way up and stayed there for the back half of the run.
    let last_windows: Vec<u32> = orch
        .events()
        .iter()
        .rev()
        .take(10)
        .map(|e| e.token_window)
        .collect();
    assert!(last_windows.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn cold_start_scene_round_trips_through_a_temp_directory() {
    let dir = tempfile::tempdir().unwrap();
    let opts = SceneOptions::new(dir.path(), 16_000);
    let result = run_scene("cold_start", ColdStartAdapter::new(3), &opts)
        .await
        .unwrap();

    assert_eq!(result.events.len(), 3);
    assert!(result.events[0].event.render_ms > result.events[1].event.render_ms);
    assert!(result.events.iter().all(|e| e.buffer_ms >= 0.0));
    assert!(result.events.last().unwrap().event.chunk_id == 2);
}

#[tokio::test]
async fn mid_stream_swap_scene_shows_a_single_adapter_transition() {
    let dir = tempfile::tempdir().unwrap();
    let opts = SceneOptions::new(dir.path(), 16_000);
    let result = run_scene("mid_stream_swap", SwapAdapter::new(3, 6), &opts)
        .await
        .unwrap();

    let names: Vec<&str> = result
        .events
        .iter()
        .map(|e| e.event.adapter.as_str())
        .collect();
    let first_b = names.iter().position(|n| *n == "adapter_b");
    if let Some(idx) = first_b {
        assert!(names[..idx].iter().all(|n| *n == "adapter_a"));
        assert!(names[idx..].iter().all(|n| *n == "adapter_b"));
    } else {
        panic!("expected a transition to adapter_b somewhere in the run");
    }
}

#[tokio::test]
async fn barge_in_scene_terminates_early_with_buffer_drained() {
    let dir = tempfile::tempdir().unwrap();
    let opts = SceneOptions::new(dir.path(), 16_000).with_barge_in_at(2);
    let result = run_barge_in_scene(&opts).await.unwrap();

    assert!(result.base.events.len() < result.planned_chunks as usize);
    assert!(result.reset_called);
}

#[tokio::test]
async fn adapter_pull_failure_surfaces_to_the_caller_without_retry() {
    struct FlakyAdapter;
    impl cadence::Adapter for FlakyAdapter {
        async fn pull(&mut self, _window: u32) -> anyhow::Result<cadence::AudioChunk> {
            anyhow::bail!("backend timed out");
        }
        async fn reset(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    let adapter = FlakyAdapter;
    let mut orch = Orchestrator::new(adapter, PlaybackBuffer::new(1000.0), None);
    let results: Vec<_> = orch.stream(|_| {}).collect().await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}
