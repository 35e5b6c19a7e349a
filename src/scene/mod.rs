//! Deterministic mock adapters and the scene-running driver used for audits and end-to-end
//! tests — the only consumers of this crate's internals that are allowed to know the full
//! shape of an orchestrator run.

pub mod harness;
pub mod mock;

pub use harness::{
    BargeInSceneResult, SceneOptions, SceneResult, run_barge_in_scene, run_scene, stream_scene,
};
