mod interaction;
mod movement;
mod scene_impl;
mod session;

use std::time::Duration;

use roam_engine::{Scene, SceneContent};

pub(crate) fn build_scene(content: SceneContent, reveal_delay: Duration) -> Box<dyn Scene> {
    Box::new(scene_impl::ExplorationScene::new(content, reveal_delay))
}
