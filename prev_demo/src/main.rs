//! PreV headless demo
//!
//! Builds a small world (a player on a tiled terrain, boulders, a sun and two
//! lamps with cascaded shadows), feeds it a scripted input sequence and
//! renders every frame into the recording GPU backend, logging what each
//! frame cost.

mod input_script;
mod player;
mod scene;
mod stone;

use prev_engine::prev::component::{SelectableComponent, TransformComponent};
use prev_engine::prev::log::{CapturingLogger, DefaultLogger, LogEntry, LogSeverity, Logger};
use prev_engine::prev::render::{
    CommandList, FrameStats, GpuResourceProvider, MasterRenderer, RecordingCommandList, RecordingGpu, Rect2D,
    RenderFrame,
};
use prev_engine::prev::scene::node_component_helper as helper;
use prev_engine::prev::scene::InputEvent;
use prev_engine::prev::{Engine, EngineConfig, Result};
use prev_engine::{engine_debug, engine_info, engine_warn};
use input_script::InputScript;
use scene::DemoScene;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const DELTA_TIME: f32 = 1.0 / 60.0;
/// Frames rendered after the last scripted event
const SETTLE_FRAMES: u32 = 30;

/// Prints to the console and keeps a copy for the end-of-run summary
struct DemoLogger {
    console: DefaultLogger,
    capture: CapturingLogger,
}

impl Logger for DemoLogger {
    fn log(&self, entry: &LogEntry) {
        self.console.log(entry);
        self.capture.log(entry);
    }
}

#[derive(Debug, Default)]
struct RunTotals {
    frames: u32,
    passes: u32,
    draw_calls: u32,
    nodes_culled: u32,
    commands: usize,
}

impl RunTotals {
    fn add(&mut self, stats: &FrameStats, commands: usize) {
        self.frames += 1;
        self.passes += stats.passes;
        self.draw_calls += stats.draw_calls;
        self.nodes_culled += stats.nodes_culled;
        self.commands += commands;
    }
}

fn main() {
    let capture = CapturingLogger::new();
    Engine::set_logger(DemoLogger { console: DefaultLogger, capture: capture.clone() });
    Engine::set_min_severity(LogSeverity::Debug);

    if let Err(error) = run(&capture) {
        eprintln!("prev_demo failed: {}", error);
        std::process::exit(1);
    }
}

fn run(capture: &CapturingLogger) -> Result<()> {
    let config = EngineConfig {
        shadow_map_dimensions: 1024,
        max_draws_per_frame: 64,
        ..EngineConfig::default()
    };
    Engine::initialize(config.clone())?;

    let mut gpu = RecordingGpu::new(config.uniform_alignment);
    let mut scene = DemoScene::build(&mut gpu, &config, WIDTH, HEIGHT)?;
    scene.graph.init(scene.root)?;
    engine_info!("prev_demo", "scene ready: {} nodes, {} GPU resources", scene.graph.len(), gpu.live_resources());

    let mut master = MasterRenderer::with_default_renderers(&config);
    master.init(&mut gpu)?;

    let script = InputScript::walkabout(WIDTH, HEIGHT);
    let mut extent = Rect2D::from_extent(WIDTH, HEIGHT);
    let mut totals = RunTotals::default();

    for frame_index in 0..=script.last_frame() + SETTLE_FRAMES {
        for event in script.events_at(frame_index) {
            if let InputEvent::WindowResize { width, height } = *event {
                extent = Rect2D::from_extent(width, height);
            }
            scene.graph.dispatch_event(scene.root, event)?;
        }

        scene.graph.update(scene.root, DELTA_TIME)?;
        let applied = scene.graph.commit_structural_changes()?;
        if applied > 0 {
            engine_debug!("prev_demo", "frame {}: {} structural change(s)", frame_index, applied);
        }

        let (stats, commands) = render(&mut master, &scene, &mut gpu, frame_index, extent, &config)?;
        engine_debug!("prev_demo", "frame {}: {} passes, {} draws, {} culled, {} commands",
            frame_index, stats.passes, stats.draw_calls, stats.nodes_culled, commands);
        totals.add(&stats, commands);
    }

    report(&scene, &totals)?;

    master.shutdown(&mut gpu)?;
    scene.release(&mut gpu)?;
    Engine::shutdown();

    let warnings = capture.count_at_least(LogSeverity::Warn);
    if warnings > 0 {
        engine_warn!("prev_demo", "run finished with {} warning(s) or error(s)", warnings);
    }
    Ok(())
}

fn render(
    master: &mut MasterRenderer,
    scene: &DemoScene,
    gpu: &mut RecordingGpu,
    frame_index: u32,
    extent: Rect2D,
    config: &EngineConfig,
) -> Result<(FrameStats, usize)> {
    gpu.reset_descriptor_sets();
    let mut cmd = RecordingCommandList::new();
    cmd.begin()?;
    let stats = {
        let provider: &mut dyn GpuResourceProvider = gpu;
        let mut frame = RenderFrame { gpu: provider, cmd: &mut cmd };
        master.render_frame(&scene.graph, scene.root, frame_index % config.frames_in_flight, extent, &mut frame)?
    };
    cmd.end()?;
    Ok((stats, cmd.commands.len()))
}

fn report(scene: &DemoScene, totals: &RunTotals) -> Result<()> {
    let player = helper::get_component::<dyn TransformComponent>(&scene.graph, scene.player)?;
    let position = player.borrow().position();

    let stones = scene.graph.children(scene.stones);
    let selected = stones
        .iter()
        .filter_map(|&stone| helper::find_component::<dyn SelectableComponent>(&scene.graph, stone))
        .filter(|selectable| selectable.borrow().is_selected())
        .count();

    engine_info!("prev_demo", "{} frames, {} passes, {} draws ({:.1} per frame), {} culled, {} commands",
        totals.frames, totals.passes, totals.draw_calls,
        totals.draw_calls as f32 / totals.frames.max(1) as f32, totals.nodes_culled, totals.commands);
    engine_info!("prev_demo", "player at ({:.1}, {:.1}, {:.1}); {} of {} stones selected",
        position.x, position.y, position.z, selected, stones.len());
    Ok(())
}
