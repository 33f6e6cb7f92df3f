//! Red/cyan anaglyph depth-judgement experiment.
//!
//! One window, one software rasterizer.  Each trial renders the scene
//! twice from the cyclopean camera: the left-eye pass writes the red
//! channel, the right-eye pass green+blue, with a depth clear in
//! between so neither pass occludes the other.  Stereo depth comes
//! entirely from the horizontal vertex shifts baked in per eye.
//!
//! ```bash
//! cargo run --release --bin anaglyph -- --participant p01 --seed 7
//! ```

use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use clap::Parser;
use glam::Vec3;
use log::{info, warn};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use rand::SeedableRng;
use rand::rngs::StdRng;

use stereolab::config::{
    DisparityGranularity, ExperimentConfig, FloorVariant, GeometryVariant, ResponseKeySet,
};
use stereolab::renderer::{ChannelMask, Rasterizer, SoftwareRaster};
use stereolab::scene::SceneContext;
use stereolab::stereo::{DisparityModel, Eye, Viewpoint, submit_trial_pass};
use stereolab::trial::{
    Judgement, ResultsWriter, TrialCondition, TrialController, TrialOutcome, ground_truth,
    load_or_synthesize,
};

#[derive(Parser, Debug)]
#[command(name = "anaglyph", about = "Red/cyan anaglyph depth-judgement experiment")]
struct Args {
    /// Participant identifier, used in the default results file name.
    #[arg(short, long, default_value = "anon")]
    participant: String,

    /// Conditions CSV; synthesized, shuffled and written here when
    /// missing or malformed.
    #[arg(long, default_value = "experiment_conditions.csv")]
    conditions: PathBuf,

    /// Results CSV path (default: anaglyph_results_<participant>_<timestamp>.csv).
    #[arg(long)]
    results: Option<PathBuf>,

    /// Column geometry flavour.
    #[arg(long, value_enum, default_value_t = GeometryVariant::Uniform)]
    geometry: GeometryVariant,

    /// Ground-plane flavour.
    #[arg(long, value_enum, default_value_t = FloorVariant::Checkerboard)]
    floor: FloorVariant,

    /// Apply the disparity formula per vertex or once per object.
    #[arg(long, value_enum, default_value_t = DisparityGranularity::PerVertex)]
    disparity_model: DisparityGranularity,

    /// Which keys answer the judgement.
    #[arg(long, value_enum, default_value_t = ResponseKeySet::PlaneJudgement)]
    response_keys: ResponseKeySet,

    /// Column distances along the viewing vector, world units.
    #[arg(long, value_delimiter = ',', default_values_t = [3.0, 25.0])]
    distances: Vec<f32>,

    /// Base disparity magnitudes, degrees.
    #[arg(long, value_delimiter = ',', default_values_t = [0.3])]
    disparities: Vec<f32>,

    /// Repetitions of each condition cell.
    #[arg(long, default_value_t = 2)]
    repetitions: usize,

    /// Stimulus presentation time, seconds.
    #[arg(long, default_value_t = 3.0)]
    presentation_time: f32,

    /// Include on-plane catch trials in synthesized conditions.
    #[arg(long)]
    onplane_trials: bool,

    #[arg(long, default_value_t = 1024)]
    width: usize,

    #[arg(long, default_value_t = 768)]
    height: usize,

    /// Seed for brick jitter and trial shuffling.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Free-viewing preview of every column at zero disparity; no
    /// trials are run.  Esc quits.
    #[arg(long)]
    demo: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = ExperimentConfig {
        distances: args.distances.clone(),
        disparities: args.disparities.clone(),
        repetitions: args.repetitions,
        presentation_time: args.presentation_time,
        geometry: args.geometry,
        floor: args.floor,
        disparity_model: args.disparity_model.into(),
        response_keys: args.response_keys,
        seed: args.seed,
        ..ExperimentConfig::default()
    };
    if args.onplane_trials && !cfg.response_keys.supports_onplane() {
        anyhow::bail!(
            "on-plane trials need a key set with an on-plane response; \
             use --response-keys plane-judgement"
        );
    }

    let viewpoint = Viewpoint::new(cfg.camera_pos, cfg.look_at, cfg.eye_separation)?;
    info!(
        "viewpoint: eyes {} apart, converging at {:.2}",
        cfg.eye_separation,
        viewpoint.convergence_distance()
    );

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let scene = SceneContext::new(
        viewpoint,
        cfg.geometry.column_params(),
        cfg.reference_distance,
        &cfg.distances,
        cfg.floor_brightness,
        cfg.floor_extent,
        cfg.floor.floor_style(),
        &mut rng,
    )?;

    let mut window = Window::new(
        "Anaglyph depth judgement",
        args.width,
        args.height,
        WindowOptions::default(),
    )?;
    window.set_target_fps(60);

    let mut raster = SoftwareRaster::default();
    raster.set_projection(
        cfg.fov_degrees,
        args.width as f32 / args.height as f32,
        0.1,
        100.0,
    );

    if args.demo {
        return run_demo(&mut raster, &mut window, &scene, &args);
    }

    let onplane_levels: &[bool] = if args.onplane_trials {
        &[false, true]
    } else {
        &[false]
    };
    let trials = load_or_synthesize(
        &args.conditions,
        &cfg.disparities,
        &cfg.distances,
        onplane_levels,
        cfg.repetitions,
        cfg.presentation_time,
        &mut rng,
    );

    let results_path = args.results.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "anaglyph_results_{}_{}.csv",
            args.participant,
            Local::now().format("%Y%m%d_%H%M%S")
        ))
    });
    let writer = ResultsWriter::create(&results_path)?;
    let mut ctrl = TrialController::new(trials, writer);

    let mut aborted = false;
    'run: while let Some(cond) = ctrl.next_trial() {
        let anchor = match scene.column_anchor(cond.distance_along_vector) {
            Ok(a) => a,
            Err(err) => {
                warn!("{err}");
                ctrl.record(&cond, Judgement::OnPlane, TrialOutcome::Skipped)?;
                continue;
            }
        };
        let truth = ground_truth(&cond, anchor.y);
        info!(
            "trial {}/{}: distance {}, disparity {}°, onplane {}",
            ctrl.presented(),
            ctrl.total(),
            cond.distance_along_vector,
            cond.disparity_degrees,
            cond.onplane
        );

        let onset = Instant::now();
        let mut response = None;

        // stimulus phase; an early response key ends it
        while onset.elapsed().as_secs_f32() < cond.presentation_time {
            if escape_requested(&window) {
                aborted = true;
                break 'run;
            }
            draw_stimulus(&mut raster, &mut window, &scene, &cond, cfg.disparity_model)?;
            if let Some(j) = poll_judgement(&window, cfg.response_keys) {
                response = Some((j, onset.elapsed().as_secs_f32()));
                break;
            }
        }

        // blank response screen until a key arrives
        while response.is_none() {
            if escape_requested(&window) {
                aborted = true;
                break 'run;
            }
            draw_blank(&mut raster, &mut window)?;
            if let Some(j) = poll_judgement(&window, cfg.response_keys) {
                response = Some((j, onset.elapsed().as_secs_f32()));
            }
        }

        if let Some((judgement, reaction_time)) = response {
            ctrl.record(
                &cond,
                truth,
                TrialOutcome::Responded(judgement, reaction_time),
            )?;
        }
    }

    ctrl.finish(aborted);
    Ok(())
}

/// Both eye passes into one frame, left masked to red and right to
/// cyan, then present.
fn draw_stimulus(
    raster: &mut SoftwareRaster,
    window: &mut Window,
    scene: &SceneContext,
    cond: &TrialCondition,
    model: DisparityModel,
) -> anyhow::Result<()> {
    let (w, h) = window.get_size();
    raster.begin_frame(w, h);
    let vp = scene.viewpoint();
    raster.set_view(vp.camera_pos(), vp.look_at(), Vec3::Y);

    for (eye, mask) in [
        (Eye::Left, ChannelMask::LEFT_ANAGLYPH),
        (Eye::Right, ChannelMask::RIGHT_ANAGLYPH),
    ] {
        raster.clear_color_channels(mask);
        raster.clear_depth();
        submit_trial_pass(
            raster,
            scene,
            cond.distance_along_vector,
            cond.disparity_degrees,
            cond.onplane,
            model,
            eye,
            w as f32,
        );
    }
    present(raster, window)
}

fn draw_blank(raster: &mut SoftwareRaster, window: &mut Window) -> anyhow::Result<()> {
    let (w, h) = window.get_size();
    raster.begin_frame(w, h);
    present(raster, window)
}

fn present(raster: &mut SoftwareRaster, window: &mut Window) -> anyhow::Result<()> {
    let mut res = Ok(());
    raster.present_frame(|buf, w, h| res = window.update_with_buffer(buf, w, h));
    res?;
    Ok(())
}

fn escape_requested(window: &Window) -> bool {
    !window.is_open() || window.is_key_down(Key::Escape)
}

/// Edge-triggered response poll; `None` while no response key is down.
fn poll_judgement(window: &Window, keys: ResponseKeySet) -> Option<Judgement> {
    match keys {
        ResponseKeySet::PlaneJudgement => {
            if window.is_key_pressed(Key::W, KeyRepeat::No) {
                Some(Judgement::Above)
            } else if window.is_key_pressed(Key::S, KeyRepeat::No) {
                Some(Judgement::Below)
            } else if window.is_key_pressed(Key::Space, KeyRepeat::No) {
                Some(Judgement::OnPlane)
            } else {
                None
            }
        }
        ResponseKeySet::Arrows => {
            if window.is_key_pressed(Key::Up, KeyRepeat::No) {
                Some(Judgement::Above)
            } else if window.is_key_pressed(Key::Down, KeyRepeat::No) {
                Some(Judgement::Below)
            } else {
                None
            }
        }
    }
}

/// Every cached column at once, no disparity shifts, full color mask.
fn run_demo(
    raster: &mut SoftwareRaster,
    window: &mut Window,
    scene: &SceneContext,
    args: &Args,
) -> anyhow::Result<()> {
    info!("demo mode: {} columns, Esc quits", args.distances.len());
    let vp = scene.viewpoint();
    while !escape_requested(window) {
        let (w, h) = window.get_size();
        raster.begin_frame(w, h);
        raster.set_view(vp.camera_pos(), vp.look_at(), Vec3::Y);

        let floor = scene.floor();
        raster.submit_triangles(&floor.positions, &floor.normals, &floor.brightness);
        for distance in scene.distances() {
            if let Ok((mesh, anchor)) = scene.column(distance) {
                let positions: Vec<Vec3> =
                    mesh.positions.iter().map(|&p| p + anchor).collect();
                raster.submit_triangles(&positions, &mesh.normals, &mesh.brightness);
            }
        }
        present(raster, window)?;
    }
    Ok(())
}
