// Copyright (c) 2026 rezky_nightky

mod cell;
mod config;
mod frame;
mod glyphs;
mod palette;
mod render;
mod runtime;
mod terminal;

use std::env;
use std::fs::File;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use overcast::environment::{MAX_INTENSITY, MAX_WIND_SPEED, MIN_INTENSITY};
use overcast::quality::{MAX_PARTICLE_BUDGET, MIN_PARTICLE_BUDGET};
use overcast::{
    EffectConfig, EffectOrchestrator, EnvironmentState, InteractionField, QualitySettings,
    QualityTier, RepulsionZone, WeatherMode,
};

use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_help_detail, print_list_colors,
    print_list_modes, Args, ColorBg,
};
use crate::frame::Frame;
use crate::glyphs::Glyphs;
use crate::palette::build_palette;
use crate::render::{Renderer, Status};
use crate::runtime::{ColorMode, ColorScheme};
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

const POINTER_RADIUS: f64 = 0.12;
const POINTER_STRENGTH: f64 = 1.0;
const POINTER_IDLE: Duration = Duration::from_secs(3);

const WIND_STEP: f64 = 0.25;
const INTENSITY_STEP: f64 = 0.1;
const TURBULENCE_STEP: f64 = 0.1;

/// Frames of sustained overload before adaptive quality steps down.
const PRESSURE_FRAMES: u32 = 120;
const RENDER_SCALE_STEP: f64 = 0.25;
const MIN_RENDER_SCALE: f64 = 0.25;

fn build_info() -> &'static str {
    env!("OVERCAST_BUILD")
}

fn git_sha() -> &'static str {
    env!("OVERCAST_GIT_SHA")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_usize_range(name: &str, v: usize, min: usize, max: usize) -> usize {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn or_exit<T, E: std::fmt::Display>(res: Result<T, E>) -> T {
    res.unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    })
}

/// Logs go to `--log-file` when given. Otherwise only errors reach stderr,
/// which the alternate screen would swallow anyway.
fn init_logging(args: &Args) {
    let default_filter = if args.log_file.is_some() {
        "warn"
    } else {
        "error"
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = &args.log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("failed to open --log-file {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
    builder.init();
}

fn detect_color_mode(args: &Args) -> ColorMode {
    match args.colormode {
        Some(bits) => or_exit(ColorMode::from_flag(bits)),
        None => ColorMode::detect(),
    }
}

fn resolve_tier(name: &str, settings: &QualitySettings) -> QualityTier {
    if name.trim().eq_ignore_ascii_case("auto") {
        return QualityTier::select(settings);
    }
    or_exit(QualityTier::from_name(name))
}

#[derive(Default)]
struct PerfStats {
    frames: u64,
    drawn_frames: u64,
    work_sum_s: f64,
    work_max_s: f32,
    pressure_sum: f64,
    pressure_max: f32,
    overshoot_frames: u64,
    particles_sum: u64,
    particles_max: usize,
    respawns: u64,
    impacts: u64,
    droplets_dropped: u64,
    quality_steps: u32,
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    cmd = cmd.help_template(if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    });
    cmd.build();
    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_modes {
        print_list_modes();
        return Ok(());
    }

    if args.list_colors {
        print_list_colors();
        return Ok(());
    }

    if args.help_detail {
        print_help_detail();
        return Ok(());
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let unset = |v: &str| if v.is_empty() { "(unset)".to_string() } else { v.to_string() };
        let effective = detect_color_mode(&args);

        println!("BITCOLOR CHECK:");
        println!("  COLORTERM: {}", unset(&colorterm));
        println!("  TERM: {}", unset(&term));
        println!("  auto_detected: {}", ColorMode::detect().label());
        if args.colormode.is_some() {
            println!("  forced: {}", effective.label());
        }
        println!("  effective: {}", effective.label());
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        if !git_sha().is_empty() {
            println!("Commit: {}", git_sha());
        }
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    init_logging(&args);

    let mode = or_exit(WeatherMode::from_name(&args.mode));
    let color_mode = detect_color_mode(&args);
    let scheme = or_exit(ColorScheme::from_name(&args.color));

    let target_fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let max_particles = require_usize_range(
        "--max-particles",
        args.max_particles,
        MIN_PARTICLE_BUDGET,
        MAX_PARTICLE_BUDGET,
    );
    let render_scale = require_f64_range("--render-scale", args.render_scale, 0.25, 2.0);
    let mut env_state = EnvironmentState {
        wind_speed: require_f64_range("--wind", args.wind, -MAX_WIND_SPEED, MAX_WIND_SPEED),
        wind_direction: require_f64_range("--wind-dir", args.wind_dir, -360.0, 360.0)
            .to_radians(),
        intensity: require_f64_range("--intensity", args.intensity, MIN_INTENSITY, MAX_INTENSITY),
        turbulence: require_f64_range("--turbulence", args.turbulence, 0.0, 1.0),
    };
    let duration_s = args.duration.and_then(|s| {
        if !s.is_finite() {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        (s > 0.0).then(|| require_f64_range("--duration", s, 0.1, 86400.0))
    });

    let mut settings = QualitySettings::new(target_fps, max_particles, render_scale);
    let tier = resolve_tier(&args.quality, &settings);
    let mut sim_config = EffectConfig {
        condensation: !args.no_condensation,
        stick_to_surfaces: !args.surfaces.0.is_empty(),
        ..EffectConfig::default()
    };
    if let Some(seed) = args.seed {
        sim_config = sim_config.with_seed(seed);
    }
    let surfaces = args.surfaces.0.clone();

    let mut weather = or_exit(EffectOrchestrator::new(mode, tier, settings, sim_config));
    log::info!(
        "starting {} with {} quality, {} colors",
        mode,
        tier,
        color_mode.label()
    );

    let renderer = Renderer {
        glyphs: Glyphs::select(args.ascii),
        palette: build_palette(
            scheme,
            color_mode,
            matches!(
                args.color_bg,
                ColorBg::DefaultBackground | ColorBg::Transparent
            ),
        ),
        status: !args.no_status,
    };

    let mut term = Terminal::new(!args.no_mouse)?;
    let (w, h) = term.size()?;
    let mut frame = Frame::new(w, h, renderer.palette.bg);

    let start_time = Instant::now();
    let end_time = duration_s.map(|s| start_time + Duration::from_secs_f64(s));

    let target_period = Duration::from_secs_f64(1.0 / target_fps);
    let target_period_s = target_period.as_secs_f32().max(0.000_001);
    let mut next_frame = Instant::now();
    let mut perf_pressure: f32 = 0.0;
    let mut overloaded_frames: u32 = 0;
    let mut fps_estimate = target_fps;
    let mut last_frame_at = Instant::now();

    let mut field = InteractionField::empty();
    let mut pointer: Option<((u16, u16), Instant)> = None;
    let mut perf = PerfStats::default();
    let mut running = true;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => {
                        pending_resize = Some((nw, nh));
                    }
                    Event::Mouse(m) => match m.kind {
                        MouseEventKind::Moved
                        | MouseEventKind::Drag(_)
                        | MouseEventKind::Down(_) => {
                            pointer = Some(((m.column, m.row), Instant::now()));
                        }
                        _ => {}
                    },
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if args.screensaver {
                            running = false;
                            break;
                        }

                        match (k.code, k.modifiers) {
                            (KeyCode::Esc, _) | (KeyCode::Char('q'), _) => running = false,
                            (KeyCode::Char('c'), KeyModifiers::CONTROL) => running = false,
                            (KeyCode::Char('p'), _) => weather.toggle_pause(),
                            (KeyCode::Char('m'), _) => {
                                let next = weather.mode().next();
                                weather.set_mode(next);
                            }
                            (KeyCode::Char(' '), _) => weather.restart(),
                            (KeyCode::Left, _) => {
                                env_state.wind_speed =
                                    (env_state.wind_speed - WIND_STEP).max(-MAX_WIND_SPEED);
                            }
                            (KeyCode::Right, _) => {
                                env_state.wind_speed =
                                    (env_state.wind_speed + WIND_STEP).min(MAX_WIND_SPEED);
                            }
                            (KeyCode::Up, _) => {
                                env_state.intensity =
                                    (env_state.intensity + INTENSITY_STEP).min(MAX_INTENSITY);
                            }
                            (KeyCode::Down, _) => {
                                env_state.intensity =
                                    (env_state.intensity - INTENSITY_STEP).max(MIN_INTENSITY);
                            }
                            (KeyCode::Char('+'), _) | (KeyCode::Char('='), KeyModifiers::SHIFT) => {
                                env_state.turbulence =
                                    (env_state.turbulence + TURBULENCE_STEP).min(1.0);
                            }
                            (KeyCode::Char('-'), _) => {
                                env_state.turbulence =
                                    (env_state.turbulence - TURBULENCE_STEP).max(0.0);
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= next_frame {
                break;
            }

            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            frame = Frame::new(nw, nh, renderer.palette.bg);
            pointer = None;
        }

        let work_start = Instant::now();

        field.clear();
        if let Some((cell, at)) = pointer {
            if work_start.duration_since(at) < POINTER_IDLE {
                let vp = renderer.viewport(&frame);
                field.push(RepulsionZone::new(
                    vp.to_scene(cell.0, cell.1),
                    POINTER_RADIUS,
                    POINTER_STRENGTH,
                ));
            } else {
                pointer = None;
            }
        }

        let since_last = work_start.duration_since(last_frame_at).as_secs_f64();
        last_frame_at = work_start;
        if since_last > 0.0 {
            fps_estimate = fps_estimate * 0.9 + (1.0 / since_last) * 0.1;
        }

        let _ = weather.tick(work_start, &env_state, &field, &surfaces);
        let snap = weather.snapshot();
        let status = Status {
            mode: weather.mode().name(),
            tier: weather.profile().tier.name(),
            wind: env_state.wind_speed,
            intensity: env_state.intensity,
            turbulence: env_state.turbulence,
            fps: fps_estimate,
            paused: weather.is_paused(),
        };
        renderer.render(&mut frame, snap, &surfaces, &status);

        let did_draw = frame.is_dirty_all() || !frame.dirty_indices().is_empty();
        if did_draw {
            term.draw(&mut frame)?;
        }
        let work_s = work_start.elapsed().as_secs_f32();
        let overshoot = ((work_s / target_period_s) - 1.0).clamp(0.0, 2.0);
        if overshoot > 0.0 {
            perf_pressure = (perf_pressure + (overshoot * 0.25)).min(1.0);
        } else {
            perf_pressure = (perf_pressure - 0.02).max(0.0);
        }

        // Adaptive quality gives up render scale under sustained load.
        overloaded_frames = if perf_pressure > 0.9 {
            overloaded_frames.saturating_add(1)
        } else {
            0
        };
        if weather.tier() == QualityTier::Adaptive
            && overloaded_frames >= PRESSURE_FRAMES
            && settings.render_scale > MIN_RENDER_SCALE
        {
            overloaded_frames = 0;
            let mut lowered = settings;
            lowered.render_scale = (settings.render_scale - RENDER_SCALE_STEP).max(MIN_RENDER_SCALE);
            match weather.set_quality(QualityTier::Adaptive, lowered) {
                Ok(()) => {
                    log::info!("render scale lowered to {:.2}", lowered.render_scale);
                    settings = lowered;
                    perf.quality_steps += 1;
                }
                Err(e) => log::warn!("could not lower quality: {}", e),
            }
        }

        if args.perf_stats {
            let snap = weather.snapshot();
            let report = snap.report();
            let count = snap.particle_count();
            perf.frames = perf.frames.saturating_add(1);
            if did_draw {
                perf.drawn_frames = perf.drawn_frames.saturating_add(1);
            }
            perf.work_sum_s += work_s as f64;
            perf.work_max_s = perf.work_max_s.max(work_s);
            perf.pressure_sum += perf_pressure as f64;
            perf.pressure_max = perf.pressure_max.max(perf_pressure);
            if overshoot > 0.0 {
                perf.overshoot_frames = perf.overshoot_frames.saturating_add(1);
            }
            perf.particles_sum = perf.particles_sum.saturating_add(count as u64);
            perf.particles_max = perf.particles_max.max(count);
            if !weather.is_paused() {
                perf.respawns += report.respawns() as u64;
                perf.impacts += report.impacts as u64;
                perf.droplets_dropped += report.droplets_dropped as u64;
            }
        }

        next_frame += target_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    if args.perf_stats {
        drop(term);
        let elapsed_s = start_time.elapsed().as_secs_f64().max(0.000_001);
        let frames = perf.frames.max(1) as f64;

        println!("PERF STATS:");
        println!("  elapsed_s: {:.3}", elapsed_s);
        println!("  target_fps: {:.3}", target_fps);
        println!("  avg_fps: {:.3}", perf.frames as f64 / elapsed_s);
        println!("  frames: {}", perf.frames);
        println!(
            "  drawn_frames: {} ({:.1}%)",
            perf.drawn_frames,
            perf.drawn_frames as f64 / frames * 100.0
        );
        println!("  avg_work_ms: {:.3}", perf.work_sum_s / frames * 1000.0);
        println!("  max_work_ms: {:.3}", perf.work_max_s as f64 * 1000.0);
        println!(
            "  overshoot_frames: {} ({:.1}%)",
            perf.overshoot_frames,
            perf.overshoot_frames as f64 / frames * 100.0
        );
        println!("  avg_perf_pressure: {:.3}", perf.pressure_sum / frames);
        println!("  max_perf_pressure: {:.3}", perf.pressure_max);
        println!(
            "  avg_particles: {:.1}",
            perf.particles_sum as f64 / frames
        );
        println!("  max_particles: {}", perf.particles_max);
        println!("  respawns: {}", perf.respawns);
        println!("  impacts: {}", perf.impacts);
        println!("  droplets_dropped: {}", perf.droplets_dropped);
        println!("  quality_steps: {}", perf.quality_steps);
    }

    Ok(())
}
