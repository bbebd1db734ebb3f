// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use overcast::SurfaceRect;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  overcast --mode rain --quality auto --fps 60 --max-particles 2000 --render-scale 1 --wind 0.4 --wind-dir 0 --intensity 1 --turbulence 0.2 --color dusk --color-bg black";

pub const DEFAULT_SURFACES: &str = "0.08,0.34,0.34,0.2;0.56,0.52,0.34,0.18";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();
        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else if let Some(rest) = line.strip_prefix("      Example:") {
            out.push_str("      \x1b[32mExample:\x1b[0m");
            out.push_str(rest);
        } else if let Some(rest) = line.strip_prefix("  overcast") {
            out.push_str("  \x1b[1;34movercast\x1b[0m");
            out.push_str(rest);
        } else if line.starts_with("  -") {
            out.push_str("  \x1b[33m");
            out.push_str(&line[2..]);
            out.push_str("\x1b[0m");
        } else {
            out.push_str(line);
        }
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBg {
    #[value(name = "black")]
    Black,
    #[value(name = "default-background")]
    DefaultBackground,
    #[value(name = "transparent")]
    Transparent,
}

/// `x,y,w,h;x,y,w,h;...` in scene units, or `none`.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceList(pub Vec<SurfaceRect>);

impl FromStr for SurfaceList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Self(Vec::new()));
        }
        let mut out = Vec::new();
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let nums: Vec<f64> = part
                .split(',')
                .map(|v| {
                    v.trim()
                        .parse::<f64>()
                        .map_err(|_| format!("invalid number in surface '{}'", part))
                })
                .collect::<Result<_, _>>()?;
            let [x, y, w, h] = nums[..] else {
                return Err(format!("expected x,y,w,h but got '{}'", part));
            };
            let rect = SurfaceRect::new(x, y, w, h);
            if !rect.is_usable() {
                return Err(format!("surface '{}' needs positive width and height", part));
            }
            out.push(rect);
        }
        Ok(Self(out))
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "overcast", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'm',
        long = "mode",
        default_value = "rain",
        help_heading = "WEATHER",
        help = "Weather mode (see --list-modes)"
    )]
    pub mode: String,

    #[arg(
        short = 'w',
        long = "wind",
        default_value_t = 0.4,
        allow_negative_numbers = true,
        help_heading = "WEATHER",
        help = "Wind speed (min -10 max 10)"
    )]
    pub wind: f64,

    #[arg(
        long = "wind-dir",
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help_heading = "WEATHER",
        help = "Wind direction in degrees; 0 blows to the right (min -360 max 360)"
    )]
    pub wind_dir: f64,

    #[arg(
        short = 'I',
        long = "intensity",
        default_value_t = 1.0,
        help_heading = "WEATHER",
        help = "Precipitation intensity multiplier (min 0.1 max 4)"
    )]
    pub intensity: f64,

    #[arg(
        short = 't',
        long = "turbulence",
        default_value_t = 0.2,
        help_heading = "WEATHER",
        help = "Ambient turbulence (min 0 max 1)"
    )]
    pub turbulence: f64,

    #[arg(
        long = "surfaces",
        default_value = DEFAULT_SURFACES,
        help_heading = "WEATHER",
        help = "Surfaces rain sticks to: x,y,w,h;... in 0..1 scene units, or 'none'"
    )]
    pub surfaces: SurfaceList,

    #[arg(
        long = "no-condensation",
        help_heading = "WEATHER",
        help = "Disable beads forming on the glass"
    )]
    pub no_condensation: bool,

    #[arg(
        long = "seed",
        help_heading = "WEATHER",
        help = "RNG seed for reproducible runs"
    )]
    pub seed: Option<u64>,

    #[arg(
        short = 'c',
        long = "color",
        default_value = "dusk",
        help_heading = "APPEARANCE",
        help = "Color theme (see --list-colors)"
    )]
    pub color: String,

    #[arg(
        long = "color-bg",
        default_value_t = ColorBg::Black,
        value_enum,
        help_heading = "APPEARANCE",
        help = "Background mode (black, default-background, transparent)"
    )]
    pub color_bg: ColorBg,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "ascii",
        help_heading = "APPEARANCE",
        help = "Use ASCII glyphs only (default when LANG is not UTF-8)"
    )]
    pub ascii: bool,

    #[arg(
        long = "no-status",
        help_heading = "APPEARANCE",
        help = "Hide the status line"
    )]
    pub no_status: bool,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        short = 'n',
        long = "max-particles",
        default_value_t = 2000,
        help_heading = "PERFORMANCE",
        help = "Particle budget per effect (min 100 max 20000)"
    )]
    pub max_particles: usize,

    #[arg(
        long = "render-scale",
        default_value_t = 1.0,
        help_heading = "PERFORMANCE",
        help = "Render scale used by adaptive quality (min 0.25 max 2)"
    )]
    pub render_scale: f64,

    #[arg(
        short = 'q',
        long = "quality",
        default_value = "auto",
        help_heading = "PERFORMANCE",
        help = "Quality tier: auto, extreme, balanced, energy-saving, adaptive"
    )]
    pub quality: String,

    #[arg(
        long = "perf-stats",
        help_heading = "PERFORMANCE",
        help = "Print performance statistics summary on exit"
    )]
    pub perf_stats: bool,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "no-mouse",
        help_heading = "GENERAL",
        help = "Do not capture the mouse; the cursor will not push particles"
    )]
    pub no_mouse: bool,

    #[arg(
        long = "log-file",
        help_heading = "GENERAL",
        help = "Write log output (RUST_LOG, default warn) to this file instead of stderr"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(
        long = "list-modes",
        help_heading = "HELP",
        help = "List available weather modes and exit"
    )]
    pub list_modes: bool,

    #[arg(
        long = "list-colors",
        help_heading = "HELP",
        help = "List available color themes and exit"
    )]
    pub list_colors: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

fn print_heading(title: &str, note: &str) {
    if color_enabled_stdout() {
        println!("\x1b[1;36m{}\x1b[0m", title);
        println!("\x1b[2m{}\x1b[0m", note);
    } else {
        println!("{}", title);
        println!("{}", note);
    }
    println!();
}

pub fn print_list_modes() {
    print_heading(
        "AVAILABLE WEATHER MODES:",
        "NOTE: Use only the VALUE (left side) with --mode; 'm' cycles them at runtime.",
    );
    println!("VALUE        DESCRIPTION");
    println!("clear        Nothing falling; surfaces and puddle only (alias: none)");
    println!("cloudy       Drifting cloud blobs and low fog banks (alias: clouds)");
    println!("rain         Layered rain, wall drops and glass condensation");
    println!("storm        Clouds plus heavy rain (intensity x1.6, wind x1.2)");
    println!("snow         Layered swaying snowfall");
    println!("blizzard     Clouds plus wind-driven snow (wind x1.5)");
    println!("fog          Fog banks under slow clouds (alias: mist)");
}

pub fn print_list_colors() {
    print_heading(
        "AVAILABLE COLOR THEMES:",
        "NOTE: Use only the VALUE (left side) with --color.",
    );
    println!("VALUE        DESCRIPTION");
    println!("dusk         Blue-grey rain over a dark evening sky");
    println!("slate        Neutral greys (alias: gray, grey)");
    println!("neon         Cyan and magenta city rain (alias: synthwave)");
    println!("arctic       Pale ice blues (alias: ice)");
    println!("amber        Warm streetlight rain (alias: sodium)");
    println!("forest       Green canopy drizzle (alias: jungle)");
    println!("mono         Single color");
}

pub fn print_help_detail() {
    let block = format!(
        "{}\n\nUSAGE:\n  overcast [OPTIONS]\n\nWEATHER:\n  -m, --mode <name>\n      Weather mode (see --list-modes).\n      Example: overcast --mode storm\n\n  -w, --wind <speed>\n      Wind speed, negative blows the other way (min -10 max 10).\n      Example: overcast --wind 1.5\n\n  --wind-dir <degrees>\n      Wind direction; 0 blows right, 90 blows down (min -360 max 360).\n      Example: overcast --wind-dir 20\n\n  -I, --intensity <number>\n      Precipitation intensity, scales terminal velocity (min 0.1 max 4).\n      Example: overcast --intensity 2\n\n  -t, --turbulence <number>\n      Ambient turbulence (min 0 max 1).\n      Example: overcast --turbulence 0.6\n\n  --surfaces <x,y,w,h;...|none>\n      Cards that rain sticks to and slides down.\n      Example: overcast --surfaces \"0.1,0.3,0.4,0.2\"\n\n  --no-condensation\n      Disable beads forming on the glass.\n\n  --seed <number>\n      RNG seed for reproducible runs.\n      Example: overcast --seed 42\n\nAPPEARANCE:\n  -c, --color <name>\n      Set theme (see --list-colors).\n      Example: overcast --color neon\n\n  --colormode <0|16|8|24>\n      Force color mode; otherwise auto-detected from COLORTERM/TERM.\n      Example: overcast --colormode 24\n\n  --color-bg <black|default-background|transparent>\n      Background mode.\n      Example: overcast --color-bg transparent\n\n  --ascii\n      ASCII glyphs only.\n\n  --no-status\n      Hide the status line.\n\nPERFORMANCE:\n  -f, --fps <number>\n      Target FPS (min 1 max 240).\n      Example: overcast --fps 30\n\n  -n, --max-particles <number>\n      Particle budget per effect (min 100 max 20000).\n      Example: overcast -n 4000\n\n  --render-scale <number>\n      Render scale fed to adaptive quality (min 0.25 max 2).\n\n  -q, --quality <auto|extreme|balanced|energy-saving|adaptive>\n      Quality tier; auto picks the best tier fps and budget allow.\n      Example: overcast --quality energy-saving\n\n  --perf-stats\n      Print performance statistics summary on exit.\n      Example: overcast --duration 10 --perf-stats\n\nGENERAL:\n  --duration <seconds>\n      Stop after N seconds (min 0.1 max 86400).\n      Example: overcast --duration 10\n\n  -s, --screensaver\n      Exit on any keypress.\n\n  --no-mouse\n      Leave the mouse alone.\n\n  --log-file <path>\n      Write logs to a file; filter with RUST_LOG.\n      Example: RUST_LOG=debug overcast --log-file overcast.log\n\nKEYS:\n  q, Esc     quit\n  p          pause / resume\n  m          next weather mode\n  Left/Right wind -/+\n  Up/Down    intensity +/-\n  +/-        turbulence +/-\n  space      restart the current mode\n",
        DEFAULT_PARAMS_USAGE
    );

    if color_enabled_stdout() {
        print!("{}", colorize_help(&block));
    } else {
        print!("{}", block);
    }
    println!();
    print_list_modes();
    println!();
    print_list_colors();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_list_parses_rects() {
        let list: SurfaceList = "0.1,0.2,0.3,0.4; 0.5,0.5,0.1,0.1".parse().expect("valid");
        assert_eq!(list.0.len(), 2);
        assert_eq!(list.0[0], SurfaceRect::new(0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn surface_list_none_is_empty() {
        let list: SurfaceList = "none".parse().expect("valid");
        assert!(list.0.is_empty());
    }

    #[test]
    fn surface_list_rejects_bad_rects() {
        assert!("0.1,0.2,0.3".parse::<SurfaceList>().is_err());
        assert!("0.1,0.2,0,0.4".parse::<SurfaceList>().is_err());
        assert!("a,b,c,d".parse::<SurfaceList>().is_err());
    }

    #[test]
    fn default_surfaces_parse() {
        let list: SurfaceList = DEFAULT_SURFACES.parse().expect("valid");
        assert_eq!(list.0.len(), 2);
    }
}
