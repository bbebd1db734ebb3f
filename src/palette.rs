// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use overcast::ParticleKind;

use crate::runtime::{ColorMode, ColorScheme};

type Rgb = (u8, u8, u8);

const RAMP_STEPS: usize = 8;

/// Colour ramps per particle kind, dim to bright, plus fixed scene colours.
#[derive(Clone, Debug)]
pub struct Palette {
    pub bg: Option<Color>,
    pub rain: Vec<Color>,
    pub snow: Vec<Color>,
    pub cloud: Vec<Color>,
    pub fog: Vec<Color>,
    pub drop: Vec<Color>,
    pub puddle: Color,
    pub surface: Color,
    pub status: Color,
}

impl Palette {
    pub fn ramp(&self, kind: ParticleKind) -> &[Color] {
        match kind {
            ParticleKind::Rain => &self.rain,
            ParticleKind::Snow => &self.snow,
            ParticleKind::Cloud => &self.cloud,
            ParticleKind::Fog => &self.fog,
            ParticleKind::GlassDrop | ParticleKind::WallDrop => &self.drop,
        }
    }

    /// Picks the ramp entry for an opacity in `0..=1`.
    pub fn shade(&self, kind: ParticleKind, opacity: f64) -> Color {
        let ramp = self.ramp(kind);
        if ramp.is_empty() {
            return Color::White;
        }
        let t = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let idx = (t * (ramp.len() - 1) as f64).round() as usize;
        ramp[idx.min(ramp.len() - 1)]
    }
}

struct Theme {
    sky: Rgb,
    rain: [Rgb; 2],
    snow: [Rgb; 2],
    cloud: [Rgb; 2],
    fog: [Rgb; 2],
    drop: [Rgb; 2],
    puddle: Rgb,
    surface: Rgb,
    status: Rgb,
}

fn theme(scheme: ColorScheme) -> Theme {
    match scheme {
        ColorScheme::Dusk => Theme {
            sky: (12, 14, 26),
            rain: [(40, 52, 80), (170, 196, 235)],
            snow: [(70, 76, 96), (245, 248, 255)],
            cloud: [(34, 38, 56), (120, 128, 150)],
            fog: [(30, 34, 48), (96, 104, 124)],
            drop: [(60, 90, 130), (210, 230, 255)],
            puddle: (52, 78, 120),
            surface: (88, 92, 112),
            status: (140, 150, 180),
        },
        ColorScheme::Slate => Theme {
            sky: (16, 16, 18),
            rain: [(60, 60, 66), (200, 200, 206)],
            snow: [(90, 90, 94), (250, 250, 250)],
            cloud: [(44, 44, 48), (140, 140, 146)],
            fog: [(38, 38, 42), (110, 110, 116)],
            drop: [(80, 80, 90), (230, 230, 236)],
            puddle: (84, 84, 92),
            surface: (110, 110, 116),
            status: (160, 160, 166),
        },
        ColorScheme::Neon => Theme {
            sky: (10, 4, 20),
            rain: [(40, 20, 90), (0, 240, 255)],
            snow: [(80, 40, 110), (255, 180, 255)],
            cloud: [(40, 10, 60), (150, 40, 170)],
            fog: [(30, 10, 50), (110, 50, 150)],
            drop: [(80, 0, 120), (255, 60, 220)],
            puddle: (0, 140, 180),
            surface: (255, 0, 150),
            status: (0, 220, 255),
        },
        ColorScheme::Arctic => Theme {
            sky: (6, 16, 28),
            rain: [(40, 80, 110), (190, 240, 255)],
            snow: [(110, 140, 160), (255, 255, 255)],
            cloud: [(50, 70, 90), (170, 200, 220)],
            fog: [(40, 60, 80), (140, 170, 190)],
            drop: [(80, 140, 180), (220, 250, 255)],
            puddle: (90, 160, 200),
            surface: (120, 160, 190),
            status: (170, 220, 240),
        },
        ColorScheme::Amber => Theme {
            sky: (18, 10, 4),
            rain: [(80, 44, 10), (255, 196, 100)],
            snow: [(110, 80, 50), (255, 236, 200)],
            cloud: [(50, 30, 16), (150, 100, 60)],
            fog: [(44, 28, 14), (130, 90, 50)],
            drop: [(120, 70, 20), (255, 220, 150)],
            puddle: (170, 110, 40),
            surface: (130, 90, 50),
            status: (255, 180, 80),
        },
        ColorScheme::Forest => Theme {
            sky: (6, 16, 8),
            rain: [(30, 70, 40), (160, 230, 170)],
            snow: [(80, 110, 86), (236, 255, 236)],
            cloud: [(24, 48, 30), (90, 140, 100)],
            fog: [(20, 40, 26), (80, 120, 90)],
            drop: [(50, 110, 60), (200, 255, 200)],
            puddle: (40, 100, 70),
            surface: (70, 100, 60),
            status: (130, 200, 140),
        },
        ColorScheme::Mono => Theme {
            sky: (0, 0, 0),
            rain: [(255, 255, 255), (255, 255, 255)],
            snow: [(255, 255, 255), (255, 255, 255)],
            cloud: [(255, 255, 255), (255, 255, 255)],
            fog: [(255, 255, 255), (255, 255, 255)],
            drop: [(255, 255, 255), (255, 255, 255)],
            puddle: (255, 255, 255),
            surface: (255, 255, 255),
            status: (255, 255, 255),
        },
    }
}

fn dist2(a: Rgb, b: Rgb) -> i32 {
    let dr = (a.0 as i32) - (b.0 as i32);
    let dg = (a.1 as i32) - (b.1 as i32);
    let db = (a.2 as i32) - (b.2 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256((r, g, b): Rgb) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let level = |c: u8| ((c as u16 * 5) + 127) / 255;
    let (r6, g6, b6) = (level(r), level(g), level(b));
    let cube = (
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let (gray_idx, gray) = if avg < 8 {
        (16, (0, 0, 0))
    } else if avg > 238 {
        (231, (255, 255, 255))
    } else {
        let step = (avg - 8) / 10;
        let v = 8 + 10 * step;
        (232 + step, (v, v, v))
    };

    if dist2((r, g, b), gray) < dist2((r, g, b), cube) {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(rgb: Rgb) -> Color {
    const TABLE: [(Color, Rgb); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    TABLE
        .iter()
        .min_by_key(|(_, c)| dist2(rgb, *c))
        .map(|(c, _)| *c)
        .unwrap_or(Color::White)
}

fn convert(mode: ColorMode, rgb: Rgb) -> Color {
    match mode {
        ColorMode::Mono => Color::White,
        ColorMode::TrueColor => Color::Rgb {
            r: rgb.0,
            g: rgb.1,
            b: rgb.2,
        },
        ColorMode::Color256 => Color::AnsiValue(rgb_to_ansi256(rgb)),
        ColorMode::Color16 => rgb_to_color16(rgb),
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

fn gradient(stops: [Rgb; 2], steps: usize) -> Vec<Rgb> {
    if steps <= 1 {
        return vec![stops[1]; steps];
    }
    (0..steps)
        .map(|i| {
            let t = i as f32 / (steps - 1) as f32;
            (
                lerp_u8(stops[0].0, stops[1].0, t),
                lerp_u8(stops[0].1, stops[1].1, t),
                lerp_u8(stops[0].2, stops[1].2, t),
            )
        })
        .collect()
}

fn ramp(mode: ColorMode, stops: [Rgb; 2]) -> Vec<Color> {
    let mut out: Vec<Color> = gradient(stops, RAMP_STEPS)
        .into_iter()
        .map(|rgb| convert(mode, rgb))
        .collect();
    // Coarse modes collapse neighbouring steps onto the same index.
    out.dedup();
    out
}

pub fn build_palette(scheme: ColorScheme, mode: ColorMode, default_background: bool) -> Palette {
    let t = theme(scheme);
    let bg = if default_background || matches!(mode, ColorMode::Mono) {
        None
    } else {
        Some(match mode {
            ColorMode::Color16 => Color::Black,
            _ => convert(mode, t.sky),
        })
    };

    Palette {
        bg,
        rain: ramp(mode, t.rain),
        snow: ramp(mode, t.snow),
        cloud: ramp(mode, t.cloud),
        fog: ramp(mode, t.fog),
        drop: ramp(mode, t.drop),
        puddle: convert(mode, t.puddle),
        surface: convert(mode, t.surface),
        status: convert(mode, t.status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi256_maps_extremes_to_cube_corners() {
        assert_eq!(rgb_to_ansi256((0, 0, 0)), 16);
        assert_eq!(rgb_to_ansi256((255, 255, 255)), 231);
        assert_eq!(rgb_to_ansi256((255, 0, 0)), 196);
    }

    #[test]
    fn color16_picks_nearest() {
        assert_eq!(rgb_to_color16((250, 10, 10)), Color::Red);
        assert_eq!(rgb_to_color16((120, 120, 120)), Color::DarkGrey);
    }

    #[test]
    fn shade_runs_dim_to_bright() {
        let p = build_palette(ColorScheme::Dusk, ColorMode::TrueColor, false);
        assert_eq!(p.rain.len(), RAMP_STEPS);
        assert_eq!(p.shade(ParticleKind::Rain, 0.0), p.rain[0]);
        assert_eq!(p.shade(ParticleKind::Rain, 1.0), p.rain[RAMP_STEPS - 1]);
        assert_eq!(p.shade(ParticleKind::Rain, f64::NAN), p.rain[0]);
    }

    #[test]
    fn mono_has_no_background() {
        let p = build_palette(ColorScheme::Neon, ColorMode::Mono, false);
        assert_eq!(p.bg, None);
        assert_eq!(p.shade(ParticleKind::Snow, 0.5), Color::White);
    }
}
