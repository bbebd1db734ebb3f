// Copyright (c) 2026 rezky_nightky

use std::env;

use overcast::{DepthLayer, DropletPhase, ParticleKind, ParticleView};

/// Slant beyond which a streak is drawn diagonally.
const SLANT: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyphs {
    streak: [char; 3],
    flake: [char; 3],
    haze: [char; 4],
    bead: [char; 3],
    pub water: char,
    pub ripple: char,
    pub frame_h: char,
    pub frame_v: char,
    pub corner: char,
}

impl Glyphs {
    pub const UNICODE: Glyphs = Glyphs {
        streak: ['│', '╲', '╱'],
        flake: ['·', '•', '❄'],
        haze: ['░', '░', '▒', '▓'],
        bead: ['∙', '●', '╿'],
        water: '▁',
        ripple: '◠',
        frame_h: '─',
        frame_v: '│',
        corner: '┼',
    };

    pub const ASCII: Glyphs = Glyphs {
        streak: ['|', '\\', '/'],
        flake: ['.', '*', '*'],
        haze: ['.', ':', '%', '#'],
        bead: ['.', 'o', '!'],
        water: '_',
        ripple: '^',
        frame_h: '-',
        frame_v: '|',
        corner: '+',
    };

    pub fn select(force_ascii: bool) -> Self {
        if force_ascii || default_to_ascii() {
            Self::ASCII
        } else {
            Self::UNICODE
        }
    }

    pub fn for_view(&self, v: &ParticleView) -> char {
        match v.kind {
            ParticleKind::Rain => self.streak_for(v.rotation),
            ParticleKind::Snow => match v.layer {
                DepthLayer::Far => self.flake[0],
                DepthLayer::Mid => self.flake[1],
                DepthLayer::Near => self.flake[2],
            },
            ParticleKind::Cloud | ParticleKind::Fog => {
                let idx = (v.opacity.clamp(0.0, 1.0) * (self.haze.len() - 1) as f64).round();
                self.haze[(idx as usize).min(self.haze.len() - 1)]
            }
            ParticleKind::GlassDrop | ParticleKind::WallDrop => match v.state {
                Some(DropletPhase::Accumulating) | None => self.bead[0],
                Some(DropletPhase::Sliding) => self.bead[1],
                Some(DropletPhase::Falling) | Some(DropletPhase::Fading) => {
                    if v.stretch > 1.4 {
                        self.bead[2]
                    } else {
                        self.bead[1]
                    }
                }
            },
        }
    }

    fn streak_for(&self, rotation: f64) -> char {
        // Rotation is measured from straight down; positive leans toward +x.
        if rotation > SLANT {
            self.streak[1]
        } else if rotation < -SLANT {
            self.streak[2]
        } else {
            self.streak[0]
        }
    }
}

pub fn default_to_ascii() -> bool {
    let lang = env::var("LANG").unwrap_or_default();
    !lang.to_ascii_uppercase().contains("UTF")
}
