// Copyright (c) 2026 rezky_nightky

//! Rasterizes a [`FrameSnapshot`] into terminal cells.

use glam::DVec2;

use overcast::{DepthLayer, FrameSnapshot, ParticleKind, ParticleView, Shape, SurfaceRect};

use crate::cell::Cell;
use crate::frame::Frame;
use crate::glyphs::Glyphs;
use crate::palette::Palette;

const HIDDEN_BELOW: f64 = 0.03;
const MAX_STREAK_CELLS: usize = 3;
const MAX_BLOB_CELLS: f64 = 14.0;

const DEPTH_SURFACE: u8 = 1;
const DEPTH_HAZE: u8 = 2;
const DEPTH_WATER: u8 = 6;
const DEPTH_DROPLET: u8 = 7;
const DEPTH_STATUS: u8 = u8::MAX;

fn layer_depth(layer: DepthLayer) -> u8 {
    3 + layer.index() as u8
}

/// Maps normalized scene space onto the cell grid above the status line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16, status: bool) -> Self {
        let rows = if status && height > 2 {
            height - 1
        } else {
            height
        };
        Self { cols: width, rows }
    }

    pub fn to_cell(&self, p: DVec2) -> Option<(u16, u16)> {
        if !p.is_finite() || self.cols == 0 || self.rows == 0 {
            return None;
        }
        let x = (p.x * self.cols as f64).floor();
        let y = (p.y * self.rows as f64).floor();
        if x < 0.0 || y < 0.0 || x >= self.cols as f64 || y >= self.rows as f64 {
            return None;
        }
        Some((x as u16, y as u16))
    }

    /// Row for a scene `y`, clamped onto the grid.
    pub fn row(&self, y: f64) -> u16 {
        let r = (y * self.rows as f64).floor();
        if !r.is_finite() || r < 0.0 {
            0
        } else {
            (r as u16).min(self.rows.saturating_sub(1))
        }
    }

    /// Scene position of a cell centre.
    pub fn to_scene(&self, col: u16, row: u16) -> DVec2 {
        DVec2::new(
            (col as f64 + 0.5) / self.cols.max(1) as f64,
            (row as f64 + 0.5) / self.rows.max(1) as f64,
        )
    }
}

pub struct Status<'a> {
    pub mode: &'a str,
    pub tier: &'a str,
    pub wind: f64,
    pub intensity: f64,
    pub turbulence: f64,
    pub fps: f64,
    pub paused: bool,
}

pub struct Renderer {
    pub glyphs: Glyphs,
    pub palette: Palette,
    pub status: bool,
}

impl Renderer {
    pub fn viewport(&self, frame: &Frame) -> Viewport {
        Viewport::new(frame.width, frame.height, self.status)
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        snap: &FrameSnapshot,
        surfaces: &[SurfaceRect],
        status: &Status<'_>,
    ) {
        let vp = self.viewport(frame);
        frame.begin();

        for rect in surfaces {
            self.surface(frame, &vp, rect);
        }
        for view in snap.particles() {
            if view.opacity < HIDDEN_BELOW {
                continue;
            }
            match view.shape {
                Shape::Blob { radius, .. } => self.blob(frame, &vp, view, radius),
                Shape::Streak { length, .. } => self.streak(frame, &vp, view, length),
                _ => self.point(frame, &vp, view),
            }
        }
        self.water(frame, &vp, snap);

        if self.status {
            self.status_line(frame, snap, status);
        }
    }

    fn cell(&self, frame: &Frame, ch: char, kind: ParticleKind, opacity: f64) -> Cell {
        Cell::glyph(ch, self.palette.shade(kind, opacity), frame.background())
    }

    fn point(&self, frame: &mut Frame, vp: &Viewport, view: &ParticleView) {
        let Some((x, y)) = vp.to_cell(view.position) else {
            return;
        };
        let ch = self.glyphs.for_view(view);
        let depth = if view.kind.is_droplet() {
            DEPTH_DROPLET
        } else {
            layer_depth(view.layer)
        };
        let opacity = (view.opacity * view.shimmer).min(1.0);
        let cell = self
            .cell(frame, ch, view.kind, opacity)
            .bold(view.layer == DepthLayer::Near && view.kind.is_droplet());
        frame.plot(x, y, cell, depth);
    }

    /// Head plus a fading tail opposite the direction of travel.
    fn streak(&self, frame: &mut Frame, vp: &Viewport, view: &ParticleView, length: f64) {
        let ch = self.glyphs.for_view(view);
        let cells = ((length * view.scale * vp.rows as f64).round() as usize)
            .clamp(1, MAX_STREAK_CELLS);
        let dir = view.velocity.normalize_or(DVec2::Y);
        let step = DVec2::new(dir.x / vp.cols.max(1) as f64, dir.y / vp.rows.max(1) as f64);
        let depth = layer_depth(view.layer);
        for k in 0..cells {
            let pos = view.position - step * k as f64;
            let Some((x, y)) = vp.to_cell(pos) else {
                continue;
            };
            let fade = 1.0 - k as f64 / (cells as f64 + 1.0);
            let cell = self.cell(frame, ch, view.kind, view.opacity * fade);
            frame.plot(x, y, cell, depth);
        }
    }

    /// Soft ellipse whose density falls off toward the rim.
    fn blob(&self, frame: &mut Frame, vp: &Viewport, view: &ParticleView, radius: f64) {
        let rx = (radius * view.scale * vp.cols as f64).min(MAX_BLOB_CELLS);
        let ry = (radius * view.scale * vp.rows as f64).min(MAX_BLOB_CELLS * 0.5);
        if !(rx.is_finite() && ry.is_finite()) || rx < 0.5 || ry < 0.5 {
            self.point(frame, vp, view);
            return;
        }
        let cx = view.position.x * vp.cols as f64;
        let cy = view.position.y * vp.rows as f64;
        let x0 = (cx - rx).floor().max(0.0) as i64;
        let x1 = (cx + rx).ceil().min(vp.cols as f64) as i64;
        let y0 = (cy - ry).floor().max(0.0) as i64;
        let y1 = (cy + ry).ceil().min(vp.rows as f64) as i64;

        for row in y0..y1 {
            for col in x0..x1 {
                let dx = (col as f64 + 0.5 - cx) / rx;
                let dy = (row as f64 + 0.5 - cy) / ry;
                let d2 = dx * dx + dy * dy;
                if d2 > 1.0 {
                    continue;
                }
                let opacity = view.opacity * (1.0 - d2);
                if opacity < HIDDEN_BELOW {
                    continue;
                }
                let probe = ParticleView { opacity, ..*view };
                let ch = self.glyphs.for_view(&probe);
                let cell = self.cell(frame, ch, view.kind, opacity);
                frame.plot(col as u16, row as u16, cell, DEPTH_HAZE);
            }
        }
    }

    fn surface(&self, frame: &mut Frame, vp: &Viewport, rect: &SurfaceRect) {
        if !rect.is_usable() {
            return;
        }
        let max = rect.max();
        let top = vp.row(rect.origin.y);
        let bottom = vp.row(max.y);
        let col = |x: f64| {
            ((x * vp.cols as f64).floor().max(0.0) as u16).min(vp.cols.saturating_sub(1))
        };
        let (left, right) = (col(rect.origin.x), col(max.x));
        let bg = frame.background();
        let g = &self.glyphs;
        let color = self.palette.surface;

        for x in left..=right {
            let ch = if x == left || x == right {
                g.corner
            } else {
                g.frame_h
            };
            frame.plot(x, top, Cell::glyph(ch, color, bg), DEPTH_SURFACE);
            frame.plot(x, bottom, Cell::glyph(ch, color, bg), DEPTH_SURFACE);
        }
        for y in top.saturating_add(1)..bottom {
            frame.plot(left, y, Cell::glyph(g.frame_v, color, bg), DEPTH_SURFACE);
            frame.plot(right, y, Cell::glyph(g.frame_v, color, bg), DEPTH_SURFACE);
        }
    }

    fn water(&self, frame: &mut Frame, vp: &Viewport, snap: &FrameSnapshot) {
        let bg = frame.background();
        let color = self.palette.puddle;
        let ground = vp.row(snap.ground_y);
        let surface = vp.row(snap.water_level).min(ground);
        if snap.water_level < snap.ground_y {
            for y in surface..=ground {
                for x in 0..vp.cols {
                    frame.plot(x, y, Cell::glyph(self.glyphs.water, color, bg), DEPTH_WATER);
                }
            }
        }

        for ripple in &snap.ripples {
            let strength = ripple.strength();
            if strength <= 0.0 {
                continue;
            }
            let half = (ripple.radius * vp.cols as f64).round().max(0.0) as i64;
            let cx = (ripple.x * vp.cols as f64).floor() as i64;
            let y = vp.row(ripple.y).min(surface);
            for dx in [-half, half] {
                let x = cx + dx;
                if x < 0 || x >= vp.cols as i64 {
                    continue;
                }
                let cell = Cell::glyph(self.glyphs.ripple, color, bg).bold(strength > 0.6);
                frame.plot(x as u16, y, cell, DEPTH_WATER);
            }
        }
    }

    fn status_line(&self, frame: &mut Frame, snap: &FrameSnapshot, s: &Status<'_>) {
        let y = frame.height.saturating_sub(1);
        let mut line = format!(
            " {} | {} | {} particles | wind {:+.1} | intensity {:.1} | turbulence {:.1} | {:.0} fps",
            s.mode,
            s.tier,
            snap.particle_count(),
            s.wind,
            s.intensity,
            s.turbulence,
            s.fps
        );
        if s.paused {
            line.push_str(" | paused");
        }
        let width = frame.width as usize;
        let line: String = line.chars().take(width).collect();
        frame.put_str(0, y, &line, self.palette.status, DEPTH_STATUS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::build_palette;
    use crate::runtime::{ColorMode, ColorScheme};
    use overcast::{
        EffectConfig, EffectOrchestrator, EnvironmentState, InteractionField, QualitySettings,
        QualityTier, WeatherMode,
    };

    fn renderer() -> Renderer {
        Renderer {
            glyphs: Glyphs::ASCII,
            palette: build_palette(ColorScheme::Dusk, ColorMode::Color256, false),
            status: true,
        }
    }

    fn status() -> Status<'static> {
        Status {
            mode: "rain",
            tier: "balanced",
            wind: 0.4,
            intensity: 1.0,
            turbulence: 0.2,
            fps: 60.0,
            paused: false,
        }
    }

    #[test]
    fn viewport_reserves_the_status_row() {
        let vp = Viewport::new(80, 24, true);
        assert_eq!(vp.rows, 23);
        assert_eq!(vp.to_cell(DVec2::new(0.0, 0.0)), Some((0, 0)));
        assert_eq!(vp.to_cell(DVec2::new(0.999, 0.999)), Some((79, 22)));
        assert_eq!(vp.to_cell(DVec2::new(1.0, 0.5)), None);
        assert_eq!(vp.to_cell(DVec2::new(f64::NAN, 0.5)), None);
        assert_eq!(vp.row(1.0), 22);
    }

    #[test]
    fn surfaces_are_outlined() {
        let r = renderer();
        let mut frame = Frame::new(20, 11, None);
        let rect = SurfaceRect::new(0.25, 0.2, 0.5, 0.4);
        r.render(&mut frame, &FrameSnapshot::default(), &[rect], &status());
        assert_eq!(frame.get(5, 2).map(|c| c.ch), Some('+'));
        assert_eq!(frame.get(6, 2).map(|c| c.ch), Some('-'));
        assert_eq!(frame.get(5, 3).map(|c| c.ch), Some('|'));
    }

    #[test]
    fn status_line_names_the_mode() {
        let r = renderer();
        let mut frame = Frame::new(60, 10, None);
        r.render(&mut frame, &FrameSnapshot::default(), &[], &status());
        let line: String = (0..5)
            .filter_map(|x| frame.get(x, 9).map(|c| c.ch))
            .collect();
        assert_eq!(line, " rain");
    }

    #[test]
    fn rain_lands_on_the_grid() {
        let mut o = EffectOrchestrator::new(
            WeatherMode::Rain,
            QualityTier::EnergySaving,
            QualitySettings::new(30.0, 1000, 1.0),
            EffectConfig::default(),
        )
        .expect("valid settings");
        let snap = o
            .advance(0.016, &EnvironmentState::calm(), &InteractionField::empty(), &[])
            .clone();
        let r = renderer();
        let mut frame = Frame::new(80, 24, None);
        r.render(&mut frame, &snap, &[], &status());
        let drawn = (0..23u16)
            .flat_map(|y| (0..80u16).map(move |x| (x, y)))
            .filter(|&(x, y)| frame.get(x, y).is_some_and(|c| c.ch == '|'))
            .count();
        assert!(drawn > 0);
    }
}
