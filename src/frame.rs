// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::cell::Cell;

/// Cell grid rebuilt every frame.
///
/// Each frame starts with [`Frame::begin`]; cells plotted in the previous
/// frame but not in this one fall back to blank and are reported dirty, so
/// the terminal only rewrites what moved.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    depth: Vec<u8>,
    gen: u32,
    cell_gen: Vec<u32>,
    blank: Cell,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
    touched: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let len = width as usize * height as usize;
        let blank = Cell::blank_with_bg(bg);
        Self {
            width,
            height,
            cells: vec![blank; len],
            depth: vec![0; len],
            gen: 1,
            cell_gen: vec![0; len],
            blank,
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
            touched: Vec::new(),
        }
    }

    pub fn background(&self) -> Option<Color> {
        self.blank.bg
    }

    /// Starts a new frame: everything plotted so far reads as blank.
    pub fn begin(&mut self) {
        self.gen = self.gen.wrapping_add(1);
        if self.gen == 0 {
            self.cell_gen.fill(0);
            self.gen = 1;
        }
        let touched = std::mem::take(&mut self.touched);
        for &i in &touched {
            self.mark_dirty(i);
        }
        self.touched = touched;
        self.touched.clear();
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }
        for &i in &self.dirty {
            if let Some(v) = self.dirty_map.get_mut(i) {
                *v = false;
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn is_live(&self, i: usize) -> bool {
        self.cell_gen.get(i).copied() == Some(self.gen)
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        if self.is_live(i) {
            self.cells[i]
        } else {
            self.blank
        }
    }

    #[cfg(test)]
    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.index(x, y).map(|i| self.cell_at_index(i))
    }

    /// Plots `cell` unless something deeper in front already owns the spot.
    /// Higher `depth` draws on top; ties go to the later plot.
    pub fn plot(&mut self, x: u16, y: u16, cell: Cell, depth: u8) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.is_live(i) {
            if self.depth[i] > depth {
                return;
            }
        } else {
            self.cell_gen[i] = self.gen;
            self.touched.push(i);
        }
        self.depth[i] = depth;
        self.cells[i] = cell;
        self.mark_dirty(i);
    }

    pub fn put_str(&mut self, x: u16, y: u16, text: &str, fg: Color, depth: u8) {
        let bg = self.blank.bg;
        for (dx, ch) in text.chars().enumerate() {
            let Ok(dx) = u16::try_from(dx) else {
                break;
            };
            self.plot(x.saturating_add(dx), y, Cell::glyph(ch, fg, bg), depth);
        }
    }

    fn mark_dirty(&mut self, i: usize) {
        if !self.dirty_all && self.dirty_map.get(i).copied() == Some(false) {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }
}
