// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;

/// Redraw everything once this share of the screen changed.
const FULL_REDRAW_DIVISOR: usize = 3;

#[derive(Default)]
struct Pen {
    fg: Option<Color>,
    bg: Option<Color>,
    bold: bool,
    pos: Option<(u16, u16)>,
}

impl Pen {
    fn style(&mut self, out: &mut Stdout, cell: &Cell) -> Result<()> {
        if cell.fg != self.fg {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            self.fg = cell.fg;
        }
        if cell.bg != self.bg {
            out.queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            self.bg = cell.bg;
        }
        if cell.bold != self.bold {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            self.bold = cell.bold;
        }
        Ok(())
    }
}

pub struct Terminal {
    stdout: Stdout,
    mouse: bool,
    shown: Vec<Cell>,
    shown_size: Option<(u16, u16)>,
    run: String,
    rows: Vec<Vec<usize>>,
}

impl Terminal {
    pub fn new(mouse: bool) -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            if mouse {
                out.execute(event::EnableMouseCapture)?;
            }
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()
        })();
        if let Err(e) = init {
            restore(&mut out, mouse);
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            mouse,
            shown: Vec::new(),
            shown_size: None,
            run: String::with_capacity(64),
            rows: Vec::new(),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let size = (frame.width, frame.height);
        let resized = self.shown_size != Some(size);
        if resized {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.shown = vec![Cell::blank_with_bg(None); size.0 as usize * size.1 as usize];
            self.shown_size = Some(size);
        }

        let total = self.shown.len();
        let large = total > 0 && frame.dirty_indices().len() >= total / FULL_REDRAW_DIVISOR;
        if resized || frame.is_dirty_all() || large {
            self.draw_full(frame)?;
        } else {
            self.draw_runs(frame)?;
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }

    fn draw_full(&mut self, frame: &Frame) -> Result<()> {
        let mut pen = Pen::default();
        for y in 0..frame.height {
            self.stdout.queue(cursor::MoveTo(0, y))?;
            for x in 0..frame.width {
                let idx = y as usize * frame.width as usize + x as usize;
                let cell = frame.cell_at_index(idx);
                pen.style(&mut self.stdout, &cell)?;
                self.stdout.queue(Print(cell.ch))?;
                self.shown[idx] = cell;
            }
        }
        Ok(())
    }

    /// Writes dirty cells as horizontal runs of identical style.
    fn draw_runs(&mut self, frame: &Frame) -> Result<()> {
        let width = frame.width as usize;
        if self.rows.len() != frame.height as usize {
            self.rows = vec![Vec::new(); frame.height as usize];
        }
        for &idx in frame.dirty_indices() {
            if let Some(row) = self.rows.get_mut(idx / width) {
                row.push(idx);
            }
        }

        let mut pen = Pen::default();
        for y in 0..frame.height {
            let mut row = std::mem::take(&mut self.rows[y as usize]);
            row.sort_unstable();
            row.dedup();

            let mut i = 0usize;
            while i < row.len() {
                let start = row[i];
                let head = frame.cell_at_index(start);
                if self.shown[start] == head {
                    i += 1;
                    continue;
                }

                self.run.clear();
                self.run.push(head.ch);
                self.shown[start] = head;
                let mut end = start;
                let mut j = i + 1;
                while j < row.len() && row[j] == end + 1 {
                    let cell = frame.cell_at_index(row[j]);
                    let same_style =
                        cell.fg == head.fg && cell.bg == head.bg && cell.bold == head.bold;
                    if self.shown[row[j]] == cell || !same_style {
                        break;
                    }
                    self.run.push(cell.ch);
                    self.shown[row[j]] = cell;
                    end = row[j];
                    j += 1;
                }

                let x = (start % width) as u16;
                if pen.pos != Some((x, y)) {
                    self.stdout.queue(cursor::MoveTo(x, y))?;
                }
                pen.style(&mut self.stdout, &head)?;
                self.stdout.queue(Print(self.run.as_str()))?;
                let next = (end % width) as u16 + 1;
                pen.pos = (next < frame.width).then_some((next, y));
                i = j;
            }

            row.clear();
            self.rows[y as usize] = row;
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore(&mut self.stdout, self.mouse);
    }
}

fn restore(out: &mut Stdout, mouse: bool) {
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    if mouse {
        let _ = out.execute(event::DisableMouseCapture);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

/// For panic and signal paths that cannot reach the live [`Terminal`].
pub fn restore_terminal_best_effort() {
    restore(&mut stdout(), true);
}
