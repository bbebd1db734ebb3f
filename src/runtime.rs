// Copyright (c) 2026 rezky_nightky

use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

impl ColorMode {
    pub fn label(self) -> &'static str {
        match self {
            ColorMode::TrueColor => "24-bit truecolor",
            ColorMode::Color256 => "8-bit (256-color)",
            ColorMode::Color16 => "16-color",
            ColorMode::Mono => "mono",
        }
    }

    pub fn from_flag(bits: u16) -> Result<Self, String> {
        match bits {
            0 => Ok(ColorMode::Mono),
            16 => Ok(ColorMode::Color16),
            8 | 256 => Ok(ColorMode::Color256),
            24 | 32 => Ok(ColorMode::TrueColor),
            _ => Err(format!(
                "invalid --colormode: {} (allowed: 0,16,8/256,24/32)",
                bits
            )),
        }
    }

    /// Best guess from `COLORTERM` and `TERM`.
    pub fn detect() -> Self {
        let colorterm = env::var("COLORTERM")
            .unwrap_or_default()
            .to_ascii_lowercase();
        if colorterm.contains("truecolor") || colorterm.contains("24bit") {
            return ColorMode::TrueColor;
        }
        let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
        if term == "dumb" {
            ColorMode::Mono
        } else if term == "linux" {
            ColorMode::Color16
        } else {
            ColorMode::Color256
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    Dusk,
    Slate,
    Neon,
    Arctic,
    Amber,
    Forest,
    Mono,
}

impl ColorScheme {
    pub fn from_name(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dusk" | "default" => Ok(ColorScheme::Dusk),
            "slate" | "gray" | "grey" => Ok(ColorScheme::Slate),
            "neon" | "synthwave" => Ok(ColorScheme::Neon),
            "arctic" | "ice" => Ok(ColorScheme::Arctic),
            "amber" | "sodium" => Ok(ColorScheme::Amber),
            "forest" | "jungle" => Ok(ColorScheme::Forest),
            "mono" => Ok(ColorScheme::Mono),
            _ => Err(format!("invalid color: {} (see --list-colors)", s)),
        }
    }
}
