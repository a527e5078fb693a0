use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::bail;
use serde::{de::Visitor, Deserialize};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub image: Image,
    #[serde(default)]
    pub paint: Paint,
    /// File with `M`/`L` path data to preload strokes from.
    pub load: Option<PathBuf>,
    /// Where the `EXPORT` command writes path data. Printed to stdout when unset.
    pub export: Option<PathBuf>,
    #[serde(default)]
    pub bind: HashMap<Key, CommandVerb>,
}

impl Config {
    pub fn load<A: AsRef<Path>>(path: A) -> anyhow::Result<Self> {
        Self::load_impl(path.as_ref())
    }

    fn load_impl(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;

        // Validate configuration.
        // - The image needs a non-empty extent.
        // - Strokes need a positive width.

        if config.image.width == 0 || config.image.height == 0 {
            bail!(
                "[image] must have a non-zero size (found {}x{})",
                config.image.width,
                config.image.height
            );
        }
        let width = config.paint.stroke_width;
        if !width.is_finite() || width <= 0.0 {
            bail!("[paint] `stroke_width` must be positive (found {width})");
        }

        Ok(config)
    }
}

/// Source-space extent of the image being drawn on.
#[derive(Debug, Deserialize)]
pub struct Image {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Paint {
    pub color: Color,
    /// Stroke width in view pixels.
    pub stroke_width: f32,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color {
                a: 0x66,
                r: 0x00,
                g: 0x00,
                b: 0xff,
            },
            stroke_width: 19.0,
        }
    }
}

/// A straight-alpha color, written as `#AARRGGBB` or `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// RGBA in 0-1, with the color channels multiplied by alpha.
    pub fn premultiplied(self) -> [f32; 4] {
        let a = f32::from(self.a) / 255.0;
        [
            f32::from(self.r) / 255.0 * a,
            f32::from(self.g) / 255.0 * a,
            f32::from(self.b) / 255.0 * a,
            a,
        ]
    }
}

impl std::str::FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let Some(hex) = s.strip_prefix('#') else {
            bail!("color must start with '#'");
        };
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            bail!("'{hex}' is not a hexadecimal number");
        }
        if hex.len() != 6 && hex.len() != 8 {
            bail!("expected 6 or 8 hex digits, found {}", hex.len());
        }
        let value = u32::from_str_radix(hex, 16)?;
        let [a, r, g, b] = match hex.len() {
            6 => (value | 0xff00_0000).to_be_bytes(),
            _ => value.to_be_bytes(),
        };
        Ok(Color { a, r, g, b })
    }
}

impl<'a> Deserialize<'a> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        struct FromStrVisitor;

        impl<'de> Visitor<'de> for FromStrVisitor {
            type Value = Color;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("color in `#AARRGGBB` or `#RRGGBB` form")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse()
                    .map_err(|e| E::custom(format_args!("invalid color '{v}': {e}")))
            }
        }

        deserializer.deserialize_str(FromStrVisitor)
    }
}

/// A keyboard key, named either by the character it produces or by one of a few special names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Char(String),
    Escape,
    Delete,
    Backspace,
    Enter,
    Space,
    Tab,
}

impl std::str::FromStr for Key {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(match s {
            "Escape" => Key::Escape,
            "Delete" => Key::Delete,
            "Backspace" => Key::Backspace,
            "Enter" => Key::Enter,
            "Space" => Key::Space,
            "Tab" => Key::Tab,
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c.to_lowercase().collect()),
                    (None, _) => bail!("key name is empty"),
                    _ => bail!("'{s}' is neither a single character nor a known key name"),
                }
            }
        })
    }
}

impl<'a> Deserialize<'a> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        struct FromStrVisitor;

        impl<'de> Visitor<'de> for FromStrVisitor {
            type Value = Key;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("single character or key name")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse()
                    .map_err(|e| E::custom(format_args!("invalid key name '{v}': {e}")))
            }
        }

        deserializer.deserialize_str(FromStrVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CommandVerb {
    #[serde(rename = "CLEAR")]
    Clear,
    #[serde(rename = "UNDO")]
    Undo,
    #[serde(rename = "REDO")]
    Redo,
    #[serde(rename = "EXPORT")]
    Export,
    #[serde(rename = "FIT")]
    Fit,
}
