//! Vector paths made of move/line commands, and their compact textual encoding.
//!
//! A command is encoded as its letter followed by the target coordinate, eg. `M3.5,4.0` or
//! `L1.0,2.0`. A path is the concatenation of its commands' tokens.

use std::fmt::{self, Write};

use anyhow::{bail, Context};

use crate::math::{vec2, Vec2f};

/// Receiver of path-building primitives.
pub trait PathBuilder {
    fn move_to(&mut self, to: Vec2f);

    fn line_to(&mut self, to: Vec2f);

    fn quad_to(&mut self, ctrl: Vec2f, to: Vec2f);
}

/// A single path command.
///
/// Nothing checks that a sequence of commands starts with a [`PathCommand::Move`]; that is up to
/// whoever assembles the sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    Move(f32, f32),
    Line(f32, f32),
}

impl PathCommand {
    pub fn target_x(&self) -> f32 {
        match *self {
            PathCommand::Move(x, _) | PathCommand::Line(x, _) => x,
        }
    }

    pub fn target_y(&self) -> f32 {
        match *self {
            PathCommand::Move(_, y) | PathCommand::Line(_, y) => y,
        }
    }

    pub fn target(&self) -> Vec2f {
        vec2(self.target_x(), self.target_y())
    }

    /// Issues the equivalent primitive on `builder`.
    pub fn apply_to<B: PathBuilder + ?Sized>(&self, builder: &mut B) {
        match *self {
            PathCommand::Move(x, y) => builder.move_to(vec2(x, y)),
            PathCommand::Line(x, y) => builder.line_to(vec2(x, y)),
        }
    }

    /// Writes this command's token to `sink`.
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        // `{:?}` is the shortest round-trip form and always keeps a fractional part (`4.0`, not `4`).
        match *self {
            PathCommand::Move(x, y) => write!(sink, "M{x:?},{y:?}"),
            PathCommand::Line(x, y) => write!(sink, "L{x:?},{y:?}"),
        }
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// Concatenates the tokens of `commands`.
pub fn serialize_all<'a>(commands: impl IntoIterator<Item = &'a PathCommand>) -> String {
    commands.into_iter().map(ToString::to_string).collect()
}

/// Parses a concatenation of `M`/`L` tokens. Whitespace between tokens is ignored.
pub fn parse(text: &str) -> anyhow::Result<Vec<PathCommand>> {
    let mut commands = Vec::new();
    let mut rest = text.trim_start();
    while let Some(letter) = rest.chars().next() {
        let body = &rest[letter.len_utf8()..];
        let end = body
            .find(|c: char| c == 'M' || c == 'L' || c.is_whitespace())
            .unwrap_or(body.len());
        let (token, tail) = body.split_at(end);

        let Some((x, y)) = token.split_once(',') else {
            bail!("path command '{letter}{token}' is missing a ',' between coordinates");
        };
        let x = parse_coord(x).with_context(|| format!("in path command '{letter}{token}'"))?;
        let y = parse_coord(y).with_context(|| format!("in path command '{letter}{token}'"))?;

        commands.push(match letter {
            'M' => PathCommand::Move(x, y),
            'L' => PathCommand::Line(x, y),
            _ => bail!("unknown path command '{letter}'"),
        });
        rest = tail.trim_start();
    }
    Ok(commands)
}

fn parse_coord(s: &str) -> anyhow::Result<f32> {
    let value: f32 = s
        .parse()
        .with_context(|| format!("invalid coordinate '{s}'"))?;
    if !value.is_finite() {
        bail!("coordinate '{s}' is not finite");
    }
    Ok(value)
}

/// One element of a recorded [`Path`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathEl {
    MoveTo(Vec2f),
    LineTo(Vec2f),
    QuadTo(Vec2f, Vec2f),
}

/// A path that records the primitives issued on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    elements: Vec<PathEl>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[PathEl] {
        &self.elements
    }
}

impl PathBuilder for Path {
    fn move_to(&mut self, to: Vec2f) {
        self.elements.push(PathEl::MoveTo(to));
    }

    fn line_to(&mut self, to: Vec2f) {
        self.elements.push(PathEl::LineTo(to));
    }

    fn quad_to(&mut self, ctrl: Vec2f, to: Vec2f) {
        self.elements.push(PathEl::QuadTo(ctrl, to));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_tokens() {
        assert_eq!(PathCommand::Move(3.5, 4.0).to_string(), "M3.5,4.0");
        assert_eq!(PathCommand::Line(1.0, 2.0).to_string(), "L1.0,2.0");
        assert_eq!(PathCommand::Line(-0.25, 100.0).to_string(), "L-0.25,100.0");
    }

    #[test]
    fn serialize_all_concatenates() {
        let commands = [
            PathCommand::Move(0.0, 0.0),
            PathCommand::Line(1.5, 2.0),
            PathCommand::Line(3.0, 4.5),
        ];
        assert_eq!(serialize_all(&commands), "M0.0,0.0L1.5,2.0L3.0,4.5");
        assert_eq!(serialize_all(&[] as &[PathCommand]), "");
    }

    #[test]
    fn targets() {
        let line = PathCommand::Line(7.0, -3.0);
        assert_eq!(line.target_x(), 7.0);
        assert_eq!(line.target_y(), -3.0);
        assert_eq!(PathCommand::Move(1.0, 2.0).target(), vec2(1.0, 2.0));
    }

    #[test]
    fn apply_to_issues_primitives() {
        let mut path = Path::new();
        for command in [PathCommand::Move(1.0, 1.0), PathCommand::Line(2.0, 3.0)] {
            command.apply_to(&mut path);
        }
        assert_eq!(
            path.elements(),
            &[PathEl::MoveTo(vec2(1.0, 1.0)), PathEl::LineTo(vec2(2.0, 3.0))]
        );
    }

    #[test]
    fn parses_concatenated_and_spaced_tokens() {
        let expected = vec![
            PathCommand::Move(3.5, 4.0),
            PathCommand::Line(1.0, 2.0),
            PathCommand::Line(-1e-3, 1e20),
            PathCommand::Move(0.0, 0.0),
        ];
        assert_eq!(parse("M3.5,4.0L1.0,2.0L-0.001,1e20M0.0,0.0").unwrap(), expected);
        assert_eq!(
            parse("  M3.5,4.0 L1.0,2.0\nL-0.001,1e20\n\nM0,0\n").unwrap(),
            expected
        );
        assert_eq!(parse("").unwrap(), vec![]);
    }

    #[test]
    fn parse_accepts_own_output() {
        let commands = vec![
            PathCommand::Move(12.345, -6.5),
            PathCommand::Line(f32::MAX, f32::MIN_POSITIVE),
        ];
        assert_eq!(parse(&serialize_all(&commands)).unwrap(), commands);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("Q1.0,2.0").is_err());
        assert!(parse("M1.0").is_err());
        assert!(parse("M1.0,x").is_err());
        assert!(parse("Mnan,0").is_err());
        assert!(parse("M1.0,2.0,3.0").is_err());
    }
}
