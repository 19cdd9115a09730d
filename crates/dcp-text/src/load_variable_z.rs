//! `<LoadVariableZ>` tables.
//!
//! A table maps an id to a curve of depth positions over time, written as
//! whitespace separated `position[:duration]` tokens:
//!
//! ```text
//! <LoadVariableZ ID="Zvector1">-1.4 4.6:2 9.1:9</LoadVariableZ>
//! ```
//!
//! Reading is permissive. Content that cannot be understood marks the table
//! invalid but keeps the original text, which is written back unchanged.
//! The error surfaces only when [`LoadVariableZ::positions`] is called.

use dcp_core::{Error, Result};

use crate::VariableZPosition;
use crate::xml::Element;

const POSITION_CHARS: &str = "0123456789-.";

/// A named variable Z curve.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadVariableZ {
    id: String,
    positions: Vec<VariableZPosition>,
    valid: bool,
    original_content: String,
}

impl LoadVariableZ {
    /// Creates a table from positions. An empty list gives an invalid table.
    pub fn new(id: impl Into<String>, positions: Vec<VariableZPosition>) -> Self {
        Self {
            id: id.into(),
            valid: !positions.is_empty(),
            positions,
            original_content: String::new(),
        }
    }

    /// Reads a table from its id and text content.
    ///
    /// ```rust
    /// use dcp_text::{LoadVariableZ, VariableZPosition};
    ///
    /// let z = LoadVariableZ::parse("Zvector1", "-1.4  4.6:2 9.1:9");
    /// assert_eq!(z.positions()?[1], VariableZPosition::new(4.6, 2));
    ///
    /// assert!(LoadVariableZ::parse("Zvector2", "1:2:3").positions().is_err());
    /// # Ok::<(), dcp_core::Error>(())
    /// ```
    pub fn parse(id: impl Into<String>, content: &str) -> Self {
        let mut z = Self {
            id: id.into(),
            positions: Vec::new(),
            valid: false,
            original_content: content.to_string(),
        };

        if let Some(positions) = parse_positions(content) {
            z.positions = positions;
            z.valid = true;
        }
        z
    }

    /// Reads a table from a `<LoadVariableZ>` element.
    pub fn from_element(element: &Element) -> Result<Self> {
        let id = element.string_attribute("ID")?;
        Ok(Self::parse(id, &element.text_content()))
    }

    /// Table id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True if the content was understood.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Content as it was read.
    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    /// The curve.
    ///
    /// Returns [`Error::LoadVariableZ`] carrying the original content if the
    /// table is invalid.
    pub fn positions(&self) -> Result<&[VariableZPosition]> {
        if !self.valid {
            return Err(Error::LoadVariableZ(self.original_content.clone()));
        }
        Ok(&self.positions)
    }

    /// Replaces the curve, making the table valid.
    ///
    /// The list must be non-empty and every duration positive.
    pub fn set_positions(&mut self, positions: Vec<VariableZPosition>) -> Result<()> {
        if positions.is_empty() {
            return Err(Error::Misc("variable Z positions can not be empty".into()));
        }
        if let Some(p) = positions.iter().find(|p| p.duration <= 0) {
            return Err(Error::Misc(format!(
                "variable Z duration must be positive, not {}",
                p.duration
            )));
        }
        self.positions = positions;
        self.valid = true;
        Ok(())
    }

    /// Text content to write: the formatted curve, or the original content
    /// if the table is invalid.
    pub fn content(&self) -> String {
        if !self.valid {
            return self.original_content.clone();
        }

        self.positions
            .iter()
            .map(|p| {
                if p.duration != 1 {
                    format!("{:.1}:{}", p.position, p.duration)
                } else {
                    format!("{:.1}", p.position)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Writes the `ID` attribute and content into `element`.
    pub fn write(&self, element: &mut Element) {
        element.set_attribute("ID", &self.id);
        element.add_text(self.content());
    }
}

/// Value of the longest prefix of `s` that reads as a `T`, or zero if
/// there is none: `"1.5.3"` is 1.5, `"3x"` is 3 and `"-"` is 0.
fn leading_number<T: std::str::FromStr + Default>(s: &str) -> T {
    s.char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .rev()
        .find_map(|end| s[..end].parse().ok())
        .unwrap_or_default()
}

fn parse_positions(content: &str) -> Option<Vec<VariableZPosition>> {
    let mut positions = Vec::new();

    for part in content.split(['\t', '\n', '\r', ' ']).filter(|p| !p.is_empty()) {
        let halves: Vec<&str> = part.split(':').collect();

        if !halves[0].chars().all(|c| POSITION_CHARS.contains(c)) {
            return None;
        }
        let position: f32 = leading_number(halves[0]);

        match halves.as_slice() {
            [_] => positions.push(VariableZPosition::new(position, 1)),
            [_, duration] => {
                let duration: i64 = leading_number(duration);
                if duration <= 0 {
                    return None;
                }
                positions.push(VariableZPosition::new(position, duration));
            }
            _ => return None,
        }
    }

    (!positions.is_empty()).then_some(positions)
}
