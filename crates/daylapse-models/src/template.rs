//! Frame filename templates.
//!
//! A template is a path containing exactly one integer placeholder, either
//! `%d` or a zero-padded `%0Nd` (e.g. `frames/frame_%05d.png`). A literal
//! percent sign is written as `%%`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelError, ModelResult};

/// Widest zero-padded field accepted (`%020d`).
pub const MAX_FIELD_WIDTH: usize = 20;

/// Parsed frame filename template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTemplate {
    raw: String,
    prefix: String,
    suffix: String,
    width: usize,
}

impl ImageTemplate {
    /// Parse and validate a template string.
    pub fn parse(template: &str) -> ModelResult<Self> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut width = None;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if width.is_some() { &mut suffix } else { &mut prefix };
            if c != '%' {
                out.push(c);
                continue;
            }

            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }

            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }

            if chars.next() != Some('d') {
                return Err(ModelError::invalid_template(
                    template,
                    "placeholder must be %d or %0Nd",
                ));
            }
            if width.is_some() {
                return Err(ModelError::invalid_template(
                    template,
                    "more than one frame index placeholder",
                ));
            }
            if !digits.is_empty() && !digits.starts_with('0') {
                return Err(ModelError::invalid_template(
                    template,
                    "field width must be zero-padded (%0Nd)",
                ));
            }

            let field_width = if digits.is_empty() {
                0
            } else {
                digits
                    .parse::<usize>()
                    .ok()
                    .filter(|w| *w <= MAX_FIELD_WIDTH)
                    .ok_or_else(|| {
                        ModelError::invalid_template(
                            template,
                            format!("field width must be at most {}", MAX_FIELD_WIDTH),
                        )
                    })?
            };
            width = Some(field_width);
        }

        let width = width.ok_or_else(|| {
            ModelError::invalid_template(template, "missing frame index placeholder")
        })?;

        Ok(Self {
            raw: template.to_string(),
            prefix,
            suffix,
            width,
        })
    }

    /// Path for the given frame index.
    pub fn render(&self, index: u64) -> PathBuf {
        PathBuf::from(format!(
            "{}{:0width$}{}",
            self.prefix,
            index,
            self.suffix,
            width = self.width
        ))
    }

    /// Directory that frames are written into, if the template has one.
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.render(0)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    /// The template as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ImageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ImageTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ImageTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ImageTemplate::parse(&raw).map_err(serde::de::Error::custom)
    }
}
