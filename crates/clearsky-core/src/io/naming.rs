use std::fmt;

use crate::error::{ClearskyError, Result};
use crate::stack::Composite;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Tile,
    Orbit,
    Bucket,
    Date,
    Band,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "tile" => Some(Self::Tile),
            "orbit" => Some(Self::Orbit),
            "bucket" => Some(Self::Bucket),
            "date" => Some(Self::Date),
            "band" => Some(Self::Band),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// Tile and orbit identifiers substituted into output names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamingMetadata {
    pub tile: String,
    pub orbit: String,
}

impl Default for NamingMetadata {
    fn default() -> Self {
        Self {
            tile: "unknown".into(),
            orbit: "unknown".into(),
        }
    }
}

/// Output file stem template with `{tile}`, `{orbit}`, `{bucket}`, `{date}`
/// and `{band}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamingTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl NamingTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        if template.trim().is_empty() {
            return Err(ClearskyError::InvalidTemplate("template is empty".into()));
        }

        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            if rest[..open].contains('}') {
                return Err(ClearskyError::InvalidTemplate(format!(
                    "unmatched '}}' in '{template}'"
                )));
            }
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                ClearskyError::InvalidTemplate(format!("unclosed '{{' in '{template}'"))
            })?;
            let name = &after[..close];
            let field = Field::parse(name).ok_or_else(|| {
                ClearskyError::InvalidTemplate(format!("unknown placeholder '{{{name}}}'"))
            })?;
            segments.push(Segment::Field(field));
            rest = &after[close + 1..];
        }
        if rest.contains('}') {
            return Err(ClearskyError::InvalidTemplate(format!(
                "unmatched '}}' in '{template}'"
            )));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        let template = Self {
            source: template.to_string(),
            segments,
        };
        if !template.uses(Field::Bucket) && !template.uses(Field::Date) {
            return Err(ClearskyError::InvalidTemplate(format!(
                "'{}' needs {{bucket}} or {{date}} to tell buckets apart",
                template.source
            )));
        }
        Ok(template)
    }

    fn uses(&self, field: Field) -> bool {
        self.segments.contains(&Segment::Field(field))
    }

    /// Reject a template that would give every band the same name.
    pub fn check_band_count(&self, bands: usize) -> Result<()> {
        if bands > 1 && !self.uses(Field::Band) {
            return Err(ClearskyError::InvalidTemplate(format!(
                "'{}' needs {{band}} when compositing {bands} bands",
                self.source
            )));
        }
        Ok(())
    }

    /// File stem for `composite`.
    pub fn render(&self, composite: &Composite, meta: &NamingMetadata) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(s) => s.clone(),
                Segment::Field(Field::Tile) => meta.tile.clone(),
                Segment::Field(Field::Orbit) => meta.orbit.clone(),
                Segment::Field(Field::Bucket) => composite.bucket.to_string(),
                Segment::Field(Field::Date) => composite.date_label(),
                Segment::Field(Field::Band) => composite.band.clone(),
            })
            .collect()
    }
}

impl fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
