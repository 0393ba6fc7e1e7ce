//! Font, fill and line styling requested for a shape

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::{Error, Result};

/// The `style_properties` object of the styling tools
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StyleProperties {
    #[serde(default)]
    pub font: Option<FontStyle>,
    #[serde(default)]
    pub fill: Option<FillStyle>,
    #[serde(default)]
    pub line: Option<LineStyle>,
}

impl StyleProperties {
    pub fn is_empty(&self) -> bool {
        self.font.is_none() && self.fill.is_none() && self.line.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(font) = &self.font {
            if let Some(size) = font.size {
                if !(1.0..=4000.0).contains(&size) {
                    return Err(Error::InvalidStyle(format!(
                        "font size {size} is outside 1..=4000 points"
                    )));
                }
            }
        }
        if let Some(FillStyle::Solid {
            transparency: Some(t),
            ..
        }) = &self.fill
        {
            if !(0.0..=100.0).contains(t) {
                return Err(Error::InvalidStyle(format!(
                    "transparency {t} is outside 0..=100 percent"
                )));
            }
        }
        if let Some(width) = self.line.as_ref().and_then(|l| l.width) {
            if !(0.0..=1584.0).contains(&width) {
                return Err(Error::InvalidStyle(format!(
                    "line width {width} is outside 0..=1584 points"
                )));
            }
        }
        Ok(())
    }
}

/// Run-level font overrides; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FontStyle {
    #[serde(default)]
    pub family: Option<String>,
    /// Points
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub underline: Option<bool>,
    #[serde(default)]
    pub color: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FillStyle {
    Solid {
        color: Rgb,
        /// Percent, 0 is opaque
        #[serde(default)]
        transparency: Option<f64>,
    },
    Gradient {
        gradient: GradientFill,
    },
    None,
}

/// Two-stop linear gradient
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradientFill {
    pub start_color: Rgb,
    pub end_color: Rgb,
    /// Degrees clockwise, 0 runs left to right
    #[serde(default)]
    pub angle: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LineStyle {
    #[serde(default)]
    pub color: Option<Rgb>,
    /// Points
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub style: Option<LineDash>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineDash {
    Solid,
    Dash,
    Dot,
    DashDot,
    /// No outline at all
    None,
}

impl LineDash {
    /// DrawingML `prstDash` value
    pub fn preset(self) -> Option<&'static str> {
        match self {
            LineDash::Solid => Some("solid"),
            LineDash::Dash => Some("dash"),
            LineDash::Dot => Some("sysDot"),
            LineDash::DashDot => Some("dashDot"),
            LineDash::None => None,
        }
    }

    /// `MsoLineDashStyle`
    pub fn mso_id(self) -> Option<i32> {
        match self {
            LineDash::Solid => Some(1),
            LineDash::Dot => Some(3),
            LineDash::Dash => Some(4),
            LineDash::DashDot => Some(5),
            LineDash::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_style_properties() {
        let style: StyleProperties = serde_json::from_value(json!({
            "font": {"family": "Arial", "size": 18, "bold": true, "color": "#FF0000"},
            "fill": {"type": "gradient", "gradient": {"start_color": "#000000", "end_color": [255, 255, 255]}},
            "line": {"width": 2.5, "style": "dash-dot"}
        }))
        .unwrap();
        let font = style.font.as_ref().unwrap();
        assert_eq!(font.size, Some(18.0));
        assert_eq!(font.color, Some(Rgb::new(255, 0, 0)));
        assert!(matches!(style.fill, Some(FillStyle::Gradient { .. })));
        assert_eq!(style.line.as_ref().unwrap().style, Some(LineDash::DashDot));
        style.validate().unwrap();
    }

    #[test]
    fn test_fill_variants() {
        let none: FillStyle = serde_json::from_value(json!({"type": "none"})).unwrap();
        assert_eq!(none, FillStyle::None);
        let solid: FillStyle =
            serde_json::from_value(json!({"type": "solid", "color": "00FF00", "transparency": 40}))
                .unwrap();
        assert_eq!(
            solid,
            FillStyle::Solid {
                color: Rgb::new(0, 255, 0),
                transparency: Some(40.0)
            }
        );
        assert!(serde_json::from_value::<FillStyle>(json!({"type": "pattern"})).is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let style = StyleProperties {
            fill: Some(FillStyle::Solid {
                color: Rgb::new(0, 0, 0),
                transparency: Some(150.0),
            }),
            ..Default::default()
        };
        assert!(style.validate().is_err());
        assert!(StyleProperties::default().is_empty());
    }

    #[test]
    fn test_dash_mapping() {
        assert_eq!(LineDash::Dot.preset(), Some("sysDot"));
        assert_eq!(LineDash::Dash.mso_id(), Some(4));
        assert_eq!(LineDash::None.preset(), None);
    }
}
