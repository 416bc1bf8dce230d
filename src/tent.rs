//! Geometry for the printable tent card.
//!
//! The card is two pages hinged at an apex. Treating each page as a unit
//! segment, the chord between the page edges sets how much glue flap the
//! print layout needs.

pub const MIN_ANGLE: f64 = 30.0;
pub const MAX_ANGLE: f64 = 90.0;
pub const DEFAULT_ANGLE: f64 = 60.0;

/// Printed page height in pixels.
pub const PAGE_HEIGHT_PX: f64 = 400.0;
const FLAP_RATIO: f64 = 0.3;

// Preview diagram, in SVG user units.
const PREVIEW_CENTER_X: f64 = 60.0;
const PREVIEW_APEX_Y: f64 = 10.0;
const PREVIEW_PAGE_LENGTH: f64 = 50.0;
const PREVIEW_ARC_RADIUS: f64 = 15.0;

pub fn chord_length(angle_deg: f64) -> f64 {
    2.0 * (angle_deg.to_radians() / 2.0).sin()
}

pub fn flap_height(angle_deg: f64) -> i64 {
    (chord_length(angle_deg) * FLAP_RATIO * PAGE_HEIGHT_PX).round() as i64
}

/// Parses the `angle` query value, falling back to the default and
/// clamping into the range the control offers.
pub fn clamp_angle(raw: Option<&str>) -> f64 {
    match raw.and_then(|raw| raw.trim().parse::<f64>().ok()) {
        Some(angle) if angle.is_finite() => angle.clamp(MIN_ANGLE, MAX_ANGLE),
        _ => DEFAULT_ANGLE,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug)]
pub struct TentPreview {
    pub apex: Point,
    pub left: Point,
    pub right: Point,
    /// Both flaps drop to this y.
    pub flap_y: f64,
    pub arc_start: Point,
    pub arc_end: Point,
}

impl TentPreview {
    pub fn new(angle_deg: f64) -> TentPreview {
        let half = angle_deg.to_radians() / 2.0;
        let (sin, cos) = half.sin_cos();
        let apex = Point {
            x: PREVIEW_CENTER_X,
            y: PREVIEW_APEX_Y,
        };
        let base_y = apex.y + PREVIEW_PAGE_LENGTH * cos;
        let flap = flap_height(angle_deg) as f64 / PAGE_HEIGHT_PX * PREVIEW_PAGE_LENGTH;
        TentPreview {
            apex,
            left: Point {
                x: apex.x - PREVIEW_PAGE_LENGTH * sin,
                y: base_y,
            },
            right: Point {
                x: apex.x + PREVIEW_PAGE_LENGTH * sin,
                y: base_y,
            },
            flap_y: base_y + flap,
            arc_start: Point {
                x: apex.x - PREVIEW_ARC_RADIUS * sin,
                y: apex.y + PREVIEW_ARC_RADIUS * cos,
            },
            arc_end: Point {
                x: apex.x + PREVIEW_ARC_RADIUS * sin,
                y: apex.y + PREVIEW_ARC_RADIUS * cos,
            },
        }
    }

    /// SVG path for the arc marking the apex angle.
    pub fn arc_path(&self) -> String {
        format!(
            "M {:.2} {:.2} A {r} {r} 0 0 1 {:.2} {:.2}",
            self.arc_start.x,
            self.arc_start.y,
            self.arc_end.x,
            self.arc_end.y,
            r = PREVIEW_ARC_RADIUS
        )
    }

    pub fn label_y(&self) -> f64 {
        self.apex.y + 25.0
    }
}

/// Everything the menu page needs to lay out a tent card at one angle.
#[derive(Clone, Debug)]
pub struct TentCard {
    pub angle: f64,
    pub flap_px: i64,
    pub preview: TentPreview,
}

impl TentCard {
    pub fn new(angle_deg: f64) -> TentCard {
        TentCard {
            angle: angle_deg,
            flap_px: flap_height(angle_deg),
            preview: TentPreview::new(angle_deg),
        }
    }

    pub fn from_query(raw: Option<&str>) -> TentCard {
        Self::new(clamp_angle(raw))
    }

    /// The angle as shown on the control, in whole degrees.
    pub fn degrees(&self) -> i64 {
        self.angle.round() as i64
    }

    pub fn flap_css(&self) -> String {
        format!("{}px", self.flap_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_degrees_is_equilateral() {
        assert!((chord_length(60.0) - 1.0).abs() < 1e-9);
        assert_eq!(flap_height(60.0), 120);
    }

    #[test]
    fn known_heights() {
        assert_eq!(flap_height(90.0), 170);
        assert_eq!(flap_height(30.0), 62);
        assert_eq!(flap_height(0.0), 0);
        assert_eq!(flap_height(180.0), 240);
    }

    #[test]
    fn flap_never_shrinks_as_angle_widens() {
        let mut previous = flap_height(MIN_ANGLE);
        let mut angle = MIN_ANGLE;
        while angle <= MAX_ANGLE {
            let height = flap_height(angle);
            assert!(height >= previous, "{} dropped at {}", height, angle);
            assert!(height > 0);
            previous = height;
            angle += 0.5;
        }
    }

    #[test]
    fn clamping() {
        assert_eq!(clamp_angle(None), DEFAULT_ANGLE);
        assert_eq!(clamp_angle(Some("sideways")), DEFAULT_ANGLE);
        assert_eq!(clamp_angle(Some("NaN")), DEFAULT_ANGLE);
        assert_eq!(clamp_angle(Some("10")), MIN_ANGLE);
        assert_eq!(clamp_angle(Some("120")), MAX_ANGLE);
        assert_eq!(clamp_angle(Some(" 45 ")), 45.0);
    }

    #[test]
    fn preview_is_symmetric_about_apex() {
        let preview = TentPreview::new(60.0);
        assert!((preview.left.x - 35.0).abs() < 1e-9);
        assert!((preview.right.x - 85.0).abs() < 1e-9);
        assert_eq!(preview.left.y, preview.right.y);
        // 120px flap is 0.3 of a page, 15 preview units.
        assert!((preview.flap_y - preview.left.y - 15.0).abs() < 1e-9);
        assert_eq!(preview.arc_path(), "M 52.50 22.99 A 15 15 0 0 1 67.50 22.99");
    }

    #[test]
    fn card_from_query() {
        let card = TentCard::from_query(Some("75"));
        assert_eq!(card.degrees(), 75);
        assert_eq!(card.flap_px, flap_height(75.0));
    }
}
