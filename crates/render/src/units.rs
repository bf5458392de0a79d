//! Coordinate transform from the template's millimeter space to PDF space.
//!
//! Anchors are measured from the top-left corner of the sheet, y growing
//! downward. PDF device space is in points from the bottom-left corner,
//! y growing upward.

/// Points per millimeter.
pub const MM_TO_PT: f64 = 2.8346;
/// A4 page height in points.
pub const A4_HEIGHT_PT: f64 = 841.89;
/// A4 page width in points.
pub const A4_WIDTH_PT: f64 = 595.28;

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

/// A position on the printed template, in millimeters from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x_mm: f64,
    pub y_mm: f64,
}

impl Anchor {
    pub const fn mm(x_mm: f64, y_mm: f64) -> Self {
        Self { x_mm, y_mm }
    }

    pub fn is_on_sheet(&self) -> bool {
        (0.0..=A4_WIDTH_MM).contains(&self.x_mm) && (0.0..=A4_HEIGHT_MM).contains(&self.y_mm)
    }
}

/// A position in PDF user space (points, bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePoint {
    pub x: f64,
    pub y: f64,
}

pub fn to_device(anchor: Anchor) -> DevicePoint {
    DevicePoint {
        x: anchor.x_mm * MM_TO_PT,
        y: A4_HEIGHT_PT - (anchor.y_mm * MM_TO_PT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn origin_maps_to_top_left_corner() {
        let p = to_device(Anchor::mm(0.0, 0.0));
        assert_eq!(p, DevicePoint { x: 0.0, y: A4_HEIGHT_PT });
    }

    #[test]
    fn known_anchor() {
        let p = to_device(Anchor::mm(30.0, 100.0));
        assert_eq!(p.x, 30.0 * 2.8346);
        assert_eq!(p.y, 841.89 - 100.0 * 2.8346);
    }

    #[test]
    fn sheet_bounds() {
        assert!(Anchor::mm(210.0, 297.0).is_on_sheet());
        assert!(!Anchor::mm(-1.0, 10.0).is_on_sheet());
        assert!(!Anchor::mm(10.0, 297.5).is_on_sheet());
    }

    proptest! {
        #[test]
        fn transform_is_exact(x in 0.0f64..=210.0, y in 0.0f64..=297.0) {
            let p = to_device(Anchor::mm(x, y));
            prop_assert_eq!(p.x, x * 2.8346);
            prop_assert_eq!(p.y, 841.89 - y * 2.8346);
        }

        #[test]
        fn lower_on_the_sheet_is_lower_on_the_page(y1 in 0.0f64..297.0, dy in 0.001f64..10.0) {
            let upper = to_device(Anchor::mm(10.0, y1));
            let lower = to_device(Anchor::mm(10.0, y1 + dy));
            prop_assert!(lower.y < upper.y);
        }
    }
}
