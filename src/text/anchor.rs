use crate::text::layout::BoundingBox;

/// Which point of the text's bounding box is pinned to the requested
/// position.
///
/// ```text
/// TopLeft ------ Top ------ TopRight
///    |                          |
///  Left ------- Center ------ Right
///    |                          |
/// BottomLeft -- Bottom -- BottomRight
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    Center,
    TopLeft,
    TopRight,
    Top,
    Left,
    Right,
    /// The pen origin itself.
    #[default]
    BottomLeft,
    BottomRight,
    Bottom,
}

impl TextAnchor {
    /// Pen origin that puts this anchor point of `bounds` at `(x, y)`.
    /// Y points up, so top anchors move the pen down by the text height.
    /// Centring offsets are whole pixels.
    pub fn origin(self, x: f32, y: f32, bounds: BoundingBox) -> (f32, f32) {
        let (w, h) = (bounds.width, bounds.height);
        let dx = match self {
            TextAnchor::TopLeft | TextAnchor::Left | TextAnchor::BottomLeft => 0.0,
            TextAnchor::Top | TextAnchor::Center | TextAnchor::Bottom => (w / 2.0).floor(),
            TextAnchor::TopRight | TextAnchor::Right | TextAnchor::BottomRight => w,
        };
        let dy = match self {
            TextAnchor::BottomLeft | TextAnchor::Bottom | TextAnchor::BottomRight => 0.0,
            TextAnchor::Left | TextAnchor::Center | TextAnchor::Right => (h / 2.0).floor(),
            TextAnchor::TopLeft | TextAnchor::Top | TextAnchor::TopRight => h,
        };
        (x - dx, y - dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: BoundingBox = BoundingBox {
        width: 100.0,
        height: 20.0,
        height_with_descender: 26.0,
    };

    #[test]
    fn all_nine_anchors() {
        let cases = [
            (TextAnchor::BottomLeft, (500.0, 300.0)),
            (TextAnchor::Bottom, (450.0, 300.0)),
            (TextAnchor::BottomRight, (400.0, 300.0)),
            (TextAnchor::Left, (500.0, 290.0)),
            (TextAnchor::Center, (450.0, 290.0)),
            (TextAnchor::Right, (400.0, 290.0)),
            (TextAnchor::TopLeft, (500.0, 280.0)),
            (TextAnchor::Top, (450.0, 280.0)),
            (TextAnchor::TopRight, (400.0, 280.0)),
        ];
        for (anchor, expected) in cases {
            assert_eq!(anchor.origin(500.0, 300.0, BOUNDS), expected, "{:?}", anchor);
        }
    }

    #[test]
    fn centring_stays_on_whole_pixels() {
        let odd = BoundingBox {
            width: 101.0,
            height: 21.0,
            height_with_descender: 27.0,
        };
        assert_eq!(TextAnchor::Center.origin(500.0, 300.0, odd), (450.0, 290.0));
        assert_eq!(TextAnchor::Top.origin(500.0, 300.0, odd), (450.0, 279.0));
        assert_eq!(TextAnchor::Right.origin(500.0, 300.0, odd), (399.0, 290.0));
    }

    #[test]
    fn default_is_pen_origin() {
        assert_eq!(TextAnchor::default().origin(7.0, 9.0, BOUNDS), (7.0, 9.0));
    }
}
