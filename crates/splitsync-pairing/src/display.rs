//! Display selection and side-by-side geometry.

use splitsync_common::{Bounds, DisplayDescriptor, SyncError};

/// Pick the display that contains the center of `window`.
///
/// Falls back to the first display when the center lies outside every
/// display (e.g. a window dragged mostly off-screen). An empty display list
/// is an error: nothing can be laid out without one.
pub fn resolve_display<'a>(
    displays: &'a [DisplayDescriptor],
    window: &Bounds,
) -> Result<&'a DisplayDescriptor, SyncError> {
    let (cx, cy) = window.center();
    displays
        .iter()
        .find(|d| d.bounds.contains_point(cx, cy))
        .or_else(|| displays.first())
        .ok_or(SyncError::NoDisplay)
}

/// Split a work area into left and right halves. The left half is
/// `floor(width / 2)` wide and the right half starts right after it with
/// the same width; both span the full height.
pub fn split_layout(work_area: &Bounds) -> (Bounds, Bounds) {
    let width = work_area.width.div_euclid(2);
    let left = Bounds::new(work_area.left, work_area.top, width, work_area.height);
    let right = Bounds::new(
        work_area.left + width,
        work_area.top,
        width,
        work_area.height,
    );
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(left: i32, top: i32, width: i32, height: i32) -> DisplayDescriptor {
        DisplayDescriptor {
            bounds: Bounds::new(left, top, width, height),
            work_area: Bounds::new(left, top + 25, width, height - 25),
        }
    }

    #[test]
    fn picks_display_containing_window_center() {
        let displays = [display(0, 0, 1920, 1080), display(1920, 0, 1920, 1080)];
        // Center at x = 2500.
        let window = Bounds::new(2100, 100, 800, 600);
        let d = resolve_display(&displays, &window).unwrap();
        assert_eq!(d.bounds.left, 1920);
    }

    #[test]
    fn shared_edge_goes_to_first_match() {
        let displays = [display(0, 0, 1920, 1080), display(1920, 0, 1920, 1080)];
        // Center exactly on x = 1920.
        let window = Bounds::new(1520, 0, 800, 600);
        let d = resolve_display(&displays, &window).unwrap();
        assert_eq!(d.bounds.left, 0);
    }

    #[test]
    fn off_screen_window_falls_back_to_first_display() {
        let displays = [display(0, 0, 1920, 1080), display(1920, 0, 1920, 1080)];
        let window = Bounds::new(-5000, -5000, 400, 300);
        let d = resolve_display(&displays, &window).unwrap();
        assert_eq!(d.bounds.left, 0);
    }

    #[test]
    fn empty_display_list_is_an_error() {
        let window = Bounds::new(0, 0, 800, 600);
        let err = resolve_display(&[], &window).unwrap_err();
        assert!(matches!(err, SyncError::NoDisplay));
    }

    #[test]
    fn split_even_width() {
        let (l, r) = split_layout(&Bounds::new(0, 25, 1920, 1055));
        assert_eq!(l, Bounds::new(0, 25, 960, 1055));
        assert_eq!(r, Bounds::new(960, 25, 960, 1055));
    }

    #[test]
    fn split_odd_width_floors() {
        let (l, r) = split_layout(&Bounds::new(1920, 0, 1365, 768));
        assert_eq!(l.width, 682);
        assert_eq!(r.left, 1920 + 682);
        assert_eq!(r.width, 682);
    }
}
