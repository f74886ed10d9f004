/// Scroll position of the feed, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub offset: usize,
    pub height: usize,
    pub content_height: usize,
}

impl Viewport {
    /// Rows below the bottom edge of the viewport
    pub fn remaining(&self) -> usize {
        self.content_height
            .saturating_sub(self.offset.saturating_add(self.height))
    }

    pub fn max_offset(&self) -> usize {
        self.content_height.saturating_sub(self.height)
    }
}

/// Fires whenever the reader is within `threshold` rows of the end.
///
/// There is no debouncing here: every qualifying scroll fires, and the
/// paginator's in-flight guard turns the extra firings into no-ops.
#[derive(Debug, Clone, Copy)]
pub struct ScrollTrigger {
    threshold: usize,
}

impl ScrollTrigger {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn should_fire(&self, viewport: &Viewport) -> bool {
        viewport.remaining() <= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(offset: usize, height: usize, content_height: usize) -> Viewport {
        Viewport {
            offset,
            height,
            content_height,
        }
    }

    #[test]
    fn fires_within_threshold() {
        let trigger = ScrollTrigger::new(8);
        assert!(trigger.should_fire(&vp(62, 30, 100)));
        assert!(trigger.should_fire(&vp(70, 30, 100)));
    }

    #[test]
    fn quiet_far_from_the_end() {
        assert!(!ScrollTrigger::new(8).should_fire(&vp(0, 30, 100)));
        assert!(!ScrollTrigger::new(8).should_fire(&vp(61, 30, 100)));
    }

    #[test]
    fn short_content_always_fires() {
        assert!(ScrollTrigger::new(0).should_fire(&vp(0, 30, 12)));
        assert!(ScrollTrigger::new(8).should_fire(&Viewport::default()));
    }

    #[test]
    fn remaining_saturates() {
        assert_eq!(vp(90, 30, 100).remaining(), 0);
        assert_eq!(vp(10, 30, 100).remaining(), 60);
        assert_eq!(vp(0, 30, 100).max_offset(), 70);
        assert_eq!(vp(0, 30, 10).max_offset(), 0);
    }
}
