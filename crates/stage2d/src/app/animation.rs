use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub image: String,
    pub duration_ms: u64,
}

/// Immutable frame sequence; playback state lives in [`AnimationDriver`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub frames: Vec<AnimationFrame>,
    #[serde(default)]
    pub looping: bool,
}

impl Animation {
    pub fn new(looping: bool) -> Self {
        Self {
            frames: Vec::new(),
            looping,
        }
    }

    pub fn frame(mut self, image: impl Into<String>, duration_ms: u64) -> Self {
        self.frames.push(AnimationFrame {
            image: image.into(),
            duration_ms,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.frames
            .iter()
            .map(|frame| frame.duration_ms)
            .fold(0, u64::saturating_add)
    }
}

#[derive(Debug, Clone)]
pub struct AnimationDriver {
    static_image: String,
    static_alternatives: Vec<String>,
    active: Option<Animation>,
    frame_index: usize,
    elapsed_in_frame_ms: u64,
}

impl AnimationDriver {
    pub fn new(static_image: impl Into<String>) -> Self {
        Self {
            static_image: static_image.into(),
            static_alternatives: Vec::new(),
            active: None,
            frame_index: 0,
            elapsed_in_frame_ms: 0,
        }
    }

    /// Empty sequences are treated as no sequence.
    pub fn set_animation(&mut self, animation: Animation) {
        self.active = (!animation.is_empty()).then_some(animation);
        self.frame_index = 0;
        self.elapsed_in_frame_ms = 0;
    }

    pub fn clear_animation(&mut self) {
        self.active = None;
        self.frame_index = 0;
        self.elapsed_in_frame_ms = 0;
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn set_static_image(&mut self, image: impl Into<String>) {
        self.static_image = image.into();
    }

    pub fn set_static_alternatives(&mut self, alternatives: Vec<String>) {
        self.static_alternatives = alternatives;
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        let Some(animation) = self.active.as_ref() else {
            return;
        };
        self.elapsed_in_frame_ms = self.elapsed_in_frame_ms.saturating_add(elapsed_ms);

        // Bounded so a sequence of zero-length frames cannot spin forever.
        for _ in 0..animation.frames.len() {
            let last = animation.frames.len() - 1;
            if self.frame_index == last && !animation.looping {
                return;
            }
            if self.elapsed_in_frame_ms < animation.frames[self.frame_index].duration_ms {
                return;
            }
            self.frame_index = (self.frame_index + 1) % animation.frames.len();
            self.elapsed_in_frame_ms = 0;
        }
    }

    pub fn current_frame(&self) -> &str {
        match &self.active {
            Some(animation) => &animation.frames[self.frame_index].image,
            None => &self.static_image,
        }
    }

    /// Re-rolls the static image among the configured alternatives.
    pub fn pick_random_static<R: Rng>(&mut self, rng: &mut R) {
        if self.static_alternatives.is_empty() {
            return;
        }
        let index = rng.random_range(0..self.static_alternatives.len());
        self.static_image = self.static_alternatives[index].clone();
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn two_frame(looping: bool) -> Animation {
        Animation::new(looping).frame("a", 100).frame("b", 100)
    }

    fn advance_in_steps(driver: &mut AnimationDriver, total_ms: u64, step_ms: u64) -> Vec<String> {
        let mut seen = vec![driver.current_frame().to_string()];
        let mut elapsed = 0;
        while elapsed < total_ms {
            driver.advance(step_ms);
            elapsed += step_ms;
            if seen.last().map(String::as_str) != Some(driver.current_frame()) {
                seen.push(driver.current_frame().to_string());
            }
        }
        seen
    }

    #[test]
    fn static_driver_ignores_elapsed_time() {
        let mut driver = AnimationDriver::new("idle");
        driver.advance(10_000);
        assert_eq!(driver.current_frame(), "idle");
        assert!(!driver.is_animating());
    }

    #[test]
    fn looping_sequence_cycles_back_to_first_frame() {
        let mut driver = AnimationDriver::new("idle");
        driver.set_animation(two_frame(true));

        let seen = advance_in_steps(&mut driver, 250, 50);
        assert_eq!(seen, vec!["a", "b", "a"]);
        assert_eq!(driver.current_frame(), "a");
    }

    #[test]
    fn non_looping_sequence_freezes_on_last_frame() {
        let mut driver = AnimationDriver::new("idle");
        driver.set_animation(two_frame(false));

        let seen = advance_in_steps(&mut driver, 500, 25);
        assert_eq!(seen, vec!["a", "b"]);

        driver.advance(1_000_000);
        assert_eq!(driver.current_frame(), "b");
        assert_eq!(driver.frame_index(), 1);
    }

    #[test]
    fn single_frame_non_looping_sequence_never_moves() {
        let mut driver = AnimationDriver::new("idle");
        driver.set_animation(Animation::new(false).frame("only", 100));
        driver.advance(100);
        driver.advance(5_000);
        assert_eq!(driver.current_frame(), "only");
    }

    #[test]
    fn large_step_advances_one_frame_and_drops_remainder() {
        let mut driver = AnimationDriver::new("idle");
        driver.set_animation(
            Animation::new(true)
                .frame("a", 100)
                .frame("b", 100)
                .frame("c", 100),
        );
        driver.advance(250);
        assert_eq!(driver.current_frame(), "b");
        driver.advance(99);
        assert_eq!(driver.current_frame(), "b");
        driver.advance(1);
        assert_eq!(driver.current_frame(), "c");
    }

    #[test]
    fn zero_length_looping_frames_do_not_hang() {
        let mut driver = AnimationDriver::new("idle");
        driver.set_animation(Animation::new(true).frame("a", 0).frame("b", 0));
        driver.advance(16);
        assert_eq!(driver.current_frame(), "a");
    }

    #[test]
    fn set_animation_resets_playback() {
        let mut driver = AnimationDriver::new("idle");
        driver.set_animation(two_frame(true));
        driver.advance(150);
        assert_eq!(driver.current_frame(), "b");

        driver.set_animation(Animation::new(true).frame("x", 100).frame("y", 100));
        assert_eq!(driver.current_frame(), "x");
        driver.advance(99);
        assert_eq!(driver.current_frame(), "x");
    }

    #[test]
    fn clearing_returns_to_static_image() {
        let mut driver = AnimationDriver::new("idle");
        driver.set_animation(two_frame(true));
        driver.clear_animation();
        assert_eq!(driver.current_frame(), "idle");

        driver.set_animation(Animation::new(true));
        assert!(!driver.is_animating());
    }

    #[test]
    fn random_static_pick_uses_alternatives_only() {
        let mut driver = AnimationDriver::new("idle");
        let mut rng = StdRng::seed_from_u64(7);
        driver.pick_random_static(&mut rng);
        assert_eq!(driver.current_frame(), "idle");

        let alternatives = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        driver.set_static_alternatives(alternatives.clone());
        for _ in 0..20 {
            driver.pick_random_static(&mut rng);
            assert!(alternatives.iter().any(|name| name == driver.current_frame()));
        }
    }

    #[test]
    fn sequence_wins_over_random_static() {
        let mut driver = AnimationDriver::new("idle");
        driver.set_static_alternatives(vec!["alt".to_string()]);
        driver.set_animation(two_frame(true));
        driver.pick_random_static(&mut StdRng::seed_from_u64(1));
        assert_eq!(driver.current_frame(), "a");
        driver.clear_animation();
        assert_eq!(driver.current_frame(), "alt");
    }

    #[test]
    fn total_duration_sums_frames() {
        assert_eq!(two_frame(false).total_duration_ms(), 200);
        let parsed: Animation = serde_json::from_str(
            r#"{"frames":[{"image":"a","duration_ms":40},{"image":"b","duration_ms":60}]}"#,
        )
        .expect("animation");
        assert!(!parsed.looping);
        assert_eq!(parsed.total_duration_ms(), 100);
    }
}
