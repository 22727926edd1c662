//! Frame-based animation state machine shared by every entity kind.
//!
//! An [`Animator`] runs a looping animation (`IDLE_LOOP`) and can be
//! pre-empted by a one-shot custom animation (`CUSTOM_ONE_SHOT`). Rather
//! than invoking callbacks, [`Animator::update`] returns an
//! [`AnimationSignal`] that the owning entity reacts to.

use serde::{Deserialize, Serialize};

/// Looping animation: advances `frame = (frame + 1) % max_frames` every `speed` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopAnimation {
    pub frame: u32,
    pub timer: f32,
    pub speed: f32,
    pub max_frames: u32,
    pub enabled: bool,
}

impl LoopAnimation {
    pub fn new(max_frames: u32, speed: f32) -> Self {
        Self {
            frame: 0,
            timer: 0.0,
            speed,
            max_frames,
            enabled: max_frames > 1,
        }
    }

    /// A single static frame that never advances.
    pub fn still() -> Self {
        Self {
            frame: 0,
            timer: 0.0,
            speed: 0.0,
            max_frames: 1,
            enabled: false,
        }
    }
}

/// One-shot (or looping) run through `frame_count` frames starting at `start_frame`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAnimation<T> {
    pub frame_count: u32,
    pub frame_speed: f32,
    pub start_frame: u32,
    pub looping: bool,
    pub current_frame: u32,
    pub timer: f32,
    pub on_complete: Option<T>,
}

impl<T> CustomAnimation<T> {
    pub fn once(start_frame: u32, frame_count: u32, frame_speed: f32, on_complete: T) -> Self {
        Self {
            frame_count,
            frame_speed,
            start_frame,
            looping: false,
            current_frame: start_frame,
            timer: 0.0,
            on_complete: Some(on_complete),
        }
    }

    pub fn looping(start_frame: u32, frame_count: u32, frame_speed: f32) -> Self {
        Self {
            frame_count,
            frame_speed,
            start_frame,
            looping: true,
            current_frame: start_frame,
            timer: 0.0,
            on_complete: None,
        }
    }

    fn last_frame(&self) -> u32 {
        self.start_frame + self.frame_count.saturating_sub(1)
    }
}

/// What happened during an [`Animator::update`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationSignal<T> {
    /// The looping animation wrapped back to frame 0.
    Looped,
    /// A non-looping custom animation finished; carries its completion payload.
    Completed(T),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animator<T> {
    pub idle: LoopAnimation,
    custom: Option<CustomAnimation<T>>,
}

impl<T> Animator<T> {
    pub fn new(idle: LoopAnimation) -> Self {
        Self { idle, custom: None }
    }

    pub fn still() -> Self {
        Self::new(LoopAnimation::still())
    }

    pub fn is_playing_custom(&self) -> bool {
        self.custom.is_some()
    }

    /// Start a custom animation, replacing any that is already playing.
    pub fn play_custom(&mut self, animation: CustomAnimation<T>) {
        self.custom = Some(animation);
    }

    pub fn stop_custom(&mut self) {
        self.custom = None;
    }

    /// Frame to display: the custom animation's frame while one is playing.
    pub fn frame(&self) -> u32 {
        match &self.custom {
            Some(custom) => custom.current_frame,
            None => self.idle.frame,
        }
    }

    /// Reset the looping animation to frame 0 with a new frame count and speed.
    pub fn restart_idle(&mut self, max_frames: u32, speed: f32) {
        self.idle = LoopAnimation::new(max_frames, speed);
    }

    pub fn update(&mut self, dt: f32) -> Option<AnimationSignal<T>> {
        if self.custom.is_some() {
            return self.update_custom(dt);
        }
        self.update_idle(dt)
    }

    fn update_custom(&mut self, dt: f32) -> Option<AnimationSignal<T>> {
        let custom = self.custom.as_mut()?;
        custom.timer += dt;
        if custom.timer < custom.frame_speed {
            return None;
        }
        custom.timer = 0.0;

        if custom.current_frame < custom.last_frame() {
            custom.current_frame += 1;
            return None;
        }

        if custom.looping {
            custom.current_frame = custom.start_frame;
            return None;
        }

        // Taking the animation out guarantees the payload is delivered once.
        let finished = self.custom.take()?;
        finished.on_complete.map(AnimationSignal::Completed)
    }

    fn update_idle(&mut self, dt: f32) -> Option<AnimationSignal<T>> {
        let idle = &mut self.idle;
        if !idle.enabled || idle.max_frames == 0 {
            return None;
        }
        idle.timer += dt;
        if idle.timer < idle.speed {
            return None;
        }
        idle.timer = 0.0;
        idle.frame = (idle.frame + 1) % idle.max_frames;
        (idle.frame == 0).then_some(AnimationSignal::Looped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_advances_and_signals_wrap() {
        let mut anim: Animator<()> = Animator::new(LoopAnimation::new(3, 0.1));
        assert_eq!(anim.update(0.1), None);
        assert_eq!(anim.frame(), 1);
        assert_eq!(anim.update(0.1), None);
        assert_eq!(anim.frame(), 2);
        assert_eq!(anim.update(0.1), Some(AnimationSignal::Looped));
        assert_eq!(anim.frame(), 0);
    }

    #[test]
    fn loop_waits_for_speed() {
        let mut anim: Animator<()> = Animator::new(LoopAnimation::new(4, 0.5));
        anim.update(0.2);
        anim.update(0.2);
        assert_eq!(anim.frame(), 0);
        anim.update(0.2);
        assert_eq!(anim.frame(), 1);
    }

    #[test]
    fn disabled_loop_never_moves() {
        let mut anim: Animator<()> = Animator::still();
        for _ in 0..10 {
            assert_eq!(anim.update(1.0), None);
        }
        assert_eq!(anim.frame(), 0);
    }

    #[test]
    fn custom_preempts_loop_and_completes_once() {
        let mut anim = Animator::new(LoopAnimation::new(4, 0.1));
        anim.play_custom(CustomAnimation::once(10, 3, 0.1, "done"));
        assert!(anim.is_playing_custom());
        assert_eq!(anim.frame(), 10);

        assert_eq!(anim.update(0.1), None);
        assert_eq!(anim.frame(), 11);
        assert_eq!(anim.update(0.1), None);
        assert_eq!(anim.frame(), 12);
        assert_eq!(anim.update(0.1), Some(AnimationSignal::Completed("done")));
        assert!(!anim.is_playing_custom());

        // Back on the loop animation; no repeat completion.
        for _ in 0..8 {
            assert!(!matches!(
                anim.update(0.1),
                Some(AnimationSignal::Completed(_))
            ));
        }
    }

    #[test]
    fn looping_custom_returns_to_start() {
        let mut anim: Animator<()> = Animator::new(LoopAnimation::still());
        anim.play_custom(CustomAnimation::looping(5, 2, 0.1));
        anim.update(0.1);
        assert_eq!(anim.frame(), 6);
        anim.update(0.1);
        assert_eq!(anim.frame(), 5);
        assert!(anim.is_playing_custom());
    }

    #[test]
    fn starting_custom_replaces_current() {
        let mut anim = Animator::new(LoopAnimation::still());
        anim.play_custom(CustomAnimation::once(0, 5, 0.1, 1));
        anim.update(0.1);
        anim.play_custom(CustomAnimation::once(20, 1, 0.1, 2));
        assert_eq!(anim.frame(), 20);
        assert_eq!(anim.update(0.1), Some(AnimationSignal::Completed(2)));
        assert!(!anim.is_playing_custom());
    }

    #[test]
    fn restart_idle_resets_frame() {
        let mut anim: Animator<()> = Animator::new(LoopAnimation::new(4, 0.1));
        anim.update(0.1);
        anim.update(0.1);
        anim.restart_idle(2, 0.3);
        assert_eq!(anim.frame(), 0);
        assert!(anim.idle.enabled);
        assert_eq!(anim.idle.max_frames, 2);
    }
}
