pub mod tuning;

use glam::Vec2;

use self::tuning::Tuning;

/// Logical widget size in pixels.
pub const PET_WIDTH: f32 = 160.0;
pub const PET_HEIGHT: f32 = 120.0;

/// Current behavior state. Exactly one active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetState {
    Idle,
    Walk,
    Sleep,
    Happy,
    Follow,
}

impl PetState {
    pub fn label(self) -> &'static str {
        match self {
            PetState::Idle => "Idle",
            PetState::Walk => "Walk",
            PetState::Sleep => "Sleep",
            PetState::Happy => "Happy",
            PetState::Follow => "Follow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Spans a primary press-to-release. Holds the offset from the pointer to
/// the window origin captured at press time.
#[derive(Debug, Clone, Copy)]
struct DragSession {
    offset: Vec2,
}

/// Screen geometry and cursor position supplied by the platform layer.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub screen_w: f32,
    pub screen_h: f32,
    /// Global cursor position in screen pixels.
    pub cursor: Vec2,
}

/// Something the app must carry out in response to a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetRequest {
    /// Open the context menu at the cursor.
    MenuRequested,
}

/// Immutable snapshot consumed by the scene builder.
#[derive(Debug, Clone, Copy)]
pub struct PetView {
    pub state: PetState,
    pub anim_time: f32,
    pub happy_remaining: f32,
    pub facing_right: bool,
    pub width: f32,
    pub height: f32,
}

/// The pet simulation: behavior state machine, motion integration, and
/// pointer interaction. Position is the window origin in screen pixels.
pub struct PetController {
    state: PetState,
    pos: Vec2,
    vel: Vec2,
    facing_right: bool,
    /// Seconds accumulator driving bob/squash/pupil oscillations.
    anim_time: f32,
    /// Milliseconds spent in the current Idle stretch.
    idle_elapsed: f32,
    /// Milliseconds since the last pointer interaction.
    since_interaction: f32,
    /// Milliseconds of happy reaction left. Nonzero only in Happy.
    happy_remaining: f32,
    drag: Option<DragSession>,
    tuning: Tuning,
}

impl PetController {
    pub fn new(pos: Vec2, tuning: Tuning) -> Self {
        Self {
            state: PetState::Idle,
            pos,
            vel: Vec2::ZERO,
            facing_right: true,
            anim_time: 0.0,
            idle_elapsed: 0.0,
            since_interaction: 0.0,
            happy_remaining: 0.0,
            drag: None,
            tuning,
        }
    }

    pub fn state(&self) -> PetState {
        self.state
    }

    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn view(&self) -> PetView {
        PetView {
            state: self.state,
            anim_time: self.anim_time,
            happy_remaining: self.happy_remaining,
            facing_right: self.facing_right,
            width: PET_WIDTH,
            height: PET_HEIGHT,
        }
    }

    /// Advance the simulation by one fixed tick.
    pub fn tick(&mut self, dt_ms: f32, ctx: &TickContext, rng: &mut fastrand::Rng) {
        let dt_s = dt_ms / 1000.0;

        // Breathing runs slow; everything else at full rate.
        self.anim_time += if self.state == PetState::Sleep {
            dt_s * self.tuning.sleep_anim_rate
        } else {
            dt_s
        };

        if self.state == PetState::Idle {
            self.idle_elapsed += dt_ms;
        }
        self.since_interaction += dt_ms;

        self.apply_transitions(ctx, rng);
        self.apply_motion(dt_s, ctx);

        // Vertical bound holds regardless of which state moved the pet.
        let max_y = ctx.screen_h - PET_HEIGHT - self.tuning.bottom_margin;
        self.pos.y = self.pos.y.clamp(0.0, max_y);
    }

    /// Tick-driven transitions, in priority order.
    fn apply_transitions(&mut self, ctx: &TickContext, rng: &mut fastrand::Rng) {
        let t = self.tuning;

        if self.state != PetState::Sleep && self.since_interaction > t.sleep_timeout_ms {
            self.transition_to(PetState::Sleep);
        } else if self.state == PetState::Sleep && self.since_interaction < t.sleep_timeout_ms {
            self.transition_to(PetState::Idle);
        }

        if self.state == PetState::Idle && rng.f32() < t.p_walk {
            self.facing_right = rng.bool();
            self.transition_to(PetState::Walk);
        }

        if self.state == PetState::Walk && rng.f32() < t.p_stop {
            self.transition_to(PetState::Idle);
        }

        if self.state == PetState::Follow {
            let target_x = ctx.cursor.x - PET_WIDTH * 0.5;
            if (target_x - self.pos.x).abs() < t.follow_settle_dist && rng.f32() < t.p_settle {
                self.transition_to(PetState::Idle);
            }
        }
    }

    /// Per-state motion for one tick.
    fn apply_motion(&mut self, dt_s: f32, ctx: &TickContext) {
        match self.state {
            PetState::Walk => {
                self.vel.x = if self.facing_right {
                    self.tuning.walk_speed
                } else {
                    -self.tuning.walk_speed
                };
                self.pos.x += self.vel.x * dt_s;

                // Bounce off screen edges, turning around.
                let right_limit = ctx.screen_w - PET_WIDTH;
                if self.pos.x < 0.0 {
                    self.pos.x = 0.0;
                    self.facing_right = true;
                }
                if self.pos.x > right_limit {
                    self.pos.x = right_limit;
                    self.facing_right = false;
                }
            }
            PetState::Follow => {
                // Exponential smoothing toward the cursor, per tick.
                let target_x = ctx.cursor.x - PET_WIDTH * 0.5;
                self.pos.x += (target_x - self.pos.x) * self.tuning.follow_smoothing;
            }
            PetState::Happy => {
                if self.happy_remaining > 0.0 {
                    self.pos.y -= self.tuning.happy_rise_speed * dt_s;
                    self.happy_remaining =
                        (self.happy_remaining - dt_s * 1000.0).max(0.0);
                }
            }
            PetState::Idle | PetState::Sleep => {}
        }
    }

    /// Switch state, running exit/enter hooks. No-op when already there.
    pub fn transition_to(&mut self, next: PetState) {
        if next == self.state {
            return;
        }
        let prev = self.state;
        self.on_exit(prev);
        self.state = next;
        self.on_enter(next);
        log::debug!("pet: {} -> {}", prev.label(), next.label());
    }

    fn on_exit(&mut self, prev: PetState) {
        match prev {
            // happy_remaining must not outlive the state.
            PetState::Happy => self.happy_remaining = 0.0,
            PetState::Idle => {
                log::trace!("pet: idled {:.0}ms", self.idle_elapsed);
            }
            _ => {}
        }
    }

    fn on_enter(&mut self, next: PetState) {
        match next {
            PetState::Happy => {
                self.happy_remaining = self.tuning.happy_enter_ms;
                self.since_interaction = 0.0;
            }
            PetState::Idle => {
                self.vel = Vec2::ZERO;
                self.idle_elapsed = 0.0;
            }
            _ => {}
        }
    }

    /// User-commanded transition from the context menu. Counts as an
    /// interaction; a commanded Sleep pushes the interaction clock past the
    /// timeout so the wake rule does not undo it on the next tick.
    pub fn set_behavior(&mut self, state: PetState) {
        self.since_interaction = if state == PetState::Sleep {
            self.tuning.sleep_timeout_ms
        } else {
            0.0
        };
        self.transition_to(state);
    }

    // ---------------------------------------------------------------------
    // Pointer interaction
    // ---------------------------------------------------------------------

    /// Any press wakes the pet. Primary begins a drag session; secondary
    /// asks the app to open the context menu.
    pub fn pointer_pressed(&mut self, button: PointerButton, global: Vec2) -> Option<PetRequest> {
        self.since_interaction = 0.0;
        match button {
            PointerButton::Primary => {
                self.drag = Some(DragSession {
                    offset: global - self.pos,
                });
                None
            }
            PointerButton::Secondary => Some(PetRequest::MenuRequested),
        }
    }

    /// While a drag is active the window follows the pointer directly and
    /// any running behavior is interrupted.
    pub fn pointer_moved(&mut self, global: Vec2) {
        if let Some(drag) = self.drag {
            self.pos = global - drag.offset;
            self.since_interaction = 0.0;
            self.transition_to(PetState::Idle);
        }
    }

    /// End the drag session. A release shortly after the last interaction
    /// had no real drag in it, so it counts as petting.
    pub fn pointer_released(&mut self, button: PointerButton) {
        if button != PointerButton::Primary {
            return;
        }
        if self.drag.take().is_some() && self.since_interaction < self.tuning.tap_window_ms {
            self.react_to_pet();
        }
    }

    fn react_to_pet(&mut self) {
        self.transition_to(PetState::Happy);
        // A pet grants its own (shorter) duration, restarting the timer on
        // rapid repeated taps, plus a little hop.
        self.happy_remaining = self.tuning.happy_pet_ms;
        self.pos.y -= self.tuning.pet_impulse;
        self.since_interaction = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN_W: f32 = 1920.0;
    const SCREEN_H: f32 = 1080.0;
    const TICK_MS: f32 = 30.0;

    fn ctx(cursor_x: f32) -> TickContext {
        TickContext {
            screen_w: SCREEN_W,
            screen_h: SCREEN_H,
            cursor: Vec2::new(cursor_x, 500.0),
        }
    }

    /// Tuning with every random transition disabled.
    fn quiet() -> Tuning {
        Tuning {
            p_walk: 0.0,
            p_stop: 0.0,
            p_settle: 0.0,
            ..Tuning::default()
        }
    }

    fn pet_at(x: f32, y: f32, tuning: Tuning) -> PetController {
        PetController::new(Vec2::new(x, y), tuning)
    }

    #[test]
    fn vertical_position_stays_in_bounds() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut pet = pet_at(300.0, 300.0, quiet());
        let c = ctx(900.0);

        // Drag the pet far below the screen, then release after the tap
        // window so no happy hop fires.
        let _ = pet.pointer_pressed(PointerButton::Primary, pet.position());
        pet.pointer_moved(Vec2::new(300.0, 5000.0));
        for _ in 0..25 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        pet.pointer_released(PointerButton::Primary);

        let max_y = SCREEN_H - PET_HEIGHT - quiet().bottom_margin;
        assert_eq!(pet.position().y, max_y);

        for _ in 0..200 {
            pet.tick(TICK_MS, &c, &mut rng);
            assert!(pet.position().y >= 0.0 && pet.position().y <= max_y);
        }
    }

    #[test]
    fn walk_stays_in_horizontal_bounds() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut pet = pet_at(SCREEN_W / 2.0, 900.0, quiet());
        let c = ctx(0.0);
        pet.set_behavior(PetState::Walk);

        // Long enough to cross the screen several times. Re-command Walk
        // periodically so the sleep timeout never pauses the march.
        for i in 0..20_000 {
            if i % 500 == 0 {
                pet.set_behavior(PetState::Walk);
            }
            pet.tick(TICK_MS, &c, &mut rng);
            let x = pet.position().x;
            assert!((0.0..=SCREEN_W - PET_WIDTH).contains(&x), "x out of bounds: {x}");
        }
    }

    #[test]
    fn walk_clamps_at_right_edge_and_turns_around() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut pet = pet_at(SCREEN_W - PET_WIDTH - 1.0, 900.0, quiet());
        let c = ctx(0.0);
        pet.set_behavior(PetState::Walk);

        // facing starts right; 80 px/s for 30 ms overshoots the 1 px gap.
        pet.tick(TICK_MS, &c, &mut rng);
        assert_eq!(pet.position().x, SCREEN_W - PET_WIDTH);

        // Now facing left: x decreases on following ticks.
        let before = pet.position().x;
        pet.tick(TICK_MS, &c, &mut rng);
        assert!(pet.position().x < before);
    }

    #[test]
    fn sleeps_after_timeout_and_wakes_on_interaction() {
        let mut rng = fastrand::Rng::with_seed(5);
        let mut pet = pet_at(300.0, 300.0, quiet());
        let c = ctx(0.0);

        // 600 ticks = exactly 18000 ms: not yet past the threshold.
        for _ in 0..600 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        assert_eq!(pet.state(), PetState::Idle);

        pet.tick(TICK_MS, &c, &mut rng);
        assert_eq!(pet.state(), PetState::Sleep);

        // Any press resets the clock; the next tick wakes the pet.
        let _ = pet.pointer_pressed(PointerButton::Secondary, pet.position());
        pet.tick(TICK_MS, &c, &mut rng);
        assert_eq!(pet.state(), PetState::Idle);
    }

    #[test]
    fn sleep_transition_fires_once_clock_passes_threshold() {
        let mut rng = fastrand::Rng::with_seed(5);
        let mut pet = pet_at(300.0, 300.0, quiet());
        let c = ctx(0.0);

        // Bring since_interaction to exactly 18010 ms.
        for _ in 0..600 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        pet.tick(10.0, &c, &mut rng);
        assert_eq!(pet.state(), PetState::Sleep);
    }

    #[test]
    fn quick_tap_registers_as_petting() {
        let mut rng = fastrand::Rng::with_seed(9);
        let mut pet = pet_at(300.0, 300.0, quiet());
        let c = ctx(0.0);
        let y_before = pet.position().y;

        let _ = pet.pointer_pressed(PointerButton::Primary, pet.position());
        for _ in 0..3 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        pet.pointer_released(PointerButton::Primary);

        assert_eq!(pet.state(), PetState::Happy);
        let v = pet.view();
        assert_eq!(v.happy_remaining, 2200.0);
        // One-time hop.
        assert_eq!(pet.position().y, y_before - 8.0);
    }

    #[test]
    fn slow_drag_does_not_register_as_petting() {
        let mut rng = fastrand::Rng::with_seed(13);
        let mut pet = pet_at(300.0, 300.0, quiet());
        let c = ctx(0.0);

        let _ = pet.pointer_pressed(PointerButton::Primary, pet.position());
        pet.pointer_moved(Vec2::new(700.0, 300.0));
        // Hold still past the tap window before letting go.
        for _ in 0..20 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        pet.pointer_released(PointerButton::Primary);

        assert_eq!(pet.state(), PetState::Idle);
        assert_eq!(pet.view().happy_remaining, 0.0);
    }

    #[test]
    fn happy_decays_to_zero_and_rise_stops() {
        let mut rng = fastrand::Rng::with_seed(17);
        let mut pet = pet_at(300.0, 600.0, quiet());
        let c = ctx(0.0);

        let _ = pet.pointer_pressed(PointerButton::Primary, pet.position());
        pet.pointer_released(PointerButton::Primary);
        assert_eq!(pet.state(), PetState::Happy);

        let mut prev = pet.view().happy_remaining;
        while pet.view().happy_remaining > 0.0 {
            pet.tick(TICK_MS, &c, &mut rng);
            let now = pet.view().happy_remaining;
            assert!(now <= prev, "happy_remaining increased");
            prev = now;
        }

        // Still Happy, but no further rise.
        assert_eq!(pet.state(), PetState::Happy);
        let y = pet.position().y;
        for _ in 0..50 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        assert_eq!(pet.position().y, y);
    }

    #[test]
    fn repeated_taps_restart_the_happy_timer() {
        let mut rng = fastrand::Rng::with_seed(19);
        let mut pet = pet_at(300.0, 600.0, quiet());
        let c = ctx(0.0);

        let _ = pet.pointer_pressed(PointerButton::Primary, pet.position());
        pet.pointer_released(PointerButton::Primary);
        for _ in 0..30 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        assert!(pet.view().happy_remaining < 2200.0);

        let _ = pet.pointer_pressed(PointerButton::Primary, pet.position());
        pet.pointer_released(PointerButton::Primary);
        assert_eq!(pet.view().happy_remaining, 2200.0);
    }

    #[test]
    fn follow_moves_by_fraction_of_remaining_distance() {
        let mut rng = fastrand::Rng::with_seed(23);
        let mut pet = pet_at(100.0, 900.0, quiet());
        let c = ctx(1000.0);
        pet.set_behavior(PetState::Follow);

        let target_x = 1000.0 - PET_WIDTH / 2.0;
        let x0 = pet.position().x;
        pet.tick(TICK_MS, &c, &mut rng);
        let expected = x0 + 0.22 * (target_x - x0);
        assert!((pet.position().x - expected).abs() < 1e-3);

        for _ in 0..300 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        assert!((pet.position().x - target_x).abs() < 0.5);
    }

    #[test]
    fn follow_settles_near_cursor_when_allowed() {
        let mut rng = fastrand::Rng::with_seed(29);
        let tuning = Tuning {
            p_walk: 0.0,
            p_stop: 0.0,
            p_settle: 1.0,
            ..Tuning::default()
        };
        let mut pet = pet_at(100.0, 900.0, tuning);
        let c = ctx(1000.0);
        pet.set_behavior(PetState::Follow);

        for _ in 0..300 {
            pet.tick(TICK_MS, &c, &mut rng);
            if pet.state() == PetState::Idle {
                break;
            }
        }
        assert_eq!(pet.state(), PetState::Idle);
        // Settling only happens inside the settle distance.
        let target_x = 1000.0 - PET_WIDTH / 2.0;
        assert!((pet.position().x - target_x).abs() < 6.0);
    }

    #[test]
    fn drag_interrupts_happy_and_clears_its_timer() {
        let mut rng = fastrand::Rng::with_seed(31);
        let mut pet = pet_at(300.0, 600.0, quiet());
        let c = ctx(0.0);

        let _ = pet.pointer_pressed(PointerButton::Primary, pet.position());
        pet.pointer_released(PointerButton::Primary);
        assert_eq!(pet.state(), PetState::Happy);
        pet.tick(TICK_MS, &c, &mut rng);
        assert!(pet.view().happy_remaining > 0.0);

        let _ = pet.pointer_pressed(PointerButton::Primary, pet.position());
        pet.pointer_moved(Vec2::new(800.0, 400.0));
        assert_eq!(pet.state(), PetState::Idle);
        assert_eq!(pet.view().happy_remaining, 0.0);
        assert_eq!(pet.position(), Vec2::new(800.0, 400.0));
    }

    #[test]
    fn drag_offset_keeps_grab_point_under_pointer() {
        let mut pet = pet_at(300.0, 300.0, quiet());

        // Grab 40,20 into the widget.
        let _ = pet.pointer_pressed(PointerButton::Primary, Vec2::new(340.0, 320.0));
        pet.pointer_moved(Vec2::new(1040.0, 620.0));
        assert_eq!(pet.position(), Vec2::new(1000.0, 600.0));
    }

    #[test]
    fn secondary_press_requests_the_menu() {
        let mut pet = pet_at(300.0, 300.0, quiet());
        let req = pet.pointer_pressed(PointerButton::Secondary, pet.position());
        assert_eq!(req, Some(PetRequest::MenuRequested));
        assert!(!pet.dragging());
    }

    #[test]
    fn commanded_sleep_sticks() {
        let mut rng = fastrand::Rng::with_seed(37);
        let mut pet = pet_at(300.0, 300.0, quiet());
        let c = ctx(0.0);

        pet.set_behavior(PetState::Sleep);
        for _ in 0..100 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        assert_eq!(pet.state(), PetState::Sleep);
    }

    #[test]
    fn commanded_follow_counts_as_interaction() {
        let mut rng = fastrand::Rng::with_seed(41);
        let mut pet = pet_at(300.0, 300.0, quiet());
        let c = ctx(600.0);

        // Almost asleep...
        for _ in 0..599 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        pet.set_behavior(PetState::Follow);
        // ...but the command reset the clock, so no sleep for a while.
        for _ in 0..100 {
            pet.tick(TICK_MS, &c, &mut rng);
        }
        assert_eq!(pet.state(), PetState::Follow);
    }

    #[test]
    fn idle_enters_walk_with_random_facing() {
        let mut rng = fastrand::Rng::with_seed(43);
        let tuning = Tuning {
            p_walk: 1.0,
            p_stop: 0.0,
            p_settle: 0.0,
            ..Tuning::default()
        };
        let mut pet = pet_at(900.0, 900.0, tuning);
        let c = ctx(0.0);

        pet.tick(TICK_MS, &c, &mut rng);
        assert_eq!(pet.state(), PetState::Walk);
    }
}
