//! Builds the pet's shape list from a controller snapshot.
//!
//! Pure function of the view: no controller mutation, no GPU types beyond
//! the instance structs. Shapes are emitted back-to-front in widget-local
//! pixels.

use crate::pet::{PetState, PetView};
use crate::render::instance::{
    rgba, ShapeInstance, KIND_ARC, KIND_ELLIPSE, KIND_GLYPH_YAY, KIND_GLYPH_Z, KIND_ROUNDED_RECT,
};

const BODY_BLUE: u32 = rgba(110, 200, 255, 255);
const BODY_HAPPY: u32 = rgba(140, 240, 160, 255);
const BODY_SLEEP: u32 = rgba(80, 100, 140, 255);
const BODY_OUTLINE: u32 = rgba(20, 20, 30, 200);
const SHADOW: u32 = rgba(0, 0, 0, 60);
const EYE_WHITE: u32 = rgba(255, 255, 255, 255);
const PUPIL: u32 = rgba(30, 30, 40, 255);
const MOUTH: u32 = rgba(30, 30, 40, 255);
const BLUSH: u32 = rgba(255, 160, 160, 160);
const SLEEP_Z: u32 = rgba(200, 230, 255, 255);
const BUBBLE: u32 = rgba(255, 255, 240, 230);
const BUBBLE_TEXT: u32 = rgba(20, 20, 30, 255);

fn ellipse(center: [f32; 2], half: [f32; 2], color: u32) -> ShapeInstance {
    ShapeInstance {
        center,
        half_size: half,
        color,
        kind: KIND_ELLIPSE,
        param: 0.0,
    }
}

/// Append the pet's shapes for this frame to `out`.
pub fn build_scene(view: &PetView, out: &mut Vec<ShapeInstance>) {
    let w = view.width;
    let h = view.height;
    let t = view.anim_time;

    let bob = (t * 2.0).sin() * 4.0;
    let squash = if view.state == PetState::Walk {
        0.94 + 0.06 * (t * 6.0).sin()
    } else {
        1.0
    };

    let body_color = match view.state {
        PetState::Happy => BODY_HAPPY,
        PetState::Sleep => BODY_SLEEP,
        _ => BODY_BLUE,
    };

    // Mirror asymmetric features when the pet faces left.
    let mx = |x: f32| if view.facing_right { x } else { w - x };

    // Ground shadow, unaffected by the bob.
    out.push(ellipse([w * 0.5, h - 6.0], [w * 0.375, 6.0], SHADOW));

    // Body: outline ellipse behind the fill.
    let body_w = w * 0.88;
    let body_h = h * 0.75 * squash;
    let body_left = w * 0.06;
    let body_top = h * 0.05 + bob;
    let body_right = body_left + body_w;
    let body_center = [w * 0.5, body_top + body_h * 0.5];
    out.push(ellipse(
        body_center,
        [body_w * 0.5 + 2.0, body_h * 0.5 + 2.0],
        BODY_OUTLINE,
    ));
    out.push(ellipse(body_center, [body_w * 0.5, body_h * 0.5], body_color));

    if view.state == PetState::Happy {
        out.push(ellipse([body_left + 22.0, body_top + 28.0], [12.0, 8.0], BLUSH));
        out.push(ellipse([body_right - 22.0, body_top + 28.0], [12.0, 8.0], BLUSH));
    }

    // Eyes and pupils.
    let eye_y = body_top + body_h * 0.35 + 5.0;
    let eye_left_x = body_left + body_w * 0.28 + 7.0;
    let eye_right_x = body_left + body_w * 0.62 + 7.0;
    out.push(ellipse([eye_left_x, eye_y], [7.0, 5.0], EYE_WHITE));
    out.push(ellipse([eye_right_x, eye_y], [7.0, 5.0], EYE_WHITE));

    // Pupils track sideways while following the cursor.
    let pupil_shift = if view.state == PetState::Follow {
        let s = (t * 4.0).sin() * 2.0;
        if view.facing_right {
            s
        } else {
            -s
        }
    } else {
        0.0
    };
    out.push(ellipse([eye_left_x + pupil_shift, eye_y], [3.0, 3.0], PUPIL));
    out.push(ellipse([eye_right_x + pupil_shift, eye_y], [3.0, 3.0], PUPIL));

    if view.state == PetState::Sleep {
        // Z's drifting up from the pet's head.
        for (dx, dy) in [(30.0, 10.0), (44.0, 2.0), (58.0, -6.0)] {
            out.push(ShapeInstance {
                center: [mx(body_right - dx), body_top + dy],
                half_size: [7.0, 7.0],
                color: SLEEP_Z,
                kind: KIND_GLYPH_Z,
                param: 2.0,
            });
        }
    } else {
        // Mouth arc below the eyes.
        let mouth_y = body_top + body_h * 0.58;
        out.push(ShapeInstance {
            center: [w * 0.5, mouth_y + 5.0],
            half_size: [8.0, 5.0],
            color: MOUTH,
            kind: KIND_ARC,
            param: 2.0,
        });
    }

    // Speech bubble while the happy reaction runs.
    if view.state == PetState::Happy && view.happy_remaining > 0.0 {
        out.push(ShapeInstance {
            center: [mx(47.0), 13.0],
            half_size: [39.0, 11.0],
            color: BUBBLE,
            kind: KIND_ROUNDED_RECT,
            param: 8.0,
        });
        out.push(ShapeInstance {
            center: [mx(47.0), 13.0],
            half_size: [26.0, 7.0],
            color: BUBBLE_TEXT,
            kind: KIND_GLYPH_YAY,
            param: 2.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::{PET_HEIGHT, PET_WIDTH};

    fn view(state: PetState) -> PetView {
        PetView {
            state,
            anim_time: 0.0,
            happy_remaining: if state == PetState::Happy { 1000.0 } else { 0.0 },
            facing_right: true,
            width: PET_WIDTH,
            height: PET_HEIGHT,
        }
    }

    fn scene(v: &PetView) -> Vec<ShapeInstance> {
        let mut out = Vec::new();
        build_scene(v, &mut out);
        out
    }

    /// Shadow, outline, fill lead the list; index 2 is the body fill.
    #[test]
    fn body_color_is_keyed_by_state() {
        assert_eq!(scene(&view(PetState::Idle))[2].color, BODY_BLUE);
        assert_eq!(scene(&view(PetState::Walk))[2].color, BODY_BLUE);
        assert_eq!(scene(&view(PetState::Follow))[2].color, BODY_BLUE);
        assert_eq!(scene(&view(PetState::Happy))[2].color, BODY_HAPPY);
        assert_eq!(scene(&view(PetState::Sleep))[2].color, BODY_SLEEP);
    }

    #[test]
    fn happy_adds_blush_and_bubble() {
        let happy = scene(&view(PetState::Happy));
        assert_eq!(happy.iter().filter(|s| s.color == BLUSH).count(), 2);
        assert_eq!(happy.iter().filter(|s| s.kind == KIND_ROUNDED_RECT).count(), 1);
        assert_eq!(happy.iter().filter(|s| s.kind == KIND_GLYPH_YAY).count(), 1);

        let idle = scene(&view(PetState::Idle));
        assert!(idle.iter().all(|s| s.color != BLUSH));
        assert!(idle.iter().all(|s| s.kind != KIND_ROUNDED_RECT));
    }

    #[test]
    fn bubble_disappears_when_happy_timer_runs_out() {
        let mut v = view(PetState::Happy);
        v.happy_remaining = 0.0;
        let shapes = scene(&v);
        // Blush stays with the state; the bubble follows the timer.
        assert_eq!(shapes.iter().filter(|s| s.color == BLUSH).count(), 2);
        assert!(shapes.iter().all(|s| s.kind != KIND_ROUNDED_RECT));
    }

    #[test]
    fn sleep_swaps_mouth_for_z_glyphs() {
        let sleep = scene(&view(PetState::Sleep));
        assert_eq!(sleep.iter().filter(|s| s.kind == KIND_GLYPH_Z).count(), 3);
        assert!(sleep.iter().all(|s| s.kind != KIND_ARC));

        let idle = scene(&view(PetState::Idle));
        assert_eq!(idle.iter().filter(|s| s.kind == KIND_ARC).count(), 1);
        assert!(idle.iter().all(|s| s.kind != KIND_GLYPH_Z));
    }

    #[test]
    fn pupils_oscillate_only_while_following() {
        let pupil_xs = |state: PetState, t: f32| -> Vec<f32> {
            let mut v = view(state);
            v.anim_time = t;
            scene(&v)
                .iter()
                .filter(|s| s.color == PUPIL)
                .map(|s| s.center[0])
                .collect()
        };

        assert_ne!(pupil_xs(PetState::Follow, 0.0), pupil_xs(PetState::Follow, 0.4));
        assert_eq!(pupil_xs(PetState::Idle, 0.0), pupil_xs(PetState::Idle, 0.4));
    }

    #[test]
    fn facing_left_mirrors_the_z_glyphs() {
        let mut v = view(PetState::Sleep);
        let right: Vec<f32> = scene(&v)
            .iter()
            .filter(|s| s.kind == KIND_GLYPH_Z)
            .map(|s| s.center[0])
            .collect();
        v.facing_right = false;
        let left: Vec<f32> = scene(&v)
            .iter()
            .filter(|s| s.kind == KIND_GLYPH_Z)
            .map(|s| s.center[0])
            .collect();
        for (r, l) in right.iter().zip(&left) {
            assert!((r + l - PET_WIDTH).abs() < 1e-3);
        }
    }
}
