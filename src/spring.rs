//! Damped spring integrator and pointer chaser.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest integration step; longer frames are split into sub-steps.
const MAX_STEP_SECS: f64 = 1.0 / 240.0;

/// Physical constants of a spring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringParams {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            stiffness: 300.0,
            damping: 30.0,
            mass: 1.0,
        }
    }
}

/// A value pulled toward a target by a damped spring.
#[derive(Clone, Debug)]
pub struct Spring {
    value: f64,
    velocity: f64,
    target: f64,
    params: SpringParams,
    rest_epsilon: f64,
}

impl Spring {
    /// Create a spring resting at `value`.
    pub fn new(value: f64, params: SpringParams, rest_epsilon: f64) -> Self {
        Self {
            value,
            velocity: 0.0,
            target: value,
            params,
            rest_epsilon,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    #[cfg(test)]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Move the anchor; the value follows on subsequent steps.
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Advance the simulation by `dt`.
    ///
    /// Returns `true` once the spring is at rest; the value is then exactly the
    /// target.
    pub fn step(&mut self, dt: Duration) -> bool {
        if self.is_at_rest() {
            self.value = self.target;
            self.velocity = 0.0;
            return true;
        }

        let mut remaining = dt.as_secs_f64();
        let mass = self.params.mass.max(f64::EPSILON);
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP_SECS);
            let displacement = self.value - self.target;
            let force = -self.params.stiffness * displacement - self.params.damping * self.velocity;
            // semi-implicit Euler: velocity first, then position with the new velocity
            self.velocity += force / mass * h;
            self.value += self.velocity * h;
            remaining -= h;
        }

        if self.is_at_rest() {
            self.value = self.target;
            self.velocity = 0.0;
            true
        } else {
            false
        }
    }

    /// Both speed and distance to target are below the rest threshold.
    pub fn is_at_rest(&self) -> bool {
        self.velocity.abs() < self.rest_epsilon
            && (self.value - self.target).abs() < self.rest_epsilon
    }
}

/// Exponential smoothing toward a moving point, one step per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Chaser {
    pub x: f64,
    pub y: f64,
    strength: f64,
}

impl Chaser {
    pub fn new(x: f64, y: f64, strength: f64) -> Self {
        Self {
            x,
            y,
            strength: strength.clamp(0.0, 1.0),
        }
    }

    /// Close `strength` of the remaining gap to `(tx, ty)`.
    pub fn step_toward(&mut self, tx: f64, ty: f64) {
        self.x += (tx - self.x) * self.strength;
        self.y += (ty - self.y) * self.strength;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Duration {
        Duration::from_millis(16)
    }

    #[test]
    fn settles_exactly_on_target() {
        let mut s = Spring::new(0.0, SpringParams::default(), 0.01);
        s.set_target(-120.0);

        let mut frames = 0;
        while !s.step(frame()) {
            frames += 1;
            assert!(frames < 1_000, "spring never settled");
        }
        assert_eq!(s.value(), -120.0);
        assert_eq!(s.velocity(), 0.0);
    }

    #[test]
    fn moves_toward_target_on_first_step() {
        let mut s = Spring::new(0.0, SpringParams::default(), 0.01);
        s.set_target(100.0);
        s.step(frame());
        assert!(s.value() > 0.0);
        assert!(s.velocity() > 0.0);
    }

    #[test]
    fn large_frame_gap_stays_stable() {
        let mut s = Spring::new(0.0, SpringParams::default(), 0.01);
        s.set_target(60.0);
        s.step(Duration::from_secs(2));
        assert!(s.value().is_finite());
        assert!((s.value() - 60.0).abs() < 1.0);
    }

    #[test]
    fn chaser_closes_fixed_fraction_of_gap() {
        let mut c = Chaser::new(0.0, 0.0, 0.15);
        c.step_toward(100.0, -20.0);
        assert!((c.x - 15.0).abs() < 1e-9);
        assert!((c.y + 3.0).abs() < 1e-9);
    }
}
