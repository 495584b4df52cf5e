use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tankduel::{Buttons, Tank, TankInput};

const HEADINGS: [Buttons; 8] = [
    Buttons::UP,
    Buttons::DOWN,
    Buttons::LEFT,
    Buttons::RIGHT,
    Buttons::UP.union(Buttons::LEFT),
    Buttons::UP.union(Buttons::RIGHT),
    Buttons::DOWN.union(Buttons::LEFT),
    Buttons::DOWN.union(Buttons::RIGHT),
];

/// Stand-in for a human at the keyboard: wanders, keeps the turret on the
/// opponent and fires when it can.
pub struct Autopilot {
    rng: StdRng,
    heading: Buttons,
    hold_ticks: u32,
    fire_chance: f64,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            heading: Buttons::empty(),
            hold_ticks: 0,
            fire_chance: 0.08,
        }
    }

    pub fn next_input(&mut self, own: &Tank, opponent: &Tank) -> TankInput {
        if self.hold_ticks == 0 {
            self.heading = if self.rng.gen_bool(0.2) {
                Buttons::empty()
            } else {
                HEADINGS[self.rng.gen_range(0..HEADINGS.len())]
            };
            self.hold_ticks = self.rng.gen_range(30..90);
        }
        self.hold_ticks -= 1;

        let mut buttons = self.heading;
        if own.can_fire() && self.rng.gen_bool(self.fire_chance) {
            buttons |= Buttons::FIRE;
        }

        TankInput {
            buttons,
            aim_at: Some(opponent.center()),
        }
    }
}
