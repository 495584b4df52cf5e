mod arena;
mod ids;
mod pickup;
mod shell;
mod tank;
mod timestep;
mod world;

pub use arena::{ARENA_HEIGHT, ARENA_WIDTH, Arena, Contact, Obstacle, ObstacleKind, Rect, Side};
pub use ids::IdGenerator;
pub use pickup::{PICKUP_SIZE, Pickup, PickupAuthority, PickupConfig, PickupKind, PickupStrategy};
pub use shell::{MAX_BOUNCES, SHELL_RADIUS, SHELL_SPEED, Shell};
pub use tank::{
    BASE_SPEED, Buttons, FIRE_DELAY_TICKS, MAGAZINE_SIZE, MAX_HEALTH, MUZZLE_OFFSET, RELOAD_TICKS,
    TANK_SIZE, Tank, TankInput,
};
pub use timestep::{DEFAULT_TICK_RATE, FixedTimestep, seconds_to_ticks};
pub use world::{LocalWorld, StepEvents};
