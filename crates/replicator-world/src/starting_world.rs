//! The seed system every new simulation starts from.
//!
//! One star and five bodies with fixed starting stock. Ids are fixed so the
//! seed state is identical across runs; only timestamps differ.

use replicator_types::{
    BodyId, BodyKind, CelestialBody, Position, ResourceVector, SolarSystem, SystemId,
};

/// Fixed identifiers of the seed system and its bodies.
#[derive(Debug, Clone, Copy)]
pub struct SeedIds;

impl SeedIds {
    /// The seed system.
    pub const SYSTEM: SystemId = SystemId::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0001);
    /// Sol, the star.
    pub const SOL: BodyId = BodyId::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0100);
    /// Terra, the first body; the seed probe starts here.
    pub const TERRA: BodyId = BodyId::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0101);
    /// Luna, Terra's moon.
    pub const LUNA: BodyId = BodyId::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0102);
    /// Mars.
    pub const MARS: BodyId = BodyId::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0103);
    /// The main asteroid belt.
    pub const BELT: BodyId = BodyId::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0104);
    /// Jupiter.
    pub const JUPITER: BodyId = BodyId::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0105);
}

/// Helper to build a [`CelestialBody`].
fn body(
    id: BodyId,
    name: &str,
    kind: BodyKind,
    position: Position,
    resources: ResourceVector,
    mass: f64,
    radius_km: f64,
) -> CelestialBody {
    CelestialBody {
        id,
        name: name.to_owned(),
        kind,
        position,
        resources,
        mass,
        radius_km,
    }
}

/// Where the seed probe starts: Terra's position.
pub const fn seed_position() -> Position {
    Position::new(1.0, 0.0, 0.0)
}

/// Create the seed system.
///
/// Coordinates assume the default scale of one raw unit per AU.
pub fn create_seed_system() -> SolarSystem {
    let star = body(
        SeedIds::SOL,
        "Sol",
        BodyKind::Star,
        Position::ORIGIN,
        ResourceVector::ZERO,
        332_946.0,
        696_340.0,
    );

    let bodies = vec![
        body(
            SeedIds::TERRA,
            "Terra",
            BodyKind::Planet,
            seed_position(),
            ResourceVector::new(0, 8_000, 6_000, 2_000, 200),
            1.0,
            6_371.0,
        ),
        body(
            SeedIds::LUNA,
            "Luna",
            BodyKind::Moon,
            Position::new(1.002_6, 0.0, 0.0),
            ResourceVector::new(0, 3_000, 2_500, 100, 150),
            0.0123,
            1_737.0,
        ),
        body(
            SeedIds::MARS,
            "Mars",
            BodyKind::Planet,
            Position::new(1.52, 0.0, 0.0),
            ResourceVector::new(0, 6_000, 4_000, 500, 300),
            0.107,
            3_390.0,
        ),
        body(
            SeedIds::BELT,
            "Main Belt",
            BodyKind::Belt,
            Position::new(2.77, 0.3, 0.0),
            ResourceVector::new(0, 20_000, 5_000, 1_000, 800),
            0.0004,
            0.0,
        ),
        body(
            SeedIds::JUPITER,
            "Jupiter",
            BodyKind::GasGiant,
            Position::new(5.2, 0.0, 0.1),
            ResourceVector::new(0, 0, 0, 100_000, 50),
            317.8,
            69_911.0,
        ),
    ];

    tracing::debug!(bodies = bodies.len(), "seed system created");

    SolarSystem {
        id: SeedIds::SYSTEM,
        name: String::from("Sol System"),
        position: Position::ORIGIN,
        star,
        bodies,
        discovery: None,
    }
}
