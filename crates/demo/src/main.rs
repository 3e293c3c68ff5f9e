//! Broad-phase demo: random boxes drifting inside the indexed region.
//!
//! Runs the index the way a game loop would: every tick each moved object
//! is removed, integrated, and re-inserted, then a candidate pass counts
//! the overlapping pairs the narrow phase would have to look at.

use broadphase::{Aabb, BoundedObject, Quadtree, TreeConfig};
use glam::Vec2;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TICKS: u32 = 600;
const OBJECT_COUNT: u32 = 256;
const REPORT_EVERY: u32 = 60;

/// The handle stored in the tree: an id plus a cached bounding box.
#[derive(Debug, Clone, Copy)]
struct Proxy {
    id: u32,
    aabb: Aabb,
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl BoundedObject for Proxy {
    fn aabb(&self) -> Aabb {
        self.aabb
    }
}

/// The demo's moving object; the tree only ever sees its proxy.
struct Body {
    id: u32,
    position: Vec2,
    velocity: Vec2,
    half: Vec2,
}

impl Body {
    fn proxy(&self) -> Proxy {
        Proxy {
            id: self.id,
            aabb: Aabb::from_center(self.position, self.half.x, self.half.y),
        }
    }

    /// Integrate one tick, bouncing off the world border.
    fn step(&mut self, world: &Aabb) {
        self.position += self.velocity;

        if self.position.x - self.half.x < world.min.x
            || self.position.x + self.half.x > world.max.x
        {
            self.velocity.x = -self.velocity.x;
            self.position.x = self
                .position
                .x
                .clamp(world.min.x + self.half.x, world.max.x - self.half.x);
        }
        if self.position.y - self.half.y < world.min.y
            || self.position.y + self.half.y > world.max.y
        {
            self.velocity.y = -self.velocity.y;
            self.position.y = self
                .position
                .y
                .clamp(world.min.y + self.half.y, world.max.y - self.half.y);
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Broadphase demo v{}", env!("CARGO_PKG_VERSION"));

    let config = TreeConfig::load()?;
    let mut tree: Quadtree<Proxy> = Quadtree::from_config(&config)?;
    if config.bounds.is_degenerate() {
        warn!("Configured bounds span zero area, resizing to the demo world");
        tree.resize(Aabb::new(-256.0, -256.0, 256.0, 256.0));
    }
    let world = tree.bounds();
    info!(
        "World ({}, {}) to ({}, {}), max depth {}, {} objects per node",
        world.min.x,
        world.min.y,
        world.max.x,
        world.max.y,
        tree.max_depth(),
        tree.max_objects()
    );

    let mut rng = rand::rng();
    let mut bodies: Vec<Body> = (0..OBJECT_COUNT)
        .map(|id| {
            let half = Vec2::new(
                rng.random_range(0.5f32..2.0),
                rng.random_range(0.5f32..2.0),
            );
            let position = Vec2::new(
                rng.random_range(world.min.x + half.x..world.max.x - half.x),
                rng.random_range(world.min.y + half.y..world.max.y - half.y),
            );
            let velocity = Vec2::new(
                rng.random_range(-1.5f32..1.5),
                rng.random_range(-1.5f32..1.5),
            );
            Body {
                id,
                position,
                velocity,
                half,
            }
        })
        .collect();

    for body in &bodies {
        tree.insert(body.proxy());
    }
    info!("Seeded {} objects across {} nodes", tree.len(), tree.node_count());

    for tick in 1..=TICKS {
        // Movement pass: the index does not track moved handles, so each
        // body is removed, integrated, and re-inserted.
        for body in &mut bodies {
            tree.remove(&body.proxy());
            body.step(&world);
            tree.insert(body.proxy());
        }

        // Candidate pass, counting each overlapping pair once.
        let mut pairs = 0usize;
        let mut candidates = Vec::new();
        for body in &bodies {
            let probe = body.proxy();
            candidates.clear();
            tree.collision_candidates(&probe, &mut candidates);
            pairs += candidates.iter().filter(|other| other.id > body.id).count();
        }

        if tick % REPORT_EVERY == 0 {
            info!(
                "Tick {}: {} objects, {} nodes, {} candidate pairs",
                tick,
                tree.len(),
                tree.node_count(),
                pairs
            );
        }
    }

    info!("Done after {} ticks", TICKS);
    Ok(())
}
