//! Box stacking example
//!
//! A box dropped onto a static pedestal and a sphere dropped onto the ground
//! plane. Prints the column-major transform a renderer would upload.
//!
//! Run with `RUST_LOG=boxphy=debug` to see bodies falling asleep.

use boxphy::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("boxphy - Box Stack Example");
    println!("==========================\n");

    let mut world = World::new(
        WorldConfig::default().with_resolver(ResolverConfig::default().with_iterations(16, 16)),
    );
    world.add_plane(Plane::ground(0.0));

    world.create_body_with(
        RigidBodyDesc::fixed().with_position(Vec3::new(0.0, 0.5, 0.0)),
        Shape::cuboid(Vec3::splat(0.5)),
    );
    println!("Created pedestal at Y=0.5 (top surface at Y=1.0)");

    let cube = world.create_body_with(
        RigidBodyDesc::dynamic()
            .with_position(Vec3::new(0.0, 3.0, 0.0))
            .with_mass(2.0),
        Shape::cuboid(Vec3::splat(0.5)),
    );
    println!("Created box at Y=3.0 (half size 0.5)");

    let ball = world.create_body_with(
        RigidBodyDesc::dynamic().with_position(Vec3::new(3.0, 4.0, 0.0)),
        Shape::sphere(0.5),
    );
    println!("Created ball at Y=4.0 (radius 0.5)\n");

    let dt = 1.0 / 120.0;
    let total_time = 5.0;
    let steps = (total_time / dt) as usize;

    println!("Simulating {} seconds ({} steps at {}Hz)...\n", total_time, steps, 1.0 / dt);

    for i in 0..steps {
        world.step(dt);

        if i % 60 == 0 {
            let cube_pos = world.body_position(cube);
            let ball_pos = world.body_position(ball);
            println!(
                "t={:.2}s: box=({:.3}, {:.3}, {:.3}) ball=({:.3}, {:.3}, {:.3}) contacts={}",
                world.time(),
                cube_pos.x, cube_pos.y, cube_pos.z,
                ball_pos.x, ball_pos.y, ball_pos.z,
                world.contact_count()
            );
        }
    }

    let m = world.body_transform(cube).to_cols_array_4x4();
    println!("\nFinal box transform (column-major):");
    for row in 0..4 {
        println!(
            "  [{:7.3} {:7.3} {:7.3} {:7.3}]",
            m[row], m[4 + row], m[8 + row], m[12 + row]
        );
    }

    for (handle, body) in world.bodies() {
        println!("body {}: awake={}", handle.0, body.is_awake());
    }
}
