//! Headless walk through a small timeline.
//!
//! Drives a session at 60 fps with a simulated clock, scrolling forward to the
//! outro and back to the intro, and prints what a renderer would draw.

use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use glam::Vec3;
use plastikwelt::prelude::*;
use plastikwelt::shapes;

const FRAME: Duration = Duration::from_micros(16_667);

const TIMELINE: &str = r#"[
    {"items_consumed": 40, "label": "t-shirts by age ten", "garment": "tee", "age": "childhood",
     "mesh": "tee.glb"},
    {"items_consumed": 120, "label": "pairs of jeans", "garment": "pants", "year": 2010},
    {"items_consumed": 180, "label": "more t-shirts", "garment": "tee", "year": 2015},
    {"items_consumed": 300, "label": "pairs of sneakers", "garment": "sneaks", "year": 2024,
     "references": "https://example.org/textile-waste"}
]"#;

/// A rough standing figure: a column of rings
fn silhouette() -> Vec<Vec3> {
    let mut points = Vec::new();
    for ring in 0..30 {
        let y = -0.9 + ring as f32 * 0.06;
        let radius = 0.12 + 0.08 * (ring as f32 * 0.35).sin().abs();
        for i in 0..10 {
            let angle = i as f32 / 10.0 * TAU;
            points.push(Vec3::new(radius * angle.cos(), y, radius * angle.sin()));
        }
    }
    points
}

fn run_until_settled(session: &mut StepController, clock: &mut Instant) {
    loop {
        *clock += FRAME;
        session.tick(*clock);
        if !session.is_animating() {
            break;
        }
    }
    let store = session.store();
    println!(
        "level {:>2} {:<12} attached {:>3} orbiting {:>3} camera {:?}",
        session.current_level(),
        format!("{:?}", session.phase()),
        store.count_in(LifecycleState::Attached),
        store.count_in(LifecycleState::Orbiting),
        session.camera().position(),
    );
}

fn main() {
    env_logger::init();

    let timeline = Timeline::load_or_empty(TIMELINE);
    let silhouette = silhouette();
    let hooks = OverlayHooks::new()
        .update_overlay(|content| {
            println!(
                "  [{}/{}] {} {} ({})",
                content.step_index,
                content.total_steps,
                content.quantity,
                content.label,
                content.era.as_deref().unwrap_or("-"),
            );
        })
        .show_outro(|| println!("  -- outro --"))
        .show_intro(|| println!("  -- intro --"));

    let mut clock = Instant::now();
    let mut session = StepController::new(
        SceneConfig::new().seed(2024),
        timeline,
        &silhouette,
        hooks,
        clock,
    );
    let mut input = ScrollAccumulator::default();

    // Only the tee mesh "exists"; the other garments get placeholders
    let shapes = shapes::garment_shapes(session.timeline(), session.store().group_keys(), |file| {
        match file {
            "tee.glb" => Ok(vec![Vec3::new(-1.0, 0.0, -0.2), Vec3::new(1.0, 1.4, 0.2)]),
            _ => Err(AssetError::EmptyMesh {
                name: file.to_string(),
            }),
        }
    });
    for (key, shape) in session.store().group_keys().iter().zip(&shapes) {
        match shape {
            ParticleShape::Mesh(mesh) => println!("{}: mesh, {} vertices", key, mesh.vertices.len()),
            ParticleShape::Primitive(primitive) => println!("{}: {:?}", key, primitive),
        }
    }

    // Scroll down in small wheel ticks until the outro shows
    while session.phase() != Phase::AtOutro {
        let event = InputEvent::Scroll {
            delta_x: 0.0,
            delta_y: 25.0,
        };
        if let Some(delta) = input.feed(event, session.is_animating()) {
            if session.request_step_delta(delta, clock) == StepRequest::Accepted {
                run_until_settled(&mut session, &mut clock);
                // A gesture half-made before the lock does not carry over
                input.reset();
            }
        }
        clock += FRAME;
        session.tick(clock);
    }

    // Uploading is the renderer's job; show what it would receive
    for batch in session.instances_mut().batches_mut() {
        let changes = batch.take_changes();
        println!(
            "batch {} : {} instances, {} bytes, {:?}",
            batch.group,
            batch.instances.len(),
            batch.as_bytes().len(),
            changes
        );
    }

    // Back one step, then jump to the intro
    session.request_step_delta(-1, clock);
    run_until_settled(&mut session, &mut clock);
    session.request_step_absolute(-1, clock);
    run_until_settled(&mut session, &mut clock);
}
