//! Per-garment particle shapes.
//!
//! Each garment group is drawn with its own instanced shape. Loaded meshes
//! are normalised to particle size; groups without a usable mesh get a
//! placeholder primitive.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::{Quat, Vec3};

use crate::error::{AssetError, Result};
use crate::timeline::Timeline;

/// Largest extent of a normalised shape
pub const TARGET_SIZE: f32 = 0.09;
/// Smallest X extent after normalisation
pub const MIN_WIDTH: f32 = 0.06;
/// Smallest Z extent after normalisation
pub const MIN_DEPTH: f32 = 0.045;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Box { size: f32 },
    Sphere { radius: f32, segments: u32 },
    Cone { radius: f32, height: f32, segments: u32 },
}

impl Primitive {
    /// Placeholder for a shape slot, cycling box, sphere, cone
    pub fn placeholder(slot: usize) -> Self {
        match slot % 3 {
            0 => Primitive::Box { size: MIN_WIDTH },
            1 => Primitive::Sphere {
                radius: MIN_DEPTH,
                segments: 8,
            },
            _ => Primitive::Cone {
                radius: MIN_WIDTH,
                height: TARGET_SIZE,
                segments: 4,
            },
        }
    }
}

/// Mesh vertices centred on the origin at particle scale
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMesh {
    pub vertices: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParticleShape {
    Mesh(ShapeMesh),
    Primitive(Primitive),
}

fn bounds(vertices: &[Vec3]) -> (Vec3, Vec3) {
    vertices.iter().fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(min, max), v| (min.min(*v), max.max(*v)),
    )
}

/// Centre `vertices`, fit them to [`TARGET_SIZE`] while keeping a minimum
/// width and depth, then turn them to face the camera
pub fn normalize(name: &str, vertices: &[Vec3]) -> Result<ShapeMesh> {
    if vertices.is_empty() {
        return Err(AssetError::EmptyMesh {
            name: name.to_string(),
        });
    }

    let (min, max) = bounds(vertices);
    let center = (min + max) * 0.5;
    let size = max - min;
    let max_dim = size.max_element();
    let mut scale = if max_dim > 0.0 { TARGET_SIZE / max_dim } else { 1.0 };

    let scaled = size * scale;
    let widen = |extent: f32, minimum: f32| {
        if extent > 0.0 && extent < minimum {
            minimum / extent
        } else {
            1.0
        }
    };
    scale *= widen(scaled.x, MIN_WIDTH).max(widen(scaled.z, MIN_DEPTH));

    let rotation = Quat::from_rotation_y(-FRAC_PI_4)
        * Quat::from_rotation_y(FRAC_PI_2)
        * Quat::from_rotation_x(FRAC_PI_2);

    let vertices = vertices
        .iter()
        .map(|v| rotation * ((*v - center) * scale))
        .collect();

    log::debug!("Normalised shape {} (scale {:.4})", name, scale);
    Ok(ShapeMesh { vertices })
}

/// One shape per group key, in group order.
///
/// The mesh for a group is the `shell_file` of the first step of that group
/// that names one. Missing or broken meshes fall back to a placeholder.
pub fn garment_shapes<F>(timeline: &Timeline, group_keys: &[String], mut load: F) -> Vec<ParticleShape>
where
    F: FnMut(&str) -> Result<Vec<Vec3>>,
{
    group_keys
        .iter()
        .enumerate()
        .map(|(slot, key)| {
            let file = timeline
                .steps()
                .iter()
                .filter(|step| step.group_key == *key)
                .find_map(|step| step.shell_file.as_deref());
            let Some(file) = file else {
                log::debug!("No mesh for group {}, using placeholder", key);
                return ParticleShape::Primitive(Primitive::placeholder(slot));
            };
            match load(file).and_then(|vertices| normalize(file, &vertices)) {
                Ok(mesh) => ParticleShape::Mesh(mesh),
                Err(err) => {
                    log::error!("Failed to load mesh {} for group {}: {}", file, key, err);
                    ParticleShape::Primitive(Primitive::placeholder(slot))
                }
            }
        })
        .collect()
}

/// Decode a silhouette point cloud from `[[x, y, z], ...]`
pub fn silhouette_from_json(json: &str) -> Result<Vec<Vec3>> {
    let points: Vec<[f32; 3]> = serde_json::from_str(json)?;
    if points.is_empty() {
        return Err(AssetError::EmptySilhouette);
    }
    Ok(points.into_iter().map(Vec3::from_array).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineStep;

    fn cuboid(x: f32, y: f32, z: f32) -> Vec<Vec3> {
        let mut corners = Vec::new();
        for &cx in &[0.0, x] {
            for &cy in &[0.0, y] {
                for &cz in &[0.0, z] {
                    corners.push(Vec3::new(cx + 3.0, cy - 1.0, cz + 0.5));
                }
            }
        }
        corners
    }

    fn radius(mesh: &ShapeMesh) -> f32 {
        mesh.vertices.iter().map(|v| v.length()).fold(0.0, f32::max)
    }

    #[test]
    fn test_normalize_fits_target_size() {
        let mesh = normalize("cube", &cuboid(4.0, 4.0, 4.0)).unwrap();
        let half_diagonal = (3.0f32).sqrt() * TARGET_SIZE * 0.5;
        assert!((radius(&mesh) - half_diagonal).abs() < 1e-5);
        let centroid = mesh.vertices.iter().copied().sum::<Vec3>() / mesh.vertices.len() as f32;
        assert!(centroid.length() < 1e-5);
    }

    #[test]
    fn test_normalize_keeps_minimum_depth() {
        // 0.009 deep after fitting, widened by 5x
        let mesh = normalize("flat", &cuboid(1.0, 1.0, 0.1)).unwrap();
        let expected = Vec3::new(0.45, 0.45, 0.045).length() * 0.5;
        assert!((radius(&mesh) - expected).abs() < 1e-5);
    }

    #[test]
    fn test_empty_mesh_is_an_error() {
        assert!(matches!(
            normalize("none", &[]),
            Err(AssetError::EmptyMesh { .. })
        ));
    }

    #[test]
    fn test_placeholders_cycle() {
        assert!(matches!(Primitive::placeholder(0), Primitive::Box { .. }));
        assert!(matches!(Primitive::placeholder(1), Primitive::Sphere { .. }));
        assert!(matches!(Primitive::placeholder(2), Primitive::Cone { .. }));
        assert!(matches!(Primitive::placeholder(3), Primitive::Box { .. }));
    }

    #[test]
    fn test_garment_shapes_fall_back() {
        let timeline = Timeline::new(vec![
            TimelineStep::new(1.0, "tee").shell_file("tee.glb"),
            TimelineStep::new(2.0, "pants").shell_file("broken.glb"),
            TimelineStep::new(3.0, "sneaks"),
        ])
        .unwrap();
        let keys: Vec<String> = ["tee", "pants", "sneaks"].iter().map(|k| k.to_string()).collect();
        let shapes = garment_shapes(&timeline, &keys, |file| match file {
            "tee.glb" => Ok(cuboid(1.0, 2.0, 1.0)),
            _ => Err(AssetError::EmptyMesh { name: file.to_string() }),
        });
        assert!(matches!(shapes[0], ParticleShape::Mesh(_)));
        assert_eq!(shapes[1], ParticleShape::Primitive(Primitive::placeholder(1)));
        assert_eq!(shapes[2], ParticleShape::Primitive(Primitive::placeholder(2)));
    }

    #[test]
    fn test_silhouette_from_json() {
        let points = silhouette_from_json("[[0, 1, 0], [0.5, 1.5, -0.25]]").unwrap();
        assert_eq!(points, vec![Vec3::Y, Vec3::new(0.5, 1.5, -0.25)]);
        assert!(matches!(
            silhouette_from_json("[]"),
            Err(AssetError::EmptySilhouette)
        ));
    }
}
