use crate::core::color::Colour;
use crate::core::geometry::{Material, ModelTriangle, TexturePoint};
use log::{info, warn};
use nalgebra::Point3;
use std::path::Path;

/// Loads an OBJ file as a flat triangle list.
///
/// Positions are multiplied by `scale`. A triangle's colour comes from its
/// material name when that names a palette colour, otherwise from the MTL
/// diffuse colour, otherwise black. `texture_size` is the `(width, height)`
/// of the loaded texture, if any; it sizes the texture coordinates handed to
/// textured faces by [`tag_materials`].
pub fn load_obj<P: AsRef<Path>>(
    path: P,
    scale: f32,
    texture_size: Option<(usize, usize)>,
) -> Result<Vec<ModelTriangle>, String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }

    info!("Loading OBJ file: {}", path.display());

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, materials) = tobj::load_obj(path, &load_options)
        .map_err(|e| format!("Failed to load OBJ: {}", e))?;

    let materials = materials.unwrap_or_else(|e| {
        warn!("No usable MTL for '{}': {}", path.display(), e);
        Vec::new()
    });

    let mut triangles = Vec::new();

    for model in models {
        let mesh = &model.mesh;
        let colour = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .map(material_colour)
            .unwrap_or(Colour::BLACK);

        let vertex = |index: u32| {
            let i = index as usize * 3;
            Point3::new(
                mesh.positions[i] * scale,
                mesh.positions[i + 1] * scale,
                mesh.positions[i + 2] * scale,
            )
        };

        for face in mesh.indices.chunks_exact(3) {
            triangles.push(ModelTriangle::new(
                vertex(face[0]),
                vertex(face[1]),
                vertex(face[2]),
                colour,
            ));
        }
    }

    if let Some((width, height)) = texture_size {
        tag_materials(&mut triangles, width as f32, height as f32);
    }

    info!("OBJ loaded successfully. Total triangles: {}", triangles.len());

    Ok(triangles)
}

fn material_colour(material: &tobj::Material) -> Colour {
    if Colour::is_palette_name(&material.name) {
        return Colour::from_name(&material.name);
    }
    match material.diffuse {
        Some(kd) => Colour::from_unit_rgb(kd),
        None => Colour::BLACK,
    }
}

/// Turns colour-coded faces into explicit materials: green faces become
/// textured, magenta faces become mirrors. Consecutive green faces take
/// turns between the two halves of a `width` x `height` texture.
pub fn tag_materials(triangles: &mut [ModelTriangle], width: f32, height: f32) {
    let halves = [
        [
            TexturePoint::new(0.0, height),
            TexturePoint::new(width, 0.0),
            TexturePoint::new(0.0, 0.0),
        ],
        [
            TexturePoint::new(0.0, height),
            TexturePoint::new(width, height),
            TexturePoint::new(width, 0.0),
        ],
    ];

    let mut textured = 0;
    for triangle in triangles.iter_mut() {
        if triangle.colour == Colour::GREEN {
            triangle.material = Material::Textured(halves[textured % 2]);
            textured += 1;
        } else if triangle.colour == Colour::MAGENTA {
            triangle.material = Material::Mirror;
        }
    }
}
