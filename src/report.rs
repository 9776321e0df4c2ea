use std::fmt::Write;
use woodsim::{MaterialCatalog, Reply};

/// Render the catalog as a fixed-width table.
///
/// Porosity and humidity are shown as percentages, the way the measurement
/// tools report them.
#[must_use]
pub fn render_catalog(catalog: &MaterialCatalog) -> String {
    let mut output = String::new();

    writeln!(
        &mut output,
        "{:<10} {:>14} {:>9} {:>9} {:>9} {:>12}  image",
        "material", "density kg/m³", "grain °", "porosity", "humidity", "fibre length"
    )
    .expect("writing to string cannot fail");

    for profile in catalog.iter() {
        writeln!(
            &mut output,
            "{:<10} {:>14.1} {:>9.1} {:>8.1}% {:>8.1}% {:>12.2}  {}",
            profile.name,
            profile.density_kg_per_m3(),
            profile.grain_angle.get::<uom::si::angle::degree>(),
            profile.porosity_fraction() * 100.0,
            profile.humidity_fraction() * 100.0,
            profile.fiber_length,
            profile.image_ref
        )
        .expect("writing to string cannot fail");
    }

    output
}

/// Render a reply body as indented JSON.
#[must_use]
pub fn render_reply(reply: &Reply) -> String {
    serde_json::to_string_pretty(&reply.body).unwrap_or_else(|_| reply.body.to_string())
}
