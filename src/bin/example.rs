//! Pile Group Example - Laterally Loaded 3-Pile Group

use anyhow::Result;
use pilegroup_fea::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Pile Group Example: 3-Pile Group Under Lateral Load ===\n");

    let mut model = PileGroupModel::default();

    // three 18 m piles, 0.9 m diameter, spaced at two diameters
    model.params.pile_mut(0)?.embedded_length = 18.0;
    model.params.pile_mut(0)?.diameter = 0.9;
    model.params.add_pile()?;
    model.params.add_pile()?;

    model.params.free_length = 0.5;
    model.params.use_toe_resistance = true;
    model.params.load = LoadCase::ForceControl {
        h_force: 1500.0,
        v_force: 500.0,
        moment: 0.0,
    };

    println!(
        "Soil profile ({} layers, groundwater at {} m):",
        model.params.soil.len(),
        model.params.soil.gw_depth()
    );
    for layer in model.params.soil.layers() {
        println!(
            "  {:10} thickness {:5.2} m   phi {:4.1} deg   sigV' {:7.2} .. {:7.2} kPa",
            layer.name,
            layer.thickness(),
            layer.phi(),
            layer.top_stress(),
            layer.bottom_stress()
        );
    }

    println!("\nRunning analysis...");
    let result = model.rebuild_and_analyze()?;

    for diagnostic in &result.diagnostics {
        println!("  note: {diagnostic}");
    }

    println!("\nPile head response:");
    for (i, series) in result.piles.iter().enumerate() {
        let head_disp = series.displacement.last().unwrap();
        let max_moment = series.moment.iter().fold(0.0_f64, |m, &v| m.max(v.abs()));
        println!(
            "  pile {}: head displacement {:8.5} m, max |moment| {:9.2} kNm",
            i + 1,
            head_disp,
            max_moment
        );
    }

    println!("\nGroup extremes:");
    println!(
        "  displacement {:9.5} .. {:8.5} m",
        result.extremes.min_displacement, result.extremes.max_displacement
    );
    println!(
        "  shear        {:9.2} .. {:8.2} kN",
        result.extremes.min_shear, result.extremes.max_shear
    );
    println!(
        "  moment       {:9.2} .. {:8.2} kNm",
        result.extremes.min_moment, result.extremes.max_moment
    );

    Ok(())
}
