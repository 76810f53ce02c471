//! Persisted model and preference files
//!
//! The model file is a single JSON document identified by a `creator` tag
//! and a `version` string. Version `"1.0"` stored only force-control
//! loads as a flat object; versions `"1.99"` and `"2.0"` store all three
//! load-control modes side by side with a selector. Files are always
//! written at the current version.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{PileError, PileResult};
use crate::loads::LoadCase;
use crate::params::{FeaParameters, Pile, PileGroupParameters, ViewOptions};
use crate::soil::{SoilLayer, SoilProfile};

const CREATOR: &str = "PileGroupTool";
const CURRENT_VERSION: &str = "2.0";

#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    creator: String,
    version: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    date: String,
    layers: Vec<LayerRecord>,
    #[serde(rename = "groundWaterTable")]
    ground_water_table: f64,
    piles: Vec<PileRecord>,
    #[serde(rename = "useToeResistance")]
    use_toe_resistance: bool,
    #[serde(rename = "assumeRigidPileHeadConnection")]
    assume_rigid_pile_head_connection: bool,
    loads: serde_json::Value,
    #[serde(rename = "FEAparameters", default)]
    fea_parameters: FeaRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayerRecord {
    depth: f64,
    thickness: f64,
    gamma: f64,
    #[serde(rename = "gammaSaturated")]
    gamma_saturated: f64,
    phi: f64,
    cohesion: f64,
    #[serde(rename = "Gmodulus")]
    g_modulus: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PileRecord {
    #[serde(rename = "embeddedLength")]
    embedded_length: f64,
    #[serde(rename = "freeLength")]
    free_length: f64,
    diameter: f64,
    #[serde(rename = "YoungsModulus")]
    youngs_modulus: f64,
    #[serde(rename = "xOffset")]
    x_offset: f64,
}

/// Flat load object of version 1.0 files
#[derive(Debug, Default, Serialize, Deserialize)]
struct FlatLoadRecord {
    #[serde(rename = "HForce", default)]
    h_force: f64,
    #[serde(rename = "VForce", default)]
    v_force: f64,
    #[serde(rename = "Moment", default)]
    moment: f64,
}

/// Nested load object of version 1.99 and 2.0 files
#[derive(Debug, Default, Serialize, Deserialize)]
struct LoadRecord {
    #[serde(rename = "loadControlType")]
    load_control_type: String,
    #[serde(rename = "forceControl", default)]
    force_control: FlatLoadRecord,
    #[serde(rename = "pushOver", default)]
    push_over: PushOverRecord,
    #[serde(rename = "soilMotion", default)]
    soil_motion: SoilMotionRecord,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PushOverRecord {
    #[serde(rename = "HDisp", default)]
    h_disp: f64,
    #[serde(rename = "VDisp", default)]
    v_disp: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SoilMotionRecord {
    #[serde(rename = "surfaceDisp", default)]
    surface_disp: f64,
    #[serde(rename = "percentage12", default)]
    percentage12: f64,
    #[serde(rename = "percentage23", default)]
    percentage23: f64,
    #[serde(rename = "percentageBase", default)]
    percentage_base: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct FeaRecord {
    #[serde(rename = "minElementsPerLayer")]
    min_elements_per_layer: usize,
    #[serde(rename = "maxElementsPerLayer")]
    max_elements_per_layer: usize,
    #[serde(rename = "numElementsInAir")]
    num_elements_in_air: usize,
}

impl Default for FeaRecord {
    fn default() -> Self {
        let fea = FeaParameters::default();
        Self {
            min_elements_per_layer: fea.min_elements_per_layer,
            max_elements_per_layer: fea.max_elements_per_layer,
            num_elements_in_air: fea.num_elements_in_air,
        }
    }
}

/// Load a model file, validating creator and version before anything else
pub fn load_model(path: impl AsRef<Path>) -> PileResult<PileGroupParameters> {
    let text = fs::read_to_string(path)?;
    let file: ModelFile = serde_json::from_str(&text)?;

    if file.creator != CREATOR {
        return Err(PileError::UnrecognizedFile(file.creator));
    }
    if !matches!(file.version.as_str(), "1.0" | "1.99" | "2.0") {
        return Err(PileError::UnsupportedVersion(file.version));
    }

    let layers = file
        .layers
        .iter()
        .enumerate()
        .map(|(i, l)| {
            SoilLayer::new(
                &format!("Layer {}", i + 1),
                l.thickness,
                l.gamma,
                l.gamma_saturated,
                l.phi,
                l.cohesion,
                l.g_modulus,
            )
        })
        .collect();
    let soil = SoilProfile::new(layers, file.ground_water_table);

    let free_length = file.piles.first().map(|p| p.free_length).unwrap_or(0.0);
    let piles: Vec<Pile> = file
        .piles
        .iter()
        .map(|p| Pile {
            embedded_length: p.embedded_length,
            diameter: p.diameter,
            e_modulus: p.youngs_modulus,
            x_offset: p.x_offset,
        })
        .collect();

    let load = if file.version == "1.0" {
        let flat: FlatLoadRecord = serde_json::from_value(file.loads)?;
        LoadCase::ForceControl {
            h_force: flat.h_force,
            v_force: flat.v_force,
            moment: flat.moment,
        }
    } else {
        let record: LoadRecord = serde_json::from_value(file.loads)?;
        match record.load_control_type.as_str() {
            "forceControl" => LoadCase::ForceControl {
                h_force: record.force_control.h_force,
                v_force: record.force_control.v_force,
                moment: record.force_control.moment,
            },
            "pushOver" => LoadCase::Pushover {
                h_disp: record.push_over.h_disp,
                v_disp: record.push_over.v_disp,
            },
            "soilMotion" => LoadCase::SoilMotion {
                surface_disp: record.soil_motion.surface_disp,
                pct12: record.soil_motion.percentage12,
                pct23: record.soil_motion.percentage23,
                pct_base: record.soil_motion.percentage_base,
            },
            other => {
                return Err(PileError::InvalidInput(format!(
                    "unknown load control type '{other}'"
                )))
            }
        }
    };

    let fea = FeaParameters {
        min_elements_per_layer: file.fea_parameters.min_elements_per_layer,
        max_elements_per_layer: file.fea_parameters.max_elements_per_layer,
        num_elements_in_air: file.fea_parameters.num_elements_in_air,
    }
    .clamped();

    let mut params = PileGroupParameters::default();
    params.soil = soil;
    params.free_length = free_length;
    params.use_toe_resistance = file.use_toe_resistance;
    params.rigid_cap_connection = file.assume_rigid_pile_head_connection;
    params.load = load;
    params.fea = fea;
    params.set_piles(piles)?;
    Ok(params)
}

/// Save a model file at the current version
pub fn save_model(path: impl AsRef<Path>, params: &PileGroupParameters) -> PileResult<()> {
    let layers = params
        .soil
        .layers()
        .iter()
        .map(|l| LayerRecord {
            depth: l.top_depth(),
            thickness: l.thickness(),
            gamma: l.gamma_dry(),
            gamma_saturated: l.gamma_sat(),
            phi: l.phi(),
            cohesion: l.cohesion(),
            g_modulus: l.g_modulus(),
        })
        .collect();

    let piles = params
        .piles()
        .iter()
        .map(|p| PileRecord {
            embedded_length: p.embedded_length,
            free_length: params.free_length,
            diameter: p.diameter,
            youngs_modulus: p.e_modulus,
            x_offset: p.x_offset,
        })
        .collect();

    // all three load modes are written so reopening the file can switch
    // between them without losing values
    let mut record = LoadRecord::default();
    match params.load {
        LoadCase::ForceControl {
            h_force,
            v_force,
            moment,
        } => {
            record.load_control_type = "forceControl".to_string();
            record.force_control = FlatLoadRecord {
                h_force,
                v_force,
                moment,
            };
        }
        LoadCase::Pushover { h_disp, v_disp } => {
            record.load_control_type = "pushOver".to_string();
            record.push_over = PushOverRecord { h_disp, v_disp };
        }
        LoadCase::SoilMotion {
            surface_disp,
            pct12,
            pct23,
            pct_base,
        } => {
            record.load_control_type = "soilMotion".to_string();
            record.soil_motion = SoilMotionRecord {
                surface_disp,
                percentage12: pct12,
                percentage23: pct23,
                percentage_base: pct_base,
            };
        }
    }

    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let file = ModelFile {
        creator: CREATOR.to_string(),
        version: CURRENT_VERSION.to_string(),
        author: std::env::var("USER").unwrap_or_default(),
        date: seconds.to_string(),
        layers,
        ground_water_table: params.soil.gw_depth(),
        piles,
        use_toe_resistance: params.use_toe_resistance,
        assume_rigid_pile_head_connection: params.rigid_cap_connection,
        loads: serde_json::to_value(&record)?,
        fea_parameters: FeaRecord {
            min_elements_per_layer: params.fea.min_elements_per_layer,
            max_elements_per_layer: params.fea.max_elements_per_layer,
            num_elements_in_air: params.fea.num_elements_in_air,
        },
    };

    fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}

/// Display and meshing preferences persisted outside the model file
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub view: ViewOptions,
    pub fea: FeaParameters,
}

pub fn load_preferences(path: impl AsRef<Path>) -> PileResult<Preferences> {
    let text = fs::read_to_string(path)?;
    let prefs: Preferences = serde_json::from_str(&text)?;
    Ok(Preferences {
        fea: prefs.fea.clamped(),
        ..prefs
    })
}

pub fn save_preferences(path: impl AsRef<Path>, prefs: &Preferences) -> PileResult<()> {
    fs::write(path, serde_json::to_string_pretty(prefs)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("pilegroup-fea-test-{}-{name}", std::process::id()));
        p
    }

    #[test]
    fn test_round_trip_preserves_parameters() {
        let mut params = PileGroupParameters::default();
        params.add_pile().unwrap();
        params.use_toe_resistance = true;
        params.load = LoadCase::Pushover {
            h_disp: 0.05,
            v_disp: 0.01,
        };

        let path = temp_path("roundtrip.json");
        save_model(&path, &params).unwrap();
        let loaded = load_model(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.num_piles(), 2);
        assert_eq!(loaded.piles(), params.piles());
        assert_eq!(loaded.load, params.load);
        assert_eq!(loaded.free_length, params.free_length);
        assert!(loaded.use_toe_resistance);
        assert_eq!(loaded.soil.gw_depth(), params.soil.gw_depth());
        for i in 0..params.soil.len() {
            let a = loaded.soil.layer(i).unwrap();
            let b = params.soil.layer(i).unwrap();
            assert_eq!(a.thickness(), b.thickness());
            assert_eq!(a.phi(), b.phi());
            assert_eq!(a.bottom_stress(), b.bottom_stress());
        }
    }

    #[test]
    fn test_wrong_creator_rejected() {
        let path = temp_path("creator.json");
        std::fs::write(
            &path,
            r#"{"creator":"SomethingElse","version":"2.0","layers":[],
                "groundWaterTable":0.0,"piles":[],"useToeResistance":false,
                "assumeRigidPileHeadConnection":true,"loads":{}}"#,
        )
        .unwrap();
        let err = load_model(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, PileError::UnrecognizedFile(_)));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let path = temp_path("version.json");
        std::fs::write(
            &path,
            r#"{"creator":"PileGroupTool","version":"0.5","layers":[],
                "groundWaterTable":0.0,"piles":[],"useToeResistance":false,
                "assumeRigidPileHeadConnection":true,"loads":{}}"#,
        )
        .unwrap();
        let err = load_model(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, PileError::UnsupportedVersion(v) if v == "0.5"));
    }

    #[test]
    fn test_legacy_flat_loads() {
        let path = temp_path("legacy.json");
        std::fs::write(
            &path,
            r#"{
                "creator": "PileGroupTool",
                "version": "1.0",
                "layers": [
                    {"depth":0.0,"thickness":5.0,"gamma":16.0,
                     "gammaSaturated":19.0,"phi":32.0,"cohesion":0.0,
                     "Gmodulus":150000.0}
                ],
                "groundWaterTable": -2.0,
                "piles": [
                    {"embeddedLength":12.0,"freeLength":0.5,"diameter":0.8,
                     "YoungsModulus":30000000.0,"xOffset":0.0}
                ],
                "useToeResistance": false,
                "assumeRigidPileHeadConnection": true,
                "loads": {"HForce": 500.0, "VForce": 100.0, "Moment": 25.0}
            }"#,
        )
        .unwrap();
        let params = load_model(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            params.load,
            LoadCase::ForceControl {
                h_force: 500.0,
                v_force: 100.0,
                moment: 25.0
            }
        );
        // negative table depth clamps to the surface
        assert_eq!(params.soil.gw_depth(), 0.0);
        assert_eq!(params.free_length, 0.5);
        // missing FEA block falls back to defaults
        assert_eq!(params.fea, FeaParameters::default());
    }

    #[test]
    fn test_preferences_round_trip() {
        let prefs = Preferences {
            view: ViewOptions {
                moments: false,
                ..Default::default()
            },
            fea: FeaParameters {
                num_elements_in_air: 10,
                ..Default::default()
            },
        };
        let path = temp_path("prefs.json");
        save_preferences(&path, &prefs).unwrap();
        let loaded = load_preferences(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, prefs);
    }
}
