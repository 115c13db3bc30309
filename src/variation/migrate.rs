//! Legacy config migration (schema v0 -> v1).
//!
//! Older saved buildings carry single-purpose groups (`macro`, `detail`,
//! `dust`, `grime`, `edgeWear`, ...) and several historical spellings of the
//! anti-tiling fields. Migration rewrites a raw JSON config into the current
//! schema once, before normalization, so the normalizer only ever reads
//! canonical names. It never reads presets: a group that is absent after
//! migration is filled from the root preset by the normalizer.

use serde_json::{Map, Value};

use super::config::MAX_MACRO_LAYERS;

/// Schema version written by the current normalizer.
pub const CONFIG_VERSION: u32 = 1;

/// A legacy group that seeds a new-style group when the latter is absent.
struct LegacyDerivation {
    legacy: &'static str,
    target: &'static str,
    /// `(legacy key, target key)` renames; other keys are copied as-is.
    renames: &'static [(&'static str, &'static str)],
}

const STRENGTH_TO_INTENSITY: &[(&str, &str)] = &[("strength", "intensity")];

const LEGACY_DERIVATIONS: &[LegacyDerivation] = &[
    LegacyDerivation { legacy: "dust", target: "wearTop", renames: STRENGTH_TO_INTENSITY },
    LegacyDerivation { legacy: "grime", target: "wearBottom", renames: STRENGTH_TO_INTENSITY },
    LegacyDerivation { legacy: "edgeWear", target: "wearSide", renames: STRENGTH_TO_INTENSITY },
    LegacyDerivation { legacy: "cracks", target: "cracksLayer", renames: &[] },
    LegacyDerivation { legacy: "sunBleach", target: "exposure", renames: &[] },
    LegacyDerivation { legacy: "soot", target: "streaks", renames: &[] },
];

/// Legacy sources for macro layers 0 and 1.
const LEGACY_MACRO_SOURCES: [&str; 2] = ["macro", "detail"];

const ANTI_TILING_GROUP_ALIASES: &[&str] = &["antiTiling", "antiTile", "antitiling"];

/// Canonical anti-tiling key followed by accepted spellings, highest priority first.
const ANTI_TILING_FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("strength", &["strength", "amount", "intensity"]),
    ("cellSize", &["cellSize", "cell", "tileSize"]),
    ("blendWidth", &["blendWidth", "blend", "edgeBlend"]),
    ("offsetU", &["offsetU", "offsetAmountU", "jitterU", "offset", "offsetAmount"]),
    ("offsetV", &["offsetV", "offsetAmountV", "jitterV", "offset", "offsetAmount"]),
    ("rotationDegrees", &["rotationDegrees", "rotation", "rotationAmount"]),
];

/// Rewrite a raw config into the current schema.
///
/// Non-object input migrates to an empty object.
pub fn migrate_v0_to_v1(input: &Value) -> Map<String, Value> {
    let mut out = input.as_object().cloned().unwrap_or_default();

    synthesize_macro_layers(&mut out);
    for derivation in LEGACY_DERIVATIONS {
        derive_group(&mut out, derivation);
    }
    resolve_anti_tiling(&mut out);

    out
}

fn is_present(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).is_some_and(|v| !v.is_null())
}

/// Without an explicit `macroLayers` array, layers 0/1 come from `macro` and
/// `detail` and layers 2/3 are disabled.
fn synthesize_macro_layers(out: &mut Map<String, Value>) {
    if out.get("macroLayers").is_some_and(Value::is_array) {
        return;
    }

    let mut layers = Vec::with_capacity(MAX_MACRO_LAYERS);
    for legacy in LEGACY_MACRO_SOURCES {
        let layer = match out.get(legacy).and_then(Value::as_object) {
            Some(src) => renamed(src, STRENGTH_TO_INTENSITY),
            None => Map::new(),
        };
        layers.push(Value::Object(layer));
    }
    while layers.len() < MAX_MACRO_LAYERS {
        let mut disabled = Map::new();
        disabled.insert("enabled".into(), Value::Bool(false));
        layers.push(Value::Object(disabled));
    }

    out.insert("macroLayers".into(), Value::Array(layers));
}

fn derive_group(out: &mut Map<String, Value>, derivation: &LegacyDerivation) {
    if is_present(out, derivation.target) {
        return;
    }
    let Some(src) = out.get(derivation.legacy).and_then(Value::as_object) else {
        return;
    };
    let group = renamed(src, derivation.renames);
    out.insert(derivation.target.into(), Value::Object(group));
}

fn renamed(src: &Map<String, Value>, renames: &[(&str, &str)]) -> Map<String, Value> {
    let mut group = Map::new();
    for (key, value) in src {
        let target = renames
            .iter()
            .find(|(from, _)| from == key)
            .map_or(key.as_str(), |(_, to)| *to);
        // An explicit target key wins over a renamed legacy key.
        if target != key.as_str() && src.contains_key(target) {
            continue;
        }
        group.insert(target.to_string(), value.clone());
    }
    group
}

fn resolve_anti_tiling(out: &mut Map<String, Value>) {
    let Some(group_key) = ANTI_TILING_GROUP_ALIASES
        .iter()
        .find(|alias| out.get(**alias).is_some_and(Value::is_object))
    else {
        return;
    };
    let Some(Value::Object(group)) = out.remove(*group_key) else {
        return;
    };

    let mut resolved = Map::new();
    // Keys that are not aliases (enabled, mode, ...) pass through.
    for (key, value) in &group {
        let is_alias = ANTI_TILING_FIELD_ALIASES
            .iter()
            .any(|(_, aliases)| aliases.contains(&key.as_str()));
        if !is_alias {
            resolved.insert(key.clone(), value.clone());
        }
    }
    for (canonical, aliases) in ANTI_TILING_FIELD_ALIASES {
        if let Some(value) = aliases.iter().find_map(|a| group.get(*a).filter(|v| !v.is_null())) {
            resolved.insert((*canonical).to_string(), value.clone());
        }
    }
    if !is_present(&resolved, "mode") && group.get("quality").and_then(Value::as_bool) == Some(true) {
        resolved.insert("mode".into(), Value::String("quality".into()));
    }

    out.insert("antiTiling".into(), Value::Object(resolved));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_input() {
        let out = migrate_v0_to_v1(&json!(42));
        assert_eq!(out.get("macroLayers").unwrap().as_array().unwrap().len(), MAX_MACRO_LAYERS);
        assert!(out.get("wearTop").is_none());
    }

    #[test]
    fn test_macro_layers_from_legacy() {
        let out = migrate_v0_to_v1(&json!({
            "macro": { "enabled": true, "strength": 1.5, "scale": 0.2 },
            "detail": { "strength": 0.3 }
        }));
        let layers = out["macroLayers"].as_array().unwrap();
        assert_eq!(layers[0]["intensity"], 1.5);
        assert_eq!(layers[0]["scale"], 0.2);
        assert!(layers[0].get("strength").is_none());
        assert_eq!(layers[1]["intensity"], 0.3);
        assert_eq!(layers[2]["enabled"], false);
        assert_eq!(layers[3]["enabled"], false);
    }

    #[test]
    fn test_explicit_macro_layers_untouched() {
        let input = json!({ "macroLayers": [{ "intensity": 2.0 }], "macro": { "strength": 9.0 } });
        let out = migrate_v0_to_v1(&input);
        assert_eq!(out["macroLayers"], input["macroLayers"]);
    }

    #[test]
    fn test_wear_bands_from_legacy() {
        let out = migrate_v0_to_v1(&json!({
            "dust": { "enabled": true, "strength": 0.7, "width": 0.4 },
            "grime": { "strength": 0.9 },
            "edgeWear": { "enabled": false }
        }));
        assert_eq!(out["wearTop"]["intensity"], 0.7);
        assert_eq!(out["wearTop"]["width"], 0.4);
        assert_eq!(out["wearBottom"]["intensity"], 0.9);
        assert_eq!(out["wearSide"]["enabled"], false);
    }

    #[test]
    fn test_new_style_wins_over_legacy() {
        let out = migrate_v0_to_v1(&json!({
            "dust": { "strength": 0.7 },
            "wearTop": { "intensity": 0.1 }
        }));
        assert_eq!(out["wearTop"]["intensity"], 0.1);
    }

    #[test]
    fn test_absent_legacy_leaves_group_absent() {
        let out = migrate_v0_to_v1(&json!({}));
        for derivation in LEGACY_DERIVATIONS {
            assert!(out.get(derivation.target).is_none(), "{} synthesized", derivation.target);
        }
    }

    #[test]
    fn test_other_derivations() {
        let out = migrate_v0_to_v1(&json!({
            "cracks": { "strength": 0.5 },
            "sunBleach": { "strength": 0.25 },
            "soot": { "enabled": true, "scale": 2.0 }
        }));
        assert_eq!(out["cracksLayer"]["strength"], 0.5);
        assert_eq!(out["exposure"]["strength"], 0.25);
        assert_eq!(out["streaks"]["scale"], 2.0);
    }

    #[test]
    fn test_anti_tiling_aliases() {
        let out = migrate_v0_to_v1(&json!({
            "antiTile": {
                "enabled": true,
                "rotation": 40.0,
                "rotationAmount": 10.0,
                "jitterU": 0.2,
                "offsetAmountV": 0.3,
                "amount": 0.9,
                "quality": true
            }
        }));
        let at = &out["antiTiling"];
        assert!(out.get("antiTile").is_none());
        assert_eq!(at["enabled"], true);
        assert_eq!(at["rotationDegrees"], 40.0);
        assert_eq!(at["offsetU"], 0.2);
        assert_eq!(at["offsetV"], 0.3);
        assert_eq!(at["strength"], 0.9);
        assert_eq!(at["mode"], "quality");
        assert!(at.get("rotation").is_none());
    }

    #[test]
    fn test_anti_tiling_canonical_preferred() {
        let out = migrate_v0_to_v1(&json!({
            "antiTiling": { "rotationDegrees": 12.0, "rotation": 80.0, "offset": 0.4, "offsetV": 0.1 }
        }));
        let at = &out["antiTiling"];
        assert_eq!(at["rotationDegrees"], 12.0);
        assert_eq!(at["offsetU"], 0.4);
        assert_eq!(at["offsetV"], 0.1);
    }

    #[test]
    fn test_null_alias_skipped() {
        let out = migrate_v0_to_v1(&json!({
            "antiTiling": { "rotationDegrees": null, "rotation": 33.0 }
        }));
        assert_eq!(out["antiTiling"]["rotationDegrees"], 33.0);
    }

    #[test]
    fn test_migration_is_stable() {
        let once = Value::Object(migrate_v0_to_v1(&json!({
            "macro": { "strength": 1.0 },
            "dust": { "strength": 0.5 },
            "antiTile": { "rotation": 20.0 }
        })));
        let twice = Value::Object(migrate_v0_to_v1(&once));
        assert_eq!(once, twice);
    }
}
