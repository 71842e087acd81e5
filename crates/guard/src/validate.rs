use crate::reports::{MissingEntry, UnitStatus, UnitValidation, ValidationPhase, ValidationReport};
use crate::Result;
use specguard_protocol::{emit, unix_now_ms, ProgressEvent, ProgressSender, SpecguardConfig};
use specguard_spec::{
    discover_units, load_unit, ParsedUnit, PathNormalizer, SpecParser, UnitLoad, UnitRef,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed units in discovery order, shared by the validate, generate and
/// self-heal phases.
pub struct UnitCatalog {
    units: Vec<(UnitRef, UnitLoad)>,
}

impl UnitCatalog {
    pub fn load(root: &Path, config: &SpecguardConfig) -> Result<Self> {
        let parser = SpecParser::new(PathNormalizer::from_workspace(&config.workspace)?)?;
        let mut units = Vec::new();
        for unit in discover_units(root, &config.units)? {
            let load = load_unit(&parser, &unit)?;
            units.push((unit, load));
        }
        Ok(Self { units })
    }

    pub fn iter(&self) -> impl Iterator<Item = &(UnitRef, UnitLoad)> {
        self.units.iter()
    }

    pub fn get(&self, name: &str) -> Option<&(UnitRef, UnitLoad)> {
        self.units.iter().find(|(unit, _)| unit.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.units.iter().map(|(unit, _)| unit.name.clone()).collect()
    }
}

/// Compare what one unit asks for with what exists under `root`.
pub fn validate_unit(root: &Path, parsed: &ParsedUnit) -> UnitValidation {
    let warnings = parsed.warnings.iter().map(ToString::to_string).collect();
    if parsed.is_narrative() {
        return UnitValidation {
            detected: 0,
            present: 0,
            status: UnitStatus::Narrative,
            pattern: Some(parsed.pattern),
            warnings,
            missing: Vec::new(),
        };
    }

    let mut missing = Vec::new();
    for entry in &parsed.entries {
        if !root.join(&entry.path).is_file() {
            missing.push(MissingEntry {
                method: entry.method,
                route: entry.route.clone(),
                path: entry.path.clone(),
            });
        }
    }
    let detected = parsed.entries.len();
    let present = detected - missing.len();
    let status = if detected > 0 && present == detected {
        UnitStatus::Complete
    } else if present == 0 {
        UnitStatus::Missing
    } else {
        UnitStatus::Partial
    };

    UnitValidation {
        detected,
        present,
        status,
        pattern: Some(parsed.pattern),
        warnings,
        missing,
    }
}

pub fn validate_catalog(
    root: &Path,
    catalog: &UnitCatalog,
    phase: ValidationPhase,
    progress: Option<&ProgressSender>,
) -> ValidationReport {
    let mut results = BTreeMap::new();
    for (unit, load) in catalog.iter() {
        let validation = match load {
            UnitLoad::Parsed(parsed) => validate_unit(root, parsed),
            UnitLoad::NotFound => UnitValidation::not_found(),
        };
        emit(
            progress,
            ProgressEvent::UnitProcessed {
                unit: unit.name.clone(),
                status: validation.status.to_string(),
                detected: validation.detected,
                present: validation.present,
            },
        );
        results.insert(unit.name.clone(), validation);
    }

    let total_detected = results.values().map(|v| v.detected).sum();
    log::info!(
        "Validation ({phase}): {} units, {total_detected} entries detected",
        results.len()
    );
    ValidationReport {
        phase,
        generated_at_unix_ms: unix_now_ms(),
        results,
        total_detected,
    }
}
