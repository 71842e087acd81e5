use crate::entry::ParsedUnit;
use crate::parser::SpecParser;
use crate::{Result, SpecError};
use specguard_protocol::UnitsConfig;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A named unit document and where it is expected on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRef {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitLoad {
    Parsed(ParsedUnit),
    NotFound,
}

/// Ordered unit list: the configured names, or every `*.md` directly inside
/// the units directory in natural order.
pub fn discover_units(root: &Path, config: &UnitsConfig) -> Result<Vec<UnitRef>> {
    let dir = root.join(&config.dir);

    if !config.files.is_empty() {
        return Ok(config
            .files
            .iter()
            .map(|name| UnitRef {
                name: name.clone(),
                path: dir.join(name),
            })
            .collect());
    }

    if !dir.is_dir() {
        return Err(SpecError::MissingUnitsDir(dir));
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| SpecError::Io {
            path: dir.clone(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.to_lowercase().ends_with(".md") {
            continue;
        }
        units.push(UnitRef {
            name,
            path: entry.path().to_path_buf(),
        });
    }
    units.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    log::debug!("Discovered {} unit documents in {}", units.len(), dir.display());
    Ok(units)
}

/// Read and parse one unit. A missing file is a status, not an error.
pub fn load_unit(parser: &SpecParser, unit: &UnitRef) -> Result<UnitLoad> {
    if !unit.path.is_file() {
        log::warn!("Unit {} not found at {}", unit.name, unit.path.display());
        return Ok(UnitLoad::NotFound);
    }
    let text = std::fs::read_to_string(&unit.path).map_err(|source| SpecError::Io {
        path: unit.path.clone(),
        source,
    })?;
    Ok(UnitLoad::Parsed(parser.parse(&text)))
}

/// Numeric-aware ordering: `unit2.md` sorts before `unit10.md`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_digits(&mut left);
                let rn = take_digits(&mut right);
                let lt = ln.trim_start_matches('0');
                let rt = rn.trim_start_matches('0');
                let ord = lt
                    .len()
                    .cmp(&rt.len())
                    .then_with(|| lt.cmp(rt))
                    .then_with(|| ln.len().cmp(&rn.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_ascii_lowercase().cmp(&r.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}
