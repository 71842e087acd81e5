use crate::snapshot::{ApiContract, ContractSnapshot};
use crate::Result;
use serde::{Serialize, Serializer};
use specguard_protocol::write_json_atomic;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One independently actionable difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractChange {
    ApiRemoved { path: String },
    ApiAdded { path: String, methods: Vec<String> },
    ApiUnchanged { path: String },
    MethodRemoved { method: String, path: String },
    MethodAdded { method: String, path: String },
    MiddlewareRemoved { middleware: String, path: String },
    MiddlewareAdded { middleware: String, path: String },
    RequestSchemaChanged {
        path: String,
        old: Option<String>,
        new: Option<String>,
    },
    TypeRemoved { name: String },
    TypeAdded { name: String },
    TypeUnchanged { name: String },
    ComponentRemoved { name: String },
    ComponentAdded { name: String },
    ComponentUnchanged { name: String },
}

impl fmt::Display for ContractChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractChange::ApiRemoved { path } => write!(f, "API removed: {path}"),
            ContractChange::ApiAdded { path, methods } => {
                write!(f, "API added: {path} ({})", methods.join(", "))
            }
            ContractChange::ApiUnchanged { path } => write!(f, "Unchanged: {path}"),
            ContractChange::MethodRemoved { method, path } => {
                write!(f, "Method removed: {method} {path}")
            }
            ContractChange::MethodAdded { method, path } => write!(f, "Method added: {method} {path}"),
            ContractChange::MiddlewareRemoved { middleware, path } => {
                write!(f, "Middleware removed: {middleware} from {path}")
            }
            ContractChange::MiddlewareAdded { middleware, path } => {
                write!(f, "Middleware added: {middleware} to {path}")
            }
            ContractChange::RequestSchemaChanged { path, old, new } => write!(
                f,
                "Request schema changed: {path} ({} -> {})",
                old.as_deref().unwrap_or("none"),
                new.as_deref().unwrap_or("none")
            ),
            ContractChange::TypeRemoved { name } => write!(f, "Type removed: {name}"),
            ContractChange::TypeAdded { name } => write!(f, "Type added: {name}"),
            ContractChange::TypeUnchanged { name } => write!(f, "Type unchanged: {name}"),
            ContractChange::ComponentRemoved { name } => write!(f, "Component removed: {name}"),
            ContractChange::ComponentAdded { name } => write!(f, "Component added: {name}"),
            ContractChange::ComponentUnchanged { name } => {
                write!(f, "Component unchanged: {name}")
            }
        }
    }
}

/// Breaking entries render with a `BREAKING:` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breaking(pub ContractChange);

impl fmt::Display for Breaking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BREAKING: {}", self.0)
    }
}

impl Serialize for ContractChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for Breaking {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Changes along one dimension (apis, types or components).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimensionDiff {
    pub breaking: Vec<Breaking>,
    pub additive: Vec<ContractChange>,
    pub unchanged: Vec<ContractChange>,
    pub removed: Vec<ContractChange>,
}

impl DimensionDiff {
    pub fn is_empty(&self) -> bool {
        self.breaking.is_empty() && self.additive.is_empty() && self.removed.is_empty()
    }
}

/// Per-path rules: anything the old contract offered that the new one lacks
/// is breaking; anything only the new one offers is additive.
pub fn diff_apis(
    old: &BTreeMap<String, ApiContract>,
    new: &BTreeMap<String, ApiContract>,
) -> DimensionDiff {
    let mut diff = DimensionDiff::default();

    for (path, old_api) in old {
        let Some(new_api) = new.get(path) else {
            let removed = ContractChange::ApiRemoved { path: path.clone() };
            diff.removed.push(removed.clone());
            diff.breaking.push(Breaking(removed));
            continue;
        };

        for method in old_api.methods.difference(&new_api.methods) {
            diff.breaking.push(Breaking(ContractChange::MethodRemoved {
                method: method.clone(),
                path: path.clone(),
            }));
        }
        for middleware in old_api.middleware.difference(&new_api.middleware) {
            diff.breaking.push(Breaking(ContractChange::MiddlewareRemoved {
                middleware: middleware.clone(),
                path: path.clone(),
            }));
        }
        if old_api.request_schema_id != new_api.request_schema_id {
            diff.breaking.push(Breaking(ContractChange::RequestSchemaChanged {
                path: path.clone(),
                old: old_api.request_schema_id.clone(),
                new: new_api.request_schema_id.clone(),
            }));
        }
        for method in new_api.methods.difference(&old_api.methods) {
            diff.additive.push(ContractChange::MethodAdded {
                method: method.clone(),
                path: path.clone(),
            });
        }
        for middleware in new_api.middleware.difference(&old_api.middleware) {
            diff.additive.push(ContractChange::MiddlewareAdded {
                middleware: middleware.clone(),
                path: path.clone(),
            });
        }

        if old_api.methods == new_api.methods
            && old_api.middleware == new_api.middleware
            && old_api.request_schema_id == new_api.request_schema_id
        {
            diff.unchanged.push(ContractChange::ApiUnchanged { path: path.clone() });
        }
    }

    for (path, new_api) in new {
        if !old.contains_key(path) {
            diff.additive.push(ContractChange::ApiAdded {
                path: path.clone(),
                methods: new_api.methods.iter().cloned().collect(),
            });
        }
    }

    diff
}

/// Removal is breaking; a type whose defining file moved is reported neither
/// unchanged nor changed.
pub fn diff_types(old: &BTreeMap<String, String>, new: &BTreeMap<String, String>) -> DimensionDiff {
    let mut diff = DimensionDiff::default();
    for (name, old_file) in old {
        match new.get(name) {
            None => {
                let removed = ContractChange::TypeRemoved { name: name.clone() };
                diff.removed.push(removed.clone());
                diff.breaking.push(Breaking(removed));
            }
            Some(new_file) if new_file == old_file => {
                diff.unchanged.push(ContractChange::TypeUnchanged { name: name.clone() });
            }
            Some(_) => {}
        }
    }
    for name in new.keys() {
        if !old.contains_key(name) {
            diff.additive.push(ContractChange::TypeAdded { name: name.clone() });
        }
    }
    diff
}

/// Same shape as types, but removing a component is never breaking.
pub fn diff_components(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> DimensionDiff {
    let mut diff = DimensionDiff::default();
    for (name, old_file) in old {
        match new.get(name) {
            None => diff
                .removed
                .push(ContractChange::ComponentRemoved { name: name.clone() }),
            Some(new_file) if new_file == old_file => diff
                .unchanged
                .push(ContractChange::ComponentUnchanged { name: name.clone() }),
            Some(_) => {}
        }
    }
    for name in new.keys() {
        if !old.contains_key(name) {
            diff.additive
                .push(ContractChange::ComponentAdded { name: name.clone() });
        }
    }
    diff
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractStatus {
    /// No additive or breaking change
    Green,
    /// Additive changes only
    Yellow,
    /// At least one breaking change
    Red,
}

impl ContractStatus {
    pub const fn exit_code(self) -> u8 {
        match self {
            ContractStatus::Red => 1,
            ContractStatus::Yellow | ContractStatus::Green => 0,
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractStatus::Green => f.write_str("GREEN"),
            ContractStatus::Yellow => f.write_str("YELLOW"),
            ContractStatus::Red => f.write_str("RED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDiff {
    pub old_version: u32,
    pub new_version: u32,
    pub apis: DimensionDiff,
    pub types: DimensionDiff,
    pub components: DimensionDiff,
    pub status: ContractStatus,
    pub reconciliation_tasks: Vec<String>,
}

impl ContractDiff {
    pub fn dimensions(&self) -> [(&'static str, &DimensionDiff); 3] {
        [
            ("API Endpoints", &self.apis),
            ("Types", &self.types),
            ("Components", &self.components),
        ]
    }

    /// Writes `contract_diff_<old>_<new>.json` next to the snapshots.
    pub fn save(&self, contracts_dir: &Path) -> Result<PathBuf> {
        let path = contracts_dir.join(format!(
            "contract_diff_{}_{}.json",
            self.old_version, self.new_version
        ));
        write_json_atomic(&path, self)?;
        Ok(path)
    }
}

pub fn diff(old: &ContractSnapshot, new: &ContractSnapshot) -> ContractDiff {
    let apis = diff_apis(&old.apis, &new.apis);
    let types = diff_types(&old.types, &new.types);
    let components = diff_components(&old.components, &new.components);

    let dims = [&apis, &types, &components];
    let status = if dims.iter().any(|d| !d.breaking.is_empty()) {
        ContractStatus::Red
    } else if dims.iter().any(|d| !d.additive.is_empty()) {
        ContractStatus::Yellow
    } else {
        ContractStatus::Green
    };
    let reconciliation_tasks = crate::tasks::reconciliation_tasks(&apis, &types);

    ContractDiff {
        old_version: old.unit_version,
        new_version: new.unit_version,
        apis,
        types,
        components,
        status,
        reconciliation_tasks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn api(methods: &[&str], middleware: &[&str], schema: Option<&str>) -> ApiContract {
        ApiContract {
            methods: methods.iter().map(|m| m.to_string()).collect(),
            middleware: middleware.iter().map(|m| m.to_string()).collect(),
            request_schema_id: schema.map(str::to_string),
            response_schema_id: None,
            file: "src/pages/api/x.ts".to_string(),
        }
    }

    fn snapshot(version: u32, apis: &[(&str, ApiContract)], types: &[(&str, &str)], components: &[(&str, &str)]) -> ContractSnapshot {
        ContractSnapshot::new(
            version,
            apis.iter().map(|(p, a)| (p.to_string(), a.clone())).collect(),
            types.iter().map(|(n, f)| (n.to_string(), f.to_string())).collect(),
            components.iter().map(|(n, f)| (n.to_string(), f.to_string())).collect(),
        )
        .unwrap()
    }

    fn strings<T: ToString>(items: &[T]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn identical_snapshots_are_green_and_fully_unchanged() {
        let s = snapshot(
            3,
            &[
                ("/api/x", api(&["GET", "POST"], &["withAuth"], Some("CreateXSchema"))),
                ("/api/y", api(&["GET"], &[], None)),
            ],
            &[("Invoice", "src/server/services/billing.ts")],
            &[("Card", "src/components/Card.tsx")],
        );
        let result = diff(&s, &s);
        assert_eq!(result.status, ContractStatus::Green);
        for (_, dim) in result.dimensions() {
            assert!(dim.is_empty());
        }
        assert_eq!(strings(&result.apis.unchanged), vec!["Unchanged: /api/x", "Unchanged: /api/y"]);
        assert_eq!(result.types.unchanged.len(), 1);
        assert_eq!(result.components.unchanged.len(), 1);
        assert!(result.reconciliation_tasks.is_empty());
    }

    #[test]
    fn removed_method_and_middleware_are_breaking() {
        let old = snapshot(3, &[("/api/x", api(&["GET", "POST"], &["auth"], None))], &[], &[]);
        let new = snapshot(4, &[("/api/x", api(&["GET"], &[], None))], &[], &[]);
        let result = diff(&old, &new);

        assert_eq!(
            strings(&result.apis.breaking),
            vec![
                "BREAKING: Method removed: POST /api/x",
                "BREAKING: Middleware removed: auth from /api/x",
            ]
        );
        assert!(result.apis.additive.is_empty());
        assert!(result.apis.unchanged.is_empty());
        assert_eq!(result.status, ContractStatus::Red);
        assert_eq!(result.status.exit_code(), 1);
    }

    #[test]
    fn additions_are_yellow() {
        let old = snapshot(3, &[("/api/x", api(&["GET"], &[], None))], &[], &[]);
        let new = snapshot(
            4,
            &[
                ("/api/x", api(&["GET", "PUT"], &["withIdempotency"], None)),
                ("/api/z", api(&["DELETE", "GET"], &[], None)),
            ],
            &[("Payout", "src/server/services/payouts.ts")],
            &[],
        );
        let result = diff(&old, &new);
        assert_eq!(
            strings(&result.apis.additive),
            vec![
                "Method added: PUT /api/x",
                "Middleware added: withIdempotency to /api/x",
                "API added: /api/z (DELETE, GET)",
            ]
        );
        assert_eq!(strings(&result.types.additive), vec!["Type added: Payout"]);
        assert_eq!(result.status, ContractStatus::Yellow);
        assert_eq!(result.status.exit_code(), 0);
    }

    #[test]
    fn removals_by_dimension() {
        let old = snapshot(
            3,
            &[("/api/gone", api(&["GET"], &[], None))],
            &[("Ledger", "src/server/services/ledger.ts")],
            &[("OldPanel", "src/components/OldPanel.tsx")],
        );
        let new = snapshot(4, &[], &[], &[]);
        let result = diff(&old, &new);

        assert_eq!(strings(&result.apis.removed), vec!["API removed: /api/gone"]);
        assert_eq!(strings(&result.apis.breaking), vec!["BREAKING: API removed: /api/gone"]);
        assert_eq!(strings(&result.types.breaking), vec!["BREAKING: Type removed: Ledger"]);
        assert_eq!(
            strings(&result.components.removed),
            vec!["Component removed: OldPanel"]
        );
        assert!(result.components.breaking.is_empty());
    }

    #[test]
    fn schema_change_is_breaking_and_serializes_as_strings() {
        let old = snapshot(1, &[("/api/x", api(&["POST"], &[], Some("CreateXSchema")))], &[], &[]);
        let new = snapshot(2, &[("/api/x", api(&["POST"], &[], Some("CreateXRequestSchema")))], &[], &[]);
        let result = diff(&old, &new);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "RED");
        assert_eq!(
            json["apis"]["breaking"][0],
            "BREAKING: Request schema changed: /api/x (CreateXSchema -> CreateXRequestSchema)"
        );
        assert_eq!(json["oldVersion"], 1);
    }

    #[test]
    fn component_only_removal_stays_green() {
        let old = snapshot(1, &[], &[], &[("Card", "src/components/Card.tsx")]);
        let new = snapshot(2, &[], &[], &[]);
        assert_eq!(diff(&old, &new).status, ContractStatus::Green);
    }
}
