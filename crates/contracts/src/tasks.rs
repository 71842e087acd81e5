use crate::diff::{ContractChange, DimensionDiff};

/// Advisory follow-ups for frontend consumers, in diff order, deduplicated.
pub fn reconciliation_tasks(apis: &DimensionDiff, types: &DimensionDiff) -> Vec<String> {
    let breaking = apis.breaking.iter().chain(types.breaking.iter()).map(|b| &b.0);
    let mut tasks: Vec<String> = Vec::new();

    for change in breaking.chain(apis.additive.iter()) {
        let task = match change {
            ContractChange::MethodRemoved { method, path } => {
                format!("Update frontend to remove calls to {method} {path}")
            }
            ContractChange::MiddlewareRemoved { middleware, path } => {
                format!("Re-apply {middleware} to {path}")
            }
            ContractChange::RequestSchemaChanged { path, .. } => {
                format!("Update frontend to match new request schema for {path}")
            }
            ContractChange::ApiRemoved { path } => {
                format!("Remove or redirect frontend calls to {path}")
            }
            ContractChange::TypeRemoved { name } => {
                format!("Replace usages of removed type {name}")
            }
            ContractChange::MiddlewareAdded { middleware, path } => {
                format!("Update frontend calls to {path} to satisfy {middleware} (e.g. new headers)")
            }
            _ => continue,
        };
        if !tasks.contains(&task) {
            tasks.push(task);
        }
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Breaking;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_breaking_and_middleware_additions() {
        let apis = DimensionDiff {
            breaking: vec![
                Breaking(ContractChange::MethodRemoved {
                    method: "POST".into(),
                    path: "/api/x".into(),
                }),
                Breaking(ContractChange::MiddlewareRemoved {
                    middleware: "withAuth".into(),
                    path: "/api/x".into(),
                }),
            ],
            additive: vec![
                ContractChange::MethodAdded {
                    method: "PUT".into(),
                    path: "/api/x".into(),
                },
                ContractChange::MiddlewareAdded {
                    middleware: "withIdempotency".into(),
                    path: "/api/y".into(),
                },
            ],
            ..DimensionDiff::default()
        };
        let types = DimensionDiff {
            breaking: vec![Breaking(ContractChange::TypeRemoved {
                name: "Ledger".into(),
            })],
            ..DimensionDiff::default()
        };

        assert_eq!(
            reconciliation_tasks(&apis, &types),
            vec![
                "Update frontend to remove calls to POST /api/x",
                "Re-apply withAuth to /api/x",
                "Replace usages of removed type Ledger",
                "Update frontend calls to /api/y to satisfy withIdempotency (e.g. new headers)",
            ]
        );
    }

    #[test]
    fn duplicates_collapse() {
        let change = ContractChange::RequestSchemaChanged {
            path: "/api/x".into(),
            old: None,
            new: Some("CreateXSchema".into()),
        };
        let apis = DimensionDiff {
            breaking: vec![Breaking(change.clone()), Breaking(change)],
            ..DimensionDiff::default()
        };
        assert_eq!(
            reconciliation_tasks(&apis, &DimensionDiff::default()),
            vec!["Update frontend to match new request schema for /api/x"]
        );
    }
}
