use specguard_protocol::paths::{file_name, has_dir_prefix, normalize_dir, parent_dir, strip_extension};
use specguard_protocol::WorkspaceConfig;

/// How import specifiers map onto root-relative keys, and how a handler file
/// maps back to the route it serves.
#[derive(Debug, Clone)]
pub struct PathRules {
    alias: String,
    alias_target: String,
    api_root: String,
    route_prefix: String,
}

impl PathRules {
    pub fn from_workspace(config: &WorkspaceConfig) -> Self {
        Self {
            alias: config.root_alias.clone(),
            alias_target: config.alias_target.clone(),
            api_root: normalize_dir(&config.api_root),
            route_prefix: config.api_route_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    /// Resolve an import specifier written in `importer` to a graph key.
    /// Bare package names are returned unchanged.
    pub fn resolve(&self, importer: &str, specifier: &str) -> String {
        let specifier = specifier.trim();
        if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".." {
            return specguard_protocol::paths::join_relative(parent_dir(importer), specifier);
        }
        if !self.alias.is_empty() {
            if let Some(rest) = specifier.strip_prefix(&self.alias) {
                return format!("{}{}", self.alias_target, rest);
            }
        }
        specifier.to_string()
    }

    /// Every form under which `key` may appear as an import target.
    pub fn variants(&self, key: &str) -> Vec<String> {
        let mut forms = vec![key.to_string()];
        if let Some(aliased) = self.aliased(key) {
            forms.push(aliased);
        }

        let stripped = strip_extension(key);
        if stripped != key {
            forms.push(stripped.to_string());
            if let Some(aliased) = self.aliased(stripped) {
                forms.push(aliased);
            }
        }

        if file_name(stripped) == "index" {
            let dir = parent_dir(stripped);
            if !dir.is_empty() {
                forms.push(dir.to_string());
                if let Some(aliased) = self.aliased(dir) {
                    forms.push(aliased);
                }
            }
        }

        forms.dedup();
        forms
    }

    /// Logical endpoint served by a handler file:
    /// `src/pages/api/users/index.ts` → `/api/users`.
    pub fn handler_route(&self, key: &str) -> Option<String> {
        if !has_dir_prefix(key, &self.api_root) {
            return None;
        }
        let rest = key.get(self.api_root.len()..).unwrap_or_default();
        let rest = strip_extension(rest);
        let rest = rest.strip_suffix("/index").unwrap_or(rest);
        Some(format!("{}{}", self.route_prefix, rest))
    }

    fn aliased(&self, key: &str) -> Option<String> {
        if self.alias.is_empty() || self.alias_target.is_empty() {
            return None;
        }
        key.strip_prefix(&self.alias_target)
            .map(|rest| format!("{}{}", self.alias, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules() -> PathRules {
        PathRules::from_workspace(&WorkspaceConfig::default())
    }

    #[test]
    fn resolves_relative_alias_and_bare_specifiers() {
        let r = rules();
        assert_eq!(r.resolve("src/app/admin/page.tsx", "../../lib/db"), "src/lib/db");
        assert_eq!(r.resolve("src/components/Card.tsx", "./Button"), "src/components/Button");
        assert_eq!(r.resolve("src/app/page.tsx", "@/lib/auth"), "src/lib/auth");
        assert_eq!(r.resolve("src/app/page.tsx", "react"), "react");
    }

    #[test]
    fn variants_cover_alias_stripped_and_index_forms() {
        let r = rules();
        assert_eq!(
            r.variants("src/lib/db/index.ts"),
            vec![
                "src/lib/db/index.ts",
                "@/lib/db/index.ts",
                "src/lib/db/index",
                "@/lib/db/index",
                "src/lib/db",
                "@/lib/db",
            ]
        );
        assert_eq!(r.variants("tools/run.js"), vec!["tools/run.js", "tools/run"]);
    }

    #[test]
    fn handler_routes_drop_extension_and_index() {
        let r = rules();
        assert_eq!(
            r.handler_route("src/pages/api/users/index.ts").as_deref(),
            Some("/api/users")
        );
        assert_eq!(
            r.handler_route("src/pages/api/users/[id].ts").as_deref(),
            Some("/api/users/[id]")
        );
        assert_eq!(r.handler_route("src/pages/api/index.ts").as_deref(), Some("/api"));
        assert_eq!(r.handler_route("src/app/page.tsx"), None);
    }
}
