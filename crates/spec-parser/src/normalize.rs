use crate::Result;
use regex::Regex;
use specguard_protocol::paths::normalize_dir;
use specguard_protocol::WorkspaceConfig;

const MAX_PASSES: usize = 8;

/// Maps a route as written in a document (`/api/v1/users/{id}`) to the
/// handler file that serves it (`src/pages/api/users/[id].ts`).
///
/// `normalize` is applied until it reaches a fixed point, so feeding its output
/// back in returns the same string.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    route_prefix: String,
    api_root: String,
    extension: String,
    braces: Regex,
    versions: Regex,
}

impl PathNormalizer {
    pub fn new(
        route_prefix: impl Into<String>,
        api_root: impl Into<String>,
        extension: impl Into<String>,
    ) -> Result<Self> {
        let route_prefix = route_prefix.into().trim().trim_end_matches('/').to_string();
        let extension = extension.into().trim().trim_start_matches('.').to_string();
        Ok(Self {
            route_prefix,
            api_root: normalize_dir(&api_root.into()),
            extension,
            braces: Regex::new(r"\{([^{}/]*)\}")?,
            versions: Regex::new(r"(/v\d+)+/")?,
        })
    }

    pub fn from_workspace(config: &WorkspaceConfig) -> Result<Self> {
        Self::new(
            &config.api_route_prefix,
            &config.api_root,
            &config.api_extension,
        )
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut current = self.single_pass(raw);
        for _ in 0..MAX_PASSES {
            let next = self.single_pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// The literal route with document noise (quotes, query, trailing
    /// punctuation) removed.
    pub fn clean_route(&self, raw: &str) -> String {
        sanitize(raw)
    }

    fn single_pass(&self, raw: &str) -> String {
        let mut value = sanitize(raw);
        if value.is_empty() {
            return value;
        }

        value = replace_to_fixpoint(&self.braces, &value, "[$1]");
        value = replace_to_fixpoint(&self.versions, &value, "/");
        let value = value.trim_end_matches('/');
        if value.is_empty() {
            return String::new();
        }

        let mut value = self.rewrite_prefix(value);
        if !self.extension.is_empty() && !value.ends_with(&format!(".{}", self.extension)) {
            value.push('.');
            value.push_str(&self.extension);
        }
        value
    }

    fn rewrite_prefix(&self, value: &str) -> String {
        if self.route_prefix.is_empty() {
            return value.to_string();
        }
        if value == self.route_prefix {
            return self.api_root.clone();
        }
        match value.strip_prefix(&self.route_prefix) {
            Some(rest) if rest.starts_with('/') => format!("{}{}", self.api_root, rest),
            _ => value.to_string(),
        }
    }
}

fn sanitize(raw: &str) -> String {
    let value = raw.replace('\\', "/");
    let value = value.trim_start_matches(|c: char| c.is_whitespace() || is_quote(c));
    let value = match value.find(['?', '#']) {
        Some(idx) => &value[..idx],
        None => value,
    };
    value
        .trim_end_matches(|c: char| {
            c.is_whitespace() || is_quote(c) || matches!(c, ',' | ';' | ')' | '*' | '/' | '.')
        })
        .to_string()
}

fn is_quote(c: char) -> bool {
    matches!(c, '`' | '"' | '\'')
}

fn replace_to_fixpoint(re: &Regex, value: &str, replacement: &str) -> String {
    let mut current = value.to_string();
    loop {
        let next = re.replace_all(&current, replacement).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}
