use std::fmt;

use anyhow::{anyhow, bail, Result};

const REF_PREFIX_SEGMENTS: &[&str] = &["refs", "tags", "heads", "remotes"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// `owner/name` repository identity.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid repository '{raw}', expected owner/repo"))?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{raw}', expected owner/repo");
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Strips leading `refs`/`heads`/`tags`/`remotes` segments from a git ref.
pub fn branch_from_ref(git_ref: &str) -> String {
    let parts = git_ref.trim().split('/').collect::<Vec<_>>();
    let start = parts
        .iter()
        .position(|part| !REF_PREFIX_SEGMENTS.contains(part))
        .unwrap_or(parts.len());
    parts[start..].join("/")
}
