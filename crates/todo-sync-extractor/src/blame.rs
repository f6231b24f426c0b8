use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::process::Command;

const UNCOMMITTED_EMAIL: &str = "not.committed.yet";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Attribution of one source line.
pub struct BlameInfo {
    pub commit_hash: Option<String>,
    pub committer_email: Option<String>,
}

/// Runs `git blame --line-porcelain` for a single line.
pub(crate) async fn blame_line(repo_dir: &Path, file: &str, line: usize) -> Result<BlameInfo> {
    let output = Command::new("git")
        .arg("blame")
        .arg("--line-porcelain")
        .arg(format!("-L{line},{line}"))
        .arg("--")
        .arg(file)
        .current_dir(repo_dir)
        .output()
        .await
        .with_context(|| format!("failed to run git blame for {file}:{line}"))?;
    if !output.status.success() {
        bail!(
            "git blame for {file}:{line} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(parse_line_porcelain(&String::from_utf8_lossy(&output.stdout)))
}

/// Reads the commit hash and committer email of the first porcelain entry.
pub fn parse_line_porcelain(text: &str) -> BlameInfo {
    let mut info = BlameInfo::default();
    for (index, line) in text.lines().enumerate() {
        if line.starts_with('\t') {
            break;
        }
        if index == 0 {
            info.commit_hash = line
                .split_whitespace()
                .next()
                .filter(|hash| !hash.chars().all(|ch| ch == '0'))
                .map(ToOwned::to_owned);
            continue;
        }
        if let Some(mail) = line.strip_prefix("committer-mail ") {
            let mail = mail.trim().trim_start_matches('<').trim_end_matches('>');
            if !mail.is_empty() && mail != UNCOMMITTED_EMAIL {
                info.committer_email = Some(mail.to_string());
            }
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::{parse_line_porcelain, BlameInfo};

    #[test]
    fn unit_parse_line_porcelain_reads_commit_and_committer_mail() {
        let text = "\
4f1c2e9a0b 12 12 1
author Alice
author-mail <alice@example.com>
committer Bob
committer-mail <bob@example.com>
summary Add parser
filename src/parser.rs
\t// TODO: handle empty input
";
        assert_eq!(
            parse_line_porcelain(text),
            BlameInfo {
                commit_hash: Some("4f1c2e9a0b".to_string()),
                committer_email: Some("bob@example.com".to_string()),
            }
        );
    }

    #[test]
    fn regression_parse_line_porcelain_drops_uncommitted_lines() {
        let text = "\
0000000000000000000000000000000000000000 3 3 1
author Not Committed Yet
committer-mail <not.committed.yet>
\t// TODO: local edit
";
        assert_eq!(parse_line_porcelain(text), BlameInfo::default());
    }
}
