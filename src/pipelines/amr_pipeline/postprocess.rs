use crate::data::parallel::read_lines;
use anyhow::Context;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Suffix of the file smatch reads, appended to the raw prediction file name.
pub const RESTORED_SUFFIX: &str = ".restore.pruned.coref.all.form";

const EMPTY_GRAPH: &str = "(a / amr-empty)";

/// `<dir>/<name>.restore.pruned.coref.all.form` for `<dir>/<name>`.
pub fn restored_path(pred_file: &Path) -> PathBuf {
    let mut name = pred_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(RESTORED_SUFFIX);
    pred_file.with_file_name(name)
}

/// Turns raw linearized predictions into the graph file smatch scores.
pub trait AmrPostprocessor {
    /// Reads `pred_file` (one prediction per line) and `sent_file` (one source
    /// sentence per line) and writes [`restored_path`] of `pred_file`.
    fn process(&self, pred_file: &Path, sent_file: &Path) -> anyhow::Result<PathBuf>;
}

/// Repairs bracket structure and writes one `# ::snt` annotated graph per
/// prediction, separated by blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreBrackets;

impl AmrPostprocessor for RestoreBrackets {
    fn process(&self, pred_file: &Path, sent_file: &Path) -> anyhow::Result<PathBuf> {
        let predictions = read_lines(pred_file)?;
        let sentences = read_lines(sent_file)?;
        if sentences.len() != predictions.len() {
            tracing::warn!(
                predictions = predictions.len(),
                sentences = sentences.len(),
                "sentence file does not match predictions"
            );
        }

        let mut out = String::new();
        for (i, prediction) in predictions.iter().enumerate() {
            let sentence = sentences.get(i).map(String::as_str).unwrap_or("");
            writeln!(out, "# ::snt {sentence}")?;
            writeln!(out, "{}", restore_graph(prediction))?;
            out.push('\n');
        }

        let target = restored_path(pred_file);
        std::fs::write(&target, out).with_context(|| format!("writing {}", target.display()))?;
        Ok(target)
    }
}

/// Drop unmatched `)`, close unclosed `(`, wrap bare content in a node.
/// Parentheses inside double-quoted constants are left alone.
pub fn restore_graph(linear: &str) -> String {
    let trimmed = linear.trim();
    if trimmed.is_empty() {
        return EMPTY_GRAPH.to_string();
    }

    let mut out = String::with_capacity(trimmed.len() + 2);
    let mut depth = 0usize;
    let mut in_quote = false;
    for c in trimmed.chars() {
        match c {
            '"' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                if depth == 0 {
                    continue;
                }
                depth -= 1;
            }
            _ => {}
        }
        out.push(c);
    }
    if in_quote {
        out.push('"');
    }
    out.extend(std::iter::repeat(')').take(depth));

    let out = out.trim().to_string();
    if out.is_empty() {
        EMPTY_GRAPH.to_string()
    } else if !out.starts_with('(') {
        format!("({out})")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restored_path_appends_suffix() {
        let p = restored_path(Path::new("/tmp/step_1/en/pred.txt.tf"));
        assert_eq!(
            p,
            PathBuf::from("/tmp/step_1/en/pred.txt.tf.restore.pruned.coref.all.form")
        );
    }

    #[test]
    fn balances_brackets() {
        assert_eq!(restore_graph("(w / want-01 :ARG0 (b / boy"), "(w / want-01 :ARG0 (b / boy))");
        assert_eq!(restore_graph(") (a / a))"), "(a / a)");
        assert_eq!(restore_graph("  "), EMPTY_GRAPH);
        assert_eq!(restore_graph(")))"), EMPTY_GRAPH);
        assert_eq!(restore_graph("a / amr"), "(a / amr)");
    }

    #[test]
    fn quoted_parens_are_literal() {
        assert_eq!(
            restore_graph("(n / name :op1 \"(x\")"),
            "(n / name :op1 \"(x\")"
        );
    }

    #[test]
    fn writes_annotated_graphs() {
        let dir = tempfile::tempdir().unwrap();
        let pred = dir.path().join("pred.txt.tf");
        let sent = dir.path().join("sents.txt");
        std::fs::write(&pred, "(a / b\n\n").unwrap();
        std::fs::write(&sent, "first\nsecond\n").unwrap();

        let out = RestoreBrackets.process(&pred, &sent).unwrap();
        let content = std::fs::read_to_string(out).unwrap();
        assert_eq!(
            content,
            "# ::snt first\n(a / b)\n\n# ::snt second\n(a / amr-empty)\n\n"
        );
    }
}
