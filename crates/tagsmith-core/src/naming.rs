//! Output naming for finished records.
//!
//! The engine merges exactly two computed fields into every record: the
//! target file name and the full output path. Everything else in a record
//! passes through untouched.

use serde_json::Value;
use tagsmith_abstraction::Record;

/// Record key for the computed target file name.
pub const FILE_NAME_KEY: &str = "file_name";
/// Record key for the computed full output path.
pub const FILE_PATH_KEY: &str = "file_path";

/// How target file names are derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingRule {
    /// Keep the original file name.
    Original,
    /// Apply a pattern with a `{i}` placeholder for the 1-based item index.
    /// The original extension is preserved.
    Pattern(String),
}

/// Naming configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    /// The naming rule.
    pub rule: NamingRule,
    /// Directory prefix for the full output path.
    pub output_dir: String,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self { rule: NamingRule::Original, output_dir: String::new() }
    }
}

impl OutputNaming {
    /// Computes the target file name for an item.
    #[must_use]
    pub fn target_name(&self, original: &str, index: usize) -> String {
        match &self.rule {
            NamingRule::Original => original.to_string(),
            NamingRule::Pattern(pattern) => {
                let stem = pattern.replace("{i}", &(index + 1).to_string());
                match original.rsplit_once('.') {
                    Some((_, ext)) if !ext.is_empty() => format!("{stem}.{ext}"),
                    _ => stem,
                }
            }
        }
    }

    /// Joins the output directory and a file name into a full path string.
    #[must_use]
    pub fn full_path(&self, name: &str) -> String {
        if self.output_dir.is_empty() {
            return name.to_string();
        }
        let dir = self.output_dir.trim_end_matches('/');
        format!("{dir}/{name}")
    }

    /// Merges the two computed fields into a record.
    pub fn merge_into(&self, record: &mut Record, original: &str, index: usize) {
        let name = self.target_name(original, index);
        let path = self.full_path(&name);
        record.insert(FILE_NAME_KEY.to_string(), Value::String(name));
        record.insert(FILE_PATH_KEY.to_string(), Value::String(path));
    }
}
