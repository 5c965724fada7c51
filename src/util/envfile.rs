use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parse `KEY=value` lines. Blank lines and `#` comments are ignored; one level
/// of matching single or double quotes around the value is stripped.
pub fn parse_env_str(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        if let Some(eq) = s.find('=') {
            let key = s[..eq].trim();
            let mut val = s[eq + 1..].trim().to_string();
            if val.len() >= 2
                && ((val.starts_with('"') && val.ends_with('"'))
                    || (val.starts_with('\'') && val.ends_with('\'')))
            {
                val = val[1..val.len() - 1].to_string();
            }
            map.insert(key.to_string(), val);
        } else {
            log::warn!("ignoring .env line {} without '=': {}", idx + 1, line);
        }
    }
    map
}

/// Parse an env file; a missing file yields an empty map.
pub fn parse_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_env_str(&content))
}

/// Load an env file into the process environment without overriding variables
/// that are already set. Returns the keys that were applied.
pub fn load_env_file(path: &Path) -> Result<Vec<String>> {
    let mut applied = Vec::new();
    for (k, v) in parse_env_file(path)? {
        if std::env::var_os(&k).is_none() {
            unsafe {
                std::env::set_var(&k, &v);
            }
            applied.push(k);
        }
    }
    applied.sort();
    Ok(applied)
}

/// Load `.env` from the current working directory, if present.
pub fn load_dotenv_if_present() -> Result<Vec<String>> {
    load_env_file(Path::new(".env"))
}

pub fn write_env_template(path: &Path) -> Result<()> {
    let mut f =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let template = r#"# folder-matcher environment configuration template
# Copy this file to .env and fill in your folders.
# Any of these variables can also be provided via the system environment or flags.

# Folder of data files (.xlsx / .csv) to search
FOLDER_MATCHER_DATA_DIR=./data

# Folder of reference files whose Name / Father Name rows are looked for
FOLDER_MATCHER_REFERENCE_DIR=./reference

# Folder the matched_data_* / partial_matched_data_* file is written to
FOLDER_MATCHER_OUTPUT_DIR=./output

# Optional
#FOLDER_MATCHER_FORMAT=xlsx
#FOLDER_MATCHER_LOWERCASE_KEYS=false
#FOLDER_MATCHER_NO_CACHE=false
#RUST_LOG=info
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quotes_comments_and_blank_lines() {
        let m = parse_env_str(
            "# comment\n\nFOLDER_MATCHER_DATA_DIR=\"C:/My Data\"\nA='x'\nB = plain \nnot a pair\n",
        );
        assert_eq!(m.get("FOLDER_MATCHER_DATA_DIR").unwrap(), "C:/My Data");
        assert_eq!(m.get("A").unwrap(), "x");
        assert_eq!(m.get("B").unwrap(), "plain");
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn template_round_trips_through_the_parser() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join(".env.template");
        write_env_template(&p).unwrap();
        let m = parse_env_file(&p).unwrap();
        assert_eq!(m.get("FOLDER_MATCHER_OUTPUT_DIR").unwrap(), "./output");
        assert!(!m.contains_key("FOLDER_MATCHER_FORMAT"));
    }

    #[test]
    fn load_does_not_override_existing_vars() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join(".env");
        fs::write(
            &p,
            "FM_ENVFILE_TEST_SET=from_file\nFM_ENVFILE_TEST_NEW=fresh\n",
        )
        .unwrap();
        unsafe {
            std::env::set_var("FM_ENVFILE_TEST_SET", "from_env");
        }
        let applied = load_env_file(&p).unwrap();
        assert_eq!(applied, vec!["FM_ENVFILE_TEST_NEW".to_string()]);
        assert_eq!(std::env::var("FM_ENVFILE_TEST_SET").unwrap(), "from_env");
        assert_eq!(std::env::var("FM_ENVFILE_TEST_NEW").unwrap(), "fresh");
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(parse_env_file(&dir.path().join("none")).unwrap().is_empty());
    }
}
