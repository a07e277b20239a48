use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are ignored, surrounding
/// quotes are removed. Lines without `=` are skipped with a warning.
pub fn parse_env_str(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((key, val)) = s.split_once('=') else {
            log::warn!("ignoring .env line {} without '=': {}", idx + 1, line);
            continue;
        };
        let mut val = val.trim();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = &val[1..val.len() - 1];
        }
        map.insert(key.trim().to_string(), val.to_string());
    }
    map
}

/// Load an env file into the process environment without overriding variables
/// that are already set. A missing file is not an error. Returns the parsed map.
pub fn load_env_file_from(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let map = parse_env_str(&content);
    for (k, v) in &map {
        if std::env::var_os(k).is_none() {
            // Called from main before any other thread starts
            unsafe {
                std::env::set_var(k, v);
            }
        }
    }
    Ok(map)
}

/// Load `.env` from the current working directory, if present.
pub fn load_dotenv_if_present() -> Result<()> {
    let map = load_env_file_from(Path::new(".env"))?;
    if !map.is_empty() {
        log::debug!("loaded {} variables from .env", map.len());
    }
    Ok(())
}

/// Generate a .env.template file with the defaults commented out.
pub fn write_env_template(path: &Path) -> Result<()> {
    let mut f = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let template = r#"# neighbor_finder environment configuration template
# Copy this file to .env and adjust. Variables already set in the
# system environment take precedence over this file.

# Input files
#NEIGHBOR_ROSTER=datos.csv
#NEIGHBOR_OVERRIDES=correcciones.csv
# auto | comma | semicolon
#NEIGHBOR_DELIMITER=auto
#NEIGHBOR_OVERRIDES_DELIMITER=auto

# Roster column names
#NEIGHBOR_COL_FAMILY=Apellido
#NEIGHBOR_COL_GIVEN=Nombre
#NEIGHBOR_COL_ID=Matricula
#NEIGHBOR_COL_ADDRESS=Domicilio

# Street normalization: all | leading
#NEIGHBOR_REPLACE_SCOPE=all

# Output of the `detect` subcommand
#NEIGHBOR_SUGGESTIONS=correcciones_sugeridas.csv

# Log level (error, warn, info, debug, trace)
#RUST_LOG=info
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}
