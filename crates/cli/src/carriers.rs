//! `shipcheck carriers` - approved carrier list management, plus the carrier
//! resolution shared by `check`.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use shipcheck_compliance::config::CheckPolicy;
use shipcheck_compliance::model::normalize_carrier;
use shipcheck_compliance::ApprovedCarrierSet;
use shipcheck_config::{Settings, DEFAULT_CARRIERS};

use crate::CliError;

#[derive(Subcommand)]
pub enum CarrierCommands {
    /// Print the approved carrier list
    #[command(after_help = "\
Examples:
  shipcheck carriers list
  shipcheck carriers list --json")]
    List {
        /// Output a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Approve one or more carriers
    #[command(after_help = "\
Examples:
  shipcheck carriers add \"Amazon Logistics\"
  shipcheck carriers add OnTrac LaserShip")]
    Add {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Remove carriers from the approved list (case-insensitive)
    #[command(after_help = "\
Examples:
  shipcheck carriers remove GSO")]
    Remove {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Replace the approved list with the built-in defaults
    Reset,
}

pub fn cmd_carriers(cmd: CarrierCommands, settings: &Settings) -> Result<(), CliError> {
    match cmd {
        CarrierCommands::List { json } => cmd_carriers_list(settings, json),
        CarrierCommands::Add { names } => cmd_carriers_add(settings, &names),
        CarrierCommands::Remove { names } => cmd_carriers_remove(settings, &names),
        CarrierCommands::Reset => cmd_carriers_reset(settings),
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Where the approved set used by a check came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarrierOrigin {
    /// `--carriers` on the command line.
    Flag(PathBuf),
    /// The policy's `[carriers]` table.
    Policy,
    /// The list configured in (or next to) the user settings.
    Settings(PathBuf),
    Defaults,
}

impl fmt::Display for CarrierOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(path) | Self::Settings(path) => write!(f, "{}", path.display()),
            Self::Policy => f.write_str("policy"),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Pick the approved carrier set for a check. The first source that is
/// present wins: `--carriers`, the policy's `[carriers]` table (inline names
/// merged with its file), the settings list, the built-in defaults.
pub fn resolve_carriers(
    flag: Option<&Path>,
    policy: &CheckPolicy,
    policy_dir: &Path,
    settings: &Settings,
) -> Result<(ApprovedCarrierSet, CarrierOrigin), CliError> {
    if let Some(path) = flag {
        let set = shipcheck_io::load_carriers(path)?;
        return Ok((set, CarrierOrigin::Flag(path.to_path_buf())));
    }

    let source = &policy.carriers;
    if !source.approved.is_empty() || source.file.is_some() {
        let mut set = ApprovedCarrierSet::from_names(&source.approved);
        if let Some(ref file) = source.file {
            let loaded = shipcheck_io::load_carriers(&policy_dir.join(file))?;
            for name in loaded.names() {
                set.insert(name);
            }
        }
        return Ok((set, CarrierOrigin::Policy));
    }

    let path = settings.carriers_path();
    if let Some(set) = shipcheck_io::load_carriers_if_exists(&path)? {
        return Ok((set, CarrierOrigin::Settings(path)));
    }

    Ok((ApprovedCarrierSet::from_names(DEFAULT_CARRIERS), CarrierOrigin::Defaults))
}

// ============================================================================
// Commands
// ============================================================================

/// The editable list: the settings file if it exists, else the defaults.
fn load_editable(settings: &Settings) -> Result<(PathBuf, Vec<String>), CliError> {
    let path = settings.carriers_path();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(CliError::usage(format!(
            "{} is not a JSON carrier list; edit it directly",
            path.display()
        ))
        .with_hint("only .json lists can be changed with `shipcheck carriers`"));
    }

    let names = match shipcheck_io::load_carriers_if_exists(&path)? {
        Some(set) => set.names().to_vec(),
        None => DEFAULT_CARRIERS.iter().map(|c| c.to_string()).collect(),
    };
    Ok((path, names))
}

fn save(path: &Path, names: &[String]) -> Result<(), CliError> {
    shipcheck_io::save_carriers_json(names, path)?;
    tracing::info!(path = %path.display(), count = names.len(), "saved carrier list");
    Ok(())
}

fn cmd_carriers_list(settings: &Settings, json: bool) -> Result<(), CliError> {
    let path = settings.carriers_path();
    let (names, origin) = match shipcheck_io::load_carriers_if_exists(&path)? {
        Some(set) => (set.names().to_vec(), CarrierOrigin::Settings(path)),
        None => (
            DEFAULT_CARRIERS.iter().map(|c| c.to_string()).collect(),
            CarrierOrigin::Defaults,
        ),
    };

    if json {
        let out = serde_json::to_string_pretty(&names)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
    } else {
        for name in &names {
            println!("{name}");
        }
    }
    eprintln!("{} approved carriers ({origin})", names.len());
    Ok(())
}

fn cmd_carriers_add(settings: &Settings, names: &[String]) -> Result<(), CliError> {
    let (path, existing) = load_editable(settings)?;
    let mut set = ApprovedCarrierSet::from_names(&existing);

    let mut added = 0;
    for name in names {
        if name.trim().is_empty() {
            return Err(CliError::usage("carrier name must not be blank"));
        }
        if set.insert(name) {
            eprintln!("added {}", name.trim());
            added += 1;
        } else {
            eprintln!("already approved: {}", name.trim());
        }
    }

    if added > 0 {
        save(&path, set.names())?;
    }
    Ok(())
}

fn cmd_carriers_remove(settings: &Settings, names: &[String]) -> Result<(), CliError> {
    let (path, existing) = load_editable(settings)?;

    let mut kept = existing;
    let mut removed = 0;
    for name in names {
        let key = normalize_carrier(name);
        let before = kept.len();
        kept.retain(|c| normalize_carrier(c) != key);
        if kept.len() < before {
            eprintln!("removed {}", name.trim());
            removed += 1;
        } else {
            eprintln!("not in list: {}", name.trim());
        }
    }

    if removed == 0 {
        return Err(CliError::usage("no carriers removed"));
    }
    save(&path, &kept)
}

fn cmd_carriers_reset(settings: &Settings) -> Result<(), CliError> {
    let (path, _) = load_editable(settings)?;
    let names: Vec<String> = DEFAULT_CARRIERS.iter().map(|c| c.to_string()).collect();
    save(&path, &names)?;
    eprintln!("reset {} to {} default carriers", path.display(), names.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(path: &Path) -> Settings {
        Settings {
            carriers_file: Some(path.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn flag_wins() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join("flag.txt");
        std::fs::write(&flag, "OnTrac\n").unwrap();
        let policy = CheckPolicy::from_toml("[carriers]\napproved = [\"UPS\"]").unwrap();

        let (set, origin) =
            resolve_carriers(Some(&flag), &policy, dir.path(), &Settings::default()).unwrap();
        assert_eq!(set.names(), ["OnTrac"]);
        assert_eq!(origin, CarrierOrigin::Flag(flag));
    }

    #[test]
    fn policy_merges_inline_and_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("more.json"), r#"["DHL", "ups"]"#).unwrap();
        let policy = CheckPolicy::from_toml(
            "[carriers]\napproved = [\"UPS\"]\nfile = \"more.json\"",
        )
        .unwrap();

        let (set, origin) =
            resolve_carriers(None, &policy, dir.path(), &Settings::default()).unwrap();
        assert_eq!(set.names(), ["UPS", "DHL"]);
        assert_eq!(origin, CarrierOrigin::Policy);
    }

    #[test]
    fn settings_then_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("approved_carriers.json");
        let settings = settings_with(&list);
        let policy = CheckPolicy::default();

        let (set, origin) = resolve_carriers(None, &policy, dir.path(), &settings).unwrap();
        assert_eq!(origin, CarrierOrigin::Defaults);
        assert_eq!(set.len(), DEFAULT_CARRIERS.len());
        assert!(set.contains("amazon logistics"));

        std::fs::write(&list, r#"["GSO"]"#).unwrap();
        let (set, origin) = resolve_carriers(None, &policy, dir.path(), &settings).unwrap();
        assert_eq!(set.names(), ["GSO"]);
        assert_eq!(origin, CarrierOrigin::Settings(list));
    }

    #[test]
    fn add_and_remove_edit_the_json_list() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("approved_carriers.json");
        let settings = settings_with(&list);

        cmd_carriers_add(&settings, &["Acme Freight".to_string(), "ups".to_string()]).unwrap();
        let names = shipcheck_io::load_carriers(&list).unwrap().names().to_vec();
        assert_eq!(names.len(), DEFAULT_CARRIERS.len() + 1);
        assert_eq!(names.last().map(String::as_str), Some("Acme Freight"));

        cmd_carriers_remove(&settings, &["ACME FREIGHT".to_string(), "gso".to_string()]).unwrap();
        let set = shipcheck_io::load_carriers(&list).unwrap();
        assert!(!set.contains("Acme Freight"));
        assert!(!set.contains("GSO"));
        assert_eq!(set.len(), DEFAULT_CARRIERS.len() - 1);
    }

    #[test]
    fn remove_unknown_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(&dir.path().join("approved_carriers.json"));
        let err = cmd_carriers_remove(&settings, &["Nope".to_string()]).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }

    #[test]
    fn text_lists_are_not_editable() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(&dir.path().join("carriers.txt"));
        let err = cmd_carriers_add(&settings, &["UPS".to_string()]).unwrap_err();
        assert!(err.message.contains("not a JSON carrier list"));
    }
}
