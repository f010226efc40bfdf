//! Load registrations from a YAML directory tree or a single keyed YAML file.

use crate::config::validator::validate_fragment;
use crate::config::{NamespaceMode, Registration, RegistrationEncoding, Registry};
use crate::error::ConfigError;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

type Registrations = BTreeMap<String, Registration>;

/// Build a registry from `path`. A directory holds one fragment per file (flat) or one
/// subdirectory per environment (scoped); a file is a mapping keyed by identifier (flat)
/// or by environment then identifier (scoped).
///
/// Only an unreadable source (or a malformed single file) is an error; bad fragments are skipped.
pub fn load_registry(
    path: &Path,
    mode: NamespaceMode,
    encoding: RegistrationEncoding,
) -> Result<Registry, ConfigError> {
    let meta = fs::metadata(path).map_err(|e| unreadable(path, e))?;
    let registry = if meta.is_dir() {
        match mode {
            NamespaceMode::Flat => Registry::Flat(load_fragment_dir(path, encoding)?),
            NamespaceMode::Scoped => Registry::Scoped(load_environment_dirs(path, encoding)?),
        }
    } else {
        load_keyed_file(path, mode, encoding)?
    };
    tracing::debug!(path = %path.display(), registrations = registry.len(), "loaded registry");
    Ok(registry)
}

fn load_fragment_dir(dir: &Path, encoding: RegistrationEncoding) -> Result<Registrations, ConfigError> {
    fs::read_dir(dir).map_err(|e| unreadable(dir, e))?;
    let mut out = Registrations::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable config entry");
                continue;
            }
        };
        let file = entry.path();
        if !entry.file_type().is_file() || !is_yaml(file) {
            continue;
        }
        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "skipping unreadable config file");
                continue;
            }
        };
        let doc: Value = match serde_yaml::from_str(&text) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "skipping malformed config file");
                continue;
            }
        };
        if doc.is_null() {
            continue;
        }
        let origin = file.display().to_string();
        admit(&mut out, &doc, encoding, None, &origin);
    }
    Ok(out)
}

fn load_environment_dirs(
    dir: &Path,
    encoding: RegistrationEncoding,
) -> Result<BTreeMap<String, Registrations>, ConfigError> {
    let mut envs: Vec<(String, std::path::PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| unreadable(dir, e))? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable config entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() {
            tracing::debug!(path = %path.display(), "ignoring non-directory in scoped config root");
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => envs.push((name.to_string(), path)),
            None => tracing::warn!(path = %path.display(), "skipping environment with non-UTF-8 name"),
        }
    }
    envs.sort();
    Ok(load_environments(envs, encoding))
}

/// Load each environment directory. One that cannot be read is left out with a warning.
fn load_environments(
    envs: Vec<(String, std::path::PathBuf)>,
    encoding: RegistrationEncoding,
) -> BTreeMap<String, Registrations> {
    let mut out = BTreeMap::new();
    for (env, path) in envs {
        match load_fragment_dir(&path, encoding) {
            Ok(registrations) => {
                out.insert(env, registrations);
            }
            Err(e) => tracing::warn!(environment = %env, error = %e, "skipping unreadable environment"),
        }
    }
    out
}

fn load_keyed_file(
    path: &Path,
    mode: NamespaceMode,
    encoding: RegistrationEncoding,
) -> Result<Registry, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| unreadable(path, e))?;
    let doc: Value = serde_yaml::from_str(&text).map_err(|e| malformed(path, e.to_string()))?;
    if doc.is_null() {
        return Ok(Registry::empty(mode));
    }
    let top = doc
        .as_mapping()
        .ok_or_else(|| malformed(path, "top level is not a mapping".into()))?;
    let origin = path.display().to_string();

    match mode {
        NamespaceMode::Flat => {
            let mut out = Registrations::new();
            for (key, fragment) in top {
                admit_keyed(&mut out, key, fragment, encoding, &origin);
            }
            Ok(Registry::Flat(out))
        }
        NamespaceMode::Scoped => {
            let mut out = BTreeMap::new();
            for (env_key, databases) in top {
                let Some(env) = env_key.as_str() else {
                    tracing::warn!(file = %origin, "skipping environment with non-string name");
                    continue;
                };
                let Some(databases) = databases.as_mapping() else {
                    tracing::warn!(file = %origin, environment = env, "skipping environment that is not a mapping");
                    continue;
                };
                let registrations: &mut Registrations = out.entry(env.to_string()).or_default();
                for (key, fragment) in databases {
                    admit_keyed(registrations, key, fragment, encoding, &origin);
                }
            }
            Ok(Registry::Scoped(out))
        }
    }
}

fn admit_keyed(out: &mut Registrations, key: &Value, fragment: &Value, encoding: RegistrationEncoding, origin: &str) {
    match key.as_str() {
        Some(key) => admit(out, fragment, encoding, Some(key), origin),
        None => tracing::warn!(file = %origin, "skipping entry with non-string key"),
    }
}

/// Validate one fragment and register it; later fragments replace earlier ones with the same identifier.
fn admit(
    out: &mut Registrations,
    fragment: &Value,
    encoding: RegistrationEncoding,
    default_identifier: Option<&str>,
    origin: &str,
) {
    match validate_fragment(fragment, encoding, default_identifier) {
        Ok(registration) => {
            let identifier = registration.identifier.clone();
            if out.insert(identifier.clone(), registration).is_some() {
                tracing::debug!(origin, identifier = %identifier, "registration replaced by later fragment");
            }
        }
        Err(reason) => {
            tracing::debug!(origin, key = ?default_identifier, reason = %reason, "skipping fragment");
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"))
}

fn unreadable(path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn malformed(path: &Path, reason: String) -> ConfigError {
    ConfigError::Malformed {
        path: path.display().to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fragment(id: &str, host: &str, enabled: &str) -> String {
        format!(
            "identifier: {id}\nhostname: {host}\ndatabase: {id}db\nusername: u\npassword: p\nenabled: {enabled}\n"
        )
    }

    fn write(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }

    fn flat_ids(registry: &Registry) -> Vec<String> {
        registry.identifiers()
    }

    #[test]
    fn directory_skips_invalid_fragments() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "sales.yaml", &fragment("sales", "db1", "\"True\""));
        write(tmp.path(), "off.yaml", &fragment("off", "db2", "\"False\""));
        write(tmp.path(), "partial.yaml", "identifier: partial\nhostname: db3\nenabled: \"True\"\n");
        write(tmp.path(), "broken.yaml", "identifier: [unterminated\n");
        write(tmp.path(), "empty.yaml", "");
        write(tmp.path(), "notes.txt", &fragment("notes", "db4", "\"True\""));

        let registry = load_registry(tmp.path(), NamespaceMode::Flat, RegistrationEncoding::Fields).unwrap();
        assert_eq!(flat_ids(&registry), vec!["sales".to_string()]);
    }

    #[test]
    fn directory_walk_is_recursive_and_last_write_wins() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.yaml", &fragment("sales", "first", "\"True\""));
        write(tmp.path(), "b.yml", &fragment("sales", "second", "\"True\""));
        write(tmp.path(), "nested/billing.yaml", &fragment("billing", "db9", "\"True\""));

        let registry = load_registry(tmp.path(), NamespaceMode::Flat, RegistrationEncoding::Fields).unwrap();
        assert_eq!(flat_ids(&registry), vec!["billing".to_string(), "sales".to_string()]);
        match &registry {
            Registry::Flat(by_id) => assert_eq!(by_id["sales"].hostname, "second"),
            other => panic!("expected flat registry, got {:?}", other),
        }
    }

    #[test]
    fn each_identifier_appears_once() {
        let tmp = TempDir::new().unwrap();
        for i in 0..5 {
            write(tmp.path(), &format!("dup{}.yaml", i), &fragment("sales", "db", "\"True\""));
        }
        let registry = load_registry(tmp.path(), NamespaceMode::Flat, RegistrationEncoding::Fields).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_fragments_are_followed() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "available/sales.yaml", &fragment("sales", "db1", "\"True\""));
        fs::create_dir_all(tmp.path().join("conf.d")).unwrap();
        std::os::unix::fs::symlink(
            tmp.path().join("available/sales.yaml"),
            tmp.path().join("conf.d/sales.yaml"),
        )
        .unwrap();

        let registry =
            load_registry(&tmp.path().join("conf.d"), NamespaceMode::Flat, RegistrationEncoding::Fields).unwrap();
        assert_eq!(flat_ids(&registry), vec!["sales".to_string()]);
    }

    #[test]
    fn unreadable_environment_is_left_out() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "staging/sales.yaml", &fragment("sales", "staging-db", "\"True\""));
        let envs = vec![
            ("gone".to_string(), tmp.path().join("gone")),
            ("staging".to_string(), tmp.path().join("staging")),
        ];
        let loaded = load_environments(envs, RegistrationEncoding::Fields);
        assert_eq!(loaded.keys().cloned().collect::<Vec<_>>(), vec!["staging".to_string()]);
        assert!(loaded["staging"].contains_key("sales"));
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_registry(&tmp.path().join("nope"), NamespaceMode::Flat, RegistrationEncoding::Fields)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn scoped_directory_groups_by_environment() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "staging/sales.yaml", &fragment("sales", "staging-db", "\"True\""));
        write(tmp.path(), "production/sales.yaml", &fragment("sales", "prod-db", "\"True\""));
        write(tmp.path(), "production/off.yaml", &fragment("off", "x", "\"False\""));
        write(tmp.path(), "stray.yaml", &fragment("stray", "x", "\"True\""));

        let registry = load_registry(tmp.path(), NamespaceMode::Scoped, RegistrationEncoding::Fields).unwrap();
        assert_eq!(registry.environments(), vec!["production".to_string(), "staging".to_string()]);
        assert_eq!(registry.databases_in("production"), Some(vec!["sales".to_string()]));
        assert_eq!(registry.databases_in("qa"), None);
    }

    #[test]
    fn flat_file_is_keyed_by_identifier() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "databases.yaml",
            r#"
sales:
  hostname: db1
  database: salesdb
  username: u
  password: p
  enabled: "True"
billing:
  hostname: db2
  database: billingdb
  username: u
  password: p
  enabled: "False"
"#,
        );
        let registry = load_registry(
            &tmp.path().join("databases.yaml"),
            NamespaceMode::Flat,
            RegistrationEncoding::Fields,
        )
        .unwrap();
        assert_eq!(flat_ids(&registry), vec!["sales".to_string()]);
    }

    #[test]
    fn scoped_file_is_keyed_by_environment_then_identifier() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "environments.yaml",
            r#"
staging:
  sales:
    uri: mysql://u:p@staging-db/salesdb
    enabled: "True"
production:
  sales:
    uri: mysql://u:p@prod-db/salesdb
    enabled: "True"
  broken:
    uri: "mysql://nobody"
    enabled: "True"
qa: not-a-mapping
"#,
        );
        let registry = load_registry(
            &tmp.path().join("environments.yaml"),
            NamespaceMode::Scoped,
            RegistrationEncoding::Uri,
        )
        .unwrap();
        assert_eq!(registry.environments(), vec!["production".to_string(), "staging".to_string()]);
        assert_eq!(registry.databases_in("production"), Some(vec!["sales".to_string()]));
    }

    #[test]
    fn malformed_single_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "list.yaml", "- just\n- a list\n");
        let err = load_registry(&tmp.path().join("list.yaml"), NamespaceMode::Flat, RegistrationEncoding::Fields)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }
}
