use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_yaml_ng::{Mapping, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// Written to disk when no config file exists yet.
pub const DEFAULT_CONFIG: &str = include_str!("../default_config.yml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
    #[error("failed to serialize config")]
    Serialize(#[source] serde_yaml_ng::Error),
    #[error("'{path}' should be {expected}")]
    WrongType { path: String, expected: &'static str },
}

/// A YAML document backed by a file.
pub struct ConfigStore {
    path: PathBuf,
    document: Value,
}

impl ConfigStore {
    /// Loads the config at `path`, writing [`DEFAULT_CONFIG`] there first if it does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<ConfigStore, ConfigError> {
        let path = path.into();
        if !path.exists() {
            info!("Creating default config at {}", path.display());
            write_file(&path, DEFAULT_CONFIG)?;
        }
        let document = read_document(&path)?;
        Ok(ConfigStore { path, document })
    }

    /// Builds a store from YAML text without touching the disk until saved.
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<ConfigStore, ConfigError> {
        let path = path.into();
        let document = parse_document(&path, contents)?;
        Ok(ConfigStore { path, document })
    }

    pub fn empty(path: impl Into<PathBuf>) -> ConfigStore {
        ConfigStore {
            path: path.into(),
            document: Value::Mapping(Mapping::new()),
        }
    }

    /// Re-reads the file. The in-memory document is left untouched on failure.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        self.document = read_document(&self.path)?;
        Ok(())
    }

    /// Writes the document back to disk, logging any failure.
    pub fn save(&self) -> bool {
        match self.try_save() {
            Ok(()) => true,
            Err(err) => {
                error!("Could not save config: {:#}", anyhow::Error::from(err));
                false
            }
        }
    }

    pub fn try_save(&self) -> Result<(), ConfigError> {
        let contents = serde_yaml_ng::to_string(&self.document).map_err(ConfigError::Serialize)?;
        write_file(&self.path, &contents)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> Section<'_> {
        Section {
            value: &self.document,
            prefix: String::new(),
        }
    }

    /// Sets the value at a dotted key path, creating sections along the way.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let mut current = &mut self.document;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            if !current.is_mapping() {
                *current = Value::Mapping(Mapping::new());
            }
            let Value::Mapping(mapping) = current else {
                return;
            };
            let key = Value::String(segment.to_string());
            if segments.peek().is_none() {
                mapping.insert(key, value.into());
                return;
            }
            current = mapping
                .entry(key)
                .or_insert_with(|| Value::Mapping(Mapping::new()));
        }
    }
}

fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(path, &contents)
}

fn parse_document(path: &Path, contents: &str) -> Result<Value, ConfigError> {
    if contents.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    serde_yaml_ng::from_str(contents)
        .map(|Document(value)| value)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// A YAML value where a repeated mapping key keeps its last value instead of
/// failing the whole document.
struct Document(Value);

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a YAML value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Document, E>
    where
        E: serde::de::Error,
    {
        Ok(Document(Value::Bool(v)))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Document, E>
    where
        E: serde::de::Error,
    {
        Ok(Document(Value::from(v)))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Document, E>
    where
        E: serde::de::Error,
    {
        Ok(Document(Value::from(v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Document, E>
    where
        E: serde::de::Error,
    {
        Ok(Document(Value::from(v)))
    }

    fn visit_str<E>(self, v: &str) -> Result<Document, E>
    where
        E: serde::de::Error,
    {
        Ok(Document(Value::String(v.to_owned())))
    }

    fn visit_string<E>(self, v: String) -> Result<Document, E>
    where
        E: serde::de::Error,
    {
        Ok(Document(Value::String(v)))
    }

    fn visit_unit<E>(self) -> Result<Document, E>
    where
        E: serde::de::Error,
    {
        Ok(Document(Value::Null))
    }

    fn visit_none<E>(self) -> Result<Document, E>
    where
        E: serde::de::Error,
    {
        Ok(Document(Value::Null))
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Document, D::Error>
    where
        D: Deserializer<'de>,
    {
        Document::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Document, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(Document(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Document(Value::Sequence(items)))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Document, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = Mapping::new();
        while let Some((Document(key), Document(value))) = map.next_entry()? {
            if mapping.contains_key(&key) {
                warn!(
                    "Config key '{}' is set more than once, keeping the last value",
                    scalar_to_string(&key).unwrap_or_default()
                );
            }
            mapping.insert(key, value);
        }
        Ok(Document(Value::Mapping(mapping)))
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    };
    write().map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// A borrowed view of one mapping in the document.
///
/// Paths are dotted (`messages.sender-message`). A key holding `null` counts as unset.
#[derive(Clone)]
pub struct Section<'a> {
    value: &'a Value,
    prefix: String,
}

impl<'a> Section<'a> {
    fn full_path(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}.{}", self.prefix, path)
        }
    }

    fn lookup(&self, path: &str) -> Option<&'a Value> {
        let mut current = self.value;
        for segment in path.split('.') {
            current = current.as_mapping()?.get(segment)?;
        }
        (!current.is_null()).then_some(current)
    }

    fn wrong_type(&self, path: &str, expected: &'static str) -> ConfigError {
        ConfigError::WrongType {
            path: self.full_path(path),
            expected,
        }
    }

    pub fn is_set(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// The keys of this section in document order.
    pub fn keys(&self) -> Vec<String> {
        let Some(mapping) = self.value.as_mapping() else {
            return Vec::new();
        };
        mapping.keys().filter_map(scalar_to_string).collect()
    }

    /// Every entry in document order, with its section if the value is a mapping.
    ///
    /// Keys are taken literally, dots included. Non-string keys such as `1:` use
    /// their text form, like in [`Section::keys`].
    pub fn children(&self) -> Vec<(String, Option<Section<'a>>)> {
        let Some(mapping) = self.value.as_mapping() else {
            return Vec::new();
        };
        mapping
            .iter()
            .filter_map(|(key, value)| {
                let key = scalar_to_string(key)?;
                let section = value.is_mapping().then(|| Section {
                    value,
                    prefix: self.full_path(&key),
                });
                Some((key, section))
            })
            .collect()
    }

    pub fn section(&self, path: &str) -> Option<Section<'a>> {
        self.lookup(path)
            .filter(|value| value.is_mapping())
            .map(|value| Section {
                value,
                prefix: self.full_path(path),
            })
    }

    /// Numbers and booleans are accepted and converted to their text form.
    pub fn get_string(&self, path: &str) -> Result<Option<String>, ConfigError> {
        match self.lookup(path) {
            None => Ok(None),
            Some(value) => scalar_to_string(value)
                .map(Some)
                .ok_or_else(|| self.wrong_type(path, "a string")),
        }
    }

    /// A single string is treated as a list with one element.
    pub fn get_string_list(&self, path: &str) -> Result<Option<Vec<String>>, ConfigError> {
        match self.lookup(path) {
            None => Ok(None),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| {
                    scalar_to_string(item).ok_or_else(|| self.wrong_type(path, "a list of strings"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(value) => scalar_to_string(value)
                .map(|s| Some(vec![s]))
                .ok_or_else(|| self.wrong_type(path, "a list of strings")),
        }
    }

    pub fn get_bool(&self, path: &str) -> Result<Option<bool>, ConfigError> {
        match self.lookup(path) {
            None => Ok(None),
            Some(Value::Bool(val)) => Ok(Some(*val)),
            Some(_) => Err(self.wrong_type(path, "true or false")),
        }
    }

    /// Floats such as `5.0` are accepted and truncated.
    pub fn get_int(&self, path: &str) -> Result<Option<i32>, ConfigError> {
        match self.lookup(path) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .or_else(|| {
                    value
                        .as_f64()
                        .filter(|val| val.is_finite())
                        .map(|val| val.trunc() as i64)
                })
                .and_then(|val| i32::try_from(val).ok())
                .map(Some)
                .ok_or_else(|| self.wrong_type(path, "a whole number")),
        }
    }

    pub fn get_string_or(&self, path: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self
            .get_string(path)?
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn get_bool_or(&self, path: &str, default: bool) -> Result<bool, ConfigError> {
        Ok(self.get_bool(path)?.unwrap_or(default))
    }

    pub fn get_int_or(&self, path: &str, default: i32) -> Result<i32, ConfigError> {
        Ok(self.get_int(path)?.unwrap_or(default))
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(yaml: &str) -> ConfigStore {
        ConfigStore::parse("config.yml", yaml).unwrap()
    }

    #[test]
    fn typed_lookups() {
        let config = store(
            r#"
actions:
  hug:
    aliases: [cuddle, squeeze]
    range: 5
    require-target: false
    messages:
      sender-message: "You hugged %target%"
      help-message: 42
"#,
        );
        let root = config.root();
        let hug = root.section("actions.hug").unwrap();
        assert_eq!(
            hug.get_string_list("aliases").unwrap().unwrap(),
            vec!["cuddle", "squeeze"]
        );
        assert_eq!(hug.get_int("range").unwrap(), Some(5));
        assert_eq!(hug.get_bool("require-target").unwrap(), Some(false));
        assert_eq!(
            hug.get_string("messages.sender-message").unwrap().as_deref(),
            Some("You hugged %target%")
        );
        assert_eq!(
            hug.get_string("messages.help-message").unwrap().as_deref(),
            Some("42")
        );
        assert_eq!(hug.get_string_or("messages.missing", "").unwrap(), "");
        assert!(!hug.is_set("required-permission"));
    }

    #[test]
    fn null_counts_as_unset() {
        let config = store("actions:\n  broken:\n  ok: {}\n");
        let actions = config.root().section("actions").unwrap();
        assert_eq!(actions.keys(), vec!["broken", "ok"]);
        assert!(!actions.is_set("broken"));
        assert!(actions.section("broken").is_none());
        assert!(actions.section("ok").is_some());
    }

    #[test]
    fn wrong_type_names_full_path() {
        let config = store("actions:\n  hug:\n    range: far\n");
        let hug = config.root().section("actions.hug").unwrap();
        let err = hug.get_int("range").unwrap_err();
        assert_eq!(err.to_string(), "'actions.hug.range' should be a whole number");
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let config = store(
            "actions:\n  hug:\n    range: 1\n  wave: {}\n  hug:\n    range: 2\n",
        );
        let actions = config.root().section("actions").unwrap();
        assert_eq!(actions.keys(), vec!["hug", "wave"]);
        assert_eq!(actions.get_int("hug.range").unwrap(), Some(2));
        assert!(actions.section("wave").is_some());
    }

    #[test]
    fn numeric_keys_are_found_by_text() {
        let config = store("actions:\n  1:\n    range: 3\n");
        let actions = config.root().section("actions").unwrap();
        assert_eq!(actions.keys(), vec!["1"]);
        let children = actions.children();
        assert_eq!(children.len(), 1);
        let (key, child) = &children[0];
        assert_eq!(key, "1");
        assert_eq!(child.as_ref().unwrap().get_int("range").unwrap(), Some(3));
    }

    #[test]
    fn whole_number_floats_are_ints() {
        let config = store("range: 5.0\nfar: 10000000000.0\n");
        assert_eq!(config.root().get_int("range").unwrap(), Some(5));
        assert!(config.root().get_int("far").is_err());
    }

    #[test]
    fn set_creates_sections() {
        let mut config = store("");
        config.set("actions.poke.messages.sender-message", "You poked %target%");
        config.set("actions.poke.range", 3);
        let poke = config.root().section("actions.poke").unwrap();
        assert_eq!(poke.get_int("range").unwrap(), Some(3));
        assert!(poke.is_set("messages.sender-message"));
    }

    #[test]
    fn load_creates_default_and_reload_discards_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugins/ChatActions/config.yml");

        let mut config = ConfigStore::load(&path).unwrap();
        assert!(path.exists());
        assert!(config.root().section("actions.hug").is_some());

        config.set("actions.hug.range", 10);
        config.reload().unwrap();
        assert_eq!(
            config.root().section("actions.hug").unwrap().get_int("range").unwrap(),
            Some(-1)
        );
    }

    #[test]
    fn save_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");

        let mut config = ConfigStore::load(&path).unwrap();
        config.set("actions.poke.required-permission", "chatactions.poke");
        assert!(config.save());

        let reloaded = ConfigStore::load(&path).unwrap();
        assert_eq!(
            reloaded
                .root()
                .get_string("actions.poke.required-permission")
                .unwrap()
                .as_deref(),
            Some("chatactions.poke")
        );
    }

    #[test]
    fn save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the write fail
        let config = ConfigStore::parse(dir.path(), "actions: {}").unwrap();
        assert!(!config.save());
        assert!(matches!(config.try_save(), Err(ConfigError::Write { .. })));
    }
}
