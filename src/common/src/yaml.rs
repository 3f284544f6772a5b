use anyhow::{anyhow, bail, Result};
use yaml_rust2::YamlLoader;
// re-export Yaml for convenience
pub use yaml_rust2::Yaml;

/// Loads the array stored under the top-level `key` of a YAML document and converts each
/// element into `T`.
pub fn load_from_yaml_array_str<T: TryFrom<Yaml, Error = anyhow::Error>>(
    yaml_str: &str,
    key: &str,
) -> Result<Vec<T>> {
    let docs = YamlLoader::load_from_str(yaml_str)?;
    docs.into_iter()
        .next()
        .ok_or(anyhow!("Empty yaml document"))?
        .into_hash()
        .ok_or(anyhow!("Expected top-level element to be a hash"))?
        .remove(&Yaml::String(key.into()))
        .ok_or(anyhow!("Missing top-level key {}", key))?
        .into_iter()
        .map(|yaml| yaml.try_into())
        .collect()
}

pub trait YamlExt: Sized {
    fn optional(&self, key: &'static str) -> Option<&Yaml>;

    fn required_string(&self, key: &'static str) -> Result<String>;

    fn optional_string(&self, key: &'static str) -> Result<Option<String>>;

    fn required_vec(&self, key: &'static str) -> Result<&Vec<Self>>;

    /// Key/value pairs of a hash, in document order. Keys must be strings.
    fn entries(&self) -> Result<Vec<(String, &Yaml)>>;

    /// Renders a scalar (string, integer, real or boolean) as it was written.
    fn to_scalar_string(&self) -> Result<String>;
}

impl YamlExt for Yaml {
    fn optional(&self, key: &'static str) -> Option<&Yaml> {
        let value = &self[key];
        if value.is_badvalue() {
            None
        } else {
            Some(value)
        }
    }

    fn required_string(&self, key: &'static str) -> Result<String> {
        match &self[key] {
            Yaml::String(s) => Ok(s.clone()),
            Yaml::BadValue => bail!("Missing key {}", key),
            _ => bail!("Expected {} to be a string", key),
        }
    }

    fn optional_string(&self, key: &'static str) -> Result<Option<String>> {
        match &self[key] {
            Yaml::String(s) => Ok(Some(s.clone())),
            Yaml::BadValue => Ok(None),
            _ => bail!("Expected {} to be a string", key),
        }
    }

    fn required_vec(&self, key: &'static str) -> Result<&Vec<Self>> {
        match &self[key] {
            Yaml::Array(v) => Ok(v),
            Yaml::BadValue => bail!("Missing key {}", key),
            _ => bail!("Expected {} to be an array", key),
        }
    }

    fn entries(&self) -> Result<Vec<(String, &Yaml)>> {
        let hash = self
            .as_hash()
            .ok_or_else(|| anyhow!("Expected a hash"))?;
        hash.iter()
            .map(|(key, value)| match key {
                Yaml::String(k) => Ok((k.clone(), value)),
                other => bail!("Expected hash keys to be strings, found {:?}", other),
            })
            .collect()
    }

    fn to_scalar_string(&self) -> Result<String> {
        match self {
            Yaml::String(s) | Yaml::Real(s) => Ok(s.clone()),
            Yaml::Integer(i) => Ok(i.to_string()),
            Yaml::Boolean(b) => Ok(b.to_string()),
            _ => bail!("Expected a scalar value"),
        }
    }
}
