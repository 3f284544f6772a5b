//! Recipes are named, pre-configured pipelines: an ordered list of process names plus default
//! parameter overrides for some of those processes. They carry no behaviour of their own; a
//! pipeline-definition generator consumes the pipeline string and directives.
mod catalog;

pub use catalog::RecipeCatalog;

use crate::yaml::{Yaml, YamlExt};
use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    pub description: Option<String>,
    /// Process names in pipeline order.
    pub processes: Vec<String>,
    pub directives: Vec<Directive>,
}

/// Default parameter overrides for one process of a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub process: String,
    pub params: Vec<(String, String)>,
}

impl Directive {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Recipe {
    /// The space-separated pipeline string handed to the pipeline generator.
    pub fn pipeline_string(&self) -> String {
        self.processes.join(" ")
    }

    pub fn directive(&self, process: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.process == process)
    }

    pub fn to_json(&self) -> Value {
        let directives: Map<String, Value> = self
            .directives
            .iter()
            .map(|directive| {
                let params: Map<String, Value> = directive
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                let mut entry = Map::new();
                entry.insert("params".to_string(), Value::Object(params));
                (directive.process.clone(), Value::Object(entry))
            })
            .collect();

        let mut json = Map::new();
        json.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(description) = &self.description {
            json.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }
        json.insert(
            "pipeline_str".to_string(),
            Value::String(self.pipeline_string()),
        );
        json.insert("directives".to_string(), Value::Object(directives));
        Value::Object(json)
    }

    fn validate(&self) -> Result<()> {
        if self.processes.is_empty() {
            bail!("recipe {} declares no processes", self.name);
        }
        if let Some(bad) = self
            .processes
            .iter()
            .find(|p| p.is_empty() || p.contains(char::is_whitespace))
        {
            bail!("recipe {} has an invalid process name {:?}", self.name, bad);
        }

        let known: HashSet<&str> = self.processes.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        for directive in &self.directives {
            if !known.contains(directive.process.as_str()) {
                bail!(
                    "recipe {} has directives for {}, which is not in its pipeline",
                    self.name,
                    directive.process
                );
            }
            if !seen.insert(directive.process.as_str()) {
                bail!(
                    "recipe {} declares directives for {} twice",
                    self.name,
                    directive.process
                );
            }
        }
        Ok(())
    }
}

impl TryFrom<Yaml> for Recipe {
    type Error = anyhow::Error;

    fn try_from(yaml: Yaml) -> Result<Self> {
        let name = yaml.required_string("name")?;
        let description = yaml
            .optional_string("description")?
            .map(|d| d.trim().to_string());
        let processes = yaml
            .required_vec("processes")?
            .iter()
            .map(|p| p.to_scalar_string())
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("invalid process list in recipe {}", name))?;
        let directives = match yaml.optional("directives") {
            Some(directives) => directives
                .entries()?
                .into_iter()
                .map(|(process, body)| parse_directive(process, body))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("invalid directives in recipe {}", name))?,
            None => Vec::new(),
        };

        let recipe = Recipe {
            name,
            description,
            processes,
            directives,
        };
        recipe.validate()?;
        Ok(recipe)
    }
}

fn parse_directive(process: String, body: &Yaml) -> Result<Directive> {
    let params = match body.optional("params") {
        Some(params) => params
            .entries()?
            .into_iter()
            .map(|(key, value)| -> Result<(String, String)> {
                Ok((key, value.to_scalar_string()?))
            })
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(Directive { process, params })
}
