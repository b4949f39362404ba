//! The JSON program model read by the CLI.
//!
//! ```json
//! {
//!   "classes": [{"name": "zoo.Animal"}, {"name": "zoo.Dog", "superclass": {"kind": "class", "name": "zoo.Animal"}}],
//!   "sites": [{"kind": "declaration", "binding": "d", "site": 1, "type": {"kind": "class", "name": "zoo.Dog"}}],
//!   "queries": [{"source": {"kind": "class", "name": "zoo.Dog"}, "target": {"kind": "class", "name": "zoo.Animal"}}],
//!   "free": ["d"]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tycon_solver::{
    ClassDescriptor, EnvironmentConfig, EnvironmentError, RootPolicy, Site, SiteSource,
    TypeDescriptor, TypeEnvironment, TypeParameterDescriptor,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Program {
    #[serde(default)]
    pub environment: EnvironmentSection,
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
    /// Type parameters of methods, keyed by method.
    #[serde(default)]
    pub method_type_parameters: Vec<MethodTypeParameters>,
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub queries: Vec<Query>,
    /// Bindings whose types the solver chooses.
    #[serde(default)]
    pub free: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSection {
    /// Name of the top type. Defaults to `java.lang.Object`.
    #[serde(default)]
    pub root: Option<String>,
    /// Use the first root-like class that gets interned as the top type.
    #[serde(default)]
    pub first_seen_root: bool,
    /// Interfaces implemented by every array type.
    #[serde(default)]
    pub array_supertypes: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodTypeParameters {
    pub method: String,
    pub parameters: Vec<TypeParameterDescriptor>,
}

/// An assignability question, optionally with the expected answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub source: TypeDescriptor,
    pub target: TypeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<bool>,
}

impl Program {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn config(&self) -> EnvironmentConfig {
        let mut config = EnvironmentConfig::default();
        if self.environment.first_seen_root {
            config = config.with_root_policy(RootPolicy::FirstSeen);
        } else if let Some(root) = &self.environment.root {
            config = config.with_root_policy(RootPolicy::Named(root.clone()));
        }
        if let Some(names) = &self.environment.array_supertypes {
            config = config.with_array_supertypes(names.iter().cloned());
        }
        config
    }

    /// Build an environment holding every declaration of the program and
    /// resolve their supertypes and bounds up front.
    pub fn environment(&self) -> Result<TypeEnvironment, EnvironmentError> {
        let env = TypeEnvironment::with_config(self.config());
        for class in &self.classes {
            env.declare_class(class.clone())?;
        }
        for method in &self.method_type_parameters {
            env.declare_type_parameters(&method.method, &method.parameters)?;
        }
        env.resolve_declarations()?;
        Ok(env)
    }
}

impl SiteSource for Program {
    fn sites(&self) -> &[Site] {
        &self.sites
    }
}
