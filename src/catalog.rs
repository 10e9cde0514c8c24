//! Model catalogs and candidate ranking.
//!
//! A [`Catalog`] is the parsed answer of one "list models" call for one API
//! version. It is built fresh for every generation request and never cached:
//! upstream catalogs change without notice.

use std::collections::HashSet;

use serde::Deserialize;

use crate::Result;

/// Generation method a model must advertise to be a first-class candidate.
pub const GENERATE_CONTENT: &str = "generateContent";

/// Namespace prefix the catalog puts in front of model names.
const MODEL_PREFIX: &str = "models/";

/// Strip the `models/` namespace prefix, if present.
pub fn bare_model_name(name: &str) -> &str {
    name.strip_prefix(MODEL_PREFIX).unwrap_or(name)
}

/// What a catalog entry says about content generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Lists `generateContent` among its methods.
    Capable,
    /// Lists methods, but not `generateContent`.
    Incapable,
    /// Lists no methods at all; worth trying.
    Unknown,
}

impl Capability {
    pub fn worth_trying(self) -> bool {
        !matches!(self, Capability::Incapable)
    }
}

/// One entry of a model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Possibly prefixed name, e.g. `models/gemini-2.0-flash`.
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Option<Vec<String>>,
}

impl ModelDescriptor {
    pub fn bare_name(&self) -> &str {
        bare_model_name(&self.name)
    }

    pub fn capability(&self) -> Capability {
        match &self.supported_generation_methods {
            None => Capability::Unknown,
            Some(methods) if methods.iter().any(|m| m == GENERATE_CONTENT) => {
                Capability::Capable
            }
            Some(_) => Capability::Incapable,
        }
    }
}

#[derive(Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

/// Models offered by one API version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    models: Vec<ModelDescriptor>,
}

impl Catalog {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }

    /// Parse a "list models" response body (`{"models": [...]}`).
    pub fn parse(body: &str) -> Result<Self> {
        let response: ListModelsResponse = serde_json::from_str(body)?;
        Ok(Self::new(response.models))
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Every bare model name, in catalog order, without duplicates.
    pub fn available(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.models
            .iter()
            .map(ModelDescriptor::bare_name)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Bare names whose capability is known or presumed to include
    /// content generation.
    pub fn generate_capable(&self) -> HashSet<&str> {
        self.models
            .iter()
            .filter(|m| m.capability().worth_trying())
            .map(ModelDescriptor::bare_name)
            .collect()
    }

    /// Candidate order: preferred names present in the catalog first (in
    /// preference order), then the rest of the catalog in catalog order.
    pub fn ranked<'a>(&'a self, preferred: &'a [String]) -> Vec<&'a str> {
        let available = self.available();
        let mut seen = HashSet::new();
        preferred
            .iter()
            .map(String::as_str)
            .filter(|name| available.contains(name))
            .chain(available.iter().copied())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Ranked candidates minus those the catalog explicitly marks as unable
    /// to generate content.
    ///
    /// When nothing in the catalog looks capable, the capability signal is
    /// useless and every ranked candidate is kept.
    pub fn candidates<'a>(&'a self, preferred: &'a [String]) -> Vec<&'a str> {
        self.split_candidates(preferred).0
    }

    /// Ranked names split into `(candidates, incapable)`, both in rank
    /// order.
    pub fn split_candidates<'a>(
        &'a self,
        preferred: &'a [String],
    ) -> (Vec<&'a str>, Vec<&'a str>) {
        let capable = self.generate_capable();
        self.ranked(preferred)
            .into_iter()
            .partition(|name| capable.is_empty() || capable.contains(name))
    }
}
