// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Exact-match filters the search service accepts next to symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HashFilter {
    Id,
    Md5,
    Sha1,
    Sha256,
    BuildId,
}

impl HashFilter {
    pub const ALL: [Self; 5] = [Self::Id, Self::Md5, Self::Sha1, Self::Sha256, Self::BuildId];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::BuildId => "buildid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(Self::Id),
            "md5" => Some(Self::Md5),
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "buildid" => Some(Self::BuildId),
            _ => None,
        }
    }
}

/// Body of `POST /find`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindRequest {
    pub symbols: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildid: Option<String>,
}

impl FindRequest {
    pub fn from_symbols(symbols: BTreeMap<String, String>) -> Self {
        Self {
            symbols,
            ..Self::default()
        }
    }

    pub fn set_hash(&mut self, filter: HashFilter, value: impl Into<String>) {
        let slot = match filter {
            HashFilter::Id => &mut self.id,
            HashFilter::Md5 => &mut self.md5,
            HashFilter::Sha1 => &mut self.sha1,
            HashFilter::Sha256 => &mut self.sha256,
            HashFilter::BuildId => &mut self.buildid,
        };
        *slot = Some(value.into());
    }

    pub fn hash(&self, filter: HashFilter) -> Option<&str> {
        match filter {
            HashFilter::Id => self.id.as_deref(),
            HashFilter::Md5 => self.md5.as_deref(),
            HashFilter::Sha1 => self.sha1.as_deref(),
            HashFilter::Sha256 => self.sha256.as_deref(),
            HashFilter::BuildId => self.buildid.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && HashFilter::ALL.iter().all(|f| self.hash(*f).is_none())
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            bail!("search needs at least one filter -- enter a symbol and address, or a hash");
        }
        Ok(())
    }
}
