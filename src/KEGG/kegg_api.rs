//! # KEGG REST Client Module
//!
//! ## Aim
//! Retrieves every biochemical reaction that references a given molecule from the KEGG
//! database (https://rest.kegg.jp) and returns the reactions as raw flat-text records.
//!
//! ## Main Data Structures and Logic
//! - `KeggApi<C>`: client generic over the HTTP transport (dependency injection for tests)
//! - `HttpClient` trait: one blocking GET returning status code and body
//! - `KeggError`: network failures, service failures and invalid identifiers. "No reactions"
//!   is not an error, it is an empty list.
//!
//! ## Travelling the service
//! 1) `link/reaction/cpd:C00031` lists the reaction ids connected to the compound
//!    (tab separated pairs `cpd:C00031  rn:R00010`)
//! 2) `get/rn:R00010+rn:R00028+...` returns up to 10 flat-file entries, every entry
//!    terminated by a `///` line
//!
//! ## Usage
//! ```rust, ignore
//! let api = KeggApi::new(&RunSettings::default())?;
//! let records = api.fetch_reactions("C00031")?;
//! ```
use crate::settings::RunSettings;
use log::{debug, info, warn};
use regex::Regex;
use reqwest::blocking::Client;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// KEGG does not serve more than 10 entries in one `get` request
pub const KEGG_MAX_BATCH: usize = 10;

static COMPOUND_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(CPD|DR|GL):)?([CDG]\d{5})$").expect("compound id regex is valid")
});

/// reply of a single GET request
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// HTTP client trait for dependency injection
pub trait HttpClient {
    fn get_text(&self, url: &str) -> Result<HttpReply, KeggError>;
}

// Implementation for the real reqwest client
impl HttpClient for Client {
    fn get_text(&self, url: &str) -> Result<HttpReply, KeggError> {
        let response = self.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpReply { status, body })
    }
}

/// error types of the KEGG client
#[derive(Debug, Error)]
pub enum KeggError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("KEGG service returned status {status} for {url}")]
    ServiceError { status: u16, url: String },
    #[error("Invalid molecule identifier '{0}': expected a KEGG id like C00031 or cpd:C00031")]
    InvalidIdentifier(String),
}

/// Checks a user supplied identifier and returns its canonical form (`C00031`).
/// Database prefixes (`cpd:`, `dr:`, `gl:`) and letter case are accepted.
pub fn normalize_compound_id(input: &str) -> Result<String, KeggError> {
    let upper = input.trim().to_uppercase();
    match COMPOUND_ID.captures(&upper) {
        Some(cap) => Ok(cap[2].to_string()),
        None => Err(KeggError::InvalidIdentifier(input.trim().to_string())),
    }
}

/// KEGG database prefix of a canonical id: compounds, drugs or glycans
pub fn database_prefix(compound_id: &str) -> &'static str {
    match compound_id.chars().next() {
        Some('D') => "dr",
        Some('G') => "gl",
        _ => "cpd",
    }
}

/// Splits the body of a `get` request into single entries.
pub fn split_flat_records(body: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in body.lines() {
        if line.trim() == "///" {
            if current.iter().any(|l| !l.trim().is_empty()) {
                records.push(current.join("\n"));
            }
            current.clear();
        } else {
            current.push(line);
        }
    }
    // last entry without terminator
    if current.iter().any(|l| !l.trim().is_empty()) {
        records.push(current.join("\n"));
    }
    records
}

pub struct KeggApi<C: HttpClient> {
    client: C,
    base_url: String,
    batch_size: usize,
    max_reactions: Option<usize>,
}

impl KeggApi<Client> {
    /// Client backed by reqwest, configured from the run settings.
    pub fn new(settings: &RunSettings) -> Result<Self, KeggError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, settings))
    }
}

impl<C: HttpClient> KeggApi<C> {
    pub fn with_client(client: C, settings: &RunSettings) -> Self {
        Self {
            client,
            base_url: settings.kegg_base_url.trim_end_matches('/').to_string(),
            batch_size: settings.batch_size.clamp(1, KEGG_MAX_BATCH),
            max_reactions: settings.max_reactions,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Downloads the flat-text records of all reactions referencing `molecule_id`.
    ///
    /// # Returns
    /// * `Ok(records)` - raw records, empty if KEGG knows no reaction for the molecule
    /// * `Err(KeggError)` - invalid identifier, network or service failure
    pub fn fetch_reactions(&self, molecule_id: &str) -> Result<Vec<String>, KeggError> {
        let compound = normalize_compound_id(molecule_id)?;
        let mut reaction_ids = self.linked_reaction_ids(&compound)?;
        info!(
            "{} reactions linked to {} in KEGG",
            reaction_ids.len(),
            compound
        );
        if reaction_ids.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(max) = self.max_reactions {
            if reaction_ids.len() > max {
                warn!(
                    "only the first {} of {} reactions of {} are used",
                    max,
                    reaction_ids.len(),
                    compound
                );
                reaction_ids.truncate(max);
            }
        }
        let records = self.get_records(&reaction_ids)?;
        info!("{} reaction records downloaded", records.len());
        Ok(records)
    }

    pub fn link_url(&self, compound_id: &str) -> Result<Url, KeggError> {
        Ok(Url::parse(&format!(
            "{}/link/reaction/{}:{}",
            self.base_url,
            database_prefix(compound_id),
            compound_id
        ))?)
    }

    pub fn get_url(&self, reaction_ids: &[String]) -> Result<Url, KeggError> {
        let query = reaction_ids
            .iter()
            .map(|id| format!("rn:{}", id))
            .collect::<Vec<String>>()
            .join("+");
        Ok(Url::parse(&format!("{}/get/{}", self.base_url, query))?)
    }

    /// Reaction ids (`R00010`, ...) linked to a canonical compound id, in KEGG order
    /// without duplicates.
    pub fn linked_reaction_ids(&self, compound_id: &str) -> Result<Vec<String>, KeggError> {
        let url = self.link_url(compound_id)?;
        debug!("GET {}", url);
        let reply = self.client.get_text(url.as_str())?;
        if reply.status == 404 {
            return Ok(Vec::new());
        }
        if !(200..300).contains(&reply.status) {
            return Err(KeggError::ServiceError {
                status: reply.status,
                url: url.to_string(),
            });
        }
        let mut ids: Vec<String> = Vec::new();
        for line in reply.body.lines() {
            let Some(target) = line.split('\t').nth(1) else {
                continue;
            };
            let id = target.trim().trim_start_matches("rn:").to_string();
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Flat-text entries of the given reactions, requested in batches.
    pub fn get_records(&self, reaction_ids: &[String]) -> Result<Vec<String>, KeggError> {
        let mut records = Vec::new();
        for batch in reaction_ids.chunks(self.batch_size) {
            let url = self.get_url(batch)?;
            debug!("GET {}", url);
            let reply = self.client.get_text(url.as_str())?;
            if reply.status == 404 {
                warn!("KEGG has no entries for {:?}", batch);
                continue;
            }
            if !(200..300).contains(&reply.status) {
                return Err(KeggError::ServiceError {
                    status: reply.status,
                    url: url.to_string(),
                });
            }
            records.extend(split_flat_records(&reply.body));
        }
        Ok(records)
    }
}
