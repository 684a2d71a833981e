/// Parsing of KEGG reaction entries.
///
/// A KEGG flat file entry looks like
/// ```text
/// ENTRY       R00010                      Reaction
/// NAME        alpha,alpha-trehalose glucohydrolase
/// DEFINITION  alpha,alpha-Trehalose + H2O <=> 2 D-Glucose
/// EQUATION    C01083 + C00001 <=> 2 C00031
/// ENZYME      3.2.1.28
/// ///
/// ```
/// Field names occupy the first 12 columns, lines starting with blanks continue the
/// previous field. The EQUATION field names substrates and products by compound id,
/// every participant may carry a stoichiometric coefficient (`2 C00031`, `n C00001`).
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static SYMBOLIC_COEFFICIENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?[0-9]*[nmx]([+-][0-9]+)?\)?$").expect("coefficient regex is valid")
});
static POLYMER_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]\d{5})\(.+\)$").expect("suffix regex is valid")
});

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("record has no ENTRY field")]
    MissingEntry,
    #[error("reaction {0} has no EQUATION field")]
    MissingEquation(String),
    #[error("malformed equation '{equation}': {reason}")]
    MalformedEquation { equation: String, reason: String },
}

/// substance taking part in a reaction
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: String,
    /// stoichiometric coefficient, symbolic KEGG coefficients (n, 2n, n+1) are taken as 1
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub id: String,
    pub name: Option<String>,
    pub definition: Option<String>,
    pub substrates: Vec<Participant>,
    pub products: Vec<Participant>,
    pub reversible: bool,
}

impl Reaction {
    pub fn substrate_ids(&self) -> Vec<&str> {
        self.substrates.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn product_ids(&self) -> Vec<&str> {
        self.products.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn involves(&self, molecule_id: &str) -> bool {
        self.substrates
            .iter()
            .chain(self.products.iter())
            .any(|p| p.id == molecule_id)
    }

    /// equation rebuilt from the parsed participants
    pub fn equation(&self) -> String {
        let side = |participants: &[Participant]| {
            participants
                .iter()
                .map(|p| {
                    if p.coefficient == 1.0 {
                        p.id.clone()
                    } else {
                        format!("{} {}", p.coefficient, p.id)
                    }
                })
                .collect::<Vec<String>>()
                .join(" + ")
        };
        let arrow = if self.reversible { "<=>" } else { "=>" };
        format!(
            "{} {} {}",
            side(&self.substrates),
            arrow,
            side(&self.products)
        )
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.equation())
    }
}

/// substrates, products and direction of one equation
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEquation {
    pub substrates: Vec<Participant>,
    pub products: Vec<Participant>,
    pub reversible: bool,
}

/// a record that could not be turned into a reaction
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub record_id: Option<String>,
    pub error: ParseError,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub reactions: Vec<Reaction>,
    pub failures: Vec<ParseFailure>,
}

/// Splits a flat file entry into its fields. Continuation lines are joined with a blank.
pub fn record_fields(record: &str) -> HashMap<String, String> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut last_field: Option<String> = None;
    for line in record.lines() {
        if line.trim().is_empty() || line.trim() == "///" {
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            if let Some(field) = &last_field {
                if let Some(value) = fields.get_mut(field) {
                    value.push(' ');
                    value.push_str(line.trim());
                }
            }
            continue;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let field = parts.next().unwrap_or_default().to_string();
        let value = parts.next().unwrap_or_default().trim().to_string();
        // repeated field names are continuation of the same field
        match fields.get_mut(&field) {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(&value);
            }
            None => {
                fields.insert(field.clone(), value);
            }
        }
        last_field = Some(field);
    }
    fields
}

/// reaction id of a record (first token of the ENTRY field)
pub fn entry_id(record: &str) -> Option<String> {
    record_fields(record)
        .get("ENTRY")
        .and_then(|entry| entry.split_whitespace().next())
        .map(|id| id.to_string())
}

pub fn parse_record(record: &str) -> Result<Reaction, ParseError> {
    let fields = record_fields(record);
    let id = fields
        .get("ENTRY")
        .and_then(|entry| entry.split_whitespace().next())
        .ok_or(ParseError::MissingEntry)?
        .to_string();
    let equation = fields
        .get("EQUATION")
        .filter(|eq| !eq.trim().is_empty())
        .ok_or_else(|| ParseError::MissingEquation(id.clone()))?;
    let parsed = parse_equation(equation)?;
    let name = fields
        .get("NAME")
        .map(|n| n.trim_end_matches(';').to_string());
    let definition = fields.get("DEFINITION").cloned();
    Ok(Reaction {
        id,
        name,
        definition,
        substrates: parsed.substrates,
        products: parsed.products,
        reversible: parsed.reversible,
    })
}

/// Parses `A + 2 B <=> C`. Supported arrows: `<=>` and `=` (reversible),
/// `=>` (forward) and `<=` (backward, sides are swapped so that substrates come first).
pub fn parse_equation(equation: &str) -> Result<ParsedEquation, ParseError> {
    let malformed = |reason: &str| ParseError::MalformedEquation {
        equation: equation.to_string(),
        reason: reason.to_string(),
    };
    let arrows = [
        ("<=>", true, false),
        ("=>", false, false),
        ("<=", false, true),
        ("=", true, false),
    ];
    let (arrow, reversible, backward) = arrows
        .iter()
        .find(|(arrow, _, _)| equation.contains(arrow))
        .copied()
        .ok_or_else(|| malformed("no reaction arrow"))?;
    let (left, right) = equation
        .split_once(arrow)
        .ok_or_else(|| malformed("no reaction arrow"))?;
    if right.contains(arrow) {
        return Err(malformed("more than one reaction arrow"));
    }
    let left = parse_side(left).map_err(|reason| malformed(&reason))?;
    let right = parse_side(right).map_err(|reason| malformed(&reason))?;
    let (substrates, products) = if backward {
        (right, left)
    } else {
        (left, right)
    };
    Ok(ParsedEquation {
        substrates,
        products,
        reversible,
    })
}

fn parse_side(side: &str) -> Result<Vec<Participant>, String> {
    let side = side.trim();
    if side.is_empty() {
        return Err("empty side of equation".to_string());
    }
    let mut participants: Vec<Participant> = Vec::new();
    for token in side.split(" + ") {
        let participant = parse_participant(token)?;
        // the same substance twice on one side: sum coefficients
        match participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => existing.coefficient += participant.coefficient,
            None => participants.push(participant),
        }
    }
    Ok(participants)
}

fn parse_participant(token: &str) -> Result<Participant, String> {
    let token = token.trim();
    if token.is_empty() {
        return Err("empty participant".to_string());
    }
    let (coefficient, id) = match token.split_once(char::is_whitespace) {
        Some((first, rest)) => match parse_coefficient(first) {
            Some(c) => (c, rest.trim()),
            None => (1.0, token),
        },
        None => (1.0, token),
    };
    if id.is_empty() {
        return Err(format!("participant '{}' has no identifier", token));
    }
    let id = match POLYMER_SUFFIX.captures(id) {
        Some(cap) => cap[1].to_string(),
        None => id.to_string(),
    };
    Ok(Participant { id, coefficient })
}

fn parse_coefficient(token: &str) -> Option<f64> {
    if let Ok(value) = token.parse::<f64>() {
        if value.is_finite() && value > 0.0 {
            return Some(value);
        }
        return None;
    }
    if SYMBOLIC_COEFFICIENT.is_match(token) {
        debug!("symbolic coefficient '{}' taken as 1", token);
        return Some(1.0);
    }
    None
}

/// Parses all records. Malformed records are skipped with a warning and reported in
/// `failures`; repeated entries of the same reaction are kept once.
pub fn parse_records(records: &[String]) -> ParsedBatch {
    let mut batch = ParsedBatch::default();
    for record in records {
        match parse_record(record) {
            Ok(reaction) => {
                if batch.reactions.iter().any(|r| r.id == reaction.id) {
                    debug!("duplicate entry {} skipped", reaction.id);
                    continue;
                }
                batch.reactions.push(reaction);
            }
            Err(error) => {
                let record_id = entry_id(record);
                warn!(
                    "Skipping malformed reaction record {}: {}",
                    record_id.as_deref().unwrap_or("<unknown>"),
                    error
                );
                batch.failures.push(ParseFailure { record_id, error });
            }
        }
    }
    info!(
        "{} reactions parsed, {} records skipped",
        batch.reactions.len(),
        batch.failures.len()
    );
    batch
}
