//! Bird, Pair and Chick records.
//!
//! Each record type has a stored shape (all text, id included) and an input
//! shape used for create and update bodies, where every field is optional.
//! Defaults are applied once, when an input is turned into cells.

use crate::vocab::{ChickSex, ChickStatus, Origin, PairStatus, Sex};
use birdbook_sheet::{Row, TableSpec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Birds live in `Birds!A:H` with ids `B0001`, `B0002`, ...
pub const BIRDS: TableSpec = TableSpec::new("Birds", "B", "H");
/// Pairs live in `Pairs!A:G` with ids `P0001`, ...
pub const PAIRS: TableSpec = TableSpec::new("Pairs", "P", "G");
/// Chicks live in `Chicks!A:I` with ids `K0001`, ...
pub const CHICKS: TableSpec = TableSpec::new("Chicks", "K", "I");

/// A record type stored as one table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Create/update body for this record.
    type Input: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static;

    /// Table holding the records.
    const TABLE: TableSpec;
    /// Singular name, e.g. `Bird`.
    const KIND: &'static str;
    /// Name of the id field, e.g. `BirdID`.
    const ID_FIELD: &'static str;
    /// Path segment of the REST resource, e.g. `birds`.
    const RESOURCE: &'static str;
    /// Header row, id column first.
    const HEADER: &'static [&'static str];

    /// Stored id.
    fn id(&self) -> &str;

    /// Cells after the id column, in header order, with defaults applied.
    fn cells(input: &Self::Input) -> Vec<String>;

    /// Build a record from a stored row; absent fields are empty.
    fn from_row(row: &Row) -> Self;

    /// Input that would reproduce this record, for editing.
    fn to_input(&self) -> Self::Input;

    /// Input a fresh entry form starts from.
    fn form_default() -> Self::Input;
}

/// Accept any JSON scalar for a text field.
///
/// `null`, `false`, `0` and `""` all count as absent so the field takes its
/// default; other numbers and booleans are kept as their JSON text.
fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(JsonValue::Null | JsonValue::Bool(false)) => None,
        Some(JsonValue::String(s)) if s.is_empty() => None,
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(other) => Some(other.to_string()),
    })
}

fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn text_or(value: Option<&String>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), Clone::clone)
}

fn field(row: &Row, name: &str) -> String {
    row.get(name).cloned().unwrap_or_default()
}

fn given(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// ===== Bird =====

/// An adult bird.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bird {
    #[serde(rename = "BirdID")]
    pub bird_id: String,
    #[serde(rename = "RingNo")]
    pub ring_no: String,
    #[serde(rename = "Species")]
    pub species: String,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "Color")]
    pub color: String,
    #[serde(rename = "BirthDate")]
    pub birth_date: String,
    #[serde(rename = "Origin")]
    pub origin: String,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// Body of `POST /birds` and `PUT /birds/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdInput {
    #[serde(
        rename = "RingNo",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub ring_no: Option<String>,
    #[serde(
        rename = "Species",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub species: Option<String>,
    #[serde(
        rename = "Sex",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub sex: Option<String>,
    #[serde(
        rename = "Color",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    #[serde(
        rename = "BirthDate",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<String>,
    #[serde(
        rename = "Origin",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub origin: Option<String>,
    #[serde(
        rename = "Notes",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

impl BirdInput {
    /// A fresh entry form: sex unknown, bred in house.
    pub fn form_default() -> Self {
        Self {
            sex: Some(Sex::Unknown.to_string()),
            origin: Some(Origin::BredInHouse.to_string()),
            ..Self::default()
        }
    }
}

impl Record for Bird {
    type Input = BirdInput;

    const TABLE: TableSpec = BIRDS;
    const KIND: &'static str = "Bird";
    const ID_FIELD: &'static str = "BirdID";
    const RESOURCE: &'static str = "birds";
    const HEADER: &'static [&'static str] = &[
        "BirdID",
        "RingNo",
        "Species",
        "Sex",
        "Color",
        "BirthDate",
        "Origin",
        "Notes",
    ];

    fn id(&self) -> &str {
        &self.bird_id
    }

    fn cells(input: &BirdInput) -> Vec<String> {
        vec![
            text(input.ring_no.as_ref()),
            text(input.species.as_ref()),
            text(input.sex.as_ref()),
            text(input.color.as_ref()),
            text(input.birth_date.as_ref()),
            text(input.origin.as_ref()),
            text(input.notes.as_ref()),
        ]
    }

    fn from_row(row: &Row) -> Self {
        Self {
            bird_id: field(row, "BirdID"),
            ring_no: field(row, "RingNo"),
            species: field(row, "Species"),
            sex: field(row, "Sex"),
            color: field(row, "Color"),
            birth_date: field(row, "BirthDate"),
            origin: field(row, "Origin"),
            notes: field(row, "Notes"),
        }
    }

    fn form_default() -> BirdInput {
        BirdInput::form_default()
    }

    fn to_input(&self) -> BirdInput {
        BirdInput {
            ring_no: given(&self.ring_no),
            species: given(&self.species),
            sex: given(&self.sex).or_else(|| Some(Sex::Unknown.to_string())),
            color: given(&self.color),
            birth_date: given(&self.birth_date),
            origin: given(&self.origin).or_else(|| Some(Origin::BredInHouse.to_string())),
            notes: given(&self.notes),
        }
    }
}

// ===== Pair =====

/// A breeding pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pair {
    #[serde(rename = "PairID")]
    pub pair_id: String,
    #[serde(rename = "MaleID")]
    pub male_id: String,
    #[serde(rename = "FemaleID")]
    pub female_id: String,
    #[serde(rename = "StartDate")]
    pub start_date: String,
    #[serde(rename = "EndDate")]
    pub end_date: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// Body of `POST /pairs` and `PUT /pairs/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairInput {
    #[serde(
        rename = "MaleID",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub male_id: Option<String>,
    #[serde(
        rename = "FemaleID",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub female_id: Option<String>,
    #[serde(
        rename = "StartDate",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<String>,
    #[serde(
        rename = "EndDate",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<String>,
    #[serde(
        rename = "Status",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        rename = "Notes",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

impl PairInput {
    /// A fresh entry form: active.
    pub fn form_default() -> Self {
        Self {
            status: Some(PairStatus::Active.to_string()),
            ..Self::default()
        }
    }
}

impl Pair {
    /// Active unless explicitly ended; a blank status counts as active.
    pub fn is_active(&self) -> bool {
        let status = self.status.trim();
        status.is_empty() || status == PairStatus::Active.as_str()
    }
}

impl Record for Pair {
    type Input = PairInput;

    const TABLE: TableSpec = PAIRS;
    const KIND: &'static str = "Pair";
    const ID_FIELD: &'static str = "PairID";
    const RESOURCE: &'static str = "pairs";
    const HEADER: &'static [&'static str] = &[
        "PairID",
        "MaleID",
        "FemaleID",
        "StartDate",
        "EndDate",
        "Status",
        "Notes",
    ];

    fn id(&self) -> &str {
        &self.pair_id
    }

    fn cells(input: &PairInput) -> Vec<String> {
        vec![
            text(input.male_id.as_ref()),
            text(input.female_id.as_ref()),
            text(input.start_date.as_ref()),
            text(input.end_date.as_ref()),
            text_or(input.status.as_ref(), PairStatus::Active.as_str()),
            text(input.notes.as_ref()),
        ]
    }

    fn from_row(row: &Row) -> Self {
        Self {
            pair_id: field(row, "PairID"),
            male_id: field(row, "MaleID"),
            female_id: field(row, "FemaleID"),
            start_date: field(row, "StartDate"),
            end_date: field(row, "EndDate"),
            status: field(row, "Status"),
            notes: field(row, "Notes"),
        }
    }

    fn form_default() -> PairInput {
        PairInput::form_default()
    }

    fn to_input(&self) -> PairInput {
        PairInput {
            male_id: given(&self.male_id),
            female_id: given(&self.female_id),
            start_date: given(&self.start_date),
            end_date: given(&self.end_date),
            status: given(&self.status).or_else(|| Some(PairStatus::Active.to_string())),
            notes: given(&self.notes),
        }
    }
}

// ===== Chick =====

/// A chick from a clutch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chick {
    #[serde(rename = "ChickID")]
    pub chick_id: String,
    /// Pair id of the parents.
    #[serde(rename = "ClutchID")]
    pub clutch_id: String,
    /// Bird id once the chick is registered as an adult.
    #[serde(rename = "BirdID")]
    pub bird_id: String,
    #[serde(rename = "RingNo")]
    pub ring_no: String,
    #[serde(rename = "HatchDate")]
    pub hatch_date: String,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "Color")]
    pub color: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// Body of `POST /chicks` and `PUT /chicks/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChickInput {
    #[serde(
        rename = "ClutchID",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub clutch_id: Option<String>,
    #[serde(
        rename = "BirdID",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub bird_id: Option<String>,
    #[serde(
        rename = "RingNo",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub ring_no: Option<String>,
    #[serde(
        rename = "HatchDate",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub hatch_date: Option<String>,
    #[serde(
        rename = "Sex",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub sex: Option<String>,
    #[serde(
        rename = "Color",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    #[serde(
        rename = "Status",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        rename = "Notes",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

impl ChickInput {
    /// A fresh entry form: sex unchecked, alive.
    pub fn form_default() -> Self {
        Self {
            sex: Some(ChickSex::Unchecked.to_string()),
            status: Some(ChickStatus::Alive.to_string()),
            ..Self::default()
        }
    }
}

impl Chick {
    /// Everything except a recorded death counts as alive.
    pub fn is_alive(&self) -> bool {
        self.status != ChickStatus::Deceased.as_str()
    }
}

impl Record for Chick {
    type Input = ChickInput;

    const TABLE: TableSpec = CHICKS;
    const KIND: &'static str = "Chick";
    const ID_FIELD: &'static str = "ChickID";
    const RESOURCE: &'static str = "chicks";
    const HEADER: &'static [&'static str] = &[
        "ChickID",
        "ClutchID",
        "BirdID",
        "RingNo",
        "HatchDate",
        "Sex",
        "Color",
        "Status",
        "Notes",
    ];

    fn id(&self) -> &str {
        &self.chick_id
    }

    fn cells(input: &ChickInput) -> Vec<String> {
        vec![
            text(input.clutch_id.as_ref()),
            text(input.bird_id.as_ref()),
            text(input.ring_no.as_ref()),
            text(input.hatch_date.as_ref()),
            text(input.sex.as_ref()),
            text(input.color.as_ref()),
            text(input.status.as_ref()),
            text(input.notes.as_ref()),
        ]
    }

    fn from_row(row: &Row) -> Self {
        Self {
            chick_id: field(row, "ChickID"),
            clutch_id: field(row, "ClutchID"),
            bird_id: field(row, "BirdID"),
            ring_no: field(row, "RingNo"),
            hatch_date: field(row, "HatchDate"),
            sex: field(row, "Sex"),
            color: field(row, "Color"),
            status: field(row, "Status"),
            notes: field(row, "Notes"),
        }
    }

    fn form_default() -> ChickInput {
        ChickInput::form_default()
    }

    fn to_input(&self) -> ChickInput {
        ChickInput {
            clutch_id: given(&self.clutch_id),
            bird_id: given(&self.bird_id),
            ring_no: given(&self.ring_no),
            hatch_date: given(&self.hatch_date),
            sex: given(&self.sex).or_else(|| Some(ChickSex::Unchecked.to_string())),
            color: given(&self.color),
            status: given(&self.status).or_else(|| Some(ChickStatus::Alive.to_string())),
            notes: given(&self.notes),
        }
    }
}
