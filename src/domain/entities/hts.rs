//! Harmonized Tariff Schedule reference entities.

use serde::{Deserialize, Serialize};

/// Which duty-rate column of the tariff schedule a rate was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    General,
    Special,
    #[serde(rename = "column_2")]
    Column2,
}

impl RateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::General => "general",
            RateType::Special => "special",
            RateType::Column2 => "column_2",
        }
    }
}

/// A tariff line as stored in the reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct HtsRow {
    pub hts_number: String,
    pub description: String,
    pub general_rate_of_duty: Option<String>,
    pub special_rate_of_duty: Option<String>,
    pub column_2_rate_of_duty: Option<String>,
    pub unit_of_quantity: Vec<String>,
    pub additional_duties: Option<String>,
}

/// The result of resolving an HTS code, with the rate chosen for duty work.
///
/// Built per lookup and never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtsDutyRecord {
    pub hts_number: String,
    pub description: String,
    pub general_rate_of_duty: Option<String>,
    pub special_rate_of_duty: Option<String>,
    pub column_2_rate_of_duty: Option<String>,
    pub unit_of_quantity: Vec<String>,
    pub additional_duties: Option<String>,
    pub selected_rate: Option<String>,
    pub selected_rate_type: Option<RateType>,
}

impl HtsDutyRecord {
    /// Builds a record from a reference row and its selected rate.
    pub fn from_row(row: HtsRow, selected: Option<(String, RateType)>) -> Self {
        let (selected_rate, selected_rate_type) = match selected {
            Some((rate, kind)) => (Some(rate), Some(kind)),
            None => (None, None),
        };

        Self {
            hts_number: row.hts_number,
            description: row.description,
            general_rate_of_duty: row.general_rate_of_duty,
            special_rate_of_duty: row.special_rate_of_duty,
            column_2_rate_of_duty: row.column_2_rate_of_duty,
            unit_of_quantity: row.unit_of_quantity,
            additional_duties: row.additional_duties,
            selected_rate,
            selected_rate_type,
        }
    }
}

/// An entry of the USITC `htsdata.json` export, as consumed by the importer.
///
/// Header lines without an `htsno` are skipped on import. The export has
/// carried the additional-duties key both correctly and misspelled.
#[derive(Debug, Clone, Deserialize)]
pub struct HtsSourceEntry {
    #[serde(default)]
    pub htsno: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(default)]
    pub general: Option<String>,
    #[serde(default)]
    pub special: Option<String>,
    #[serde(default)]
    pub other: Option<String>,
    #[serde(default, rename = "additionalDuties")]
    pub additional_duties: Option<String>,
    #[serde(default, rename = "addiitionalDuties")]
    pub additional_duties_misspelled: Option<String>,
}

impl HtsSourceEntry {
    /// Converts to a reference row, or `None` for header entries.
    pub fn into_row(self) -> Option<HtsRow> {
        let hts_number = self.htsno.trim().to_string();
        if hts_number.is_empty() {
            return None;
        }

        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Some(HtsRow {
            hts_number,
            description: self.description,
            general_rate_of_duty: non_blank(self.general),
            special_rate_of_duty: non_blank(self.special),
            column_2_rate_of_duty: non_blank(self.other),
            unit_of_quantity: self.units.into_iter().filter(|u| !u.is_empty()).collect(),
            additional_duties: non_blank(self.additional_duties)
                .or(non_blank(self.additional_duties_misspelled)),
        })
    }
}
