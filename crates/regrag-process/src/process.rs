use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regrag_core::error::Error;

use crate::labels::{
    APPROPRIATE_POLICY_DOCUMENT, ARTICLES_OF_ASSOCIATION, BOARD_RESOLUTION, EMPLOYMENT_CONTRACT,
    INCORPORATION_APPLICATION, SHAREHOLDER_RESOLUTION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Process {
    #[serde(rename = "AoA Amendment")]
    AoaAmendment,
    #[serde(rename = "Company Incorporation (Private Company)")]
    CompanyIncorporation,
    #[serde(rename = "Employment Compliance")]
    EmploymentCompliance,
    #[serde(rename = "Data Protection Compliance")]
    DataProtectionCompliance,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Process {
    pub const ALL: [Process; 5] = [
        Process::AoaAmendment,
        Process::CompanyIncorporation,
        Process::EmploymentCompliance,
        Process::DataProtectionCompliance,
        Process::Unknown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Process::AoaAmendment => "AoA Amendment",
            Process::CompanyIncorporation => "Company Incorporation (Private Company)",
            Process::EmploymentCompliance => "Employment Compliance",
            Process::DataProtectionCompliance => "Data Protection Compliance",
            Process::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Process {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Process::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::NotFound(format!("process '{s}'")))
    }
}

/// First matching rule wins:
/// 1. shareholder resolution + articles -> amendment
/// 2. articles + any resolution, or an incorporation application -> incorporation
/// 3. employment contract -> employment
/// 4. appropriate policy document -> data protection
pub fn infer_process<S: AsRef<str>>(labels: &[S]) -> Process {
    let present: HashSet<&str> = labels.iter().map(AsRef::as_ref).collect();
    let has = |label: &str| present.contains(label);

    if has(SHAREHOLDER_RESOLUTION) && has(ARTICLES_OF_ASSOCIATION) {
        Process::AoaAmendment
    } else if (has(ARTICLES_OF_ASSOCIATION) && (has(SHAREHOLDER_RESOLUTION) || has(BOARD_RESOLUTION)))
        || has(INCORPORATION_APPLICATION)
    {
        Process::CompanyIncorporation
    } else if has(EMPLOYMENT_CONTRACT) {
        Process::EmploymentCompliance
    } else if has(APPROPRIATE_POLICY_DOCUMENT) {
        Process::DataProtectionCompliance
    } else {
        Process::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for p in Process::ALL {
            assert_eq!(p.name().parse::<Process>().expect("parse"), p);
        }
        assert!("Payroll".parse::<Process>().is_err());
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&Process::CompanyIncorporation).expect("json");
        assert_eq!(json, "\"Company Incorporation (Private Company)\"");
    }

    #[test]
    fn board_resolution_with_articles_is_incorporation() {
        assert_eq!(infer_process(&[ARTICLES_OF_ASSOCIATION, BOARD_RESOLUTION]), Process::CompanyIncorporation);
    }

    #[test]
    fn data_protection_policy_alone_is_unknown() {
        assert_eq!(infer_process(&["Data Protection Policy"]), Process::Unknown);
        assert_eq!(infer_process(&[APPROPRIATE_POLICY_DOCUMENT]), Process::DataProtectionCompliance);
    }
}
