//! Document-type labels produced by the upstream classifier.

pub const ARTICLES_OF_ASSOCIATION: &str = "Articles of Association";
pub const SHAREHOLDER_RESOLUTION: &str = "Shareholder Resolution";
pub const BOARD_RESOLUTION: &str = "Board Resolution";
pub const INCORPORATION_APPLICATION: &str = "Incorporation Application Form";
pub const REGISTER_OF_MEMBERS: &str = "Register of Members";
pub const REGISTER_OF_DIRECTORS: &str = "Register of Directors";
pub const EMPLOYMENT_CONTRACT: &str = "Employment Contract";
pub const DATA_PROTECTION_POLICY: &str = "Data Protection Policy";
pub const APPROPRIATE_POLICY_DOCUMENT: &str = "Appropriate Policy Document";
pub const OTHER: &str = "Other";

/// Required by the incorporation checklist but not emitted by the classifier.
pub const UBO_DECLARATION: &str = "UBO Declaration Form";
pub const REGISTER_OF_MEMBERS_AND_DIRECTORS: &str = "Register of Members and Directors";

pub const KNOWN_LABELS: [&str; 10] = [
    ARTICLES_OF_ASSOCIATION,
    SHAREHOLDER_RESOLUTION,
    BOARD_RESOLUTION,
    INCORPORATION_APPLICATION,
    REGISTER_OF_MEMBERS,
    REGISTER_OF_DIRECTORS,
    EMPLOYMENT_CONTRACT,
    DATA_PROTECTION_POLICY,
    APPROPRIATE_POLICY_DOCUMENT,
    OTHER,
];

pub fn is_known(label: &str) -> bool {
    KNOWN_LABELS.contains(&label)
}
