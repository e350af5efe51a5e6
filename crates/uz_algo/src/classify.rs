//! Keyword classifiers for assessor text fields.

use core::fmt;

use uz_core::parcel::OwnerType;

/// Owner category from the owner name. First matching group wins.
pub fn classify_owner_type(owner_name: &str) -> OwnerType {
    let owner = owner_name.to_ascii_uppercase();
    let has = |words: &[&str]| words.iter().any(|w| owner.contains(w));

    if has(&["SCHOOL", "EDUCATION"]) {
        OwnerType::School
    } else if has(&["CITY", "COUNTY", "STATE", "FEDERAL", "GOVERNMENT"]) {
        OwnerType::Govt
    } else if has(&["CHURCH", "RELIGIOUS"]) {
        OwnerType::Church
    } else if has(&["RTD", "REGIONAL TRANSPORTATION"]) {
        OwnerType::Rtd
    } else {
        OwnerType::Private
    }
}

/// Coarse land-use bucket derived from the assessor property class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Vacant,
    Residential,
    Commercial,
    Industrial,
    Other,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Vacant => "vacant",
            PropertyKind::Residential => "residential",
            PropertyKind::Commercial => "commercial",
            PropertyKind::Industrial => "industrial",
            PropertyKind::Other => "other",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify_property_type(property_class: &str) -> PropertyKind {
    let pc = property_class.to_ascii_uppercase();
    let has = |words: &[&str]| words.iter().any(|w| pc.contains(w));

    if has(&["VACANT"]) {
        PropertyKind::Vacant
    } else if has(&["RESIDENTIAL", "SFR", "SINGLE"]) {
        PropertyKind::Residential
    } else if has(&["COMMERCIAL", "RETAIL", "OFFICE"]) {
        PropertyKind::Commercial
    } else if has(&["INDUSTRIAL", "WAREHOUSE"]) {
        PropertyKind::Industrial
    } else {
        PropertyKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owners() {
        assert_eq!(classify_owner_type("Denver Public Schools"), OwnerType::School);
        assert_eq!(classify_owner_type("CITY & COUNTY OF DENVER"), OwnerType::Govt);
        assert_eq!(classify_owner_type("State of Colorado"), OwnerType::Govt);
        assert_eq!(classify_owner_type("First Baptist Church"), OwnerType::Church);
        assert_eq!(classify_owner_type("REGIONAL TRANSPORTATION DISTRICT"), OwnerType::Rtd);
        assert_eq!(classify_owner_type("RTD"), OwnerType::Rtd);
        assert_eq!(classify_owner_type("SMITH JOHN"), OwnerType::Private);
        // school outranks the government keywords
        assert_eq!(classify_owner_type("STATE BOARD OF EDUCATION"), OwnerType::School);
    }

    #[test]
    fn property_kinds() {
        assert_eq!(classify_property_type("VACANT LAND"), PropertyKind::Vacant);
        assert_eq!(classify_property_type("Single Family Residential"), PropertyKind::Residential);
        assert_eq!(classify_property_type("RETAIL STORE"), PropertyKind::Commercial);
        assert_eq!(classify_property_type("WAREHOUSE/STORAGE"), PropertyKind::Industrial);
        assert_eq!(classify_property_type("VACANT COMMERCIAL"), PropertyKind::Vacant);
        assert_eq!(classify_property_type("EXEMPT"), PropertyKind::Other);
        assert_eq!(PropertyKind::Commercial.to_string(), "commercial");
    }
}
