//! S3 storage classes.

/// Redundancy level requested for stored objects.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::EnumIter,
    derive_more::Display,
)]
pub enum StorageClass {
    /// Full redundancy
    #[display("STANDARD")]
    Standard,
    /// Cheaper, less durable storage
    #[default]
    #[display("REDUCED_REDUNDANCY")]
    ReducedRedundancy,
}

impl StorageClass {
    /// Parse a storage class leniently.
    ///
    /// `rrs`, `rr`, `reduced_redundancy` and `reducedRedundancy` (any case,
    /// surrounding whitespace ignored) mean [`StorageClass::ReducedRedundancy`];
    /// anything else means [`StorageClass::Standard`].
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "rrs" | "rr" | "reduced_redundancy" | "reducedredundancy" => {
                StorageClass::ReducedRedundancy
            }
            _ => StorageClass::Standard,
        }
    }

    /// Header value sent to the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::ReducedRedundancy => "REDUCED_REDUNDANCY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_aliases() {
        for alias in ["rrs", "RR", " reduced_redundancy ", "reducedRedundancy"] {
            assert_eq!(StorageClass::parse_lenient(alias), StorageClass::ReducedRedundancy);
        }
        assert_eq!(StorageClass::parse_lenient("standard"), StorageClass::Standard);
        assert_eq!(StorageClass::parse_lenient("glacier"), StorageClass::Standard);
    }

    #[test]
    fn test_display_matches_header_value() {
        for class in StorageClass::iter() {
            assert_eq!(class.to_string(), class.as_str());
        }
    }
}
