//! ISD-AS identifiers.
//!
//! An AS number alone does not name a SCION AS uniquely, so everything that
//! refers to an AS across isolation domains is keyed by [`IsdAsn`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Isolation domain number
pub type Isd = u16;

/// Autonomous system number
pub type Asn = u32;

/// Error returned when an `"<isd>-<asn>"` string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ISD-AS identifier '{0}', expected '<isd>-<asn>'")]
pub struct IsdAsnParseError(pub String);

/// ISD-ASN pair identifying a SCION AS.
///
/// Ordering is lexicographic on `(isd, asn)`. The canonical textual form is
/// `"<isd>-<asn>"`, which is also the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsdAsn {
    pub isd: Isd,
    pub asn: Asn,
}

impl IsdAsn {
    pub const fn new(isd: Isd, asn: Asn) -> Self {
        Self { isd, asn }
    }
}

impl From<(Isd, Asn)> for IsdAsn {
    fn from((isd, asn): (Isd, Asn)) -> Self {
        Self::new(isd, asn)
    }
}

impl Display for IsdAsn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.isd, self.asn)
    }
}

impl FromStr for IsdAsn {
    type Err = IsdAsnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IsdAsnParseError(s.to_string());
        let (isd, asn) = s.trim().split_once('-').ok_or_else(err)?;
        let isd = isd.parse::<Isd>().map_err(|_| err())?;
        let asn = asn.parse::<Asn>().map_err(|_| err())?;
        Ok(Self::new(isd, asn))
    }
}

impl Serialize for IsdAsn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsdAsn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        string.parse().map_err(serde::de::Error::custom)
    }
}
