//! Region labels: membership, EA class, direction, migration, period

use std::fmt;

use chanshift_core::{Error, Result, Side, Year};
use serde::{Deserialize, Serialize};

/// What a location was in one observation year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Membership {
    /// Inside the raw channel polygon
    Channel,
    /// Inside a hole of the channel polygon
    Island,
    /// Outside the filled channel polygon
    Absent,
}

/// Erosion/accumulation class of a region between two years
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EaClass {
    Erosion,
    Deposition,
    Hollow,
    IslandErosion,
    IslandDeposition,
    Stable,
}

impl EaClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EaClass::Erosion => "erosion",
            EaClass::Deposition => "deposition",
            EaClass::Hollow => "hollow",
            EaClass::IslandErosion => "island_erosion",
            EaClass::IslandDeposition => "island_deposition",
            EaClass::Stable => "stable",
        }
    }
}

impl fmt::Display for EaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a region from its membership in the older and younger year.
///
/// Rules are tried in order; the first match wins.
pub fn classify_ea(old: Membership, young: Membership) -> EaClass {
    use Membership::*;
    match (old, young) {
        (Absent, Channel) => EaClass::Erosion,
        (Channel, Absent) => EaClass::Deposition,
        (Absent, Absent) => EaClass::Hollow,
        (Island, Channel) => EaClass::IslandErosion,
        (Channel, Island) => EaClass::IslandDeposition,
        // Same type both years, or absent in one year and island in the other
        _ => EaClass::Stable,
    }
}

/// Bank side a change is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bank(Side),
    InChannel,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bank(side) => side.as_str(),
            Direction::InChannel => "in-channel process",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a region given its sides relative to both years' centerlines.
///
/// Deposition and hollows take the younger side, erosion the older side;
/// everything else happened inside the channel.
pub fn direction(ea: EaClass, old_side: Side, young_side: Side) -> Direction {
    match ea {
        EaClass::Deposition | EaClass::Hollow => Direction::Bank(young_side),
        EaClass::Erosion => Direction::Bank(old_side),
        _ => Direction::InChannel,
    }
}

/// Migration label: `erosion_<side>`, `deposition_<side>` or the in-channel
/// direction unchanged.
pub fn migration(ea: EaClass, direction: Direction) -> String {
    match (ea, direction) {
        (_, Direction::InChannel) => Direction::InChannel.as_str().to_string(),
        (EaClass::Deposition, Direction::Bank(side)) => format!("deposition_{}", side),
        (_, Direction::Bank(side)) => format!("erosion_{}", side),
    }
}

/// `"<old>_<young>"`
pub fn period(old: &Year, young: &Year) -> String {
    format!("{}_{}", old, young)
}

/// Years between two observations, never less than 1.
///
/// Uses the numeric value of the first four characters of each token.
pub fn span_year(old: &Year, young: &Year) -> Result<i32> {
    let numeric = |y: &Year| {
        y.numeric().ok_or_else(|| {
            Error::invalid_parameter("year", y, "first four characters are not a year")
        })
    };
    Ok((numeric(young)? - numeric(old)?).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use Membership::*;

    #[test]
    fn test_ea_precedence() {
        assert_eq!(classify_ea(Absent, Channel), EaClass::Erosion);
        assert_eq!(classify_ea(Channel, Absent), EaClass::Deposition);
        assert_eq!(classify_ea(Absent, Absent), EaClass::Hollow);
        assert_eq!(classify_ea(Island, Channel), EaClass::IslandErosion);
        assert_eq!(classify_ea(Channel, Island), EaClass::IslandDeposition);
        assert_eq!(classify_ea(Channel, Channel), EaClass::Stable);
        assert_eq!(classify_ea(Island, Island), EaClass::Stable);
        assert_eq!(classify_ea(Absent, Island), EaClass::Stable);
        assert_eq!(classify_ea(Island, Absent), EaClass::Stable);
    }

    #[test]
    fn test_direction_rules() {
        assert_eq!(direction(EaClass::Erosion, Side::Left, Side::Right), Direction::Bank(Side::Left));
        assert_eq!(direction(EaClass::Deposition, Side::Left, Side::Right), Direction::Bank(Side::Right));
        assert_eq!(direction(EaClass::Hollow, Side::Left, Side::Right), Direction::Bank(Side::Right));
        assert_eq!(direction(EaClass::Stable, Side::Left, Side::Right), Direction::InChannel);
        assert_eq!(direction(EaClass::IslandErosion, Side::Left, Side::Left), Direction::InChannel);
    }

    #[test]
    fn test_migration_labels() {
        assert_eq!(migration(EaClass::Erosion, Direction::Bank(Side::Left)), "erosion_LEFT");
        assert_eq!(migration(EaClass::Deposition, Direction::Bank(Side::Right)), "deposition_RIGHT");
        assert_eq!(migration(EaClass::Hollow, Direction::Bank(Side::Right)), "erosion_RIGHT");
        assert_eq!(migration(EaClass::Erosion, Direction::InChannel), "in-channel process");
        assert_eq!(migration(EaClass::Stable, Direction::InChannel), "in-channel process");
    }

    #[test]
    fn test_span_year_never_below_one() {
        assert_eq!(span_year(&Year::new("2001"), &Year::new("2001")).unwrap(), 1);
        assert_eq!(span_year(&Year::new("2000"), &Year::new("2010")).unwrap(), 10);
        assert_eq!(span_year(&Year::new("1998a"), &Year::new("2003_06")).unwrap(), 5);
        assert!(span_year(&Year::new("old"), &Year::new("2003")).is_err());
    }

    #[test]
    fn test_period_label() {
        assert_eq!(period(&Year::new("2000"), &Year::new("2010")), "2000_2010");
    }
}
