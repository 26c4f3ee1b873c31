//! GM tube types and their count-rate to dose-rate conversion.

use core::fmt;

/// Supported Geiger-Müller tubes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TubeType {
    #[default]
    Unknown,
    Sbm20,
    Sbm19,
    Si22g,
}

impl TubeType {
    pub const ALL: [TubeType; 4] = [
        TubeType::Unknown,
        TubeType::Sbm20,
        TubeType::Sbm19,
        TubeType::Si22g,
    ];

    /// Numeric id used in telemetry payloads.
    pub const fn id(self) -> u8 {
        match self {
            TubeType::Unknown => 0,
            TubeType::Sbm20 => 20,
            TubeType::Sbm19 => 19,
            TubeType::Si22g => 22,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|tube| tube.id() == id)
    }

    /// µSv/h per count per second. Zero for an unknown tube.
    pub const fn cps_to_usvh(self) -> f32 {
        match self {
            TubeType::Unknown => 0.0,
            TubeType::Sbm20 => 1.0 / 2.47,
            TubeType::Sbm19 => 1.0 / 9.818_88,
            TubeType::Si22g => 1.0 / 12.279_2,
        }
    }

    /// Sensor label.
    pub const fn name(self) -> &'static str {
        match self {
            TubeType::Unknown => "Radiation unknown",
            TubeType::Sbm20 => "Radiation SBM-20",
            TubeType::Sbm19 => "Radiation SBM-19",
            TubeType::Si22g => "Radiation Si22G",
        }
    }

    /// Short keyword accepted on the command line.
    pub const fn keyword(self) -> &'static str {
        match self {
            TubeType::Unknown => "unknown",
            TubeType::Sbm20 => "sbm20",
            TubeType::Sbm19 => "sbm19",
            TubeType::Si22g => "si22g",
        }
    }

    /// Looks up a tube by keyword (`sbm20`) or model name (`SBM-20`),
    /// ignoring case.
    pub fn from_keyword(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tube| {
            let keyword = tube.keyword();
            text.eq_ignore_ascii_case(keyword)
                || tube
                    .name()
                    .strip_prefix("Radiation ")
                    .is_some_and(|model| text.eq_ignore_ascii_case(model))
        })
    }

    pub fn dose_usvh(self, cps: f32) -> f32 {
        cps * self.cps_to_usvh()
    }
}

impl fmt::Display for TubeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for tube in TubeType::ALL {
            assert_eq!(TubeType::from_id(tube.id()), Some(tube));
        }
        assert_eq!(TubeType::from_id(21), None);
    }

    #[test]
    fn keywords_and_model_names_are_accepted() {
        assert_eq!(TubeType::from_keyword("SBM20"), Some(TubeType::Sbm20));
        assert_eq!(TubeType::from_keyword("sbm-19"), Some(TubeType::Sbm19));
        assert_eq!(TubeType::from_keyword("Si22G"), Some(TubeType::Si22g));
        assert_eq!(TubeType::from_keyword("j305"), None);
    }

    #[test]
    fn unknown_tube_reports_zero_dose() {
        assert!(TubeType::Unknown.dose_usvh(100.0).abs() < f32::EPSILON);
        let dose = TubeType::Sbm20.dose_usvh(2.47);
        assert!((dose - 1.0).abs() < 1e-5);
    }
}
