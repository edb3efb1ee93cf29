//! Education-level categories used to pick marker icons and colours.

use std::fmt;

/// Marker category derived from a school's `bentuk_pendidikan`.
///
/// # Examples
///
/// ```
/// use sekolah_core::EducationLevel;
///
/// assert_eq!(EducationLevel::from_label("smp"), EducationLevel::Smp);
/// assert_eq!(EducationLevel::from_label("PKBM"), EducationLevel::Other);
/// assert_eq!(EducationLevel::Smp.icon_name(), "school-smp");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EducationLevel {
    /// Primary school.
    Sd,
    /// Junior secondary school.
    Smp,
    /// Senior secondary school.
    Sma,
    /// Vocational secondary school.
    Smk,
    /// Anything else (kindergarten, SLB, PKBM, ...).
    Other,
}

impl EducationLevel {
    /// Every category, the default last.
    pub const ALL: [Self; 5] = [Self::Sd, Self::Smp, Self::Sma, Self::Smk, Self::Other];

    /// Classify a raw level label. Matching ignores case and surrounding
    /// whitespace; unknown labels fall back to [`EducationLevel::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "SD" => Self::Sd,
            "SMP" => Self::Smp,
            "SMA" => Self::Sma,
            "SMK" => Self::Smk,
            _ => Self::Other,
        }
    }

    /// Image name registered with the map engine for this category.
    #[must_use]
    pub const fn icon_name(self) -> &'static str {
        match self {
            Self::Sd => "school-sd",
            Self::Smp => "school-smp",
            Self::Sma => "school-sma",
            Self::Smk => "school-smk",
            Self::Other => "school-default",
        }
    }

    /// Marker colour as a CSS hex string.
    #[must_use]
    pub const fn colour(self) -> &'static str {
        match self {
            Self::Sd => "#ef4444",
            Self::Smp => "#3b82f6",
            Self::Sma => "#10b981",
            Self::Smk => "#f59e0b",
            Self::Other => "#8b5cf6",
        }
    }

    /// Label as it appears in upstream data.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sd => "SD",
            Self::Smp => "SMP",
            Self::Sma => "SMA",
            Self::Smk => "SMK",
            Self::Other => "Lainnya",
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
