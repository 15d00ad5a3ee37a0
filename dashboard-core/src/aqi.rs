//! Air quality index banding.

/// Presentation band for an upstream AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AqiBand {
    pub index: i32,
    pub label: &'static str,
    pub description: &'static str,
    /// Bar fill, `index * 20` percent for known bands and 0 otherwise.
    pub intensity_pct: u8,
}

impl AqiBand {
    pub fn is_known(&self) -> bool {
        (1..=5).contains(&self.index)
    }
}

pub const UNKNOWN_LABEL: &str = "Unknown air quality";

/// Maps an index from the air pollution endpoint to its band.
pub fn classify(aqi: i32) -> AqiBand {
    let (label, description) = match aqi {
        1 => ("Good", "Good - Air quality is satisfactory"),
        2 => ("Fair", "Fair - Air quality is acceptable"),
        3 => (
            "Moderate",
            "Moderate - Sensitive groups should limit outdoor exertion",
        ),
        4 => ("Poor", "Poor - Health alert for everyone"),
        5 => (
            "Very Poor",
            "Very Poor - Health warnings of emergency conditions",
        ),
        _ => (UNKNOWN_LABEL, UNKNOWN_LABEL),
    };

    let intensity_pct = match aqi {
        1..=5 => (aqi * 20).min(100) as u8,
        _ => 0,
    };

    AqiBand {
        index: aqi,
        label,
        description,
        intensity_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_bands() {
        let labels: Vec<_> = (1..=5).map(|i| classify(i).label).collect();
        assert_eq!(labels, ["Good", "Fair", "Moderate", "Poor", "Very Poor"]);
    }

    #[test]
    fn out_of_range_is_unknown() {
        for aqi in [0, 6, -1, i32::MAX] {
            let band = classify(aqi);
            assert_eq!(band.label, UNKNOWN_LABEL);
            assert!(!band.is_known());
            assert_eq!(band.intensity_pct, 0);
        }
    }

    #[test]
    fn intensity_scales_by_twenty() {
        assert_eq!(classify(1).intensity_pct, 20);
        assert_eq!(classify(3).intensity_pct, 60);
        assert_eq!(classify(5).intensity_pct, 100);
    }

    #[test]
    fn description_leads_with_label() {
        for i in 1..=5 {
            let band = classify(i);
            assert!(band.description.starts_with(band.label));
        }
    }
}
