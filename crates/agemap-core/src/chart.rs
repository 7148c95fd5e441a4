//! Seven-number age summary of a weighted time distribution.

/// Sentinel marking an unset chart field: the minimum representable time.
pub const LOW: i64 = i64::MIN;

/// Box-plot statistics over file modification times, weighted by byte count:
/// minimum, 5th/25th/50th/75th/95th percentile and maximum, all in seconds
/// since the Unix epoch. Never mutated after the calculator completes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeChart {
    pub min: i64,
    pub lower_whisker: i64,
    pub lower_quartile: i64,
    pub median: i64,
    pub upper_quartile: i64,
    pub upper_whisker: i64,
    pub max: i64,
}

impl Default for AgeChart {
    /// The unset chart: every field at [`LOW`]. Produced for inputs with no
    /// weight ("no data").
    fn default() -> Self {
        Self {
            min: LOW,
            lower_whisker: LOW,
            lower_quartile: LOW,
            median: LOW,
            upper_quartile: LOW,
            upper_whisker: LOW,
            max: LOW,
        }
    }
}

impl AgeChart {
    /// True when all seven fields are set and ordered.
    pub fn valid(&self) -> bool {
        self.min > LOW
            && self.lower_whisker >= self.min
            && self.lower_quartile >= self.lower_whisker
            && self.median >= self.lower_quartile
            && self.upper_quartile >= self.median
            && self.upper_whisker >= self.upper_quartile
            && self.max >= self.upper_whisker
    }

    /// True for a valid chart whose seven fields coincide: the summary of a
    /// single weight cluster.
    pub fn singleton(&self) -> bool {
        self.min > LOW
            && self.lower_whisker == self.min
            && self.lower_quartile == self.lower_whisker
            && self.median == self.lower_whisker
            && self.upper_quartile == self.median
            && self.upper_whisker == self.upper_quartile
            && self.max == self.upper_quartile
    }

    /// The fields in ascending order, as serialised into reports.
    pub fn as_array(&self) -> [i64; 7] {
        [
            self.min,
            self.lower_whisker,
            self.lower_quartile,
            self.median,
            self.upper_quartile,
            self.upper_whisker,
            self.max,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        let chart = AgeChart::default();
        assert!(!chart.valid());
        assert!(!chart.singleton());
        assert_eq!(chart.as_array(), [LOW; 7]);
    }

    #[test]
    fn test_ordered_chart_is_valid() {
        let chart = AgeChart {
            min: 1,
            lower_whisker: 2,
            lower_quartile: 3,
            median: 4,
            upper_quartile: 5,
            upper_whisker: 6,
            max: 7,
        };
        assert!(chart.valid());
        assert!(!chart.singleton());
        assert_eq!(chart.as_array(), [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_misordered_chart_is_invalid() {
        // Every adjacent link must hold, not just a subset.
        let chart = AgeChart {
            min: 1,
            lower_whisker: 2,
            lower_quartile: 10,
            median: 3,
            upper_quartile: 11,
            upper_whisker: 100,
            max: 50,
        };
        assert!(!chart.valid());

        let chart = AgeChart {
            min: 1,
            lower_quartile: 2,
            lower_whisker: 3,
            median: 4,
            upper_quartile: 5,
            upper_whisker: 6,
            max: 7,
        };
        assert!(!chart.valid());
    }

    #[test]
    fn test_singleton_chart() {
        let chart = AgeChart {
            min: 555,
            lower_whisker: 555,
            lower_quartile: 555,
            median: 555,
            upper_quartile: 555,
            upper_whisker: 555,
            max: 555,
        };
        assert!(chart.valid());
        assert!(chart.singleton());
    }
}
