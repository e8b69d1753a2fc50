//! Domain-to-pixel mapping shared by the timeline, tiles and sparklines.

/// Map position `i` of `[0, domain_max]` linearly onto `[range_min, range_max]`.
pub fn index_to_x(i: f64, domain_max: f64, range_min: f64, range_max: f64) -> f64 {
    if domain_max == 0.0 {
        return range_min;
    }
    range_min + (i / domain_max) * (range_max - range_min)
}

/// Map `v` of `[0, domain_max]` onto `[range_max, range_min]`: larger values sit higher.
pub fn value_to_y(v: f64, domain_max: f64, range_max: f64, range_min: f64) -> f64 {
    if domain_max == 0.0 {
        return range_max;
    }
    range_max - (v / domain_max) * (range_max - range_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_maps_endpoints() {
        assert_eq!(index_to_x(0.0, 10.0, 50.0, 950.0), 50.0);
        assert_eq!(index_to_x(10.0, 10.0, 50.0, 950.0), 950.0);
        assert_eq!(index_to_x(5.0, 10.0, 0.0, 40.0), 20.0);
    }

    #[test]
    fn empty_domain_does_not_divide_by_zero() {
        assert_eq!(index_to_x(3.0, 0.0, 7.0, 100.0), 7.0);
        assert_eq!(value_to_y(3.0, 0.0, 120.0, 0.0), 120.0);
    }

    #[test]
    fn values_are_inverted() {
        assert_eq!(value_to_y(0.0, 200.0, 120.0, 0.0), 120.0);
        assert_eq!(value_to_y(200.0, 200.0, 120.0, 0.0), 0.0);
        assert!(value_to_y(150.0, 200.0, 120.0, 0.0) < value_to_y(50.0, 200.0, 120.0, 0.0));
    }
}
