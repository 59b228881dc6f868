//! # Capacity Balancer
//!
//! The central system's load-shedding arithmetic. The decision is a pure
//! function of its three declared inputs; in particular it trusts the
//! charge point's self-reported draw. That trust is the point: the
//! load-shedding scenario demonstrates how a falsified report steers the
//! grant decision, and the demonstration only stays reproducible if no
//! hidden validation second-guesses the inputs.

/// Site-level balancing parameters.
#[derive(Debug, Clone, Copy)]
pub struct CapacityBalancer {
    /// What the site transformer can carry, in watts.
    pub site_capacity_w: i64,
    /// Aggregate draw of every other vehicle on site, in watts.
    pub other_load_w: i64,
    /// Headroom required before extra power is granted, in watts.
    pub margin_w: i64,
}

impl Default for CapacityBalancer {
    fn default() -> Self {
        Self {
            site_capacity_w: 50_000,
            other_load_w: 30_000,
            margin_w: 10_000,
        }
    }
}

impl CapacityBalancer {
    /// Remaining headroom given the reported draw:
    /// `site_capacity - other_load - reported_load`.
    pub fn available_capacity(&self, reported_load_w: i64) -> i64 {
        self.site_capacity_w - self.other_load_w - reported_load_w
    }

    /// Whether extra power may be granted to the rest of the site.
    /// True iff the remaining headroom strictly exceeds the margin.
    pub fn grant_more_power(&self, reported_load_w: i64) -> bool {
        self.available_capacity(reported_load_w) > self.margin_w
    }
}
