use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking workflow outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    /// Blood requests created.
    pub requests_created: AtomicU64,
    /// Requests moved to approved (including via the generic update path).
    pub requests_approved: AtomicU64,
    /// Requests moved to rejected.
    pub requests_rejected: AtomicU64,
    /// Requests moved to fulfilled.
    pub requests_fulfilled: AtomicU64,
    /// Requests cancelled by their requester.
    pub requests_cancelled: AtomicU64,
    /// Field edits applied through the generic update path.
    pub requests_updated: AtomicU64,
    /// Transitions refused by the state machine.
    pub transition_conflicts: AtomicU64,
    /// Compare-and-swap attempts that lost a race and re-read the request.
    pub cas_retries: AtomicU64,
    /// Donations recorded.
    pub donations_recorded: AtomicU64,
    /// Units credited to inventory by donations.
    pub units_credited: AtomicU64,
    /// Donor profiles created lazily while recording a donation.
    pub donors_created: AtomicU64,
    /// Direct inventory sets.
    pub inventory_sets: AtomicU64,
    /// Appointments booked.
    pub appointments_booked: AtomicU64,
    /// Operations refused because of the caller's role.
    pub permission_denied: AtomicU64,
}

impl GatewayMetrics {
    pub fn increment_requests_created(&self) {
        self.requests_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_approved(&self) {
        self.requests_approved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_fulfilled(&self) {
        self.requests_fulfilled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_cancelled(&self) {
        self.requests_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_updated(&self) {
        self.requests_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transition_conflicts(&self) {
        self.transition_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cas_retries(&self) {
        self.cas_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_donations_recorded(&self) {
        self.donations_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Add `units` to the credited-units counter.
    pub fn add_units_credited(&self, units: u64) {
        self.units_credited.fetch_add(units, Ordering::Relaxed);
    }

    pub fn increment_donors_created(&self) {
        self.donors_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_inventory_sets(&self) {
        self.inventory_sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_appointments_booked(&self) {
        self.appointments_booked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_permission_denied(&self) {
        self.permission_denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_created: self.requests_created.load(Ordering::Relaxed),
            requests_approved: self.requests_approved.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            requests_fulfilled: self.requests_fulfilled.load(Ordering::Relaxed),
            requests_cancelled: self.requests_cancelled.load(Ordering::Relaxed),
            requests_updated: self.requests_updated.load(Ordering::Relaxed),
            transition_conflicts: self.transition_conflicts.load(Ordering::Relaxed),
            cas_retries: self.cas_retries.load(Ordering::Relaxed),
            donations_recorded: self.donations_recorded.load(Ordering::Relaxed),
            units_credited: self.units_credited.load(Ordering::Relaxed),
            donors_created: self.donors_created.load(Ordering::Relaxed),
            inventory_sets: self.inventory_sets.load(Ordering::Relaxed),
            appointments_booked: self.appointments_booked.load(Ordering::Relaxed),
            permission_denied: self.permission_denied.load(Ordering::Relaxed),
        }
    }
}

/// A plain-data snapshot of [`GatewayMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_created: u64,
    pub requests_approved: u64,
    pub requests_rejected: u64,
    pub requests_fulfilled: u64,
    pub requests_cancelled: u64,
    pub requests_updated: u64,
    pub transition_conflicts: u64,
    pub cas_retries: u64,
    pub donations_recorded: u64,
    pub units_credited: u64,
    pub donors_created: u64,
    pub inventory_sets: u64,
    pub appointments_booked: u64,
    pub permission_denied: u64,
}
