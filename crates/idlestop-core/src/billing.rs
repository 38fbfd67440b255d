//! Billing cycle position and the shutdown decision

use idlestop_api::{BillingCycle, MachineIdleState, ShutdownDecision};
use idlestop_config::BillingPolicy;
use idlestop_util::{IdlestopError, IdlestopResult};

/// Billing parameters of the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingSettings {
    /// Length of one billing unit
    pub cycle_length_minutes: u64,
    /// An idle machine shuts down once fewer paid minutes than this remain
    pub threshold_minutes: u64,
    /// Minutes paid up front at boot; 0 when cycles start at boot
    pub paid_on_boot_minutes: u64,
}

impl BillingSettings {
    pub fn new(cycle_length_minutes: u64, threshold_minutes: u64) -> Self {
        Self {
            cycle_length_minutes,
            threshold_minutes,
            paid_on_boot_minutes: 0,
        }
    }

    pub fn with_paid_on_boot(mut self, minutes: u64) -> Self {
        self.paid_on_boot_minutes = minutes;
        self
    }

    pub fn from_policy(policy: &BillingPolicy) -> Self {
        Self {
            cycle_length_minutes: policy.cycle_length_minutes,
            threshold_minutes: policy.threshold_minutes,
            paid_on_boot_minutes: policy.paid_on_boot_minutes,
        }
    }

    pub fn validate(&self) -> IdlestopResult<()> {
        if self.cycle_length_minutes == 0 {
            return Err(IdlestopError::config(
                "cycle_length_minutes must be greater than 0",
            ));
        }
        // at least one paid minute always remains, so 0 would never shut down
        if self.threshold_minutes == 0 {
            return Err(IdlestopError::config(
                "threshold_minutes must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Where the machine stands in its current paid block.
///
/// Inside the boot block the block is the boot block itself. After it,
/// cycles are counted from the end of the boot block.
pub fn billing_cycle(uptime_minutes: u64, settings: &BillingSettings) -> BillingCycle {
    let boot = settings.paid_on_boot_minutes;

    if uptime_minutes < boot {
        return BillingCycle {
            cycle_length_minutes: boot,
            elapsed_minutes: uptime_minutes,
            in_boot_block: true,
        };
    }

    let cycle = settings.cycle_length_minutes.max(1);
    BillingCycle {
        cycle_length_minutes: cycle,
        elapsed_minutes: (uptime_minutes - boot) % cycle,
        in_boot_block: false,
    }
}

/// Busy machines stay up. Idle machines shut down only in the last
/// `threshold_minutes` of the block they already paid for.
pub fn shutdown_decision(
    idle_state: MachineIdleState,
    cycle: &BillingCycle,
    threshold_minutes: u64,
) -> ShutdownDecision {
    match idle_state {
        MachineIdleState::Busy => ShutdownDecision::KeepAlive,
        MachineIdleState::Idle if cycle.remaining_minutes() < threshold_minutes => {
            ShutdownDecision::Shutdown
        }
        MachineIdleState::Idle => ShutdownDecision::KeepAlive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_with_remaining(remaining: u64) -> BillingCycle {
        BillingCycle {
            cycle_length_minutes: 60,
            elapsed_minutes: 60 - remaining,
            in_boot_block: false,
        }
    }

    #[test]
    fn test_cycle_position() {
        let settings = BillingSettings::new(60, 5);

        assert_eq!(billing_cycle(58, &settings).remaining_minutes(), 2);
        assert_eq!(billing_cycle(10, &settings).remaining_minutes(), 50);
        assert_eq!(billing_cycle(0, &settings).remaining_minutes(), 60);

        // a fresh hour has just been paid for
        let c = billing_cycle(60, &settings);
        assert_eq!(c.elapsed_minutes, 0);
        assert_eq!(c.remaining_minutes(), 60);

        assert_eq!(billing_cycle(118, &settings).remaining_minutes(), 2);
    }

    #[test]
    fn test_paid_on_boot_block() {
        // GCE: 10 minutes paid at boot, per-minute billing afterwards
        let settings = BillingSettings::new(1, 2).with_paid_on_boot(10);

        let c = billing_cycle(5, &settings);
        assert!(c.in_boot_block);
        assert_eq!(c.remaining_minutes(), 5);

        let c = billing_cycle(9, &settings);
        assert!(c.in_boot_block);
        assert_eq!(c.remaining_minutes(), 1);

        let c = billing_cycle(10, &settings);
        assert!(!c.in_boot_block);
        assert_eq!(c.remaining_minutes(), 1);

        let c = billing_cycle(47, &settings);
        assert_eq!(c.remaining_minutes(), 1);
    }

    #[test]
    fn test_paid_on_boot_shifts_cycles() {
        let settings = BillingSettings::new(60, 5).with_paid_on_boot(30);

        assert_eq!(billing_cycle(29, &settings).remaining_minutes(), 1);
        assert_eq!(billing_cycle(30, &settings).remaining_minutes(), 60);
        assert_eq!(billing_cycle(88, &settings).remaining_minutes(), 2);
    }

    #[test]
    fn test_busy_always_keeps_alive() {
        for remaining in [0, 1, 4, 5, 60] {
            assert_eq!(
                shutdown_decision(MachineIdleState::Busy, &cycle_with_remaining(remaining), 5),
                ShutdownDecision::KeepAlive
            );
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let threshold = 5;
        assert_eq!(
            shutdown_decision(
                MachineIdleState::Idle,
                &cycle_with_remaining(threshold - 1),
                threshold
            ),
            ShutdownDecision::Shutdown
        );
        assert_eq!(
            shutdown_decision(MachineIdleState::Idle, &cycle_with_remaining(threshold), threshold),
            ShutdownDecision::KeepAlive
        );
    }

    #[test]
    fn test_validate() {
        assert!(BillingSettings::new(60, 5).validate().is_ok());
        assert!(BillingSettings::new(0, 5).validate().is_err());
        assert!(BillingSettings::new(60, 0).validate().is_err());
        // per-minute billing: any threshold above the cycle is fine
        assert!(BillingSettings::new(1, 2).validate().is_ok());
    }
}
