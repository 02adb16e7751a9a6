use crate::domain::{ClaimantAggregate, SessionLimits};

/// Whether right-to-match may be (or stay) switched on for `claimant`.
///
/// Switching off is never blocked. Switching on needs an RTM-eligible
/// claimant with quota left.
pub fn can_enable_rtm(claimant: &ClaimantAggregate, limits: &SessionLimits, currently_on: bool) -> bool {
    if currently_on {
        return true;
    }
    claimant.rtm_eligible && claimant.rtm_used < limits.max_rtm_quota
}

/// Human-readable status line for the RTM toggle.
pub fn describe(claimant: &ClaimantAggregate, limits: &SessionLimits, currently_on: bool) -> String {
    if !claimant.rtm_eligible {
        return format!("{} is not eligible for RTM", claimant.name);
    }
    if claimant.rtm_used >= limits.max_rtm_quota {
        return format!(
            "RTM exhausted for {} ({}/{})",
            claimant.name, claimant.rtm_used, limits.max_rtm_quota
        );
    }
    if currently_on {
        return format!("RTM is ON for {}", claimant.name);
    }
    format!(
        "RTM available for {} ({}/{})",
        claimant.name, claimant.rtm_used, limits.max_rtm_quota
    )
}
