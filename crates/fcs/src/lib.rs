//! Facade over the engine crates and the tab slices.
//! Keep this crate thin: it composes other crates and implements nothing itself.
//!
//! ## Usage
//! - Depend on `fcs` with the tabs you need (`setup`, `indi`; both by default).
//! - Enable `sim` for the scripted device used by demos and tests.

pub use fcs_domain as domain;
pub use fcs_event_bus as events;
pub use fcs_kernel as kernel;
pub use fcs_link as link;
pub use fcs_scheduler as scheduler;

/// Tab slices compiled into this build.
pub mod tabs {
    #[cfg(feature = "indi")]
    pub use fcs_indi as indi;
    #[cfg(feature = "setup")]
    pub use fcs_setup as setup;

    /// Tab names enabled by Cargo feature.
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "setup")]
        fcs_setup::TAB_NAME,
        #[cfg(feature = "indi")]
        fcs_indi::TAB_NAME,
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build_has_both_tabs() {
        assert!(tabs::is_enabled("setup"));
        assert!(tabs::is_enabled("indi"));
        assert!(!tabs::is_enabled("motors"));
    }
}
