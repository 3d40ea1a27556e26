use fcs_domain::sensors::SensorClass;
use fcs_kernel::lifecycle::{TabError, TabState};
use fcs_link::LinkError;
use fcs_scheduler::SchedulerError;
use std::borrow::Cow;

/// A specialized [`SetupError`] enum of this crate.
#[fcs_derive::fcs_error]
pub enum SetupError {
    #[error("Setup tab error{}: {source}", format_context(.context))]
    Tab { source: TabError, context: Option<Cow<'static, str>> },

    #[error("Setup request failed{}: {source}", format_context(.context))]
    Link { source: LinkError, context: Option<Cow<'static, str>> },

    #[error("Setup timer error{}: {source}", format_context(.context))]
    Scheduler { source: SchedulerError, context: Option<Cow<'static, str>> },

    /// A calibration of this sensor has not finished yet.
    #[error("{sensor} calibration already running{}", format_context(.context))]
    CalibrationRunning { sensor: SensorClass, context: Option<Cow<'static, str>> },

    /// The device did not report the sensor as present.
    #[error("No {sensor} detected{}", format_context(.context))]
    SensorAbsent { sensor: SensorClass, context: Option<Cow<'static, str>> },

    /// Actions need a tab that is polling.
    #[error("Setup tab is {state:?}{}", format_context(.context))]
    NotRunning { state: TabState, context: Option<Cow<'static, str>> },
}
