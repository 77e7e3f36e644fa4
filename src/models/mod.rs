// Domain models

mod lifecycle;
mod pricing;

pub use lifecycle::{
    ActivationReport, EventState, HookOutcome, HookResult, LifecycleEvent, ScalerDetail,
    ScalerEnvelope, TRANSITION_LAUNCHING, TRANSITION_TERMINATING, TransitionKind,
};
pub use pricing::{
    BidEstimate, InterruptionPolicy, LaunchConfigVersion, MarketOptions, PriceObservation,
};
