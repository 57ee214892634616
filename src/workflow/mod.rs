pub mod application_ctx;
pub mod application_flow;
pub mod modal;
pub mod wizard;

pub use application_ctx::ApplicationCtx;
pub use application_flow::{ApplicationFlow, ApplicationOutcome, ApplicationReport};
pub use modal::dismiss_open_modal;
pub use wizard::{decide, StepAction, StepObservation, WizardPhase, WizardState, MAX_RECHECKS};
