pub mod config;
pub mod header;
pub mod ports;
pub mod trace;
pub mod trigger;
pub mod types;

pub use header::HeaderModel;
pub use ports::{AuthGate, Clock, EmbassyClock, Navigator};
pub use trace::GestureTraceSample;
pub use trigger::{GestureOutput, GestureTrigger};
pub use types::{
    ActionBuffer, AttemptId, DisplayCounter, GestureAction, GestureStateId, RejectReason,
    ResetReason, TapLog,
};
