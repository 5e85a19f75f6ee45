//! Use-case handlers exposed to the HTTP adapter.

mod get_history;
mod submit_dilemma;

pub use get_history::{GetHistoryHandler, GetHistoryQuery};
pub use submit_dilemma::{
    StageTiming, SubmitDilemmaCommand, SubmitDilemmaHandler, SubmitDilemmaResult,
};
