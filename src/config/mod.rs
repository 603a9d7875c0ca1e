pub mod heuristics;
pub mod schema;

pub use heuristics::{CandidateRules, DiffRules, Heuristics, ModalRules};
pub use schema::{
    BrowserConfig, CookieConfig, Limits, OutputConfig, ProbeConfig, StopPolicy, Timing, Viewport,
};
