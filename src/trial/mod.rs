mod conditions;
mod controller;
mod results;
mod stick;

pub use conditions::{
    ConditionError, TrialCondition, load_conditions, load_or_synthesize, persist_conditions,
    synthesize_conditions,
};
pub use controller::{Judgement, TrialController, TrialOutcome, ground_truth};
pub use results::{ResultsWriter, TrialRecord};
pub use stick::{
    Side, StickCondition, StickRecord, StickResultsWriter, sample_stick_conditions,
    stick_ground_truth,
};
