pub mod answer_rule;
pub mod job;
pub mod loaders;
pub mod profile;

pub use answer_rule::AnswerRule;
pub use job::{ApplicationRecord, JobCandidate, TIMESTAMP_FORMAT};
pub use loaders::{append_rule, load_rules};
pub use profile::ApplicantProfile;
