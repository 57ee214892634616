pub mod answer_cache;
pub mod answer_resolver;
pub mod application_ledger;
pub mod controls;
pub mod element_resolver;
pub mod escalation;
pub mod question_patterns;
pub mod relevance;
pub mod similarity;
pub mod unanswered_ledger;

pub use answer_cache::AnswerCache;
pub use answer_resolver::{Answer, AnswerResolver, AnswerSource};
pub use application_ledger::ApplicationLedger;
pub use controls::Control;
pub use element_resolver::{
    ElementResolver, Interactability, LocatorStrategy, Matcher, Resolution, ResolveContext,
    SelectorStrategy,
};
pub use escalation::{EscalationPort, EscalationReply, SkipEscalation, TerminalEscalation};
pub use relevance::{RelevanceScorer, Screening};
pub use unanswered_ledger::UnansweredLedger;
