pub mod answer_sheet;
pub mod exam_profile;
pub mod loaders;
pub mod profile_registry;

pub use answer_sheet::{
    ExtractedSheet, OptionId, Outcome, ProfileContext, QuestionRecord, QuestionType, RawQuestion,
    RawSection, ScoreResult, ScoredSection, SectionAggregate, SectionRecord, ShiftSource,
    StudentProfile,
};
pub use exam_profile::{
    ExamProfile, MarkingRules, MarkupRules, PercentileBand, PercentileSchedule,
    PercentileTableLookup, ProfileDefinition, Redistribution,
};
pub use profile_registry::ProfileRegistry;
