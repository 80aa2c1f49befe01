pub mod error;
pub mod model;
pub mod source;

pub use error::{Result, RuleSourceError};
pub use model::{Rule, RuleGroup, RulesData, RulesResponse, KIND_ALERTING, KIND_RECORDING};
pub use source::{
    from_location, parse_rules, FileRuleSource, HttpRuleSource, RuleLocation, RuleSource,
    DEFAULT_REQUEST_TIMEOUT, USER_AGENT,
};
