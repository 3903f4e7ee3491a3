//! Narrow filters: the search language, canonical filters, and the
//! predicates they compile to.

mod context;
mod describe;
mod filter;
mod hash;
mod parser;
mod predicate;

pub use context::{NarrowContext, RealmSettings};
pub use describe::{describe, operator_to_prefix};
pub use filter::{Filter, canonicalize_operator, canonicalize_term, sorted_term_types, term_type};
pub use hash::{decode_hash_component, encode_hash_component, parse_narrow, terms_to_hash};
pub use parser::{decode_operand, encode_operand, parse, unparse};
pub use predicate::{
    MessagePredicate, group_pm_with_user_ids, message_matches_search_term, pm_with_operand_ids,
    pm_with_user_ids,
};
