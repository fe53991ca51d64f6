mod buckets;
pub use buckets::{Buckets, MAX_BUCKETS};

mod precedence;
pub use precedence::LabelPrecedence;
