mod escape;
pub use escape::{escape_help, escape_label_value};

mod labels;
pub use labels::LabelSet;

mod name;
pub use name::{BUCKET_LABEL, full_name, validate_label_name, validate_metric_name};
